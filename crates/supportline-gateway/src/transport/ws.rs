//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS at `/v1/ws`
//! - In-band auth: the first event must be `authenticate` (opaque token)
//! - Registration/displacement in the connection registry
//! - Presence transitions on register/deregister
//! - Lifecycle: ping/pong + idle timeout
//!
//! Auth failures keep the socket open; clients retry with a fresh token. A
//! decode error answers with an `error` event instead of closing.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use supportline_core::error::{ClientCode, Result};
use supportline_core::protocol::{ClientEvent, ServerEvent};

use crate::app_state::AppState;
use crate::auth::Identity;
use crate::realtime::core::Connection;
use crate::transport::codec::{self, Inbound};

/// Registration handle for an authenticated session. The generation guards
/// teardown: a displaced session must not deregister its replacement.
struct AuthedSession {
    identity: Identity,
    generation: u64,
}

async fn send_event(out_tx: &mpsc::Sender<Message>, ev: &ServerEvent) {
    if let Ok(frame) = ev.encode() {
        let _ = out_tx.send(Message::Text(frame)).await;
    }
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    app.metrics().ws_upgrades.inc(&[]);
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_session(app, socket).await {
            tracing::debug!(error = %e, "session ended with error");
        }
    })
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, socket: WebSocket) -> Result<()> {
    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let max_frame_bytes = gw.max_frame_bytes;

    // ---- outbound channel
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(gw.send_queue_depth);

    // ---- split socket
    let (mut ws_tx, mut ws_rx) = socket.split();

    app.metrics().ws_active_sessions.inc(&[]);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut authed: Option<AuthedSession> = None;
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        let closing = matches!(m, Message::Close(_));
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                        if closing {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                // cheap-first: size limit before decode
                if codec::frame_len(&msg) > max_frame_bytes {
                    send_event(&out_tx, &ServerEvent::Error {
                        code: ClientCode::BadRequest.as_str().to_string(),
                        msg: "frame too large".to_string(),
                    }).await;
                    continue;
                }

                match codec::decode(msg) {
                    Ok(Inbound::Event { ev, .. }) => {
                        // event errors are answered in-band; never tear the
                        // session down for them
                        if let Err(e) = handle_event(&app, &out_tx, &mut authed, ev).await {
                            tracing::warn!(error = %e, "event handling failed");
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        app.metrics().decode_errors.inc(&[]);
                        send_event(&out_tx, &ServerEvent::from_error(&e)).await;
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::debug!("closing idle session");
                    break;
                }
            }
        }
    }

    // ---- teardown: deregister only if this session still owns the entry
    app.metrics().ws_active_sessions.dec(&[]);
    if let Some(sess) = authed.take() {
        let user_id = sess.identity.user_id;
        if app.chat().registry().deregister(&user_id, sess.generation) {
            app.metrics().presence_transitions.inc(&[("transition", "offline")]);
            if let Err(e) = app.chat().presence().publish_offline(&user_id) {
                tracing::warn!(error = %e, "offline broadcast failed");
            }
        }
    }

    Ok(())
}

async fn handle_event(
    app: &AppState,
    out_tx: &mpsc::Sender<Message>,
    authed: &mut Option<AuthedSession>,
    ev: ClientEvent,
) -> Result<()> {
    let ev = match ev {
        ClientEvent::Authenticate { token } => {
            return handle_authenticate(app, out_tx, authed, &token).await;
        }
        other => other,
    };

    let Some(sess) = authed.as_ref() else {
        send_event(
            out_tx,
            &ServerEvent::Error {
                code: ClientCode::AuthFailed.as_str().to_string(),
                msg: "authenticate first".to_string(),
            },
        )
        .await;
        return Ok(());
    };

    let outcome = match ev {
        ClientEvent::SendMessage { receiver_id, message } => app
            .chat()
            .send_message(&sess.identity, &receiver_id, &message)
            .await
            .map(|_| ()),
        ClientEvent::MarkRead { sender_id } => app
            .chat()
            .mark_read(&sess.identity, &sender_id)
            .await
            .map(|_| ()),
        ClientEvent::Typing { receiver_id } => {
            app.chat().typing(&sess.identity, &receiver_id, true).await
        }
        ClientEvent::StopTyping { receiver_id } => {
            app.chat().typing(&sess.identity, &receiver_id, false).await
        }
        // handled above
        ClientEvent::Authenticate { .. } => Ok(()),
    };

    if let Err(e) = outcome {
        send_event(out_tx, &ServerEvent::from_error(&e)).await;
    }
    Ok(())
}

async fn handle_authenticate(
    app: &AppState,
    out_tx: &mpsc::Sender<Message>,
    authed: &mut Option<AuthedSession>,
    token: &str,
) -> Result<()> {
    let identity = match app.auth().verify(token).await {
        Ok(identity) => identity,
        Err(e) => {
            app.metrics().auth_results.inc(&[("outcome", "failed")]);
            tracing::debug!(error = %e, "socket auth failed");
            send_event(
                out_tx,
                &ServerEvent::Authenticated {
                    success: false,
                    user_id: None,
                    message: Some(e.to_string()),
                },
            )
            .await;
            return Ok(());
        }
    };

    app.metrics().auth_results.inc(&[("outcome", "ok")]);

    if let Some(prev) = authed.take() {
        if prev.identity.user_id == identity.user_id {
            // re-auth with the same identity: keep the registration, re-ack
            *authed = Some(prev);
            send_event(
                out_tx,
                &ServerEvent::Authenticated {
                    success: true,
                    user_id: Some(identity.user_id),
                    message: None,
                },
            )
            .await;
            return Ok(());
        }
        // identity switch on a live socket: release the old registration
        if app
            .chat()
            .registry()
            .deregister(&prev.identity.user_id, prev.generation)
        {
            app.metrics().presence_transitions.inc(&[("transition", "offline")]);
            app.chat().presence().publish_offline(&prev.identity.user_id)?;
        }
    }

    let conn = Connection { tx: out_tx.clone() };
    let (generation, displaced) = app
        .chat()
        .registry()
        .register(&identity.user_id, conn.clone());

    if let Some(old) = displaced {
        // the user stays online through this connection; just close the
        // older one (its teardown is a stale deregister and publishes nothing)
        tracing::debug!(user_id = %identity.user_id, "displacing older connection");
        let _ = old.tx.try_send(Message::Close(None));
    } else {
        app.metrics().presence_transitions.inc(&[("transition", "online")]);
        app.chat().presence().publish_online(&identity.user_id)?;
    }

    // late-joiner catch-up: who is already here
    app.chat().presence().snapshot_to(&identity.user_id, &conn)?;

    send_event(
        out_tx,
        &ServerEvent::Authenticated {
            success: true,
            user_id: Some(identity.user_id.clone()),
            message: None,
        },
    )
    .await;

    tracing::info!(user_id = %identity.user_id, role = ?identity.role, "session authenticated");
    *authed = Some(AuthedSession { identity, generation });
    Ok(())
}

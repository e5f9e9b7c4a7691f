#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use supportline_core::protocol::ServerEvent;
use supportline_gateway::auth::{Identity, Role};
use supportline_gateway::obs::metrics::GatewayMetrics;
use supportline_gateway::realtime::core::{ChatCore, Connection};
use supportline_gateway::store::{MemoryStore, MessageStore};

fn ident(user_id: &str, name: &str, role: Role) -> Identity {
    Identity {
        user_id: user_id.to_string(),
        name: name.to_string(),
        role,
    }
}

fn core_with_store() -> (ChatCore, Arc<MemoryStore>, Arc<GatewayMetrics>) {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(GatewayMetrics::default());
    let core = ChatCore::new(store.clone(), Arc::clone(&metrics), 1500);
    (core, store, metrics)
}

/// Register a fake connection and return its receive side.
fn connect(core: &ChatCore, user_id: &str) -> (u64, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(32);
    let (generation, displaced) = core.registry().register(user_id, Connection { tx });
    assert!(displaced.is_none(), "unexpected displacement for {user_id}");
    (generation, rx)
}

async fn recv_event(rx: &mut mpsc::Receiver<Message>) -> ServerEvent {
    match rx.recv().await.expect("channel open") {
        Message::Text(s) => serde_json::from_str(&s).expect("valid server event"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn send_message_persists_then_delivers_both_ways() {
    let (core, store, _) = core_with_store();
    let alice = ident("u1", "Alice", Role::User);
    let (_, mut alice_rx) = connect(&core, "u1");
    let (_, mut admin_rx) = connect(&core, "admin");

    let stored = core
        .send_message(&alice, "admin", "  need help  ")
        .await
        .expect("send must succeed");
    assert_eq!(stored.message, "need help");
    assert!(!stored.read);

    match recv_event(&mut alice_rx).await {
        ServerEvent::MessageSent(m) => assert_eq!(m.id, stored.id),
        other => panic!("expected message-sent, got {other:?}"),
    }
    match recv_event(&mut admin_rx).await {
        ServerEvent::ReceiveMessage(m) => {
            assert_eq!(m.sender_id, "u1");
            assert_eq!(m.sender_name, "Alice");
            assert_eq!(m.message, "need help");
        }
        other => panic!("expected receive-message, got {other:?}"),
    }

    assert_eq!(store.unread_count("admin").await.unwrap(), 1);
}

#[tokio::test]
async fn offline_recipient_gets_only_the_persisted_copy() {
    let (core, store, metrics) = core_with_store();
    let alice = ident("u1", "Alice", Role::User);
    let (_, mut alice_rx) = connect(&core, "u1");

    core.send_message(&alice, "admin", "anyone there?")
        .await
        .expect("send must succeed");

    // sender still gets the ack
    assert!(matches!(
        recv_event(&mut alice_rx).await,
        ServerEvent::MessageSent(_)
    ));
    assert_eq!(store.unread_count("admin").await.unwrap(), 1);
    assert_eq!(metrics.deliveries.get(&[("outcome", "offline")]), 1);
}

#[tokio::test]
async fn empty_message_is_rejected_before_persist() {
    let (core, store, _) = core_with_store();
    let alice = ident("u1", "Alice", Role::User);
    let (_, _alice_rx) = connect(&core, "u1");

    let err = core
        .send_message(&alice, "admin", "   ")
        .await
        .expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    assert_eq!(store.unread_count("admin").await.unwrap(), 0);
}

#[tokio::test]
async fn sending_to_self_delivers_ack_and_message() {
    let (core, _, _) = core_with_store();
    let alice = ident("u1", "Alice", Role::User);
    let (_, mut alice_rx) = connect(&core, "u1");

    core.send_message(&alice, "u1", "note to self")
        .await
        .expect("send must succeed");

    assert!(matches!(
        recv_event(&mut alice_rx).await,
        ServerEvent::MessageSent(_)
    ));
    assert!(matches!(
        recv_event(&mut alice_rx).await,
        ServerEvent::ReceiveMessage(_)
    ));
}

#[tokio::test]
async fn mark_read_flips_unread_and_notifies_sender() {
    let (core, store, _) = core_with_store();
    let alice = ident("u1", "Alice", Role::User);
    let admin = ident("admin", "Support Team", Role::Admin);
    let (_, mut alice_rx) = connect(&core, "u1");
    let (_, mut admin_rx) = connect(&core, "admin");

    core.send_message(&alice, "admin", "first").await.unwrap();
    core.send_message(&alice, "admin", "second").await.unwrap();
    // drain the two receive-message frames
    recv_event(&mut admin_rx).await;
    recv_event(&mut admin_rx).await;

    let count = core.mark_read(&admin, "u1").await.expect("mark read");
    assert_eq!(count, 2);
    assert_eq!(store.unread_count("admin").await.unwrap(), 0);

    // drain alice's two acks, then the read receipt
    recv_event(&mut alice_rx).await;
    recv_event(&mut alice_rx).await;
    match recv_event(&mut alice_rx).await {
        ServerEvent::MessagesRead { reader_id, count } => {
            assert_eq!(reader_id, "admin");
            assert_eq!(count, 2);
        }
        other => panic!("expected messages-read, got {other:?}"),
    }

    // nothing left unread: second mark-read is a no-op, no receipt
    let count = core.mark_read(&admin, "u1").await.expect("mark read");
    assert_eq!(count, 0);
    assert!(alice_rx.try_recv().is_err());
}

#[tokio::test]
async fn typing_is_relayed_and_never_queued_for_offline_peers() {
    let (core, _, _) = core_with_store();
    let alice = ident("u1", "Alice", Role::User);
    let (_, mut admin_rx) = connect(&core, "admin");

    core.typing(&alice, "admin", true).await.unwrap();
    core.typing(&alice, "admin", false).await.unwrap();

    match recv_event(&mut admin_rx).await {
        ServerEvent::UserTyping { user_id } => assert_eq!(user_id, "u1"),
        other => panic!("expected user-typing, got {other:?}"),
    }
    assert!(matches!(
        recv_event(&mut admin_rx).await,
        ServerEvent::UserStopTyping { .. }
    ));

    // offline recipient: silently skipped
    core.typing(&alice, "nobody", true).await.unwrap();
}

#[tokio::test]
async fn newer_connection_displaces_older_and_guards_stale_teardown() {
    let (core, _, _) = core_with_store();
    let registry = core.registry();

    let (tx1, _rx1) = mpsc::channel(8);
    let (gen1, displaced) = registry.register("u1", Connection { tx: tx1 });
    assert!(displaced.is_none());

    let (tx2, _rx2) = mpsc::channel(8);
    let (gen2, displaced) = registry.register("u1", Connection { tx: tx2 });
    assert!(displaced.is_some());

    // stale teardown from the displaced session must not remove the new entry
    assert!(!registry.deregister("u1", gen1));
    assert!(registry.is_online("u1"));

    assert!(registry.deregister("u1", gen2));
    assert!(!registry.is_online("u1"));
}

#[tokio::test]
async fn presence_fans_out_to_peers_only() {
    let (core, _, _) = core_with_store();
    let (_, mut alice_rx) = connect(&core, "u1");
    let (_, mut bob_rx) = connect(&core, "u2");
    let (_, mut carol_rx) = connect(&core, "u3");

    core.presence().publish_online("u3").unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        match recv_event(rx).await {
            ServerEvent::UserOnline { user_id } => assert_eq!(user_id, "u3"),
            other => panic!("expected user-online, got {other:?}"),
        }
    }
    // no echo to the subject
    assert!(carol_rx.try_recv().is_err());

    core.presence().publish_offline("u3").unwrap();
    assert!(matches!(
        recv_event(&mut alice_rx).await,
        ServerEvent::UserOffline { .. }
    ));
}

#[tokio::test]
async fn late_joiner_receives_presence_snapshot() {
    let (core, _, _) = core_with_store();
    let (_, _alice_rx) = connect(&core, "u1");
    let (_, _bob_rx) = connect(&core, "u2");

    let (tx, mut rx) = mpsc::channel(8);
    let conn = Connection { tx };
    core.registry().register("u3", conn.clone());
    core.presence().snapshot_to("u3", &conn).unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        match recv_event(&mut rx).await {
            ServerEvent::UserOnline { user_id } => seen.push(user_id),
            other => panic!("expected user-online, got {other:?}"),
        }
    }
    seen.sort();
    assert_eq!(seen, vec!["u1", "u2"]);
}

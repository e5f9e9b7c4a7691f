#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use supportline_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
  ping_intervall_ms: 20000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.ping_interval_ms, 20000);
    assert_eq!(cfg.gateway.max_frame_bytes, 4096);
    assert!(cfg.auth.tokens.is_empty());
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_idle_timeout_not_greater_than_ping() {
    let bad = r#"
version: 1
gateway:
  ping_interval_ms: 20000
  idle_timeout_ms: 20000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn rejects_duplicate_tokens() {
    let bad = r#"
version: 1
auth:
  tokens:
    - { token: "t1", user_id: "u1", name: "A" }
    - { token: "t1", user_id: "u2", name: "B" }
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn parses_roles() {
    let ok = r#"
version: 1
auth:
  tokens:
    - { token: "ta", user_id: "admin", name: "Support Team", role: admin }
    - { token: "tu", user_id: "u1", name: "Dev User" }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.auth.tokens[0].role, supportline_gateway::auth::Role::Admin);
    assert_eq!(cfg.auth.tokens[1].role, supportline_gateway::auth::Role::User);
}

//! Gateway Integration Tests
//!
//! Every test starts its own gateway on an ephemeral port with the in-memory
//! directory. Tests in the Redis section additionally require `REDIS_URL`.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use chat_core::UserProfile;
use chat_gateway::protocol::EnvelopeType;
use integration_tests::{
    assert_status, msg_all_data, redis_config, redis_url, test_config, unique_profile, TestClient,
    TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

const QUIET: Duration = Duration::from_millis(300);

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_welcome_on_connect() {
    let server = TestServer::start().await.expect("Failed to start server");
    let url = server.ws_url();

    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let frame = futures_util::StreamExt::next(&mut ws).await.unwrap().unwrap();
    assert_eq!(
        frame.into_text().unwrap(),
        r#"{"type":"connect","data":{"msg":"welcome to webchat"}}"#
    );
}

#[tokio::test]
async fn test_gateway_path_alias() {
    let server = TestServer::start().await.expect("Failed to start server");
    let url = format!("ws://{}/gateway", server.addr);
    assert!(TestClient::connect(&url).await.is_ok());
}

#[tokio::test]
async fn test_ping_pong() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_action("ping", json!("")).await.unwrap();
    let pong = client.recv_kind(EnvelopeType::Pong).await.unwrap();
    assert_eq!(pong.data, json!({}));
}

// ============================================================================
// Join / Leave Tests
// ============================================================================

#[tokio::test]
async fn test_join_is_announced_with_count() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = unique_profile("alice");
    let bob = unique_profile("bob");

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    let joined = alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();
    assert_eq!(joined.data["count"], 1);
    assert_eq!(joined.data["user"]["uuid"], json!(alice.uuid));

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();

    for ws in [&mut alice_ws, &mut bob_ws] {
        let joined = ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();
        assert_eq!(joined.data["count"], 2);
        assert_eq!(joined.data["user"]["uname"], "bob");
    }
}

#[tokio::test]
async fn test_second_tab_is_silent_until_last_tab_leaves() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = unique_profile("alice");
    let bob = unique_profile("bob");

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let mut tab_1 = server.connect().await.unwrap();
    tab_1.init_user(&alice).await.unwrap();
    tab_1.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    // Second tab of the same identity: no announcement anywhere
    let mut tab_2 = server.connect().await.unwrap();
    tab_2.init_user(&alice).await.unwrap();
    tab_2.sync().await.unwrap();
    bob_ws.expect_silence(QUIET).await.unwrap();

    tab_1.close().await.unwrap();
    bob_ws.expect_silence(QUIET).await.unwrap();

    tab_2.close().await.unwrap();
    let left = bob_ws.recv_kind(EnvelopeType::Close).await.unwrap();
    assert_eq!(left.data["user"]["uuid"], json!(alice.uuid));
    assert_eq!(left.data["user"]["uname"], "alice");
}

#[tokio::test]
async fn test_client_close_removes_user_from_roster() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = unique_profile("alice");
    let bob = unique_profile("bob");

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    alice_ws.close().await.unwrap();
    let left = bob_ws.recv_kind(EnvelopeType::Close).await.unwrap();
    assert_eq!(left.data["user"]["uuid"], json!(alice.uuid));

    // The roster entry is gone before `close` goes out
    let response = server.get("/users").await.expect("Request failed");
    let body = assert_status(response, StatusCode::OK).await.unwrap();
    let users: Vec<UserProfile> = serde_json::from_str(&body).unwrap();
    assert_eq!(users, vec![bob]);

    // Nobody is left to notify once the last user leaves
    bob_ws.close().await.unwrap();
    let mut users: Vec<UserProfile> = Vec::new();
    for _ in 0..20 {
        let response = server.get("/users").await.expect("Request failed");
        let body = assert_status(response, StatusCode::OK).await.unwrap();
        users = serde_json::from_str(&body).unwrap();
        if users.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(users.is_empty(), "roster still lists {users:?}");
}

#[tokio::test]
async fn test_unassociated_close_is_silent() {
    let server = TestServer::start().await.expect("Failed to start server");
    let bob = unique_profile("bob");

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let stranger = server.connect().await.unwrap();
    stranger.close().await.unwrap();
    bob_ws.expect_silence(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let mut config = test_config();
    config.gateway.idle_timeout_secs = 1;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");
    let alice = unique_profile("alice");
    let bob = unique_profile("bob");

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    // Bob keeps talking; Alice goes quiet and is dropped
    let mut departed: Option<Value> = None;
    for _ in 0..20 {
        bob_ws.send_action("ping", json!({})).await.unwrap();
        let envelope = bob_ws.recv().await.unwrap();
        if envelope.kind == EnvelopeType::Close {
            departed = Some(envelope.data);
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let departed = departed.expect("idle connection was not closed");
    assert_eq!(departed["user"]["uuid"], json!(alice.uuid));
}

// ============================================================================
// Messaging Tests
// ============================================================================

#[tokio::test]
async fn test_msg_all_reaches_every_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = UserProfile::new(uuid::Uuid::new_v4().to_string(), "张三", "http://app.com/pic.jpg");
    let bob = unique_profile("bob");

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    alice_ws
        .send_action("msg_all", msg_all_data("你好"))
        .await
        .unwrap();

    for ws in [&mut alice_ws, &mut bob_ws] {
        let message = ws.recv_kind(EnvelopeType::ServerMsg).await.unwrap();
        assert_eq!(message.data["msg"], "你好");
        assert_eq!(message.data["user"]["uname"], "张三");
        assert!(message.data["send_time"].as_i64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_blank_message_is_dropped() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = unique_profile("alice");

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    alice_ws
        .send_action("msg_all", msg_all_data("  "))
        .await
        .unwrap();
    // The next frame is the pong, not a server_msg
    alice_ws.sync().await.unwrap();
}

#[tokio::test]
async fn test_edit_userinfo_changes_sender_profile() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = unique_profile("alice");

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    alice_ws
        .send_action("edit_userinfo", json!({"uname": "alicia", "avatar": "new.png"}))
        .await
        .unwrap();
    alice_ws.sync().await.unwrap();

    alice_ws
        .send_action("msg_all", msg_all_data("renamed"))
        .await
        .unwrap();
    let message = alice_ws.recv_kind(EnvelopeType::ServerMsg).await.unwrap();
    assert_eq!(message.data["user"]["uname"], "alicia");
    assert_eq!(message.data["user"]["avatar"], "new.png");
}

// ============================================================================
// Error Reply Tests
// ============================================================================

#[tokio::test]
async fn test_error_replies() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_raw("not json").await.unwrap();
    let reply = client.recv_kind(EnvelopeType::Error).await.unwrap();
    assert_eq!(reply.data["msg"], "malformed payload");

    client.send_action("dance", json!({})).await.unwrap();
    let reply = client.recv_kind(EnvelopeType::Error).await.unwrap();
    assert_eq!(reply.data["msg"], "unknown request type");

    client
        .send_action("error", json!({"msg": "x", "code": 7}))
        .await
        .unwrap();
    let reply = client.recv_kind(EnvelopeType::Error).await.unwrap();
    assert_eq!(reply.data, json!({"msg": "x", "code": 7}));

    client
        .send_action("msg_all", msg_all_data("too early"))
        .await
        .unwrap();
    let reply = client.recv_kind(EnvelopeType::Error).await.unwrap();
    assert_eq!(reply.data["msg"], "user not initialized");

    client
        .send_action("init_user", json!({"uuid": "u1"}))
        .await
        .unwrap();
    let reply = client.recv_kind(EnvelopeType::Error).await.unwrap();
    assert_eq!(reply.data["msg"], "invalid init_user payload");
}

// ============================================================================
// HTTP Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    let body = assert_status(response, StatusCode::OK).await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_health_check_reports_unreachable_directory() {
    let server = TestServer::start_with_config(redis_config("redis://127.0.0.1:1/0"))
        .await
        .expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_users_lists_roster() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = unique_profile("alice");

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let response = server.get("/users").await.expect("Request failed");
    let body = assert_status(response, StatusCode::OK).await.unwrap();
    let users: Vec<UserProfile> = serde_json::from_str(&body).unwrap();
    assert_eq!(users, vec![alice]);
}

// ============================================================================
// Redis Tests
// ============================================================================

#[tokio::test]
async fn test_redis_directory_round_trip() {
    let Some(url) = redis_url() else {
        return;
    };

    let server = TestServer::start_with_config(redis_config(&url))
        .await
        .expect("Failed to start server");
    let alice = unique_profile("alice");
    let bob = unique_profile("bob");

    let mut bob_ws = server.connect().await.unwrap();
    bob_ws.init_user(&bob).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let mut alice_ws = server.connect().await.unwrap();
    alice_ws.init_user(&alice).await.unwrap();
    alice_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();
    bob_ws.recv_kind(EnvelopeType::NewUserJoin).await.unwrap();

    let response = server.get("/users").await.expect("Request failed");
    let body = assert_status(response, StatusCode::OK).await.unwrap();
    let users: Vec<UserProfile> = serde_json::from_str(&body).unwrap();
    assert!(users.contains(&alice));
    assert!(users.contains(&bob));

    alice_ws.close().await.unwrap();
    let left = bob_ws.recv_kind(EnvelopeType::Close).await.unwrap();
    assert_eq!(left.data["user"]["uname"], "alice");

    bob_ws.close().await.unwrap();
}

//! Test helpers for integration tests
//!
//! Provides utilities for spawning test gateways, making HTTP requests, and
//! driving WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Result};
use chat_common::{AppConfig, DirectoryBackend, GatewayConfig, RedisConfig};
use chat_core::UserProfile;
use chat_gateway::protocol::{Envelope, EnvelopeType};
use chat_gateway::{create_app, create_gateway_state};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::fixtures::init_user_data;

/// How long a client waits for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a gateway backed by the in-memory directory
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a gateway with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_gateway_state(config).await?;
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL of the gateway
    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a client connection and consume its welcome frame
    pub async fn connect(&self) -> Result<TestClient> {
        TestClient::connect(&self.ws_url()).await
    }
}

/// WebSocket client speaking the gateway protocol
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to `url` and expect the `connect` greeting
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url).await?;
        let mut client = Self { ws };
        client.recv_kind(EnvelopeType::Connect).await?;
        Ok(client)
    }

    /// Send a raw text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send `{"action": action, "data": data}`
    pub async fn send_action(&mut self, action: &str, data: Value) -> Result<()> {
        let frame = json!({ "action": action, "data": data });
        self.send_raw(&frame.to_string()).await
    }

    /// Send `init_user` for `user`
    pub async fn init_user(&mut self, user: &UserProfile) -> Result<()> {
        self.send_action("init_user", init_user_data(user)).await
    }

    /// Round-trip a `ping`.
    ///
    /// Frames from one connection are handled in order, so once the `pong`
    /// arrives every earlier request has been processed.
    pub async fn sync(&mut self) -> Result<()> {
        self.send_action("ping", json!({})).await?;
        self.recv_kind(EnvelopeType::Pong).await?;
        Ok(())
    }

    /// Next envelope, failing after a timeout
    pub async fn recv(&mut self) -> Result<Envelope> {
        loop {
            let frame = match tokio::time::timeout(RECV_TIMEOUT, self.ws.next()).await {
                Ok(Some(frame)) => frame?,
                Ok(None) => bail!("connection closed"),
                Err(_) => bail!("no frame within {RECV_TIMEOUT:?}"),
            };

            match frame {
                Message::Text(text) => return Ok(Envelope::decode(&text)?),
                Message::Close(_) => bail!("connection closed"),
                _ => {}
            }
        }
    }

    /// Next envelope, which must be of `kind`
    pub async fn recv_kind(&mut self, kind: EnvelopeType) -> Result<Envelope> {
        let envelope = self.recv().await?;
        if envelope.kind != kind {
            bail!("expected {kind}, got {}: {}", envelope.kind, envelope.data);
        }
        Ok(envelope)
    }

    /// Fail if any text frame arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected frame: {text}"),
            Ok(_) => Ok(()),
        }
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Gateway configuration for tests: memory directory, no idle timeout
pub fn test_config() -> AppConfig {
    let defaults = AppConfig::default();
    AppConfig {
        directory: DirectoryBackend::Memory,
        gateway: GatewayConfig {
            idle_timeout_secs: 0,
            ..defaults.gateway
        },
        ..defaults
    }
}

/// Configuration using Redis at `url`
pub fn redis_config(url: &str) -> AppConfig {
    AppConfig {
        directory: DirectoryBackend::Redis,
        redis: Some(RedisConfig {
            url: url.to_string(),
            max_connections: 4,
            timeout_ms: 500,
        }),
        ..test_config()
    }
}

/// Helper to check if a Redis instance is available for tests
pub fn redis_url() -> Option<String> {
    match std::env::var("REDIS_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: REDIS_URL not set");
            None
        }
    }
}

/// Assert response status and return the body text
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if status != expected_status {
        bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(body)
}

//! Integration tests for the realtime server.
//!
//! Each test starts the server in-process on an ephemeral port and drives it with
//! real WebSocket clients.

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Mutex, oneshot},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tsudoi_server::{
    config::ServerConfig,
    domain::RealtimeState,
    infrastructure::message_pusher::WebSocketMessagePusher,
    ui::Server,
    usecase::{EventDispatcher, GetPresenceSnapshotUseCase, SweepExpiredTypingUseCase},
};
use tsudoi_shared::time::SystemClock;

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    addr: SocketAddr,
    ws_path: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig {
            port: 0,
            ..ServerConfig::default()
        })
        .await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let state = Arc::new(Mutex::new(RealtimeState::new(config.typing_ttl_ms)));
        let clock = Arc::new(SystemClock);
        let message_pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
            HashMap::new(),
        ))));
        let server = Server::new(
            Arc::new(EventDispatcher::new(
                state.clone(),
                message_pusher,
                clock.clone(),
            )),
            Arc::new(GetPresenceSnapshotUseCase::new(state.clone(), clock.clone())),
            Arc::new(SweepExpiredTypingUseCase::new(state, clock)),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let ws_path = config.ws_path.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.serve(listener, config, shutdown).await {
                eprintln!("test server error: {e}");
            }
        });

        TestServer {
            addr,
            ws_path,
            shutdown: Some(shutdown_tx),
        }
    }

    fn ws_url(&self, user_id: Option<&str>) -> String {
        match user_id {
            Some(user_id) => format!("ws://{}{}?userId={}", self.addr, self.ws_path, user_id),
            None => format!("ws://{}{}", self.addr, self.ws_path),
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, user_id: Option<&str>) -> TestClient {
        let (ws, _response) = connect_async(self.ws_url(user_id))
            .await
            .expect("Failed to connect");
        TestClient { ws }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Helper struct wrapping a WebSocket client connection
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn send(&mut self, event: &str, data: Value) {
        let frame = json!({"event": event, "data": data}).to_string();
        self.ws
            .send(Message::Text(frame.into()))
            .await
            .expect("Failed to send frame");
    }

    async fn send_raw(&mut self, frame: &str) {
        self.ws
            .send(Message::Text(frame.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    /// Next event frame as (name, data)
    async fn recv(&mut self) -> (String, Value) {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(&text).expect("Frame is not JSON");
                let name = value["event"].as_str().expect("Frame has no event").to_string();
                return (name, value["data"].clone());
            }
        }
    }

    /// Skip frames until an event with the given name arrives
    async fn expect(&mut self, event: &str) -> Value {
        loop {
            let (name, data) = self.recv().await;
            if name == event {
                return data;
            }
        }
    }

    /// Join a text channel and wait until the join has been applied
    ///
    /// `typing:stop` always answers the whole room (sender included), and events
    /// from one connection are handled in order, so its reply follows the join.
    async fn join_channel(&mut self, channel_id: &str, user_id: &str) {
        self.send("channel:join", json!(channel_id)).await;
        self.barrier(channel_id, user_id).await;
    }

    async fn barrier(&mut self, channel_id: &str, user_id: &str) -> Vec<(String, Value)> {
        self.send(
            "typing:stop",
            json!({"channelId": channel_id, "userId": user_id}),
        )
        .await;
        let mut skipped = Vec::new();
        loop {
            let (name, data) = self.recv().await;
            if name == "typing:update" && data["channelId"] == channel_id {
                return skipped;
            }
            skipped.push((name, data));
        }
    }

    async fn join_voice(&mut self, channel_id: &str, user_id: &str) {
        self.send(
            "voice:join",
            json!({
                "channelId": channel_id,
                "user": {"id": user_id, "username": user_id, "avatar": null},
                "isMuted": false,
                "isCameraOn": false,
                "isDeafened": false
            }),
        )
        .await;
    }
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let body: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_new_connection_receives_presence_state() {
    // テスト項目: 接続直後にオンラインユーザーの一覧を受け取り、既存の接続には online が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let state = alice.expect("presence:state").await;
    assert_eq!(state["onlineUsers"], json!(["u1"]));

    // when (操作):
    let mut bob = server.connect(Some("u2")).await;

    // then (期待する結果):
    let state = bob.expect("presence:state").await;
    assert_eq!(state["onlineUsers"], json!(["u1", "u2"]));
    let update = alice.expect("presence:update").await;
    assert_eq!(update, json!({"userId": "u2", "isOnline": true}));
}

#[tokio::test]
async fn test_chat_message_relayed_without_echo() {
    // テスト項目: メッセージは同じチャンネルの他の接続へ中継され、送信者には返らない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut bob = server.connect(Some("u2")).await;
    alice.join_channel("c1", "u1").await;
    bob.join_channel("c1", "u2").await;

    // when (操作):
    alice
        .send(
            "message:send",
            json!({"channelId": "c1", "id": "m1", "content": "hello"}),
        )
        .await;

    // then (期待する結果):
    let message = bob.expect("message:new").await;
    assert_eq!(message["content"], "hello");
    assert_eq!(message["channelId"], "c1");

    let skipped = alice.barrier("c1", "u1").await;
    assert!(skipped.iter().all(|(name, _)| name != "message:new"));
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    // テスト項目: 不正なフレームは無視され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;

    // when (操作):
    alice.send_raw("not json").await;
    alice.send_raw(r#"{"event":"unknown:event","data":{}}"#).await;
    alice.send("message:send", json!("raw string body")).await;

    // then (期待する結果):
    alice.join_channel("c1", "u1").await;
}

#[tokio::test]
async fn test_typing_indicator_expires() {
    // テスト項目: 更新されない入力中表示は TTL を過ぎるとスナップショットから消える
    // given (前提条件):
    let server = TestServer::start_with(ServerConfig {
        port: 0,
        typing_ttl_ms: 2_000,
        ..ServerConfig::default()
    })
    .await;
    let mut alice = server.connect(Some("u1")).await;
    let mut bob = server.connect(Some("u2")).await;
    alice.join_channel("c1", "u1").await;
    bob.join_channel("c1", "u2").await;

    alice
        .send(
            "typing:start",
            json!({"channelId": "c1", "userId": "u1", "username": "alice"}),
        )
        .await;
    let update = bob.expect("typing:update").await;
    assert_eq!(update["users"], json!([{"id": "u1", "username": "alice"}]));

    // when (操作):
    tokio::time::sleep(Duration::from_millis(2_200)).await;
    bob.send("typing:stop", json!({"channelId": "c1", "userId": "u2"}))
        .await;

    // then (期待する結果):
    let update = bob.expect("typing:update").await;
    assert_eq!(update["users"], json!([]));
}

#[tokio::test]
async fn test_voice_channel_switch() {
    // テスト項目: ボイスチャンネルを切り替えると旧チャンネル・新チャンネルの順に名簿が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut observer = server.connect(Some("u2")).await;
    alice.join_voice("v1", "u1").await;
    let roster = observer.expect("voice:state-update").await;
    assert_eq!(roster["channelId"], "v1");
    assert_eq!(roster["users"][0]["userId"], "u1");

    // when (操作):
    alice.join_voice("v2", "u1").await;

    // then (期待する結果):
    let old = observer.expect("voice:state-update").await;
    assert_eq!(old["channelId"], "v1");
    assert_eq!(old["users"], json!([]));
    let new = observer.expect("voice:state-update").await;
    assert_eq!(new["channelId"], "v2");
    assert_eq!(new["users"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_abrupt_disconnect_cleans_up() {
    // テスト項目: ボイス参加中の接続が突然切れると名簿の更新と offline が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut observer = server.connect(Some("u2")).await;
    alice.join_voice("v1", "u1").await;
    observer.expect("voice:state-update").await;

    // when (操作):
    drop(alice);

    // then (期待する結果):
    let roster = observer.expect("voice:state-update").await;
    assert_eq!(roster["channelId"], "v1");
    assert_eq!(roster["users"], json!([]));
    let update = observer.expect("presence:update").await;
    assert_eq!(update, json!({"userId": "u1", "isOnline": false}));

    let snapshot: Value = reqwest::get(server.http_url("/api/presence"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["onlineUsers"], json!(["u2"]));
    assert_eq!(snapshot["voiceChannels"], json!([]));
}

#[tokio::test]
async fn test_guest_connection_is_not_announced() {
    // テスト項目: ゲスト接続はプレゼンスに現れないが、全体宛ての通知は受け取る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut guest = server.connect(None).await;
    let state = guest.expect("presence:state").await;
    assert_eq!(state["onlineUsers"], json!([]));

    // when (操作):
    let _alice = server.connect(Some("u1")).await;

    // then (期待する結果):
    let update = guest.expect("presence:update").await;
    assert_eq!(update, json!({"userId": "u1", "isOnline": true}));
}

// In-process stand-in for the simulation server. Each test spawns its own on
// an ephemeral port and scripts it through the handle below.
#![allow(dead_code)] // not every test binary uses every helper

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// One recorded POST against a config endpoint.
#[derive(Debug)]
pub struct TuningCall {
    pub endpoint: &'static str,
    pub body: serde_json::Value,
}

pub struct StubSim {
    pub base_url: String,
    /// Snapshot frames pushed to every connected stream socket.
    pub frames: broadcast::Sender<String>,
    /// Commands received over the stream, decoded as raw JSON.
    pub commands_rx: mpsc::Receiver<serde_json::Value>,
    pub tuning_rx: mpsc::Receiver<TuningCall>,
    /// Cumulative count of accepted stream sockets.
    pub connections: Arc<AtomicU32>,
    pub world_requests: Arc<AtomicU32>,
    kicks: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

#[derive(Clone)]
struct StubState {
    frames: broadcast::Sender<String>,
    kicks: broadcast::Sender<()>,
    commands_tx: mpsc::Sender<serde_json::Value>,
    tuning_tx: mpsc::Sender<TuningCall>,
    connections: Arc<AtomicU32>,
    world_requests: Arc<AtomicU32>,
    world_failures: Arc<AtomicU32>,
}

impl StubSim {
    /// Boot the stub. The first `world_failures` requests against
    /// /config/world answer 500 before the endpoint starts succeeding.
    pub async fn spawn(world_failures: u32) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");

        let (frames, _) = broadcast::channel(64);
        let (kicks, _) = broadcast::channel(8);
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (tuning_tx, tuning_rx) = mpsc::channel(64);
        let connections = Arc::new(AtomicU32::new(0));
        let world_requests = Arc::new(AtomicU32::new(0));

        let state = StubState {
            frames: frames.clone(),
            kicks: kicks.clone(),
            commands_tx,
            tuning_tx,
            connections: connections.clone(),
            world_requests: world_requests.clone(),
            world_failures: Arc::new(AtomicU32::new(world_failures)),
        };

        let app = Router::new()
            .route("/config/world", get(world_handler))
            .route("/config/speed", post(speed_handler))
            .route("/config/ai_level", post(ai_level_handler))
            .route("/simulation", get(stream_handler))
            .with_state(state);

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            frames,
            commands_rx,
            tuning_rx,
            connections,
            world_requests,
            kicks,
            task,
        }
    }

    /// Push one frame, waiting for a stream subscriber first so frames sent
    /// right after a (re)connect cannot fall into the void.
    pub async fn send_frame(&self, frame: &serde_json::Value) {
        self.send_frame_text(&frame.to_string()).await;
    }

    pub async fn send_frame_text(&self, frame: &str) {
        self.wait_for_subscribers(1).await;
        let _ = self.frames.send(frame.to_string());
    }

    pub async fn wait_for_subscribers(&self, count: usize) {
        for _ in 0..400 {
            if self.frames.receiver_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("stream subscriber count never reached {count}");
    }

    /// Drop every connected stream socket without touching the listener.
    pub fn kick_all(&self) {
        let _ = self.kicks.send(());
    }

    pub async fn next_command(&mut self) -> serde_json::Value {
        tokio::time::timeout(Duration::from_secs(5), self.commands_rx.recv())
            .await
            .expect("command within deadline")
            .expect("stub server alive")
    }

    pub async fn expect_no_command(&mut self, wait: Duration) {
        if let Ok(Some(value)) = tokio::time::timeout(wait, self.commands_rx.recv()).await {
            panic!("unexpected command: {value}");
        }
    }

    pub async fn next_tuning_call(&mut self) -> TuningCall {
        tokio::time::timeout(Duration::from_secs(5), self.tuning_rx.recv())
            .await
            .expect("tuning call within deadline")
            .expect("stub server alive")
    }
}

impl Drop for StubSim {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn world_handler(State(state): State<StubState>) -> Response {
    state.world_requests.fetch_add(1, Ordering::SeqCst);
    if state.world_failures.load(Ordering::SeqCst) > 0 {
        state.world_failures.fetch_sub(1, Ordering::SeqCst);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(serde_json::json!({ "world_width": 1200.0, "world_height": 800.0 })).into_response()
}

async fn speed_handler(
    State(state): State<StubState>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let _ = state
        .tuning_tx
        .send(TuningCall {
            endpoint: "speed",
            body,
        })
        .await;
    StatusCode::OK
}

async fn ai_level_handler(
    State(state): State<StubState>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let _ = state
        .tuning_tx
        .send(TuningCall {
            endpoint: "ai_level",
            body,
        })
        .await;
    StatusCode::OK
}

async fn stream_handler(State(state): State<StubState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_socket(socket, state))
}

async fn stream_socket(mut socket: WebSocket, state: StubState) {
    state.connections.fetch_add(1, Ordering::SeqCst);
    let mut frames = state.frames.subscribe();
    let mut kicks = state.kicks.subscribe();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => {}
            },

            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(value) = serde_json::from_str(&text) {
                        let _ = state.commands_tx.send(value).await;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },

            _ = kicks.recv() => break,
        }
    }
}

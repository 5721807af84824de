// Streaming session against the simulation server. One task owns the socket
// and walks Disconnected → Connecting → Open forever; everything the rest of
// the client learns about the session arrives through the event queue.

use crate::interface_adapters::protocol::{CommandDto, SnapshotDto};
use crate::use_cases::{ControlRequest, SessionEvent};

use futures::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, error, info, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Full ws:// or wss:// endpoint of the simulation stream.
    pub endpoint: String,
    /// Fixed delay between reconnect attempts. The retry loop never gives up.
    pub reconnect_delay: Duration,
}

/// Handle owning the streaming session. Constructing it starts the session
/// task; there is no separate connect call to repeat, so a client instance
/// can never hold more than one live socket. Dropping the handle tears the
/// session down.
pub struct SimSession {
    task: JoinHandle<()>,
}

impl SimSession {
    pub fn connect(
        config: SessionConfig,
        events_tx: mpsc::Sender<SessionEvent>,
        control_rx: mpsc::Receiver<ControlRequest>,
    ) -> Self {
        Self {
            task: tokio::spawn(session_task(config, events_tx, control_rx)),
        }
    }

    pub fn shutdown(self) {
        // Drop does the work.
    }
}

impl Drop for SimSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// Why a session ended, as seen from the main loop's side of the socket.
enum SessionEnd {
    Remote { reason: String },
    Shutdown,
}

enum FrameOutcome {
    Continue,
    Closed(String),
    ConsumerGone,
}

#[derive(Default)]
struct SessionStats {
    frames_in: u64,
    bytes_in: u64,
    commands_out: u64,
    bytes_out: u64,
    invalid_frames: u32,
}

async fn session_task(
    config: SessionConfig,
    events_tx: mpsc::Sender<SessionEvent>,
    mut control_rx: mpsc::Receiver<ControlRequest>,
) {
    let mut attempt: u64 = 0;
    let mut last_drop_log = Instant::now() - LOG_THROTTLE;

    loop {
        attempt += 1;
        if events_tx
            .send(SessionEvent::Connecting { attempt })
            .await
            .is_err()
        {
            return;
        }
        info!(endpoint = %config.endpoint, attempt, "connecting to simulation stream");

        match establish(&config.endpoint, &mut control_rx, &mut last_drop_log).await {
            Ok(Some(socket)) => {
                attempt = 0;
                if events_tx.send(SessionEvent::Opened).await.is_err() {
                    return;
                }
                info!("simulation stream open");

                match run_session(socket, &events_tx, &mut control_rx, &mut last_drop_log).await {
                    SessionEnd::Remote { reason } => {
                        if events_tx
                            .send(SessionEvent::Closed { reason })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    SessionEnd::Shutdown => return,
                }
            }
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "connect failed");
                if events_tx
                    .send(SessionEvent::Closed {
                        reason: format!("connect failed: {e}"),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }

        if !backoff(config.reconnect_delay, &mut control_rx, &mut last_drop_log).await {
            return;
        }
    }
}

// Dial the endpoint while draining commands, which cannot be delivered yet.
// Ok(None) means the command side hung up and the task should exit.
async fn establish(
    endpoint: &str,
    control_rx: &mut mpsc::Receiver<ControlRequest>,
    last_drop_log: &mut Instant,
) -> Result<Option<WsStream>, tungstenite::Error> {
    let connect = connect_async(endpoint);
    tokio::pin!(connect);

    loop {
        tokio::select! {
            result = &mut connect => {
                return result.map(|(socket, _response)| Some(socket));
            }
            request = control_rx.recv() => match request {
                Some(request) => drop_command(request, "connecting", last_drop_log),
                None => return Ok(None),
            }
        }
    }
}

async fn run_session(
    mut socket: WsStream,
    events_tx: &mpsc::Sender<SessionEvent>,
    control_rx: &mut mpsc::Receiver<ControlRequest>,
    last_invalid_log: &mut Instant,
) -> SessionEnd {
    let mut stats = SessionStats::default();

    let end = loop {
        tokio::select! {
            incoming = socket.next() => {
                match handle_frame(incoming, events_tx, &mut stats, last_invalid_log).await {
                    FrameOutcome::Continue => {}
                    FrameOutcome::Closed(reason) => break SessionEnd::Remote { reason },
                    FrameOutcome::ConsumerGone => break SessionEnd::Shutdown,
                }
            }

            request = control_rx.recv() => match request {
                Some(request) => {
                    if let Err(e) = send_command(&mut socket, request, &mut stats).await {
                        warn!(error = %e, "failed to send command");
                        break SessionEnd::Remote { reason: format!("send failed: {e}") };
                    }
                }
                None => break SessionEnd::Shutdown,
            }
        }
    };

    let _ = socket.close(None).await;
    debug!(
        frames_in = stats.frames_in,
        bytes_in = stats.bytes_in,
        commands_out = stats.commands_out,
        bytes_out = stats.bytes_out,
        invalid_frames = stats.invalid_frames,
        "session stats"
    );
    end
}

// One inbound websocket message. A frame that fails to decode is dropped
// without touching the connection.
async fn handle_frame(
    incoming: Option<Result<Message, tungstenite::Error>>,
    events_tx: &mpsc::Sender<SessionEvent>,
    stats: &mut SessionStats,
    last_invalid_log: &mut Instant,
) -> FrameOutcome {
    match incoming {
        Some(Ok(Message::Text(text))) => {
            stats.frames_in += 1;
            stats.bytes_in += text.len() as u64;

            match serde_json::from_str::<SnapshotDto>(&text) {
                Ok(dto) => {
                    // Awaiting the send keeps frames ordered under backpressure.
                    if events_tx
                        .send(SessionEvent::Frame(dto.into()))
                        .await
                        .is_err()
                    {
                        return FrameOutcome::ConsumerGone;
                    }
                    FrameOutcome::Continue
                }
                Err(parse_err) => {
                    stats.invalid_frames += 1;
                    if should_log(last_invalid_log) {
                        warn!(
                            bytes = text.len(),
                            error = %parse_err,
                            "failed to decode frame; dropping"
                        );
                    }
                    FrameOutcome::Continue
                }
            }
        }
        Some(Ok(Message::Binary(payload))) => {
            stats.invalid_frames += 1;
            if should_log(last_invalid_log) {
                warn!(bytes = payload.len(), "binary frame ignored");
            }
            FrameOutcome::Continue
        }
        Some(Ok(Message::Close(frame))) => {
            let reason = match frame {
                Some(frame) => format!("closed by server: {} ({})", &*frame.reason, u16::from(frame.code)),
                None => "closed by server".to_string(),
            };
            FrameOutcome::Closed(reason)
        }
        // Ping/pong keepalives are answered inside the stream.
        Some(Ok(_)) => FrameOutcome::Continue,
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            FrameOutcome::Closed(format!("recv error: {e}"))
        }
        None => FrameOutcome::Closed("stream ended".to_string()),
    }
}

async fn send_command(
    socket: &mut WsStream,
    request: ControlRequest,
    stats: &mut SessionStats,
) -> Result<(), tungstenite::Error> {
    let dto = CommandDto::from(request);
    // Serialize safely; log JSON errors instead of panicking.
    let txt = match serde_json::to_string(&dto) {
        Ok(txt) => txt,
        Err(e) => {
            error!(error = ?e, "failed to serialize command");
            return Ok(());
        }
    };
    let bytes = txt.len();
    socket.send(Message::Text(txt.into())).await?;
    stats.commands_out += 1;
    stats.bytes_out += bytes as u64;
    Ok(())
}

// Sleep out the reconnect delay while draining commands. False means the
// command side hung up and the task should exit.
async fn backoff(
    delay: Duration,
    control_rx: &mut mpsc::Receiver<ControlRequest>,
    last_drop_log: &mut Instant,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            request = control_rx.recv() => match request {
                Some(request) => drop_command(request, "disconnected", last_drop_log),
                None => return false,
            }
        }
    }
}

// The operator has to re-issue commands once the session is open again.
fn drop_command(request: ControlRequest, state: &'static str, last_drop_log: &mut Instant) {
    if should_log(last_drop_log) {
        warn!(?request, state, "session not open; dropping command");
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

use std::{env, time::Duration};

// Runtime constants (not battle tuning).

pub fn server_base_url() -> String {
    env::var("SIM_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

pub fn reconnect_delay() -> Duration {
    let millis = env::var("RECONNECT_DELAY_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(3000);
    Duration::from_millis(millis)
}

pub fn world_fetch_attempts() -> u32 {
    env::var("WORLD_FETCH_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5)
}

pub fn world_fetch_retry_delay() -> Duration {
    let millis = env::var("WORLD_FETCH_RETRY_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(2000);
    Duration::from_millis(millis)
}

pub fn http_timeout() -> Duration {
    let millis = env::var("HTTP_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub const EVENT_CHANNEL_CAPACITY: usize = 256;
pub const CONTROL_CHANNEL_CAPACITY: usize = 32;
pub const TUNING_CHANNEL_CAPACITY: usize = 32;
pub const INPUT_CHANNEL_CAPACITY: usize = 64;

// 20 redraws per second; the server streams faster than the eye needs.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Streaming endpoint derived from the HTTP base URL. None when the base URL
/// does not parse or carries a scheme with no websocket counterpart.
pub fn stream_endpoint(base_url: &str) -> Option<String> {
    let parsed = url::Url::parse(base_url).ok()?;
    let scheme = match parsed.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return None,
    };
    let host = parsed.host_str()?;
    let endpoint = match parsed.port() {
        Some(port) => format!("{scheme}://{host}:{port}/simulation"),
        None => format!("{scheme}://{host}/simulation"),
    };
    Some(endpoint)
}

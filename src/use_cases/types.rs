use crate::domain::Snapshot;

/// State of the streaming session as seen by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connecting,
    Connected,
    #[default]
    Disconnected,
}

/// Events posted by the session task into the single-consumer queue. The
/// consumer applies them in arrival order; that ordering is the only thing
/// keeping snapshot application sequential.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connecting { attempt: u64 },
    Opened,
    Frame(Snapshot),
    Closed { reason: String },
}

/// Force composition for a new engagement. The server reads explicit counts
/// first and falls back to the scenario id only when both counts are absent,
/// so a scenario start leaves the counts unset. Counts are clamped to the
/// accepted range before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleConfig {
    pub num_friendly: Option<u32>,
    pub num_enemy: Option<u32>,
    pub scenario_id: Option<String>,
}

impl BattleConfig {
    /// Per-side counts chosen by the operator.
    pub fn custom(num_friendly: u32, num_enemy: u32) -> Self {
        Self {
            num_friendly: Some(num_friendly),
            num_enemy: Some(num_enemy),
            scenario_id: None,
        }
    }

    /// Composition delegated to a named server-side scenario.
    pub fn scenario(id: impl Into<String>) -> Self {
        Self {
            num_friendly: None,
            num_enemy: None,
            scenario_id: Some(id.into()),
        }
    }
}

/// Operator commands carried over the streaming session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Start(BattleConfig),
    Pause,
    Resume,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiLevel {
    Basic,
    #[default]
    Normal,
    Advanced,
    Adaptive,
}

impl AiLevel {
    /// Next level in presentation order, wrapping around.
    pub fn cycled(self) -> Self {
        match self {
            AiLevel::Basic => AiLevel::Normal,
            AiLevel::Normal => AiLevel::Advanced,
            AiLevel::Advanced => AiLevel::Adaptive,
            AiLevel::Adaptive => AiLevel::Basic,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AiLevel::Basic => "basic",
            AiLevel::Normal => "normal",
            AiLevel::Advanced => "advanced",
            AiLevel::Adaptive => "adaptive",
        }
    }
}

/// Tuning requests carried over HTTP, independent of the streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum TuningRequest {
    Speed { multiplier: f64 },
    AiLevel { level: AiLevel },
}

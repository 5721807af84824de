// World state as reported by the simulation server. The server is
// authoritative; nothing in here is ever mutated locally between frames.

/// Lifecycle of the remote simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Friendly,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneRole {
    Interceptor,
    GroundAttack,
    AirToAir,
}

/// Kinds of short-lived visual events the server emits alongside world state.
/// Unknown covers kinds introduced server-side that this build does not draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    WeaponFire,
    CommLink,
    Neutralization,
    Unknown,
}

/// A point in world coordinates. The origin is the top-left corner and the
/// y axis grows downward, matching the server's convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drone {
    pub id: String,
    pub team: Team,
    pub role: DroneRole,
    pub position: Position,
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: String,
    pub position: Position,
    pub health: i32,
}

impl Asset {
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0
    }
}

/// A transient effect (tracer, comm pulse, kill flash) with a lifetime in
/// seconds. The ttl counts from the moment this client first sees the id.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEvent {
    pub id: String,
    pub kind: EventKind,
    pub position: Position,
    pub target_position: Option<Position>,
    pub team: Option<Team>,
    pub ttl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub assets_saved: u32,
    pub neutralizations: u32,
    pub friendly_losses: u32,
    pub avg_interception_time: f64,
    pub percent_unattended_hostiles: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationTarget {
    pub source_id: String,
    pub target_id: String,
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwarmStateSummary {
    pub status: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Analysis {
    pub coordination_targets: Vec<CoordinationTarget>,
    pub swarm_state: Vec<SwarmStateSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationState {
    pub status: SimStatus,
    pub time: f64,
}

/// One full frame of world state. Each inbound frame fully replaces the
/// previous one; there is no merging and no history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub simulation_state: SimulationState,
    pub drones: Vec<Drone>,
    pub assets: Vec<Asset>,
    pub visual_events: Vec<VisualEvent>,
    pub metrics: Metrics,
    pub event_log: Vec<LogEntry>,
    pub analysis: Analysis,
}

// Wire protocol DTOs and conversions for the simulation server. Every
// inbound collection defaults to empty; the server omits sections freely and
// a missing panel must never cost us the frame.

use crate::domain::{
    Analysis, Asset, CoordinationTarget, Drone, DroneRole, EventKind, LogEntry, Metrics, Position,
    SimStatus, SimulationState, Snapshot, SwarmStateSummary, Team, VisualEvent,
};
use crate::use_cases::{BattleConfig, ControlRequest};

use serde::{Deserialize, Serialize};

/// One streamed frame of world state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotDto {
    #[serde(default)]
    pub simulation_state: SimulationStateDto,
    #[serde(default)]
    pub drones: Vec<DroneDto>,
    #[serde(default)]
    pub assets: Vec<AssetDto>,
    #[serde(default)]
    pub visual_events: Vec<VisualEventDto>,
    #[serde(default)]
    pub metrics: MetricsDto,
    #[serde(default)]
    pub event_log: Vec<LogEntryDto>,
    #[serde(default)]
    pub analysis: AnalysisDto,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SimulationStateDto {
    #[serde(default)]
    pub status: SimStatusDto,
    #[serde(default)]
    pub time: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimStatusDto {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamDto {
    Friendly,
    Enemy,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneRoleDto {
    #[default]
    Interceptor,
    GroundAttack,
    AirToAir,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PositionDto {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DroneDto {
    pub id: String,
    pub team: TeamDto,
    #[serde(rename = "type", default)]
    pub role: DroneRoleDto,
    pub position: PositionDto,
    // Sent by the server but not drawn; accepted so frames decode whole.
    #[serde(default)]
    pub velocity: PositionDto,
    #[serde(default)]
    pub status: String,
    #[serde(default = "full_health")]
    pub health: i32,
    #[serde(default)]
    pub target_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetDto {
    pub id: String,
    pub position: PositionDto,
    #[serde(default = "full_health")]
    pub health: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualEventDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKindDto,
    pub position: PositionDto,
    #[serde(default)]
    pub target_position: Option<PositionDto>,
    #[serde(default)]
    pub team: Option<TeamDto>,
    #[serde(default)]
    pub ttl: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKindDto {
    WeaponFire,
    CommLink,
    Neutralization,
    // Kinds added server-side decode instead of failing the frame.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MetricsDto {
    #[serde(default)]
    pub assets_saved: u32,
    #[serde(default)]
    pub neutralizations: u32,
    #[serde(default)]
    pub friendly_losses: u32,
    #[serde(default)]
    pub avg_interception_time: f64,
    #[serde(default)]
    pub percent_unattended_hostiles: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEntryDto {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisDto {
    #[serde(default)]
    pub coordination_targets: Vec<CoordinationTargetDto>,
    #[serde(default)]
    pub swarm_state: Vec<SwarmStateSummaryDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinationTargetDto {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub distance: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwarmStateSummaryDto {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub count: u32,
}

fn full_health() -> i32 {
    100
}

impl From<SnapshotDto> for Snapshot {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            simulation_state: dto.simulation_state.into(),
            drones: dto.drones.into_iter().map(Drone::from).collect(),
            assets: dto.assets.into_iter().map(Asset::from).collect(),
            visual_events: dto
                .visual_events
                .into_iter()
                .map(VisualEvent::from)
                .collect(),
            metrics: dto.metrics.into(),
            event_log: dto.event_log.into_iter().map(LogEntry::from).collect(),
            analysis: dto.analysis.into(),
        }
    }
}

impl From<SimulationStateDto> for SimulationState {
    fn from(dto: SimulationStateDto) -> Self {
        Self {
            status: dto.status.into(),
            time: dto.time,
        }
    }
}

impl From<SimStatusDto> for SimStatus {
    fn from(dto: SimStatusDto) -> Self {
        match dto {
            SimStatusDto::Idle => SimStatus::Idle,
            SimStatusDto::Running => SimStatus::Running,
            SimStatusDto::Paused => SimStatus::Paused,
            SimStatusDto::Finished => SimStatus::Finished,
        }
    }
}

impl From<TeamDto> for Team {
    fn from(dto: TeamDto) -> Self {
        match dto {
            TeamDto::Friendly => Team::Friendly,
            TeamDto::Enemy => Team::Enemy,
        }
    }
}

impl From<DroneRoleDto> for DroneRole {
    fn from(dto: DroneRoleDto) -> Self {
        match dto {
            DroneRoleDto::Interceptor => DroneRole::Interceptor,
            DroneRoleDto::GroundAttack => DroneRole::GroundAttack,
            DroneRoleDto::AirToAir => DroneRole::AirToAir,
        }
    }
}

impl From<EventKindDto> for EventKind {
    fn from(dto: EventKindDto) -> Self {
        match dto {
            EventKindDto::WeaponFire => EventKind::WeaponFire,
            EventKindDto::CommLink => EventKind::CommLink,
            EventKindDto::Neutralization => EventKind::Neutralization,
            EventKindDto::Unknown => EventKind::Unknown,
        }
    }
}

impl From<PositionDto> for Position {
    fn from(dto: PositionDto) -> Self {
        Self { x: dto.x, y: dto.y }
    }
}

impl From<DroneDto> for Drone {
    fn from(dto: DroneDto) -> Self {
        Self {
            id: dto.id,
            team: dto.team.into(),
            role: dto.role.into(),
            position: dto.position.into(),
            health: dto.health,
        }
    }
}

impl From<AssetDto> for Asset {
    fn from(dto: AssetDto) -> Self {
        Self {
            id: dto.id,
            position: dto.position.into(),
            health: dto.health,
        }
    }
}

impl From<VisualEventDto> for VisualEvent {
    fn from(dto: VisualEventDto) -> Self {
        Self {
            id: dto.id,
            kind: dto.kind.into(),
            position: dto.position.into(),
            target_position: dto.target_position.map(Position::from),
            team: dto.team.map(Team::from),
            ttl: dto.ttl,
        }
    }
}

impl From<MetricsDto> for Metrics {
    fn from(dto: MetricsDto) -> Self {
        Self {
            assets_saved: dto.assets_saved,
            neutralizations: dto.neutralizations,
            friendly_losses: dto.friendly_losses,
            avg_interception_time: dto.avg_interception_time,
            percent_unattended_hostiles: dto.percent_unattended_hostiles,
        }
    }
}

impl From<LogEntryDto> for LogEntry {
    fn from(dto: LogEntryDto) -> Self {
        Self {
            time: dto.time,
            message: dto.message,
        }
    }
}

impl From<AnalysisDto> for Analysis {
    fn from(dto: AnalysisDto) -> Self {
        Self {
            coordination_targets: dto
                .coordination_targets
                .into_iter()
                .map(CoordinationTarget::from)
                .collect(),
            swarm_state: dto
                .swarm_state
                .into_iter()
                .map(SwarmStateSummary::from)
                .collect(),
        }
    }
}

impl From<CoordinationTargetDto> for CoordinationTarget {
    fn from(dto: CoordinationTargetDto) -> Self {
        Self {
            source_id: dto.source_id,
            target_id: dto.target_id,
            distance: dto.distance,
        }
    }
}

impl From<SwarmStateSummaryDto> for SwarmStateSummary {
    fn from(dto: SwarmStateSummaryDto) -> Self {
        Self {
            status: dto.status,
            count: dto.count,
        }
    }
}

/// Commands sent to the server over the streaming session. The tag is a flat
/// `command` field next to the payload fields, matching the server schema.
/// Absent start fields are omitted; the server falls back to the scenario id
/// only when it sees no counts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandDto {
    Start {
        #[serde(skip_serializing_if = "Option::is_none")]
        scenario_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        num_friendly: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        num_enemy: Option<u32>,
    },
    Pause,
    Resume,
    Reset,
}

impl From<ControlRequest> for CommandDto {
    fn from(request: ControlRequest) -> Self {
        match request {
            ControlRequest::Start(BattleConfig {
                num_friendly,
                num_enemy,
                scenario_id,
            }) => CommandDto::Start {
                scenario_id,
                num_friendly,
                num_enemy,
            },
            ControlRequest::Pause => CommandDto::Pause,
            ControlRequest::Resume => CommandDto::Resume,
            ControlRequest::Reset => CommandDto::Reset,
        }
    }
}

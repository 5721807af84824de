// Domain layer: the simulation world model and pure geometry.

pub mod geometry;
pub mod world;

pub use geometry::{ScreenPoint, WorldDimensions, bearing, distance, to_screen};
pub use world::{
    Analysis, Asset, CoordinationTarget, Drone, DroneRole, EventKind, LogEntry, Metrics, Position,
    SimStatus, SimulationState, Snapshot, SwarmStateSummary, Team, VisualEvent,
};

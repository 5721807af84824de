// Use cases layer: application workflows for the operator console.

pub mod commands;
pub mod ephemeral;
pub mod scene;
pub mod store;
pub mod types;

pub use commands::{CommandDispatcher, MAX_FORCE_SIZE, MIN_FORCE_SIZE};
pub use ephemeral::{EmissionTracker, EventVisual, event_visual};
pub use scene::{EntityKind, EntityVisual, SceneOp, SceneReconciler};
pub use store::{SessionView, SnapshotStore};
pub use types::{AiLevel, BattleConfig, ConnectionState, ControlRequest, SessionEvent, TuningRequest};

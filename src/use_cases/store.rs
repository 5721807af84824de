use crate::domain::{SimStatus, Snapshot};
use crate::use_cases::types::{ConnectionState, SessionEvent};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// What the display reads: the latest snapshot plus connectivity. The
/// snapshot stays None until the first frame arrives and survives
/// disconnects, so the last known world stays on screen while the link is
/// down.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub connection: ConnectionState,
    pub snapshot: Option<Snapshot>,
}

/// Single writable point of truth between the session task and the display.
/// Writers replace the whole snapshot atomically; readers either clone the
/// current view or watch for changes.
#[derive(Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<SessionView>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionView::default());
        Self { tx: Arc::new(tx) }
    }

    /// Replace the held snapshot with a new frame and notify watchers.
    pub fn update(&self, snapshot: Snapshot) {
        self.tx.send_modify(|view| view.snapshot = Some(snapshot));
    }

    pub fn set_connection(&self, connection: ConnectionState) {
        self.tx.send_if_modified(|view| {
            let changed = view.connection != connection;
            view.connection = connection;
            changed
        });
    }

    /// Apply one session event. Keeping every store mutation on this single
    /// path is what makes snapshot application strictly ordered.
    pub fn apply_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connecting { attempt } => {
                debug!(attempt, "session connecting");
                self.set_connection(ConnectionState::Connecting);
            }
            SessionEvent::Opened => {
                self.set_connection(ConnectionState::Connected);
            }
            SessionEvent::Frame(snapshot) => {
                self.update(snapshot);
            }
            SessionEvent::Closed { reason } => {
                info!(%reason, "session closed");
                self.set_connection(ConnectionState::Disconnected);
            }
        }
    }

    pub fn current(&self) -> SessionView {
        self.tx.borrow().clone()
    }

    /// Status of the last seen frame; Idle while no frame has arrived yet.
    pub fn status(&self) -> SimStatus {
        self.tx
            .borrow()
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.simulation_state.status)
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SimulationState;

    fn frame(time: f64, status: SimStatus) -> Snapshot {
        Snapshot {
            simulation_state: SimulationState { status, time },
            ..Snapshot::default()
        }
    }

    #[test]
    fn when_no_frame_has_arrived_then_view_holds_the_empty_sentinel() {
        let store = SnapshotStore::new();
        let view = store.current();
        assert!(view.snapshot.is_none());
        assert_eq!(view.connection, ConnectionState::Disconnected);
        assert_eq!(store.status(), SimStatus::Idle);
    }

    #[test]
    fn when_a_frame_is_applied_then_it_fully_replaces_the_previous_one() {
        let store = SnapshotStore::new();
        store.update(frame(1.0, SimStatus::Running));
        store.update(frame(2.5, SimStatus::Paused));

        let view = store.current();
        let snapshot = view.snapshot.expect("snapshot should be present");
        assert_eq!(snapshot.simulation_state.time, 2.5);
        assert_eq!(store.status(), SimStatus::Paused);
    }

    #[test]
    fn when_a_frame_is_applied_then_watchers_are_notified() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().expect("store should be alive"));

        store.update(frame(1.0, SimStatus::Running));
        assert!(rx.has_changed().expect("store should be alive"));
    }

    #[test]
    fn when_the_session_closes_then_the_last_snapshot_is_retained() {
        let store = SnapshotStore::new();
        store.apply_event(SessionEvent::Opened);
        store.apply_event(SessionEvent::Frame(frame(3.0, SimStatus::Running)));
        store.apply_event(SessionEvent::Closed {
            reason: "stream ended".to_string(),
        });

        let view = store.current();
        assert_eq!(view.connection, ConnectionState::Disconnected);
        assert!(view.snapshot.is_some());
    }

    #[test]
    fn when_connection_events_arrive_then_connection_state_tracks_them() {
        let store = SnapshotStore::new();
        store.apply_event(SessionEvent::Connecting { attempt: 1 });
        assert_eq!(store.current().connection, ConnectionState::Connecting);
        store.apply_event(SessionEvent::Opened);
        assert_eq!(store.current().connection, ConnectionState::Connected);
    }
}

use crate::domain::SimStatus;
use crate::use_cases::store::SnapshotStore;
use crate::use_cases::types::{AiLevel, BattleConfig, ControlRequest, TuningRequest};

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Smallest force size the server accepts per side.
pub const MIN_FORCE_SIZE: u32 = 1;
/// Largest force size the server accepts per side.
pub const MAX_FORCE_SIZE: u32 = 20;

/// Slowest speed multiplier the server accepts.
pub const MIN_SPEED_MULTIPLIER: f64 = 0.1;

/// Translates operator intents into outbound requests. Every accepted intent
/// maps to exactly one queued message; an intent that does not apply to the
/// current simulation status is dropped. Delivery is fire and forget: the
/// next snapshot is the only confirmation.
#[derive(Clone)]
pub struct CommandDispatcher {
    store: SnapshotStore,
    control_tx: mpsc::Sender<ControlRequest>,
    tuning_tx: mpsc::Sender<TuningRequest>,
}

impl CommandDispatcher {
    pub fn new(
        store: SnapshotStore,
        control_tx: mpsc::Sender<ControlRequest>,
        tuning_tx: mpsc::Sender<TuningRequest>,
    ) -> Self {
        Self {
            store,
            control_tx,
            tuning_tx,
        }
    }

    /// Start an engagement. Only valid while the simulation is idle; force
    /// counts, when set, are clamped into the accepted range, never rejected.
    pub fn start(&self, config: BattleConfig) {
        let status = self.store.status();
        if status != SimStatus::Idle {
            debug!(?status, "start ignored; simulation is not idle");
            return;
        }

        let config = BattleConfig {
            num_friendly: config
                .num_friendly
                .map(|count| count.clamp(MIN_FORCE_SIZE, MAX_FORCE_SIZE)),
            num_enemy: config
                .num_enemy
                .map(|count| count.clamp(MIN_FORCE_SIZE, MAX_FORCE_SIZE)),
            scenario_id: config.scenario_id,
        };
        self.send_control(ControlRequest::Start(config));
    }

    pub fn pause(&self) {
        let status = self.store.status();
        if status != SimStatus::Running {
            debug!(?status, "pause ignored; simulation is not running");
            return;
        }
        self.send_control(ControlRequest::Pause);
    }

    pub fn resume(&self) {
        let status = self.store.status();
        if status != SimStatus::Paused {
            debug!(?status, "resume ignored; simulation is not paused");
            return;
        }
        self.send_control(ControlRequest::Resume);
    }

    pub fn reset(&self) {
        let status = self.store.status();
        if status == SimStatus::Idle {
            debug!("reset ignored; simulation is already idle");
            return;
        }
        self.send_control(ControlRequest::Reset);
    }

    /// Set the simulation speed multiplier. Clamped to the server's floor;
    /// there is no upper bound on the wire.
    pub fn set_speed(&self, multiplier: f64) {
        if !multiplier.is_finite() {
            warn!(multiplier, "speed ignored; multiplier is not finite");
            return;
        }
        let multiplier = multiplier.max(MIN_SPEED_MULTIPLIER);
        self.send_tuning(TuningRequest::Speed { multiplier });
    }

    pub fn set_ai_level(&self, level: AiLevel) {
        self.send_tuning(TuningRequest::AiLevel { level });
    }

    // Requests are dropped on a full or closed queue; the operator retries by
    // pressing the key again.
    fn send_control(&self, request: ControlRequest) {
        match self.control_tx.try_send(request) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(request)) => {
                warn!(?request, "control queue full; dropping command");
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                warn!(?request, "session gone; dropping command");
            }
        }
    }

    fn send_tuning(&self, request: TuningRequest) {
        match self.tuning_tx.try_send(request) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(request)) => {
                warn!(?request, "tuning queue full; dropping request");
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                warn!(?request, "tuning client gone; dropping request");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SimulationState, Snapshot};

    fn store_with_status(status: SimStatus) -> SnapshotStore {
        let store = SnapshotStore::new();
        store.update(Snapshot {
            simulation_state: SimulationState { status, time: 1.0 },
            ..Snapshot::default()
        });
        store
    }

    fn dispatcher(
        status: SimStatus,
    ) -> (
        CommandDispatcher,
        mpsc::Receiver<ControlRequest>,
        mpsc::Receiver<TuningRequest>,
    ) {
        let (control_tx, control_rx) = mpsc::channel(8);
        let (tuning_tx, tuning_rx) = mpsc::channel(8);
        let dispatcher = CommandDispatcher::new(store_with_status(status), control_tx, tuning_tx);
        (dispatcher, control_rx, tuning_rx)
    }

    #[tokio::test]
    async fn when_idle_then_start_queues_exactly_one_message() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Idle);
        dispatcher.start(BattleConfig::custom(8, 12));

        let request = control_rx.try_recv().expect("one start should be queued");
        assert_eq!(request, ControlRequest::Start(BattleConfig::custom(8, 12)));
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_running_then_start_queues_nothing() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Running);
        dispatcher.start(BattleConfig::custom(8, 12));
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_force_counts_are_out_of_range_then_they_are_clamped() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Idle);
        dispatcher.start(BattleConfig::custom(0, 99));

        let request = control_rx.try_recv().expect("start should be queued");
        assert_eq!(request, ControlRequest::Start(BattleConfig::custom(1, 20)));
    }

    #[tokio::test]
    async fn when_starting_from_a_scenario_then_the_counts_stay_unset() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Idle);
        dispatcher.start(BattleConfig::scenario("canyon_ambush"));

        let request = control_rx.try_recv().expect("start should be queued");
        assert_eq!(
            request,
            ControlRequest::Start(BattleConfig::scenario("canyon_ambush"))
        );
    }

    #[tokio::test]
    async fn when_running_then_pause_is_queued_and_resume_is_not() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Running);
        dispatcher.resume();
        dispatcher.pause();

        assert_eq!(control_rx.try_recv(), Ok(ControlRequest::Pause));
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_paused_then_resume_is_queued() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Paused);
        dispatcher.resume();
        assert_eq!(control_rx.try_recv(), Ok(ControlRequest::Resume));
    }

    #[tokio::test]
    async fn when_finished_then_reset_is_queued() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Finished);
        dispatcher.reset();
        assert_eq!(control_rx.try_recv(), Ok(ControlRequest::Reset));
    }

    #[tokio::test]
    async fn when_idle_then_reset_is_dropped() {
        let (dispatcher, mut control_rx, _tuning_rx) = dispatcher(SimStatus::Idle);
        dispatcher.reset();
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_no_frame_has_arrived_then_start_is_allowed() {
        let (control_tx, mut control_rx) = mpsc::channel(8);
        let (tuning_tx, _tuning_rx) = mpsc::channel(8);
        let dispatcher = CommandDispatcher::new(SnapshotStore::new(), control_tx, tuning_tx);

        dispatcher.start(BattleConfig::custom(8, 12));
        assert!(control_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn when_speed_is_below_the_floor_then_it_is_clamped_up() {
        let (dispatcher, _control_rx, mut tuning_rx) = dispatcher(SimStatus::Running);
        dispatcher.set_speed(0.01);

        match tuning_rx.try_recv() {
            Ok(TuningRequest::Speed { multiplier }) => assert_eq!(multiplier, 0.1),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn when_speed_is_not_finite_then_nothing_is_queued() {
        let (dispatcher, _control_rx, mut tuning_rx) = dispatcher(SimStatus::Running);
        dispatcher.set_speed(f64::NAN);
        assert!(tuning_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_the_control_queue_is_full_then_the_command_is_dropped() {
        let (control_tx, mut control_rx) = mpsc::channel(1);
        let (tuning_tx, _tuning_rx) = mpsc::channel(1);
        let dispatcher = CommandDispatcher::new(
            store_with_status(SimStatus::Running),
            control_tx,
            tuning_tx,
        );

        dispatcher.pause();
        dispatcher.pause();

        assert_eq!(control_rx.try_recv(), Ok(ControlRequest::Pause));
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_ai_level_is_set_then_the_request_carries_it() {
        let (dispatcher, _control_rx, mut tuning_rx) = dispatcher(SimStatus::Idle);
        dispatcher.set_ai_level(AiLevel::Adaptive);

        assert_eq!(
            tuning_rx.try_recv(),
            Ok(TuningRequest::AiLevel {
                level: AiLevel::Adaptive
            })
        );
    }
}

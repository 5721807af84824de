// TTL lifecycle for transient visual events. The ttl counts from the moment
// this client first sees an id, regardless of how the server ages the event
// in later frames.

use crate::domain::{EventKind, Position, Team, VisualEvent, bearing, distance};

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

// Fraction of the origin→target distance a tracer beam spans.
const TRACER_REACH: f64 = 0.4;

// Server ttls run a couple of seconds at most; cap anything larger so the
// deadline arithmetic cannot overflow.
const MAX_TTL_SECS: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
struct Emission {
    deadline: Instant,
    ttl: Duration,
}

/// Registry of first-sight deadlines keyed by event id.
///
/// An id first observed at T with ttl D animates until T + D. Once the
/// deadline passes the id stays registered but suppressed for as long as the
/// server keeps sending it, so a lingering event cannot restart its own
/// animation. An id absent from a frame is forgotten immediately; if the
/// same id is ever sent again after that, it is a new emission with a new
/// deadline.
#[derive(Default)]
pub struct EmissionTracker {
    emissions: HashMap<String, Emission>,
}

impl EmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the registry against the events present in a frame.
    pub fn observe(&mut self, events: &[VisualEvent], now: Instant) {
        self.emissions
            .retain(|id, _| events.iter().any(|event| event.id == *id));

        for event in events {
            self.emissions.entry(event.id.clone()).or_insert_with(|| {
                let ttl = clamp_ttl(event.ttl);
                trace!(id = %event.id, ttl_secs = ttl.as_secs_f64(), "emission started");
                Emission {
                    deadline: now + ttl,
                    ttl,
                }
            });
        }
    }

    /// Animation progress for an id, in [0, 1). None when the id is unknown
    /// or its deadline has passed.
    pub fn progress(&self, id: &str, now: Instant) -> Option<f64> {
        let emission = self.emissions.get(id)?;
        if now >= emission.deadline || emission.ttl.is_zero() {
            return None;
        }
        let remaining = emission.deadline - now;
        Some(1.0 - remaining.as_secs_f64() / emission.ttl.as_secs_f64())
    }

    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }
}

fn clamp_ttl(ttl: f64) -> Duration {
    if ttl.is_finite() && ttl > 0.0 {
        Duration::from_secs_f64(ttl.min(MAX_TTL_SECS))
    } else {
        Duration::ZERO
    }
}

/// Drawing parameters for one live event, in world coordinates. The display
/// maps them to the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum EventVisual {
    /// Weapon fire: a beam from the origin along the firing bearing.
    Tracer {
        origin: Position,
        /// atan2 over the origin→target delta, radians.
        bearing: f64,
        /// Beam length in world units, proportional to the target distance.
        length: f64,
        team: Option<Team>,
        progress: f64,
    },
    /// Coordination link: a pulsing line between two drones.
    Pulse {
        origin: Position,
        target: Position,
        progress: f64,
    },
    /// Neutralization: a fading flash at a single point.
    Flash { origin: Position, progress: f64 },
}

/// Build the visual for a live event. None for kinds this build does not
/// draw and for directional events missing a target.
pub fn event_visual(event: &VisualEvent, progress: f64) -> Option<EventVisual> {
    match event.kind {
        EventKind::WeaponFire => {
            let target = event.target_position?;
            Some(EventVisual::Tracer {
                origin: event.position,
                bearing: bearing(event.position, target),
                length: distance(event.position, target) * TRACER_REACH,
                team: event.team,
                progress,
            })
        }
        EventKind::CommLink => {
            let target = event.target_position?;
            Some(EventVisual::Pulse {
                origin: event.position,
                target,
                progress,
            })
        }
        EventKind::Neutralization => Some(EventVisual::Flash {
            origin: event.position,
            progress,
        }),
        EventKind::Unknown => None,
    }
}

// Keyed scene reconciliation. Each applied snapshot is diffed against the
// scene by entity id, producing explicit add/update/remove operations; the
// display draws whatever the scene currently holds.

use crate::domain::{DroneRole, ScreenPoint, Snapshot, Team, WorldDimensions, to_screen};

use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Drone { team: Team, role: DroneRole },
    Asset,
}

/// Everything the display needs to draw one persistent entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityVisual {
    pub kind: EntityKind,
    pub screen: ScreenPoint,
    /// Remaining health as a fraction of full, clamped to [0, 1].
    pub health: f64,
    /// Assets at zero or below render in their destroyed state instead of
    /// disappearing.
    pub destroyed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneOp {
    Added {
        id: String,
        visual: EntityVisual,
    },
    Updated {
        id: String,
        previous: ScreenPoint,
        visual: EntityVisual,
    },
    Removed {
        id: String,
    },
}

/// Holds the drawn entity set between snapshots. Construction requires world
/// dimensions, so reconciliation cannot run before the bootstrap fetch has
/// produced them.
pub struct SceneReconciler {
    world: WorldDimensions,
    entities: HashMap<String, EntityVisual>,
}

impl SceneReconciler {
    pub fn new(world: WorldDimensions) -> Self {
        Self {
            world,
            entities: HashMap::new(),
        }
    }

    pub fn world(&self) -> WorldDimensions {
        self.world
    }

    /// Diff the snapshot against the held scene. Adds and updates come out in
    /// snapshot order, removals sorted by id; an entity whose visual did not
    /// change produces no op.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> Vec<SceneOp> {
        let mut ops = Vec::new();
        let mut seen: HashSet<&str> =
            HashSet::with_capacity(snapshot.drones.len() + snapshot.assets.len());

        for drone in &snapshot.drones {
            let visual = EntityVisual {
                kind: EntityKind::Drone {
                    team: drone.team,
                    role: drone.role,
                },
                screen: to_screen(drone.position, self.world),
                health: health_fraction(drone.health),
                destroyed: false,
            };
            self.upsert(&mut ops, &drone.id, visual);
            seen.insert(drone.id.as_str());
        }

        for asset in &snapshot.assets {
            let visual = EntityVisual {
                kind: EntityKind::Asset,
                screen: to_screen(asset.position, self.world),
                health: health_fraction(asset.health),
                destroyed: asset.is_destroyed(),
            };
            self.upsert(&mut ops, &asset.id, visual);
            seen.insert(asset.id.as_str());
        }

        let mut removed: Vec<String> = self
            .entities
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        removed.sort();
        for id in removed {
            self.entities.remove(&id);
            ops.push(SceneOp::Removed { id });
        }

        if !ops.is_empty() {
            debug!(ops = ops.len(), entities = self.entities.len(), "scene reconciled");
        }
        ops
    }

    fn upsert(&mut self, ops: &mut Vec<SceneOp>, id: &str, visual: EntityVisual) {
        match self.entities.get_mut(id) {
            Some(existing) if *existing == visual => {}
            Some(existing) => {
                let previous = existing.screen;
                *existing = visual;
                ops.push(SceneOp::Updated {
                    id: id.to_string(),
                    previous,
                    visual,
                });
            }
            None => {
                self.entities.insert(id.to_string(), visual);
                ops.push(SceneOp::Added {
                    id: id.to_string(),
                    visual,
                });
            }
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = (&String, &EntityVisual)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn health_fraction(health: i32) -> f64 {
    f64::from(health.clamp(0, 100)) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, Drone, Position, Snapshot};

    fn world() -> WorldDimensions {
        WorldDimensions::new(1200.0, 800.0).unwrap()
    }

    fn drone(id: &str, x: f64, y: f64, health: i32) -> Drone {
        Drone {
            id: id.to_string(),
            team: Team::Friendly,
            role: DroneRole::Interceptor,
            position: Position { x, y },
            health,
        }
    }

    fn asset(id: &str, health: i32) -> Asset {
        Asset {
            id: id.to_string(),
            position: Position { x: 600.0, y: 400.0 },
            health,
        }
    }

    fn snapshot_with(drones: Vec<Drone>, assets: Vec<Asset>) -> Snapshot {
        Snapshot {
            drones,
            assets,
            ..Snapshot::default()
        }
    }

    #[test]
    fn when_a_new_entity_appears_then_an_add_op_is_emitted() {
        let mut scene = SceneReconciler::new(world());
        let ops = scene.reconcile(&snapshot_with(vec![drone("f1", 600.0, 400.0, 100)], vec![]));

        assert_eq!(ops.len(), 1);
        match &ops[0] {
            SceneOp::Added { id, visual } => {
                assert_eq!(id, "f1");
                assert_eq!(visual.screen, ScreenPoint { x: 0.5, y: 0.5 });
                assert_eq!(visual.health, 1.0);
            }
            other => panic!("unexpected op: {other:?}"),
        }
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn when_an_entity_moves_then_one_update_op_carries_old_and_new_positions() {
        let mut scene = SceneReconciler::new(world());
        scene.reconcile(&snapshot_with(vec![drone("f1", 0.0, 0.0, 100)], vec![]));
        let ops = scene.reconcile(&snapshot_with(vec![drone("f1", 600.0, 400.0, 100)], vec![]));

        assert_eq!(ops.len(), 1);
        match &ops[0] {
            SceneOp::Updated {
                id,
                previous,
                visual,
            } => {
                assert_eq!(id, "f1");
                assert_eq!(*previous, ScreenPoint { x: 0.0, y: 0.0 });
                assert_eq!(visual.screen, ScreenPoint { x: 0.5, y: 0.5 });
            }
            other => panic!("unexpected op: {other:?}"),
        }
    }

    #[test]
    fn when_nothing_changes_then_no_ops_are_emitted() {
        let mut scene = SceneReconciler::new(world());
        let frame = snapshot_with(vec![drone("f1", 10.0, 10.0, 80)], vec![asset("a1", 100)]);
        scene.reconcile(&frame);
        assert!(scene.reconcile(&frame).is_empty());
    }

    #[test]
    fn when_an_entity_disappears_then_it_is_removed_from_the_scene() {
        let mut scene = SceneReconciler::new(world());
        scene.reconcile(&snapshot_with(
            vec![drone("f1", 1.0, 1.0, 100), drone("f2", 2.0, 2.0, 100)],
            vec![],
        ));
        let ops = scene.reconcile(&snapshot_with(vec![drone("f2", 2.0, 2.0, 100)], vec![]));

        assert_eq!(
            ops,
            vec![SceneOp::Removed {
                id: "f1".to_string()
            }]
        );
        assert_eq!(scene.len(), 1);
        assert!(scene.entities().all(|(id, _)| id != "f1"));
    }

    #[test]
    fn when_the_snapshot_is_empty_then_the_whole_scene_is_cleared() {
        let mut scene = SceneReconciler::new(world());
        scene.reconcile(&snapshot_with(
            vec![drone("f1", 1.0, 1.0, 100)],
            vec![asset("a1", 50)],
        ));
        let ops = scene.reconcile(&Snapshot::default());

        assert_eq!(ops.len(), 2);
        assert!(scene.is_empty());
    }

    #[test]
    fn when_an_asset_reaches_zero_health_then_it_is_marked_destroyed_not_removed() {
        let mut scene = SceneReconciler::new(world());
        scene.reconcile(&snapshot_with(vec![], vec![asset("a1", 40)]));
        let ops = scene.reconcile(&snapshot_with(vec![], vec![asset("a1", 0)]));

        assert_eq!(ops.len(), 1);
        match &ops[0] {
            SceneOp::Updated { visual, .. } => {
                assert!(visual.destroyed);
                assert_eq!(visual.health, 0.0);
            }
            other => panic!("unexpected op: {other:?}"),
        }
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn when_health_is_out_of_range_then_the_fraction_is_clamped() {
        let mut scene = SceneReconciler::new(world());
        let ops = scene.reconcile(&snapshot_with(
            vec![drone("f1", 1.0, 1.0, 150), drone("f2", 2.0, 2.0, -30)],
            vec![],
        ));

        let healths: Vec<f64> = ops
            .iter()
            .map(|op| match op {
                SceneOp::Added { visual, .. } => visual.health,
                other => panic!("unexpected op: {other:?}"),
            })
            .collect();
        assert_eq!(healths, vec![1.0, 0.0]);
    }

    #[test]
    fn when_ids_collide_across_kinds_then_the_last_occurrence_wins() {
        let mut scene = SceneReconciler::new(world());
        scene.reconcile(&snapshot_with(
            vec![drone("x", 1.0, 1.0, 100)],
            vec![asset("x", 100)],
        ));

        assert_eq!(scene.len(), 1);
        let (_, visual) = scene.entities().next().unwrap();
        assert_eq!(visual.kind, EntityKind::Asset);
    }
}

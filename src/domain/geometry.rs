// World-to-screen mapping and the small amount of vector math the display
// needs. Everything here is pure.

use crate::domain::world::Position;

/// Immutable world extents fetched from the server before any rendering
/// starts. Construction rejects degenerate extents, so mapping can never
/// divide by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldDimensions {
    width: f64,
    height: f64,
}

impl WorldDimensions {
    pub fn new(width: f64, height: f64) -> Option<Self> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Some(Self { width, height })
        } else {
            None
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// A position expressed as fractions of the display surface. Values are in
/// [0, 1] for in-bounds world positions; out-of-bounds positions map linearly
/// outside that range and are left unclamped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

pub fn to_screen(position: Position, world: WorldDimensions) -> ScreenPoint {
    ScreenPoint {
        x: position.x / world.width(),
        y: position.y / world.height(),
    }
}

/// Angle of the origin→target delta in radians, measured with atan2(dy, dx).
/// With the y axis growing downward this turns clockwise from due east.
pub fn bearing(origin: Position, target: Position) -> f64 {
    (target.y - origin.y).atan2(target.x - origin.x)
}

pub fn distance(origin: Position, target: Position) -> f64 {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldDimensions {
        WorldDimensions::new(1200.0, 800.0).unwrap()
    }

    #[test]
    fn when_position_is_center_then_screen_point_is_half_half() {
        let point = to_screen(Position { x: 600.0, y: 400.0 }, world());
        assert_eq!(point, ScreenPoint { x: 0.5, y: 0.5 });
    }

    #[test]
    fn when_position_is_at_world_edges_then_fractions_are_exactly_zero_and_one() {
        let origin = to_screen(Position { x: 0.0, y: 0.0 }, world());
        assert_eq!(origin, ScreenPoint { x: 0.0, y: 0.0 });

        let corner = to_screen(
            Position {
                x: 1200.0,
                y: 800.0,
            },
            world(),
        );
        assert_eq!(corner, ScreenPoint { x: 1.0, y: 1.0 });
    }

    #[test]
    fn when_mapping_in_bounds_positions_then_fractions_stay_within_unit_range() {
        for (x, y) in [(1.0, 1.0), (300.0, 700.0), (1199.0, 0.5)] {
            let point = to_screen(Position { x, y }, world());
            assert!((0.0..=1.0).contains(&point.x), "x fraction {}", point.x);
            assert!((0.0..=1.0).contains(&point.y), "y fraction {}", point.y);
        }
    }

    #[test]
    fn when_position_is_out_of_bounds_then_mapping_stays_linear_and_unclamped() {
        let point = to_screen(
            Position {
                x: 1800.0,
                y: -400.0,
            },
            world(),
        );
        assert_eq!(point, ScreenPoint { x: 1.5, y: -0.5 });
    }

    #[test]
    fn when_extents_are_degenerate_then_construction_is_rejected() {
        assert!(WorldDimensions::new(0.0, 800.0).is_none());
        assert!(WorldDimensions::new(1200.0, -1.0).is_none());
        assert!(WorldDimensions::new(f64::NAN, 800.0).is_none());
        assert!(WorldDimensions::new(f64::INFINITY, 800.0).is_none());
    }

    #[test]
    fn when_target_is_due_south_then_bearing_is_quarter_turn() {
        let origin = Position { x: 100.0, y: 100.0 };
        let target = Position { x: 100.0, y: 200.0 };
        assert!((bearing(origin, target) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn when_target_is_due_east_then_bearing_is_zero() {
        let origin = Position { x: 100.0, y: 100.0 };
        let target = Position { x: 250.0, y: 100.0 };
        assert_eq!(bearing(origin, target), 0.0);
    }

    #[test]
    fn when_measuring_a_three_four_triangle_then_distance_is_five() {
        let origin = Position { x: 0.0, y: 0.0 };
        let target = Position { x: 3.0, y: 4.0 };
        assert_eq!(distance(origin, target), 5.0);
    }
}

use std::fmt;

use crate::position::Position;

/// A displacement on the sphere: a start position plus a heading and a
/// distance to travel along it.
#[derive(Clone, Copy, Debug)]
pub struct Vector {
    pub start: Position,
    pub heading: f64,
    pub distance: f64,
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.end_position();
        write!(
            f,
            "Vector: {} -> {} (heading: {:.1}°, distance: {:.1}m)",
            self.start, end, self.heading, self.distance
        )
    }
}

impl Vector {
    pub fn new(start: Position, heading: f64, distance: f64) -> Self {
        Self {
            start,
            heading,
            distance,
        }
    }

    /// Get the end position of this vector.
    pub fn end_position(&self) -> Position {
        self.start.project(self.heading, self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_position_matches_projection() {
        let start = Position::new(25.759027, -80.374598);
        let vector = Vector::new(start, 90.0, 100.0);
        let end = vector.end_position();

        assert!((start.distance_to(&end) - 100.0).abs() < 0.5);
        assert!((start.bearing_to(&end) - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_zero_length_vector() {
        let start = Position::new(25.759027, -80.374598);
        let vector = Vector::new(start, 0.0, 0.0);
        let end = vector.end_position();

        assert!(start.distance_to(&end) < 1e-6);
    }
}

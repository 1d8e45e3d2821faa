//! Landmark frames from the external face tracker.
//!
//! Points are normalized to [0,1] in frame coordinates. Indices follow the
//! dense face-mesh convention used by the tracking provider; only the named
//! accessors below are relied on.

use serde::{Deserialize, Serialize};

pub const NOSE_TIP: usize = 1;
pub const FOREHEAD: usize = 10;
pub const LEFT_EYE_OUTER: usize = 33;
pub const CHIN: usize = 152;
pub const LEFT_CHEEK: usize = 234;
pub const RIGHT_EYE_OUTER: usize = 263;
pub const RIGHT_CHEEK: usize = 454;

/// A normalized 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(a: Point2, b: Point2) -> Point2 {
        Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }

    pub fn distance(a: Point2, b: Point2) -> f32 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }
}

/// One evaluated tracking result: the full normalized point set for a frame.
///
/// Ephemeral; only the most recent frame is retained by the session to
/// support the privacy blur at capture time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub points: Vec<Point2>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    fn point(&self, index: usize) -> Option<Point2> {
        self.points.get(index).copied()
    }

    pub fn nose_tip(&self) -> Option<Point2> {
        self.point(NOSE_TIP)
    }

    pub fn eye_midpoint(&self) -> Option<Point2> {
        let left = self.point(LEFT_EYE_OUTER)?;
        let right = self.point(RIGHT_EYE_OUTER)?;
        Some(Point2::midpoint(left, right))
    }

    /// Inter-cheek distance, the yaw normalizer.
    pub fn face_width(&self) -> Option<f32> {
        let left = self.point(LEFT_CHEEK)?;
        let right = self.point(RIGHT_CHEEK)?;
        Some(Point2::distance(left, right))
    }

    /// Forehead-to-chin distance, the pitch normalizer.
    pub fn face_height(&self) -> Option<f32> {
        let top = self.point(FOREHEAD)?;
        let bottom = self.point(CHIN)?;
        Some(Point2::distance(top, bottom))
    }

    /// Whether every landmark the evaluator and the privacy blur need is
    /// present and the face spans a non-degenerate area.
    pub fn is_usable(&self) -> bool {
        match (self.face_width(), self.face_height()) {
            (Some(w), Some(h)) => {
                w > f32::EPSILON && h > f32::EPSILON && self.nose_tip().is_some()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame_not_usable() {
        let frame = LandmarkFrame::new(vec![]);
        assert!(!frame.is_usable());
        assert!(frame.nose_tip().is_none());
    }

    #[test]
    fn test_degenerate_face_not_usable() {
        // All points collapsed onto one spot.
        let frame = LandmarkFrame::new(vec![Point2::new(0.5, 0.5); RIGHT_CHEEK + 1]);
        assert!(!frame.is_usable());
    }

    #[test]
    fn test_midpoint_and_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(0.6, 0.8);
        let mid = Point2::midpoint(a, b);
        assert!((mid.x - 0.3).abs() < 1e-6);
        assert!((mid.y - 0.4).abs() < 1e-6);
        assert!((Point2::distance(a, b) - 1.0).abs() < 1e-6);
    }
}

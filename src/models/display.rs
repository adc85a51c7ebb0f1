use crate::models::geometry::{Point, Rect, ScreenSpace};
use serde::Serialize;

/// Origins closer than this to `(0, 0)` count as the primary display.
const PRIMARY_ORIGIN_TOLERANCE: f64 = 0.1;

/// One attached display, as enumerated by the platform for a single call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayDescriptor {
    /// Platform display identifier, informational only
    pub id: u32,
    /// Whole display in screen space
    pub full_frame: Rect<ScreenSpace>,
    /// Display minus menu bar, dock and notch reservations
    pub usable_frame: Rect<ScreenSpace>,
}

impl DisplayDescriptor {
    pub fn new(id: u32, full_frame: Rect<ScreenSpace>, usable_frame: Rect<ScreenSpace>) -> Self {
        Self {
            id,
            full_frame,
            usable_frame,
        }
    }

    /// Display with no reserved regions
    pub fn unobstructed(id: u32, frame: Rect<ScreenSpace>) -> Self {
        Self::new(id, frame, frame)
    }

    /// Whether this display's frame is anchored at the screen-space origin.
    pub fn is_at_origin(&self) -> bool {
        self.full_frame.x.abs() < PRIMARY_ORIGIN_TOLERANCE
            && self.full_frame.y.abs() < PRIMARY_ORIGIN_TOLERANCE
    }

    pub fn contains(&self, point: Point) -> bool {
        self.full_frame.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_detection_tolerates_fractional_offsets() {
        let frame = Rect::new(0.05, -0.05, 1920.0, 1080.0).unwrap();
        assert!(DisplayDescriptor::unobstructed(1, frame).is_at_origin());

        let secondary = Rect::new(1920.0, 0.0, 1280.0, 1024.0).unwrap();
        assert!(!DisplayDescriptor::unobstructed(2, secondary).is_at_origin());
    }
}

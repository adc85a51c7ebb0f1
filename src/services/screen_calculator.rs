use crate::models::display::DisplayDescriptor;
use crate::models::geometry::{Point, Rect, ScreenSpace};
use crate::models::snap_action::SnapAction;

/// Probe point used when no display sits exactly at the origin.
const PRIMARY_PROBE: Point = Point::new(1.0, 1.0);

/// Pure display selection and snap geometry. Everything is in screen space.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCalculator;

impl ScreenCalculator {
    /// Display sharing the largest area with `window`.
    ///
    /// Only a strictly larger intersection replaces the current best, so among
    /// equal maxima the first enumerated display wins. When the window touches
    /// no display, or its geometry is unknown, the primary display is chosen.
    /// `None` only for an empty display list.
    pub fn target_screen<'a>(
        window: Option<&Rect<ScreenSpace>>,
        displays: &'a [DisplayDescriptor],
    ) -> Option<&'a DisplayDescriptor> {
        let Some(window) = window else {
            return Self::primary_display(displays);
        };

        let mut best: Option<&DisplayDescriptor> = None;
        let mut best_area = 0.0;
        for display in displays {
            let area = window.intersection_area(&display.full_frame);
            if area > best_area {
                best_area = area;
                best = Some(display);
            }
        }

        best.or_else(|| Self::primary_display(displays))
    }

    /// The display anchored at the screen-space origin.
    ///
    /// Falls back to the first display containing `(1, 1)`, then to the first
    /// enumerated display.
    pub fn primary_display(displays: &[DisplayDescriptor]) -> Option<&DisplayDescriptor> {
        displays
            .iter()
            .find(|display| display.is_at_origin())
            .or_else(|| displays.iter().find(|display| display.contains(PRIMARY_PROBE)))
            .or_else(|| displays.first())
    }

    /// Height of the primary display's full frame, the pivot for AX/screen conversion.
    pub fn primary_display_height(displays: &[DisplayDescriptor]) -> Option<f64> {
        Self::primary_display(displays).map(|display| display.full_frame.height)
    }

    /// Target rectangle for `action` inside the display's usable frame.
    pub fn frame_for(action: SnapAction, display: &DisplayDescriptor) -> Rect<ScreenSpace> {
        let usable = display.usable_frame;
        let (x, y, w, h) = (usable.x, usable.y, usable.width, usable.height);

        match action {
            SnapAction::Maximize => usable,
            SnapAction::Left => Rect::from_raw(x, y, w / 2.0, h),
            SnapAction::Right => Rect::from_raw(x + w / 2.0, y, w / 2.0, h),
            SnapAction::LeftThird => Rect::from_raw(x, y, w / 3.0, h),
            SnapAction::CenterThird => Rect::from_raw(x + w / 3.0, y, w / 3.0, h),
            SnapAction::RightThird => Rect::from_raw(x + w * 2.0 / 3.0, y, w / 3.0, h),
        }
    }
}

//! Tiling and coordinate conversion properties over a spread of display shapes.

use tilesnap::{
    models::{
        display::DisplayDescriptor,
        geometry::{AxSpace, Rect, ScreenSpace},
        snap_action::SnapAction,
    },
    services::ScreenCalculator,
};

const EPSILON: f64 = 1e-9;

/// Usable frames seen in the wild, including odd widths and negative origins
fn usable_frames() -> Vec<Rect<ScreenSpace>> {
    [
        (0.0, 0.0, 1920.0, 1080.0),
        (0.0, 70.0, 1512.0, 944.0),
        (0.0, 0.0, 1511.0, 875.0),
        (-1440.0, 1080.0, 1440.0, 875.0),
        (2560.0, -312.0, 1079.0, 1895.0),
        (0.0, 0.0, 1.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, w, h)| Rect::new(x, y, w, h).unwrap())
    .collect()
}

fn display_with(usable: Rect<ScreenSpace>) -> DisplayDescriptor {
    DisplayDescriptor::new(1, usable, usable)
}

#[test]
fn halves_split_usable_frame_exactly() {
    for usable in usable_frames() {
        let display = display_with(usable);
        let left = ScreenCalculator::frame_for(SnapAction::Left, &display);
        let right = ScreenCalculator::frame_for(SnapAction::Right, &display);

        assert_eq!(left.width + right.width, usable.width, "{usable}");
        assert_eq!(left.x + left.width, right.x, "{usable}");
        assert_eq!(left.y, usable.y);
        assert_eq!(right.height, usable.height);
    }
}

#[test]
fn thirds_tile_usable_frame() {
    for usable in usable_frames() {
        let display = display_with(usable);
        let [left, center, right] = [
            SnapAction::LeftThird,
            SnapAction::CenterThird,
            SnapAction::RightThird,
        ]
        .map(|action| ScreenCalculator::frame_for(action, &display));

        assert_eq!(left.x, usable.x);
        assert!((left.max_x() - center.x).abs() < EPSILON, "{usable}");
        assert!((center.max_x() - right.x).abs() < EPSILON, "{usable}");
        assert!((right.max_x() - usable.max_x()).abs() < EPSILON, "{usable}");
        for third in [left, center, right] {
            assert!((third.width - usable.width / 3.0).abs() < EPSILON);
            assert_eq!((third.y, third.height), (usable.y, usable.height));
        }
    }
}

#[test]
fn maximize_is_usable_frame() {
    for usable in usable_frames() {
        assert_eq!(
            ScreenCalculator::frame_for(SnapAction::Maximize, &display_with(usable)),
            usable
        );
    }
}

#[test]
fn every_target_stays_inside_usable_frame() {
    for usable in usable_frames() {
        let display = display_with(usable);
        for action in SnapAction::ALL {
            let target = ScreenCalculator::frame_for(action, &display);
            assert!(target.x >= usable.x - EPSILON, "{action} {usable}");
            assert!(target.max_x() <= usable.max_x() + EPSILON, "{action} {usable}");
            assert!(target.area() <= usable.area() + EPSILON);
        }
    }
}

#[test]
fn ax_screen_round_trip_is_identity() {
    // Components are binary fractions, so the arithmetic is exact.
    let rects = [
        (0.0, 0.0, 1920.0, 1080.0),
        (-1440.0, -900.0, 720.0, 900.0),
        (2560.5, 356.25, 640.0, 1024.0),
        (12.125, -3000.0, 0.0, 0.0),
    ];

    for primary_height in [1080.0, 900.0, 1117.0, 2160.0] {
        for (x, y, w, h) in rects {
            let original: Rect<AxSpace> = Rect::new(x, y, w, h).unwrap();
            let back = original.to_screen(primary_height).to_ax(primary_height);
            assert_eq!(back, original);
        }
    }
}

#[test]
fn zero_overlap_with_two_displays_picks_origin_display() {
    let right = DisplayDescriptor::unobstructed(2, Rect::new(1920.0, 0.0, 1920.0, 1080.0).unwrap());
    let origin = DisplayDescriptor::unobstructed(1, Rect::new(0.0, 0.0, 1920.0, 1080.0).unwrap());
    let nowhere: Rect<ScreenSpace> = Rect::new(9000.0, 9000.0, 100.0, 100.0).unwrap();

    for displays in [vec![right.clone(), origin.clone()], vec![origin.clone(), right.clone()]] {
        let target = ScreenCalculator::target_screen(Some(&nowhere), &displays).unwrap();
        assert_eq!(target.id, 1);
    }
}

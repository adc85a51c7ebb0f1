//! Integration tests for TileSnap
//! End-to-end snaps through the public in-memory providers.

use std::sync::Arc;
use tilesnap::{
    macos::{
        AxError, InMemoryAccessibilityProvider, InMemoryDisplayProvider, InMemoryWindow,
        PermissionStatus, WindowMutation,
    },
    models::{
        display::DisplayDescriptor,
        geometry::{AxSpace, Point, Rect, ScreenSpace, Size},
        snap_action::SnapAction,
    },
    services::{WindowManager, WindowOperationError},
};

fn ax(x: f64, y: f64, w: f64, h: f64) -> Rect<AxSpace> {
    Rect::new(x, y, w, h).unwrap()
}

fn screen(x: f64, y: f64, w: f64, h: f64) -> Rect<ScreenSpace> {
    Rect::new(x, y, w, h).unwrap()
}

fn primary() -> DisplayDescriptor {
    DisplayDescriptor::unobstructed(1, screen(0.0, 0.0, 1920.0, 1080.0))
}

struct Setup {
    manager: WindowManager,
    window: InMemoryWindow,
    accessibility: Arc<InMemoryAccessibilityProvider>,
    displays: Arc<InMemoryDisplayProvider>,
}

fn setup(window: InMemoryWindow, displays: Vec<DisplayDescriptor>) -> Setup {
    let accessibility = Arc::new(InMemoryAccessibilityProvider::new_with(window.clone()));
    let displays = Arc::new(InMemoryDisplayProvider::new_with(displays));
    Setup {
        manager: WindowManager::new(accessibility.clone(), displays.clone()),
        window,
        accessibility,
        displays,
    }
}

mod snapping {
    use super::*;

    #[test]
    fn left_half_of_primary_display() {
        let s = setup(InMemoryWindow::new(ax(240.0, 180.0, 800.0, 600.0)), vec![primary()]);

        s.manager.snap(SnapAction::Left).unwrap();

        assert_eq!(s.window.current_frame(), Some(ax(0.0, 0.0, 960.0, 1080.0)));
        assert_eq!(
            s.window.mutations(),
            vec![
                WindowMutation::Position(Point::new(0.0, 0.0)),
                WindowMutation::Size(Size::new(960.0, 1080.0)),
            ]
        );
    }

    #[test]
    fn usable_frame_excludes_menu_bar_and_dock() {
        // 25pt menu bar at the top, 70pt dock at the bottom.
        let display = DisplayDescriptor::new(
            1,
            screen(0.0, 0.0, 1440.0, 900.0),
            screen(0.0, 70.0, 1440.0, 805.0),
        );
        let s = setup(InMemoryWindow::new(ax(100.0, 100.0, 400.0, 300.0)), vec![display]);

        s.manager.snap(SnapAction::RightThird).unwrap();
        assert_eq!(s.window.current_frame(), Some(ax(960.0, 25.0, 480.0, 805.0)));
    }

    #[test]
    fn repeated_snaps_are_idempotent() {
        let s = setup(InMemoryWindow::new(ax(10.0, 10.0, 300.0, 300.0)), vec![primary()]);

        s.manager.snap(SnapAction::CenterThird).unwrap();
        let first = s.window.current_frame();
        s.manager.snap(SnapAction::CenterThird).unwrap();

        assert_eq!(s.window.current_frame(), first);
        assert_eq!(first, Some(ax(640.0, 0.0, 640.0, 1080.0)));
    }

    #[test]
    fn display_above_left_of_primary() {
        let secondary =
            DisplayDescriptor::unobstructed(2, screen(-1440.0, 1080.0, 1440.0, 900.0));
        // Screen (-1200, 1200, 800, 600) lies entirely on the secondary display.
        let s = setup(
            InMemoryWindow::new(ax(-1200.0, -720.0, 800.0, 600.0)),
            vec![primary(), secondary],
        );

        let plan = s.manager.plan(SnapAction::Left).unwrap();
        assert_eq!(plan.display.id, 2);
        assert_eq!(plan.source_screen, Some(screen(-1200.0, 1200.0, 800.0, 600.0)));

        s.manager.snap(SnapAction::Left).unwrap();
        assert_eq!(s.window.current_frame(), Some(ax(-1440.0, -900.0, 720.0, 900.0)));
    }

    #[test]
    fn display_right_of_primary_hanging_below() {
        let secondary =
            DisplayDescriptor::unobstructed(2, screen(1920.0, -300.0, 1280.0, 1024.0));
        let s = setup(
            InMemoryWindow::new(ax(2000.0, 500.0, 600.0, 400.0)),
            vec![primary(), secondary],
        );

        s.manager.snap(SnapAction::Right).unwrap();
        assert_eq!(s.window.current_frame(), Some(ax(2560.0, 356.0, 640.0, 1024.0)));
    }

    #[test]
    fn largest_overlap_wins_in_any_enumeration_order() {
        let left = DisplayDescriptor::unobstructed(1, screen(0.0, 0.0, 1920.0, 1080.0));
        let right = DisplayDescriptor::unobstructed(2, screen(1920.0, 0.0, 1920.0, 1080.0));

        for displays in [vec![left.clone(), right.clone()], vec![right.clone(), left.clone()]] {
            // Fully inside the right display.
            let s = setup(InMemoryWindow::new(ax(2400.0, 200.0, 500.0, 400.0)), displays);
            let plan = s.manager.plan(SnapAction::Maximize).unwrap();
            assert_eq!(plan.display.id, 2);
        }
    }

    #[test]
    fn hot_plug_is_picked_up_on_next_snap() {
        let secondary =
            DisplayDescriptor::unobstructed(2, screen(1920.0, 0.0, 1280.0, 1024.0));
        let s = setup(
            InMemoryWindow::new(ax(2100.0, 300.0, 600.0, 400.0)),
            vec![primary(), secondary],
        );

        s.manager.snap(SnapAction::Left).unwrap();
        assert_eq!(s.window.current_frame(), Some(ax(1920.0, 56.0, 640.0, 1024.0)));

        // Secondary unplugged: the window is now off every display.
        s.displays.set_displays(vec![primary()]);
        s.manager.snap(SnapAction::Left).unwrap();
        assert_eq!(s.window.current_frame(), Some(ax(0.0, 0.0, 960.0, 1080.0)));
    }

    #[test]
    fn unreadable_geometry_uses_primary_display() {
        let secondary =
            DisplayDescriptor::unobstructed(2, screen(1920.0, 0.0, 1280.0, 1024.0));
        let s = setup(InMemoryWindow::without_frame(), vec![secondary, primary()]);

        s.manager.snap(SnapAction::Maximize).unwrap();
        assert_eq!(
            s.window.mutations(),
            vec![
                WindowMutation::Position(Point::new(0.0, 0.0)),
                WindowMutation::Size(Size::new(1920.0, 1080.0)),
            ]
        );
    }

    #[test]
    fn concurrent_snaps_do_not_interleave_commits() {
        let s = setup(InMemoryWindow::new(ax(0.0, 0.0, 100.0, 100.0)), vec![primary()]);
        let manager = Arc::new(s.manager);

        let handles: Vec<_> = SnapAction::ALL
            .into_iter()
            .map(|action| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        manager.snap(action).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mutations = s.window.mutations();
        assert_eq!(mutations.len(), SnapAction::ALL.len() * 20 * 2);
        for pair in mutations.chunks(2) {
            assert!(matches!(
                pair,
                [WindowMutation::Position(_), WindowMutation::Size(_)]
            ));
        }
    }
}

mod failures {
    use super::*;

    #[test]
    fn fullscreen_window_is_left_alone() {
        let s = setup(
            InMemoryWindow::new(ax(0.0, 0.0, 1920.0, 1080.0)).fullscreen(true),
            vec![primary()],
        );

        assert_eq!(
            s.manager.snap(SnapAction::Left),
            Err(WindowOperationError::FullScreenWindow)
        );
        assert!(s.window.mutations().is_empty());
    }

    #[test]
    fn missing_window_skips_all_queries() {
        let s = setup(InMemoryWindow::new(ax(0.0, 0.0, 100.0, 100.0)), vec![primary()]);
        s.accessibility.set_frontmost(None);

        assert_eq!(
            s.manager.snap(SnapAction::Maximize),
            Err(WindowOperationError::NoFrontmostWindow)
        );
        assert_eq!(s.window.query_count(), 0);
        assert!(s.window.mutations().is_empty());
    }

    #[test]
    fn fixed_size_window_is_not_resizable() {
        let s = setup(
            InMemoryWindow::new(ax(0.0, 0.0, 400.0, 300.0)).settable(true, false),
            vec![primary()],
        );

        assert_eq!(
            s.manager.snap(SnapAction::Right),
            Err(WindowOperationError::NotResizable)
        );
        assert!(s.window.mutations().is_empty());
    }

    #[test]
    fn disabled_api_is_a_permission_problem() {
        let s = setup(InMemoryWindow::new(ax(0.0, 0.0, 100.0, 100.0)), vec![primary()]);
        s.accessibility.set_frontmost_error(Some(AxError::ApiDisabled));

        assert_eq!(
            s.manager.snap(SnapAction::Left),
            Err(WindowOperationError::PermissionDenied)
        );
    }

    #[test]
    fn rejected_move_never_resizes() {
        let s = setup(
            InMemoryWindow::new(ax(10.0, 10.0, 100.0, 100.0))
                .failing_position(AxError::CannotComplete),
            vec![primary()],
        );

        assert_eq!(
            s.manager.snap(SnapAction::Maximize),
            Err(WindowOperationError::PermissionDenied)
        );
        assert!(s.window.mutations().is_empty());
        assert_eq!(s.window.current_frame(), Some(ax(10.0, 10.0, 100.0, 100.0)));
    }

    #[test]
    fn rejected_resize_leaves_window_moved() {
        let s = setup(
            InMemoryWindow::new(ax(10.0, 10.0, 100.0, 100.0)).failing_size(AxError::Failure),
            vec![primary()],
        );

        assert_eq!(
            s.manager.snap(SnapAction::Left),
            Err(WindowOperationError::PermissionDenied)
        );
        assert_eq!(
            s.window.mutations(),
            vec![WindowMutation::Position(Point::new(0.0, 0.0))]
        );
    }

    #[test]
    fn no_displays_is_unknown() {
        let s = setup(InMemoryWindow::new(ax(0.0, 0.0, 100.0, 100.0)), Vec::new());

        assert_eq!(
            s.manager.snap(SnapAction::Left),
            Err(WindowOperationError::Unknown)
        );
        assert!(s.window.mutations().is_empty());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn system_providers_are_unsupported_off_macos() {
        let manager = WindowManager::with_system_providers();
        assert_eq!(
            manager.snap(SnapAction::Left),
            Err(WindowOperationError::Unknown)
        );
        assert!(manager.displays().is_err());
    }
}

mod keyboard {
    use super::*;
    use tempfile::TempDir;
    use tilesnap::config::{SettingsConfig, SettingsStore};
    use tilesnap::models::keyboard_mapping::ShortcutCombination;
    use tilesnap::services::{DispatchOutcome, KeyboardHandler};

    #[test]
    fn shortcuts_from_settings_file_drive_snaps() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(SettingsConfig::with_path(dir.path().join("settings.toml")));
        let mut settings = store.load().unwrap();
        settings.shortcuts.set(SnapAction::LeftThird, "ctrl+opt+1");
        store.save(&settings).unwrap();

        let s = setup(InMemoryWindow::new(ax(500.0, 500.0, 300.0, 200.0)), vec![primary()]);
        let handler = KeyboardHandler::new(Arc::new(s.manager), store.load().unwrap()).unwrap();

        let shortcut: ShortcutCombination = "opt+ctrl+1".parse().unwrap();
        assert_eq!(
            handler.handle_shortcut(&shortcut),
            DispatchOutcome::Snapped {
                action: SnapAction::LeftThird
            }
        );
        assert_eq!(s.window.current_frame(), Some(ax(0.0, 0.0, 640.0, 1080.0)));
    }

    #[test]
    fn permission_gate_blocks_dispatch() {
        let s = setup(InMemoryWindow::new(ax(0.0, 0.0, 100.0, 100.0)), vec![primary()]);
        s.accessibility.set_permission_status(PermissionStatus::Unknown);
        let handler = KeyboardHandler::new(Arc::new(s.manager), Default::default()).unwrap();

        assert_eq!(
            handler.dispatch(SnapAction::Maximize),
            DispatchOutcome::PermissionMissing
        );
        assert_eq!(s.window.query_count(), 0);
    }
}

use super::collaborators::{AvoidChange, SplitEventKind, WindowEvent};
use super::testing::*;
use super::*;
use crate::common::config::ModeChangeHotZones;
use crate::model::minimize::MinimizeReason;
use crate::model::window_node::{ModeSupport, SurfaceKind, SurfaceKinds};
use crate::model::window_pair::PairStatus;

const D1: DisplayId = DisplayId(1);

fn ids(windows: &[u32]) -> Vec<WindowId> { windows.iter().map(|w| WindowId(*w)).collect() }

fn status_bar(id: u32) -> WindowNode {
    window(id, WindowType::StatusBar)
        .with_mode(WindowMode::Floating)
        .with_request_rect(Rect::new(0, 0, 1440, 40))
}

mod stacking {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn z_order_is_total_and_mirrored() {
        let mut h = Harness::new();
        h.add(window(10, WindowType::Wallpaper));
        h.add(app(1, WindowMode::Floating));
        h.add(app(2, WindowMode::Floating));
        h.add_child(window(3, WindowType::Media), 2);
        h.add_child(window(4, WindowType::AppSub), 2);
        h.add(status_bar(5));
        h.add(window(6, WindowType::Toast).with_mode(WindowMode::Floating));

        let bottom_up = vec![10, 1, 3, 2, 4, 6, 5];
        assert_eq!(h.z_order(), bottom_up);
        let z: Vec<u32> = bottom_up.iter().map(|w| h.node(*w).z_order).collect();
        assert_eq!(z, (1..=7).collect::<Vec<_>>());
        assert_eq!(h.container.max_z_order(), 7);

        let mut top_down = Vec::new();
        h.container.traverse_window_tree(TraversalOrder::TopToBottom, |_, node| {
            top_down.push(node.id.0);
            false
        });
        let mut reversed = bottom_up.clone();
        reversed.reverse();
        assert_eq!(top_down, reversed);
    }

    #[test]
    fn every_surface_gets_its_own_z_value() {
        let mut h = Harness::new();
        let mut node = app(1, WindowMode::Floating);
        node.surfaces = SurfaceKinds::LEASH | SurfaceKinds::MAIN | SurfaceKinds::STARTING;
        h.add(node);
        h.add(app(2, WindowMode::Floating));

        assert_eq!(h.node(1).z_order, 2);
        assert_eq!(h.node(2).z_order, 4);
        let log = h.compositor.log();
        let last: Vec<_> = log.z_orders.iter().rev().take(4).rev().copied().collect();
        assert_eq!(
            last,
            vec![
                (WindowId(1), SurfaceKind::Leash, 1),
                (WindowId(1), SurfaceKind::Main, 2),
                (WindowId(1), SurfaceKind::Starting, 3),
                (WindowId(2), SurfaceKind::Main, 4),
            ]
        );
    }

    #[test]
    fn traversal_stops_when_asked() {
        let mut h = Harness::new();
        for id in 1..=3 {
            h.add(app(id, WindowMode::Floating));
        }
        let mut seen = 0;
        h.container.traverse_window_tree(TraversalOrder::BottomToTop, |_, _| {
            seen += 1;
            seen == 2
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn raising_moves_app_window_to_top() {
        let mut h = Harness::new();
        for id in 1..=3 {
            h.add(app(id, WindowMode::Floating));
        }
        assert_eq!(h.container.raise_z_order_for_app_window(WindowId(3)), Err(WmError::DoNothing));
        h.container.raise_z_order_for_app_window(WindowId(1)).unwrap();
        assert_eq!(h.z_order(), vec![2, 3, 1]);
        assert!(h.container.is_top_window(WindowId(1), RootType::App));
    }

    #[test]
    fn raising_sub_window_raises_its_parent() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add_child(window(4, WindowType::AppSub), 1);
        h.add(app(2, WindowMode::Floating));

        h.container.raise_z_order_for_app_window(WindowId(4)).unwrap();
        assert_eq!(h.z_order(), vec![2, 1, 4]);
        assert!(h.container.is_top_window(WindowId(4), RootType::App));
    }

    #[test]
    fn raise_window_to_top_keeps_priority_order() {
        let mut h = Harness::new();
        h.add(window(5, WindowType::Toast).with_mode(WindowMode::Floating));
        h.add(window(6, WindowType::Toast).with_mode(WindowMode::Floating));
        h.add(status_bar(7));
        h.container.raise_window_to_top(WindowId(5)).unwrap();
        assert_eq!(h.z_order(), vec![6, 5, 7]);
    }
}

mod lifecycle {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn invalid_placements_are_rejected() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add_child(window(2, WindowType::AppSub), 1);
        h.add(window(3, WindowType::Toast).with_mode(WindowMode::Floating));

        let c = &mut h.container;
        c.register_window(window(10, WindowType::AppSub));
        assert_eq!(c.add_window_node(WindowId(10), Some(WindowId(99))), Err(WmError::InvalidParent(WindowId(99))));
        assert!(matches!(
            c.add_window_node(WindowId(10), Some(WindowId(3))),
            Err(WmError::InvalidParam(_))
        ));

        c.register_window(window(11, WindowType::SystemSub));
        assert_eq!(c.add_window_node(WindowId(11), None), Err(WmError::InvalidType(WindowType::SystemSub)));
        assert!(matches!(
            c.add_window_node(WindowId(11), Some(WindowId(2))),
            Err(WmError::InvalidParam(_))
        ));
        c.add_window_node(WindowId(11), Some(WindowId(3))).unwrap();

        c.register_window(app(12, WindowMode::Floating).with_display(DisplayId(7)));
        assert_eq!(c.add_window_node(WindowId(12), None), Err(WmError::DisplayNotFound(DisplayId(7))));

        assert!(matches!(c.add_window_node(WindowId(1), None), Err(WmError::InvalidOperation(_))));
        assert_eq!(c.add_window_node(WindowId(77), None), Err(WmError::WindowNotFound(WindowId(77))));
    }

    #[test]
    fn sub_window_inherits_parent_visibility() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add_child(window(2, WindowType::AppSub), 1);
        assert!(h.node(2).current_visibility);
        assert!(h.node(2).requested_visibility);
        assert_eq!(h.compositor.log().added, vec![(WindowId(1), D0), (WindowId(2), D0)]);
    }

    #[test]
    fn remove_then_destroy_frees_sub_windows() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add_child(window(2, WindowType::AppSub), 1);
        h.add(app(3, WindowMode::Floating));

        h.container.remove_window_node(WindowId(1)).unwrap();
        assert!(!h.node(1).current_visibility);
        assert_eq!(h.z_order(), vec![3]);
        assert!(h.compositor.log().removed.contains(&(WindowId(2), D0)));

        let freed = h.container.destroy_window_node(WindowId(1)).unwrap();
        assert_eq!(freed, ids(&[1, 2]));
        assert!(h.container.node(WindowId(2)).is_none());
        assert_eq!(h.container.destroy(), ids(&[3]));
        assert!(h.container.tree().is_empty());
    }

    #[test]
    fn removed_windows_can_be_added_again() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.container.remove_window_node(WindowId(1)).unwrap();
        h.container.add_window_node(WindowId(1), None).unwrap();
        assert_eq!(h.z_order(), vec![1]);
        assert!(h.node(1).current_visibility);
    }

    #[test]
    fn removing_a_detached_window_does_nothing() {
        let mut h = Harness::new();
        h.add(status_bar(9));
        h.container.remove_window_node(WindowId(9)).unwrap();
        h.events.take();
        let removed = h.compositor.log().removed.len();

        assert_eq!(h.container.remove_window_node(WindowId(9)), Err(WmError::DoNothing));
        assert!(h.events.take().is_empty());
        assert_eq!(h.compositor.log().removed.len(), removed);

        assert_eq!(h.container.destroy_window_node(WindowId(9)), Ok(ids(&[9])));
        assert_eq!(
            h.container.destroy_window_node(WindowId(9)),
            Err(WmError::WindowNotFound(WindowId(9)))
        );
    }

    #[test]
    fn never_added_window_cannot_be_removed() {
        let mut h = Harness::new();
        h.container.register_window(app(1, WindowMode::Floating));
        assert_eq!(h.container.remove_window_node(WindowId(1)), Err(WmError::DoNothing));
        assert_eq!(h.container.destroy_window_node(WindowId(1)), Ok(ids(&[1])));
    }

    #[test]
    fn failed_add_leaves_window_hidden() {
        let mut h = Harness::new();
        h.add(window(3, WindowType::Toast).with_mode(WindowMode::Floating));
        h.container.register_window(window(4, WindowType::AppSub));

        assert_eq!(
            h.container.add_window_node(WindowId(4), Some(WindowId(99))),
            Err(WmError::InvalidParent(WindowId(99)))
        );
        assert!(matches!(
            h.container.add_window_node(WindowId(4), Some(WindowId(3))),
            Err(WmError::InvalidParam(_))
        ));
        assert!(!h.node(4).requested_visibility);
        assert!(!h.node(4).current_visibility);
    }

    #[test]
    fn bars_report_avoid_area_changes() {
        let mut h = Harness::new();
        h.add(status_bar(9));
        let events = h.events.take();
        assert!(events.contains(&WindowEvent::AvoidAreaChanged {
            window: WindowId(9),
            display: D0,
            change: AvoidChange::Added,
        }));
        assert_eq!(h.container.group().system_bars(D0).and_then(|s| s.status), h.container.tree().find(WindowId(9)));

        h.container.remove_window_node(WindowId(9)).unwrap();
        assert!(h.events.take().contains(&WindowEvent::AvoidAreaChanged {
            window: WindowId(9),
            display: D0,
            change: AvoidChange::Removed,
        }));
        assert_eq!(h.container.group().system_bars(D0).and_then(|s| s.status), None);
    }

    #[test]
    fn size_change_reason_reaches_client_once() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        let rect = h.node(1).window_rect;
        h.container.update_size_change_reason(WindowId(1), WindowSizeChangeReason::Drag).unwrap();
        assert_eq!(h.client.log().rects.last(), Some(&(WindowId(1), rect, WindowSizeChangeReason::Drag)));
        assert_eq!(h.node(1).size_change_reason, WindowSizeChangeReason::Undefined);
    }
}

mod split {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn paired() -> Harness {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::SplitPrimary).with_mission_id(11));
        h.add(app(2, WindowMode::SplitSecondary).with_mission_id(12));
        h.add(app(3, WindowMode::Floating));
        h.add(window(9, WindowType::DockSlice).with_mission_id(11));
        h
    }

    #[test]
    fn divider_is_inserted_after_the_second_split_window() {
        let h = paired();
        assert_eq!(h.z_order(), vec![1, 2, 9, 3]);
        let pair = h.container.window_pair(D0).unwrap();
        assert_eq!(pair.status(), PairStatus::PairedDone);
        assert!(pair.is_paired(h.container.tree()));
    }

    #[test]
    fn entering_split_requests_placeholder_and_divider() {
        let h = paired();
        let events = h.events.take();
        assert!(events.iter().any(|e| matches!(e, WindowEvent::PlaceholderRequested { mode: WindowMode::SplitSecondary, .. })));
        assert!(events.iter().any(|e| matches!(e, WindowEvent::Split { kind: SplitEventKind::ShowDivider, .. })));
    }

    #[test]
    fn removing_a_paired_window_clears_the_pair() {
        let mut h = paired();
        h.events.take();
        h.container.remove_window_node(WindowId(1)).unwrap();

        let pair = h.container.window_pair(D0).unwrap();
        assert_eq!(pair.status(), PairStatus::Empty);
        assert_eq!(pair.primary(), None);
        assert_eq!(pair.divider(), None);
        assert!(h.events.take().iter().any(|e| matches!(
            e,
            WindowEvent::Split { kind: SplitEventKind::DestroyDivider, mission_id: Some(11), .. }
        )));
        assert!(h.client.log().modes.iter().any(|(w, _)| *w == WindowId(2)));
    }

    #[test]
    fn raising_a_split_window_raises_the_whole_pair() {
        let mut h = paired();
        h.container.raise_z_order_for_app_window(WindowId(2)).unwrap();
        assert_eq!(h.z_order(), vec![3, 1, 2, 9]);
    }

    #[test]
    fn dock_slice_queries() {
        let h = paired();
        assert!(!h.container.is_forbid_dock_slice_move(D0));
        assert!(h.container.is_forbid_dock_slice_move(D1));
        assert!(!h.container.is_dock_slice_in_exit_split_mode_area(D1));
    }

    #[test]
    fn exit_split_mode_minimizes_one_side() {
        let mut h = paired();
        h.container.exit_split_mode(D0).unwrap();
        let entries = h.minimize.entries();
        assert_eq!(entries.iter().filter(|(_, r)| *r == MinimizeReason::SplitQuit).count(), 1);
        assert_eq!(h.container.exit_split_mode(D1), Err(WmError::DisplayNotFound(D1)));
    }
}

mod focus {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn focus_changes_are_idempotent() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add(app(2, WindowMode::Floating));
        h.events.take();

        h.container.set_focus_window(WindowId(1)).unwrap();
        assert_eq!(h.container.set_focus_window(WindowId(1)), Err(WmError::DoNothing));
        h.container.set_focus_window(WindowId(2)).unwrap();
        assert_eq!(
            h.events.take(),
            vec![
                WindowEvent::FocusChanged { window: WindowId(1), focused: true },
                WindowEvent::FocusChanged { window: WindowId(1), focused: false },
                WindowEvent::FocusChanged { window: WindowId(2), focused: true },
            ]
        );
        assert_eq!(h.container.focused_window(), Some(WindowId(2)));
    }

    #[test]
    fn active_window_drives_brightness() {
        let mut h = Harness::new();
        let mut bright = app(1, WindowMode::Floating);
        bright.brightness = Some(0.5);
        h.add(bright);
        h.add(app(2, WindowMode::Floating));
        h.events.take();

        h.container.set_active_window(WindowId(1), false).unwrap();
        assert_eq!(h.container.set_active_window(WindowId(1), false), Err(WmError::DoNothing));
        h.container.set_active_window(WindowId(2), false).unwrap();
        assert_eq!(
            h.events.take(),
            vec![
                WindowEvent::ActiveChanged { window: WindowId(1) },
                WindowEvent::BrightnessOverride { display: D0, brightness: Some(127) },
                WindowEvent::ActiveChanged { window: WindowId(2) },
                WindowEvent::BrightnessOverride { display: D0, brightness: None },
            ]
        );
        assert_eq!(h.container.brightness_window(), None);
    }

    #[test]
    fn system_windows_keep_brightness_unless_activated_by_removal() {
        let mut h = Harness::new();
        let mut bright = app(1, WindowMode::Floating);
        bright.brightness = Some(1.0);
        h.add(bright);
        h.add(window(5, WindowType::Toast).with_mode(WindowMode::Floating));
        h.container.set_active_window(WindowId(1), false).unwrap();
        h.events.take();

        h.container.set_active_window(WindowId(5), false).unwrap();
        assert_eq!(h.events.take(), vec![WindowEvent::ActiveChanged { window: WindowId(5) }]);
        assert_eq!(h.container.brightness_window(), Some(WindowId(1)));
    }

    #[test]
    fn next_windows_follow_stacking_order() {
        let mut h = Harness::new();
        h.add(window(8, WindowType::Desktop));
        h.add(app(1, WindowMode::Floating));
        h.add(app(2, WindowMode::Floating).with_focusable(false));
        h.add(app(3, WindowMode::Floating));
        h.add(window(5, WindowType::Toast).with_mode(WindowMode::Floating));

        assert_eq!(h.container.next_focusable_window(WindowId(3)), Some(WindowId(1)));
        assert_eq!(h.container.next_focusable_window(WindowId(5)), Some(WindowId(3)));
        assert_eq!(h.container.next_active_window(WindowId(3)), Some(WindowId(2)));
        assert_eq!(h.container.next_active_window(WindowId(5)), Some(WindowId(1)));
        assert_eq!(h.container.next_active_window(WindowId(42)), None);
        assert_eq!(h.container.desktop_window(), Some(WindowId(8)));
    }

    #[test]
    fn system_window_falls_back_to_desktop() {
        let mut h = Harness::new();
        h.add(window(8, WindowType::Desktop));
        h.add(window(5, WindowType::Toast).with_mode(WindowMode::Floating));
        assert_eq!(h.container.next_active_window(WindowId(5)), Some(WindowId(8)));
    }
}

mod keyguard {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn locked() -> Harness {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating).with_flags(WindowFlags::SHOW_WHEN_LOCKED));
        h.add(app(2, WindowMode::Floating));
        h.add(window(10, WindowType::Keyguard).with_mode(WindowMode::Floating));
        h
    }

    #[test]
    fn show_when_locked_windows_rise_above_keyguard() {
        let h = locked();
        assert!(h.container.is_screen_locked());
        assert_eq!(h.z_order(), vec![2, 10, 1]);
        assert_eq!(h.node(1).priority, WindowType::Keyguard.priority() + 1);
        assert!(!h.node(1).mode_support.contains(ModeSupport::SPLIT_PRIMARY));
        assert!(h.events.take().contains(&WindowEvent::ScreenLocked { locked: true }));
    }

    #[test]
    fn input_method_floats_above_raised_windows() {
        let mut h = locked();
        h.add(window(20, WindowType::InputMethodFloat).with_mode(WindowMode::Floating));
        assert_eq!(h.z_order(), vec![2, 10, 1, 20]);
    }

    #[test]
    fn split_is_refused_while_locked() {
        let mut h = locked();
        assert!(matches!(
            h.container.set_window_mode(WindowId(1), WindowMode::SplitSecondary),
            Err(WmError::InvalidParam(_))
        ));
    }

    #[test]
    fn unlocking_restores_windows() {
        let mut h = locked();
        h.events.take();
        h.container.remove_window_node(WindowId(10)).unwrap();

        assert!(!h.container.is_screen_locked());
        assert_eq!(h.z_order(), vec![2, 1]);
        assert_eq!(h.node(1).priority, 0);
        assert_eq!(h.node(1).mode_support, ModeSupport::ALL);
        assert!(h.events.take().contains(&WindowEvent::ScreenLocked { locked: false }));
    }
}

mod modes {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn fullscreen_minimizes_other_structured_windows() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Fullscreen));
        h.add(app(2, WindowMode::Floating));
        h.add(app(3, WindowMode::Fullscreen));
        h.add(app(4, WindowMode::Pip));

        h.container.set_window_mode(WindowId(2), WindowMode::Fullscreen).unwrap();
        let entries = h.minimize.entries();
        assert!(entries.contains(&(WindowId(1), MinimizeReason::OtherWindow)));
        assert!(entries.contains(&(WindowId(3), MinimizeReason::OtherWindow)));
        assert!(!entries.iter().any(|(w, _)| *w == WindowId(2) || *w == WindowId(4)));
        assert!(h.client.log().modes.contains(&(WindowId(2), WindowMode::Fullscreen)));
        assert_eq!(h.node(2).last_mode, WindowMode::Floating);
    }

    #[test]
    fn same_mode_is_a_no_op() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.container.set_window_mode(WindowId(1), WindowMode::Floating).unwrap();
        assert!(h.client.log().modes.is_empty());
    }

    #[test]
    fn hot_zones_cover_display_edges() {
        let h = Harness::new();
        let config = ModeChangeHotZones { fullscreen_range: 40, primary_range: 30, secondary_range: 20 };
        let zones = h.container.get_mode_change_hot_zones(D0, &config).unwrap();
        assert_eq!(
            zones,
            ModeChangeHotZoneRects {
                fullscreen: Rect::new(0, 0, 1440, 40),
                primary: Rect::new(0, 0, 30, 900),
                secondary: Rect::new(1420, 0, 20, 900),
            }
        );
        assert_eq!(h.container.get_mode_change_hot_zones(D1, &config), Err(WmError::DisplayNotFound(D1)));
    }

    #[test]
    fn layout_switch_round_trips() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.container.switch_layout_policy(LayoutMode::Tile, D0, false).unwrap();
        assert_eq!(h.container.layout_mode(), LayoutMode::Tile);
        assert_eq!(h.container.switch_layout_policy(LayoutMode::Cascade, D1, false), Err(WmError::DisplayNotFound(D1)));

        h.container.update_window_node(WindowId(1), WindowUpdateReason::Rect).unwrap();
        assert_eq!(h.container.layout_mode(), LayoutMode::Cascade);
    }

    #[test]
    fn minimize_all_and_oldest() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add(app(2, WindowMode::Floating));
        h.container.minimize_oldest_app_window();
        assert_eq!(h.minimize.entries(), vec![(WindowId(1), MinimizeReason::MaxAppCount)]);

        h.container.minimize_all_app_windows(D0).unwrap();
        let entries = h.minimize.entries();
        assert!(entries.contains(&(WindowId(1), MinimizeReason::MinimizeAll)));
        assert!(entries.contains(&(WindowId(2), MinimizeReason::MinimizeAll)));
    }
}

mod backup {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn re_add(c: &mut WindowNodeContainer, window: WindowId, _: WindowMode) -> bool {
        c.add_window_node(window, None).is_ok()
    }

    #[test]
    fn toggle_hides_and_restores_app_windows() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.add(app(2, WindowMode::Floating));

        h.container.toggle_shown_state_for_all_app_windows(re_add, false).unwrap();
        assert!(h.container.is_app_windows_empty());
        assert_eq!(h.container.backup().window_ids(), ids(&[1, 2]).as_slice());
        assert_eq!(h.container.backup().mode_of(WindowId(2)), Some(WindowMode::Floating));

        h.container.toggle_shown_state_for_all_app_windows(re_add, true).unwrap();
        assert_eq!(h.z_order(), vec![1, 2]);
        assert!(h.container.backup().is_empty());
    }

    #[test]
    fn fullscreen_recent_blocks_restore() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.container.toggle_shown_state_for_all_app_windows(re_add, false).unwrap();
        h.add(window(30, WindowType::LauncherRecent));
        assert_eq!(
            h.container.toggle_shown_state_for_all_app_windows(re_add, true),
            Err(WmError::DoNothing)
        );
        assert!(!h.container.backup().is_empty());
    }

    #[test]
    fn adding_a_main_window_drops_the_backup() {
        let mut h = Harness::new();
        h.add(app(1, WindowMode::Floating));
        h.container.toggle_shown_state_for_all_app_windows(re_add, false).unwrap();
        h.add(app(2, WindowMode::Floating));
        assert!(h.container.backup().is_empty());
    }
}

mod displays {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn two_displays() -> Harness {
        let mut h = Harness::new();
        let rects = BTreeMap::from([
            (D0, Rect::new(0, 0, 1440, 900)),
            (D1, Rect::new(1440, 0, 1440, 900)),
        ]);
        h.container
            .process_display_create(DisplayInfo::new(D1, Rect::new(1440, 0, 1440, 900)), &rects)
            .unwrap();
        h
    }

    #[test]
    fn created_display_gets_buckets_and_pair() {
        let h = two_displays();
        assert!(h.container.window_pair(D1).is_some());
        assert!(h.container.group().buckets(D1).is_some());
        assert!(!h.container.is_vertical_display(D1));
    }

    #[test]
    fn destroying_a_display_moves_windows_and_drops_its_bars() {
        let mut h = two_displays();
        h.add(status_bar(9).with_display(D1));
        h.add(app(1, WindowMode::Floating).with_display(D1));

        let rects = BTreeMap::from([(D0, Rect::new(0, 0, 1440, 900))]);
        let destroyed = h.container.process_display_destroy(D1, &rects).unwrap();

        assert_eq!(destroyed, ids(&[9]));
        assert_eq!(h.node(1).display_id, D0);
        assert!(h.container.window_pair(D1).is_none());
        assert!(h.container.group().buckets(D1).is_none());
        let log = h.compositor.log();
        assert!(log.removed.contains(&(WindowId(1), D1)));
        assert!(log.added.contains(&(WindowId(1), D0)));
    }

    #[test]
    fn default_and_unknown_displays_cannot_be_destroyed() {
        let mut h = two_displays();
        let rects = BTreeMap::new();
        assert!(matches!(h.container.process_display_destroy(D0, &rects), Err(WmError::InvalidOperation(_))));
        assert_eq!(
            h.container.process_display_destroy(DisplayId(5), &rects),
            Err(WmError::DisplayNotFound(DisplayId(5)))
        );
    }

    #[test]
    fn display_changes_reject_topology_events() {
        let mut h = Harness::new();
        let info = DisplayInfo::new(D0, Rect::new(0, 0, 1440, 900));
        let rects = BTreeMap::from([(D0, info.rect)]);
        assert!(matches!(
            h.container.process_display_change(&info, &rects, DisplayStateChange::Create),
            Err(WmError::InvalidParam(_))
        ));
        let unknown = DisplayInfo::new(D1, Rect::new(0, 0, 10, 10));
        assert_eq!(
            h.container.process_display_change(&unknown, &rects, DisplayStateChange::SizeChange),
            Err(WmError::DisplayNotFound(D1))
        );
    }
}

//! Split-screen pairing for one display.
//!
//! A pair has three slots (primary, secondary, divider). The status is
//! always derived from which slots are filled; the side effects of moving
//! between statuses come from an explicit transition table.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::minimize::{MinimizeReason, MinimizeSink};
use super::tree::{NodeId, WindowTree};
use super::window_node::{ModeSupport, WindowFlags, WindowMode, WindowNode, WindowType};
use crate::container::collaborators::{ClientNotifier, SplitEventKind, WindowEvent, WindowEventSink};
use crate::sys::display::DisplayId;
use crate::sys::geometry::Rect;

pub const DEFAULT_SPLIT_RATIO: f32 = 0.5;
const PLACEHOLDER_RECT: Rect = Rect::new(0, 0, 512, 512);

pub struct PairContext<'a> {
    pub tree: &'a mut WindowTree,
    pub minimize: &'a mut dyn MinimizeSink,
    pub events: &'a mut dyn WindowEventSink,
    pub client: &'a mut dyn ClientNotifier,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    #[default]
    Empty,
    SinglePrimary,
    SingleSecondary,
    Pairing,
    PairedDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Keep,
    RequestDivider,
    Clear,
}

impl PairStatus {
    fn is_single(self) -> bool {
        matches!(self, PairStatus::SinglePrimary | PairStatus::SingleSecondary)
    }

    fn is_pairing(self) -> bool { matches!(self, PairStatus::Pairing | PairStatus::PairedDone) }

    /// Side effect of moving from `self` to `next`, or `None` when the move
    /// is not part of the state graph.
    fn transition(self, next: PairStatus) -> Option<Transition> {
        use PairStatus::*;
        let action = match (self, next) {
            (a, b) if a == b => Transition::Keep,
            (Empty, b) if b.is_single() => Transition::Keep,
            (Empty, Pairing) => Transition::RequestDivider,
            (a, b) if a.is_single() && b.is_single() => Transition::Keep,
            (a, Pairing) if a.is_single() => Transition::RequestDivider,
            (a, PairedDone) if a.is_single() => Transition::Keep,
            (a, Empty) if a.is_single() => Transition::Clear,
            (Pairing, PairedDone) | (PairedDone, Pairing) => Transition::Keep,
            (a, b) if a.is_pairing() && !b.is_pairing() => Transition::Clear,
            _ => return None,
        };
        Some(action)
    }

    /// Whether the state graph allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: PairStatus) -> bool { self.transition(next).is_some() }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WindowPair {
    display_id: DisplayId,
    primary: Option<NodeId>,
    secondary: Option<NodeId>,
    divider: Option<NodeId>,
    status: PairStatus,
    ratio: f32,
    divider_rect: Rect,
    restoring: bool,
}

impl WindowPair {
    pub fn new(display_id: DisplayId) -> Self {
        WindowPair {
            display_id,
            primary: None,
            secondary: None,
            divider: None,
            status: PairStatus::Empty,
            ratio: DEFAULT_SPLIT_RATIO,
            divider_rect: Rect::default(),
            restoring: false,
        }
    }

    pub fn display_id(&self) -> DisplayId { self.display_id }

    pub fn status(&self) -> PairStatus { self.status }

    pub fn primary(&self) -> Option<NodeId> { self.primary }

    pub fn secondary(&self) -> Option<NodeId> { self.secondary }

    pub fn divider(&self) -> Option<NodeId> { self.divider }

    pub fn split_ratio(&self) -> f32 { self.ratio }

    pub fn set_split_ratio(&mut self, ratio: f32) { self.ratio = ratio; }

    pub fn divider_rect(&self) -> Rect { self.divider_rect }

    pub fn set_divider_rect(&mut self, rect: Rect) { self.divider_rect = rect; }

    /// Stores the divider rect computed for a rotated display.
    pub fn rotate_divider_window(&mut self, rect: Rect) {
        self.divider_rect = rect;
        if self.divider.is_none() {
            debug!(display = %self.display_id, "no divider to rotate");
        }
    }

    /// While restoring, re-entering split mode does not request a
    /// placeholder or the recent-apps picker.
    pub fn set_all_split_app_windows_restoring(&mut self, restoring: bool) {
        self.restoring = restoring;
    }

    pub fn find(&self, id: NodeId) -> Option<NodeId> {
        [self.primary, self.secondary, self.divider].into_iter().flatten().find(|n| *n == id)
    }

    pub fn is_paired(&self, tree: &WindowTree) -> bool {
        let (Some(primary), Some(secondary)) = (self.primary, self.secondary) else {
            return false;
        };
        self.divider.is_some()
            && mode_of(tree, primary) == Some(WindowMode::SplitPrimary)
            && mode_of(tree, secondary) == Some(WindowMode::SplitSecondary)
    }

    pub fn is_split_related(node: &WindowNode) -> bool {
        node.is_split_mode() || node.window_type == WindowType::DockSlice
    }

    pub fn is_forbid_dock_slice_move(&self, tree: &WindowTree) -> bool {
        if self.status != PairStatus::PairedDone {
            return false;
        }
        let forbids = |slot: Option<NodeId>| {
            slot.and_then(|id| tree.get(id))
                .is_none_or(|n| n.flags.contains(WindowFlags::FORBID_SPLIT_MOVE))
        };
        forbids(self.primary) || forbids(self.secondary)
    }

    /// Whether the divider has been dragged past either exit point.
    pub fn is_dock_slice_in_exit_split_mode_area(
        &self,
        tree: &WindowTree,
        exit_split_points: &[i32],
    ) -> bool {
        if !self.is_paired(tree) || exit_split_points.len() < 2 {
            return false;
        }
        let Some(rect) = self.divider.and_then(|id| tree.get(id)).map(|n| n.window_rect) else {
            return false;
        };
        let origin = if rect.width < rect.height { rect.x } else { rect.y };
        origin < exit_split_points[0] || origin > exit_split_points[1]
    }

    /// Minimizes whichever paired window currently has the smaller extent
    /// along the split axis.
    pub fn exit_split_mode(&mut self, ctx: &mut PairContext<'_>) {
        if !self.is_paired(ctx.tree) {
            return;
        }
        let (Some(primary), Some(secondary), Some(divider)) =
            (self.primary, self.secondary, self.divider)
        else {
            return;
        };
        let divider_rect = ctx.tree[divider].window_rect;
        let primary_rect = ctx.tree[primary].window_rect;
        let secondary_rect = ctx.tree[secondary].window_rect;
        let horizontal_divider = divider_rect.height < divider_rect.width;
        let primary_smaller = if horizontal_divider {
            primary_rect.height < secondary_rect.height
        } else {
            primary_rect.width < secondary_rect.width
        };
        let hide = if primary_smaller { primary } else { secondary };
        let window = ctx.tree[hide].id;
        info!(%window, "exit split mode");
        ctx.minimize.add_candidate(window, MinimizeReason::SplitQuit);
    }

    /// Empties every slot. Paired windows that can only live in split mode
    /// are minimized, the others go back to their previous mode.
    pub fn clear(&mut self, ctx: &mut PairContext<'_>) {
        info!(display = %self.display_id, status = ?self.status, "clear window pair");
        for slot in [self.primary.take(), self.secondary.take()].into_iter().flatten() {
            let Some(node) = ctx.tree.get_mut(slot) else { continue };
            if node.mode_support == ModeSupport::SPLIT {
                ctx.minimize.add_candidate(node.id, MinimizeReason::SplitQuit);
            } else {
                node.resume_last_mode();
                ctx.client.update_window_mode(node.id, node.mode);
            }
        }
        if let Some(divider) = self.divider.take() {
            let mission_id = ctx.tree.get(divider).and_then(|n| n.mission_id);
            ctx.events.emit(WindowEvent::Split {
                display: self.display_id,
                kind: SplitEventKind::DestroyDivider,
                mission_id,
            });
        }
        self.status = PairStatus::Empty;
    }

    /// Paired app windows in stacking order (the window being raised last),
    /// followed by the divider.
    pub fn ordered_pair(&self, tree: &WindowTree, id: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let Some(node) = self.find(id).and_then(|id| tree.get(id)) else {
            return ordered;
        };
        let is_app = |slot: Option<NodeId>| {
            slot.filter(|id| tree.get(*id).is_some_and(|n| n.window_type.is_app_window()))
        };
        if node.mode == WindowMode::SplitSecondary || node.window_type == WindowType::DockSlice {
            ordered.extend(is_app(self.primary));
            ordered.extend(is_app(self.secondary));
        } else if node.mode == WindowMode::SplitPrimary {
            ordered.extend(is_app(self.secondary));
            ordered.extend(is_app(self.primary));
        }
        ordered.extend(self.divider);
        ordered
    }

    pub fn paired_windows(&self) -> Vec<NodeId> {
        match (self.status, self.primary, self.secondary) {
            (PairStatus::PairedDone, Some(primary), Some(secondary)) => vec![primary, secondary],
            _ => Vec::new(),
        }
    }

    /// Re-reads `id`'s mode and type and updates the slots accordingly.
    pub fn update_if_split_related(&mut self, ctx: &mut PairContext<'_>, id: NodeId) {
        let Some(node) = ctx.tree.get(id) else { return };
        let found = self.find(id).is_some();
        if !found && !Self::is_split_related(node) {
            debug!(window = %node.id, "not split related");
            return;
        }
        if node.window_type == WindowType::Placeholder {
            let mode = node.mode;
            let occupied = [self.primary, self.secondary]
                .into_iter()
                .flatten()
                .any(|slot| mode_of(ctx.tree, slot) == Some(mode));
            if occupied {
                ctx.events.emit(WindowEvent::PlaceholderDestroyed { display: self.display_id });
                return;
            }
        }
        debug!(window = %node.id, status = ?self.status, mode = ?node.mode, "update pair");
        if self.status == PairStatus::Empty {
            let mode = node.mode;
            let window_type = node.window_type;
            let mission_id = node.mission_id;
            self.insert(ctx, id);
            if !self.restoring {
                let holder_mode = if mode == WindowMode::SplitPrimary {
                    WindowMode::SplitSecondary
                } else {
                    WindowMode::SplitPrimary
                };
                ctx.events.emit(WindowEvent::PlaceholderRequested {
                    display: self.display_id,
                    mode: holder_mode,
                    rect: PLACEHOLDER_RECT,
                });
                if window_type != WindowType::DockSlice {
                    let kind = if mode == WindowMode::SplitSecondary {
                        SplitEventKind::ShowPrimary
                    } else {
                        SplitEventKind::ShowSecondary
                    };
                    ctx.events.emit(WindowEvent::Split {
                        display: self.display_id,
                        kind,
                        mission_id,
                    });
                }
            }
        } else if !found {
            self.insert(ctx, id);
        } else {
            self.handle_paired_nodes_change(ctx, id);
        }
    }

    pub fn handle_remove_window(&mut self, ctx: &mut PairContext<'_>, id: NodeId) {
        if self.find(id).is_some() {
            info!(display = %self.display_id, "paired window removed");
            self.clear(ctx);
            return;
        }
        let Some(node) = ctx.tree.get_mut(id) else { return };
        if node.is_split_mode() {
            debug!(window = %node.id, "resume unpaired split window");
            node.resume_last_mode();
            ctx.client.update_window_mode(node.id, node.mode);
        }
    }

    fn insert(&mut self, ctx: &mut PairContext<'_>, id: NodeId) {
        let Some(node) = ctx.tree.get(id) else { return };
        let slot = match node.mode {
            WindowMode::SplitPrimary => &mut self.primary,
            WindowMode::SplitSecondary => &mut self.secondary,
            _ if node.window_type == WindowType::DockSlice => &mut self.divider,
            _ => return,
        };
        let replaced = slot.replace(id).filter(|prev| *prev != id);
        if let Some(prev) = replaced.and_then(|prev| ctx.tree.get(prev)) {
            if prev.window_type.is_app_window() {
                ctx.minimize.add_candidate(prev.id, MinimizeReason::SplitReplace);
            }
        }
        self.update_status(ctx);
    }

    fn handle_paired_nodes_change(&mut self, ctx: &mut PairContext<'_>, trigger: NodeId) {
        let is_split = |tree: &WindowTree, slot: NodeId| mode_of(tree, slot).is_some_and(|m| m.is_split());
        self.primary = self.primary.filter(|id| is_split(ctx.tree, *id));
        self.secondary = self.secondary.filter(|id| is_split(ctx.tree, *id));

        let primary_mode = self.primary.and_then(|id| mode_of(ctx.tree, id));
        let secondary_mode = self.secondary.and_then(|id| mode_of(ctx.tree, id));
        match (primary_mode, secondary_mode) {
            (Some(WindowMode::SplitSecondary), None) | (None, Some(WindowMode::SplitPrimary)) => {
                std::mem::swap(&mut self.primary, &mut self.secondary);
            }
            (Some(a), Some(b)) if a == b => self.switch_position(ctx, trigger),
            _ => {}
        }
        self.update_status(ctx);
    }

    /// Both sides request the same mode. The window that triggered the
    /// update keeps it and the other one moves to the opposite side.
    fn switch_position(&mut self, ctx: &mut PairContext<'_>, trigger: NodeId) {
        let (Some(primary), Some(secondary)) = (self.primary, self.secondary) else {
            return;
        };
        let Some(shared) = mode_of(ctx.tree, primary) else { return };
        let Some(opposite) = shared.opposite_split() else { return };
        let other = if trigger == primary {
            secondary
        } else if trigger == secondary {
            primary
        } else if shared == WindowMode::SplitPrimary {
            primary
        } else {
            secondary
        };
        let node = &mut ctx.tree[other];
        debug!(window = %node.id, from = ?shared, to = ?opposite, "switch pair position");
        node.set_mode(opposite);
        ctx.client.update_window_mode(node.id, opposite);

        let keeper = if other == primary { secondary } else { primary };
        if shared == WindowMode::SplitPrimary {
            self.primary = Some(keeper);
            self.secondary = Some(other);
        } else {
            self.primary = Some(other);
            self.secondary = Some(keeper);
        }
    }

    fn update_status(&mut self, ctx: &mut PairContext<'_>) {
        let prev = self.status;
        let next = match (self.primary, self.secondary, self.divider) {
            (Some(_), Some(_), Some(_)) => PairStatus::PairedDone,
            (Some(_), Some(_), None) => PairStatus::Pairing,
            (Some(_), None, _) => PairStatus::SinglePrimary,
            (None, Some(_), _) => PairStatus::SingleSecondary,
            (None, None, _) => PairStatus::Empty,
        };
        self.status = next;
        debug!(display = %self.display_id, ?prev, ?next, "pair status");
        match prev.transition(next) {
            Some(Transition::Keep) => {}
            Some(Transition::RequestDivider) => {
                let mission_id = self.primary.and_then(|id| ctx.tree.get(id)).and_then(|n| n.mission_id);
                ctx.events.emit(WindowEvent::Split {
                    display: self.display_id,
                    kind: SplitEventKind::ShowDivider,
                    mission_id,
                });
            }
            Some(Transition::Clear) => self.clear(ctx),
            None => {
                error!(?prev, ?next, "illegal pair transition, clearing");
                self.clear(ctx);
            }
        }
    }
}

fn mode_of(tree: &WindowTree, id: NodeId) -> Option<WindowMode> { tree.get(id).map(|n| n.mode) }

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::container::collaborators::Discard;
    use crate::model::minimize::MinimizeList;
    use crate::model::window_node::WindowId;

    struct Harness {
        tree: WindowTree,
        minimize: MinimizeList,
        events: Vec<WindowEvent>,
        client: Discard,
        pair: WindowPair,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                tree: WindowTree::new(),
                minimize: MinimizeList::new(),
                events: Vec::new(),
                client: Discard,
                pair: WindowPair::new(DisplayId(0)),
            }
        }

        fn add(&mut self, id: u32, ty: WindowType, mode: WindowMode) -> NodeId {
            let node = WindowNode::new(WindowId(id), ty).with_mode(mode).with_mission_id(id as i32);
            self.tree.insert(node)
        }

        fn update(&mut self, id: NodeId) -> PairStatus {
            let mut ctx = PairContext {
                tree: &mut self.tree,
                minimize: &mut self.minimize,
                events: &mut self.events,
                client: &mut self.client,
            };
            self.pair.update_if_split_related(&mut ctx, id);
            self.pair.status()
        }

        fn remove(&mut self, id: NodeId) -> PairStatus {
            let mut ctx = PairContext {
                tree: &mut self.tree,
                minimize: &mut self.minimize,
                events: &mut self.events,
                client: &mut self.client,
            };
            self.pair.handle_remove_window(&mut ctx, id);
            self.pair.status()
        }

        fn set_mode(&mut self, id: NodeId, mode: WindowMode) { self.tree[id].set_mode(mode); }

        fn assert_invariant(&self) {
            let paired = self.pair.primary.is_some()
                && self.pair.secondary.is_some()
                && self.pair.divider.is_some()
                && self.pair.primary.map(|id| self.tree[id].mode) == Some(WindowMode::SplitPrimary)
                && self.pair.secondary.map(|id| self.tree[id].mode)
                    == Some(WindowMode::SplitSecondary);
            assert_eq!(self.pair.status() == PairStatus::PairedDone, paired);
        }
    }

    #[test]
    fn primary_then_divider_then_secondary() {
        let mut h = Harness::new();
        let primary = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let divider = h.add(2, WindowType::DockSlice, WindowMode::Floating);
        let secondary = h.add(3, WindowType::AppMain, WindowMode::SplitSecondary);

        assert_eq!(h.update(primary), PairStatus::SinglePrimary);
        assert_eq!(h.update(divider), PairStatus::SinglePrimary);
        h.assert_invariant();
        assert_eq!(h.update(secondary), PairStatus::PairedDone);
        h.assert_invariant();
        assert!(h.pair.is_paired(&h.tree));

        assert_eq!(h.remove(primary), PairStatus::Empty);
        assert_eq!(h.pair.primary(), None);
        assert_eq!(h.pair.divider(), None);
        assert!(h.events.iter().any(|e| matches!(
            e,
            WindowEvent::Split { kind: SplitEventKind::DestroyDivider, .. }
        )));
    }

    #[test]
    fn entering_from_empty_requests_placeholder_and_recent() {
        let mut h = Harness::new();
        let primary = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        h.update(primary);
        assert_eq!(
            h.events,
            vec![
                WindowEvent::PlaceholderRequested {
                    display: DisplayId(0),
                    mode: WindowMode::SplitSecondary,
                    rect: PLACEHOLDER_RECT,
                },
                WindowEvent::Split {
                    display: DisplayId(0),
                    kind: SplitEventKind::ShowSecondary,
                    mission_id: Some(1),
                },
            ]
        );
    }

    #[test]
    fn restoring_skips_placeholder() {
        let mut h = Harness::new();
        h.pair.set_all_split_app_windows_restoring(true);
        let primary = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        h.update(primary);
        assert!(h.events.is_empty());
    }

    #[test]
    fn pairing_requests_divider() {
        let mut h = Harness::new();
        let primary = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let secondary = h.add(2, WindowType::AppMain, WindowMode::SplitSecondary);
        h.update(primary);
        h.events.clear();
        assert_eq!(h.update(secondary), PairStatus::Pairing);
        assert_eq!(
            h.events,
            vec![WindowEvent::Split {
                display: DisplayId(0),
                kind: SplitEventKind::ShowDivider,
                mission_id: Some(1),
            }]
        );
    }

    #[test]
    fn placeholder_for_occupied_side_is_destroyed() {
        let mut h = Harness::new();
        let primary = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let holder = h.add(2, WindowType::Placeholder, WindowMode::SplitPrimary);
        h.update(primary);
        h.events.clear();
        assert_eq!(h.update(holder), PairStatus::SinglePrimary);
        assert_eq!(h.events, vec![WindowEvent::PlaceholderDestroyed { display: DisplayId(0) }]);
        assert_eq!(h.pair.primary(), Some(primary));
    }

    #[test]
    fn replacing_a_side_minimizes_previous_occupant() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let b = h.add(2, WindowType::AppMain, WindowMode::SplitPrimary);
        h.update(a);
        h.update(b);
        assert_eq!(h.pair.primary(), Some(b));
        assert_eq!(h.minimize.entries(), &[(WindowId(1), MinimizeReason::SplitReplace)]);
    }

    #[test]
    fn switching_side_keeps_trigger_mode() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let b = h.add(2, WindowType::AppMain, WindowMode::SplitSecondary);
        let d = h.add(3, WindowType::DockSlice, WindowMode::Floating);
        h.update(a);
        h.update(b);
        h.update(d);
        assert_eq!(h.pair.status(), PairStatus::PairedDone);

        h.set_mode(b, WindowMode::SplitPrimary);
        assert_eq!(h.update(b), PairStatus::PairedDone);
        assert_eq!(h.pair.primary(), Some(b));
        assert_eq!(h.pair.secondary(), Some(a));
        assert_eq!(h.tree[a].mode, WindowMode::SplitSecondary);
        h.assert_invariant();

        h.set_mode(b, WindowMode::SplitSecondary);
        assert_eq!(h.update(b), PairStatus::PairedDone);
        assert_eq!(h.pair.primary(), Some(a));
        assert_eq!(h.tree[a].mode, WindowMode::SplitPrimary);
        h.assert_invariant();
    }

    #[test]
    fn leaving_split_clears_and_resumes_other_side() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::Floating);
        h.set_mode(a, WindowMode::SplitPrimary);
        let b = h.add(2, WindowType::AppMain, WindowMode::Fullscreen);
        h.set_mode(b, WindowMode::SplitSecondary);
        let d = h.add(3, WindowType::DockSlice, WindowMode::Floating);
        h.update(a);
        h.update(b);
        h.update(d);

        h.set_mode(a, WindowMode::Floating);
        assert_eq!(h.update(a), PairStatus::Empty);
        assert_eq!(h.tree[b].mode, WindowMode::Fullscreen);
        assert_eq!(h.pair.divider(), None);
    }

    #[test]
    fn split_only_windows_are_minimized_on_clear() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        h.tree[a].mode_support = ModeSupport::SPLIT;
        let b = h.add(2, WindowType::AppMain, WindowMode::SplitSecondary);
        h.update(a);
        h.update(b);
        h.remove(b);
        assert!(h.minimize.entries().contains(&(WindowId(1), MinimizeReason::SplitQuit)));
    }

    #[test]
    fn exit_split_minimizes_smaller_side() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let b = h.add(2, WindowType::AppMain, WindowMode::SplitSecondary);
        let d = h.add(3, WindowType::DockSlice, WindowMode::Floating);
        h.tree[a].window_rect = Rect::new(0, 0, 100, 900);
        h.tree[b].window_rect = Rect::new(108, 0, 1332, 900);
        h.tree[d].window_rect = Rect::new(100, 0, 8, 900);
        h.update(a);
        h.update(b);
        h.update(d);

        assert!(h.pair.is_dock_slice_in_exit_split_mode_area(&h.tree, &[143, 1288]));
        assert!(!h.pair.is_dock_slice_in_exit_split_mode_area(&h.tree, &[50, 1288]));

        let mut ctx = PairContext {
            tree: &mut h.tree,
            minimize: &mut h.minimize,
            events: &mut h.events,
            client: &mut h.client,
        };
        h.pair.exit_split_mode(&mut ctx);
        assert_eq!(h.minimize.entries(), &[(WindowId(1), MinimizeReason::SplitQuit)]);
    }

    #[test]
    fn forbid_split_move_only_when_paired() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        h.tree[a].flags = WindowFlags::FORBID_SPLIT_MOVE;
        let b = h.add(2, WindowType::AppMain, WindowMode::SplitSecondary);
        let d = h.add(3, WindowType::DockSlice, WindowMode::Floating);
        h.update(a);
        h.update(b);
        assert!(!h.pair.is_forbid_dock_slice_move(&h.tree));
        h.update(d);
        assert!(h.pair.is_forbid_dock_slice_move(&h.tree));
    }

    #[test]
    fn ordered_pair_puts_trigger_on_top() {
        let mut h = Harness::new();
        let a = h.add(1, WindowType::AppMain, WindowMode::SplitPrimary);
        let b = h.add(2, WindowType::AppMain, WindowMode::SplitSecondary);
        let d = h.add(3, WindowType::DockSlice, WindowMode::Floating);
        h.update(a);
        h.update(b);
        h.update(d);
        assert_eq!(h.pair.ordered_pair(&h.tree, a), vec![b, a, d]);
        assert_eq!(h.pair.ordered_pair(&h.tree, b), vec![a, b, d]);
        assert_eq!(h.pair.ordered_pair(&h.tree, d), vec![a, b, d]);
        assert_eq!(h.pair.paired_windows(), vec![a, b]);
    }

    #[test]
    fn status_only_moves_along_graph() {
        let mut h = Harness::new();
        let ids: Vec<_> = (0..4)
            .map(|i| h.add(i + 1, WindowType::AppMain, WindowMode::Fullscreen))
            .collect();
        let divider = h.add(9, WindowType::DockSlice, WindowMode::Floating);
        let modes = [
            WindowMode::SplitPrimary,
            WindowMode::SplitSecondary,
            WindowMode::Floating,
            WindowMode::SplitPrimary,
            WindowMode::Fullscreen,
            WindowMode::SplitSecondary,
        ];

        let mut prev = h.pair.status();
        for step in 0..60usize {
            let next = if step % 7 == 3 {
                h.update(divider)
            } else if step % 11 == 5 {
                h.remove(ids[step % ids.len()])
            } else {
                let id = ids[(step * 3) % ids.len()];
                h.set_mode(id, modes[step % modes.len()]);
                h.update(id)
            };
            assert!(prev.can_transition_to(next), "{prev:?} -> {next:?} at step {step}");
            h.assert_invariant();
            prev = next;
        }
    }

    #[test]
    fn transition_table_rejects_skipping_to_paired() {
        assert!(!PairStatus::Empty.can_transition_to(PairStatus::PairedDone));
        assert!(PairStatus::SinglePrimary.can_transition_to(PairStatus::PairedDone));
        assert!(PairStatus::PairedDone.can_transition_to(PairStatus::Empty));
    }
}

//! Bookkeeping for a group of displays sharing one coordinate space.
//!
//! The controller owns the display registry, the per-display buckets of
//! main windows, one [`WindowPair`] per display and the system-bar slots.
//! It never owns windows: every operation borrows the arena and the active
//! policy from the container for the duration of the call.

use tracing::{debug, error, info, warn};

use super::collaborators::{Collaborators, Compositor, WindowEvent, WindowEventSink};
use super::{add_on_compositor, remove_from_compositor};
use crate::common::collections::{BTreeMap, BTreeSet, HashSet};
use crate::layout_engine::{LayoutContext, LayoutPolicy, LayoutPolicyKind};
use crate::model::tree::{DisplayGroupWindowTree, NodeId, RootBuckets, RootType, WindowTree};
use crate::model::window_node::{WindowMode, WindowSizeChangeReason, WindowType};
use crate::model::window_pair::WindowPair;
use crate::sys::display::{DisplayGroupInfo, DisplayId, DisplayInfo, DisplayStateChange};
use crate::sys::geometry::Rect;

/// Which pass of the container is asking for pre-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeUpdateKind {
    Added,
    Active,
}

/// Last region and immersive state reported for one system bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarTint {
    pub region: Rect,
    pub immersive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SystemBarSlots {
    pub status: Option<NodeId>,
    pub navigation: Option<NodeId>,
    status_tint: BarTint,
    navigation_tint: BarTint,
}

impl SystemBarSlots {
    fn slots_mut(&mut self) -> [(WindowType, &mut Option<NodeId>, &mut BarTint); 2] {
        [
            (WindowType::StatusBar, &mut self.status, &mut self.status_tint),
            (WindowType::NavigationBar, &mut self.navigation, &mut self.navigation_tint),
        ]
    }

    pub fn tint(&self, bar: WindowType) -> Option<BarTint> {
        match bar {
            WindowType::StatusBar => Some(self.status_tint),
            WindowType::NavigationBar => Some(self.navigation_tint),
            _ => None,
        }
    }
}

pub struct DisplayGroupController {
    pub(crate) displays: DisplayGroupInfo,
    pub(crate) buckets: DisplayGroupWindowTree,
    pairs: BTreeMap<DisplayId, WindowPair>,
    sys_bars: BTreeMap<DisplayId, SystemBarSlots>,
}

impl DisplayGroupController {
    pub fn new(default_display: DisplayId) -> Self {
        DisplayGroupController {
            displays: DisplayGroupInfo::new(default_display),
            buckets: DisplayGroupWindowTree::new(),
            pairs: BTreeMap::new(),
            sys_bars: BTreeMap::new(),
        }
    }

    pub fn displays(&self) -> &DisplayGroupInfo { &self.displays }

    pub fn default_display_id(&self) -> DisplayId { self.displays.default_display_id() }

    /// Borrows everything a policy needs for one call.
    pub(crate) fn layout_ctx<'a>(
        &'a mut self,
        tree: &'a mut WindowTree,
        collab: &'a mut Collaborators,
    ) -> LayoutContext<'a> {
        LayoutContext {
            tree,
            displays: &mut self.displays,
            buckets: &self.buckets,
            minimize: &mut *collab.minimize,
            client: &mut *collab.client,
        }
    }

    /// Creates the empty buckets, bar slots and pair of a display.
    pub fn init_new_display(&mut self, display: DisplayId) {
        self.sys_bars.entry(display).or_default();
        self.buckets.entry(display).or_default();
        self.pairs.entry(display).or_insert_with(|| WindowPair::new(display));
    }

    pub fn clear_map_of_destroyed_display(&mut self, display: DisplayId) {
        self.sys_bars.remove(&display);
        self.buckets.remove(&display);
        self.displays.remove_display_info(display);
        self.pairs.remove(&display);
    }

    pub fn bucket(&self, display: DisplayId, root: RootType) -> &[NodeId] {
        self.buckets.get(&display).map(|b| b[root.index()].as_slice()).unwrap_or(&[])
    }

    pub fn buckets(&self, display: DisplayId) -> Option<&RootBuckets> { self.buckets.get(&display) }

    pub fn window_pair(&self, display: DisplayId) -> Option<&WindowPair> { self.pairs.get(&display) }

    pub fn window_pair_mut(&mut self, display: DisplayId) -> Option<&mut WindowPair> {
        self.pairs.get_mut(&display)
    }

    pub(crate) fn pairs_mut(&mut self) -> impl Iterator<Item = (&DisplayId, &mut WindowPair)> {
        self.pairs.iter_mut()
    }

    pub fn set_divider_rect(&mut self, display: DisplayId, rect: Rect) {
        if let Some(pair) = self.pairs.get_mut(&display) {
            pair.set_divider_rect(rect);
        }
    }

    pub fn system_bars(&self, display: DisplayId) -> Option<&SystemBarSlots> { self.sys_bars.get(&display) }

    pub(crate) fn register_system_bar(&mut self, display_id: DisplayId, bar: WindowType, id: NodeId) {
        let Some(slots) = self.sys_bars.get_mut(&display_id) else {
            warn!(display = %display_id, ?bar, "no system bar slots for display");
            return;
        };
        for (ty, slot, _) in slots.slots_mut() {
            if ty == bar {
                *slot = Some(id);
            }
        }
    }

    pub(crate) fn unregister_system_bar(&mut self, id: NodeId) {
        for slots in self.sys_bars.values_mut() {
            for (_, slot, _) in slots.slots_mut() {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
    }

    /// Rebuilds every bucket from the root partitions. A main window lands
    /// in the bucket of each display it is showing on.
    pub fn update_display_group_window_tree(&mut self, tree: &WindowTree) {
        for buckets in self.buckets.values_mut() {
            buckets.iter_mut().for_each(Vec::clear);
        }
        for root in RootType::ALL {
            for &id in tree.root(root) {
                let node = &tree[id];
                let targets: Vec<DisplayId> = if node.showing_displays.is_empty() {
                    vec![node.display_id]
                } else {
                    node.showing_displays.iter().copied().collect()
                };
                for display_id in targets {
                    match self.buckets.get_mut(&display_id) {
                        Some(buckets) => buckets[root.index()].push(id),
                        None => error!(window = %node.id, display = %display_id, "display has no window tree"),
                    }
                }
            }
        }
    }

    /// Collapses every cross-display app window onto a single display: its
    /// own display for geometry changes, the default display otherwise.
    pub fn process_cross_nodes(
        &mut self,
        tree: &mut WindowTree,
        compositor: &mut dyn Compositor,
        change: DisplayStateChange,
    ) {
        let default_display = self.displays.default_display_id();
        let mut seen = HashSet::default();
        let cross: Vec<NodeId> = self
            .buckets
            .values()
            .flat_map(|b| b[RootType::App.index()].iter().copied())
            .filter(|id| tree.get(*id).is_some_and(|n| n.is_showing_on_multi_displays))
            .filter(|id| seen.insert(*id))
            .collect();
        for id in cross {
            let node = &tree[id];
            let target = match change {
                DisplayStateChange::SizeChange
                | DisplayStateChange::UpdateRotation
                | DisplayStateChange::DisplayCompress => node.display_id,
                _ => default_display,
            };
            debug!(window = %node.id, %target, "process cross node");
            let showing: Vec<DisplayId> = node.showing_displays.iter().copied().collect();
            for display_id in showing.into_iter().filter(|d| *d != target) {
                remove_from_compositor(tree, compositor, id, display_id);
            }
            Self::move_cross_node_to_target_display(tree, id, target);
        }
    }

    pub fn move_cross_node_to_target_display(tree: &mut WindowTree, id: NodeId, target: DisplayId) {
        let Some(node) = tree.get_mut(id) else { return };
        node.is_showing_on_multi_displays = false;
        node.showing_displays = BTreeSet::from([target]);
        if node.display_id != target {
            debug!(window = %node.id, from = %node.display_id, to = %target, "update display id");
            node.display_id = target;
        }
        for child in node.children().to_vec() {
            Self::move_cross_node_to_target_display(tree, child, target);
        }
    }

    /// Recomputes the set of displays whose X-span overlaps the window. A
    /// window entirely past the outermost display is kept on that display.
    pub fn update_window_showing_displays(&self, tree: &mut WindowTree, id: NodeId) {
        let rects = self.displays.all_display_rects();
        let Some(node) = tree.get_mut(id) else { return };
        let win = node.window_rect;
        let mut showing: BTreeSet<DisplayId> = rects
            .iter()
            .filter(|(_, rect)| win.overlap_x(rect) > 0)
            .map(|(display, _)| *display)
            .collect();
        if showing.is_empty() {
            let left = self.displays.left_display_id();
            let right = self.displays.right_display_id();
            if win.right() <= self.displays.display_rect(left).x {
                showing.insert(left);
            }
            if win.x >= self.displays.display_rect(right).right() {
                showing.insert(right);
            }
        }
        node.is_showing_on_multi_displays = showing.len() > 1;
        node.showing_displays = showing;
    }

    /// Gives a cross-display window to the display holding more than half
    /// of its width. Returns whether the display id changed.
    pub fn update_window_display_id_if_needed(&self, tree: &mut WindowTree, id: NodeId) -> bool {
        let Some(node) = tree.get(id) else { return false };
        if node.showing_displays.is_empty() {
            error!(window = %node.id, "window is not showing on any display");
            return false;
        }
        let win = node.window_rect;
        let mut new_display = node.display_id;
        if node.showing_displays.len() == 1 {
            if let Some(only) = node.showing_displays.first() {
                new_display = *only;
            }
        } else {
            let half = (win.width as f64 * 0.5) as i32;
            for (display_id, rect) in self.displays.all_display_rects() {
                if win.x < rect.x && win.right() > rect.right() {
                    new_display = display_id;
                    break;
                }
                let owns = if win.x >= rect.x {
                    rect.right() - win.x > half
                } else {
                    win.right() - rect.x >= half
                };
                if owns {
                    new_display = display_id;
                    break;
                }
            }
        }
        let node = &mut tree[id];
        if node.display_id == new_display {
            return false;
        }
        debug!(window = %node.id, from = %node.display_id, to = %new_display, "update display id");
        node.display_id = new_display;
        true
    }

    /// Moves a request rect from display-local to group coordinates.
    pub fn change_to_rect_in_display_group(&self, tree: &mut WindowTree, id: NodeId, display: DisplayId) {
        let display_rect = self.displays.display_rect(display);
        let node = &mut tree[id];
        node.request_rect = node.request_rect.translate(display_rect.x, display_rect.y);
        node.showing_displays = BTreeSet::from([node.display_id]);
    }

    pub fn pre_process_window_node(
        &self,
        tree: &mut WindowTree,
        id: NodeId,
        kind: NodeUpdateKind,
        is_multi_display: bool,
    ) {
        let Some(node) = tree.get_mut(id) else { return };
        if !is_multi_display {
            if kind == NodeUpdateKind::Added {
                node.showing_displays = BTreeSet::from([node.display_id]);
                for child in node.children().to_vec() {
                    self.pre_process_window_node(tree, child, kind, is_multi_display);
                }
            }
            return;
        }
        match kind {
            NodeUpdateKind::Added if !node.is_showing_on_multi_displays => {
                let display = node.display_id;
                self.change_to_rect_in_display_group(tree, id, display);
            }
            NodeUpdateKind::Active if node.size_change_reason == WindowSizeChangeReason::Move => {
                self.change_to_rect_in_display_group(tree, id, self.displays.default_display_id());
            }
            _ => {}
        }
        for child in tree[id].children().to_vec() {
            self.pre_process_window_node(tree, child, kind, is_multi_display);
        }
    }

    /// Refreshes showing displays and ownership after layout. Rebuilds the
    /// buckets when the owning display changed.
    pub fn post_process_window_node(&mut self, tree: &mut WindowTree, id: NodeId, is_multi_display: bool) {
        if !is_multi_display {
            return;
        }
        self.update_window_showing_displays(tree, id);
        if self.update_window_display_id_if_needed(tree, id) {
            self.update_display_group_window_tree(tree);
        }
    }

    pub fn move_not_cross_node_to_default_display(&self, tree: &mut WindowTree, id: NodeId, from: DisplayId) {
        let default_display = self.displays.default_display_id();
        let src = self.displays.display_rect(from);
        let dst = self.displays.display_rect(default_display);
        let Some(node) = tree.get_mut(id) else { return };
        let mut rect = node.request_rect;
        if node.window_type == WindowType::Pointer {
            rect.x = (dst.width / 2) as i32;
            rect.y = (dst.height / 2) as i32;
        } else {
            rect.x = rect.x - src.x + dst.x;
            rect.y = rect.y - src.y + dst.y;
        }
        debug!(window = %node.id, %from, ?rect, "move window to default display");
        node.request_rect = rect;
        node.showing_displays = BTreeSet::from([default_display]);
        node.display_id = default_display;
        for child in node.children().to_vec() {
            self.move_not_cross_node_to_default_display(tree, child, from);
        }
    }

    /// System bars owned by `display` alone. They are destroyed rather than
    /// moved when the display goes away.
    pub fn system_bars_on_display(&self, tree: &WindowTree, display: DisplayId) -> Vec<NodeId> {
        RootType::ALL
            .iter()
            .rev()
            .flat_map(|root| self.bucket(display, *root).iter().copied())
            .filter(|id| {
                tree.get(*id).is_some_and(|n| {
                    n.display_id == display
                        && !n.is_showing_on_multi_displays
                        && n.window_type.is_system_bar()
                })
            })
            .collect()
    }

    pub fn process_not_cross_nodes_on_destroyed_display(
        &self,
        tree: &mut WindowTree,
        compositor: &mut dyn Compositor,
        display_id: DisplayId,
    ) {
        let default_display = self.displays.default_display_id();
        if display_id == default_display {
            error!(display = %display_id, "cannot move windows off the default display");
            return;
        }
        if !self.buckets.contains_key(&display_id) {
            error!(display = %display_id, "display not in display group window tree");
            return;
        }
        info!(display = %display_id, "move windows off destroyed display");
        let nodes: Vec<NodeId> = RootType::ALL
            .iter()
            .rev()
            .flat_map(|root| self.bucket(display_id, *root).iter().copied())
            .collect();
        for id in nodes {
            let Some(node) = tree.get(id) else { continue };
            if node.display_id != display_id || node.is_showing_on_multi_displays {
                continue;
            }
            if node.window_type.is_system_bar() {
                warn!(window = %node.id, "system bar left on destroyed display");
                continue;
            }
            self.move_not_cross_node_to_default_display(tree, id, display_id);
            remove_from_compositor(tree, compositor, id, display_id);
            add_on_compositor(tree, compositor, id, default_display);
        }
    }

    pub fn process_display_create(
        &mut self,
        tree: &mut WindowTree,
        collab: &mut Collaborators,
        policy: &mut LayoutPolicyKind,
        info: DisplayInfo,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) {
        let display_id = info.id;
        info!(display = %display_id, default = %self.displays.default_display_id(), "display create");
        self.init_new_display(display_id);
        self.displays.add_display_info(info);
        self.process_cross_nodes(tree, &mut *collab.compositor, DisplayStateChange::Create);
        self.update_display_group_window_tree(tree);
        policy.process_display_create(&mut self.layout_ctx(tree, collab), display_id, display_rects);
        let divider = policy.divider_rect(display_id);
        self.set_divider_rect(display_id, divider);
    }

    /// System bars of the display must already have been destroyed.
    pub fn process_display_destroy(
        &mut self,
        tree: &mut WindowTree,
        collab: &mut Collaborators,
        policy: &mut LayoutPolicyKind,
        display_id: DisplayId,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) {
        info!(display = %display_id, "display destroy");
        self.process_not_cross_nodes_on_destroyed_display(tree, &mut *collab.compositor, display_id);
        self.process_cross_nodes(tree, &mut *collab.compositor, DisplayStateChange::Destroy);
        self.update_display_group_window_tree(tree);
        self.clear_map_of_destroyed_display(display_id);
        policy.process_display_destroy(&mut self.layout_ctx(tree, collab), display_id, display_rects);
    }

    pub fn process_display_change(
        &mut self,
        tree: &mut WindowTree,
        collab: &mut Collaborators,
        policy: &mut LayoutPolicyKind,
        info: &DisplayInfo,
        display_rects: &BTreeMap<DisplayId, Rect>,
        change: DisplayStateChange,
    ) {
        let display_id = info.id;
        info!(display = %display_id, ?change, "display change");
        match change {
            DisplayStateChange::UpdateRotation => {
                self.displays.set_rotation(display_id, info.rotation);
                self.process_display_size_change_or_rotation(tree, collab, policy, display_id, display_rects, change);
            }
            DisplayStateChange::DisplayCompress => {
                self.displays.set_waterfall_compressed(display_id, info.waterfall_compressed);
                self.process_display_size_change_or_rotation(tree, collab, policy, display_id, display_rects, change);
            }
            DisplayStateChange::SizeChange => {
                self.process_display_size_change_or_rotation(tree, collab, policy, display_id, display_rects, change);
            }
            DisplayStateChange::VirtualPixelRatioChange => {
                self.displays.set_virtual_pixel_ratio(display_id, info.virtual_pixel_ratio);
                policy.layout_window_tree(&mut self.layout_ctx(tree, collab), display_id);
            }
            DisplayStateChange::Create | DisplayStateChange::Destroy => {
                warn!(display = %display_id, ?change, "not a display change");
            }
        }
    }

    fn process_display_size_change_or_rotation(
        &mut self,
        tree: &mut WindowTree,
        collab: &mut Collaborators,
        policy: &mut LayoutPolicyKind,
        display: DisplayId,
        display_rects: &BTreeMap<DisplayId, Rect>,
        change: DisplayStateChange,
    ) {
        self.process_cross_nodes(tree, &mut *collab.compositor, change);
        self.update_display_group_window_tree(tree);
        // After cross nodes settle so display attribution is current.
        self.update_node_size_change_reason_with_rotation(tree, display);
        policy.process_display_size_change(&mut self.layout_ctx(tree, collab), display, display_rects);
        let divider = policy.divider_rect(display);
        if let Some(pair) = self.pairs.get_mut(&display) {
            pair.rotate_divider_window(divider);
        }
    }

    fn update_node_size_change_reason_with_rotation(&self, tree: &mut WindowTree, display: DisplayId) {
        for root in RootType::ALL.iter().rev() {
            for &id in self.bucket(display, *root) {
                let Some(node) = tree.get_mut(id) else { continue };
                if node.window_type != WindowType::DockSlice {
                    node.size_change_reason = WindowSizeChangeReason::Rotation;
                }
            }
        }
    }

    /// Reports bar rects that moved since the last report.
    pub fn notify_if_system_bar_region_changed(
        &mut self,
        tree: &WindowTree,
        events: &mut dyn WindowEventSink,
        display_id: DisplayId,
    ) {
        let Some(slots) = self.sys_bars.get_mut(&display_id) else { return };
        for (bar, slot, tint) in slots.slots_mut() {
            let Some(node) = slot.and_then(|id| tree.get(id)) else { continue };
            if tint.region == node.window_rect {
                continue;
            }
            tint.region = node.window_rect;
            debug!(display = %display_id, ?bar, region = ?tint.region, "system bar region");
            events.emit(WindowEvent::SystemBarTint {
                display: display_id,
                bar,
                region: tint.region,
                immersive: tint.immersive,
            });
        }
    }

    /// Reports bars whose immersive state changed since the last report.
    pub fn notify_if_system_bar_tint_changed(
        &mut self,
        tree: &WindowTree,
        events: &mut dyn WindowEventSink,
        display_id: DisplayId,
    ) {
        let immersive = self.expect_immersive(tree, display_id);
        let Some(slots) = self.sys_bars.get_mut(&display_id) else { return };
        for (bar, _, tint) in slots.slots_mut() {
            if tint.immersive == immersive {
                continue;
            }
            tint.immersive = immersive;
            debug!(display = %display_id, ?bar, immersive, "system bar tint");
            events.emit(WindowEvent::SystemBarTint { display: display_id, bar, region: tint.region, immersive });
        }
    }

    /// Whether the top-most window below the bars covers the whole display
    /// or is part of a split.
    fn expect_immersive(&self, tree: &WindowTree, display: DisplayId) -> bool {
        let bar_priority =
            WindowType::StatusBar.priority().max(WindowType::NavigationBar.priority());
        for root in RootType::ALL.iter().rev() {
            for &id in self.bucket(display, *root).iter().rev() {
                let Some(node) = tree.get(id) else { continue };
                if node.window_type.priority() > bar_priority {
                    continue;
                }
                if node.mode == WindowMode::Fullscreen && node.window_type != WindowType::Panel {
                    return true;
                }
                if WindowPair::is_split_related(node) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::container::testing::RecordingCompositor;
    use crate::model::tree::Parent;
    use crate::model::window_node::{WindowId, WindowNode};

    const D0: DisplayId = DisplayId(0);
    const D1: DisplayId = DisplayId(1);

    fn two_displays() -> DisplayGroupController {
        let mut group = DisplayGroupController::new(D0);
        for (id, rect) in [(D0, Rect::new(0, 0, 1000, 1000)), (D1, Rect::new(1000, 0, 1000, 1000))] {
            group.init_new_display(id);
            group.displays.add_display_info(DisplayInfo::new(id, rect));
        }
        group
    }

    fn attach(tree: &mut WindowTree, node: WindowNode, root: RootType) -> NodeId {
        let id = tree.insert(node);
        let len = tree.root(root).len();
        tree.attach(id, Parent::Root(root), len);
        id
    }

    fn app_at(id: u32, rect: Rect) -> WindowNode {
        let mut node = WindowNode::new(WindowId(id), WindowType::AppMain).with_mode(WindowMode::Floating);
        node.window_rect = rect;
        node.request_rect = rect;
        node.current_visibility = true;
        node
    }

    #[test]
    fn window_split_exactly_in_half_goes_to_the_right_display() {
        let group = two_displays();
        let mut tree = WindowTree::new();
        let id = attach(&mut tree, app_at(1, Rect::new(900, 0, 200, 1000)), RootType::App);

        group.update_window_showing_displays(&mut tree, id);
        assert_eq!(tree[id].showing_displays, BTreeSet::from([D0, D1]));
        assert!(tree[id].is_showing_on_multi_displays);

        assert!(group.update_window_display_id_if_needed(&mut tree, id));
        assert_eq!(tree[id].display_id, D1);
    }

    #[test]
    fn one_more_pixel_on_the_left_keeps_the_left_display() {
        let group = two_displays();
        let mut tree = WindowTree::new();
        let mut node = app_at(1, Rect::new(899, 0, 200, 1000));
        node.display_id = D1;
        let id = attach(&mut tree, node, RootType::App);
        group.update_window_showing_displays(&mut tree, id);

        assert!(group.update_window_display_id_if_needed(&mut tree, id));
        assert_eq!(tree[id].display_id, D0);

        tree[id].window_rect = Rect::new(901, 0, 200, 1000);
        group.update_window_showing_displays(&mut tree, id);
        assert!(group.update_window_display_id_if_needed(&mut tree, id));
        assert_eq!(tree[id].display_id, D1);
    }

    #[test]
    fn window_mostly_on_default_display_stays() {
        let group = two_displays();
        let mut tree = WindowTree::new();
        let id = attach(&mut tree, app_at(1, Rect::new(700, 0, 400, 1000)), RootType::App);
        group.update_window_showing_displays(&mut tree, id);
        assert!(!group.update_window_display_id_if_needed(&mut tree, id));
        assert_eq!(tree[id].display_id, D0);
    }

    #[test]
    fn window_off_the_right_edge_shows_on_rightmost_display() {
        let group = two_displays();
        let mut tree = WindowTree::new();
        let id = attach(&mut tree, app_at(1, Rect::new(2100, 0, 100, 100)), RootType::App);
        group.update_window_showing_displays(&mut tree, id);
        assert_eq!(tree[id].showing_displays, BTreeSet::from([D1]));
        assert!(!tree[id].is_showing_on_multi_displays);
    }

    #[test]
    fn buckets_list_cross_windows_on_every_showing_display() {
        let mut group = two_displays();
        let mut tree = WindowTree::new();
        let cross = attach(&mut tree, app_at(1, Rect::new(900, 0, 200, 1000)), RootType::App);
        let local = attach(&mut tree, app_at(2, Rect::new(10, 10, 100, 100)), RootType::App);
        group.update_window_showing_displays(&mut tree, cross);
        group.update_window_showing_displays(&mut tree, local);
        group.update_display_group_window_tree(&tree);

        assert_eq!(group.bucket(D0, RootType::App), &[cross, local]);
        assert_eq!(group.bucket(D1, RootType::App), &[cross]);
    }

    #[test]
    fn cross_nodes_collapse_to_default_display_on_create() {
        let mut group = two_displays();
        let mut tree = WindowTree::new();
        let mut node = app_at(1, Rect::new(900, 0, 200, 1000));
        node.display_id = D1;
        let cross = attach(&mut tree, node, RootType::App);
        group.update_window_showing_displays(&mut tree, cross);
        group.update_display_group_window_tree(&tree);

        let mut compositor = RecordingCompositor::default();
        group.process_cross_nodes(&mut tree, &mut compositor, DisplayStateChange::Create);

        assert_eq!(tree[cross].display_id, D0);
        assert_eq!(tree[cross].showing_displays, BTreeSet::from([D0]));
        assert_eq!(compositor.log().removed, vec![(WindowId(1), D1)]);
    }

    #[test]
    fn pointer_is_centred_on_default_display() {
        let group = two_displays();
        let mut tree = WindowTree::new();
        let mut pointer = WindowNode::new(WindowId(3), WindowType::Pointer).with_display(D1);
        pointer.request_rect = Rect::new(1500, 300, 10, 10);
        let id = attach(&mut tree, pointer, RootType::Above);
        let mut toast = WindowNode::new(WindowId(4), WindowType::Toast).with_display(D1);
        toast.request_rect = Rect::new(1100, 50, 200, 50);
        let toast = attach(&mut tree, toast, RootType::Above);

        group.move_not_cross_node_to_default_display(&mut tree, id, D1);
        group.move_not_cross_node_to_default_display(&mut tree, toast, D1);

        assert_eq!(tree[id].request_rect, Rect::new(500, 500, 10, 10));
        assert_eq!(tree[toast].request_rect, Rect::new(100, 50, 200, 50));
        assert_eq!(tree[toast].display_id, D0);
    }

    #[test]
    fn default_display_is_never_evacuated() {
        let mut group = two_displays();
        let mut tree = WindowTree::new();
        let id = attach(&mut tree, app_at(1, Rect::new(10, 10, 100, 100)), RootType::App);
        group.update_display_group_window_tree(&tree);
        let mut compositor = RecordingCompositor::default();
        group.process_not_cross_nodes_on_destroyed_display(&mut tree, &mut compositor, D0);
        assert_eq!(tree[id].display_id, D0);
        assert!(compositor.log().removed.is_empty());
    }

    #[test]
    fn bar_region_is_reported_once_per_change() {
        let mut group = two_displays();
        let mut tree = WindowTree::new();
        let mut bar = WindowNode::new(WindowId(9), WindowType::StatusBar);
        bar.window_rect = Rect::new(0, 0, 1000, 40);
        let bar = attach(&mut tree, bar, RootType::Above);
        group.register_system_bar(D0, WindowType::StatusBar, bar);

        let mut events = Vec::new();
        group.notify_if_system_bar_region_changed(&tree, &mut events, D0);
        group.notify_if_system_bar_region_changed(&tree, &mut events, D0);
        assert_eq!(events.len(), 1);
        assert_eq!(
            group.system_bars(D0).and_then(|s| s.tint(WindowType::StatusBar)).map(|t| t.region),
            Some(Rect::new(0, 0, 1000, 40))
        );
    }

    #[test]
    fn fullscreen_top_window_makes_bars_immersive() {
        let mut group = two_displays();
        let mut tree = WindowTree::new();
        let mut app = app_at(1, Rect::new(0, 0, 1000, 1000));
        app.mode = WindowMode::Fullscreen;
        attach(&mut tree, app, RootType::App);
        group.update_display_group_window_tree(&tree);

        let mut events = Vec::new();
        group.notify_if_system_bar_tint_changed(&tree, &mut events, D0);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, WindowEvent::SystemBarTint { immersive: true, .. })));
        group.notify_if_system_bar_tint_changed(&tree, &mut events, D0);
        assert_eq!(events.len(), 2);
    }
}

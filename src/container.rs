//! The window-node container of one display group.
//!
//! [`WindowNodeContainer`] owns the window arena, the display-group
//! controller and both layout policies. Every lifecycle request (add,
//! update, remove, destroy) goes through it so the tree, the per-display
//! buckets, the split pairs and the compositor stay consistent with each
//! other. Outbound intents leave through [`Collaborators`].

pub mod collaborators;
pub mod display_group;
pub mod error;
mod focus;
mod minimize;
pub mod replay;
mod split;
mod zorder;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use tracing::{debug, error, info, instrument, warn};

pub use collaborators::Collaborators;
use collaborators::{AvoidChange, Compositor, WindowEvent};
pub use display_group::DisplayGroupController;
use display_group::NodeUpdateKind;
pub use error::{WmError, WmResult};
pub use minimize::WindowStateBackup;
pub use split::ModeChangeHotZoneRects;
pub use zorder::TraversalOrder;

use crate::common::collections::{BTreeMap, BTreeSet, HashSet};
use crate::common::config::Config;
use crate::layout_engine::{LayoutContext, LayoutMode, LayoutPolicy, LayoutPolicyKind};
use crate::model::tree::{NodeId, Parent, RootType, WindowTree};
use crate::model::window_node::{
    WindowFlags, WindowId, WindowMode, WindowNode, WindowSizeChangeReason, WindowType,
    WindowUpdateReason,
};
use crate::model::window_pair::{PairContext, WindowPair};
use crate::sys::display::{DisplayId, DisplayInfo, DisplayStateChange};
use crate::sys::geometry::Rect;

/// Asks the compositor to show `id` and its visible children on `display`.
/// Component windows have no surface of their own.
pub(crate) fn add_on_compositor(
    tree: &WindowTree,
    compositor: &mut dyn Compositor,
    id: NodeId,
    display: DisplayId,
) {
    let Some(node) = tree.get(id) else { return };
    if node.window_type == WindowType::AppComponent || !node.current_visibility {
        return;
    }
    compositor.add_surface(node.id, display);
    for &child in node.children() {
        if tree.get(child).is_some_and(|c| c.current_visibility) {
            add_on_compositor(tree, compositor, child, display);
        }
    }
}

pub(crate) fn remove_from_compositor(
    tree: &WindowTree,
    compositor: &mut dyn Compositor,
    id: NodeId,
    display: DisplayId,
) {
    let Some(node) = tree.get(id) else { return };
    if node.window_type == WindowType::AppComponent {
        return;
    }
    compositor.remove_surface(node.id, display);
    for &child in node.children() {
        if tree.get(child).is_some_and(|c| c.current_visibility) {
            remove_from_compositor(tree, compositor, child, display);
        }
    }
}

/// Root partition a parent-less window of `ty` is attached under.
fn root_for_type(ty: WindowType) -> Option<RootType> {
    if ty.is_app_window()
        || matches!(
            ty,
            WindowType::DockSlice | WindowType::Placeholder | WindowType::Dialog
        )
    {
        Some(RootType::App)
    } else if ty.is_below_system_window() {
        Some(RootType::Below)
    } else if ty.is_above_system_window() {
        Some(RootType::Above)
    } else {
        None
    }
}

pub struct WindowNodeContainer {
    config: Config,
    tree: WindowTree,
    group: DisplayGroupController,
    policies: [LayoutPolicyKind; 2],
    layout_mode: LayoutMode,
    collab: Collaborators,
    focused_window: Option<WindowId>,
    active_window: Option<WindowId>,
    display_brightness: Option<f32>,
    brightness_window: Option<WindowId>,
    is_screen_locked: bool,
    backup: WindowStateBackup,
    /// Windows whose split-primary support was withdrawn while they were
    /// raised above the keyguard.
    split_support_stripped: HashSet<NodeId>,
    max_z_order: u32,
    record: replay::Record,
}

impl WindowNodeContainer {
    pub fn new(config: Config, display_info: DisplayInfo, collab: Collaborators) -> Self {
        let display_id = display_info.id;
        let mut group = DisplayGroupController::new(display_id);
        group.init_new_display(display_id);
        group.displays.add_display_info(display_info);
        let policies = LayoutMode::ALL.map(|mode| LayoutPolicyKind::new(mode, &config, &group.displays));
        let default_mode = config.layout.default_mode;
        let mut container = WindowNodeContainer {
            config,
            tree: WindowTree::new(),
            group,
            policies,
            layout_mode: LayoutMode::Cascade,
            collab,
            focused_window: None,
            active_window: None,
            display_brightness: None,
            brightness_window: None,
            is_screen_locked: false,
            backup: WindowStateBackup::default(),
            split_support_stripped: HashSet::default(),
            max_z_order: 0,
            record: replay::Record::default(),
        };
        container.with_policy(|policy, ctx| policy.launch(ctx));
        let divider = container.policy().divider_rect(display_id);
        container.group.set_divider_rect(display_id, divider);
        if default_mode != LayoutMode::Cascade {
            if let Err(err) = container.switch_layout_policy(default_mode, display_id, false) {
                warn!(?err, "could not apply default layout mode");
            }
        }
        info!(display = %display_id, mode = ?container.layout_mode, "window node container created");
        container
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn tree(&self) -> &WindowTree { &self.tree }

    pub fn group(&self) -> &DisplayGroupController { &self.group }

    pub fn layout_mode(&self) -> LayoutMode { self.layout_mode }

    pub fn policy(&self) -> &LayoutPolicyKind { &self.policies[self.layout_mode.index()] }

    pub fn focused_window(&self) -> Option<WindowId> { self.focused_window }

    pub fn active_window(&self) -> Option<WindowId> { self.active_window }

    pub fn brightness_window(&self) -> Option<WindowId> { self.brightness_window }

    pub fn is_screen_locked(&self) -> bool { self.is_screen_locked }

    pub fn max_z_order(&self) -> u32 { self.max_z_order }

    pub fn window_pair(&self, display: DisplayId) -> Option<&WindowPair> {
        self.group.window_pair(display)
    }

    pub fn node(&self, window: WindowId) -> Option<&WindowNode> {
        self.tree.find(window).and_then(|id| self.tree.get(id))
    }

    pub fn is_vertical_display(&self, display: DisplayId) -> bool {
        self.group.displays().display_info(display).is_some_and(DisplayInfo::is_vertical)
    }

    pub fn dump_tree(&self) -> String { self.tree.draw_tree() }

    /// Hands a window to the container without attaching it anywhere.
    pub fn register_window(&mut self, node: WindowNode) -> NodeId {
        debug!(window = %node.id, ty = %node.window_type, "register window");
        self.tree.insert(node)
    }

    fn lookup(&self, window: WindowId) -> WmResult<NodeId> {
        self.tree.find(window).ok_or(WmError::WindowNotFound(window))
    }

    fn with_policy<R>(&mut self, f: impl FnOnce(&mut LayoutPolicyKind, &mut LayoutContext<'_>) -> R) -> R {
        let Self { tree, group, policies, layout_mode, collab, .. } = self;
        let policy = &mut policies[layout_mode.index()];
        let mut ctx = group.layout_ctx(tree, collab);
        f(policy, &mut ctx)
    }

    fn with_pair<R>(
        &mut self,
        display: DisplayId,
        f: impl FnOnce(&mut WindowPair, &mut PairContext<'_>) -> R,
    ) -> WmResult<R> {
        let Self { tree, group, collab, .. } = self;
        let pair = group.window_pair_mut(display).ok_or(WmError::DisplayNotFound(display))?;
        let mut ctx = PairContext {
            tree,
            minimize: &mut *collab.minimize,
            events: &mut *collab.events,
            client: &mut *collab.client,
        };
        Ok(f(pair, &mut ctx))
    }

    fn is_multi_display(&self) -> bool { self.policy().base().is_multi_display() }

    #[instrument(skip(self))]
    pub fn add_window_node(&mut self, window: WindowId, parent: Option<WindowId>) -> WmResult<()> {
        let id = self.lookup(window)?;
        let parent = self.add_window_node_on_window_tree(id, parent)?;
        self.update_window_tree(id, parent);
        self.group.update_display_group_window_tree(&self.tree);
        let multi = self.is_multi_display();
        self.group.pre_process_window_node(&mut self.tree, id, NodeUpdateKind::Added, multi);

        let showing: Vec<DisplayId> = self.tree[id].showing_displays.iter().copied().collect();
        for display in showing {
            add_on_compositor(&self.tree, &mut *self.collab.compositor, id, display);
        }

        let display_id = self.tree[id].display_id;
        self.with_pair(display_id, |pair, ctx| pair.update_if_split_related(ctx, id))?;
        if self.tree[id].is_split_mode() {
            self.raise_split_related_window_to_top(id);
        }
        self.assign_z_order();
        self.with_policy(|policy, ctx| policy.add_window_node(ctx, id));
        self.notify_if_avoid_area_changed(id, AvoidChange::Added);

        let ty = self.tree[id].window_type;
        if ty.is_main_window() {
            self.backup.window_ids.clear();
        }
        if ty == WindowType::Keyguard {
            self.is_screen_locked = true;
            self.collab.events.emit(WindowEvent::ScreenLocked { locked: true });
        }
        debug!(%window, "window added");
        Ok(())
    }

    /// Validates the placement of `id` and prepares its visibility. Returns
    /// the parent it is to be inserted under.
    fn add_window_node_on_window_tree(&mut self, id: NodeId, parent: Option<WindowId>) -> WmResult<Parent> {
        let node = &self.tree[id];
        let (window, ty, display_id) = (node.id, node.window_type, node.display_id);
        if !self.group.displays().contains(display_id) {
            return Err(WmError::DisplayNotFound(display_id));
        }
        if self.tree.is_attached(id) {
            return Err(WmError::InvalidOperation(format!("{window} is already in the window tree")));
        }
        let root = root_for_type(ty);
        if root.is_none() && !(ty.is_system_sub_window() && parent.is_some()) {
            error!(%window, %ty, "no root for window type");
            return Err(WmError::InvalidType(ty));
        }

        let Some(parent_window) = parent else {
            let root = root.ok_or(WmError::InvalidType(ty))?;
            let node = &mut self.tree[id];
            node.requested_visibility = true;
            node.current_visibility = true;
            for child in self.tree[id].children().to_vec() {
                let child = &mut self.tree[child];
                child.current_visibility = child.requested_visibility;
            }
            if ty.is_system_bar() {
                self.group.register_system_bar(display_id, ty, id);
            }
            return Ok(Parent::Root(root));
        };

        let parent_id = self.tree.find(parent_window).ok_or(WmError::InvalidParent(parent_window))?;
        if !self.tree.is_attached(parent_id) {
            return Err(WmError::InvalidParent(parent_window));
        }
        let parent_node = &self.tree[parent_id];
        if ty.requires_system_parent() {
            if parent_node.window_type.is_sub_like() {
                return Err(WmError::InvalidParam(format!(
                    "{ty} cannot be parented on {}",
                    parent_node.window_type
                )));
            }
        } else {
            let on_root = root.is_some_and(|root| parent_node.parent() == Some(Parent::Root(root)));
            let locked_above = parent_node.flags.contains(WindowFlags::SHOW_WHEN_LOCKED)
                && parent_node.parent() == Some(Parent::Root(RootType::Above));
            if !on_root && !locked_above {
                return Err(WmError::InvalidParam(format!(
                    "{window} cannot be parented on {parent_window}"
                )));
            }
        }
        let visible = parent_node.current_visibility;
        let node = &mut self.tree[id];
        node.requested_visibility = true;
        node.current_visibility = visible;
        Ok(Parent::Window(parent_id))
    }

    #[instrument(skip(self))]
    pub fn update_window_node(&mut self, window: WindowId, reason: WindowUpdateReason) -> WmResult<()> {
        let id = self.lookup(window)?;
        self.update_window_node_inner(id, reason)
    }

    fn update_window_node_inner(&mut self, id: NodeId, reason: WindowUpdateReason) -> WmResult<()> {
        if !self.tree.is_attached(id) {
            return Err(WmError::InvalidOperation(format!("{} is not in the window tree", self.tree[id].id)));
        }
        let last_showing = self.tree[id].showing_displays.clone();
        let multi = self.is_multi_display();
        self.group.pre_process_window_node(&mut self.tree, id, NodeUpdateKind::Active, multi);

        let node = &self.tree[id];
        if node.window_type.is_main_window()
            && reason.needs_cascade_switch()
            && self.layout_mode == LayoutMode::Tile
        {
            let display = node.display_id;
            self.switch_layout_policy(LayoutMode::Cascade, display, false)?;
        }

        self.with_policy(|policy, ctx| policy.update_window_node(ctx, id, false));
        let multi = self.is_multi_display();
        self.group.post_process_window_node(&mut self.tree, id, multi);
        if multi {
            self.update_compositor_for_showing_displays(id, &last_showing);
        }
        self.notify_if_avoid_area_changed(id, AvoidChange::Updated);
        Ok(())
    }

    /// Adds the window on displays it started showing on and removes it from
    /// the ones it left.
    fn update_compositor_for_showing_displays(&mut self, id: NodeId, last_showing: &BTreeSet<DisplayId>) {
        let current = self.tree[id].showing_displays.clone();
        for display in last_showing.difference(&current) {
            remove_from_compositor(&self.tree, &mut *self.collab.compositor, id, *display);
        }
        for display in current.difference(last_showing) {
            add_on_compositor(&self.tree, &mut *self.collab.compositor, id, *display);
        }
    }

    #[instrument(skip(self))]
    pub fn remove_window_node(&mut self, window: WindowId) -> WmResult<()> {
        let id = self.lookup(window)?;
        self.remove_window_node_inner(id)
    }

    fn remove_window_node_inner(&mut self, id: NodeId) -> WmResult<()> {
        if self.tree.detach(id).is_none() {
            warn!(window = %self.tree[id].id, "removing window that is not attached");
            return Err(WmError::DoNothing);
        }
        let node = &mut self.tree[id];
        node.requested_visibility = false;
        node.current_visibility = false;
        let showing: Vec<DisplayId> = node.showing_displays.iter().copied().collect();
        for display in showing {
            remove_from_compositor(&self.tree, &mut *self.collab.compositor, id, display);
        }
        self.group.unregister_system_bar(id);
        self.group.update_display_group_window_tree(&self.tree);
        self.with_policy(|policy, ctx| policy.remove_window_node(ctx, id));

        let node = &self.tree[id];
        let (last_mode, ty) = (node.mode, node.window_type);
        self.handle_remove_window(id)?;
        if !last_mode.is_floating() {
            self.notify_dock_window_state_changed(id, true);
        }
        self.notify_if_avoid_area_changed(id, AvoidChange::Removed);

        if ty == WindowType::Keyguard {
            self.is_screen_locked = false;
            self.collab.events.emit(WindowEvent::ScreenLocked { locked: false });
            self.re_z_order_show_when_locked_windows(false);
            self.assign_z_order();
        }
        debug!(window = %self.tree[id].id, "window removed");
        Ok(())
    }

    fn handle_remove_window(&mut self, id: NodeId) -> WmResult<()> {
        let node = &self.tree[id];
        let (display, ty) = (node.display_id, node.window_type);
        if !self.group.displays().contains(display) {
            return Ok(());
        }
        self.with_pair(display, |pair, ctx| pair.handle_remove_window(ctx, id))?;
        let divider = self.group.window_pair(display).and_then(WindowPair::divider);
        if let Some(divider) = divider.filter(|_| ty.is_system_bar()) {
            self.update_window_node_inner(divider, WindowUpdateReason::Rect)?;
        }
        Ok(())
    }

    /// Removes the window if it is attached and frees it together with its
    /// sub-windows. Returns the freed window ids, the window itself first.
    #[instrument(skip(self))]
    pub fn destroy_window_node(&mut self, window: WindowId) -> WmResult<Vec<WindowId>> {
        let id = self.lookup(window)?;
        self.destroy_window_node_inner(id)
    }

    fn destroy_window_node_inner(&mut self, id: NodeId) -> WmResult<Vec<WindowId>> {
        if self.tree.is_attached(id) {
            self.remove_window_node_inner(id)?;
        }
        let mut freed = Vec::new();
        for node in self.tree.subtree(id) {
            self.split_support_stripped.remove(&node);
            if let Some(node) = self.tree.remove(node) {
                freed.push(node.id);
            }
        }
        Ok(freed)
    }

    /// Destroys every attached window, top partition first.
    pub fn destroy(&mut self) -> Vec<WindowId> {
        let mut freed = Vec::new();
        for root in RootType::ALL.iter().rev() {
            for id in self.tree.root(*root).to_vec() {
                match self.destroy_window_node_inner(id) {
                    Ok(ids) => freed.extend(ids),
                    Err(err) => error!(?err, "destroying window failed"),
                }
            }
        }
        freed
    }

    /// Applies `reason` to the rect last sent to the client. For the
    /// divider, every split window on the app root is resent.
    pub fn update_size_change_reason(&mut self, window: WindowId, reason: WindowSizeChangeReason) -> WmResult<()> {
        let id = self.lookup(window)?;
        let targets = if self.tree[id].window_type == WindowType::DockSlice {
            self.tree
                .root(RootType::App)
                .iter()
                .copied()
                .filter(|child| self.tree[*child].is_split_mode())
                .collect()
        } else {
            vec![id]
        };
        for target in targets {
            let node = &mut self.tree[target];
            node.size_change_reason = reason;
            self.collab.client.update_window_rect(node.id, node.window_rect, node.deco_applied, reason);
            node.reset_size_change_reason();
        }
        Ok(())
    }

    /// Reports avoid-area changes for bars and refreshes the bar tint for
    /// every other window.
    fn notify_if_avoid_area_changed(&mut self, id: NodeId, change: AvoidChange) {
        let node = &self.tree[id];
        let (window, ty, display) = (node.id, node.window_type, node.display_id);
        if ty.is_avoid_type() {
            self.collab.events.emit(WindowEvent::AvoidAreaChanged { window, display, change });
            self.group.notify_if_system_bar_region_changed(&self.tree, &mut *self.collab.events, display);
        } else {
            self.group.notify_if_system_bar_tint_changed(&self.tree, &mut *self.collab.events, display);
        }
    }

    /// Reports the dock. Enabling only happens once every other app window
    /// is floating.
    fn notify_dock_window_state_changed(&mut self, id: NodeId, enabled: bool) {
        if enabled {
            let all_floating = self
                .tree
                .root(RootType::App)
                .iter()
                .filter(|child| **child != id)
                .all(|child| self.tree[*child].mode.is_floating());
            if !all_floating {
                return;
            }
        }
        debug!(enabled, "dock state changed");
        self.collab.events.emit(WindowEvent::DockStateChanged { enabled });
    }

    #[instrument(skip(self, display))]
    pub fn switch_layout_policy(&mut self, mode: LayoutMode, display: DisplayId, reorder: bool) -> WmResult<()> {
        if self.group.window_pair(display).is_none() {
            return Err(WmError::DisplayNotFound(display));
        }
        if self.layout_mode != mode {
            if self.layout_mode == LayoutMode::Cascade {
                self.with_policy(|policy, ctx| policy.reset(ctx));
                self.with_pair(display, |pair, ctx| pair.clear(ctx))?;
            }
            self.policies[self.layout_mode.index()].clean();
            info!(from = ?self.layout_mode, to = ?mode, "switch layout policy");
            self.layout_mode = mode;
            self.with_policy(|policy, ctx| policy.launch(ctx));
        }
        if reorder {
            self.with_pair(display, |pair, ctx| pair.clear(ctx))?;
            self.with_policy(|policy, ctx| policy.reorder(ctx));
        }
        self.group.notify_if_system_bar_tint_changed(&self.tree, &mut *self.collab.events, display);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn set_window_mode(&mut self, window: WindowId, mode: WindowMode) -> WmResult<()> {
        let id = self.lookup(window)?;
        let node = &self.tree[id];
        let src = node.mode;
        if src == mode {
            return Ok(());
        }
        if mode.is_split() && self.is_screen_locked && node.flags.contains(WindowFlags::SHOW_WHEN_LOCKED) {
            return Err(WmError::InvalidParam(format!("{window} cannot split while the screen is locked")));
        }

        let node = &mut self.tree[id];
        if src == WindowMode::Fullscreen && mode == WindowMode::Floating {
            node.size_change_reason = WindowSizeChangeReason::Recover;
        } else if mode == WindowMode::Fullscreen {
            node.size_change_reason = WindowSizeChangeReason::Maximize;
            if src == WindowMode::Floating {
                node.request_rect = node.window_rect;
            }
        } else {
            node.size_change_reason = WindowSizeChangeReason::Resize;
        }
        node.set_mode(mode);
        let (display, ty) = (node.display_id, node.window_type);

        self.with_pair(display, |pair, ctx| pair.update_if_split_related(ctx, id))?;
        if ty.is_main_window() {
            self.notify_dock_window_state_changed(id, mode.is_floating());
        }
        if mode == WindowMode::Fullscreen && ty.is_app_window() {
            self.minimize_structured_app_windows_except_self(window);
        }
        let mode = self.tree[id].mode;
        self.collab.client.update_window_mode(window, mode);
        if self.tree.is_attached(id) {
            self.update_window_node_inner(id, WindowUpdateReason::Mode)?;
        }
        Ok(())
    }

    pub fn set_split_ratio(&mut self, display: DisplayId, ratio: f32) -> WmResult<()> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(WmError::InvalidParam(format!("split ratio {ratio} out of range")));
        }
        let pair = self.group.window_pair_mut(display).ok_or(WmError::DisplayNotFound(display))?;
        pair.set_split_ratio(ratio);
        Ok(())
    }

    pub fn process_display_create(
        &mut self,
        info: DisplayInfo,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) -> WmResult<()> {
        let display = info.id;
        if self.group.displays().contains(display) {
            return Err(WmError::InvalidOperation(format!("{display} already exists")));
        }
        let Self { tree, group, policies, layout_mode, collab, .. } = self;
        group.process_display_create(tree, collab, &mut policies[layout_mode.index()], info, display_rects);
        self.group.notify_if_system_bar_tint_changed(&self.tree, &mut *self.collab.events, display);
        Ok(())
    }

    /// Destroys the display's own system bars, moves its other windows to
    /// the default display and drops its bookkeeping. Returns the ids of
    /// the destroyed bars.
    pub fn process_display_destroy(
        &mut self,
        display: DisplayId,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) -> WmResult<Vec<WindowId>> {
        if !self.group.displays().contains(display) {
            return Err(WmError::DisplayNotFound(display));
        }
        if display == self.group.default_display_id() {
            return Err(WmError::InvalidOperation(format!("cannot destroy default {display}")));
        }
        let mut destroyed = Vec::new();
        for bar in self.group.system_bars_on_display(&self.tree, display) {
            destroyed.extend(self.destroy_window_node_inner(bar)?);
        }
        let Self { tree, group, policies, layout_mode, collab, .. } = self;
        group.process_display_destroy(tree, collab, &mut policies[layout_mode.index()], display, display_rects);
        let default_display = self.group.default_display_id();
        self.group.notify_if_system_bar_tint_changed(&self.tree, &mut *self.collab.events, default_display);
        Ok(destroyed)
    }

    pub fn process_display_change(
        &mut self,
        info: &DisplayInfo,
        display_rects: &BTreeMap<DisplayId, Rect>,
        change: DisplayStateChange,
    ) -> WmResult<()> {
        if !self.group.displays().contains(info.id) {
            return Err(WmError::DisplayNotFound(info.id));
        }
        if matches!(change, DisplayStateChange::Create | DisplayStateChange::Destroy) {
            return Err(WmError::InvalidParam(format!("{change:?} is not a display change")));
        }
        let Self { tree, group, policies, layout_mode, collab, .. } = self;
        group.process_display_change(tree, collab, &mut policies[layout_mode.index()], info, display_rects, change);
        self.group.notify_if_system_bar_tint_changed(&self.tree, &mut *self.collab.events, info.id);
        Ok(())
    }
}

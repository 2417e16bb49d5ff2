//! Stacking order of the window tree.
//!
//! Siblings are kept sorted by priority. The flattened bottom-to-top order
//! puts a window's negative-priority children below it and the rest above;
//! the top-to-bottom order is its exact reverse.

use tracing::{debug, error, instrument};

use super::{WindowNodeContainer, WmError, WmResult};
use crate::model::tree::{NodeId, Parent, RootType};
use crate::model::window_node::{ModeSupport, SurfaceKind, WindowFlags, WindowId, WindowNode, WindowType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    BottomToTop,
    TopToBottom,
}

impl WindowNodeContainer {
    /// Every attached window in stacking order.
    pub(crate) fn ordered_nodes(&self, order: TraversalOrder) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.tree.len());
        for root in RootType::ALL {
            for &id in self.tree.root(root) {
                self.push_bottom_up(id, &mut out);
            }
        }
        if order == TraversalOrder::TopToBottom {
            out.reverse();
        }
        out
    }

    fn push_bottom_up(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.tree.get(id) else { return };
        let children = node.children();
        for &child in children.iter().filter(|c| self.tree[**c].priority < 0) {
            self.push_bottom_up(child, out);
        }
        out.push(id);
        for &child in children.iter().filter(|c| self.tree[**c].priority >= 0) {
            self.push_bottom_up(child, out);
        }
    }

    /// Visits windows in `order` until `f` returns `true`.
    pub fn traverse_window_tree(&self, order: TraversalOrder, mut f: impl FnMut(NodeId, &WindowNode) -> bool) {
        for id in self.ordered_nodes(order) {
            if f(id, &self.tree[id]) {
                break;
            }
        }
    }

    /// Window ids from the bottom of the stack to the top.
    pub fn z_ordered_windows(&self) -> Vec<WindowId> {
        self.ordered_nodes(TraversalOrder::BottomToTop).into_iter().map(|id| self.tree[id].id).collect()
    }

    /// Numbers every surface bottom-up starting at 1 and pushes the values
    /// to the compositor.
    pub(crate) fn assign_z_order(&mut self) {
        let mut z = 0u32;
        for id in self.ordered_nodes(TraversalOrder::BottomToTop) {
            let node = &mut self.tree[id];
            if node.surfaces.is_empty() {
                z += 1;
                error!(window = %node.id, "window has no surface");
                continue;
            }
            for surface in node.surfaces.ordered() {
                z += 1;
                self.collab.compositor.set_z_order(node.id, surface, z);
                if surface == SurfaceKind::Main {
                    node.z_order = z;
                }
            }
        }
        self.max_z_order = z;
        self.group.update_display_group_window_tree(&self.tree);
    }

    /// Computes the priority of `id` and inserts it among `parent`'s
    /// children. Windows shown above the keyguard are moved to the above
    /// partition.
    pub(crate) fn update_window_tree(&mut self, id: NodeId, mut parent: Parent) {
        let keyguard = WindowType::Keyguard.priority();
        let node = &mut self.tree[id];
        let ty = node.window_type;
        node.priority = ty.priority();
        if ty == WindowType::InputMethodFloat && self.is_screen_locked {
            node.priority = keyguard + 2;
        }
        if ty == WindowType::Keyguard {
            self.re_z_order_show_when_locked_windows(true);
        } else if ty.is_main_window()
            && node.flags.contains(WindowFlags::SHOW_WHEN_LOCKED)
            && self.is_screen_locked
        {
            node.priority = keyguard + 1;
            parent = Parent::Root(RootType::Above);
            if node.is_split_mode() {
                node.resume_last_mode();
                self.collab.client.update_window_mode(node.id, node.mode);
            }
        }

        if self.tree.children_of(parent).contains(&id) {
            return;
        }
        let position = self.sorted_position(id, parent);
        self.tree.attach(id, parent, position);
    }

    /// Insert position keeping siblings sorted by priority. A divider lands
    /// right after the second split window it meets.
    fn sorted_position(&self, id: NodeId, parent: Parent) -> usize {
        let node = &self.tree[id];
        let children = self.tree.children_of(parent);
        let mut split_count = 0;
        for (index, &child) in children.iter().enumerate() {
            if node.window_type == WindowType::DockSlice && split_count == 2 {
                return index;
            }
            let child = &self.tree[child];
            if child.is_split_mode() {
                split_count += 1;
            }
            if child.priority > node.priority {
                return index;
            }
        }
        children.len()
    }

    /// Moves every show-when-locked main window between the app and above
    /// partitions.
    pub(crate) fn re_z_order_show_when_locked_windows(&mut self, up: bool) {
        let (src, dst) = if up { (RootType::App, RootType::Above) } else { (RootType::Above, RootType::App) };
        let priority = if up {
            WindowType::Keyguard.priority() + 1
        } else {
            WindowType::AppMain.priority()
        };
        let moving: Vec<NodeId> = self
            .tree
            .root(src)
            .iter()
            .copied()
            .filter(|id| {
                let node = &self.tree[*id];
                node.flags.contains(WindowFlags::SHOW_WHEN_LOCKED) && node.window_type.is_main_window()
            })
            .collect();
        for &id in &moving {
            self.tree.detach(id);
        }
        for id in moving {
            self.tree[id].priority = priority;
            let position = self
                .tree
                .root(dst)
                .iter()
                .position(|c| self.tree[*c].priority > priority)
                .unwrap_or(self.tree.root(dst).len());
            self.update_mode_support_when_keyguard_change(id, up);
            self.tree.attach(id, Parent::Root(dst), position);
            debug!(window = %self.tree[id].id, up, "re-z-order show-when-locked window");

            let node = &mut self.tree[id];
            if up && node.is_split_mode() {
                node.resume_last_mode();
                let (window, mode, display_id) = (node.id, node.mode, node.display_id);
                self.collab.client.update_window_mode(window, mode);
                if let Err(err) = self.with_pair(display_id, |pair, ctx| pair.update_if_split_related(ctx, id)) {
                    error!(?err, %window, "update pair after keyguard raise");
                }
            }
        }
    }

    /// Above the keyguard a window may not become the split primary.
    fn update_mode_support_when_keyguard_change(&mut self, id: NodeId, up: bool) {
        let node = &mut self.tree[id];
        if up {
            if node.mode_support.contains(ModeSupport::SPLIT_PRIMARY) {
                node.mode_support.remove(ModeSupport::SPLIT_PRIMARY);
                self.split_support_stripped.insert(id);
            }
        } else if self.split_support_stripped.remove(&id) {
            node.mode_support.insert(ModeSupport::SPLIT_PRIMARY);
        }
    }

    /// Re-inserts `id` as the last of its equal-priority siblings.
    fn raise_node_to_top(&mut self, id: NodeId) {
        if let Some((parent, _)) = self.tree.detach(id) {
            self.update_window_tree(id, parent);
        }
    }

    pub fn raise_window_to_top(&mut self, window: WindowId) -> WmResult<()> {
        let id = self.lookup(window)?;
        if !self.tree.is_attached(id) {
            return Err(WmError::InvalidOperation(format!("{window} is not in the window tree")));
        }
        self.raise_node_to_top(id);
        self.assign_z_order();
        Ok(())
    }

    /// Raises both split windows and the divider of the pair `id` belongs to.
    pub(crate) fn raise_split_related_window_to_top(&mut self, id: NodeId) {
        let display = self.tree[id].display_id;
        let ordered = self
            .group
            .window_pair(display)
            .map(|pair| pair.ordered_pair(&self.tree, id))
            .unwrap_or_default();
        let mut detached = Vec::new();
        for &node in &ordered {
            if self.tree[node].parent() == Some(Parent::Root(RootType::App)) {
                self.tree.detach(node);
                detached.push(node);
            }
        }
        for node in detached {
            self.update_window_tree(node, Parent::Root(RootType::App));
        }
        self.assign_z_order();
    }

    /// Whether `window` is the top-most window of `root`, counting the
    /// sub-windows of the last main window.
    pub fn is_top_window(&self, window: WindowId, root: RootType) -> bool {
        let Some(&last) = self.tree.root(root).last() else {
            return false;
        };
        let top = self.tree[last]
            .children()
            .iter()
            .rev()
            .copied()
            .find(|c| self.tree[*c].priority > 0)
            .unwrap_or(last);
        self.tree[top].id == window
    }

    #[instrument(skip(self))]
    pub fn raise_z_order_for_app_window(&mut self, window: WindowId) -> WmResult<()> {
        let id = self.lookup(window)?;
        if self.is_top_window(window, RootType::App) || self.is_top_window(window, RootType::Above) {
            return Err(WmError::DoNothing);
        }
        let ty = self.tree[id].window_type;
        if ty.is_sub_window() || ty == WindowType::Dialog {
            let parent = self
                .tree
                .parent_node(id)
                .ok_or_else(|| WmError::InvalidParam(format!("{window} has no parent window")))?;
            self.raise_node_to_top(id);
            if self.tree[parent].is_split_mode() {
                self.raise_split_related_window_to_top(parent);
            } else if self.tree.is_attached(parent) {
                self.raise_node_to_top(parent);
            }
        } else if ty.is_main_window() {
            if self.tree[id].is_split_mode() {
                self.raise_split_related_window_to_top(id);
            } else if self.tree.is_attached(id) {
                self.raise_node_to_top(id);
            }
        } else {
            return Err(WmError::InvalidParam(format!("{window} is not an app window")));
        }
        self.assign_z_order();
        Ok(())
    }
}

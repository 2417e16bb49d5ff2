use tracing::{debug, error, instrument, warn};

use super::collaborators::WindowEvent;
use super::zorder::TraversalOrder;
use super::{WindowNodeContainer, WmError, WmResult};
use crate::model::tree::RootType;
use crate::model::window_node::{WindowId, WindowType};

impl WindowNodeContainer {
    #[instrument(skip(self))]
    pub fn set_focus_window(&mut self, window: WindowId) -> WmResult<()> {
        if self.focused_window == Some(window) {
            debug!(%window, "focus unchanged");
            return Err(WmError::DoNothing);
        }
        if let Some(previous) = self.focused_window.replace(window) {
            self.update_focus_status(previous, false);
        }
        self.update_focus_status(window, true);
        Ok(())
    }

    fn update_focus_status(&mut self, window: WindowId, focused: bool) {
        if !self.tree.find(window).is_some_and(|id| self.tree.is_attached(id)) {
            warn!(%window, focused, "focus target is not in the window tree");
            return;
        }
        self.collab.events.emit(WindowEvent::FocusChanged { window, focused });
    }

    /// `by_removed` marks activations caused by the previous active window
    /// going away; those may hand brightness to a system window.
    #[instrument(skip(self))]
    pub fn set_active_window(&mut self, window: WindowId, by_removed: bool) -> WmResult<()> {
        if self.active_window == Some(window) {
            debug!(%window, "active window unchanged");
            return Err(WmError::DoNothing);
        }
        self.active_window = Some(window);
        if self.tree.find(window).is_some_and(|id| self.tree.is_attached(id)) {
            self.collab.events.emit(WindowEvent::ActiveChanged { window });
        }
        self.update_brightness(window, by_removed);
        Ok(())
    }

    /// Applies the brightness requested by the newly active window, or
    /// restores the display default when it requests none.
    fn update_brightness(&mut self, window: WindowId, by_removed: bool) {
        let Some(node) = self.tree.find(window).and_then(|id| self.tree.get(id)) else {
            error!(%window, "cannot find window to update brightness");
            return;
        };
        if !by_removed && !node.window_type.is_app_window() {
            return;
        }
        let display_id = node.display_id;
        match node.brightness {
            None => {
                if self.display_brightness.is_some() {
                    debug!(%window, "restore default brightness");
                    self.collab.events.emit(WindowEvent::BrightnessOverride { display: display_id, brightness: None });
                    self.display_brightness = None;
                }
                self.brightness_window = None;
            }
            Some(brightness) => {
                if self.display_brightness != Some(brightness) {
                    debug!(%window, brightness, "override brightness");
                    self.collab.events.emit(WindowEvent::BrightnessOverride {
                        display: display_id,
                        brightness: Some((brightness * 255.0) as u32),
                    });
                    self.display_brightness = Some(brightness);
                }
                self.brightness_window = Some(window);
            }
        }
    }

    /// First visible focusable window below `window` in stacking order.
    pub fn next_focusable_window(&self, window: WindowId) -> Option<WindowId> {
        let mut found = false;
        let mut next = None;
        self.traverse_window_tree(TraversalOrder::TopToBottom, |_, node| {
            if found && node.focusable && node.current_visibility {
                next = Some(node.id);
                return true;
            }
            if node.id == window {
                found = true;
            }
            false
        });
        next
    }

    /// Window to activate after `window` loses activation. System windows
    /// hand over to the bottom-most app window or the desktop; app windows
    /// to the next visible window below them.
    pub fn next_active_window(&self, window: WindowId) -> Option<WindowId> {
        let Some(id) = self.tree.find(window).filter(|id| self.tree.is_attached(*id)) else {
            error!(%window, "cannot find window in tree");
            return None;
        };
        let ty = self.tree[id].window_type;
        if ty.is_system_window() {
            let app = self
                .tree
                .root(RootType::App)
                .iter()
                .find(|c| self.tree[**c].window_type != WindowType::DockSlice);
            return app
                .or_else(|| {
                    self.tree.root(RootType::Below).iter().find(|c| self.tree[**c].window_type == WindowType::Desktop)
                })
                .map(|c| self.tree[*c].id);
        }
        if !ty.is_app_window() {
            return None;
        }
        let order = self.ordered_nodes(TraversalOrder::TopToBottom);
        let index = order.iter().position(|n| *n == id)?;
        order[index + 1..]
            .iter()
            .map(|n| &self.tree[*n])
            .find(|n| n.window_type != WindowType::DockSlice && n.current_visibility)
            .map(|n| n.id)
    }

    /// Bottom-most desktop window, if one is attached.
    pub fn desktop_window(&self) -> Option<WindowId> {
        let mut desktop = None;
        self.traverse_window_tree(TraversalOrder::BottomToTop, |_, node| {
            if node.window_type == WindowType::Desktop {
                desktop = Some(node.id);
                return true;
            }
            false
        });
        desktop
    }
}

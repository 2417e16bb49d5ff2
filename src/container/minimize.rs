//! Minimizing app windows and the hide-all/restore-all toggle.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{WindowNodeContainer, WmError, WmResult};
use crate::common::collections::{BTreeMap, BTreeSet};
use crate::layout_engine::{LayoutMode, LayoutPolicy};
use crate::model::minimize::MinimizeReason;
use crate::model::tree::RootType;
use crate::model::window_node::{WindowId, WindowMode, WindowType};
use crate::sys::display::DisplayId;
use crate::sys::geometry::Rect;

/// What the app partition looked like before every app window was hidden.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WindowStateBackup {
    pub(crate) window_ids: Vec<WindowId>,
    modes: BTreeMap<WindowId, WindowMode>,
    /// Displays that had a window on each side of a split.
    split_displays: BTreeSet<DisplayId>,
    divider_rects: BTreeMap<DisplayId, Rect>,
}

impl WindowStateBackup {
    pub fn is_empty(&self) -> bool { self.window_ids.is_empty() }

    pub fn window_ids(&self) -> &[WindowId] { &self.window_ids }

    pub fn mode_of(&self, window: WindowId) -> Option<WindowMode> { self.modes.get(&window).copied() }

    pub fn divider_rect(&self, display: DisplayId) -> Option<Rect> { self.divider_rects.get(&display).copied() }

    pub fn clear(&mut self) { *self = Self::default(); }
}

impl WindowNodeContainer {
    pub fn backup(&self) -> &WindowStateBackup { &self.backup }

    pub fn is_app_windows_empty(&self) -> bool { self.tree.root(RootType::App).is_empty() }

    /// Queues every main window of the app partition for minimizing except
    /// the listed ids and modes.
    pub fn minimize_app_node_except_options(
        &mut self,
        reason: MinimizeReason,
        exclude_ids: &[WindowId],
        exclude_modes: &[WindowMode],
    ) {
        for &id in self.tree.root(RootType::App) {
            let node = &self.tree[id];
            if node.window_type != WindowType::AppMain
                || exclude_ids.contains(&node.id)
                || exclude_modes.contains(&node.mode)
            {
                continue;
            }
            self.collab.minimize.add_candidate(node.id, reason);
        }
    }

    /// A window going fullscreen hides the other fullscreen and split app
    /// windows.
    pub fn minimize_structured_app_windows_except_self(&mut self, window: WindowId) {
        self.minimize_app_node_except_options(
            MinimizeReason::OtherWindow,
            &[window],
            &[WindowMode::Floating, WindowMode::Pip],
        );
    }

    #[instrument(skip(self, display))]
    pub fn minimize_all_app_windows(&mut self, display: DisplayId) -> WmResult<()> {
        self.minimize_app_node_except_options(MinimizeReason::MinimizeAll, &[], &[]);
        self.switch_layout_policy(LayoutMode::Cascade, display, false)
    }

    /// Queues the bottom-most main window once the app window limit is hit.
    pub fn minimize_oldest_app_window(&mut self) {
        let oldest = [RootType::App, RootType::Above].into_iter().find_map(|root| {
            self.tree.root(root).iter().map(|id| &self.tree[*id]).find(|n| n.window_type == WindowType::AppMain)
        });
        match oldest.map(|n| n.id) {
            Some(window) => self.collab.minimize.add_candidate(window, MinimizeReason::MaxAppCount),
            None => debug!("no window needs to minimize"),
        }
    }

    /// Hides every app window (`restore == false`) or brings the hidden set
    /// back. `restore_fn` re-adds one window in its saved mode and reports
    /// whether that worked.
    #[instrument(skip(self, restore_fn))]
    pub fn toggle_shown_state_for_all_app_windows(
        &mut self,
        restore_fn: impl FnMut(&mut WindowNodeContainer, WindowId, WindowMode) -> bool,
        restore: bool,
    ) -> WmResult<()> {
        let recent_fullscreen = self.tree.root(RootType::Above).iter().any(|id| {
            let node = &self.tree[*id];
            node.window_type == WindowType::LauncherRecent && node.mode == WindowMode::Fullscreen
        });
        if restore && recent_fullscreen {
            return Err(WmError::DoNothing);
        }
        let app_empty = self.is_app_windows_empty();
        if !restore && app_empty && !self.backup.is_empty() {
            self.backup.clear();
        }
        if !restore && !app_empty && self.backup.is_empty() {
            self.backup_window_state()?;
        } else if restore && !self.backup.is_empty() {
            self.restore_window_state(restore_fn);
        } else {
            debug!(restore, "no app windows or no backup");
        }
        Ok(())
    }

    /// Records the main windows of the app partition and removes them from
    /// the tree.
    pub fn backup_window_state(&mut self) -> WmResult<()> {
        let mains: Vec<_> = self
            .tree
            .root(RootType::App)
            .iter()
            .copied()
            .filter(|id| self.tree[*id].window_type.is_main_window())
            .collect();
        let mut backup = WindowStateBackup::default();
        let mut split_sides: BTreeMap<DisplayId, (bool, bool)> = BTreeMap::new();
        for &id in &mains {
            let node = &self.tree[id];
            backup.modes.insert(node.id, node.mode);
            let sides = split_sides.entry(node.display_id).or_default();
            match node.mode {
                WindowMode::SplitPrimary => sides.0 = true,
                WindowMode::SplitSecondary => sides.1 = true,
                _ => {}
            }
        }
        backup.split_displays =
            split_sides.iter().filter(|(_, (p, s))| *p && *s).map(|(display, _)| *display).collect();
        for &display in split_sides.keys() {
            let divider = self.group.window_pair(display).and_then(|pair| pair.divider());
            if let Some(divider) = divider.and_then(|id| self.tree.get(id)) {
                backup.divider_rects.insert(display, divider.window_rect);
            }
        }
        for id in mains {
            backup.window_ids.push(self.tree[id].id);
            self.remove_window_node_inner(id)?;
        }
        info!(count = backup.window_ids.len(), "backed up app windows");
        self.backup = backup;
        Ok(())
    }

    pub fn restore_window_state(
        &mut self,
        mut restore_fn: impl FnMut(&mut WindowNodeContainer, WindowId, WindowMode) -> bool,
    ) {
        let backup = std::mem::take(&mut self.backup);
        for &display_id in &backup.split_displays {
            if let Some(pair) = self.group.window_pair_mut(display_id) {
                pair.set_all_split_app_windows_restoring(true);
            }
        }
        for &window in &backup.window_ids {
            let mode = backup.mode_of(window).unwrap_or_default();
            if restore_fn(self, window, mode) {
                debug!(%window, ?mode, "restored");
            } else {
                error!(%window, "restore failed");
            }
        }
        for (_, pair) in self.group.pairs_mut() {
            pair.set_all_split_app_windows_restoring(false);
        }
        self.policies[self.layout_mode.index()].set_split_divider_window_rects(backup.divider_rects);
    }
}

use serde::{Deserialize, Serialize};

use super::window_node::WindowId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MinimizeReason {
    MinimizeAll,
    LayoutTile,
    LayoutCascade,
    MaxAppCount,
    SplitReplace,
    SplitQuit,
    OtherWindow,
}

/// Worklist of windows the engine wants minimized. The engine only appends;
/// draining it belongs to whoever owns the application lifecycle.
pub trait MinimizeSink: Send {
    fn add_candidate(&mut self, window: WindowId, reason: MinimizeReason);

    /// Takes back the most recently queued tile-layout candidate so it can
    /// be shown again.
    fn recover_candidate(&mut self) -> Option<WindowId>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MinimizeList {
    entries: Vec<(WindowId, MinimizeReason)>,
}

impl MinimizeList {
    pub fn new() -> Self { Self::default() }

    pub fn entries(&self) -> &[(WindowId, MinimizeReason)] { &self.entries }

    pub fn contains(&self, window: WindowId) -> bool {
        self.entries.iter().any(|(w, _)| *w == window)
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn take(&mut self) -> Vec<(WindowId, MinimizeReason)> { std::mem::take(&mut self.entries) }
}

impl MinimizeSink for MinimizeList {
    fn add_candidate(&mut self, window: WindowId, reason: MinimizeReason) {
        if !self.entries.contains(&(window, reason)) {
            self.entries.push((window, reason));
        }
    }

    fn recover_candidate(&mut self) -> Option<WindowId> {
        let pos = self.entries.iter().rposition(|(_, r)| *r == MinimizeReason::LayoutTile)?;
        Some(self.entries.remove(pos).0)
    }
}

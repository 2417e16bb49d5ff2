use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{WindowNodeContainer, WmError, WmResult};
use crate::common::config::ModeChangeHotZones;
use crate::layout_engine::LayoutPolicy;
use crate::sys::display::DisplayId;
use crate::sys::geometry::Rect;

/// Display-local strips that switch a dragged window's mode when it is
/// released over them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeChangeHotZoneRects {
    pub fullscreen: Rect,
    pub primary: Rect,
    pub secondary: Rect,
}

impl WindowNodeContainer {
    /// Missing pairs forbid the move.
    pub fn is_forbid_dock_slice_move(&self, display: DisplayId) -> bool {
        match self.group.window_pair(display) {
            Some(pair) => pair.is_forbid_dock_slice_move(&self.tree),
            None => true,
        }
    }

    pub fn is_dock_slice_in_exit_split_mode_area(&self, display: DisplayId) -> bool {
        let points = self.policy().exit_split_points(display);
        self.group
            .window_pair(display)
            .is_some_and(|pair| pair.is_dock_slice_in_exit_split_mode_area(&self.tree, &points))
    }

    pub fn exit_split_mode(&mut self, display_id: DisplayId) -> WmResult<()> {
        debug!(display = %display_id, "exit split mode");
        self.with_pair(display_id, |pair, ctx| pair.exit_split_mode(ctx))
    }

    pub fn get_mode_change_hot_zones(
        &self,
        display: DisplayId,
        config: &ModeChangeHotZones,
    ) -> WmResult<ModeChangeHotZoneRects> {
        let rect = self
            .group
            .displays()
            .display_info(display)
            .map(|info| info.rect)
            .ok_or(WmError::DisplayNotFound(display))?;
        Ok(ModeChangeHotZoneRects {
            fullscreen: Rect::new(0, 0, rect.width, config.fullscreen_range),
            primary: Rect::new(0, 0, config.primary_range, rect.height),
            secondary: Rect::new(
                rect.width as i32 - config.secondary_range as i32,
                0,
                config.secondary_range,
                rect.height,
            ),
        })
    }
}

//! Window placement policies.
//!
//! A policy turns the window tree plus the display registry into window
//! rects, limit rects and hot zones. Two policies exist, selected by
//! [`LayoutMode`]; both share the geometry in [`base`].

pub mod base;
pub mod systems;

use serde::{Deserialize, Serialize};

pub use base::{AvoidPosType, DockShowState, PolicyBase};
pub use systems::{CascadePolicy, LayoutPolicy, LayoutPolicyKind, TilePolicy};

use crate::container::collaborators::ClientNotifier;
use crate::model::minimize::MinimizeSink;
use crate::model::tree::{DisplayGroupWindowTree, NodeId, RootType, WindowTree};
use crate::sys::display::{DisplayGroupInfo, DisplayId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Cascade,
    Tile,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 2] = [LayoutMode::Cascade, LayoutMode::Tile];

    pub fn index(self) -> usize { self as usize }
}

/// Everything a policy reads or writes while laying out, borrowed from the
/// container for the duration of one call.
pub struct LayoutContext<'a> {
    pub tree: &'a mut WindowTree,
    pub displays: &'a mut DisplayGroupInfo,
    pub buckets: &'a DisplayGroupWindowTree,
    pub minimize: &'a mut dyn MinimizeSink,
    pub client: &'a mut dyn ClientNotifier,
}

impl<'a> LayoutContext<'a> {
    /// Main windows of `display` under `root`, in stacking order.
    pub fn bucket(&self, display: DisplayId, root: RootType) -> &'a [NodeId] {
        let buckets: &'a DisplayGroupWindowTree = self.buckets;
        buckets.get(&display).map(|b| b[root.index()].as_slice()).unwrap_or(&[])
    }

    pub fn virtual_pixel_ratio(&self, display: DisplayId) -> f32 {
        self.displays.virtual_pixel_ratio(display)
    }
}

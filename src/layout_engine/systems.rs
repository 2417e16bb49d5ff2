use enum_dispatch::enum_dispatch;
use tracing::debug;

use super::base::{self, DisplayRectChange, PolicyBase};
use super::{LayoutContext, LayoutMode};
use crate::common::collections::BTreeMap;
use crate::common::config::Config;
use crate::model::tree::NodeId;
use crate::sys::display::{DisplayGroupInfo, DisplayId};
use crate::sys::geometry::Rect;

/// A window placement policy.
///
/// Policies never own windows; every call borrows the tree and the display
/// registry through a [`LayoutContext`]. Default methods carry the behavior
/// both policies share and forward to [`base`], so an override can still run
/// the shared part.
#[enum_dispatch]
pub trait LayoutPolicy {
    fn base(&self) -> &PolicyBase;
    fn base_mut(&mut self) -> &mut PolicyBase;
    fn mode(&self) -> LayoutMode;

    /// Computes every per-display rect and lays out the whole group.
    fn launch(&mut self, ctx: &mut LayoutContext<'_>);

    fn clean(&mut self) {
        debug!(mode = ?self.mode(), "clean layout policy");
    }

    fn reset(&mut self, _ctx: &mut LayoutContext<'_>) {}

    fn reorder(&mut self, _ctx: &mut LayoutContext<'_>) {}

    fn add_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId);

    fn update_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId, _is_add: bool) {
        base::update_window_node(self, ctx, id)
    }

    fn remove_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        base::remove_window_node(self, ctx, id)
    }

    fn layout_window_tree(&mut self, ctx: &mut LayoutContext<'_>, display: DisplayId) {
        base::layout_window_tree(self, ctx, display)
    }

    fn layout_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        base::layout_window_node(self, ctx, id)
    }

    /// Computes and commits the window rect of one attached node.
    fn update_layout_rect(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId);

    /// Runs after an avoid-type window was laid out.
    fn update_limit_rects_for_avoid_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let base = self.base_mut();
        base.update_limit_rect(ctx.displays, &ctx.tree[id]);
        base.update_display_group_limit_rect();
    }

    fn process_display_create(
        &mut self,
        ctx: &mut LayoutContext<'_>,
        display: DisplayId,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) -> bool {
        base::process_display_change(self, ctx, display, display_rects, DisplayRectChange::Create)
    }

    fn process_display_destroy(
        &mut self,
        ctx: &mut LayoutContext<'_>,
        display: DisplayId,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) -> bool {
        base::process_display_change(self, ctx, display, display_rects, DisplayRectChange::Destroy)
    }

    fn process_display_size_change(
        &mut self,
        ctx: &mut LayoutContext<'_>,
        display: DisplayId,
        display_rects: &BTreeMap<DisplayId, Rect>,
    ) -> bool {
        base::process_display_change(
            self,
            ctx,
            display,
            display_rects,
            DisplayRectChange::SizeChangeOrRotation,
        )
    }

    fn divider_rect(&self, _display: DisplayId) -> Rect { Rect::default() }

    /// Divider positions past which a split is abandoned.
    fn exit_split_points(&self, _display: DisplayId) -> Vec<i32> { Vec::new() }

    fn is_tile_rect_satisfied_with_size_limits(
        &mut self,
        _ctx: &mut LayoutContext<'_>,
        _id: NodeId,
    ) -> bool {
        true
    }

    /// Divider rects to reuse when a divider is next added on each display.
    fn set_split_divider_window_rects(&mut self, _rects: BTreeMap<DisplayId, Rect>) {}
}

#[enum_dispatch(LayoutPolicy)]
pub enum LayoutPolicyKind {
    Cascade(CascadePolicy),
    Tile(TilePolicy),
}

impl LayoutPolicyKind {
    pub fn new(mode: LayoutMode, config: &Config, displays: &DisplayGroupInfo) -> Self {
        match mode {
            LayoutMode::Cascade => CascadePolicy::new(config, displays).into(),
            LayoutMode::Tile => TilePolicy::new(config, displays).into(),
        }
    }
}

mod cascade;
mod tile;

pub use cascade::CascadePolicy;
pub use tile::TilePolicy;

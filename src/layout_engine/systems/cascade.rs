//! Cascade layout: floating windows open stepped down and right from a
//! centred first rect, and the display can be split by a divider window.

use tracing::{debug, trace};

use super::LayoutPolicy;
use crate::common::collections::BTreeMap;
use crate::common::config::{Config, SplitRatioSettings};
use crate::layout_engine::base::{self, PolicyBase, update_floating_layout_rect};
use crate::layout_engine::{LayoutContext, LayoutMode};
use crate::model::minimize::MinimizeReason;
use crate::model::tree::{NodeId, RootType};
use crate::model::window_pair::DEFAULT_SPLIT_RATIO;
use crate::model::window_node::{WindowFlags, WindowMode, WindowSizeChangeReason, WindowType};
use crate::sys::display::{DisplayGroupInfo, DisplayId};
use crate::sys::geometry::{Rect, scale};

#[derive(Debug, Clone, Default, PartialEq)]
struct LayoutRects {
    primary: Rect,
    secondary: Rect,
    primary_limit: Rect,
    secondary_limit: Rect,
    divider: Rect,
    first_cascade: Rect,
    exit_split_points: Vec<i32>,
    split_ratio_points: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct CascadePolicy {
    base: PolicyBase,
    split: SplitRatioSettings,
    rects: BTreeMap<DisplayId, LayoutRects>,
    restoring_divider_rects: BTreeMap<DisplayId, Rect>,
    is_first_app_window: bool,
}

fn is_vertical(displays: &DisplayGroupInfo, display: DisplayId) -> bool {
    let rect = displays.display_rect(display);
    rect.width < rect.height
}

/// Shrinks `split_limit` to its overlap with `limit`.
fn update_split_limit_rect(limit: Rect, split_limit: &mut Rect) {
    let cur = *split_limit;
    split_limit.x = limit.x.max(cur.x);
    split_limit.y = limit.y.max(cur.y);
    split_limit.width = (limit.right().min(cur.right()) - split_limit.x).max(0) as u32;
    split_limit.height = (limit.bottom().min(cur.bottom()) - split_limit.y).max(0) as u32;
}

impl CascadePolicy {
    pub fn new(config: &Config, displays: &DisplayGroupInfo) -> Self {
        CascadePolicy {
            base: PolicyBase::new(config.layout.clone(), displays),
            split: config.split.clone(),
            rects: displays.display_ids().map(|id| (id, LayoutRects::default())).collect(),
            restoring_divider_rects: BTreeMap::new(),
            is_first_app_window: true,
        }
    }

    pub fn first_cascade_rect(&self, display: DisplayId) -> Rect {
        self.rects.get(&display).map(|r| r.first_cascade).unwrap_or_default()
    }

    pub fn split_rects(&self, display: DisplayId) -> (Rect, Rect) {
        self.rects.get(&display).map(|r| (r.primary, r.secondary)).unwrap_or_default()
    }

    pub fn split_limit_rects(&self, display: DisplayId) -> (Rect, Rect) {
        self.rects
            .get(&display)
            .map(|r| (r.primary_limit, r.secondary_limit))
            .unwrap_or_default()
    }

    pub fn split_ratio_points(&self, display: DisplayId) -> &[i32] {
        self.rects.get(&display).map(|r| r.split_ratio_points.as_slice()).unwrap_or(&[])
    }

    fn rects_mut(&mut self, display: DisplayId) -> &mut LayoutRects {
        self.rects.entry(display).or_default()
    }

    fn init_all_rects(&mut self, ctx: &mut LayoutContext<'_>) {
        for display in ctx.displays.display_ids().collect::<Vec<_>>() {
            self.init_split_rects(ctx, display);
            self.init_limit_rects(ctx, display);
            self.base.reset_display_group_limit_rect();
            let above = ctx.bucket(display, RootType::Above);
            base::layout_window_nodes(self, ctx, above);
            self.init_cascade_rect(ctx, display);
        }
    }

    fn init_split_rects(&mut self, ctx: &LayoutContext<'_>, display_id: DisplayId) {
        let divider_width = scale(self.base.settings.divider_width, ctx.virtual_pixel_ratio(display_id));
        let display_rect = ctx.displays.display_rect(display_id);
        let divider = if is_vertical(ctx.displays, display_id) {
            Rect::new(
                0,
                (display_rect.height.saturating_sub(divider_width) as f32 * DEFAULT_SPLIT_RATIO) as i32,
                display_rect.width,
                divider_width,
            )
        } else {
            Rect::new(
                (display_rect.width.saturating_sub(divider_width) as f32 * DEFAULT_SPLIT_RATIO) as i32,
                0,
                divider_width,
                display_rect.height,
            )
        };
        debug!(display = %display_id, ?divider, "init divider rect");
        self.set_split_rect(ctx, divider, display_id);
    }

    /// Derives the primary and secondary rects from a divider rect.
    fn set_split_rect(&mut self, ctx: &LayoutContext<'_>, divider: Rect, display_id: DisplayId) {
        let display_rect = ctx.displays.display_rect(display_id);
        let vertical = is_vertical(ctx.displays, display_id);
        let rects = self.rects_mut(display_id);
        rects.divider = divider;
        if vertical {
            rects.primary = Rect::new(
                display_rect.x,
                display_rect.y,
                display_rect.width,
                divider.y.max(0) as u32,
            );
            let secondary_y = divider.bottom();
            rects.secondary = Rect::new(
                display_rect.x,
                secondary_y,
                display_rect.width,
                (display_rect.height as i32 - secondary_y).max(0) as u32,
            );
        } else {
            rects.primary = Rect::new(
                display_rect.x,
                display_rect.y,
                divider.x.max(0) as u32,
                display_rect.height,
            );
            let secondary_x = divider.right();
            rects.secondary = Rect::new(
                secondary_x,
                display_rect.y,
                (display_rect.width as i32 - secondary_x).max(0) as u32,
                display_rect.height,
            );
        }
        trace!(display = %display_id, primary = ?rects.primary, secondary = ?rects.secondary, "split rects");
    }

    fn init_limit_rects(&mut self, ctx: &LayoutContext<'_>, display: DisplayId) {
        self.base.set_limit_rect(display, ctx.displays.display_rect(display));
        let rects = self.rects_mut(display);
        rects.primary_limit = rects.primary;
        rects.secondary_limit = rects.secondary;
        self.update_split_ratio_points(ctx, display);
    }

    fn split_ratio_point(&self, ctx: &LayoutContext<'_>, ratio: f32, display: DisplayId) -> i32 {
        let divider = self.rects.get(&display).map(|r| r.divider).unwrap_or_default();
        let display_rect = ctx.displays.display_rect(display);
        if is_vertical(ctx.displays, display) {
            display_rect.y + (display_rect.height.saturating_sub(divider.height) as f32 * ratio) as i32
        } else {
            display_rect.x + (display_rect.width.saturating_sub(divider.width) as f32 * ratio) as i32
        }
    }

    fn update_split_ratio_points(&mut self, ctx: &LayoutContext<'_>, display: DisplayId) {
        let exit = vec![
            self.split_ratio_point(ctx, self.split.exit_split_start_ratio, display),
            self.split_ratio_point(ctx, self.split.exit_split_end_ratio, display),
        ];
        let points: Vec<i32> = self
            .split
            .ratios
            .iter()
            .map(|ratio| self.split_ratio_point(ctx, *ratio, display))
            .collect();
        let rects = self.rects_mut(display);
        rects.exit_split_points = exit;
        rects.split_ratio_points = points;
    }

    fn init_cascade_rect(&mut self, ctx: &LayoutContext<'_>, display_id: DisplayId) {
        let ratio = self.base.settings.cascade_aspect_ratio;
        let vpr = ctx.virtual_pixel_ratio(display_id);
        let display_rect = ctx.displays.display_rect(display_id);
        let width = ((display_rect.width as f32 * ratio) as u32)
            .max(scale(self.base.settings.min_floating_width, vpr));
        let height = ((display_rect.height as f32 * ratio) as u32)
            .max(scale(self.base.settings.min_floating_height, vpr));

        let mut rect = Rect::new(0, 0, width, height);
        let limit = self.base.limit_rect(display_id);
        if width <= limit.width && height <= limit.height {
            rect.x = limit.x + (limit.width / 2) as i32 - (width / 2) as i32;
            rect.y = limit.y + (limit.height / 2) as i32 - (height / 2) as i32;
        }
        debug!(display = %display_id, ?rect, "init cascade rect");
        self.rects_mut(display_id).first_cascade = rect;
    }

    /// The next cascade position after `rect`, wrapping to the limit rect's
    /// origin on an axis that would overflow.
    fn step_cascade_rect(&self, ctx: &LayoutContext<'_>, rect: Rect, display: DisplayId) -> Rect {
        let step = self.base.title_bar_height(ctx.virtual_pixel_ratio(display)) as i32;
        let limit = self.base.limit_rect(display);
        let x = if rect.x + step >= limit.x && rect.right() + step <= limit.right() {
            rect.x + step
        } else {
            limit.x
        };
        let y = if rect.y + step >= limit.y && rect.bottom() + step <= limit.bottom() {
            rect.y + step
        } else {
            limit.y
        };
        Rect::new(x, y, rect.width, rect.height)
    }

    fn cur_cascade_rect(&self, ctx: &LayoutContext<'_>, id: NodeId) -> Rect {
        let node = &ctx.tree[id];
        let display = node.display_id;
        let mut cascade = Rect::default();
        for root in [RootType::Above, RootType::App] {
            let found = ctx.bucket(display, root).iter().rev().find_map(|other| {
                let other = ctx.tree.get(*other)?;
                (other.window_type == WindowType::AppMain && other.id != node.id).then(|| {
                    if other.mode == WindowMode::Floating { other.window_rect } else { other.request_rect }
                })
            });
            if let Some(rect) = found {
                cascade = rect;
            }
        }
        if cascade.is_empty() {
            debug!("no cascade rect in use, taking the first");
            return self.first_cascade_rect(display);
        }
        self.step_cascade_rect(ctx, cascade, display)
    }

    fn set_cascade_rect(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let node = &ctx.tree[id];
        let display_id = node.display_id;
        let rect = if node.window_type.is_app_window() {
            if self.is_first_app_window {
                self.is_first_app_window = false;
                self.first_cascade_rect(display_id)
            } else {
                self.cur_cascade_rect(ctx, id)
            }
        } else {
            self.first_cascade_rect(display_id)
        };
        debug!(window = %node.id, ?rect, "set cascade rect");
        let node = &mut ctx.tree[id];
        node.request_rect = rect;
        node.deco_applied = true;
    }

    fn update_window_node_rect_offset(ctx: &mut LayoutContext<'_>, id: NodeId) {
        let display = ctx.tree[id].display_id;
        let display_rect = ctx.displays.display_rect(display);
        let compressed = ctx.displays.is_waterfall_compressed(display);
        let node = &mut ctx.tree[id];
        let mut rect = node.request_rect;
        match node.window_type {
            WindowType::StatusBar => rect.y = display_rect.y,
            WindowType::NavigationBar => {
                rect.y = display_rect.bottom() - rect.height as i32;
            }
            _ if compressed => {
                if rect.y < display_rect.y {
                    rect.y = display_rect.y;
                } else if rect.y > display_rect.bottom() {
                    rect.y = display_rect.bottom();
                }
            }
            _ => {}
        }
        node.request_rect = rect;
    }

    /// False when a move or resize asks for the rect the window already has.
    fn special_reason_process(ctx: &mut LayoutContext<'_>, id: NodeId, is_add: bool) -> bool {
        let node = &ctx.tree[id];
        let reason = node.size_change_reason;
        if matches!(reason, WindowSizeChangeReason::Move | WindowSizeChangeReason::Resize)
            && node.request_rect == node.window_rect
            && !is_add
        {
            return false;
        }
        if reason == WindowSizeChangeReason::Rotation {
            let display = node.display_id;
            for root in RootType::ALL {
                for other in ctx.bucket(display, root) {
                    if let Some(other) = ctx.tree.get_mut(*other) {
                        other.size_change_reason = WindowSizeChangeReason::Rotation;
                    }
                }
            }
        }
        true
    }

    fn display_rect_for_mode(&self, ctx: &LayoutContext<'_>, mode: WindowMode, display: DisplayId) -> Rect {
        match (mode, self.rects.get(&display)) {
            (WindowMode::SplitPrimary, Some(rects)) => rects.primary,
            (WindowMode::SplitSecondary, Some(rects)) => rects.secondary,
            _ => ctx.displays.display_rect(display),
        }
    }

    fn limit_rect_for_mode(&self, mode: WindowMode, display: DisplayId) -> Rect {
        match (mode, self.rects.get(&display)) {
            (WindowMode::SplitPrimary, Some(rects)) => rects.primary_limit,
            (WindowMode::SplitSecondary, Some(rects)) => rects.secondary_limit,
            _ => self.base.limit_rect(display),
        }
    }

    /// Keeps the divider entirely inside the limit rect along its moving axis.
    fn limit_divider_move_bounds(&self, rect: &mut Rect, display: DisplayId) {
        let limit = self.base.limit_rect(display);
        if rect.width < rect.height {
            if rect.x < limit.x {
                rect.x = limit.x;
            } else if rect.right() > limit.right() {
                rect.x = limit.right() - rect.width as i32;
            }
        } else if rect.y < limit.y {
            rect.y = limit.y;
        } else if rect.bottom() > limit.bottom() {
            rect.y = limit.bottom() - rect.height as i32;
        }
    }

    /// Snaps a released divider to the closest configured split ratio.
    fn snap_to_split_ratio_point(&self, display: DisplayId, origin: i32) -> i32 {
        let Some(rects) = self.rects.get(&display) else { return origin };
        let limit = self.base.limit_rect(display);
        let mut min_diff = limit.width.max(limit.height);
        let mut closest = origin;
        for point in &rects.split_ratio_points {
            let diff = origin.abs_diff(*point);
            if diff < min_diff {
                closest = *point;
                min_diff = diff;
            }
        }
        closest
    }

    fn apply_window_rect_constraints(&self, ctx: &mut LayoutContext<'_>, id: NodeId, win_rect: &mut Rect) {
        let node = &ctx.tree[id];
        let display_id = node.display_id;
        if node.window_type == WindowType::DockSlice {
            self.limit_divider_move_bounds(win_rect, display_id);
            let vertical = is_vertical(ctx.displays, display_id);
            if node.size_change_reason == WindowSizeChangeReason::DragEnd {
                if vertical {
                    win_rect.y = self.snap_to_split_ratio_point(display_id, win_rect.y);
                } else {
                    win_rect.x = self.snap_to_split_ratio_point(display_id, win_rect.x);
                }
            }
            // A divider oriented against the display means the display rotated.
            if win_rect.is_landscape() != vertical {
                debug!(display = %display_id, rect = ?*win_rect, "reset divider after rotation");
                *win_rect = self.rects.get(&display_id).map(|r| r.divider).unwrap_or_default();
                ctx.tree[id].request_rect = *win_rect;
            }
        }
        let node = &ctx.tree[id];
        self.base.limit_floating_window_size(node, win_rect);
        self.base.limit_main_floating_window_position(ctx, node, win_rect);
        trace!(window = %node.id, rect = ?*win_rect, "constrained rect");
    }
}

impl LayoutPolicy for CascadePolicy {
    fn base(&self) -> &PolicyBase { &self.base }

    fn base_mut(&mut self) -> &mut PolicyBase { &mut self.base }

    fn mode(&self) -> LayoutMode { LayoutMode::Cascade }

    fn launch(&mut self, ctx: &mut LayoutContext<'_>) {
        self.init_all_rects(ctx);
        for display in ctx.displays.display_ids().collect::<Vec<_>>() {
            let app = ctx.bucket(display, RootType::App);
            base::layout_window_nodes(self, ctx, app);
            let below = ctx.bucket(display, RootType::Below);
            base::layout_window_nodes(self, ctx, below);
        }
        debug!("cascade layout launched");
    }

    fn reset(&mut self, ctx: &mut LayoutContext<'_>) {
        for display in ctx.displays.display_ids().collect::<Vec<_>>() {
            self.init_split_rects(ctx, display);
            self.init_limit_rects(ctx, display);
        }
        self.base.reset_display_group_limit_rect();
    }

    /// Re-cascades every main app window from the first cascade rect. Windows
    /// that cannot float at that size are minimized.
    fn reorder(&mut self, ctx: &mut LayoutContext<'_>) {
        debug!("cascade reorder");
        for display_id in ctx.displays.display_ids().collect::<Vec<_>>() {
            let mut rect = self.first_cascade_rect(display_id);
            let mut is_first = true;
            for &id in ctx.bucket(display_id, RootType::App) {
                let Some(node) = ctx.tree.get_mut(id) else { continue };
                if node.window_type != WindowType::AppMain {
                    continue;
                }
                if !node.mode_support.supports(WindowMode::Floating)
                    || !node.updated_size_limits.is_satisfied_by(&rect)
                {
                    ctx.minimize.add_candidate(node.id, MinimizeReason::LayoutCascade);
                    continue;
                }
                if is_first {
                    is_first = false;
                } else {
                    rect = self.step_cascade_rect(ctx, rect, display_id);
                }
                let node = &mut ctx.tree[id];
                node.request_rect = rect;
                node.deco_applied = true;
                if node.mode != WindowMode::Floating {
                    node.set_mode(WindowMode::Floating);
                    ctx.client.update_window_mode(node.id, WindowMode::Floating);
                }
                debug!(window = %node.id, ?rect, "reordered");
            }
            self.layout_window_tree(ctx, display_id);
        }
    }

    fn add_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        if ctx.tree[id].request_rect.is_empty() {
            self.set_cascade_rect(ctx, id);
        }
        Self::update_window_node_rect_offset(ctx, id);
        let node = &ctx.tree[id];
        if node.window_type == WindowType::DockSlice {
            let display = node.display_id;
            let mut rect = self.divider_rect(display);
            if let Some(restoring) = self.restoring_divider_rects.remove(&display) {
                if !restoring.is_empty() {
                    rect = restoring;
                }
            }
            ctx.tree[id].request_rect = rect;
        }
        self.update_window_node(ctx, id, true);
    }

    fn update_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId, is_add: bool) {
        Self::update_window_node_rect_offset(ctx, id);
        let node = &ctx.tree[id];
        let (display_id, window_type, split) = (node.display_id, node.window_type, node.is_split_mode());
        if window_type.is_avoid_type() {
            if !Self::special_reason_process(ctx, id, is_add) {
                return;
            }
            self.layout_window_tree(ctx, display_id);
        } else if window_type == WindowType::DockSlice {
            self.update_layout_rect(ctx, id);
            let divider = ctx.tree[id].window_rect;
            self.set_split_rect(ctx, divider, display_id);
            debug!(window = %ctx.tree[id].id, ?divider, "divider moved");
            if !is_add {
                for other in ctx.bucket(display_id, RootType::App) {
                    if let Some(other) = ctx.tree.get_mut(*other) {
                        if other.is_split_mode() {
                            other.size_change_reason = WindowSizeChangeReason::Drag;
                        }
                    }
                }
            }
            self.layout_window_tree(ctx, display_id);
        } else if split {
            self.layout_window_tree(ctx, display_id);
        } else {
            self.layout_window_node(ctx, id);
        }
    }

    fn remove_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let (display, window_type) = (ctx.tree[id].display_id, ctx.tree[id].window_type);
        if window_type.is_avoid_type() {
            self.layout_window_tree(ctx, display);
        } else if window_type == WindowType::DockSlice {
            self.init_split_rects(ctx, display);
            self.layout_window_tree(ctx, display);
        }
        base::notify_hidden(ctx, id);
    }

    fn layout_window_tree(&mut self, ctx: &mut LayoutContext<'_>, display: DisplayId) {
        self.init_limit_rects(ctx, display);
        base::layout_window_tree(self, ctx, display);
    }

    fn update_limit_rects_for_avoid_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let display_id = ctx.tree[id].display_id;
        self.base.update_limit_rect(ctx.displays, &ctx.tree[id]);
        let limit = self.base.limit_rect(display_id);
        let rects = self.rects_mut(display_id);
        update_split_limit_rect(limit, &mut rects.primary_limit);
        update_split_limit_rect(limit, &mut rects.secondary_limit);
        trace!(
            display = %display_id,
            primary_limit = ?rects.primary_limit,
            secondary_limit = ?rects.secondary_limit,
            "split limit rects"
        );
        self.update_split_ratio_points(ctx, display_id);
        self.base.update_display_group_limit_rect();
    }

    fn update_layout_rect(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        self.base.update_window_size_limits(ctx, id);
        let node = &ctx.tree[id];
        let display_id = node.display_id;
        let mode = node.mode;
        let need_avoid = node.flags.contains(WindowFlags::NEED_AVOID);
        let parent_limit = node.flags.contains(WindowFlags::PARENT_LIMIT);
        let sub_window = node.window_type.is_sub_window() || node.window_type.is_system_sub_window();
        let floating = mode == WindowMode::Floating;

        let mut limit_rect = self.display_rect_for_mode(ctx, mode, display_id);
        self.base.compute_decorated_request_rect(ctx, id);
        let mut win_rect = ctx.tree[id].request_rect;
        trace!(window = %ctx.tree[id].id, need_avoid, parent_limit, floating, ?win_rect, "layout");
        if need_avoid {
            limit_rect = self.limit_rect_for_mode(mode, display_id);
        }
        if !floating {
            win_rect = limit_rect;
        } else if sub_window && parent_limit {
            if let Some(parent) = ctx.tree.parent_node(id) {
                update_floating_layout_rect(ctx.tree[parent].window_rect, &mut win_rect);
            }
        }
        self.apply_window_rect_constraints(ctx, id, &mut win_rect);
        ctx.tree[id].window_rect = win_rect;
        self.base.calc_and_set_node_hot_zone(ctx, id, win_rect);
        PolicyBase::update_client_rect_and_reset_reason(ctx, id, win_rect);
    }

    fn divider_rect(&self, display: DisplayId) -> Rect {
        self.rects.get(&display).map(|r| r.divider).unwrap_or_default()
    }

    fn exit_split_points(&self, display: DisplayId) -> Vec<i32> {
        self.rects.get(&display).map(|r| r.exit_split_points.clone()).unwrap_or_default()
    }

    fn set_split_divider_window_rects(&mut self, rects: BTreeMap<DisplayId, Rect>) {
        self.restoring_divider_rects = rects;
    }
}

//! Tile layout: the main app windows of a display are laid out side by
//! side in a FIFO queue sized by how many minimum-width windows fit.

use tracing::{debug, error, info};

use super::LayoutPolicy;
use crate::common::collections::{BTreeMap, VecDeque};
use crate::common::config::{Config, TileSettings};
use crate::layout_engine::base::{self, PolicyBase, update_floating_layout_rect};
use crate::layout_engine::{LayoutContext, LayoutMode};
use crate::model::minimize::MinimizeReason;
use crate::model::tree::{NodeId, RootType};
use crate::model::window_node::{WindowFlags, WindowMode};
use crate::sys::display::{DisplayGroupInfo, DisplayId};
use crate::sys::geometry::{Rect, scale};

#[derive(Debug, Clone)]
pub struct TilePolicy {
    base: PolicyBase,
    tile: TileSettings,
    max_tile_windows: BTreeMap<DisplayId, usize>,
    /// Per display, level `n` holds the rects for `n + 1` tiled windows.
    preset_rects: BTreeMap<DisplayId, Vec<Vec<Rect>>>,
    foreground: BTreeMap<DisplayId, VecDeque<NodeId>>,
}

impl TilePolicy {
    pub fn new(config: &Config, displays: &DisplayGroupInfo) -> Self {
        TilePolicy {
            base: PolicyBase::new(config.layout.clone(), displays),
            tile: config.tile.clone(),
            max_tile_windows: displays.display_ids().map(|id| (id, 1)).collect(),
            preset_rects: BTreeMap::new(),
            foreground: BTreeMap::new(),
        }
    }

    pub fn max_tile_windows(&self, display: DisplayId) -> usize {
        self.max_tile_windows.get(&display).copied().unwrap_or(0)
    }

    pub fn preset_rects(&self, display: DisplayId, count: usize) -> &[Rect] {
        count
            .checked_sub(1)
            .and_then(|level| self.preset_rects.get(&display)?.get(level))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tiled windows of `display`, oldest first.
    pub fn foreground(&self, display: DisplayId) -> Vec<NodeId> {
        self.foreground.get(&display).map(|q| q.iter().copied().collect()).unwrap_or_default()
    }

    fn init_all_rects(&mut self, ctx: &mut LayoutContext<'_>) {
        self.base.reset_display_group_limit_rect();
        for (display, rect) in ctx.displays.all_display_rects() {
            self.base.set_limit_rect(display, rect);
            let above = ctx.bucket(display, RootType::Above);
            base::layout_window_nodes(self, ctx, above);
            self.init_tile_window_rects(ctx, display);
        }
    }

    fn compute_max_tile_windows(&self, ctx: &LayoutContext<'_>, display: DisplayId) -> usize {
        let vpr = ctx.virtual_pixel_ratio(display);
        let edge = scale(self.tile.edge_interval * 2, vpr) as i64;
        let mid = scale(self.tile.mid_interval, vpr) as i64;
        let min_width = scale(self.base.settings.min_floating_width, vpr) as i64;
        let drawable = self.base.limit_rect(display).width as i64 - edge + mid;
        if drawable <= 0 || min_width + mid == 0 {
            return 0;
        }
        (drawable / (min_width + mid)) as usize
    }

    fn init_tile_window_rects(&mut self, ctx: &LayoutContext<'_>, display_id: DisplayId) {
        let vpr = ctx.virtual_pixel_ratio(display_id);
        let edge = scale(self.tile.edge_interval, vpr);
        let mid = scale(self.tile.mid_interval, vpr);
        let ratio = self.base.settings.cascade_aspect_ratio;
        let limit = self.base.limit_rect(display_id);
        let display_rect = ctx.displays.display_rect(display_id);

        let max = self.compute_max_tile_windows(ctx, display_id);
        self.max_tile_windows.insert(display_id, max);
        info!(display = %display_id, max, "max tile windows");

        let width = ((display_rect.width as f32 * ratio) as u32).min(limit.width);
        let height = ((display_rect.height as f32 * ratio) as u32).min(limit.height);
        let x = limit.x + ((limit.width - width) / 2) as i32;
        let y = limit.y + ((limit.height - height) / 2) as i32;

        let mut levels = vec![vec![Rect::new(x, y, width, height)]];
        for num in 2..=max as u32 {
            let width = limit.width.saturating_sub(edge * 2 + mid * (num - 1)) / num;
            let level = (0..num)
                .map(|i| Rect::new(limit.x + (edge + i * (width + mid)) as i32, y, width, height))
                .collect();
            levels.push(level);
        }
        debug!(display = %display_id, ?levels, "preset tile rects");
        self.preset_rects.insert(display_id, levels);
    }

    fn init_foreground_node_queue(&mut self, ctx: &mut LayoutContext<'_>) {
        for display in ctx.displays.display_ids().collect::<Vec<_>>() {
            self.foreground.entry(display).or_default().clear();
            for &id in ctx.bucket(display, RootType::App) {
                if ctx.tree.get(id).is_some_and(|n| n.window_type.is_main_window()) {
                    self.foreground_push_back(ctx, id, display);
                }
            }
        }
    }

    fn foreground_push_back(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId, display_id: DisplayId) {
        let max = self.max_tile_windows(display_id);
        let queue = self.foreground.entry(display_id).or_default();
        if queue.contains(&id) {
            return;
        }
        let node = &ctx.tree[id];
        if !node.mode_support.supports(WindowMode::Floating) {
            debug!(window = %node.id, "cannot float, not tiled");
            ctx.minimize.add_candidate(node.id, MinimizeReason::LayoutTile);
            return;
        }
        info!(display = %display_id, window = %node.id, "tile window");
        // A display too narrow for any tile (max == 0) still keeps the
        // newest window, so the queue can hold one more than `max`.
        while !queue.is_empty() && queue.len() >= max {
            let Some(evicted) = queue.pop_front() else { break };
            if let Some(window) = ctx.tree.window_id(evicted) {
                info!(%window, "evicted from tile queue");
                ctx.minimize.add_candidate(window, MinimizeReason::LayoutTile);
            }
        }
        queue.push_back(id);
    }

    fn foreground_remove(&mut self, display: DisplayId, id: NodeId) {
        if let Some(queue) = self.foreground.get_mut(&display) {
            queue.retain(|n| *n != id);
        }
    }

    /// Hands the preset rects of the current queue length to the queued
    /// windows. A window that cannot take its rect is minimized, and if the
    /// queue was full the latest tile-minimized window is brought back in.
    fn assign_node_property_for_tile_windows(&mut self, ctx: &mut LayoutContext<'_>, display_id: DisplayId) {
        let max = self.max_tile_windows(display_id);
        let queue: Vec<NodeId> = self.foreground(display_id);
        let num = queue.len();
        let presets = self.preset_rects(display_id, num).to_vec();
        if num == 0 || num > max || presets.len() != num {
            error!(display = %display_id, num, max, "invalid tile queue");
            return;
        }
        let mut rects = presets.into_iter();
        let mut minimized = Vec::new();
        let mut recovered = Vec::new();
        let mut next = rects.next();
        for id in queue {
            let Some(node) = ctx.tree.get_mut(id) else { continue };
            let fits = next.is_some_and(|rect| {
                node.mode_support.supports(WindowMode::Floating)
                    && node.updated_size_limits.is_satisfied_by(&rect)
            });
            match next {
                Some(rect) if fits => {
                    node.set_mode(WindowMode::Floating);
                    ctx.client.update_window_mode(node.id, WindowMode::Floating);
                    node.request_rect = rect;
                    node.deco_applied = true;
                    debug!(window = %node.id, ?rect, "tile rect");
                    next = rects.next();
                }
                _ => {
                    if num == max {
                        if let Some(window) = ctx.minimize.recover_candidate() {
                            recovered.push(window);
                        }
                    }
                    minimized.push(id);
                    ctx.minimize.add_candidate(node.id, MinimizeReason::LayoutTile);
                }
            }
        }
        let queue = self.foreground.entry(display_id).or_default();
        queue.retain(|n| !minimized.contains(n));
        queue.extend(recovered.into_iter().filter_map(|window| ctx.tree.find(window)));
    }

    fn layout_foreground_node_queue(&mut self, ctx: &mut LayoutContext<'_>, display: DisplayId) {
        for id in self.foreground(display) {
            let Some(node) = ctx.tree.get_mut(id) else { continue };
            let rect = node.request_rect;
            node.window_rect = rect;
            self.base.calc_and_set_node_hot_zone(ctx, id, rect);
            let node = &ctx.tree[id];
            ctx.client.update_window_rect(node.id, rect, node.deco_applied, node.size_change_reason);
            for child in node.children().to_vec() {
                self.layout_window_node(ctx, child);
            }
        }
    }
}

impl LayoutPolicy for TilePolicy {
    fn base(&self) -> &PolicyBase { &self.base }

    fn base_mut(&mut self) -> &mut PolicyBase { &mut self.base }

    fn mode(&self) -> LayoutMode { LayoutMode::Tile }

    fn launch(&mut self, ctx: &mut LayoutContext<'_>) {
        self.init_all_rects(ctx);
        self.init_foreground_node_queue(ctx);
        for display in ctx.displays.display_ids().collect::<Vec<_>>() {
            self.assign_node_property_for_tile_windows(ctx, display);
            self.layout_foreground_node_queue(ctx, display);
            let below = ctx.bucket(display, RootType::Below);
            base::layout_window_nodes(self, ctx, below);
        }
        info!("tile layout launched");
    }

    fn add_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let node = &ctx.tree[id];
        if node.window_type.is_main_window() {
            let display = node.display_id;
            self.foreground_push_back(ctx, id, display);
            self.assign_node_property_for_tile_windows(ctx, display);
            self.layout_foreground_node_queue(ctx, display);
        } else {
            self.update_window_node(ctx, id, true);
        }
    }

    fn update_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId, _is_add: bool) {
        base::update_window_node(self, ctx, id);
        let node = &ctx.tree[id];
        if node.window_type.is_avoid_type() {
            let display = node.display_id;
            self.init_tile_window_rects(ctx, display);
            self.assign_node_property_for_tile_windows(ctx, display);
            self.layout_foreground_node_queue(ctx, display);
        }
    }

    fn remove_window_node(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let node = &ctx.tree[id];
        let display_id = node.display_id;
        info!(window = %node.id, "remove from tile layout");
        if node.window_type.is_avoid_type() {
            self.layout_window_tree(ctx, display_id);
        } else {
            self.foreground_remove(display_id, id);
            self.assign_node_property_for_tile_windows(ctx, display_id);
            self.layout_foreground_node_queue(ctx, display_id);
        }
        base::notify_hidden(ctx, id);
    }

    fn update_layout_rect(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        self.base.update_window_size_limits(ctx, id);
        let node = &ctx.tree[id];
        let display = node.display_id;
        let need_avoid = node.flags.contains(WindowFlags::NEED_AVOID);
        let parent_limit = node.flags.contains(WindowFlags::PARENT_LIMIT);
        let sub_window = node.window_type.is_sub_window() || node.window_type.is_system_sub_window();
        let floating = node.mode == WindowMode::Floating;

        let mut limit_rect = ctx.displays.display_rect(display);
        self.base.compute_decorated_request_rect(ctx, id);
        let mut win_rect = ctx.tree[id].request_rect;
        if need_avoid {
            limit_rect = self.base.limit_rect(display);
        }
        if !floating {
            win_rect = limit_rect;
        } else if sub_window && parent_limit {
            if let Some(parent) = ctx.tree.parent_node(id) {
                update_floating_layout_rect(ctx.tree[parent].window_rect, &mut win_rect);
            }
        }
        let node = &ctx.tree[id];
        self.base.limit_floating_window_size(node, &mut win_rect);
        self.base.limit_main_floating_window_position(ctx, node, &mut win_rect);

        ctx.tree[id].window_rect = win_rect;
        self.base.calc_and_set_node_hot_zone(ctx, id, win_rect);
        PolicyBase::update_client_rect_and_reset_reason(ctx, id, win_rect);
    }

    /// Whether a main window would fit the rect it would get if tiled now.
    fn is_tile_rect_satisfied_with_size_limits(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) -> bool {
        let node = &ctx.tree[id];
        if !node.window_type.is_main_window() {
            return true;
        }
        let display_id = node.display_id;
        let max = self.max_tile_windows(display_id);
        let queue = self.foreground(display_id);
        let num = queue.len();
        if num > max || max == 0 {
            return false;
        }
        self.base.update_window_size_limits(ctx, id);
        if queue.contains(&id) {
            return true;
        }
        let level = if num == max { num } else { num + 1 };
        let Some(tile_rect) = self.preset_rects(display_id, level).first().copied() else {
            return false;
        };
        debug!(window = %ctx.tree[id].id, ?tile_rect, "tile rect check");
        ctx.tree[id].updated_size_limits.is_satisfied_by(&tile_rect)
    }
}

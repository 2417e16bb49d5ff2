//! Geometry shared by both layout policies: limit rects, size limits,
//! decoration, hot zones, floating clamps and the display-change replay.

use tracing::{debug, error, warn};

use super::LayoutContext;
use super::systems::LayoutPolicy;
use crate::common::collections::BTreeMap;
use crate::common::config::LayoutSettings;
use crate::model::tree::{NodeId, RootType, WindowTree};
use crate::model::window_node::{
    DragType, SizeLimits, WindowMode, WindowNode, WindowSizeChangeReason, WindowType,
};
use crate::sys::display::{DisplayGroupInfo, DisplayId};
use crate::sys::geometry::{Rect, RectExt, scale};

/// Where the launcher dock sits on its display, if it is docked to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockShowState {
    NotShown,
    Bottom,
    Left,
    Right,
}

/// Which display edge an avoid-type window is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidPosType {
    Unknown,
    Top,
    Bottom,
    Left,
    Right,
}

impl AvoidPosType {
    pub fn of(rect: Rect, display_rect: Rect) -> Self {
        if rect.width == display_rect.width {
            if rect.y == display_rect.y { AvoidPosType::Top } else { AvoidPosType::Bottom }
        } else if rect.height == display_rect.height {
            if rect.x == display_rect.x { AvoidPosType::Left } else { AvoidPosType::Right }
        } else {
            AvoidPosType::Unknown
        }
    }
}

/// State and helpers common to every policy.
#[derive(Debug, Clone)]
pub struct PolicyBase {
    pub(crate) settings: LayoutSettings,
    limit_rects: BTreeMap<DisplayId, Rect>,
    display_group_rect: Rect,
    display_group_limit_rect: Rect,
    is_multi_display: bool,
}

impl PolicyBase {
    pub fn new(settings: LayoutSettings, displays: &DisplayGroupInfo) -> Self {
        let group_rect = displays.group_rect();
        PolicyBase {
            settings,
            limit_rects: displays.all_display_rects(),
            display_group_rect: group_rect,
            display_group_limit_rect: group_rect,
            is_multi_display: displays.is_multi_display(),
        }
    }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    pub fn limit_rect(&self, display: DisplayId) -> Rect {
        self.limit_rects.get(&display).copied().unwrap_or_default()
    }

    pub(crate) fn set_limit_rect(&mut self, display: DisplayId, rect: Rect) {
        self.limit_rects.insert(display, rect);
    }

    pub fn display_group_rect(&self) -> Rect { self.display_group_rect }

    pub fn display_group_limit_rect(&self) -> Rect { self.display_group_limit_rect }

    pub(crate) fn reset_display_group_limit_rect(&mut self) {
        self.display_group_limit_rect = self.display_group_rect;
    }

    pub fn is_multi_display(&self) -> bool { self.is_multi_display }

    pub fn title_bar_height(&self, vpr: f32) -> u32 { scale(self.settings.title_bar_height, vpr) }

    pub(crate) fn update_display_group_rect(&mut self, displays: &DisplayGroupInfo) {
        self.display_group_rect = displays.group_rect();
        debug!(rect = ?self.display_group_rect, "display group rect");
    }

    /// Union of every display's limit rect.
    pub(crate) fn update_display_group_limit_rect(&mut self) {
        let mut rects = self.limit_rects.values();
        let Some(first) = rects.next() else { return };
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.right(), first.bottom());
        for rect in rects {
            min_x = min_x.min(rect.x);
            min_y = min_y.min(rect.y);
            max_x = max_x.max(rect.right());
            max_y = max_y.max(rect.bottom());
        }
        self.display_group_limit_rect =
            Rect::new(min_x, min_y, (max_x - min_x) as u32, (max_y - min_y) as u32);
        debug!(rect = ?self.display_group_limit_rect, "display group limit rect");
    }

    pub(crate) fn update_multi_display_flag(&mut self, displays: &DisplayGroupInfo) {
        self.is_multi_display = displays.is_multi_display();
        self.limit_rects.retain(|id, _| displays.contains(*id));
    }

    /// Shrinks the limit rect of the node's display by the area an avoid-type
    /// window covers on its edge.
    pub(crate) fn update_limit_rect(&mut self, displays: &DisplayGroupInfo, node: &WindowNode) {
        let limit = self.limit_rects.entry(node.display_id).or_default();
        let layout = node.window_rect;
        let mut limit_h = limit.height as i32;
        let mut limit_w = limit.width as i32;
        if node.window_type.is_avoid_type() {
            let pos = if displays.contains(node.display_id) {
                AvoidPosType::of(layout, displays.display_rect(node.display_id))
            } else {
                AvoidPosType::Unknown
            };
            match pos {
                AvoidPosType::Top => {
                    let offset = layout.bottom() - limit.y;
                    limit.y += offset;
                    limit_h -= offset;
                }
                AvoidPosType::Bottom => limit_h -= limit.y + limit_h - layout.y,
                AvoidPosType::Left => {
                    let offset = layout.right() - limit.x;
                    limit.x += offset;
                    limit_w -= offset;
                }
                AvoidPosType::Right => limit_w -= limit.x + limit_w - layout.x,
                AvoidPosType::Unknown => error!(window = %node.id, "invalid avoid position"),
            }
        }
        limit.height = limit_h.max(0) as u32;
        limit.width = limit_w.max(0) as u32;
        debug!(window = %node.id, limit = ?*limit, "limit rect");
    }

    pub fn system_size_limits(
        &self,
        window_type: WindowType,
        display_rect: Rect,
        vpr: f32,
    ) -> SizeLimits {
        let max = scale(self.settings.max_floating_size, vpr);
        let mut limits = SizeLimits {
            max_width: max,
            max_height: max,
            ..SizeLimits::default()
        };
        if window_type == WindowType::FloatCamera {
            // The camera float scales with the display's short side.
            let small = display_rect.width.min(display_rect.height);
            let hw_ratio = display_rect.height as f32 / display_rect.width as f32;
            let portrait = display_rect.width <= display_rect.height;
            let factor = match (small <= scale(600, vpr), portrait) {
                (true, true) => 0.3,
                (true, false) => 0.5,
                (false, true) => 0.12,
                (false, false) => 0.3,
            };
            limits.min_width = (small as f64 * factor) as u32;
            limits.min_height = (limits.min_width as f32 * hw_ratio) as u32;
        } else {
            limits.min_width = scale(self.settings.min_floating_width, vpr);
            limits.min_height = scale(self.settings.min_floating_height, vpr);
        }
        limits
    }

    /// Intersects the node's customized limits with the system limits and
    /// stores the result as the node's effective limits.
    pub fn update_window_size_limits(&self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let node = &ctx.tree[id];
        let display_rect = ctx.displays.display_rect(node.display_id);
        let vpr = ctx.virtual_pixel_ratio(node.display_id);
        let system = self.system_size_limits(node.window_type, display_rect, vpr);
        let custom = node.size_limits;

        let mut limits = system;
        let max_w = scale(custom.max_width, vpr);
        let max_h = scale(custom.max_height, vpr);
        let min_w = scale(custom.min_width, vpr);
        let min_h = scale(custom.min_height, vpr);
        if (system.min_width..=system.max_width).contains(&max_w) {
            limits.max_width = max_w;
        }
        if (system.min_height..=system.max_height).contains(&max_h) {
            limits.max_height = max_h;
        }
        if (system.min_width..=limits.max_width).contains(&min_w) {
            limits.min_width = min_w;
        }
        if (system.min_height..=limits.max_height).contains(&min_h) {
            limits.min_height = min_h;
        }

        limits.max_ratio = limits.max_width as f32 / limits.min_height as f32;
        limits.min_ratio = limits.min_width as f32 / limits.max_height as f32;
        if limits.min_ratio <= custom.max_ratio && custom.max_ratio <= limits.max_ratio {
            limits.max_ratio = custom.max_ratio;
        }
        if limits.min_ratio <= custom.min_ratio && custom.min_ratio <= limits.max_ratio {
            limits.min_ratio = custom.min_ratio;
        }

        limits.max_width = limits.max_width.min((limits.max_height as f32 * limits.max_ratio) as u32);
        limits.min_width = limits.min_width.max((limits.min_height as f32 * limits.min_ratio) as u32);
        limits.max_height = limits.max_height.min((limits.max_width as f32 / limits.min_ratio) as u32);
        limits.min_height = limits.min_height.max((limits.min_width as f32 / limits.max_ratio) as u32);

        debug!(window = %node.id, ?limits, "updated size limits");
        ctx.tree[id].updated_size_limits = limits;
    }

    /// Adds frame and title bar to the request rect, once.
    pub fn compute_decorated_request_rect(&self, ctx: &mut LayoutContext<'_>, id: NodeId) {
        let vpr = ctx.displays.virtual_pixel_ratio(ctx.tree[id].display_id);
        let node = &mut ctx.tree[id];
        if !node.decor_enable
            || node.deco_applied
            || node.size_change_reason == WindowSizeChangeReason::Move
        {
            return;
        }
        let frame = scale(self.settings.frame_width, vpr);
        let title = self.title_bar_height(vpr);
        node.request_rect.width += frame * 2;
        node.request_rect.height += title + frame;
        node.deco_applied = true;
    }

    fn entire_window_hot_zone(
        &self,
        displays: &DisplayGroupInfo,
        node: &WindowNode,
        win_rect: Rect,
        hot_zone: u32,
        vpr: f32,
    ) -> Rect {
        let zone = scale(hot_zone, vpr) as i32;
        match node.window_type {
            WindowType::DockSlice if win_rect.width < win_rect.height => win_rect.inflate(zone, 0),
            WindowType::DockSlice => win_rect.inflate(0, zone),
            WindowType::LauncherRecent => displays.display_rect(node.display_id),
            _ if node.is_main_floating() => win_rect.inflate(zone, zone),
            _ => win_rect,
        }
    }

    pub fn calc_and_set_node_hot_zone(&self, ctx: &mut LayoutContext<'_>, id: NodeId, win_rect: Rect) {
        let node = &ctx.tree[id];
        let vpr = ctx.displays.virtual_pixel_ratio(node.display_id);
        let touch =
            self.entire_window_hot_zone(ctx.displays, node, win_rect, self.settings.hotzone_touch, vpr);
        let pointer =
            self.entire_window_hot_zone(ctx.displays, node, win_rect, self.settings.hotzone_pointer, vpr);
        let (touch_areas, pointer_areas) = if node.requested_hot_areas.is_empty() {
            (vec![touch], vec![pointer])
        } else {
            let areas = touch_hot_areas(win_rect, &node.requested_hot_areas);
            if areas.len() != node.requested_hot_areas.len() {
                warn!(window = %node.id, "some requested hot areas are out of range");
            }
            (areas.clone(), areas)
        };
        let node = &mut ctx.tree[id];
        node.touch_hot_area = touch;
        node.pointer_hot_area = pointer;
        node.touch_hot_areas = touch_areas;
        node.pointer_hot_areas = pointer_areas;
    }

    pub fn dock_show_state(&self, ctx: &LayoutContext<'_>, display: DisplayId) -> (DockShowState, Rect) {
        let display_rect = ctx.displays.display_rect(display);
        for id in ctx.bucket(display, RootType::Above) {
            let Some(node) = ctx.tree.get(*id) else { continue };
            if node.window_type != WindowType::LauncherDock {
                continue;
            }
            let dock = node.window_rect;
            let state = if dock.height < dock.width {
                if dock.bottom() == display_rect.height as i32 {
                    DockShowState::Bottom
                } else {
                    DockShowState::NotShown
                }
            } else if dock.x == 0 {
                DockShowState::Left
            } else if dock.right() == display_rect.width as i32 {
                DockShowState::Right
            } else {
                DockShowState::NotShown
            };
            return (state, dock);
        }
        (DockShowState::NotShown, Rect::default())
    }

    /// Clamps a floating window's size to its limits. A drag that moved the
    /// left or top edge keeps the opposite edge fixed.
    pub fn limit_floating_window_size(&self, node: &WindowNode, win_rect: &mut Rect) {
        if node.mode != WindowMode::Floating || node.window_type == WindowType::AppComponent {
            return;
        }
        let ori = *win_rect;
        update_floating_window_size_by_size_limits(node, win_rect);
        if node.stretchable && node.is_main_floating() {
            update_floating_window_size_for_stretchable_window(node, win_rect);
        }
        let last = node.window_rect;
        if node.size_change_reason == WindowSizeChangeReason::Drag {
            if ori.x != last.x {
                win_rect.x = ori.right() - win_rect.width as i32;
            }
            if ori.y != last.y {
                win_rect.y = ori.bottom() - win_rect.height as i32;
            }
        }
    }

    pub fn limit_main_floating_window_position(
        &self,
        ctx: &LayoutContext<'_>,
        node: &WindowNode,
        win_rect: &mut Rect,
    ) {
        if !node.is_main_floating() {
            return;
        }
        if node.size_change_reason == WindowSizeChangeReason::Drag {
            self.limit_window_position_when_drag(ctx, node, win_rect);
            self.fix_window_size_by_ratio_if_drag_beyond_limit_region(ctx, node, win_rect);
        } else {
            self.limit_window_position_when_init_rect_or_move(ctx, node, win_rect);
        }
    }

    /// Position bounds a dragged window's title bar must stay within.
    fn drag_bounds(&self, ctx: &LayoutContext<'_>, node: &WindowNode) -> (i32, i32, i32, i32) {
        let title = self.title_bar_height(ctx.virtual_pixel_ratio(node.display_id)) as i32;
        let limit = if self.is_multi_display {
            self.display_group_limit_rect
        } else {
            self.limit_rect(node.display_id)
        };
        let mut min_x = limit.x + title;
        let mut max_x = limit.right() - title;
        let min_y = limit.y;
        let mut max_y = limit.bottom() - title;
        let (dock_state, dock) = self.dock_show_state(ctx, node.display_id);
        match dock_state {
            DockShowState::Bottom => max_y = dock.y - title,
            DockShowState::Left => min_x = dock.right() + title,
            DockShowState::Right => max_x = dock.x - title,
            DockShowState::NotShown => {}
        }
        (min_x, max_x, min_y, max_y)
    }

    fn limit_window_position_when_drag(
        &self,
        ctx: &LayoutContext<'_>,
        node: &WindowNode,
        win_rect: &mut Rect,
    ) {
        let last = node.window_rect;
        let ori = *win_rect;
        let (min_x, max_x, min_y, max_y) = self.drag_bounds(ctx, node);

        // min_x bounds the right edge, not the origin.
        if ori.right() < min_x && ori.width != last.width {
            win_rect.width = (min_x - ori.x) as u32;
        }
        if ori.x > max_x {
            win_rect.x = max_x;
            if ori.width != last.width {
                win_rect.width = (ori.right() - win_rect.x) as u32;
            }
        }
        if ori.y < min_y {
            win_rect.y = min_y;
            if ori.height != last.height {
                win_rect.height = (ori.bottom() - win_rect.y) as u32;
            }
        }
        if win_rect.y > max_y {
            win_rect.y = max_y;
            if ori.height != last.height {
                win_rect.height = (ori.bottom() - win_rect.y).max(0) as u32;
            }
        }
        debug!(window = %node.id, rect = ?*win_rect, "limited by drag position");
    }

    fn fix_window_size_by_ratio_if_drag_beyond_limit_region(
        &self,
        ctx: &LayoutContext<'_>,
        node: &WindowNode,
        win_rect: &mut Rect,
    ) {
        let limits = node.updated_size_limits;
        if limits.is_fixed() || win_rect.height == 0 {
            return;
        }
        let cur_ratio = win_rect.width as f32 / win_rect.height as f32;
        if limits.min_ratio <= cur_ratio && cur_ratio <= limits.max_ratio {
            return;
        }
        let (min_x, max_x, min_y, max_y) = self.drag_bounds(ctx, node);
        let new_ratio = if cur_ratio < limits.min_ratio { limits.min_ratio } else { limits.max_ratio };
        let fixed_width = limits.max_width == limits.min_width;
        let fixed_height = limits.max_height == limits.min_height;
        if (win_rect.right() == min_x || win_rect.x == max_x) && !fixed_height {
            win_rect.height = (win_rect.width as f32 / new_ratio) as u32;
        }
        if (win_rect.y == min_y || win_rect.y == max_y) && !fixed_width {
            win_rect.width = (win_rect.height as f32 * new_ratio) as u32;
        }
        debug!(window = %node.id, rect = ?*win_rect, "fixed ratio at limit region");
    }

    fn limit_window_position_when_init_rect_or_move(
        &self,
        ctx: &LayoutContext<'_>,
        node: &WindowNode,
        win_rect: &mut Rect,
    ) {
        let vpr = ctx.virtual_pixel_ratio(node.display_id);
        let title = self.title_bar_height(vpr) as i32;
        let limit = if node.is_showing_on_multi_displays {
            self.display_group_limit_rect
        } else {
            self.limit_rect(node.display_id)
        };
        let (dock_state, dock) = self.dock_show_state(ctx, node.display_id);
        let width = win_rect.width as i32;

        win_rect.y = win_rect.y.max(limit.y).min(limit.bottom() - title);
        if dock_state == DockShowState::Bottom {
            win_rect.y = win_rect.y.min(dock.y - title);
        }
        win_rect.x = win_rect.x.max(limit.x + title - width);
        if dock_state == DockShowState::Left {
            win_rect.x = win_rect.x.max(dock.width as i32 + title - width);
        }
        win_rect.x = win_rect.x.min(limit.right() - title);
        if dock_state == DockShowState::Right {
            win_rect.x = win_rect.x.min(dock.x - title);
        }

        let bottom_pos_y = self.settings.floating_bottom_pos_y;
        if bottom_pos_y != 0
            && node.size_change_reason == WindowSizeChangeReason::Undefined
            && win_rect.bottom() >= scale(bottom_pos_y, vpr) as i32
        {
            win_rect.y = limit.y;
        }
        debug!(window = %node.id, rect = ?*win_rect, "limited by init/move position");
    }

    /// Sends the committed rect to the client. A pending move, or any reason
    /// on the divider, survives for the next layout pass.
    pub fn update_client_rect_and_reset_reason(ctx: &mut LayoutContext<'_>, id: NodeId, rect: Rect) {
        let node = &mut ctx.tree[id];
        let reason = node.size_change_reason;
        ctx.client.update_window_rect(node.id, rect, node.deco_applied, reason);
        if reason != WindowSizeChangeReason::Move && node.window_type != WindowType::DockSlice {
            node.reset_size_change_reason();
        }
    }

    /// Pulls a request rect (and its children's) back inside the node's
    /// display, keeping the bottom-right corner on screen.
    pub(crate) fn limit_window_to_bottom_right_corner(ctx: &mut LayoutContext<'_>, id: NodeId) {
        let display_rect = ctx.displays.display_rect(ctx.tree[id].display_id);
        let node = &mut ctx.tree[id];
        let mut rect = node.request_rect;
        rect.x = rect.x.max(display_rect.x);
        rect.y = rect.y.max(display_rect.y);
        rect.width = rect.width.min(display_rect.width);
        rect.height = rect.height.min(display_rect.height);
        if rect.right() > display_rect.right() {
            rect.x = display_rect.right() - rect.width as i32;
        }
        if rect.bottom() > display_rect.bottom() {
            rect.y = display_rect.bottom() - rect.height as i32;
        }
        node.request_rect = rect;
        debug!(window = %node.id, ?rect, "limited to bottom right corner");
        for child in node.children().to_vec() {
            Self::limit_window_to_bottom_right_corner(ctx, child);
        }
    }

    pub(crate) fn update_rect_in_display_group(
        tree: &mut WindowTree,
        id: NodeId,
        ori_display_rect: Rect,
        new_display_rect: Rect,
    ) {
        let Some(node) = tree.get_mut(id) else { return };
        node.request_rect = node.request_rect.translate(
            new_display_rect.x - ori_display_rect.x,
            new_display_rect.y - ori_display_rect.y,
        );
        for child in node.children().to_vec() {
            Self::update_rect_in_display_group(tree, child, ori_display_rect, new_display_rect);
        }
    }

    pub(crate) fn update_rect_in_display_group_for_all_nodes(
        ctx: &mut LayoutContext<'_>,
        display_id: DisplayId,
        ori_display_rect: Rect,
        new_display_rect: Rect,
    ) {
        debug!(display = %display_id, ?ori_display_rect, ?new_display_rect, "translate windows in display group");
        for root in RootType::ALL {
            for &id in ctx.bucket(display_id, root) {
                let Some(node) = ctx.tree.get(id) else { continue };
                let cross = node.is_showing_on_multi_displays;
                let main_floating = node.is_main_floating();
                if !cross {
                    Self::update_rect_in_display_group(ctx.tree, id, ori_display_rect, new_display_rect);
                }
                if main_floating {
                    Self::limit_window_to_bottom_right_corner(ctx, id);
                }
            }
        }
    }
}

/// Clamps `win_rect` so it fits inside `limit_rect`.
pub fn update_floating_layout_rect(limit_rect: Rect, win_rect: &mut Rect) {
    win_rect.width = win_rect.width.min(limit_rect.width);
    win_rect.height = win_rect.height.min(limit_rect.height);
    win_rect.x = win_rect.x.max(limit_rect.x).min(limit_rect.right() - win_rect.width as i32);
    win_rect.y = win_rect.y.max(limit_rect.y).min(limit_rect.bottom() - win_rect.height as i32);
}

/// Requested hot areas are relative to the window; they are moved to the
/// window's origin and clipped to it. Areas outside the window are dropped.
fn touch_hot_areas(win_rect: Rect, requested: &[Rect]) -> Vec<Rect> {
    let mut out = Vec::with_capacity(requested.len());
    for area in requested {
        if area.x < 0 || area.y < 0 || area.has_zero_size() {
            break;
        }
        if area.x >= win_rect.width as i32 || area.y >= win_rect.height as i32 {
            continue;
        }
        let moved = area.translate(win_rect.x, win_rect.y);
        out.push(moved.intersection(&win_rect));
    }
    out
}

fn update_floating_window_size_by_size_limits(node: &WindowNode, win_rect: &mut Rect) {
    let limits = node.updated_size_limits;
    if !node.window_type.is_system_window() || node.window_type == WindowType::FloatCamera {
        win_rect.width = win_rect.width.max(limits.min_width);
        win_rect.height = win_rect.height.max(limits.min_height);
    }
    win_rect.width = win_rect.width.min(limits.max_width);
    win_rect.height = win_rect.height.min(limits.max_height);

    if limits.is_fixed() {
        win_rect.width = limits.max_width;
        win_rect.height = limits.max_height;
        return;
    }

    let cur_ratio = win_rect.width as f32 / win_rect.height as f32;
    if !node.is_main_floating() || (limits.min_ratio <= cur_ratio && cur_ratio <= limits.max_ratio) {
        return;
    }
    let new_ratio = if cur_ratio < limits.min_ratio { limits.min_ratio } else { limits.max_ratio };
    if limits.max_width == limits.min_width {
        win_rect.height = (win_rect.width as f32 / new_ratio) as u32;
    } else if limits.max_height == limits.min_height {
        win_rect.width = (win_rect.height as f32 * new_ratio) as u32;
    } else if node.drag_type == DragType::BottomOrTop {
        win_rect.width = (win_rect.height as f32 * new_ratio) as u32;
    } else {
        win_rect.height = (win_rect.width as f32 / new_ratio) as u32;
    }
}

fn update_floating_window_size_for_stretchable_window(node: &WindowNode, win_rect: &mut Rect) {
    if node.size_change_reason == WindowSizeChangeReason::Drag {
        let origin = node.origin_rect;
        if origin.has_zero_size() {
            error!(window = %node.id, "invalid origin rect");
            return;
        }
        match node.drag_type {
            DragType::BottomOrTop => {
                win_rect.width = (win_rect.height as u64 * origin.width as u64 / origin.height as u64) as u32;
            }
            DragType::LeftOrRight | DragType::LeftTopCorner | DragType::RightTopCorner => {
                win_rect.height = (win_rect.width as u64 * origin.height as u64 / origin.width as u64) as u32;
            }
            DragType::Undefined => {}
        }
    }
    let limits = node.updated_size_limits;
    let scale = (win_rect.width as f32 / limits.min_width as f32)
        .min(win_rect.height as f32 / limits.min_height as f32);
    if scale == 0.0 {
        error!(window = %node.id, "invalid size limits");
        return;
    }
    if scale < 1.0 {
        win_rect.width = (win_rect.width as f32 / scale) as u32;
        win_rect.height = (win_rect.height as f32 / scale) as u32;
    }
}

pub fn is_full_screen_recent_window_exist(tree: &WindowTree, nodes: &[NodeId]) -> bool {
    nodes.iter().filter_map(|id| tree.get(*id)).any(|node| {
        node.window_type == WindowType::LauncherRecent && node.mode == WindowMode::Fullscreen
    })
}

// Behavior shared by both policies. The trait's default methods forward
// here so a policy that overrides one of them can still run the shared
// part first.

pub(crate) fn layout_window_tree<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
    display_id: DisplayId,
) {
    let display_rect = ctx.displays.display_rect(display_id);
    policy.base_mut().set_limit_rect(display_id, display_rect);
    // Avoid-type windows live above apps and must shrink the limit rect first.
    let above = ctx.bucket(display_id, RootType::Above);
    layout_window_nodes(policy, ctx, above);
    if is_full_screen_recent_window_exist(ctx.tree, above) {
        debug!(display = %display_id, "recent window on top, skipping the rest of the tree");
        return;
    }
    let app = ctx.bucket(display_id, RootType::App);
    layout_window_nodes(policy, ctx, app);
    let below = ctx.bucket(display_id, RootType::Below);
    layout_window_nodes(policy, ctx, below);
}

pub(crate) fn layout_window_nodes<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
    nodes: &[NodeId],
) {
    for &id in nodes {
        policy.layout_window_node(ctx, id);
    }
}

pub(crate) fn layout_window_node<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
) {
    let Some(node) = ctx.tree.get(id) else { return };
    if node.parent().is_some() {
        if !node.current_visibility {
            debug!(window = %node.id, "not visible, skipping layout");
            return;
        }
        policy.update_layout_rect(ctx, id);
        if ctx.tree[id].window_type.is_avoid_type() {
            policy.update_limit_rects_for_avoid_node(ctx, id);
        }
    }
    for child in ctx.tree[id].children().to_vec() {
        policy.layout_window_node(ctx, child);
    }
}

pub(crate) fn update_window_node<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
) {
    let Some(node) = ctx.tree.get(id) else { return };
    let display = node.display_id;
    if node.window_type.is_avoid_type() || node.window_type == WindowType::DockSlice {
        policy.layout_window_tree(ctx, display);
    } else {
        policy.layout_window_node(ctx, id);
    }
}

pub(crate) fn remove_window_node<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
) {
    let Some(node) = ctx.tree.get(id) else { return };
    let display = node.display_id;
    if node.window_type.is_avoid_type() || node.window_type == WindowType::DockSlice {
        policy.layout_window_tree(ctx, display);
    }
    notify_hidden(ctx, id);
}

pub(crate) fn notify_hidden(ctx: &mut LayoutContext<'_>, id: NodeId) {
    let node = &ctx.tree[id];
    ctx.client.update_window_rect(
        node.id,
        node.request_rect,
        node.deco_applied,
        WindowSizeChangeReason::Hide,
    );
}

/// Checks that the new display map matches the registry for the given
/// change, translates every window by its display's movement, stores the new
/// rects and relaunches the policy.
pub(crate) fn process_display_change<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
    display_id: DisplayId,
    display_rects: &BTreeMap<DisplayId, Rect>,
    change: DisplayRectChange,
) -> bool {
    let ori = ctx.displays.all_display_rects();
    let known = ori.contains_key(&display_id);
    let expect_known = change != DisplayRectChange::Destroy;
    if known != expect_known || display_rects.len() != ori.len() {
        error!(display = %display_id, ?change, "display map does not match the registry");
        return false;
    }
    let (from, to) = match change {
        DisplayRectChange::Destroy => (&ori, display_rects),
        _ => (display_rects, &ori),
    };
    for id in from.keys() {
        if !to.contains_key(id) && *id != display_id {
            error!(display = %display_id, wrong = %id, "unexpected display in map");
            return false;
        }
    }
    for (id, rect) in display_rects {
        ctx.displays.set_display_rect(*id, *rect);
    }
    for (id, new_rect) in display_rects {
        if let Some(ori_rect) = ori.get(id) {
            PolicyBase::update_rect_in_display_group_for_all_nodes(ctx, *id, *ori_rect, *new_rect);
        }
    }
    post_process_when_display_change(policy, ctx);
    debug!(display = %display_id, ?change, "processed display change");
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisplayRectChange {
    Create,
    Destroy,
    SizeChangeOrRotation,
}

fn post_process_when_display_change<P: LayoutPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut LayoutContext<'_>,
) {
    let base = policy.base_mut();
    base.update_multi_display_flag(ctx.displays);
    base.update_display_group_rect(ctx.displays);
    policy.launch(ctx);
}

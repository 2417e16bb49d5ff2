use std::fmt;

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use super::tree::{NodeId, Parent};
use crate::common::collections::BTreeSet;
use crate::sys::display::DisplayId;
use crate::sys::geometry::Rect;

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    strum::EnumIter,
    strum::IntoStaticStr
)]
#[repr(u32)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    AppMain = 1,
    Media = 1000,
    AppSub = 1001,
    AppComponent = 1002,
    AppLaunching = 2000,
    DockSlice = 2001,
    IncomingCall = 2002,
    SearchingBar = 2003,
    SystemAlarm = 2004,
    InputMethodFloat = 2005,
    Float = 2006,
    Toast = 2007,
    StatusBar = 2008,
    Panel = 2009,
    Keyguard = 2010,
    VolumeOverlay = 2011,
    NavigationBar = 2012,
    Dragging = 2013,
    Pointer = 2014,
    LauncherRecent = 2015,
    LauncherDock = 2016,
    BootAnimation = 2017,
    FreezeDisplay = 2018,
    FloatCamera = 2019,
    Placeholder = 2020,
    Dialog = 2021,
    Wallpaper = 3000,
    Desktop = 3001,
    SystemSub = 4000,
}

impl WindowType {
    pub fn is_main_window(self) -> bool { self == WindowType::AppMain }

    /// Application-owned sub-windows. They must be parented onto a main window.
    pub fn is_sub_window(self) -> bool {
        matches!(self, WindowType::Media | WindowType::AppSub)
    }

    pub fn is_system_sub_window(self) -> bool { self == WindowType::SystemSub }

    pub fn is_app_window(self) -> bool {
        self.is_main_window() || self.is_sub_window() || self == WindowType::AppComponent
    }

    pub fn is_below_system_window(self) -> bool {
        matches!(self, WindowType::Wallpaper | WindowType::Desktop)
    }

    pub fn is_above_system_window(self) -> bool {
        let raw: u32 = self.into();
        (2000..3000).contains(&raw)
    }

    pub fn is_system_window(self) -> bool {
        self.is_below_system_window()
            || self.is_above_system_window()
            || self.is_system_sub_window()
    }

    pub fn is_system_bar(self) -> bool {
        matches!(self, WindowType::StatusBar | WindowType::NavigationBar)
    }

    /// Windows whose rect is carved out of the limit rect of every other
    /// window on the same display.
    pub fn is_avoid_type(self) -> bool { self.is_system_bar() }

    /// Parent-less sub-window types that attach under a system window.
    pub fn requires_system_parent(self) -> bool {
        self.is_system_sub_window() || self == WindowType::AppComponent
    }

    /// Types that must never act as the parent of another sub-window.
    pub fn is_sub_like(self) -> bool {
        self.is_sub_window()
            || self.is_system_sub_window()
            || matches!(self, WindowType::AppComponent | WindowType::Dialog)
    }

    /// Coarse stacking key. Siblings are sorted by it; negative values stack
    /// below their parent.
    pub fn priority(self) -> i32 {
        use WindowType::*;
        match self {
            AppMain | AppComponent | DockSlice | Placeholder => 0,
            Media => -1,
            AppSub | Dialog | SystemSub => 1,
            Wallpaper => 0,
            Desktop => 1,
            AppLaunching => 101,
            LauncherRecent => 102,
            LauncherDock => 103,
            IncomingCall => 104,
            SearchingBar => 105,
            Toast => 106,
            Float => 107,
            FloatCamera => 108,
            InputMethodFloat => 109,
            Keyguard => 110,
            StatusBar => 115,
            Panel => 116,
            VolumeOverlay => 117,
            NavigationBar => 118,
            SystemAlarm => 119,
            Dragging => 120,
            Pointer => 121,
            BootAnimation => 122,
            FreezeDisplay => 123,
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    #[default]
    Fullscreen,
    Floating,
    SplitPrimary,
    SplitSecondary,
    Pip,
}

impl WindowMode {
    pub fn is_split(self) -> bool {
        matches!(self, WindowMode::SplitPrimary | WindowMode::SplitSecondary)
    }

    pub fn is_floating(self) -> bool { self == WindowMode::Floating }

    pub fn is_fullscreen(self) -> bool { self == WindowMode::Fullscreen }

    /// The other side of a split, `None` for non-split modes.
    pub fn opposite_split(self) -> Option<WindowMode> {
        match self {
            WindowMode::SplitPrimary => Some(WindowMode::SplitSecondary),
            WindowMode::SplitSecondary => Some(WindowMode::SplitPrimary),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        const NEED_AVOID        = 1 << 0;
        const PARENT_LIMIT      = 1 << 1;
        const SHOW_WHEN_LOCKED  = 1 << 2;
        const FORBID_SPLIT_MOVE = 1 << 3;
        const WATER_MARK        = 1 << 4;
    }
}

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ModeSupport: u32 {
        const FULLSCREEN      = 1 << 0;
        const FLOATING        = 1 << 1;
        const SPLIT_PRIMARY   = 1 << 2;
        const SPLIT_SECONDARY = 1 << 3;
        const PIP             = 1 << 4;

        const SPLIT = Self::SPLIT_PRIMARY.bits() | Self::SPLIT_SECONDARY.bits();
        const ALL = Self::FULLSCREEN.bits()
            | Self::FLOATING.bits()
            | Self::SPLIT_PRIMARY.bits()
            | Self::SPLIT_SECONDARY.bits()
            | Self::PIP.bits();
    }
}

impl Default for ModeSupport {
    fn default() -> Self { ModeSupport::ALL }
}

impl ModeSupport {
    pub fn supports(self, mode: WindowMode) -> bool {
        let needed = match mode {
            WindowMode::Fullscreen => ModeSupport::FULLSCREEN,
            WindowMode::Floating => ModeSupport::FLOATING,
            WindowMode::SplitPrimary => ModeSupport::SPLIT_PRIMARY,
            WindowMode::SplitSecondary => ModeSupport::SPLIT_SECONDARY,
            WindowMode::Pip => ModeSupport::PIP,
        };
        self.contains(needed)
    }
}

bitflags! {
    /// Compositor surfaces backing a window.
    #[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SurfaceKinds: u8 {
        const LEASH    = 1 << 0;
        const MAIN     = 1 << 1;
        const STARTING = 1 << 2;
    }
}

impl Default for SurfaceKinds {
    fn default() -> Self { SurfaceKinds::MAIN }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Leash,
    Main,
    Starting,
}

impl SurfaceKinds {
    /// Present surfaces, bottom-most first.
    pub fn ordered(self) -> impl Iterator<Item = SurfaceKind> {
        [
            (SurfaceKinds::LEASH, SurfaceKind::Leash),
            (SurfaceKinds::MAIN, SurfaceKind::Main),
            (SurfaceKinds::STARTING, SurfaceKind::Starting),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, kind)| kind)
    }
}

/// Size and aspect-ratio bounds for floating windows.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_ratio: f32,
    pub min_ratio: f32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        SizeLimits {
            max_width: u32::MAX,
            max_height: u32::MAX,
            min_width: 0,
            min_height: 0,
            max_ratio: f32::MAX,
            min_ratio: 0.0,
        }
    }
}

impl SizeLimits {
    pub fn is_fixed(&self) -> bool {
        self.max_width == self.min_width && self.max_height == self.min_height
    }

    pub fn is_satisfied_by(&self, rect: &Rect) -> bool {
        if rect.height == 0 {
            return false;
        }
        let ratio = rect.width as f32 / rect.height as f32;
        (self.min_width..=self.max_width).contains(&rect.width)
            && (self.min_height..=self.max_height).contains(&rect.height)
            && self.min_ratio <= ratio
            && ratio <= self.max_ratio
    }
}

/// Reason attached to a rect sent to the client; drives animation choice
/// on the client side.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowSizeChangeReason {
    #[default]
    Undefined,
    Maximize,
    Recover,
    Rotation,
    Drag,
    DragStart,
    DragEnd,
    Resize,
    Move,
    Hide,
    Transform,
}

/// What changed on a window already in the tree.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WindowUpdateReason {
    All,
    Mode,
    Rect,
    Flags,
    Type,
    OtherProps,
    Transform,
}

impl WindowUpdateReason {
    /// Changes that force tile layout back to cascade when they hit a main
    /// window.
    pub fn needs_cascade_switch(self) -> bool {
        matches!(
            self,
            WindowUpdateReason::All
                | WindowUpdateReason::Mode
                | WindowUpdateReason::Rect
                | WindowUpdateReason::Flags
                | WindowUpdateReason::Type
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DragType {
    #[default]
    Undefined,
    BottomOrTop,
    LeftOrRight,
    LeftTopCorner,
    RightTopCorner,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WindowNode {
    pub id: WindowId,
    pub name: String,
    pub window_type: WindowType,
    pub mode: WindowMode,
    pub last_mode: WindowMode,
    pub display_id: DisplayId,
    pub request_rect: Rect,
    pub window_rect: Rect,
    /// Rect at the start of the current drag.
    pub origin_rect: Rect,
    pub flags: WindowFlags,
    pub mode_support: ModeSupport,
    pub size_limits: SizeLimits,
    pub updated_size_limits: SizeLimits,
    pub decor_enable: bool,
    pub deco_applied: bool,
    pub stretchable: bool,
    pub drag_type: DragType,
    pub brightness: Option<f32>,
    pub requested_visibility: bool,
    pub current_visibility: bool,
    pub focusable: bool,
    pub priority: i32,
    pub z_order: u32,
    pub surfaces: SurfaceKinds,
    pub is_showing_on_multi_displays: bool,
    pub showing_displays: BTreeSet<DisplayId>,
    pub size_change_reason: WindowSizeChangeReason,
    pub touch_hot_area: Rect,
    pub pointer_hot_area: Rect,
    /// Hot areas requested by the client, relative to the window origin.
    pub requested_hot_areas: Vec<Rect>,
    pub touch_hot_areas: Vec<Rect>,
    pub pointer_hot_areas: Vec<Rect>,
    pub mission_id: Option<i32>,
    pub(crate) parent: Option<Parent>,
    pub(crate) children: Vec<NodeId>,
}

impl WindowNode {
    pub fn new(id: WindowId, window_type: WindowType) -> Self {
        WindowNode {
            id,
            name: String::new(),
            window_type,
            mode: WindowMode::default(),
            last_mode: WindowMode::default(),
            display_id: DisplayId::default(),
            request_rect: Rect::default(),
            window_rect: Rect::default(),
            origin_rect: Rect::default(),
            flags: WindowFlags::empty(),
            mode_support: ModeSupport::ALL,
            size_limits: SizeLimits::default(),
            updated_size_limits: SizeLimits::default(),
            decor_enable: false,
            deco_applied: false,
            stretchable: false,
            drag_type: DragType::default(),
            brightness: None,
            requested_visibility: false,
            current_visibility: false,
            focusable: true,
            priority: window_type.priority(),
            z_order: 0,
            surfaces: SurfaceKinds::default(),
            is_showing_on_multi_displays: false,
            showing_displays: BTreeSet::new(),
            size_change_reason: WindowSizeChangeReason::default(),
            touch_hot_area: Rect::default(),
            pointer_hot_area: Rect::default(),
            requested_hot_areas: Vec::new(),
            touch_hot_areas: Vec::new(),
            pointer_hot_areas: Vec::new(),
            mission_id: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self.last_mode = mode;
        self
    }

    pub fn with_display(mut self, display_id: DisplayId) -> Self {
        self.display_id = display_id;
        self
    }

    pub fn with_request_rect(mut self, rect: Rect) -> Self {
        self.request_rect = rect;
        self
    }

    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_mode_support(mut self, support: ModeSupport) -> Self {
        self.mode_support = support;
        self
    }

    pub fn with_size_limits(mut self, limits: SizeLimits) -> Self {
        self.size_limits = limits;
        self
    }

    pub fn with_mission_id(mut self, mission_id: i32) -> Self {
        self.mission_id = Some(mission_id);
        self
    }

    pub fn with_decor(mut self, enable: bool) -> Self {
        self.decor_enable = enable;
        self
    }

    pub fn with_focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn parent(&self) -> Option<Parent> { self.parent }

    pub fn children(&self) -> &[NodeId] { &self.children }

    pub fn is_split_mode(&self) -> bool { self.mode.is_split() }

    pub fn is_main_floating(&self) -> bool {
        self.window_type.is_main_window() && self.mode.is_floating()
    }

    /// Changes the mode, remembering the previous one so it can be resumed
    /// when a split pairing breaks.
    pub fn set_mode(&mut self, mode: WindowMode) {
        if self.mode != mode {
            self.last_mode = self.mode;
        }
        self.mode = mode;
    }

    pub fn resume_last_mode(&mut self) {
        let last = self.last_mode;
        self.last_mode = self.mode;
        self.mode = last;
    }

    pub fn reset_size_change_reason(&mut self) {
        self.size_change_reason = WindowSizeChangeReason::Undefined;
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_type_belongs_to_exactly_one_family() {
        for ty in WindowType::iter() {
            let families = [
                ty.is_app_window(),
                ty.is_below_system_window(),
                ty.is_above_system_window(),
                ty.is_system_sub_window(),
            ];
            assert_eq!(families.iter().filter(|f| **f).count(), 1, "{ty}");
        }
    }

    #[test]
    fn media_stacks_below_parent() {
        assert!(WindowType::Media.priority() < 0);
        assert!(WindowType::AppSub.priority() > 0);
    }

    #[test]
    fn show_when_locked_slots_fit_between_keyguard_and_bars() {
        let keyguard = WindowType::Keyguard.priority();
        assert!(keyguard + 2 < WindowType::StatusBar.priority());
        assert!(keyguard > WindowType::InputMethodFloat.priority());
    }

    #[test]
    fn set_mode_remembers_previous() {
        let mut node = WindowNode::new(WindowId(1), WindowType::AppMain)
            .with_mode(WindowMode::Floating);
        node.set_mode(WindowMode::SplitPrimary);
        assert_eq!(node.last_mode, WindowMode::Floating);
        node.resume_last_mode();
        assert_eq!(node.mode, WindowMode::Floating);
    }

    #[test]
    fn mode_support_checks() {
        let support = ModeSupport::FULLSCREEN | ModeSupport::FLOATING;
        assert!(support.supports(WindowMode::Floating));
        assert!(!support.supports(WindowMode::SplitPrimary));
        assert_eq!(ModeSupport::default(), ModeSupport::ALL);
    }

    #[test]
    fn size_limits_satisfaction() {
        let limits = SizeLimits {
            max_width: 1000,
            max_height: 1000,
            min_width: 100,
            min_height: 100,
            max_ratio: 2.0,
            min_ratio: 0.5,
        };
        assert!(limits.is_satisfied_by(&Rect::new(0, 0, 400, 300)));
        assert!(!limits.is_satisfied_by(&Rect::new(0, 0, 50, 300)));
        assert!(!limits.is_satisfied_by(&Rect::new(0, 0, 900, 300)));
    }

    #[test]
    fn surfaces_are_ordered_bottom_up() {
        let all = SurfaceKinds::LEASH | SurfaceKinds::MAIN | SurfaceKinds::STARTING;
        assert_eq!(
            all.ordered().collect::<Vec<_>>(),
            vec![SurfaceKind::Leash, SurfaceKind::Main, SurfaceKind::Starting]
        );
    }
}

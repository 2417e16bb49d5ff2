//! Physical display descriptions and the registry of the displays that make
//! up one display group.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::common::collections::BTreeMap;

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(transparent)]
pub struct DisplayId(pub u64);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "display#{}", self.0) }
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
    Default,
    IntoPrimitive,
    TryFromPrimitive
)]
#[repr(u32)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    Rotation0 = 0,
    Rotation90 = 1,
    Rotation180 = 2,
    Rotation270 = 3,
}

/// Topology changes reported by the display manager.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStateChange {
    Create,
    Destroy,
    SizeChange,
    UpdateRotation,
    DisplayCompress,
    VirtualPixelRatioChange,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub rect: Rect,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default = "default_vpr")]
    pub virtual_pixel_ratio: f32,
    /// Waterfall displays may hide their curved edges; windows are then kept
    /// vertically inside the display rect.
    #[serde(default)]
    pub waterfall_compressed: bool,
}

fn default_vpr() -> f32 { 1.0 }

impl DisplayInfo {
    pub fn new(id: DisplayId, rect: Rect) -> Self {
        DisplayInfo {
            id,
            rect,
            rotation: Rotation::default(),
            virtual_pixel_ratio: default_vpr(),
            waterfall_compressed: false,
        }
    }

    pub fn with_virtual_pixel_ratio(mut self, vpr: f32) -> Self {
        self.virtual_pixel_ratio = vpr;
        self
    }

    pub fn is_vertical(&self) -> bool { self.rect.width < self.rect.height }
}

/// Every display of a group, iterated in id order.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DisplayGroupInfo {
    displays: BTreeMap<DisplayId, DisplayInfo>,
    default_display: DisplayId,
    left_display: DisplayId,
    right_display: DisplayId,
}

impl DisplayGroupInfo {
    pub fn new(default_display: DisplayId) -> Self {
        DisplayGroupInfo {
            displays: BTreeMap::new(),
            default_display,
            left_display: default_display,
            right_display: default_display,
        }
    }

    pub fn add_display_info(&mut self, info: DisplayInfo) {
        self.displays.insert(info.id, info);
        self.update_left_and_right();
    }

    pub fn remove_display_info(&mut self, id: DisplayId) -> Option<DisplayInfo> {
        let removed = self.displays.remove(&id);
        self.update_left_and_right();
        removed
    }

    pub fn contains(&self, id: DisplayId) -> bool { self.displays.contains_key(&id) }

    pub fn len(&self) -> usize { self.displays.len() }

    pub fn is_empty(&self) -> bool { self.displays.is_empty() }

    pub fn is_multi_display(&self) -> bool { self.displays.len() > 1 }

    pub fn display_info(&self, id: DisplayId) -> Option<&DisplayInfo> { self.displays.get(&id) }

    pub fn display_ids(&self) -> impl Iterator<Item = DisplayId> + '_ {
        self.displays.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayInfo> + '_ { self.displays.values() }

    /// Rect of `id`, or an empty rect for an unknown display.
    pub fn display_rect(&self, id: DisplayId) -> Rect {
        self.displays.get(&id).map(|d| d.rect).unwrap_or_default()
    }

    pub fn virtual_pixel_ratio(&self, id: DisplayId) -> f32 {
        self.displays.get(&id).map(|d| d.virtual_pixel_ratio).unwrap_or(1.0)
    }

    pub fn rotation(&self, id: DisplayId) -> Rotation {
        self.displays.get(&id).map(|d| d.rotation).unwrap_or_default()
    }

    pub fn is_waterfall_compressed(&self, id: DisplayId) -> bool {
        self.displays.get(&id).is_some_and(|d| d.waterfall_compressed)
    }

    pub fn all_display_rects(&self) -> BTreeMap<DisplayId, Rect> {
        self.displays.iter().map(|(id, d)| (*id, d.rect)).collect()
    }

    pub fn set_display_rect(&mut self, id: DisplayId, rect: Rect) {
        if let Some(info) = self.displays.get_mut(&id) {
            info.rect = rect;
        }
        self.update_left_and_right();
    }

    pub fn set_rotation(&mut self, id: DisplayId, rotation: Rotation) {
        if let Some(info) = self.displays.get_mut(&id) {
            info.rotation = rotation;
        }
    }

    pub fn set_virtual_pixel_ratio(&mut self, id: DisplayId, vpr: f32) {
        if let Some(info) = self.displays.get_mut(&id) {
            info.virtual_pixel_ratio = vpr;
        }
    }

    pub fn set_waterfall_compressed(&mut self, id: DisplayId, compressed: bool) {
        if let Some(info) = self.displays.get_mut(&id) {
            info.waterfall_compressed = compressed;
        }
    }

    pub fn default_display_id(&self) -> DisplayId { self.default_display }

    pub fn set_default_display_id(&mut self, id: DisplayId) { self.default_display = id; }

    pub fn left_display_id(&self) -> DisplayId { self.left_display }

    pub fn right_display_id(&self) -> DisplayId { self.right_display }

    /// Bounding rect of every display in the group.
    pub fn group_rect(&self) -> Rect {
        let mut rects = self.displays.values().map(|d| d.rect);
        let Some(first) = rects.next() else {
            return Rect::default();
        };
        let (mut l, mut t, mut r, mut b) = (first.x, first.y, first.right(), first.bottom());
        for rect in rects {
            l = l.min(rect.x);
            t = t.min(rect.y);
            r = r.max(rect.right());
            b = b.max(rect.bottom());
        }
        Rect::new(l, t, (r - l).max(0) as u32, (b - t).max(0) as u32)
    }

    fn update_left_and_right(&mut self) {
        let leftmost = self.displays.values().min_by_key(|d| d.rect.x).map(|d| d.id);
        let rightmost = self.displays.values().max_by_key(|d| d.rect.x).map(|d| d.id);
        self.left_display = leftmost.unwrap_or(self.default_display);
        self.right_display = rightmost.unwrap_or(self.default_display);
    }
}

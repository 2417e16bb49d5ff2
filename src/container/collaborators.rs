//! Outbound interfaces to the services around the engine. The engine only
//! pushes intents through these; it never reads state back.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::minimize::{MinimizeList, MinimizeSink};
use crate::model::window_node::{SurfaceKind, WindowId, WindowMode, WindowSizeChangeReason, WindowType};
use crate::sys::display::DisplayId;
use crate::sys::geometry::Rect;

pub trait Compositor: Send {
    fn add_surface(&mut self, window: WindowId, display: DisplayId);
    fn remove_surface(&mut self, window: WindowId, display: DisplayId);
    fn set_z_order(&mut self, window: WindowId, surface: SurfaceKind, z_order: u32);
}

pub trait ClientNotifier: Send {
    fn update_window_rect(
        &mut self,
        window: WindowId,
        rect: Rect,
        decorated: bool,
        reason: WindowSizeChangeReason,
    );
    fn update_window_mode(&mut self, window: WindowId, mode: WindowMode);
}

pub trait WindowEventSink: Send {
    fn emit(&mut self, event: WindowEvent);
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SplitEventKind {
    ShowPrimary,
    ShowSecondary,
    ShowDivider,
    DestroyDivider,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AvoidChange {
    Added,
    Updated,
    Removed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WindowEvent {
    FocusChanged {
        window: WindowId,
        focused: bool,
    },
    ActiveChanged {
        window: WindowId,
    },
    /// `None` restores the display's default brightness.
    BrightnessOverride {
        display: DisplayId,
        brightness: Option<u32>,
    },
    AvoidAreaChanged {
        window: WindowId,
        display: DisplayId,
        change: AvoidChange,
    },
    DockStateChanged {
        enabled: bool,
    },
    SystemBarTint {
        display: DisplayId,
        bar: WindowType,
        region: Rect,
        immersive: bool,
    },
    Split {
        display: DisplayId,
        kind: SplitEventKind,
        mission_id: Option<i32>,
    },
    PlaceholderRequested {
        display: DisplayId,
        mode: WindowMode,
        rect: Rect,
    },
    PlaceholderDestroyed {
        display: DisplayId,
    },
    ScreenLocked {
        locked: bool,
    },
}

/// Forwards events to another thread.
pub struct ChannelEventSink {
    tx: Sender<WindowEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: Sender<WindowEvent>) -> Self { ChannelEventSink { tx } }
}

impl WindowEventSink for ChannelEventSink {
    fn emit(&mut self, event: WindowEvent) {
        if let Err(err) = self.tx.send(event) {
            trace!("event receiver gone, dropping {:?}", err.into_inner());
        }
    }
}

impl WindowEventSink for Vec<WindowEvent> {
    fn emit(&mut self, event: WindowEvent) { self.push(event) }
}

/// Collaborator that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Compositor for Discard {
    fn add_surface(&mut self, _: WindowId, _: DisplayId) {}
    fn remove_surface(&mut self, _: WindowId, _: DisplayId) {}
    fn set_z_order(&mut self, _: WindowId, _: SurfaceKind, _: u32) {}
}

impl ClientNotifier for Discard {
    fn update_window_rect(&mut self, _: WindowId, _: Rect, _: bool, _: WindowSizeChangeReason) {}
    fn update_window_mode(&mut self, _: WindowId, _: WindowMode) {}
}

impl WindowEventSink for Discard {
    fn emit(&mut self, _: WindowEvent) {}
}

pub struct Collaborators {
    pub compositor: Box<dyn Compositor>,
    pub client: Box<dyn ClientNotifier>,
    pub events: Box<dyn WindowEventSink>,
    pub minimize: Box<dyn MinimizeSink>,
}

impl Collaborators {
    /// Discards every intent except minimize candidates, which are kept in a
    /// local list.
    pub fn detached() -> Self {
        Collaborators {
            compositor: Box::new(Discard),
            client: Box::new(Discard),
            events: Box::new(Discard),
            minimize: Box::new(MinimizeList::new()),
        }
    }

    pub fn with_events(mut self, events: impl WindowEventSink + 'static) -> Self {
        self.events = Box::new(events);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelEventSink::new(tx);
        sink.emit(WindowEvent::ScreenLocked { locked: true });
        assert_eq!(rx.try_recv().unwrap(), WindowEvent::ScreenLocked { locked: true });
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut sink = ChannelEventSink::new(tx);
        sink.emit(WindowEvent::DockStateChanged { enabled: false });
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = WindowEvent::Split {
            display: DisplayId(0),
            kind: SplitEventKind::ShowDivider,
            mission_id: Some(4),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"split""#), "{json}");
        assert!(json.contains(r#""kind":"show_divider""#), "{json}");
    }
}

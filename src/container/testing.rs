//! Recording collaborators and a container harness for tests.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::collaborators::{ClientNotifier, Collaborators, Compositor, WindowEvent, WindowEventSink};
use super::WindowNodeContainer;
use crate::common::config::Config;
use crate::model::minimize::{MinimizeList, MinimizeReason, MinimizeSink};
use crate::model::tree::NodeId;
use crate::model::window_node::{
    SurfaceKind, WindowId, WindowMode, WindowNode, WindowSizeChangeReason, WindowType,
};
use crate::sys::display::{DisplayId, DisplayInfo};
use crate::sys::geometry::Rect;

pub const D0: DisplayId = DisplayId(0);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompositorLog {
    pub added: Vec<(WindowId, DisplayId)>,
    pub removed: Vec<(WindowId, DisplayId)>,
    pub z_orders: Vec<(WindowId, SurfaceKind, u32)>,
}

#[derive(Debug, Default, Clone)]
pub struct RecordingCompositor(Arc<Mutex<CompositorLog>>);

impl RecordingCompositor {
    pub fn log(&self) -> MutexGuard<'_, CompositorLog> { self.0.lock() }
}

impl Compositor for RecordingCompositor {
    fn add_surface(&mut self, window: WindowId, display: DisplayId) {
        self.0.lock().added.push((window, display));
    }

    fn remove_surface(&mut self, window: WindowId, display: DisplayId) {
        self.0.lock().removed.push((window, display));
    }

    fn set_z_order(&mut self, window: WindowId, surface: SurfaceKind, z_order: u32) {
        self.0.lock().z_orders.push((window, surface, z_order));
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientLog {
    pub rects: Vec<(WindowId, Rect, WindowSizeChangeReason)>,
    pub modes: Vec<(WindowId, WindowMode)>,
}

#[derive(Debug, Default, Clone)]
pub struct RecordingClient(Arc<Mutex<ClientLog>>);

impl RecordingClient {
    pub fn log(&self) -> MutexGuard<'_, ClientLog> { self.0.lock() }
}

impl ClientNotifier for RecordingClient {
    fn update_window_rect(
        &mut self,
        window: WindowId,
        rect: Rect,
        _decorated: bool,
        reason: WindowSizeChangeReason,
    ) {
        self.0.lock().rects.push((window, rect, reason));
    }

    fn update_window_mode(&mut self, window: WindowId, mode: WindowMode) {
        self.0.lock().modes.push((window, mode));
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingEvents(Arc<Mutex<Vec<WindowEvent>>>);

impl RecordingEvents {
    pub fn take(&self) -> Vec<WindowEvent> { std::mem::take(&mut *self.0.lock()) }
}

impl WindowEventSink for RecordingEvents {
    fn emit(&mut self, event: WindowEvent) { self.0.lock().push(event) }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingMinimize(Arc<Mutex<MinimizeList>>);

impl RecordingMinimize {
    pub fn entries(&self) -> Vec<(WindowId, MinimizeReason)> { self.0.lock().entries().to_vec() }
}

impl MinimizeSink for RecordingMinimize {
    fn add_candidate(&mut self, window: WindowId, reason: MinimizeReason) {
        self.0.lock().add_candidate(window, reason)
    }

    fn recover_candidate(&mut self) -> Option<WindowId> { self.0.lock().recover_candidate() }
}

/// A container on one 1440x900 display wired to recording collaborators.
pub struct Harness {
    pub container: WindowNodeContainer,
    pub compositor: RecordingCompositor,
    pub client: RecordingClient,
    pub events: RecordingEvents,
    pub minimize: RecordingMinimize,
}

impl Harness {
    pub fn new() -> Self { Self::with_display(DisplayInfo::new(D0, Rect::new(0, 0, 1440, 900))) }

    pub fn with_display(display: DisplayInfo) -> Self { Self::with_config(Config::default(), display) }

    pub fn with_config(config: Config, display: DisplayInfo) -> Self {
        let compositor = RecordingCompositor::default();
        let client = RecordingClient::default();
        let events = RecordingEvents::default();
        let minimize = RecordingMinimize::default();
        let collab = Collaborators {
            compositor: Box::new(compositor.clone()),
            client: Box::new(client.clone()),
            events: Box::new(events.clone()),
            minimize: Box::new(minimize.clone()),
        };
        Harness {
            container: WindowNodeContainer::new(config, display, collab),
            compositor,
            client,
            events,
            minimize,
        }
    }

    /// Registers `node` and adds it without a parent.
    pub fn add(&mut self, node: WindowNode) -> NodeId {
        let window = node.id;
        let id = self.container.register_window(node);
        self.container.add_window_node(window, None).unwrap();
        id
    }

    pub fn add_child(&mut self, node: WindowNode, parent: u32) -> NodeId {
        let window = node.id;
        let id = self.container.register_window(node);
        self.container.add_window_node(window, Some(WindowId(parent))).unwrap();
        id
    }

    pub fn node(&self, window: u32) -> &WindowNode {
        self.container.node(WindowId(window)).unwrap()
    }

    pub fn z_order(&self) -> Vec<u32> {
        self.container.z_ordered_windows().into_iter().map(|w| w.0).collect()
    }
}

pub fn window(id: u32, ty: WindowType) -> WindowNode { WindowNode::new(WindowId(id), ty) }

pub fn app(id: u32, mode: WindowMode) -> WindowNode {
    WindowNode::new(WindowId(id), WindowType::AppMain)
        .with_mode(mode)
        .with_request_rect(Rect::new(100, 100, 600, 400))
}

//! Server-wide registry of window-node containers.
//!
//! Each display group owns one [`WindowNodeContainer`]. The registry is the
//! only shared state; every container is driven by one writer at a time
//! through [`ServerContext::with_container`].

use std::fmt;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::collections::BTreeMap;
use crate::common::config::Config;
use crate::container::{Collaborators, WindowNodeContainer, WmError, WmResult};
use crate::model::window_node::WindowId;
use crate::sys::display::{DisplayId, DisplayInfo};

static_assertions::assert_impl_all!(WindowNodeContainer: Send);

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct DisplayGroupId(pub u64);

impl fmt::Display for DisplayGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "group#{}", self.0) }
}

#[derive(Default)]
pub struct ServerContext {
    containers: Mutex<BTreeMap<DisplayGroupId, WindowNodeContainer>>,
    /// Which group each registered window lives in.
    owners: DashMap<WindowId, DisplayGroupId>,
}

impl ServerContext {
    pub fn new() -> Self { Self::default() }

    /// Creates the container of `group` with `display_info` as its default
    /// display.
    pub fn create_container(
        &self,
        group: DisplayGroupId,
        config: Config,
        display_info: DisplayInfo,
        collab: Collaborators,
    ) -> WmResult<()> {
        let mut containers = self.containers.lock();
        if containers.contains_key(&group) {
            return Err(WmError::InvalidOperation(format!("{group} already has a container")));
        }
        info!(%group, display = %display_info.id, "create container");
        containers.insert(group, WindowNodeContainer::new(config, display_info, collab));
        Ok(())
    }

    /// Runs `f` on the container of `group` while holding the registry lock.
    pub fn with_container<R>(
        &self,
        group: DisplayGroupId,
        f: impl FnOnce(&mut WindowNodeContainer) -> R,
    ) -> Option<R> {
        let mut containers = self.containers.lock();
        containers.get_mut(&group).map(f)
    }

    /// Runs `f` on the container that owns `window`.
    pub fn with_window_container<R>(
        &self,
        window: WindowId,
        f: impl FnOnce(&mut WindowNodeContainer) -> WmResult<R>,
    ) -> WmResult<R> {
        let group = self.owner_of(window).ok_or(WmError::WindowNotFound(window))?;
        self.with_container(group, f)
            .unwrap_or(Err(WmError::WindowNotFound(window)))
    }

    /// Drops the container of `group` together with every window it owned.
    /// Returns the freed window ids.
    pub fn remove_container(&self, group: DisplayGroupId) -> Option<Vec<WindowId>> {
        let mut container = self.containers.lock().remove(&group)?;
        let freed = container.destroy();
        self.owners.retain(|_, owner| *owner != group);
        info!(%group, windows = freed.len(), "remove container");
        Some(freed)
    }

    pub fn container_ids(&self) -> Vec<DisplayGroupId> {
        self.containers.lock().keys().copied().collect()
    }

    /// Finds the group whose container handles `display`.
    pub fn group_of_display(&self, display: DisplayId) -> Option<DisplayGroupId> {
        self.containers
            .lock()
            .iter()
            .find(|(_, container)| container.group().displays().contains(display))
            .map(|(group, _)| *group)
    }

    pub fn register_owner(&self, window: WindowId, group: DisplayGroupId) {
        if let Some(previous) = self.owners.insert(window, group).filter(|p| *p != group) {
            debug!(%window, from = %previous, to = %group, "window changed group");
        }
    }

    pub fn unregister_owner(&self, window: WindowId) -> Option<DisplayGroupId> {
        self.owners.remove(&window).map(|(_, group)| group)
    }

    pub fn owner_of(&self, window: WindowId) -> Option<DisplayGroupId> {
        self.owners.get(&window).map(|entry| *entry)
    }
}

//! Recording and replaying container requests.
//!
//! A recording is a RON file: the config on the first line, the default
//! display on the second, then one [`ContainerEvent`] per line.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tracing::{debug, warn};

use super::{Collaborators, WindowNodeContainer, WmResult};
use crate::common::collections::BTreeMap;
use crate::common::config::Config;
use crate::layout_engine::LayoutMode;
use crate::model::window_node::{WindowId, WindowMode, WindowNode, WindowUpdateReason};
use crate::sys::display::{DisplayId, DisplayInfo, DisplayStateChange};
use crate::sys::geometry::Rect;

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ContainerEvent {
    RegisterWindow(WindowNode),
    AddWindow {
        window: WindowId,
        parent: Option<WindowId>,
    },
    UpdateWindow {
        window: WindowId,
        reason: WindowUpdateReason,
    },
    RemoveWindow(WindowId),
    DestroyWindow(WindowId),
    SetWindowMode {
        window: WindowId,
        mode: WindowMode,
    },
    SetFocus(WindowId),
    SetActive {
        window: WindowId,
        by_removed: bool,
    },
    RaiseAppWindow(WindowId),
    SwitchLayout {
        mode: LayoutMode,
        display: DisplayId,
        reorder: bool,
    },
    MinimizeAll(DisplayId),
    ToggleShownState {
        restore: bool,
    },
    DisplayCreate {
        info: DisplayInfo,
        #[serde_as(as = "Vec<(_, _)>")]
        rects: BTreeMap<DisplayId, Rect>,
    },
    DisplayDestroy {
        display: DisplayId,
        #[serde_as(as = "Vec<(_, _)>")]
        rects: BTreeMap<DisplayId, Rect>,
    },
    DisplayChange {
        info: DisplayInfo,
        #[serde_as(as = "Vec<(_, _)>")]
        rects: BTreeMap<DisplayId, Rect>,
        change: DisplayStateChange,
    },
}

#[derive(Default)]
pub struct Record {
    file: Option<File>,
}

impl Record {
    /// Creates (or truncates) `path`. Without a path nothing is written.
    pub fn new(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => Some(
                File::create(path).with_context(|| format!("creating {}", path.display()))?,
            ),
            None => None,
        };
        Ok(Self { file })
    }

    pub fn is_recording(&self) -> bool { self.file.is_some() }

    fn start(&mut self, config: &Config, display: &DisplayInfo) -> anyhow::Result<()> {
        let Some(file) = self.file.as_mut() else { return Ok(()) };
        let config = ron::ser::to_string(config)?;
        let display = ron::ser::to_string(display)?;
        writeln!(file, "{config}\n{display}")?;
        Ok(())
    }

    fn on_event(&mut self, event: &ContainerEvent) -> anyhow::Result<()> {
        let Some(file) = self.file.as_mut() else { return Ok(()) };
        let line = ron::ser::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl WindowNodeContainer {
    /// Writes the config and default display to `record` and appends every
    /// event handled from now on.
    pub fn start_recording(&mut self, mut record: Record) -> anyhow::Result<()> {
        let default_display = self.group.default_display_id();
        let display = self
            .group
            .displays()
            .display_info(default_display)
            .cloned()
            .with_context(|| format!("{default_display} is not registered"))?;
        record.start(&self.config, &display)?;
        self.record = record;
        Ok(())
    }

    pub fn handle_event(&mut self, event: ContainerEvent) -> WmResult<()> {
        if let Err(err) = self.record.on_event(&event) {
            warn!(?err, "failed to record event");
        }
        debug!(?event, "handle event");
        match event {
            ContainerEvent::RegisterWindow(node) => {
                self.register_window(node);
                Ok(())
            }
            ContainerEvent::AddWindow { window, parent } => self.add_window_node(window, parent),
            ContainerEvent::UpdateWindow { window, reason } => self.update_window_node(window, reason),
            ContainerEvent::RemoveWindow(window) => self.remove_window_node(window),
            ContainerEvent::DestroyWindow(window) => self.destroy_window_node(window).map(drop),
            ContainerEvent::SetWindowMode { window, mode } => self.set_window_mode(window, mode),
            ContainerEvent::SetFocus(window) => self.set_focus_window(window),
            ContainerEvent::SetActive { window, by_removed } => self.set_active_window(window, by_removed),
            ContainerEvent::RaiseAppWindow(window) => self.raise_z_order_for_app_window(window),
            ContainerEvent::SwitchLayout { mode, display, reorder } => {
                self.switch_layout_policy(mode, display, reorder)
            }
            ContainerEvent::MinimizeAll(display) => self.minimize_all_app_windows(display),
            ContainerEvent::ToggleShownState { restore } => {
                self.toggle_shown_state_for_all_app_windows(re_add_window, restore)
            }
            ContainerEvent::DisplayCreate { info, rects } => self.process_display_create(info, &rects),
            ContainerEvent::DisplayDestroy { display, rects } => {
                self.process_display_destroy(display, &rects).map(drop)
            }
            ContainerEvent::DisplayChange { info, rects, change } => {
                self.process_display_change(&info, &rects, change)
            }
        }
    }
}

/// Restores a hidden window by adding it back in its saved mode.
fn re_add_window(container: &mut WindowNodeContainer, window: WindowId, mode: WindowMode) -> bool {
    let Some(id) = container.tree.find(window) else { return false };
    container.tree[id].set_mode(mode);
    container.add_window_node(window, None).is_ok()
}

/// Rebuilds a container from a recording. `on_result` sees every replayed
/// event together with its outcome.
pub fn replay(
    path: &Path,
    collab: Collaborators,
    mut on_result: impl FnMut(&ContainerEvent, &WmResult<()>),
) -> anyhow::Result<WindowNodeContainer> {
    let file = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);
    let mut lines = file.lines();
    let config: Config =
        ron::de::from_str(&lines.next().context("empty recording")??).context("parsing config line")?;
    let display: DisplayInfo =
        ron::de::from_str(&lines.next().context("expected display line")??).context("parsing display line")?;
    let mut container = WindowNodeContainer::new(config, display, collab);
    for (index, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ContainerEvent =
            ron::de::from_str(&line).with_context(|| format!("parsing event {}", index + 1))?;
        let result = container.handle_event(event.clone());
        on_result(&event, &result);
    }
    Ok(container)
}

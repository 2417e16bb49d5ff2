use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::layout_engine::LayoutMode;

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_default()
        .join("tessera")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub split: SplitRatioSettings,
    #[serde(default)]
    pub tile: TileSettings,
    #[serde(default)]
    pub hot_zones: ModeChangeHotZones,
}

/// Geometry constants shared by both layout policies. Sizes are in
/// density-independent units and are scaled by the display's pixel ratio.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default)]
    pub default_mode: LayoutMode,
    #[serde(default = "default_aspect_ratio")]
    pub cascade_aspect_ratio: f32,
    #[serde(default = "default_min_floating_width")]
    pub min_floating_width: u32,
    #[serde(default = "default_min_floating_height")]
    pub min_floating_height: u32,
    #[serde(default = "default_max_floating_size")]
    pub max_floating_size: u32,
    #[serde(default = "default_title_bar_height")]
    pub title_bar_height: u32,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_divider_width")]
    pub divider_width: u32,
    #[serde(default = "default_hotzone_touch")]
    pub hotzone_touch: u32,
    #[serde(default = "default_hotzone_pointer")]
    pub hotzone_pointer: u32,
    /// Floating windows whose bottom edge would reach this line on first
    /// show are moved to the top of the limit rect. Zero disables it.
    #[serde(default)]
    pub floating_bottom_pos_y: u32,
    #[serde(default = "default_max_app_windows")]
    pub max_app_window_number: usize,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SplitRatioSettings {
    #[serde(default = "default_split_ratios")]
    pub ratios: Vec<f32>,
    #[serde(default = "default_exit_split_start")]
    pub exit_split_start_ratio: f32,
    #[serde(default = "default_exit_split_end")]
    pub exit_split_end_ratio: f32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TileSettings {
    #[serde(default = "default_edge_interval")]
    pub edge_interval: u32,
    #[serde(default = "default_mid_interval")]
    pub mid_interval: u32,
}

/// Widths of the screen-edge strips that switch a dragged window into
/// fullscreen, split-primary or split-secondary mode.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct ModeChangeHotZones {
    #[serde(default = "default_hot_zone_range")]
    pub fullscreen_range: u32,
    #[serde(default = "default_hot_zone_range")]
    pub primary_range: u32,
    #[serde(default = "default_hot_zone_range")]
    pub secondary_range: u32,
}

fn default_aspect_ratio() -> f32 { 0.4 }
fn default_min_floating_width() -> u32 { 320 }
fn default_min_floating_height() -> u32 { 240 }
fn default_max_floating_size() -> u32 { 1920 }
fn default_title_bar_height() -> u32 { 37 }
fn default_frame_width() -> u32 { 5 }
fn default_divider_width() -> u32 { 8 }
fn default_hotzone_touch() -> u32 { 20 }
fn default_hotzone_pointer() -> u32 { 4 }
fn default_max_app_windows() -> usize { 100 }
fn default_split_ratios() -> Vec<f32> { vec![0.33, 0.5, 0.67] }
fn default_exit_split_start() -> f32 { 0.1 }
fn default_exit_split_end() -> f32 { 0.9 }
fn default_edge_interval() -> u32 { 48 }
fn default_mid_interval() -> u32 { 24 }
fn default_hot_zone_range() -> u32 { 40 }

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            default_mode: LayoutMode::default(),
            cascade_aspect_ratio: default_aspect_ratio(),
            min_floating_width: default_min_floating_width(),
            min_floating_height: default_min_floating_height(),
            max_floating_size: default_max_floating_size(),
            title_bar_height: default_title_bar_height(),
            frame_width: default_frame_width(),
            divider_width: default_divider_width(),
            hotzone_touch: default_hotzone_touch(),
            hotzone_pointer: default_hotzone_pointer(),
            floating_bottom_pos_y: 0,
            max_app_window_number: default_max_app_windows(),
        }
    }
}

impl Default for SplitRatioSettings {
    fn default() -> Self {
        Self {
            ratios: default_split_ratios(),
            exit_split_start_ratio: default_exit_split_start(),
            exit_split_end_ratio: default_exit_split_end(),
        }
    }
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            edge_interval: default_edge_interval(),
            mid_interval: default_mid_interval(),
        }
    }
}

impl Default for ModeChangeHotZones {
    fn default() -> Self {
        Self {
            fullscreen_range: default_hot_zone_range(),
            primary_range: default_hot_zone_range(),
            secondary_range: default_hot_zone_range(),
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.cascade_aspect_ratio > 0.0 && self.cascade_aspect_ratio <= 1.0) {
            issues.push(format!(
                "cascade_aspect_ratio must be in (0, 1], got {}",
                self.cascade_aspect_ratio
            ));
        }
        if self.min_floating_width == 0 || self.min_floating_height == 0 {
            issues.push("min_floating_width and min_floating_height must be non-zero".to_string());
        }
        if self.min_floating_width > self.max_floating_size
            || self.min_floating_height > self.max_floating_size
        {
            issues.push(format!(
                "max_floating_size ({}) is smaller than the minimum floating size",
                self.max_floating_size
            ));
        }
        if self.divider_width == 0 {
            issues.push("divider_width must be non-zero".to_string());
        }
        if self.max_app_window_number == 0 {
            issues.push("max_app_window_number must be at least 1".to_string());
        }

        issues
    }
}

impl SplitRatioSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (index, ratio) in self.ratios.iter().enumerate() {
            if !(*ratio > 0.0 && *ratio < 1.0) {
                issues.push(format!("split ratio {index} must be in (0, 1), got {ratio}"));
            }
        }
        if self.exit_split_start_ratio >= self.exit_split_end_ratio {
            issues.push(format!(
                "exit_split_start_ratio ({}) must be less than exit_split_end_ratio ({})",
                self.exit_split_start_ratio, self.exit_split_end_ratio
            ));
        }
        if self.exit_split_start_ratio < 0.0 || self.exit_split_end_ratio > 1.0 {
            issues.push("exit split ratios must lie within [0, 1]".to_string());
        }

        issues
    }
}

impl TileSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.mid_interval == 0 {
            issues.push("tile mid_interval must be non-zero".to_string());
        }
        issues
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path` if given, the default location if it exists, and falls
    /// back to built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let default_path = config_file();
                if default_path.exists() {
                    Self::read(&default_path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.split.validate());
        issues.extend(self.tile.validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [layout]
            default_mode = "tile"
            divider_width = 12

            [split]
            ratios = [0.5]
            "#,
        )
        .unwrap();
        assert_eq!(config.layout.default_mode, LayoutMode::Tile);
        assert_eq!(config.layout.divider_width, 12);
        assert_eq!(config.layout.title_bar_height, 37);
        assert_eq!(config.split.ratios, vec![0.5]);
        assert_eq!(config.split.exit_split_end_ratio, 0.9);
        assert_eq!(config.tile, TileSettings::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[layout]\nbogus = 1\n").is_err());
    }

    #[test]
    fn validate_reports_bad_ratios() {
        let mut config = Config::default();
        config.split.ratios = vec![0.0, 0.5, 1.2];
        config.split.exit_split_start_ratio = 0.95;
        config.layout.cascade_aspect_ratio = 1.5;

        let issues = config.validate();
        assert_eq!(issues.len(), 4, "{issues:?}");
    }

    #[test]
    fn save_then_read_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.tile.edge_interval = 32;
        config.hot_zones.fullscreen_range = 64;
        config.save(&path).unwrap();

        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn load_with_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}

//! Persistent settings for the portfolio app.

use crate::engine::EngineConfig;
use crate::graph::layout::{ForceParams, LayoutConfig, NodeRadii, RadialParams};
use crate::graph::{LayoutMode, PinPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where remote content comes from. No project id means bundled content only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSettings {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Label for the center node when remote content has none
    #[serde(default = "default_center_label")]
    pub center_label: String,
}

fn default_dataset() -> String {
    "production".into()
}

fn default_api_version() -> String {
    "2024-03-11".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_center_label() -> String {
    "曾德荣".into()
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: default_dataset(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            center_label: default_center_label(),
        }
    }
}

/// All persistable UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Layout
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub pin_policy: PinPolicy,
    #[serde(default = "default_center_radius")]
    pub center_radius: f32,
    #[serde(default = "default_category_radius")]
    pub category_radius: f32,
    #[serde(default = "default_leaf_radius")]
    pub leaf_radius: f32,
    #[serde(default = "default_first_ring")]
    pub first_ring: f32,
    #[serde(default = "default_outer_ring")]
    pub outer_ring: f32,

    // Physics
    #[serde(default = "default_link_distance")]
    pub link_distance: f32,
    #[serde(default = "default_charge")]
    pub charge: f32,
    #[serde(default = "default_velocity_decay")]
    pub velocity_decay: f32,
    #[serde(default = "default_collide_scale")]
    pub collide_scale: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,

    // Display
    #[serde(default = "default_animation_secs")]
    pub animation_secs: f64,
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f32,
    #[serde(default = "default_hover_scale")]
    pub hover_scale: f32,
    #[serde(default = "default_show_panel")]
    pub show_settings_panel: bool,

    #[serde(default)]
    pub content: ContentSettings,
}

fn default_center_radius() -> f32 {
    NodeRadii::default().center
}

fn default_category_radius() -> f32 {
    NodeRadii::default().category
}

fn default_leaf_radius() -> f32 {
    NodeRadii::default().leaf
}

fn default_first_ring() -> f32 {
    RadialParams::default().first_ring
}

fn default_outer_ring() -> f32 {
    RadialParams::default().outer_ring
}

fn default_link_distance() -> f32 {
    ForceParams::default().link_distance
}

fn default_charge() -> f32 {
    ForceParams::default().charge
}

fn default_velocity_decay() -> f32 {
    ForceParams::default().velocity_decay
}

fn default_collide_scale() -> f32 {
    ForceParams::default().collide_scale
}

fn default_seed() -> u64 {
    LayoutConfig::default().seed
}

fn default_animation_secs() -> f64 {
    EngineConfig::default().animation_secs
}

fn default_label_max_chars() -> usize {
    EngineConfig::default().label_max_chars
}

fn default_drag_threshold() -> f32 {
    EngineConfig::default().drag_threshold
}

fn default_hover_scale() -> f32 {
    EngineConfig::default().hover_scale
}

fn default_show_panel() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::default(),
            pin_policy: PinPolicy::default(),
            center_radius: default_center_radius(),
            category_radius: default_category_radius(),
            leaf_radius: default_leaf_radius(),
            first_ring: default_first_ring(),
            outer_ring: default_outer_ring(),

            link_distance: default_link_distance(),
            charge: default_charge(),
            velocity_decay: default_velocity_decay(),
            collide_scale: default_collide_scale(),
            seed: default_seed(),

            animation_secs: default_animation_secs(),
            label_max_chars: default_label_max_chars(),
            drag_threshold: default_drag_threshold(),
            hover_scale: default_hover_scale(),
            show_settings_panel: default_show_panel(),

            content: ContentSettings::default(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("cognitive-synapse");
            p.push("settings.json");
            p
        })
    }

    /// Force constants with the user-tunable ones applied
    pub fn force_params(&self) -> ForceParams {
        ForceParams {
            link_distance: self.link_distance,
            charge: self.charge,
            velocity_decay: self.velocity_decay,
            collide_scale: self.collide_scale,
            ..ForceParams::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            layout: LayoutConfig {
                mode: self.layout_mode,
                pin_policy: self.pin_policy,
                radii: NodeRadii {
                    center: self.center_radius,
                    category: self.category_radius,
                    leaf: self.leaf_radius,
                },
                radial: RadialParams {
                    first_ring: self.first_ring,
                    outer_ring: self.outer_ring,
                },
                force: self.force_params(),
                seed: self.seed,
            },
            animation_secs: self.animation_secs,
            label_max_chars: self.label_max_chars,
            drag_threshold: self.drag_threshold,
            hover_scale: self.hover_scale,
        }
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("could not determine config directory, using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                Self::default()
            }),
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("could not determine config directory, settings not saved");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "failed to create config directory");
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write settings");
                } else {
                    tracing::debug!(path = %path.display(), "saved settings");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize settings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.content.dataset, "production");
        assert!(settings.content.project_id.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_json(
            r#"{"layout_mode": "Radial", "leaf_radius": 18.0, "content": {"project_id": "abc123"}}"#,
        )
        .unwrap();
        assert_eq!(settings.layout_mode, LayoutMode::Radial);
        assert_eq!(settings.leaf_radius, 18.0);
        assert_eq!(settings.category_radius, 20.0);
        assert_eq!(settings.content.project_id.as_deref(), Some("abc123"));
        assert_eq!(settings.content.api_version, "2024-03-11");
    }

    #[test]
    fn default_settings_build_the_default_engine() {
        assert_eq!(Settings::default().engine_config(), EngineConfig::default());
    }

    #[test]
    fn survives_a_save_cycle() {
        let mut settings = Settings::default();
        settings.pin_policy = PinPolicy::Sticky;
        settings.charge = -250.0;
        let json = serde_json::to_string(&settings).unwrap();
        let back = Settings::from_json(&json).unwrap();
        assert_eq!(back, settings);
        assert_eq!(back.engine_config().layout.force.charge, -250.0);
    }
}

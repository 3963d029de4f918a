//! Orchestrator configuration.
//!
//! Every tunable lives here and can be loaded from a TOML file. Missing or
//! invalid entries fall back to defaults so a page always starts.

use std::fs;
use std::path::Path;

use scrollreel_protocol::Ease;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::trigger::TriggerPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub motion: MotionPreference,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub typewriter: TypewriterConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollConfig::default(),
            motion: MotionPreference::default(),
            frame: FrameConfig::default(),
            tracker: TrackerConfig::default(),
            typewriter: TypewriterConfig::default(),
            loading: LoadingConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Lowest damping rate accepted; smaller values would freeze the smoothed
/// offset.
pub const MIN_DAMPING: f64 = 0.5;
/// Lowest frame-gap clamp accepted, in milliseconds.
pub const MIN_FRAME_DELTA_MS: f64 = 1.0;

impl OrchestratorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        Ok(config.sanitized())
    }

    /// Raise rates that would stop the smoothed offset from converging.
    pub fn sanitized(mut self) -> Self {
        if self.scroll.damping.is_nan() || self.scroll.damping < MIN_DAMPING {
            warn!(
                damping = self.scroll.damping,
                min = MIN_DAMPING,
                "Damping too low, clamping"
            );
            self.scroll.damping = MIN_DAMPING;
        }
        if self.frame.max_delta_ms.is_nan() || self.frame.max_delta_ms < MIN_FRAME_DELTA_MS {
            warn!(
                max_delta_ms = self.frame.max_delta_ms,
                min = MIN_FRAME_DELTA_MS,
                "Frame delta clamp too low, clamping"
            );
            self.frame.max_delta_ms = MIN_FRAME_DELTA_MS;
        }
        self
    }
}

/// Whether animated motion is wanted at all.
///
/// `Reduced` puts the scroll driver in immediate mode and settles
/// scroll-triggered timelines instantly instead of playing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionPreference {
    #[default]
    Smooth,
    Reduced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Exponential decay rate (1/s) of the smoothed offset toward the raw one.
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Distance (px) under which the smoothed offset snaps to the raw one.
    #[serde(default = "default_settle_threshold")]
    pub settle_threshold: f64,
    #[serde(default = "default_multiplier")]
    pub wheel_multiplier: f64,
    #[serde(default = "default_multiplier")]
    pub touch_multiplier: f64,
    /// Duration (s) of programmatic scrolls issued by the navigation dock.
    #[serde(default = "default_scroll_to_duration")]
    pub scroll_to_duration: f64,
    #[serde(default = "default_scroll_to_ease")]
    pub scroll_to_ease: Ease,
    #[serde(default = "default_line_step")]
    pub line_step: f64,
    /// Fraction of the viewport height scrolled by page up/down.
    #[serde(default = "default_page_fraction")]
    pub page_fraction: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            settle_threshold: default_settle_threshold(),
            wheel_multiplier: default_multiplier(),
            touch_multiplier: default_multiplier(),
            scroll_to_duration: default_scroll_to_duration(),
            scroll_to_ease: default_scroll_to_ease(),
            line_step: default_line_step(),
            page_fraction: default_page_fraction(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Longest frame gap (ms) fed to the simulation; longer gaps from
    /// throttled hosts are clamped to this.
    #[serde(default = "default_max_frame_delta_ms")]
    pub max_delta_ms: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: default_max_frame_delta_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_section_start")]
    pub section_start: TriggerPoint,
    #[serde(default = "default_section_end")]
    pub section_end: TriggerPoint,
    /// Trigger point on the dock anchor section that reveals the dock.
    #[serde(default = "default_dock_start")]
    pub dock_start: TriggerPoint,
    /// Index of the section whose arrival reveals the dock.
    #[serde(default = "default_dock_section")]
    pub dock_section: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            section_start: default_section_start(),
            section_end: default_section_end(),
            dock_start: default_dock_start(),
            dock_section: default_dock_section(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypewriterConfig {
    #[serde(default = "default_type_ms")]
    pub type_ms: u32,
    #[serde(default = "default_delete_ms")]
    pub delete_ms: u32,
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u32,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            type_ms: default_type_ms(),
            delete_ms: default_delete_ms(),
            pause_ms: default_pause_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Duration (s) of the 0 → 100 counter.
    #[serde(default = "default_loading_duration")]
    pub duration: f64,
    #[serde(default = "default_loading_ease")]
    pub ease: Ease,
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u32,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: default_loading_duration(),
            ease: default_loading_ease(),
            status_interval_ms: default_status_interval_ms(),
            statuses: default_statuses(),
        }
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> OrchestratorConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded orchestrator config");
            data
        }
        Err(err) => {
            warn!(path = %path.display(), "Falling back to default config: {err}");
            return OrchestratorConfig::default();
        }
    };

    match OrchestratorConfig::from_toml_str(&contents) {
        Ok(cfg) => {
            debug!(motion = ?cfg.motion, "Parsed orchestrator config");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            OrchestratorConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_damping() -> f64 {
    6.5
}

fn default_settle_threshold() -> f64 {
    0.5
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_scroll_to_duration() -> f64 {
    1.2
}

fn default_scroll_to_ease() -> Ease {
    Ease::Smooth
}

fn default_line_step() -> f64 {
    40.0
}

fn default_page_fraction() -> f64 {
    0.9
}

fn default_max_frame_delta_ms() -> f64 {
    250.0
}

fn default_section_start() -> TriggerPoint {
    TriggerPoint::new(0.0, 0.5)
}

fn default_section_end() -> TriggerPoint {
    TriggerPoint::new(1.0, 0.5)
}

fn default_dock_start() -> TriggerPoint {
    TriggerPoint::new(0.0, 0.8)
}

fn default_dock_section() -> usize {
    1
}

fn default_type_ms() -> u32 {
    100
}

fn default_delete_ms() -> u32 {
    50
}

fn default_pause_ms() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_loading_duration() -> f64 {
    2.0
}

fn default_loading_ease() -> Ease {
    Ease::PowerInOut(2)
}

fn default_status_interval_ms() -> u32 {
    500
}

fn default_statuses() -> Vec<String> {
    ["INITIALIZING...", "LOADING ASSETS...", "COMPILING...", "READY"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = OrchestratorConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.motion, MotionPreference::Smooth);
        assert_eq!(cfg.typewriter.pause_ms, 2000);
        assert_eq!(cfg.tracker.dock_section, 1);
        assert!(cfg.loading.enabled);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let cfg = OrchestratorConfig::from_toml_str(
            r#"
            motion = "reduced"

            [scroll]
            damping = 12.0
            scroll_to_ease = "power2.out"

            [tracker]
            section_start = "top 60%"

            [loading]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.motion, MotionPreference::Reduced);
        assert_eq!(cfg.scroll.damping, 12.0);
        assert_eq!(cfg.scroll.scroll_to_ease, Ease::PowerOut(2));
        assert_eq!(cfg.scroll.settle_threshold, 0.5);
        assert_eq!(cfg.tracker.section_start, TriggerPoint::new(0.0, 0.6));
        assert!(!cfg.loading.enabled);
    }

    #[test]
    fn stalling_rates_are_raised() {
        let cfg = OrchestratorConfig::from_toml_str(
            r#"
            [scroll]
            damping = 0.0

            [frame]
            max_delta_ms = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scroll.damping, MIN_DAMPING);
        assert_eq!(cfg.frame.max_delta_ms, MIN_FRAME_DELTA_MS);

        let kept = OrchestratorConfig::default().sanitized();
        assert_eq!(kept.scroll.damping, 6.5);
        assert_eq!(kept.frame.max_delta_ms, 250.0);
    }

    #[test]
    fn missing_file_falls_back() {
        let cfg = load_config(Path::new("/nonexistent/scrollreel.toml"));
        assert_eq!(cfg.scroll.line_step, 40.0);
    }

    #[test]
    fn invalid_ease_is_rejected() {
        let err = OrchestratorConfig::from_toml_str("[scroll]\nscroll_to_ease = \"wobble\"");
        assert!(err.is_err());
    }
}

//! Engine tuning: zoom bounds, snapping, edit thresholds and the export estimate.
//!
//! Every group deserializes with defaults, so a config file only needs the
//! fields it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, Seconds};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub zoom: ZoomSettings,
    pub snapping: SnapSettings,
    pub editing: EditSettings,
    pub export: ExportEstimate,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded engine config");
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// Pixels per second at zoom 1.0.
    pub pixels_per_zoom_unit: f64,
    pub min_pixels_per_second: f64,
    pub max_pixels_per_second: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplicative step for zoom in/out actions.
    pub zoom_step: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            pixels_per_zoom_unit: 20.0,
            min_pixels_per_second: 10.0,
            max_pixels_per_second: 200.0,
            min_zoom: 0.5,
            max_zoom: 10.0,
            zoom_step: 1.25,
        }
    }
}

impl ZoomSettings {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Never zero, so pixel/time division is always defined.
    pub fn pixels_per_second(&self, zoom: f64) -> f64 {
        let pps = zoom * self.pixels_per_zoom_unit;
        if pps.is_nan() {
            return self.min_pixels_per_second;
        }
        pps.clamp(self.min_pixels_per_second, self.max_pixels_per_second)
    }
}

/// Snapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Master switch for both grid and magnetic snapping
    pub enabled: bool,

    /// Round dragged times to `grid_increment`
    pub grid_enabled: bool,
    pub grid_increment: Seconds,

    /// Attract dragged times to clip edges, keyframes and markers
    pub magnetic: bool,

    /// Spacing of grid snap points offered to magnetic snapping
    pub grid_interval: Seconds,

    /// Snap tolerance in pixels
    pub threshold_px: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_enabled: true,
            grid_increment: 0.1,
            magnetic: true,
            grid_interval: 1.0,
            threshold_px: 10.0,
        }
    }
}

impl SnapSettings {
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Floor applied to every trim, split and merge result.
    pub min_clip_duration: Seconds,
    /// Clips closer than this are butt-joined.
    pub adjacency_epsilon: Seconds,
    /// Same-property keyframes closer than this are duplicates.
    pub keyframe_merge_epsilon: Seconds,
    /// Width of the trim handles at each clip edge.
    pub trim_handle_px: f64,
    /// Pointer travel before an armed gesture starts dragging.
    pub drag_slop_px: f64,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            min_clip_duration: 0.1,
            adjacency_epsilon: 0.1,
            keyframe_merge_epsilon: 0.01,
            trim_handle_px: 12.0,
            drag_slop_px: 2.0,
        }
    }
}

/// Bitrate model for the exported file size estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportEstimate {
    pub video_bits_per_second: u64,
    pub audio_bits_per_second: u64,
}

impl Default for ExportEstimate {
    fn default() -> Self {
        Self {
            video_bits_per_second: 2_000_000,
            audio_bits_per_second: 128_000,
        }
    }
}

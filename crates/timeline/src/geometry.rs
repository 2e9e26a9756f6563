//! Time <-> horizontal pixel conversion for the timeline strip.

use crate::{Seconds, Timeline, ZoomSettings};

/// Pixel/time mapping at one fixed rate. Build a fresh one whenever zoom changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pixels_per_second: f64,
}

impl TimeScale {
    pub fn new(pixels_per_second: f64, zoom: &ZoomSettings) -> Self {
        let pps = if pixels_per_second.is_nan() {
            zoom.min_pixels_per_second
        } else {
            pixels_per_second.clamp(zoom.min_pixels_per_second, zoom.max_pixels_per_second)
        };
        Self {
            pixels_per_second: pps,
        }
    }

    pub fn for_timeline(timeline: &Timeline, zoom: &ZoomSettings) -> Self {
        Self {
            pixels_per_second: timeline.pixels_per_second(zoom),
        }
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    pub fn time_to_pixel(&self, time: Seconds) -> f64 {
        time * self.pixels_per_second
    }

    pub fn pixel_to_time(&self, px: f64) -> Seconds {
        px / self.pixels_per_second
    }

    /// Snap tolerance in seconds for a pixel threshold, constant on screen across zoom levels.
    pub fn tolerance_seconds(&self, threshold_px: f64) -> Seconds {
        threshold_px / self.pixels_per_second
    }
}

pub fn zoom_in(timeline: &mut Timeline, zoom: &ZoomSettings) {
    set_zoom(timeline, timeline.zoom * zoom.zoom_step, zoom);
}

pub fn zoom_out(timeline: &mut Timeline, zoom: &ZoomSettings) {
    set_zoom(timeline, timeline.zoom / zoom.zoom_step, zoom);
}

pub fn set_zoom(timeline: &mut Timeline, value: f64, zoom: &ZoomSettings) {
    timeline.zoom = zoom.clamp_zoom(value);
}

/// Zoom so the whole timeline spans `viewport_width` pixels.
///
/// An empty timeline or a non-positive viewport keeps the current zoom. The
/// fit is exact unless the zoom bounds clamp it.
pub fn zoom_to_fit(timeline: &mut Timeline, viewport_width: f64, zoom: &ZoomSettings) {
    let duration = timeline.duration();
    if duration <= 0.0 || viewport_width <= 0.0 {
        return;
    }
    let fitted = viewport_width / (duration * zoom.pixels_per_zoom_unit);
    set_zoom(timeline, fitted, zoom);
}

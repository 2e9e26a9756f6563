//! Keyframe interpolation for the playback side.
//!
//! Values are computed from the active keyframes of one clip and one property.
//! Between two keyframes the destination keyframe's easing shapes the blend;
//! outside the keyframed range the nearest value holds.

use crate::{Easing, Keyframe, KeyframeProperty, Seconds, VideoClip};

/// Normalized progress in `[0, 1]` after easing.
pub fn apply_easing(progress: f64, easing: Easing) -> f64 {
    let t = progress.clamp(0.0, 1.0);

    match easing {
        Easing::Linear => t,

        // Cubic ease-in: t^3
        Easing::EaseIn => t * t * t,

        Easing::EaseOut => {
            // Cubic ease-out: 1 - (1-t)^3
            let inv = 1.0 - t;
            1.0 - inv * inv * inv
        }

        Easing::EaseInOut => {
            // Cubic ease-in-out (smooth S-curve)
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let inv = -2.0 * t + 2.0;
                1.0 - (inv * inv * inv) / 2.0
            }
        }

        Easing::Hold => {
            if t < 1.0 {
                0.0
            } else {
                1.0
            }
        }
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Blend between `k1` and `k2` at `time`.
///
/// Times outside `[k1.time, k2.time]` clamp to the nearer keyframe. Two keyframes
/// at the same time resolve to `k2`.
pub fn interpolate(k1: &Keyframe, k2: &Keyframe, time: Seconds, easing: Easing) -> f64 {
    let span = k2.time - k1.time;
    if span <= 0.0 {
        return k2.value;
    }
    let progress = (time - k1.time) / span;
    lerp(k1.value, k2.value, apply_easing(progress, easing))
}

/// Value of `property` on `clip` at `time`, or `None` when the clip has no
/// active keyframes for it.
pub fn value_at(
    keyframes: &[Keyframe],
    clip: &VideoClip,
    property: KeyframeProperty,
    time: Seconds,
) -> Option<f64> {
    let mut active: Vec<&Keyframe> = keyframes
        .iter()
        .filter(|kf| kf.property == property && kf.is_active_in(clip))
        .collect();
    active.sort_by(|a, b| a.time.total_cmp(&b.time));

    let first = *active.first()?;
    let last = *active.last()?;

    if active.len() == 1 || time <= first.time {
        return Some(first.value);
    }
    if time >= last.time {
        return Some(last.value);
    }

    active
        .windows(2)
        .find(|pair| time >= pair[0].time && time < pair[1].time)
        .map(|pair| interpolate(pair[0], pair[1], time, pair[1].easing))
        .or(Some(last.value))
}

/// Sample `value_at` at a fixed step across `[start, end]` (preview curves).
pub fn sample_range(
    keyframes: &[Keyframe],
    clip: &VideoClip,
    property: KeyframeProperty,
    start: Seconds,
    end: Seconds,
    step: Seconds,
) -> Vec<(Seconds, f64)> {
    if step <= 0.0 || end < start {
        return Vec::new();
    }
    let count = ((end - start) / step + 1e-9).floor() as usize;
    (0..=count)
        .filter_map(|i| {
            let time = start + i as f64 * step;
            value_at(keyframes, clip, property, time).map(|v| (time, v))
        })
        .collect()
}

//! Snap-point index: candidate alignment times and closest-point lookup.

use serde::{Deserialize, Serialize};

use crate::{ClipId, Keyframe, KeyframeId, Seconds, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Grid,
    ClipStart,
    ClipEnd,
    Keyframe,
    Marker,
}

/// A point on the timeline that can be snapped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub time: Seconds,
    pub kind: SnapKind,
    /// Id of the clip, keyframe or marker that produced the point.
    pub owner: Option<String>,
}

impl SnapPoint {
    fn new(time: Seconds, kind: SnapKind, owner: Option<String>) -> Self {
        Self { time, kind, owner }
    }
}

/// Items whose own points must not attract themselves while dragged.
#[derive(Debug, Clone, Default)]
pub struct SnapExclusions {
    pub clip: Option<ClipId>,
    pub keyframe: Option<KeyframeId>,
    /// Keyframes owned by this clip; they travel with it on a move.
    pub keyframes_of: Option<ClipId>,
}

/// All snap points for the current state, sorted ascending by time.
pub fn generate(
    timeline: &Timeline,
    keyframes: &[Keyframe],
    grid_interval: Seconds,
) -> Vec<SnapPoint> {
    generate_excluding(timeline, keyframes, grid_interval, &SnapExclusions::default())
}

pub fn generate_excluding(
    timeline: &Timeline,
    keyframes: &[Keyframe],
    grid_interval: Seconds,
    exclude: &SnapExclusions,
) -> Vec<SnapPoint> {
    let duration = timeline.duration();
    let mut points = Vec::new();

    if grid_interval > 0.0 && grid_interval.is_finite() {
        // Tiny slack so a duration that is an exact multiple still gets its last tick.
        let ticks = (duration / grid_interval + 1e-9).floor() as u64;
        for i in 0..=ticks {
            points.push(SnapPoint::new(i as f64 * grid_interval, SnapKind::Grid, None));
        }
    }

    for clip in timeline.clips() {
        if exclude.clip.as_ref() == Some(&clip.id) {
            continue;
        }
        let owner = Some(clip.id.to_string());
        points.push(SnapPoint::new(clip.position, SnapKind::ClipStart, owner.clone()));
        points.push(SnapPoint::new(clip.end(), SnapKind::ClipEnd, owner));
    }

    for keyframe in keyframes {
        if exclude.keyframe.as_ref() == Some(&keyframe.id)
            || exclude.keyframes_of.as_ref() == Some(&keyframe.clip_id)
        {
            continue;
        }
        points.push(SnapPoint::new(
            keyframe.time,
            SnapKind::Keyframe,
            Some(keyframe.id.to_string()),
        ));
    }

    for marker in &timeline.markers {
        points.push(SnapPoint::new(
            marker.time,
            SnapKind::Marker,
            Some(marker.id.to_string()),
        ));
    }

    // Stable: equal times keep generation order.
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
    points
}

/// Closest point within `tolerance`. Ties go to the earlier point in sorted order.
pub fn find_closest(time: Seconds, points: &[SnapPoint], tolerance: Seconds) -> Option<&SnapPoint> {
    let mut best: Option<(&SnapPoint, f64)> = None;
    for point in points {
        let distance = (point.time - time).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }
    best.filter(|(_, distance)| *distance <= tolerance)
        .map(|(point, _)| point)
}

/// Round to the nearest multiple of `increment`; non-positive increments pass through.
pub fn round_to_increment(time: Seconds, increment: Seconds) -> Seconds {
    if increment <= 0.0 || !increment.is_finite() {
        return time;
    }
    (time / increment).round() * increment
}

//! Canonicalization passes that keep the model well-formed after edits.

use crate::{analysis::analyze_overlaps, Keyframe, Seconds, Timeline, Track, VideoClip};

/// Clips sorted by position. Stable, so equal positions keep their order.
pub fn optimize_clip_order(track: &Track) -> Vec<VideoClip> {
    let mut clips = track.clips.clone();
    clips.sort_by(|a, b| a.position.total_cmp(&b.position));
    clips
}

/// Drop same `(clip, property)` keyframes closer than `epsilon` to an earlier
/// kept one, then sort by time. First occurrence wins.
pub fn optimize_keyframes(keyframes: &[Keyframe], epsilon: Seconds) -> Vec<Keyframe> {
    let mut kept: Vec<Keyframe> = Vec::with_capacity(keyframes.len());
    for keyframe in keyframes {
        let duplicate = kept.iter().any(|k| {
            k.clip_id == keyframe.clip_id
                && k.property == keyframe.property
                && (k.time - keyframe.time).abs() < epsilon
        });
        if !duplicate {
            kept.push(keyframe.clone());
        }
    }
    kept.sort_by(|a, b| a.time.total_cmp(&b.time));
    kept
}

/// Re-sort every track in place.
pub fn normalize_timeline(timeline: &mut Timeline) {
    for track in &mut timeline.tracks {
        track.clips = optimize_clip_order(track);
    }
}

/// Clamp every clip into the model bounds (see [`VideoClip::clamp_to_bounds`]).
/// Returns how many clips were corrected.
pub fn clamp_clip_bounds(timeline: &mut Timeline, min_duration: Seconds) -> usize {
    let mut corrected = 0;
    for clip in timeline.tracks.iter_mut().flat_map(|t| t.clips.iter_mut()) {
        if clip.clamp_to_bounds(min_duration) {
            tracing::debug!(clip = %clip.id, "clip clamped into bounds");
            corrected += 1;
        }
    }
    corrected
}

/// Heuristic weight for "this project is heavy" warnings. Not used for correctness.
pub fn calculate_complexity(timeline: &Timeline, keyframes: &[Keyframe]) -> f64 {
    let clips = timeline.clip_count() as f64;
    let overlaps: usize = timeline.tracks.iter().map(|t| analyze_overlaps(t).len()).sum();
    let active_tracks = timeline.tracks.iter().filter(|t| !t.is_empty()).count();

    clips + 2.0 * overlaps as f64 + 0.5 * keyframes.len() as f64 + 1.5 * active_tracks as f64
}

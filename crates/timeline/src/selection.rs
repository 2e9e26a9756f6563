//! Range selection and adjacency expansion.

use std::collections::HashSet;

use crate::{ClipId, Keyframe, KeyframeId, Seconds, Selection, Timeline, TrackId};

fn ordered(start: Seconds, end: Seconds) -> (Seconds, Seconds) {
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

/// Clips whose `[position, end)` intersects `[start, end)`.
pub fn select_clips_in_range(timeline: &Timeline, start: Seconds, end: Seconds) -> Vec<ClipId> {
    let (start, end) = ordered(start, end);
    timeline
        .clips()
        .filter(|clip| clip.position < end && clip.end() > start)
        .map(|clip| clip.id.clone())
        .collect()
}

/// Keyframes with `start <= time <= end`.
pub fn select_keyframes_in_range(
    keyframes: &[Keyframe],
    start: Seconds,
    end: Seconds,
) -> Vec<KeyframeId> {
    let (start, end) = ordered(start, end);
    keyframes
        .iter()
        .filter(|kf| kf.time >= start && kf.time <= end)
        .map(|kf| kf.id.clone())
        .collect()
}

/// Grow the selection with clips on the same track that touch a selected clip
/// within `epsilon`, following chains of touching clips until nothing new is
/// added. The input order is kept and additions follow in discovery order, so
/// expanding an already-expanded set returns it unchanged.
pub fn expand_selection(timeline: &Timeline, ids: &[ClipId], epsilon: Seconds) -> Vec<ClipId> {
    let mut result: Vec<ClipId> = Vec::with_capacity(ids.len());
    let mut seen: HashSet<ClipId> = HashSet::new();
    for id in ids {
        if seen.insert(id.clone()) {
            result.push(id.clone());
        }
    }

    let mut cursor = 0;
    while cursor < result.len() {
        let current = result[cursor].clone();
        cursor += 1;

        let Some(track) = timeline.track_of(&current) else {
            continue;
        };
        let Some(clip) = track.clip(&current) else {
            continue;
        };

        for other in &track.clips {
            if other.id == clip.id || seen.contains(&other.id) {
                continue;
            }
            let touches_after = (other.position - clip.end()).abs() <= epsilon;
            let touches_before = (other.end() - clip.position).abs() <= epsilon;
            if touches_after || touches_before {
                seen.insert(other.id.clone());
                result.push(other.id.clone());
            }
        }
    }

    result
}

/// Full area-select result: clips, keyframes, their tracks, and the range.
pub fn select_area(
    timeline: &Timeline,
    keyframes: &[Keyframe],
    start: Seconds,
    end: Seconds,
) -> Selection {
    let (start, end) = ordered(start, end);
    let clip_ids = select_clips_in_range(timeline, start, end);

    let mut track_ids: Vec<TrackId> = Vec::new();
    for track in &timeline.tracks {
        if track.clips.iter().any(|c| clip_ids.contains(&c.id)) {
            track_ids.push(track.id.clone());
        }
    }

    Selection {
        clip_ids,
        keyframe_ids: select_keyframes_in_range(keyframes, start, end),
        track_ids,
        range: Some((start, end)),
    }
}

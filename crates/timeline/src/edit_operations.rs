//! Timeline edit operations: split, merge, move, trim and keyframe shifts.
//!
//! Every function reads the current value and returns a new one. `None` means
//! the edit was refused and the caller must leave the model untouched.

use crate::{
    ClipId, IdGenerator, Keyframe, KeyframeId, Seconds, Timeline, TrackId, VideoClip,
};

/// Split `clip_id` at timeline time `at`.
///
/// `at` must lie strictly inside the clip and leave both halves at least
/// `min_duration` long. Returns the truncated original and the new right half;
/// keyframes are not touched (see [`partition_keyframes_for_split`]).
pub fn split_clip(
    timeline: &Timeline,
    clip_id: &ClipId,
    at: Seconds,
    min_duration: Seconds,
    ids: &mut dyn IdGenerator,
) -> Option<(VideoClip, VideoClip)> {
    let clip = timeline.clip(clip_id)?;
    if !clip.contains_strictly(at) {
        tracing::debug!(clip = %clip_id, at, "split point outside clip");
        return None;
    }

    let offset = at - clip.position;
    let right_duration = clip.duration - offset;
    if offset < min_duration || right_duration < min_duration {
        tracing::debug!(clip = %clip_id, at, "split would leave a sliver");
        return None;
    }

    // Source time advances `speed` seconds per timeline second.
    let source_cut = clip.start_time + offset * clip.speed;

    let mut left = clip.clone();
    left.duration = offset;
    left.end_time = source_cut;

    let mut right = clip.clone();
    right.id = ClipId::new(ids.next_id("clip"));
    right.position = at;
    right.duration = right_duration;
    right.start_time = source_cut;

    Some((left, right))
}

/// Put a split result into a copy of the timeline.
pub fn apply_split(timeline: &Timeline, left: VideoClip, right: VideoClip) -> Option<Timeline> {
    let mut next = timeline.clone();
    let track_id = next.track_of(&left.id)?.id.clone();
    next.replace_clip(left);
    next.add_clip(&track_id, right).ok()?;
    Some(next)
}

/// Hand keyframes at or after `at` over to the right half of a split.
pub fn partition_keyframes_for_split(
    keyframes: &[Keyframe],
    original: &ClipId,
    right: &ClipId,
    at: Seconds,
) -> Vec<Keyframe> {
    keyframes
        .iter()
        .map(|kf| {
            let mut kf = kf.clone();
            if &kf.clip_id == original && kf.time >= at {
                kf.clip_id = right.clone();
            }
            kf
        })
        .collect()
}

/// Merge butt-joined clips of one source on one track into a single clip.
///
/// Needs at least two clips, one `source_file_id`, one track, and gaps no wider
/// than `epsilon` between neighbours in position order. The merged clip keeps
/// the first clip's id and spans first start to last end.
pub fn merge_adjacent_clips(
    timeline: &Timeline,
    clip_ids: &[ClipId],
    epsilon: Seconds,
    min_duration: Seconds,
) -> Option<VideoClip> {
    if clip_ids.len() < 2 {
        return None;
    }

    let mut clips = clip_ids
        .iter()
        .map(|id| timeline.clip(id))
        .collect::<Option<Vec<_>>>()?;
    clips.sort_by(|a, b| a.position.total_cmp(&b.position));

    let first = clips[0];
    let last = clips[clips.len() - 1];

    let same_source = clips.iter().all(|c| c.source_file_id == first.source_file_id);
    let same_track = clips.iter().all(|c| c.track_id == first.track_id);
    if !same_source || !same_track {
        tracing::debug!("merge refused: clips differ in source or track");
        return None;
    }

    let adjacent = clips
        .windows(2)
        .all(|pair| (pair[1].position - pair[0].end()).abs() <= epsilon);
    if !adjacent {
        tracing::debug!("merge refused: clips are not adjacent");
        return None;
    }

    let mut merged = first.clone();
    merged.duration = (last.end() - first.position).max(min_duration);
    merged.start_time = first.start_time;
    merged.end_time = last.end_time;
    Some(merged)
}

/// Replace the merged clips with the merged result.
pub fn apply_merge(timeline: &Timeline, merged: VideoClip, absorbed: &[ClipId]) -> Timeline {
    let mut next = timeline.clone();
    for id in absorbed {
        if id != &merged.id {
            next.remove_clip(id);
        }
    }
    next.replace_clip(merged);
    next
}

/// Point every keyframe of `from` clips at `to`.
pub fn reassign_keyframes(keyframes: &[Keyframe], from: &[ClipId], to: &ClipId) -> Vec<Keyframe> {
    keyframes
        .iter()
        .map(|kf| {
            let mut kf = kf.clone();
            if from.contains(&kf.clip_id) {
                kf.clip_id = to.clone();
            }
            kf
        })
        .collect()
}

/// Shift the keyframes of `clip_id` by `delta`, never before zero.
pub fn offset_keyframes(keyframes: &[Keyframe], clip_id: &ClipId, delta: Seconds) -> Vec<Keyframe> {
    keyframes
        .iter()
        .map(|kf| {
            let mut kf = kf.clone();
            if &kf.clip_id == clip_id {
                kf.time = (kf.time + delta).max(0.0);
            }
            kf
        })
        .collect()
}

/// Fresh copies of `from`'s keyframes, owned by `to` and shifted by `delta`.
pub fn copy_keyframes(
    keyframes: &[Keyframe],
    from: &ClipId,
    to: &ClipId,
    delta: Seconds,
    ids: &mut dyn IdGenerator,
) -> Vec<Keyframe> {
    keyframes
        .iter()
        .filter(|kf| &kf.clip_id == from)
        .map(|kf| Keyframe {
            id: KeyframeId::new(ids.next_id("kf")),
            clip_id: to.clone(),
            time: (kf.time + delta).max(0.0),
            ..kf.clone()
        })
        .collect()
}

/// Move a clip to `position` on `target_track`.
///
/// Missing or locked target tracks keep the clip on its current track.
pub fn move_clip(
    timeline: &Timeline,
    clip_id: &ClipId,
    target_track: Option<&TrackId>,
    position: Seconds,
) -> Option<Timeline> {
    let mut next = timeline.clone();
    let mut clip = next.remove_clip(clip_id)?;
    let source_track = clip.track_id.clone();

    let destination = target_track
        .and_then(|id| next.track(id))
        .filter(|track| !track.locked)
        .map(|track| track.id.clone())
        .unwrap_or(source_track);

    clip.position = position.max(0.0);
    next.add_clip(&destination, clip).ok()?;
    Some(next)
}

fn effective_speed(clip: &VideoClip) -> f64 {
    if clip.speed > 0.0 {
        clip.speed
    } else {
        1.0
    }
}

/// Range the left edge of `clip` may be trimmed to: no earlier than the first
/// source frame, never below zero, and at least `min_duration` before the end.
pub fn trim_start_bounds(clip: &VideoClip, min_duration: Seconds) -> (Seconds, Seconds) {
    let earliest = (clip.position - clip.start_time / effective_speed(clip)).max(0.0);
    let latest = (clip.end() - min_duration).max(earliest);
    (earliest, latest)
}

/// Move the clip's left edge to `new_position`, keeping its right edge fixed.
pub fn trim_clip_start(
    timeline: &Timeline,
    clip_id: &ClipId,
    new_position: Seconds,
    min_duration: Seconds,
) -> Option<Timeline> {
    let clip = timeline.clip(clip_id)?;
    let end = clip.end();
    let speed = effective_speed(clip);
    let (earliest, latest) = trim_start_bounds(clip, min_duration);
    let position = new_position.clamp(earliest, latest);

    let mut trimmed = clip.clone();
    trimmed.start_time = (clip.start_time + (position - clip.position) * speed).max(0.0);
    trimmed.position = position;
    trimmed.duration = (end - position).max(min_duration);

    let mut next = timeline.clone();
    next.replace_clip(trimmed);
    Some(next)
}

/// Move the clip's right edge to `new_end`, keeping its left edge fixed.
pub fn trim_clip_end(
    timeline: &Timeline,
    clip_id: &ClipId,
    new_end: Seconds,
    min_duration: Seconds,
) -> Option<Timeline> {
    let clip = timeline.clip(clip_id)?;

    let mut trimmed = clip.clone();
    trimmed.duration = (new_end - clip.position).max(min_duration);
    trimmed.end_time = clip.start_time + trimmed.duration * clip.speed;

    let mut next = timeline.clone();
    next.replace_clip(trimmed);
    Some(next)
}

pub fn move_keyframe(
    keyframes: &[Keyframe],
    keyframe_id: &KeyframeId,
    time: Seconds,
) -> Option<Vec<Keyframe>> {
    if !keyframes.iter().any(|kf| &kf.id == keyframe_id) {
        return None;
    }
    Some(
        keyframes
            .iter()
            .map(|kf| {
                let mut kf = kf.clone();
                if &kf.id == keyframe_id {
                    kf.time = time.max(0.0);
                }
                kf
            })
            .collect(),
    )
}

/// Place the playhead, clamped to `[0, duration]`.
pub fn set_playhead(timeline: &Timeline, time: Seconds) -> Timeline {
    let mut next = timeline.clone();
    next.current_time = time.clamp(0.0, timeline.duration().max(0.0));
    next
}

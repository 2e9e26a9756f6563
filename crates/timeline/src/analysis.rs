//! Read-only facts derived from the timeline: overlaps, gaps, totals, size
//! estimate, and reference integrity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    optimize::optimize_clip_order, ClipId, ExportEstimate, Keyframe, KeyframeId, Seconds,
    Timeline, Track, TrackId, TrackKind, VideoClip,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub track_id: TrackId,
    pub first: ClipId,
    pub second: ClipId,
    pub start: Seconds,
    pub end: Seconds,
    pub overlap_duration: Seconds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub track_id: TrackId,
    pub before: ClipId,
    pub after: ClipId,
    pub start: Seconds,
    pub end: Seconds,
    pub duration: Seconds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineAnalysis {
    pub total_duration: Seconds,
    /// Tracks holding at least one clip.
    pub track_count: usize,
    pub clip_count: usize,
    pub overlaps: Vec<Overlap>,
    pub gaps: Vec<Gap>,
    pub keyframe_count: usize,
    /// Bytes. A flat-bitrate approximation, not a codec prediction.
    pub estimated_file_size: u64,
}

/// Overlaps between neighbours in position order.
///
/// Only adjacent pairs are compared, so three mutually overlapping clips come
/// back as two pairwise records.
pub fn analyze_overlaps(track: &Track) -> Vec<Overlap> {
    let clips = optimize_clip_order(track);
    clips
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            if a.end() > b.position {
                let end = a.end().min(b.end());
                Some(Overlap {
                    track_id: track.id.clone(),
                    first: a.id.clone(),
                    second: b.id.clone(),
                    start: b.position,
                    end,
                    overlap_duration: end - b.position,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Empty stretches between neighbours in position order.
pub fn analyze_gaps(track: &Track) -> Vec<Gap> {
    let clips = optimize_clip_order(track);
    clips
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            if b.position > a.end() {
                Some(Gap {
                    track_id: track.id.clone(),
                    before: a.id.clone(),
                    after: b.id.clone(),
                    start: a.end(),
                    end: b.position,
                    duration: b.position - a.end(),
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn analyze_timeline(
    timeline: &Timeline,
    keyframes: &[Keyframe],
    estimate: &ExportEstimate,
) -> TimelineAnalysis {
    let total_duration = timeline
        .tracks
        .iter()
        .filter(|t| !t.is_empty())
        .map(Track::end)
        .fold(0.0, f64::max);

    let mut overlaps = Vec::new();
    let mut gaps = Vec::new();
    for track in &timeline.tracks {
        overlaps.extend(analyze_overlaps(track));
        gaps.extend(analyze_gaps(track));
    }

    TimelineAnalysis {
        total_duration,
        track_count: timeline.tracks.iter().filter(|t| !t.is_empty()).count(),
        clip_count: timeline.clip_count(),
        overlaps,
        gaps,
        keyframe_count: keyframes.len(),
        estimated_file_size: estimate_file_size(timeline, total_duration, estimate),
    }
}

/// `(video_tracks * video_bps + audio_tracks * audio_bps) * duration / 8` bytes.
/// Only tracks that hold clips contribute a stream; text tracks never do.
pub fn estimate_file_size(
    timeline: &Timeline,
    total_duration: Seconds,
    estimate: &ExportEstimate,
) -> u64 {
    let count = |kind: TrackKind| {
        timeline
            .tracks
            .iter()
            .filter(|t| t.kind == kind && !t.is_empty())
            .count() as f64
    };
    let bits_per_second = count(TrackKind::Video) * estimate.video_bits_per_second as f64
        + count(TrackKind::Audio) * estimate.audio_bits_per_second as f64;
    let bytes = bits_per_second * total_duration.max(0.0) / 8.0;
    bytes.round() as u64
}

/// Referential problems the engine does not repair on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ReferenceIssue {
    /// Keyframe points at a clip that no longer exists.
    OrphanedKeyframe { keyframe: KeyframeId, clip: ClipId },
    /// Keyframe lies outside its clip's span and is inert.
    InactiveKeyframe { keyframe: KeyframeId, clip: ClipId, time: Seconds },
    /// Clip's back-reference disagrees with the track holding it.
    MisplacedClip { clip: ClipId, recorded: TrackId, actual: TrackId },
}

pub fn validate_references(timeline: &Timeline, keyframes: &[Keyframe]) -> Vec<ReferenceIssue> {
    let mut issues = Vec::new();

    let mut clips: HashMap<&ClipId, &VideoClip> = HashMap::new();
    for track in &timeline.tracks {
        for clip in &track.clips {
            if clip.track_id != track.id {
                issues.push(ReferenceIssue::MisplacedClip {
                    clip: clip.id.clone(),
                    recorded: clip.track_id.clone(),
                    actual: track.id.clone(),
                });
            }
            clips.insert(&clip.id, clip);
        }
    }

    for keyframe in keyframes {
        match clips.get(&keyframe.clip_id) {
            None => issues.push(ReferenceIssue::OrphanedKeyframe {
                keyframe: keyframe.id.clone(),
                clip: keyframe.clip_id.clone(),
            }),
            Some(clip) if !keyframe.is_active_in(clip) => {
                issues.push(ReferenceIssue::InactiveKeyframe {
                    keyframe: keyframe.id.clone(),
                    clip: clip.id.clone(),
                    time: keyframe.time,
                })
            }
            Some(_) => {}
        }
    }

    if !issues.is_empty() {
        tracing::warn!(count = issues.len(), "timeline has reference issues");
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyframeProperty;

    fn track(clips: &[(&str, f64, f64)]) -> Track {
        clips.iter().fold(Track::new("v1", TrackKind::Video), |t, (id, pos, dur)| {
            t.with_clip(VideoClip::new(*id, "", "src", *pos, *dur))
        })
    }

    #[test]
    fn test_single_overlap() {
        let overlaps = analyze_overlaps(&track(&[("b", 3.0, 5.0), ("a", 0.0, 5.0)]));
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].start, 3.0);
        assert_eq!(overlaps[0].end, 5.0);
        assert_eq!(overlaps[0].overlap_duration, 2.0);
        assert_eq!(overlaps[0].first, ClipId::from("a"));
    }

    #[test]
    fn test_triple_overlap_reports_pairs() {
        let overlaps =
            analyze_overlaps(&track(&[("a", 0.0, 6.0), ("b", 2.0, 6.0), ("c", 4.0, 6.0)]));
        assert_eq!(overlaps.len(), 2);
    }

    #[test]
    fn test_single_gap() {
        let gaps = analyze_gaps(&track(&[("a", 0.0, 5.0), ("b", 8.0, 2.0)]));
        assert_eq!(gaps.len(), 1);
        assert_eq!((gaps[0].start, gaps[0].end, gaps[0].duration), (5.0, 8.0, 3.0));
        assert!(analyze_overlaps(&track(&[("a", 0.0, 5.0), ("b", 5.0, 2.0)])).is_empty());
    }

    #[test]
    fn test_analyze_timeline_totals() {
        let timeline = Timeline::new()
            .with_track(track(&[("a", 0.0, 5.0), ("b", 8.0, 2.0)]))
            .with_track(
                Track::new("a1", TrackKind::Audio)
                    .with_clip(VideoClip::new("s", "", "song", 0.0, 4.0)),
            )
            .with_track(Track::new("empty", TrackKind::Video));
        let keyframes = vec![Keyframe::new("k", "a", KeyframeProperty::Opacity, 1.0, 0.0)];

        let analysis = analyze_timeline(&timeline, &keyframes, &ExportEstimate::default());
        assert_eq!(analysis.total_duration, 10.0);
        assert_eq!(analysis.track_count, 2);
        assert_eq!(analysis.clip_count, 3);
        assert_eq!(analysis.gaps.len(), 1);
        assert_eq!(analysis.keyframe_count, 1);
        // (2_000_000 + 128_000) * 10 / 8
        assert_eq!(analysis.estimated_file_size, 2_660_000);
    }

    #[test]
    fn test_validate_references() {
        let mut timeline = Timeline::new().with_track(track(&[("a", 0.0, 5.0)]));
        timeline.tracks[0].clips[0].track_id = "elsewhere".into();
        let keyframes = vec![
            Keyframe::new("ok", "a", KeyframeProperty::Opacity, 5.0, 1.0),
            Keyframe::new("late", "a", KeyframeProperty::Opacity, 7.0, 1.0),
            Keyframe::new("lost", "gone", KeyframeProperty::Opacity, 1.0, 1.0),
        ];

        let issues = validate_references(&timeline, &keyframes);
        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], ReferenceIssue::MisplacedClip { .. }));
        assert!(matches!(
            &issues[1],
            ReferenceIssue::InactiveKeyframe { keyframe, .. } if keyframe.as_str() == "late"
        ));
        assert!(matches!(
            &issues[2],
            ReferenceIssue::OrphanedKeyframe { keyframe, .. } if keyframe.as_str() == "lost"
        ));
    }
}

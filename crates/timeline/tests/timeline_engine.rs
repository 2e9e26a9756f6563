//! End-to-end checks through the public API: geometry, editing, analysis,
//! selection, optimizer, and a full gesture through an editor session.

use timeline::{
    analysis::{analyze_gaps, analyze_overlaps},
    edit_operations::{apply_split, merge_adjacent_clips, split_clip},
    geometry::TimeScale,
    optimize::optimize_keyframes,
    selection::{expand_selection, select_clips_in_range},
    snapping::{find_closest, generate},
    ClipId, DragKind, DragPreview, EditorSession, EngineConfig, GestureOutcome, HitTarget, Keyframe,
    KeyframeProperty, SequentialIdGenerator, Timeline, TimelineDocument, Track, TrackKind,
    VideoClip, ZoomSettings,
};

fn single_track(clips: &[(&str, &str, f64, f64)]) -> Timeline {
    let track = clips
        .iter()
        .fold(Track::new("v1", TrackKind::Video), |t, (id, src, pos, dur)| {
            t.with_clip(VideoClip::new(*id, "", *src, *pos, *dur))
        });
    Timeline::new().with_track(track)
}

fn session() -> EditorSession {
    let ids = Box::new(SequentialIdGenerator::new());
    EditorSession::with_id_generator(EngineConfig::default(), ids)
}

#[test]
fn test_geometry_round_trip() {
    let zoom = ZoomSettings::default();
    for pps in [10.0, 20.0, 37.5, 200.0] {
        let scale = TimeScale::new(pps, &zoom);
        for t in [0.0, 0.001, 1.0, 12.345, 3600.0] {
            let back = scale.pixel_to_time(scale.time_to_pixel(t));
            assert!((back - t).abs() < 1e-6, "pps {pps} t {t} -> {back}");
        }
    }
}

#[test]
fn test_split_conservation() {
    let timeline = single_track(&[("c", "A", 10.0, 20.0)]);
    let mut ids = SequentialIdGenerator::new();

    let (left, right) = split_clip(&timeline, &"c".into(), 18.0, 0.1, &mut ids).unwrap();
    assert_eq!(left.duration + right.duration, 20.0);
    assert_eq!(left.duration, 8.0);
    assert_eq!(right.position, 18.0);
    assert_eq!(right.start_time, left.start_time + 8.0);

    let next = apply_split(&timeline, left, right).unwrap();
    assert_eq!(next.clip_count(), 2);
    assert_eq!(next.duration(), 30.0);
}

#[test]
fn test_split_rejection_leaves_model() {
    let mut session = session();
    session.add_track(Track::new("v1", TrackKind::Video)).unwrap();
    session
        .add_clip(&"v1".into(), VideoClip::new("c", "", "A", 10.0, 20.0))
        .unwrap();
    let before = session.document();

    for at in [10.0, 30.0, 35.0] {
        assert!(session.split_clip_at(&"c".into(), at).is_err(), "split at {at}");
    }
    assert_eq!(session.document(), before);
}

#[test]
fn test_merge_adjacency() {
    let adjacent = single_track(&[("a", "A", 0.0, 5.0), ("b", "A", 5.0, 3.0)]);
    let ids: Vec<ClipId> = vec!["a".into(), "b".into()];
    let merged = merge_adjacent_clips(&adjacent, &ids, 0.1, 0.1).unwrap();
    assert_eq!((merged.position, merged.duration), (0.0, 8.0));

    let gapped = single_track(&[("a", "A", 0.0, 5.0), ("b", "A", 6.0, 3.0)]);
    assert!(merge_adjacent_clips(&gapped, &ids, 0.1, 0.1).is_none());
}

#[test]
fn test_overlap_and_gap_detection() {
    let overlapping = single_track(&[("a", "A", 0.0, 5.0), ("b", "A", 3.0, 5.0)]);
    let overlaps = analyze_overlaps(&overlapping.tracks[0]);
    assert_eq!(overlaps.len(), 1);
    assert_eq!((overlaps[0].start, overlaps[0].end), (3.0, 5.0));
    assert_eq!(overlaps[0].overlap_duration, 2.0);

    let spaced = single_track(&[("a", "A", 0.0, 5.0), ("b", "A", 8.0, 2.0)]);
    let gaps = analyze_gaps(&spaced.tracks[0]);
    assert_eq!(gaps.len(), 1);
    assert_eq!((gaps[0].start, gaps[0].end, gaps[0].duration), (5.0, 8.0, 3.0));
}

#[test]
fn test_expand_selection_is_fixed_point() {
    let timeline = single_track(&[
        ("a", "A", 0.0, 5.0),
        ("b", "A", 5.05, 5.0),
        ("c", "A", 10.05, 2.0),
        ("far", "A", 20.0, 1.0),
    ]);
    let once = expand_selection(&timeline, &["b".into()], 0.1);
    let twice = expand_selection(&timeline, &once, 0.1);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 3);
    assert!(!once.contains(&"far".into()));
}

#[test]
fn test_keyframe_dedup() {
    let keyframes = vec![
        Keyframe::new("k1", "a", KeyframeProperty::Opacity, 1.0, 0.0),
        Keyframe::new("k2", "a", KeyframeProperty::Opacity, 1.005, 0.5),
        Keyframe::new("k3", "b", KeyframeProperty::Opacity, 3.0, 0.0),
        Keyframe::new("k4", "b", KeyframeProperty::Opacity, 3.02, 0.5),
    ];
    let kept: Vec<_> = optimize_keyframes(&keyframes, 0.01)
        .into_iter()
        .map(|kf| kf.id.to_string())
        .collect();
    assert_eq!(kept, vec!["k1", "k3", "k4"]);
}

#[test]
fn test_selection_range_half_open() {
    let timeline = single_track(&[
        ("a", "A", 0.0, 5.0),
        ("b", "A", 5.0, 5.0),
        ("c", "A", 12.0, 3.0),
    ]);
    let first_two = select_clips_in_range(&timeline, 4.0, 12.0);
    assert_eq!(first_two, vec![ClipId::from("a"), ClipId::from("b")]);

    // Intersection, not containment: [12, 15) overlaps [4, 13).
    let wider = select_clips_in_range(&timeline, 4.0, 13.0);
    assert_eq!(wider.len(), 3);
}

#[test]
fn test_snap_tie_prefers_earlier_point() {
    let timeline = single_track(&[("a", "A", 0.0, 4.0), ("b", "A", 6.0, 2.0)]);
    let points = generate(&timeline, &[], 0.0);
    let hit = find_closest(5.0, &points, 1.0).unwrap();
    assert_eq!(hit.time, 4.0);
    assert!(find_closest(5.0, &points, 0.5).is_none());
}

#[test]
fn test_gesture_commit_and_cancel() {
    let mut session = session();
    session.add_track(Track::new("v1", TrackKind::Video)).unwrap();
    session
        .add_clip(&"v1".into(), VideoClip::new("a", "", "A", 0.0, 5.0))
        .unwrap();
    session
        .add_clip(&"v1".into(), VideoClip::new("b", "", "A", 10.0, 5.0))
        .unwrap();
    let kf = session
        .add_keyframe(&"b".into(), KeyframeProperty::Opacity, 12.0, 1.0, Default::default())
        .unwrap();
    session.config_mut().snapping.enabled = false;

    // Cancelled drag: nothing changes.
    let before = session.document();
    let target = HitTarget::Clip { clip_id: "b".into(), offset_px: 50.0 };
    assert_eq!(session.pointer_down(250.0, target.clone()), Some(DragKind::ClipMove));
    assert!(session.pointer_move(200.0, None).is_some());
    session.cancel_gesture();
    assert_eq!(session.pointer_up(), GestureOutcome::None);
    assert_eq!(session.document(), before);

    // Committed drag: clip and its keyframe move 2.5s earlier.
    session.pointer_down(250.0, target);
    session.pointer_move(200.0, None);
    let outcome = session.pointer_up();
    assert!(matches!(
        outcome,
        GestureOutcome::Committed(DragPreview::ClipMove { position, .. }) if position == 7.5
    ));
    assert_eq!(session.timeline().clip(&"b".into()).unwrap().position, 7.5);
    let moved = session.keyframes().iter().find(|k| k.id == kf).unwrap();
    assert_eq!(moved.time, 9.5);
    assert!(session.gestures().is_idle());
}

#[test]
fn test_document_round_trip_through_session() {
    let mut session = session();
    session.add_track(Track::new("v1", TrackKind::Video)).unwrap();
    session
        .add_clip(&"v1".into(), VideoClip::new("a", "", "A", 0.0, 5.0))
        .unwrap();
    session.add_marker(2.0, "beat");
    session.select_range(0.0, 1.0);

    let json = session.document().to_json_string().unwrap();
    let restored = EditorSession::from_document(
        TimelineDocument::from_json_str(&json).unwrap(),
        EngineConfig::default(),
    );
    assert_eq!(restored.timeline().clip_count(), 1);
    assert_eq!(restored.timeline().markers.len(), 1);
    assert!(restored.selection().is_empty());
}

fn editing_session(clip: VideoClip) -> EditorSession {
    let mut session = session();
    session.add_track(Track::new("v1", TrackKind::Video)).unwrap();
    session.add_clip(&"v1".into(), clip).unwrap();
    session.config_mut().snapping.enabled = false;
    session
}

#[test]
fn test_trim_start_drag_commits_what_it_previewed() {
    let mut session = editing_session(VideoClip::new("b", "", "A", 10.0, 5.0).with_trim(4.0, 9.0));
    let target = HitTarget::Clip { clip_id: "b".into(), offset_px: 3.0 };
    assert_eq!(session.pointer_down(200.0, target), Some(DragKind::TrimStart));

    let update = session.pointer_move(100.0, None).unwrap();
    assert_eq!(update.preview, DragPreview::TrimStart { clip_id: "b".into(), position: 6.0 });
    assert_eq!(session.timeline().clip(&"b".into()).unwrap().position, 10.0);

    assert_eq!(session.pointer_up(), GestureOutcome::Committed(update.preview));
    let clip = session.timeline().clip(&"b".into()).unwrap();
    assert_eq!((clip.position, clip.start_time, clip.duration), (6.0, 0.0, 9.0));
    assert_eq!(clip.end(), 15.0);
}

#[test]
fn test_keyframe_drag_commits_new_time() {
    let mut session = editing_session(VideoClip::new("a", "", "A", 0.0, 10.0));
    let kf = session
        .add_keyframe(&"a".into(), KeyframeProperty::Opacity, 2.0, 0.5, Default::default())
        .unwrap();

    let target = HitTarget::Keyframe { keyframe_id: kf.clone() };
    assert_eq!(session.pointer_down(40.0, target), Some(DragKind::KeyframeMove));
    session.pointer_move(100.0, None).unwrap();
    assert!(matches!(
        session.pointer_up(),
        GestureOutcome::Committed(DragPreview::KeyframeMove { time, .. }) if time == 5.0
    ));

    let moved = session.keyframes().iter().find(|k| k.id == kf).unwrap();
    assert_eq!((moved.time, moved.value), (5.0, 0.5));
    assert!(session.gestures().is_idle());
}

#[test]
fn test_playhead_drag_clamps_to_duration() {
    let mut session = editing_session(VideoClip::new("a", "", "A", 0.0, 10.0));
    session.set_playhead(2.0);

    assert_eq!(session.pointer_down(40.0, HitTarget::Playhead), Some(DragKind::PlayheadMove));
    session.pointer_move(500.0, None).unwrap();
    assert_eq!(
        session.pointer_up(),
        GestureOutcome::Committed(DragPreview::PlayheadMove { time: 10.0 })
    );
    assert_eq!(session.timeline().current_time, 10.0);
}

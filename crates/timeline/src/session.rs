//! One editing session: the timeline, its keyframes, and the gesture in flight.
//!
//! Every mutation builds the next value with the pure functions in
//! [`crate::edit_operations`], normalizes it, and swaps it in. A refused edit
//! leaves the session exactly as it was.

use crate::{
    analysis::{analyze_timeline, validate_references},
    automation::value_at,
    edit_operations::{
        apply_merge, apply_split, copy_keyframes, merge_adjacent_clips,
        partition_keyframes_for_split, reassign_keyframes, set_playhead, split_clip,
    },
    geometry::{set_zoom, zoom_in, zoom_out, zoom_to_fit},
    gesture::{apply_preview, DragUpdate},
    optimize::{calculate_complexity, clamp_clip_bounds, normalize_timeline, optimize_keyframes},
    selection::{expand_selection, select_area},
    ClipId, DragKind, Easing, EngineConfig, GestureController, GestureOutcome, HitTarget,
    IdGenerator, Keyframe, KeyframeId, KeyframeProperty, Marker, MarkerId, ReferenceIssue, Result,
    Seconds, Selection, Timeline, TimelineAnalysis, TimelineDocument, TimelineError, Track, TrackId,
    UuidIdGenerator, VideoClip,
};

pub struct EditorSession {
    timeline: Timeline,
    keyframes: Vec<Keyframe>,
    config: EngineConfig,
    ids: Box<dyn IdGenerator + Send>,
    gestures: GestureController,
}

impl EditorSession {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_id_generator(config, Box::new(UuidIdGenerator))
    }

    pub fn with_id_generator(config: EngineConfig, ids: Box<dyn IdGenerator + Send>) -> Self {
        Self {
            timeline: Timeline::new(),
            keyframes: Vec::new(),
            config,
            ids,
            gestures: GestureController::new(),
        }
    }

    /// Open a saved document. Out-of-range clips are clamped, and clip order and
    /// keyframe duplicates are normalized on the way in.
    pub fn from_document(document: TimelineDocument, config: EngineConfig) -> Self {
        let mut session = Self::new(config);
        session.commit(document.timeline, document.keyframes);
        session
    }

    pub fn set_id_generator(&mut self, ids: Box<dyn IdGenerator + Send>) {
        self.ids = ids;
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.timeline.selection
    }

    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    pub fn document(&self) -> TimelineDocument {
        TimelineDocument {
            timeline: self.timeline.clone(),
            keyframes: self.keyframes.clone(),
        }
    }

    fn commit(&mut self, mut timeline: Timeline, mut keyframes: Vec<Keyframe>) {
        let editing = &self.config.editing;
        let corrected = clamp_clip_bounds(&mut timeline, editing.min_clip_duration);
        if corrected > 0 {
            tracing::debug!(corrected, "clamped out-of-range clips");
        }
        normalize_timeline(&mut timeline);
        for keyframe in &mut keyframes {
            keyframe.time = keyframe.time.max(0.0);
        }
        self.keyframes = optimize_keyframes(&keyframes, editing.keyframe_merge_epsilon);
        self.timeline = timeline;
    }

    fn unlocked_track_of(&self, clip_id: &ClipId) -> Result<&Track> {
        let track = self
            .timeline
            .track_of(clip_id)
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.clone()))?;
        if track.locked {
            tracing::warn!(clip = %clip_id, track = %track.id, "edit refused on locked track");
            return Err(TimelineError::TrackLocked(track.id.clone()));
        }
        Ok(track)
    }

    // Structure

    pub fn add_track(&mut self, track: Track) -> Result<TrackId> {
        if self.timeline.track(&track.id).is_some() {
            return Err(TimelineError::InvalidOp(format!("duplicate track id {}", track.id)));
        }
        let id = track.id.clone();
        let mut next = self.timeline.clone();
        next.tracks.push(track);
        self.commit(next, self.keyframes.clone());
        tracing::info!(track = %id, "track added");
        Ok(id)
    }

    /// Place a clip on a track. Empty ids are filled from the id generator, and a
    /// negative position or too-short duration is clamped rather than refused.
    pub fn add_clip(&mut self, track_id: &TrackId, mut clip: VideoClip) -> Result<ClipId> {
        let track = self
            .timeline
            .track(track_id)
            .ok_or_else(|| TimelineError::TrackNotFound(track_id.clone()))?;
        if track.locked {
            return Err(TimelineError::TrackLocked(track_id.clone()));
        }
        if clip.id.as_str().is_empty() {
            clip.id = ClipId::new(self.ids.next_id("clip"));
        } else if self.timeline.clip(&clip.id).is_some() {
            return Err(TimelineError::InvalidOp(format!("duplicate clip id {}", clip.id)));
        }

        let id = clip.id.clone();
        let mut next = self.timeline.clone();
        next.add_clip(track_id, clip)?;
        self.commit(next, self.keyframes.clone());
        tracing::info!(clip = %id, track = %track_id, "clip added");
        Ok(id)
    }

    /// Remove a clip together with every keyframe that belongs to it.
    pub fn delete_clip(&mut self, clip_id: &ClipId) -> Result<VideoClip> {
        self.unlocked_track_of(clip_id)?;

        let mut next = self.timeline.clone();
        let removed = next
            .remove_clip(clip_id)
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.clone()))?;
        next.selection.clip_ids.retain(|id| id != clip_id);

        let dropped: Vec<KeyframeId> = self
            .keyframes
            .iter()
            .filter(|kf| &kf.clip_id == clip_id)
            .map(|kf| kf.id.clone())
            .collect();
        next.selection.keyframe_ids.retain(|id| !dropped.contains(id));
        let keyframes = self
            .keyframes
            .iter()
            .filter(|kf| &kf.clip_id != clip_id)
            .cloned()
            .collect();

        self.commit(next, keyframes);
        tracing::info!(clip = %clip_id, keyframes = dropped.len(), "clip deleted");
        Ok(removed)
    }

    /// Split at `at`; the right half takes over keyframes at or after the cut.
    /// Returns the new clip's id.
    pub fn split_clip_at(&mut self, clip_id: &ClipId, at: Seconds) -> Result<ClipId> {
        self.unlocked_track_of(clip_id)?;

        let Some((left, right)) = split_clip(
            &self.timeline,
            clip_id,
            at,
            self.config.editing.min_clip_duration,
            self.ids.as_mut(),
        ) else {
            tracing::warn!(clip = %clip_id, at, "split refused");
            return Err(TimelineError::InvalidOp(format!("cannot split {clip_id} at {at}")));
        };

        let right_id = right.id.clone();
        let next = apply_split(&self.timeline, left, right)
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.clone()))?;
        let keyframes = partition_keyframes_for_split(&self.keyframes, clip_id, &right_id, at);
        self.commit(next, keyframes);
        tracing::info!(clip = %clip_id, new_clip = %right_id, at, "clip split");
        Ok(right_id)
    }

    /// Merge adjacent clips. Keyframes of absorbed clips move to the survivor.
    pub fn merge_clips(&mut self, clip_ids: &[ClipId]) -> Result<ClipId> {
        for id in clip_ids {
            self.unlocked_track_of(id)?;
        }

        let editing = &self.config.editing;
        let Some(merged) = merge_adjacent_clips(
            &self.timeline,
            clip_ids,
            editing.adjacency_epsilon,
            editing.min_clip_duration,
        ) else {
            tracing::warn!(clips = clip_ids.len(), "merge refused");
            return Err(TimelineError::InvalidOp("clips cannot be merged".to_string()));
        };

        let merged_id = merged.id.clone();
        let mut next = apply_merge(&self.timeline, merged, clip_ids);
        next.selection.clip_ids.retain(|id| id == &merged_id || !clip_ids.contains(id));
        let keyframes = reassign_keyframes(&self.keyframes, clip_ids, &merged_id);
        self.commit(next, keyframes);
        tracing::info!(clip = %merged_id, absorbed = clip_ids.len() - 1, "clips merged");
        Ok(merged_id)
    }

    /// Copy a clip to just after itself on the same track, keyframes included.
    pub fn duplicate_clip(&mut self, clip_id: &ClipId) -> Result<ClipId> {
        let track_id = self.unlocked_track_of(clip_id)?.id.clone();
        let original = self
            .timeline
            .clip(clip_id)
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.clone()))?;

        let mut copy = original.clone();
        copy.id = ClipId::new(self.ids.next_id("clip"));
        copy.position = original.end();
        let delta = copy.position - original.position;
        let copy_id = copy.id.clone();

        let mut next = self.timeline.clone();
        next.add_clip(&track_id, copy)?;
        let mut keyframes = self.keyframes.clone();
        let copies = copy_keyframes(&self.keyframes, clip_id, &copy_id, delta, self.ids.as_mut());
        keyframes.extend(copies);

        self.commit(next, keyframes);
        tracing::info!(clip = %clip_id, copy = %copy_id, "clip duplicated");
        Ok(copy_id)
    }

    // Keyframes

    pub fn add_keyframe(
        &mut self,
        clip_id: &ClipId,
        property: KeyframeProperty,
        time: Seconds,
        value: f64,
        easing: Easing,
    ) -> Result<KeyframeId> {
        let clip = self
            .timeline
            .clip(clip_id)
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.clone()))?;
        let keyframe = Keyframe::new(self.ids.next_id("kf"), clip_id.clone(), property, time, value)
            .with_easing(easing);
        if !keyframe.is_active_in(clip) {
            tracing::warn!(clip = %clip_id, time, "keyframe outside its clip is inert");
        }

        let id = keyframe.id.clone();
        let mut keyframes = self.keyframes.clone();
        keyframes.push(keyframe);
        self.commit(self.timeline.clone(), keyframes);

        // The optimizer may have folded it into an existing neighbour.
        if self.keyframes.iter().any(|kf| kf.id == id) {
            Ok(id)
        } else {
            Err(TimelineError::InvalidOp(format!(
                "keyframe at {time} duplicates an existing one"
            )))
        }
    }

    pub fn remove_keyframe(&mut self, keyframe_id: &KeyframeId) -> Result<Keyframe> {
        let idx = self
            .keyframes
            .iter()
            .position(|kf| &kf.id == keyframe_id)
            .ok_or_else(|| TimelineError::KeyframeNotFound(keyframe_id.clone()))?;
        let mut keyframes = self.keyframes.clone();
        let removed = keyframes.remove(idx);
        let mut next = self.timeline.clone();
        next.selection.keyframe_ids.retain(|id| id != keyframe_id);
        self.commit(next, keyframes);
        Ok(removed)
    }

    pub fn value_at(
        &self,
        clip_id: &ClipId,
        property: KeyframeProperty,
        time: Seconds,
    ) -> Result<Option<f64>> {
        let clip = self
            .timeline
            .clip(clip_id)
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.clone()))?;
        Ok(value_at(&self.keyframes, clip, property, time))
    }

    // Markers

    pub fn add_marker(&mut self, time: Seconds, label: impl Into<String>) -> MarkerId {
        let marker = Marker::new(self.ids.next_id("marker"), time, label);
        let mut next = self.timeline.clone();
        let id = next.add_marker(marker);
        self.commit(next, self.keyframes.clone());
        id
    }

    pub fn remove_marker(&mut self, marker_id: &MarkerId) -> Result<Marker> {
        let mut next = self.timeline.clone();
        let removed = next
            .remove_marker(marker_id)
            .ok_or_else(|| TimelineError::MarkerNotFound(marker_id.clone()))?;
        self.commit(next, self.keyframes.clone());
        Ok(removed)
    }

    // Playhead and zoom

    pub fn set_playhead(&mut self, time: Seconds) {
        self.timeline = set_playhead(&self.timeline, time);
    }

    pub fn zoom_in(&mut self) {
        zoom_in(&mut self.timeline, &self.config.zoom);
    }

    pub fn zoom_out(&mut self) {
        zoom_out(&mut self.timeline, &self.config.zoom);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        set_zoom(&mut self.timeline, zoom, &self.config.zoom);
    }

    pub fn zoom_to_fit(&mut self, viewport_width: f64) {
        zoom_to_fit(&mut self.timeline, viewport_width, &self.config.zoom);
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.timeline.pixels_per_second(&self.config.zoom)
    }

    pub fn toggle_snapping(&mut self) -> bool {
        self.config.snapping.toggle();
        self.config.snapping.enabled
    }

    // Selection

    pub fn select_clip(&mut self, clip_id: &ClipId) -> Result<()> {
        if self.timeline.clip(clip_id).is_none() {
            return Err(TimelineError::ClipNotFound(clip_id.clone()));
        }
        self.timeline.selection = Selection {
            clip_ids: vec![clip_id.clone()],
            ..Selection::default()
        };
        Ok(())
    }

    pub fn select_range(&mut self, start: Seconds, end: Seconds) -> &Selection {
        self.timeline.selection = select_area(&self.timeline, &self.keyframes, start, end);
        &self.timeline.selection
    }

    /// Grow the clip selection over touching neighbours on the same track.
    pub fn expand_selection(&mut self) -> &[ClipId] {
        let expanded = expand_selection(
            &self.timeline,
            &self.timeline.selection.clip_ids,
            self.config.editing.adjacency_epsilon,
        );
        self.timeline.selection.clip_ids = expanded;
        &self.timeline.selection.clip_ids
    }

    pub fn clear_selection(&mut self) {
        self.timeline.selection.clear();
    }

    // Gestures

    pub fn pointer_down(&mut self, x_px: f64, target: HitTarget) -> Option<DragKind> {
        self.gestures
            .pointer_down(x_px, target, &self.timeline, &self.keyframes, &self.config)
    }

    pub fn pointer_move(
        &mut self,
        x_px: f64,
        target_track: Option<&TrackId>,
    ) -> Option<DragUpdate> {
        self.gestures
            .pointer_move(x_px, target_track, &self.timeline, &self.config)
    }

    /// Finish the gesture: commits a drag or resolves a tap into a selection.
    pub fn pointer_up(&mut self) -> GestureOutcome {
        let outcome = self.gestures.pointer_up();
        match &outcome {
            GestureOutcome::Committed(preview) => {
                let editing = &self.config.editing;
                match apply_preview(&self.timeline, &self.keyframes, preview, editing) {
                    Some((timeline, keyframes)) => self.commit(timeline, keyframes),
                    None => tracing::warn!(?preview, "drag target vanished, nothing applied"),
                }
            }
            GestureOutcome::Tapped(HitTarget::Clip { clip_id, .. }) => {
                if let Err(err) = self.select_clip(clip_id) {
                    tracing::debug!(%err, "tapped clip is gone");
                }
            }
            GestureOutcome::Tapped(HitTarget::Keyframe { keyframe_id }) => {
                self.timeline.selection = Selection {
                    keyframe_ids: vec![keyframe_id.clone()],
                    ..Selection::default()
                };
            }
            GestureOutcome::Tapped(HitTarget::Empty) => self.clear_selection(),
            GestureOutcome::Tapped(HitTarget::Playhead) | GestureOutcome::None => {}
        }
        outcome
    }

    pub fn cancel_gesture(&mut self) {
        self.gestures.cancel();
    }

    // Analysis

    pub fn analyze(&self) -> TimelineAnalysis {
        analyze_timeline(&self.timeline, &self.keyframes, &self.config.export)
    }

    pub fn complexity(&self) -> f64 {
        calculate_complexity(&self.timeline, &self.keyframes)
    }

    pub fn validate(&self) -> Vec<ReferenceIssue> {
        validate_references(&self.timeline, &self.keyframes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SequentialIdGenerator, TrackKind};

    fn session() -> EditorSession {
        let ids = Box::new(SequentialIdGenerator::new());
        let mut session = EditorSession::with_id_generator(EngineConfig::default(), ids);
        session.add_track(Track::new("v1", TrackKind::Video)).unwrap();
        session
            .add_clip(&"v1".into(), VideoClip::new("a", "", "src", 0.0, 10.0))
            .unwrap();
        session
    }

    #[test]
    fn test_split_moves_later_keyframes() {
        let mut session = session();
        let a: ClipId = "a".into();
        session.add_keyframe(&a, KeyframeProperty::Opacity, 2.0, 0.0, Easing::Linear).unwrap();
        session.add_keyframe(&a, KeyframeProperty::Opacity, 8.0, 1.0, Easing::Linear).unwrap();

        let right = session.split_clip_at(&a, 5.0).unwrap();
        assert_eq!(right.as_str(), "clip-3");
        let owners: Vec<_> = session.keyframes().iter().map(|kf| kf.clip_id.as_str()).collect();
        assert_eq!(owners, vec!["a", "clip-3"]);
        assert!(session.validate().is_empty());
    }

    #[test]
    fn test_refused_split_leaves_session() {
        let mut session = session();
        let before = session.document();
        assert!(matches!(
            session.split_clip_at(&"a".into(), 10.0),
            Err(TimelineError::InvalidOp(_))
        ));
        assert!(matches!(
            session.split_clip_at(&"missing".into(), 1.0),
            Err(TimelineError::ClipNotFound(_))
        ));
        assert_eq!(session.document(), before);
    }

    #[test]
    fn test_delete_cascades_keyframes() {
        let mut session = session();
        let a: ClipId = "a".into();
        session.add_keyframe(&a, KeyframeProperty::Scale, 1.0, 1.0, Easing::Linear).unwrap();
        session.select_clip(&a).unwrap();

        session.delete_clip(&a).unwrap();
        assert!(session.keyframes().is_empty());
        assert!(session.selection().is_empty());
        assert_eq!(session.timeline().clip_count(), 0);
    }

    #[test]
    fn test_duplicate_places_copy_after() {
        let mut session = session();
        let a: ClipId = "a".into();
        session.add_keyframe(&a, KeyframeProperty::Volume, 4.0, 0.5, Easing::Linear).unwrap();

        let copy = session.duplicate_clip(&a).unwrap();
        let clip = session.timeline().clip(&copy).unwrap();
        assert_eq!(clip.position, 10.0);
        assert_eq!(session.timeline().duration(), 20.0);
        assert_eq!(session.value_at(&copy, KeyframeProperty::Volume, 14.0).unwrap(), Some(0.5));
    }

    #[test]
    fn test_split_then_merge_restores_span() {
        let mut session = session();
        let a: ClipId = "a".into();
        let right = session.split_clip_at(&a, 4.0).unwrap();
        let merged = session.merge_clips(&[a.clone(), right]).unwrap();

        assert_eq!(merged, a);
        let clip = session.timeline().clip(&a).unwrap();
        assert_eq!(
            (clip.position, clip.duration, clip.start_time, clip.end_time),
            (0.0, 10.0, 0.0, 10.0)
        );
        assert_eq!(session.timeline().clip_count(), 1);
    }

    #[test]
    fn test_locked_track_refuses_edits() {
        let mut session = session();
        let mut next = session.timeline().clone();
        next.tracks[0].locked = true;
        session.commit(next, Vec::new());

        assert!(matches!(session.delete_clip(&"a".into()), Err(TimelineError::TrackLocked(_))));
        let target = HitTarget::Clip { clip_id: "a".into(), offset_px: 100.0 };
        assert!(session.pointer_down(100.0, target).is_none());
    }

    #[test]
    fn test_tap_selects_clip() {
        let mut session = session();
        session.pointer_down(60.0, HitTarget::Clip { clip_id: "a".into(), offset_px: 60.0 });
        session.pointer_up();
        assert!(session.selection().contains_clip(&"a".into()));

        session.pointer_down(400.0, HitTarget::Empty);
        session.pointer_up();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_tap_on_deleted_clip_selects_nothing() {
        let mut session = session();
        session.pointer_down(60.0, HitTarget::Clip { clip_id: "a".into(), offset_px: 60.0 });
        session.delete_clip(&"a".into()).unwrap();

        let outcome = session.pointer_up();
        assert!(matches!(outcome, GestureOutcome::Tapped(HitTarget::Clip { .. })));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_add_clip_clamps_out_of_range_input() {
        let mut session = session();
        let v1: TrackId = "v1".into();
        session.add_clip(&v1, VideoClip::new("neg", "", "src", -5.0, 2.0)).unwrap();
        session.add_clip(&v1, VideoClip::new("zero", "", "src", 12.0, 0.0)).unwrap();

        let neg = session.timeline().clip(&"neg".into()).unwrap();
        assert_eq!((neg.position, neg.duration), (0.0, 2.0));
        let zero = session.timeline().clip(&"zero".into()).unwrap();
        assert_eq!((zero.position, zero.duration), (12.0, 0.1));
        assert!((zero.end_time - zero.start_time - 0.1).abs() < 1e-9);
        assert!(session.timeline().clips().all(|clip| clip.position >= 0.0));
    }

    #[test]
    fn test_document_with_bad_clip_is_clamped_on_open() {
        let mut document = session().document();
        document.timeline.tracks[0].clips[0].position = -3.0;
        document.timeline.tracks[0].clips[0].duration = -1.0;
        document.keyframes.push(Keyframe::new("k", "a", KeyframeProperty::Opacity, -2.0, 1.0));

        let session = EditorSession::from_document(document, EngineConfig::default());
        let clip = session.timeline().clip(&"a".into()).unwrap();
        assert_eq!((clip.position, clip.duration), (0.0, 0.1));
        assert_eq!(session.keyframes()[0].time, 0.0);
    }
}

//! Pointer gesture state machine for the timeline strip.
//!
//! `Idle -> Armed -> Dragging -> (commit | cancel) -> Idle`. Moves only produce
//! previews; the model changes once, when a committed preview is applied with
//! [`apply_preview`]. Every exit path resets to `Idle`.

use crate::{
    edit_operations::{
        move_clip, move_keyframe, offset_keyframes, set_playhead, trim_clip_end, trim_clip_start,
        trim_start_bounds,
    },
    geometry::TimeScale,
    selection::select_area,
    snapping::{find_closest, generate_excluding, round_to_increment, SnapExclusions, SnapPoint},
    ClipId, EditSettings, EngineConfig, Keyframe, KeyframeId, Seconds, Timeline, TrackId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    ClipMove,
    TrimStart,
    TrimEnd,
    KeyframeMove,
    PlayheadMove,
    AreaSelect,
}

/// What the pointer went down on, as resolved by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    /// `offset_px` is the touch x-offset from the clip's left edge.
    Clip { clip_id: ClipId, offset_px: f64 },
    Keyframe { keyframe_id: KeyframeId },
    Playhead,
    Empty,
}

/// Live result of a drag; also the payload committed on release.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPreview {
    ClipMove {
        clip_id: ClipId,
        track_id: TrackId,
        position: Seconds,
    },
    TrimStart {
        clip_id: ClipId,
        position: Seconds,
    },
    TrimEnd {
        clip_id: ClipId,
        end: Seconds,
    },
    KeyframeMove {
        keyframe_id: KeyframeId,
        time: Seconds,
    },
    PlayheadMove {
        time: Seconds,
    },
    AreaSelect {
        start: Seconds,
        end: Seconds,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    pub preview: DragPreview,
    /// Point the value was attracted to, for drawing a snap indicator.
    pub snapped_to: Option<SnapPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Pointer went up with no active gesture.
    None,
    /// Released before travelling past the drag slop.
    Tapped(HitTarget),
    Committed(DragPreview),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Armed(DragKind),
    Dragging(DragKind),
}

/// Pick move vs trim from where the clip was touched.
///
/// Handles shrink on narrow clips so the middle third always moves.
pub fn classify_clip_touch(offset_px: f64, clip_width_px: f64, handle_px: f64) -> DragKind {
    let handle = handle_px.min(clip_width_px / 3.0).max(0.0);
    if offset_px <= handle {
        DragKind::TrimStart
    } else if offset_px >= clip_width_px - handle {
        DragKind::TrimEnd
    } else {
        DragKind::ClipMove
    }
}

#[derive(Debug, Clone)]
enum Subject {
    Clip {
        clip_id: ClipId,
        track_id: TrackId,
        position: Seconds,
        duration: Seconds,
        /// Left-edge range, shared with the committing trim.
        trim_start: (Seconds, Seconds),
    },
    Keyframe {
        keyframe_id: KeyframeId,
        time: Seconds,
    },
    Playhead {
        time: Seconds,
        max: Seconds,
    },
    Area,
}

/// Transient per-gesture state. Dropped on commit and on cancel.
#[derive(Debug, Clone)]
struct ActiveGesture {
    kind: DragKind,
    target: HitTarget,
    start_px: f64,
    subject: Subject,
    snap_points: Vec<SnapPoint>,
    preview: Option<DragPreview>,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Armed(ActiveGesture),
    Dragging(ActiveGesture),
}

#[derive(Debug, Clone)]
pub struct GestureController {
    state: State,
}

impl Default for GestureController {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GesturePhase {
        match &self.state {
            State::Idle => GesturePhase::Idle,
            State::Armed(g) => GesturePhase::Armed(g.kind),
            State::Dragging(g) => GesturePhase::Dragging(g.kind),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Latest preview of the active drag, if any.
    pub fn preview(&self) -> Option<&DragPreview> {
        match &self.state {
            State::Dragging(g) => g.preview.as_ref(),
            _ => None,
        }
    }

    /// Arm a gesture. Returns the kind armed, or `None` when the target cannot
    /// be dragged (unknown id, locked track). A gesture still in flight is
    /// dropped first.
    pub fn pointer_down(
        &mut self,
        x_px: f64,
        target: HitTarget,
        timeline: &Timeline,
        keyframes: &[Keyframe],
        config: &EngineConfig,
    ) -> Option<DragKind> {
        if !self.is_idle() {
            tracing::debug!("pointer down during active gesture, dropping it");
            self.cancel();
        }

        let scale = TimeScale::for_timeline(timeline, &config.zoom);
        let mut exclude = SnapExclusions::default();

        let (kind, subject) = match &target {
            HitTarget::Clip { clip_id, offset_px } => {
                let track = timeline.track_of(clip_id)?;
                if track.locked {
                    tracing::debug!(
                        clip = %clip_id,
                        track = %track.id,
                        "clip is on a locked track"
                    );
                    return None;
                }
                let clip = track.clip(clip_id)?;
                let width = scale.time_to_pixel(clip.duration);
                let kind = classify_clip_touch(*offset_px, width, config.editing.trim_handle_px);
                exclude.clip = Some(clip.id.clone());
                if kind == DragKind::ClipMove {
                    exclude.keyframes_of = Some(clip.id.clone());
                }
                (
                    kind,
                    Subject::Clip {
                        clip_id: clip.id.clone(),
                        track_id: track.id.clone(),
                        position: clip.position,
                        duration: clip.duration,
                        trim_start: trim_start_bounds(clip, config.editing.min_clip_duration),
                    },
                )
            }
            HitTarget::Keyframe { keyframe_id } => {
                let keyframe = keyframes.iter().find(|kf| &kf.id == keyframe_id)?;
                if timeline.track_of(&keyframe.clip_id).is_some_and(|t| t.locked) {
                    return None;
                }
                exclude.keyframe = Some(keyframe.id.clone());
                (
                    DragKind::KeyframeMove,
                    Subject::Keyframe {
                        keyframe_id: keyframe.id.clone(),
                        time: keyframe.time,
                    },
                )
            }
            HitTarget::Playhead => (
                DragKind::PlayheadMove,
                Subject::Playhead {
                    time: timeline.current_time,
                    max: timeline.duration(),
                },
            ),
            HitTarget::Empty => (DragKind::AreaSelect, Subject::Area),
        };

        let snap_points = generate_excluding(
            timeline,
            keyframes,
            config.snapping.grid_interval,
            &exclude,
        );

        tracing::debug!(?kind, x_px, "gesture armed");
        self.state = State::Armed(ActiveGesture {
            kind,
            target,
            start_px: x_px,
            subject,
            snap_points,
            preview: None,
        });
        Some(kind)
    }

    /// Feed a pointer move. `target_track` is the lane under the pointer, used
    /// by clip moves. Returns the new preview once dragging.
    pub fn pointer_move(
        &mut self,
        x_px: f64,
        target_track: Option<&TrackId>,
        timeline: &Timeline,
        config: &EngineConfig,
    ) -> Option<DragUpdate> {
        let state = std::mem::replace(&mut self.state, State::Idle);
        let mut gesture = match state {
            State::Idle => return None,
            State::Armed(g) => {
                if (x_px - g.start_px).abs() < config.editing.drag_slop_px {
                    self.state = State::Armed(g);
                    return None;
                }
                tracing::debug!(kind = ?g.kind, "gesture dragging");
                g
            }
            State::Dragging(g) => g,
        };

        let scale = TimeScale::for_timeline(timeline, &config.zoom);
        let update = live_update(&gesture, x_px, target_track, timeline, &scale, config);
        gesture.preview = Some(update.preview.clone());
        self.state = State::Dragging(gesture);
        Some(update)
    }

    /// Release. Dragging commits the last preview; a release while armed is a tap.
    pub fn pointer_up(&mut self) -> GestureOutcome {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => GestureOutcome::None,
            State::Armed(g) => GestureOutcome::Tapped(g.target),
            State::Dragging(g) => match g.preview {
                Some(preview) => {
                    tracing::debug!(kind = ?g.kind, "gesture committed");
                    GestureOutcome::Committed(preview)
                }
                None => GestureOutcome::None,
            },
        }
    }

    /// Abandon the gesture. Nothing was applied, so nothing needs undoing.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            tracing::debug!("gesture cancelled");
        }
        self.state = State::Idle;
    }
}

/// Grid rounding, then magnetic attraction.
fn snap_time(
    candidate: Seconds,
    points: &[SnapPoint],
    scale: &TimeScale,
    config: &EngineConfig,
) -> (Seconds, Option<SnapPoint>) {
    let snapping = &config.snapping;
    if !snapping.enabled {
        return (candidate, None);
    }
    let time = if snapping.grid_enabled {
        round_to_increment(candidate, snapping.grid_increment)
    } else {
        candidate
    };
    if snapping.magnetic {
        let tolerance = scale.tolerance_seconds(snapping.threshold_px);
        if let Some(point) = find_closest(time, points, tolerance) {
            return (point.time, Some(point.clone()));
        }
    }
    (time, None)
}

/// Snap a moving clip by whichever edge lands closer to a snap point.
fn snap_clip_position(
    candidate: Seconds,
    duration: Seconds,
    points: &[SnapPoint],
    scale: &TimeScale,
    config: &EngineConfig,
) -> (Seconds, Option<SnapPoint>) {
    let (start, start_hit) = snap_time(candidate, points, scale, config);
    let (end, end_hit) = snap_time(candidate + duration, points, scale, config);

    match (start_hit, end_hit) {
        (Some(s), Some(e)) => {
            if (e.time - (candidate + duration)).abs() < (s.time - candidate).abs() {
                (end - duration, Some(e))
            } else {
                (start, Some(s))
            }
        }
        (Some(s), None) => (start, Some(s)),
        (None, Some(e)) => (end - duration, Some(e)),
        (None, None) => (start, None),
    }
}

fn live_update(
    gesture: &ActiveGesture,
    x_px: f64,
    target_track: Option<&TrackId>,
    timeline: &Timeline,
    scale: &TimeScale,
    config: &EngineConfig,
) -> DragUpdate {
    let delta = scale.pixel_to_time(x_px - gesture.start_px);
    let points = &gesture.snap_points;
    let min_duration = config.editing.min_clip_duration;

    match (&gesture.subject, gesture.kind) {
        (
            Subject::Clip {
                clip_id,
                track_id,
                position,
                duration,
                trim_start: (earliest, latest),
            },
            kind,
        ) => match kind {
            DragKind::TrimStart => {
                let (snapped, hit) = snap_time(position + delta, points, scale, config);
                DragUpdate {
                    preview: DragPreview::TrimStart {
                        clip_id: clip_id.clone(),
                        position: snapped.clamp(*earliest, *latest),
                    },
                    snapped_to: hit,
                }
            }
            DragKind::TrimEnd => {
                let (snapped, hit) = snap_time(position + duration + delta, points, scale, config);
                DragUpdate {
                    preview: DragPreview::TrimEnd {
                        clip_id: clip_id.clone(),
                        end: snapped.max(position + min_duration),
                    },
                    snapped_to: hit,
                }
            }
            _ => {
                let candidate = (position + delta).max(0.0);
                let (snapped, hit) =
                    snap_clip_position(candidate, *duration, points, scale, config);
                let lane = target_track
                    .and_then(|id| timeline.track(id))
                    .filter(|t| !t.locked)
                    .map(|t| t.id.clone())
                    .unwrap_or_else(|| track_id.clone());
                DragUpdate {
                    preview: DragPreview::ClipMove {
                        clip_id: clip_id.clone(),
                        track_id: lane,
                        position: snapped.max(0.0),
                    },
                    snapped_to: hit,
                }
            }
        },
        (Subject::Keyframe { keyframe_id, time }, _) => {
            let (snapped, hit) = snap_time(time + delta, points, scale, config);
            DragUpdate {
                preview: DragPreview::KeyframeMove {
                    keyframe_id: keyframe_id.clone(),
                    time: snapped.max(0.0),
                },
                snapped_to: hit,
            }
        }
        (Subject::Playhead { time, max }, _) => {
            let (snapped, hit) = snap_time(time + delta, points, scale, config);
            DragUpdate {
                preview: DragPreview::PlayheadMove {
                    time: snapped.clamp(0.0, max.max(0.0)),
                },
                snapped_to: hit,
            }
        }
        (Subject::Area, _) => {
            let a = scale.pixel_to_time(gesture.start_px).max(0.0);
            let b = scale.pixel_to_time(x_px).max(0.0);
            DragUpdate {
                preview: DragPreview::AreaSelect {
                    start: a.min(b),
                    end: a.max(b),
                },
                snapped_to: None,
            }
        }
    }
}

/// Apply a committed preview. Returns the new timeline and keyframes, or
/// `None` when the target vanished; the caller then keeps the old model.
pub fn apply_preview(
    timeline: &Timeline,
    keyframes: &[Keyframe],
    preview: &DragPreview,
    editing: &EditSettings,
) -> Option<(Timeline, Vec<Keyframe>)> {
    match preview {
        DragPreview::ClipMove {
            clip_id,
            track_id,
            position,
        } => {
            let delta = position.max(0.0) - timeline.clip(clip_id)?.position;
            let next = move_clip(timeline, clip_id, Some(track_id), *position)?;
            Some((next, offset_keyframes(keyframes, clip_id, delta)))
        }
        DragPreview::TrimStart { clip_id, position } => {
            let next = trim_clip_start(timeline, clip_id, *position, editing.min_clip_duration)?;
            Some((next, keyframes.to_vec()))
        }
        DragPreview::TrimEnd { clip_id, end } => {
            let next = trim_clip_end(timeline, clip_id, *end, editing.min_clip_duration)?;
            Some((next, keyframes.to_vec()))
        }
        DragPreview::KeyframeMove { keyframe_id, time } => {
            let moved = move_keyframe(keyframes, keyframe_id, *time)?;
            Some((timeline.clone(), moved))
        }
        DragPreview::PlayheadMove { time } => {
            Some((set_playhead(timeline, *time), keyframes.to_vec()))
        }
        DragPreview::AreaSelect { start, end } => {
            let mut next = timeline.clone();
            next.selection = select_area(timeline, keyframes, *start, *end);
            Some((next, keyframes.to_vec()))
        }
    }
}

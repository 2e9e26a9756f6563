use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Result, Seconds, TimelineError, ZoomSettings};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(ClipId);
string_id!(TrackId);
string_id!(KeyframeId);
string_id!(MarkerId);

/// Source of fresh entity ids. Injected so tests can produce stable ids.
pub trait IdGenerator {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random v4 uuids, prefixed with the entity kind.
#[derive(Debug, Default, Clone)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}

/// Counter-based ids: `clip-1`, `clip-2`, ... One counter shared by all prefixes.
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{}-{}", prefix, self.next)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl Default for TrackKind {
    fn default() -> Self {
        Self::Video
    }
}

fn default_unit() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// A placed instance of a source media range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoClip {
    pub id: ClipId,
    pub track_id: TrackId,
    pub source_file_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Start on the track, in timeline seconds.
    pub position: Seconds,
    pub duration: Seconds,
    /// In-source trim range.
    pub start_time: Seconds,
    pub end_time: Seconds,
    #[serde(default = "default_unit")]
    pub speed: f64,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default = "default_unit")]
    pub volume: f64,
}

impl VideoClip {
    pub fn new(
        id: impl Into<ClipId>,
        track_id: impl Into<TrackId>,
        source_file_id: impl Into<String>,
        position: Seconds,
        duration: Seconds,
    ) -> Self {
        Self {
            id: id.into(),
            track_id: track_id.into(),
            source_file_id: source_file_id.into(),
            name: None,
            position,
            duration,
            start_time: 0.0,
            end_time: duration,
            speed: 1.0,
            filters: Vec::new(),
            volume: 1.0,
        }
    }

    pub fn with_trim(mut self, start_time: Seconds, end_time: Seconds) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn end(&self) -> Seconds {
        self.position + self.duration
    }

    /// Strictly inside the clip span; boundaries do not count.
    pub fn contains_strictly(&self, time: Seconds) -> bool {
        time > self.position && time < self.end()
    }

    /// Pull the clip back inside the model bounds: position at or after zero and
    /// duration at least `min_duration`. Returns whether anything changed.
    pub fn clamp_to_bounds(&mut self, min_duration: Seconds) -> bool {
        let mut changed = false;
        if self.position.is_nan() || self.position < 0.0 {
            self.position = 0.0;
            changed = true;
        }
        if self.start_time.is_nan() || self.start_time < 0.0 {
            self.start_time = 0.0;
            changed = true;
        }
        if self.duration.is_nan() || self.duration < min_duration {
            self.duration = min_duration;
            let speed = if self.speed > 0.0 { self.speed } else { 1.0 };
            self.end_time = self.start_time + self.duration * speed;
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub kind: TrackKind,
    #[serde(default)]
    pub name: String,
    /// Kept ordered by position by the optimizer.
    #[serde(default)]
    pub clips: Vec<VideoClip>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_unit")]
    pub volume: f64,
}

impl Track {
    pub fn new(id: impl Into<TrackId>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: String::new(),
            clips: Vec::new(),
            muted: false,
            locked: false,
            visible: true,
            volume: 1.0,
        }
    }

    pub fn with_clip(mut self, mut clip: VideoClip) -> Self {
        clip.track_id = self.id.clone();
        self.clips.push(clip);
        self
    }

    pub fn clip(&self, clip_id: &ClipId) -> Option<&VideoClip> {
        self.clips.iter().find(|c| &c.id == clip_id)
    }

    /// Latest clip end on this track, 0 when empty.
    pub fn end(&self) -> Seconds {
        self.clips.iter().map(VideoClip::end).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeProperty {
    Opacity,
    Scale,
    PositionX,
    PositionY,
    Rotation,
    Volume,
    Brightness,
    Contrast,
    Saturation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Keep the previous value until the next keyframe is reached.
    Hold,
}

impl Default for Easing {
    fn default() -> Self {
        Self::Linear
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub id: KeyframeId,
    pub clip_id: ClipId,
    pub property: KeyframeProperty,
    /// Timeline-absolute, not clip-relative.
    pub time: Seconds,
    pub value: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(
        id: impl Into<KeyframeId>,
        clip_id: impl Into<ClipId>,
        property: KeyframeProperty,
        time: Seconds,
        value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            clip_id: clip_id.into(),
            property,
            time,
            value,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Active keyframes lie within the owning clip's span, both ends inclusive.
    pub fn is_active_in(&self, clip: &VideoClip) -> bool {
        self.clip_id == clip.id && self.time >= clip.position && self.time <= clip.end()
    }
}

/// Transient UI focus set. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub clip_ids: Vec<ClipId>,
    pub keyframe_ids: Vec<KeyframeId>,
    pub track_ids: Vec<TrackId>,
    /// Half-open `[start, end)` range for area selections.
    pub range: Option<(Seconds, Seconds)>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.clip_ids.is_empty() && self.keyframe_ids.is_empty() && self.track_ids.is_empty()
    }

    pub fn contains_clip(&self, clip_id: &ClipId) -> bool {
        self.clip_ids.contains(clip_id)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    #[serde(default)]
    pub current_time: Seconds,
    #[serde(default = "default_unit")]
    pub zoom: f64,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub markers: Vec<crate::Marker>,
    #[serde(skip)]
    pub selection: Selection,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            zoom: 1.0,
            tracks: Vec::new(),
            markers: Vec::new(),
            selection: Selection::default(),
        }
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Max clip end over all tracks.
    pub fn duration(&self) -> Seconds {
        self.tracks.iter().map(Track::end).fold(0.0, f64::max)
    }

    pub fn pixels_per_second(&self, zoom: &ZoomSettings) -> f64 {
        zoom.pixels_per_second(self.zoom)
    }

    pub fn track(&self, track_id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: &TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| &t.id == track_id)
    }

    pub fn clips(&self) -> impl Iterator<Item = &VideoClip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    pub fn clip(&self, clip_id: &ClipId) -> Option<&VideoClip> {
        self.clips().find(|c| &c.id == clip_id)
    }

    /// Track that currently owns the clip.
    pub fn track_of(&self, clip_id: &ClipId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.clip(clip_id).is_some())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    pub fn add_clip(&mut self, track_id: &TrackId, mut clip: VideoClip) -> Result<()> {
        let track = self
            .track_mut(track_id)
            .ok_or_else(|| TimelineError::TrackNotFound(track_id.clone()))?;
        clip.track_id = track.id.clone();
        track.clips.push(clip);
        Ok(())
    }

    /// Replace the clip with the same id wherever it lives.
    pub(crate) fn replace_clip(&mut self, clip: VideoClip) -> bool {
        for track in &mut self.tracks {
            if let Some(slot) = track.clips.iter_mut().find(|c| c.id == clip.id) {
                *slot = clip;
                return true;
            }
        }
        false
    }

    pub(crate) fn remove_clip(&mut self, clip_id: &ClipId) -> Option<VideoClip> {
        for track in &mut self.tracks {
            if let Some(idx) = track.clips.iter().position(|c| &c.id == clip_id) {
                return Some(track.clips.remove(idx));
            }
        }
        None
    }

    pub fn marker(&self, marker_id: &MarkerId) -> Option<&crate::Marker> {
        self.markers.iter().find(|m| &m.id == marker_id)
    }
}

/// Persisted form of one edit: the timeline graph plus its keyframes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineDocument {
    pub timeline: Timeline,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl TimelineDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

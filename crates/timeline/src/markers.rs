//! Timeline markers: labeled points in time, independent of clips.

use crate::{MarkerId, Seconds, Timeline};
use serde::{Deserialize, Serialize};

/// Marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerType {
    /// Standard marker
    Standard,

    /// Chapter marker (for export)
    Chapter,

    /// Comment/note marker
    Comment,

    /// TODO marker
    Todo,
}

impl Default for MarkerType {
    fn default() -> Self {
        Self::Standard
    }
}

/// Timeline marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub time: Seconds,
    pub label: String,
    #[serde(default)]
    pub marker_type: MarkerType,

    /// Color in hex format (e.g., "#FF0000")
    #[serde(default = "default_marker_color")]
    pub color: String,

    /// Optional note/comment
    #[serde(default)]
    pub note: String,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: i64,
}

fn default_marker_color() -> String {
    "#4A9EFF".to_string() // Blue
}

impl Marker {
    pub fn new(id: impl Into<MarkerId>, time: Seconds, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time: time.max(0.0),
            label: label.into(),
            marker_type: MarkerType::Standard,
            color: default_marker_color(),
            note: String::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_type(mut self, marker_type: MarkerType) -> Self {
        self.marker_type = marker_type;
        self.color = match marker_type {
            MarkerType::Chapter => "#FF00FF".to_string(), // Magenta
            MarkerType::Comment => "#FFFF00".to_string(), // Yellow
            MarkerType::Todo => "#FFA500".to_string(),    // Orange
            MarkerType::Standard => default_marker_color(),
        };
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

impl Timeline {
    /// Add a marker, replacing any marker with the same id.
    pub fn add_marker(&mut self, marker: Marker) -> MarkerId {
        let id = marker.id.clone();
        self.markers.retain(|m| m.id != id);
        self.markers.push(marker);
        id
    }

    pub fn remove_marker(&mut self, id: &MarkerId) -> Option<Marker> {
        let idx = self.markers.iter().position(|m| &m.id == id)?;
        Some(self.markers.remove(idx))
    }

    /// Get markers sorted by time
    pub fn markers_sorted(&self) -> Vec<&Marker> {
        let mut markers: Vec<_> = self.markers.iter().collect();
        markers.sort_by(|a, b| a.time.total_cmp(&b.time));
        markers
    }

    /// Find markers within `tolerance` of `time`
    pub fn markers_at(&self, time: Seconds, tolerance: Seconds) -> Vec<&Marker> {
        self.markers
            .iter()
            .filter(|m| (m.time - time).abs() <= tolerance)
            .collect()
    }

    /// Find nearest marker to time
    pub fn nearest_marker(&self, time: Seconds) -> Option<&Marker> {
        self.markers
            .iter()
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }
}

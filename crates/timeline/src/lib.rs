use thiserror::Error;

mod model;
pub use model::*;
mod markers;
pub use markers::*;
mod config;
pub use config::*;

pub mod analysis;
pub mod automation;
pub mod edit_operations;
pub mod geometry;
pub mod gesture;
pub mod optimize;
pub mod selection;
pub mod session;
pub mod snapping;

pub use analysis::{Gap, Overlap, ReferenceIssue, TimelineAnalysis};
pub use gesture::{DragKind, DragPreview, GestureController, GestureOutcome, HitTarget};
pub use session::EditorSession;
pub use snapping::{SnapKind, SnapPoint};

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("clip not found: {0}")]
    ClipNotFound(ClipId),
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("keyframe not found: {0}")]
    KeyframeNotFound(KeyframeId),
    #[error("marker not found: {0}")]
    MarkerNotFound(MarkerId),
    #[error("track is locked: {0}")]
    TrackLocked(TrackId),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

/// Timeline-absolute time in seconds.
pub type Seconds = f64;

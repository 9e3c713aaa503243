//! Animation error types

use thiserror::Error;

use crate::property::TargetId;

/// Animation-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Rejected at construction time (durations, spring params, keyframes)
    #[error("Invalid animation configuration: {0}")]
    InvalidConfiguration(String),

    /// The render target went away while the animation was live
    #[error("Animation target is no longer valid: {0:?}")]
    InvalidTarget(TargetId),

    #[error("Unknown animation handle")]
    UnknownAnimation,

    #[error("Unknown spring handle")]
    UnknownSpring,

    #[error("Unknown gesture handle")]
    UnknownGesture,

    #[error("Unknown choreographer handle")]
    UnknownChoreographer,

    #[error("Unknown sequencer handle")]
    UnknownSequencer,
}

impl AnimationError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;

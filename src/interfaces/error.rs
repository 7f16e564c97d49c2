//! Collaborator error types and handling

use std::fmt;

/// Errors reported by or about external collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// Image fetch collaborator has no data for a photo
    ImageUnavailable { photo_id: String, reason: String },
    /// Directions collaborator could not produce a route
    RouteUnavailable { reason: String },
    /// The session's event channel is gone
    ChannelClosed,
    /// Render target refused a command batch
    SinkRejected { details: String },
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorError::ImageUnavailable { photo_id, reason } => {
                write!(f, "Image for photo {} unavailable: {}", photo_id, reason)
            }
            CollaboratorError::RouteUnavailable { reason } => {
                write!(f, "No walking route: {}", reason)
            }
            CollaboratorError::ChannelClosed => write!(f, "Session event channel closed"),
            CollaboratorError::SinkRejected { details } => {
                write!(f, "Scene rejected commands: {}", details)
            }
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// Result type for collaborator operations
pub type CollabResult<T> = Result<T, CollaboratorError>;

/// What the session does after a collaborator failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryStrategy {
    /// Forget the request; the next trigger issues it again
    RetryOnNextTrigger,
    /// Rebuild every category from scratch on the next pass
    RegenerateScene,
    /// Nothing left to deliver to
    Abandon,
}

impl CollaboratorError {
    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            CollaboratorError::ImageUnavailable { .. } => RecoveryStrategy::RetryOnNextTrigger,
            CollaboratorError::RouteUnavailable { .. } => RecoveryStrategy::RetryOnNextTrigger,
            CollaboratorError::SinkRejected { .. } => RecoveryStrategy::RegenerateScene,
            CollaboratorError::ChannelClosed => RecoveryStrategy::Abandon,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery_strategy(), RecoveryStrategy::Abandon)
    }
}

//! Boundary contracts of the external collaborators
//!
//! Pose, location and photo-store updates are pushed into the session as
//! [`SessionEvent`]s. The traits below cover the calls the session makes
//! outward: applying commands to the scene and issuing asynchronous fetches,
//! whose completions come back through an [`EventSender`].

pub mod error;
pub mod mock;

pub use error::{CollabResult, CollaboratorError, RecoveryStrategy};
pub use mock::{MockDirectionsService, MockImageFetcher, RecordingSceneSink};

use crossbeam_channel::Sender;

use crate::api::types::{PlacementCommand, RouteRequest, SessionEvent};

/// Render target that materializes placement commands as scene nodes
pub trait SceneSink {
    /// Apply a batch of commands in order
    fn apply(&mut self, commands: &[PlacementCommand]) -> CollabResult<()>;
}

/// Asynchronous source of full-resolution photo data
pub trait ImageFetcher {
    /// Start fetching; the result arrives later as `ImageFetched` or
    /// `ImageFetchFailed` through `reply`.
    fn request_full_image(&mut self, photo_id: &str, reply: EventSender) -> CollabResult<()>;
}

/// Asynchronous walking-directions service
pub trait DirectionsService {
    /// Start computing a route; the result arrives later as `RouteComputed`
    /// through `reply`.
    fn request_walking_route(&mut self, request: RouteRequest, reply: EventSender) -> CollabResult<()>;
}

/// Handle for posting events back to a session
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<SessionEvent>,
}

impl EventSender {
    pub(crate) fn new(sender: Sender<SessionEvent>) -> Self {
        Self { sender }
    }

    pub fn send(&self, event: SessionEvent) -> CollabResult<()> {
        self.sender.send(event).map_err(|_| CollaboratorError::ChannelClosed)
    }
}

//! Common API types: the renderer command contract and session events

use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::algorithms::route::CylinderGeometry;
use crate::core::{CapturedPhoto, DevicePose, GeoPoint, Transform4, TrackingState, UserLocation};
use crate::interfaces::CollaboratorError;
use crate::utils::config::ConfigError;
use crate::validation::PlacementError;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// A collaborator rejected a request or a command batch
    Collaborator { error: CollaboratorError },
    /// Placement failed in a way the caller should know about
    Placement { error: PlacementError },
    /// Invalid configuration
    Configuration { error: ConfigError },
}

impl From<CollaboratorError> for ApiError {
    fn from(error: CollaboratorError) -> Self {
        ApiError::Collaborator { error }
    }
}

impl From<PlacementError> for ApiError {
    fn from(error: PlacementError) -> Self {
        ApiError::Placement { error }
    }
}

impl From<ConfigError> for ApiError {
    fn from(error: ConfigError) -> Self {
        ApiError::Configuration { error }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Collaborator { error } => write!(f, "Collaborator error: {}", error),
            ApiError::Placement { error } => write!(f, "Placement error: {}", error),
            ApiError::Configuration { error } => write!(f, "Configuration error: {}", error),
        }
    }
}

impl std::error::Error for ApiError {}

/// Scene node categories cleared and rebuilt as a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeCategory {
    Billboards,
    Route,
}

/// Material colour of route primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTag {
    Blue,
    Green,
}

/// Instruction for the rendering collaborator. The core never touches scene
/// graph nodes directly; it only emits these.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementCommand {
    /// Textured rectangle; replaces any node with the same id
    AddBillboard {
        node_id: String,
        local_transform: Transform4,
        width: f64,
        height: f64,
        /// Photo id whose full image textures the billboard
        texture_ref: String,
        /// Visible from both faces
        double_sided: bool,
    },
    /// Connector cylinder between two local points
    AddLineSegment {
        node_id: String,
        from_local: Point3<f64>,
        to_local: Point3<f64>,
        radius: f64,
        cylinder: CylinderGeometry,
        color_tag: ColorTag,
    },
    /// Sphere marking a route vertex
    AddPointMarker {
        node_id: String,
        at_local: Point3<f64>,
        radius: f64,
        color_tag: ColorTag,
    },
    RemoveNode {
        node_id: String,
    },
    ClearCategory {
        category: NodeCategory,
    },
}

impl PlacementCommand {
    /// Node the command adds or removes; `None` for category clears
    pub fn node_id(&self) -> Option<&str> {
        match self {
            PlacementCommand::AddBillboard { node_id, .. }
            | PlacementCommand::AddLineSegment { node_id, .. }
            | PlacementCommand::AddPointMarker { node_id, .. }
            | PlacementCommand::RemoveNode { node_id } => Some(node_id),
            PlacementCommand::ClearCategory { .. } => None,
        }
    }

    /// Category of nodes created by this command
    pub fn added_category(&self) -> Option<NodeCategory> {
        match self {
            PlacementCommand::AddBillboard { .. } => Some(NodeCategory::Billboards),
            PlacementCommand::AddLineSegment { .. } | PlacementCommand::AddPointMarker { .. } => {
                Some(NodeCategory::Route)
            }
            _ => None,
        }
    }

    pub fn is_add(&self) -> bool {
        self.added_category().is_some()
    }
}

/// Identifier of a directions request; only the latest one is honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteRequestId(u64);

impl RouteRequestId {
    pub(crate) fn new(id: u64) -> Self {
        RouteRequestId(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Walking route request handed to the directions collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub request_id: RouteRequestId,
    pub from: GeoPoint,
    pub to: GeoPoint,
}

/// Everything that can happen to a session. External updates and collaborator
/// completions all arrive through this one type on the session thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// New camera pose from the AR session
    PoseUpdated(DevicePose),
    /// New user location from the location collaborator
    LocationUpdated(UserLocation),
    /// Photo store contents changed
    PhotosChanged(Vec<CapturedPhoto>),
    /// Full image data arrived
    ImageFetched { photo_id: String, image_bytes: Vec<u8> },
    /// Full image data could not be fetched
    ImageFetchFailed { photo_id: String, reason: String },
    /// Start navigating to a destination
    NavigationTargetSet { destination: GeoPoint },
    NavigationCleared,
    /// Directions collaborator answered a request
    RouteComputed {
        request_id: RouteRequestId,
        result: Result<Vec<GeoPoint>, CollaboratorError>,
    },
    /// AR tracking frame was reset; every local transform is invalid
    SessionReset,
}

/// User-facing snapshot of the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub tracking_state: Option<TrackingState>,
    pub placed_billboards: usize,
    pub route_nodes: usize,
    pub pending_images: usize,
    pub navigating: bool,
    pub message: String,
}

/// Work done by one `process` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub events_processed: usize,
    pub reconciliation_passes: usize,
    pub commands_emitted: usize,
}

//! Geotagged photo placement for AR scenes
//!
//! Turns geographic coordinates into transforms in a live AR tracking frame:
//! photo billboards around the user, a walking route drawn on the ground, and
//! an idempotent stream of scene commands that survives tracking resets.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod interfaces;
pub mod api;

// Re-export commonly used types
pub use core::{CapturedPhoto, DevicePose, GeoPoint, PitchCode, TrackingState, Transform4, UserLocation};
pub use algorithms::geodesy::{bearing, distance};
pub use algorithms::frame_transform::local_transform;
pub use algorithms::{BillboardPlacement, CylinderGeometry, PlacementEngine, PlacementOutcome, RouteProjector};
pub use processing::{PlacementSession, SceneMutationLog};
pub use validation::{ErrorReporter, PlacementError};
pub use utils::{ConfigError, ConfigurationManager, ExplorerConfig, PlacementConfig, RouteConfig};
pub use interfaces::{CollaboratorError, DirectionsService, EventSender, ImageFetcher, SceneSink};
pub use api::{
    ApiError, ApiResult, ColorTag, ExplorerSession, NodeCategory, PlacementCommand, ProcessSummary,
    SessionEvent, SessionStatus,
};

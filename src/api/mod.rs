//! Session API and the command contract towards the renderer
//!
//! [`ExplorerSession`] is the entry point: feed it [`SessionEvent`]s, call
//! `process`, and it drives the scene sink with [`PlacementCommand`] batches.

pub mod session;
pub mod types;

pub use session::ExplorerSession;
pub use types::{
    ApiError, ApiResult, ColorTag, NodeCategory, PlacementCommand, ProcessSummary, RouteRequest,
    RouteRequestId, SessionEvent, SessionStatus,
};

//! Geodesy, frame transforms and placement computation

pub mod geodesy;
pub mod frame_transform;
pub mod placement;
pub mod route;

pub use placement::{BillboardPlacement, PlacementEngine, PlacementOutcome};
pub use route::{CylinderGeometry, RouteProjector};

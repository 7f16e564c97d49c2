//! Physical constants and placement defaults

/// Mean Earth radius (m) used for great-circle computations
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Half the Earth's circumference (m), the largest great-circle distance
pub const MAX_GREAT_CIRCLE_DISTANCE_M: f64 = std::f64::consts::PI * EARTH_RADIUS_M;

/// Photos closer than this are placed in the scene (m)
pub const DEFAULT_PLACEMENT_RADIUS_M: f64 = 50.0;

/// Billboard size per source image pixel (m/px)
pub const DEFAULT_PIXEL_SCALE_M: f64 = 0.0008;

/// Vertical offset of billboards relative to the camera (m)
pub const DEFAULT_BILLBOARD_ALTITUDE_M: f64 = 0.0;

/// Vertical offset of route geometry, below eye level (m)
pub const DEFAULT_ROUTE_ALTITUDE_M: f64 = -2.0;

/// Radius of route connector cylinders (m)
pub const DEFAULT_SEGMENT_RADIUS_M: f64 = 0.2;

/// Radial tessellation of route connector cylinders
pub const DEFAULT_SEGMENT_RADIAL_COUNT: u32 = 48;

/// Radius of waypoint marker spheres (m)
pub const DEFAULT_MARKER_RADIUS_M: f64 = 1.0;

/// Minimum user movement that triggers a redraw (m)
pub const DEFAULT_REDRAW_THRESHOLD_M: f64 = 3.0;

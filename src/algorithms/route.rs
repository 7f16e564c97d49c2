//! Walking route projection into the AR frame
//!
//! A route `user -> w0 -> ... -> wn-1 -> destination` becomes n+1 connector
//! cylinders and n waypoint spheres, all lowered below eye level so the path
//! reads as lying on the ground.

use std::f64::consts::PI;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::algorithms::frame_transform;
use crate::api::types::{ColorTag, PlacementCommand};
use crate::core::{GeoPoint, Transform4};
use crate::utils::config::RouteConfig;
use crate::validation::{DataValidator, PlacementError};

/// Node id prefix for route geometry
pub const ROUTE_NODE_PREFIX: &str = "route:";

/// Segments shorter than this collapse to an unrotated zero-height cylinder
const MIN_SEGMENT_LENGTH_M: f64 = 1e-9;

/// Cylinder realizing a straight connector between two local points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderGeometry {
    /// Midpoint of the segment
    pub center: Point3<f64>,
    /// Euclidean distance between the endpoints
    pub height: f64,
    /// Rotation taking the cylinder's local Y axis onto the segment direction
    pub orientation: UnitQuaternion<f64>,
    pub radial_segments: u32,
}

/// Orient a cylinder so that it connects `from` and `to`.
pub fn cylinder_between(from: &Point3<f64>, to: &Point3<f64>, radial_segments: u32) -> CylinderGeometry {
    let direction = to - from;
    let height = direction.norm();
    let center = nalgebra::center(from, to);

    let orientation = if height < MIN_SEGMENT_LENGTH_M || !height.is_finite() {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::rotation_between(&Vector3::y(), &direction)
            // only None when pointing straight down
            .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI))
    };

    CylinderGeometry {
        center,
        height: if height.is_finite() { height } else { 0.0 },
        orientation,
        radial_segments,
    }
}

pub fn segment_node_id(index: usize) -> String {
    format!("{}segment:{}", ROUTE_NODE_PREFIX, index)
}

pub fn marker_node_id(index: usize) -> String {
    format!("{}marker:{}", ROUTE_NODE_PREFIX, index)
}

/// Projects walking routes into connector and marker commands
#[derive(Debug, Clone)]
pub struct RouteProjector {
    config: RouteConfig,
}

impl RouteProjector {
    pub fn new(config: RouteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Build the full command chain for a route.
    ///
    /// Segments are emitted in chain order (`user -> w0`, ..., `wn-1 -> destination`),
    /// followed by one marker per waypoint.
    pub fn project(
        &self,
        camera_pose: &Transform4,
        user: &GeoPoint,
        waypoints: &[GeoPoint],
        destination: &GeoPoint,
    ) -> Result<Vec<PlacementCommand>, PlacementError> {
        if waypoints.is_empty() {
            return Err(PlacementError::RouteComputationFailed {
                reason: "route has no waypoints".to_string(),
            });
        }

        let mut chain = Vec::with_capacity(waypoints.len() + 2);
        chain.push(self.local_point(camera_pose, user, user)?);
        for waypoint in waypoints {
            chain.push(self.local_point(camera_pose, user, waypoint)?);
        }
        chain.push(self.local_point(camera_pose, user, destination)?);

        let mut commands = Vec::with_capacity(2 * waypoints.len() + 1);
        for (index, pair) in chain.windows(2).enumerate() {
            commands.push(PlacementCommand::AddLineSegment {
                node_id: segment_node_id(index),
                from_local: pair[0],
                to_local: pair[1],
                radius: self.config.segment_radius_m,
                cylinder: cylinder_between(&pair[0], &pair[1], self.config.segment_radial_count),
                color_tag: ColorTag::Blue,
            });
        }

        // interior points only: chain[0] is the user, the last one the destination
        for (index, point) in chain[1..chain.len() - 1].iter().enumerate() {
            commands.push(PlacementCommand::AddPointMarker {
                node_id: marker_node_id(index),
                at_local: *point,
                radius: self.config.marker_radius_m,
                color_tag: ColorTag::Green,
            });
        }

        Ok(commands)
    }

    fn local_point(
        &self,
        camera_pose: &Transform4,
        user: &GeoPoint,
        point: &GeoPoint,
    ) -> Result<Point3<f64>, PlacementError> {
        DataValidator::validate_geo_point(point)?;
        let transform = frame_transform::checked_local_transform(
            camera_pose,
            user,
            point,
            self.config.altitude_offset_m,
        )?;
        Ok(frame_transform::position_of(&transform))
    }
}

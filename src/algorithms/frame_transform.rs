//! Geographic-to-AR frame transform
//!
//! The AR session runs with gravity-and-heading world alignment: +Y is up,
//! -Z points to north and +X to east. A compass bearing (clockwise from north)
//! is therefore a rotation of `-bearing` about the up axis.

use nalgebra::{Point3, Rotation3, Translation3, Vector3};

use crate::algorithms::geodesy;
use crate::core::{GeoPoint, Transform4};
use crate::validation::error::PlacementError;

/// Transform locating `target` in the AR frame of a camera standing at `origin`.
///
/// Composed as `camera_pose * rotation * translation`, where the rotation
/// encodes the bearing from `origin` to `target` and the translation moves
/// `distance` meters forward along it with the given vertical offset. The
/// result follows the live tracking frame rather than any fixed world frame.
pub fn local_transform(
    camera_pose: &Transform4,
    origin: &GeoPoint,
    target: &GeoPoint,
    altitude_offset: f64,
) -> Transform4 {
    let bearing = geodesy::bearing(origin, target);
    let distance = geodesy::distance(origin, target);

    let rotation = bearing_rotation(bearing).to_homogeneous();
    let translation = Translation3::new(0.0, altitude_offset, -distance).to_homogeneous();

    camera_pose * rotation * translation
}

/// Same as [`local_transform`], rejecting results that are not finite.
pub fn checked_local_transform(
    camera_pose: &Transform4,
    origin: &GeoPoint,
    target: &GeoPoint,
    altitude_offset: f64,
) -> Result<Transform4, PlacementError> {
    let transform = local_transform(camera_pose, origin, target, altitude_offset);
    if is_finite_transform(&transform) {
        Ok(transform)
    } else {
        Err(PlacementError::DegenerateGeometry {
            context: format!(
                "non-finite transform for ({}, {}) -> ({}, {})",
                origin.latitude, origin.longitude, target.latitude, target.longitude
            ),
        })
    }
}

/// Rotation about the up axis for a compass bearing in degrees
pub fn bearing_rotation(bearing_deg: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), -bearing_deg.to_radians())
}

/// Translation component of a homogeneous transform
pub fn position_of(transform: &Transform4) -> Point3<f64> {
    Point3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)])
}

pub fn is_finite_transform(transform: &Transform4) -> bool {
    transform.iter().all(|value| value.is_finite())
}

//! Great-circle bearing and distance on a spherical Earth
//!
//! Bearings are compass degrees clockwise from north, normalized to `[0, 360)`.
//! Degenerate inputs (coincident or antipodal points, non-finite coordinates)
//! never produce NaN: the bearing falls back to 0 and the distance to the
//! half circumference for antipodal/non-finite pairs.

use crate::core::{GeoPoint, EARTH_RADIUS_M, MAX_GREAT_CIRCLE_DISTANCE_M};

/// Haversine terms closer to 1 than this are treated as antipodal
const ANTIPODAL_EPSILON: f64 = 1e-12;

/// Initial compass bearing (degrees, `[0, 360)`) along the great circle from
/// `from` to `to`.
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    if !from.is_finite() || !to.is_finite() || from == to {
        return 0.0;
    }
    if haversine_term(from, to) >= 1.0 - ANTIPODAL_EPSILON {
        return 0.0;
    }

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Great-circle distance in meters (haversine).
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    if !from.is_finite() || !to.is_finite() {
        return MAX_GREAT_CIRCLE_DISTANCE_M;
    }

    let a = haversine_term(from, to);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two compass angles, in `[0, 180]`
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

fn haversine_term(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let a = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    a.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASEL_USER: GeoPoint = GeoPoint::new(47.5595, 7.5885);
    const BASEL_PHOTO: GeoPoint = GeoPoint::new(47.5596, 7.5886);

    #[test]
    fn test_cardinal_bearings() {
        let origin = GeoPoint::new(0.0, 0.0);

        assert!(bearing(&origin, &GeoPoint::new(1.0, 0.0)).abs() < 1e-9);
        assert!((bearing(&origin, &GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(&origin, &GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(&origin, &GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let west = bearing(&BASEL_PHOTO, &BASEL_USER);
        assert!((0.0..360.0).contains(&west));
        assert!(west > 180.0);
    }

    #[test]
    fn test_bearing_reverse_differs_by_half_turn() {
        let pairs = [
            (BASEL_USER, BASEL_PHOTO),
            (GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001)),
            (GeoPoint::new(-33.8688, 151.2093), GeoPoint::new(-33.8690, 151.2101)),
        ];

        for (a, b) in pairs {
            let forward = bearing(&a, &b);
            let back = bearing(&b, &a);
            assert!(
                (angular_difference(forward, back) - 180.0).abs() < 1e-3,
                "forward {} back {}",
                forward,
                back
            );
        }
    }

    #[test]
    fn test_distance_symmetry() {
        let d1 = distance(&BASEL_USER, &BASEL_PHOTO);
        let d2 = distance(&BASEL_PHOTO, &BASEL_USER);

        assert_eq!(d1, d2);
        assert!(d1 > 0.0);
        assert_eq!(distance(&BASEL_USER, &BASEL_USER), 0.0);
    }

    #[test]
    fn test_scenario_distance_is_about_thirteen_meters() {
        let d = distance(&BASEL_USER, &BASEL_PHOTO);
        assert!((d - 13.3).abs() < 1.0, "distance was {}", d);
    }

    #[test]
    fn test_distance_monotonic_along_meridian() {
        let origin = GeoPoint::new(10.0, 20.0);
        let mut last = 0.0;
        for step in 1..10 {
            let d = distance(&origin, &GeoPoint::new(10.0 + step as f64 * 0.01, 20.0));
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(1.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0);
    }

    #[test]
    fn test_antipodal_points() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);

        assert_eq!(bearing(&a, &b), 0.0);
        assert!((distance(&a, &b) - 20_015_086.8).abs() < 1.0);
    }

    #[test]
    fn test_identical_points_have_zero_bearing() {
        assert_eq!(bearing(&BASEL_USER, &BASEL_USER), 0.0);
    }

    #[test]
    fn test_non_finite_input_does_not_produce_nan() {
        let bad = GeoPoint::new(f64::NAN, 7.0);

        assert_eq!(bearing(&bad, &BASEL_USER), 0.0);
        assert_eq!(distance(&bad, &BASEL_USER), MAX_GREAT_CIRCLE_DISTANCE_M);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(450.0), 90.0);
        assert!(normalize_degrees(-1e-18) < 360.0);
    }
}

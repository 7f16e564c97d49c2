use std::collections::HashSet;

use log::warn;

use crate::core::{CapturedPhoto, GeoPoint};
use crate::validation::error::PlacementError;

/// Input checks applied to photo metadata before placement
pub struct DataValidator;

impl DataValidator {
    /// Validate a WGS-84 coordinate
    pub fn validate_geo_point(point: &GeoPoint) -> Result<(), PlacementError> {
        let in_range = point.is_finite()
            && (-90.0..=90.0).contains(&point.latitude)
            && (-180.0..=180.0).contains(&point.longitude);

        if in_range {
            Ok(())
        } else {
            Err(PlacementError::InvalidCoordinate {
                latitude: point.latitude,
                longitude: point.longitude,
            })
        }
    }

    /// Validate the metadata a photo needs to be placed
    pub fn validate_photo(photo: &CapturedPhoto) -> Result<(), PlacementError> {
        Self::validate_geo_point(&photo.geo_location)?;

        if !photo.capture_yaw_deg.is_finite() {
            return Err(PlacementError::DegenerateGeometry {
                context: format!("photo {} has non-finite capture yaw", photo.id),
            });
        }

        Ok(())
    }

    /// Drop repeated ids, keeping the first occurrence.
    pub fn deduplicate(photos: &[CapturedPhoto]) -> Vec<&CapturedPhoto> {
        let mut seen = HashSet::new();
        photos
            .iter()
            .filter(|photo| {
                let fresh = seen.insert(photo.id.as_str());
                if !fresh {
                    warn!("Ignoring duplicate photo id {}", photo.id);
                }
                fresh
            })
            .collect()
    }
}

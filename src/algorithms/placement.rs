//! Billboard placement for geotagged photos
//!
//! Decides which photos are close enough to be shown, sizes each billboard
//! from the source image and orients it from the capture metadata. Pure
//! computation: the engine owns no scene state and emits a fresh set of
//! placements for every call.

use std::collections::HashMap;
use std::io::Cursor;

use image::ImageReader;
use log::debug;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use crate::algorithms::{frame_transform, geodesy};
use crate::api::types::PlacementCommand;
use crate::core::{CapturedPhoto, GeoPoint, PitchCode, Transform4};
use crate::utils::config::PlacementConfig;
use crate::validation::{DataValidator, PlacementError};

/// Node id prefix for photo billboards
pub const BILLBOARD_NODE_PREFIX: &str = "billboard:";

pub fn billboard_node_id(photo_id: &str) -> String {
    format!("{}{}", BILLBOARD_NODE_PREFIX, photo_id)
}

/// Computed placement of a single photo billboard
#[derive(Debug, Clone, PartialEq)]
pub struct BillboardPlacement {
    pub node_id: String,
    pub photo_id: String,
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
    /// Billboard width (m)
    pub width: f64,
    /// Billboard height (m)
    pub height: f64,
    /// Distance from the user at placement time (m)
    pub distance_m: f64,
}

impl BillboardPlacement {
    /// Full rigid transform of the billboard node
    pub fn local_transform(&self) -> Transform4 {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.orientation)
            .to_homogeneous()
    }

    pub fn to_command(&self) -> PlacementCommand {
        PlacementCommand::AddBillboard {
            node_id: self.node_id.clone(),
            local_transform: self.local_transform(),
            width: self.width,
            height: self.height,
            texture_ref: self.photo_id.clone(),
            double_sided: true,
        }
    }
}

/// Result of one placement pass
#[derive(Debug, Default)]
pub struct PlacementOutcome {
    /// Eligible photos with image data, in collection order
    pub placements: Vec<BillboardPlacement>,
    /// Eligible photos whose full image still has to be fetched
    pub awaiting_images: Vec<String>,
    /// Eligible photos that could not be placed
    pub errors: Vec<PlacementError>,
}

/// Photo billboard placement engine
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// A photo is eligible strictly inside the placement radius.
    pub fn is_eligible(&self, user: &GeoPoint, photo: &CapturedPhoto) -> bool {
        geodesy::distance(user, &photo.geo_location) < self.config.radius_m
    }

    /// Compute placements for every eligible photo.
    ///
    /// Image bytes come from the photo itself or, when empty there, from
    /// `fetched_images`. Photos without either are listed in
    /// `awaiting_images` and skipped.
    pub fn place(
        &self,
        photos: &[CapturedPhoto],
        user: &GeoPoint,
        camera_pose: &Transform4,
        fetched_images: &HashMap<String, Vec<u8>>,
    ) -> PlacementOutcome {
        let mut outcome = PlacementOutcome::default();

        for photo in DataValidator::deduplicate(photos) {
            if let Err(error) = DataValidator::validate_photo(photo) {
                outcome.errors.push(error);
                continue;
            }
            if !self.is_eligible(user, photo) {
                continue;
            }

            let image_bytes = if photo.has_image_data() {
                Some(photo.image_bytes.as_slice())
            } else {
                fetched_images.get(&photo.id).map(Vec::as_slice)
            };

            match image_bytes {
                Some(bytes) => match self.place_photo(photo, bytes, user, camera_pose) {
                    Ok(placement) => outcome.placements.push(placement),
                    Err(error) => outcome.errors.push(error),
                },
                None => {
                    debug!("Photo {} eligible but image data missing", photo.id);
                    outcome.awaiting_images.push(photo.id.clone());
                }
            }
        }

        outcome
    }

    /// Place a single photo whose image bytes are available
    pub fn place_photo(
        &self,
        photo: &CapturedPhoto,
        image_bytes: &[u8],
        user: &GeoPoint,
        camera_pose: &Transform4,
    ) -> Result<BillboardPlacement, PlacementError> {
        let (pixel_width, pixel_height) =
            image_dimensions(image_bytes).map_err(|reason| PlacementError::UndecodableImage {
                photo_id: photo.id.clone(),
                reason,
            })?;

        let (width, height) =
            billboard_size(pixel_width, pixel_height, photo.capture_pitch, self.config.pixel_scale_m);
        if width <= 0.0 || height <= 0.0 {
            return Err(PlacementError::DegenerateGeometry {
                context: format!("photo {} has an empty image", photo.id),
            });
        }

        let transform = frame_transform::checked_local_transform(
            camera_pose,
            user,
            &photo.geo_location,
            self.config.billboard_altitude_m,
        )?;

        let orientation = billboard_orientation(
            &UnitQuaternion::identity(),
            photo.capture_bearing_deg,
            photo.capture_yaw_deg,
            photo.capture_pitch,
        );

        Ok(BillboardPlacement {
            node_id: billboard_node_id(&photo.id),
            photo_id: photo.id.clone(),
            position: frame_transform::position_of(&transform),
            orientation,
            width,
            height,
            distance_m: geodesy::distance(user, &photo.geo_location),
        })
    }
}

/// Read pixel dimensions from the image header without decoding pixels
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    if bytes.is_empty() {
        return Err("no image data".to_string());
    }
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| e.to_string())
}

/// Billboard width and height in meters.
///
/// Flat captures are stored rotated relative to how they were taken, so their
/// pixel width and height swap. Pitched captures keep the raw mapping.
pub fn billboard_size(pixel_width: u32, pixel_height: u32, pitch: PitchCode, scale: f64) -> (f64, f64) {
    let (w, h) = match pitch {
        PitchCode::Flat => (pixel_height, pixel_width),
        PitchCode::PitchedUp | PitchCode::PitchedDown => (pixel_width, pixel_height),
    };
    (w as f64 * scale, h as f64 * scale)
}

/// Capture bearing corrected for the device tilt
pub fn adjusted_bearing(capture_bearing_deg: i32, pitch: PitchCode) -> f64 {
    let bearing = capture_bearing_deg as f64;
    match pitch {
        PitchCode::Flat => bearing,
        PitchCode::PitchedUp => bearing + 90.0,
        PitchCode::PitchedDown => bearing - 90.0,
    }
}

/// Billboard orientation: `base * bearing * yaw`.
///
/// The bearing turns the billboard by `-adjusted_bearing` about the up axis,
/// then the capture yaw rolls it by `yaw - 90` about the depth axis. The order
/// is significant.
pub fn billboard_orientation(
    base: &UnitQuaternion<f64>,
    capture_bearing_deg: i32,
    capture_yaw_deg: f64,
    pitch: PitchCode,
) -> UnitQuaternion<f64> {
    let bearing = adjusted_bearing(capture_bearing_deg, pitch);
    let bearing_rotation =
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), (-bearing).to_radians());
    let yaw_rotation =
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), (capture_yaw_deg - 90.0).to_radians());

    base * bearing_rotation * yaw_rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::f64::consts::FRAC_PI_2;

    const USER: GeoPoint = GeoPoint::new(47.5595, 7.5885);
    const NEAR_PHOTO: GeoPoint = GeoPoint::new(47.5596, 7.5886);

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn engine() -> PlacementEngine {
        PlacementEngine::new(PlacementConfig::default())
    }

    #[test]
    fn test_image_dimensions_from_fixture() {
        assert_eq!(image_dimensions(&png_fixture(40, 30)).unwrap(), (40, 30));
        assert!(image_dimensions(&[0x00, 0x01, 0x02]).is_err());
        assert!(image_dimensions(&[]).is_err());
    }

    #[test]
    fn test_flat_capture_swaps_aspect() {
        let photo = CapturedPhoto::new("flat", NEAR_PHOTO)
            .with_orientation(90, 90.0, PitchCode::Flat);
        let placement = engine()
            .place_photo(&photo, &png_fixture(400, 300), &USER, &Transform4::identity())
            .unwrap();

        assert!((placement.width - 0.24).abs() < 1e-12);
        assert!((placement.height - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_pitched_capture_keeps_aspect() {
        for pitch in [PitchCode::PitchedUp, PitchCode::PitchedDown] {
            let photo = CapturedPhoto::new("pitched", NEAR_PHOTO).with_orientation(0, 90.0, pitch);
            let placement = engine()
                .place_photo(&photo, &png_fixture(400, 300), &USER, &Transform4::identity())
                .unwrap();

            assert!((placement.width - 0.32).abs() < 1e-12);
            assert!((placement.height - 0.24).abs() < 1e-12);
        }
    }

    #[test]
    fn test_adjusted_bearing_offsets() {
        assert_eq!(adjusted_bearing(90, PitchCode::Flat), 90.0);
        assert_eq!(adjusted_bearing(90, PitchCode::PitchedUp), 180.0);
        assert_eq!(adjusted_bearing(90, PitchCode::PitchedDown), 0.0);
    }

    #[test]
    fn test_scenario_orientation() {
        let photo = CapturedPhoto::new("basel", NEAR_PHOTO)
            .with_orientation(90, 30.0, PitchCode::Flat);
        let placement = engine()
            .place_photo(&photo, &png_fixture(400, 300), &USER, &Transform4::identity())
            .unwrap();

        let expected = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), (-60.0f64).to_radians());
        assert!(placement.orientation.angle_to(&expected) < 1e-9);
        assert!((placement.distance_m - 13.4).abs() < 0.5);
        assert!(placement.position.coords.norm() > 10.0);
    }

    #[test]
    fn test_composition_order_matters() {
        let ordered = billboard_orientation(&UnitQuaternion::identity(), 90, 30.0, PitchCode::Flat);
        let reversed = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), (-60.0f64).to_radians())
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2);

        assert!(ordered.angle_to(&reversed) > 1e-3);
    }

    #[test]
    fn test_yaw_of_ninety_leaves_pure_bearing_rotation() {
        let orientation = billboard_orientation(&UnitQuaternion::identity(), 90, 90.0, PitchCode::Flat);
        let facing = orientation * Vector3::z();

        assert!((facing - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_radius_boundary_is_strict() {
        let engine = engine();
        let origin = GeoPoint::new(0.0, 0.0);
        // one degree of latitude is 111194.93 m on the reference sphere
        let meters_per_degree = geodesy::distance(&origin, &GeoPoint::new(1.0, 0.0));

        let just_inside = CapturedPhoto::new("in", GeoPoint::new((50.0 - 1e-6) / meters_per_degree, 0.0));
        let far = CapturedPhoto::new("out", GeoPoint::new(50.001 / meters_per_degree, 0.0));
        assert!(engine.is_eligible(&origin, &just_inside));
        assert!(!engine.is_eligible(&origin, &far));

        let config = PlacementConfig {
            radius_m: geodesy::distance(&origin, &far.geo_location),
            ..PlacementConfig::default()
        };
        assert!(!PlacementEngine::new(config).is_eligible(&origin, &far));
    }

    #[test]
    fn test_missing_image_is_deferred() {
        let photos = vec![
            CapturedPhoto::new("no-data", NEAR_PHOTO),
            CapturedPhoto::new("ready", NEAR_PHOTO).with_image(png_fixture(8, 6)),
        ];

        let outcome = engine().place(&photos, &USER, &Transform4::identity(), &HashMap::new());
        assert_eq!(outcome.awaiting_images, vec!["no-data".to_string()]);
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.placements[0].node_id, "billboard:ready");
    }

    #[test]
    fn test_fetched_image_is_used() {
        let photos = vec![CapturedPhoto::new("fetched", NEAR_PHOTO)];
        let mut fetched = HashMap::new();
        fetched.insert("fetched".to_string(), png_fixture(8, 6));

        let outcome = engine().place(&photos, &USER, &Transform4::identity(), &fetched);
        assert!(outcome.awaiting_images.is_empty());
        assert_eq!(outcome.placements.len(), 1);
    }

    #[test]
    fn test_far_photo_is_not_fetched() {
        let photos = vec![CapturedPhoto::new("far", GeoPoint::new(47.57, 7.59))];

        let outcome = engine().place(&photos, &USER, &Transform4::identity(), &HashMap::new());
        assert!(outcome.awaiting_images.is_empty());
        assert!(outcome.placements.is_empty());
    }

    #[test]
    fn test_undecodable_image_is_reported() {
        let photos = vec![CapturedPhoto::new("broken", NEAR_PHOTO).with_image(vec![1, 2, 3])];

        let outcome = engine().place(&photos, &USER, &Transform4::identity(), &HashMap::new());
        assert!(outcome.placements.is_empty());
        assert!(matches!(outcome.errors[0], PlacementError::UndecodableImage { .. }));
    }

    #[test]
    fn test_placement_is_idempotent() {
        let photos = vec![
            CapturedPhoto::new("a", NEAR_PHOTO).with_image(png_fixture(8, 6)),
            CapturedPhoto::new("b", GeoPoint::new(47.55955, 7.58860)).with_image(png_fixture(6, 8)),
        ];
        let engine = engine();

        let first = engine.place(&photos, &USER, &Transform4::identity(), &HashMap::new());
        let second = engine.place(&photos, &USER, &Transform4::identity(), &HashMap::new());
        assert_eq!(first.placements, second.placements);
    }

    #[test]
    fn test_command_is_double_sided() {
        let photo = CapturedPhoto::new("p", NEAR_PHOTO).with_orientation(0, 90.0, PitchCode::Flat);
        let placement = engine()
            .place_photo(&photo, &png_fixture(4, 4), &USER, &Transform4::identity())
            .unwrap();

        match placement.to_command() {
            PlacementCommand::AddBillboard { double_sided, texture_ref, .. } => {
                assert!(double_sided);
                assert_eq!(texture_ref, "p");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

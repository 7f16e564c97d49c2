//! Core data types for the AR photo placement engine

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// Rigid 4x4 transform (rotation + translation) in the AR tracking frame
pub type Transform4 = Matrix4<f64>;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Device tilt classification recorded at capture time.
///
/// Only three discrete states are tracked; the aspect swap and bearing offset
/// applied during placement are tied to exactly these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchCode {
    Flat,
    PitchedUp,
    PitchedDown,
}

impl PitchCode {
    /// Decode the legacy numeric tri-state (-1.0 / 0.0 / 1.0)
    pub fn from_code(code: f64) -> Self {
        if code >= 0.5 {
            PitchCode::PitchedUp
        } else if code <= -0.5 {
            PitchCode::PitchedDown
        } else {
            PitchCode::Flat
        }
    }

    pub fn code(self) -> f64 {
        match self {
            PitchCode::Flat => 0.0,
            PitchCode::PitchedUp => 1.0,
            PitchCode::PitchedDown => -1.0,
        }
    }
}

/// A geotagged photograph as delivered by the photo store
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    pub id: String,
    pub geo_location: GeoPoint,
    /// Compass heading at capture, 0-359
    pub capture_bearing_deg: i32,
    /// Device yaw about the vertical axis at capture
    pub capture_yaw_deg: f64,
    pub capture_pitch: PitchCode,
    /// Full image data; empty until fetched
    pub image_bytes: Vec<u8>,
    pub thumbnail_bytes: Vec<u8>,
}

impl CapturedPhoto {
    pub fn new(id: impl Into<String>, geo_location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            geo_location,
            capture_bearing_deg: 0,
            capture_yaw_deg: 0.0,
            capture_pitch: PitchCode::Flat,
            image_bytes: Vec::new(),
            thumbnail_bytes: Vec::new(),
        }
    }

    pub fn with_orientation(mut self, bearing_deg: i32, yaw_deg: f64, pitch: PitchCode) -> Self {
        self.capture_bearing_deg = bearing_deg;
        self.capture_yaw_deg = yaw_deg;
        self.capture_pitch = pitch;
        self
    }

    pub fn with_image(mut self, image_bytes: Vec<u8>) -> Self {
        self.image_bytes = image_bytes;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_bytes: Vec<u8>) -> Self {
        self.thumbnail_bytes = thumbnail_bytes;
        self
    }

    pub fn has_image_data(&self) -> bool {
        !self.image_bytes.is_empty()
    }
}

/// AR camera tracking quality as reported by the AR session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    Normal,
    Limited,
    NotAvailable,
}

impl TrackingState {
    pub fn description(self) -> &'static str {
        match self {
            TrackingState::Normal => "Tracking ready",
            TrackingState::Limited => "Tracking limited",
            TrackingState::NotAvailable => "Tracking not available",
        }
    }
}

/// Snapshot of the camera pose in the AR session's local tracking space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePose {
    pub world_transform: Transform4,
    pub tracking_state: TrackingState,
}

impl DevicePose {
    pub fn new(world_transform: Transform4, tracking_state: TrackingState) -> Self {
        Self { world_transform, tracking_state }
    }

    pub fn identity() -> Self {
        Self::new(Transform4::identity(), TrackingState::Normal)
    }
}

/// Latest real-world location of the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserLocation {
    pub geo_location: GeoPoint,
    /// Milliseconds since epoch
    pub timestamp_ms: u64,
}

impl UserLocation {
    pub fn new(geo_location: GeoPoint, timestamp_ms: u64) -> Self {
        Self { geo_location, timestamp_ms }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::constants::*;

/// Session-wide configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Billboard placement settings
    pub placement: PlacementConfig,
    /// Route overlay settings
    pub route: RouteConfig,
    /// Minimum user movement that triggers a redraw (meters)
    pub redraw_threshold_m: f64,
    /// Default log filter for the demo binary (e.g. "info", "debug")
    pub log_level: String,
}

/// Billboard placement parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Photos strictly closer than this are placed (meters)
    pub radius_m: f64,
    /// Billboard size per source pixel (meters per pixel)
    pub pixel_scale_m: f64,
    /// Vertical offset of billboards (meters)
    pub billboard_altitude_m: f64,
}

/// Route overlay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Vertical offset of the route, negative is below eye level (meters)
    pub altitude_offset_m: f64,
    /// Connector cylinder radius (meters)
    pub segment_radius_m: f64,
    /// Radial tessellation of connector cylinders
    pub segment_radial_count: u32,
    /// Waypoint sphere radius (meters)
    pub marker_radius_m: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            route: RouteConfig::default(),
            redraw_threshold_m: DEFAULT_REDRAW_THRESHOLD_M,
            log_level: "info".to_string(),
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_PLACEMENT_RADIUS_M,
            pixel_scale_m: DEFAULT_PIXEL_SCALE_M,
            billboard_altitude_m: DEFAULT_BILLBOARD_ALTITUDE_M,
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            altitude_offset_m: DEFAULT_ROUTE_ALTITUDE_M,
            segment_radius_m: DEFAULT_SEGMENT_RADIUS_M,
            segment_radial_count: DEFAULT_SEGMENT_RADIAL_COUNT,
            marker_radius_m: DEFAULT_MARKER_RADIUS_M,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid {} = {}: {}", parameter, value, reason)
            }
            ConfigError::IoError { message } => write!(f, "I/O error: {}", message),
            ConfigError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration validation result
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

/// Main configuration manager
pub struct ConfigurationManager {
    config: ExplorerConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: ExplorerConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Replace the whole configuration after validating it
    pub fn update_config(&mut self, config: ExplorerConfig) -> Result<(), ConfigError> {
        Self::ensure_valid(Self::validate(&config))?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: ExplorerConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        Self::ensure_valid(Self::validate(&config))?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            }
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment

    /// Update the placement radius; returns the previous value
    pub fn set_placement_radius(&mut self, radius_m: f64) -> Result<f64, ConfigError> {
        Self::check_positive("placement.radius_m", radius_m)?;
        let old_value = self.config.placement.radius_m;
        self.config.placement.radius_m = radius_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the redraw threshold; returns the previous value
    pub fn set_redraw_threshold(&mut self, threshold_m: f64) -> Result<f64, ConfigError> {
        if !threshold_m.is_finite() || threshold_m < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "redraw_threshold_m".to_string(),
                value: threshold_m.to_string(),
                reason: "Redraw threshold must be zero or positive".to_string(),
            });
        }
        let old_value = self.config.redraw_threshold_m;
        self.config.redraw_threshold_m = threshold_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the route altitude offset; returns the previous value
    pub fn set_route_altitude(&mut self, altitude_offset_m: f64) -> Result<f64, ConfigError> {
        if !altitude_offset_m.is_finite() {
            return Err(ConfigError::InvalidParameter {
                parameter: "route.altitude_offset_m".to_string(),
                value: altitude_offset_m.to_string(),
                reason: "Altitude offset must be finite".to_string(),
            });
        }
        let old_value = self.config.route.altitude_offset_m;
        self.config.route.altitude_offset_m = altitude_offset_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the billboard pixel scale; returns the previous value
    pub fn set_pixel_scale(&mut self, pixel_scale_m: f64) -> Result<f64, ConfigError> {
        Self::check_positive("placement.pixel_scale_m", pixel_scale_m)?;
        let old_value = self.config.placement.pixel_scale_m;
        self.config.placement.pixel_scale_m = pixel_scale_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Capture the current configuration
    pub fn create_snapshot(&self) -> ExplorerConfig {
        self.config.clone()
    }

    /// Restore a previously captured configuration
    pub fn restore_from_snapshot(&mut self, snapshot: ExplorerConfig) {
        self.config = snapshot;
        self.is_modified = true;
    }

    /// Validate a configuration without applying it
    pub fn validate(config: &ExplorerConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let positives = [
            ("placement.radius_m", config.placement.radius_m),
            ("placement.pixel_scale_m", config.placement.pixel_scale_m),
            ("route.segment_radius_m", config.route.segment_radius_m),
            ("route.marker_radius_m", config.route.marker_radius_m),
        ];
        for (parameter, value) in positives {
            if let Err(error) = Self::check_positive(parameter, value) {
                errors.push(error);
            }
        }

        if !config.redraw_threshold_m.is_finite() || config.redraw_threshold_m < 0.0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "redraw_threshold_m".to_string(),
                value: config.redraw_threshold_m.to_string(),
                reason: "Redraw threshold must be zero or positive".to_string(),
            });
        }

        for (parameter, value) in [
            ("placement.billboard_altitude_m", config.placement.billboard_altitude_m),
            ("route.altitude_offset_m", config.route.altitude_offset_m),
        ] {
            if !value.is_finite() {
                errors.push(ConfigError::InvalidParameter {
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                    reason: "Altitude offset must be finite".to_string(),
                });
            }
        }

        if config.route.segment_radial_count < 3 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "route.segment_radial_count".to_string(),
                value: config.route.segment_radial_count.to_string(),
                reason: "A cylinder needs at least 3 radial segments".to_string(),
            });
        }

        if config.route.altitude_offset_m > 0.0 {
            warnings.push("Route altitude offset is above eye level".to_string());
        }
        if config.placement.radius_m > 500.0 {
            warnings.push(format!(
                "Placement radius of {} m may place many billboards at once",
                config.placement.radius_m
            ));
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn ensure_valid(validation: ValidationResult) -> Result<(), ConfigError> {
        match validation.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check_positive(parameter: &str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidParameter {
                parameter: parameter.to_string(),
                value: value.to_string(),
                reason: "Must be a positive number".to_string(),
            })
        }
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_behaviour() {
        let config = ExplorerConfig::default();

        assert_eq!(config.placement.radius_m, 50.0);
        assert_eq!(config.placement.pixel_scale_m, 0.0008);
        assert_eq!(config.route.altitude_offset_m, -2.0);
        assert_eq!(config.route.segment_radial_count, 48);
        assert_eq!(config.redraw_threshold_m, 3.0);
        assert!(ConfigurationManager::validate(&config).is_valid);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ExplorerConfig::default();
        config.placement.radius_m = -1.0;
        config.route.segment_radial_count = 2;

        let validation = ConfigurationManager::validate(&config);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 2);

        let mut manager = ConfigurationManager::new();
        assert!(manager.update_config(config).is_err());
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_runtime_adjustment_returns_old_value() {
        let mut manager = ConfigurationManager::new();

        assert_eq!(manager.set_placement_radius(80.0).unwrap(), 50.0);
        assert_eq!(manager.config().placement.radius_m, 80.0);
        assert!(manager.set_placement_radius(0.0).is_err());
        assert!(manager.set_redraw_threshold(f64::NAN).is_err());
        assert_eq!(manager.set_route_altitude(-1.0).unwrap(), -2.0);
        assert!(manager.is_modified());
    }

    #[test]
    fn test_warnings() {
        let mut config = ExplorerConfig::default();
        config.route.altitude_offset_m = 1.0;

        let validation = ConfigurationManager::validate(&config);
        assert!(validation.is_valid);
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExplorerConfig =
            serde_json::from_str(r#"{ "placement": { "radius_m": 25.0 } }"#).unwrap();

        assert_eq!(config.placement.radius_m, 25.0);
        assert_eq!(config.placement.pixel_scale_m, 0.0008);
        assert_eq!(config.route, RouteConfig::default());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer.json");

        let mut manager = ConfigurationManager::new();
        manager.set_redraw_threshold(5.0).unwrap();
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.config().redraw_threshold_m, 5.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ConfigurationManager::from_file("/nonexistent/explorer.json");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut manager = ConfigurationManager::new();
        let snapshot = manager.create_snapshot();

        manager.set_pixel_scale(0.001).unwrap();
        manager.restore_from_snapshot(snapshot);
        assert_eq!(manager.config().placement.pixel_scale_m, 0.0008);
    }
}

use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Failures the placement core can run into. None of them is fatal: each is
/// recovered by a later trigger (new location, image arrival, retry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlacementError {
    /// Photo is eligible but its full image has not been fetched yet
    MissingImageData { photo_id: String },
    /// Image bytes are present but their dimensions cannot be read
    UndecodableImage { photo_id: String, reason: String },
    /// Directions collaborator returned no usable route
    RouteComputationFailed { reason: String },
    /// Geometry that would yield NaN or a zero-length primitive
    DegenerateGeometry { context: String },
    /// Placement computed against a tracking frame that has since been reset
    StaleSessionReference { reset_epoch: u64 },
    /// Coordinate outside the WGS-84 range
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Visible content lost until the next trigger
    High,
    /// Single node missing
    Medium,
    /// Expected transient condition
    Low,
}

impl PlacementError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlacementError::MissingImageData { .. } => "MissingImageData",
            PlacementError::UndecodableImage { .. } => "UndecodableImage",
            PlacementError::RouteComputationFailed { .. } => "RouteComputationFailed",
            PlacementError::DegenerateGeometry { .. } => "DegenerateGeometry",
            PlacementError::StaleSessionReference { .. } => "StaleSessionReference",
            PlacementError::InvalidCoordinate { .. } => "InvalidCoordinate",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlacementError::MissingImageData { .. } => ErrorSeverity::Low,
            PlacementError::StaleSessionReference { .. } => ErrorSeverity::Low,
            PlacementError::UndecodableImage { .. } => ErrorSeverity::Medium,
            PlacementError::DegenerateGeometry { .. } => ErrorSeverity::Medium,
            PlacementError::InvalidCoordinate { .. } => ErrorSeverity::Medium,
            PlacementError::RouteComputationFailed { .. } => ErrorSeverity::High,
        }
    }

    /// Whether waiting for a later trigger can clear this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlacementError::InvalidCoordinate { .. } => false,
            _ => true,
        }
    }
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::MissingImageData { photo_id } => {
                write!(f, "Image data for photo {} not available yet", photo_id)
            }
            PlacementError::UndecodableImage { photo_id, reason } => {
                write!(f, "Cannot read image of photo {}: {}", photo_id, reason)
            }
            PlacementError::RouteComputationFailed { reason } => {
                write!(f, "Route computation failed: {}", reason)
            }
            PlacementError::DegenerateGeometry { context } => {
                write!(f, "Degenerate geometry: {}", context)
            }
            PlacementError::StaleSessionReference { reset_epoch } => {
                write!(f, "Placement refers to tracking frame before reset {}", reset_epoch)
            }
            PlacementError::InvalidCoordinate { latitude, longitude } => {
                write!(f, "Invalid coordinate ({}, {})", latitude, longitude)
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// A reported error with its sequence id
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedError {
    pub error_id: u64,
    pub error: PlacementError,
}

/// Error logging and bookkeeping for recoverable placement failures
pub struct ErrorReporter {
    history: VecDeque<ReportedError>,
    error_counter: u64,
    max_history_size: usize,
    counts_by_kind: HashMap<&'static str, u64>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::with_config(256)
    }

    pub fn with_config(max_history_size: usize) -> Self {
        Self {
            history: VecDeque::new(),
            error_counter: 0,
            max_history_size: max_history_size.max(1),
            counts_by_kind: HashMap::new(),
        }
    }

    /// Log an error and remember it; returns its id
    pub fn report(&mut self, error: PlacementError) -> u64 {
        self.error_counter += 1;
        let error_id = self.error_counter;

        match error.severity() {
            ErrorSeverity::High | ErrorSeverity::Medium => warn!("[{}] {}", error_id, error),
            ErrorSeverity::Low => debug!("[{}] {}", error_id, error),
        }

        *self.counts_by_kind.entry(error.kind()).or_insert(0) += 1;
        self.history.push_back(ReportedError { error_id, error });
        while self.history.len() > self.max_history_size {
            self.history.pop_front();
        }

        error_id
    }

    pub fn count(&self, kind: &str) -> u64 {
        self.counts_by_kind.get(kind).copied().unwrap_or(0)
    }

    pub fn total_reported(&self) -> u64 {
        self.error_counter
    }

    pub fn recent(&self, count: usize) -> Vec<&ReportedError> {
        self.history.iter().rev().take(count).collect()
    }

    pub fn clear_history(&mut self) {
        if !self.history.is_empty() {
            info!("Clearing {} reported placement errors", self.history.len());
        }
        self.history.clear();
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

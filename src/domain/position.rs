// Position domain models
use super::geo::{self, GeoError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One positioning sample as delivered by a location provider.
///
/// `elapsed_ms` is the capture time on the monotonic device clock, not wall
/// time. The type is `Copy`, so storing it never aliases the caller's value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters
    #[serde(default)]
    pub accuracy_m: Option<f32>,
    pub elapsed_ms: u64,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, elapsed_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy_m: None,
            elapsed_ms,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Surface distance in meters to another fix.
    pub fn distance_to(&self, other: &PositionFix) -> Result<f64, GeoError> {
        geo::distance_m(self.point(), other.point())
    }
}

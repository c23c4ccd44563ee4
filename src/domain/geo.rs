// Geodesic helpers for fix distances and traceroute map rendering
use super::position::GeoPoint;
use thiserror::Error;

/// Equatorial radius used when projecting a point along a bearing.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Mean radius used by the haversine distance.
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),

    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),
}

fn validate(point: GeoPoint) -> Result<GeoPoint, GeoError> {
    if !point.latitude.is_finite() || !(-90.0..=90.0).contains(&point.latitude) {
        return Err(GeoError::InvalidLatitude(point.latitude));
    }
    if !point.longitude.is_finite() || !(-180.0..=180.0).contains(&point.longitude) {
        return Err(GeoError::InvalidLongitude(point.longitude));
    }
    Ok(point)
}

/// Great-circle distance in kilometers using the haversine formula.
///
/// # Errors
///
/// Returns [`GeoError`] when either point is non-finite or out of range.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> Result<f64, GeoError> {
    let a = validate(a)?;
    let b = validate(b)?;

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1 for antipodal points
    Ok(2.0 * MEAN_EARTH_RADIUS_KM * h.sqrt().min(1.0).asin())
}

pub fn distance_m(a: GeoPoint, b: GeoPoint) -> Result<f64, GeoError> {
    haversine_km(a, b).map(|km| km * 1000.0)
}

/// Initial bearing from `from` to `to` in degrees (0-360, 0=north, 90=east).
pub fn bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Point reached by travelling `meters` from `origin` along `bearing_deg`.
pub fn offset_meters(origin: GeoPoint, meters: f64, bearing_deg: f64) -> GeoPoint {
    let angular = meters / EARTH_RADIUS_M;
    let bearing_rad = bearing_deg.to_radians();
    let lat = origin.latitude.to_radians();
    let lon = origin.longitude.to_radians();

    let new_lat =
        (lat.sin() * angular.cos() + lat.cos() * angular.sin() * bearing_rad.cos()).asin();
    let new_lon = lon
        + (bearing_rad.sin() * angular.sin() * lat.cos())
            .atan2(angular.cos() - lat.sin() * new_lat.sin());

    GeoPoint::new(new_lat.to_degrees(), new_lon.to_degrees())
}

/// Sum of haversine legs between consecutive points. Legs touching an
/// invalid point contribute nothing.
pub fn path_distance_km(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .filter_map(|pair| haversine_km(pair[0], pair[1]).ok())
        .sum()
}

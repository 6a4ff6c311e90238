//! Geographic points in `[longitude, latitude]` order.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Mean equatorial radius used for spherical distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Errors that can occur when building a [`GeoPoint`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// No coordinates at all.
    #[error("coordinates are missing")]
    Missing,
    /// Coordinates must be exactly `[longitude, latitude]`.
    #[error("expected 2 coordinates (longitude, latitude), got {0}")]
    WrongArity(usize),
    /// NaN or infinite component.
    #[error("coordinates must be finite numbers")]
    NotFinite,
    /// Longitude outside [-180, 180].
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    /// Latitude outside [-90, 90].
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
}

/// A point on the globe, stored GeoJSON-style as `[longitude, latitude]`.
///
/// ```
/// use delicious_core::GeoPoint;
///
/// let point = GeoPoint::new(-79.38, 43.65).unwrap();
/// assert_eq!(point.coordinates(), [-79.38, 43.65]);
///
/// assert!(GeoPoint::new(200.0, 0.0).is_err());
/// assert!(GeoPoint::from_coordinates(&[1.0]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    /// Build a point, checking both components are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns `GeoError::NotFinite` for NaN/infinite input and the
    /// out-of-range variants when a component exceeds its bounds.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GeoError::NotFinite);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Build a point from a coordinate sequence as submitted by clients.
    ///
    /// # Errors
    ///
    /// Returns `GeoError::Missing` for an empty slice, `GeoError::WrongArity`
    /// for anything other than two numbers, and the errors of [`GeoPoint::new`].
    pub fn from_coordinates(coordinates: &[f64]) -> Result<Self, GeoError> {
        match *coordinates {
            [] => Err(GeoError::Missing),
            [longitude, latitude] => Self::new(longitude, latitude),
            _ => Err(GeoError::WrongArity(coordinates.len())),
        }
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// The `[longitude, latitude]` pair.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Great-circle (haversine) distance to another point, in meters.
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.longitude, self.latitude)
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        point.coordinates()
    }
}

impl TryFrom<[f64; 2]> for GeoPoint {
    type Error = GeoError;

    fn try_from([longitude, latitude]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(longitude, latitude)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_bounds() {
        assert!(GeoPoint::new(180.0, 90.0).is_ok());
        assert!(GeoPoint::new(-180.0, -90.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            GeoPoint::new(180.5, 0.0),
            Err(GeoError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, -91.0),
            Err(GeoError::LatitudeOutOfRange(_))
        ));
        assert_eq!(GeoPoint::new(f64::NAN, 0.0), Err(GeoError::NotFinite));
    }

    #[test]
    fn test_from_coordinates_arity() {
        assert_eq!(GeoPoint::from_coordinates(&[]), Err(GeoError::Missing));
        assert_eq!(
            GeoPoint::from_coordinates(&[1.0, 2.0, 3.0]),
            Err(GeoError::WrongArity(3))
        );
        assert_eq!(
            GeoPoint::from_coordinates(&[1.0, 2.0]).unwrap().coordinates(),
            [1.0, 2.0]
        );
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = GeoPoint::new(-79.38, 43.65).unwrap();
        assert!(p.distance_meters(&p).abs() < 1e-6);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of arc on a 6378.1 km sphere is ~111.3 km.
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let d = a.distance_meters(&b);
        assert!((d - 111_318.8).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_serde_as_coordinate_pair() {
        let p = GeoPoint::new(-79.38, 43.65).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[-79.38,43.65]");

        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        assert!(serde_json::from_str::<GeoPoint>("[500.0,0.0]").is_err());
    }
}

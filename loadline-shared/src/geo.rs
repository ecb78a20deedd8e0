/// Great-circle distance math
///
/// Hunt-plan matching needs "how far is this load's origin from the plan's
/// search center", and nothing more. Distances are computed with the haversine
/// formula over a spherical Earth, in statute miles, which is accurate to a
/// fraction of a percent at the ranges dispatchers care about.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles
const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// A WGS84 coordinate pair (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, positive north
    pub lat: f64,

    /// Longitude in degrees, positive east
    pub lon: f64,
}

impl Coordinates {
    /// Creates a coordinate pair
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point, in statute miles
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine_miles(*self, *other)
    }

    /// Whether another point lies within `radius_miles` of this one
    pub fn within_radius(&self, other: &Coordinates, radius_miles: f64) -> bool {
        self.distance_miles(other) <= radius_miles
    }
}

/// Haversine great-circle distance between two points, in statute miles
///
/// # Example
///
/// ```
/// use loadline_shared::geo::{haversine_miles, Coordinates};
///
/// let chicago = Coordinates::new(41.8781, -87.6298);
/// let dallas = Coordinates::new(32.7767, -96.7970);
///
/// let miles = haversine_miles(chicago, dallas);
/// assert!((miles - 803.0).abs() < 10.0);
/// ```
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    // Clamp guards against rounding pushing sqrt's argument past 1.0 for
    // antipodal points.
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero_distance() {
        let p = Coordinates::new(39.7392, -104.9903);
        assert!(haversine_miles(p, p) < 1e-9);
    }

    #[test]
    fn test_known_reference_distances() {
        // NYC -> LA, ~2445 statute miles great-circle
        let nyc = Coordinates::new(40.7128, -74.0060);
        let la = Coordinates::new(34.0522, -118.2437);
        let d = haversine_miles(nyc, la);
        assert!((d - 2445.0).abs() < 15.0, "NYC-LA was {}", d);

        // Chicago -> Milwaukee, ~83 miles
        let chicago = Coordinates::new(41.8781, -87.6298);
        let milwaukee = Coordinates::new(43.0389, -87.9065);
        let d = haversine_miles(chicago, milwaukee);
        assert!((d - 83.0).abs() < 5.0, "CHI-MKE was {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(33.7490, -84.3880);
        let b = Coordinates::new(36.1627, -86.7816);
        let ab = haversine_miles(a, b);
        let ba = haversine_miles(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_within_radius() {
        let atlanta = Coordinates::new(33.7490, -84.3880);
        let marietta = Coordinates::new(33.9526, -84.5499);
        assert!(atlanta.within_radius(&marietta, 25.0));
        assert!(!atlanta.within_radius(&marietta, 10.0));
    }
}

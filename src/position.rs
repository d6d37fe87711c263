use std::fmt;

/// Earth's radius in meters.
const EARTH_RADIUS: f64 = 6371000.0;

/// A GPS coordinate in degrees. All geodesy here is spherical-Earth:
/// good to well under 1% over the sub-kilometer legs this system flies,
/// so no ellipsoidal correction is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.latitude, self.longitude)
    }
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Haversine great-circle distance to another position, in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let lat_from = self.latitude.to_radians();
        let lat_to = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat_from.cos() * lat_to.cos() * (delta_lon / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }

    /// Initial great-circle bearing toward another position.
    /// Returns degrees in [0, 360), where 0 is North.
    pub fn bearing_to(&self, other: &Position) -> f64 {
        let lat_from = self.latitude.to_radians();
        let lat_to = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let y = delta_lon.sin() * lat_to.cos();
        let x = lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * delta_lon.cos();

        let bearing = y.atan2(x).to_degrees();

        (bearing + 360.0) % 360.0
    }

    /// Project this position forward by a given distance and heading.
    /// heading: degrees (0-360, where 0 is North); distance: meters.
    pub fn project(&self, heading: f64, distance: f64) -> Position {
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let brng = heading.to_radians();
        let angular_distance = distance / EARTH_RADIUS;

        let lat2 = (lat1.sin() * angular_distance.cos()
            + lat1.cos() * angular_distance.sin() * brng.cos())
        .asin();

        let lon2 = lon1
            + (brng.sin() * angular_distance.sin() * lat1.cos())
                .atan2(angular_distance.cos() - lat1.sin() * lat2.sin());

        // Normalize longitude to -180 to 180
        let lon2_normalized = ((lon2.to_degrees() + 180.0) % 360.0) - 180.0;

        Position::new(lat2.to_degrees(), lon2_normalized)
    }
}

/// Signed shortest rotation from `from` to `to`, both in degrees.
/// Result is normalized to (-180, 180]: positive means `to` lies
/// clockwise of `from`.
pub fn angle_diff(from: f64, to: f64) -> f64 {
    let mut diff = (to - from) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff <= -180.0 {
        diff += 360.0;
    }
    diff
}

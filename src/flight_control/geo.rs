use std::fmt::{Display, Formatter};

/// Mean earth radius used for all surface distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A target point on the surface with its altitude above home.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_m: f64,
}

impl Waypoint {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self { latitude_deg, longitude_deg, altitude_m }
    }

    pub fn latitude_deg(&self) -> f64 { self.latitude_deg }
    pub fn longitude_deg(&self) -> f64 { self.longitude_deg }
    pub fn altitude_m(&self) -> f64 { self.altitude_m }

    /// Surface distance in metres from the given position to this waypoint.
    pub fn distance_from(&self, latitude_deg: f64, longitude_deg: f64) -> f64 {
        great_circle_distance(latitude_deg, longitude_deg, self.latitude_deg(), self.longitude_deg())
    }
}

impl Display for Waypoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.7}, {:.7}, {:.1} m)",
            self.latitude_deg(),
            self.longitude_deg(),
            self.altitude_m()
        )
    }
}

/// Haversine distance in metres between two latitude/longitude pairs given in degrees.
///
/// The result is symmetric in its arguments, never negative and exactly zero for
/// identical coordinates.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let sin_dlat = (delta_lat / 2.0).sin();
    let sin_dlon = (delta_lon / 2.0).sin();
    let a = sin_dlat * sin_dlat + lat1_rad.cos() * lat2_rad.cos() * sin_dlon * sin_dlon;
    // rounding can push `a` marginally outside [0, 1] for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

use super::message::MavMessage;

/// Fused global position. Latitude/longitude in degE7, altitude above home in millimetres.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct GlobalPositionInt {
    lat: i32,
    lon: i32,
    relative_alt: i32,
}

impl MavMessage for GlobalPositionInt {
    const NAME: &'static str = "GLOBAL_POSITION_INT";
}

impl GlobalPositionInt {
    const DEG_E7: f64 = 1e7;
    const MM_PER_M: f64 = 1000.0;

    pub(crate) fn latitude_deg(&self) -> f64 { f64::from(self.lat) / Self::DEG_E7 }
    pub(crate) fn longitude_deg(&self) -> f64 { f64::from(self.lon) / Self::DEG_E7 }
    /// Altitude above the home position in metres.
    pub(crate) fn relative_alt_m(&self) -> f64 { f64::from(self.relative_alt) / Self::MM_PER_M }
}

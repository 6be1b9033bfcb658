use super::message::MavMessage;

/// A mission item as last transferred over the link. `x`/`y` in degE7, `z` in metres.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct MissionItemInt {
    seq: u16,
    x: i32,
    y: i32,
    z: f32,
}

impl MavMessage for MissionItemInt {
    const NAME: &'static str = "MISSION_ITEM_INT";
}

impl MissionItemInt {
    pub(crate) fn seq(&self) -> u16 { self.seq }
    pub(crate) fn latitude_deg(&self) -> f64 { f64::from(self.x) / 1e7 }
    pub(crate) fn longitude_deg(&self) -> f64 { f64::from(self.y) / 1e7 }
    pub(crate) fn altitude_m(&self) -> f64 { f64::from(self.z) }
}

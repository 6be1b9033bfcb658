use super::message::MavMessage;

/// HUD data; only the groundspeed is of interest for the drop.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct VfrHud {
    groundspeed: f32,
}

impl MavMessage for VfrHud {
    const NAME: &'static str = "VFR_HUD";
}

impl VfrHud {
    /// Groundspeed in m/s.
    pub(crate) fn groundspeed(&self) -> f32 { self.groundspeed }
}

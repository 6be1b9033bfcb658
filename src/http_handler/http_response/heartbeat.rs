use super::message::{MavEnum, MavMessage};

#[derive(serde::Deserialize, Debug)]
pub(crate) struct Heartbeat {
    mavtype: MavEnum,
    system_status: MavEnum,
}

impl MavMessage for Heartbeat {
    const NAME: &'static str = "HEARTBEAT";
}

impl Heartbeat {
    pub(crate) fn mavtype(&self) -> &str { self.mavtype.kind() }
    pub(crate) fn system_status(&self) -> &str { self.system_status.kind() }
}

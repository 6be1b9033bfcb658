use super::message::{MavEnum, MavMessage};

#[derive(serde::Deserialize, Debug)]
pub(crate) struct CommandAck {
    command: MavEnum,
    result: MavEnum,
}

impl MavMessage for CommandAck {
    const NAME: &'static str = "COMMAND_ACK";
}

impl CommandAck {
    pub(crate) const ACCEPTED: &'static str = "MAV_RESULT_ACCEPTED";
    pub(crate) const IN_PROGRESS: &'static str = "MAV_RESULT_IN_PROGRESS";

    pub(crate) fn command(&self) -> &str { self.command.kind() }
    pub(crate) fn result(&self) -> &str { self.result.kind() }
    pub(crate) fn is_accepted(&self) -> bool { self.result() == Self::ACCEPTED }
    pub(crate) fn is_in_progress(&self) -> bool { self.result() == Self::IN_PROGRESS }
}

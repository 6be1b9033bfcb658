use super::command_post::CommandPostResponse;
use super::message::MavEnum;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};

/// Request type for the /mavlink endpoint carrying a single `COMMAND_LONG`.
#[derive(serde::Serialize, Debug)]
pub(crate) struct CommandLongRequest {
    /// MAVLink header the bridge uses when framing the message.
    header: MavHeader,
    /// The command message itself.
    message: CommandLong,
}

/// Sender identity of the ground station side.
#[derive(serde::Serialize, Debug, Clone, Copy)]
pub(crate) struct MavHeader {
    pub(crate) system_id: u8,
    pub(crate) component_id: u8,
    pub(crate) sequence: u8,
}

#[derive(serde::Serialize, Debug)]
pub(crate) struct CommandLong {
    #[serde(rename = "type")]
    kind: &'static str,
    target_system: u8,
    target_component: u8,
    command: MavEnum,
    confirmation: u8,
    param1: f32,
    param2: f32,
    param3: f32,
    param4: f32,
    param5: f32,
    param6: f32,
    param7: f32,
}

impl CommandLongRequest {
    pub(crate) const SET_RELAY: &'static str = "MAV_CMD_DO_SET_RELAY";

    /// Builds a `MAV_CMD_DO_SET_RELAY` for the given relay (param1) and state (param2).
    pub(crate) fn set_relay(
        header: MavHeader,
        target: (u8, u8),
        relay_index: u8,
        assert: bool,
    ) -> Self {
        Self {
            header,
            message: CommandLong {
                kind: "COMMAND_LONG",
                target_system: target.0,
                target_component: target.1,
                command: MavEnum::new(Self::SET_RELAY),
                confirmation: 0,
                param1: f32::from(relay_index),
                param2: if assert { 1.0 } else { 0.0 },
                param3: 0.0,
                param4: 0.0,
                param5: 0.0,
                param6: 0.0,
                param7: 0.0,
            },
        }
    }
}

impl JSONBodyHTTPRequestType for CommandLongRequest {
    /// The type of the json body.
    type Body = CommandLongRequest;
    /// Returns the serializable object.
    fn body(&self) -> &Self::Body { self }
}

impl HTTPRequestType for CommandLongRequest {
    /// Type of the expected response.
    type Response = CommandPostResponse;
    fn endpoint(&self) -> String { String::from("/mavlink") }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}

use super::message::{MavMessage, MessageEnvelope};
use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};
use std::marker::PhantomData;

/// Request type for the latest instance of a MAVLink message seen by the bridge,
/// i.e. `/mavlink/vehicles/{sys}/components/{comp}/messages/{NAME}`.
#[derive(Debug)]
pub(crate) struct MessageRequest<M: MavMessage> {
    system_id: u8,
    component_id: u8,
    _message: PhantomData<fn() -> M>,
}

impl<M: MavMessage> MessageRequest<M> {
    pub(crate) fn new(system_id: u8, component_id: u8) -> Self {
        Self { system_id, component_id, _message: PhantomData }
    }
}

impl<M: MavMessage> NoBodyHTTPRequestType for MessageRequest<M> {}

impl<M: MavMessage> HTTPRequestType for MessageRequest<M> {
    /// Type of the expected response.
    type Response = MessageEnvelope<M>;
    fn endpoint(&self) -> String {
        format!(
            "/mavlink/vehicles/{}/components/{}/messages/{}",
            self.system_id,
            self.component_id,
            M::NAME
        )
    }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}

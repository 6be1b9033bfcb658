use super::settings::LinkSettings;
use crate::http_handler::{
    HTTPError,
    http_client::HTTPClient,
    http_request::{
        command_long_post::{CommandLongRequest, MavHeader},
        message_get::MessageRequest,
        request_common::{JSONBodyHTTPRequestType, NoBodyHTTPRequestType, RequestError},
    },
    http_response::message::{MavMessage, MessageEnvelope},
};
use crate::log;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use strum_macros::Display;

/// Failure to establish or keep the link to the vehicle.
#[derive(Debug, Display, Clone)]
pub enum ConnectionError {
    /// No live heartbeat within the given timeout.
    NoHeartbeat(std::time::Duration),
    /// The link was explicitly closed.
    Closed,
    Link(HTTPError),
}

impl std::error::Error for ConnectionError {}

impl From<HTTPError> for ConnectionError {
    fn from(value: HTTPError) -> Self { ConnectionError::Link(value) }
}

/// Address of one vehicle's MAVLink bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleEndpoint {
    /// Operator-facing name, if the vehicle was picked from the fleet list.
    pub name: Option<String>,
    /// Base URL of the bridge.
    pub url: String,
    pub system_id: u8,
    pub component_id: u8,
}

impl VehicleEndpoint {
    pub const DEFAULT_URL: &'static str = "http://127.0.0.1:8088/v1";

    pub fn new(url: &str) -> Self {
        Self { name: None, url: String::from(url), system_id: 1, component_id: 1 }
    }

    pub fn display_name(&self) -> &str { self.name.as_deref().unwrap_or(self.url.as_str()) }
}

/// Owned connection to a single vehicle.
///
/// Shared by the telemetry client and the actuator gateway of one session and
/// torn down with [`VehicleLink::close`]. Every request after closing fails.
#[derive(Debug)]
pub struct VehicleLink {
    client: HTTPClient,
    endpoint: VehicleEndpoint,
    gcs_header: (u8, u8),
    sequence: AtomicU8,
    closed: AtomicBool,
}

impl VehicleLink {
    /// System/component id under which commands are sent (ground station range).
    const GCS_IDS: (u8, u8) = (255, 190);

    /// Opens the link. No traffic is generated until the first request.
    ///
    /// # Errors
    /// `ConnectionError::Link` if the HTTP client cannot be built.
    pub fn open(endpoint: VehicleEndpoint, settings: &LinkSettings) -> Result<Self, ConnectionError> {
        let client = HTTPClient::new(&endpoint.url, settings.request_timeout)
            .map_err(|e| HTTPError::from(RequestError::from(e)))?;
        Ok(Self {
            client,
            endpoint,
            gcs_header: Self::GCS_IDS,
            sequence: AtomicU8::new(0),
            closed: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> &VehicleEndpoint { &self.endpoint }

    /// Latest instance of message `M` as seen by the bridge.
    pub(crate) async fn fetch<M: MavMessage>(&self) -> Result<MessageEnvelope<M>, ConnectionError> {
        self.ensure_open()?;
        let request = MessageRequest::<M>::new(self.endpoint.system_id, self.endpoint.component_id);
        Ok(request.send_request(&self.client).await?)
    }

    /// Forwards a `MAV_CMD_DO_SET_RELAY` to the vehicle.
    pub(crate) async fn send_set_relay(
        &self,
        relay_index: u8,
        assert: bool,
    ) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        let header = MavHeader {
            system_id: self.gcs_header.0,
            component_id: self.gcs_header.1,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        let target = (self.endpoint.system_id, self.endpoint.component_id);
        let request = CommandLongRequest::set_relay(header, target, relay_index, assert);
        Ok(request.send_request(&self.client).await?)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            log!("Closed link to {}.", self.endpoint.display_name());
        }
    }

    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.is_closed() { Err(ConnectionError::Closed) } else { Ok(()) }
    }
}

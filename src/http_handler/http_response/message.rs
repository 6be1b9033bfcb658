use super::response_common::SerdeJSONBodyHTTPResponseType;
use chrono::{DateTime, TimeDelta, Utc};

/// A MAVLink message type the bridge can report.
pub(crate) trait MavMessage: for<'de> serde::Deserialize<'de> + Send + Sync {
    /// Message name as used in the bridge's URL scheme.
    const NAME: &'static str;
}

/// Latest instance of a message together with the bridge's bookkeeping about it.
#[derive(serde::Deserialize, Debug)]
#[serde(bound(deserialize = "M: MavMessage"))]
pub(crate) struct MessageEnvelope<M: MavMessage> {
    message: M,
    status: MessageStatus,
}

#[derive(serde::Deserialize, Debug)]
struct MessageStatus {
    time: MessageTime,
}

#[derive(serde::Deserialize, Debug)]
struct MessageTime {
    counter: u64,
    last_update: DateTime<Utc>,
}

impl<M: MavMessage> SerdeJSONBodyHTTPResponseType for MessageEnvelope<M> {}

impl<M: MavMessage> MessageEnvelope<M> {
    pub(crate) fn message(&self) -> &M { &self.message }
    pub(crate) fn into_message(self) -> M { self.message }
    /// Number of instances the bridge has received so far.
    pub(crate) fn counter(&self) -> u64 { self.status.time.counter }
    /// Reception time of this instance.
    pub(crate) fn last_update(&self) -> DateTime<Utc> { self.status.time.last_update }
    pub(crate) fn age(&self, now: DateTime<Utc>) -> TimeDelta { now - self.last_update() }
}

/// MAVLink enum values are encoded as `{"type": "VARIANT_NAME"}`.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct MavEnum {
    #[serde(rename = "type")]
    kind: String,
}

impl MavEnum {
    pub(crate) fn new(kind: &str) -> Self { Self { kind: String::from(kind) } }
    pub(crate) fn kind(&self) -> &str { self.kind.as_str() }
}

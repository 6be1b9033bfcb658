use super::{
    settings::LinkSettings,
    vehicle_link::{ConnectionError, VehicleLink},
};
use crate::http_handler::http_request::command_long_post::CommandLongRequest;
use crate::http_handler::http_response::command_ack::CommandAck;
use crate::{event, warn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use strum_macros::Display;

/// A discrete command to the release relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCommand {
    pub relay_index: u8,
    pub assert: bool,
}

impl RelayCommand {
    pub fn activate(relay_index: u8) -> Self { Self { relay_index, assert: true } }
    pub fn deactivate(relay_index: u8) -> Self { Self { relay_index, assert: false } }
}

impl std::fmt::Display for RelayCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.assert { "ON" } else { "OFF" };
        write!(f, "relay {} {state}", self.relay_index)
    }
}

/// Positive acknowledgement of a relay command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayAck {
    pub command: RelayCommand,
    pub acknowledged_at: DateTime<Utc>,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// The link is down or the vehicle never answered.
    Unreachable(String),
    /// The vehicle answered with a result other than accepted (e.g. wrong mode).
    Rejected(String),
}

impl std::error::Error for ActuatorError {}

impl From<ConnectionError> for ActuatorError {
    fn from(value: ConnectionError) -> Self { ActuatorError::Unreachable(value.to_string()) }
}

/// Sends relay commands. Taking `&mut self` keeps a second command from being
/// issued before the previous one's result is known.
#[async_trait]
pub trait RelayActuator: Send {
    async fn send(&mut self, command: RelayCommand) -> Result<RelayAck, ActuatorError>;
}

/// [`RelayActuator`] issuing `MAV_CMD_DO_SET_RELAY` over the vehicle link and
/// waiting for the matching `COMMAND_ACK`.
pub struct ActuatorGateway {
    link: Arc<VehicleLink>,
    settings: LinkSettings,
}

impl ActuatorGateway {
    pub fn new(link: Arc<VehicleLink>, settings: LinkSettings) -> Self { Self { link, settings } }

    /// Number of acknowledgements the bridge has seen so far.
    async fn ack_counter(&self) -> Result<u64, ActuatorError> {
        match self.link.fetch::<CommandAck>().await {
            Ok(ack) => Ok(ack.counter()),
            Err(ConnectionError::Link(e)) if e.is_not_found() => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Waits for an acknowledgement of `MAV_CMD_DO_SET_RELAY` newer than `seen`.
    async fn await_ack(&self, seen: u64) -> Result<(), ActuatorError> {
        loop {
            match self.link.fetch::<CommandAck>().await {
                Ok(ack) if ack.counter() > seen => {
                    let msg = ack.message();
                    if msg.command() != CommandLongRequest::SET_RELAY {
                        event!("Ignoring acknowledgement for {}.", msg.command());
                    } else if msg.is_accepted() {
                        return Ok(());
                    } else if !msg.is_in_progress() {
                        return Err(ActuatorError::Rejected(msg.result().to_string()));
                    }
                }
                Ok(_) => (),
                Err(ConnectionError::Link(e)) if e.is_not_found() => (),
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(self.settings.refresh_interval).await;
        }
    }
}

#[async_trait]
impl RelayActuator for ActuatorGateway {
    async fn send(&mut self, command: RelayCommand) -> Result<RelayAck, ActuatorError> {
        let seen = self.ack_counter().await?;
        self.link.send_set_relay(command.relay_index, command.assert).await?;
        let acked = tokio::time::timeout(self.settings.command_timeout, self.await_ack(seen)).await;
        match acked {
            Ok(Ok(())) => Ok(RelayAck { command, acknowledged_at: Utc::now() }),
            Ok(Err(e)) => {
                warn!("Vehicle refused {command}: {e:?}");
                Err(e)
            }
            Err(_) => Err(ActuatorError::Unreachable(format!(
                "no acknowledgement within {}ms",
                self.settings.command_timeout.as_millis()
            ))),
        }
    }
}

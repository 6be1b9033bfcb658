use super::{
    drop_model::InvalidInputError,
    geo::Waypoint,
    settings::LinkSettings,
    vehicle_link::{ConnectionError, VehicleLink},
};
use crate::http_handler::http_response::{
    global_position_int::GlobalPositionInt,
    heartbeat::Heartbeat,
    message::{MavMessage, MessageEnvelope},
    mission_item_int::MissionItemInt,
    vfr_hud::VfrHud,
};
use crate::{info, warn};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use strum_macros::Display;

/// Failures while reading the vehicle's state.
#[derive(Debug, Display, Clone)]
pub enum TelemetryError {
    Connection(ConnectionError),
    /// No report younger than the maximum sample age arrived in time. Carries the
    /// age of the newest report seen, if any.
    Stale(Option<TimeDelta>),
    InvalidInput(InvalidInputError),
    /// Neither an external target nor a mission item is available.
    NoTarget,
}

impl std::error::Error for TelemetryError {}

impl From<ConnectionError> for TelemetryError {
    fn from(value: ConnectionError) -> Self { TelemetryError::Connection(value) }
}

impl From<InvalidInputError> for TelemetryError {
    fn from(value: InvalidInputError) -> Self { TelemetryError::InvalidInput(value) }
}

/// Position and altitude (above home) at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub timestamp: DateTime<Utc>,
}

/// One validated reading of everything the trigger condition needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    altitude_m: f64,
    groundspeed_mps: f64,
    latitude_deg: f64,
    longitude_deg: f64,
    timestamp: DateTime<Utc>,
}

impl TelemetrySample {
    /// # Errors
    /// `InvalidInputError` for negative or non-finite altitude or groundspeed.
    pub fn new(position: PositionReport, groundspeed_mps: f64) -> Result<Self, InvalidInputError> {
        let values = [position.altitude_m, groundspeed_mps, position.latitude_deg, position.longitude_deg];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(InvalidInputError::NotFinite);
        }
        if position.altitude_m < 0.0 {
            return Err(InvalidInputError::NegativeAltitude(position.altitude_m));
        }
        if groundspeed_mps < 0.0 {
            return Err(InvalidInputError::NegativeGroundspeed(groundspeed_mps));
        }
        Ok(Self {
            altitude_m: position.altitude_m,
            groundspeed_mps,
            latitude_deg: position.latitude_deg,
            longitude_deg: position.longitude_deg,
            timestamp: position.timestamp,
        })
    }

    pub fn altitude_m(&self) -> f64 { self.altitude_m }
    pub fn groundspeed_mps(&self) -> f64 { self.groundspeed_mps }
    pub fn latitude_deg(&self) -> f64 { self.latitude_deg }
    pub fn longitude_deg(&self) -> f64 { self.longitude_deg }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
}

/// Pull-based access to the vehicle's live state.
#[async_trait]
pub trait TelemetrySource: Send {
    /// Most recent position-and-altitude report, never older than the maximum sample age.
    async fn latest_position_and_altitude(&mut self) -> Result<PositionReport, TelemetryError>;

    /// Most recent groundspeed in m/s.
    async fn latest_groundspeed(&mut self) -> Result<f64, TelemetryError>;

    /// The waypoint the payload has to land on.
    async fn target_waypoint(&mut self) -> Result<Waypoint, TelemetryError>;

    /// Reads position and groundspeed and combines them into one validated sample.
    async fn poll_sample(&mut self) -> Result<TelemetrySample, TelemetryError> {
        let position = self.latest_position_and_altitude().await?;
        let groundspeed = self.latest_groundspeed().await?;
        Ok(TelemetrySample::new(position, groundspeed)?)
    }
}

/// [`TelemetrySource`] backed by the vehicle's MAVLink bridge.
pub struct TelemetryClient {
    link: Arc<VehicleLink>,
    settings: LinkSettings,
    external_target: Option<Waypoint>,
}

impl TelemetryClient {
    /// Wraps `link` and blocks until the vehicle's heartbeat is observed.
    ///
    /// # Arguments
    /// * `link` – The owned connection shared with the actuator gateway.
    /// * `settings` – Timeouts and freshness bounds.
    /// * `external_target` – The operator-supplied target, if any.
    ///
    /// # Errors
    /// `ConnectionError::NoHeartbeat` if no fresh heartbeat arrives within
    /// `heartbeat_timeout`, `ConnectionError::Link` if the bridge is unreachable.
    pub async fn connect(
        link: Arc<VehicleLink>,
        settings: LinkSettings,
        external_target: Option<Waypoint>,
    ) -> Result<Self, ConnectionError> {
        let client = Self { link, settings, external_target };
        let heartbeat = tokio::time::timeout(settings.heartbeat_timeout, async {
            loop {
                match client.link.fetch::<Heartbeat>().await {
                    Ok(hb) if hb.age(Utc::now()) <= settings.max_sample_age => return Ok(hb),
                    Ok(_) => (),
                    Err(ConnectionError::Link(e)) if e.is_not_found() || e.is_link_down() => (),
                    Err(e) => return Err(e),
                }
                tokio::time::sleep(settings.refresh_interval).await;
            }
        })
        .await
        .map_err(|_| ConnectionError::NoHeartbeat(settings.heartbeat_timeout))??;
        info!(
            "Connected to {} ({}, status {}).",
            client.link.endpoint().display_name(),
            heartbeat.message().mavtype(),
            heartbeat.message().system_status()
        );
        Ok(client)
    }

    /// Polls the bridge until it reports an instance of `M` that is fresh enough.
    async fn read_fresh<M: MavMessage>(&self) -> Result<MessageEnvelope<M>, TelemetryError> {
        let mut newest_age = None;
        let read = tokio::time::timeout(self.settings.read_timeout, async {
            loop {
                match self.link.fetch::<M>().await {
                    Ok(msg) => {
                        let age = msg.age(Utc::now());
                        if age <= self.settings.max_sample_age {
                            return Ok(msg);
                        }
                        newest_age = Some(age);
                    }
                    Err(ConnectionError::Link(e)) if e.is_not_found() => (),
                    Err(e) => return Err(TelemetryError::Connection(e)),
                }
                tokio::time::sleep(self.settings.refresh_interval).await;
            }
        })
        .await;
        read.unwrap_or(Err(TelemetryError::Stale(newest_age)))
    }
}

#[async_trait]
impl TelemetrySource for TelemetryClient {
    async fn latest_position_and_altitude(&mut self) -> Result<PositionReport, TelemetryError> {
        let msg = self.read_fresh::<GlobalPositionInt>().await?;
        let timestamp = msg.last_update();
        let pos = msg.into_message();
        Ok(PositionReport {
            latitude_deg: pos.latitude_deg(),
            longitude_deg: pos.longitude_deg(),
            altitude_m: pos.relative_alt_m(),
            timestamp,
        })
    }

    async fn latest_groundspeed(&mut self) -> Result<f64, TelemetryError> {
        let msg = self.read_fresh::<VfrHud>().await?;
        Ok(f64::from(msg.message().groundspeed()))
    }

    async fn target_waypoint(&mut self) -> Result<Waypoint, TelemetryError> {
        if let Some(target) = self.external_target {
            return Ok(target);
        }
        match self.link.fetch::<MissionItemInt>().await {
            Ok(msg) => {
                let item = msg.message();
                warn!("No target supplied, using mission item {} of the vehicle.", item.seq());
                Ok(Waypoint::new(item.latitude_deg(), item.longitude_deg(), item.altitude_m()))
            }
            Err(ConnectionError::Link(e)) if e.is_not_found() => Err(TelemetryError::NoTarget),
            Err(e) => Err(TelemetryError::Connection(e)),
        }
    }
}

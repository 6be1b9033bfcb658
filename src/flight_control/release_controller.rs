use super::{
    actuator::{RelayAck, RelayActuator, RelayCommand},
    drop_model::lead_distance,
    drop_phase::DropPhase,
    drop_session::{AbortReason, DropError, DropReport, DropSession, DropStatus},
    geo::Waypoint,
    settings::ReleaseSettings,
    telemetry::{TelemetryError, TelemetrySample, TelemetrySource},
};
use crate::{drop_evt, error, event, info, log, warn};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of executing the current phase.
enum Step {
    Next(DropPhase),
    Abort(AbortReason),
}

/// The [`ReleaseController`] runs one drop session against a single target:
/// - polls telemetry and recomputes the required lead distance on every poll
/// - fires once the distance to the target is within the lead distance
/// - asserts the relay, holds it, and deasserts it again
/// - on any abort, still sends one best-effort deactivate
///
/// Telemetry source and actuator are borrowed exclusively for the lifetime of
/// the controller, so only one session can be active per vehicle connection.
pub struct ReleaseController<'a, T: TelemetrySource + ?Sized, A: RelayActuator + ?Sized> {
    telemetry: &'a mut T,
    actuator: &'a mut A,
    settings: ReleaseSettings,
    session: DropSession,
    payload: String,
    c_tok: CancellationToken,
    /// Monotonic activation time the hold is measured from.
    activated: Option<Instant>,
    /// Previous evaluated sample, only kept to detect repeated data.
    last_sample: Option<TelemetrySample>,
    polls: u32,
    last_distance_m: Option<f64>,
    last_lead_distance_m: Option<f64>,
    relay_released: bool,
}

impl<'a, T, A> ReleaseController<'a, T, A>
where
    T: TelemetrySource + ?Sized,
    A: RelayActuator + ?Sized,
{
    /// Creates a controller with a fresh session in `AwaitingTrigger`.
    ///
    /// # Arguments
    /// * `telemetry` – Source of position, altitude and groundspeed.
    /// * `actuator` – Gateway to the release relay.
    /// * `target` – The waypoint the payload has to land on.
    /// * `payload` – Display name of the payload, only used for logging.
    /// * `settings` – Relay index and timing of the session.
    /// * `c_tok` – Cancelling this token aborts the session.
    pub fn new(
        telemetry: &'a mut T,
        actuator: &'a mut A,
        target: Waypoint,
        payload: &str,
        settings: ReleaseSettings,
        c_tok: CancellationToken,
    ) -> Self {
        Self {
            telemetry,
            actuator,
            settings,
            session: DropSession::new(target),
            payload: String::from(payload),
            c_tok,
            activated: None,
            last_sample: None,
            polls: 0,
            last_distance_m: None,
            last_lead_distance_m: None,
            relay_released: false,
        }
    }

    pub fn phase(&self) -> DropPhase { self.session.phase() }

    /// Drives the session until it is `Complete` or `Aborted`.
    ///
    /// # Errors
    /// `DropError::SessionFinished` if the session already ended, or a violated
    /// phase invariant.
    pub async fn run(&mut self) -> Result<DropReport, DropError> {
        if self.session.phase().is_terminal() {
            return Err(DropError::SessionFinished(self.session.phase()));
        }
        drop_evt!(
            "Drop session for '{}' armed, target {}.",
            self.payload,
            self.session.target()
        );
        loop {
            let step = match self.session.phase() {
                DropPhase::AwaitingTrigger => self.await_trigger().await,
                DropPhase::Activating => self.activate().await?,
                DropPhase::Holding => self.hold().await,
                DropPhase::Deactivating => self.deactivate().await?,
                DropPhase::Complete | DropPhase::Aborted => break,
            };
            match step {
                Step::Next(next) => {
                    log!("Drop phase {} -> {next}.", self.session.phase());
                    self.session.advance(next)?;
                }
                Step::Abort(reason) => self.abort(reason).await?,
            }
        }
        let report = self.report();
        match &report.status {
            DropStatus::Complete => info!("Drop of '{}' complete.", self.payload),
            DropStatus::Aborted(reason) => error!("Drop of '{}' aborted: {reason:?}", self.payload),
        }
        Ok(report)
    }

    /// Issues a relay command. Only an activate in `Activating` or a deactivate in
    /// `Deactivating` is ever sent.
    ///
    /// # Errors
    /// `DropError::CommandOutsideWindow` in any other phase, `DropError::Actuator`
    /// if the gateway fails.
    pub async fn command_relay(&mut self, assert: bool) -> Result<RelayAck, DropError> {
        let phase = self.session.phase();
        if phase.command_window() != Some(assert) {
            return Err(DropError::CommandOutsideWindow(phase));
        }
        let command = if assert {
            RelayCommand::activate(self.settings.relay_index)
        } else {
            RelayCommand::deactivate(self.settings.relay_index)
        };
        self.actuator.send(command).await.map_err(DropError::Actuator)
    }

    async fn await_trigger(&mut self) -> Step {
        let mut failures = 0;
        loop {
            let polled = tokio::select! {
                biased;
                () = self.c_tok.cancelled() => return Step::Abort(AbortReason::Cancelled),
                polled = self.telemetry.poll_sample() => polled,
            };
            match polled.and_then(|sample| self.evaluate(sample)) {
                Ok(true) => return Step::Next(DropPhase::Activating),
                Ok(false) => failures = 0,
                Err(e) => {
                    failures += 1;
                    if failures > self.settings.max_telemetry_retries {
                        error!("Telemetry lost after {failures} consecutive failures: {e:?}");
                        return Step::Abort(AbortReason::TelemetryLost(e));
                    }
                    let backoff = self.settings.backoff(failures);
                    warn!(
                        "Telemetry read failed ({failures}/{}): {e:?}. Retrying in {}ms.",
                        self.settings.max_telemetry_retries,
                        backoff.as_millis()
                    );
                    if !self.pause(backoff).await {
                        return Step::Abort(AbortReason::Cancelled);
                    }
                    continue;
                }
            }
            if !self.pause(self.settings.poll_interval).await {
                return Step::Abort(AbortReason::Cancelled);
            }
        }
    }

    /// Evaluates the trigger condition on `sample`. Repeated samples never fire.
    fn evaluate(&mut self, sample: TelemetrySample) -> Result<bool, TelemetryError> {
        if self.last_sample.is_some_and(|prev| sample.timestamp() <= prev.timestamp()) {
            event!("No telemetry newer than {}, skipping evaluation.", sample.timestamp());
            return Ok(false);
        }
        self.last_sample = Some(sample);
        self.polls += 1;

        let required = lead_distance(sample.altitude_m(), sample.groundspeed_mps())?;
        let actual = self.session.target().distance_from(sample.latitude_deg(), sample.longitude_deg());
        self.last_lead_distance_m = Some(required);
        self.last_distance_m = Some(actual);
        event!(
            "Poll {}: altitude {:.1} m, groundspeed {:.1} m/s, lead {required:.2} m, distance {actual:.2} m.",
            self.polls,
            sample.altitude_m(),
            sample.groundspeed_mps()
        );
        if actual <= required {
            drop_evt!("Trigger: {actual:.2} m to target within lead distance {required:.2} m.");
            return Ok(true);
        }
        Ok(false)
    }

    async fn activate(&mut self) -> Result<Step, DropError> {
        match self.command_relay_retrying(true).await {
            Ok(ack) => {
                self.activated = Some(Instant::now());
                self.session.mark_activated(ack.acknowledged_at);
                drop_evt!("Payload '{}' released ({} acknowledged).", self.payload, ack.command);
                Ok(Step::Next(DropPhase::Holding))
            }
            Err(DropError::Actuator(e)) => Ok(Step::Abort(AbortReason::ActuatorFailure(e))),
            Err(e) => Err(e),
        }
    }

    async fn hold(&mut self) -> Step {
        let until = self.activated.unwrap_or_else(Instant::now) + self.settings.hold_duration;
        tokio::select! {
            biased;
            () = self.c_tok.cancelled() => Step::Abort(AbortReason::Cancelled),
            () = tokio::time::sleep_until(until) => Step::Next(DropPhase::Deactivating),
        }
    }

    async fn deactivate(&mut self) -> Result<Step, DropError> {
        match self.command_relay_retrying(false).await {
            Ok(ack) => {
                self.relay_released = true;
                self.session.mark_deactivated(ack.acknowledged_at);
                drop_evt!("Release mechanism closed ({} acknowledged).", ack.command);
                Ok(Step::Next(DropPhase::Complete))
            }
            Err(DropError::Actuator(e)) => Ok(Step::Abort(AbortReason::ActuatorFailure(e))),
            Err(e) => Err(e),
        }
    }

    /// Sends a relay command, retrying once on any actuator failure.
    async fn command_relay_retrying(&mut self, assert: bool) -> Result<RelayAck, DropError> {
        match self.command_relay(assert).await {
            Err(DropError::Actuator(e)) => {
                warn!("Relay command failed ({e:?}), retrying once.");
                self.command_relay(assert).await
            }
            other => other,
        }
    }

    /// Ends the session in `Aborted` after one best-effort deactivate.
    async fn abort(&mut self, reason: AbortReason) -> Result<(), DropError> {
        warn!("Aborting drop in phase {}: {reason:?}", self.session.phase());
        let command = RelayCommand::deactivate(self.settings.relay_index);
        match self.actuator.send(command).await {
            Ok(ack) => {
                self.relay_released = true;
                self.session.mark_deactivated(ack.acknowledged_at);
                log!("Best-effort {command} acknowledged.");
            }
            Err(e) => error!("Best-effort {command} failed: {e:?}. Relay state unknown!"),
        }
        self.session.abort(reason)
    }

    /// Waits for `duration`. Returns `false` if the session was cancelled meanwhile.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::time::timeout(duration, self.c_tok.cancelled()).await.is_err()
    }

    fn report(&self) -> DropReport {
        let status = match self.session.abort_reason() {
            Some(reason) => DropStatus::Aborted(reason.clone()),
            None => DropStatus::Complete,
        };
        DropReport {
            status,
            payload: self.payload.clone(),
            target: *self.session.target(),
            polls: self.polls,
            last_distance_m: self.last_distance_m,
            last_lead_distance_m: self.last_lead_distance_m,
            activated_at: self.session.activated_at(),
            deactivated_at: self.session.deactivated_at(),
            relay_released: self.relay_released,
        }
    }
}

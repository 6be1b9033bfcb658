use super::{
    actuator::ActuatorError, drop_phase::DropPhase, geo::Waypoint, telemetry::TelemetryError,
};
use chrono::{DateTime, Utc};
use strum_macros::Display;

/// Why a session ended in [`DropPhase::Aborted`].
#[derive(Debug, Display, Clone)]
pub enum AbortReason {
    /// External abort request.
    Cancelled,
    /// Telemetry kept failing beyond the retry budget.
    TelemetryLost(TelemetryError),
    ActuatorFailure(ActuatorError),
}

/// Errors of the session bookkeeping itself, as opposed to a failed drop.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum DropError {
    /// The session already reached the given terminal phase.
    SessionFinished(DropPhase),
    /// A relay command was requested outside `Activating`/`Deactivating`.
    CommandOutsideWindow(DropPhase),
    IllegalTransition { from: DropPhase, to: DropPhase },
    /// A relay command inside its window failed.
    Actuator(ActuatorError),
}

impl std::error::Error for DropError {}

/// State of one release attempt against a single target.
#[derive(Debug)]
pub struct DropSession {
    target: Waypoint,
    phase: DropPhase,
    activated_at: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
    abort_reason: Option<AbortReason>,
}

impl DropSession {
    pub fn new(target: Waypoint) -> Self {
        Self {
            target,
            phase: DropPhase::AwaitingTrigger,
            activated_at: None,
            deactivated_at: None,
            abort_reason: None,
        }
    }

    pub fn target(&self) -> &Waypoint { &self.target }
    pub fn phase(&self) -> DropPhase { self.phase }
    pub fn activated_at(&self) -> Option<DateTime<Utc>> { self.activated_at }
    pub fn deactivated_at(&self) -> Option<DateTime<Utc>> { self.deactivated_at }
    pub fn abort_reason(&self) -> Option<&AbortReason> { self.abort_reason.as_ref() }

    /// Moves to `next` along the regular phase sequence.
    ///
    /// # Errors
    /// `DropError::IllegalTransition` if `next` is not the successor of the current
    /// phase. Aborting goes through [`DropSession::abort`].
    pub fn advance(&mut self, next: DropPhase) -> Result<(), DropError> {
        if next == DropPhase::Aborted || !self.phase.can_transition_to(next) {
            return Err(DropError::IllegalTransition { from: self.phase, to: next });
        }
        self.phase = next;
        Ok(())
    }

    /// Ends the session in `Aborted`, keeping the reason.
    ///
    /// # Errors
    /// `DropError::SessionFinished` if the session is already terminal.
    pub fn abort(&mut self, reason: AbortReason) -> Result<(), DropError> {
        if self.phase.is_terminal() {
            return Err(DropError::SessionFinished(self.phase));
        }
        self.phase = DropPhase::Aborted;
        self.abort_reason = Some(reason);
        Ok(())
    }

    pub(crate) fn mark_activated(&mut self, at: DateTime<Utc>) { self.activated_at = Some(at); }
    pub(crate) fn mark_deactivated(&mut self, at: DateTime<Utc>) { self.deactivated_at = Some(at); }
}

/// Terminal outcome handed back to the caller.
#[derive(Debug, Display, Clone)]
pub enum DropStatus {
    Complete,
    Aborted(AbortReason),
}

/// Outcome of a session with the last values the trigger was evaluated on.
#[derive(Debug, Clone)]
pub struct DropReport {
    pub status: DropStatus,
    pub payload: String,
    pub target: Waypoint,
    /// Number of telemetry samples the trigger was evaluated on.
    pub polls: u32,
    pub last_distance_m: Option<f64>,
    pub last_lead_distance_m: Option<f64>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Whether a deactivate command was acknowledged before the session ended.
    pub relay_released: bool,
}

impl DropReport {
    pub fn is_complete(&self) -> bool { matches!(self.status, DropStatus::Complete) }
}

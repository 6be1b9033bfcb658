use chrono::TimeDelta;
use rand::Rng;
use std::time::Duration;

/// Timing bounds for everything that waits on the vehicle link.
#[derive(Debug, Clone, Copy)]
pub struct LinkSettings {
    /// Upper bound for a single HTTP request to the bridge.
    pub request_timeout: Duration,
    /// How long `connect` waits for a live heartbeat.
    pub heartbeat_timeout: Duration,
    /// How long a telemetry read waits for a fresh report.
    pub read_timeout: Duration,
    /// Reports older than this are considered stale.
    pub max_sample_age: TimeDelta,
    /// How long a relay command waits for the vehicle's acknowledgement.
    pub command_timeout: Duration,
    /// Pause between two bridge reads while waiting for fresh data.
    pub refresh_interval: Duration,
}

impl LinkSettings {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
    const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);
    const READ_TIMEOUT: Duration = Duration::from_secs(2);
    const MAX_SAMPLE_AGE: TimeDelta = TimeDelta::seconds(2);
    const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);
    const REFRESH_INTERVAL: Duration = Duration::from_millis(50);
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            request_timeout: Self::REQUEST_TIMEOUT,
            heartbeat_timeout: Self::HEARTBEAT_TIMEOUT,
            read_timeout: Self::READ_TIMEOUT,
            max_sample_age: Self::MAX_SAMPLE_AGE,
            command_timeout: Self::COMMAND_TIMEOUT,
            refresh_interval: Self::REFRESH_INTERVAL,
        }
    }
}

/// Parameters of one drop session.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseSettings {
    /// Relay addressed by the activate/deactivate commands.
    pub relay_index: u8,
    /// Delay between two trigger evaluations.
    pub poll_interval: Duration,
    /// How long the relay stays asserted.
    pub hold_duration: Duration,
    /// Consecutive telemetry failures tolerated before the session aborts.
    pub max_telemetry_retries: u32,
    /// Backoff after the first telemetry failure, doubled for each further one.
    pub telemetry_backoff: Duration,
}

impl ReleaseSettings {
    const POLL_INTERVAL: Duration = Duration::from_millis(500);
    const HOLD_DURATION: Duration = Duration::from_secs(1);
    const MAX_TELEMETRY_RETRIES: u32 = 3;
    const TELEMETRY_BACKOFF: Duration = Duration::from_millis(250);
    const MAX_BACKOFF_SHIFT: u32 = 5;
    const JITTER: f64 = 0.2;

    pub fn with_relay(relay_index: u8) -> Self { Self { relay_index, ..Self::default() } }

    /// Backoff before the next read after the `failures`-th consecutive failure,
    /// including up to 20 % random jitter.
    pub fn backoff(&self, failures: u32) -> Duration {
        let shift = failures.saturating_sub(1).min(Self::MAX_BACKOFF_SHIFT);
        let base = self.telemetry_backoff * (1 << shift);
        let jitter = rand::rng().random_range(0.0..=Self::JITTER);
        base.mul_f64(1.0 + jitter)
    }
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            relay_index: 0,
            poll_interval: Self::POLL_INTERVAL,
            hold_duration: Self::HOLD_DURATION,
            max_telemetry_retries: Self::MAX_TELEMETRY_RETRIES,
            telemetry_backoff: Self::TELEMETRY_BACKOFF,
        }
    }
}

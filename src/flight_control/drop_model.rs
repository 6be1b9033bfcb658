use strum_macros::Display;

/// Standard gravity in m/s².
pub const GRAVITY: f64 = 9.81;

/// Rejected inputs to the drop model. Carries the offending value.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum InvalidInputError {
    NegativeAltitude(f64),
    NegativeGroundspeed(f64),
    NotFinite,
}

impl std::error::Error for InvalidInputError {}

/// Time in seconds a payload released at `altitude_m` needs to reach the ground
/// in free fall (no drag).
///
/// # Errors
/// `InvalidInputError` for a negative or non-finite altitude.
pub fn fall_time(altitude_m: f64) -> Result<f64, InvalidInputError> {
    if !altitude_m.is_finite() {
        return Err(InvalidInputError::NotFinite);
    }
    if altitude_m < 0.0 {
        return Err(InvalidInputError::NegativeAltitude(altitude_m));
    }
    Ok((2.0 * altitude_m / GRAVITY).sqrt())
}

/// Horizontal distance the vehicle covers while the payload falls, i.e. the range
/// to the target at which the release has to happen.
///
/// `lead_distance(0, v) == 0` for every valid `v`, so a vehicle at ground level
/// triggers immediately once over the target.
///
/// # Errors
/// `InvalidInputError` for negative or non-finite altitude or groundspeed.
pub fn lead_distance(altitude_m: f64, groundspeed_mps: f64) -> Result<f64, InvalidInputError> {
    if !groundspeed_mps.is_finite() {
        return Err(InvalidInputError::NotFinite);
    }
    if groundspeed_mps < 0.0 {
        return Err(InvalidInputError::NegativeGroundspeed(groundspeed_mps));
    }
    Ok(groundspeed_mps * fall_time(altitude_m)?)
}

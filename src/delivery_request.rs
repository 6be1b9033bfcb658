use crate::flight_control::{VehicleEndpoint, Waypoint};
use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};
use strum_macros::Display;

/// `"lat,lon,alt"` with optional whitespace around the separators.
static WAYPOINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?\d+(?:\.\d+)?)\s*,\s*([-+]?\d+(?:\.\d+)?)\s*,\s*([-+]?\d+(?:\.\d+)?)\s*$")
        .unwrap()
});

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum RequestConfigError {
    /// The target is not of the form `lat,lon,alt`.
    MalformedWaypoint(String),
    /// Latitude or longitude outside the valid range.
    WaypointOutOfRange(String),
    /// The vehicle name is not part of the fleet list.
    UnknownVehicle(String),
    /// A fleet entry is not of the form `name=url`.
    MalformedFleet(String),
    /// A numeric setting could not be parsed. Carries the variable name.
    InvalidNumber(&'static str),
}

impl std::error::Error for RequestConfigError {}

/// What the operator asked for: which vehicle, which target, which payload.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    vehicle: VehicleEndpoint,
    target: Option<Waypoint>,
    payload: String,
    relay_index: u8,
}

impl DeliveryRequest {
    const DEFAULT_PAYLOAD: &'static str = "Payload";

    pub fn vehicle(&self) -> &VehicleEndpoint { &self.vehicle }
    pub fn target(&self) -> Option<Waypoint> { self.target }
    pub fn payload(&self) -> &str { self.payload.as_str() }
    pub fn relay_index(&self) -> u8 { self.relay_index }

    /// Reads the request from the process environment.
    ///
    /// # Errors
    /// See [`DeliveryRequest::from_lookup`].
    pub fn from_env() -> Result<Self, RequestConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the request from a key lookup.
    ///
    /// Recognised keys: `DROP_VEHICLE_URL`, `DROP_VEHICLE`, `DROP_FLEET`,
    /// `DROP_TARGET`, `DROP_PAYLOAD`, `DROP_RELAY`, `DROP_SYSID`, `DROP_COMPID`.
    ///
    /// # Errors
    /// A `RequestConfigError` for malformed or unknown values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RequestConfigError>
    where F: Fn(&str) -> Option<String> {
        let mut vehicle = match lookup("DROP_VEHICLE") {
            Some(name) => {
                let fleet_list = lookup("DROP_FLEET").unwrap_or_default();
                let fleet = parse_fleet(&fleet_list)?;
                let url = fleet
                    .get(name.as_str())
                    .ok_or_else(|| RequestConfigError::UnknownVehicle(name.clone()))?;
                VehicleEndpoint { name: Some(name), ..VehicleEndpoint::new(url) }
            }
            None => VehicleEndpoint::new(
                lookup("DROP_VEHICLE_URL").as_deref().unwrap_or(VehicleEndpoint::DEFAULT_URL),
            ),
        };
        if let Some(id) = parse_number(&lookup, "DROP_SYSID")? {
            vehicle.system_id = id;
        }
        if let Some(id) = parse_number(&lookup, "DROP_COMPID")? {
            vehicle.component_id = id;
        }
        let target = lookup("DROP_TARGET").map(|t| parse_waypoint(&t)).transpose()?;
        Ok(Self {
            vehicle,
            target,
            payload: lookup("DROP_PAYLOAD").unwrap_or_else(|| String::from(Self::DEFAULT_PAYLOAD)),
            relay_index: parse_number(&lookup, "DROP_RELAY")?.unwrap_or(0),
        })
    }
}

/// Parses `"lat,lon,alt"` (degrees, degrees, metres), e.g. `"51.5074,-0.1278,100"`.
///
/// # Errors
/// `MalformedWaypoint` if the text does not match, `WaypointOutOfRange` for
/// latitudes outside ±90° or longitudes outside ±180°.
pub fn parse_waypoint(input: &str) -> Result<Waypoint, RequestConfigError> {
    let malformed = || RequestConfigError::MalformedWaypoint(String::from(input));
    let captures = WAYPOINT_REGEX.captures(input).ok_or_else(malformed)?;
    let mut values = [0.0_f64; 3];
    for (i, value) in values.iter_mut().enumerate() {
        *value = captures[i + 1].parse().map_err(|_| malformed())?;
    }
    let [lat, lon, alt] = values;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(RequestConfigError::WaypointOutOfRange(String::from(input)));
    }
    Ok(Waypoint::new(lat, lon, alt))
}

/// Parses `"Plane Alpha=http://10.0.0.10:8088/v1;Plane Beta=..."` into name → URL.
fn parse_fleet(input: &str) -> Result<HashMap<&str, &str>, RequestConfigError> {
    input
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(name, url)| (name.trim(), url.trim()))
                .filter(|(name, url)| !name.is_empty() && !url.is_empty())
                .ok_or_else(|| RequestConfigError::MalformedFleet(String::from(entry)))
        })
        .collect()
}

fn parse_number<F>(lookup: &F, key: &'static str) -> Result<Option<u8>, RequestConfigError>
where F: Fn(&str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().parse::<u8>().map_err(|_| RequestConfigError::InvalidNumber(key)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_waypoint() {
        let wp = parse_waypoint("51.5074,-0.1278,100").unwrap();
        assert!((wp.latitude_deg() - 51.5074).abs() < 1e-9);
        assert!((wp.longitude_deg() + 0.1278).abs() < 1e-9);
        assert!((wp.altitude_m() - 100.0).abs() < 1e-9);

        let spaced = parse_waypoint(" 10 , 20.5 ,0 ").unwrap();
        assert!((spaced.longitude_deg() - 20.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_waypoint_rejects_bad_input() {
        assert!(matches!(parse_waypoint("51.5,-0.1"), Err(RequestConfigError::MalformedWaypoint(_))));
        assert!(matches!(parse_waypoint("a,b,c"), Err(RequestConfigError::MalformedWaypoint(_))));
        assert!(matches!(parse_waypoint("91,0,10"), Err(RequestConfigError::WaypointOutOfRange(_))));
        assert!(matches!(parse_waypoint("0,-180.5,10"), Err(RequestConfigError::WaypointOutOfRange(_))));
    }

    #[test]
    fn test_request_defaults() {
        let req = DeliveryRequest::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(req.vehicle().url, VehicleEndpoint::DEFAULT_URL);
        assert_eq!((req.vehicle().system_id, req.vehicle().component_id), (1, 1));
        assert_eq!(req.payload(), "Payload");
        assert_eq!(req.relay_index(), 0);
        assert!(req.target().is_none());
    }

    #[test]
    fn test_request_from_fleet() {
        let req = DeliveryRequest::from_lookup(lookup_from(&[
            ("DROP_FLEET", "Plane Alpha=http://192.168.1.10:8088/v1; Plane Beta=http://192.168.1.11:8088/v1"),
            ("DROP_VEHICLE", "Plane Beta"),
            ("DROP_TARGET", "51.5074,-0.1278,100"),
            ("DROP_PAYLOAD", "Paracetamol"),
            ("DROP_RELAY", "2"),
            ("DROP_SYSID", "3"),
        ]))
        .unwrap();
        assert_eq!(req.vehicle().url, "http://192.168.1.11:8088/v1");
        assert_eq!(req.vehicle().display_name(), "Plane Beta");
        assert_eq!(req.vehicle().system_id, 3);
        assert_eq!(req.payload(), "Paracetamol");
        assert_eq!(req.relay_index(), 2);
        assert!(req.target().is_some());
    }

    #[test]
    fn test_request_errors() {
        let unknown = DeliveryRequest::from_lookup(lookup_from(&[
            ("DROP_FLEET", "Plane Alpha=http://192.168.1.10:8088/v1"),
            ("DROP_VEHICLE", "Plane Gamma"),
        ]));
        assert_eq!(unknown.unwrap_err(), RequestConfigError::UnknownVehicle("Plane Gamma".into()));

        let fleet = DeliveryRequest::from_lookup(lookup_from(&[
            ("DROP_FLEET", "Plane Alpha"),
            ("DROP_VEHICLE", "Plane Alpha"),
        ]));
        assert!(matches!(fleet, Err(RequestConfigError::MalformedFleet(_))));

        let relay = DeliveryRequest::from_lookup(lookup_from(&[("DROP_RELAY", "-1")]));
        assert_eq!(relay.unwrap_err(), RequestConfigError::InvalidNumber("DROP_RELAY"));
    }
}

mod actuator;
mod drop_model;
mod drop_phase;
mod drop_session;
mod geo;
mod release_controller;
mod settings;
mod telemetry;
mod vehicle_link;

#[cfg(test)]
mod bridge_tests;

pub use actuator::ActuatorGateway;
pub use geo::Waypoint;
pub use release_controller::ReleaseController;
pub use settings::{LinkSettings, ReleaseSettings};
pub use telemetry::{TelemetryClient, TelemetrySource};
pub use vehicle_link::{ConnectionError, VehicleEndpoint, VehicleLink};

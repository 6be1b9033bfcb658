use crate::delivery_request::DeliveryRequest;
use crate::flight_control::{
    ActuatorGateway, ConnectionError, LinkSettings, TelemetryClient, VehicleLink,
};
use std::sync::Arc;

/// Struct holding the components bound to one vehicle connection: the owned
/// link and the two subsystems that talk over it.
pub struct Keychain {
    /// The connection, shared only between telemetry and actuator.
    link: Arc<VehicleLink>,
    /// The telemetry client reading the vehicle's state.
    telemetry: TelemetryClient,
    /// The gateway to the release relay.
    actuator: ActuatorGateway,
}

impl Keychain {
    /// Opens the link to the requested vehicle and waits for its heartbeat.
    ///
    /// # Arguments
    /// - `request`: The delivery request naming vehicle and target.
    /// - `settings`: Timeouts of the link.
    ///
    /// # Errors
    /// A `ConnectionError` if the vehicle does not come alive in time.
    pub async fn connect(
        request: &DeliveryRequest,
        settings: LinkSettings,
    ) -> Result<Self, ConnectionError> {
        let link = Arc::new(VehicleLink::open(request.vehicle().clone(), &settings)?);
        let telemetry =
            match TelemetryClient::connect(Arc::clone(&link), settings, request.target()).await {
                Ok(client) => client,
                Err(e) => {
                    link.close();
                    return Err(e);
                }
            };
        let actuator = ActuatorGateway::new(Arc::clone(&link), settings);
        Ok(Self { link, telemetry, actuator })
    }

    /// Provides both subsystems at once for the duration of a drop session.
    pub fn split(&mut self) -> (&mut TelemetryClient, &mut ActuatorGateway) {
        (&mut self.telemetry, &mut self.actuator)
    }

    pub fn telemetry(&mut self) -> &mut TelemetryClient { &mut self.telemetry }

    /// Tears the connection down. Consumes the keychain so no subsystem outlives it.
    pub fn close(self) { self.link.close(); }
}

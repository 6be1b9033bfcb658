#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod delivery_request;
mod flight_control;
mod http_handler;
mod keychain;
mod logger;

use crate::delivery_request::DeliveryRequest;
use crate::flight_control::{LinkSettings, ReleaseController, ReleaseSettings, TelemetrySource};
use crate::keychain::Keychain;
use tokio_util::sync::CancellationToken;

#[cfg(all(feature = "profiling", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let request = DeliveryRequest::from_env()
        .unwrap_or_else(|e| fatal!("Invalid delivery request: {e:?}"));
    info!(
        "Delivering '{}' with {}.",
        request.payload(),
        request.vehicle().display_name()
    );

    let mut keychain = Keychain::connect(&request, LinkSettings::default())
        .await
        .unwrap_or_else(|e| fatal!("Vehicle did not come alive: {e:?}"));

    let target = match keychain.telemetry().target_waypoint().await {
        Ok(target) => target,
        Err(e) => {
            keychain.close();
            fatal!("No drop target available: {e:?}");
        }
    };

    let c_tok = CancellationToken::new();
    let c_tok_clone = c_tok.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Abort requested by operator!");
            c_tok_clone.cancel();
        }
    });

    let report = {
        let (telemetry, actuator) = keychain.split();
        let mut controller = ReleaseController::new(
            telemetry,
            actuator,
            target,
            request.payload(),
            ReleaseSettings::with_relay(request.relay_index()),
            c_tok,
        );
        let report = controller.run().await;
        log!("Drop session ended in phase {}.", controller.phase());
        report
    };
    keychain.close();

    match report {
        Ok(report) => {
            let fmt_m = |v: Option<f64>| v.map_or_else(|| String::from("-"), |d| format!("{d:.2} m"));
            info!(
                "Result for '{}' at {}: {} after {} polls, last distance {}, last lead distance {}, relay released: {}.",
                report.payload,
                report.target,
                report.status,
                report.polls,
                fmt_m(report.last_distance_m),
                fmt_m(report.last_lead_distance_m),
                report.relay_released
            );
            if let (Some(on), Some(off)) = (report.activated_at, report.deactivated_at) {
                info!("Relay held for {}ms.", (off - on).num_milliseconds());
            }
            if !report.is_complete() {
                error!("Drop aborted: {:?}", report.status);
                std::process::exit(1);
            }
        }
        Err(e) => fatal!("Drop session failed: {e:?}"),
    }
}

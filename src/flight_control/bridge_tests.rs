use super::{
    actuator::{ActuatorError, ActuatorGateway, RelayActuator, RelayCommand},
    settings::LinkSettings,
    telemetry::{TelemetryClient, TelemetryError, TelemetrySource},
    vehicle_link::{ConnectionError, VehicleEndpoint, VehicleLink},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    io::ErrorKind,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// In-process stand-in for the MAVLink REST bridge. Serves the latest instance of
/// each published message and answers relay commands with a configurable ack.
#[derive(Default)]
struct Bridge {
    messages: HashMap<&'static str, (Value, u64, DateTime<Utc>)>,
    /// Result the vehicle acknowledges a posted command with, `None` for silence.
    ack_result: Option<&'static str>,
    commands: Vec<Value>,
}

type SharedBridge = Arc<Mutex<Bridge>>;

impl Bridge {
    fn publish(&mut self, name: &'static str, message: Value, last_update: DateTime<Utc>) {
        let counter = self.messages.get(name).map_or(0, |(_, counter, _)| *counter) + 1;
        self.messages.insert(name, (message, counter, last_update));
    }

    fn respond(&mut self, method: &str, path: &str, body: &[u8]) -> (u16, String) {
        if method == "POST" && path.ends_with("/mavlink") {
            self.commands.push(serde_json::from_slice(body).unwrap_or(Value::Null));
            if let Some(result) = self.ack_result {
                self.publish("COMMAND_ACK", ack(result), Utc::now());
            }
            return (200, String::from("\"Ok\""));
        }
        let name = path.rsplit('/').next().unwrap_or_default();
        match self.messages.get(name) {
            Some((message, counter, last_update)) => {
                let envelope = json!({
                    "message": message,
                    "status": {"time": {
                        "counter": counter,
                        "frequency": 4.0,
                        "first_update": last_update.to_rfc3339(),
                        "last_update": last_update.to_rfc3339(),
                    }}
                });
                (200, envelope.to_string())
            }
            None => (404, String::from("\"Not found\"")),
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<(String, String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Err(ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut request_line = head.split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok((method, path, buf[header_end..].to_vec()))
}

async fn serve(listener: TcpListener, bridge: SharedBridge) {
    while let Ok((mut socket, _)) = listener.accept().await {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move {
            let Ok((method, path, body)) = read_request(&mut socket).await else {
                return;
            };
            let (status, body) = bridge.lock().unwrap().respond(&method, &path, &body);
            let reason = if status == 200 { "OK" } else { "Not Found" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
    }
}

async fn start_bridge() -> (VehicleEndpoint, SharedBridge) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1", listener.local_addr().unwrap());
    let bridge: SharedBridge = Arc::new(Mutex::new(Bridge::default()));
    tokio::spawn(serve(listener, Arc::clone(&bridge)));
    (VehicleEndpoint::new(&url), bridge)
}

fn fast_settings() -> LinkSettings {
    LinkSettings {
        heartbeat_timeout: Duration::from_millis(400),
        read_timeout: Duration::from_millis(300),
        command_timeout: Duration::from_millis(300),
        refresh_interval: Duration::from_millis(20),
        ..LinkSettings::default()
    }
}

fn heartbeat() -> Value {
    json!({
        "type": "HEARTBEAT",
        "custom_mode": 10,
        "mavtype": {"type": "MAV_TYPE_FIXED_WING"},
        "autopilot": {"type": "MAV_AUTOPILOT_ARDUPILOTMEGA"},
        "system_status": {"type": "MAV_STATE_ACTIVE"},
    })
}

fn position() -> Value {
    json!({
        "type": "GLOBAL_POSITION_INT",
        "time_boot_ms": 90_000,
        "lat": 515_074_000,
        "lon": -1_278_000,
        "alt": 150_000,
        "relative_alt": 50_000,
        "hdg": 9000,
    })
}

fn vfr_hud() -> Value {
    json!({"type": "VFR_HUD", "airspeed": 21.0, "groundspeed": 20.0, "heading": 90, "alt": 150.0, "climb": 0.0})
}

fn ack(result: &str) -> Value {
    json!({
        "type": "COMMAND_ACK",
        "command": {"type": "MAV_CMD_DO_SET_RELAY"},
        "result": {"type": result},
    })
}

async fn connected(bridge: &SharedBridge, endpoint: VehicleEndpoint) -> TelemetryClient {
    bridge.lock().unwrap().publish("HEARTBEAT", heartbeat(), Utc::now());
    let settings = fast_settings();
    let link = Arc::new(VehicleLink::open(endpoint, &settings).unwrap());
    TelemetryClient::connect(link, settings, None).await.unwrap()
}

#[tokio::test]
async fn test_connect_requires_fresh_heartbeat() {
    let (endpoint, bridge) = start_bridge().await;
    let settings = fast_settings();

    let silent = Arc::new(VehicleLink::open(endpoint.clone(), &settings).unwrap());
    let res = TelemetryClient::connect(silent, settings, None).await;
    assert!(matches!(res, Err(ConnectionError::NoHeartbeat(d)) if d == settings.heartbeat_timeout));

    bridge.lock().unwrap().publish("HEARTBEAT", heartbeat(), Utc::now() - TimeDelta::seconds(60));
    let stale = Arc::new(VehicleLink::open(endpoint.clone(), &settings).unwrap());
    let res = TelemetryClient::connect(stale, settings, None).await;
    assert!(matches!(res, Err(ConnectionError::NoHeartbeat(_))));

    bridge.lock().unwrap().publish("HEARTBEAT", heartbeat(), Utc::now());
    let live = Arc::new(VehicleLink::open(endpoint, &settings).unwrap());
    assert!(TelemetryClient::connect(live, settings, None).await.is_ok());
}

#[tokio::test]
async fn test_connect_fails_without_bridge() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1", listener.local_addr().unwrap());
    drop(listener);
    let settings = fast_settings();
    let link = Arc::new(VehicleLink::open(VehicleEndpoint::new(&url), &settings).unwrap());
    assert!(TelemetryClient::connect(link, settings, None).await.is_err());
}

#[tokio::test]
async fn test_position_read() {
    let (endpoint, bridge) = start_bridge().await;
    let mut client = connected(&bridge, endpoint).await;
    bridge.lock().unwrap().publish("GLOBAL_POSITION_INT", position(), Utc::now());
    bridge.lock().unwrap().publish("VFR_HUD", vfr_hud(), Utc::now());

    let report = client.latest_position_and_altitude().await.unwrap();
    assert!((report.latitude_deg - 51.5074).abs() < 1e-9);
    assert!((report.longitude_deg + 0.1278).abs() < 1e-9);
    assert!((report.altitude_m - 50.0).abs() < 1e-9);
    assert!((client.latest_groundspeed().await.unwrap() - 20.0).abs() < 1e-6);

    let sample = client.poll_sample().await.unwrap();
    assert!((sample.altitude_m() - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_stale_position_is_rejected() {
    let (endpoint, bridge) = start_bridge().await;
    let mut client = connected(&bridge, endpoint).await;
    bridge.lock().unwrap().publish("GLOBAL_POSITION_INT", position(), Utc::now() - TimeDelta::seconds(60));

    match client.latest_position_and_altitude().await {
        Err(TelemetryError::Stale(Some(age))) => assert!(age >= TimeDelta::seconds(59), "age {age}"),
        other => panic!("unexpected read {other:?}"),
    }

    let missing = client.latest_groundspeed().await;
    assert!(matches!(missing, Err(TelemetryError::Stale(None))));
}

#[tokio::test]
async fn test_target_from_mission_item() {
    let (endpoint, bridge) = start_bridge().await;
    let mut client = connected(&bridge, endpoint).await;
    assert!(matches!(client.target_waypoint().await, Err(TelemetryError::NoTarget)));

    let item = json!({
        "type": "MISSION_ITEM_INT",
        "seq": 2,
        "command": {"type": "MAV_CMD_NAV_WAYPOINT"},
        "x": 515_074_000,
        "y": -1_278_000,
        "z": 100.0,
    });
    bridge.lock().unwrap().publish("MISSION_ITEM_INT", item, Utc::now());
    let target = client.target_waypoint().await.unwrap();
    assert!((target.latitude_deg() - 51.5074).abs() < 1e-9);
    assert!((target.altitude_m() - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_gateway_acknowledgements() {
    let (endpoint, bridge) = start_bridge().await;
    let settings = fast_settings();
    let link = Arc::new(VehicleLink::open(endpoint, &settings).unwrap());
    let mut gateway = ActuatorGateway::new(Arc::clone(&link), settings);

    bridge.lock().unwrap().ack_result = Some("MAV_RESULT_DENIED");
    let denied = gateway.send(RelayCommand::activate(1)).await;
    assert_eq!(denied, Err(ActuatorError::Rejected(String::from("MAV_RESULT_DENIED"))));

    bridge.lock().unwrap().ack_result = Some("MAV_RESULT_ACCEPTED");
    let ack = gateway.send(RelayCommand::activate(1)).await.unwrap();
    assert_eq!(ack.command, RelayCommand::activate(1));

    // the earlier acceptance must not be mistaken for an answer to this command
    bridge.lock().unwrap().ack_result = None;
    let silent = gateway.send(RelayCommand::deactivate(1)).await;
    assert!(matches!(silent, Err(ActuatorError::Unreachable(_))));

    let commands = bridge.lock().unwrap().commands.clone();
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[2]["message"]["command"]["type"], "MAV_CMD_DO_SET_RELAY");
    assert_eq!(commands[2]["message"]["param1"], 1.0);
    assert_eq!(commands[2]["message"]["param2"], 0.0);
    assert_eq!(commands[1]["header"]["sequence"], 1);
}

#[tokio::test]
async fn test_gateway_on_closed_link() {
    let (endpoint, bridge) = start_bridge().await;
    bridge.lock().unwrap().ack_result = Some("MAV_RESULT_ACCEPTED");
    let settings = fast_settings();
    let link = Arc::new(VehicleLink::open(endpoint, &settings).unwrap());
    let mut gateway = ActuatorGateway::new(Arc::clone(&link), settings);

    link.close();
    assert!(link.is_closed());
    let res = gateway.send(RelayCommand::deactivate(0)).await;
    assert_eq!(res, Err(ActuatorError::Unreachable(String::from("Closed"))));
    assert!(bridge.lock().unwrap().commands.is_empty());
}

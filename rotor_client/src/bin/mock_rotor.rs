use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rotor_protocol::{Favorite, Identifier, LockMsg, Rotation};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:0";
const BROADCAST_PERIOD: Duration = Duration::from_millis(200);

/// Controller state the mock simulates. One instance shared across
/// connections, like the single motor behind the real thing.
struct MockRotor {
    rotation: Rotation,
    angle: f64,
    speed: u8,
    target: Option<f64>,
    favorites_json: String,
    lock_json: String,
}

impl MockRotor {
    fn new() -> Self {
        Self {
            rotation: Rotation::Stop,
            angle: 0.0,
            speed: 60,
            target: None,
            favorites_json: "[]".to_string(),
            lock_json: serde_json::to_string(&LockMsg::default()).unwrap(),
        }
    }

    /// Advance the simulated motor by one broadcast period.
    fn tick(&mut self) {
        let step = f64::from(self.speed) * 0.05;
        if let Some(target) = self.target {
            if (target - self.angle).abs() <= step {
                self.angle = target;
                self.target = None;
                self.rotation = Rotation::Stop;
            } else {
                self.rotation = if target > self.angle { Rotation::Cw } else { Rotation::Ccw };
                self.angle += if target > self.angle { step } else { -step };
            }
        } else {
            match self.rotation {
                Rotation::Cw => self.angle += step,
                Rotation::Ccw => self.angle -= step,
                Rotation::Stop => {}
            }
        }
    }

    fn rotor_frame(&self) -> String {
        let payload = json!({
            "rotation": i8::from(self.rotation),
            "angle": self.angle,
            "adc_v": 1.2 + self.angle / 1000.0,
            "speed": self.speed,
            "target": self.target,
        });
        rotor_protocol::encode_raw(Identifier::Rotor, &payload.to_string())
    }

    /// Apply one inbound command frame, answering the way the firmware
    /// does: rotor fields fold into state, LOCK and FAVORITES are kept
    /// verbatim for relaying.
    fn apply(&mut self, raw: &str) {
        let Ok((tag, payload)) = rotor_protocol::split(raw) else {
            warn!(raw, "malformed frame from client");
            return;
        };
        match Identifier::from_tag(tag) {
            Some(Identifier::Rotor) => {
                let Ok(fields) = serde_json::from_str::<Value>(payload) else {
                    warn!(payload, "bad ROTOR payload");
                    return;
                };
                if let Some(r) = fields.get("rotation").and_then(Value::as_i64) {
                    if let Ok(rotation) = Rotation::try_from(r as i8) {
                        self.rotation = rotation;
                        if rotation == Rotation::Stop {
                            self.target = None;
                        }
                    }
                }
                if let Some(s) = fields.get("speed").and_then(Value::as_u64) {
                    self.speed = s.min(100) as u8;
                }
                if let Some(t) = fields.get("target").and_then(Value::as_f64) {
                    self.target = Some(t);
                }
            }
            Some(Identifier::Favorites) => {
                if serde_json::from_str::<Vec<Favorite>>(payload).is_ok() {
                    self.favorites_json = payload.to_string();
                } else {
                    warn!(payload, "bad FAVORITES payload");
                }
            }
            Some(Identifier::Lock) => {
                // The controller never inspects the lock, it only relays.
                self.lock_json = payload.to_string();
            }
            Some(Identifier::Calibration) | Some(Identifier::Settings) => {
                info!(tag, payload, "accepted");
            }
            Some(Identifier::Ui) | None => warn!(tag, "unhandled identifier"),
        }
    }

    fn snapshots(&self) -> Vec<String> {
        let settings = json!({
            "version": "2.4.1-mock",
            "espID": "mock-0001",
            "ssid": "mocknet",
            "rssi": "-48",
            "hasScreen": true,
            "useScreen": true,
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
        });
        let calibration = json!({ "a1": 0.0, "u1": 0.35, "a2": 450.0, "u2": 3.1, "offset": 0.0 });
        vec![
            rotor_protocol::encode_raw(Identifier::Settings, &settings.to_string()),
            rotor_protocol::encode_raw(Identifier::Calibration, &calibration.to_string()),
            rotor_protocol::encode_raw(Identifier::Favorites, &self.favorites_json),
            rotor_protocol::encode_raw(Identifier::Lock, &self.lock_json),
        ]
    }
}

async fn handle_client(stream: TcpStream, state: Arc<Mutex<MockRotor>>) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "handshake failed");
            return;
        }
    };
    let (mut write, mut read) = socket.split();

    let snapshots = state.lock().map(|s| s.snapshots()).unwrap_or_default();
    for frame in snapshots {
        if write.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }

    let mut broadcast = tokio::time::interval(BROADCAST_PERIOD);
    loop {
        tokio::select! {
            _ = broadcast.tick() => {
                let frame = {
                    let Ok(mut rotor) = state.lock() else { return };
                    rotor.tick();
                    rotor.rotor_frame()
                };
                if write.send(Message::Text(frame.into())).await.is_err() {
                    return;
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let relay = {
                            let Ok(mut rotor) = state.lock() else { return };
                            rotor.apply(&text);
                            match rotor_protocol::split(&text).ok().and_then(|(t, _)| {
                                Identifier::from_tag(t)
                            }) {
                                Some(Identifier::Lock) => Some(rotor_protocol::encode_raw(
                                    Identifier::Lock,
                                    &rotor.lock_json,
                                )),
                                Some(Identifier::Favorites) => Some(rotor_protocol::encode_raw(
                                    Identifier::Favorites,
                                    &rotor.favorites_json,
                                )),
                                _ => None,
                            }
                        };
                        if let Some(frame) = relay {
                            if write.send(Message::Text(frame.into())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "socket error");
                        return;
                    }
                }
            }
        }
    }
}

fn parse_arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let addr = parse_arg_value(&args, "--addr")
        .or_else(|| std::env::var("ROTOR_WS_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    match listener.local_addr() {
        Ok(local) => println!("mock_rotor listening on ws://{local}"),
        Err(e) => warn!(error = %e, "local_addr unavailable"),
    }

    let state = Arc::new(Mutex::new(MockRotor::new()));
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "client connected");
                tokio::spawn(handle_client(stream, state.clone()));
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}

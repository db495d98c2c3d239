//! WebSocket client session management.
//!
//! Connects, joins the room, then runs three loops: a read task applying
//! server events to the [`RoomTracker`], a write task translating terminal
//! commands into client events, and a blocking rustyline thread feeding the
//! write task. Own GPS fixes run through the local movement watch, so an
//! auto-SOS goes out when the user stands still past the limit.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::common::time::{timestamp_to_rfc3339, unix_timestamp_millis};
use crate::domain::{Coordinates, CoreConfig};
use crate::infrastructure::dto::websocket::{
    ClientEvent, MessageBody, MessageKind, ServerEvent,
};

use super::error::ClientError;
use super::formatter::MessageFormatter;
use super::tracker::{RoomTracker, TrackerNotice};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Redisplay the prompt after output interrupted it
fn redisplay_prompt(username: &str) {
    print!("{}> ", username);
    std::io::stdout().flush().ok();
}

/// Run the client with reconnection logic
pub async fn run_client(
    url: String,
    room_code: String,
    username: String,
    user_id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            url,
            username,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url, &room_code, &username, &user_id).await {
            Ok(_) => {
                tracing::info!("Client session ended normally");
                break;
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    std::process::exit(1);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }

    Ok(())
}

/// Run one WebSocket client session until quit or connection loss
pub async fn run_client_session(
    url: &str,
    room_code: &str,
    username: &str,
    user_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| Box::new(ClientError::ConnectionError(e.to_string())))?;

    tracing::info!("Connected to coordination server!");
    println!(
        "\nYou are '{}' in room '{}'. Commands: loc <lat> <lng> | say <text> | sos | batt <pct> [charging] | fence <radius> | leave | quit\n",
        username, room_code
    );

    let (mut write, mut read) = ws_stream.split();

    // Join immediately; on reconnect this also restores room membership
    let join = ClientEvent::JoinRoom {
        room_code: room_code.to_string(),
        username: username.to_string(),
        user_id: user_id.to_string(),
    };
    write
        .send(Message::Text(serde_json::to_string(&join)?.into()))
        .await
        .map_err(|e| Box::new(ClientError::ConnectionError(e.to_string())))?;

    let tracker = Arc::new(Mutex::new(RoomTracker::new(
        CoreConfig::default(),
        unix_timestamp_millis(),
    )));

    // Read task: apply server events to the tracker and display notices
    let tracker_for_read = tracker.clone();
    let username_for_read = username.to_string();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let event = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => event,
                        Err(_) => {
                            print!("{}", MessageFormatter::format_raw_message(&text));
                            redisplay_prompt(&username_for_read);
                            continue;
                        }
                    };
                    let notice = {
                        let mut tracker = tracker_for_read.lock().await;
                        tracker.apply(&event, unix_timestamp_millis())
                    };
                    if let Some(formatted) = format_notice(notice, &username_for_read) {
                        print!("{}", formatted);
                        redisplay_prompt(&username_for_read);
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Blocking thread for rustyline (synchronous readline)
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_username = username.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_username);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Write task: translate commands into client events
    let tracker_for_write = tracker.clone();
    let room_for_write = room_code.to_string();
    let username_for_write = username.to_string();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let outgoing = match build_events(
                &line,
                &room_for_write,
                &username_for_write,
                &tracker_for_write,
            )
            .await
            {
                Command::Events(events) => events,
                Command::Quit => break,
                Command::Nothing => continue,
            };

            for event in outgoing {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::warn!("Failed to send event: {}", e);
                    write_error = true;
                    break;
                }
            }
            if write_error {
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}

enum Command {
    Events(Vec<ClientEvent>),
    Quit,
    Nothing,
}

fn sos_body(username: &str) -> MessageBody {
    MessageBody {
        kind: MessageKind::Sos,
        content: format!("SOS Alert from {}", username),
        sender: username.to_string(),
        timestamp: timestamp_to_rfc3339(unix_timestamp_millis()),
    }
}

/// Parse one terminal command into outgoing events
async fn build_events(
    line: &str,
    room_code: &str,
    username: &str,
    tracker: &Arc<Mutex<RoomTracker>>,
) -> Command {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");

    match command {
        "loc" => {
            let (Some(lat), Some(lng)) = (
                parts.next().and_then(|v| v.parse::<f64>().ok()),
                parts.next().and_then(|v| v.parse::<f64>().ok()),
            ) else {
                println!("usage: loc <lat> <lng>");
                return Command::Nothing;
            };
            let coords = Coordinates::new(lat, lng);
            let mut events = vec![ClientEvent::LocationUpdate {
                room_code: room_code.to_string(),
                coords,
            }];

            // Local movement watch and geofence run on own fixes
            let outcome = {
                let mut tracker = tracker.lock().await;
                tracker.record_own_fix(coords, unix_timestamp_millis())
            };
            if let Some(transition) = outcome.fence_transition {
                print!("{}", MessageFormatter::format_fence_transition(transition));
            }
            if outcome.stationary_alert.is_some() {
                print!("{}", MessageFormatter::format_auto_sos());
                events.push(ClientEvent::ChatMessage {
                    room_code: room_code.to_string(),
                    message: sos_body(username),
                });
            }
            Command::Events(events)
        }
        "say" => {
            let text = line.strip_prefix("say").unwrap_or("").trim();
            if text.is_empty() {
                println!("usage: say <text>");
                return Command::Nothing;
            }
            Command::Events(vec![ClientEvent::ChatMessage {
                room_code: room_code.to_string(),
                message: MessageBody {
                    kind: MessageKind::Chat,
                    content: text.to_string(),
                    sender: username.to_string(),
                    timestamp: timestamp_to_rfc3339(unix_timestamp_millis()),
                },
            }])
        }
        "sos" => Command::Events(vec![ClientEvent::ChatMessage {
            room_code: room_code.to_string(),
            message: sos_body(username),
        }]),
        "batt" => {
            let Some(percent) = parts.next().and_then(|v| v.parse::<f64>().ok()) else {
                println!("usage: batt <pct> [charging]");
                return Command::Nothing;
            };
            let charging = parts.next() == Some("charging");
            Command::Events(vec![ClientEvent::BatteryStatus {
                room_code: room_code.to_string(),
                level: percent / 100.0,
                charging,
            }])
        }
        "fence" => {
            let Some(radius) = parts.next().and_then(|v| v.parse::<f64>().ok()) else {
                println!("usage: fence <radius>");
                return Command::Nothing;
            };
            let mut tracker = tracker.lock().await;
            match tracker.fence() {
                Some(fence) => {
                    tracker.reset_fence(fence.center, radius);
                    println!("geofence radius set to {} m", radius);
                }
                None => println!("no geofence yet; send a location first"),
            }
            Command::Nothing
        }
        "leave" => Command::Events(vec![ClientEvent::LeaveRoom {
            room_code: room_code.to_string(),
        }]),
        "quit" => Command::Quit,
        _ => {
            println!("unknown command '{}'", command);
            Command::Nothing
        }
    }
}

fn format_notice(notice: Option<TrackerNotice>, current_username: &str) -> Option<String> {
    match notice? {
        TrackerNotice::Roster(usernames) => {
            Some(MessageFormatter::format_roster(&usernames, current_username))
        }
        TrackerNotice::PeerJoined { username } => {
            Some(MessageFormatter::format_peer_joined(&username))
        }
        TrackerNotice::PeerLeft { username } => {
            Some(MessageFormatter::format_peer_left(&username))
        }
        TrackerNotice::PeerMoved { username, marker } => {
            MessageFormatter::format_peer_moved(&username, marker)
        }
        TrackerNotice::Anomaly {
            username,
            distance,
            play_sound,
        } => Some(MessageFormatter::format_anomaly(
            &username, distance, play_sound,
        )),
        TrackerNotice::Message { body } => Some(MessageFormatter::format_message(&body)),
        TrackerNotice::Battery {
            username,
            level,
            charging,
        } => Some(MessageFormatter::format_battery(&username, level, charging)),
    }
}

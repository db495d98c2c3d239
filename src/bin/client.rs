//! Terminal client for the coordination server.
//!
//! Joins a room, reports GPS fixes typed at the prompt, and displays what
//! the rest of the group is doing. Automatically reconnects on disconnection
//! (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin client -- --room ABC123 --username Alice
//! cargo run --bin client -- -r ABC123 -n Bob -i bob-phone
//! ```

use clap::Parser;
use uuid::Uuid;

use convoy_rs::common::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Terminal client for the group coordination server", long_about = None)]
struct Args {
    /// Room code to join
    #[arg(short = 'r', long)]
    room: String,

    /// Display name in the room
    #[arg(short = 'n', long)]
    username: String,

    /// Stable user id; a fresh one is generated when omitted
    #[arg(short = 'i', long)]
    user_id: Option<String>,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let user_id = args.user_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Err(e) =
        convoy_rs::client::run_client(args.url, args.room, args.username, user_id).await
    {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

//! Terminal SyncPlay client.
//!
//! # Usage
//!
//! ```bash
//! sinkplay --server syncplay.pl --nick alice --room movie-night
//! SINKPLAY_PASSWORD=secret sinkplay --server 10.0.0.5 --port 8995 --nick bob --room lan
//! ```
//!
//! Lines typed on stdin are sent as chat, except for:
//!
//! - `/ready`: toggle readiness
//! - `/file <name> [seconds]`: announce a loaded file
//! - `/pos <seconds>`: record the local playback position
//! - `/users`: print the room snapshot as JSON
//! - `/quit`: disconnect and exit

use clap::Parser;
use sinkplay::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Headless SyncPlay client
#[derive(Parser, Debug)]
#[command(name = "sinkplay")]
#[command(about = "Join a SyncPlay room from the terminal")]
#[command(version)]
struct Args {
    /// Server host name or IP address
    #[arg(short, long)]
    server: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Nickname to request
    #[arg(short, long)]
    nick: String,

    /// Room to join
    #[arg(short, long)]
    room: String,

    /// Server password, if the server has one
    #[arg(long, env = "SINKPLAY_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = SessionConfig::new(args.server, args.nick, args.room)
        .with_port(args.port)
        .with_password(args.password);

    let mut client = SyncplayClient::builder(config)
        .reporter(TracingReporter)
        .connect()
        .await?;
    let mut events = client
        .take_events()
        .ok_or("event stream already taken")?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Session(event)) => print_event(&event),
                Some(ClientEvent::Disconnected) | None => break,
            },

            line = stdin.next_line() => match line? {
                Some(line) => {
                    if !run_command(&client, line.trim())? {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    client.disconnect().await;
    Ok(())
}

/// Executes one line of input. Returns `false` when the user asked to quit.
fn run_command(
    client: &SyncplayClient,
    line: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "" => {}
        "/quit" => return Ok(false),
        "/ready" => client.toggle_ready()?,
        "/users" => {
            println!("{}", serde_json::to_string_pretty(&*client.snapshot())?);
        }
        "/pos" => match rest.trim().parse::<f64>() {
            Ok(seconds) => client.report_position(seconds)?,
            Err(_) => eprintln!("usage: /pos <seconds>"),
        },
        "/file" => {
            let (name, duration) = match rest.trim().rsplit_once(' ') {
                Some((name, secs)) => match secs.parse::<f64>() {
                    Ok(secs) => (name, Some(secs)),
                    Err(_) => (rest.trim(), None),
                },
                None => (rest.trim(), None),
            };
            if name.is_empty() {
                eprintln!("usage: /file <name> [seconds]");
            } else {
                client.load_file(MediaInfo::new(name, duration, None))?;
            }
        }
        _ => client.send_chat(line)?,
    }
    Ok(true)
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Welcome(info) => {
            println!("* joined {} as {} (server {})", info.room, info.username, info.realversion);
            if !info.motd.is_empty() {
                println!("* {}", info.motd);
            }
        }
        SessionEvent::UserJoined { name, room } => {
            println!("* {name} joined {}", room.as_deref().unwrap_or("?"));
        }
        SessionEvent::UserLeft { name } => println!("* {name} left"),
        SessionEvent::UserMoved { name, room } => {
            println!("* {name} moved to {}", room.as_deref().unwrap_or("?"));
        }
        SessionEvent::FileChanged { name, file: Some(file) } => {
            println!("* {name} is playing {}", file.name);
        }
        SessionEvent::ReadyChanged { name, ready, .. } => {
            let word = if *ready { "ready" } else { "not ready" };
            println!("* {name} is {word}");
        }
        SessionEvent::Chat(entry) => {
            println!("[{}] <{}> {}", entry.timestamp.format("%H:%M:%S"), entry.username, entry.message);
        }
        SessionEvent::ServerError(message) => println!("! {message}"),
        other => tracing::debug!(event = ?other, "room event"),
    }
}

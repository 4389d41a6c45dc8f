//! pm-cli — a terminal embedder for the palisade secure messaging core.
//!
//! Wires a `WsRelay`, a terminal `EventSink`, and stdin commands into a
//! `Client`. Carries no cryptographic logic of its own; everything it does
//! is delegate into `pm-core`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pm_core::{Client, CoreError, Event, EventSink, MessageLog, Relay, SinkHandle};
use pm_crypto::Identity;
use pm_relay::WsRelay;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Palisade secure messaging CLI", long_about = None)]
struct Cli {
    /// Broker WebSocket URL, e.g. ws://localhost:8765
    #[arg(long, env = "PM_BROKER_URL")]
    broker: String,

    /// Username to register with the broker
    #[arg(long, env = "PM_USERNAME")]
    username: String,

    /// Path to the Ed25519 identity key (created on first use)
    #[arg(long, env = "PM_IDENTITY_PATH", default_value = "identity_key.pem")]
    identity_path: PathBuf,

    /// Path to the append-only ciphertext message log
    #[arg(long, env = "PM_LOG_PATH", default_value = "messages.log")]
    log_path: PathBuf,
}

struct TerminalSink;

impl EventSink for TerminalSink {
    fn emit(&mut self, event: Event) {
        match event {
            Event::HandshakeSuccess { peer } => println!("-- session established with {peer}"),
            Event::Message { from, text } => println!("{from}: {text}"),
            Event::UserList { users } => println!("-- online: {}", users.join(", ")),
            Event::SystemError { message } => eprintln!("-- broker error: {message}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let identity = Identity::load_or_create(&cli.identity_path)
        .with_context(|| format!("loading identity from {}", cli.identity_path.display()))?;
    println!("identity fingerprint: {}", identity.public().fingerprint());

    let log = MessageLog::open(&cli.log_path)
        .with_context(|| format!("opening message log at {}", cli.log_path.display()))?;
    let relay = WsRelay::new(cli.broker.clone(), cli.username.clone());
    let mut client = Client::new(
        identity,
        cli.username.clone(),
        relay,
        SinkHandle::Sync(Box::new(TerminalSink)),
        log,
    );

    println!(
        "connected as {}. commands: /handshake <peer>, /msg <peer> <text>, /forget <peer>, /quit",
        cli.username
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    None => break,
                    Some(line) => {
                        if let Err(e) = handle_command(&mut client, &line).await {
                            eprintln!("-- error: {e}");
                        }
                    }
                }
            }
            outcome = client.tick() => {
                match outcome {
                    Ok(true) => {}
                    Ok(false) => {
                        println!("-- broker connection closed");
                        break;
                    }
                    Err(e) => eprintln!("-- relay error: {e}"),
                }
            }
        }
    }

    Ok(())
}

async fn handle_command<R: Relay>(client: &mut Client<R>, line: &str) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    if line == "/quit" {
        std::process::exit(0);
    }
    if let Some(peer) = line.strip_prefix("/handshake ") {
        client.initiate_handshake(peer.trim()).await?;
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix("/msg ") {
        let (peer, text) = rest.split_once(' ').context("usage: /msg <peer> <text>")?;
        match client.send_message(peer, text).await {
            Ok(()) => {}
            Err(CoreError::NoSession) => {
                println!("-- no session with {peer} yet, initiating handshake; message will be sent once it completes");
                client.initiate_handshake(peer).await?;
            }
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }
    if let Some(peer) = line.strip_prefix("/forget ") {
        let peer = peer.trim();
        client.forget_peer(peer);
        println!("-- forgot session with {peer}");
        return Ok(());
    }
    println!("-- unknown command: {line}");
    Ok(())
}

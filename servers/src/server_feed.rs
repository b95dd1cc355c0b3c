//! Demo occupancy feed.
//!
//! Accepts any number of TCP clients and forwards every valid line typed on stdin to
//! all of them, in wire form. It keeps no parking state of its own.

use anyhow::{Context, Result};
use clap::Parser;
use lib_parking::protocol::decode;
use parking_servers::parking_logic::logger;
use std::io::BufRead;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};

const LINE_CHANNEL_CAPACITY: usize = 64;

#[derive(Parser, Debug)]
#[command(about = "Demo occupancy feed: broadcasts <spot>:<plate>[:<timestamp>] lines typed on stdin", version)]
struct Args {
    #[arg(long, env = "PARKING_FEED_PORT", default_value_t = 8080, help = "Port to listen on.")]
    port: u16,

    #[arg(long, env = "PARKING_LOG_DIR", default_value = "./logs", help = "Directory for log files.")]
    log_dir: PathBuf,

    #[arg(long, env = "PARKING_LOG_LEVEL", default_value = "info", help = "Logging level (debug, info, warn, error).")]
    log_level: String,
}

async fn serve_client(mut stream: TcpStream, peer: SocketAddr, mut lines: broadcast::Receiver<String>) {
    log::info!("Client {} connected", peer);
    loop {
        match lines.recv().await {
            Ok(line) => {
                if let Err(e) = stream.write_all(line.as_bytes()).await {
                    log::info!("Client {} disconnected: {}", peer, e);
                    break;
                }
            }
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Client {} missed {} lines", peer, missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Validates operator input on a dedicated thread and hands wire lines to the sender.
fn spawn_stdin_feeder(lines: broadcast::Sender<String>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match decode(&line) {
                Ok(intent) => {
                    let wire = format!("{}\n", intent.to_line());
                    match lines.send(wire) {
                        Ok(clients) => log::info!("Sent '{}' to {} client(s)", intent.to_line(), clients),
                        Err(_) => log::warn!("No clients connected, dropped '{}'", intent.to_line()),
                    }
                }
                Err(e) => log::warn!("{}", e),
            }
        }
        log::info!("Stdin closed, no more lines will be sent.");
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    logger::setup_logging("server_feed", &args.log_dir, &args.log_level)?;

    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Failed to bind feed port {}", args.port))?;
    log::info!("Feed listening on {}", listener.local_addr()?);

    let (lines_tx, _) = broadcast::channel::<String>(LINE_CHANNEL_CAPACITY);
    spawn_stdin_feeder(lines_tx.clone());

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Ctrl-C received, shutting down feed.");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(serve_client(stream, peer, lines_tx.subscribe()));
                }
                Err(e) => log::error!("Failed to accept client: {}", e),
            },
        }
    }

    Ok(())
}

//! Interactive terminal client for the message relay.
//!
//! Connects, completes the name handshake, then runs two halves: a spawned
//! receive task that prints every broadcast line, and the main loop that
//! sends each stdin line as one frame. Typing `exit` (or closing stdin)
//! leaves; the server closing the connection ends the session too.

use std::io::Write as _;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use relay_core::{bounded_name, text_lossy};
use relay_protocol::frame::{read_frame, write_frame};
use relay_protocol::DEFAULT_PORT;

/// How long to wait, after leaving, for the server to close our read side.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "relay-client", about = "Terminal client for the message relay")]
struct Cli {
    /// Server address to connect to.
    #[arg(default_value = "127.0.0.1")]
    address: String,

    /// Server TCP port.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Display name; prompted for interactively when omitted.
    #[arg(short, long)]
    name: Option<String>,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Chat lines go to stdout; keep all diagnostics on stderr.
    let default_filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let addr = format!("{}:{}", cli.address, cli.port);
    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("connecting to {}", addr))?;
    stream.set_nodelay(true)?;
    info!(%addr, "connected");

    let (mut reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // The server speaks first: one greeting frame.
    let greeting = match read_frame(&mut reader).await {
        Ok(Some(payload)) => payload,
        Ok(None) => bail!("server closed the connection before greeting"),
        Err(e) => return Err(e).context("receiving greeting"),
    };

    let name = match cli.name {
        Some(name) => name,
        None => {
            print!("{}", text_lossy(&greeting));
            std::io::stdout().flush()?;
            lines
                .next_line()
                .await
                .context("reading name from stdin")?
                .context("stdin closed before a name was entered")?
        }
    };
    let name = bounded_name(name.trim().as_bytes());
    write_frame(&mut writer, name.as_bytes())
        .await
        .context("sending name")?;
    debug!(%name, "handshake complete");

    let mut recv_task = tokio::spawn(recv_loop(reader));

    tokio::select! {
        res = send_loop(&mut writer, &mut lines) => {
            res?;
            // We are leaving: stop writing, then give the server a moment
            // to close our read side so the receive task ends naturally.
            let _ = writer.shutdown().await;
            if timeout(SHUTDOWN_GRACE, &mut recv_task).await.is_err() {
                recv_task.abort();
            }
        }
        _ = &mut recv_task => {
            // Server went away; nothing left to send.
        }
    }

    Ok(())
}

/// Print incoming broadcast lines until the connection ends.
async fn recv_loop(mut reader: OwnedReadHalf) {
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(payload)) => println!("{}", text_lossy(&payload)),
            Ok(None) => {
                println!("Disconnected from server");
                return;
            }
            Err(e) => {
                error!(error = %e, "receiving from server failed");
                return;
            }
        }
    }
}

/// Send each stdin line as one frame; `exit` or end-of-input leaves.
async fn send_loop(
    writer: &mut OwnedWriteHalf,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    loop {
        match lines.next_line().await.context("reading stdin")? {
            Some(line) if line == "exit" => return Ok(()),
            Some(line) => {
                write_frame(writer, line.as_bytes())
                    .await
                    .context("sending message")?;
            }
            None => {
                debug!("stdin closed");
                return Ok(());
            }
        }
    }
}

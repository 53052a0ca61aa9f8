use std::env;
use std::error::Error;
use std::time::Duration;

use relay_protocol::frame::{read_frame, write_frame};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Where to connect: env override or default.
    let addr = env::var("RELAY_PROBE_ADDR").unwrap_or_else(|_| "127.0.0.1:50204".to_string());

    println!("Connecting two probes to {}...", addr);
    let mut speaker = TcpStream::connect(&addr).await?;
    let mut listener = TcpStream::connect(&addr).await?;
    println!("Connected.");

    // Each connection gets the greeting and answers with a name frame.
    for (stream, name) in [
        (&mut speaker, "probe-speaker"),
        (&mut listener, "probe-listener"),
    ] {
        let greeting = read_frame(stream)
            .await?
            .ok_or("server closed during greeting")?;
        println!("<< {}", String::from_utf8_lossy(&greeting));
        write_frame(stream, name.as_bytes()).await?;
    }

    write_frame(&mut speaker, b"hello from the probe").await?;
    println!(">> hello from the probe");

    // Print everything the relay fans out to the listener until it goes
    // quiet for half a second.
    loop {
        match timeout(Duration::from_millis(500), read_frame(&mut listener)).await {
            Ok(Ok(Some(payload))) => println!("<< {}", String::from_utf8_lossy(&payload)),
            Ok(Ok(None)) => {
                println!("Server closed the connection.");
                break;
            }
            Ok(Err(e)) => {
                eprintln!("Read error: {}", e);
                break;
            }
            Err(_) => {
                // No more traffic; we are done.
                break;
            }
        }
    }

    Ok(())
}

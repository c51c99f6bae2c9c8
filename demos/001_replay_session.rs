//! Replays recorded client events over a live realtime session.
//!
//! Demonstrates:
//! - Building a client from `ZHIPU_REALTIME_URL` / `ZHIPU_API_KEY`
//! - Sending events over the WebSocket
//! - Stopping on `response.done` or `error`
//!
//! Usage:
//!   cargo run --example 001_replay_session -- files/Audio.ClientVad.Input
//!   cargo run --example 001_replay_session -- files/Audio.ClientVad.Input --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use glm_realtime::{ClientBuilder, Error, Result, event_type};
use tokio::sync::watch;

// ============================================================================
// Constants
// ============================================================================

/// Pause between sends, roughly the pace of a live capture.
const SEND_INTERVAL: Duration = Duration::from_millis(135);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: Replay Session ===\n");

    let input = args
        .input
        .ok_or_else(|| Error::config("usage: 001_replay_session <events-file>"))?;
    let events = common::load_events(&input)?;
    println!("[Setup] Loaded {} events from {}\n", events.len(), input.display());

    // ========================================================================
    // Connect
    // ========================================================================

    let (finished_tx, mut finished) = watch::channel(false);

    let client = ClientBuilder::from_env()
        .on_event(move |event| {
            println!("[Recv] {}", common::summarize(event));
            if event.is(event_type::RESPONSE_DONE) || event.is(event_type::ERROR) {
                finished_tx.send_replace(true);
            }
            Ok(())
        })
        .build()?;

    client.connect().await?;
    println!("[Connect] ✓ Connected\n");

    // ========================================================================
    // Replay
    // ========================================================================

    for event in events {
        let kind = event.event_type.clone();
        if let Err(e) = client.send(event).await {
            println!("[Send] ✗ {kind}: {e}");
            break;
        }
        println!("[Send] {kind}");
        tokio::time::sleep(SEND_INTERVAL).await;
    }

    // ========================================================================
    // Finish
    // ========================================================================

    tokio::select! {
        _ = finished.wait_for(|done| *done) => println!("\n[Done] Response complete"),
        status = client.wait() => println!("\n[Done] Receive loop: {status:?}"),
    }

    client.disconnect().await?;
    Ok(())
}

//! Batches recorded video frames through the completion endpoint.
//!
//! Demonstrates:
//! - Taking instructions from a recorded `session.update`
//! - Buffering frames with automatic threshold flush
//! - Receiving synthesized `response.*` events
//!
//! Usage:
//!   cargo run --example 002_video_batch -- files/Video.ClientVad.Input
//!   cargo run --example 002_video_batch -- files/Video.ClientVad.Input --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::io::Write;

use common::Args;
use glm_realtime::{ClientBuilder, Error, Result, event_type};

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
    println!("=== 002: Video Batch ===\n");

    let input = args
        .input
        .ok_or_else(|| Error::config("usage: 002_video_batch <events-file>"))?;
    let events = common::load_events(&input)?;

    let client = ClientBuilder::from_env()
        .on_event(|event| {
            match event.event_type.as_str() {
                event_type::RESPONSE_TEXT_DELTA => {
                    print!("{}", event.delta);
                    std::io::stdout().flush().ok();
                }
                event_type::RESPONSE_DONE => println!("\n[Recv] response.done"),
                event_type::RESPONSE_TEXT_DONE => {}
                _ => println!("[Recv] {}", common::summarize(event)),
            }
            Ok(())
        })
        .build()?;

    // ========================================================================
    // Instructions
    // ========================================================================

    if let Some(instructions) = events
        .iter()
        .filter(|e| e.is(event_type::SESSION_UPDATE))
        .find_map(|e| e.session_instructions())
    {
        println!("[Setup] Instructions: {instructions}\n");
        client.set_instructions(instructions);
    }

    // ========================================================================
    // Frames
    // ========================================================================

    let mut frames = 0;
    for event in events {
        if !event.is(event_type::INPUT_VIDEO_FRAME_APPEND) {
            continue;
        }
        frames += 1;
        println!("[Frame] Collecting frame {frames}");
        if let Err(e) = client.send_frame_by_video(event).await {
            println!("[Frame] ✗ {e}");
            break;
        }
    }

    println!("\n[Flush] {frames} frames processed, flushing remainder");
    client.flush_video_frames().await?;

    println!("\n[Done] ✓ Processing completed");
    Ok(())
}

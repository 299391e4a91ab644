//! Buffered logging example
//!
//! Demonstrates the flush triggers: capacity, severity, timer and the
//! synchronous fatal path, plus per-label sampling.
//!
//! Run with: cargo run --example buffered_logging

use rust_log_pipeline::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Buffered Logging Example ===\n");

    let logger = Arc::new(
        Logger::builder()
            .min_level(LogLevel::Debug)
            .appender(ConsoleAppender::new())
            .buffering(
                BufferConfig::default()
                    .with_max_entries(5)
                    .with_flush_interval_ms(200)
                    .with_immediate_flush_level(LogLevel::Error),
            )
            .sampling("heartbeat", 0.25)
            .try_build()?,
    );

    println!("1. Capacity: the 6th entry hands the first five to the flush worker");
    for i in 1..=6 {
        logger.info(format!("queued entry {}", i));
    }
    println!("   not yet delivered: {}", logger.stats().buffer.buffer_size);

    println!("\n2. Severity: an error flushes everything buffered");
    logger.debug("context before the error");
    logger.error("request failed");

    println!("\n3. Timer: a lone entry appears after the flush interval");
    logger.info("waiting for the timer");
    thread::sleep(Duration::from_millis(400));

    println!("\n4. Sampling: one in four heartbeats is kept");
    for i in 1..=8 {
        logger.log(LogLevel::Debug, Some("heartbeat"), format!("heartbeat {}", i));
    }
    logger.flush()?;

    println!("\n5. Logging from several threads");
    let handles: Vec<_> = (0..3)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..3 {
                    logger.info(format!("worker {} step {}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    println!("\n6. Fatal: buffered entries first, then the fatal entry");
    logger.info("last words");
    logger.fatal("unrecoverable state");

    logger.stop()?;

    let stats = logger.stats();
    println!("\nBuffer stats: {:?}", stats.buffer);
    println!(
        "Logged: {}, sampled out: {}, fatal: {}",
        stats.metrics.total_logged(),
        stats.metrics.sampled_out_count(),
        stats.metrics.fatal_writes()
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}

//! Basic logger usage example
//!
//! Demonstrates level filtering, structured payloads and redaction with a
//! console appender.
//!
//! Run with: cargo run --example basic_usage

use rust_log_pipeline::prelude::*;
use rust_log_pipeline::{info, warning};

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Basic Usage Example ===\n");

    // Unbuffered so output appears as soon as each call returns
    let logger = Logger::builder()
        .min_level(LogLevel::Debug)
        .appender(ConsoleAppender::new())
        .buffering(BufferConfig::disabled())
        .try_build()?;

    println!("1. Logging at different levels:");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");

    println!("\n2. Raising the minimum level to WARNING:");
    logger.set_min_level(LogLevel::Warning);
    logger.debug("Debug message (hidden)");
    logger.info("Info message (hidden)");
    warning!(logger, "Disk usage at {}%", 91);

    println!("\n3. Structured payloads with redaction:");
    logger.set_min_level(LogLevel::Debug);
    logger.info((
        "user signed in",
        object! {
            "user" => "ada",
            "password" => "correct horse",
            "session" => object! { "token" => "f00dfeedcafebabe", "ttl" => 3600 },
        },
    ));

    println!("\n4. Labels and level names:");
    logger.log(LogLevel::Info, Some("http"), "GET /health 200");
    logger.log_as("error", "parsed as a level");
    logger.log_as("audit", "used as a label at INFO");
    info!(logger, "{} entries delivered so far", logger.metrics().total_logged());

    logger.stop()?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}

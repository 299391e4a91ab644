//! File logging example
//!
//! Demonstrates logging to console, text file and JSON file appenders
//! simultaneously.
//!
//! Run with: cargo run --example file_logging

use rust_log_pipeline::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - File Logging Example ===\n");

    let logger = Logger::builder()
        .min_level(LogLevel::Debug)
        .appender(ConsoleAppender::new())
        .appender(FileAppender::new("application.log")?)
        .appender(
            JsonAppender::new("application.jsonl")?
                .with_timestamp_format(TimestampFormat::UnixMillis),
        )
        .with_env_overrides()
        .try_build()?;

    println!("1. Logging to console and files:");

    logger.info("Application started");
    logger.debug("Loading configuration...");
    logger.info(("Connecting to database", object! { "host" => "db.internal", "password" => "hunter22" }));
    logger.warning("Using default settings for some options");
    logger.error("Failed to load optional plugin");

    println!("\n2. Performing some operations:");

    for i in 1..=5 {
        logger.log(LogLevel::Info, Some("worker"), format!("Processing item {}/5", i));
        if i == 3 {
            logger.warning("Item 3 took longer than expected");
        }
    }

    logger.info("All operations completed");

    // Drain the buffer and flush every appender
    logger.stop()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' and 'application.jsonl' for the full log output");

    Ok(())
}

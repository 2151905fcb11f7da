//! Structured logging and security-focused trace utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing utilities to prevent
//! inference API tokens from leaking into logs.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs.
/// - `pretty` (default): Human-readable, colorized output.
///
/// Logs go to stderr so they never interleave with the mascot's replies on
/// stdout. Log levels are controlled via the `RUST_LOG` environment variable
/// or the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Configure filter from environment or config file
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

/// Sanitizes sensitive information from log messages.
///
/// Replaces Hugging Face style access tokens (`hf_...`) and the value of any
/// `Bearer` authorization with a `\[REDACTED\]` placeholder.
///
/// # Arguments
///
/// * `input` - The raw string that may contain sensitive data.
///
/// # Returns
///
/// A new string where all detected secrets have been replaced.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    // Pattern 1: access tokens, which start with "hf_"
    while let Some(start) = result.find("hf_") {
        let end = token_end(&result, start);
        result.replace_range(start..end, "[REDACTED_ACCESS_TOKEN]");
    }

    // Pattern 2: any other bearer credential
    let mut search_from = 0;
    while let Some(pos) = result[search_from..].find("Bearer ") {
        let start = search_from + pos + "Bearer ".len();
        let end = token_end(&result, start);
        if end > start && !result[start..end].starts_with("[REDACTED") {
            result.replace_range(start..end, "[REDACTED_TOKEN]");
        }
        search_from = start;
    }

    result
}

/// End of the token starting at `start`: next delimiter or end of string
fn token_end(s: &str, start: usize) -> usize {
    s[start..]
        .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ',')
        .map(|i| start + i)
        .unwrap_or(s.len())
}

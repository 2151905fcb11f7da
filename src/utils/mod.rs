//! Utility functions and helpers for picksy.
//!
//! This module provides cross-cutting concerns like structured logging,
//! token sanitization, and retry logic with backoff.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Retry mechanisms that respect inference-server loading hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;

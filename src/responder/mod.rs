//! Model-free reply strategies.
//!
//! # Submodules
//!
//! - `keywords`: ordered substring rules, the last-resort fallback.
//! - `advice`: topic and sentiment keyed templates for classifier-only mode.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod advice;
pub mod keywords;

pub use advice::{Analysis, Sentiment, Topic};
pub use keywords::{KeywordReply, DEFAULT_REPLY, RESET_ACKNOWLEDGEMENT};

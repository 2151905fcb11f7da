// picksy - rhythm practice mascot chat engine
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod responder;
pub mod rhythm;
pub mod session;
pub mod storage;
pub mod utils;

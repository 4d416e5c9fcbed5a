//! deepseek-relay - credential-injecting CORS relay for LLM chat completions
//!
//! Browsers post chat completion payloads here; the relay attaches the
//! server-held provider key, forwards one request with a deadline, and
//! returns the provider's answer or a normalized error.

pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod telemetry;
pub mod upstream;

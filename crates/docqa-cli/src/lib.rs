#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod server;
pub mod telemetry;

/// Tracing target for startup events.
pub const TRACING_TARGET_SERVER_STARTUP: &str = "docqa_cli::server::startup";

/// Tracing target for shutdown events.
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "docqa_cli::server::shutdown";

/// Tracing target for configuration.
pub const TRACING_TARGET_CONFIG: &str = "docqa_cli::config";

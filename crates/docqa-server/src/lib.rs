#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;

/// Tracing target for handlers.
pub const TRACING_TARGET_HANDLER: &str = "docqa_server::handler";

/// Tracing target for session management.
pub const TRACING_TARGET_SESSION: &str = "docqa_server::session";

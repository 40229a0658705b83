#![forbid(unsafe_code)]
//! daygrid-core library.
//!
//! Event model, timestamp parsing, error codes, configuration and stage
//! timing shared by the layout engine and the `dg` binary.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for per-record failures, `anyhow::Result`
//!   for anything touching the filesystem.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod timing;

pub use error::{ErrorCode, EventError};
pub use model::{CalendarEvent, EventCore, EventRecord, EventSource};

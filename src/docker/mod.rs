//! Minimal Docker Engine API client.
//!
//! Talks HTTP/1.1 to the daemon over its unix socket and covers exactly the
//! three calls this tool needs: the startup liveness ping, label-filtered
//! container discovery, and one-shot per-container stats snapshots. The
//! client holds no connection state; every request opens a fresh stream, so
//! one instance can be shared by every sampler task.

mod client;
mod error;
mod models;

pub use client::Client;
pub use error::{Error, Result};
pub use models::{ContainerSummary, InterfaceCounters, StatsResponse};

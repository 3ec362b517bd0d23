//! HTTP API and shared startup for the `analyst-server` and `analyst-indexer` binaries.

#![deny(dead_code)]

pub mod context;
pub mod routes;
pub mod schemas;
pub mod server;

pub use context::AppContext;
pub use server::{bind, serve, MAX_BODY_BYTES};

/// Install the `tracing` subscriber used by both binaries (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

//! Offline cache for the portfolio site, compiled to a service-worker bundle.
//!
//! The worker keeps one versioned cache generation, serves same-origin GET
//! requests cache-first and falls back to the cached root document when a
//! page navigation fails offline. Everything except `sw` is plain Rust and is
//! driven in tests through the in-memory backends in `memory`.

mod error;
mod manifest;
pub mod memory;
mod message;
mod request;
mod store;
mod worker;

#[cfg(target_arch = "wasm32")]
mod console_log;
#[cfg(target_arch = "wasm32")]
mod sw;

pub use error::CacheError;
pub use manifest::CacheManifest;
pub use message::ControlMessage;
pub use request::{is_same_origin, origin_of, resolve_url, Destination, RequestInfo};
pub use store::{CacheStore, CachedResponse, Network, ResponseKind};
pub use worker::{OfflineCache, PendingWrite, Served, WorkerAction, WorkerPhase, WriteOutcome};

//! HTTP client for the remote content-quality data source.
//!
//! The rest of the pipeline treats the backend as an opaque service with
//! network-call semantics: it may fail, it may be slow, and it returns typed
//! payloads. This crate owns that boundary.

pub mod client;
pub mod error;
pub mod types;

mod retry;

pub use client::SourceClient;
pub use error::SourceError;

//! Glues the IR, protocol codecs, rule engine/selection strategies, and
//! retry/failover executor into one orchestrator, plus a thin axum HTTP
//! surface for the three client-facing protocols in §6.
//!
//! Everything the spec calls an external collaborator — the admin
//! surface, the persistent store, telemetry, rate limiting, API-key auth,
//! config loading, supplier wire clients — is represented here only by the
//! trait boundary it crosses (`traits.rs`). `memory.rs` supplies in-memory
//! reference implementations so the crate runs end to end without any of
//! that machinery.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
mod orchestrator;
mod stream_translate;
pub mod traits;
mod translate;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use orchestrator::Orchestrator;
pub use translate::client_tag_for;

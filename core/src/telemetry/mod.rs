//! telemetry/mod.rs
//! Counters, stage timers, immutable snapshots, and audit events.
//!
//! Industry notes:
//! - Every successful operation returns a `TelemetrySnapshot`.
//! - Audit events mark phase boundaries (open, header, completion, failure) and
//!   go to a pluggable `AuditSink`; diagnostics go straight to `tracing`.

pub mod audit;
pub mod counters;
pub mod init;
pub mod snapshot;
pub mod timers;

pub use audit::*;
pub use counters::*;
pub use init::*;
pub use snapshot::*;
pub use timers::*;

// ## 📂 File: `src/telemetry/audit.rs`

//! telemetry/audit.rs
//! Phase-boundary audit events.
//!
//! Design notes:
//! - The engine reports events; formatting and transport belong to the sink.
//! - `TracingAuditSink` is the default: one `tracing` event per record, target
//!   `fileseal::audit`, with the record as JSON in the `record` field.
//! - Sinks must not fail the operation. `record` returns nothing.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crypto::CipherAlgorithm;
use crate::headers::FormatVersion;
use crate::telemetry::snapshot::Direction;
use crate::types::ErrorKind;

pub const AUDIT_TARGET: &str = "fileseal::audit";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    OperationStarted {
        direction: Direction,
        algorithm: CipherAlgorithm,
        source: PathBuf,
        destination: PathBuf,
    },
    InputOpened {
        path: PathBuf,
        length: u64,
    },
    OutputOpened {
        path: PathBuf,
    },
    HeaderWritten {
        version: FormatVersion,
        header_len: usize,
    },
    HeaderRead {
        version: FormatVersion,
        header_len: usize,
        original_size: i64,
    },
    OperationCompleted {
        direction: Direction,
        algorithm: CipherAlgorithm,
        blocks: u64,
        bytes_written: u64,
    },
    OperationFailed {
        direction: Direction,
        algorithm: CipherAlgorithm,
        kind: ErrorKind,
        message: String,
    },
    BlockFailed {
        algorithm: CipherAlgorithm,
        block_index: i64,
        kind: ErrorKind,
        message: String,
    },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::OperationStarted { .. } => "operation_started",
            AuditEvent::InputOpened { .. } => "input_opened",
            AuditEvent::OutputOpened { .. } => "output_opened",
            AuditEvent::HeaderWritten { .. } => "header_written",
            AuditEvent::HeaderRead { .. } => "header_read",
            AuditEvent::OperationCompleted { .. } => "operation_completed",
            AuditEvent::OperationFailed { .. } => "operation_failed",
            AuditEvent::BlockFailed { .. } => "block_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AuditEvent::OperationFailed { .. } | AuditEvent::BlockFailed { .. })
    }
}

/// Timestamped event, as stored or shipped by a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    pub fn now(event: AuditEvent) -> Self {
        Self { timestamp: Utc::now(), event }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Emits audit records as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        let record = AuditRecord::now(event.clone());
        let json = serde_json::to_string(&record).unwrap_or_else(|e| format!("{{\"encode_error\":\"{}\"}}", e));
        if event.is_failure() {
            tracing::warn!(target: AUDIT_TARGET, event = event.name(), record = %json);
        } else {
            tracing::info!(target: AUDIT_TARGET, event = event.name(), record = %json);
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

pub fn default_audit_sink() -> Arc<dyn AuditSink> {
    Arc::new(TracingAuditSink)
}

// ## 📂 File: `src/stream/core.rs`
// ## Stable public API: one cryptor per algorithm, encrypt_file / decrypt_file

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

use crate::buffers::BufferPool;
use crate::config::EngineConfig;
use crate::crypto::{CipherAlgorithm, DecryptionInput, EncryptionInput};
use crate::notify::PostWriteNotifier;
use crate::stream::alignment::AlignmentPolicy;
use crate::stream::pipeline::{run_decrypt_pipeline, run_encrypt_pipeline, PipelineConfig, TransferInstruction};
use crate::telemetry::{default_audit_sink, AuditEvent, AuditSink, Direction, Stage, TelemetrySnapshot};
use crate::types::FileCryptoError;

/// File encryptor/decryptor for one algorithm.
///
/// Cheap to clone; clones share the audit sink, notifier and buffer pool.
#[derive(Clone)]
pub struct FileCryptor {
    algorithm: CipherAlgorithm,
    config: EngineConfig,
    alignment: Arc<dyn AlignmentPolicy>,
    audit: Arc<dyn AuditSink>,
    notifier: Option<Arc<dyn PostWriteNotifier>>,
    pool: Arc<BufferPool>,
}

impl std::fmt::Debug for FileCryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCryptor")
            .field("algorithm", &self.algorithm)
            .field("config", &self.config)
            .field("alignment", &self.alignment.name())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl FileCryptor {
    /// Cryptor for `algorithm`. Validates `config` and picks the policy it names.
    pub fn new(algorithm: CipherAlgorithm, config: EngineConfig) -> Result<Self, FileCryptoError> {
        config.validate()?;
        Ok(Self {
            algorithm,
            alignment: config.alignment.policy(),
            config,
            audit: default_audit_sink(),
            notifier: None,
            pool: BufferPool::global(),
        })
    }

    /// AES-GCM with a caller-supplied 16/24/32-byte key.
    pub fn aes_gcm(config: EngineConfig) -> Result<Self, FileCryptoError> {
        Self::new(CipherAlgorithm::AesGcm, config)
    }

    /// ChaCha20-Poly1305 with an Argon2id password-derived key.
    pub fn chacha20_poly1305(config: EngineConfig) -> Result<Self, FileCryptoError> {
        Self::new(CipherAlgorithm::ChaCha20Poly1305, config)
    }

    /// XChaCha20-Poly1305 with an Argon2id password-derived key.
    pub fn xchacha20_poly1305(config: EngineConfig) -> Result<Self, FileCryptoError> {
        Self::new(CipherAlgorithm::XChaCha20Poly1305, config)
    }

    /// Replace the built-in policy. The payload block size must still suit it.
    pub fn with_alignment(mut self, policy: Arc<dyn AlignmentPolicy>) -> Self {
        self.alignment = policy;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PostWriteNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_buffer_pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn pipeline_config(&self) -> PipelineConfig<'_> {
        PipelineConfig {
            algorithm: self.algorithm,
            config: &self.config,
            policy: self.alignment.as_ref(),
            audit: self.audit.as_ref(),
            notifier: self.notifier.as_ref(),
            pool: &self.pool,
        }
    }

    fn started(&self, direction: Direction, instruction: &TransferInstruction) {
        self.audit.record(&AuditEvent::OperationStarted {
            direction,
            algorithm: self.algorithm,
            source: instruction.source.clone(),
            destination: instruction.destination.clone(),
        });
    }

    fn finished(
        &self,
        direction: Direction,
        result: Result<TelemetrySnapshot, FileCryptoError>,
    ) -> Result<TelemetrySnapshot, FileCryptoError> {
        match &result {
            Ok(snapshot) => {
                info!(
                    blocks = snapshot.blocks,
                    bytes = snapshot.bytes_written,
                    elapsed_ms = snapshot.elapsed.as_secs_f64() * 1_000.0,
                    kdf_ms = snapshot.stage_times.get_ms(Stage::KeyDerivation),
                    "operation completed"
                );
                self.audit.record(&AuditEvent::OperationCompleted {
                    direction,
                    algorithm: self.algorithm,
                    blocks: snapshot.blocks,
                    bytes_written: snapshot.bytes_written,
                });
            }
            Err(e) => {
                error!(kind = %e.kind(), "operation failed: {}", e);
                self.audit.record(&AuditEvent::OperationFailed {
                    direction,
                    algorithm: self.algorithm,
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
        result
    }

    /// Encrypt `instruction.source` into a container at `instruction.destination`.
    ///
    /// On failure the destination may hold partial output; removing it is up to
    /// the caller.
    pub async fn encrypt_file(
        &self,
        instruction: &TransferInstruction,
        input: EncryptionInput,
        cancel: &CancellationToken,
    ) -> Result<TelemetrySnapshot, FileCryptoError> {
        let span = tracing::info_span!(
            "encrypt_file",
            algorithm = %self.algorithm,
            source = %instruction.source.display(),
        );
        async move {
            if cancel.is_cancelled() {
                return self.finished(Direction::Encrypt, Err(FileCryptoError::Cancelled));
            }
            self.started(Direction::Encrypt, instruction);
            let cfg = self.pipeline_config();
            let result = run_encrypt_pipeline(&cfg, instruction, &input, cancel).await;
            self.finished(Direction::Encrypt, result)
        }
        .instrument(span)
        .await
    }

    /// Decrypt the container at `instruction.source` into `instruction.destination`.
    pub async fn decrypt_file(
        &self,
        instruction: &TransferInstruction,
        input: DecryptionInput,
        cancel: &CancellationToken,
    ) -> Result<TelemetrySnapshot, FileCryptoError> {
        let span = tracing::info_span!(
            "decrypt_file",
            algorithm = %self.algorithm,
            source = %instruction.source.display(),
        );
        async move {
            if cancel.is_cancelled() {
                return self.finished(Direction::Decrypt, Err(FileCryptoError::Cancelled));
            }
            self.started(Direction::Decrypt, instruction);
            let cfg = self.pipeline_config();
            let result = run_decrypt_pipeline(&cfg, instruction, &input, cancel).await;
            self.finished(Direction::Decrypt, result)
        }
        .instrument(span)
        .await
    }
}

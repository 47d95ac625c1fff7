// Shared helpers for the integration suites.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fileseal_core::{
    config::EngineConfig,
    crypto::{CipherAlgorithm, KdfParams, SecretInput},
    notify::PostWriteNotifier,
    stream::{AlignmentMode, FileCryptor, TransferInstruction},
    telemetry::{AuditEvent, AuditSink, TelemetrySnapshot},
    types::FileCryptoError,
};
use rand::RngCore;
use tokio_util::sync::CancellationToken;

pub const BLOCK: usize = 4096;
pub const PASSWORD: &str = "correct horse battery staple";

/// Argon2id settings small enough for tests but still valid.
pub fn light_kdf() -> KdfParams {
    KdfParams { memory_kib: 1024, iterations: 6, parallelism: 1, output_len: 32 }
}

pub fn light_config(alignment: AlignmentMode) -> EngineConfig {
    EngineConfig::default()
        .with_payload_block_size(BLOCK)
        .with_integrity_salt_len(64)
        .with_alignment(alignment)
        .with_kdf(light_kdf())
        .with_io_buffer_capacity(8 * 1024)
}

/// Records every audit event in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Counts notifications; optionally fails each one.
#[derive(Default)]
pub struct CountingNotifier {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl PostWriteNotifier for CountingNotifier {
    fn notify_written(&self, _path: &Path) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("shell refused the notification");
        }
        Ok(())
    }
}

pub fn cryptor(algorithm: CipherAlgorithm, alignment: AlignmentMode) -> (FileCryptor, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::default());
    let c = FileCryptor::new(algorithm, light_config(alignment))
        .unwrap()
        .with_audit_sink(sink.clone());
    (c, sink)
}

/// Secret matching the algorithm's key mode.
pub fn secret_for(algorithm: CipherAlgorithm) -> SecretInput {
    match algorithm {
        CipherAlgorithm::AesGcm => SecretInput::raw_key([0x42u8; 32]),
        _ => SecretInput::password(PASSWORD),
    }
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut v = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut v);
    v
}

/// Paths for plaintext, container and recovered files inside `dir`.
pub struct Files {
    pub plain: PathBuf,
    pub sealed: PathBuf,
    pub opened: PathBuf,
}

impl Files {
    pub fn new(dir: &Path, tag: &str) -> Self {
        Self {
            plain: dir.join(format!("{tag}.bin")),
            sealed: dir.join(format!("{tag}.fseal")),
            opened: dir.join(format!("{tag}.out")),
        }
    }

    pub fn encrypt_instruction(&self) -> TransferInstruction {
        TransferInstruction::new(&self.plain, &self.sealed)
    }

    pub fn decrypt_instruction(&self) -> TransferInstruction {
        TransferInstruction::new(&self.sealed, &self.opened)
    }
}

pub async fn seal(c: &FileCryptor, files: &Files, data: &[u8], secret: SecretInput) -> TelemetrySnapshot {
    tokio::fs::write(&files.plain, data).await.unwrap();
    c.encrypt_file(&files.encrypt_instruction(), secret, &CancellationToken::new())
        .await
        .expect("encrypt")
}

pub async fn open(c: &FileCryptor, files: &Files, secret: SecretInput) -> Result<TelemetrySnapshot, FileCryptoError> {
    c.decrypt_file(&files.decrypt_instruction(), secret, &CancellationToken::new()).await
}

/// Flip one bit of the container at `offset`.
pub async fn flip_bit(path: &Path, offset: usize) {
    let mut bytes = tokio::fs::read(path).await.unwrap();
    bytes[offset] ^= 0x01;
    tokio::fs::write(path, bytes).await.unwrap();
}

// ## 📂 File: `src/stream/pipeline.rs`
// ## Operation wiring: key, streams, header, block engine

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::buffers::{BufferManager, BufferPool, BufferSpec};
use crate::config::EngineConfig;
use crate::constants::VERSION_PREFIX_LEN;
use crate::crypto::{establish_key_async, generate_kdf_salt, generate_nonce, CipherAlgorithm, SecretInput};
use crate::headers::{decode_header, decode_version, encode_header_into, ContainerHeader, HeaderError, HeaderLayout};
use crate::notify::PostWriteNotifier;
use crate::stream::alignment::AlignmentPolicy;
use crate::stream::engine::{BlockEngine, EngineContext};
use crate::stream::io::{open_destination, open_source, read_exact_or_eof};
use crate::telemetry::{
    AuditEvent, AuditSink, Direction, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer,
};
use crate::types::FileCryptoError;

/// Source and destination of one file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl TransferInstruction {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self { source: source.into(), destination: destination.into() }
    }
}

/// Everything one operation borrows from its `FileCryptor`.
pub struct PipelineConfig<'a> {
    pub algorithm: CipherAlgorithm,
    pub config: &'a EngineConfig,
    pub policy: &'a dyn AlignmentPolicy,
    pub audit: &'a dyn AuditSink,
    pub notifier: Option<&'a Arc<dyn PostWriteNotifier>>,
    pub pool: &'a Arc<BufferPool>,
}

impl PipelineConfig<'_> {
    fn buffer_spec(&self, layout: &HeaderLayout) -> BufferSpec {
        let payload = self.config.payload_block_size;
        BufferSpec {
            io_len: payload,
            output_len: self.policy.calculate_processing_size(payload, false),
            tag_region_len: self.policy.block_metadata_size(self.algorithm.tag_len()),
            header_len: self.policy.metadata_buffer_size(layout),
            nonce_len: self.algorithm.nonce_len(),
            salt_len: layout.integrity_salt_len,
        }
    }
}

#[inline]
fn check_cancelled(cancel: &CancellationToken) -> Result<(), FileCryptoError> {
    if cancel.is_cancelled() {
        return Err(FileCryptoError::Cancelled);
    }
    Ok(())
}

// ============================================================
// Encrypt pipeline
// ============================================================
pub async fn run_encrypt_pipeline(
    cfg: &PipelineConfig<'_>,
    instruction: &TransferInstruction,
    input: &SecretInput,
    cancel: &CancellationToken,
) -> Result<TelemetrySnapshot, FileCryptoError> {
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let algorithm = cfg.algorithm;

    // 1️⃣ Secret must fit the algorithm before anything touches the disk
    input.check_for(algorithm)?;

    // 2️⃣ Fresh header nonce + KDF salt, then the key
    let nonce = generate_nonce(algorithm.nonce_len());
    let kdf_salt = generate_kdf_salt();

    let t = Instant::now();
    let key = establish_key_async(algorithm, input, kdf_salt, cfg.config.kdf).await?;
    let provider = algorithm.provider(key.as_bytes())?;
    drop(key);
    timer.add_stage_time(Stage::KeyDerivation, t.elapsed());
    debug!(%algorithm, "key established");

    // 3️⃣ Streams
    check_cancelled(cancel)?;
    let mode = cfg.policy.stream_open_mode();
    let t = Instant::now();
    let mut src = open_source(&instruction.source, mode, cfg.config.io_buffer_capacity).await?;
    cfg.audit.record(&AuditEvent::InputOpened { path: instruction.source.clone(), length: src.len });
    let mut dst = open_destination(&instruction.destination, mode, cfg.config.io_buffer_capacity).await?;
    cfg.audit.record(&AuditEvent::OutputOpened { path: instruction.destination.clone() });
    timer.add_stage_time(Stage::Open, t.elapsed());

    // 4️⃣ Header
    let original_size = i64::try_from(src.len)
        .map_err(|_| FileCryptoError::InvalidInput(format!("source length {} exceeds i64", src.len)))?;
    let header = ContainerHeader::new(nonce, original_size, kdf_salt, cfg.config.integrity_salt_len);
    let layout = header.layout();

    check_cancelled(cancel)?;
    let mut bufs = BufferManager::rent(cfg.pool, cfg.buffer_spec(&layout));

    check_cancelled(cancel)?;
    let t = Instant::now();
    encode_header_into(&header, &mut bufs.header)?;
    dst.writer.write_all(&bufs.header).await?;
    bufs.salt.copy_from_slice(&header.integrity_salt);
    timer.add_stage_time(Stage::Header, t.elapsed());
    counters.add_header(bufs.header.len());
    cfg.audit.record(&AuditEvent::HeaderWritten { version: header.version, header_len: bufs.header.len() });
    debug!(version = %header.version, header_len = bufs.header.len(), original_size, "header written");

    // 5️⃣ Blocks
    let engine = BlockEngine::new(
        provider.as_ref(),
        cfg.policy,
        &header.nonce,
        header.original_size,
        cfg.config.payload_block_size,
    )?;
    let mut ctx = EngineContext { cancel, audit: cfg.audit, counters: &mut counters, timer: &mut timer };
    engine
        .encrypt_blocks(&mut src.reader, &mut dst.writer, &mut bufs, src.len, &mut ctx)
        .await?;

    // 6️⃣ Flush (and sync under write-through)
    let t = Instant::now();
    dst.finish().await?;
    timer.add_stage_time(Stage::Write, t.elapsed());

    timer.finish();
    let written = counters.container_bytes();
    Ok(TelemetrySnapshot::from(Direction::Encrypt, algorithm, &counters, written, &timer))
}

// ============================================================
// Decrypt pipeline
// ============================================================
pub async fn run_decrypt_pipeline(
    cfg: &PipelineConfig<'_>,
    instruction: &TransferInstruction,
    input: &SecretInput,
    cancel: &CancellationToken,
) -> Result<TelemetrySnapshot, FileCryptoError> {
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let algorithm = cfg.algorithm;

    input.check_for(algorithm)?;

    // 1️⃣ Source
    check_cancelled(cancel)?;
    let mode = cfg.policy.stream_open_mode();
    let t = Instant::now();
    let mut src = open_source(&instruction.source, mode, cfg.config.io_buffer_capacity).await?;
    cfg.audit.record(&AuditEvent::InputOpened { path: instruction.source.clone(), length: src.len });
    timer.add_stage_time(Stage::Open, t.elapsed());

    // 2️⃣ Header: version prefix first, then the rest
    let layout = HeaderLayout::new(algorithm.nonce_len(), cfg.config.integrity_salt_len);
    check_cancelled(cancel)?;
    let mut bufs = BufferManager::rent(cfg.pool, cfg.buffer_spec(&layout));
    let header_len = bufs.header.len();

    check_cancelled(cancel)?;
    let t = Instant::now();
    let got = read_exact_or_eof(&mut src.reader, &mut bufs.header[..VERSION_PREFIX_LEN]).await?;
    if got < VERSION_PREFIX_LEN {
        return Err(HeaderError::BufferTooShort { have: got, need: header_len }.into());
    }
    decode_version(&bufs.header[..VERSION_PREFIX_LEN])?;

    let got = read_exact_or_eof(&mut src.reader, &mut bufs.header[VERSION_PREFIX_LEN..]).await?;
    if VERSION_PREFIX_LEN + got < header_len {
        return Err(HeaderError::BufferTooShort { have: VERSION_PREFIX_LEN + got, need: header_len }.into());
    }
    let header = decode_header(&bufs.header, layout)?;
    bufs.salt.copy_from_slice(&header.integrity_salt);
    timer.add_stage_time(Stage::Header, t.elapsed());
    counters.add_header(header_len);
    cfg.audit.record(&AuditEvent::HeaderRead {
        version: header.version,
        header_len,
        original_size: header.original_size,
    });
    debug!(version = %header.version, header_len, original_size = header.original_size, "header read");

    // 3️⃣ Key
    let t = Instant::now();
    let key = establish_key_async(algorithm, input, header.kdf_salt, cfg.config.kdf).await?;
    let provider = algorithm.provider(key.as_bytes())?;
    drop(key);
    timer.add_stage_time(Stage::KeyDerivation, t.elapsed());

    // 4️⃣ Destination, only once the header is trusted
    check_cancelled(cancel)?;
    let t = Instant::now();
    let mut dst = open_destination(&instruction.destination, mode, cfg.config.io_buffer_capacity).await?;
    cfg.audit.record(&AuditEvent::OutputOpened { path: instruction.destination.clone() });
    timer.add_stage_time(Stage::Open, t.elapsed());

    // 5️⃣ Blocks
    let engine = BlockEngine::new(
        provider.as_ref(),
        cfg.policy,
        &header.nonce,
        header.original_size,
        cfg.config.payload_block_size,
    )?;
    let mut ctx = EngineContext { cancel, audit: cfg.audit, counters: &mut counters, timer: &mut timer };
    let acct = engine
        .decrypt_blocks(
            &mut src.reader,
            &mut dst.writer,
            &mut bufs,
            src.len,
            header_len,
            header.original_size,
            &mut ctx,
        )
        .await?;

    let t = Instant::now();
    dst.finish().await?;
    timer.add_stage_time(Stage::Write, t.elapsed());

    // 6️⃣ Best-effort notification
    if let Some(notifier) = cfg.notifier {
        if let Err(e) = notifier.notify_written(&instruction.destination) {
            warn!(path = %instruction.destination.display(), error = %e, "post-write notification failed");
        }
    }

    timer.finish();
    Ok(TelemetrySnapshot::from(
        Direction::Decrypt,
        algorithm,
        &counters,
        acct.processed_bytes as u64,
        &timer,
    ))
}

// ## 📂 File: `src/stream/engine.rs`

//! stream/engine.rs
//! Sequential per-block AEAD loop.
//!
//! On-disk block: `[tag region][ciphertext]`. The tag region is the tag alone
//! (unaligned) or the tag zero-padded to one sector (aligned).
//!
//! Design notes:
//! - Blocks of one file are strictly sequential; all state lives in the
//!   operation's task.
//! - The integrity salt is read from the operation's salt buffer, which the
//!   pipeline fills from the header before the first block.
//! - Every block is authenticated with the 76-byte AAD (salt, index, size) and
//!   a nonce from the per-file schedule, which is keyed by the header nonce and
//!   the declared `originalSize`. Reordering, truncation inside a block,
//!   and cross-file splicing all fail authentication.
//! - An authentication failure aborts immediately. No retries.

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::buffers::BufferManager;
use crate::constants::BLOCK_AAD_LEN;
use crate::crypto::{build_block_aad_into, BlockCipherProvider, CryptoError, NonceSchedule};
use crate::stream::alignment::AlignmentPolicy;
use crate::stream::io::read_exact_or_eof;
use crate::stream::validator::{
    block_count, check_block_capacity, check_final_size, check_read_total, BlockAccounting,
    ConsistencyError,
};
use crate::telemetry::{AuditEvent, AuditSink, Stage, TelemetryCounters, TelemetryTimer};
use crate::types::FileCryptoError;

/// Per-operation observers the engine reports into.
pub struct EngineContext<'a> {
    pub cancel: &'a CancellationToken,
    pub audit: &'a dyn AuditSink,
    pub counters: &'a mut TelemetryCounters,
    pub timer: &'a mut TelemetryTimer,
}

impl EngineContext<'_> {
    fn check_cancelled(&self) -> Result<(), FileCryptoError> {
        if self.cancel.is_cancelled() {
            return Err(FileCryptoError::Cancelled);
        }
        Ok(())
    }
}

pub struct BlockEngine<'a> {
    provider: &'a dyn BlockCipherProvider,
    policy: &'a dyn AlignmentPolicy,
    schedule: NonceSchedule,
    payload_block_size: usize,
}

impl<'a> BlockEngine<'a> {
    pub fn new(
        provider: &'a dyn BlockCipherProvider,
        policy: &'a dyn AlignmentPolicy,
        header_nonce: &[u8],
        original_size: i64,
        payload_block_size: usize,
    ) -> Result<Self, FileCryptoError> {
        let schedule = NonceSchedule::new(header_nonce, original_size)?;
        if schedule.nonce_len() != provider.nonce_len() {
            return Err(CryptoError::InvalidNonceLen {
                expected: provider.nonce_len(),
                actual: schedule.nonce_len(),
            }
            .into());
        }
        Ok(Self { provider, policy, schedule, payload_block_size })
    }

    pub fn block_metadata_size(&self) -> usize {
        self.policy.block_metadata_size(self.provider.tag_len())
    }

    /// Bytes of one full block on disk.
    pub fn block_stride(&self) -> u64 {
        (self.block_metadata_size() + self.policy.calculate_processing_size(self.payload_block_size, false)) as u64
    }

    fn block_aad(
        out: &mut [u8; BLOCK_AAD_LEN],
        integrity_salt: &[u8],
        index: i64,
        processing: usize,
    ) -> Result<(), FileCryptoError> {
        let size = u32::try_from(processing)
            .map_err(|_| FileCryptoError::InvalidInput(format!("block size {} exceeds u32", processing)))?;
        build_block_aad_into(out, integrity_salt, index, size);
        Ok(())
    }

    fn audit_block_failure(&self, ctx: &EngineContext<'_>, index: i64, err: &FileCryptoError) {
        if matches!(err, FileCryptoError::Cancelled) {
            return;
        }
        error!(block_index = index, kind = %err.kind(), "block failed: {}", err);
        ctx.audit.record(&AuditEvent::BlockFailed {
            algorithm: self.provider.algorithm(),
            block_index: index,
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    // ============================================================
    // Encrypt
    // ============================================================

    /// Encrypt `declared_len` bytes from `reader` into blocks on `writer`.
    pub async fn encrypt_blocks<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        bufs: &mut BufferManager,
        declared_len: u64,
        ctx: &mut EngineContext<'_>,
    ) -> Result<BlockAccounting, FileCryptoError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let original = i64::try_from(declared_len)
            .map_err(|_| FileCryptoError::InvalidInput(format!("source length {} exceeds i64", declared_len)))?;
        let total = block_count(declared_len, self.payload_block_size as u64);
        let mut acct = BlockAccounting::new(original, total);
        debug!(total_blocks = total, declared_len, "encrypting blocks");

        while acct.block_index < total {
            ctx.check_cancelled()?;
            let index = acct.block_index;
            match self.encrypt_one(reader, writer, bufs, &mut acct, ctx).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    self.audit_block_failure(ctx, index, &e);
                    return Err(e);
                }
            }
        }

        // Anything past the declared length means the source changed under us.
        let mut one = [0u8; 1];
        let extra = read_exact_or_eof(reader, &mut one).await?;
        let t = Instant::now();
        let result = check_read_total(acct.bytes_read() + extra as u64, declared_len);
        ctx.timer.add_stage_time(Stage::Validate, t.elapsed());
        result?;

        Ok(acct)
    }

    /// One block. `Ok(false)` on a short read.
    async fn encrypt_one<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        bufs: &mut BufferManager,
        acct: &mut BlockAccounting,
        ctx: &mut EngineContext<'_>,
    ) -> Result<bool, FileCryptoError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let index = acct.block_index;
        let last = acct.is_last();
        let want = (self.payload_block_size as i64).min(acct.remaining()).max(0) as usize;

        // 1️⃣ Read
        let t = Instant::now();
        let n = read_exact_or_eof(reader, &mut bufs.io[..want]).await?;
        ctx.timer.add_stage_time(Stage::Read, t.elapsed());
        acct.record_read(n);

        if n < want {
            // The source shrank; the read-total check reports it.
            debug!(block_index = index, expected = want, actual = n, last, "short source read");
            return Ok(false);
        }

        // 2️⃣ Pad to the processing size
        let processing = self.policy.calculate_processing_size(n, last);
        check_block_capacity(processing, bufs.output_capacity())?;
        let out = &mut bufs.output[..processing];
        out[..n].copy_from_slice(&bufs.io[..n]);
        out[n..].fill(0);

        // 3️⃣ AAD + nonce
        let mut aad = [0u8; BLOCK_AAD_LEN];
        Self::block_aad(&mut aad, &bufs.salt, index, processing)?;
        self.schedule.nonce_into(index as u64, &mut bufs.nonce)?;

        // 4️⃣ Seal
        let tag_len = self.provider.tag_len();
        let t = Instant::now();
        bufs.tag_region.fill(0);
        self.provider
            .encrypt_block(&bufs.nonce, &aad, out, &mut bufs.tag_region[..tag_len])?;
        ctx.timer.add_stage_time(Stage::Encrypt, t.elapsed());

        // 5️⃣ Write tag region, then ciphertext
        let t = Instant::now();
        writer.write_all(&bufs.tag_region).await?;
        writer.write_all(out).await?;
        ctx.timer.add_stage_time(Stage::Write, t.elapsed());

        // 6️⃣ Account
        let written = acct.bytes_to_write(n)?;
        acct.advance(written)?;
        ctx.counters.add_block(written, processing, bufs.tag_region.len());
        trace!(block_index = index, bytes = n, processing, last, "block encrypted");

        Ok(true)
    }

    // ============================================================
    // Decrypt
    // ============================================================

    /// Decrypt the blocks following a header of `header_len` bytes.
    pub async fn decrypt_blocks<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        bufs: &mut BufferManager,
        container_len: u64,
        header_len: usize,
        original_size: i64,
        ctx: &mut EngineContext<'_>,
    ) -> Result<BlockAccounting, FileCryptoError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let body = container_len
            .checked_sub(header_len as u64)
            .ok_or(ConsistencyError::TruncatedContainer { container_len, header_len: header_len as u64 })?;

        let total = block_count(body, self.block_stride());
        let expected = block_count(original_size as u64, self.payload_block_size as u64);
        if total != expected {
            let e: FileCryptoError =
                ConsistencyError::BlockCountMismatch { from_container: total, from_header: expected }.into();
            error!(kind = %e.kind(), "{}", e);
            return Err(e);
        }

        let mut acct = BlockAccounting::new(original_size, total);
        debug!(total_blocks = total, original_size, container_len, "decrypting blocks");

        while acct.block_index < total {
            ctx.check_cancelled()?;
            let index = acct.block_index;
            if let Err(e) = self.decrypt_one(reader, writer, bufs, &mut acct, ctx).await {
                self.audit_block_failure(ctx, index, &e);
                return Err(e);
            }
        }

        let t = Instant::now();
        let mut one = [0u8; 1];
        if reader.read(&mut one).await? != 0 {
            return Err(ConsistencyError::TrailingData.into());
        }
        check_final_size(acct.processed_bytes, acct.original_size)?;
        ctx.timer.add_stage_time(Stage::Validate, t.elapsed());

        Ok(acct)
    }

    async fn decrypt_one<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        bufs: &mut BufferManager,
        acct: &mut BlockAccounting,
        ctx: &mut EngineContext<'_>,
    ) -> Result<(), FileCryptoError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let index = acct.block_index;
        let last = acct.is_last();
        let plain = (self.payload_block_size as i64).min(acct.remaining()).max(0) as usize;
        let processing = self.policy.calculate_processing_size(plain, last);
        check_block_capacity(processing, bufs.output_capacity())?;

        // 1️⃣ Tag region, then ciphertext
        let t = Instant::now();
        let region_len = bufs.tag_region.len();
        let got = read_exact_or_eof(reader, &mut bufs.tag_region).await?;
        if got < region_len {
            return Err(FileCryptoError::UnexpectedEof { block_index: index, expected: region_len, actual: got });
        }
        let out = &mut bufs.output[..processing];
        let got = read_exact_or_eof(reader, out).await?;
        if got < processing {
            return Err(FileCryptoError::UnexpectedEof { block_index: index, expected: processing, actual: got });
        }
        ctx.timer.add_stage_time(Stage::Read, t.elapsed());

        // 2️⃣ AAD + nonce
        let mut aad = [0u8; BLOCK_AAD_LEN];
        Self::block_aad(&mut aad, &bufs.salt, index, processing)?;
        self.schedule.nonce_into(index as u64, &mut bufs.nonce)?;

        // 3️⃣ Open
        let tag_len = self.provider.tag_len();
        let t = Instant::now();
        self.provider
            .decrypt_block(&bufs.nonce, &aad, out, &bufs.tag_region[..tag_len])
            .map_err(|e| match e {
                CryptoError::AuthenticationFailure => FileCryptoError::AuthenticationFailure { block_index: index },
                other => other.into(),
            })?;
        ctx.timer.add_stage_time(Stage::Decrypt, t.elapsed());

        // 4️⃣ Clamp and write
        let written = acct.bytes_to_write(processing)?;
        let t = Instant::now();
        writer.write_all(&out[..written]).await?;
        ctx.timer.add_stage_time(Stage::Write, t.elapsed());

        acct.advance(written)?;
        ctx.counters.add_block(written, processing, region_len);
        trace!(block_index = index, processing, written, last, "block decrypted");

        Ok(())
    }
}

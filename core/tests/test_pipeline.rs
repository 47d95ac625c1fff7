// End-to-end file operations through `FileCryptor`.

mod common;

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use fileseal_core::{
        buffers::BufferPool,
        constants::{SECTOR_SIZE, TAG_LEN},
        crypto::{CipherAlgorithm, SecretInput},
        stream::{AlignmentMode, FileCryptor},
        telemetry::{AuditEvent, AuditSink, Direction, Stage},
        types::ErrorKind,
    };
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    use crate::common::*;

    const SIZES: [usize; 8] = [0, 1, 511, 512, BLOCK - 1, BLOCK, BLOCK + 1, 3 * BLOCK + 100];

    /// Unaligned header for a 12-byte nonce and 64-byte salt.
    const HEADER_12: usize = 2 + 12 + 8 + 64 + 16;
    const STRIDE: usize = TAG_LEN + BLOCK;

    fn expected_container_len(alignment: AlignmentMode, nonce_len: usize, len: usize) -> usize {
        let header = 2 + nonce_len + 8 + 64 + 16;
        let blocks = len.div_ceil(BLOCK);
        match alignment {
            AlignmentMode::Unaligned => header + blocks * TAG_LEN + len,
            AlignmentMode::Aligned => {
                let last = len - blocks.saturating_sub(1) * BLOCK;
                let body = if blocks == 0 {
                    0
                } else {
                    (blocks - 1) * BLOCK + last.div_ceil(SECTOR_SIZE) * SECTOR_SIZE
                };
                SECTOR_SIZE + blocks * SECTOR_SIZE + body
            }
        }
    }

// ## 1️⃣ Round trips

    #[tokio::test]
    async fn roundtrip_every_algorithm_policy_and_size() {
        let dir = tempdir().unwrap();

        for alg in CipherAlgorithm::ALL {
            for alignment in [AlignmentMode::Unaligned, AlignmentMode::Aligned] {
                let (c, _) = cryptor(alg, alignment);
                for len in SIZES {
                    let files = Files::new(dir.path(), &format!("{}-{:?}-{}", alg, alignment, len));
                    let data = random_bytes(len);

                    let enc = seal(&c, &files, &data, secret_for(alg)).await;
                    let container = tokio::fs::read(&files.sealed).await.unwrap();
                    assert_eq!(
                        container.len(),
                        expected_container_len(alignment, alg.nonce_len(), len),
                        "{alg} {alignment:?} {len}"
                    );
                    assert_eq!(enc.bytes_written, container.len() as u64);
                    assert_eq!(enc.blocks, len.div_ceil(BLOCK) as u64);
                    assert_eq!(&container[..2], &[1, 0]);

                    let dec = open(&c, &files, secret_for(alg)).await.unwrap();
                    assert_eq!(dec.bytes_written, len as u64);
                    assert_eq!(tokio::fs::read(&files.opened).await.unwrap(), data, "{alg} {alignment:?} {len}");
                }
            }
        }
    }

    #[tokio::test]
    async fn ten_block_file_recovers_exact_byte_count() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Aligned);
        let files = Files::new(dir.path(), "ten");
        let tail = 1234;
        let data = random_bytes(9 * BLOCK + tail);

        let enc = seal(&c, &files, &data, secret_for(CipherAlgorithm::AesGcm)).await;
        assert_eq!(enc.blocks, 10);
        assert_eq!(enc.bytes_plaintext, data.len() as u64);

        let dec = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap();
        assert_eq!(dec.blocks, 10);
        assert_eq!(dec.bytes_written, (9 * BLOCK + tail) as u64);
        assert_eq!(tokio::fs::read(&files.opened).await.unwrap(), data);
    }

    #[tokio::test]
    async fn password_roundtrip_and_near_miss_password() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::ChaCha20Poly1305, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "pw");
        let data = random_bytes(3 * 1024);

        seal(&c, &files, &data, SecretInput::password(PASSWORD)).await;
        open(&c, &files, SecretInput::password(PASSWORD)).await.unwrap();
        assert_eq!(tokio::fs::read(&files.opened).await.unwrap(), data);

        let err = open(&c, &files, SecretInput::password("correct horse battery stapler"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.block_index(), Some(0));
    }

    #[tokio::test]
    async fn empty_file_is_header_only() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "empty");

        let enc = seal(&c, &files, &[], secret_for(CipherAlgorithm::AesGcm)).await;
        assert_eq!(enc.blocks, 0);
        assert_eq!(tokio::fs::metadata(&files.sealed).await.unwrap().len(), HEADER_12 as u64);

        // No blocks means nothing is authenticated against the key.
        open(&c, &files, SecretInput::raw_key([0x01u8; 32])).await.unwrap();
        assert!(tokio::fs::read(&files.opened).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_reports_stages_and_serialises() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::XChaCha20Poly1305, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "snap");

        let enc = seal(&c, &files, &random_bytes(2 * BLOCK), secret_for(CipherAlgorithm::XChaCha20Poly1305)).await;
        assert_eq!(enc.direction, Direction::Encrypt);
        assert_eq!(enc.algorithm, CipherAlgorithm::XChaCha20Poly1305);
        assert!(enc.has_all_stages(&[
            Stage::KeyDerivation,
            Stage::Open,
            Stage::Header,
            Stage::Read,
            Stage::Encrypt,
            Stage::Write,
            Stage::Validate,
        ]));
        assert!(enc.sanity_check());
        assert_eq!(enc.bytes_overhead, (2 + 24 + 8 + 64 + 16 + 2 * TAG_LEN) as u64);

        let dec = open(&c, &files, secret_for(CipherAlgorithm::XChaCha20Poly1305)).await.unwrap();
        assert_eq!(dec.direction, Direction::Decrypt);
        assert!(dec.has_all_stages(&[Stage::Header, Stage::Decrypt, Stage::Validate]));
        let json = dec.to_json().unwrap();
        assert!(json.contains("\"direction\":\"decrypt\""));
    }

// ## 2️⃣ Tamper detection

    async fn sealed_aes(tag: &str, len: usize) -> (tempfile::TempDir, FileCryptor, Arc<MemoryAuditSink>, Files) {
        let dir = tempdir().unwrap();
        let (c, sink) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), tag);
        seal(&c, &files, &random_bytes(len), secret_for(CipherAlgorithm::AesGcm)).await;
        sink.clear();
        (dir, c, sink, files)
    }

    #[tokio::test]
    async fn ciphertext_bit_flip_fails_authentication() {
        let (_dir, c, sink, files) = sealed_aes("ct", 3 * BLOCK).await;
        flip_bit(&files.sealed, HEADER_12 + STRIDE + TAG_LEN + 7).await;

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.block_index(), Some(1));

        assert_eq!(
            sink.names(),
            vec![
                "operation_started",
                "input_opened",
                "header_read",
                "output_opened",
                "block_failed",
                "operation_failed"
            ]
        );
        let events = sink.events();
        assert!(matches!(
            &events[4],
            AuditEvent::BlockFailed { block_index: 1, kind: ErrorKind::AuthenticationFailure, .. }
        ));
    }

    #[tokio::test]
    async fn tag_bit_flip_fails_authentication() {
        let (_dir, c, _, files) = sealed_aes("tag", BLOCK + 10).await;
        flip_bit(&files.sealed, HEADER_12 + 3).await;

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.block_index(), Some(0));
    }

    #[tokio::test]
    async fn header_nonce_and_salt_flips_fail_header_integrity() {
        // nonce byte, then integrity salt byte
        for offset in [5, 2 + 12 + 8 + 20] {
            let (_dir, c, _, files) = sealed_aes("hdr", BLOCK).await;
            flip_bit(&files.sealed, offset).await;

            let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::HeaderIntegrity, "offset {offset}");
            // Nothing is written for an untrusted header.
            assert!(!files.opened.exists());
        }
    }

    #[tokio::test]
    async fn kdf_salt_flip_changes_the_password_key() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::ChaCha20Poly1305, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "kdf");
        seal(&c, &files, &random_bytes(100), SecretInput::password(PASSWORD)).await;
        flip_bit(&files.sealed, 2 + 12 + 8 + 64).await;

        let err = open(&c, &files, SecretInput::password(PASSWORD)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[tokio::test]
    async fn original_size_tamper_is_a_block_count_mismatch() {
        let (_dir, c, _, files) = sealed_aes("size", 3 * BLOCK + 100).await;
        // Adds 64 KiB to the declared size.
        flip_bit(&files.sealed, 2 + 12 + 2).await;

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    }

    #[tokio::test]
    async fn original_size_change_inside_the_last_sector_fails_authentication() {
        // 12388 -> 12389 and 12388 -> 12384: same block count, same padded sector.
        for mask in [0x01u8, 0x04] {
            let dir = tempdir().unwrap();
            let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Aligned);
            let files = Files::new(dir.path(), &format!("sector{mask}"));
            seal(&c, &files, &random_bytes(3 * BLOCK + 100), secret_for(CipherAlgorithm::AesGcm)).await;

            let mut bytes = tokio::fs::read(&files.sealed).await.unwrap();
            bytes[2 + 12] ^= mask;
            tokio::fs::write(&files.sealed, bytes).await.unwrap();

            let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthenticationFailure, "mask {mask:#04x}");
            assert_eq!(err.block_index(), Some(0));
        }
    }

    #[tokio::test]
    async fn swapped_blocks_fail_authentication() {
        let (_dir, c, _, files) = sealed_aes("swap", 3 * BLOCK).await;
        let mut bytes = tokio::fs::read(&files.sealed).await.unwrap();
        let (b0, b1) = (HEADER_12, HEADER_12 + STRIDE);
        let first: Vec<u8> = bytes[b0..b1].to_vec();
        bytes.copy_within(b1..b1 + STRIDE, b0);
        bytes[b1..b1 + STRIDE].copy_from_slice(&first);
        tokio::fs::write(&files.sealed, bytes).await.unwrap();

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.block_index(), Some(0));
    }

    #[tokio::test]
    async fn dropped_final_block_is_detected() {
        let (_dir, c, _, files) = sealed_aes("drop", 3 * BLOCK).await;
        let bytes = tokio::fs::read(&files.sealed).await.unwrap();
        tokio::fs::write(&files.sealed, &bytes[..bytes.len() - STRIDE]).await.unwrap();

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    }

    #[tokio::test]
    async fn partial_final_block_is_unexpected_eof() {
        let (_dir, c, _, files) = sealed_aes("cut", 3 * BLOCK + 100).await;
        let bytes = tokio::fs::read(&files.sealed).await.unwrap();
        tokio::fs::write(&files.sealed, &bytes[..bytes.len() - 10]).await.unwrap();

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(err.block_index(), Some(3));
    }

    #[tokio::test]
    async fn appended_bytes_are_detected() {
        for extra in [5usize, STRIDE] {
            let (_dir, c, _, files) = sealed_aes("tail", 3 * BLOCK + 100).await;
            let mut bytes = tokio::fs::read(&files.sealed).await.unwrap();
            bytes.extend(std::iter::repeat(0xEE).take(extra));
            tokio::fs::write(&files.sealed, bytes).await.unwrap();

            let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DataIntegrity, "extra {extra}");
        }
    }

    #[tokio::test]
    async fn container_shorter_than_header_is_rejected() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "short");
        tokio::fs::write(&files.sealed, [1u8, 0, 9, 9]).await.unwrap();

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    }

// ## 3️⃣ Version gate

    async fn patch_version(path: &std::path::Path, major: u8, minor: u8) {
        let mut bytes = tokio::fs::read(path).await.unwrap();
        bytes[0] = major;
        bytes[1] = minor;
        tokio::fs::write(path, bytes).await.unwrap();
    }

    #[tokio::test]
    async fn version_prefix_is_checked_first() {
        for (major, minor) in [(2, 0), (0, 0), (1, 1), (0, 2)] {
            let (_dir, c, _, files) = sealed_aes("ver", 100).await;
            patch_version(&files.sealed, major, minor).await;

            let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::VersionValidation, "{major}.{minor}");
        }
    }

    #[tokio::test]
    async fn pre_release_containers_still_open() {
        let (_dir, c, _, files) = sealed_aes("legacy", BLOCK + 1).await;
        patch_version(&files.sealed, 0, 1).await;

        let dec = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap();
        assert_eq!(dec.bytes_written, (BLOCK + 1) as u64);
    }

// ## 4️⃣ Secrets and configuration

    #[tokio::test]
    async fn aes_key_sizes_are_enforced_before_io() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);

        for len in [15usize, 17] {
            let files = Files::new(dir.path(), &format!("bad{len}"));
            tokio::fs::write(&files.plain, b"data").await.unwrap();
            let err = c
                .encrypt_file(&files.encrypt_instruction(), SecretInput::raw_key(vec![0u8; len]), &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidKeySize);
            assert!(!files.sealed.exists());
        }

        for len in [16usize, 24, 32] {
            let files = Files::new(dir.path(), &format!("ok{len}"));
            let data = random_bytes(BLOCK + 3);
            seal(&c, &files, &data, SecretInput::raw_key(vec![9u8; len])).await;
            open(&c, &files, SecretInput::raw_key(vec![9u8; len])).await.unwrap();
            assert_eq!(tokio::fs::read(&files.opened).await.unwrap(), data);
        }
    }

    #[tokio::test]
    async fn secret_kind_must_match_algorithm() {
        let dir = tempdir().unwrap();
        let files = Files::new(dir.path(), "mode");
        tokio::fs::write(&files.plain, b"data").await.unwrap();
        let cancel = CancellationToken::new();

        let (aes, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let err = aes
            .encrypt_file(&files.encrypt_instruction(), SecretInput::password(PASSWORD), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let (chacha, _) = cryptor(CipherAlgorithm::ChaCha20Poly1305, AlignmentMode::Unaligned);
        let err = chacha
            .encrypt_file(&files.encrypt_instruction(), SecretInput::raw_key([0u8; 32]), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn integrity_salt_width_must_match_between_writer_and_reader() {
        let dir = tempdir().unwrap();
        let files = Files::new(dir.path(), "width");
        let writer = FileCryptor::aes_gcm(light_config(AlignmentMode::Unaligned).with_integrity_salt_len(16)).unwrap();
        let reader = FileCryptor::aes_gcm(light_config(AlignmentMode::Unaligned)).unwrap();

        seal(&writer, &files, &random_bytes(3 * BLOCK), secret_for(CipherAlgorithm::AesGcm)).await;
        let err = open(&reader, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HeaderIntegrity);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let err = FileCryptor::chacha20_poly1305(light_config(AlignmentMode::Unaligned).with_payload_block_size(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error() {
        let dir = tempdir().unwrap();
        let (c, sink) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "missing");

        let err = c
            .encrypt_file(&files.encrypt_instruction(), secret_for(CipherAlgorithm::AesGcm), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(sink.names(), vec!["operation_started", "operation_failed"]);
    }

// ## 5️⃣ Cancellation, audit, notification, concurrency

    #[tokio::test]
    async fn cancelled_token_stops_before_any_io() {
        let dir = tempdir().unwrap();
        let (c, sink) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "cancel");
        tokio::fs::write(&files.plain, random_bytes(BLOCK)).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = c
            .encrypt_file(&files.encrypt_instruction(), secret_for(CipherAlgorithm::AesGcm), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!files.sealed.exists());
        assert_eq!(sink.names(), vec!["operation_failed"]);
        assert!(matches!(
            &sink.events()[0],
            AuditEvent::OperationFailed { kind: ErrorKind::Cancelled, direction: Direction::Encrypt, .. }
        ));
    }

    /// Cancels the operation as soon as the header is on disk.
    struct CancelAfterHeader {
        token: CancellationToken,
    }

    impl AuditSink for CancelAfterHeader {
        fn record(&self, event: &AuditEvent) {
            if matches!(event, AuditEvent::HeaderWritten { .. }) {
                self.token.cancel();
            }
        }
    }

    /// Every rented buffer came back (or was freed) and the idle count matches.
    fn assert_pool_settled(pool: &BufferPool, rented: u64) {
        let stats = pool.stats();
        assert_eq!(stats.rented, rented, "{stats:?}");
        assert_eq!(stats.rented, stats.returned + stats.discarded, "{stats:?}");
        assert_eq!(pool.idle() as u64, stats.returned - stats.reused, "{stats:?}");
    }

    #[tokio::test]
    async fn cancellation_mid_pipeline_returns_every_buffer() {
        let dir = tempdir().unwrap();
        let files = Files::new(dir.path(), "midcancel");
        tokio::fs::write(&files.plain, random_bytes(3 * BLOCK)).await.unwrap();

        let cancel = CancellationToken::new();
        let pool = Arc::new(BufferPool::new(8));
        let c = FileCryptor::aes_gcm(light_config(AlignmentMode::Unaligned))
            .unwrap()
            .with_audit_sink(Arc::new(CancelAfterHeader { token: cancel.clone() }))
            .with_buffer_pool(pool.clone());

        let err = c
            .encrypt_file(&files.encrypt_instruction(), secret_for(CipherAlgorithm::AesGcm), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        // io, output, tag region, header, nonce, salt
        assert_pool_settled(&pool, 6);
        assert_eq!(pool.idle(), 6);
    }

    #[tokio::test]
    async fn failed_decryption_returns_every_buffer() {
        let (_dir, _, _, files) = sealed_aes("poolfail", 3 * BLOCK).await;
        flip_bit(&files.sealed, HEADER_12 + 2 * STRIDE + TAG_LEN).await;

        let pool = Arc::new(BufferPool::new(8));
        let c = FileCryptor::aes_gcm(light_config(AlignmentMode::Unaligned))
            .unwrap()
            .with_buffer_pool(pool.clone());

        let err = open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.block_index(), Some(2));
        assert_pool_settled(&pool, 6);

        // A second failure reuses the same idle buffers.
        open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap_err();
        assert_pool_settled(&pool, 12);
        assert_eq!(pool.stats().reused, 6);
        assert_eq!(pool.idle(), 6);
    }

    #[tokio::test]
    async fn successful_operations_emit_phase_events() {
        let dir = tempdir().unwrap();
        let (c, sink) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let files = Files::new(dir.path(), "audit");

        seal(&c, &files, &random_bytes(BLOCK * 2), secret_for(CipherAlgorithm::AesGcm)).await;
        assert_eq!(
            sink.names(),
            vec!["operation_started", "input_opened", "output_opened", "header_written", "operation_completed"]
        );
        assert!(matches!(
            sink.events().last(),
            Some(AuditEvent::OperationCompleted { blocks: 2, direction: Direction::Encrypt, .. })
        ));

        sink.clear();
        open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap();
        assert_eq!(
            sink.names(),
            vec!["operation_started", "input_opened", "header_read", "output_opened", "operation_completed"]
        );
        assert!(sink.events().iter().all(|e| !e.is_failure()));
    }

    #[tokio::test]
    async fn notifier_runs_once_after_decryption() {
        let dir = tempdir().unwrap();
        let notifier = Arc::new(CountingNotifier::default());
        let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let c = c.with_notifier(notifier.clone());
        let files = Files::new(dir.path(), "notify");

        seal(&c, &files, &random_bytes(100), secret_for(CipherAlgorithm::AesGcm)).await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);

        open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap();
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn failing_notifier_does_not_fail_decryption() {
        let dir = tempdir().unwrap();
        let notifier = Arc::new(CountingNotifier { fail: true, ..Default::default() });
        let (c, _) = cryptor(CipherAlgorithm::AesGcm, AlignmentMode::Unaligned);
        let c = c.with_notifier(notifier.clone());
        let files = Files::new(dir.path(), "notify-fail");

        let data = random_bytes(BLOCK);
        seal(&c, &files, &data, secret_for(CipherAlgorithm::AesGcm)).await;
        open(&c, &files, secret_for(CipherAlgorithm::AesGcm)).await.unwrap();

        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(tokio::fs::read(&files.opened).await.unwrap(), data);
        assert!(logs_contain("post-write notification failed"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_operations_are_independent() {
        let dir = tempdir().unwrap();
        let (c, _) = cryptor(CipherAlgorithm::XChaCha20Poly1305, AlignmentMode::Aligned);

        let mut handles = Vec::new();
        for i in 0..8usize {
            let c = c.clone();
            let files = Files::new(dir.path(), &format!("par{i}"));
            handles.push(tokio::spawn(async move {
                let data = random_bytes(i * 1000 + 17);
                seal(&c, &files, &data, SecretInput::password(PASSWORD)).await;
                open(&c, &files, SecretInput::password(PASSWORD)).await.unwrap();
                assert_eq!(tokio::fs::read(&files.opened).await.unwrap(), data);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }
}

// ## 📂 File: `src/notify.rs`

//! Post-write notification hook.
//!
//! Called once after a successful decryption wrote its output. Failures are
//! logged at `warn` and otherwise ignored; the decryption already succeeded.

use std::path::Path;

pub trait PostWriteNotifier: Send + Sync {
    fn notify_written(&self, path: &Path) -> anyhow::Result<()>;
}

/// Logs the written path at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl PostWriteNotifier for LogNotifier {
    fn notify_written(&self, path: &Path) -> anyhow::Result<()> {
        tracing::debug!(path = %path.display(), "decrypted output written");
        Ok(())
    }
}

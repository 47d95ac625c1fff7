// ## 📂 File: `src/stream/io.rs`
// ## Async source/destination streams shaped by the policy's open mode

use std::io;
use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::stream::alignment::OpenMode;

pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Opened source stream and its length at open time.
pub struct Source {
    pub reader: BoxedReader,
    pub len: u64,
}

/// Opened destination stream.
pub struct Destination {
    pub writer: BoxedWriter,
    /// Second handle on the same file, kept only for write-through syncs.
    sync_handle: Option<File>,
}

impl Destination {
    /// Flush buffered bytes and, under write-through, force them to the device.
    pub async fn finish(&mut self) -> io::Result<()> {
        self.writer.flush().await?;
        if let Some(f) = &self.sync_handle {
            f.sync_all().await?;
        }
        Ok(())
    }
}

pub async fn open_source(path: &Path, mode: OpenMode, buffer_capacity: usize) -> io::Result<Source> {
    let file = File::open(path).await?;
    let len = file.metadata().await?.len();

    let reader: BoxedReader = if mode.contains(OpenMode::BUFFERED) {
        Box::new(BufReader::with_capacity(buffer_capacity, file))
    } else {
        Box::new(file)
    };
    Ok(Source { reader, len })
}

/// Create (or truncate) the destination.
pub async fn open_destination(path: &Path, mode: OpenMode, buffer_capacity: usize) -> io::Result<Destination> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;

    let sync_handle = if mode.contains(OpenMode::WRITE_THROUGH) {
        Some(file.try_clone().await?)
    } else {
        None
    };

    let writer: BoxedWriter = if mode.contains(OpenMode::BUFFERED) {
        Box::new(BufWriter::with_capacity(buffer_capacity, file))
    } else {
        Box::new(file)
    };
    Ok(Destination { writer, sync_handle })
}

/// Fill `buf` until it is full or the reader hits EOF. Returns bytes read.
pub async fn read_exact_or_eof<R>(r: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut off = 0;
    while off < buf.len() {
        let n = r.read(&mut buf[off..]).await?;
        if n == 0 {
            break;
        }
        off += n;
    }
    Ok(off)
}

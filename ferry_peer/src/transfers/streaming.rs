use std::{io, path::Path, time::Duration};

use ferry_core_lib::{FerryError, Result};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Complete,
    /// Nothing arrived within the stall timeout.
    Stalled { received: u64 },
}

/// Copies exactly `file_size` bytes from `reader` into `writer`, starting with
/// any bytes already read past the request frame. Every read is bounded by
/// `stall_timeout`, so the watchdog restarts with each chunk.
#[allow(clippy::too_many_arguments)]
pub async fn receive_file_bytes<R, W, F>(
    reader: &mut R,
    leftover: Vec<u8>,
    writer: &mut W,
    file_size: u64,
    buffer_size: usize,
    stall_timeout: Duration,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<ReceiveOutcome>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(u64),
{
    let mut received: u64 = 0;

    if !leftover.is_empty() {
        let take = (leftover.len() as u64).min(file_size) as usize;
        writer.write_all(&leftover[..take]).await?;
        received += take as u64;
        on_progress(received);
    }

    let mut buffer = vec![0_u8; buffer_size.max(1)];

    while received < file_size {
        let wanted = (file_size - received).min(buffer.len() as u64) as usize;

        let read = tokio::select! {
            _ = cancel.cancelled() => return Err(FerryError::Cancelled),
            read = timeout(stall_timeout, reader.read(&mut buffer[..wanted])) => read,
        };

        let read = match read {
            Ok(read) => read?,
            Err(_) => {
                writer.flush().await?;
                debug!("No bytes for {:?} after {} of {}", stall_timeout, received, file_size);
                return Ok(ReceiveOutcome::Stalled { received });
            }
        };

        if read == 0 {
            return Err(FerryError::SocketFailure(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection closed after {} of {} bytes", received, file_size),
            )));
        }

        writer.write_all(&buffer[..read]).await?;
        received += read as u64;
        on_progress(received);
    }

    writer.flush().await?;
    Ok(ReceiveOutcome::Complete)
}

/// Streams the file at `path` in `buffer_size` chunks. `on_progress` gets the
/// bytes sent so far and the chunk count. Returns the number of bytes sent.
pub async fn send_file_bytes<W, F>(
    writer: &mut W,
    path: &Path,
    file_size: u64,
    buffer_size: usize,
    write_timeout: Duration,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
    F: FnMut(u64, u64),
{
    let mut file = File::open(path).await?;
    let mut buffer = vec![0_u8; buffer_size.max(1)];
    let mut sent: u64 = 0;
    let mut chunks: u64 = 0;

    while sent < file_size {
        let wanted = (file_size - sent).min(buffer.len() as u64) as usize;
        let read = file.read(&mut buffer[..wanted]).await?;
        if read == 0 {
            return Err(FerryError::SocketFailure(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} shrank to {} bytes while sending", path.display(), sent),
            )));
        }

        let written = tokio::select! {
            _ = cancel.cancelled() => return Err(FerryError::Cancelled),
            written = timeout(write_timeout, writer.write_all(&buffer[..read])) => written,
        };
        written.map_err(|_| {
            FerryError::SocketFailure(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("peer stopped reading after {} bytes", sent),
            ))
        })??;

        sent += read as u64;
        chunks += 1;
        on_progress(sent, chunks);
    }

    writer.flush().await?;
    Ok(sent)
}

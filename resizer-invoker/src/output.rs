//! Delegate output buffering

use crate::error::ResizeError;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks read from the delegate's stdout, kept in arrival order
#[derive(Debug)]
pub struct OutputBuffer {
    chunks: Vec<Bytes>,
    len: usize,
    limit: usize,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
            limit,
        }
    }

    /// Append a chunk, failing once the total would pass the limit
    pub fn push(&mut self, chunk: Bytes) -> Result<(), ResizeError> {
        let len = self
            .len
            .checked_add(chunk.len())
            .filter(|len| *len <= self.limit)
            .ok_or(ResizeError::BufferLimitExceeded { limit: self.limit })?;

        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        self.len = len;
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Combine every chunk into one contiguous buffer
    pub fn finish(self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            1 => self.chunks.into_iter().next().unwrap_or_default(),
            _ => {
                let mut combined = BytesMut::with_capacity(self.len);
                for chunk in &self.chunks {
                    combined.extend_from_slice(chunk);
                }
                combined.freeze()
            }
        }
    }
}

/// Read `reader` to EOF into an [`OutputBuffer`]
pub async fn drain<R>(mut reader: R, limit: usize) -> Result<OutputBuffer, ResizeError>
where
    R: AsyncRead + Unpin,
{
    let mut output = OutputBuffer::new(limit);

    loop {
        let mut chunk = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let n = reader
            .read_buf(&mut chunk)
            .await
            .map_err(ResizeError::Stream)?;

        if n == 0 {
            break;
        }

        output.push(chunk.freeze())?;
    }

    debug!(
        bytes = output.len(),
        chunks = output.chunk_count(),
        "Received end of delegate output"
    );

    Ok(output)
}

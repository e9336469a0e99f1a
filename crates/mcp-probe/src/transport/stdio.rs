//! Stdio transport — writes JSON lines to the server's stdin, reads from its stdout.
//!
//! Generic over the reader/writer pair so the same code drives a child
//! process, an in-memory duplex pipe, or any other byte stream.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::{ProbeError, ProbeResult};

/// Outcome of a single line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Eof,
    TimedOut,
}

pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Write one framed message and flush it.
    pub async fn write_frame(&mut self, framed: &str) -> ProbeResult<()> {
        self.writer
            .write_all(framed.as_bytes())
            .await
            .map_err(ProbeError::Io)?;
        self.writer.flush().await.map_err(ProbeError::Io)?;
        Ok(())
    }

    /// Read exactly one line. A zero-byte read is end of stream.
    pub async fn read_line(&mut self, timeout: Option<Duration>) -> ProbeResult<LineRead> {
        self.line.clear();

        let read = self.reader.read_line(&mut self.line);
        let bytes_read = match timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(result) => result.map_err(ProbeError::Io)?,
                Err(_) => return Ok(LineRead::TimedOut),
            },
            None => read.await.map_err(ProbeError::Io)?,
        };

        if bytes_read == 0 {
            return Ok(LineRead::Eof);
        }

        Ok(LineRead::Line(self.line.clone()))
    }

    /// Shut down the write half, signalling EOF to the server.
    pub async fn close(&mut self) -> ProbeResult<()> {
        self.writer.shutdown().await.map_err(ProbeError::Io)
    }
}

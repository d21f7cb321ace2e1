//! `Content-Length` framing for JSON-RPC over stdio.
//!
//! Each message is `Content-Length: N\r\n` (plus optional other headers),
//! an empty line, then exactly N bytes of JSON.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Frames larger than this (4 MiB) are rejected before allocating.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Reads framed JSON messages from the client.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    header: String,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            header: String::new(),
        }
    }

    /// Next message, or `Ok(None)` on a clean EOF between frames.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>> {
        let Some(length) = self.read_content_length().await? else {
            return Ok(None);
        };
        if length > MAX_FRAME_BYTES {
            bail!("Content-Length {length} exceeds maximum {MAX_FRAME_BYTES}");
        }

        let mut body = vec![0u8; length];
        self.reader
            .read_exact(&mut body)
            .await
            .context("reading frame body")?;
        let value = serde_json::from_slice(&body).context("parsing JSON-RPC frame")?;
        Ok(Some(value))
    }

    async fn read_content_length(&mut self) -> Result<Option<usize>> {
        let mut length = None;
        let mut first = true;

        loop {
            self.header.clear();
            let read = self
                .reader
                .read_line(&mut self.header)
                .await
                .context("reading header line")?;
            if read == 0 {
                if first {
                    return Ok(None);
                }
                bail!("unexpected EOF while reading headers");
            }
            first = false;

            let line = self.header.trim();
            if line.is_empty() {
                return length
                    .map(Some)
                    .context("missing Content-Length header");
            }
            if let Some(value) = content_length_value(line) {
                length = Some(value.parse().context("invalid Content-Length value")?);
            }
        }
    }
}

/// Value of a `Content-Length` header line, matched case-insensitively.
fn content_length_value(line: &str) -> Option<&str> {
    let (key, value) = line.split_once(':')?;
    key.trim()
        .eq_ignore_ascii_case("Content-Length")
        .then(|| value.trim())
}

/// Writes framed JSON messages to the client.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        let body = serde_json::to_vec(msg).context("serializing JSON-RPC frame")?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer
            .write_all(header.as_bytes())
            .await
            .context("writing frame header")?;
        self.writer
            .write_all(&body)
            .await
            .context("writing frame body")?;
        self.writer.flush().await.context("flushing frame")?;
        Ok(())
    }
}

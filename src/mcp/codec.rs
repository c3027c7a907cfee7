//! Message framing for the stdio transport.
//!
//! Frame format: one JSON-RPC message per line, UTF-8, terminated by `\n`.
//! Messages must not contain embedded newlines.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// One inbound frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// A complete message, without its trailing newline.
    Message(Vec<u8>),
    /// A line longer than the configured limit; its bytes were discarded.
    TooLarge,
}

/// Read one frame from the stream.
///
/// Returns `None` on clean EOF. Blank lines are skipped.
pub async fn read_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_message_bytes: usize,
) -> std::io::Result<Option<Frame>> {
    loop {
        let mut buf = Vec::new();
        let limit = max_message_bytes as u64 + 1;
        let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if buf.len() > max_message_bytes {
            discard_line(reader).await?;
            return Ok(Some(Frame::TooLarge));
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        return Ok(Some(Frame::Message(buf)));
    }
}

/// Skip the remainder of an oversized line.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Write one message followed by a newline, then flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &serde_json::Value,
) -> std::io::Result<()> {
    let mut payload = serde_json::to_vec(message)?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

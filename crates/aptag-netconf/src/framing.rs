// NETCONF message framing (RFC 6242)
//
// base:1.0 sessions delimit messages with the `]]>]]>` end-of-message
// marker. base:1.1 sessions use chunked framing: one or more
// `\n#<len>\n<data>` chunks terminated by `\n##\n`. The `<hello>`
// exchange always uses end-of-message framing; the session switches to
// chunked framing afterwards when both peers advertise base:1.1.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::Error;

/// End-of-message delimiter for base:1.0 framing.
pub const EOM_MARKER: &[u8] = b"]]>]]>";

/// Upper bound on a single buffered message. Controllers reply with small
/// documents for edit-config and save-config; anything larger is a framing
/// fault.
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Largest chunk size allowed by RFC 6242 (4294967295) has ten digits.
const MAX_CHUNK_DIGITS: usize = 10;

const READ_BUF: usize = 8 * 1024;

/// Which framing mechanism the session currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `]]>]]>`-delimited messages (base:1.0, and always for `<hello>`).
    EndOfMessage,
    /// Chunked messages (base:1.1).
    Chunked,
}

/// A byte stream carrying framed NETCONF messages.
pub struct FramedStream<S> {
    stream: S,
    framing: Framing,
    buf: Vec<u8>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            framing: Framing::EndOfMessage,
            buf: Vec::with_capacity(READ_BUF),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn set_framing(&mut self, framing: Framing) {
        trace!(?framing, "switching framing");
        self.framing = framing;
    }

    /// Write one message using the current framing and flush it.
    pub async fn send(&mut self, message: &str) -> Result<(), Error> {
        let frame = encode(self.framing, message.as_bytes());
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read until one complete message is available and return it as text.
    pub async fn recv(&mut self) -> Result<String, Error> {
        loop {
            let decoded = match self.framing {
                Framing::EndOfMessage => take_eom(&mut self.buf),
                Framing::Chunked => take_chunked(&mut self.buf)?,
            };
            if let Some(message) = decoded {
                return String::from_utf8(message)
                    .map_err(|e| Error::Framing(format!("message is not UTF-8: {e}")));
            }

            if self.buf.len() > MAX_MESSAGE_BYTES {
                return Err(Error::Framing(format!(
                    "message exceeds {MAX_MESSAGE_BYTES} bytes"
                )));
            }

            let mut chunk = [0u8; READ_BUF];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::SessionClosed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Shut down the write half of the underlying stream.
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Encode a message body with the given framing.
pub fn encode(framing: Framing, body: &[u8]) -> Vec<u8> {
    match framing {
        Framing::EndOfMessage => {
            let mut out = Vec::with_capacity(body.len() + EOM_MARKER.len());
            out.extend_from_slice(body);
            out.extend_from_slice(EOM_MARKER);
            out
        }
        Framing::Chunked => {
            let header = format!("\n#{}\n", body.len());
            let mut out = Vec::with_capacity(header.len() + body.len() + 4);
            out.extend_from_slice(header.as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\n##\n");
            out
        }
    }
}

/// Pop one end-of-message delimited message off the front of `buf`.
fn take_eom(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buf
        .windows(EOM_MARKER.len())
        .position(|w| w == EOM_MARKER)?;
    let message = buf[..pos].to_vec();
    buf.drain(..pos + EOM_MARKER.len());
    Some(message)
}

/// Pop one chunked message off the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed. The buffer is only
/// consumed once the terminating `\n##\n` has been seen.
fn take_chunked(buf: &mut Vec<u8>) -> Result<Option<Vec<u8>>, Error> {
    let mut pos = 0;
    let mut message = Vec::new();

    loop {
        let rest = &buf[pos..];
        if rest.len() < 4 {
            return Ok(None);
        }
        if !rest.starts_with(b"\n#") {
            return Err(Error::Framing("expected chunk header".into()));
        }

        if rest[2] == b'#' {
            if rest[3] != b'\n' {
                return Err(Error::Framing("malformed end-of-chunks marker".into()));
            }
            buf.drain(..pos + 4);
            return Ok(Some(message));
        }

        let Some(newline) = rest[2..].iter().position(|b| *b == b'\n') else {
            if rest.len() > 2 + MAX_CHUNK_DIGITS {
                return Err(Error::Framing("chunk size too long".into()));
            }
            return Ok(None);
        };
        if newline == 0 || newline > MAX_CHUNK_DIGITS {
            return Err(Error::Framing("invalid chunk size".into()));
        }

        let digits = std::str::from_utf8(&rest[2..2 + newline])
            .map_err(|_| Error::Framing("chunk size is not ASCII".into()))?;
        let size: usize = digits
            .parse()
            .map_err(|_| Error::Framing(format!("invalid chunk size '{digits}'")))?;
        if size == 0 {
            return Err(Error::Framing("zero-length chunk".into()));
        }

        let start = 2 + newline + 1;
        if rest.len() < start + size {
            return Ok(None);
        }
        message.extend_from_slice(&rest[start..start + size]);
        pos += start + size;

        if message.len() > MAX_MESSAGE_BYTES {
            return Err(Error::Framing(format!(
                "message exceeds {MAX_MESSAGE_BYTES} bytes"
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn eom_waits_for_full_marker() {
        let mut buf = b"<hello/>]]>]]".to_vec();
        assert!(take_eom(&mut buf).is_none());

        buf.extend_from_slice(b">");
        assert_eq!(take_eom(&mut buf).unwrap(), b"<hello/>");
        assert!(buf.is_empty());
    }

    #[test]
    fn eom_keeps_trailing_bytes() {
        let mut buf = b"<a/>]]>]]><b/>".to_vec();
        assert_eq!(take_eom(&mut buf).unwrap(), b"<a/>");
        assert_eq!(buf, b"<b/>");
    }

    #[test]
    fn chunked_joins_multiple_chunks() {
        let mut buf = b"\n#4\n<rpc\n#3\n/>x\n##\n".to_vec();
        assert_eq!(take_chunked(&mut buf).unwrap().unwrap(), b"<rpc/>x");
        assert!(buf.is_empty());
    }

    #[test]
    fn chunked_incomplete_leaves_buffer_untouched() {
        let mut buf = b"\n#10\n<rpc".to_vec();
        assert!(take_chunked(&mut buf).unwrap().is_none());
        assert_eq!(buf, b"\n#10\n<rpc");
    }

    #[test]
    fn chunked_rejects_garbage_header() {
        let mut buf = b"<rpc/>\n##\n".to_vec();
        assert!(take_chunked(&mut buf).is_err());
    }

    #[test]
    fn chunked_rejects_zero_size() {
        let mut buf = b"\n#0\n\n##\n".to_vec();
        assert!(take_chunked(&mut buf).is_err());
    }

    #[test]
    fn encode_chunked_matches_rfc_layout() {
        assert_eq!(encode(Framing::Chunked, b"<ok/>"), b"\n#5\n<ok/>\n##\n");
        assert_eq!(encode(Framing::EndOfMessage, b"<ok/>"), b"<ok/>]]>]]>");
    }

    #[tokio::test]
    async fn recv_handles_message_split_across_reads() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut framed = FramedStream::new(client);
        framed.set_framing(Framing::Chunked);

        let writer = tokio::spawn(async move {
            server.write_all(b"\n#6\n<ok").await.unwrap();
            server.flush().await.unwrap();
            tokio::task::yield_now().await;
            server.write_all(b"/>\n\n##\n").await.unwrap();
            server
        });

        assert_eq!(framed.recv().await.unwrap(), "<ok/>\n");
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn eom_message_split_across_reads() {
        let mock = tokio_test::io::Builder::new()
            .write(b"<hello/>]]>]]>")
            .read(b"<hello><session-id>4</sess")
            .read(b"ion-id></hello>]]")
            .read(b">]]>")
            .build();
        let mut framed = FramedStream::new(mock);

        framed.send("<hello/>").await.unwrap();
        assert_eq!(
            framed.recv().await.unwrap(),
            "<hello><session-id>4</session-id></hello>"
        );
    }

    #[tokio::test]
    async fn recv_reports_closed_stream() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut framed = FramedStream::new(client);
        assert!(matches!(framed.recv().await, Err(Error::SessionClosed)));
    }
}

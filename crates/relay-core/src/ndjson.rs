//! Newline-delimited JSON framing for the engine's streaming endpoints.
//!
//! Both `/api/pull` and `/api/chat` answer with one JSON object per line.
//! Network chunks do not respect line boundaries (nor UTF-8 boundaries), so
//! bytes are buffered until a full line is available.

use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use thiserror::Error;

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Longest line accepted from the engine. Real events are a few hundred bytes.
pub(crate) const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub(crate) enum LineError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("line exceeds {0} bytes without a terminator")]
    TooLong(usize),
}

/// Splits an append-only byte buffer into non-blank lines.
#[derive(Debug, Default)]
pub(crate) struct NdjsonFramer {
    buf: BytesMut,
    /// Bytes of `buf` already known to hold no `\n`.
    scanned: usize,
}

impl NdjsonFramer {
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Next complete line, without its terminator. Blank lines are skipped.
    pub fn next_line(&mut self) -> Option<Bytes> {
        loop {
            let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
                self.scanned = self.buf.len();
                return None;
            };
            let pos = self.scanned + offset;
            self.scanned = 0;

            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }
            if !is_blank(&line) {
                return Some(line.freeze());
            }
        }
    }

    /// Whatever is left once the peer stops sending, if it is not blank.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        let rest = self.buf.split();
        (!is_blank(&rest)).then(|| rest.freeze())
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Pulls lines out of a streamed HTTP body.
///
/// Dropping the reader drops the body, which releases the connection.
pub(crate) struct LineReader {
    inner: ByteStream,
    framer: NdjsonFramer,
    max_line: usize,
    eof: bool,
}

impl LineReader {
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self::with_max_line(inner, MAX_LINE_BYTES)
    }

    pub fn with_max_line<S>(inner: S, max_line: usize) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            framer: NdjsonFramer::default(),
            max_line,
            eof: false,
        }
    }

    pub fn from_response(resp: reqwest::Response) -> Self {
        Self::new(resp.bytes_stream())
    }

    /// `None` once the body is exhausted. A transport error or an overlong
    /// line is returned once and ends the reader.
    pub async fn next_line(&mut self) -> Option<Result<Bytes, LineError>> {
        loop {
            if let Some(line) = self.framer.next_line() {
                return Some(Ok(line));
            }
            if self.eof {
                return None;
            }
            if self.framer.pending() > self.max_line {
                self.eof = true;
                return Some(Err(LineError::TooLong(self.max_line)));
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.framer.push(&chunk),
                Some(Err(e)) => {
                    self.eof = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.eof = true;
                    return self.framer.finish().map(Ok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(chunks: &[&'static str]) -> LineReader {
        let items: Vec<Result<Bytes, reqwest::Error>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        LineReader::new(futures::stream::iter(items))
    }

    async fn drain(mut r: LineReader) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = r.next_line().await {
            out.push(String::from_utf8(line.unwrap().to_vec()).unwrap());
        }
        out
    }

    #[test]
    fn framer_skips_blank_lines_and_strips_cr() {
        let mut f = NdjsonFramer::default();
        f.push(b"{\"a\":1}\r\n\n  \n{\"b\":2}\n{\"c\"");
        assert_eq!(f.next_line().as_deref(), Some(&b"{\"a\":1}"[..]));
        assert_eq!(f.next_line().as_deref(), Some(&b"{\"b\":2}"[..]));
        assert_eq!(f.next_line(), None);
        assert_eq!(f.finish().as_deref(), Some(&b"{\"c\""[..]));
        assert_eq!(f.finish(), None);
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_joined() {
        let lines = drain(reader(&["{\"status\":\"down", "loading\"}\n{\"st", "atus\":\"success\"}\n"])).await;
        assert_eq!(lines, vec![r#"{"status":"downloading"}"#, r#"{"status":"success"}"#]);
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_returned() {
        let lines = drain(reader(&["{\"a\":1}\n{\"b\":2}"])).await;
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn partial_line_is_kept_across_pushes() {
        let mut f = NdjsonFramer::default();
        f.push(b"{\"a\":");
        assert_eq!(f.next_line(), None);
        f.push(b"1");
        assert_eq!(f.next_line(), None);
        assert_eq!(f.pending(), 6);
        f.push(b"}\n{\"b\":2}\n");
        assert_eq!(f.next_line().as_deref(), Some(&b"{\"a\":1}"[..]));
        assert_eq!(f.next_line().as_deref(), Some(&b"{\"b\":2}"[..]));
        assert_eq!(f.pending(), 0);
    }

    #[tokio::test]
    async fn unterminated_line_over_the_limit_is_an_error() {
        let items: Vec<Result<Bytes, reqwest::Error>> =
            std::iter::repeat_with(|| Ok(Bytes::from_static(b"xxxxxxxx"))).take(4).collect();
        let mut r = LineReader::with_max_line(futures::stream::iter(items), 16);

        let err = r.next_line().await.unwrap().unwrap_err();
        assert!(matches!(err, LineError::TooLong(16)));
        assert!(err.to_string().contains("16 bytes"));
        assert!(r.next_line().await.is_none());
    }

    #[tokio::test]
    async fn lines_at_the_limit_pass() {
        let items: Vec<Result<Bytes, reqwest::Error>> =
            vec![Ok(Bytes::from_static(b"0123456789")), Ok(Bytes::from_static(b"\n"))];
        let lines = drain(LineReader::with_max_line(futures::stream::iter(items), 10)).await;
        assert_eq!(lines, vec!["0123456789"]);
    }

    #[tokio::test]
    async fn multibyte_characters_survive_chunk_split() {
        // "é" is 0xC3 0xA9; split it across two network chunks.
        let items: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from_static(b"{\"t\":\"caf\xC3")),
            Ok(Bytes::from_static(b"\xA9\"}\n")),
        ];
        let lines = drain(LineReader::new(futures::stream::iter(items))).await;
        assert_eq!(lines, vec!["{\"t\":\"café\"}"]);
    }
}

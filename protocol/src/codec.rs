//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Tokio line codec

use crate::ProtocolError;
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};
use tracing::warn;

/// Default upper bound for a single line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Newline-delimited text codec
///
/// Splits on `\n` with [`AnyDelimiterCodec`] and strips a trailing `\r`. Incoming bytes that
/// are not valid UTF-8 are replaced with U+FFFD rather than failing the stream, and an
/// over-long incoming line is discarded with a warning. Outgoing lines longer than the limit,
/// or containing a line terminator, are rejected so a peer using the same limit never has to
/// discard them.
#[derive(Debug, Clone)]
pub struct LineCodec {
    inner: AnyDelimiterCodec,
    max_length: usize,
    discarded: u64,
}

impl LineCodec {
    /// Create a codec with the default maximum line length
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a codec with the given maximum line length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                max_length,
            ),
            max_length,
            discarded: 0,
        }
    }

    /// Maximum line length, in bytes, excluding the terminator
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Number of incoming lines dropped for exceeding the maximum length
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn recover(&mut self, result: Result<Option<Bytes>, AnyDelimiterCodecError>) -> RecoverStep {
        match result {
            Ok(chunk) => RecoverStep::Done(Ok(chunk.map(|chunk| to_line(&chunk)))),
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                self.discarded += 1;
                warn!(max_length = self.max_length, "Discarding over-long line");
                RecoverStep::Retry
            }
            Err(AnyDelimiterCodecError::Io(e)) => RecoverStep::Done(Err(ProtocolError::Io(e))),
        }
    }
}

enum RecoverStep {
    Done(Result<Option<String>, ProtocolError>),
    Retry,
}

fn to_line(chunk: &[u8]) -> String {
    let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    match std::str::from_utf8(chunk) {
        Ok(line) => line.to_string(),
        Err(_) => {
            warn!("Replacing invalid UTF-8 in incoming line");
            String::from_utf8_lossy(chunk).into_owned()
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            // After an overflow the inner codec skips to the next newline on its own.
            let result = self.inner.decode(src);
            if let RecoverStep::Done(done) = self.recover(result) {
                return done;
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let result = self.inner.decode_eof(src);
            if let RecoverStep::Done(done) = self.recover(result) {
                return done;
            }
        }
    }
}

impl<T> Encoder<T> for LineCodec
where
    T: AsRef<str>,
{
    type Error = ProtocolError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = line.as_ref();
        if line.contains(['\n', '\r']) {
            return Err(ProtocolError::EmbeddedNewline);
        }
        if line.len() > self.max_length {
            return Err(ProtocolError::LineTooLong(self.max_length));
        }
        self.inner.encode(line, dst).map_err(|error| match error {
            AnyDelimiterCodecError::Io(e) => ProtocolError::Io(e),
            AnyDelimiterCodecError::MaxChunkLengthExceeded => {
                ProtocolError::LineTooLong(self.max_length)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn decode_all(codec: &mut LineCodec, buffer: &mut BytesMut) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = codec.decode(buffer).unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_decode_lines() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from("first\nsecond\r\nthird");
        assert_eq!(decode_all(&mut codec, &mut buffer), vec!["first", "second"]);
        assert_eq!(&buffer[..], b"third");

        assert_eq!(
            codec.decode_eof(&mut buffer).unwrap(),
            Some("third".to_string())
        );
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    #[traced_test]
    fn test_over_long_line_is_skipped() {
        let mut codec = LineCodec::with_max_length(8);
        let mut buffer = BytesMut::from("this line is far too long\nok\n");
        assert_eq!(decode_all(&mut codec, &mut buffer), vec!["ok"]);
        assert_eq!(codec.discarded(), 1);
        assert!(logs_contain("Discarding over-long line"));
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut codec = LineCodec::with_max_length(4);
        let mut buffer = BytesMut::from("abcd\nabcde\nxy\n");
        assert_eq!(decode_all(&mut codec, &mut buffer), vec!["abcd", "xy"]);
        assert_eq!(codec.discarded(), 1);
    }

    #[test]
    #[traced_test]
    fn test_invalid_utf8_is_replaced() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from(&b"caf\xe9\nnext\n"[..]);
        assert_eq!(decode_all(&mut codec, &mut buffer), vec!["caf\u{fffd}", "next"]);
        assert!(logs_contain("Replacing invalid UTF-8"));
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode("GLOBAL: hi", &mut buffer).unwrap();
        codec.encode(String::from("KICK"), &mut buffer).unwrap();
        assert_eq!(&buffer[..], b"GLOBAL: hi\nKICK\n");
    }

    #[test]
    fn test_encode_rejects_embedded_newline() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::new();
        assert!(matches!(
            codec.encode("two\nlines", &mut buffer),
            Err(ProtocolError::EmbeddedNewline)
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_encode_rejects_over_long_line() {
        let mut codec = LineCodec::with_max_length(4);
        let mut buffer = BytesMut::new();
        codec.encode("abcd", &mut buffer).unwrap();
        assert!(matches!(
            codec.encode("abcde", &mut buffer),
            Err(ProtocolError::LineTooLong(4))
        ));
        assert_eq!(&buffer[..], b"abcd\n");
    }
}

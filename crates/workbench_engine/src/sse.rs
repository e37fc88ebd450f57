use encoding_rs::{CoderResult, Decoder, UTF_8};

pub const DATA_PREFIX: &str = "data: ";

/// Incremental `text/event-stream` reader yielding `data:` payloads.
///
/// Bytes may be split anywhere, including inside a multi-byte character or
/// a line; only complete lines are ever yielded.
pub struct SseDecoder {
    decoder: Decoder,
    pending: String,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            pending: String::new(),
        }
    }

    /// Feeds one network read and returns the payloads of lines it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.decode(bytes, false);
        self.drain_complete_lines()
    }

    /// Ends the stream. A trailing line without `\n` is not yielded; it is
    /// returned so the caller can report what was dropped.
    pub fn finish(mut self) -> Option<String> {
        self.decode(&[], true);
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending)
        }
    }

    fn decode(&mut self, mut src: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len() * 3 + 4);
            self.pending.reserve(needed);
            let (result, read, _had_errors) =
                self.decoder.decode_to_string(src, &mut self.pending, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let complete: String = self.pending.drain(..=last_newline).collect();
        complete
            .split('\n')
            .filter_map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                let payload = line.strip_prefix(DATA_PREFIX)?;
                (!payload.trim().is_empty()).then(|| payload.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_only_data_lines() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b": keepalive\nevent: x\ndata: {\"a\":1}\n\ndata: \n");
        assert_eq!(out, vec!["{\"a\":1}"]);
    }

    #[test]
    fn holds_back_partial_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"chu").is_empty());
        assert_eq!(decoder.push(b"nk\":\"x\"}\n"), vec!["{\"chunk\":\"x\"}"]);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push(b"data: 1\r\ndata: 2\r\n"), vec!["1", "2"]);
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let bytes = "data: 翻譯\n".as_bytes();
        let mut decoder = SseDecoder::new();
        // Split inside the first CJK character (3 bytes each).
        assert!(decoder.push(&bytes[..7]).is_empty());
        assert_eq!(decoder.push(&bytes[7..]), vec!["翻譯"]);
    }

    #[test]
    fn trailing_partial_line_is_discarded() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push(b"data: 1\ndata: {\"done\""), vec!["1"]);
        assert_eq!(decoder.finish().as_deref(), Some("data: {\"done\""));
    }

    #[test]
    fn clean_end_has_nothing_to_discard() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: 1\n");
        assert_eq!(decoder.finish(), None);
    }
}

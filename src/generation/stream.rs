//! Reassembly of a newline-delimited JSON generation stream.
//!
//! Bytes arrive in arbitrary network chunks. [`StreamAssembler`] buffers them
//! into lines, parses each line as a JSON object, appends any text fragment it
//! carries, and latches once a chunk reports `"done": true`.

use serde_json::Value;

/// Field that marks the final chunk of a stream.
pub const DONE_FIELD: &str = "done";

#[derive(Debug)]
pub struct StreamAssembler {
    fragment_fields: Vec<String>,
    pending: Vec<u8>,
    text: String,
    done: bool,
    skipped: usize,
}

impl StreamAssembler {
    /// `fragment_fields` are checked in order; the first one holding a
    /// non-empty string supplies the chunk's fragment.
    pub fn new<S: AsRef<str>>(fragment_fields: &[S]) -> Self {
        Self {
            fragment_fields: fragment_fields.iter().map(|f| f.as_ref().to_string()).collect(),
            pending: Vec::new(),
            text: String::new(),
            done: false,
            skipped: 0,
        }
    }

    /// Feed raw bytes. Returns `true` once the completion chunk has been seen;
    /// anything fed after that is ignored.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if self.done {
            return true;
        }
        let mut buf = std::mem::take(&mut self.pending);
        // carried-over bytes never contain a newline
        let mut scan = buf.len();
        buf.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(offset) = buf[scan..].iter().position(|&b| b == b'\n') {
            let end = scan + offset;
            self.accept_line(&buf[start..end]);
            start = end + 1;
            scan = start;
            if self.done {
                return true;
            }
        }

        buf.drain(..start);
        self.pending = buf;
        false
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Lines that were not JSON objects.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// End of input: process a trailing unterminated line and return the trimmed text.
    pub fn finish(mut self) -> String {
        if !self.done && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.accept_line(&line);
        }
        self.text.trim().to_string()
    }

    fn accept_line(&mut self, line: &[u8]) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            return;
        }

        let chunk = match serde_json::from_slice::<Value>(line) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                self.skipped += 1;
                tracing::debug!(
                    line = %String::from_utf8_lossy(line),
                    "skipping non-object stream line"
                );
                return;
            }
        };

        let fragment = self
            .fragment_fields
            .iter()
            .filter_map(|field| chunk.get(field).and_then(Value::as_str))
            .find(|s| !s.is_empty());
        if let Some(fragment) = fragment {
            self.text.push_str(fragment);
        }

        if chunk.get(DONE_FIELD).and_then(Value::as_bool) == Some(true) {
            self.done = true;
        }
    }
}

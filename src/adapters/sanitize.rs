//! Log redaction for credentials and identifiers.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before they reach
//! the sink. The following are replaced:
//! - `password=...`, `token=...` and similar credential assignments
//! - Argon2 PHC strings
//! - history entry ids (UUIDs)
//! - email addresses
//! - long hex or base64 key material
//!
//! Callers should still avoid passing credentials to `tracing` macros; this
//! layer only catches what slips through.
//!
//! Input longer than `MEDIREC_SANITIZE_MAX_BYTES` (default 16 KiB) is cut and
//! marked `[TRUNCATED]`.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const RULES: &[(&str, &str)] = &[
    (r"\$argon2(?:id|i|d)\$[A-Za-z0-9$=,+/.]+", "[REDACTED-HASH]"),
    (
        r"(?i)\b(?:password|passwd|pwd|secret|token|seed|api[_-]?key)\b\s*[:=]\s*\S+",
        "[REDACTED-SECRET]",
    ),
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (
        r"(?i)\b[a-z0-9][a-z0-9._%+-]{0,63}@(?:[a-z0-9-]{1,63}\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
        "[REDACTED-JWT]",
    ),
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
    (r"\b[A-Za-z0-9+/]{43}=", "[REDACTED-KEY]"),
];

struct Patterns {
    set: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

fn patterns() -> Option<&'static Patterns> {
    PATTERNS
        .get_or_init(|| {
            let set = RegexSet::new(RULES.iter().map(|(p, _)| *p)).ok()?;
            let rules = RULES
                .iter()
                .map(|(p, r)| Regex::new(p).map(|re| (re, *r)))
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            Some(Patterns { set, rules })
        })
        .as_ref()
}

fn max_sanitize_bytes() -> usize {
    std::env::var("MEDIREC_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact credentials and identifiers from a line of text.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = match patterns() {
        Some(p) if p.set.is_match(prefix) => {
            let mut result = prefix.to_string();
            // Rule order matters: hashes and assignments before the generic key rules.
            for idx in &p.set.matches(prefix) {
                let (re, replacement) = &p.rules[idx];
                result = re.replace_all(&result, *replacement).into_owned();
            }
            result
        }
        Some(_) => prefix.to_string(),
        None => "[REDACTED-UNSANITIZABLE]".to_string(),
    };

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Whether a string contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    patterns().map_or(true, |p| p.set.is_match(prefix))
}

/// A `tracing_subscriber` writer that sanitizes each formatted line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter that never emits a newline must not grow the buffer forever.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

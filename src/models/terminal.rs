//! Terminal scrollback for streamed process output.
//!
//! Process output arrives as arbitrary chunks (no line-buffering guarantee).
//! [`TerminalBuffer`] stitches chunks into display lines, honours `\r`
//! line rewrites (npm/yarn spinners) and removes ANSI escape sequences, even
//! when a sequence is split across two chunks.

use std::collections::VecDeque;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use regex::Regex;

/// CSI sequences (`ESC [ ... final`) and OSC sequences (`ESC ] ... BEL`).
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07|\x1b[()][A-Za-z0-9]")
        .expect("static ANSI pattern is valid")
});

// Global counter for generating unique IDs
static TERMINAL_LINE_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_id() -> usize {
    TERMINAL_LINE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Longest unfinished escape held back for the next chunk.
const MAX_ESCAPE_TAIL: usize = 64;

/// Remove terminal control sequences from a chunk.
pub fn strip_ansi(text: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Split `text` into the part safe to strip now and a trailing escape
/// sequence that has not received its final byte yet.
fn split_unfinished_escape(text: &str) -> (&str, &str) {
    let Some(start) = text.rfind('\x1b') else {
        return (text, "");
    };
    let tail = &text[start..];
    if tail.len() > MAX_ESCAPE_TAIL || ANSI_ESCAPE.is_match(tail) {
        return (text, "");
    }

    let rest = &tail[1..];
    let unfinished = match rest.chars().next() {
        None => true,
        Some('[') => rest[1..]
            .chars()
            .all(|c| matches!(c, '0'..='9' | ';' | '?' | ' '..='/')),
        Some(']') => !rest.contains('\x07'),
        Some('(' | ')') => rest.len() == 1,
        Some(_) => false,
    };
    if unfinished {
        (&text[..start], tail)
    } else {
        (text, "")
    }
}

/// A single displayed line with a unique ID for keyed rendering.
#[derive(Clone, Debug)]
pub struct TerminalLine {
    pub id: usize,
    pub text: String,
}

impl PartialEq for TerminalLine {
    fn eq(&self, other: &Self) -> bool {
        // Only compare text, not ID
        self.text == other.text
    }
}

/// Bounded scrollback assembled from output chunks.
#[derive(Clone, Debug)]
pub struct TerminalBuffer {
    lines: VecDeque<TerminalLine>,
    current: TerminalLine,
    pending_cr: bool,
    escape_tail: String,
    capacity: usize,
}

impl TerminalBuffer {
    /// Create an empty buffer keeping at most `capacity` completed lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(256)),
            current: TerminalLine {
                id: next_id(),
                text: String::new(),
            },
            pending_cr: false,
            escape_tail: String::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a raw output chunk.
    pub fn write(&mut self, chunk: &str) {
        let mut joined = std::mem::take(&mut self.escape_tail);
        joined.push_str(chunk);
        let (complete, tail) = split_unfinished_escape(&joined);
        self.escape_tail = tail.to_string();

        let clean = strip_ansi(complete);
        for ch in clean.chars() {
            match ch {
                '\n' => {
                    self.pending_cr = false;
                    self.commit();
                }
                '\r' => self.pending_cr = true,
                _ => {
                    if self.pending_cr {
                        // Bare carriage return: the line is being redrawn.
                        self.current.text.clear();
                        self.pending_cr = false;
                    }
                    self.current.text.push(ch);
                }
            }
        }
    }

    fn commit(&mut self) {
        let finished = std::mem::replace(
            &mut self.current,
            TerminalLine {
                id: next_id(),
                text: String::new(),
            },
        );
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(finished);
    }

    /// Completed lines plus the line in progress (if any), oldest first.
    pub fn lines(&self) -> Vec<TerminalLine> {
        let mut out: Vec<TerminalLine> = self.lines.iter().cloned().collect();
        if !self.current.text.is_empty() {
            out.push(self.current.clone());
        }
        out
    }

    /// Text of every line, for assertions and copy-out.
    pub fn text(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.text).collect()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.current.text.clear();
        self.pending_cr = false;
        self.escape_tail.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_are_stitched_into_lines() {
        let mut buf = TerminalBuffer::new(10);
        buf.write("hel");
        buf.write("lo\nwor");
        assert_eq!(buf.text(), vec!["hello", "wor"]);

        buf.write("ld\n");
        assert_eq!(buf.text(), vec!["hello", "world"]);
    }

    #[test]
    fn test_carriage_return_rewrites_line() {
        let mut buf = TerminalBuffer::new(10);
        buf.write("[1/3] resolving\r[2/3] fetching\r\n");
        assert_eq!(buf.text(), vec!["[2/3] fetching"]);
    }

    #[test]
    fn test_crlf_is_a_newline() {
        let mut buf = TerminalBuffer::new(10);
        buf.write("a\r\nb\r\n");
        assert_eq!(buf.text(), vec!["a", "b"]);
    }

    #[test]
    fn test_ansi_sequences_removed() {
        assert_eq!(strip_ansi("\x1b[32mready\x1b[0m in 3ms"), "ready in 3ms");
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Gdone"), "done");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buf = TerminalBuffer::new(10);
        buf.write("ok \x1b[3");
        assert_eq!(buf.text(), vec!["ok "]);

        buf.write("2mgreen\x1b[0m\n");
        assert_eq!(buf.text(), vec!["ok green"]);
    }

    #[test]
    fn test_lone_escape_at_chunk_end() {
        let mut buf = TerminalBuffer::new(10);
        buf.write("a\x1b");
        buf.write("[1mb\x1b]0;title");
        buf.write("\x07c\n");
        assert_eq!(buf.text(), vec!["abc"]);
    }

    #[test]
    fn test_runaway_escape_is_not_held() {
        let mut buf = TerminalBuffer::new(10);
        let junk = format!("x\x1b[{}", "1;".repeat(MAX_ESCAPE_TAIL));
        buf.write(&junk);
        assert_eq!(buf.text().len(), 1);
        assert!(buf.text()[0].starts_with("x\x1b["));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut buf = TerminalBuffer::new(2);
        buf.write("1\n2\n3\n");
        assert_eq!(buf.text(), vec!["2", "3"]);
    }

    #[test]
    fn test_unique_ids() {
        let mut buf = TerminalBuffer::new(10);
        buf.write("same\nsame\n");
        let lines = buf.lines();
        assert_ne!(lines[0].id, lines[1].id);
        assert_eq!(lines[0], lines[1]);
    }
}

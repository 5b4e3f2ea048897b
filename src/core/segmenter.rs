//! Sentence segmentation of the `speak` stream
//!
//! Deltas are buffered until a terminal punctuation mark shows up; everything
//! up to the last mark becomes one [`SentenceUnit`]. Commas count as terminators,
//! which keeps the first synthesized chunk short.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Punctuation that closes a unit, CJK and Latin.
pub const SENTENCE_TERMINATORS: [char; 8] = ['。', '！', '？', '，', ',', '.', '!', '?'];

pub const DEFAULT_SPEED_FACTOR: f32 = 1.0;
pub const MIN_SPEED_FACTOR: f32 = 0.25;
pub const MAX_SPEED_FACTOR: f32 = 4.0;

const SPEED_TAG_PREFIX: &str = "[speed=";

static SPEED_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[speed=([\d.]+)\]?").unwrap());

/// One punctuation-delimited chunk of the reply, ready for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceUnit {
    /// Turn-scoped, starts at 1.
    pub sequence: u32,
    pub text: String,
    pub speed_factor: f32,
}

/// Splits `speak` deltas into sentence units for one turn.
#[derive(Debug)]
pub struct SentenceSegmenter {
    buffer: String,
    next_sequence: u32,
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSegmenter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            next_sequence: 1,
        }
    }

    /// Append a delta and emit a unit if the buffer now holds a terminator.
    pub fn push(&mut self, delta: &str) -> Option<SentenceUnit> {
        self.buffer.push_str(delta);

        let boundary = find_boundary(&self.buffer)?;
        let rest = self.buffer.split_off(boundary);
        let ready = std::mem::replace(&mut self.buffer, rest);
        self.make_unit(&ready)
    }

    /// Flush the residual buffer as a final unit, punctuation or not.
    pub fn finish(&mut self) -> Option<SentenceUnit> {
        let residual = std::mem::take(&mut self.buffer);
        self.make_unit(&residual)
    }

    /// Number of units emitted so far.
    pub fn emitted(&self) -> u32 {
        self.next_sequence - 1
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn make_unit(&mut self, raw: &str) -> Option<SentenceUnit> {
        let (text, speed_factor) = strip_speed_tags(raw.trim());
        if text.is_empty() {
            return None;
        }

        let unit = SentenceUnit {
            sequence: self.next_sequence,
            text,
            speed_factor,
        };
        self.next_sequence += 1;
        debug!(
            "Segmented sentence [{}] (speed {}): {}",
            unit.sequence, unit.speed_factor, unit.text
        );
        Some(unit)
    }
}

/// Byte offset just past the last terminator that is not inside a speed tag.
///
/// A tag ends at `]` or at the first character that cannot belong to its value,
/// so an unclosed tag does not hold back the rest of the reply.
fn find_boundary(buffer: &str) -> Option<usize> {
    let mut boundary = None;
    let mut tag_start: Option<usize> = None;

    for (i, c) in buffer.char_indices() {
        if let Some(start) = tag_start {
            if i < start + SPEED_TAG_PREFIX.len() || c.is_ascii_digit() || c == '.' {
                continue;
            }
            tag_start = None;
            if c == ']' {
                continue;
            }
        }

        if c == '[' && looks_like_speed_tag(&buffer[i..]) {
            tag_start = Some(i);
        } else if SENTENCE_TERMINATORS.contains(&c) {
            boundary = Some(i + c.len_utf8());
        }
    }

    boundary
}

fn looks_like_speed_tag(candidate: &str) -> bool {
    if candidate.len() >= SPEED_TAG_PREFIX.len() {
        candidate.starts_with(SPEED_TAG_PREFIX)
    } else {
        SPEED_TAG_PREFIX.starts_with(candidate)
    }
}

/// Remove every `[speed=<n>]` tag; the first one sets the speed factor.
pub fn strip_speed_tags(text: &str) -> (String, f32) {
    let speed_factor = SPEED_TAG
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .filter(|speed| speed.is_finite())
        .map(|speed| speed.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR))
        .unwrap_or(DEFAULT_SPEED_FACTOR);

    let stripped = SPEED_TAG.replace_all(text, "");
    (stripped.trim().to_string(), speed_factor)
}

//! Incremental extraction of the `thought` and `speak` fields
//!
//! The language model is asked to answer with a single document of the shape
//! `{"thought": "...", "speak": "..."}`. The document is useless as JSON until the
//! stream ends, so this module reads it while it is still truncated: each field
//! keeps its own cursor into the accumulated raw text and advances it up to the
//! next recovery point, which is either the unescaped closing quote of the value
//! or the current end of input. Text already delivered for a field is never
//! delivered again.
//!
//! Escape pairs are decoded atomically. A trailing lone backslash is left in
//! the raw text until its partner arrives, which keeps the output identical no
//! matter how the document is split into fragments.

/// Newly decoded text produced by one call to [`StreamExtractor::push`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractorUpdate {
    pub thought_delta: String,
    pub speak_delta: String,
    /// The closing quote of the `thought` value has been seen.
    pub thought_closed: bool,
}

#[derive(Debug)]
enum ValueOpening {
    /// Byte offset of the first character of the value, relative to the input.
    Found(usize),
    /// The input ends before the opening quote can be confirmed.
    Incomplete,
    Mismatch,
}

/// Cursor over one string field of the streamed document.
#[derive(Debug)]
struct FieldCursor {
    /// Quoted key, e.g. `"speak"`.
    key: &'static str,
    search_from: usize,
    value_start: Option<usize>,
    scan_pos: usize,
    closed: bool,
    decoded: String,
}

impl FieldCursor {
    fn new(key: &'static str) -> Self {
        Self {
            key,
            search_from: 0,
            value_start: None,
            scan_pos: 0,
            closed: false,
            decoded: String::new(),
        }
    }

    /// Advance over `raw` and return the text decoded since the last call.
    fn advance(&mut self, raw: &str) -> String {
        if self.closed {
            return String::new();
        }

        if self.value_start.is_none() {
            match self.locate_value(raw) {
                Some(start) => {
                    self.value_start = Some(start);
                    self.scan_pos = start;
                }
                None => return String::new(),
            }
        }

        let mut delta = String::new();
        let mut consumed = 0;
        let mut chars = raw[self.scan_pos..].char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.closed = true;
                    consumed = i + 1;
                    break;
                }
                '\\' => {
                    let Some((j, escaped)) = chars.next() else {
                        break;
                    };
                    push_unescaped(&mut delta, escaped);
                    consumed = j + escaped.len_utf8();
                }
                other => {
                    delta.push(other);
                    consumed = i + other.len_utf8();
                }
            }
        }

        self.scan_pos += consumed;
        self.decoded.push_str(&delta);
        delta
    }

    fn locate_value(&mut self, raw: &str) -> Option<usize> {
        while let Some(found) = raw[self.search_from..].find(self.key) {
            let key_start = self.search_from + found;
            let after_key = key_start + self.key.len();

            match match_value_opening(&raw[after_key..]) {
                ValueOpening::Found(offset) => return Some(after_key + offset),
                // Retry from the same key once more text arrives.
                ValueOpening::Incomplete => {
                    self.search_from = key_start;
                    return None;
                }
                // Keys start with an ASCII quote, so +1 stays on a char boundary.
                ValueOpening::Mismatch => self.search_from = key_start + 1,
            }
        }

        // Only the tail can still hold the beginning of a key.
        let mut resume = raw.len().saturating_sub(self.key.len() - 1);
        while !raw.is_char_boundary(resume) {
            resume -= 1;
        }
        self.search_from = self.search_from.max(resume);
        None
    }
}

/// Matches `\s*:\s*"` at the start of `input`.
fn match_value_opening(input: &str) -> ValueOpening {
    let mut seen_colon = false;
    for (i, c) in input.char_indices() {
        match c {
            c if c.is_whitespace() => continue,
            ':' if !seen_colon => seen_colon = true,
            '"' if seen_colon => return ValueOpening::Found(i + 1),
            _ => return ValueOpening::Mismatch,
        }
    }
    ValueOpening::Incomplete
}

fn push_unescaped(out: &mut String, escaped: char) {
    match escaped {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '"' => out.push('"'),
        '\\' => out.push('\\'),
        '/' => out.push('/'),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}

/// Reads a streamed `{"thought": ..., "speak": ...}` document fragment by fragment.
#[derive(Debug)]
pub struct StreamExtractor {
    raw: String,
    thought: FieldCursor,
    speak: FieldCursor,
}

impl Default for StreamExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamExtractor {
    pub fn new() -> Self {
        Self {
            raw: String::new(),
            thought: FieldCursor::new("\"thought\""),
            speak: FieldCursor::new("\"speak\""),
        }
    }

    /// Append a fragment and return whatever became unambiguous because of it.
    pub fn push(&mut self, fragment: &str) -> ExtractorUpdate {
        if fragment.is_empty() {
            return ExtractorUpdate {
                thought_closed: self.thought.closed,
                ..Default::default()
            };
        }

        self.raw.push_str(fragment);
        let thought_delta = self.thought.advance(&self.raw);
        let speak_delta = self.speak.advance(&self.raw);

        ExtractorUpdate {
            thought_delta,
            speak_delta,
            thought_closed: self.thought.closed,
        }
    }

    /// Decoded `thought` text delivered so far.
    pub fn thought(&self) -> &str {
        &self.thought.decoded
    }

    /// Decoded `speak` text delivered so far.
    pub fn speak(&self) -> &str {
        &self.speak.decoded
    }

    pub fn thought_closed(&self) -> bool {
        self.thought.closed
    }

    pub fn speak_closed(&self) -> bool {
        self.speak.closed
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{"thought": "Mood: Happy. 用户在\"打招呼\"\n要热情", "speak": "[speed=1.2]你好呀！今天过得怎么样？\n我很好。"}"#;

    fn feed_all(extractor: &mut StreamExtractor, fragments: &[&str]) -> (String, String) {
        let mut thought = String::new();
        let mut speak = String::new();
        for fragment in fragments {
            let update = extractor.push(fragment);
            thought.push_str(&update.thought_delta);
            speak.push_str(&update.speak_delta);
        }
        (thought, speak)
    }

    #[test]
    fn test_scenario_fragments() {
        let mut extractor = StreamExtractor::new();

        let update = extractor.push(r#"{"thought": "Mood: HAPP"#);
        assert_eq!(update.thought_delta, "Mood: HAPP");
        assert_eq!(update.speak_delta, "");
        assert!(!update.thought_closed);

        let update = extractor.push(r#"Y", "speak": "你好"#);
        assert_eq!(update.thought_delta, "Y");
        assert_eq!(update.speak_delta, "你好");
        assert!(update.thought_closed);

        let update = extractor.push(r#"呀！"}"#);
        assert_eq!(update.thought_delta, "");
        assert_eq!(update.speak_delta, "呀！");
        assert!(extractor.speak_closed());
    }

    #[test]
    fn test_char_by_char_matches_single_fragment() {
        let mut whole = StreamExtractor::new();
        let (thought_whole, speak_whole) = feed_all(&mut whole, &[DOCUMENT]);

        let mut incremental = StreamExtractor::new();
        let chars: Vec<String> = DOCUMENT.chars().map(String::from).collect();
        let refs: Vec<&str> = chars.iter().map(String::as_str).collect();
        let (thought_inc, speak_inc) = feed_all(&mut incremental, &refs);

        assert_eq!(thought_whole, thought_inc);
        assert_eq!(speak_whole, speak_inc);
        assert_eq!(thought_whole, "Mood: Happy. 用户在\"打招呼\"\n要热情");
        assert_eq!(speak_whole, "[speed=1.2]你好呀！今天过得怎么样？\n我很好。");
    }

    #[test]
    fn test_split_escape_sequence_is_not_emitted_half() {
        let mut extractor = StreamExtractor::new();
        let update = extractor.push(r#"{"speak": "line one\"#);
        assert_eq!(update.speak_delta, "line one");

        let update = extractor.push("nline two");
        assert_eq!(update.speak_delta, "\nline two");
    }

    #[test]
    fn test_split_key_and_colon() {
        let mut extractor = StreamExtractor::new();
        assert_eq!(extractor.push(r#"{"spe"#).speak_delta, "");
        assert_eq!(extractor.push(r#"ak"  "#).speak_delta, "");
        assert_eq!(extractor.push(": ").speak_delta, "");
        assert_eq!(extractor.push(r#""hi"#).speak_delta, "hi");
    }

    #[test]
    fn test_fields_in_reverse_order() {
        let mut extractor = StreamExtractor::new();
        let (thought, speak) = feed_all(
            &mut extractor,
            &[r#"{"speak": "ok.", "#, r#""thought": "Mood: Sad"}"#],
        );
        assert_eq!(speak, "ok.");
        assert_eq!(thought, "Mood: Sad");
    }

    #[test]
    fn test_malformed_document_emits_nothing() {
        let mut extractor = StreamExtractor::new();
        let (thought, speak) = feed_all(
            &mut extractor,
            &["Sorry, I cannot ", "answer in JSON ", "\"speak\" here"],
        );
        assert!(thought.is_empty());
        assert!(speak.is_empty());
        assert_eq!(extractor.raw(), "Sorry, I cannot answer in JSON \"speak\" here");
    }

    #[test]
    fn test_text_after_closing_quote_is_ignored() {
        let mut extractor = StreamExtractor::new();
        let (_, speak) = feed_all(&mut extractor, &[r#"{"speak": "done"}"#, " trailing \"noise\""]);
        assert_eq!(speak, "done");
    }

    #[test]
    fn test_empty_fragment_is_noop() {
        let mut extractor = StreamExtractor::new();
        extractor.push(r#"{"thought": "a"#);
        let update = extractor.push("");
        assert_eq!(update, ExtractorUpdate::default());
        assert_eq!(extractor.thought(), "a");
    }
}

//! Side-channel extraction of mood and paralinguistic markers
//!
//! Two sources feed this module:
//! - the model's `thought` stream, which carries a `Mood: <Word>` marker that is
//!   mapped to a voice-activity sensitivity for the client
//! - recognition transcripts, which carry inline `<|TAG|>` markup

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static MOOD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Mood:\s*([A-Za-z]+)").unwrap());
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\|(.*?)\|>").unwrap());

/// Moods that raise arousal; the client listens more eagerly.
const HIGH_AROUSAL: [&str; 4] = ["ANGRY", "FOCUS", "EXCITED", "HAPPY"];
/// Moods that lower arousal.
const LOW_AROUSAL: [&str; 3] = ["SAD", "SLEEPY", "TIRED"];

pub const HIGH_SENSITIVITY: f32 = 0.9;
pub const NEUTRAL_SENSITIVITY: f32 = 0.5;
pub const LOW_SENSITIVITY: f32 = 0.2;

pub const DEFAULT_MOTION: &str = "nod";

/// Recognition tags that are surfaced to the client.
pub const PARALINGUISTIC_TAGS: [&str; 6] = ["HAPPY", "SAD", "ANGRY", "NEUTRAL", "SIGH", "LAUGH"];

/// Mood change detected in the thought stream.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodShift {
    /// Lowercased mood word, used as the avatar expression.
    pub expression: String,
    pub motion: String,
    /// 0.0 - 1.0, higher is more sensitive.
    pub vad_sensitivity: f32,
    pub mood_score: i32,
}

impl MoodShift {
    pub fn from_mood(mood: &str) -> Self {
        Self {
            expression: mood.to_lowercase(),
            motion: DEFAULT_MOTION.to_string(),
            vad_sensitivity: vad_sensitivity_for(mood),
            mood_score: 0,
        }
    }
}

pub fn vad_sensitivity_for(mood: &str) -> f32 {
    let mood = mood.to_uppercase();
    if HIGH_AROUSAL.contains(&mood.as_str()) {
        HIGH_SENSITIVITY
    } else if LOW_AROUSAL.contains(&mood.as_str()) {
        LOW_SENSITIVITY
    } else {
        NEUTRAL_SENSITIVITY
    }
}

/// Watches the accumulated thought text for `Mood:` markers.
///
/// A mood word that touches the end of the text may still be growing, so it
/// is held back until a non-letter follows it or the thought is complete. Each
/// marker is reported once.
#[derive(Debug, Default)]
pub struct MoodTracker {
    consumed: usize,
}

impl MoodTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, thought: &str, complete: bool) -> Vec<MoodShift> {
        let mut shifts = Vec::new();
        let base = self.consumed;
        let Some(unseen) = thought.get(base..) else {
            return shifts;
        };

        for caps in MOOD_MARKER.captures_iter(unseen) {
            let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.end() == unseen.len() && !complete {
                break;
            }

            let shift = MoodShift::from_mood(word.as_str());
            info!(
                "Detected assistant mood: {} -> VAD sensitivity {}",
                word.as_str().to_uppercase(),
                shift.vad_sensitivity
            );
            shifts.push(shift);
            self.consumed = base + whole.end();
        }

        shifts
    }
}

/// A recognition transcript split into clean text and paralinguistic tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTranscript {
    pub text: String,
    pub tags: Vec<String>,
}

impl AnnotatedTranscript {
    pub fn parse(raw: &str) -> Self {
        let text = MARKUP_TAG.replace_all(raw, "").trim().to_string();
        let tags = MARKUP_TAG
            .captures_iter(raw)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|tag| PARALINGUISTIC_TAGS.contains(tag))
            .map(str::to_string)
            .collect();

        Self { text, tags }
    }

    pub fn is_valid_speech(&self) -> bool {
        !self.text.is_empty()
    }

    /// Clean text with a readable annotation appended when tags are present.
    pub fn display_text(&self) -> String {
        if self.tags.is_empty() {
            self.text.clone()
        } else {
            format!("{} (user state: {})", self.text, self.tags.join(", "))
        }
    }
}

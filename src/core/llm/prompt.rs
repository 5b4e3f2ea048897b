//! Prompt rendering for one turn.

use serde::{Deserialize, Serialize};

/// One prior exchange supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Render the full prompt for `user_text` with prior turns as context.
///
/// # Arguments
/// * `assistant_name` - Name the assistant answers to
/// * `history` - Prior turns, oldest first
/// * `user_text` - Current user utterance
pub fn build_prompt(assistant_name: &str, history: &[ChatTurn], user_text: &str) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("[Conversation history]\n");
        for turn in history {
            let speaker = if turn.role == "user" {
                "User"
            } else {
                assistant_name
            };
            prompt.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        prompt.push_str("[End of history]\n\n");
    }

    prompt.push_str(&format!(
        "You are an AI voice assistant named {assistant_name}. Do not use emoji in your reply; \
         the text is read aloud by a speech synthesizer.\n"
    ));
    prompt.push_str(
        "Answer with exactly one JSON object: {\"thought\": \"inner monologue\", \"speak\": \"what you say out loud\"}.\n",
    );
    prompt.push_str("Keep the thought under 30 characters.\n");
    prompt.push_str(
        "You may control speaking rate inside speak with [speed=1.2] (faster) or [speed=0.8] (slower), \
         for example: \"[speed=1.5]That's great!\"\n",
    );
    prompt.push_str(
        "State your mood inside thought, for example 'Mood: Happy', 'Mood: Angry', 'Mood: Sad' or 'Mood: Neutral'.\n",
    );
    prompt.push_str(&format!("User says: {user_text}"));

    prompt
}

//! Conversation history helpers. History is owned by the client and passed in
//! by value on every request; nothing here mutates it.

use serde::{Deserialize, Serialize};

use crate::llm_client::ChatMessage;

/// Turns kept by the chat API before anything else looks at the history.
pub const MAX_HISTORY_TURNS: usize = 20;

/// One exchange. `assistant` is `None` only while the reply is pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    #[serde(default)]
    pub assistant: Option<String>,
}

#[cfg(test)]
impl ConversationTurn {
    pub fn new(user: impl Into<String>, assistant: Option<&str>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.map(str::to_string),
        }
    }
}

/// The last `max` turns of `history`.
pub fn trim_history(history: &[ConversationTurn], max: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(max)..]
}

/// Flattens turns into alternating chat messages, skipping empty and pending parts.
pub fn to_messages(turns: &[ConversationTurn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        if !turn.user.trim().is_empty() {
            messages.push(ChatMessage::user(turn.user.clone()));
        }
        if let Some(reply) = turn.assistant.as_deref().filter(|r| !r.trim().is_empty()) {
            messages.push(ChatMessage::assistant(reply));
        }
    }
    messages
}

// Follow-up suggestions. The model's own "Posso anche ..." lines are dropped
// and replaced with at most MAX_SUGGESTIONS topics not yet discussed.

use crate::composer::prompts;
use crate::conversation::ConversationTurn;
use crate::intent::text::{fold, NormalizedText};
use crate::knowledge::TopicCategory;

pub const MAX_SUGGESTIONS: usize = 2;
const MODEL_SUGGESTION_PREFIX: &str = "posso anche";

pub fn strip_model_suggestions(reply: &str) -> String {
    reply
        .lines()
        .filter(|line| {
            !fold(line.trim_start_matches(|c: char| !c.is_alphanumeric()))
                .starts_with(MODEL_SUGGESTION_PREFIX)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Labels of categories neither the history nor `utterance` has touched,
/// in declaration order.
pub fn undiscussed_topics<'a>(
    categories: &'a [TopicCategory],
    history: &[ConversationTurn],
    utterance: &str,
) -> Vec<&'a str> {
    let asked: Vec<NormalizedText> = history
        .iter()
        .map(|turn| NormalizedText::new(&turn.user))
        .chain(std::iter::once(NormalizedText::new(utterance)))
        .collect();

    categories
        .iter()
        .filter(|category| !asked.iter().any(|text| text.matches_category(category)))
        .take(MAX_SUGGESTIONS)
        .map(TopicCategory::display_label)
        .collect()
}

/// Final reply text: model suggestions out, ours appended when there are any.
pub fn finalize(
    reply: &str,
    categories: &[TopicCategory],
    history: &[ConversationTurn],
    utterance: &str,
) -> String {
    let body = strip_model_suggestions(reply);
    let topics = undiscussed_topics(categories, history, utterance);
    if topics.is_empty() {
        return body;
    }
    format!("{body}\n\n{}", prompts::suggestion_line(&topics))
}

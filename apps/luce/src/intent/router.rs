use std::sync::Arc;

use tracing::debug;

use crate::conversation::ConversationTurn;
use crate::intent::rules::{default_rules, Rule, RuleContext};
use crate::intent::text::NormalizedText;
use crate::intent::IntentResult;
use crate::knowledge::KnowledgeStore;

/// Default minimum length of a project-name token for a match. Shorter names
/// produce too many false positives inside ordinary words.
pub const MIN_PROJECT_TOKEN_LEN: usize = 4;

/// Maps an utterance to an `IntentResult` by running an ordered list of rules.
///
/// Stateless apart from the injected knowledge store: the same utterance and
/// the same knowledge always produce the same result.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    knowledge: Arc<KnowledgeStore>,
    rules: Vec<Rule>,
    min_token_len: usize,
}

impl IntentRouter {
    pub fn new(knowledge: Arc<KnowledgeStore>) -> Self {
        Self {
            knowledge,
            rules: default_rules(),
            min_token_len: MIN_PROJECT_TOKEN_LEN,
        }
    }

    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    /// Replaces the rule list. Order is priority.
    #[cfg(test)]
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Classifies `utterance`. Never fails: no match yields `unknown`.
    ///
    /// Rejecting empty input is the caller's job; an empty utterance simply
    /// falls through to `unknown` here.
    pub fn classify(&self, utterance: &str, history: &[ConversationTurn]) -> IntentResult {
        let text = NormalizedText::new(utterance);
        let ctx = RuleContext {
            text: &text,
            knowledge: &self.knowledge,
            min_token_len: self.min_token_len,
        };

        for rule in &self.rules {
            if let Some(result) = (rule.apply)(&ctx) {
                debug!(
                    rule = rule.name,
                    intent = result.label(),
                    history_turns = history.len(),
                    "Utterance classified"
                );
                return result;
            }
        }

        debug!(history_turns = history.len(), "No rule matched, intent unknown");
        IntentResult::unknown()
    }
}

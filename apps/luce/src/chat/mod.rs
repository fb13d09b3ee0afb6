//! Chat dialogue: one user message in, one reply out.
//!
//! Wraps the router and the composer with the conversational glue the widget
//! needs: document-read confirmation, follow-up carry-over for project-list
//! questions and download offers. The client owns the history and echoes back
//! any pending confirmation; the server keeps no session state.

pub mod handlers;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::composer::prompts::{DOC_DECLINED_REPLY, EMPTY_PROMPT_REPLY};
use crate::composer::shortcuts::ProjectsFollowUp;
use crate::composer::AnswerComposer;
use crate::conversation::{trim_history, ConversationTurn, MAX_HISTORY_TURNS};
use crate::intent::text::{fold, tokenize, NormalizedText};
use crate::intent::{Intent, IntentResult, IntentRouter, StopReason};
use crate::knowledge::{DocKind, DownloadInfo};

const AFFIRMATIVE: &[&str] = &["si", "sì", "yes", "ok", "vai", "va bene", "confermo"];
const NEGATIVE: &[&str] = &["no", "non", "preferisco di no", "annulla", "cancel"];

/// A document read the user was asked to confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDocRequest {
    pub project_id: String,
    pub doc_preference: Vec<DocKind>,
    /// The message that triggered the confirmation, answered once confirmed.
    pub original_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub pending_document: Option<PendingDocRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_document: Option<PendingDocRequest>,
}

impl ChatReply {
    fn text(reply: impl Into<String>, intent: &str) -> Self {
        Self {
            reply: reply.into(),
            intent: intent.to_string(),
            download: None,
            pending_document: None,
        }
    }
}

#[derive(Clone)]
pub struct Dialogue {
    router: IntentRouter,
    composer: AnswerComposer,
}

impl Dialogue {
    pub fn new(router: IntentRouter, composer: AnswerComposer) -> Self {
        Self { router, composer }
    }

    pub async fn respond(&self, request: ChatRequest) -> ChatReply {
        let message = request.message.trim();
        if message.is_empty() {
            return ChatReply::text(EMPTY_PROMPT_REPLY, "empty");
        }
        let history = trim_history(&request.history, MAX_HISTORY_TURNS);

        if let Some(pending) = request.pending_document {
            if let Some(reply) = self.resolve_pending(message, history, pending).await {
                return reply;
            }
        }

        let result = self.classify(message, history);
        info!(intent = result.label(), "Chat message classified");

        let knowledge = self.router.knowledge();
        let (download, pending_document) = match &result {
            IntentResult::StopAndAnswerDirectly(StopReason::CvRequest) => {
                (knowledge.cv_download(), None)
            }
            IntentResult::StopAndAnswerDirectly(StopReason::ProjectDocConfirm {
                project,
                doc_preference,
            }) => (
                knowledge.download_info(&project.id, doc_preference),
                Some(PendingDocRequest {
                    project_id: project.id.clone(),
                    doc_preference: doc_preference.clone(),
                    original_prompt: message.to_string(),
                }),
            ),
            IntentResult::Continue(_) => (None, None),
        };

        ChatReply {
            reply: self.composer.compose(message, history, &result).await,
            intent: result.label().to_string(),
            download,
            pending_document,
        }
    }

    /// Classifies `message`, carrying a projects-list context over to
    /// follow-ups like "qual è il tuo preferito?" that name no project.
    pub fn classify(&self, message: &str, history: &[ConversationTurn]) -> IntentResult {
        let result = self.router.classify(message, history);
        if !result.is_unknown() || ProjectsFollowUp::detect(&NormalizedText::new(message)).is_none()
        {
            return result;
        }

        let Some((previous, earlier)) = history
            .iter()
            .rposition(|turn| !turn.user.trim().is_empty())
            .map(|i| (&history[i], &history[..i]))
        else {
            return result;
        };

        let carried = self.router.classify(&previous.user, earlier);
        if matches!(carried, IntentResult::Continue(Intent::ProjectsList(_))) {
            debug!("Carrying projects list over to follow-up");
            carried
        } else {
            result
        }
    }

    /// `None` when the message is neither a yes nor a no: the pending request
    /// is dropped and the message handled normally.
    async fn resolve_pending(
        &self,
        message: &str,
        history: &[ConversationTurn],
        pending: PendingDocRequest,
    ) -> Option<ChatReply> {
        if is_affirmative(message) {
            let Some(project) = self.router.knowledge().project(&pending.project_id) else {
                warn!("Pending document request for unknown project {}", pending.project_id);
                return None;
            };
            let intent = IntentResult::Continue(Intent::Project {
                project: project.clone(),
                doc_preference: pending.doc_preference,
            });
            let reply = self
                .composer
                .compose(&pending.original_prompt, history, &intent)
                .await;
            return Some(ChatReply::text(reply, intent.label()));
        }
        if is_negative(message) {
            return Some(ChatReply::text(DOC_DECLINED_REPLY, "project_doc_declined"));
        }
        debug!("Pending document request dropped");
        None
    }
}

fn is_affirmative(message: &str) -> bool {
    leads_with_any(message, AFFIRMATIVE)
}

fn is_negative(message: &str) -> bool {
    leads_with_any(message, NEGATIVE)
}

/// Is the message one of `phrases`, or does it open with one as whole words?
fn leads_with_any(message: &str, phrases: &[&str]) -> bool {
    let words = tokenize(message).join(" ");
    phrases.iter().any(|phrase| {
        let phrase = fold(phrase);
        words == phrase || words.starts_with(&format!("{phrase} "))
    })
}

//! Answer Composer: turns a classified intent into the final reply text.
//!
//! Flow: short-circuits (stop reasons, canned clarifications, deterministic
//! project answers) → context messages → trimmed history → one model call →
//! suggestion post-processing. Every failure resolves to a fixed message;
//! nothing is propagated to the caller.

pub mod context;
pub mod prompts;
pub mod shortcuts;
pub mod suggestions;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::composer::shortcuts::ProjectsFollowUp;
use crate::conversation::{to_messages, trim_history, ConversationTurn};
use crate::intent::text::NormalizedText;
use crate::intent::{Intent, IntentResult, StopReason};
use crate::knowledge::KnowledgeStore;
use crate::llm_client::{ChatCompleter, ChatCompletionRequest, ChatMessage, LlmError, DEFAULT_MODEL};

/// Turns of history forwarded to the model.
pub const HISTORY_WINDOW: usize = 10;

const FALLBACK_OWNER: &str = "il proprietario del portfolio";

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub history_window: usize,
    /// Hard abort for the whole model call.
    pub timeout: Duration,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.35,
            max_tokens: 520,
            history_window: HISTORY_WINDOW,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct AnswerComposer {
    llm: Arc<dyn ChatCompleter>,
    knowledge: Arc<KnowledgeStore>,
    settings: ComposerSettings,
}

impl AnswerComposer {
    pub fn new(
        llm: Arc<dyn ChatCompleter>,
        knowledge: Arc<KnowledgeStore>,
        settings: ComposerSettings,
    ) -> Self {
        Self {
            llm,
            knowledge,
            settings,
        }
    }

    /// Produces the reply for `utterance`. At most one model call; never fails.
    pub async fn compose(
        &self,
        utterance: &str,
        history: &[ConversationTurn],
        intent: &IntentResult,
    ) -> String {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return prompts::EMPTY_PROMPT_REPLY.to_string();
        }

        let intent = match intent {
            IntentResult::StopAndAnswerDirectly(reason) => return self.stop_reply(reason),
            IntentResult::Continue(intent) => intent,
        };

        if let Some(reply) = self.shortcut(utterance, intent) {
            debug!(intent = intent_kind(intent), "Answered without model call");
            return reply;
        }

        let request = self.build_request(utterance, history, intent);
        self.call_model(&request)
            .await
            .map(|reply| {
                suggestions::finalize(
                    &reply,
                    &self.knowledge.profile().categories,
                    history,
                    utterance,
                )
            })
            .unwrap_or_else(|fallback| fallback.to_string())
    }

    /// The exact request `compose` would send, minus short-circuits.
    pub fn build_request(
        &self,
        utterance: &str,
        history: &[ConversationTurn],
        intent: &Intent,
    ) -> ChatCompletionRequest {
        let mut messages = vec![ChatMessage::system(prompts::system_prompt(&self.owner_name()))];
        messages.extend(context::context_messages(intent, &self.knowledge));
        messages.extend(to_messages(trim_history(history, self.settings.history_window)));
        messages.push(ChatMessage::user(utterance.trim()));

        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    fn stop_reply(&self, reason: &StopReason) -> String {
        match reason {
            StopReason::CvRequest => prompts::CV_OFFER.to_string(),
            StopReason::ProjectDocConfirm {
                project,
                doc_preference,
            } => {
                let downloadable = self
                    .knowledge
                    .download_info(&project.id, doc_preference)
                    .is_some();
                prompts::doc_confirm_question(project, doc_preference, downloadable)
            }
        }
    }

    fn shortcut(&self, utterance: &str, intent: &Intent) -> Option<String> {
        let text = NormalizedText::new(utterance);
        match intent {
            Intent::Unknown => shortcuts::clarification(&text, &self.owner_name()),
            Intent::ProjectsList(projects) => ProjectsFollowUp::detect(&text)
                .map(|follow_up| shortcuts::projects_answer(follow_up, projects)),
            _ => None,
        }
    }

    /// `Err` carries the fallback message to show instead.
    async fn call_model(&self, request: &ChatCompletionRequest) -> Result<String, &'static str> {
        match tokio::time::timeout(self.settings.timeout, self.llm.complete(request)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(LlmError::Timeout)) | Err(_) => {
                warn!(
                    "Model call aborted after {}s",
                    self.settings.timeout.as_secs()
                );
                Err(prompts::TIMEOUT_REPLY)
            }
            Ok(Err(e)) => {
                error!("Model call failed: {e}");
                Err(prompts::TECHNICAL_ERROR_REPLY)
            }
        }
    }

    fn owner_name(&self) -> String {
        self.knowledge
            .profile()
            .field("name")
            .unwrap_or_else(|| FALLBACK_OWNER.to_string())
    }
}

fn intent_kind(intent: &Intent) -> &'static str {
    match intent {
        Intent::Project { .. } => "project",
        Intent::About { .. } => "about",
        Intent::ProjectsList(_) => "projects_list",
        Intent::Unknown => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentRouter;
    use crate::knowledge::{Profile, Project};
    use crate::llm_client::Role;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed result.
    struct StubCompleter {
        reply: Result<String, fn() -> LlmError>,
        delay: Option<Duration>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl StubCompleter {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                delay: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: fn() -> LlmError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                delay: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn stalled() -> Arc<Self> {
            Arc::new(Self {
                reply: Ok("troppo tardi".to_string()),
                delay: Some(Duration::from_secs(60)),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> ChatCompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ChatCompleter for StubCompleter {
        async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn knowledge(favorite: bool) -> Arc<KnowledgeStore> {
        let profile: Profile = serde_json::from_value(json!({
            "name": "Giuseppe Rubino",
            "bio": "Sviluppatore appassionato di intelligenza artificiale.",
            "categories": [
                { "id": "studies", "label": "studi", "tokens": ["studi"], "fields": ["school"] },
                { "id": "free_time", "label": "tempo libero", "tokens": ["hobby"] },
                { "id": "work", "label": "lavoro", "tokens": ["lavoro"] }
            ]
        }))
        .unwrap();
        let projects: Vec<Project> = serde_json::from_value(json!([
            { "id": "proj-6", "name": "Decod", "subtitle": "Segnali radio", "modules": ["Python", "NumPy"], "favorite": favorite },
            { "id": "proj-7", "name": "Pixel-dèi", "modules": ["JavaScript"] }
        ]))
        .unwrap();
        Arc::new(KnowledgeStore::from_parts(profile, projects, HashMap::new()).unwrap())
    }

    fn composer(stub: Arc<StubCompleter>, favorite: bool) -> (AnswerComposer, IntentRouter) {
        let store = knowledge(favorite);
        (
            AnswerComposer::new(stub, store.clone(), ComposerSettings::default()),
            IntentRouter::new(store),
        )
    }

    async fn ask(composer: &AnswerComposer, router: &IntentRouter, text: &str) -> String {
        let intent = router.classify(text, &[]);
        composer.compose(text, &[], &intent).await
    }

    #[tokio::test]
    async fn test_cv_request_short_circuits() {
        let stub = StubCompleter::replying("non usato");
        let (composer, router) = composer(stub.clone(), true);

        let reply = ask(&composer, &router, "Posso avere il tuo CV?").await;
        assert_eq!(reply, prompts::CV_OFFER);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_tech_overview_is_deterministic() {
        let stub = StubCompleter::replying("non usato");
        let (composer, router) = composer(stub.clone(), true);

        let reply = ask(&composer, &router, "che tecnologie usi nei progetti?").await;
        assert_eq!(
            reply,
            "Ecco le tecnologie usate in ciascun progetto:\n- Decod: Python, NumPy\n- Pixel-dèi: JavaScript"
        );
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_favorite_after_projects_list() {
        let stub = StubCompleter::replying("non usato");
        let (composer, _) = composer(stub.clone(), false);
        let intent = IntentResult::Continue(Intent::ProjectsList(
            composer.knowledge.projects().to_vec(),
        ));

        let reply = composer.compose("qual è il tuo preferito?", &[], &intent).await;
        assert!(reply.contains("nessun progetto è segnato come preferito"));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_vague_question_gets_clarification() {
        let stub = StubCompleter::replying("non usato");
        let (composer, router) = composer(stub.clone(), true);

        let reply = ask(&composer, &router, "cosa puoi fare?").await;
        assert_eq!(reply, prompts::VAGUE_CLARIFICATION);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_utterance_gets_friendly_prompt() {
        let stub = StubCompleter::replying("non usato");
        let (composer, _) = composer(stub.clone(), true);
        let reply = composer.compose("   ", &[], &IntentResult::unknown()).await;
        assert_eq!(reply, prompts::EMPTY_PROMPT_REPLY);
    }

    #[tokio::test]
    async fn test_project_request_layout_and_history_window() {
        let stub = StubCompleter::replying("Decod decodifica segnali radio.\nPosso anche parlarti del CV.");
        let (composer, router) = composer(stub.clone(), true);
        let history: Vec<ConversationTurn> = (0..15)
            .map(|i| ConversationTurn::new(format!("domanda {i}"), Some("risposta")))
            .collect();

        let text = "Parlami del progetto Decod";
        let intent = router.classify(text, &history);
        let reply = composer.compose(text, &history, &intent).await;

        assert_eq!(
            reply,
            "Decod decodifica segnali radio.\n\nPosso anche parlarti di: studi o tempo libero."
        );

        let request = stub.last_request();
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.max_tokens, 520);
        // system prompt + project context + 10 turns * 2 + utterance
        assert_eq!(request.messages.len(), 2 + 20 + 1);
        assert!(request.messages[1].content.contains("Nome: Decod"));
        assert_eq!(request.messages[2].content, "domanda 5");
        let last = request.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, text);
    }

    #[tokio::test]
    async fn test_unknown_without_keywords_reaches_model() {
        let stub = StubCompleter::replying("Posso aiutarti con il portfolio.");
        let (composer, router) = composer(stub.clone(), true);

        ask(&composer, &router, "che tempo fa a Messina?").await;
        let request = stub.last_request();
        assert!(request.messages[1].content.contains("Non sono stati forniti dati strutturati"));
    }

    #[tokio::test]
    async fn test_provider_error_returns_technical_message() {
        let stub = StubCompleter::failing(|| LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        let (composer, router) = composer(stub, true);

        let reply = ask(&composer, &router, "Parlami del progetto Decod").await;
        assert_eq!(reply, prompts::TECHNICAL_ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_client_timeout_returns_timeout_message() {
        let stub = StubCompleter::failing(|| LlmError::Timeout);
        let (composer, router) = composer(stub, true);

        let reply = ask(&composer, &router, "Parlami del progetto Decod").await;
        assert_eq!(reply, prompts::TIMEOUT_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_model_is_aborted() {
        let stub = StubCompleter::stalled();
        let (composer, router) = composer(stub.clone(), true);

        let reply = ask(&composer, &router, "Parlami del progetto Decod").await;
        assert_eq!(reply, prompts::TIMEOUT_REPLY);
        assert_eq!(stub.calls(), 1);
    }
}

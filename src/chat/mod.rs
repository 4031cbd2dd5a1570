//! The chat pipeline: intent routing, retrieval, composition, memory.

pub mod composer;
pub mod insights;
pub mod intent;
pub mod memory;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::kb::KnowledgeService;

pub use composer::{tidy_response, ComposedReply, ResponseComposer};
pub use insights::{InteractionAnalyzer, StatsSnapshot};
pub use intent::{ContactFields, Intent, IntentClassifier};
pub use memory::{ConversationMemory, ConversationTurn, Role, SessionSummary, TURN_WINDOW};

/// Reply when the user explicitly asks to schedule.
const EXPLICIT_SCHEDULING_REPLY: &str = "\
I'd love to help you set up a consultation to discuss your AI needs.

To book it, please use the Schedule Consultation form. It collects \
everything we need:

- Your contact details
- Preferred date and time
- Your specific requirements and questions

Our team will confirm your appointment within 24 hours and come prepared \
to discuss how Meridian Labs can help. Click the Schedule Consultation \
button to get started.";

/// Reply when a consultation is mentioned but not requested outright.
const SCHEDULING_MENTION_REPLY: &str = "\
Happy to dig into your AI plans.

If you'd like to talk it through with one of our engineers, the scheduling \
form lets you book a consultation at a time that works for you. No \
obligation either way.

In the meantime, feel free to ask me anything about our services.";

/// The chat endpoint's response body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    pub confidence: f32,
    pub processing_time: f64,
}

pub struct ChatService {
    classifier: IntentClassifier,
    memory: Arc<ConversationMemory>,
    composer: ResponseComposer,
    knowledge: Arc<KnowledgeService>,
    analyzer: Arc<InteractionAnalyzer>,
}

impl ChatService {
    pub fn new(
        memory: Arc<ConversationMemory>,
        composer: ResponseComposer,
        knowledge: Arc<KnowledgeService>,
        analyzer: Arc<InteractionAnalyzer>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            memory,
            composer,
            knowledge,
            analyzer,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Handle one chat turn.
    ///
    /// Consultation intents short-circuit to a canned form-direction reply;
    /// booking only ever happens through the scheduling endpoint, never as a
    /// side effect of chat. Everything else goes through retrieval and the
    /// composer. This path always returns an outcome, even when every
    /// external collaborator is down.
    pub async fn chat(&self, message: &str, session_id: &str) -> ChatOutcome {
        let started = Instant::now();

        let (reply, source_count) = match self.classifier.classify(message) {
            Intent::ScheduleConsultation { explicit: true } => {
                // Surface the lead for the sales team; booking itself only
                // ever happens through the scheduling endpoint.
                if let Some(fields) = self.classifier.extract_contact_fields(message) {
                    tracing::info!("consultation lead detected in chat: {:?}", fields.as_map());
                }
                (
                    ComposedReply {
                        text: EXPLICIT_SCHEDULING_REPLY.to_string(),
                        confidence: 0.9,
                    },
                    0,
                )
            }
            Intent::ScheduleConsultation { explicit: false } => (
                ComposedReply {
                    text: SCHEDULING_MENTION_REPLY.to_string(),
                    confidence: 0.8,
                },
                0,
            ),
            Intent::None => {
                let results = match self.knowledge.search(message, None).await {
                    Ok(results) => results,
                    Err(err) => {
                        // Degrade to an uninformed answer rather than failing
                        // the turn.
                        tracing::warn!("retrieval failed, composing without context: {}", err);
                        Vec::new()
                    }
                };

                let context = format_context(&results);
                let history = self.memory.history(session_id).await;
                let reply = self.composer.compose(message, &context, &history).await;
                (reply, results.len())
            }
        };

        self.memory
            .append(session_id, ConversationTurn::user(message))
            .await;
        self.memory
            .append(session_id, ConversationTurn::assistant(reply.text.clone()))
            .await;

        let processing_time = started.elapsed().as_secs_f64();
        self.analyzer
            .observe(message, reply.confidence, processing_time, source_count)
            .await;

        ChatOutcome {
            response: reply.text,
            session_id: session_id.to_string(),
            sources: None,
            confidence: reply.confidence,
            processing_time,
        }
    }
}

/// Concatenate retrieved chunk contents, no citation markers.
fn format_context(results: &[crate::kb::SearchResult]) -> String {
    if results.is_empty() {
        return "No relevant context found.".to_string();
    }
    results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::settings::{LlmSettings, RetrievalSettings};
    use crate::core::errors::ApiError;
    use crate::kb::DocumentStore;
    use crate::llm::{CompletionOptions, LlmProvider, PromptMessage};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StubProvider;

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(
            &self,
            _messages: Vec<PromptMessage>,
            _options: &CompletionOptions,
        ) -> Result<String, ApiError> {
            Ok("Here is what Meridian Labs can do for you.".to_string())
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn chat_service(dir: &TempDir) -> ChatService {
        let llm: Arc<dyn LlmProvider> = Arc::new(StubProvider);
        let store = Arc::new(DocumentStore::open(dir.path()).unwrap());
        let knowledge = Arc::new(KnowledgeService::new(
            store,
            llm.clone(),
            &RetrievalSettings::default(),
        ));
        ChatService::new(
            Arc::new(ConversationMemory::new()),
            ResponseComposer::new(llm, &LlmSettings::default()),
            knowledge,
            Arc::new(InteractionAnalyzer::new()),
        )
    }

    #[tokio::test]
    async fn explicit_scheduling_request_directs_to_the_form() {
        let dir = TempDir::new().unwrap();
        let service = chat_service(&dir);

        let outcome = service
            .chat(
                "I want to book a consultation, my name is Sam, email sam@acme.com, company Acme, March 3 2025 at 10 AM",
                "s1",
            )
            .await;

        assert_eq!(outcome.confidence, 0.9);
        assert!(outcome.response.contains("Schedule Consultation form"));
        // Per the persona: no contact collection in chat.
        assert!(!outcome.response.contains("sam@acme.com"));
    }

    #[tokio::test]
    async fn weak_mention_gets_the_softer_reply() {
        let dir = TempDir::new().unwrap();
        let service = chat_service(&dir);

        let outcome = service.chat("let's have a call sometime", "s1").await;
        assert_eq!(outcome.confidence, 0.8);
        assert!(outcome.response.contains("scheduling form"));
    }

    #[tokio::test]
    async fn general_question_goes_through_the_composer() {
        let dir = TempDir::new().unwrap();
        let service = chat_service(&dir);

        let outcome = service.chat("hello", "s1").await;
        assert_eq!(outcome.confidence, 0.8);
        assert!(outcome.response.contains("Meridian Labs"));
        assert!(outcome.sources.is_none());

        // Both turns were recorded.
        let history = service.memory.history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[test]
    fn empty_results_yield_placeholder_context() {
        assert_eq!(format_context(&[]), "No relevant context found.");
    }
}

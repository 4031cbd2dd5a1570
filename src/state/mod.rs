use std::sync::Arc;

use crate::chat::{ChatService, ConversationMemory, InteractionAnalyzer, ResponseComposer};
use crate::core::config::{AppPaths, Settings};
use crate::kb::{DocumentStore, KnowledgeService};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::scheduling::{AuditLog, Notifier, NullNotifier, SchedulingLedger, WebhookNotifier};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Every store is constructed exactly once here and lives for the process;
/// handlers receive it by `Arc` rather than through module-level globals, so
/// tests can build a fresh instance per case.
pub struct AppState {
    pub settings: Settings,
    pub paths: Arc<AppPaths>,
    pub llm: Arc<dyn LlmProvider>,
    pub knowledge: Arc<KnowledgeService>,
    pub memory: Arc<ConversationMemory>,
    pub analyzer: Arc<InteractionAnalyzer>,
    pub chat: ChatService,
    pub ledger: Arc<SchedulingLedger>,
    pub audit: Arc<AuditLog>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths).map_err(InitializationError::Config)?;

        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(
            settings.llm.base_url.clone(),
            settings.llm.api_key.clone(),
            settings.llm.chat_model.clone(),
            settings.llm.embedding_model.clone(),
        ));

        Self::with_parts(paths, settings, llm)
    }

    /// Wire the stores around explicit collaborators. Tests call this with a
    /// stub provider and a tempdir-backed `AppPaths`.
    pub fn with_parts(
        paths: Arc<AppPaths>,
        settings: Settings,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Arc<Self>, InitializationError> {
        // A corrupt document store is refused at startup; the scheduling
        // ledgers instead degrade to empty inside their constructors.
        let store = Arc::new(
            DocumentStore::open(&paths.knowledge_dir).map_err(InitializationError::Knowledge)?,
        );
        let knowledge = Arc::new(KnowledgeService::new(
            store,
            llm.clone(),
            &settings.retrieval,
        ));

        let notifier: Arc<dyn Notifier> = match &settings.notifications.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(
                url.clone(),
                settings.notifications.timeout_secs,
            )),
            None => Arc::new(NullNotifier),
        };

        let audit = Arc::new(AuditLog::open(
            paths.audit_log_path.clone(),
            paths.team_path.clone(),
            notifier,
            settings.contact.clone(),
        ));
        let ledger = Arc::new(SchedulingLedger::open(
            paths.requests_path.clone(),
            audit.clone(),
            settings.contact.clone(),
        ));

        let memory = Arc::new(ConversationMemory::new());
        let analyzer = Arc::new(InteractionAnalyzer::new());
        let chat = ChatService::new(
            memory.clone(),
            ResponseComposer::new(llm.clone(), &settings.llm),
            knowledge.clone(),
            analyzer.clone(),
        );

        Ok(Arc::new(AppState {
            settings,
            paths,
            llm,
            knowledge,
            memory,
            analyzer,
            chat,
            ledger,
            audit,
        }))
    }
}

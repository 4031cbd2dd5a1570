//! Knowledge ingestion: split, embed, insert.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::config::settings::RetrievalSettings;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

use super::chunker::TextChunker;
use super::seed;
use super::store::{DocumentChunk, DocumentStore, SearchResult, StoreStatus};

const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "text"];

pub struct KnowledgeService {
    store: Arc<DocumentStore>,
    llm: Arc<dyn LlmProvider>,
    chunker: TextChunker,
    top_k: usize,
}

impl KnowledgeService {
    pub fn new(
        store: Arc<DocumentStore>,
        llm: Arc<dyn LlmProvider>,
        retrieval: &RetrievalSettings,
    ) -> Self {
        Self {
            store,
            llm,
            chunker: TextChunker::new(retrieval.chunk_size, retrieval.chunk_overlap),
            top_k: retrieval.top_k,
        }
    }

    /// Split each text into chunks, embed the whole batch in one provider
    /// call, and append to the store. An embedding failure aborts the batch
    /// before anything is persisted.
    pub async fn add_texts(
        &self,
        texts: Vec<String>,
        metadata: Option<Vec<BTreeMap<String, String>>>,
    ) -> Result<usize, ApiError> {
        if texts.is_empty() {
            return Ok(0);
        }
        if let Some(meta) = &metadata {
            if meta.len() != texts.len() {
                return Err(ApiError::BadRequest(format!(
                    "{} texts but {} metadata entries",
                    texts.len(),
                    meta.len()
                )));
            }
        }

        let mut chunks = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let meta = metadata
                .as_ref()
                .map(|m| m[i].clone())
                .unwrap_or_else(|| default_metadata(i));
            for piece in self.chunker.split(text) {
                chunks.push(DocumentChunk::new(piece, meta.clone()));
            }
        }

        if chunks.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.llm.embed(&contents).await?;

        let added = chunks.len();
        self.store.add(chunks, embeddings).await?;
        tracing::info!("added {} chunks to the knowledge base", added);
        Ok(added)
    }

    /// Ingest an uploaded document. Only UTF-8 text formats are accepted;
    /// binary formats need external extraction before upload.
    pub async fn add_file(&self, filename: &str, bytes: &[u8]) -> Result<usize, ApiError> {
        let extension = filename
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "unsupported document type '{}': only plain-text uploads (.txt, .md) are accepted",
                filename
            )));
        }

        let content = std::str::from_utf8(bytes)
            .map_err(|_| ApiError::BadRequest(format!("{} is not valid UTF-8 text", filename)))?;
        if content.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{} contains no text", filename)));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), filename.to_string());
        metadata.insert("type".to_string(), "company_document".to_string());

        self.add_texts(vec![content.to_string()], Some(vec![metadata]))
            .await
    }

    pub async fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<SearchResult>, ApiError> {
        let inputs = vec![query.to_string()];
        let query_embedding = self
            .llm
            .embed(&inputs)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("embedding provider returned nothing".to_string()))?;

        Ok(self
            .store
            .search(&query_embedding, k.unwrap_or(self.top_k))
            .await)
    }

    /// Load the built-in seed corpus.
    pub async fn reinitialize(&self) -> Result<usize, ApiError> {
        let docs = seed::seed_documents();
        let texts: Vec<String> = docs.iter().map(|d| d.content.to_string()).collect();
        let metadata: Vec<BTreeMap<String, String>> =
            docs.iter().map(seed::seed_metadata).collect();
        self.add_texts(texts, Some(metadata)).await
    }

    pub async fn status(&self) -> StoreStatus {
        self.store.status().await
    }
}

fn default_metadata(index: usize) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), format!("text_{}", index));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionOptions, PromptMessage};
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Embeds every text as a constant vector; errors when told to.
    struct StubProvider {
        fail_embed: bool,
    }

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
            Ok("stub reply".to_string())
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            if self.fail_embed {
                return Err(ApiError::ServiceUnavailable("embedding offline".to_string()));
            }
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn service(dir: &TempDir, fail_embed: bool) -> (KnowledgeService, Arc<DocumentStore>) {
        let store = Arc::new(DocumentStore::open(dir.path()).unwrap());
        let svc = KnowledgeService::new(
            store.clone(),
            Arc::new(StubProvider { fail_embed }),
            &RetrievalSettings::default(),
        );
        (svc, store)
    }

    #[tokio::test]
    async fn ingests_and_searches() {
        let dir = TempDir::new().unwrap();
        let (svc, store) = service(&dir, false);

        let added = svc
            .add_texts(vec!["Our services include custom models.".to_string()], None)
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len().await, 1);

        let results = svc.search("services", None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "text_0");
    }

    #[tokio::test]
    async fn embedding_failure_aborts_whole_batch() {
        let dir = TempDir::new().unwrap();
        let (svc, store) = service(&dir, true);

        let err = svc
            .add_texts(vec!["doomed text".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn rejects_non_text_uploads() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(&dir, false);

        let err = svc.add_file("brochure.pdf", b"%PDF-1.7").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn accepts_markdown_uploads() {
        let dir = TempDir::new().unwrap();
        let (svc, store) = service(&dir, false);

        let added = svc
            .add_file("notes.md", "# Heading\n\nSome body text.".as_bytes())
            .await
            .unwrap();
        assert!(added >= 1);
        assert!(!store.is_empty().await);
        let status = store.status().await;
        assert!(status.document_sources.contains(&"notes.md".to_string()));
        assert!(status
            .document_types
            .contains(&"company_document".to_string()));
    }

    #[tokio::test]
    async fn seeds_builtin_corpus() {
        let dir = TempDir::new().unwrap();
        let (svc, store) = service(&dir, false);

        let added = svc.reinitialize().await.unwrap();
        assert!(added >= seed::seed_documents().len());
        let status = store.status().await;
        assert!(status.document_sources.contains(&"services".to_string()));
    }
}

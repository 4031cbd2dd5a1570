//! Append-only document store with linear similarity search.
//!
//! Chunks and their embedding vectors live in memory and are mirrored to two
//! JSON files (document list + embedding list) on every mutation. Search is
//! a brute-force dot-product scan; at the hand-curated knowledge-base scale
//! this beats carrying an index.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::errors::ApiError;

const DOCUMENTS_FILE: &str = "documents.json";
const EMBEDDINGS_FILE: &str = "embeddings.json";

/// A stored text chunk. Immutable once added; identified by insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    fn source(&self) -> String {
        self.metadata
            .get("source")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// One search hit, produced per query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub score: f32,
    pub metadata: BTreeMap<String, String>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub total_documents: usize,
    pub total_embeddings: usize,
    pub persist_directory: String,
    pub document_sources: Vec<String>,
    pub document_types: Vec<String>,
}

struct StoreInner {
    documents: Vec<DocumentChunk>,
    embeddings: Vec<Vec<f32>>,
}

pub struct DocumentStore {
    documents_path: PathBuf,
    embeddings_path: PathBuf,
    inner: RwLock<StoreInner>,
}

impl DocumentStore {
    /// Open the store rooted at `dir`, loading any persisted state.
    ///
    /// Both files absent means a fresh store. A half-written or unparsable
    /// state (one file missing, malformed JSON, mismatched lengths) is
    /// refused outright rather than silently reset.
    pub fn open(dir: &Path) -> Result<Self, ApiError> {
        fs::create_dir_all(dir).map_err(ApiError::internal)?;
        let documents_path = dir.join(DOCUMENTS_FILE);
        let embeddings_path = dir.join(EMBEDDINGS_FILE);

        let inner = match (documents_path.exists(), embeddings_path.exists()) {
            (false, false) => StoreInner {
                documents: Vec::new(),
                embeddings: Vec::new(),
            },
            (true, true) => {
                let documents: Vec<DocumentChunk> = read_json(&documents_path)?;
                let embeddings: Vec<Vec<f32>> = read_json(&embeddings_path)?;
                if documents.len() != embeddings.len() {
                    return Err(ApiError::Internal(format!(
                        "document store corrupt: {} documents but {} embeddings under {}",
                        documents.len(),
                        embeddings.len(),
                        dir.display()
                    )));
                }
                StoreInner {
                    documents,
                    embeddings,
                }
            }
            _ => {
                return Err(ApiError::Internal(format!(
                    "document store corrupt: partial state under {}",
                    dir.display()
                )))
            }
        };

        Ok(Self {
            documents_path,
            embeddings_path,
            inner: RwLock::new(inner),
        })
    }

    /// Append chunks with their embeddings and write both files through.
    ///
    /// Nothing is appended unless every chunk carries a vector, so a failed
    /// embedding batch upstream can never leave the two files out of step.
    pub async fn add(
        &self,
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize, ApiError> {
        if chunks.len() != embeddings.len() {
            return Err(ApiError::Internal(format!(
                "refusing to add {} chunks with {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut inner = self.inner.write().await;
        inner.documents.extend(chunks);
        inner.embeddings.extend(embeddings);
        let total = inner.documents.len();
        self.persist(&inner)?;
        tracing::info!("document store now holds {} chunks", total);
        Ok(total)
    }

    /// Top-k chunks by dot-product similarity, descending.
    ///
    /// The sort is stable, so equal scores keep insertion order.
    pub async fn search(&self, query_embedding: &[f32], k: usize) -> Vec<SearchResult> {
        let inner = self.inner.read().await;

        let mut scored: Vec<SearchResult> = inner
            .documents
            .iter()
            .zip(inner.embeddings.iter())
            .map(|(doc, emb)| SearchResult {
                content: doc.content.clone(),
                score: dot_product(query_embedding, emb),
                metadata: doc.metadata.clone(),
                source: doc.source(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }

    pub async fn status(&self) -> StoreStatus {
        let inner = self.inner.read().await;

        let sources: BTreeSet<String> = inner.documents.iter().map(|doc| doc.source()).collect();
        let types: BTreeSet<String> = inner
            .documents
            .iter()
            .map(|doc| {
                doc.metadata
                    .get("type")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string())
            })
            .collect();

        StoreStatus {
            total_documents: inner.documents.len(),
            total_embeddings: inner.embeddings.len(),
            persist_directory: self
                .documents_path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            document_sources: sources.into_iter().collect(),
            document_types: types.into_iter().collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn persist(&self, inner: &StoreInner) -> Result<(), ApiError> {
        write_json(&self.documents_path, &inner.documents)?;
        write_json(&self.embeddings_path, &inner.embeddings)?;
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ApiError> {
    let contents = fs::read_to_string(path).map_err(ApiError::internal)?;
    serde_json::from_str(&contents)
        .map_err(|e| ApiError::Internal(format!("document store corrupt at {}: {}", path.display(), e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ApiError> {
    let contents = serde_json::to_string(value).map_err(ApiError::internal)?;
    fs::write(path, contents).map_err(ApiError::internal)
}

/// Plain dot product; mismatched lengths score over the common prefix.
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(content: &str, source: &str) -> DocumentChunk {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), source.to_string());
        DocumentChunk::new(content, metadata)
    }

    #[tokio::test]
    async fn search_orders_by_score_and_caps_at_k() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();

        store
            .add(
                vec![
                    chunk("pricing guide", "a"),
                    chunk("services overview", "b"),
                    chunk("contact page", "c"),
                ],
                vec![
                    vec![0.2, 0.0],
                    vec![0.9, 0.0],
                    vec![0.5, 0.0],
                ],
            )
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "b");
        assert_eq!(results[1].source, "c");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();

        store
            .add(
                vec![chunk("first", "a"), chunk("second", "b"), chunk("third", "c")],
                vec![vec![1.0], vec![1.0], vec![1.0]],
            )
            .await
            .unwrap();

        let results = store.search(&[1.0], 3).await;
        let sources: Vec<&str> = results.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        {
            let store = DocumentStore::open(dir.path()).unwrap();
            store
                .add(vec![chunk("kept across restarts", "a")], vec![vec![1.0, 2.0]])
                .await
                .unwrap();
        }

        let reopened = DocumentStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len().await, 1);
        let results = reopened.search(&[1.0, 0.0], 5).await;
        assert_eq!(results[0].content, "kept across restarts");
    }

    #[tokio::test]
    async fn refuses_mismatched_batch() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();

        let err = store
            .add(vec![chunk("only one", "a")], vec![])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refusing"));
        assert!(store.is_empty().await);
    }

    #[test]
    fn corrupt_file_fails_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DOCUMENTS_FILE), "not json").unwrap();
        std::fs::write(dir.path().join(EMBEDDINGS_FILE), "[]").unwrap();
        assert!(DocumentStore::open(dir.path()).is_err());
    }

    #[test]
    fn partial_state_fails_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DOCUMENTS_FILE), "[]").unwrap();
        assert!(DocumentStore::open(dir.path()).is_err());
    }

    #[tokio::test]
    async fn absent_files_mean_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();
        assert!(store.is_empty().await);
        assert!(store.search(&[1.0], 5).await.is_empty());
    }
}

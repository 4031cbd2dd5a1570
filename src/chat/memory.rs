//! Per-session conversation history.
//!
//! An in-process map of bounded turn rings. Sessions are advisory and
//! non-durable: they live until cleared or the process restarts.

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Turns retained per session; older turns are evicted.
pub const TURN_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: usize,
    pub topics_discussed: Vec<String>,
    pub last_activity: Option<String>,
    pub history: Vec<ConversationTurn>,
}

pub struct ConversationMemory {
    window: usize,
    sessions: RwLock<HashMap<String, VecDeque<ConversationTurn>>>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::with_window(TURN_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Append a turn, creating the session on first use and evicting the
    /// oldest turn once the window is full.
    pub async fn append(&self, session_id: &str, turn: ConversationTurn) {
        let mut sessions = self.sessions.write().await;
        let turns = sessions.entry(session_id.to_string()).or_default();
        turns.push_back(turn);
        while turns.len() > self.window {
            turns.pop_front();
        }
    }

    /// Current turns, oldest first. Unknown sessions yield an empty list.
    pub async fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop the session entirely. Returns whether it existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn summary(&self, session_id: &str) -> SessionSummary {
        let history = self.history(session_id).await;
        SessionSummary {
            session_id: session_id.to_string(),
            message_count: history.len(),
            topics_discussed: extract_topics(&history),
            last_activity: history.last().map(|turn| turn.content.clone()),
            history,
        }
    }
}

/// Coarse topic tags over the conversation, first matching bucket per turn.
fn extract_topics(history: &[ConversationTurn]) -> Vec<String> {
    let mut topics = BTreeSet::new();
    for turn in history {
        let content = turn.content.to_lowercase();
        if content.contains("pricing") || content.contains("cost") {
            topics.insert("pricing");
        } else if content.contains("service") || content.contains("offer") {
            topics.insert("services");
        } else if content.contains("demo") || content.contains("consultation") {
            topics.insert("demo");
        } else if content.contains("implementation") || content.contains("deploy") {
            topics.insert("implementation");
        }
    }
    topics.into_iter().map(str::to_string).collect()
}

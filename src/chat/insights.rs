//! Heuristic per-turn interaction analysis and aggregate statistics.
//!
//! Keyword scoring over the raw message plus the response confidence. The
//! numbers feed the admin analytics endpoint; nothing downstream branches on
//! them.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::Mutex;

const STOP_WORDS: [&str; 14] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

const TECHNICAL_TERMS: [&str; 6] = [
    "api",
    "integration",
    "implementation",
    "deployment",
    "architecture",
    "framework",
];

#[derive(Debug, Clone, Serialize)]
pub struct InteractionAnalysis {
    pub query_type: String,
    pub sentiment: String,
    pub keywords: Vec<String>,
    pub complexity: f32,
    pub engagement_score: f32,
    pub lead_quality: String,
    pub topic: String,
    pub user_intent: String,
    pub follow_up_needed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub query_type_distribution: BTreeMap<String, u64>,
    pub average_engagement_score: f32,
    pub average_processing_time: f64,
    pub most_common_query_type: String,
}

#[derive(Default)]
struct StatsInner {
    total_requests: u64,
    query_types: BTreeMap<String, u64>,
    engagement_sum: f64,
    engagement_count: u64,
    processing_time_sum: f64,
    processing_time_count: u64,
}

#[derive(Default)]
pub struct InteractionAnalyzer {
    stats: Mutex<StatsInner>,
}

impl InteractionAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze one chat turn and fold it into the running statistics.
    pub async fn observe(
        &self,
        message: &str,
        confidence: f32,
        processing_time: f64,
        source_count: usize,
    ) -> InteractionAnalysis {
        let analysis = analyze(message, confidence, source_count);

        let mut stats = self.stats.lock().await;
        stats.total_requests += 1;
        *stats
            .query_types
            .entry(analysis.query_type.clone())
            .or_insert(0) += 1;
        stats.engagement_sum += f64::from(analysis.engagement_score);
        stats.engagement_count += 1;
        if processing_time > 0.0 {
            stats.processing_time_sum += processing_time;
            stats.processing_time_count += 1;
        }

        analysis
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let stats = self.stats.lock().await;
        let most_common = stats
            .query_types
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "none".to_string());

        StatsSnapshot {
            total_requests: stats.total_requests,
            query_type_distribution: stats.query_types.clone(),
            average_engagement_score: if stats.engagement_count > 0 {
                (stats.engagement_sum / stats.engagement_count as f64) as f32
            } else {
                0.0
            },
            average_processing_time: if stats.processing_time_count > 0 {
                stats.processing_time_sum / stats.processing_time_count as f64
            } else {
                0.0
            },
            most_common_query_type: most_common,
        }
    }
}

fn analyze(message: &str, confidence: f32, source_count: usize) -> InteractionAnalysis {
    let query_type = classify_query_type(message);
    let complexity = complexity_score(message);
    let engagement_score = engagement_score(message, confidence, complexity, source_count);

    InteractionAnalysis {
        lead_quality: lead_quality(&query_type, complexity).to_string(),
        follow_up_needed: needs_follow_up(&query_type),
        sentiment: sentiment(message).to_string(),
        keywords: keywords(message),
        topic: topic(message).to_string(),
        user_intent: user_intent(message).to_string(),
        query_type,
        complexity,
        engagement_score,
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text.contains(word))
}

fn classify_query_type(message: &str) -> String {
    let lowered = message.to_lowercase();
    let kind = if contains_any(&lowered, &["what", "define", "explain", "meaning"]) {
        "definition"
    } else if contains_any(&lowered, &["how", "process", "steps", "implement", "deploy"]) {
        "how_to"
    } else if contains_any(&lowered, &["why", "benefit", "advantage", "purpose"]) {
        "benefits"
    } else if contains_any(&lowered, &["service", "offer", "provide", "company", "capabilities"]) {
        "services"
    } else if contains_any(&lowered, &["price", "cost", "fee", "rate", "budget"]) {
        "pricing"
    } else if contains_any(&lowered, &["contact", "reach", "speak", "talk"]) {
        "contact"
    } else {
        "general"
    };
    kind.to_string()
}

fn sentiment(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    let positive = ["good", "great", "excellent", "amazing", "love", "like", "interested"];
    let negative = ["bad", "terrible", "awful", "hate", "dislike", "problem", "issue"];

    let positive_count = positive.iter().filter(|w| lowered.contains(*w)).count();
    let negative_count = negative.iter().filter(|w| lowered.contains(*w)).count();

    if positive_count > negative_count {
        "positive"
    } else if negative_count > positive_count {
        "negative"
    } else {
        "neutral"
    }
}

fn keywords(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .take(10)
        .map(str::to_string)
        .collect()
}

fn complexity_score(message: &str) -> f32 {
    let mut score: f32 = 0.0;

    let len = message.len();
    if len > 100 {
        score += 0.3;
    } else if len > 50 {
        score += 0.2;
    } else if len > 20 {
        score += 0.1;
    }

    if message.contains('?') {
        score += 0.2;
    }

    if contains_any(&message.to_lowercase(), &TECHNICAL_TERMS) {
        score += 0.3;
    }

    score.min(1.0)
}

fn engagement_score(message: &str, confidence: f32, complexity: f32, source_count: usize) -> f32 {
    let mut score: f32 = 0.5;

    let len = message.len();
    if len > 50 {
        score += 0.2;
    } else if len > 20 {
        score += 0.1;
    }

    score += confidence * 0.3;
    score += (source_count as f32 * 0.1).min(0.2);
    score += complexity * 0.2;

    score.min(1.0)
}

fn lead_quality(query_type: &str, complexity: f32) -> &'static str {
    match query_type {
        "pricing" | "services" if complexity > 0.5 => "high",
        "how_to" | "benefits" if complexity > 0.3 => "medium",
        _ => "low",
    }
}

fn topic(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    if contains_any(&lowered, &["agentic", "ai", "artificial intelligence", "machine learning"]) {
        "ai_solutions"
    } else if contains_any(&lowered, &["service", "offer", "provide", "capability"]) {
        "services"
    } else if contains_any(&lowered, &["implement", "deploy", "setup", "integration"]) {
        "implementation"
    } else if contains_any(&lowered, &["cost", "price", "budget", "pricing"]) {
        "pricing"
    } else if contains_any(&lowered, &["contact", "reach", "speak", "demo"]) {
        "contact"
    } else {
        "general"
    }
}

fn user_intent(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    if contains_any(&lowered, &["buy", "purchase", "order", "get"]) {
        "purchase"
    } else if contains_any(&lowered, &["learn", "understand", "know", "explain"]) {
        "learn"
    } else if contains_any(&lowered, &["help", "support", "problem", "issue"]) {
        "support"
    } else if contains_any(&lowered, &["demo", "trial", "test", "try"]) {
        "demo"
    } else {
        "explore"
    }
}

fn needs_follow_up(query_type: &str) -> bool {
    matches!(query_type, "pricing" | "services" | "how_to" | "contact")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_questions_are_high_value_leads() {
        let analysis = analyze(
            "What would the pricing look like for an API integration project across two regions?",
            0.8,
            3,
        );
        // "what" wins the elif chain before "price".
        assert_eq!(analysis.query_type, "definition");
        assert!(analysis.complexity > 0.5);
        assert!(analysis.engagement_score > 0.8);
    }

    #[test]
    fn short_greeting_scores_low() {
        let analysis = analyze("hi", 0.0, 0);
        assert_eq!(analysis.query_type, "general");
        assert_eq!(analysis.lead_quality, "low");
        assert!((analysis.engagement_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sentiment_counts_keyword_hits() {
        assert_eq!(sentiment("this looks great, I am interested"), "positive");
        assert_eq!(sentiment("we have a problem and an issue"), "negative");
        assert_eq!(sentiment("tell me more"), "neutral");
    }

    #[test]
    fn keywords_drop_stop_words() {
        let words = keywords("the cost of an integration for the team");
        assert!(words.contains(&"cost".to_string()));
        assert!(words.contains(&"integration".to_string()));
        assert!(!words.contains(&"the".to_string()));
        assert!(!words.contains(&"of".to_string()));
    }

    #[tokio::test]
    async fn snapshot_aggregates_observations() {
        let analyzer = InteractionAnalyzer::new();
        analyzer.observe("how do we deploy this?", 0.8, 0.4, 2).await;
        analyzer.observe("how long does setup take?", 0.8, 0.6, 1).await;
        analyzer.observe("hello there", 0.0, 0.2, 0).await;

        let snapshot = analyzer.snapshot().await;
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.query_type_distribution.get("how_to"), Some(&2));
        assert_eq!(snapshot.most_common_query_type, "how_to");
        assert!(snapshot.average_processing_time > 0.0);
        assert!(snapshot.average_engagement_score > 0.0);
    }
}

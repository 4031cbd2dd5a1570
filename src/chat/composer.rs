//! Prompt assembly, the single completion call, and response tidying.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::config::settings::LlmSettings;
use crate::core::errors::ApiError;
use crate::llm::{CompletionOptions, LlmProvider, PromptMessage};

use super::memory::{ConversationTurn, Role};

/// History turns folded into the prompt.
const HISTORY_LOOKBACK: usize = 6;

/// Persona and formatting contract for the assistant.
///
/// The scheduling rule matters: the assistant must direct booking to the
/// scheduling form and never collect contact details in chat, so a chat turn
/// can never create a consultation on its own.
const SYSTEM_PROMPT: &str = "\
You are Relay, a sales-focused AI assistant representing Meridian Labs, a \
custom AI solutions company. Your goals are to promote Meridian Labs' \
services, identify each visitor's needs, and give structured, actionable \
answers that build on the conversation so far.

Response guidelines:
- Keep responses concise and scannable (100-200 words)
- Start with a brief, confident paragraph that directly addresses the question
- Use bullet points with dashes (-) for lists, features, benefits, or examples
- Keep each bullet point short (1-2 lines) and on its own line
- Separate sections with a single blank line
- End with a brief call to action when it fits naturally
- Write in plain text only: no asterisks, no markdown emphasis
- Never use numbered lists; use dashed bullets instead
- Never mention sources, citations, or where information came from
- Present information as your own knowledge and expertise
- Reference earlier turns of the conversation when relevant

Contact information:
- When asked for contact details, provide phone +1 (555) 014-7788 and email \
hello@meridianlabs.ai
- Offer contact details proactively when a visitor shows buying interest

Consultation scheduling:
- When a visitor wants to schedule a consultation, direct them to the \
Schedule Consultation form
- Never ask for their contact details in the chat conversation
- Explain that the form collects everything needed and that the team \
confirms appointments within 24 hours

Always introduce yourself as Relay from Meridian Labs, keep a professional \
and helpful tone, and relate answers back to how Meridian Labs can help.";

/// A finished chat reply with its confidence.
#[derive(Debug, Clone)]
pub struct ComposedReply {
    pub text: String,
    pub confidence: f32,
}

pub struct ResponseComposer {
    llm: Arc<dyn LlmProvider>,
    options: CompletionOptions,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: &LlmSettings) -> Self {
        Self {
            llm,
            options: CompletionOptions {
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
            },
        }
    }

    /// One completion call over persona + lookback + retrieved context.
    ///
    /// Provider errors never escape: the chat path always yields a reply, so
    /// a failure becomes an apology with zero confidence.
    pub async fn compose(
        &self,
        query: &str,
        context: &str,
        history: &[ConversationTurn],
    ) -> ComposedReply {
        let messages = vec![
            PromptMessage::system(SYSTEM_PROMPT),
            PromptMessage::user(build_prompt(query, context, history)),
        ];

        match self.llm.chat(messages, &self.options).await {
            Ok(raw) => ComposedReply {
                text: tidy_response(&raw),
                confidence: 0.8,
            },
            Err(err) => {
                tracing::warn!("chat completion failed: {}", err);
                ComposedReply {
                    text: apology(&err),
                    confidence: 0.0,
                }
            }
        }
    }
}

fn apology(err: &ApiError) -> String {
    format!(
        "I apologize, but I encountered an error while processing your request: {}",
        err
    )
}

fn build_prompt(query: &str, context: &str, history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return format!("Context: {}\n\nUser Question: {}", context, query);
    }

    let mut prompt = String::from("Previous conversation:\n");
    let start = history.len().saturating_sub(HISTORY_LOOKBACK);
    for turn in &history[start..] {
        let speaker = match turn.role {
            Role::User => "Human",
            Role::Assistant => "Assistant",
        };
        prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
    }
    prompt.push_str(&format!(
        "\nCurrent context: {}\n\nUser Question: {}",
        context, query
    ));
    prompt
}

fn numbered_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(\s*)\d+\.\s+").expect("numbered list pattern"))
}

fn bullet_glyph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(\s*)[•·▪▫]\s*").expect("bullet glyph pattern"))
}

fn dash_spacing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(\s*)-[ \t]*(\S)").expect("dash spacing pattern"))
}

fn excess_blank_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("blank collapse pattern"))
}

/// Deterministic cleanup of model output: plain text, dashed bullets, single
/// blank lines. The passes run in a fixed order and are idempotent, so
/// re-tidying already-tidy text changes nothing.
pub fn tidy_response(raw: &str) -> String {
    // Strip markdown emphasis outright; the persona forbids it anyway.
    let text = raw.replace('*', "");

    let text = numbered_list_re().replace_all(&text, "$1- ");
    let text = bullet_glyph_re().replace_all(&text, "$1- ");
    let text = dash_spacing_re().replace_all(&text, "$1- $2");

    let text = blank_line_before_bullets(&text);
    let text = excess_blank_re().replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Ensure a bullet block is separated from the paragraph above it.
fn blank_line_before_bullets(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let prev = lines[i - 1];
            if is_bullet(line) && !is_bullet(prev) && !prev.trim().is_empty() {
                out.push("");
            }
        }
        out.push(line);
    }

    out.join("\n")
}

fn is_bullet(line: &str) -> bool {
    line.trim_start().starts_with("- ")
}

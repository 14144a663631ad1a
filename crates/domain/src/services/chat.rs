//! Chat responder for the group conversation.
//!
//! Two modes are supported. Standard mode answers from a fixed set of
//! replies after a keyword relevance check. Assisted mode forwards the message
//! with group context to a completion service and falls back to a static
//! apology when the service fails. The responder keeps no state between calls.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::models::goal::{GoalType, GoalWithProgress};

/// Vocabulary that marks a message as on-topic in standard mode.
pub const RELEVANT_KEYWORDS: &[&str] = &[
    "kvadratická",
    "rovnice",
    "diskriminant",
    "lineární",
    "ax²",
    "bx",
    "matematika",
    "řešení",
    "kořen",
    "graf",
    "parabola",
    "vzorec",
    "funkce",
    "výpočet",
];

pub const OFF_TOPIC_WARNING: &str =
    "Tato zpráva nesouvisí s cíli skupiny. Zaměřte se na kvadratické rovnice.";

pub const OFF_TOPIC_REPLY: &str = "Rozumím vaší otázce, ale zdá se, že nesouvisí s aktuálním cílem skupiny. Pojďme se zaměřit na kvadratické rovnice! \n\nMůžete se mě zeptat například:\n• Jak vypočítám diskriminant?\n• Jaký je rozdíl mezi lineární a kvadratickou rovnicí?\n• Můžete mi ukázat příklad řešení?";

pub const ASSISTED_FALLBACK_REPLY: &str = "Omlouvám se, AI učitel momentálně není dostupný. Zkusíme to za chvilku znovu, nebo můžete přepnout na standardní režim.";

pub const STANDARD_REPLIES: &[&str] = &[
    "Výborná otázka! Kvadratické rovnice mají tvar ax² + bx + c = 0, kde a ≠ 0.\n\n**Diskriminant** se počítá jako D = b² - 4ac:\n• Pokud D > 0, rovnice má 2 různé reálné kořeny\n• Pokud D = 0, rovnice má 1 dvojnásobný kořen\n• Pokud D < 0, rovnice nemá reálné kořeny\n\nChcete si vyzkoušet konkrétní příklad?",
    "Skvěle! Hlavní rozdíl mezi lineární a kvadratickou rovnicí:\n\n**Lineární rovnice (ax + b = 0):**\n• Graf je přímka\n• Maximálně 1 řešení\n• Stupeň 1\n\n**Kvadratické rovnice (ax² + bx + c = 0):**\n• Graf je parabola\n• Maximálně 2 řešení\n• Stupeň 2\n\nKteré téma byste chtěli probrat podrobněji?",
    "Perfekt! Pojďme si ukázat řešení kvadratické rovnice krok za krokem:\n\n**Příklad:** x² - 5x + 6 = 0\n\n1) Identifikujeme: a = 1, b = -5, c = 6\n2) Spočítáme diskriminant: D = (-5)² - 4·1·6 = 25 - 24 = 1\n3) D > 0, takže má 2 kořeny\n4) x₁,₂ = (5 ± √1) / 2 = (5 ± 1) / 2\n5) x₁ = 3, x₂ = 2\n\nZkuste si sami řešit: **2x² - 7x + 3 = 0**",
];

pub const DEFAULT_SYSTEM_PROMPT: &str = "Jsi trpělivý učitel matematiky pro žáky základní a střední školy. Odpovídej česky, stručně a srozumitelně. Nevyřešíš úlohu za studenta, ale navedeš ho otázkami a nápovědami. Drž se tématu skupiny a cílů studenta.";

/// History entries longer than this are cut in the assisted prompt.
const HISTORY_SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Standard,
    #[serde(alias = "ai")]
    Assisted,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Standard => "standard",
            ChatMode::Assisted => "assisted",
        }
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ChatMode::Standard),
            "assisted" | "ai" => Ok(ChatMode::Assisted),
            _ => Err(format!("Invalid chat mode: {}", s)),
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One earlier turn of the conversation, supplied by the caller.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub from_student: bool,
    pub content: String,
}

/// Everything the responder may use besides the message itself.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub group_name: Option<String>,
    pub group_description: Option<String>,
    pub goals: Vec<GoalWithProgress>,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub content: String,
    pub mode: ChatMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub degraded: bool,
    /// False when standard mode judged the message off-topic.
    pub is_goal_relevant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

/// Prompt handed to a completion service.
#[derive(Debug, Clone)]
pub struct CompletionPrompt {
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone)]
pub struct CompletionOutput {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion service is not configured")]
    NotConfigured,

    #[error("Completion request timed out")]
    Timeout,

    #[error("Completion service error: {0}")]
    ServiceError(String),

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
}

/// External text completion service.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<CompletionOutput, CompletionError>;
}

/// Mock completion client for development and testing.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionClient {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    pub reply: Option<String>,
}

impl MockCompletionClient {
    pub fn replying(reply: &str) -> Self {
        Self {
            simulate_failure: false,
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            reply: None,
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<CompletionOutput, CompletionError> {
        if self.simulate_failure {
            tracing::warn!("Mock completion client simulating failure");
            return Err(CompletionError::ServiceError("Simulated failure".to_string()));
        }

        tracing::debug!(
            messages = prompt.messages.len(),
            "Mock: Would call completion service"
        );

        Ok(CompletionOutput {
            content: self.reply.clone().unwrap_or_else(|| "OK".to_string()),
            usage: None,
        })
    }
}

/// True when `message` mentions any of the topic keywords.
pub fn is_goal_relevant(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RELEVANT_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Builds the context block appended to the system prompt.
pub fn build_context_block(context: &ChatContext) -> String {
    let mut out = String::new();

    if let Some(name) = &context.group_name {
        out.push_str(&format!(
            "\n\nKONTEXT SKUPINY:\n- Název: {}\n- Cíl: {}",
            name,
            context.group_description.as_deref().unwrap_or("")
        ));
    }

    if !context.goals.is_empty() {
        out.push_str("\n\nAKTUÁLNÍ CÍLE STUDENTA:\n");
        for (i, g) in context.goals.iter().enumerate() {
            let status = match g.goal.goal_type {
                GoalType::Boolean if g.is_completed => "✅ Splněno".to_string(),
                GoalType::Boolean => "❌ Nesplněno".to_string(),
                GoalType::Percentage => format!(
                    "📊 {}% ({}/{})",
                    g.percent,
                    g.current_value,
                    g.goal.effective_target()
                ),
            };
            out.push_str(&format!("{}. {} - {}\n", i + 1, g.goal.title, status));
        }
    }

    if !context.history.is_empty() {
        out.push_str("\n\nPOSLEDNÍ ZPRÁVY V KONVERZACI:\n");
        for turn in &context.history {
            let speaker = if turn.from_student { "Student" } else { "Učitel" };
            out.push_str(&format!("{}: {}\n", speaker, snippet(&turn.content)));
        }
    }

    out
}

fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(HISTORY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Stateless chat responder.
#[derive(Clone)]
pub struct ChatResponder {
    client: Option<Arc<dyn CompletionClient>>,
    system_prompt: String,
}

impl ChatResponder {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, system_prompt: Option<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    pub async fn respond(&self, mode: ChatMode, message: &str, context: &ChatContext) -> ChatReply {
        match mode {
            ChatMode::Standard => self.respond_standard(message),
            ChatMode::Assisted => self.respond_assisted(message, context).await,
        }
    }

    fn respond_standard(&self, message: &str) -> ChatReply {
        if !is_goal_relevant(message) {
            return ChatReply {
                content: OFF_TOPIC_REPLY.to_string(),
                mode: ChatMode::Standard,
                warning: Some(OFF_TOPIC_WARNING.to_string()),
                degraded: false,
                is_goal_relevant: false,
                usage: None,
            };
        }

        let content = STANDARD_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(STANDARD_REPLIES[0]);

        ChatReply {
            content: content.to_string(),
            mode: ChatMode::Standard,
            warning: None,
            degraded: false,
            is_goal_relevant: true,
            usage: None,
        }
    }

    async fn respond_assisted(&self, message: &str, context: &ChatContext) -> ChatReply {
        let prompt = CompletionPrompt {
            messages: vec![
                PromptMessage {
                    role: PromptRole::System,
                    content: format!("{}{}", self.system_prompt, build_context_block(context)),
                },
                PromptMessage {
                    role: PromptRole::User,
                    content: message.to_string(),
                },
            ],
        };

        let result = match &self.client {
            Some(client) => client.complete(&prompt).await,
            None => Err(CompletionError::NotConfigured),
        };

        match result {
            Ok(output) if !output.content.trim().is_empty() => ChatReply {
                content: output.content,
                mode: ChatMode::Assisted,
                warning: None,
                degraded: false,
                is_goal_relevant: true,
                usage: output.usage,
            },
            Ok(_) => {
                tracing::warn!("Completion service returned empty content, using fallback reply");
                Self::fallback()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Completion service failed, using fallback reply");
                Self::fallback()
            }
        }
    }

    fn fallback() -> ChatReply {
        ChatReply {
            content: ASSISTED_FALLBACK_REPLY.to_string(),
            mode: ChatMode::Assisted,
            warning: None,
            degraded: true,
            is_goal_relevant: true,
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::goal::Goal;
    use chrono::Utc;
    use uuid::Uuid;

    fn goal_view(goal_type: GoalType, target: i32, current: i32, percent: u8, done: bool) -> GoalWithProgress {
        GoalWithProgress {
            goal: Goal {
                id: Uuid::new_v4(),
                group_id: Uuid::nil(),
                title: "Spočítej diskriminant".into(),
                description: None,
                goal_type,
                target_value: target,
                order_index: 0,
                created_at: Utc::now(),
            },
            progress_id: None,
            current_value: current,
            is_completed: done,
            percent,
        }
    }

    #[test]
    fn test_chat_mode_aliases() {
        assert_eq!("ai".parse::<ChatMode>().unwrap(), ChatMode::Assisted);
        assert_eq!(
            serde_json::from_str::<ChatMode>("\"ai\"").unwrap(),
            ChatMode::Assisted
        );
        assert_eq!(ChatMode::default(), ChatMode::Standard);
    }

    #[test]
    fn test_keyword_relevance() {
        assert!(is_goal_relevant("co je diskriminant"));
        assert!(is_goal_relevant("Jak nakreslím GRAF funkce?"));
        assert!(!is_goal_relevant("jaké je počasí"));
        assert!(!is_goal_relevant(""));
    }

    #[tokio::test]
    async fn test_standard_relevant_has_no_warning() {
        let responder = ChatResponder::new(None, None);
        let reply = responder
            .respond(ChatMode::Standard, "co je diskriminant", &ChatContext::default())
            .await;

        assert!(reply.warning.is_none());
        assert!(reply.is_goal_relevant);
        assert!(STANDARD_REPLIES.contains(&reply.content.as_str()));
        assert!(!reply.degraded);
    }

    #[tokio::test]
    async fn test_standard_irrelevant_has_warning() {
        let responder = ChatResponder::new(None, None);
        let reply = responder
            .respond(ChatMode::Standard, "jaké je počasí", &ChatContext::default())
            .await;

        assert_eq!(reply.warning.as_deref(), Some(OFF_TOPIC_WARNING));
        assert_eq!(reply.content, OFF_TOPIC_REPLY);
        assert!(!reply.is_goal_relevant);
    }

    #[tokio::test]
    async fn test_assisted_failure_falls_back() {
        let responder = ChatResponder::new(Some(Arc::new(MockCompletionClient::failing())), None);
        let reply = responder
            .respond(ChatMode::Assisted, "pomoz mi", &ChatContext::default())
            .await;

        assert_eq!(reply.content, ASSISTED_FALLBACK_REPLY);
        assert!(reply.degraded);
        assert_eq!(reply.mode, ChatMode::Assisted);
    }

    #[tokio::test]
    async fn test_assisted_without_client_falls_back() {
        let responder = ChatResponder::new(None, None);
        let reply = responder
            .respond(ChatMode::Assisted, "pomoz mi", &ChatContext::default())
            .await;

        assert_eq!(reply.content, ASSISTED_FALLBACK_REPLY);
        assert!(reply.degraded);
    }

    #[tokio::test]
    async fn test_assisted_empty_reply_falls_back() {
        let responder =
            ChatResponder::new(Some(Arc::new(MockCompletionClient::replying("   "))), None);
        let reply = responder
            .respond(ChatMode::Assisted, "pomoz mi", &ChatContext::default())
            .await;
        assert!(reply.degraded);
    }

    #[tokio::test]
    async fn test_assisted_success() {
        let responder = ChatResponder::new(
            Some(Arc::new(MockCompletionClient::replying("Zkus vzorec D = b² - 4ac."))),
            Some("Jsi učitel.".into()),
        );
        let reply = responder
            .respond(ChatMode::Assisted, "jak na to?", &ChatContext::default())
            .await;

        assert_eq!(reply.content, "Zkus vzorec D = b² - 4ac.");
        assert!(!reply.degraded);
        assert!(reply.warning.is_none());
    }

    #[test]
    fn test_context_block() {
        let context = ChatContext {
            group_name: Some("8.B".into()),
            group_description: Some("Kvadratické rovnice".into()),
            goals: vec![
                goal_view(GoalType::Boolean, 1, 1, 100, true),
                goal_view(GoalType::Boolean, 1, 0, 0, false),
                goal_view(GoalType::Percentage, 3, 2, 67, false),
            ],
            history: vec![
                ChatTurn {
                    from_student: true,
                    content: "a".repeat(150),
                },
                ChatTurn {
                    from_student: false,
                    content: "Dobře!".into(),
                },
            ],
        };

        let block = build_context_block(&context);
        assert!(block.contains("KONTEXT SKUPINY:\n- Název: 8.B\n- Cíl: Kvadratické rovnice"));
        assert!(block.contains("1. Spočítej diskriminant - ✅ Splněno"));
        assert!(block.contains("2. Spočítej diskriminant - ❌ Nesplněno"));
        assert!(block.contains("3. Spočítej diskriminant - 📊 67% (2/3)"));
        assert!(block.contains(&format!("Student: {}...", "a".repeat(100))));
        assert!(block.contains("Učitel: Dobře!\n"));
    }

    #[test]
    fn test_empty_context_block() {
        assert_eq!(build_context_block(&ChatContext::default()), "");
    }

    #[test]
    fn test_reply_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ChatResponder::fallback()).unwrap();
        assert_eq!(json["mode"], "assisted");
        assert_eq!(json["degraded"], true);
        assert!(json.get("warning").is_none());
        assert!(json.get("usage").is_none());
    }
}

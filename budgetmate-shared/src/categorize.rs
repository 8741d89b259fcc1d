/// Transaction categorization
///
/// [`Categorizer::categorize`] asks a chat-completion model for a category
/// when one is configured and falls back to keyword rules otherwise. The
/// fallback also covers every model failure: transport errors, non-200
/// responses, empty replies, and replies that are not a known category.
/// Categorization itself never fails.
///
/// The model is reached through [`CompletionClient`]; [`GroqClient`] talks
/// to Groq's OpenAI-compatible endpoint.
///
/// # Example
///
/// ```
/// use budgetmate_shared::categorize::categorize_by_rules;
///
/// assert_eq!(categorize_by_rules("Swiggy dinner"), "Food & Dining");
/// assert_eq!(categorize_by_rules("Uber to airport"), "Transportation");
/// assert_eq!(categorize_by_rules("birthday gift"), "Other");
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Label reported alongside every answer
pub const MODEL_LABEL: &str = "Hybrid (Groq/Rules)";

/// Fallback when no rule matches
pub const OTHER: &str = "Other";

/// Categories the model may answer with
pub const CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Groceries",
    "Transportation",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Shopping",
    "Salary",
    "Investment",
];

/// Keyword rules, checked in order. The first category with a keyword
/// contained in the lowercased description wins.
const RULES: &[(&str, &[&str])] = &[
    (
        "Food & Dining",
        &[
            "swiggy", "zomato", "eats", "food", "burger", "pizza", "coffee", "cafe", "starbucks",
            "mcd", "kfc", "restaurant", "dining", "lunch", "dinner",
        ],
    ),
    (
        "Groceries",
        &[
            "grocery", "mart", "vegetable", "fruit", "milk", "bigbasket", "blinkit", "zepto",
            "instamart", "dmart",
        ],
    ),
    (
        "Transportation",
        &[
            "uber", "ola", "rapido", "cab", "taxi", "bus", "metro", "train", "flight", "air",
            "fuel", "petrol", "shell", "parking", "toll",
        ],
    ),
    (
        "Utilities",
        &[
            "electricity", "bescom", "power", "water", "gas", "internet", "wifi", "jio", "airtel",
            "recharge", "bill",
        ],
    ),
    (
        "Entertainment",
        &["netflix", "prime", "hotstar", "spotify", "movie", "cinema", "game", "steam"],
    ),
    (
        "Shopping",
        &["amazon", "flipkart", "myntra", "zara", "h&m", "shopping", "store", "mall"],
    ),
    (
        "Healthcare",
        &["pharmacy", "doctor", "hospital", "apollo", "medplus", "medicine"],
    ),
    ("Investment", &["zerodha", "groww", "sip", "invest", "stock"]),
];

#[derive(Debug, thiserror::Error)]
pub enum CategorizeError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion service returned no choices")]
    Empty,
}

/// Keyword-only categorization
pub fn categorize_by_rules(description: &str) -> &'static str {
    let description = description.to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| description.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER)
}

/// Maps a model reply onto a known category, ignoring case and stray
/// punctuation.
pub fn normalize_category(reply: &str) -> Option<&'static str> {
    let reply = reply.trim().trim_matches(|c: char| c == '.' || c == '"' || c == '\'');
    CATEGORIES
        .iter()
        .find(|category| category.eq_ignore_ascii_case(reply))
        .copied()
}

fn prompt(description: &str) -> String {
    format!(
        "Categorize this transaction '{}' into exactly one of: [{}]. Return ONLY the category name.",
        description,
        CATEGORIES.join(", ")
    )
}

/// A single-turn chat completion
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CategorizeError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Groq chat-completions client
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, CategorizeError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: GROQ_ENDPOINT.to_string(),
        })
    }

    /// Points the client at another OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, CategorizeError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CategorizeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(CategorizeError::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Categorization {
    pub category: String,
    pub model: String,
}

/// Model-first, rules-second categorizer. Cheap to clone.
#[derive(Clone, Default)]
pub struct Categorizer {
    client: Option<Arc<dyn CompletionClient>>,
}

impl Categorizer {
    /// Keyword rules only
    pub fn rules_only() -> Self {
        Self { client: None }
    }

    pub fn with_client(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Uses Groq when `api_key` is set, rules only otherwise.
    pub fn from_api_key(api_key: Option<&str>, model: &str) -> Self {
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => match GroqClient::new(key, model) {
                Ok(client) => Self::with_client(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Could not build completion client; using rules only");
                    Self::rules_only()
                }
            },
            None => Self::rules_only(),
        }
    }

    pub fn has_model(&self) -> bool {
        self.client.is_some()
    }

    pub async fn categorize(&self, description: &str) -> Categorization {
        let category = match &self.client {
            Some(client) => match client.complete(&prompt(description)).await {
                Ok(reply) => match normalize_category(&reply) {
                    Some(category) => category,
                    None => {
                        debug!(reply = %reply, "Model reply is not a known category; using rules");
                        categorize_by_rules(description)
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Completion failed; using rules");
                    categorize_by_rules(description)
                }
            },
            None => categorize_by_rules(description),
        };

        Categorization {
            category: category.to_string(),
            model: MODEL_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl CompletionClient for Fixed {
        async fn complete(&self, _prompt: &str) -> Result<String, CategorizeError> {
            Ok(self.0.to_string())
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionClient for Down {
        async fn complete(&self, _prompt: &str) -> Result<String, CategorizeError> {
            Err(CategorizeError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_rules() {
        assert_eq!(categorize_by_rules("BigBasket order"), "Groceries");
        assert_eq!(categorize_by_rules("BESCOM electricity"), "Utilities");
        assert_eq!(categorize_by_rules("Netflix"), "Entertainment");
        assert_eq!(categorize_by_rules("Myntra sale"), "Shopping");
        assert_eq!(categorize_by_rules("Apollo pharmacy"), "Healthcare");
        assert_eq!(categorize_by_rules("Zerodha SIP"), "Investment");
        assert_eq!(categorize_by_rules(""), OTHER);
    }

    #[test]
    fn test_rule_order_is_significant() {
        // "food" and "mart" both match; dining rules come first
        assert_eq!(categorize_by_rules("food mart"), "Food & Dining");
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("Groceries"), Some("Groceries"));
        assert_eq!(normalize_category("  food & dining.\n"), Some("Food & Dining"));
        assert_eq!(normalize_category("\"Salary\""), Some("Salary"));
        assert_eq!(normalize_category("I think it is Groceries"), None);
    }

    #[test]
    fn test_prompt_lists_categories() {
        let p = prompt("Swiggy");
        assert!(p.contains("'Swiggy'"));
        assert!(p.contains("Food & Dining, Groceries"));
    }

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let categorizer = Categorizer::with_client(Arc::new(Fixed("Salary")));
        let result = categorizer.categorize("June payout").await;
        assert_eq!(result.category, "Salary");
        assert_eq!(result.model, MODEL_LABEL);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_rules() {
        let categorizer = Categorizer::with_client(Arc::new(Down));
        assert_eq!(categorizer.categorize("Uber ride").await.category, "Transportation");
    }

    #[tokio::test]
    async fn test_unknown_reply_falls_back_to_rules() {
        let categorizer = Categorizer::with_client(Arc::new(Fixed("Pets")));
        assert_eq!(categorizer.categorize("Zomato").await.category, "Food & Dining");
    }

    #[tokio::test]
    async fn test_without_key_uses_rules() {
        let categorizer = Categorizer::from_api_key(None, DEFAULT_GROQ_MODEL);
        assert!(!categorizer.has_model());
        assert_eq!(categorizer.categorize("coffee").await.category, "Food & Dining");

        let blank = Categorizer::from_api_key(Some("  "), DEFAULT_GROQ_MODEL);
        assert!(!blank.has_model());
    }
}

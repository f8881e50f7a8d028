use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::error::{Result, ScriptdexError};
use crate::llm;
use crate::models::{CommandRecord, Recommendation};

const DEFAULT_MAX_TOKENS: u32 = 500;

/// An external semantic-match service. Implementations are blocking; the
/// configured timeout bounds every request, and any error is degraded by the
/// query pipeline rather than propagated.
pub trait SemanticProvider {
    fn id(&self) -> &'static str;
    fn recommend(&self, query: &str, summary: &str) -> Result<Vec<Recommendation>>;
    fn explain(&self, record: &CommandRecord) -> Result<String>;
}

/// Constructor registered for a provider id. Takes the request timeout in
/// milliseconds.
pub type ProviderCtor = fn(u64) -> Result<Box<dyn SemanticProvider>>;

/// Explicit provider registry. Adding a provider is a registration call, not
/// filesystem or module introspection.
pub struct ProviderRegistry {
    ctors: BTreeMap<String, ProviderCtor>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl ProviderRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("deepseek", |timeout_ms| {
            Ok(Box::new(DeepSeekProvider::from_env(timeout_ms)?))
        });
        registry.register("claude", |timeout_ms| {
            Ok(Box::new(ClaudeProvider::from_env(timeout_ms)?))
        });
        registry.register("gemini", |timeout_ms| {
            Ok(Box::new(GeminiProvider::from_env(timeout_ms)?))
        });
        registry
    }

    pub fn register(&mut self, id: &str, ctor: ProviderCtor) {
        self.ctors.insert(id.to_lowercase(), ctor);
    }

    pub fn build(&self, id: &str, timeout_ms: u64) -> Result<Box<dyn SemanticProvider>> {
        let ctor = self
            .ctors
            .get(&id.to_lowercase())
            .ok_or_else(|| ScriptdexError::UnknownProvider(id.to_string()))?;
        ctor(timeout_ms)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.ctors.keys().cloned().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn recommend_prompt(query: &str, summary: &str) -> String {
    format!(
        "You are a command-line tooling expert. The user is looking for a \
         command that accomplishes a task.\n\n\
         The user wants to: {query}\n\n\
         Known commands:\n{summary}\n\n\
         Pick the three most relevant commands, most relevant first, and \
         reply with JSON only:\n\
         {{\"recommendations\": [{{\"command\": \"<name>\", \"reason\": \"<why>\"}}]}}"
    )
}

fn explain_prompt(record: &CommandRecord) -> String {
    format!(
        "Explain the command `{}` in detail: what it does, how to use it, \
         and common pitfalls.\n\nKnown metadata:\n{}",
        record.name,
        serde_json::to_string_pretty(record).unwrap_or_else(|_| record.name.clone())
    )
}

fn build_http(timeout_ms: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            ScriptdexError::Validation(format!("{key} environment variable is not set"))
        })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn read_reply(response: reqwest::blocking::Response, provider: &str) -> Result<String> {
    if !response.status().is_success() {
        return Err(ScriptdexError::Provider(format!(
            "{provider} request failed with status {}",
            response.status()
        )));
    }
    let value = response.json::<Value>()?;
    llm::extract_message_content(&value).ok_or_else(|| {
        ScriptdexError::Provider(format!("{provider} reply had no message content"))
    })
}

/// OpenAI-compatible chat-completions backend.
pub struct DeepSeekProvider {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for DeepSeekProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DeepSeekProvider {
    pub fn from_env(timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout_ms)?,
            api_key: require_env("DEEPSEEK_API_KEY")?,
            model: env_or("DEEPSEEK_MODEL", "deepseek-chat"),
            base_url: env_or("DEEPSEEK_BASE_URL", "https://api.deepseek.com/v1"),
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.7,
            "max_tokens": DEFAULT_MAX_TOKENS,
        });
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        read_reply(response, self.id())
    }
}

impl SemanticProvider for DeepSeekProvider {
    fn id(&self) -> &'static str {
        "deepseek"
    }

    fn recommend(&self, query: &str, summary: &str) -> Result<Vec<Recommendation>> {
        let reply = self.generate(&recommend_prompt(query, summary))?;
        llm::parse_recommendations(&reply)
    }

    fn explain(&self, record: &CommandRecord) -> Result<String> {
        self.generate(&explain_prompt(record))
    }
}

/// Anthropic messages-API backend.
pub struct ClaudeProvider {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ClaudeProvider {
    pub fn from_env(timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout_ms)?,
            api_key: require_env("ANTHROPIC_API_KEY")?,
            model: env_or("CLAUDE_MODEL", "claude-3-haiku-20240307"),
            base_url: env_or("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "messages": [{"role": "user", "content": prompt}],
        });
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()?;
        read_reply(response, self.id())
    }
}

impl SemanticProvider for ClaudeProvider {
    fn id(&self) -> &'static str {
        "claude"
    }

    fn recommend(&self, query: &str, summary: &str) -> Result<Vec<Recommendation>> {
        let reply = self.generate(&recommend_prompt(query, summary))?;
        llm::parse_recommendations(&reply)
    }

    fn explain(&self, record: &CommandRecord) -> Result<String> {
        self.generate(&explain_prompt(record))
    }
}

/// Google generateContent backend.
pub struct GeminiProvider {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn from_env(timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout_ms)?,
            api_key: require_env("GEMINI_API_KEY")?,
            model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });
        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;
        read_reply(response, self.id())
    }
}

impl SemanticProvider for GeminiProvider {
    fn id(&self) -> &'static str {
        "gemini"
    }

    fn recommend(&self, query: &str, summary: &str) -> Result<Vec<Recommendation>> {
        let reply = self.generate(&recommend_prompt(query, summary))?;
        llm::parse_recommendations(&reply)
    }

    fn explain(&self, record: &CommandRecord) -> Result<String> {
        self.generate(&explain_prompt(record))
    }
}

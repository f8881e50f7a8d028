use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ScriptdexError};
use crate::models::Recommendation;

pub(crate) fn parse_env_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_ascii_lowercase()),
        Some(value) if matches!(value.as_str(), "1" | "true" | "yes" | "on")
    )
}

/// Pulls the assistant text out of the reply shapes the supported providers
/// produce: OpenAI-style `choices`, Anthropic `content` parts, and Gemini
/// `candidates`.
pub(crate) fn extract_message_content(value: &Value) -> Option<String> {
    if let Some(content) = value
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
    {
        return Some(content.to_string());
    }
    if let Some(content) = value
        .get("content")
        .and_then(|content| content.as_array())
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(|text| text.as_str())
    {
        return Some(content.to_string());
    }
    if let Some(content) = value
        .get("candidates")
        .and_then(|candidates| candidates.as_array())
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(|text| text.as_str())
    {
        return Some(content.to_string());
    }
    None
}

/// Models wrap JSON in prose or code fences; slice from the first opening
/// bracket to the last closing bracket before parsing.
pub(crate) fn extract_json_fragment(text: &str) -> Option<String> {
    let start = text
        .char_indices()
        .find(|(_, c)| *c == '{' || *c == '[')
        .map(|(idx, _)| idx)?;
    let sliced = &text[start..];
    let end = sliced
        .char_indices()
        .rev()
        .find(|(_, c)| *c == '}' || *c == ']')
        .map(|(idx, c)| idx + c.len_utf8())?;
    Some(sliced[..end].to_string())
}

#[derive(Debug, Deserialize)]
struct RecommendationEnvelope {
    recommendations: Vec<Recommendation>,
}

/// Parses a provider reply into recommendations. Accepts the documented
/// `{"recommendations": [...]}` envelope or a bare array; anything else is
/// that stage's failure.
pub(crate) fn parse_recommendations(text: &str) -> Result<Vec<Recommendation>> {
    let fragment = extract_json_fragment(text)
        .ok_or_else(|| ScriptdexError::Provider("reply contains no JSON".to_string()))?;
    if let Ok(envelope) = serde_json::from_str::<RecommendationEnvelope>(&fragment) {
        return Ok(envelope.recommendations);
    }
    serde_json::from_str::<Vec<Recommendation>>(&fragment)
        .map_err(|err| ScriptdexError::Provider(format!("malformed recommendations: {err}")))
}

//! Gemini inference client
//!
//! One `generateContent` call per request, one prompt builder per inference
//! kind. The model reply is returned as-is for the free-text kinds; for the
//! structured kinds (suggestion, classification, crisis detection) the model
//! is asked for a JSON object, which is parsed when possible and otherwise
//! wrapped under a single key.

use serde_json::{json, Value};
use std::time::Duration;

use crate::types::{GatewayError, Result};

/// Client for the hosted generative-language service
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new inference client
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Inference(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Send one prompt and extract the reply text
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        );

        let request_body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .http
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                GatewayError::Inference(format!("Failed to reach inference service: {}", e))
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            GatewayError::Inference(format!("Failed to read inference response: {}", e))
        })?;

        if !status.is_success() {
            return Err(GatewayError::Inference(if body.is_empty() {
                format!("Inference request failed with status {}", status)
            } else {
                body
            }));
        }

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Inference(format!("Invalid inference response: {}", e)))?;

        parsed
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| GatewayError::Inference("Inference response had no candidates".into()))
    }

    /// Empathetic reply: free text shaped by history and context
    pub async fn empathetic_reply(
        &self,
        user_message: &str,
        history: &[Value],
        context: &serde_json::Map<String, Value>,
    ) -> Result<String> {
        self.generate(&empathetic_prompt(user_message, history, context))
            .await
    }

    /// Summarize a list of journal entries into a short reflection
    pub async fn summarize_journal(&self, entries: &[Value]) -> Result<String> {
        self.generate(&summary_prompt(entries)).await
    }

    /// Suggest the next wellness action for an arbitrary state mapping
    pub async fn suggest_action(&self, state: &Value) -> Result<Value> {
        let text = self.generate(&suggestion_prompt(state)).await?;
        Ok(json_or_wrapped(&text, "suggestion"))
    }

    /// Classify the dominant emotion in a piece of text
    pub async fn classify_emotion(&self, text: &str) -> Result<Value> {
        let reply = self.generate(&classify_prompt(text)).await?;
        Ok(json_or_wrapped(&reply, "emotion"))
    }

    /// Check text for crisis indicators
    pub async fn detect_crisis(&self, text: &str) -> Result<Value> {
        let reply = self.generate(&crisis_prompt(text)).await?;
        Ok(json_or_wrapped(&reply, "crisis"))
    }
}

fn empathetic_prompt(
    user_message: &str,
    history: &[Value],
    context: &serde_json::Map<String, Value>,
) -> String {
    let mut prompt = String::from(
        "You are a warm, empathetic mental wellness companion. \
         Respond with a short, caring message. Do not diagnose or prescribe.\n",
    );

    if !history.is_empty() {
        prompt.push_str("\nConversation so far:\n");
        for turn in history {
            prompt.push_str(&render_turn(turn));
            prompt.push('\n');
        }
    }

    if !context.is_empty() {
        prompt.push_str(&format!(
            "\nContext about the user: {}\n",
            Value::Object(context.clone())
        ));
    }

    prompt.push_str(&format!("\nUser message: {}", user_message));
    prompt
}

/// Render one history turn as a prompt line; entries may be plain strings
/// or `{role, content}` objects
fn render_turn(turn: &Value) -> String {
    match (
        turn.get("role").and_then(|v| v.as_str()),
        turn.get("content").and_then(|v| v.as_str()),
    ) {
        (Some(role), Some(content)) => format!("{}: {}", role, content),
        _ => match turn.as_str() {
            Some(s) => s.to_string(),
            None => turn.to_string(),
        },
    }
}

fn summary_prompt(entries: &[Value]) -> String {
    let mut prompt = String::from(
        "Summarize the following journal entries into a short, compassionate \
         reflection on recurring moods and themes. Keep it under 100 words.\n\nEntries:\n",
    );
    for entry in entries {
        prompt.push_str(&format!("- {}\n", render_entry(entry)));
    }
    prompt
}

fn render_entry(entry: &Value) -> String {
    match entry.as_str() {
        Some(s) => s.to_string(),
        None => entry.to_string(),
    }
}

fn suggestion_prompt(state: &Value) -> String {
    format!(
        "Given this wellness state, suggest the single most helpful next \
         action for the user. Respond with JSON: \
         {{\"action\": \"...\", \"reason\": \"...\"}}\n\nState: {}",
        state
    )
}

fn classify_prompt(text: &str) -> String {
    format!(
        "Classify the dominant emotion in the following text. Respond with \
         JSON: {{\"emotion\": \"<single lowercase label>\", \"confidence\": <0.0-1.0>}}\n\nText: {}",
        text
    )
}

fn crisis_prompt(text: &str) -> String {
    format!(
        "Check the following text for crisis indicators such as self-harm or \
         suicidal ideation. Respond with JSON: \
         {{\"crisis_detected\": true/false, \"risk_level\": \"none|low|medium|high\"}}\n\nText: {}",
        text
    )
}

/// Parse the model reply as JSON when possible, else wrap it under `key`
///
/// Models often fence structured replies in ```json blocks; strip those
/// before parsing.
fn json_or_wrapped(text: &str, key: &str) -> Value {
    let stripped = strip_code_fences(text);
    match serde_json::from_str::<Value>(stripped) {
        Ok(v) if v.is_object() || v.is_array() => v,
        _ => json!({ key: text }),
    }
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empathetic_prompt_includes_history_and_context() {
        let history = vec![
            json!({ "role": "user", "content": "I had a rough day" }),
            json!({ "role": "assistant", "content": "That sounds hard" }),
        ];
        let mut context = serde_json::Map::new();
        context.insert("name".into(), json!("Ada"));

        let prompt = empathetic_prompt("I can't sleep", &history, &context);
        assert!(prompt.contains("user: I had a rough day"));
        assert!(prompt.contains("assistant: That sounds hard"));
        assert!(prompt.contains("\"name\":\"Ada\""));
        assert!(prompt.contains("User message: I can't sleep"));
    }

    #[test]
    fn test_empathetic_prompt_omits_empty_sections() {
        let prompt = empathetic_prompt("hello", &[], &serde_json::Map::new());
        assert!(!prompt.contains("Conversation so far"));
        assert!(!prompt.contains("Context about the user"));
    }

    #[test]
    fn test_render_turn_accepts_plain_strings() {
        assert_eq!(render_turn(&json!("just text")), "just text");
    }

    #[test]
    fn test_summary_prompt_lists_entries() {
        let entries = vec![json!("slept badly"), json!({ "mood_tag": "calm" })];
        let prompt = summary_prompt(&entries);
        assert!(prompt.contains("- slept badly"));
        assert!(prompt.contains("mood_tag"));
    }

    #[test]
    fn test_json_or_wrapped_parses_object() {
        let v = json_or_wrapped(r#"{"emotion": "joy", "confidence": 0.9}"#, "emotion");
        assert_eq!(v["emotion"], "joy");
    }

    #[test]
    fn test_json_or_wrapped_strips_fences() {
        let v = json_or_wrapped("```json\n{\"crisis_detected\": false}\n```", "crisis");
        assert_eq!(v["crisis_detected"], false);
    }

    #[test]
    fn test_json_or_wrapped_falls_back_to_wrapping() {
        let v = json_or_wrapped("calm", "emotion");
        assert_eq!(v, json!({ "emotion": "calm" }));
    }
}

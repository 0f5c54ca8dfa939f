use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::GeminiRuntimeConfig;
use crate::error::ProviderError;

const PROVIDER: &str = "gemini";

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid json array regex"));

pub trait GenerativeModel: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn model_name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    runtime: GeminiRuntimeConfig,
}

impl GeminiClient {
    pub fn new(http: Client, runtime: GeminiRuntimeConfig) -> Self {
        Self { http, runtime }
    }
}

fn extract_candidate_text(payload: &serde_json::Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|value| value.as_str()))
        .collect::<Vec<_>>()
        .join("");
    Some(text).filter(|value| !value.trim().is_empty())
}

impl GenerativeModel for GeminiClient {
    fn is_enabled(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        &self.runtime.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.runtime.base_url, self.runtime.model
        );
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http
            .post(url)
            .query(&[("key", self.runtime.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|error| ProviderError::Malformed {
                    provider: PROVIDER,
                    message: error.to_string(),
                })?;

        let text = extract_candidate_text(&body).ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER,
            message: "candidate text missing".to_string(),
        })?;
        debug!(model = %self.runtime.model, chars = text.len(), "gemini generation complete");
        Ok(text.trim().to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisabledModel;

impl GenerativeModel for DisabledModel {
    fn is_enabled(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Disabled(PROVIDER))
    }
}

#[derive(Clone)]
pub enum AiBackend {
    Gemini(GeminiClient),
    Disabled(DisabledModel),
}

impl AiBackend {
    pub fn from_runtime(http: &Client, runtime: Option<GeminiRuntimeConfig>) -> Self {
        match runtime {
            Some(runtime) => Self::Gemini(GeminiClient::new(http.clone(), runtime)),
            None => Self::Disabled(DisabledModel),
        }
    }
}

impl GenerativeModel for AiBackend {
    fn is_enabled(&self) -> bool {
        match self {
            Self::Gemini(client) => client.is_enabled(),
            Self::Disabled(model) => model.is_enabled(),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Self::Gemini(client) => client.model_name(),
            Self::Disabled(model) => model.model_name(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(client) => client.generate(prompt).await,
            Self::Disabled(model) => model.generate(prompt).await,
        }
    }
}

/// One destination as described by the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub place: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default, alias = "bestFor")]
    pub best_for: Vec<String>,
}

fn default_country() -> String {
    "India".to_string()
}

/// Pulls the outermost JSON array out of free-form model output. Entries
/// without a place name are dropped; anything unparsable yields nothing.
pub fn parse_ai_suggestions(text: &str) -> Vec<AiSuggestion> {
    let Some(block) = JSON_ARRAY.find(text) else {
        return Vec::new();
    };

    let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(block.as_str()) else {
        return Vec::new();
    };

    values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<AiSuggestion>(value).ok())
        .filter(|suggestion| !suggestion.place.trim().is_empty())
        .collect()
}

pub fn suggestion_prompt(
    destination: &str,
    budget: &str,
    daily_range: &str,
    travel_style: &str,
    interests: &[String],
    duration: u8,
) -> String {
    format!(
        "Generate 3-4 travel destination suggestions for a {duration}-day trip based on \"{destination}\" with preferences: Budget: {budget} ({daily_range}), Travel Type: {travel_style}, Interests: {}. Return as JSON array with place, country, description, highlights, bestFor fields.",
        interests.join(", ")
    )
}

pub fn description_prompt(city: &str, state: &str, places: &[String]) -> String {
    format!(
        "Write a compelling 2-sentence travel description for {city}, {state} highlighting these attractions: {}. Make it engaging and informative.",
        places.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_prompt_carries_the_daily_budget_range() {
        let prompt = suggestion_prompt(
            "Goa",
            "Mid-range",
            "₹3000-8000/day",
            "Couple",
            &["beaches".to_string(), "food".to_string()],
            4,
        );
        assert!(prompt.contains("4-day trip based on \"Goa\""));
        assert!(prompt.contains("Budget: Mid-range (₹3000-8000/day)"));
        assert!(prompt.contains("Interests: beaches, food."));
    }

    #[test]
    fn parses_array_wrapped_in_prose_and_fences() {
        let text = r#"Sure! Here are some ideas:
```json
[
  {"place": "Udaipur", "country": "India", "description": "City of lakes",
   "highlights": ["Lake Pichola", "City Palace"], "bestFor": ["Couples"]},
  {"place": "Hampi", "highlights": ["Virupaksha Temple"]},
  {"description": "missing a place"}
]
```
Enjoy your trip."#;

        let suggestions = parse_ai_suggestions(text);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].best_for, vec!["Couples"]);
        assert_eq!(suggestions[1].country, "India");
    }

    #[test]
    fn unparsable_output_yields_nothing() {
        assert!(parse_ai_suggestions("no json here").is_empty());
        assert!(parse_ai_suggestions("[not, valid json]").is_empty());
    }

    #[test]
    fn candidate_text_joins_parts() {
        let payload = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Hello " }, { "text": "Jaipur" } ] } }
            ]
        });
        assert_eq!(extract_candidate_text(&payload).as_deref(), Some("Hello Jaipur"));
        assert!(extract_candidate_text(&json!({ "candidates": [] })).is_none());
    }

    #[tokio::test]
    async fn disabled_model_refuses_to_generate() {
        let model = AiBackend::Disabled(DisabledModel);
        assert!(!model.is_enabled());
        assert!(matches!(
            model.generate("hello").await,
            Err(ProviderError::Disabled("gemini"))
        ));
    }
}

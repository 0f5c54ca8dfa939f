use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 20;
const CONNECT_TIMEOUT_SECONDS: u64 = 6;

#[derive(Debug, Clone)]
pub struct GeminiRuntimeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PlacesRuntimeConfig {
    /// Server key for Places requests. Photo URLs handed to clients embed it,
    /// so restrict it by HTTP referrer or IP in the Google console.
    pub api_key: String,
    pub base_url: String,
    pub photo_max_width: u32,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub gemini: Option<GeminiRuntimeConfig>,
    pub places: Option<PlacesRuntimeConfig>,
    pub http_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini: None,
            places: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
        }
    }
}

/// Empty keys and the `demo_key` / `your_..._here` samples from env templates.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty()
        || key.eq_ignore_ascii_case("demo_key")
        || (key.starts_with("your_") && key.ends_with("_here"))
}

fn api_key(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !is_placeholder_key(value))
}

fn build_gemini_runtime_config(lookup: &impl Fn(&str) -> Option<String>) -> Option<GeminiRuntimeConfig> {
    let api_key = api_key(lookup, "TRAVELWISE_GEMINI_API_KEY")?;
    let model = lookup("TRAVELWISE_GEMINI_MODEL")
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
    let base_url = lookup("TRAVELWISE_GEMINI_BASE_URL")
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

    Some(GeminiRuntimeConfig {
        api_key,
        model,
        base_url: base_url.trim_end_matches('/').to_string(),
    })
}

fn build_places_runtime_config(lookup: &impl Fn(&str) -> Option<String>) -> Option<PlacesRuntimeConfig> {
    let api_key = api_key(lookup, "TRAVELWISE_PLACES_API_KEY")?;
    let base_url = lookup("TRAVELWISE_PLACES_BASE_URL")
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLACES_BASE_URL.to_string());

    Some(PlacesRuntimeConfig {
        api_key,
        base_url: base_url.trim_end_matches('/').to_string(),
        photo_max_width: 400,
    })
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let http_timeout = lookup("TRAVELWISE_HTTP_TIMEOUT_SECONDS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|value| value.clamp(1, 120))
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);

        Self {
            gemini: build_gemini_runtime_config(&lookup),
            places: build_places_runtime_config(&lookup),
            http_timeout: Duration::from_secs(http_timeout),
        }
    }
}

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS).min(timeout))
        .timeout(timeout)
        .user_agent(concat!("travelwise/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed building http client")
}

mod config;
mod error;
mod gemini;
mod places;

use anyhow::Result;

pub use config::{
    build_http_client, is_placeholder_key, GeminiRuntimeConfig, PlacesRuntimeConfig,
    ProviderConfig, DEFAULT_GEMINI_MODEL, DEFAULT_HTTP_TIMEOUT_SECONDS,
};
pub use error::ProviderError;
pub use gemini::{
    description_prompt, parse_ai_suggestions, suggestion_prompt, AiBackend, AiSuggestion,
    DisabledModel, GeminiClient, GenerativeModel,
};
pub use places::{
    fetch_place_details, GooglePlacesClient, OfflinePlaces, PlaceDetails, PlacesBackend,
    PlacesProvider,
};

/// The external sources the planner can consult, resolved from configuration.
#[derive(Clone)]
pub struct ProviderStack {
    pub places: PlacesBackend,
    pub ai: AiBackend,
}

impl ProviderStack {
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        let http = build_http_client(config.http_timeout)?;
        Ok(Self {
            places: PlacesBackend::from_runtime(&http, config.places),
            ai: AiBackend::from_runtime(&http, config.gemini),
        })
    }

    pub fn offline() -> Self {
        Self {
            places: PlacesBackend::Offline(OfflinePlaces),
            ai: AiBackend::Disabled(DisabledModel),
        }
    }
}

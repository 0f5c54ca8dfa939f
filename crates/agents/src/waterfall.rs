use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use travelwise_core::{
    best_for, round_to_tenth, Confidence, SuggestionSource, TravelSuggestion, TripRequest,
};
use travelwise_providers::{
    description_prompt, parse_ai_suggestions, suggestion_prompt, GenerativeModel, PlaceDetails,
    PlacesProvider,
};
use travelwise_storage::{NotificationRepository, SavedItemRepository};

use crate::TravelPlanner;

const PLACES_INTEREST_LIMIT: usize = 4;
const PLACES_DEFAULT_RATING: f64 = 4.0;
const FALLBACK_CITIES: [&str; 3] = ["Mumbai", "Delhi", "Bangalore"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Hit,
    Empty,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageAttempt {
    pub stage: SuggestionSource,
    pub outcome: StageOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionReport {
    pub suggestions: Vec<TravelSuggestion>,
    pub resolved_by: SuggestionSource,
    pub attempts: Vec<StageAttempt>,
}

enum Stage {
    Hit(Vec<TravelSuggestion>),
    Empty,
    Skipped(&'static str),
    Failed(String),
}

impl<P, G, S> TravelPlanner<P, G, S>
where
    P: PlacesProvider,
    G: GenerativeModel,
    S: NotificationRepository + SavedItemRepository,
{
    #[instrument(skip(self, request), fields(destination = %request.destination))]
    pub async fn suggest(&self, request: TripRequest) -> Result<SuggestionReport> {
        let started = Instant::now();
        self.metrics.inc_request();

        let request = request.normalized()?;
        let report = self.run_waterfall(&request).await;

        self.metrics.observe_latency(started.elapsed());
        info!(
            resolved_by = report.resolved_by.as_str(),
            suggestions = report.suggestions.len(),
            attempts = report.attempts.len(),
            "suggestions resolved"
        );
        Ok(report)
    }

    /// Tries each source in order and stops at the first that yields
    /// suggestions. The static fallback always yields.
    pub(crate) async fn run_waterfall(&self, request: &TripRequest) -> SuggestionReport {
        let mut attempts = Vec::with_capacity(4);

        let stage = self.places_stage(request).await;
        if let Some(report) = self.settle(&mut attempts, SuggestionSource::PlacesApi, stage) {
            return report;
        }

        let stage = self.dataset_stage(request).await;
        if let Some(report) = self.settle(&mut attempts, SuggestionSource::Dataset, stage) {
            return report;
        }

        let stage = self.ai_stage(request).await;
        if let Some(report) = self.settle(&mut attempts, SuggestionSource::Ai, stage) {
            return report;
        }

        attempts.push(StageAttempt {
            stage: SuggestionSource::Fallback,
            outcome: StageOutcome::Hit,
            detail: None,
        });
        self.metrics.record_resolution(SuggestionSource::Fallback);
        SuggestionReport {
            suggestions: self.fallback_suggestions(request),
            resolved_by: SuggestionSource::Fallback,
            attempts,
        }
    }

    fn settle(
        &self,
        attempts: &mut Vec<StageAttempt>,
        source: SuggestionSource,
        stage: Stage,
    ) -> Option<SuggestionReport> {
        let (outcome, detail, suggestions) = match stage {
            Stage::Hit(suggestions) if !suggestions.is_empty() => {
                (StageOutcome::Hit, None, Some(suggestions))
            }
            Stage::Hit(_) | Stage::Empty => (StageOutcome::Empty, None, None),
            Stage::Skipped(reason) => (StageOutcome::Skipped, Some(reason.to_string()), None),
            Stage::Failed(message) => {
                warn!(stage = source.as_str(), error = %message, "suggestion stage failed");
                self.metrics.inc_stage_failure(source);
                (StageOutcome::Failed, Some(message), None)
            }
        };
        debug!(stage = source.as_str(), outcome = ?outcome, "suggestion stage settled");
        attempts.push(StageAttempt {
            stage: source,
            outcome,
            detail,
        });

        let suggestions = suggestions?;
        self.metrics.record_resolution(source);
        Some(SuggestionReport {
            suggestions,
            resolved_by: source,
            attempts: std::mem::take(attempts),
        })
    }

    async fn places_stage(&self, request: &TripRequest) -> Stage {
        if !self.places.is_live() {
            return Stage::Skipped("places provider not configured");
        }
        if request.interests.is_empty() {
            return Stage::Skipped("no interests given");
        }

        let mut found: Vec<PlaceDetails> = Vec::new();
        let mut failures = Vec::new();
        for interest in request.interests.iter().take(PLACES_INTEREST_LIMIT) {
            let query = format!("{interest} in {}", request.destination);
            self.metrics.inc_provider_call("places_api");
            match self.places.text_search(&query).await {
                Ok(results) => {
                    for place in results {
                        let duplicate = found.iter().any(|existing| {
                            existing.place_id == place.place_id
                                || existing.name.eq_ignore_ascii_case(&place.name)
                        });
                        if !duplicate {
                            found.push(place);
                        }
                    }
                }
                Err(error) => {
                    warn!(
                        provider = error.provider(),
                        error = %error,
                        query = %query,
                        "places search failed"
                    );
                    failures.push(error.to_string());
                }
            }
        }

        if found.is_empty() {
            return if failures.is_empty() {
                Stage::Empty
            } else {
                Stage::Failed(failures.join("; "))
            };
        }

        let record = self.dataset.find_city(&request.destination);
        let city = record
            .map(|record| record.city.clone())
            .unwrap_or_else(|| request.destination.clone());
        let highlights: Vec<String> = found
            .iter()
            .take(4)
            .map(|place| place.name.clone())
            .collect();
        let mut images: Vec<String> = found
            .iter()
            .filter_map(|place| place.photo_reference.as_deref())
            .filter_map(|reference| self.places.photo_url(reference))
            .take(3)
            .collect();
        if images.is_empty() {
            images = self.dataset.images().images_for(&city, &city, 3);
        }
        let rating = found
            .iter()
            .map(|place| place.rating.unwrap_or(PLACES_DEFAULT_RATING))
            .sum::<f64>()
            / found.len() as f64;
        let coordinates = record
            .and_then(|record| record.coordinates)
            .or_else(|| found.iter().find_map(|place| place.location));

        let description = self.describe_city(&city, "India", &highlights).await;
        Stage::Hit(vec![TravelSuggestion {
            place: city,
            country: "India".to_string(),
            description,
            highlights,
            best_for: request
                .interests
                .iter()
                .take(PLACES_INTEREST_LIMIT)
                .cloned()
                .collect(),
            images,
            coordinates,
            confidence: Confidence::High,
            source: SuggestionSource::PlacesApi,
            place_id: None,
            rating: Some(round_to_tenth(rating)),
        }])
    }

    async fn dataset_stage(&self, request: &TripRequest) -> Stage {
        let mut suggestions = Vec::new();

        if let Some(record) = self.dataset.find_city(&request.destination) {
            suggestions.push(
                self.dataset_suggestion(
                    &record.city,
                    &record.state,
                    &record.popular_places,
                    (4, 3),
                    &request.interests,
                )
                .await,
            );

            for nearby in self.dataset.nearby_cities(&record.city).into_iter().take(2) {
                suggestions.push(
                    self.dataset_suggestion(
                        &nearby.city,
                        &nearby.state,
                        &nearby.popular_places,
                        (3, 2),
                        &request.interests,
                    )
                    .await,
                );
            }
        }

        for matched in self
            .dataset
            .suggestions_by_interests(&request.interests)
            .into_iter()
            .take(3)
        {
            if suggestions.iter().any(|existing| existing.place == matched.city) {
                continue;
            }
            suggestions.push(
                self.dataset_suggestion(
                    &matched.city,
                    &matched.state,
                    &matched.matching_places,
                    (3, 2),
                    &request.interests,
                )
                .await,
            );
        }

        if suggestions.is_empty() {
            Stage::Empty
        } else {
            Stage::Hit(suggestions)
        }
    }

    async fn dataset_suggestion(
        &self,
        city: &str,
        state: &str,
        places: &[String],
        (highlight_count, image_count): (usize, usize),
        interests: &[String],
    ) -> TravelSuggestion {
        TravelSuggestion {
            place: city.to_string(),
            country: "India".to_string(),
            description: self.describe_city(city, state, places).await,
            highlights: places.iter().take(highlight_count).cloned().collect(),
            best_for: best_for(places, interests),
            images: self.dataset.images().images_for(city, city, image_count),
            coordinates: Some(self.dataset.city_coordinates(city)),
            confidence: Confidence::High,
            source: SuggestionSource::Dataset,
            place_id: None,
            rating: None,
        }
    }

    async fn ai_stage(&self, request: &TripRequest) -> Stage {
        if !self.ai.is_enabled() {
            return Stage::Skipped("generative model not configured");
        }

        let prompt = suggestion_prompt(
            &request.destination,
            request.budget.label(),
            request.budget.daily_range(),
            request.travel_style.label(),
            &request.interests,
            request.duration,
        );
        self.metrics.inc_provider_call("gemini");
        let text = match self.ai.generate(&prompt).await {
            Ok(text) => text,
            Err(error) => {
                warn!(provider = error.provider(), error = %error, "suggestion generation failed");
                return Stage::Failed(error.to_string());
            }
        };

        let parsed = parse_ai_suggestions(&text);
        if parsed.is_empty() {
            return Stage::Empty;
        }

        let fallback_tags: Vec<String> = request.interests.iter().take(3).cloned().collect();
        Stage::Hit(
            parsed
                .into_iter()
                .map(|suggestion| {
                    let coordinates = self
                        .dataset
                        .find_city(&suggestion.place)
                        .and_then(|record| record.coordinates);
                    TravelSuggestion {
                        images: self.dataset.images().images_for(
                            &suggestion.place,
                            &suggestion.country,
                            3,
                        ),
                        best_for: if suggestion.best_for.is_empty() {
                            fallback_tags.clone()
                        } else {
                            suggestion.best_for
                        },
                        place: suggestion.place,
                        country: suggestion.country,
                        description: suggestion.description,
                        highlights: suggestion.highlights,
                        coordinates,
                        confidence: Confidence::Medium,
                        source: SuggestionSource::Ai,
                        place_id: None,
                        rating: None,
                    }
                })
                .collect(),
        )
    }

    fn fallback_suggestions(&self, request: &TripRequest) -> Vec<TravelSuggestion> {
        let best_for: Vec<String> = request.interests.iter().take(3).cloned().collect();
        let mut suggestions: Vec<TravelSuggestion> = Vec::new();

        for name in FALLBACK_CITIES {
            let Some(record) = self.dataset.find_city(name) else {
                continue;
            };
            if suggestions.iter().any(|existing| existing.place == record.city) {
                continue;
            }
            suggestions.push(TravelSuggestion {
                place: record.city.clone(),
                country: "India".to_string(),
                description: format!(
                    "Explore the vibrant culture and attractions of {}, one of India's most popular destinations",
                    record.city
                ),
                highlights: record.popular_places.iter().take(3).cloned().collect(),
                best_for: best_for.clone(),
                images: self.dataset.images().images_for(&record.city, &record.city, 2),
                coordinates: Some(self.dataset.city_coordinates(&record.city)),
                confidence: Confidence::Low,
                source: SuggestionSource::Fallback,
                place_id: None,
                rating: None,
            });
        }

        if suggestions.is_empty() {
            suggestions.push(TravelSuggestion {
                place: request.destination.clone(),
                country: "India".to_string(),
                description: format!(
                    "Explore the vibrant culture and attractions of {}",
                    request.destination
                ),
                highlights: Vec::new(),
                best_for,
                images: self.dataset.images().images_for(&request.destination, &request.destination, 2),
                coordinates: None,
                confidence: Confidence::Low,
                source: SuggestionSource::Fallback,
                place_id: None,
                rating: None,
            });
        }

        suggestions
    }

    /// Two-sentence blurb from the generative model, or the template when the
    /// model is off or fails.
    pub(crate) async fn describe_city(&self, city: &str, state: &str, places: &[String]) -> String {
        if self.ai.is_enabled() {
            self.metrics.inc_provider_call("gemini");
            match self.ai.generate(&description_prompt(city, state, places)).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => debug!(city, "empty description from model"),
                Err(error) => warn!(error = %error, city, "city description failed, using template"),
            }
        }
        template_description(city, state, places)
    }
}

pub(crate) fn template_description(city: &str, state: &str, places: &[String]) -> String {
    let featured = places.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    format!(
        "{city} in {state} offers an incredible blend of cultural heritage and modern attractions. Experience {featured} and immerse yourself in the local culture and traditions."
    )
}

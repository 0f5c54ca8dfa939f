mod discovery;
mod itinerary;
mod waterfall;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use travelwise_core::{
    pseudo_forecast, recommend_outfit, style_tips, CoreError, ForecastDay, Notification,
    NotificationKind, OutfitAdvice, PlaceSearchResult, SavedItem, SavedItemKind,
    MAX_FORECAST_DAYS,
};
use travelwise_dataset::DatasetCatalog;
use travelwise_observability::AppMetrics;
use travelwise_providers::{fetch_place_details, GenerativeModel, PlacesProvider};
use travelwise_storage::{NotificationRepository, SavedItemRepository};
use uuid::Uuid;

pub use discovery::{next_unviewed_index, RestaurantDeckStep, SwipeAction};
pub use waterfall::{StageAttempt, StageOutcome, SuggestionReport};

#[derive(Debug, Clone, Serialize)]
pub struct CityForecast {
    pub city: String,
    pub summary: String,
    pub days: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutfitReport {
    pub city: String,
    pub forecast: ForecastDay,
    pub outfit: OutfitAdvice,
    pub style_tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

/// Answers every traveller-facing question: suggestions, itineraries,
/// discovery decks, weather, notifications and saved items.
#[derive(Clone)]
pub struct TravelPlanner<P, G, S>
where
    P: PlacesProvider,
    G: GenerativeModel,
    S: NotificationRepository + SavedItemRepository,
{
    dataset: Arc<DatasetCatalog>,
    places: P,
    ai: G,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<P, G, S> TravelPlanner<P, G, S>
where
    P: PlacesProvider,
    G: GenerativeModel,
    S: NotificationRepository + SavedItemRepository,
{
    pub fn new(
        dataset: Arc<DatasetCatalog>,
        places: P,
        ai: G,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            dataset,
            places,
            ai,
            store,
            metrics,
        }
    }

    pub fn dataset(&self) -> &DatasetCatalog {
        &self.dataset
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    pub fn places_live(&self) -> bool {
        self.places.is_live()
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.is_enabled()
    }

    #[instrument(skip(self))]
    pub async fn place_details(&self, place: &str, city: &str) -> PlaceSearchResult {
        if self.places.is_live() {
            self.metrics.inc_provider_call("places_api");
        }
        fetch_place_details(&self.places, self.dataset.images(), place, city).await
    }

    pub fn forecast(&self, city: &str, days: u8, start: NaiveDate) -> Result<CityForecast> {
        let city = self.canonical_city(city);
        let climate = self.dataset.climate_for(&city);
        Ok(CityForecast {
            days: pseudo_forecast(&city, &climate, start, days)?,
            summary: climate.summary,
            city,
        })
    }

    /// Outfit advice for day `day_index` (1-based, at most a week out) of a
    /// trip starting on `start`.
    pub fn outfit(&self, city: &str, day_index: u8, start: NaiveDate) -> Result<OutfitReport> {
        let city = self.canonical_city(city);
        let climate = self.dataset.climate_for(&city);
        let day_index = day_index.clamp(1, MAX_FORECAST_DAYS);

        let forecast = pseudo_forecast(&city, &climate, start, day_index)?
            .pop()
            .context("forecast produced no days")?;
        let outfit = recommend_outfit(&forecast);
        Ok(OutfitReport {
            style_tips: style_tips(&city, &climate),
            city,
            forecast,
            outfit,
        })
    }

    pub async fn notifications(&self, user_id: &str) -> Result<NotificationFeed> {
        let notifications = self.store.list_notifications(user_id).await?;
        let unread_count = notifications.iter().filter(|n| n.unread).count();
        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.notifications(user_id).await?.unread_count)
    }

    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<bool> {
        self.store.mark_read(user_id, notification_id).await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        self.store.mark_all_read(user_id).await
    }

    /// Saves a restaurant, attraction or destination for the user. Returns
    /// `false` when the item was already saved.
    #[instrument(skip(self))]
    pub async fn save_item(
        &self,
        user_id: &str,
        kind: SavedItemKind,
        name: &str,
        city: &str,
    ) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::BlankItemName.into());
        }
        let city = self.canonical_city(city);

        let saved = self
            .store
            .save_item(SavedItem {
                user_id: user_id.to_string(),
                kind,
                name: name.to_string(),
                city: city.clone(),
                saved_at: Utc::now(),
            })
            .await?;

        if saved {
            let (notification_kind, title, message) = match kind {
                SavedItemKind::Restaurant => (
                    NotificationKind::Food,
                    "Added to Favorites",
                    format!("{name} was added to your culinary journey!"),
                ),
                SavedItemKind::Attraction => (
                    NotificationKind::Attraction,
                    "Added to Itinerary",
                    format!("{name} in {city} was added to your itinerary"),
                ),
                SavedItemKind::Destination => (
                    NotificationKind::Plan,
                    "Destination Saved",
                    format!("{name} is on your travel wishlist"),
                ),
            };
            self.notify(user_id, notification_kind, title, message).await?;
        }

        info!(user_id, kind = kind.as_str(), saved, "saved item handled");
        Ok(saved)
    }

    pub async fn saved_items(&self, user_id: &str) -> Result<Vec<SavedItem>> {
        self.store.list_saved(user_id).await
    }

    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) -> Result<()> {
        self.store
            .push_notification(Notification {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                kind,
                title: title.to_string(),
                message,
                created_at: Utc::now(),
                unread: true,
            })
            .await
    }

    fn canonical_city(&self, city: &str) -> String {
        self.dataset
            .find_city(city)
            .map(|record| record.city.clone())
            .unwrap_or_else(|| city.trim().to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::sync::Arc;

    use tempfile::TempDir;
    use travelwise_core::Coordinates;
    use travelwise_dataset::DatasetCatalog;
    use travelwise_observability::AppMetrics;
    use travelwise_providers::{GenerativeModel, PlaceDetails, PlacesProvider, ProviderError};
    use travelwise_storage::MemoryStore;

    use crate::TravelPlanner;

    pub const FIXTURE: &str = r#"{
        "cities": [
            {"city": "Mumbai", "state": "Maharashtra",
             "popular_places": ["Gateway of India", "Marine Drive", "Elephanta Caves", "Siddhivinayak Temple", "Juhu Beach"],
             "coordinates": {"lat": 19.0760, "lng": 72.8777},
             "climate": {"avg_high_c": 31.0, "avg_low_c": 24.0, "humidity": 78, "wet_months": [6, 7, 8, 9],
                         "summary": "Hot and humid with a heavy monsoon"}},
            {"city": "Pune", "state": "Maharashtra",
             "popular_places": ["Shaniwar Wada Fort", "Aga Khan Palace", "Dagdusheth Temple"],
             "coordinates": {"lat": 18.5204, "lng": 73.8567}},
            {"city": "Delhi", "state": "Delhi",
             "popular_places": ["Red Fort", "Qutub Minar", "India Gate", "Chandni Chowk"],
             "coordinates": {"lat": 28.6139, "lng": 77.2090}},
            {"city": "Bangalore", "state": "Karnataka",
             "popular_places": ["Lalbagh Botanical Garden", "Cubbon Park", "Bangalore Palace"],
             "coordinates": {"lat": 12.9716, "lng": 77.5946}}
        ],
        "restaurants": [
            {"city": "Mumbai", "name": "Trishna", "cuisine": "Seafood", "description": "Legendary seafood in Kala Ghoda",
             "location": "Kala Ghoda, Fort", "rating": 4.8, "tags": ["Seafood"], "must_try": ["Butter Garlic Crab"]},
            {"city": "Mumbai", "name": "Leopold Cafe", "cuisine": "Continental", "description": "Iconic Colaba cafe",
             "location": "Colaba Causeway", "rating": 4.2, "tips": ["Go early for a window table"]},
            {"city": "Mumbai", "name": "Britannia & Co.", "cuisine": "Parsi", "description": "Parsi classics since 1923",
             "location": "Ballard Estate", "rating": 4.6, "must_try": ["Berry Pulao"]}
        ],
        "experiences": [
            {"city": "Mumbai", "name": "Marine Drive Sunset Walk", "description": "Walk the Queen's Necklace at dusk",
             "location": "Marine Drive", "tips": ["Bring a camera"]}
        ],
        "city_tips": {"mumbai": ["Use the local trains outside rush hour"]}
    }"#;

    #[derive(Clone, Default)]
    pub struct StubPlaces {
        pub results: Vec<PlaceDetails>,
        pub fail: bool,
    }

    impl PlacesProvider for StubPlaces {
        fn is_live(&self) -> bool {
            true
        }

        fn photo_url(&self, photo_reference: &str) -> Option<String> {
            Some(format!("https://photos.test/{photo_reference}"))
        }

        async fn text_search(&self, _query: &str) -> Result<Vec<PlaceDetails>, ProviderError> {
            if self.fail {
                return Err(ProviderError::Api {
                    provider: "places_api",
                    status: "REQUEST_DENIED".to_string(),
                    message: "key rejected".to_string(),
                });
            }
            Ok(self.results.clone())
        }
    }

    /// Replies with the same text to every prompt, or is disabled when empty.
    #[derive(Clone, Default)]
    pub struct ScriptedModel {
        pub reply: Option<String>,
    }

    impl GenerativeModel for ScriptedModel {
        fn is_enabled(&self) -> bool {
            self.reply.is_some()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.reply.clone().ok_or(ProviderError::Disabled("gemini"))
        }
    }

    pub fn place(id: &str, name: &str, rating: Option<f64>, photo: Option<&str>) -> PlaceDetails {
        PlaceDetails {
            place_id: id.to_string(),
            name: name.to_string(),
            formatted_address: format!("{name}, Mumbai"),
            rating,
            photo_reference: photo.map(str::to_string),
            types: vec!["tourist_attraction".to_string()],
            location: Some(Coordinates::new(18.92, 72.83)),
        }
    }

    pub fn planner<P, G>(places: P, ai: G) -> (TempDir, TravelPlanner<P, G, MemoryStore>)
    where
        P: PlacesProvider,
        G: GenerativeModel,
    {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("travelwise.json"), FIXTURE).expect("write fixture");
        let dataset = DatasetCatalog::from_data_dir(dir.path()).expect("fixture loads");
        let planner = TravelPlanner::new(
            Arc::new(dataset),
            places,
            ai,
            Arc::new(MemoryStore::new()),
            AppMetrics::shared(),
        );
        (dir, planner)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use travelwise_core::{CoreError, SavedItemKind};

    use travelwise_providers::OfflinePlaces;

    use crate::testing::{planner, ScriptedModel};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 14).expect("valid date")
    }

    #[test]
    fn forecast_is_repeatable_and_clamped() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());
        let first = planner.forecast("mumbai", 30, start()).expect("forecast");
        let second = planner.forecast("Mumbai", 30, start()).expect("forecast");

        assert_eq!(first.city, "Mumbai");
        assert_eq!(first.days.len(), 7);
        assert_eq!(first.summary, "Hot and humid with a heavy monsoon");
        for (a, b) in first.days.iter().zip(&second.days) {
            assert_eq!(a.high_c, b.high_c);
            assert_eq!(a.rain_chance, b.rain_chance);
        }
        // July is a wet month in the fixture climate.
        assert!(first.days.iter().all(|day| day.rain_chance >= 45));
    }

    #[test]
    fn outfit_matches_the_requested_forecast_day() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());
        let report = planner.outfit("Mumbai", 3, start()).expect("outfit");
        let forecast = planner.forecast("Mumbai", 3, start()).expect("forecast");

        assert_eq!(report.forecast.day, 3);
        assert_eq!(report.forecast.date, forecast.days[2].date);
        assert!(!report.style_tips.is_empty());
        if report.forecast.rain_chance >= 50 {
            assert!(report.outfit.extras.iter().any(|extra| extra.contains("umbrella")));
        }
    }

    #[test]
    fn unknown_city_forecast_uses_generic_climate() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());
        let forecast = planner.forecast("  Atlantis ", 0, start()).expect("forecast");
        assert_eq!(forecast.city, "Atlantis");
        assert_eq!(forecast.days.len(), 1);
    }

    #[test]
    fn weather_past_the_calendar_end_is_a_domain_error() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());

        let err = planner
            .forecast("Mumbai", 5, NaiveDate::MAX)
            .expect_err("forecast overflows");
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::DateOutOfRange(_))
        ));
        assert!(planner.outfit("Mumbai", 3, NaiveDate::MAX).is_err());
        assert!(planner.outfit("Mumbai", 1, NaiveDate::MAX).is_ok());
    }

    #[tokio::test]
    async fn saving_notifies_once_per_item() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());

        assert!(planner
            .save_item("asha", SavedItemKind::Attraction, "Gateway of India", "mumbai")
            .await
            .expect("save"));
        assert!(!planner
            .save_item("asha", SavedItemKind::Attraction, "gateway of india", "Mumbai")
            .await
            .expect("duplicate save"));

        let saved = planner.saved_items("asha").await.expect("saved items");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].city, "Mumbai");

        let feed = planner.notifications("asha").await.expect("feed");
        assert_eq!(feed.unread_count, 1);
        assert_eq!(feed.notifications[0].title, "Added to Itinerary");

        assert!(planner
            .save_item("asha", SavedItemKind::Restaurant, "   ", "Mumbai")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn mark_read_updates_unread_count() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());
        planner
            .save_item("ravi", SavedItemKind::Restaurant, "Trishna", "Mumbai")
            .await
            .expect("save restaurant");
        planner
            .save_item("ravi", SavedItemKind::Destination, "Jaipur", "Jaipur")
            .await
            .expect("save destination");
        assert_eq!(planner.unread_count("ravi").await.expect("count"), 2);

        let feed = planner.notifications("ravi").await.expect("feed");
        let id = feed.notifications[0].id.clone();
        assert!(planner.mark_read("ravi", &id).await.expect("mark read"));
        assert!(!planner.mark_read("someone-else", &id).await.expect("foreign id"));
        assert_eq!(planner.unread_count("ravi").await.expect("count"), 1);

        assert_eq!(planner.mark_all_read("ravi").await.expect("mark all"), 1);
        assert_eq!(planner.unread_count("ravi").await.expect("count"), 0);
    }

    #[tokio::test]
    async fn offline_place_details_use_catalog_fallback() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());
        let details = planner.place_details("Marine Drive", "Mumbai").await;
        assert_eq!(details.name, "Marine Drive");
        assert_eq!(details.address.as_deref(), Some("Mumbai, India"));
        assert_eq!(planner.metrics().snapshot().provider_calls_total, 0);
    }
}

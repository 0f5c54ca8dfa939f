use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MIN_TRIP_DAYS: u8 = 1;
pub const MAX_TRIP_DAYS: u8 = 14;

/// Serialized in snake_case; deserialized through [`Budget::parse`], so the
/// display labels ("Mid-range") are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Budget {
    Budget,
    MidRange,
    Luxury,
}

impl Budget {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "budget" | "low" => Some(Self::Budget),
            "mid-range" | "midrange" | "mid_range" | "mid" => Some(Self::MidRange),
            "luxury" | "high" => Some(Self::Luxury),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::MidRange => "Mid-range",
            Self::Luxury => "Luxury",
        }
    }

    pub fn daily_range(self) -> &'static str {
        match self {
            Self::Budget => "₹1000-3000/day",
            Self::MidRange => "₹3000-8000/day",
            Self::Luxury => "₹8000+/day",
        }
    }

    pub fn cost_multiplier(self) -> f64 {
        match self {
            Self::Budget => 0.7,
            Self::MidRange => 1.0,
            Self::Luxury => 1.8,
        }
    }
}

impl std::str::FromStr for Budget {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| CoreError::UnknownBudget(value.to_string()))
    }
}

impl TryFrom<String> for Budget {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TravelStyle {
    Solo,
    Couple,
    Family,
    Friends,
    Business,
}

impl TravelStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "solo" | "solo traveler" => Some(Self::Solo),
            "couple" => Some(Self::Couple),
            "family" | "family with kids" => Some(Self::Family),
            "friends" | "group" | "group of friends" => Some(Self::Friends),
            "business" | "business travel" => Some(Self::Business),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Solo => "Solo",
            Self::Couple => "Couple",
            Self::Family => "Family",
            Self::Friends => "Friends",
            Self::Business => "Business",
        }
    }
}

impl std::str::FromStr for TravelStyle {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| CoreError::UnknownTravelStyle(value.to_string()))
    }
}

impl TryFrom<String> for TravelStyle {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn score(self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.7,
            Self::Low => 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    PlacesApi,
    Dataset,
    Ai,
    Fallback,
}

impl SuggestionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlacesApi => "places_api",
            Self::Dataset => "dataset",
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelSuggestion {
    pub place: String,
    pub country: String,
    pub description: String,
    pub highlights: Vec<String>,
    pub best_for: Vec<String>,
    pub images: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub confidence: Confidence,
    pub source: SuggestionSource,
    pub place_id: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Attraction,
    Restaurant,
    Transport,
    Shopping,
    Experience,
}

impl ActivityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Attraction => "Landmark",
            Self::Restaurant => "Restaurant",
            Self::Transport => "Transport",
            Self::Shopping => "Market",
            Self::Experience => "Experience",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub time: String,
    pub kind: ActivityKind,
    pub name: String,
    pub description: String,
    pub location: String,
    pub duration: String,
    pub cost: String,
    pub rating: Option<f64>,
    pub images: Vec<String>,
    pub tips: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub confidence: Confidence,
    pub place_id: Option<String>,
    pub map_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u8,
    pub date: String,
    pub theme: String,
    pub activities: Vec<Activity>,
    pub estimated_cost: u32,
    pub tips: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPlan {
    pub destination: String,
    pub budget: Budget,
    pub travel_style: TravelStyle,
    pub interests: Vec<String>,
    pub duration: u8,
    pub days: Vec<DayPlan>,
    pub suggestions: Vec<TravelSuggestion>,
    pub confidence: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub budget: Budget,
    pub travel_style: TravelStyle,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default = "default_duration")]
    pub duration: u8,
}

fn default_duration() -> u8 {
    3
}

impl TripRequest {
    /// Trims the destination and interests and clamps the duration.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        let destination = self.destination.trim().to_string();
        if destination.is_empty() {
            return Err(CoreError::BlankDestination);
        }

        self.destination = destination;
        self.interests = self
            .interests
            .into_iter()
            .map(|interest| interest.trim().to_string())
            .filter(|interest| !interest.is_empty())
            .collect();
        self.duration = self.duration.clamp(MIN_TRIP_DAYS, MAX_TRIP_DAYS);
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Religious,
    Historical,
    Nature,
    Shopping,
    Entertainment,
    FoodAndBeverage,
    Attraction,
}

impl PlaceCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Religious => "Religious",
            Self::Historical => "Historical",
            Self::Nature => "Nature",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::FoodAndBeverage => "Food & Beverage",
            Self::Attraction => "Attraction",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: String,
    pub city: String,
    pub state: String,
    pub category: PlaceCategory,
    pub description: String,
    pub rating: f64,
    pub image: String,
    pub tips: Vec<String>,
    pub duration: String,
    pub cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSearchResult {
    pub name: String,
    pub photo: String,
    pub map_link: String,
    pub rating: Option<f64>,
    pub address: Option<String>,
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantCard {
    pub index: usize,
    pub name: String,
    pub cuisine: String,
    pub rating: f64,
    pub description: String,
    pub location: String,
    pub image: String,
    pub tags: Vec<String>,
    pub must_try: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttractionCard {
    pub index: usize,
    pub name: String,
    pub category: PlaceCategory,
    pub rating: f64,
    pub description: String,
    pub duration: String,
    pub price: String,
    pub location: String,
    pub image: String,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Food,
    Attraction,
    Weather,
    Plan,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Attraction => "attraction",
            Self::Weather => "weather",
            Self::Plan => "plan",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "food" => Some(Self::Food),
            "attraction" => Some(Self::Attraction),
            "weather" => Some(Self::Weather),
            "plan" => Some(Self::Plan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub unread: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedItemKind {
    Restaurant,
    Attraction,
    Destination,
}

impl SavedItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Attraction => "attraction",
            Self::Destination => "destination",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "restaurant" => Some(Self::Restaurant),
            "attraction" => Some(Self::Attraction),
            "destination" => Some(Self::Destination),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItem {
    pub user_id: String,
    pub kind: SavedItemKind,
    pub name: String,
    pub city: String,
    pub saved_at: DateTime<Utc>,
}

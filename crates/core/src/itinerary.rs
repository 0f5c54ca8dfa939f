use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{
    Activity, ActivityKind, Budget, Confidence, DayPlan, PlaceCategory, TravelSuggestion,
};
use crate::places::{categorize_place, map_link};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayTheme {
    CulturalHeritage,
    LocalCuisine,
    NatureScenic,
    ShoppingCrafts,
    AdventureExperiences,
}

const THEMES: [DayTheme; 5] = [
    DayTheme::CulturalHeritage,
    DayTheme::LocalCuisine,
    DayTheme::NatureScenic,
    DayTheme::ShoppingCrafts,
    DayTheme::AdventureExperiences,
];

impl DayTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::CulturalHeritage => "Cultural Heritage & Historical Exploration",
            Self::LocalCuisine => "Local Cuisine & Market Discovery",
            Self::NatureScenic => "Nature & Scenic Beauty",
            Self::ShoppingCrafts => "Shopping & Local Crafts",
            Self::AdventureExperiences => "Adventure & Unique Experiences",
        }
    }

    /// Catalog query used to pick the day's header images.
    pub fn image_query(self) -> &'static str {
        match self {
            Self::CulturalHeritage => "historical sites",
            Self::LocalCuisine => "local food",
            Self::NatureScenic => "nature parks",
            Self::ShoppingCrafts => "markets",
            Self::AdventureExperiences => "adventure activities",
        }
    }

    fn admits(self, category: PlaceCategory) -> bool {
        match self {
            Self::CulturalHeritage => {
                matches!(category, PlaceCategory::Historical | PlaceCategory::Religious)
            }
            Self::NatureScenic => category == PlaceCategory::Nature,
            Self::ShoppingCrafts => category == PlaceCategory::Shopping,
            Self::AdventureExperiences => {
                matches!(category, PlaceCategory::Entertainment | PlaceCategory::Nature)
            }
            Self::LocalCuisine => true,
        }
    }
}

/// Day numbers start at 1; day 0 is treated as day 1.
pub fn theme_for_day(day: u8) -> DayTheme {
    let index = usize::from(day.max(1) - 1) % THEMES.len();
    THEMES[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: &'static str,
    pub kind: ActivityKind,
}

pub const DAY_SLOTS: [TimeSlot; 5] = [
    TimeSlot { time: "09:00 AM", kind: ActivityKind::Attraction },
    TimeSlot { time: "12:30 PM", kind: ActivityKind::Restaurant },
    TimeSlot { time: "02:30 PM", kind: ActivityKind::Attraction },
    TimeSlot { time: "06:00 PM", kind: ActivityKind::Experience },
    TimeSlot { time: "08:00 PM", kind: ActivityKind::Restaurant },
];

/// Picks up to three places for a day, rotating the start by two per day so
/// consecutive days do not open at the same place.
pub fn select_places_for_day(places: &[String], theme: DayTheme, day: u8) -> Vec<String> {
    let filtered: Vec<&String> = places
        .iter()
        .filter(|place| theme.admits(categorize_place(place)))
        .collect();

    let mut selected: Vec<String> = Vec::new();
    if !filtered.is_empty() {
        let start = (usize::from(day.max(1) - 1) * 2) % filtered.len();
        for offset in 0..filtered.len().min(3) {
            selected.push(filtered[(start + offset) % filtered.len()].clone());
        }
    }

    if selected.len() < 2 {
        if let Some(extra) = places.iter().find(|place| !selected.contains(place)) {
            selected.push(extra.clone());
        }
    }

    selected
}

pub fn budget_cost(budget: Budget, kind: ActivityKind) -> &'static str {
    match (budget, kind) {
        (Budget::Budget, ActivityKind::Restaurant) => "₹300-800",
        (Budget::Budget, ActivityKind::Attraction) => "₹50-200",
        (Budget::Budget, ActivityKind::Shopping) => "₹500-1500",
        (Budget::Budget, ActivityKind::Experience) => "₹200-600",
        (Budget::Budget, ActivityKind::Transport) => "₹100-300",
        (Budget::MidRange, ActivityKind::Restaurant) => "₹800-2000",
        (Budget::MidRange, ActivityKind::Attraction) => "₹200-500",
        (Budget::MidRange, ActivityKind::Shopping) => "₹1500-4000",
        (Budget::MidRange, ActivityKind::Experience) => "₹600-1500",
        (Budget::MidRange, ActivityKind::Transport) => "₹300-800",
        (Budget::Luxury, ActivityKind::Restaurant) => "₹2000-6000",
        (Budget::Luxury, ActivityKind::Attraction) => "₹500-1500",
        (Budget::Luxury, ActivityKind::Shopping) => "₹4000-12000",
        (Budget::Luxury, ActivityKind::Experience) => "₹1500-5000",
        (Budget::Luxury, ActivityKind::Transport) => "₹800-2000",
    }
}

const UNPRICED_ACTIVITY_COST: u32 = 500;

static COST_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"₹(\d+)").expect("valid cost regex"));

fn activity_base_cost(cost: &str) -> u32 {
    if cost.trim().eq_ignore_ascii_case("free") {
        return 0;
    }
    COST_PATTERN
        .captures(cost)
        .and_then(|captures| captures.get(1))
        .and_then(|amount| amount.as_str().parse::<u32>().ok())
        .unwrap_or(UNPRICED_ACTIVITY_COST)
}

/// Sums the lower bound of every activity's cost and scales it by the budget tier.
pub fn day_cost(activities: &[Activity], budget: Budget) -> u32 {
    let base: u32 = activities
        .iter()
        .map(|activity| activity_base_cost(&activity.cost))
        .sum();
    (f64::from(base) * budget.cost_multiplier()).round() as u32
}

/// Calendar date of trip day `day` (1-based).
pub fn trip_date(start: NaiveDate, day: u8) -> Result<NaiveDate, CoreError> {
    let offset = i64::from(day.max(1)) - 1;
    start
        .checked_add_signed(Duration::days(offset))
        .ok_or(CoreError::DateOutOfRange(start))
}

pub fn date_label(start: NaiveDate, day: u8) -> Result<String, CoreError> {
    Ok(trip_date(start, day)?.format("%A, %B %-d, %Y").to_string())
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = scores.fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Percentage confidence for a whole plan. Empty inputs score zero.
pub fn plan_confidence(suggestions: &[TravelSuggestion], days: &[DayPlan]) -> u8 {
    let suggestion_score = mean(suggestions.iter().map(|s| s.confidence.score()));
    let activity_score = mean(
        days.iter()
            .map(|day| mean(day.activities.iter().map(|a| a.confidence.score()))),
    );
    (((suggestion_score + activity_score) / 2.0) * 100.0).round() as u8
}

pub fn default_day_tips(destination: &str) -> Vec<String> {
    vec![
        format!("Best time to explore {destination} is early morning or evening"),
        "Carry water and wear comfortable walking shoes".to_string(),
        "Try local cuisine from recommended restaurants".to_string(),
    ]
}

/// Placeholder activities for a destination that has no curated data.
pub fn generic_activities(destination: &str, budget: Budget) -> Vec<Activity> {
    DAY_SLOTS
        .iter()
        .map(|slot| {
            let (name, description, duration) = match slot.kind {
                ActivityKind::Restaurant => (
                    format!("{destination} Restaurant"),
                    format!("Sample the regional cuisine at a well-reviewed local restaurant in {destination}"),
                    "1-1.5 hours",
                ),
                ActivityKind::Experience => (
                    format!("{destination} Experience"),
                    format!("Soak in the evening atmosphere of {destination} with a local experience"),
                    "1-2 hours",
                ),
                _ => (
                    format!("{destination} Landmark"),
                    format!("Visit one of the well-known landmarks of {destination}"),
                    "2-3 hours",
                ),
            };
            let query = format!("{name} {destination}");

            Activity {
                time: slot.time.to_string(),
                kind: slot.kind,
                name,
                description,
                location: destination.to_string(),
                duration: duration.to_string(),
                cost: budget_cost(budget, slot.kind).to_string(),
                rating: None,
                images: Vec::new(),
                tips: default_day_tips(destination),
                coordinates: None,
                confidence: Confidence::Low,
                place_id: None,
                map_link: Some(map_link(&query, None)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuggestionSource;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn activity(cost: &str, confidence: Confidence) -> Activity {
        Activity {
            time: "09:00 AM".to_string(),
            kind: ActivityKind::Attraction,
            name: "Somewhere".to_string(),
            description: String::new(),
            location: String::new(),
            duration: "1-2 hours".to_string(),
            cost: cost.to_string(),
            rating: None,
            images: Vec::new(),
            tips: Vec::new(),
            coordinates: None,
            confidence,
            place_id: None,
            map_link: None,
        }
    }

    fn suggestion(confidence: Confidence) -> TravelSuggestion {
        TravelSuggestion {
            place: "Mumbai".to_string(),
            country: "India".to_string(),
            description: String::new(),
            highlights: Vec::new(),
            best_for: Vec::new(),
            images: Vec::new(),
            coordinates: None,
            confidence,
            source: SuggestionSource::Dataset,
            place_id: None,
            rating: None,
        }
    }

    #[test]
    fn themes_rotate_every_five_days() {
        assert_eq!(theme_for_day(1), DayTheme::CulturalHeritage);
        assert_eq!(theme_for_day(5), DayTheme::AdventureExperiences);
        assert_eq!(theme_for_day(6), DayTheme::CulturalHeritage);
        assert_eq!(theme_for_day(0), DayTheme::CulturalHeritage);
    }

    #[test]
    fn cultural_days_rotate_through_heritage_places() {
        let places = names(&[
            "Red Fort",
            "Lodhi Garden",
            "Humayun Tomb",
            "Akshardham Temple",
            "Chandni Chowk Market",
        ]);
        assert_eq!(
            select_places_for_day(&places, DayTheme::CulturalHeritage, 1),
            names(&["Red Fort", "Humayun Tomb", "Akshardham Temple"])
        );
        // start index (2 * 2) % 3 == 1
        assert_eq!(
            select_places_for_day(&places, DayTheme::CulturalHeritage, 3),
            names(&["Humayun Tomb", "Akshardham Temple", "Red Fort"])
        );
    }

    #[test]
    fn sparse_theme_is_topped_up_from_all_places() {
        let places = names(&["Red Fort", "Chandni Chowk Market"]);
        assert_eq!(
            select_places_for_day(&places, DayTheme::ShoppingCrafts, 4),
            names(&["Chandni Chowk Market", "Red Fort"])
        );
        assert_eq!(
            select_places_for_day(&places, DayTheme::NatureScenic, 3),
            names(&["Red Fort"])
        );
        assert!(select_places_for_day(&[], DayTheme::LocalCuisine, 2).is_empty());
    }

    #[test]
    fn day_cost_uses_lower_bounds_and_budget_multiplier() {
        let activities = vec![
            activity("₹300-800", Confidence::High),
            activity("Free", Confidence::High),
            activity("ask at the counter", Confidence::Medium),
        ];
        assert_eq!(day_cost(&activities, Budget::MidRange), 800);
        assert_eq!(day_cost(&activities, Budget::Budget), 560);
        assert_eq!(day_cost(&activities, Budget::Luxury), 1440);
        assert_eq!(day_cost(&[], Budget::Luxury), 0);
    }

    #[test]
    fn date_label_offsets_from_the_start_date() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        assert_eq!(date_label(start, 1).expect("label"), "Saturday, March 1, 2025");
        assert_eq!(date_label(start, 3).expect("label"), "Monday, March 3, 2025");
    }

    #[test]
    fn trip_dates_past_the_calendar_end_are_errors() {
        assert!(trip_date(NaiveDate::MAX, 1).is_ok());
        assert!(matches!(
            trip_date(NaiveDate::MAX, 2),
            Err(CoreError::DateOutOfRange(start)) if start == NaiveDate::MAX
        ));
        assert!(date_label(NaiveDate::MAX, 3).is_err());
    }

    #[test]
    fn plan_confidence_averages_suggestions_and_days() {
        let suggestions = vec![suggestion(Confidence::High), suggestion(Confidence::High)];
        let days = vec![DayPlan {
            day: 1,
            date: String::new(),
            theme: String::new(),
            activities: vec![
                activity("Free", Confidence::High),
                activity("Free", Confidence::Low),
            ],
            estimated_cost: 0,
            tips: Vec::new(),
            images: Vec::new(),
        }];
        // suggestions 1.0, activities 0.7
        assert_eq!(plan_confidence(&suggestions, &days), 85);
        assert_eq!(plan_confidence(&[], &[]), 0);
    }

    #[test]
    fn generic_activities_fill_every_slot_with_budget_costs() {
        let activities = generic_activities("Shillong", Budget::Luxury);
        assert_eq!(activities.len(), DAY_SLOTS.len());
        assert_eq!(activities[1].name, "Shillong Restaurant");
        assert_eq!(activities[1].cost, "₹2000-6000");
        assert!(activities.iter().all(|a| a.confidence == Confidence::Low));
    }
}

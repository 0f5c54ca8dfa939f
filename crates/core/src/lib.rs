pub mod error;
pub mod itinerary;
pub mod models;
pub mod outfit;
pub mod places;
pub mod pricing;

pub use error::CoreError;
pub use itinerary::{
    budget_cost, date_label, day_cost, default_day_tips, generic_activities, plan_confidence,
    select_places_for_day, theme_for_day, trip_date, DayTheme, TimeSlot, DAY_SLOTS,
};
pub use models::*;
pub use outfit::{
    pseudo_forecast, recommend_outfit, style_tips, Climate, ForecastDay, OutfitAdvice,
    WeatherCondition, MAX_FORECAST_DAYS,
};
pub use places::{
    best_for, categorize_place, describe_place, estimate_cost, estimate_duration,
    estimate_rating, map_link, matches_interest, place_tips, round_to_tenth, stable_hash,
};
pub use pricing::{annual_savings_percent, pricing_plans, BillingCycle, PricingPlan, TRIAL_DAYS};

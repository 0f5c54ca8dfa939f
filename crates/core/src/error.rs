use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("destination must not be blank")]
    BlankDestination,
    #[error("unknown budget `{0}` (expected budget, mid-range or luxury)")]
    UnknownBudget(String),
    #[error("unknown travel style `{0}` (expected solo, couple, family, friends or business)")]
    UnknownTravelStyle(String),
    #[error("unknown billing cycle `{0}` (expected monthly or annual)")]
    UnknownBillingCycle(String),
    #[error("saved item name must not be blank")]
    BlankItemName,
    #[error("trip starting {0} runs past the last supported calendar date")]
    DateOutOfRange(NaiveDate),
}

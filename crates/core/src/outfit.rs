use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::itinerary::trip_date;
use crate::places::{stable_hash, unit_interval};

pub const MAX_FORECAST_DAYS: u8 = 7;

/// Monthly-agnostic climate normals for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    pub avg_high_c: f64,
    pub avg_low_c: f64,
    pub humidity: u8,
    #[serde(default)]
    pub wet_months: Vec<u32>,
    #[serde(default)]
    pub summary: String,
}

impl Climate {
    pub fn tropical() -> Self {
        Self {
            avg_high_c: 31.0,
            avg_low_c: 23.0,
            humidity: 70,
            wet_months: vec![6, 7, 8, 9],
            summary: "warm and humid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: u8,
    pub date: NaiveDate,
    pub high_c: i32,
    pub low_c: i32,
    pub condition: WeatherCondition,
    pub rain_chance: u8,
    pub humidity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitAdvice {
    pub top: String,
    pub bottom: String,
    pub shoes: String,
    pub extras: Vec<String>,
    pub summary: String,
    pub activity_hint: String,
}

/// Builds a repeatable forecast from climate normals. The same city and date
/// always produce the same day.
pub fn pseudo_forecast(
    city: &str,
    climate: &Climate,
    start: NaiveDate,
    days: u8,
) -> Result<Vec<ForecastDay>, CoreError> {
    let days = days.clamp(1, MAX_FORECAST_DAYS);
    let city_key = city.trim().to_lowercase();

    (1..=days)
        .map(|day| {
            let date = trip_date(start, day)?;
            let hash = stable_hash(format!("{city_key}:{date}").as_bytes());
            let swing = unit_interval(hash) - 0.5;
            let wet = climate.wet_months.contains(&date.month());

            let high_c = (climate.avg_high_c + swing * 4.0).round() as i32;
            let low_c = ((climate.avg_low_c + swing * 3.0).round() as i32).min(high_c - 2);
            let rain_roll = ((hash >> 20) % 40) as u8;
            let rain_chance = if wet { 45 + rain_roll } else { rain_roll / 2 };
            let humidity_shift = ((hash >> 32) % 11) as i16 - 5;
            let humidity = (i16::from(climate.humidity) + humidity_shift).clamp(0, 100) as u8;

            let condition = match rain_chance {
                75.. => WeatherCondition::Stormy,
                50..=74 => WeatherCondition::Rainy,
                20..=49 => WeatherCondition::Cloudy,
                _ => WeatherCondition::Sunny,
            };

            Ok(ForecastDay {
                day,
                date,
                high_c,
                low_c,
                condition,
                rain_chance,
                humidity,
            })
        })
        .collect()
}

pub fn recommend_outfit(day: &ForecastDay) -> OutfitAdvice {
    let (top, bottom, mut shoes, summary, mut activity_hint) = match day.high_c {
        32.. => (
            "Linen shirt or breathable cotton tee",
            "Light cotton trousers or shorts",
            "Breathable sandals",
            "Hot",
            "Plan outdoor sightseeing for early morning or after sunset",
        ),
        24..=31 => (
            "Cotton shirt",
            "Comfortable pants",
            "Walking shoes",
            "Pleasant",
            "City exploration",
        ),
        16..=23 => (
            "Full-sleeve shirt with a light layer",
            "Jeans or chinos",
            "Closed walking shoes",
            "Mild",
            "Ideal for long walking tours",
        ),
        _ => (
            "Sweater or fleece jacket",
            "Warm trousers",
            "Closed shoes with socks",
            "Cool",
            "Heritage walks in the afternoon sun",
        ),
    };

    let mut extras = Vec::new();
    let wet = day.rain_chance >= 50
        || matches!(day.condition, WeatherCondition::Rainy | WeatherCondition::Stormy);
    if wet {
        shoes = "Waterproof sandals or quick-dry shoes";
        extras.push("Compact umbrella".to_string());
        extras.push("Light rain jacket".to_string());
        activity_hint = if day.condition == WeatherCondition::Stormy {
            "Stick to indoor attractions"
        } else {
            "Keep indoor options like museums handy"
        };
    }
    if day.condition == WeatherCondition::Sunny {
        extras.push("Sunglasses".to_string());
    }
    if day.high_c >= 28 {
        extras.push("Sunscreen".to_string());
    }
    if day.humidity >= 70 {
        extras.push("Breathable fabrics such as cotton or linen".to_string());
    }
    extras.push("Reusable water bottle".to_string());
    extras.push("Light shawl for air-conditioned spaces".to_string());

    OutfitAdvice {
        top: top.to_string(),
        bottom: bottom.to_string(),
        shoes: shoes.to_string(),
        extras,
        summary: summary.to_string(),
        activity_hint: activity_hint.to_string(),
    }
}

pub fn style_tips(city: &str, climate: &Climate) -> Vec<String> {
    let fabric = if climate.humidity >= 65 {
        format!(
            "Light, breathable fabrics work best in {city}'s humid climate. Cotton and linen are your best friends."
        )
    } else if climate.avg_low_c < 15.0 {
        format!("Evenings in {city} get cool, so pack a warm layer you can take on and off.")
    } else {
        format!("Breathable layers suit {city}'s {} weather.", climate.summary)
    };

    vec![
        fabric,
        "Always carry a light jacket or shawl for air-conditioned spaces.".to_string(),
        format!("Comfortable walking shoes are essential for exploring {city}'s bustling streets."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(high_c: i32, rain_chance: u8, condition: WeatherCondition, humidity: u8) -> ForecastDay {
        ForecastDay {
            day: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
            high_c,
            low_c: high_c - 8,
            condition,
            rain_chance,
            humidity,
        }
    }

    #[test]
    fn warm_dry_day_gets_city_outfit() {
        let advice = recommend_outfit(&day(28, 10, WeatherCondition::Sunny, 40));
        assert_eq!(advice.top, "Cotton shirt");
        assert_eq!(advice.shoes, "Walking shoes");
        assert!(advice.extras.contains(&"Sunglasses".to_string()));
        assert!(advice.extras.contains(&"Sunscreen".to_string()));
        assert!(!advice.extras.iter().any(|item| item.contains("umbrella")));
    }

    #[test]
    fn rain_overrides_shoes_and_adds_gear() {
        let advice = recommend_outfit(&day(26, 65, WeatherCondition::Rainy, 85));
        assert_eq!(advice.shoes, "Waterproof sandals or quick-dry shoes");
        assert!(advice.extras.contains(&"Compact umbrella".to_string()));
        assert!(advice.extras.iter().any(|item| item.starts_with("Breathable fabrics")));
        assert_eq!(advice.activity_hint, "Keep indoor options like museums handy");
    }

    #[test]
    fn cold_day_gets_layers() {
        let advice = recommend_outfit(&day(12, 0, WeatherCondition::Cloudy, 30));
        assert_eq!(advice.summary, "Cool");
        assert_eq!(advice.top, "Sweater or fleece jacket");
    }

    #[test]
    fn forecast_is_repeatable_and_clamped() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date");
        let climate = Climate::tropical();
        let first = pseudo_forecast("Mumbai", &climate, start, 30).expect("forecast");
        let second = pseudo_forecast("mumbai", &climate, start, 30).expect("forecast");

        assert_eq!(first.len(), usize::from(MAX_FORECAST_DAYS));
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.high_c, b.high_c);
            assert_eq!(a.rain_chance, b.rain_chance);
            assert!(a.low_c < a.high_c);
            // July is a wet month in the tropical normals
            assert!(a.rain_chance >= 45);
        }
        assert_eq!(first[6].date, NaiveDate::from_ymd_opt(2025, 7, 7).expect("valid date"));
    }

    #[test]
    fn forecast_running_off_the_calendar_is_an_error() {
        let climate = Climate::tropical();
        let start = NaiveDate::MAX.pred_opt().expect("valid date");

        assert_eq!(pseudo_forecast("Mumbai", &climate, start, 2).expect("fits").len(), 2);
        assert!(matches!(
            pseudo_forecast("Mumbai", &climate, start, 5),
            Err(CoreError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn style_tips_mention_the_city() {
        let tips = style_tips("Mumbai", &Climate::tropical());
        assert_eq!(tips.len(), 3);
        assert!(tips[0].contains("Mumbai's humid climate"));
    }
}

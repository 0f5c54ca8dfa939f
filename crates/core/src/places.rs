use url::form_urlencoded;

use crate::models::PlaceCategory;

const CATEGORY_RULES: &[(PlaceCategory, &[&str])] = &[
    (
        PlaceCategory::Religious,
        &["temple", "mandir", "dargah", "cathedral", "mosque", "ashram"],
    ),
    (
        PlaceCategory::Historical,
        &["fort", "palace", "museum", "memorial", "tomb"],
    ),
    (
        PlaceCategory::Nature,
        &["beach", "lake", "park", "garden", "valley", "caves"],
    ),
    (PlaceCategory::Shopping, &["mall", "market", "road"]),
    (PlaceCategory::Entertainment, &["city", "film", "zoo"]),
    (
        PlaceCategory::FoodAndBeverage,
        &["cafe", "restaurant", "cappuccino", "coffee", "bistro", "bean", "gallery", "brew"],
    ),
];

const INTEREST_KEYWORDS: &[(&str, &[&str])] = &[
    ("culture", &["temple", "palace", "fort", "museum", "heritage"]),
    ("history", &["fort", "palace", "museum", "memorial", "tomb", "heritage"]),
    ("nature", &["park", "garden", "beach", "lake", "valley", "caves"]),
    ("adventure", &["caves", "valley", "trekking", "safari", "water sports"]),
    ("relaxation", &["beach", "park", "garden", "lake", "spa"]),
    ("photography", &["palace", "fort", "memorial", "beach", "sunset"]),
    (
        "food",
        &["market", "bazaar", "street", "cafe", "restaurant", "coffee", "bistro"],
    ),
    ("shopping", &["market", "bazaar", "mall", "road"]),
    ("spiritual", &["temple", "dargah", "cathedral", "mosque", "ashram"]),
    ("beach", &["beach", "coast", "marine"]),
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn categorize_place(name: &str) -> PlaceCategory {
    let name = name.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| contains_any(&name, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(PlaceCategory::Attraction)
}

/// True when the place name carries one of the keywords mapped to the interest.
/// Unknown interests never match.
pub fn matches_interest(name: &str, interest: &str) -> bool {
    let name = name.to_lowercase();
    let interest = interest.trim().to_lowercase();
    INTEREST_KEYWORDS
        .iter()
        .find(|(key, _)| *key == interest)
        .map(|(_, keywords)| contains_any(&name, keywords))
        .unwrap_or(false)
}

pub fn estimate_duration(name: &str) -> &'static str {
    let name = name.to_lowercase();
    if contains_any(&name, &["museum", "palace", "fort"]) {
        "2-3 hours"
    } else if contains_any(&name, &["temple", "dargah", "cathedral"]) {
        "1-2 hours"
    } else if contains_any(&name, &["park", "garden"]) {
        "1-3 hours"
    } else if contains_any(&name, &["beach", "lake"]) {
        "2-4 hours"
    } else if contains_any(&name, &["cafe", "coffee", "bistro"]) {
        "1-2 hours"
    } else if contains_any(&name, &["valley", "caves"]) {
        "3-5 hours"
    } else {
        "1-2 hours"
    }
}

pub fn estimate_cost(name: &str) -> &'static str {
    let name = name.to_lowercase();
    if contains_any(&name, &["museum", "palace", "fort"]) {
        "₹25-100"
    } else if contains_any(&name, &["temple", "dargah", "cathedral"]) {
        "Free"
    } else if contains_any(&name, &["park", "garden"]) {
        "₹10-50"
    } else if contains_any(&name, &["beach", "lake", "memorial"]) {
        "Free"
    } else if contains_any(&name, &["cafe", "coffee", "bistro"]) {
        "₹150-500"
    } else if contains_any(&name, &["caves"]) {
        "₹25-75"
    } else {
        "₹20-100"
    }
}

/// FNV-1a over the given bytes.
pub fn stable_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Maps a hash onto `[0, 1)`.
pub fn unit_interval(hash: u64) -> f64 {
    (hash % 10_000) as f64 / 10_000.0
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn estimate_rating(name: &str) -> f64 {
    let lowered = name.to_lowercase();
    let (base, spread) = if contains_any(&lowered, &["unesco", "gateway", "taj", "red fort", "qutub"]) {
        (4.5, 0.4)
    } else if contains_any(&lowered, &["temple", "dargah", "cathedral"]) {
        (4.2, 0.6)
    } else if contains_any(&lowered, &["park", "garden", "beach"]) {
        (4.0, 0.7)
    } else if contains_any(&lowered, &["cafe", "restaurant", "coffee", "bistro"]) {
        (4.1, 0.7)
    } else {
        (3.8, 0.9)
    };

    let offset = unit_interval(stable_hash(lowered.trim().as_bytes())) * spread;
    round_to_tenth(base + offset)
}

pub fn place_tips(name: &str) -> Vec<String> {
    let lowered = name.to_lowercase();
    let tips: [&str; 3] = if contains_any(&lowered, &["temple", "dargah"]) {
        [
            "Dress modestly and remove shoes before entering",
            "Visit during morning or evening prayers for spiritual experience",
            "Photography may be restricted in certain areas",
        ]
    } else if lowered.contains("beach") {
        [
            "Visit during sunset for beautiful views",
            "Try local street food but choose hygienic vendors",
            "Be cautious of strong currents while swimming",
        ]
    } else if contains_any(&lowered, &["cafe", "coffee", "bistro"]) {
        [
            "Try their signature coffee blends and specialties",
            "Great for working or casual meetings",
            "Check opening hours before visiting",
        ]
    } else {
        [
            "Plan your visit during cooler hours",
            "Carry water and wear comfortable shoes",
            "Check opening hours before visiting",
        ]
    };
    tips.iter().map(|tip| tip.to_string()).collect()
}

pub fn describe_place(name: &str, city: &str) -> String {
    let category = categorize_place(name);
    let lowered = name.to_lowercase();

    if category == PlaceCategory::FoodAndBeverage {
        if contains_any(&lowered, &["cafe", "coffee", "cappuccino"]) {
            return format!(
                "Popular coffee destination in {city} known for its quality beverages, comfortable atmosphere, and excellent service"
            );
        }
        if contains_any(&lowered, &["restaurant", "bistro"]) {
            return format!(
                "Well-regarded dining establishment in {city} offering delicious cuisine and memorable dining experiences"
            );
        }
    }

    format!(
        "Popular {} destination in {city}, offering unique cultural and memorable experiences for visitors",
        category.label().to_lowercase()
    )
}

fn category_tags(category: PlaceCategory) -> &'static [&'static str] {
    match category {
        PlaceCategory::Historical => &["History", "Culture"],
        PlaceCategory::Religious => &["Culture", "Spiritual"],
        PlaceCategory::Nature => &["Nature", "Photography"],
        PlaceCategory::Shopping => &["Shopping", "Culture"],
        PlaceCategory::Entertainment => &["Adventure", "Family"],
        PlaceCategory::FoodAndBeverage | PlaceCategory::Attraction => &[],
    }
}

/// Tags a destination by the categories of its places, then by the traveller's interests.
pub fn best_for<S: AsRef<str>>(places: &[S], interests: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let candidates = places
        .iter()
        .flat_map(|place| category_tags(categorize_place(place.as_ref())).iter().copied())
        .map(str::to_string)
        .chain(interests.iter().cloned());

    for tag in candidates {
        if !tags.iter().any(|existing| existing.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }

    tags.truncate(4);
    tags
}

pub fn map_link(query: &str, place_id: Option<&str>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("api", "1");
    serializer.append_pair("query", query);
    if let Some(place_id) = place_id.filter(|id| !id.is_empty()) {
        serializer.append_pair("query_place_id", place_id);
    }
    format!("https://www.google.com/maps/search/?{}", serializer.finish())
}

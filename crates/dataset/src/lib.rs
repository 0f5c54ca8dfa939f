mod images;
mod normalize;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use travelwise_core::{
    categorize_place, describe_place, estimate_cost, estimate_duration, estimate_rating,
    matches_interest, place_tips, Climate, Coordinates, PlaceInfo,
};
use walkdir::WalkDir;

pub use images::{ImageCatalog, ImageSection, PlaceImages};
pub use normalize::{normalize_term, visible_len};

pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 50.0;
pub const AUTOCOMPLETE_LIMIT: usize = 5;
pub const MUMBAI: Coordinates = Coordinates::new(19.0760, 72.8777);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    pub city: String,
    pub state: String,
    pub popular_places: Vec<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub climate: Option<Climate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub city: String,
    pub name: String,
    pub cuisine: String,
    pub description: String,
    pub location: String,
    pub rating: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub must_try: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub city: String,
    pub name: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Hand-written description and tips that override the generated ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceNote {
    pub place: String,
    pub description: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatasetDocument {
    #[serde(default)]
    cities: Vec<CityRecord>,
    #[serde(default)]
    restaurants: Vec<RestaurantRecord>,
    #[serde(default)]
    experiences: Vec<ExperienceRecord>,
    #[serde(default)]
    images: Option<ImageSection>,
    #[serde(default)]
    city_tips: HashMap<String, Vec<String>>,
    #[serde(default)]
    place_notes: Vec<PlaceNote>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceMatch {
    pub place: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterestMatch {
    pub city: String,
    pub state: String,
    pub matching_places: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub files_loaded: usize,
    pub cities: usize,
    pub places: usize,
    pub restaurants: usize,
    pub experiences: usize,
    pub curated_images: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    cities: Vec<CityRecord>,
    restaurants: Vec<RestaurantRecord>,
    experiences: Vec<ExperienceRecord>,
    city_tips: HashMap<String, Vec<String>>,
    place_notes: HashMap<String, PlaceNote>,
    images: ImageCatalog,
    files_loaded: usize,
}

impl DatasetCatalog {
    pub fn from_data_dir(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref();
        if !root.is_dir() {
            bail!("dataset root is not a directory: {}", root.display());
        }

        let mut catalog = Self::default();
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("json"))
        {
            let path = entry.path();
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed reading dataset file: {}", path.display()))?;
            let document = serde_json::from_str::<DatasetDocument>(&raw)
                .with_context(|| format!("malformed dataset file: {}", path.display()))?;
            catalog.merge(document);
            catalog.files_loaded += 1;
        }

        Ok(catalog)
    }

    fn merge(&mut self, document: DatasetDocument) {
        self.cities.extend(document.cities);
        self.restaurants.extend(document.restaurants);
        self.experiences.extend(document.experiences);
        if let Some(images) = document.images {
            self.images.merge(images);
        }
        for (city, tips) in document.city_tips {
            self.city_tips
                .entry(normalize_term(&city))
                .or_default()
                .extend(tips);
        }
        for note in document.place_notes {
            self.place_notes.insert(normalize_term(&note.place), note);
        }
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            files_loaded: self.files_loaded,
            cities: self.cities.len(),
            places: self.cities.iter().map(|c| c.popular_places.len()).sum(),
            restaurants: self.restaurants.len(),
            experiences: self.experiences.len(),
            curated_images: self.images.len(),
        }
    }

    pub fn images(&self) -> &ImageCatalog {
        &self.images
    }

    /// Exact case-insensitive match first, then containment in either direction.
    pub fn find_city(&self, name: &str) -> Option<&CityRecord> {
        let term = normalize_term(name);
        if term.is_empty() {
            return None;
        }

        self.cities
            .iter()
            .find(|record| normalize_term(&record.city) == term)
            .or_else(|| {
                self.cities.iter().find(|record| {
                    let city = normalize_term(&record.city);
                    city.contains(&term) || term.contains(&city)
                })
            })
    }

    /// Popular places of the city matching `name`, empty when unknown.
    pub fn places_by_city(&self, name: &str) -> &[String] {
        self.find_city(name)
            .map(|record| record.popular_places.as_slice())
            .unwrap_or_default()
    }

    pub fn cities_in_state(&self, state: &str) -> Vec<&CityRecord> {
        let term = normalize_term(state);
        if term.is_empty() {
            return Vec::new();
        }
        self.cities
            .iter()
            .filter(|record| normalize_term(&record.state).contains(&term))
            .collect()
    }

    /// Other cities in the same state as `name`.
    pub fn nearby_cities(&self, name: &str) -> Vec<&CityRecord> {
        let Some(origin) = self.find_city(name) else {
            return Vec::new();
        };
        let state = normalize_term(&origin.state);
        let city = normalize_term(&origin.city);

        self.cities
            .iter()
            .filter(|record| normalize_term(&record.state) == state)
            .filter(|record| normalize_term(&record.city) != city)
            .collect()
    }

    pub fn all_cities(&self) -> &[CityRecord] {
        &self.cities
    }

    pub fn all_states(&self) -> Vec<String> {
        let mut states: Vec<String> = Vec::new();
        for record in &self.cities {
            if !states.iter().any(|state| state == &record.state) {
                states.push(record.state.clone());
            }
        }
        states
    }

    pub fn search_places(&self, query: &str) -> Vec<PlaceMatch> {
        let term = normalize_term(query);
        if term.is_empty() {
            return Vec::new();
        }

        self.cities
            .iter()
            .flat_map(|record| {
                record
                    .popular_places
                    .iter()
                    .filter(|place| place.to_lowercase().contains(&term))
                    .map(|place| PlaceMatch {
                        place: place.clone(),
                        city: record.city.clone(),
                        state: record.state.clone(),
                    })
            })
            .collect()
    }

    /// Cities with at least one place matching an interest, most matches first.
    pub fn suggestions_by_interests(&self, interests: &[String]) -> Vec<InterestMatch> {
        let interests = interests
            .iter()
            .map(|interest| normalize_term(interest))
            .filter(|interest| !interest.is_empty())
            .collect::<Vec<_>>();
        if interests.is_empty() {
            return Vec::new();
        }

        let mut matches = self
            .cities
            .iter()
            .filter_map(|record| {
                let matching_places = record
                    .popular_places
                    .iter()
                    .filter(|place| {
                        let category = categorize_place(place).label().to_lowercase();
                        interests.iter().any(|interest| {
                            category.contains(interest.as_str())
                                || interest.contains(category.as_str())
                                || matches_interest(place, interest)
                        })
                    })
                    .cloned()
                    .collect::<Vec<_>>();

                (!matching_places.is_empty()).then(|| InterestMatch {
                    city: record.city.clone(),
                    state: record.state.clone(),
                    matching_places,
                })
            })
            .collect::<Vec<_>>();

        matches.sort_by(|a, b| b.matching_places.len().cmp(&a.matching_places.len()));
        matches
    }

    pub fn autocomplete(&self, input: &str) -> Vec<&CityRecord> {
        if visible_len(input) < 2 {
            return Vec::new();
        }
        let term = normalize_term(input);

        self.cities
            .iter()
            .filter(|record| normalize_term(&record.city).contains(&term))
            .take(AUTOCOMPLETE_LIMIT)
            .collect()
    }

    pub fn place_info(&self, place: &str, city: &str) -> PlaceInfo {
        let record = self.find_city(city);
        let city_name = record
            .map(|record| record.city.clone())
            .unwrap_or_else(|| city.trim().to_string());
        let state = record
            .map(|record| record.state.clone())
            .unwrap_or_else(|| "India".to_string());
        let note = self.place_notes.get(&normalize_term(place));

        let description = note
            .map(|note| note.description.clone())
            .unwrap_or_else(|| describe_place(place, &city_name));
        let tips = note
            .filter(|note| !note.tips.is_empty())
            .map(|note| note.tips.clone())
            .unwrap_or_else(|| place_tips(place));

        PlaceInfo {
            name: place.trim().to_string(),
            city: city_name.clone(),
            state,
            category: categorize_place(place),
            description,
            rating: estimate_rating(place),
            image: self.images.primary_image(place, &city_name).unwrap_or_default(),
            tips,
            duration: estimate_duration(place).to_string(),
            cost: estimate_cost(place).to_string(),
        }
    }

    pub fn restaurants_for(&self, city: &str) -> Vec<&RestaurantRecord> {
        let Some(record) = self.find_city(city) else {
            return Vec::new();
        };
        let key = normalize_term(&record.city);
        self.restaurants
            .iter()
            .filter(|restaurant| normalize_term(&restaurant.city) == key)
            .collect()
    }

    pub fn experience_for(&self, city: &str) -> Option<&ExperienceRecord> {
        let record = self.find_city(city)?;
        let key = normalize_term(&record.city);
        self.experiences
            .iter()
            .find(|experience| normalize_term(&experience.city) == key)
    }

    pub fn city_tips(&self, city: &str) -> Vec<String> {
        self.find_city(city)
            .and_then(|record| self.city_tips.get(&normalize_term(&record.city)))
            .cloned()
            .unwrap_or_default()
    }

    /// Nearest dataset city within `radius_km`, with its distance.
    pub fn nearest_city(&self, point: Coordinates, radius_km: f64) -> Option<(&CityRecord, f64)> {
        self.cities
            .iter()
            .filter_map(|record| {
                record
                    .coordinates
                    .map(|coordinates| (record, point.distance_km(&coordinates)))
            })
            .filter(|(_, distance)| *distance <= radius_km)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }

    pub fn city_coordinates(&self, city: &str) -> Coordinates {
        self.find_city(city)
            .and_then(|record| record.coordinates)
            .unwrap_or(MUMBAI)
    }

    pub fn climate_for(&self, city: &str) -> Climate {
        self.find_city(city)
            .and_then(|record| record.climate.clone())
            .unwrap_or_else(Climate::tropical)
    }
}

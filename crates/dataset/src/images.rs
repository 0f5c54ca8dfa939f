use std::collections::HashMap;

use serde::Deserialize;
use travelwise_core::{categorize_place, PlaceCategory};

use crate::normalize::normalize_term;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceImages {
    pub place: String,
    pub city: String,
    pub primary: String,
    #[serde(default)]
    pub gallery: Vec<String>,
}

/// `images` section of a dataset document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSection {
    #[serde(default)]
    pub places: Vec<PlaceImages>,
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    key: String,
    place_key: String,
    city_key: String,
    images: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    entries: Vec<CatalogEntry>,
    categories: HashMap<String, Vec<String>>,
}

fn catalog_key(place: &str, city: &str) -> String {
    format!("{}_{}", normalize_term(place), normalize_term(city))
}

fn category_key(category: PlaceCategory) -> &'static str {
    match category {
        PlaceCategory::Religious => "religious",
        PlaceCategory::Historical => "historical",
        PlaceCategory::Nature => "nature",
        PlaceCategory::Shopping => "shopping",
        PlaceCategory::FoodAndBeverage => "food",
        PlaceCategory::Entertainment | PlaceCategory::Attraction => "general",
    }
}

impl ImageCatalog {
    pub fn merge(&mut self, section: ImageSection) {
        for entry in section.places {
            let place_key = normalize_term(&entry.place);
            let city_key = normalize_term(&entry.city);
            let key = catalog_key(&entry.place, &entry.city);
            let images = std::iter::once(entry.primary)
                .chain(entry.gallery)
                .filter(|url| !url.trim().is_empty())
                .collect::<Vec<_>>();
            if images.is_empty() {
                continue;
            }

            self.entries.retain(|existing| existing.key != key);
            self.entries.push(CatalogEntry {
                key,
                place_key,
                city_key,
                images,
            });
        }

        for (category, urls) in section.categories {
            self.categories
                .entry(normalize_term(&category))
                .or_default()
                .extend(urls);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, place: &str, city: &str) -> Option<&CatalogEntry> {
        let key = catalog_key(place, city);
        if let Some(entry) = self.entries.iter().find(|entry| entry.key == key) {
            return Some(entry);
        }

        let place_key = normalize_term(place);
        if !place_key.is_empty() {
            let partial = self.entries.iter().find(|entry| {
                entry.key.contains(&place_key) || place_key.contains(&entry.place_key)
            });
            if partial.is_some() {
                return partial;
            }
        }

        let city_key = normalize_term(city);
        if city_key.is_empty() {
            return None;
        }
        self.entries.iter().find(|entry| entry.city_key == city_key)
    }

    /// Up to `count` images for a place, primary first. Falls back to the
    /// place's category defaults, then to the general set.
    pub fn images_for(&self, place: &str, city: &str, count: usize) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }

        if let Some(entry) = self.lookup(place, city) {
            return entry.images.iter().take(count).cloned().collect();
        }

        let category = category_key(categorize_place(place));
        self.categories
            .get(category)
            .filter(|urls| !urls.is_empty())
            .or_else(|| self.categories.get("general"))
            .map(|urls| urls.iter().take(count).cloned().collect())
            .unwrap_or_default()
    }

    pub fn primary_image(&self, place: &str, city: &str) -> Option<String> {
        self.images_for(place, city, 1).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ImageCatalog {
        let mut catalog = ImageCatalog::default();
        catalog.merge(ImageSection {
            places: vec![
                PlaceImages {
                    place: "Gateway of India".to_string(),
                    city: "Mumbai".to_string(),
                    primary: "gateway-1".to_string(),
                    gallery: vec!["gateway-2".to_string(), "gateway-3".to_string()],
                },
                PlaceImages {
                    place: "RK Beach".to_string(),
                    city: "Visakhapatnam".to_string(),
                    primary: "rk-1".to_string(),
                    gallery: Vec::new(),
                },
            ],
            categories: HashMap::from([
                ("religious".to_string(), vec!["temple-1".to_string(), "temple-2".to_string()]),
                ("general".to_string(), vec!["general-1".to_string()]),
            ]),
        });
        catalog
    }

    #[test]
    fn exact_key_returns_primary_then_gallery() {
        let images = catalog().images_for("Gateway of India", "MUMBAI", 2);
        assert_eq!(images, vec!["gateway-1", "gateway-2"]);
    }

    #[test]
    fn partial_place_match_ignores_city() {
        let images = catalog().images_for("RK Beach Road Promenade", "Vizag", 3);
        assert_eq!(images, vec!["rk-1"]);
    }

    #[test]
    fn city_match_beats_category_default() {
        let images = catalog().images_for("Siddhivinayak Temple", "Mumbai", 1);
        assert_eq!(images, vec!["gateway-1"]);
    }

    #[test]
    fn unknown_places_use_category_then_general_defaults() {
        let catalog = catalog();
        assert_eq!(catalog.images_for("Meenakshi Temple", "Madurai", 5), vec!["temple-1", "temple-2"]);
        assert_eq!(catalog.images_for("Charminar", "Hyderabad", 1), vec!["general-1"]);
        assert!(catalog.images_for("Charminar", "Hyderabad", 0).is_empty());
    }
}

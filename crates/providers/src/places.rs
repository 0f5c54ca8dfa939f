use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use travelwise_core::{estimate_rating, map_link, Coordinates, PlaceSearchResult};
use travelwise_dataset::ImageCatalog;
use url::Url;

use crate::config::PlacesRuntimeConfig;
use crate::error::ProviderError;

const PROVIDER: &str = "places_api";

#[derive(Debug, Clone)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub rating: Option<f64>,
    pub photo_reference: Option<String>,
    pub types: Vec<String>,
    pub location: Option<Coordinates>,
}

pub trait PlacesProvider: Send + Sync {
    fn is_live(&self) -> bool;
    fn photo_url(&self, photo_reference: &str) -> Option<String>;
    async fn text_search(&self, query: &str) -> Result<Vec<PlaceDetails>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    place_id: String,
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    photos: Vec<RawPhoto>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: Coordinates,
}

impl From<RawPlace> for PlaceDetails {
    fn from(raw: RawPlace) -> Self {
        Self {
            place_id: raw.place_id,
            name: raw.name,
            formatted_address: raw.formatted_address,
            rating: raw.rating,
            photo_reference: raw.photos.into_iter().next().map(|photo| photo.photo_reference),
            types: raw.types,
            location: raw.geometry.map(|geometry| geometry.location),
        }
    }
}

#[derive(Clone)]
pub struct GooglePlacesClient {
    http: Client,
    runtime: PlacesRuntimeConfig,
}

impl GooglePlacesClient {
    pub fn new(http: Client, runtime: PlacesRuntimeConfig) -> Self {
        Self { http, runtime }
    }
}

impl PlacesProvider for GooglePlacesClient {
    fn is_live(&self) -> bool {
        true
    }

    fn photo_url(&self, photo_reference: &str) -> Option<String> {
        if photo_reference.trim().is_empty() {
            return None;
        }
        let base = self.runtime.base_url.trim_end_matches('/');
        let endpoint = format!("{base}/maps/api/place/photo");
        let mut url = match Url::parse(&endpoint) {
            Ok(url) => url,
            Err(error) => {
                warn!(provider = PROVIDER, error = %error, "invalid places base url");
                return None;
            }
        };
        // The photo endpoint only accepts the key as a query parameter.
        url.query_pairs_mut()
            .append_pair("maxwidth", &self.runtime.photo_max_width.to_string())
            .append_pair("photoreference", photo_reference)
            .append_pair("key", &self.runtime.api_key);
        Some(url.into())
    }

    async fn text_search(&self, query: &str) -> Result<Vec<PlaceDetails>, ProviderError> {
        let url = format!("{}/maps/api/place/textsearch/json", self.runtime.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("query", query), ("key", self.runtime.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let body: TextSearchResponse =
            response
                .json()
                .await
                .map_err(|error| ProviderError::Malformed {
                    provider: PROVIDER,
                    message: error.to_string(),
                })?;

        match body.status.as_str() {
            "OK" => {
                debug!(query, results = body.results.len(), "places text search");
                Ok(body.results.into_iter().map(PlaceDetails::from).collect())
            }
            "ZERO_RESULTS" => Ok(Vec::new()),
            _ => Err(ProviderError::Api {
                provider: PROVIDER,
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }
}

/// Used when no places key is configured.
#[derive(Debug, Clone, Default)]
pub struct OfflinePlaces;

impl PlacesProvider for OfflinePlaces {
    fn is_live(&self) -> bool {
        false
    }

    fn photo_url(&self, _photo_reference: &str) -> Option<String> {
        None
    }

    async fn text_search(&self, _query: &str) -> Result<Vec<PlaceDetails>, ProviderError> {
        Ok(Vec::new())
    }
}

#[derive(Clone)]
pub enum PlacesBackend {
    Google(GooglePlacesClient),
    Offline(OfflinePlaces),
}

impl PlacesBackend {
    pub fn from_runtime(http: &Client, runtime: Option<PlacesRuntimeConfig>) -> Self {
        match runtime {
            Some(runtime) => Self::Google(GooglePlacesClient::new(http.clone(), runtime)),
            None => Self::Offline(OfflinePlaces),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Google(_) => "google_places",
            Self::Offline(_) => "offline",
        }
    }
}

impl PlacesProvider for PlacesBackend {
    fn is_live(&self) -> bool {
        match self {
            Self::Google(client) => client.is_live(),
            Self::Offline(offline) => offline.is_live(),
        }
    }

    fn photo_url(&self, photo_reference: &str) -> Option<String> {
        match self {
            Self::Google(client) => client.photo_url(photo_reference),
            Self::Offline(offline) => offline.photo_url(photo_reference),
        }
    }

    async fn text_search(&self, query: &str) -> Result<Vec<PlaceDetails>, ProviderError> {
        match self {
            Self::Google(client) => client.text_search(query).await,
            Self::Offline(offline) => offline.text_search(query).await,
        }
    }
}

/// Resolves a place to display details: the top live search hit when the
/// provider has one, otherwise catalog imagery and heuristic rating.
pub async fn fetch_place_details<P: PlacesProvider>(
    provider: &P,
    images: &ImageCatalog,
    place: &str,
    city: &str,
) -> PlaceSearchResult {
    let query = format!("{place} in {city}");

    if provider.is_live() {
        match provider.text_search(&query).await {
            Ok(results) => {
                if let Some(top) = results.into_iter().next() {
                    let photo = top
                        .photo_reference
                        .as_deref()
                        .and_then(|reference| provider.photo_url(reference))
                        .or_else(|| images.primary_image(place, city))
                        .unwrap_or_default();
                    return PlaceSearchResult {
                        map_link: map_link(&query, Some(&top.place_id)),
                        name: top.name,
                        photo,
                        rating: top.rating,
                        address: Some(top.formatted_address).filter(|a| !a.is_empty()),
                        place_id: Some(top.place_id),
                    };
                }
            }
            Err(error) => {
                warn!(error = %error, query = %query, "place lookup failed, using catalog details");
            }
        }
    }

    PlaceSearchResult {
        name: place.to_string(),
        photo: images.primary_image(place, city).unwrap_or_default(),
        map_link: map_link(&query, None),
        rating: Some(estimate_rating(place)),
        address: Some(format!("{city}, India")),
        place_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_urls_encode_every_query_value() {
        let client = GooglePlacesClient::new(
            Client::new(),
            PlacesRuntimeConfig {
                api_key: "key&with=symbols".to_string(),
                base_url: "https://maps.example.com/".to_string(),
                photo_max_width: 400,
            },
        );

        let url = client.photo_url("ref/with spaces+plus").expect("photo url");
        assert_eq!(
            url,
            "https://maps.example.com/maps/api/place/photo?maxwidth=400\
             &photoreference=ref%2Fwith+spaces%2Bplus&key=key%26with%3Dsymbols"
        );
        assert!(client.photo_url("   ").is_none());
    }
}

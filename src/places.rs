use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::geo::LatLng;
use crate::map::MarkerHandle;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId(pub String);

impl PlaceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub location: LatLng,
    pub marker: Option<MarkerHandle>,
}

impl Place {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: LatLng) -> Self {
        Self {
            id: PlaceId(id.into()),
            name: name.into(),
            location,
            marker: None,
        }
    }

    /// Case-insensitive substring match; the empty filter matches every place.
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.name.to_lowercase().contains(&filter.to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearbySearch {
    pub center: LatLng,
    pub radius_meters: u32,
    pub category: String,
}

impl NearbySearch {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            center: config.center,
            radius_meters: config.search_radius_meters,
            category: config.search_category.clone(),
        }
    }
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn nearby_search(&self, request: &NearbySearch) -> AppResult<Vec<Place>>;
}

/// Places Nearby Search over the Google web service.
pub struct HttpPlacesProvider {
    http: Client,
    endpoint: Url,
    api_key: SecretString,
}

impl HttpPlacesProvider {
    pub fn new(http: Client, config: &AppConfig) -> AppResult<Self> {
        let endpoint = Url::parse(&config.places_nearby_endpoint).map_err(|err| {
            AppError::Config(format!("invalid places endpoint: {err}"))
        })?;
        let api_key = config
            .google_maps_api_key
            .clone()
            .ok_or_else(|| AppError::Config("GOOGLE_MAPS_API_KEY is not set".into()))?;
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl PlacesProvider for HttpPlacesProvider {
    async fn nearby_search(&self, request: &NearbySearch) -> AppResult<Vec<Place>> {
        #[derive(Deserialize)]
        struct Response {
            status: String,
            #[serde(default)]
            results: Vec<ResponsePlace>,
        }

        #[derive(Deserialize)]
        struct ResponsePlace {
            place_id: String,
            name: String,
            geometry: ResponseGeometry,
        }

        #[derive(Deserialize)]
        struct ResponseGeometry {
            location: ResponseLocation,
        }

        #[derive(Deserialize)]
        struct ResponseLocation {
            lat: f64,
            lng: f64,
        }

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("location", &request.center.to_query_value())
            .append_pair("radius", &request.radius_meters.to_string())
            .append_pair("type", &request.category)
            .append_pair("key", self.api_key.expose_secret());

        debug!(
            radius = request.radius_meters,
            category = %request.category,
            "requesting nearby places"
        );
        let response = self.http.get(url).send().await?.error_for_status()?;
        let parsed: Response = response.json().await?;

        // ZERO_RESULTS included: an empty roster is a failed load
        if parsed.status != "OK" {
            return Err(AppError::Provider {
                service: "places",
                status: parsed.status,
            });
        }

        let places = parsed
            .results
            .into_iter()
            .map(|place| {
                Place::new(
                    place.place_id,
                    place.name,
                    LatLng::new(place.geometry.location.lat, place.geometry.location.lng),
                )
            })
            .collect::<Vec<_>>();
        trace!(count = places.len(), "nearby places resolved");
        Ok(places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_case_insensitive() {
        let place = Place::new("1", "Chase Bank", LatLng::new(0.0, 0.0));
        assert!(place.matches_filter("chase"));
        assert!(place.matches_filter("E BA"));
        assert!(place.matches_filter(""));
        assert!(!place.matches_filter("wells"));
    }

    #[test]
    fn requires_api_key() {
        let config = AppConfig::default();
        let result = HttpPlacesProvider::new(Client::new(), &config);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::geo::LatLng;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeocodeResult {
    pub formatted_address: String,
}

/// Geocoder status codes other than `OK`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeocodeStatus {
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    /// The request never produced a usable response.
    Error,
    Other(String),
}

impl GeocodeStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "ZERO_RESULTS" => Self::ZeroResults,
            "OVER_QUERY_LIMIT" => Self::OverQueryLimit,
            "REQUEST_DENIED" => Self::RequestDenied,
            "INVALID_REQUEST" => Self::InvalidRequest,
            "UNKNOWN_ERROR" => Self::UnknownError,
            "ERROR" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::Error => "ERROR",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, location: LatLng) -> Result<Vec<GeocodeResult>, GeocodeStatus>;
}

pub struct HttpGeocoder {
    http: Client,
    endpoint: Url,
    api_key: SecretString,
}

impl HttpGeocoder {
    pub fn new(http: Client, config: &AppConfig) -> AppResult<Self> {
        let endpoint = Url::parse(&config.geocode_endpoint).map_err(|err| {
            AppError::Config(format!("invalid geocode endpoint: {err}"))
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

    async fn fetch(&self, location: LatLng) -> AppResult<GeocodeResponse> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("latlng", &location.to_query_value())
            .append_pair("key", self.api_key.expose_secret());
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResponseResult>,
}

#[derive(Deserialize)]
struct GeocodeResponseResult {
    formatted_address: String,
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn reverse_geocode(&self, location: LatLng) -> Result<Vec<GeocodeResult>, GeocodeStatus> {
        let parsed = match self.fetch(location).await {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(?err, "reverse geocode request failed");
                return Err(GeocodeStatus::Error);
            }
        };

        if parsed.status != "OK" {
            return Err(GeocodeStatus::parse(&parsed.status));
        }

        Ok(parsed
            .results
            .into_iter()
            .map(|result| GeocodeResult {
                formatted_address: result.formatted_address,
            })
            .collect())
    }
}

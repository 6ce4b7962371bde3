use std::time::Duration;
use std::{env, io};

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, warn};

use crate::geo::LatLng;

const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.0374771,
    lng: -74.2339456,
};
const DEFAULT_SEARCH_RADIUS_METERS: u32 = 5_000;
const DEFAULT_MARKER_BOUNCE_MS: u64 = 1_400;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

const DEFAULT_PLACES_NEARBY_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_WIKI_API_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_WIKI_ARTICLE_BASE: &str = "https://en.wikipedia.org/wiki/";

/// What happens to popup updates that arrive after a newer place was selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePopupPolicy {
    /// Drop updates from any selection other than the most recent one.
    #[default]
    Discard,
    /// Apply every update to the current popup, whichever selection produced it.
    Overwrite,
}

impl StalePopupPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "discard" => Some(Self::Discard),
            "overwrite" => Some(Self::Overwrite),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_maps_api_key: Option<SecretString>,
    pub center: LatLng,
    pub search_radius_meters: u32,
    pub search_category: String,
    pub places_nearby_endpoint: String,
    pub geocode_endpoint: String,
    pub wiki_api_endpoint: String,
    pub wiki_article_base: String,
    pub marker_bounce_ms: u64,
    pub http_timeout_secs: u64,
    pub stale_popup_policy: StalePopupPolicy,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicAppConfig {
    pub center: LatLng,
    pub search_radius_meters: u32,
    pub search_category: String,
    pub places_nearby_endpoint: String,
    pub geocode_endpoint: String,
    pub wiki_api_endpoint: String,
    pub wiki_article_base: String,
    pub marker_bounce_ms: u64,
    pub http_timeout_secs: u64,
    pub stale_popup_policy: StalePopupPolicy,
    pub has_google_maps_key: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_maps_api_key: None,
            center: DEFAULT_CENTER,
            search_radius_meters: DEFAULT_SEARCH_RADIUS_METERS,
            search_category: "bank".to_string(),
            places_nearby_endpoint: DEFAULT_PLACES_NEARBY_ENDPOINT.to_string(),
            geocode_endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
            wiki_api_endpoint: DEFAULT_WIKI_API_ENDPOINT.to_string(),
            wiki_article_base: DEFAULT_WIKI_ARTICLE_BASE.to_string(),
            marker_bounce_ms: DEFAULT_MARKER_BOUNCE_MS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            stale_popup_policy: StalePopupPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        Self {
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
            center: LatLng {
                lat: parse_f64("BROWSER_CENTER_LAT", DEFAULT_CENTER.lat),
                lng: parse_f64("BROWSER_CENTER_LNG", DEFAULT_CENTER.lng),
            },
            search_radius_meters: parse_u32("SEARCH_RADIUS_METERS", DEFAULT_SEARCH_RADIUS_METERS)
                .max(1),
            search_category: parse_string("SEARCH_CATEGORY", "bank"),
            places_nearby_endpoint: parse_string(
                "PLACES_NEARBY_ENDPOINT",
                DEFAULT_PLACES_NEARBY_ENDPOINT,
            ),
            geocode_endpoint: parse_string("GEOCODE_ENDPOINT", DEFAULT_GEOCODE_ENDPOINT),
            wiki_api_endpoint: parse_string("WIKI_API_ENDPOINT", DEFAULT_WIKI_API_ENDPOINT),
            wiki_article_base: parse_string("WIKI_ARTICLE_BASE", DEFAULT_WIKI_ARTICLE_BASE),
            marker_bounce_ms: parse_u64("MARKER_BOUNCE_MS", DEFAULT_MARKER_BOUNCE_MS),
            http_timeout_secs: parse_u64("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS).max(1),
            stale_popup_policy: parse_policy("STALE_POPUP_POLICY"),
        }
    }

    pub fn public_profile(&self) -> PublicAppConfig {
        PublicAppConfig {
            center: self.center,
            search_radius_meters: self.search_radius_meters,
            search_category: self.search_category.clone(),
            places_nearby_endpoint: self.places_nearby_endpoint.clone(),
            geocode_endpoint: self.geocode_endpoint.clone(),
            wiki_api_endpoint: self.wiki_api_endpoint.clone(),
            wiki_article_base: self.wiki_article_base.clone(),
            marker_bounce_ms: self.marker_bounce_ms,
            http_timeout_secs: self.http_timeout_secs,
            stale_popup_policy: self.stale_popup_policy,
            has_google_maps_key: self.google_maps_api_key.is_some(),
        }
    }

    pub fn marker_bounce(&self) -> Duration {
        Duration::from_millis(self.marker_bounce_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_policy(key: &str) -> StalePopupPolicy {
    match env::var(key) {
        Ok(value) => StalePopupPolicy::parse(&value).unwrap_or_else(|| {
            warn!(value, "unknown stale popup policy; using default");
            StalePopupPolicy::default()
        }),
        Err(_) => StalePopupPolicy::default(),
    }
}

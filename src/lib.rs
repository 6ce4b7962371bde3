mod alert;
mod browser;
mod config;
mod errors;
mod geo;
mod geocode;
mod map;
mod places;
mod popup;
mod resolver;
mod wiki;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::alert::{AlertSink, TracingAlertSink};
pub use crate::browser::{BrowserEvent, BrowserObserver, PlaceBrowser};
pub use crate::config::{AppConfig, PublicAppConfig, StalePopupPolicy};
pub use crate::errors::{AppError, AppResult};
pub use crate::geo::{Bounds, LatLng};
pub use crate::geocode::{GeocodeResult, GeocodeStatus, Geocoder, HttpGeocoder};
pub use crate::map::{HeadlessMap, MapSurface, MarkerAnimation, MarkerHandle, MarkerState};
pub use crate::places::{HttpPlacesProvider, NearbySearch, Place, PlaceId, PlacesProvider};
pub use crate::popup::{escape_html, PopupFragment, PopupState, PopupView};
pub use crate::resolver::{PlaceDetailResolver, PopupTasks, ResolverServices, ResolverSettings};
pub use crate::wiki::{article_url, ArticleHit, ArticleSearch, MediaWikiSearch};

const USER_AGENT: &str = concat!("bank-browser/", env!("CARGO_PKG_VERSION"));

/// The remote services a session is built from.
#[derive(Clone)]
pub struct RemoteServices {
    pub places: Arc<dyn PlacesProvider>,
    pub geocoder: Arc<dyn Geocoder>,
    pub articles: Arc<dyn ArticleSearch>,
}

impl RemoteServices {
    /// HTTP clients for the Places, Geocoding and MediaWiki endpoints in `config`.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            places: Arc::new(HttpPlacesProvider::new(http.clone(), config)?),
            geocoder: Arc::new(HttpGeocoder::new(http.clone(), config)?),
            articles: Arc::new(MediaWikiSearch::new(http, config)?),
        })
    }
}

/// One browser instance: the place roster with its filter and popup, plus
/// the collaborators it drives.
pub struct BrowserSession {
    config: AppConfig,
    browser: PlaceBrowser,
}

impl BrowserSession {
    /// Loads the nearby places and builds the browser around them. A failed
    /// roster load is reported through `alerts` and ends the session.
    pub async fn bootstrap(
        config: AppConfig,
        remote: RemoteServices,
        map: Arc<dyn MapSurface>,
        view: Arc<dyn PopupView>,
        alerts: Arc<dyn AlertSink>,
    ) -> AppResult<Self> {
        let request = NearbySearch::from_config(&config);
        let places = match remote.places.nearby_search(&request).await {
            Ok(places) => places,
            Err(err) => {
                error!(?err, "nearby search failed");
                alerts.alert("Failed to retrieve map locations");
                return Err(err);
            }
        };
        info!(count = places.len(), category = %request.category, "loaded nearby places");

        let resolver = PlaceDetailResolver::new(
            ResolverServices {
                map: Arc::clone(&map),
                view,
                geocoder: remote.geocoder,
                articles: remote.articles,
                alerts,
            },
            ResolverSettings::from_config(&config),
        );
        let browser = PlaceBrowser::new(places, map, resolver);
        Ok(Self { config, browser })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn browser(&self) -> &PlaceBrowser {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut PlaceBrowser {
        &mut self.browser
    }
}

pub fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,bank_browser=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}

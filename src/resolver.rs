use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::alert::AlertSink;
use crate::config::{AppConfig, StalePopupPolicy};
use crate::errors::AppResult;
use crate::geocode::{GeocodeResult, GeocodeStatus, Geocoder};
use crate::map::{MapSurface, MarkerAnimation};
use crate::places::Place;
use crate::popup::{PopupFragment, PopupState, PopupView};
use crate::wiki::{article_url, ArticleHit, ArticleSearch};

/// Collaborators the resolver talks to.
#[derive(Clone)]
pub struct ResolverServices {
    pub map: Arc<dyn MapSurface>,
    pub view: Arc<dyn PopupView>,
    pub geocoder: Arc<dyn Geocoder>,
    pub articles: Arc<dyn ArticleSearch>,
    pub alerts: Arc<dyn AlertSink>,
}

#[derive(Clone, Debug)]
pub struct ResolverSettings {
    pub article_base: String,
    pub bounce: Duration,
    pub stale_policy: StalePopupPolicy,
}

impl ResolverSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            article_base: config.wiki_article_base.clone(),
            bounce: config.marker_bounce(),
            stale_policy: config.stale_popup_policy,
        }
    }
}

type SharedPopup = Arc<Mutex<PopupState>>;

/// Opens the detail popup for a place and layers the address and article
/// lookups into it as they complete.
#[derive(Clone)]
pub struct PlaceDetailResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    services: ResolverServices,
    settings: ResolverSettings,
    generation: AtomicU64,
    current: Mutex<Option<SharedPopup>>,
}

/// Handles to the two lookups of one popup. Dropping it detaches them.
pub struct PopupTasks {
    pub generation: u64,
    address: JoinHandle<()>,
    article: JoinHandle<()>,
}

impl PopupTasks {
    /// Waits until both lookups have applied their result.
    pub async fn settled(self) {
        let (address, article) = join(self.address, self.article).await;
        for result in [address, article] {
            if let Err(err) = result {
                warn!(?err, generation = self.generation, "popup lookup task aborted");
            }
        }
    }
}

impl PlaceDetailResolver {
    pub fn new(services: ResolverServices, settings: ResolverSettings) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                services,
                settings,
                generation: AtomicU64::new(0),
                current: Mutex::new(None),
            }),
        }
    }

    /// Must be called from within a Tokio runtime.
    pub fn open(&self, place: &Place) -> PopupTasks {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let popup = Arc::new(Mutex::new(PopupState::new(place.clone(), generation)));
        let skeleton = popup.lock().render();
        *inner.current.lock() = Some(Arc::clone(&popup));

        debug!(generation, place = %place.name, "opening popup");
        inner.services.view.open(place.marker, &skeleton);
        inner.services.map.pan_to(place.location);

        if let Some(marker) = place.marker {
            let map = Arc::clone(&inner.services.map);
            let bounce = inner.settings.bounce;
            map.set_marker_animation(marker, Some(MarkerAnimation::Bounce));
            tokio::spawn(async move {
                sleep(bounce).await;
                map.set_marker_animation(marker, None);
            });
        }

        let address = {
            let inner = Arc::clone(&self.inner);
            let popup = Arc::clone(&popup);
            let location = place.location;
            tokio::spawn(async move {
                let result = inner.services.geocoder.reverse_geocode(location).await;
                inner.apply_address(&popup, generation, result);
            })
        };

        let article = {
            let inner = Arc::clone(&self.inner);
            let query = place.name.clone();
            tokio::spawn(async move {
                let result = inner.services.articles.search(&query).await;
                inner.apply_article(&popup, generation, result);
            })
        };

        PopupTasks {
            generation,
            address,
            article,
        }
    }

    pub fn close(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if self.inner.current.lock().take().is_some() {
            self.inner.services.view.close();
        }
    }

    /// Snapshot of the popup currently shown, if any.
    pub fn current_popup(&self) -> Option<PopupState> {
        self.inner
            .current
            .lock()
            .as_ref()
            .map(|popup| popup.lock().clone())
    }
}

impl ResolverInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn accepts(&self, generation: u64) -> bool {
        match self.settings.stale_policy {
            StalePopupPolicy::Overwrite => true,
            StalePopupPolicy::Discard => self.is_current(generation),
        }
    }

    fn alert(&self, generation: u64, message: &str) {
        if self.accepts(generation) {
            self.services.alerts.alert(message);
        } else {
            debug!(generation, message, "suppressing alert for stale popup");
        }
    }

    fn append(&self, popup: &SharedPopup, generation: u64, fragment: PopupFragment) {
        let html = {
            let mut state = popup.lock();
            state.append(fragment);
            state.render()
        };
        if self.current.lock().is_none() {
            debug!(generation, "popup closed; dropping update");
        } else if self.accepts(generation) {
            self.services.view.set_content(&html);
        } else {
            debug!(generation, "discarding update for stale popup");
        }
    }

    fn apply_address(
        &self,
        popup: &SharedPopup,
        generation: u64,
        result: Result<Vec<GeocodeResult>, GeocodeStatus>,
    ) {
        match result {
            Ok(results) => match results.into_iter().next() {
                Some(first) => self.append(
                    popup,
                    generation,
                    PopupFragment::Address {
                        text: first.formatted_address,
                    },
                ),
                None => self.alert(generation, "No address found"),
            },
            Err(status) => {
                warn!(%status, generation, "reverse geocode failed");
                self.alert(generation, &format!("Geocoder failed due to: {status}"));
            }
        }
    }

    fn apply_article(
        &self,
        popup: &SharedPopup,
        generation: u64,
        result: AppResult<Vec<ArticleHit>>,
    ) {
        let fragment = match result {
            Ok(hits) => match hits.into_iter().next() {
                Some(ArticleHit { title: Some(title) }) => {
                    match article_url(&self.settings.article_base, &title) {
                        Ok(url) => PopupFragment::Article {
                            title,
                            url: url.to_string(),
                        },
                        Err(err) => {
                            warn!(?err, "unable to build article link");
                            PopupFragment::ArticleFailed
                        }
                    }
                }
                // only the top hit is considered; without a title there is nothing to link
                Some(ArticleHit { title: None }) => {
                    debug!(generation, "top article hit has no title");
                    return;
                }
                None => PopupFragment::NoArticles,
            },
            Err(err) => {
                warn!(?err, generation, "article search failed");
                PopupFragment::ArticleFailed
            }
        };
        self.append(popup, generation, fragment);
    }
}

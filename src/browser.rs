use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::geo::Bounds;
use crate::map::MapSurface;
use crate::places::{Place, PlaceId};
use crate::resolver::{PlaceDetailResolver, PopupTasks};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrowserEvent {
    FilterChanged { filter: String, visible: Vec<Place> },
    SidebarToggled { open: bool },
}

pub type BrowserObserver = Arc<dyn Fn(&BrowserEvent) + Send + Sync>;

/// The place roster, the active name filter, and which markers it leaves visible.
pub struct PlaceBrowser {
    places: Vec<Place>,
    visible: Vec<PlaceId>,
    filter: String,
    sidebar_open: bool,
    map: Arc<dyn MapSurface>,
    resolver: PlaceDetailResolver,
    observers: Vec<BrowserObserver>,
}

impl PlaceBrowser {
    /// Creates a marker per place and fits the map around all of them.
    pub fn new(
        mut places: Vec<Place>,
        map: Arc<dyn MapSurface>,
        resolver: PlaceDetailResolver,
    ) -> Self {
        let mut bounds = Bounds::default();
        for place in &mut places {
            place.marker = Some(map.create_marker(place.location));
            bounds.extend(place.location);
        }
        if let Some(center) = bounds.center() {
            map.set_center(center);
            map.fit_bounds(bounds);
        }
        debug!(count = places.len(), "place browser ready");

        let visible = places.iter().map(|place| place.id.clone()).collect();
        Self {
            places,
            visible,
            filter: String::new(),
            sidebar_open: false,
            map,
            resolver,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: BrowserObserver) {
        self.observers.push(observer);
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn place(&self, id: &PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| &place.id == id)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn resolver(&self) -> &PlaceDetailResolver {
        &self.resolver
    }

    /// Visible places in the order they (re)appeared.
    pub fn visible_places(&self) -> Vec<Place> {
        self.visible
            .iter()
            .filter_map(|id| self.place(id).cloned())
            .collect()
    }

    pub fn set_filter(&mut self, text: impl Into<String>) -> Vec<Place> {
        self.filter = text.into();

        for place in &self.places {
            let shown = self.visible.iter().position(|id| id == &place.id);
            match (place.matches_filter(&self.filter), shown) {
                (true, None) => {
                    self.visible.push(place.id.clone());
                    if let Some(marker) = place.marker {
                        self.map.set_marker_visible(marker, true);
                    }
                }
                (false, Some(index)) => {
                    self.visible.remove(index);
                    if let Some(marker) = place.marker {
                        self.map.set_marker_visible(marker, false);
                    }
                }
                _ => {}
            }
        }

        let visible = self.visible_places();
        trace!(filter = %self.filter, visible = visible.len(), "filter applied");
        self.notify(&BrowserEvent::FilterChanged {
            filter: self.filter.clone(),
            visible: visible.clone(),
        });
        visible
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.notify(&BrowserEvent::SidebarToggled {
            open: self.sidebar_open,
        });
        self.sidebar_open
    }

    pub fn select_place(&self, id: &PlaceId) -> Option<PopupTasks> {
        let Some(place) = self.place(id) else {
            debug!(place_id = id.as_str(), "ignoring selection of unknown place");
            return None;
        };
        Some(self.resolver.open(place))
    }

    fn notify(&self, event: &BrowserEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::geo::{Bounds, LatLng};

/// Opaque reference to a marker owned by the map layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MarkerAnimation {
    Bounce,
}

/// The drawing surface markers and camera moves are issued against.
pub trait MapSurface: Send + Sync {
    fn create_marker(&self, position: LatLng) -> MarkerHandle;
    fn set_marker_visible(&self, marker: MarkerHandle, visible: bool);
    fn set_marker_animation(&self, marker: MarkerHandle, animation: Option<MarkerAnimation>);
    fn pan_to(&self, position: LatLng);
    fn set_center(&self, position: LatLng);
    fn fit_bounds(&self, bounds: Bounds);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerState {
    pub position: LatLng,
    pub visible: bool,
    pub animation: Option<MarkerAnimation>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    markers: HashMap<MarkerHandle, MarkerState>,
    center: Option<LatLng>,
    bounds: Bounds,
}

/// In-memory map that keeps marker and camera state without drawing anything.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    next_marker: AtomicU64,
    state: Mutex<HeadlessState>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker(&self, marker: MarkerHandle) -> Option<MarkerState> {
        self.state.lock().markers.get(&marker).cloned()
    }

    pub fn visible_marker_count(&self) -> usize {
        self.state
            .lock()
            .markers
            .values()
            .filter(|m| m.visible)
            .count()
    }

    pub fn center(&self) -> Option<LatLng> {
        self.state.lock().center
    }

    pub fn bounds(&self) -> Bounds {
        self.state.lock().bounds
    }
}

impl MapSurface for HeadlessMap {
    fn create_marker(&self, position: LatLng) -> MarkerHandle {
        let handle = MarkerHandle(self.next_marker.fetch_add(1, Ordering::SeqCst));
        self.state.lock().markers.insert(
            handle,
            MarkerState {
                position,
                visible: true,
                animation: None,
            },
        );
        trace!(marker = handle.0, ?position, "marker created");
        handle
    }

    fn set_marker_visible(&self, marker: MarkerHandle, visible: bool) {
        if let Some(state) = self.state.lock().markers.get_mut(&marker) {
            state.visible = visible;
        }
        trace!(marker = marker.0, visible, "marker visibility changed");
    }

    fn set_marker_animation(&self, marker: MarkerHandle, animation: Option<MarkerAnimation>) {
        if let Some(state) = self.state.lock().markers.get_mut(&marker) {
            state.animation = animation;
        }
        trace!(marker = marker.0, ?animation, "marker animation changed");
    }

    fn pan_to(&self, position: LatLng) {
        self.state.lock().center = Some(position);
        debug!(?position, "map panned");
    }

    fn set_center(&self, position: LatLng) {
        self.state.lock().center = Some(position);
    }

    fn fit_bounds(&self, bounds: Bounds) {
        let mut state = self.state.lock();
        state.bounds = bounds;
        if let Some(center) = bounds.center() {
            state.center = Some(center);
        }
    }
}

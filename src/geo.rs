use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `lat,lng` as the Google web services expect it in query strings.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Axis-aligned box over every point extended into it. Starts empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Bounds {
    corners: Option<(LatLng, LatLng)>,
}

impl Bounds {
    pub fn extend(&mut self, point: LatLng) {
        self.corners = Some(match self.corners {
            None => (point, point),
            Some((sw, ne)) => (
                LatLng::new(sw.lat.min(point.lat), sw.lng.min(point.lng)),
                LatLng::new(ne.lat.max(point.lat), ne.lng.max(point.lng)),
            ),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_none()
    }

    pub fn south_west(&self) -> Option<LatLng> {
        self.corners.map(|(sw, _)| sw)
    }

    pub fn north_east(&self) -> Option<LatLng> {
        self.corners.map(|(_, ne)| ne)
    }

    pub fn center(&self) -> Option<LatLng> {
        self.corners.map(|(sw, ne)| {
            LatLng::new((sw.lat + ne.lat) / 2.0, (sw.lng + ne.lng) / 2.0)
        })
    }
}

impl FromIterator<LatLng> for Bounds {
    fn from_iter<I: IntoIterator<Item = LatLng>>(iter: I) -> Self {
        let mut bounds = Bounds::default();
        for point in iter {
            bounds.extend(point);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bounds_have_no_center() {
        let bounds = Bounds::default();
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), None);
    }

    #[test]
    fn extends_to_cover_all_points() {
        let bounds: Bounds = [
            LatLng::new(40.0, -74.3),
            LatLng::new(40.2, -74.1),
            LatLng::new(39.9, -74.2),
        ]
        .into_iter()
        .collect();

        assert_eq!(bounds.south_west(), Some(LatLng::new(39.9, -74.3)));
        assert_eq!(bounds.north_east(), Some(LatLng::new(40.2, -74.1)));
        let center = bounds.center().unwrap();
        assert!((center.lat - 40.05).abs() < 1e-9);
        assert!((center.lng + 74.2).abs() < 1e-9);
    }
}

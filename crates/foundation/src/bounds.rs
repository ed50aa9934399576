use serde::{Deserialize, Serialize};

use crate::lnglat::LngLat;

/// Axis-aligned longitude/latitude box.
///
/// Starts empty; [`LngLatBounds::extend`] grows it to cover each position.
/// An empty box has no corners and must never be handed to a camera.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LngLatBounds {
    corners: Option<(LngLat, LngLat)>,
}

/// Explicit south-west / north-east corners, the shape renderers and map
/// configs exchange.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corners {
    pub south_west: LngLat,
    pub north_east: LngLat,
}

impl LngLatBounds {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_corners(sw: LngLat, ne: LngLat) -> Self {
        let mut b = Self::empty();
        b.extend(sw);
        b.extend(ne);
        b
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_none()
    }

    /// Grows the box to include `p`. Non-finite positions are ignored.
    pub fn extend(&mut self, p: LngLat) {
        if !p.is_finite() {
            return;
        }
        self.corners = Some(match self.corners {
            None => (p, p),
            Some((sw, ne)) => (
                LngLat::new(sw.lng.min(p.lng), sw.lat.min(p.lat)),
                LngLat::new(ne.lng.max(p.lng), ne.lat.max(p.lat)),
            ),
        });
    }

    pub fn extend_all<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = LngLat>,
    {
        for p in points {
            self.extend(p);
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        if let Some((sw, ne)) = other.corners {
            out.extend(sw);
            out.extend(ne);
        }
        out
    }

    pub fn south_west(&self) -> Option<LngLat> {
        self.corners.map(|(sw, _)| sw)
    }

    pub fn north_east(&self) -> Option<LngLat> {
        self.corners.map(|(_, ne)| ne)
    }

    pub fn corners(&self) -> Option<Corners> {
        self.corners.map(|(south_west, north_east)| Corners {
            south_west,
            north_east,
        })
    }

    pub fn center(&self) -> Option<LngLat> {
        self.corners.map(|(sw, ne)| {
            LngLat::new((sw.lng + ne.lng) * 0.5, (sw.lat + ne.lat) * 0.5)
        })
    }
}

impl From<Corners> for LngLatBounds {
    fn from(c: Corners) -> Self {
        Self::from_corners(c.south_west, c.north_east)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon construction for geofence outlines.
//
// Both the ring and the query point map latitude to `x` and longitude to `y`,
// so the axes can never be swapped between the two sides of a test.

use geo::{BoundingRect, Contains, Coord, LineString, Polygon, Rect};

use indoorsense_core::types::Coordinate;

/// Closed polygon built from a geofence outline.
#[derive(Debug, Clone)]
pub struct GeofencePolygon {
    polygon: Polygon<f64>,
    bounds: Option<Rect<f64>>,
}

fn to_coord(c: Coordinate) -> Coord<f64> {
    Coord {
        x: c.latitude,
        y: c.longitude,
    }
}

/// Build a polygon from an ordered outline.
///
/// The ring is closed automatically. Returns `None` for an empty outline;
/// no other validation is done, so self-intersecting rings are accepted
/// as given.
pub fn build_polygon(boundary: impl IntoIterator<Item = Coordinate>) -> Option<GeofencePolygon> {
    let ring: Vec<Coord<f64>> = boundary.into_iter().map(to_coord).collect();
    if ring.is_empty() {
        return None;
    }

    let polygon = Polygon::new(LineString::from(ring), Vec::new());
    let bounds = polygon.bounding_rect();
    Some(GeofencePolygon { polygon, bounds })
}

impl GeofencePolygon {
    /// Strict containment: points on the outline are not inside.
    pub fn contains(&self, point: Coordinate) -> bool {
        let coord = to_coord(point);
        if let Some(bounds) = self.bounds {
            let (min, max) = (bounds.min(), bounds.max());
            if coord.x < min.x || coord.x > max.x || coord.y < min.y || coord.y > max.y {
                return false;
            }
        }
        self.polygon.contains(&geo::Point::from(coord))
    }

    /// Number of vertices in the closed ring (first vertex counted twice).
    pub fn ring_len(&self) -> usize {
        self.polygon.exterior().0.len()
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Point-in-geofence queries against the polygon cache.

use tracing::{debug, info};

use indoorsense_core::types::{Coordinate, Geofence, GeofenceSummary, MatchPolicy};

use crate::cache::GeofenceCache;

/// A point to locate, optionally restricted to one floor.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainmentQuery {
    pub coordinate: Coordinate,
    /// Only geofences on this floor (or not floor-scoped at all) qualify.
    /// `None` and `Some("")` both disable the filter.
    pub floor_identifier: Option<String>,
}

impl ContainmentQuery {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            floor_identifier: None,
        }
    }

    pub fn on_floor(mut self, floor_identifier: impl Into<String>) -> Self {
        self.floor_identifier = Some(floor_identifier.into());
        self
    }

    fn floor_filter(&self) -> Option<&str> {
        self.floor_identifier.as_deref().filter(|f| !f.is_empty())
    }

    /// A geofence is skipped only when both sides name a floor and they differ.
    fn qualifies(&self, geofence: &Geofence) -> bool {
        match (self.floor_filter(), geofence.floor_scope()) {
            (Some(wanted), Some(floor)) => wanted == floor,
            _ => true,
        }
    }
}

/// Find the cached geofence containing the query point.
///
/// With [`MatchPolicy::LastMatch`] every entry is scanned and the last hit in
/// cache order wins; [`MatchPolicy::FirstMatch`] stops at the first hit.
pub fn locate(
    cache: &GeofenceCache,
    query: &ContainmentQuery,
    policy: MatchPolicy,
) -> Option<GeofenceSummary> {
    let snapshot = cache.entries();
    if snapshot.is_empty() {
        debug!("geofence cache empty, skipping containment query");
        return None;
    }

    let mut hits = snapshot
        .iter()
        .filter(|(geofence, _)| query.qualifies(geofence))
        .filter(|(_, polygon)| polygon.contains(query.coordinate))
        .map(|(geofence, _)| geofence);

    let winner = match policy {
        MatchPolicy::FirstMatch => hits.next(),
        MatchPolicy::LastMatch => hits.last(),
    }?;

    info!(geofence = %winner.identifier, name = %winner.name, "point is inside geofence");
    Some(winner.summary())
}

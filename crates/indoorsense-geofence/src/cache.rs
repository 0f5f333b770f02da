// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geofence polygon cache.
//
// The cache holds an immutable snapshot behind an `Arc`. `rebuild` and
// `clear` build a new snapshot and swap it in under a short write lock, so
// readers that already hold a snapshot keep a consistent view while the
// cache is replaced underneath them. Concurrent `rebuild`/`clear` calls are
// not ordered against each other: the last writer wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use indoorsense_core::types::Geofence;

use crate::geometry::{GeofencePolygon, build_polygon};

/// A geofence together with its built polygon.
#[derive(Debug, Clone)]
pub struct PolygonCacheEntry {
    geofence: Geofence,
    polygon: GeofencePolygon,
}

impl PolygonCacheEntry {
    pub fn geofence(&self) -> &Geofence {
        &self.geofence
    }

    pub fn polygon(&self) -> &GeofencePolygon {
        &self.polygon
    }
}

/// Immutable view of the cache at one point in time.
///
/// Entries keep fetch order; each geofence identifier appears at most once.
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    entries: Vec<PolygonCacheEntry>,
    index: HashMap<String, usize>,
}

impl CacheSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by geofence identifier.
    pub fn get(&self, identifier: &str) -> Option<&PolygonCacheEntry> {
        self.index.get(identifier).map(|&i| &self.entries[i])
    }

    /// Iterate `(geofence, polygon)` pairs in fetch order.
    pub fn iter(&self) -> impl Iterator<Item = (&Geofence, &GeofencePolygon)> {
        self.entries.iter().map(|e| (&e.geofence, &e.polygon))
    }

    fn insert(&mut self, entry: PolygonCacheEntry) {
        match self.index.get(&entry.geofence.identifier) {
            Some(&slot) => {
                debug!(geofence = %entry.geofence.identifier, "duplicate geofence id, replacing");
                self.entries[slot] = entry;
            }
            None => {
                self.index
                    .insert(entry.geofence.identifier.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Outcome of a [`GeofenceCache::rebuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildSummary {
    /// Entries now in the cache.
    pub cached: usize,
    /// Geofences skipped because their outline was empty.
    pub skipped: usize,
}

/// Keyed store of built geofence polygons for the current session.
#[derive(Debug, Default)]
pub struct GeofenceCache {
    current: RwLock<Arc<CacheSnapshot>>,
}

impl GeofenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache with polygons built from `geofences`.
    ///
    /// Geofences without outline points are skipped.
    pub fn rebuild(&self, geofences: &[Geofence]) -> RebuildSummary {
        let mut snapshot = CacheSnapshot::default();
        let mut skipped = 0;

        for geofence in geofences {
            match build_polygon(geofence.boundary()) {
                Some(polygon) => snapshot.insert(PolygonCacheEntry {
                    geofence: geofence.clone(),
                    polygon,
                }),
                None => {
                    debug!(geofence = %geofence.identifier, "no outline points, not cached");
                    skipped += 1;
                }
            }
        }

        let summary = RebuildSummary {
            cached: snapshot.len(),
            skipped,
        };
        self.swap(snapshot);
        info!(cached = summary.cached, skipped = summary.skipped, "geofence cache rebuilt");
        summary
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.swap(CacheSnapshot::default());
        info!("geofence cache cleared");
    }

    /// Current snapshot. A later call reflects later rebuilds.
    pub fn entries(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.current.read().expect("geofence cache lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn swap(&self, snapshot: CacheSnapshot) {
        *self.current.write().expect("geofence cache lock poisoned") = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoorsense_core::types::Coordinate;

    fn square(id: &str, offset: f64) -> Geofence {
        Geofence::new(id, "b1", format!("Zone {id}")).with_boundary([
            Coordinate::new(offset, offset),
            Coordinate::new(offset, offset + 10.0),
            Coordinate::new(offset + 10.0, offset + 10.0),
            Coordinate::new(offset + 10.0, offset),
        ])
    }

    #[test]
    fn rebuild_caches_by_identifier_in_fetch_order() {
        let cache = GeofenceCache::new();
        let summary = cache.rebuild(&[square("a", 0.0), square("b", 20.0)]);
        assert_eq!(summary, RebuildSummary { cached: 2, skipped: 0 });

        let snapshot = cache.entries();
        let ids: Vec<_> = snapshot.iter().map(|(g, _)| g.identifier.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(snapshot.get("b").is_some());
        assert!(snapshot.get("zzz").is_none());
    }

    #[test]
    fn empty_outline_is_skipped() {
        let cache = GeofenceCache::new();
        let empty = Geofence::new("empty", "b1", "Nowhere");
        let summary = cache.rebuild(&[empty, square("a", 0.0)]);
        assert_eq!(summary, RebuildSummary { cached: 1, skipped: 1 });
        assert!(cache.entries().get("empty").is_none());
    }

    #[test]
    fn rebuild_replaces_instead_of_merging() {
        let cache = GeofenceCache::new();
        cache.rebuild(&[square("a", 0.0), square("b", 20.0)]);
        cache.rebuild(&[square("c", 40.0)]);

        let snapshot = cache.entries();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("a").is_none());
        assert!(snapshot.get("c").is_some());
    }

    #[test]
    fn duplicate_identifier_keeps_one_entry() {
        let cache = GeofenceCache::new();
        cache.rebuild(&[square("a", 0.0), square("b", 20.0), square("a", 40.0)]);

        let snapshot = cache.entries();
        assert_eq!(snapshot.len(), 2);
        let ids: Vec<_> = snapshot.iter().map(|(g, _)| g.identifier.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        // The later definition wins.
        assert!(snapshot.get("a").unwrap().polygon().contains(Coordinate::new(45.0, 45.0)));
    }

    #[test]
    fn clear_empties_cache() {
        let cache = GeofenceCache::new();
        cache.rebuild(&[square("a", 0.0)]);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn held_snapshot_survives_clear() {
        let cache = GeofenceCache::new();
        cache.rebuild(&[square("a", 0.0)]);
        let before = cache.entries();
        cache.clear();
        assert_eq!(before.len(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        let cache = Arc::new(GeofenceCache::new());
        let small: Vec<_> = (0..3).map(|i| square(&format!("s{i}"), i as f64 * 20.0)).collect();
        let large: Vec<_> = (0..7).map(|i| square(&format!("l{i}"), i as f64 * 20.0)).collect();

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for round in 0..200 {
                    if round % 2 == 0 {
                        cache.rebuild(&small);
                    } else {
                        cache.rebuild(&large);
                    }
                }
            })
        };

        for _ in 0..200 {
            let len = cache.entries().iter().count();
            assert!(len == 0 || len == 3 || len == 7, "torn snapshot of {len}");
        }
        writer.join().unwrap();
    }
}

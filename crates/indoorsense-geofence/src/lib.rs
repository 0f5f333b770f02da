// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Indoorsense — Geofence membership engine.
//
// Fetched geofences are turned into polygons (`geometry`), held in a
// snapshot-swapped cache (`cache`), queried point-in-polygon (`query`), and
// live enter/exit transitions from the positioning source are forwarded to
// an observer behind independent enable flags (`listener`).

pub mod cache;
pub mod geometry;
pub mod listener;
pub mod query;

pub use cache::{CacheSnapshot, GeofenceCache, PolygonCacheEntry, RebuildSummary};
pub use geometry::{GeofencePolygon, build_polygon};
pub use listener::{
    GeofenceListenerAdapter, GeofenceObserver, ListenerState, TransitionSink, TransitionSource,
};
pub use query::{ContainmentQuery, locate};

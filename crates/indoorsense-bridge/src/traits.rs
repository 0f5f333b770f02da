// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the positioning SDK and the host.
//
// The SDK delivers results through completion callbacks on its own threads;
// nothing here blocks the caller.

use indoorsense_core::error::Result;
use indoorsense_core::types::Geofence;
use indoorsense_geofence::TransitionSource;

/// Completion for an asynchronous geofence fetch. Called exactly once.
pub type FetchCallback = Box<dyn FnOnce(Result<Vec<Geofence>>) + Send + 'static>;

/// Building cartography provided by the SDK.
pub trait CartographySource: Send + Sync {
    /// Fetch the geofences of a building. `on_complete` may run on any thread.
    fn fetch_geofences(&self, building_id: &str, on_complete: FetchCallback);

    /// Drop any cartography the SDK has cached.
    fn invalidate_cache(&self);
}

/// Unified handle on the vendor positioning SDK.
pub trait PositioningSdk: CartographySource + TransitionSource {
    /// Human-readable platform name (e.g. "Android 14", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Named-event channel back to the host runtime.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &str, payload: serde_json::Value);
}

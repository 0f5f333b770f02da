// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub SDK for desktop/CI builds where the native positioning SDK is
// unavailable.
//
// Cartography comes from in-memory fixtures. Fetch completions are delivered
// from a worker thread, like the real SDK does, and transition batches are
// replayed on demand with `deliver_transitions`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, error, warn};

use indoorsense_core::error::{IndoorError, Result};
use indoorsense_core::types::Geofence;
use indoorsense_geofence::{TransitionSink, TransitionSource};

use crate::traits::{CartographySource, FetchCallback, PositioningSdk};

/// Fixture-backed SDK returned on non-mobile platforms.
#[derive(Default)]
pub struct StubSdk {
    buildings: RwLock<HashMap<String, Vec<Geofence>>>,
    sink: Mutex<Option<Arc<dyn TransitionSink>>>,
    forced_failure: Mutex<Option<String>>,
    invalidations: AtomicUsize,
}

impl StubSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{"<buildingId>": [<geofence>...]}` from a JSON file.
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_fixture_str(&data)
    }

    pub fn from_fixture_str(json: &str) -> Result<Self> {
        let buildings: HashMap<String, Vec<Geofence>> = serde_json::from_str(json)?;
        debug!(buildings = buildings.len(), "stub SDK fixture loaded");
        Ok(Self {
            buildings: RwLock::new(buildings),
            ..Self::default()
        })
    }

    pub fn with_building(self, building_id: impl Into<String>, geofences: Vec<Geofence>) -> Self {
        self.insert_building(building_id, geofences);
        self
    }

    pub fn insert_building(&self, building_id: impl Into<String>, geofences: Vec<Geofence>) {
        self.buildings
            .write()
            .expect("stub buildings lock poisoned")
            .insert(building_id.into(), geofences);
    }

    /// Make the next fetch fail with `message`.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        *self.forced_failure.lock().expect("stub failure lock poisoned") = Some(message.into());
    }

    /// Find a fixture geofence by identifier in any building.
    pub fn geofence(&self, identifier: &str) -> Option<Geofence> {
        self.buildings
            .read()
            .expect("stub buildings lock poisoned")
            .values()
            .flatten()
            .find(|g| g.identifier == identifier)
            .cloned()
    }

    /// Push one transition callback into the attached sink, on the calling
    /// thread. Returns `false` when no sink is attached.
    pub fn deliver_transitions(&self, entered: &[Geofence], exited: &[Geofence]) -> bool {
        let sink = self.sink.lock().expect("stub sink lock poisoned").clone();
        match sink {
            Some(sink) => {
                sink.on_entered_geofences(entered);
                sink.on_exited_geofences(exited);
                true
            }
            None => {
                debug!("no geofence listener attached, transitions dropped");
                false
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().expect("stub sink lock poisoned").is_some()
    }

    /// How many times `invalidate_cache` has been called.
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl PositioningSdk for StubSdk {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl CartographySource for StubSdk {
    fn fetch_geofences(&self, building_id: &str, on_complete: FetchCallback) {
        let forced = self
            .forced_failure
            .lock()
            .expect("stub failure lock poisoned")
            .take();

        let result = match forced {
            Some(message) => Err(IndoorError::Fetch(message)),
            None => self
                .buildings
                .read()
                .expect("stub buildings lock poisoned")
                .get(building_id)
                .cloned()
                .ok_or_else(|| IndoorError::BuildingNotFound(building_id.to_owned())),
        };

        let spawned = std::thread::Builder::new()
            .name("stub-sdk-fetch".into())
            .spawn(move || on_complete(result));
        if let Err(e) = spawned {
            // The completion is dropped with the closure; async waiters get
            // `IndoorError::Bridge`.
            error!(error = %e, "failed to spawn stub fetch thread");
        }
    }

    fn invalidate_cache(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        debug!("stub SDK cartography cache invalidated");
    }
}

impl TransitionSource for StubSdk {
    fn subscribe(&self, sink: Arc<dyn TransitionSink>) -> Result<()> {
        let mut slot = self.sink.lock().expect("stub sink lock poisoned");
        if slot.is_some() {
            warn!("replacing existing geofence listener");
        }
        *slot = Some(sink);
        Ok(())
    }

    fn unsubscribe(&self) -> Result<()> {
        self.sink.lock().expect("stub sink lock poisoned").take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    const FIXTURE: &str = r#"{
        "b1": [
            {
                "identifier": "gf-1",
                "name": "Lobby",
                "floorIdentifier": "F1",
                "polygonPoints": [
                    {"coordinate": {"latitude": 0.0, "longitude": 0.0}},
                    {"coordinate": {"latitude": 0.0, "longitude": 10.0}},
                    {"coordinate": {"latitude": 10.0, "longitude": 10.0}}
                ],
                "createdAt": "Mon Jan 15 10:30:00 +0000 2024",
                "updatedAt": "Mon Jan 15 10:30:00 +0000 2024"
            }
        ],
        "empty": []
    }"#;

    fn fetch_blocking(sdk: &StubSdk, building: &str) -> Result<Vec<Geofence>> {
        let (tx, rx) = mpsc::channel();
        sdk.fetch_geofences(
            building,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn fixture_fetch_returns_building_geofences() {
        let sdk = StubSdk::from_fixture_str(FIXTURE).unwrap();
        let geofences = fetch_blocking(&sdk, "b1").unwrap();
        assert_eq!(geofences.len(), 1);
        assert_eq!(geofences[0].polygon_points.len(), 3);
        assert!(fetch_blocking(&sdk, "empty").unwrap().is_empty());
    }

    #[test]
    fn unknown_building_fails() {
        let sdk = StubSdk::new();
        let err = fetch_blocking(&sdk, "nowhere").unwrap_err();
        assert!(matches!(err, IndoorError::BuildingNotFound(ref id) if id == "nowhere"));
    }

    #[test]
    fn forced_failure_applies_once() {
        let sdk = StubSdk::from_fixture_str(FIXTURE).unwrap();
        sdk.fail_next_fetch("network unreachable");
        assert!(matches!(fetch_blocking(&sdk, "b1"), Err(IndoorError::Fetch(_))));
        assert!(fetch_blocking(&sdk, "b1").is_ok());
    }

    #[test]
    fn fixture_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let sdk = StubSdk::from_fixture(&path).unwrap();
        assert_eq!(sdk.geofence("gf-1").unwrap().name, "Lobby");
        assert!(sdk.geofence("gf-2").is_none());
        assert!(StubSdk::from_fixture(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn transitions_without_sink_are_dropped() {
        let sdk = StubSdk::new();
        assert!(!sdk.is_subscribed());
        assert!(!sdk.deliver_transitions(&[], &[]));
    }
}

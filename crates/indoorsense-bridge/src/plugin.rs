// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-facing plugin service.
//
// One `IndoorPlugin` is constructed per session and handed to whatever
// dispatches host calls. It owns the geofence cache and the transition
// listener; the SDK handle and the host event channel are injected.
//
// Host operations never fail outward: every error is turned into an
// `{"error": ...}` payload delivered on the same path as the success value.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use indoorsense_core::BridgeConfig;
use indoorsense_core::error::{IndoorError, Result};
use indoorsense_core::types::{Geofence, GeofenceSummary, SessionId, TransitionKind};
use indoorsense_geofence::{
    ContainmentQuery, GeofenceCache, GeofenceListenerAdapter, GeofenceObserver, ListenerState,
    TransitionSource, locate,
};

use crate::mapper;
use crate::traits::{CartographySource, EventEmitter, FetchCallback, PositioningSdk};

/// One-shot host callback.
pub type Callback = Box<dyn FnOnce(Value) + Send + 'static>;

/// Maps forwarded transition batches to JSON and emits them as host events.
struct EmitterObserver {
    emitter: Arc<dyn EventEmitter>,
    enter_event: String,
    exit_event: String,
}

impl GeofenceObserver for EmitterObserver {
    fn on_transition(&self, kind: TransitionKind, geofences: &[Geofence]) {
        let event = match kind {
            TransitionKind::Enter => &self.enter_event,
            TransitionKind::Exit => &self.exit_event,
        };
        self.emitter.emit(event, mapper::geofences_to_json(geofences));
    }
}

/// Geofencing session exposed to the host runtime.
pub struct IndoorPlugin {
    session: SessionId,
    platform: String,
    cartography: Arc<dyn CartographySource>,
    cache: Arc<GeofenceCache>,
    listener: GeofenceListenerAdapter,
    config: BridgeConfig,
}

impl IndoorPlugin {
    pub fn new<S>(sdk: Arc<S>, emitter: Arc<dyn EventEmitter>, config: BridgeConfig) -> Self
    where
        S: PositioningSdk + 'static,
    {
        let observer = Arc::new(EmitterObserver {
            emitter,
            enter_event: config.enter_event.clone(),
            exit_event: config.exit_event.clone(),
        });
        let transitions: Arc<dyn TransitionSource> = sdk.clone();
        let session = SessionId::new();
        info!(session = %session, platform = sdk.platform_name(), "indoor plugin session started");

        Self {
            session,
            platform: sdk.platform_name().to_owned(),
            cartography: sdk,
            cache: Arc::new(GeofenceCache::new()),
            listener: GeofenceListenerAdapter::new(transitions, observer),
            config,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn platform_name(&self) -> &str {
        &self.platform
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn cache(&self) -> &GeofenceCache {
        &self.cache
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener.state()
    }

    // -- Typed API -----------------------------------------------------------

    /// Start fetching a building's geofences. On success the cache is
    /// rebuilt before `on_complete` runs; on failure it is left as it was.
    pub fn request_geofences(&self, building_id: &str, on_complete: FetchCallback) {
        let cache = Arc::clone(&self.cache);
        let building = building_id.to_owned();
        debug!(session = %self.session, building = %building, "fetching geofences");

        self.cartography.fetch_geofences(
            building_id,
            Box::new(move |result| {
                match &result {
                    Ok(geofences) => {
                        if geofences.is_empty() {
                            error!(building = %building, "no geofences defined for this building");
                        }
                        cache.rebuild(geofences);
                    }
                    Err(e) => {
                        warn!(building = %building, error = %e, "geofence fetch failed, cache unchanged");
                    }
                }
                on_complete(result);
            }),
        );
    }

    /// Fetch a building's geofences and wait for the SDK to complete.
    pub async fn fetch_geofences(&self, building_id: &str) -> Result<Vec<Geofence>> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.request_geofences(
            building_id,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        rx.await
            .map_err(|_| IndoorError::Bridge("SDK dropped the fetch completion".into()))?
    }

    /// Locate a point among the cached geofences using the configured policy.
    pub fn locate(&self, query: &ContainmentQuery) -> Option<GeofenceSummary> {
        locate(&self.cache, query, self.config.match_policy)
    }

    pub fn watch(&self, kind: TransitionKind) -> Result<()> {
        self.listener.enable(kind)
    }

    pub fn unwatch(&self, kind: TransitionKind) -> Result<()> {
        self.listener.disable(kind)
    }

    /// Detach the transition listener. The session delivers no further events.
    pub fn shutdown(&self) -> Result<()> {
        info!(session = %self.session, "indoor plugin session ending");
        self.listener.teardown()
    }

    // -- Host operations -----------------------------------------------------

    /// `fetchGeofencesFromBuilding(building, success, error)`.
    ///
    /// `success` receives the array of geofence records, `error` an
    /// `{"error": ...}` payload.
    pub fn fetch_geofences_from_building(&self, building: &Value, success: Callback, error: Callback) {
        let building_id = match mapper::parse_building_identifier(building) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "rejected fetch request");
                error(mapper::error_response(&e));
                return;
            }
        };

        self.request_geofences(
            &building_id,
            Box::new(move |result| match result {
                Ok(geofences) => success(mapper::geofences_to_json(&geofences)),
                Err(e) => error(mapper::error_response(&e)),
            }),
        );
    }

    /// `checkIfPointInsideGeofence({coordinate, floorIdentifier?})`.
    pub fn check_if_point_inside_geofence(&self, request: &Value) -> Value {
        match mapper::parse_containment_request(request) {
            Ok(query) => mapper::containment_response(self.locate(&query).as_ref()),
            Err(e) => {
                warn!(error = %e, "rejected containment request");
                mapper::error_response(&e)
            }
        }
    }

    /// `onEnterGeofences()`: start emitting entered-geofence batches.
    pub fn on_enter_geofences(&self) -> Value {
        acknowledge(self.watch(TransitionKind::Enter))
    }

    /// `onExitGeofences()`: start emitting exited-geofence batches.
    pub fn on_exit_geofences(&self) -> Value {
        acknowledge(self.watch(TransitionKind::Exit))
    }

    pub fn stop_enter_geofences(&self) -> Value {
        acknowledge(self.unwatch(TransitionKind::Enter))
    }

    pub fn stop_exit_geofences(&self) -> Value {
        acknowledge(self.unwatch(TransitionKind::Exit))
    }

    /// `invalidateCache()`: drop the geofence cache and the SDK's cartography cache.
    pub fn invalidate_cache(&self) -> Value {
        self.cache.clear();
        self.cartography.invalidate_cache();
        mapper::success_response()
    }
}

impl Drop for IndoorPlugin {
    fn drop(&mut self) {
        if self.listener.state() == ListenerState::Registered {
            if let Err(e) = self.listener.teardown() {
                warn!(session = %self.session, error = %e, "failed to detach geofence listener");
            }
        }
    }
}

fn acknowledge(result: Result<()>) -> Value {
    match result {
        Ok(()) => mapper::success_response(),
        Err(e) => {
            warn!(error = %e, "geofence listener request failed");
            mapper::error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use indoorsense_core::types::{Coordinate, MatchPolicy};
    use serde_json::json;

    use crate::stub::StubSdk;

    #[derive(Default)]
    struct RecordingEmitter {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl EventEmitter for RecordingEmitter {
        fn emit(&self, event: &str, payload: Value) {
            self.events.lock().unwrap().push((event.to_owned(), payload));
        }
    }

    impl RecordingEmitter {
        fn names(&self) -> Vec<String> {
            self.events.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
        }
    }

    fn square(id: &str, floor: &str, min: f64, max: f64) -> Geofence {
        Geofence::new(id, "b1", format!("Zone {id}"))
            .with_floor(floor)
            .with_boundary([
                Coordinate::new(min, min),
                Coordinate::new(min, max),
                Coordinate::new(max, max),
                Coordinate::new(max, min),
            ])
    }

    fn session(config: BridgeConfig) -> (Arc<StubSdk>, Arc<RecordingEmitter>, IndoorPlugin) {
        let sdk = Arc::new(StubSdk::new().with_building(
            "b1",
            vec![square("G1", "F1", 0.0, 10.0), square("inner", "F1", 2.0, 8.0)],
        ));
        let emitter = Arc::new(RecordingEmitter::default());
        let plugin = IndoorPlugin::new(sdk.clone(), emitter.clone(), config);
        (sdk, emitter, plugin)
    }

    fn query(lat: f64, lon: f64) -> Value {
        json!({ "coordinate": { "latitude": lat, "longitude": lon } })
    }

    #[tokio::test]
    async fn fetch_rebuilds_cache_and_enables_queries() {
        let (_, _, plugin) = session(BridgeConfig::default());
        assert_eq!(plugin.check_if_point_inside_geofence(&query(5.0, 5.0)), json!({ "isInside": false }));

        let geofences = plugin.fetch_geofences("b1").await.unwrap();
        assert_eq!(geofences.len(), 2);
        assert_eq!(plugin.cache().len(), 2);

        let response = plugin.check_if_point_inside_geofence(&query(5.0, 5.0));
        assert_eq!(response["isInside"], true);
        // Last match in fetch order.
        assert_eq!(response["geofence"]["identifier"], "inner");

        let far = plugin.check_if_point_inside_geofence(&query(20.0, 20.0));
        assert_eq!(far, json!({ "isInside": false }));
    }

    #[tokio::test]
    async fn first_match_policy_from_config() {
        let config = BridgeConfig {
            match_policy: MatchPolicy::FirstMatch,
            ..BridgeConfig::default()
        };
        let (_, _, plugin) = session(config);
        plugin.fetch_geofences("b1").await.unwrap();

        let response = plugin.check_if_point_inside_geofence(&query(5.0, 5.0));
        assert_eq!(response["geofence"]["identifier"], "G1");
    }

    #[tokio::test]
    async fn floor_filter_on_host_request() {
        let (_, _, plugin) = session(BridgeConfig::default());
        plugin.fetch_geofences("b1").await.unwrap();

        let request = json!({
            "coordinate": { "latitude": 5.0, "longitude": 5.0 },
            "floorIdentifier": "F2",
        });
        assert_eq!(plugin.check_if_point_inside_geofence(&request), json!({ "isInside": false }));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_cache() {
        let (sdk, _, plugin) = session(BridgeConfig::default());
        plugin.fetch_geofences("b1").await.unwrap();

        sdk.fail_next_fetch("server returned 503");
        let err = plugin.fetch_geofences("b1").await.unwrap_err();
        assert!(matches!(err, IndoorError::Fetch(_)));
        assert_eq!(plugin.cache().len(), 2);

        assert!(plugin.fetch_geofences("unknown").await.is_err());
        assert_eq!(plugin.cache().len(), 2);
    }

    /// SDK that loses every fetch completion.
    struct SilentSdk;

    impl CartographySource for SilentSdk {
        fn fetch_geofences(&self, _building_id: &str, on_complete: FetchCallback) {
            drop(on_complete);
        }

        fn invalidate_cache(&self) {}
    }

    impl TransitionSource for SilentSdk {
        fn subscribe(&self, _sink: Arc<dyn indoorsense_geofence::TransitionSink>) -> Result<()> {
            Ok(())
        }

        fn unsubscribe(&self) -> Result<()> {
            Ok(())
        }
    }

    impl PositioningSdk for SilentSdk {
        fn platform_name(&self) -> &str {
            "silent"
        }
    }

    #[tokio::test]
    async fn dropped_completion_is_a_bridge_error() {
        let plugin = IndoorPlugin::new(
            Arc::new(SilentSdk),
            Arc::new(RecordingEmitter::default()),
            BridgeConfig::default(),
        );
        let err = plugin.fetch_geofences("b1").await.unwrap_err();
        assert!(matches!(err, IndoorError::Bridge(_)));
        assert!(plugin.cache().is_empty());
    }

    #[tokio::test]
    async fn invalidate_clears_cache_and_sdk() {
        let (sdk, _, plugin) = session(BridgeConfig::default());
        plugin.fetch_geofences("b1").await.unwrap();

        assert_eq!(plugin.invalidate_cache(), json!({ "success": true }));
        assert!(plugin.cache().is_empty());
        assert_eq!(sdk.invalidation_count(), 1);
        assert_eq!(plugin.check_if_point_inside_geofence(&query(5.0, 5.0)), json!({ "isInside": false }));
    }

    #[test]
    fn malformed_request_returns_error_payload() {
        let (_, _, plugin) = session(BridgeConfig::default());
        let response = plugin.check_if_point_inside_geofence(&json!({ "floorIdentifier": "F1" }));
        assert_eq!(response["error"], "missing required field: coordinate");
    }

    #[test]
    fn host_fetch_reports_through_callbacks() {
        let (_, _, plugin) = session(BridgeConfig::default());
        let (tx, rx) = std::sync::mpsc::channel();

        let ok = tx.clone();
        let err = tx.clone();
        plugin.fetch_geofences_from_building(
            &json!({ "buildingIdentifier": "b1" }),
            Box::new(move |v: Value| ok.send(("success", v)).unwrap()),
            Box::new(move |v: Value| err.send(("error", v)).unwrap()),
        );
        let (kind, payload) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(kind, "success");
        assert_eq!(payload.as_array().unwrap().len(), 2);
        assert_eq!(payload[0]["identifier"], "G1");

        let ok = tx.clone();
        let err = tx;
        plugin.fetch_geofences_from_building(
            &json!({ "buildingIdentifier": "missing" }),
            Box::new(move |v: Value| ok.send(("success", v)).unwrap()),
            Box::new(move |v: Value| err.send(("error", v)).unwrap()),
        );
        let (kind, payload) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(kind, "error");
        assert_eq!(payload["error"], "building not found: missing");
    }

    #[test]
    fn host_fetch_rejects_building_without_id() {
        let (_, _, plugin) = session(BridgeConfig::default());
        let (tx, rx) = std::sync::mpsc::channel();
        let err = tx.clone();
        plugin.fetch_geofences_from_building(
            &json!({ "name": "HQ" }),
            Box::new(move |v: Value| tx.send(v).unwrap()),
            Box::new(move |v: Value| err.send(v).unwrap()),
        );
        let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("buildingIdentifier"));
    }

    #[test]
    fn enter_stream_only_emits_enter_events() {
        let (sdk, emitter, plugin) = session(BridgeConfig::default());
        assert_eq!(plugin.on_enter_geofences(), json!({ "success": true }));
        assert!(sdk.is_subscribed());

        let g1 = sdk.geofence("G1").unwrap();
        sdk.deliver_transitions(&[g1.clone()], &[g1]);

        assert_eq!(emitter.names(), vec!["onEnterGeofences".to_string()]);
        let events = emitter.events.lock().unwrap();
        assert_eq!(events[0].1[0]["identifier"], "G1");
        assert_eq!(events[0].1[0]["floorIdentifier"], "F1");
    }

    #[test]
    fn exit_stream_uses_configured_event_name() {
        let config = BridgeConfig {
            exit_event: "geofencesExited".into(),
            ..BridgeConfig::default()
        };
        let (sdk, emitter, plugin) = session(config);
        plugin.on_exit_geofences();

        let inner = sdk.geofence("inner").unwrap();
        sdk.deliver_transitions(&[inner.clone()], &[inner]);
        assert_eq!(emitter.names(), vec!["geofencesExited".to_string()]);
    }

    #[test]
    fn stopping_both_streams_releases_subscription() {
        let (sdk, emitter, plugin) = session(BridgeConfig::default());
        plugin.on_enter_geofences();
        plugin.on_exit_geofences();
        plugin.stop_enter_geofences();
        assert!(sdk.is_subscribed());
        plugin.stop_exit_geofences();
        assert!(!sdk.is_subscribed());
        assert_eq!(plugin.listener_state(), ListenerState::Unregistered);

        let g1 = sdk.geofence("G1").unwrap();
        assert!(!sdk.deliver_transitions(&[g1.clone()], &[g1]));
        assert!(emitter.names().is_empty());
    }

    #[test]
    fn shutdown_and_drop_detach_listener() {
        let (sdk, _, plugin) = session(BridgeConfig::default());
        plugin.on_enter_geofences();
        plugin.shutdown().unwrap();
        assert!(!sdk.is_subscribed());
        assert!(plugin.on_enter_geofences()["error"].is_string());

        let (sdk, _, plugin) = session(BridgeConfig::default());
        plugin.on_exit_geofences();
        drop(plugin);
        assert!(!sdk.is_subscribed());
    }
}

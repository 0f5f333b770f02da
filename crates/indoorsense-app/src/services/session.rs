// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin session drivers for the desktop harness.
//
// Each driver builds a fresh `IndoorPlugin` over the stub SDK, talks to it
// through the same JSON operations a mobile host would use, and returns the
// payloads it produced so `main` can print them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use indoorsense_bridge::{EventEmitter, IndoorPlugin, StubSdk};
use indoorsense_core::BridgeConfig;
use indoorsense_core::error::{IndoorError, Result};
use indoorsense_core::types::{Coordinate, Geofence, TransitionKind};

/// One recorded SDK callback: geofence identifiers entered and exited.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransitionStep {
    pub entered: Vec<String>,
    pub exited: Vec<String>,
}

/// Which transition streams a replay listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streams {
    pub enter: bool,
    pub exit: bool,
}

impl Streams {
    /// With neither flag given, listen to both.
    pub fn from_flags(enter: bool, exit: bool) -> Self {
        if !enter && !exit {
            Self {
                enter: true,
                exit: true,
            }
        } else {
            Self { enter, exit }
        }
    }
}

/// Collects emitted events as `{"event": name, "payload": ...}` records.
#[derive(Default)]
struct CollectingEmitter {
    events: Mutex<Vec<Value>>,
}

impl EventEmitter for CollectingEmitter {
    fn emit(&self, event: &str, payload: Value) {
        info!(event, "host event emitted");
        self.events
            .lock()
            .expect("event log lock poisoned")
            .push(json!({ "event": event, "payload": payload }));
    }
}

/// Load replay steps from a JSON array file.
pub fn load_transitions(path: &Path) -> Result<Vec<TransitionStep>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Fetch a building's geofences and answer one containment request.
pub async fn run_check(
    sdk: Arc<StubSdk>,
    config: BridgeConfig,
    building: &str,
    coordinate: Coordinate,
    floor: Option<&str>,
) -> Result<Value> {
    let emitter = Arc::new(CollectingEmitter::default());
    let plugin = IndoorPlugin::new(sdk, emitter, config);

    let geofences = plugin.fetch_geofences(building).await?;
    info!(building, count = geofences.len(), "geofences loaded");

    let mut request = json!({
        "coordinate": {
            "latitude": coordinate.latitude,
            "longitude": coordinate.longitude,
        }
    });
    if let Some(floor) = floor {
        request["floorIdentifier"] = Value::String(floor.to_owned());
    }

    let response = plugin.check_if_point_inside_geofence(&request);
    plugin.shutdown()?;
    Ok(response)
}

/// Replay recorded transition callbacks and return the events emitted.
pub fn run_replay(
    sdk: Arc<StubSdk>,
    config: BridgeConfig,
    steps: &[TransitionStep],
    streams: Streams,
) -> Result<Vec<Value>> {
    let emitter = Arc::new(CollectingEmitter::default());
    let plugin = IndoorPlugin::new(sdk.clone(), emitter.clone(), config);

    if streams.enter {
        plugin.watch(TransitionKind::Enter)?;
    }
    if streams.exit {
        plugin.watch(TransitionKind::Exit)?;
    }

    for (i, step) in steps.iter().enumerate() {
        let entered = resolve(&sdk, &step.entered)?;
        let exited = resolve(&sdk, &step.exited)?;
        if !sdk.deliver_transitions(&entered, &exited) {
            warn!(step = i, "no listener attached, step skipped");
        }
    }

    plugin.shutdown()?;
    let events = std::mem::take(&mut *emitter.events.lock().expect("event log lock poisoned"));
    Ok(events)
}

fn resolve(sdk: &StubSdk, identifiers: &[String]) -> Result<Vec<Geofence>> {
    identifiers
        .iter()
        .map(|id| {
            sdk.geofence(id)
                .ok_or_else(|| IndoorError::invalid("transitions", format!("unknown geofence {id}")))
        })
        .collect()
}

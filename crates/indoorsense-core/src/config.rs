// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::MatchPolicy;

/// Event name used for entered-geofence batches.
pub const DEFAULT_ENTER_EVENT: &str = "onEnterGeofences";

/// Event name used for exited-geofence batches.
pub const DEFAULT_EXIT_EVENT: &str = "onExitGeofences";

/// Persistent bridge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Winner selection when a point lies in overlapping geofences.
    pub match_policy: MatchPolicy,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Host event carrying entered-geofence batches.
    pub enter_event: String,
    /// Host event carrying exited-geofence batches.
    pub exit_event: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::LastMatch,
            log_filter: "info".to_string(),
            enter_event: DEFAULT_ENTER_EVENT.to_string(),
            exit_event: DEFAULT_EXIT_EVENT.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Like [`load`](Self::load), but any failure yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

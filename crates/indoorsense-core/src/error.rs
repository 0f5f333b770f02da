// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Indoorsense.

use thiserror::Error;

/// Top-level error type for all Indoorsense operations.
#[derive(Debug, Error)]
pub enum IndoorError {
    // -- Host payload errors --
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    // -- Cartography / positioning SDK --
    #[error("geofence fetch failed: {0}")]
    Fetch(String),

    #[error("building not found: {0}")]
    BuildingNotFound(String),

    #[error("geofence transition subscription failed: {0}")]
    Subscription(String),

    // -- Serialization / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),
}

impl IndoorError {
    /// Shorthand for an `InvalidField` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IndoorError>;

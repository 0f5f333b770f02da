// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Indoorsense — Positioning SDK bridge.
//!
//! Defines the capability traits the vendor positioning SDK is consumed
//! through, the JSON shapes exchanged with the host runtime, and the
//! [`plugin::IndoorPlugin`] service that ties the geofence engine to both.
//!
//! Native SDK bindings implement [`traits::PositioningSdk`]; desktop and CI
//! builds use the fixture-backed [`stub::StubSdk`].

pub mod mapper;
pub mod plugin;
pub mod stub;
pub mod traits;

pub use plugin::IndoorPlugin;
pub use stub::StubSdk;
pub use traits::{CartographySource, EventEmitter, FetchCallback, PositioningSdk};

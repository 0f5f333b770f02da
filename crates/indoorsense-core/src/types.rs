// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Indoorsense cartography and geofencing.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Fixed timestamp pattern used on the host wire, e.g.
/// `Mon Jan 15 10:30:00 +0000 2024`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)?.with_timezone(&Utc))
}

/// Serde adapter for [`TIMESTAMP_FORMAT`] timestamps.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    /// `null` reads as the Unix epoch, like a missing key.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => super::parse_timestamp(&raw).map_err(serde::de::Error::custom),
            None => Ok(super::unix_epoch()),
        }
    }
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Treat `""` the same as a missing value.
fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

/// Identifier of one plugin session, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Position in the building's local metric frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianCoordinate {
    pub x: f64,
    pub y: f64,
}

/// A located point, e.g. one vertex of a geofence outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    #[serde(default)]
    pub building_identifier: String,
    /// Empty for outdoor points.
    #[serde(default)]
    pub floor_identifier: String,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub cartesian_coordinate: CartesianCoordinate,
}

impl Point {
    /// A point with only geographic information.
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            building_identifier: String::new(),
            floor_identifier: String::new(),
            coordinate,
            cartesian_coordinate: CartesianCoordinate::default(),
        }
    }

    /// Indoor points belong to a floor.
    pub fn is_indoor(&self) -> bool {
        !self.floor_identifier.is_empty()
    }

    pub fn is_outdoor(&self) -> bool {
        !self.is_indoor()
    }
}

/// A named polygonal region of a building, optionally tied to one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub identifier: String,
    #[serde(default)]
    pub building_identifier: String,
    /// `None` means the geofence is not floor-scoped.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub floor_identifier: Option<String>,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub info_html: String,
    /// Ordered outline; the last point implicitly closes back to the first.
    #[serde(default)]
    pub polygon_points: Vec<Point>,
    /// Opaque metadata, never inspected by containment logic.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    #[serde(with = "timestamp", default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp", default = "unix_epoch")]
    pub updated_at: DateTime<Utc>,
}

impl Geofence {
    pub fn new(
        identifier: impl Into<String>,
        building_identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        // The wire format carries whole seconds only.
        let now = Utc::now().trunc_subsecs(0);
        Self {
            identifier: identifier.into(),
            building_identifier: building_identifier.into(),
            floor_identifier: None,
            name: name.into(),
            code: String::new(),
            info_html: String::new(),
            polygon_points: Vec::new(),
            custom_fields: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Scope the geofence to a floor. An empty id clears the scope.
    pub fn with_floor(mut self, floor_identifier: impl Into<String>) -> Self {
        let floor = floor_identifier.into();
        self.floor_identifier = (!floor.is_empty()).then_some(floor);
        self
    }

    /// Replace the outline with the given coordinates, in order.
    pub fn with_boundary(mut self, coordinates: impl IntoIterator<Item = Coordinate>) -> Self {
        let building = self.building_identifier.clone();
        let floor = self.floor_identifier.clone().unwrap_or_default();
        self.polygon_points = coordinates
            .into_iter()
            .map(|coordinate| Point {
                building_identifier: building.clone(),
                floor_identifier: floor.clone(),
                ..Point::from_coordinate(coordinate)
            })
            .collect();
        self
    }

    /// Outline coordinates in ring order.
    pub fn boundary(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.polygon_points.iter().map(|p| p.coordinate)
    }

    /// Floor this geofence is restricted to, if any.
    pub fn floor_scope(&self) -> Option<&str> {
        self.floor_identifier.as_deref().filter(|f| !f.is_empty())
    }

    pub fn summary(&self) -> GeofenceSummary {
        GeofenceSummary {
            name: self.name.clone(),
            identifier: self.identifier.clone(),
        }
    }
}

/// Minimal identifying record returned by containment queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofenceSummary {
    pub name: String,
    pub identifier: String,
}

/// Which geofence wins when a point lies inside several of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The last qualifying geofence in cache order.
    #[default]
    LastMatch,
    /// The first qualifying geofence in cache order.
    FirstMatch,
}

/// Direction of a geofence transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    Enter,
    Exit,
}

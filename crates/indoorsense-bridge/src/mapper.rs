// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON shapes exchanged with the host runtime.
//
// Outgoing records are built field by field so the host sees exactly the
// keys it expects (including derived flags like `isIndoor`). Incoming
// payloads are validated here and turned into typed values; a missing or
// mistyped field becomes an `IndoorError` that the plugin reports back as
// `{"error": ...}`.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use indoorsense_core::error::{IndoorError, Result};
use indoorsense_core::types::{Coordinate, Geofence, GeofenceSummary, Point, format_timestamp};
use indoorsense_geofence::ContainmentQuery;

// -- Outgoing ----------------------------------------------------------------

pub fn coordinate_to_json(coordinate: &Coordinate) -> Value {
    json!({
        "latitude": coordinate.latitude,
        "longitude": coordinate.longitude,
    })
}

pub fn point_to_json(point: &Point) -> Value {
    json!({
        "buildingIdentifier": point.building_identifier,
        "cartesianCoordinate": {
            "x": point.cartesian_coordinate.x,
            "y": point.cartesian_coordinate.y,
        },
        "coordinate": coordinate_to_json(&point.coordinate),
        "floorIdentifier": point.floor_identifier,
        "isIndoor": point.is_indoor(),
        "isOutdoor": point.is_outdoor(),
    })
}

/// Full geofence record, as sent for fetch results and transition events.
pub fn geofence_to_json(geofence: &Geofence) -> Value {
    let points: Vec<Value> = geofence.polygon_points.iter().map(point_to_json).collect();
    json!({
        "name": geofence.name,
        "code": geofence.code,
        "infoHtml": geofence.info_html,
        "buildingIdentifier": geofence.building_identifier,
        "floorIdentifier": geofence.floor_identifier.as_deref().unwrap_or_default(),
        "polygonPoints": points,
        "identifier": geofence.identifier,
        "customFields": geofence.custom_fields,
        "createdAt": format_timestamp(&geofence.created_at),
        "updatedAt": format_timestamp(&geofence.updated_at),
    })
}

pub fn geofences_to_json(geofences: &[Geofence]) -> Value {
    Value::Array(geofences.iter().map(geofence_to_json).collect())
}

pub fn geofence_summary_to_json(summary: &GeofenceSummary) -> Value {
    json!({
        "name": summary.name,
        "identifier": summary.identifier,
    })
}

/// `{"isInside": bool, "geofence"?: {name, identifier}}`.
pub fn containment_response(hit: Option<&GeofenceSummary>) -> Value {
    let mut response = Map::new();
    response.insert("isInside".into(), Value::Bool(hit.is_some()));
    if let Some(summary) = hit {
        response.insert("geofence".into(), geofence_summary_to_json(summary));
    }
    Value::Object(response)
}

pub fn success_response() -> Value {
    json!({ "success": true })
}

pub fn error_response(error: &IndoorError) -> Value {
    json!({ "error": error.to_string() })
}

// -- Incoming ----------------------------------------------------------------

/// Parse a geofence record in the shape produced by [`geofence_to_json`].
pub fn geofence_from_json(value: &Value) -> Result<Geofence> {
    Ok(Geofence::deserialize(value)?)
}

/// Parse `{coordinate: {latitude, longitude}, floorIdentifier?}`.
pub fn parse_containment_request(request: &Value) -> Result<ContainmentQuery> {
    let coordinate = request
        .get("coordinate")
        .filter(|c| !c.is_null())
        .ok_or_else(|| IndoorError::MissingField("coordinate".into()))?;

    let latitude = number_field(coordinate, "latitude")?;
    let longitude = number_field(coordinate, "longitude")?;
    let mut query = ContainmentQuery::new(Coordinate::new(latitude, longitude));

    match request.get("floorIdentifier") {
        None | Some(Value::Null) => {}
        Some(Value::String(floor)) => query = query.on_floor(floor.clone()),
        Some(other) => {
            return Err(IndoorError::invalid(
                "floorIdentifier",
                format!("expected a string, got {other}"),
            ));
        }
    }
    Ok(query)
}

/// Extract the building id from a building map (`buildingIdentifier`, or
/// `identifier` as a fallback).
pub fn parse_building_identifier(building: &Value) -> Result<String> {
    ["buildingIdentifier", "identifier"]
        .iter()
        .find_map(|key| {
            building
                .get(*key)
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
        })
        .map(str::to_owned)
        .ok_or_else(|| IndoorError::MissingField("buildingIdentifier".into()))
}

fn number_field(object: &Value, key: &str) -> Result<f64> {
    let value = object
        .get(key)
        .ok_or_else(|| IndoorError::MissingField(key.into()))?;
    value
        .as_f64()
        .ok_or_else(|| IndoorError::invalid(key, format!("expected a number, got {value}")))
}

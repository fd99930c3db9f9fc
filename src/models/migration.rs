//! Normalization of stored trip records written by older versions.
//!
//! Older records may lack `color` or `memo`, or still carry the
//! `coverImageUrl` field that has since been dropped. The shape of a record
//! is detected from which fields are present; no version number is stored.

use serde_json::{Map, Value};
use std::fmt;

use super::color::color_for;
use super::trip::Trip;

const COVER_IMAGE_FIELD: &str = "coverImageUrl";
const COLOR_FIELD: &str = "color";
const MEMO_FIELD: &str = "memo";

/// A raw trip record, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TripRecord {
    /// Written by the current schema; used as-is.
    Current(Map<String, Value>),
    /// Written by an older schema; needs normalizing before use.
    Legacy(Map<String, Value>),
}

impl TripRecord {
    /// Classifies a decoded JSON value.
    pub fn detect(value: Value) -> Result<Self, MigrationError> {
        let Value::Object(fields) = value else {
            return Err(MigrationError::NotAnObject);
        };

        let is_legacy = fields.contains_key(COVER_IMAGE_FIELD)
            || is_blank(&fields, COLOR_FIELD)
            || is_missing(&fields, MEMO_FIELD);

        if is_legacy {
            Ok(TripRecord::Legacy(fields))
        } else {
            Ok(TripRecord::Current(fields))
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, TripRecord::Legacy(_))
    }

    /// Returns the record in current-schema shape.
    pub fn normalize(self) -> Map<String, Value> {
        match self {
            TripRecord::Current(fields) => fields,
            TripRecord::Legacy(fields) => normalize_legacy(fields),
        }
    }

    /// Normalizes the record and decodes it as a [`Trip`].
    pub fn into_trip(self) -> Result<Trip, MigrationError> {
        serde_json::from_value(Value::Object(self.normalize())).map_err(MigrationError::Decode)
    }
}

fn normalize_legacy(mut fields: Map<String, Value>) -> Map<String, Value> {
    fields.remove(COVER_IMAGE_FIELD);

    if is_blank(&fields, COLOR_FIELD) {
        let color = color_for(&record_id(&fields));
        fields.insert(COLOR_FIELD.to_string(), Value::String(color.to_string()));
    }
    if is_blank(&fields, MEMO_FIELD) {
        fields.insert(MEMO_FIELD.to_string(), Value::String(String::new()));
    }

    fields
}

fn record_id(fields: &Map<String, Value>) -> String {
    match fields.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    }
}

fn is_missing(fields: &Map<String, Value>, key: &str) -> bool {
    matches!(fields.get(key), None | Some(Value::Null))
}

fn is_blank(fields: &Map<String, Value>, key: &str) -> bool {
    match fields.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Normalizes one raw record to current-schema shape.
pub fn migrate_value(value: Value) -> Result<Value, MigrationError> {
    Ok(Value::Object(TripRecord::detect(value)?.normalize()))
}

/// Normalizes one raw record and decodes it.
pub fn migrate_trip(value: Value) -> Result<Trip, MigrationError> {
    TripRecord::detect(value)?.into_trip()
}

#[derive(Debug)]
pub enum MigrationError {
    /// The record was not a JSON object.
    NotAnObject,
    /// The normalized record did not match the trip schema.
    Decode(serde_json::Error),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::NotAnObject => write!(f, "Trip record is not a JSON object"),
            MigrationError::Decode(e) => write!(f, "Invalid trip record: {}", e),
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::NotAnObject => None,
            MigrationError::Decode(e) => Some(e),
        }
    }
}

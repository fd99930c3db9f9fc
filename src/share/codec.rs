//! Trip <-> URL-safe compressed token.
//!
//! A token is the trip's JSON, zlib-compressed, base64-encoded, with `+`
//! and `/` swapped for `-` and `_` and the `=` padding stripped.

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fmt;
use std::io::{self, Read, Write};

use crate::models::{migrate_trip, MigrationError, Trip};

/// Upper bound on the inflated size of a token.
const MAX_INFLATED_BYTES: u64 = 8 * 1024 * 1024;

/// Encodes a trip as a share token.
pub fn encode(trip: &Trip) -> Result<String, EncodeError> {
    let json = serde_json::to_vec(trip).map_err(EncodeError::Json)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(EncodeError::Compress)?;
    let compressed = encoder.finish().map_err(EncodeError::Compress)?;

    Ok(to_url_safe(&STANDARD.encode(compressed)))
}

/// Decodes a share token back into a trip.
///
/// Tokens made by older versions are migrated like stored records.
pub fn decode(token: &str) -> Result<Trip, DecodeError> {
    let compressed = STANDARD
        .decode(from_url_safe(token.trim()))
        .map_err(DecodeError::Base64)?;

    let mut json = String::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(MAX_INFLATED_BYTES)
        .read_to_string(&mut json)
        .map_err(DecodeError::Inflate)?;

    let value: Value = serde_json::from_str(&json).map_err(DecodeError::Json)?;
    migrate_trip(value).map_err(DecodeError::Record)
}

fn to_url_safe(base64: &str) -> String {
    base64
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string()
}

fn from_url_safe(token: &str) -> String {
    let mut base64 = token.replace('-', "+").replace('_', "/");
    while base64.len() % 4 != 0 {
        base64.push('=');
    }
    base64
}

#[derive(Debug)]
pub enum EncodeError {
    Json(serde_json::Error),
    Compress(io::Error),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Json(e) => write!(f, "Failed to serialize trip: {}", e),
            EncodeError::Compress(e) => write!(f, "Failed to compress trip: {}", e),
        }
    }
}

impl std::error::Error for EncodeError {}

/// A share token that could not be turned back into a trip.
#[derive(Debug)]
pub enum DecodeError {
    Base64(base64::DecodeError),
    Inflate(io::Error),
    Json(serde_json::Error),
    Record(MigrationError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Base64(e) => write!(f, "Share link is not valid base64: {}", e),
            DecodeError::Inflate(e) => write!(f, "Share link could not be decompressed: {}", e),
            DecodeError::Json(e) => write!(f, "Share link does not contain valid JSON: {}", e),
            DecodeError::Record(e) => write!(f, "Share link does not contain a trip: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Base64(e) => Some(e),
            DecodeError::Inflate(e) => Some(e),
            DecodeError::Json(e) => Some(e),
            DecodeError::Record(e) => Some(e),
        }
    }
}

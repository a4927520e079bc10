//! Parsing of single-line instrument responses.

use crate::error::{Expected, ParseError};

fn parse_error(query: &str, raw: &str, expected: Expected) -> ParseError {
    ParseError {
        query: query.to_string(),
        raw: raw.to_string(),
        expected,
    }
}

/// Parse a numeric response (`"350.0\n"`, `"+3.500E+02"`).
pub fn parse_number(query: &str, raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(parse_error(query, raw, Expected::Number)),
    }
}

/// Parse a boolean response. Only `1`, `0`, `ON` and `OFF` are accepted.
pub fn parse_bool(query: &str, raw: &str) -> Result<bool, ParseError> {
    match raw.trim() {
        "1" | "ON" => Ok(true),
        "0" | "OFF" => Ok(false),
        _ => Err(parse_error(query, raw, Expected::Bool)),
    }
}

/// Parse an enumerated or free-text response.
pub fn parse_text(query: &str, raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(parse_error(query, raw, Expected::Text));
    }
    Ok(trimmed.to_string())
}

//! Normalizes human-entered location text into a [`Coordinate`].
//!
//! Accepted shapes, tried in this order (first match wins):
//!
//! 1. Two degree-minute-second tokens: `6°11'37.0"N 1°11'02.5"E`
//! 2. A decimal pair: `6.193611, 1.184028`
//! 3. A map URL query parameter: `...?q=6.19,1.18` or `...&ll=6.19,1.18`
//! 4. A map URL path segment: `.../@6.19,1.18,15z`
//!
//! Only ASCII digits count. Ranges are not checked here; callers decide
//! what to do with a lexically valid but geographically impossible value.

use super::Coordinate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Human-readable list of the accepted input shapes, used in error messages.
pub const SUPPORTED_FORMATS: &str = "Supported formats:\n\
- Google Maps URL (?q=lat,lng, ?ll=lat,lng or /@lat,lng,zoom)\n\
- DMS format: 6°11'37.0\"N 1°11'02.5\"E\n\
- Decimal: 6.193611, 1.184028";

static DMS_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([0-9]+°[0-9]+'[0-9.]+"[NSEW])\s+([0-9]+°[0-9]+'[0-9.]+"[NSEW])"#)
        .expect("DMS pair pattern is valid")
});

static DMS_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([0-9]+)°([0-9]+)'([0-9.]+)"([NSEW])"#).expect("DMS token pattern is valid")
});

static DECIMAL_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+))\s*,\s*(-?[0-9]*\.?[0-9]+)")
        .expect("decimal pair pattern is valid")
});

static URL_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // https://www.google.com/maps?q=lat,lng
        Regex::new(r"[?&]q=(-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)),(-?[0-9]*\.?[0-9]+)")
            .expect("q= pattern is valid"),
        // https://maps.google.com/maps?ll=lat,lng
        Regex::new(r"[?&]ll=(-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)),(-?[0-9]*\.?[0-9]+)")
            .expect("ll= pattern is valid"),
        // https://www.google.com/maps/@lat,lng,zoom
        Regex::new(r"@(-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)),(-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)),")
            .expect("@ pattern is valid"),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter.to_ascii_uppercase().as_str() {
            "N" => Some(Self::North),
            "S" => Some(Self::South),
            "E" => Some(Self::East),
            "W" => Some(Self::West),
            _ => None,
        }
    }

    fn is_latitude(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    fn sign(self) -> f64 {
        match self {
            Self::South | Self::West => -1.0,
            Self::North | Self::East => 1.0,
        }
    }
}

/// Outcome of one parsing branch.
enum Attempt {
    Parsed(Coordinate),
    /// The branch recognized its shape but the content is contradictory.
    Rejected,
    NoMatch,
}

/// Parses `input` into a coordinate, or `None` when no supported shape matches.
pub fn parse_coordinates(input: &str) -> Option<Coordinate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    match parse_dms_pair(trimmed) {
        Attempt::Parsed(coordinate) => return Some(coordinate),
        Attempt::Rejected => return None,
        Attempt::NoMatch => {}
    }

    if let Some(coordinate) = capture_pair(&DECIMAL_PAIR, trimmed) {
        return Some(coordinate);
    }

    URL_PATTERNS
        .iter()
        .find_map(|pattern| capture_pair(pattern, trimmed))
}

/// Alias kept for callers that only ever pass map links.
pub fn extract_coordinates_from_url(url: &str) -> Option<Coordinate> {
    parse_coordinates(url)
}

/// Diagnostic view of a parse, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    pub input: String,
    pub result: Option<Coordinate>,
    pub is_valid: bool,
}

pub fn inspect_coordinates(input: &str) -> ParseReport {
    let result = parse_coordinates(input);
    tracing::debug!(input, ?result, "parsed coordinate input");
    ParseReport {
        input: input.to_string(),
        result,
        is_valid: result.is_some(),
    }
}

fn parse_dms_pair(input: &str) -> Attempt {
    let Some(caps) = DMS_PAIR.captures(input) else {
        return Attempt::NoMatch;
    };

    let (Some(first), Some(second)) = (dms_to_decimal(&caps[1]), dms_to_decimal(&caps[2])) else {
        return Attempt::NoMatch;
    };

    match (first.1.is_latitude(), second.1.is_latitude()) {
        (true, false) => Attempt::Parsed(Coordinate::new(first.0, second.0)),
        (false, true) => Attempt::Parsed(Coordinate::new(second.0, first.0)),
        // N/N, S/N, E/W, ...: both tokens on one axis
        _ => Attempt::Rejected,
    }
}

fn dms_to_decimal(token: &str) -> Option<(f64, Hemisphere)> {
    let caps = DMS_TOKEN.captures(token)?;
    let degrees: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let hemisphere = Hemisphere::from_letter(&caps[4])?;

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    Some((decimal * hemisphere.sign(), hemisphere))
}

fn capture_pair(pattern: &Regex, input: &str) -> Option<Coordinate> {
    let caps = pattern.captures(input)?;
    let lat: f64 = caps[1].parse().ok()?;
    let lng: f64 = caps[2].parse().ok()?;
    Some(Coordinate::new(lat, lng))
}

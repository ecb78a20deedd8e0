/// Load-offer email parsing
///
/// Broker offer emails are line-oriented key/value text, with enough format
/// drift that parsing is lenient: keys are matched case-insensitively with
/// a few aliases, unparseable optional fields are dropped rather than
/// failing the email, and only origin and destination are mandatory.
///
/// A typical body:
///
/// ```text
/// Origin: Chicago, IL (41.8781, -87.6298)
/// Destination: Dallas, TX (32.7767, -96.7970)
/// Equipment: Van
/// Rate: $2,450.00
/// Miles: 925
/// Broker: Prime Freight Inc
/// MC: 654321
/// ```

use crate::geo::Coordinates;
use crate::models::load::Equipment;
use serde::{Deserialize, Serialize};

/// Error type for offer parsing
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// No origin line found, or it had no City, ST
    #[error("offer has no parseable origin")]
    MissingOrigin,

    /// No destination line found, or it had no City, ST
    #[error("offer has no parseable destination")]
    MissingDestination,
}

/// A parsed load offer, not yet a load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadOffer {
    pub origin_city: String,
    pub origin_state: String,
    pub origin_coords: Option<Coordinates>,

    pub dest_city: String,
    pub dest_state: String,
    pub dest_coords: Option<Coordinates>,

    pub equipment: Option<Equipment>,

    /// Offered linehaul rate in cents
    pub rate_cents: Option<i64>,

    pub distance_miles: Option<f64>,

    pub broker_name: Option<String>,
    pub broker_mc: Option<String>,
}

impl LoadOffer {
    /// Rate per mile in cents, when both rate and distance are known
    pub fn rate_per_mile_cents(&self) -> Option<i64> {
        match (self.rate_cents, self.distance_miles) {
            (Some(rate), Some(miles)) if miles > 0.0 => {
                Some((rate as f64 / miles).round() as i64)
            }
            _ => None,
        }
    }
}

/// A place parsed from a value like `Chicago, IL (41.8781, -87.6298)`
struct Place {
    city: String,
    state: String,
    coords: Option<Coordinates>,
}

/// Parses an offer from an email's subject and body
///
/// # Errors
///
/// Fails only when the origin or destination cannot be recovered; every
/// other field degrades to `None`.
pub fn parse_offer(subject: &str, body: &str) -> Result<LoadOffer, ParseError> {
    let mut origin: Option<Place> = None;
    let mut dest: Option<Place> = None;
    let mut offer = LoadOffer::default();

    for line in body.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "origin" | "from" | "pickup" | "pick up" => {
                if origin.is_none() {
                    origin = parse_place(value);
                }
            }
            "destination" | "dest" | "to" | "delivery" | "drop" => {
                if dest.is_none() {
                    dest = parse_place(value);
                }
            }
            "equipment" | "equip" | "trailer" => {
                offer.equipment = parse_equipment(value);
            }
            "rate" | "price" | "pay" => {
                offer.rate_cents = parse_money_cents(value);
            }
            "miles" | "distance" | "loaded miles" => {
                offer.distance_miles = parse_miles(value);
            }
            "broker" | "company" => {
                offer.broker_name = Some(value.to_string());
            }
            "mc" | "mc#" | "mc number" => {
                offer.broker_mc = Some(value.trim_start_matches('#').trim().to_string());
            }
            _ => {}
        }
    }

    // Subject lines like "Load: Chicago, IL -> Dallas, TX" fill gaps left
    // by a sparse body.
    if origin.is_none() || dest.is_none() {
        if let Some((subj_origin, subj_dest)) = parse_subject_lane(subject) {
            if origin.is_none() {
                origin = Some(subj_origin);
            }
            if dest.is_none() {
                dest = Some(subj_dest);
            }
        }
    }

    let origin = origin.ok_or(ParseError::MissingOrigin)?;
    let dest = dest.ok_or(ParseError::MissingDestination)?;

    offer.origin_city = origin.city;
    offer.origin_state = origin.state;
    offer.origin_coords = origin.coords;
    offer.dest_city = dest.city;
    offer.dest_state = dest.state;
    offer.dest_coords = dest.coords;

    Ok(offer)
}

/// Parses `City, ST` with an optional trailing `(lat, lon)`
fn parse_place(value: &str) -> Option<Place> {
    let (place_part, coords) = match value.split_once('(') {
        Some((place, rest)) => {
            let coords = rest
                .strip_suffix(')')
                .or(Some(rest))
                .and_then(parse_coordinates);
            (place.trim(), coords)
        }
        None => (value.trim(), None),
    };

    let (city, state) = place_part.split_once(',')?;
    let city = city.trim();
    let state = state.trim().to_ascii_uppercase();

    // Two-letter state codes only; anything else is noise, not a place.
    if city.is_empty() || state.len() != 2 || !state.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    Some(Place {
        city: city.to_string(),
        state,
        coords,
    })
}

/// Parses `lat, lon` out of a coordinate suffix
fn parse_coordinates(value: &str) -> Option<Coordinates> {
    let (lat, lon) = value.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    Some(Coordinates::new(lat, lon))
}

/// Parses equipment names with the usual shorthand
fn parse_equipment(value: &str) -> Option<Equipment> {
    match value.to_ascii_lowercase().as_str() {
        "van" | "dry van" | "v" => Some(Equipment::Van),
        "reefer" | "refrigerated" | "r" => Some(Equipment::Reefer),
        "flatbed" | "flat" | "f" => Some(Equipment::Flatbed),
        "stepdeck" | "step deck" | "sd" => Some(Equipment::Stepdeck),
        other if !other.is_empty() => Some(Equipment::Other),
        _ => None,
    }
}

/// Parses `$2,450.00`, `2450`, `$2450.5` into cents
fn parse_money_cents(value: &str) -> Option<i64> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let dollars: f64 = cleaned.parse().ok()?;
    if dollars < 0.0 {
        return None;
    }

    Some((dollars * 100.0).round() as i64)
}

/// Parses `925`, `925 mi`, `925.5` into miles
fn parse_miles(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let miles: f64 = cleaned.parse().ok()?;
    (miles > 0.0).then_some(miles)
}

/// Parses a `City, ST -> City, ST` lane out of a subject line
fn parse_subject_lane(subject: &str) -> Option<(Place, Place)> {
    // Strip a leading "Load:"-style prefix; the lane itself contains commas
    // so only split on the first colon when one precedes the arrow.
    let lane = match subject.split_once(':') {
        Some((prefix, rest)) if !prefix.contains("->") => rest,
        _ => subject,
    };

    let (from, to) = lane.split_once("->").or_else(|| lane.split_once(" to "))?;

    let origin = parse_place(from.trim())?;
    let dest = parse_place(to.trim())?;

    Some((origin, dest))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_BODY: &str = "\
Origin: Chicago, IL (41.8781, -87.6298)
Destination: Dallas, TX (32.7767, -96.7970)
Equipment: Van
Rate: $2,450.00
Miles: 925
Broker: Prime Freight Inc
MC: #654321
";

    #[test]
    fn test_parses_full_offer() {
        let offer = parse_offer("New load", FULL_BODY).unwrap();

        assert_eq!(offer.origin_city, "Chicago");
        assert_eq!(offer.origin_state, "IL");
        assert!(offer.origin_coords.is_some());
        assert_eq!(offer.dest_city, "Dallas");
        assert_eq!(offer.dest_state, "TX");
        assert_eq!(offer.equipment, Some(Equipment::Van));
        assert_eq!(offer.rate_cents, Some(245_000));
        assert_eq!(offer.distance_miles, Some(925.0));
        assert_eq!(offer.broker_name.as_deref(), Some("Prime Freight Inc"));
        assert_eq!(offer.broker_mc.as_deref(), Some("654321"));
    }

    #[test]
    fn test_key_aliases_and_case() {
        let body = "FROM: Atlanta, GA\nTO: Nashville, TN\nEquip: reefer\nPay: 1800";
        let offer = parse_offer("", body).unwrap();

        assert_eq!(offer.origin_city, "Atlanta");
        assert_eq!(offer.dest_city, "Nashville");
        assert_eq!(offer.equipment, Some(Equipment::Reefer));
        assert_eq!(offer.rate_cents, Some(180_000));
    }

    #[test]
    fn test_lane_recovered_from_subject() {
        let offer = parse_offer("Load: Chicago, IL -> Dallas, TX", "Rate: $2000").unwrap();

        assert_eq!(offer.origin_city, "Chicago");
        assert_eq!(offer.dest_city, "Dallas");
        assert!(offer.origin_coords.is_none());
        assert_eq!(offer.rate_cents, Some(200_000));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = parse_offer("RE: RE: FW: rates??", "call me back about that thing").unwrap_err();
        assert_eq!(err, ParseError::MissingOrigin);
    }

    #[test]
    fn test_missing_destination_is_rejected() {
        let err = parse_offer("", "Origin: Chicago, IL").unwrap_err();
        assert_eq!(err, ParseError::MissingDestination);
    }

    #[test]
    fn test_bad_coordinates_degrade_to_none() {
        let body = "Origin: Chicago, IL (999, -87)\nDestination: Dallas, TX";
        let offer = parse_offer("", body).unwrap();
        assert!(offer.origin_coords.is_none());
        assert_eq!(offer.origin_city, "Chicago");
    }

    #[test]
    fn test_unknown_equipment_maps_to_other() {
        let body = "Origin: A, GA\nDestination: B, TN\nEquipment: conestoga";
        let offer = parse_offer("", body).unwrap();
        assert_eq!(offer.equipment, Some(Equipment::Other));
    }

    #[test]
    fn test_money_parsing() {
        assert_eq!(parse_money_cents("$2,450.00"), Some(245_000));
        assert_eq!(parse_money_cents("1800"), Some(180_000));
        assert_eq!(parse_money_cents("$950.50"), Some(95_050));
        assert_eq!(parse_money_cents("call for rate"), None);
    }

    #[test]
    fn test_rate_per_mile() {
        let offer = parse_offer("", FULL_BODY).unwrap();
        // $2,450.00 over 925 miles ≈ 265 cents/mile
        assert_eq!(offer.rate_per_mile_cents(), Some(265));
    }
}

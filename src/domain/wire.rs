//! Serde helpers for the backend's wire representation.
//!
//! Decimal columns arrive either as JSON strings (`"100.00"`) or numbers, and
//! timestamps may come with or without an offset.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn parse_amount<E: serde::de::Error>(raw: RawAmount) -> Result<f64, E> {
    match raw {
        RawAmount::Number(n) => Ok(n),
        RawAmount::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| E::custom(format!("invalid amount {s:?}: {e}"))),
    }
}

/// Rounds half away from zero to two decimals.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Required decimal amount.
pub mod amount {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        parse_amount(RawAmount::deserialize(d)?)
    }

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(*value)
    }
}

/// Writes a decimal amount as a two-decimal string, the way the backend's
/// decimal fields expect it.
pub fn cents<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:.2}", round_cents(*value)))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Optional timestamp; `null`, missing and empty strings all mean "not set".
pub mod timestamp {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_timestamp(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {s:?}"))),
        }
    }

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => s.serialize_str(&ts.to_rfc3339()),
            None => s.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Deserialize, Serialize)]
    struct Priced {
        #[serde(with = "amount")]
        price: f64,
        #[serde(default, with = "timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn amounts_accept_strings_and_numbers() {
        let a: Priced = serde_json::from_str(r#"{"price":"100.50"}"#).unwrap();
        let b: Priced = serde_json::from_str(r#"{"price":100.5}"#).unwrap();
        assert_eq!(a.price, 100.5);
        assert_eq!(b.price, 100.5);
        assert!(a.at.is_none());

        assert!(serde_json::from_str::<Priced>(r#"{"price":"abc"}"#).is_err());
    }

    #[test]
    fn timestamps_with_and_without_offset() {
        let with_zone = parse_timestamp("2024-05-01T10:00:00.123456Z").unwrap();
        let naive = parse_timestamp("2024-05-01T10:00:00").unwrap();
        assert_eq!(with_zone.date_naive(), naive.date_naive());
        assert!(parse_timestamp("yesterday").is_none());

        let p: Priced = serde_json::from_str(r#"{"price":1,"at":""}"#).unwrap();
        assert!(p.at.is_none());
    }

    #[test]
    fn cents_round_half_away_from_zero() {
        assert_eq!(round_cents(72.727272), 72.73);
        assert_eq!(round_cents(7.2727), 7.27);
        assert_eq!(round_cents(-0.005), -0.01);
    }

    #[test]
    fn outgoing_amounts_are_two_decimal_strings() {
        #[derive(Serialize)]
        struct Body {
            #[serde(serialize_with = "cents")]
            total: f64,
        }
        let body = serde_json::to_value(Body { total: 72.727272 }).unwrap();
        assert_eq!(body, serde_json::json!({ "total": "72.73" }));
    }
}

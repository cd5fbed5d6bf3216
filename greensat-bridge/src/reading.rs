//! Persisted reading
//!
//! The bridge-side record: the producer's frame plus the receipt timestamp
//! and the derived air quality. Field names on disk and in the database are
//! the wire names (`temp`, `hum`, ...) so the dashboard layer reads either
//! store the same way.
//!
//! A field the producer listed in `faults` is stored as `None` (`NULL` in
//! SQLite, `null` in JSON), never as the `0` placeholder it was sent as.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use greensat_core::{Field, TelemetryFrame};

use crate::clock::parse_timestamp;

/// One reading as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Bridge receipt time
    #[serde(rename = "date_time", with = "date_time")]
    pub captured_at: NaiveDateTime,
    /// °C
    #[serde(rename = "temp")]
    pub temperature_c: Option<f64>,
    /// % RH
    #[serde(rename = "hum")]
    pub humidity_pct: Option<f64>,
    /// Gas level, always within 0..=100
    #[serde(rename = "gaz_pct")]
    pub gas_pct: Option<f64>,
    /// lux
    pub lux: Option<f64>,
    /// hPa
    #[serde(rename = "press")]
    pub pressure_hpa: Option<f64>,
    /// Air quality %, unset when gas is faulted and the producer sent none
    #[serde(rename = "air_pct")]
    pub air_quality_pct: Option<f64>,
}

impl Reading {
    /// Stamp a decoded frame
    ///
    /// Faulted fields become `None`. `gaz_pct` is clamped to 0..=100. A
    /// producer-supplied `air_pct` is kept as sent; otherwise it is
    /// `100 - gaz_pct`, one decimal, when gas was measured.
    pub fn from_frame(frame: &TelemetryFrame, captured_at: NaiveDateTime) -> Self {
        let gas_pct = frame.measured(Field::Gas).map(|g| g.clamp(0.0, 100.0));

        Self {
            captured_at,
            temperature_c: frame.measured(Field::Temperature),
            humidity_pct: frame.measured(Field::Humidity),
            gas_pct,
            lux: frame.measured(Field::Light),
            pressure_hpa: frame.measured(Field::Pressure),
            air_quality_pct: frame.air_quality(),
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Reading {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let stamp: String = row.try_get("date_time")?;
        let captured_at = parse_timestamp(&stamp).map_err(|e| sqlx::Error::ColumnDecode {
            index: "date_time".into(),
            source: Box::new(e),
        })?;

        Ok(Self {
            captured_at,
            temperature_c: row.try_get("temp")?,
            humidity_pct: row.try_get("hum")?,
            gas_pct: row.try_get("gaz_pct")?,
            lux: row.try_get("lux")?,
            pressure_hpa: row.try_get("press")?,
            air_quality_pct: row.try_get("air_pct")?,
        })
    }
}

/// `%Y-%m-%d %H:%M:%S` serde adapter
pub mod date_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::clock::{format_timestamp, parse_timestamp};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_timestamp;

    fn frame(json: &str) -> TelemetryFrame {
        serde_json::from_str(json).unwrap()
    }

    fn noon() -> NaiveDateTime {
        parse_timestamp("2024-05-01 12:00:00").unwrap()
    }

    #[test]
    fn derives_air_quality_from_gas() {
        let r = Reading::from_frame(
            &frame(r#"{"temp":22.5,"hum":40,"gaz_pct":5,"lux":300,"press":1013.2}"#),
            noon(),
        );
        assert_eq!(r.air_quality_pct, Some(95.0));
        assert_eq!(r.humidity_pct, Some(40.0));
        assert_eq!(r.captured_at, noon());
    }

    #[test]
    fn keeps_supplied_air_quality() {
        let r = Reading::from_frame(&frame(r#"{"gaz_pct":5,"air_pct":12.5}"#), noon());
        assert_eq!(r.air_quality_pct, Some(12.5));
    }

    #[test]
    fn clamps_gas_and_defaults_missing_fields() {
        let r = Reading::from_frame(&frame(r#"{"gaz_pct":140}"#), noon());
        assert_eq!(r.gas_pct, Some(100.0));
        assert_eq!(r.air_quality_pct, Some(0.0));
        assert_eq!(r.temperature_c, Some(0.0));

        let r = Reading::from_frame(&frame(r#"{"gaz_pct":-3}"#), noon());
        assert_eq!(r.gas_pct, Some(0.0));
        assert_eq!(r.air_quality_pct, Some(100.0));
    }

    #[test]
    fn faulted_fields_are_not_stored_as_zero() {
        let r = Reading::from_frame(
            &frame(r#"{"temp":21,"hum":0,"gaz_pct":0,"lux":0,"press":0,"faults":["hum","gaz_pct","press"]}"#),
            noon(),
        );
        assert_eq!(r.temperature_c, Some(21.0));
        assert_eq!(r.lux, Some(0.0));
        assert_eq!(r.humidity_pct, None);
        assert_eq!(r.pressure_hpa, None);
        assert_eq!(r.gas_pct, None);
        assert_eq!(r.air_quality_pct, None);
    }

    #[test]
    fn serializes_with_wire_names() {
        let r = Reading::from_frame(&frame(r#"{"temp":20,"gaz_pct":10}"#), noon());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["date_time"], "2024-05-01 12:00:00");
        assert_eq!(json["temp"], 20.0);
        assert_eq!(json["air_pct"], 90.0);

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn faulted_fields_serialize_as_null() {
        let r = Reading::from_frame(&frame(r#"{"temp":20,"lux":0,"faults":["lux"]}"#), noon());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json["lux"].is_null());
        assert_eq!(json["temp"], 20.0);

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back.lux, None);
    }
}

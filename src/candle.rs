//! Candle record and raw kline decoding
//!
//! Exchanges deliver klines as positional JSON arrays:
//!
//! ```text
//! [open_time, open, high, low, close, volume,
//!  close_time, quote_volume, trades, taker_buy_base, taker_buy_quote, ignore]
//! ```
//!
//! Only the first six fields are required. Prices usually arrive as strings
//! (`"54235.99000000"`) and are decoded straight into [`Decimal`].

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, SeriesError, OHLCV};

/// One raw kline record (a JSON array) as returned by a data source
pub type RawKline = Value;

/// Minimum number of positional fields in a kline record
pub const MIN_KLINE_FIELDS: usize = 6;

/// One OHLCV candle with exact decimal prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trades: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_buy_base_volume: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_buy_quote_volume: Option<Decimal>,
}

impl Candle {
    /// Decode a positional kline record.
    ///
    /// Errors carry index 0; callers decoding a batch rewrite it to the record position.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let raw = raw
            .as_array()
            .ok_or_else(|| malformed(format!("expected array, got {raw}")))?;
        if raw.len() < MIN_KLINE_FIELDS {
            return Err(malformed(format!(
                "expected at least {MIN_KLINE_FIELDS} fields, got {}",
                raw.len()
            )));
        }

        Ok(Self {
            open_time: integer(&raw[0], "open_time")?,
            open: decimal(&raw[1], "open")?,
            high: decimal(&raw[2], "high")?,
            low: decimal(&raw[3], "low")?,
            close: decimal(&raw[4], "close")?,
            volume: decimal(&raw[5], "volume")?,
            close_time: raw.get(6).map(|v| integer(v, "close_time")).transpose()?,
            quote_volume: raw.get(7).map(|v| decimal(v, "quote_volume")).transpose()?,
            trades: raw
                .get(8)
                .map(|v| {
                    v.as_u64()
                        .ok_or_else(|| malformed("trades: expected unsigned integer".to_string()))
                })
                .transpose()?,
            taker_buy_base_volume: raw
                .get(9)
                .map(|v| decimal(v, "taker_buy_base_volume"))
                .transpose()?,
            taker_buy_quote_volume: raw
                .get(10)
                .map(|v| decimal(v, "taker_buy_quote_volume"))
                .transpose()?,
        })
    }
}

fn malformed(reason: String) -> SeriesError {
    SeriesError::MalformedKline { index: 0, reason }
}

fn integer(value: &Value, field: &str) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| malformed(format!("{field}: expected integer, got {value}")))
}

fn decimal(value: &Value, field: &str) -> Result<Decimal> {
    let text = match value {
        Value::String(s) => s.clone(),
        // Parse the JSON text, never the f64 approximation
        Value::Number(n) => n.to_string(),
        other => {
            return Err(malformed(format!(
                "{field}: expected string or number, got {other}"
            )))
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| malformed(format!("{field}: invalid decimal {text:?}: {e}")))
}

/// Named-field form written by `Serialize`
#[derive(Deserialize)]
struct CandleFields {
    open_time: i64,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    #[serde(default)]
    close_time: Option<i64>,
    #[serde(default)]
    quote_volume: Option<Decimal>,
    #[serde(default)]
    trades: Option<u64>,
    #[serde(default)]
    taker_buy_base_volume: Option<Decimal>,
    #[serde(default)]
    taker_buy_quote_volume: Option<Decimal>,
}

impl From<CandleFields> for Candle {
    fn from(f: CandleFields) -> Self {
        Self {
            open_time: f.open_time,
            open: f.open,
            high: f.high,
            low: f.low,
            close: f.close,
            volume: f.volume,
            close_time: f.close_time,
            quote_volume: f.quote_volume,
            trades: f.trades,
            taker_buy_base_volume: f.taker_buy_base_volume,
            taker_buy_quote_volume: f.taker_buy_quote_volume,
        }
    }
}

// Accepts the exchange array form and the named-field form
impl<'de> Deserialize<'de> for Candle {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(d)?;
        if raw.is_object() {
            let fields = CandleFields::deserialize(raw).map_err(serde::de::Error::custom)?;
            return Ok(fields.into());
        }
        Candle::from_raw(&raw).map_err(serde::de::Error::custom)
    }
}

impl OHLCV for Candle {
    #[inline]
    fn open(&self) -> Decimal {
        self.open
    }

    #[inline]
    fn high(&self) -> Decimal {
        self.high
    }

    #[inline]
    fn low(&self) -> Decimal {
        self.low
    }

    #[inline]
    fn close(&self) -> Decimal {
        self.close
    }

    #[inline]
    fn volume(&self) -> Decimal {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.open_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn binance_record() -> Value {
        json!([
            1633651200000i64,
            "53785.22000000",
            "54235.99000000",
            "53711.57000000",
            "54108.00000000",
            "1319.71058000",
            1633654799999i64,
            "71264674.76186690",
            43155,
            "683.00199000",
            "36883209.50240990",
            "0"
        ])
    }

    #[test]
    fn test_decodes_full_binance_record() {
        let raw = binance_record();
        let candle = Candle::from_raw(&raw).unwrap();

        assert_eq!(candle.open_time, 1633651200000);
        assert_eq!(candle.open, dec!(53785.22));
        assert_eq!(candle.high, dec!(54235.99));
        assert_eq!(candle.low, dec!(53711.57));
        assert_eq!(candle.close, dec!(54108.00));
        assert_eq!(candle.volume, dec!(1319.71058));
        assert_eq!(candle.close_time, Some(1633654799999));
        assert_eq!(candle.trades, Some(43155));
        assert_eq!(candle.taker_buy_quote_volume, Some(dec!(36883209.50240990)));
        assert_eq!(candle.timestamp(), Some(1633651200000));
    }

    #[test]
    fn test_decodes_minimal_record_with_numbers() {
        let raw = json!([0, 1.5, 2, 1.25, 1.75, 100]);
        let candle = Candle::from_raw(&raw).unwrap();

        assert_eq!(candle.open, dec!(1.5));
        assert_eq!(candle.high, dec!(2));
        assert_eq!(candle.low, dec!(1.25));
        assert_eq!(candle.close_time, None);
        assert_eq!(candle.trades, None);
    }

    #[test]
    fn test_rejects_short_record() {
        let raw = json!([0, "1", "2", "0.5", "1.5"]);
        let err = Candle::from_raw(&raw).unwrap_err();
        assert!(matches!(err, SeriesError::MalformedKline { index: 0, .. }));
    }

    #[test]
    fn test_rejects_non_numeric_price() {
        let raw = json!([0, "1", "abc", "0.5", "1.5", "10"]);
        let err = Candle::from_raw(&raw).unwrap_err();
        assert!(err.to_string().contains("high"));

        let raw = json!([0, "1", null, "0.5", "1.5", "10"]);
        assert!(Candle::from_raw(&raw).is_err());
    }

    #[test]
    fn test_deserialize_from_array() {
        let candle: Candle = serde_json::from_value(binance_record()).unwrap();
        assert_eq!(candle.high, dec!(54235.99));
        assert!(serde_json::from_value::<Candle>(json!({"open": "1"})).is_err());
        assert!(Candle::from_raw(&json!("54235.99")).is_err());
    }

    #[test]
    fn test_serialize_named_fields() {
        let raw = json!([7, "1", "2", "0.5", "1.5", "10"]);
        let candle = Candle::from_raw(&raw).unwrap();
        let value = serde_json::to_value(&candle).unwrap();
        assert_eq!(value["open_time"], json!(7));
        assert!(value.get("close_time").is_none());
    }

    #[test]
    fn test_serialized_candle_reads_back() {
        let full = Candle::from_raw(&binance_record()).unwrap();
        let value = serde_json::to_value(&full).unwrap();
        assert_eq!(serde_json::from_value::<Candle>(value).unwrap(), full);

        let minimal = Candle::from_raw(&json!([7, "1", "2", "0.5", "1.5", "10"])).unwrap();
        let text = serde_json::to_string(&minimal).unwrap();
        assert_eq!(serde_json::from_str::<Candle>(&text).unwrap(), minimal);
    }

    #[test]
    fn test_deserialize_named_fields_requires_prices() {
        let err = serde_json::from_value::<Candle>(json!({"open_time": 7, "open": "1"}));
        assert!(err.is_err());
    }
}

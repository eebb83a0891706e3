// Convert wire values into Decimal price levels.
// Venues send prices and sizes either as JSON numbers or as strings.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::engine::types::PriceLevel;
use crate::market_data::adapters::types::WireLevel;
use crate::market_data::adapters::FeedError;

/// Read a JSON number or numeric string as a `Decimal`.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s.trim()),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    // serde_json prints very small or very large floats in exponent form
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
}

fn field(name: &'static str, value: &Value) -> Result<Decimal, FeedError> {
    decimal_from_value(value).ok_or_else(|| FeedError::MalformedFeedMessage {
        reason: format!("{} is not a decimal: {}", name, value),
    })
}

/// Normalise one level. Prices must be positive and sizes non-negative.
pub fn normalise_level(level: &WireLevel) -> Result<PriceLevel, FeedError> {
    let (price, size) = level.parts();
    let price = field("price", price)?;
    let size = field("size", size)?;

    if price <= Decimal::ZERO {
        return Err(FeedError::MalformedFeedMessage { reason: format!("non-positive price {}", price) });
    }
    if size < Decimal::ZERO {
        return Err(FeedError::MalformedFeedMessage { reason: format!("negative size {} at {}", size, price) });
    }
    Ok(PriceLevel::new(price, size))
}

/// Normalise a side of a delta message; zero sizes are kept as removal markers.
pub fn normalise_delta_side(levels: &[WireLevel]) -> Result<Vec<PriceLevel>, FeedError> {
    levels.iter().map(normalise_level).collect()
}

/// Normalise a side of a snapshot message; zero sizes mean "not present" and are dropped.
pub fn normalise_snapshot_side(levels: &[WireLevel]) -> Result<Vec<PriceLevel>, FeedError> {
    let mut out = Vec::with_capacity(levels.len());
    for level in levels {
        let level = normalise_level(level)?;
        if !level.is_removal() {
            out.push(level);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn wire(v: Value) -> WireLevel {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_decimal_from_string_and_number() {
        assert_eq!(decimal_from_value(&json!("455659")), Some(dec!(455659)));
        assert_eq!(decimal_from_value(&json!(" 0.0001 ")), Some(dec!(0.0001)));
        assert_eq!(decimal_from_value(&json!(30000.5)), Some(dec!(30000.5)));
        assert_eq!(decimal_from_value(&json!(12)), Some(dec!(12)));
        assert_eq!(decimal_from_value(&json!(0.00001)), Some(dec!(0.00001)));
        assert_eq!(decimal_from_value(&json!("abc")), None);
        assert_eq!(decimal_from_value(&json!("")), None);
        assert_eq!(decimal_from_value(&json!(null)), None);
    }

    #[test]
    fn test_normalise_object_and_pair_levels() {
        let obj = wire(json!({"price": "100", "size": "1.5"}));
        let pair = wire(json!(["100", 1.5]));
        assert_eq!(normalise_level(&obj).unwrap(), PriceLevel::new(dec!(100), dec!(1.5)));
        assert_eq!(normalise_level(&pair).unwrap(), PriceLevel::new(dec!(100), dec!(1.5)));
    }

    #[test]
    fn test_malformed_values_rejected() {
        let bad_price = wire(json!({"price": "1x0", "size": "1"}));
        let negative_size = wire(json!({"price": "100", "size": "-1"}));
        let zero_price = wire(json!(["0", "1"]));
        for level in [bad_price, negative_size, zero_price] {
            assert!(matches!(normalise_level(&level), Err(FeedError::MalformedFeedMessage { .. })));
        }
    }

    #[test]
    fn test_snapshot_drops_zero_delta_keeps_zero() {
        let levels = vec![wire(json!(["100", "0"])), wire(json!(["101", "2"]))];
        assert_eq!(normalise_snapshot_side(&levels).unwrap(), vec![PriceLevel::new(dec!(101), dec!(2))]);
        assert_eq!(normalise_delta_side(&levels).unwrap().len(), 2);
    }
}

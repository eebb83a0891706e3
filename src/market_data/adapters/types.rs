use serde_json::Value;

use super::FeedError;

// A single book level as venues send it: either {"price":..,"size":..}
// or a [price, size] pair. Values stay raw here; the normaliser coerces them.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum WireLevel {
    Pair(Value, Value),
    Object { price: Value, size: Value },
}

impl WireLevel {
    pub fn parts(&self) -> (&Value, &Value) {
        match self {
            WireLevel::Pair(price, size) => (price, size),
            WireLevel::Object { price, size } => (price, size),
        }
    }
}

// Both venues put the two book sides under "asks"/"bids". Whether a missing
// side is allowed depends on the message kind, so absence is kept.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WireBook {
    #[serde(default)]
    pub asks: Option<Vec<WireLevel>>,
    #[serde(default)]
    pub bids: Option<Vec<WireLevel>>,
}

impl WireBook {
    /// Neither side present (status or heartbeat frames).
    pub fn is_absent(&self) -> bool {
        self.asks.is_none() && self.bids.is_none()
    }

    /// Sides of a diff; a missing side has no changes.
    pub fn delta_sides(&self) -> (&[WireLevel], &[WireLevel]) {
        (self.asks.as_deref().unwrap_or_default(), self.bids.as_deref().unwrap_or_default())
    }

    /// Sides of a full board. Both must be present: an empty snapshot would
    /// clear the book.
    pub fn snapshot_sides(&self) -> Result<(&[WireLevel], &[WireLevel]), FeedError> {
        match (self.asks.as_deref(), self.bids.as_deref()) {
            (Some(asks), Some(bids)) => Ok((asks, bids)),
            (None, _) => Err(FeedError::MalformedFeedMessage { reason: "snapshot without asks".into() }),
            (_, None) => Err(FeedError::MalformedFeedMessage { reason: "snapshot without bids".into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sides_require_both() {
        let book: WireBook = serde_json::from_str(r#"{"asks":[["100","1"]]}"#).unwrap();
        assert!(matches!(book.snapshot_sides(), Err(FeedError::MalformedFeedMessage { .. })));
        let (asks, bids) = book.delta_sides();
        assert_eq!((asks.len(), bids.len()), (1, 0));

        let book: WireBook = serde_json::from_str(r#"{"asks":[],"bids":[]}"#).unwrap();
        assert!(!book.is_absent());
        assert!(book.snapshot_sides().is_ok());

        let book: WireBook = serde_json::from_str(r#"{"symbol":"BTC_JPY"}"#).unwrap();
        assert!(book.is_absent());
    }
}

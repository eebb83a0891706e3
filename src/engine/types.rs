use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Order direction, serialised the way both venues spell it on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    BUY,
    SELL
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::BUY => f.write_str("BUY"),
            Side::SELL => f.write_str("SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" | "B" => Ok(Side::BUY),
            "SELL" | "S" => Ok(Side::SELL),
            other => Err(format!("unknown side '{}', expected buy or sell", other)),
        }
    }
}

// Which half of the book a BookSide holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookSideKind {
    Ask,
    Bid,
}

/// One resting price level. A zero size never rests in a book; inside a
/// delta it marks the level for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    pub fn is_removal(&self) -> bool {
        self.size.is_zero()
    }
}

/// Normalised feed message, produced by a feed adapter and consumed once by
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    // Complete book state; replaces both sides
    Snapshot {
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    },
    // Changed levels only; size 0 removes
    Delta {
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    },
}

impl FeedEvent {
    pub fn level_count(&self) -> usize {
        match self {
            FeedEvent::Snapshot { asks, bids } | FeedEvent::Delta { asks, bids } => asks.len() + bids.len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::Snapshot { .. } => "snapshot",
            FeedEvent::Delta { .. } => "delta",
        }
    }
}

/// What to do when a book is still crossed after one correction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossPolicy {
    /// Drop exactly one colliding best ask / best bid pair per apply.
    #[default]
    SinglePass,
    /// Keep dropping colliding pairs until the book is uncrossed.
    UntilUncrossed,
}

/// Immutable copy of the book handed to consumers.
/// Asks ascend by price, bids descend by price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookView {
    pub asks: Vec<PriceLevel>,
    pub bids: Vec<PriceLevel>,
}

impl BookView {
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    pub fn mid(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some((ask.price + bid.price) / Decimal::TWO),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_from_str() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::BUY);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::SELL);
        assert!("hold".parse::<Side>().is_err());
        assert_eq!(Side::BUY.opposite(), Side::SELL);
    }

    #[test]
    fn test_view_spread_and_mid() {
        let view = BookView {
            asks: vec![PriceLevel::new(dec!(101), dec!(1))],
            bids: vec![PriceLevel::new(dec!(99), dec!(2))],
        };
        assert_eq!(view.spread(), Some(dec!(2)));
        assert_eq!(view.mid(), Some(dec!(100)));

        let one_sided = BookView { asks: vec![], bids: view.bids.clone() };
        assert_eq!(one_sided.spread(), None);
        assert_eq!(one_sided.mid(), None);
    }

    #[test]
    fn test_removal_marker() {
        assert!(PriceLevel::new(dec!(100), dec!(0)).is_removal());
        assert!(!PriceLevel::new(dec!(100), dec!(0.5)).is_removal());
    }
}

//! One half of an order book.
//!
//! Both halves share a single ascending `BTreeMap` layout. Levels are keyed by
//! an encoded price: asks use the price as-is and bids use its negation, so the
//! first entry of either side is always the best level. Encoding and decoding
//! never leave this file; callers only ever see real prices.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::trace;

use crate::engine::types::{BookSideKind, PriceLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSide {
    kind: BookSideKind,
    // encoded key -> level with its original price
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl BookSide {
    pub fn new(kind: BookSideKind) -> Self {
        Self { kind, levels: BTreeMap::new() }
    }

    pub fn asks() -> Self {
        Self::new(BookSideKind::Ask)
    }

    pub fn bids() -> Self {
        Self::new(BookSideKind::Bid)
    }

    pub fn kind(&self) -> BookSideKind {
        self.kind
    }

    fn key(&self, price: Decimal) -> Decimal {
        match self.kind {
            BookSideKind::Ask => price,
            BookSideKind::Bid => -price,
        }
    }

    /// Insert or replace the level resting at `level.price`.
    ///
    /// A non-positive size never rests; it clears the price instead.
    pub(crate) fn upsert(&mut self, level: PriceLevel) {
        if level.size <= Decimal::ZERO {
            self.remove(level.price);
            return;
        }
        let key = self.key(level.price);
        self.levels.insert(key, level);
    }

    /// Remove the level at `price`. Absent prices are ignored.
    pub(crate) fn remove(&mut self, price: Decimal) -> Option<PriceLevel> {
        let key = self.key(price);
        let removed = self.levels.remove(&key);
        if removed.is_none() {
            trace!(side = ?self.kind, %price, "remove on absent level");
        }
        removed
    }

    /// Drop every level and rest the given ones instead.
    pub(crate) fn replace<I>(&mut self, levels: I)
    where
        I: IntoIterator<Item = PriceLevel>,
    {
        self.levels.clear();
        for level in levels {
            if level.size > Decimal::ZERO {
                self.upsert(level);
            }
        }
    }

    pub(crate) fn pop_best(&mut self) -> Option<PriceLevel> {
        self.levels.pop_first().map(|(_, level)| level)
    }

    pub fn best(&self) -> Option<PriceLevel> {
        self.levels.first_key_value().map(|(_, level)| *level)
    }

    /// First `n` levels, best first: asks ascend, bids descend.
    pub fn top(&self, n: usize) -> Vec<PriceLevel> {
        self.levels.values().take(n).copied().collect()
    }

    pub fn get(&self, price: Decimal) -> Option<PriceLevel> {
        self.levels.get(&self.key(price)).copied()
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.levels.contains_key(&self.key(price))
    }

    pub fn levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }

    pub fn total_size(&self) -> Decimal {
        self.levels.values().map(|level| level.size).sum()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

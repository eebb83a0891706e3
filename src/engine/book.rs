use rust_decimal::Decimal;
use tracing::{debug, instrument, trace, warn};

use crate::engine::side::BookSide;
use crate::engine::types::{BookView, CrossPolicy, FeedEvent, PriceLevel};

/// Reconstructed book for one symbol.
///
/// `apply` is the only way to mutate it. Consumers get `BookView` copies and
/// never touch the sides directly.
#[derive(Debug, Clone)]
pub struct OrderBookEngine {
    symbol: String,
    asks: BookSide,
    bids: BookSide,
    policy: CrossPolicy,
    applied: u64,
    corrections: u64,
}

impl OrderBookEngine {
    #[instrument]
    pub fn new(symbol: &str) -> Self {
        Self::with_policy(symbol, CrossPolicy::default())
    }

    pub fn with_policy(symbol: &str, policy: CrossPolicy) -> Self {
        debug!(symbol, ?policy, "Initialized order book engine");
        Self {
            symbol: symbol.to_string(),
            asks: BookSide::asks(),
            bids: BookSide::bids(),
            policy,
            applied: 0,
            corrections: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn policy(&self) -> CrossPolicy {
        self.policy
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    /// Number of events applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Number of colliding pairs removed so far.
    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    /// Apply one feed event, correct any crossing and return the refreshed book.
    #[instrument(level = "trace", skip(self, event), fields(symbol = %self.symbol, kind = event.kind()))]
    pub fn apply(&mut self, event: FeedEvent) -> BookView {
        let levels = event.level_count();
        match event {
            FeedEvent::Snapshot { asks, bids } => {
                self.asks.replace(asks);
                self.bids.replace(bids);
            }
            FeedEvent::Delta { asks, bids } => {
                Self::apply_delta(&mut self.asks, asks);
                Self::apply_delta(&mut self.bids, bids);
            }
        }
        self.applied += 1;

        let removed = match self.policy {
            CrossPolicy::SinglePass => self.uncross(),
            CrossPolicy::UntilUncrossed => {
                let mut total = 0;
                loop {
                    let n = self.uncross();
                    if n == 0 {
                        break;
                    }
                    total += n;
                }
                total
            }
        };
        if removed > 0 {
            metrics::counter!("ccbot_crossed_corrections_total", "symbol" => self.symbol.clone())
                .increment(removed as u64);
        }
        if self.is_crossed() {
            warn!(
                symbol = %self.symbol,
                best_ask = ?self.best_ask(),
                best_bid = ?self.best_bid(),
                "Book still crossed after correction"
            );
        }

        debug!(
            levels,
            ask_levels = self.asks.len(),
            bid_levels = self.bids.len(),
            "Applied feed event"
        );
        self.view()
    }

    fn apply_delta(side: &mut BookSide, levels: Vec<PriceLevel>) {
        for level in levels {
            if level.is_removal() {
                side.remove(level.price);
            } else {
                side.upsert(level);
            }
        }
    }

    /// Remove one colliding best ask / best bid pair if the book is crossed.
    ///
    /// Returns the number of pairs removed (0 or 1). Calling it on an
    /// uncrossed book does nothing. Only `apply` runs it.
    fn uncross(&mut self) -> usize {
        if !self.is_crossed() {
            return 0;
        }
        let ask = self.asks.pop_best();
        let bid = self.bids.pop_best();
        self.corrections += 1;
        debug!(?ask, ?bid, "Removed crossed top of book");
        1
    }

    /// True when the best ask is not strictly above the best bid. A locked
    /// book (ask == bid) counts, so an uncrossed book always has ask > bid.
    pub fn is_crossed(&self) -> bool {
        match (self.asks.best(), self.bids.best()) {
            (Some(ask), Some(bid)) => ask.price <= bid.price,
            _ => false,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        let best = self.asks.best();
        trace!(?best, "Best ask");
        best
    }

    #[instrument(level = "trace", skip(self))]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        let best = self.bids.best();
        trace!(?best, "Best bid");
        best
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Full-depth copy of both sides.
    pub fn view(&self) -> BookView {
        BookView {
            asks: self.asks.levels().copied().collect(),
            bids: self.bids.levels().copied().collect(),
        }
    }

    /// Copy of the best `n` levels on each side.
    pub fn depth(&self, n: usize) -> BookView {
        BookView { asks: self.asks.top(n), bids: self.bids.top(n) }
    }
}

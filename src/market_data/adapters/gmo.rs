// GMO Coin public orderbooks adapter (full snapshot feed)

use serde_json::json;
use tracing::trace;

use super::gmo_types::OrderbooksFrame;
use super::{FeedAdapter, FeedError, Venue};
use crate::engine::types::FeedEvent;
use crate::market_data::normaliser::normalise_snapshot_side;

pub struct GmoAdapter {
    pub symbol: String, // e.g. "BTC", "BTC_JPY"
    pub ws_url: String,
}

impl GmoAdapter {
    pub fn new(symbol: &str) -> Self {
        Self { symbol: symbol.to_string(), ws_url: Venue::Gmo.ws_url().into() }
    }

    pub fn with_ws_url(mut self, ws_url: &str) -> Self {
        self.ws_url = ws_url.to_string();
        self
    }
}

impl FeedAdapter for GmoAdapter {
    fn venue(&self) -> Venue {
        Venue::Gmo
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn ws_url(&self) -> &str {
        &self.ws_url
    }

    fn subscription(&self) -> serde_json::Value {
        json!({
            "command": "subscribe",
            "channel": "orderbooks",
            "symbol": self.symbol
        })
    }

    fn parse(&self, raw: &str) -> Result<Option<FeedEvent>, FeedError> {
        let frame: OrderbooksFrame = serde_json::from_str(raw)?;

        if let Some(error) = frame.error {
            return Err(FeedError::VenueError(error));
        }
        if let Some(channel) = frame.channel.as_deref() {
            if channel != "orderbooks" {
                trace!(channel, "Ignoring frame for another channel");
                return Ok(None);
            }
        }
        if frame.channel.is_none() && frame.book.is_absent() {
            trace!(raw, "Ignoring frame without book data");
            return Ok(None);
        }
        trace!(symbol = ?frame.symbol, timestamp = ?frame.timestamp, "Orderbooks frame");

        let (asks, bids) = frame.book.snapshot_sides()?;
        Ok(Some(FeedEvent::Snapshot {
            asks: normalise_snapshot_side(asks)?,
            bids: normalise_snapshot_side(bids)?,
        }))
    }
}

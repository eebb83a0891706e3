// bitFlyer Lightning realtime board adapter (incremental diff feed)

use serde_json::json;
use tracing::{debug, trace};

use super::bitflyer_types::{ChannelMessage, RpcFrame};
use super::{FeedAdapter, FeedError, Venue};
use crate::engine::types::FeedEvent;
use crate::market_data::normaliser::{normalise_delta_side, normalise_snapshot_side};

pub struct BitflyerAdapter {
    pub symbol: String,       // e.g. "BTC_JPY", "FX_BTC_JPY"
    pub ws_url: String,
    board_channel: String,    // "lightning_board_<symbol>"
    snapshot_channel: String, // "lightning_board_snapshot_<symbol>"
}

impl BitflyerAdapter {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ws_url: Venue::Bitflyer.ws_url().into(),
            board_channel: format!("lightning_board_{}", symbol),
            snapshot_channel: format!("lightning_board_snapshot_{}", symbol),
        }
    }

    pub fn with_ws_url(mut self, ws_url: &str) -> Self {
        self.ws_url = ws_url.to_string();
        self
    }

    pub fn board_channel(&self) -> &str {
        &self.board_channel
    }
}

impl FeedAdapter for BitflyerAdapter {
    fn venue(&self) -> Venue {
        Venue::Bitflyer
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn ws_url(&self) -> &str {
        &self.ws_url
    }

    fn subscription(&self) -> serde_json::Value {
        json!({
            "method": "subscribe",
            "params": { "channel": self.board_channel }
        })
    }

    fn parse(&self, raw: &str) -> Result<Option<FeedEvent>, FeedError> {
        let frame: RpcFrame = serde_json::from_str(raw)?;

        if let Some(error) = frame.error {
            return Err(FeedError::VenueError(error.to_string()));
        }
        if frame.method.as_deref() != Some("channelMessage") {
            trace!(raw, "Ignoring non-channel frame");
            return Ok(None);
        }
        let params = frame.params.ok_or_else(|| FeedError::MalformedFeedMessage {
            reason: "channelMessage without params".into(),
        })?;
        let msg: ChannelMessage = serde_json::from_value(params)?;

        if msg.channel == self.board_channel {
            let (asks, bids) = msg.message.book.delta_sides();
            Ok(Some(FeedEvent::Delta {
                asks: normalise_delta_side(asks)?,
                bids: normalise_delta_side(bids)?,
            }))
        } else if msg.channel == self.snapshot_channel {
            let (asks, bids) = msg.message.book.snapshot_sides()?;
            Ok(Some(FeedEvent::Snapshot {
                asks: normalise_snapshot_side(asks)?,
                bids: normalise_snapshot_side(bids)?,
            }))
        } else {
            debug!(channel = %msg.channel, "Ignoring message for another channel");
            Ok(None)
        }
    }
}

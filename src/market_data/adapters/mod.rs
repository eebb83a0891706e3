// Shared trait + error for venue feed adapters
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::types::FeedEvent;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed message: {reason}")]
    MalformedFeedMessage { reason: String },
    #[error("venue reported an error: {0}")]
    VenueError(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::MalformedFeedMessage { reason: e.to_string() }
    }
}

/// How a venue's book messages relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Every message is the complete book.
    SnapshotReplace,
    /// Every message carries changed levels only.
    IncrementalDiff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Bitflyer,
    Gmo,
}

impl Venue {
    pub fn ws_url(&self) -> &'static str {
        match self {
            Venue::Bitflyer => "wss://ws.lightstream.bitflyer.com/json-rpc",
            Venue::Gmo => "wss://api.coin.z.com/ws/public/v1",
        }
    }

    pub fn rest_url(&self) -> &'static str {
        match self {
            Venue::Bitflyer => "https://api.bitflyer.com",
            Venue::Gmo => "https://api.coin.z.com/private",
        }
    }

    pub fn feed_mode(&self) -> FeedMode {
        match self {
            Venue::Bitflyer => FeedMode::IncrementalDiff,
            Venue::Gmo => FeedMode::SnapshotReplace,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Bitflyer => f.write_str("bitflyer"),
            Venue::Gmo => f.write_str("gmo"),
        }
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitflyer" => Ok(Venue::Bitflyer),
            "gmo" | "gmocoin" => Ok(Venue::Gmo),
            other => Err(format!("unknown venue '{}', expected bitflyer or gmo", other)),
        }
    }
}

/// Turns one venue's raw feed frames into normalised book events.
///
/// Adapters hold no book state, so a fresh one can be built per connection.
pub trait FeedAdapter: Send {
    fn venue(&self) -> Venue;

    fn symbol(&self) -> &str;

    fn ws_url(&self) -> &str;

    /// Control message sent once right after connecting.
    fn subscription(&self) -> serde_json::Value;

    /// Parse one text frame. `Ok(None)` means the frame carried no book data
    /// (subscribe acks, other channels).
    fn parse(&self, raw: &str) -> Result<Option<FeedEvent>, FeedError>;

    fn feed_mode(&self) -> FeedMode {
        self.venue().feed_mode()
    }
}

pub mod types;
pub mod bitflyer;
pub mod bitflyer_types;
pub mod gmo;
pub mod gmo_types;

pub use bitflyer::BitflyerAdapter;
pub use gmo::GmoAdapter;

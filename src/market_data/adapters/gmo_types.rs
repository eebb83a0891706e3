// Source: wss://api.coin.z.com/ws/public/v1 (orderbooks channel)
use super::types::WireBook;

// Every orderbooks frame is a full board. The venue reports problems such as
// rate limiting with a bare {"error": "..."} frame.
#[derive(Debug, serde::Deserialize)]
pub struct OrderbooksFrame {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub book: WireBook,
}

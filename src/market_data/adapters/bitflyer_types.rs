// Source: wss://ws.lightstream.bitflyer.com/json-rpc (lightning_board_* channels)
use serde_json::Value;

use super::types::WireBook;

// Outer JSON-RPC 2.0 frame. Data frames carry method "channelMessage";
// subscribe replies carry "result" or "error" instead.
#[derive(Debug, serde::Deserialize)]
pub struct RpcFrame {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub message: BoardMessage,
}

#[derive(Debug, serde::Deserialize)]
pub struct BoardMessage {
    #[serde(flatten)]
    pub book: WireBook,
}

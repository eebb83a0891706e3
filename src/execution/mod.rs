// Authenticated trading actions against venue REST endpoints
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::types::Side;

pub mod signing;  // HMAC-SHA256 request signatures
pub mod rest;     // signed GET/POST plumbing shared by venues
pub mod bitflyer; // bitFlyer Lightning private API
pub mod gmo;      // GMO Coin private API

pub use bitflyer::BitflyerGateway;
pub use gmo::GmoGateway;
pub use signing::{Credentials, Signer};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("request failed with status {status_code}: {body}")]
    RequestFailed { status_code: u16, body: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode venue response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("could not sign request: {0}")]
    Signing(String),
}

impl From<serde_json::Error> for ExecutionError {
    fn from(e: serde_json::Error) -> Self {
        ExecutionError::Decode(e.to_string())
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

pub type OrderId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
        }
    }
}

/// Side and size of the replacement order when a venue changes an order by
/// cancelling and resubmitting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resubmit {
    pub side: Side,
    pub size: Decimal,
}

#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Place an order. `price` is omitted for market orders.
    async fn submit_order(&self, side: Side, size: Decimal, price: Option<Decimal>) -> ExecutionResult<OrderId>;

    async fn cancel_order(&self, order_id: &str) -> ExecutionResult<()>;

    /// Change an order's price. Returns the id of the order that is live
    /// afterwards, if any.
    async fn change_order(
        &self,
        order_id: &str,
        price: Option<Decimal>,
        resubmit: Option<Resubmit>,
    ) -> ExecutionResult<Option<OrderId>>;

    /// Close `size` of an open position (or offset an order) on `side`.
    async fn settle_position(
        &self,
        side: Side,
        size: Decimal,
        position_or_order_id: &str,
        price: Option<Decimal>,
    ) -> ExecutionResult<OrderId>;

    /// Total open position size.
    async fn get_position(&self) -> ExecutionResult<Decimal>;

    /// Available balance in whole currency units.
    async fn get_available_balance(&self) -> ExecutionResult<i64>;

    async fn list_open_order_ids(&self) -> ExecutionResult<Vec<OrderId>>;

    async fn list_open_position_ids(&self) -> ExecutionResult<Vec<String>>;

    async fn count_open_orders(&self) -> ExecutionResult<usize>;
}

// bitFlyer Lightning private API.
// Orders are changed by cancelling and resubmitting; settlement is a plain
// counter order.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::rest::{id_string, AuthHeaders, RestClient};
use super::signing::{Credentials, Signer};
use super::{ExecutionError, ExecutionGateway, ExecutionResult, OrderId, OrderType, Resubmit};
use crate::engine::types::Side;
use crate::market_data::adapters::Venue;
use crate::market_data::normaliser::decimal_from_value;

const HEADERS: AuthHeaders = AuthHeaders {
    key: "ACCESS-KEY",
    timestamp: "ACCESS-TIMESTAMP",
    signature: "ACCESS-SIGN",
    content_type_on_get: true,
};

pub struct BitflyerGateway {
    pub product_code: String, // e.g. "FX_BTC_JPY"
    pub order_type: OrderType,
    client: RestClient,
}

impl BitflyerGateway {
    pub fn new(product_code: &str, order_type: OrderType, credentials: Credentials) -> Self {
        Self::with_base_url(Venue::Bitflyer.rest_url(), product_code, order_type, credentials)
    }

    pub fn with_base_url(base_url: &str, product_code: &str, order_type: OrderType, credentials: Credentials) -> Self {
        Self {
            product_code: product_code.to_string(),
            order_type,
            client: RestClient::new(base_url, Signer::new(credentials), HEADERS),
        }
    }

    async fn active_orders(&self) -> ExecutionResult<Vec<Value>> {
        let path = format!(
            "/v1/me/getchildorders?product_code={}&child_order_state=ACTIVE",
            self.product_code
        );
        match self.client.get(&path, &[]).await? {
            Value::Array(orders) => Ok(orders),
            Value::Null => Ok(Vec::new()),
            other => Err(ExecutionError::Decode(format!("expected an order list, got {}", other))),
        }
    }
}

// bitFlyer takes sizes and prices as JSON numbers
fn number(value: Decimal) -> ExecutionResult<Value> {
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ExecutionError::InvalidRequest(format!("{} is not representable as a number", value)))
}

#[async_trait]
impl ExecutionGateway for BitflyerGateway {
    async fn submit_order(&self, side: Side, size: Decimal, price: Option<Decimal>) -> ExecutionResult<OrderId> {
        let mut body = Map::new();
        body.insert("product_code".into(), json!(self.product_code));
        body.insert("child_order_type".into(), json!(self.order_type.as_str()));
        body.insert("side".into(), json!(side));
        body.insert("size".into(), number(size)?);
        if let Some(price) = price {
            body.insert("price".into(), number(price)?);
        }

        let response = self.client.post("/v1/me/sendchildorder", &Value::Object(body)).await?;
        let id = response
            .get("child_order_acceptance_id")
            .and_then(id_string)
            .ok_or_else(|| ExecutionError::Decode(format!("no child_order_acceptance_id in {}", response)))?;
        info!(%id, %side, %size, ?price, "Order accepted");
        Ok(id)
    }

    async fn cancel_order(&self, order_id: &str) -> ExecutionResult<()> {
        let body = json!({
            "product_code": self.product_code,
            "child_order_acceptance_id": order_id,
        });
        self.client.post("/v1/me/cancelchildorder", &body).await?;
        info!(order_id, "Order cancelled");
        Ok(())
    }

    async fn change_order(
        &self,
        order_id: &str,
        price: Option<Decimal>,
        resubmit: Option<Resubmit>,
    ) -> ExecutionResult<Option<OrderId>> {
        self.cancel_order(order_id).await?;
        match resubmit {
            Some(Resubmit { side, size }) => Ok(Some(self.submit_order(side, size, price).await?)),
            None => Ok(None),
        }
    }

    async fn settle_position(
        &self,
        side: Side,
        size: Decimal,
        position_or_order_id: &str,
        price: Option<Decimal>,
    ) -> ExecutionResult<OrderId> {
        debug!(position_or_order_id, "bitFlyer settles with a counter order; id unused");
        self.submit_order(side, size, price).await
    }

    async fn get_position(&self) -> ExecutionResult<Decimal> {
        let path = format!("/v1/me/getpositions?product_code={}", self.product_code);
        let positions = match self.client.get(&path, &[]).await? {
            Value::Array(positions) => positions,
            Value::Null => Vec::new(),
            other => return Err(ExecutionError::Decode(format!("expected a position list, got {}", other))),
        };
        let mut total = Decimal::ZERO;
        for position in &positions {
            total += position
                .get("size")
                .and_then(decimal_from_value)
                .ok_or_else(|| ExecutionError::Decode(format!("position without size: {}", position)))?;
        }
        Ok(total)
    }

    async fn get_available_balance(&self) -> ExecutionResult<i64> {
        let collateral = self.client.get("/v1/me/getcollateral", &[]).await?;
        collateral
            .get("collateral")
            .and_then(decimal_from_value)
            .and_then(|c| c.trunc().to_i64())
            .ok_or_else(|| ExecutionError::Decode(format!("no collateral in {}", collateral)))
    }

    async fn list_open_order_ids(&self) -> ExecutionResult<Vec<OrderId>> {
        Ok(self
            .active_orders()
            .await?
            .iter()
            .filter_map(|order| order.get("child_order_acceptance_id").and_then(id_string))
            .collect())
    }

    async fn list_open_position_ids(&self) -> ExecutionResult<Vec<String>> {
        // positions are not addressable by id here; open orders stand in for them
        self.list_open_order_ids().await
    }

    async fn count_open_orders(&self) -> ExecutionResult<usize> {
        Ok(self.active_orders().await?.len())
    }
}

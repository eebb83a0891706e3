// GMO Coin private API.
// Price changes are an atomic amend; settlement closes a specific position.
// Every response is wrapped as {"status": 0, "data": ...}; a non-zero status
// is a rejection even when the HTTP status is 200.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::rest::{id_string, AuthHeaders, RestClient};
use super::signing::{Credentials, Signer};
use super::{ExecutionError, ExecutionGateway, ExecutionResult, OrderId, OrderType, Resubmit};
use crate::engine::types::Side;
use crate::market_data::adapters::Venue;
use crate::market_data::normaliser::decimal_from_value;

const HEADERS: AuthHeaders = AuthHeaders {
    key: "API-KEY",
    timestamp: "API-TIMESTAMP",
    signature: "API-SIGN",
    content_type_on_get: false,
};

pub struct GmoGateway {
    pub symbol: String, // e.g. "BTC_JPY"
    pub order_type: OrderType,
    client: RestClient,
}

impl GmoGateway {
    pub fn new(symbol: &str, order_type: OrderType, credentials: Credentials) -> Self {
        Self::with_base_url(Venue::Gmo.rest_url(), symbol, order_type, credentials)
    }

    pub fn with_base_url(base_url: &str, symbol: &str, order_type: OrderType, credentials: Credentials) -> Self {
        Self {
            symbol: symbol.to_string(),
            order_type,
            client: RestClient::new(base_url, Signer::new(credentials), HEADERS),
        }
    }

    async fn get_data(&self, path: &str, query: &[(&str, String)]) -> ExecutionResult<Value> {
        unwrap_envelope(self.client.get(path, query).await?)
    }

    async fn post_data(&self, path: &str, body: &Value) -> ExecutionResult<Value> {
        unwrap_envelope(self.client.post(path, body).await?)
    }

    // data.list of a paged endpoint; an empty book comes back as "data": {}
    async fn list(&self, path: &str) -> ExecutionResult<Vec<Value>> {
        let data = self.get_data(path, &[("symbol", self.symbol.clone())]).await?;
        Ok(data.get("list").and_then(Value::as_array).cloned().unwrap_or_default())
    }

    fn returned_id(data: &Value) -> ExecutionResult<OrderId> {
        id_string(data).ok_or_else(|| ExecutionError::Decode(format!("no id in response data {}", data)))
    }
}

fn unwrap_envelope(response: Value) -> ExecutionResult<Value> {
    match response.get("status").and_then(Value::as_i64) {
        Some(0) => Ok(response.get("data").cloned().unwrap_or(Value::Null)),
        _ => {
            warn!(%response, "GMO rejected request");
            Err(ExecutionError::RequestFailed { status_code: 200, body: response.to_string() })
        }
    }
}

// GMO order ids are numeric on the wire
fn order_id_value(order_id: &str) -> Value {
    match order_id.parse::<u64>() {
        Ok(n) => json!(n),
        Err(_) => json!(order_id),
    }
}

fn collect_ids(items: &[Value], field: &str) -> Vec<String> {
    items.iter().filter_map(|item| item.get(field).and_then(id_string)).collect()
}

#[async_trait]
impl ExecutionGateway for GmoGateway {
    async fn submit_order(&self, side: Side, size: Decimal, price: Option<Decimal>) -> ExecutionResult<OrderId> {
        let mut body = Map::new();
        body.insert("symbol".into(), json!(self.symbol));
        body.insert("side".into(), json!(side));
        body.insert("executionType".into(), json!(self.order_type.as_str()));
        body.insert("size".into(), json!(size.to_string()));
        if let Some(price) = price {
            body.insert("price".into(), json!(price.to_string()));
        }

        let data = self.post_data("/v1/order", &Value::Object(body)).await?;
        let id = Self::returned_id(&data)?;
        info!(%id, %side, %size, ?price, "Order accepted");
        Ok(id)
    }

    async fn cancel_order(&self, order_id: &str) -> ExecutionResult<()> {
        self.post_data("/v1/cancelOrder", &json!({ "orderId": order_id_value(order_id) }))
            .await?;
        info!(order_id, "Order cancelled");
        Ok(())
    }

    async fn change_order(
        &self,
        order_id: &str,
        price: Option<Decimal>,
        _resubmit: Option<Resubmit>,
    ) -> ExecutionResult<Option<OrderId>> {
        let price = price.ok_or_else(|| ExecutionError::InvalidRequest("GMO order changes need a price".into()))?;
        let body = json!({
            "orderId": order_id_value(order_id),
            "price": price.to_string(),
        });
        self.post_data("/v1/changeOrder", &body).await?;
        info!(order_id, %price, "Order price changed");
        Ok(Some(order_id.to_string()))
    }

    async fn settle_position(
        &self,
        side: Side,
        size: Decimal,
        position_or_order_id: &str,
        price: Option<Decimal>,
    ) -> ExecutionResult<OrderId> {
        let mut body = Map::new();
        body.insert("symbol".into(), json!(self.symbol));
        body.insert("side".into(), json!(side));
        body.insert("executionType".into(), json!(self.order_type.as_str()));
        body.insert(
            "settlePosition".into(),
            json!([{ "positionId": order_id_value(position_or_order_id), "size": size.to_string() }]),
        );
        if let Some(price) = price {
            body.insert("price".into(), json!(price.to_string()));
        }

        let data = self.post_data("/v1/closeOrder", &Value::Object(body)).await?;
        let id = Self::returned_id(&data)?;
        info!(%id, position_id = position_or_order_id, "Settlement order accepted");
        Ok(id)
    }

    async fn get_position(&self) -> ExecutionResult<Decimal> {
        let mut total = Decimal::ZERO;
        for position in self.list("/v1/openPositions").await? {
            total += position
                .get("size")
                .and_then(decimal_from_value)
                .ok_or_else(|| ExecutionError::Decode(format!("position without size: {}", position)))?;
        }
        Ok(total)
    }

    async fn get_available_balance(&self) -> ExecutionResult<i64> {
        let data = self.get_data("/v1/account/assets", &[]).await?;
        let assets = data.as_array().map(Vec::as_slice).unwrap_or_default();
        let jpy = assets
            .iter()
            .find(|asset| asset.get("symbol").and_then(Value::as_str) == Some("JPY"))
            .or_else(|| assets.first());
        jpy.and_then(|asset| asset.get("available"))
            .and_then(decimal_from_value)
            .and_then(|available| available.trunc().to_i64())
            .ok_or_else(|| ExecutionError::Decode(format!("no available balance in {}", data)))
    }

    async fn list_open_order_ids(&self) -> ExecutionResult<Vec<OrderId>> {
        Ok(collect_ids(&self.list("/v1/activeOrders").await?, "orderId"))
    }

    async fn list_open_position_ids(&self) -> ExecutionResult<Vec<String>> {
        Ok(collect_ids(&self.list("/v1/openPositions").await?, "positionId"))
    }

    async fn count_open_orders(&self) -> ExecutionResult<usize> {
        Ok(self.list("/v1/activeOrders").await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        assert_eq!(unwrap_envelope(json!({"status": 0, "data": "637000"})).unwrap(), json!("637000"));
        assert_eq!(unwrap_envelope(json!({"status": 0})).unwrap(), Value::Null);
        let err = unwrap_envelope(json!({"status": 1, "messages": [{"message_code": "ERR-201"}]})).unwrap_err();
        assert!(matches!(err, ExecutionError::RequestFailed { status_code: 200, ref body } if body.contains("ERR-201")));
    }

    #[test]
    fn test_order_id_value() {
        assert_eq!(order_id_value("637000"), json!(637000));
        assert_eq!(order_id_value("abc"), json!("abc"));
    }
}

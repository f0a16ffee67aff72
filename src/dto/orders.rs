use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::Order,
    services::order_service::{OrderItemInput, PlaceOrderInput},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i32,
    /// Fraction in `[0, 1]`; `0.25` is a quarter off.
    #[schema(value_type = Option<String>, example = "0.25")]
    pub discount: Option<Decimal>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub user_id: i64,
    pub note: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

impl From<PlaceOrderRequest> for PlaceOrderInput {
    fn from(req: PlaceOrderRequest) -> Self {
        Self {
            user_id: req.user_id,
            note: req.note.unwrap_or_default(),
            items: req
                .items
                .into_iter()
                .map(|item| OrderItemInput {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    discount: item.discount.unwrap_or(Decimal::ZERO),
                    note: item.note.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_body_with_defaults() {
        let req: PlaceOrderRequest = serde_json::from_value(serde_json::json!({
            "user_id": 2,
            "items": [
                { "product_id": 1, "quantity": 10 },
                { "product_id": 3, "quantity": 20, "discount": "0.5", "note": "gift" }
            ]
        }))
        .unwrap();

        let input = PlaceOrderInput::from(req);
        assert_eq!(input.user_id, 2);
        assert_eq!(input.note, "");
        assert_eq!(input.items[0].discount, Decimal::ZERO);
        assert_eq!(input.items[1].discount, Decimal::new(5, 1));
        assert_eq!(input.items[1].note, "gift");
    }
}

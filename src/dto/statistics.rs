use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::OrderStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivityCount {
    pub total: u64,
    pub total_inactive: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderStatusCount {
    pub total_new: u64,
    pub total_pending: u64,
    pub total_success: u64,
    pub total_failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LatestOrder {
    pub order_id: i64,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub user_id: i64,
    /// Sum of price × quantity × (1 − discount) over the order's items.
    #[schema(value_type = String, example = "5700.00")]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Statistics {
    pub users: ActivityCount,
    pub products: ActivityCount,
    pub orders: OrderStatusCount,
    pub latest_orders: Vec<LatestOrder>,
}

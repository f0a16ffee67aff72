use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;

use crate::{
    db::DbPool,
    dto::statistics::{ActivityCount, LatestOrder, OrderStatusCount, Statistics},
    entity::OrderStatus,
    error::{AppError, AppResult},
    repository::{ActivitySummary, Repositories},
};

pub const LATEST_ORDERS_LIMIT: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct LatestOrderRow {
    order_id: i64,
    order_number: String,
    order_date: DateTime<Utc>,
    status: String,
    user_id: i64,
    total: Decimal,
}

impl TryFrom<LatestOrderRow> for LatestOrder {
    type Error = AppError;

    fn try_from(row: LatestOrderRow) -> AppResult<Self> {
        let status = OrderStatus::try_from_value(&row.status).map_err(|_| {
            AppError::Internal(anyhow::anyhow!("unknown order status {:?}", row.status))
        })?;
        Ok(Self {
            order_id: row.order_id,
            order_number: row.order_number,
            order_date: row.order_date,
            status,
            user_id: row.user_id,
            total: row.total,
        })
    }
}

impl From<ActivitySummary> for ActivityCount {
    fn from(summary: ActivitySummary) -> Self {
        Self {
            total: summary.total,
            total_inactive: summary.total_inactive,
        }
    }
}

/// Fold `(status, count)` rows into per-status totals. Unknown statuses
/// are skipped.
pub fn summarize_status_counts(rows: &[(String, i64)]) -> OrderStatusCount {
    let mut counts = OrderStatusCount::default();
    for (status, count) in rows {
        let count = u64::try_from(*count).unwrap_or_default();
        match OrderStatus::try_from_value(status) {
            Ok(OrderStatus::New) => counts.total_new += count,
            Ok(OrderStatus::Pending) => counts.total_pending += count,
            Ok(OrderStatus::Success) => counts.total_success += count,
            Ok(OrderStatus::Failed) => counts.total_failed += count,
            Err(_) => tracing::warn!(status = %status, "skipping unknown order status"),
        }
    }
    counts
}

pub async fn get_statistics(
    repo: &Repositories,
    pool: &DbPool,
    latest_limit: i64,
) -> AppResult<Statistics> {
    let users = repo.user().statistics().await?;
    let products = repo.product().statistics().await?;

    let status_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .fetch_all(pool)
            .await?;

    let latest_rows: Vec<LatestOrderRow> = sqlx::query_as(
        r#"
        SELECT o.id AS order_id, o.order_number, o.order_date, o.status, o.user_id,
               COALESCE(SUM(oi.product_price * oi.quantity * (1 - oi.discount)), 0) AS total
        FROM orders o
        LEFT JOIN order_items oi ON oi.order_id = o.id
        GROUP BY o.id
        ORDER BY o.order_date DESC, o.id DESC
        LIMIT $1
        "#,
    )
    .bind(latest_limit)
    .fetch_all(pool)
    .await?;

    let latest_orders = latest_rows
        .into_iter()
        .map(LatestOrder::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Statistics {
        users: users.into(),
        products: products.into(),
        orders: summarize_status_counts(&status_rows),
        latest_orders,
    })
}

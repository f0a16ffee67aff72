use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    entity::{
        OrderItems, OrderStatus, Orders,
        order_items::{self, ActiveModel as OrderItemActive},
        orders::{ActiveModel as OrderActive, Column, Model},
    },
    error::AppResult,
    query::{
        ListQuery, SortDirection, SortField, apply_pagination, apply_sort, non_blank, positive_id,
    },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub id: Option<i64>,
    pub order_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSortField {
    OrderDate,
    CreatedAt,
}

impl SortField for OrderSortField {
    type Column = Column;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "order_date" => Some(OrderSortField::OrderDate),
            "created_at" => Some(OrderSortField::CreatedAt),
            _ => None,
        }
    }

    fn column(&self) -> Column {
        match self {
            OrderSortField::OrderDate => Column::OrderDate,
            OrderSortField::CreatedAt => Column::CreatedAt,
        }
    }
}

pub type OrderListQuery = ListQuery<OrderFilter, OrderSortField>;

/// Order header as inserted by the order workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub note: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub product_price: Decimal,
    pub product_name: String,
    pub quantity: i32,
    pub discount: Decimal,
    pub note: String,
}

/// An order header with all of its line items.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order: Model,
    pub items: Vec<order_items::Model>,
}

#[automock]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order header inside `txn` and return the stored row.
    async fn create_order(&self, txn: &DatabaseTransaction, order: NewOrder) -> AppResult<Model>;

    /// Insert one line item inside `txn`.
    async fn create_item(&self, txn: &DatabaseTransaction, item: NewOrderItem) -> AppResult<()>;

    /// Filtered page of orders with their items, plus the filtered total.
    async fn list_orders(&self, query: &OrderListQuery) -> AppResult<(Vec<OrderRecord>, u64)>;
}

#[derive(Debug, Clone)]
pub struct SeaOrderRepository {
    conn: Arc<DatabaseConnection>,
}

impl SeaOrderRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

pub(crate) fn order_condition(filter: &OrderFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(id) = positive_id(filter.id) {
        condition = condition.add(Column::Id.eq(id));
    }
    if let Some(order_number) = non_blank(&filter.order_number) {
        condition = condition.add(Column::OrderNumber.eq(order_number));
    }
    if let Some(user_id) = positive_id(filter.user_id) {
        condition = condition.add(Column::UserId.eq(user_id));
    }
    if let Some(status) = filter.status {
        condition = condition.add(Column::Status.eq(status));
    }
    condition
}

#[async_trait]
impl OrderRepository for SeaOrderRepository {
    async fn create_order(&self, txn: &DatabaseTransaction, order: NewOrder) -> AppResult<Model> {
        let active = OrderActive {
            order_number: Set(order.order_number),
            order_date: Set(order.order_date.into()),
            status: Set(order.status),
            note: Set(order.note),
            user_id: Set(order.user_id),
            ..Default::default()
        };
        Ok(active.insert(txn).await?)
    }

    async fn create_item(&self, txn: &DatabaseTransaction, item: NewOrderItem) -> AppResult<()> {
        let active = OrderItemActive {
            order_id: Set(item.order_id),
            product_id: Set(item.product_id),
            product_price: Set(item.product_price),
            product_name: Set(item.product_name),
            quantity: Set(item.quantity),
            discount: Set(item.discount),
            note: Set(item.note),
            ..Default::default()
        };
        OrderItems::insert(active).exec(txn).await?;
        Ok(())
    }

    async fn list_orders(&self, query: &OrderListQuery) -> AppResult<(Vec<OrderRecord>, u64)> {
        let finder = Orders::find().filter(order_condition(&query.filter));

        let total = finder.clone().count(&*self.conn).await?;

        let finder = apply_sort(
            finder,
            &query.sort,
            (Column::UpdatedAt, SortDirection::Desc),
            Column::Id,
        );
        let orders = apply_pagination(finder, query.page)
            .all(&*self.conn)
            .await?;

        if orders.is_empty() {
            return Ok((Vec::new(), total));
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<i64, Vec<order_items::Model>> = HashMap::new();
        for item in OrderItems::find()
            .filter(order_items::Column::OrderId.is_in(ids))
            .order_by_asc(order_items::Column::Id)
            .all(&*self.conn)
            .await?
        {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let records = orders
            .into_iter()
            .map(|order| OrderRecord {
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect();

        Ok((records, total))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DbBackend, MockDatabase, QueryTrait, Value};

    use super::*;
    use crate::query::PageRequest;

    #[tokio::test]
    async fn page_past_the_end_is_empty_with_full_total() {
        let conn = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([[BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(3)),
            )])]])
            .append_query_results([Vec::<Model>::new()])
            .into_connection();
        let repo = SeaOrderRepository::new(Arc::new(conn));

        let query = OrderListQuery {
            page: PageRequest {
                page: 100,
                limit: 20,
            },
            ..Default::default()
        };
        let (orders, total) = repo.list_orders(&query).await.unwrap();

        assert!(orders.is_empty());
        assert_eq!(total, 3);
    }

    #[test]
    fn status_and_user_filters_are_and_combined() {
        let sql = Orders::find()
            .filter(order_condition(&OrderFilter {
                status: Some(OrderStatus::New),
                user_id: Some(10),
                ..Default::default()
            }))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(
            sql.contains(r#"WHERE "orders"."user_id" = 10 AND "orders"."status" = 'NEW'"#),
            "{sql}"
        );
    }

    #[test]
    fn zero_valued_filters_match_everything() {
        let sql = Orders::find()
            .filter(order_condition(&OrderFilter {
                id: Some(0),
                order_number: Some(String::new()),
                status: None,
                user_id: Some(0),
            }))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(!sql.contains("WHERE"), "{sql}");
    }
}

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    entity::OrderStatus,
    error::{AppError, AppResult},
    models::Order,
    repository::{NewOrder, NewOrderItem, OrderListQuery, Repositories},
};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
    pub discount: Decimal,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrderInput {
    pub user_id: i64,
    pub note: String,
    pub items: Vec<OrderItemInput>,
}

impl PlaceOrderInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.user_id <= 0 {
            return Err(AppError::BadRequest("user id is invalid".into()));
        }
        if self.items.is_empty() {
            return Err(AppError::BadRequest("items cannot be blank".into()));
        }
        for item in &self.items {
            if item.product_id <= 0 {
                return Err(AppError::BadRequest("product id is invalid".into()));
            }
            if item.quantity <= 0 {
                return Err(AppError::BadRequest("quantity is invalid".into()));
            }
            if item.discount < Decimal::ZERO || item.discount > Decimal::ONE {
                return Err(AppError::BadRequest("discount is invalid".into()));
            }
        }
        Ok(())
    }
}

/// An item whose product has been resolved, carrying the catalog title and
/// price as they were when the order was placed.
struct PricedItem {
    input: OrderItemInput,
    product_name: String,
    product_price: Decimal,
}

/// Place an order for `input.user_id`.
///
/// The user and every product are looked up before anything is written;
/// a missing one fails the call with [`AppError::UserNotExist`] or
/// [`AppError::ProductNotExist`]. The header and all items are then
/// inserted in a single transaction, so either the whole order is stored
/// or nothing is.
///
/// Product reads happen outside the transaction: a product repriced or
/// deleted between the read and the insert is not detected.
pub async fn place_order(repo: &Repositories, input: PlaceOrderInput) -> AppResult<()> {
    input.validate()?;

    if !repo.user().exists_by_id(input.user_id).await? {
        return Err(AppError::UserNotExist);
    }

    let mut priced = Vec::with_capacity(input.items.len());
    for item in input.items {
        let product = repo
            .product()
            .get_product(item.product_id)
            .await?
            .ok_or(AppError::ProductNotExist)?;
        priced.push(PricedItem {
            input: item,
            product_name: product.title,
            product_price: product.price,
        });
    }

    let order_number = Uuid::new_v4().to_string();
    let header = NewOrder {
        order_number: order_number.clone(),
        order_date: Utc::now(),
        status: OrderStatus::New,
        note: input.note,
        user_id: input.user_id,
    };
    let item_count = priced.len();
    let orders = Arc::clone(repo.order());

    repo.tx(move |txn| {
        Box::pin(async move {
            let order = orders
                .create_order(txn, header)
                .await
                .map_err(|err| AppError::context("error when create order", err))?;

            for item in priced {
                orders
                    .create_item(
                        txn,
                        NewOrderItem {
                            order_id: order.id,
                            product_id: item.input.product_id,
                            product_price: item.product_price,
                            product_name: item.product_name,
                            quantity: item.input.quantity,
                            discount: item.input.discount,
                            note: item.input.note,
                        },
                    )
                    .await
                    .map_err(|err| AppError::context("error when create order item", err))?;
            }

            Ok(())
        })
    })
    .await?;

    tracing::info!(
        order_number = %order_number,
        user_id = input.user_id,
        items = item_count,
        "order placed"
    );
    Ok(())
}

/// List orders with their items. The total counts every order matching
/// the filter, not just the returned page.
pub async fn list_orders(
    repo: &Repositories,
    query: &OrderListQuery,
) -> AppResult<(Vec<Order>, u64)> {
    let (records, total) = repo.order().list_orders(query).await?;
    let orders = records.into_iter().map(Order::from).collect();
    Ok((orders, total))
}

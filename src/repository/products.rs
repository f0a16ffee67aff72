use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set,
};

use crate::{
    entity::{
        Products, Users,
        products::{ActiveModel, Column, Model},
        users,
    },
    error::AppResult,
    query::{
        ListQuery, SortDirection, SortField, apply_pagination, apply_sort, non_blank, positive_id,
    },
    repository::ActivitySummary,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Title,
    Price,
    Quantity,
    CreatedAt,
}

impl SortField for ProductSortField {
    type Column = Column;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(ProductSortField::Title),
            "price" => Some(ProductSortField::Price),
            "quantity" => Some(ProductSortField::Quantity),
            "created_at" => Some(ProductSortField::CreatedAt),
            _ => None,
        }
    }

    fn column(&self) -> Column {
        match self {
            ProductSortField::Title => Column::Title,
            ProductSortField::Price => Column::Price,
            ProductSortField::Quantity => Column::Quantity,
            ProductSortField::CreatedAt => Column::CreatedAt,
        }
    }
}

pub type ProductListQuery = ListQuery<ProductFilter, ProductSortField>;

/// Writable product columns, used for both create and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub is_active: bool,
    pub user_id: i64,
}

/// A listed product with the user who created it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithCreator {
    pub product: Model,
    pub creator: Option<users::Model>,
}

#[automock]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Point lookup; `None` when no row has this id.
    async fn get_product(&self, id: i64) -> AppResult<Option<Model>>;

    async fn exists_by_id(&self, id: i64) -> AppResult<bool>;

    async fn create_product(&self, product: ProductInput) -> AppResult<Model>;

    /// Bulk insert inside `txn`; returns the number of rows written.
    async fn insert_all(
        &self,
        txn: &DatabaseTransaction,
        products: Vec<ProductInput>,
    ) -> AppResult<u64>;

    /// Returns the number of rows changed.
    async fn update_product(&self, id: i64, product: ProductInput) -> AppResult<u64>;

    /// Returns the number of rows deleted.
    async fn delete_product(&self, id: i64) -> AppResult<u64>;

    /// Filtered page of products plus the filtered total.
    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> AppResult<(Vec<ProductWithCreator>, u64)>;

    async fn statistics(&self) -> AppResult<ActivitySummary>;
}

#[derive(Debug, Clone)]
pub struct SeaProductRepository {
    conn: Arc<DatabaseConnection>,
}

impl SeaProductRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

impl From<ProductInput> for ActiveModel {
    fn from(product: ProductInput) -> Self {
        Self {
            title: Set(product.title),
            description: Set(product.description),
            price: Set(product.price),
            quantity: Set(product.quantity),
            is_active: Set(product.is_active),
            user_id: Set(product.user_id),
            ..Default::default()
        }
    }
}

pub(crate) fn product_condition(filter: &ProductFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(id) = positive_id(filter.id) {
        condition = condition.add(Column::Id.eq(id));
    }
    if let Some(title) = non_blank(&filter.title) {
        condition = condition.add(Column::Title.contains(title));
    }
    if let Some(user_id) = positive_id(filter.user_id) {
        condition = condition.add(Column::UserId.eq(user_id));
    }
    if let Some(min_price) = filter.min_price.filter(|p| *p > Decimal::ZERO) {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price.filter(|p| *p > Decimal::ZERO) {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(is_active) = filter.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }
    condition
}

#[async_trait]
impl ProductRepository for SeaProductRepository {
    async fn get_product(&self, id: i64) -> AppResult<Option<Model>> {
        Ok(Products::find_by_id(id).one(&*self.conn).await?)
    }

    async fn exists_by_id(&self, id: i64) -> AppResult<bool> {
        let found: Option<i64> = Products::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Id.eq(id))
            .into_tuple()
            .one(&*self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn create_product(&self, product: ProductInput) -> AppResult<Model> {
        Ok(ActiveModel::from(product).insert(&*self.conn).await?)
    }

    async fn insert_all(
        &self,
        txn: &DatabaseTransaction,
        products: Vec<ProductInput>,
    ) -> AppResult<u64> {
        if products.is_empty() {
            return Ok(0);
        }
        let inserted = Products::insert_many(products.into_iter().map(ActiveModel::from))
            .exec_without_returning(txn)
            .await?;
        Ok(inserted)
    }

    async fn update_product(&self, id: i64, product: ProductInput) -> AppResult<u64> {
        let active = ActiveModel {
            updated_at: Set(Utc::now().into()),
            ..ActiveModel::from(product)
        };
        let result = Products::update_many()
            .set(active)
            .filter(Column::Id.eq(id))
            .exec(&*self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_product(&self, id: i64) -> AppResult<u64> {
        let result = Products::delete_by_id(id).exec(&*self.conn).await?;
        Ok(result.rows_affected)
    }

    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> AppResult<(Vec<ProductWithCreator>, u64)> {
        let finder = Products::find()
            .find_also_related(Users)
            .filter(product_condition(&query.filter));

        let total = finder.clone().count(&*self.conn).await?;

        let finder = apply_sort(
            finder,
            &query.sort,
            (Column::UpdatedAt, SortDirection::Desc),
            Column::Id,
        );
        let rows = apply_pagination(finder, query.page)
            .all(&*self.conn)
            .await?
            .into_iter()
            .map(|(product, creator)| ProductWithCreator { product, creator })
            .collect();

        Ok((rows, total))
    }

    async fn statistics(&self) -> AppResult<ActivitySummary> {
        let total = Products::find().count(&*self.conn).await?;
        let total_inactive = Products::find()
            .filter(Column::IsActive.eq(false))
            .count(&*self.conn)
            .await?;
        Ok(ActivitySummary {
            total,
            total_inactive,
        })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    fn sql_for(filter: &ProductFilter) -> String {
        Products::find()
            .filter(product_condition(filter))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn zero_price_bounds_are_ignored() {
        let sql = sql_for(&ProductFilter {
            min_price: Some(Decimal::ZERO),
            max_price: Some(Decimal::ZERO),
            user_id: Some(0),
            ..Default::default()
        });
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[test]
    fn price_bounds_apply_independently() {
        let sql = sql_for(&ProductFilter {
            max_price: Some(Decimal::new(5000, 2)),
            ..Default::default()
        });
        assert!(sql.contains(r#""products"."price" <= 50.00"#), "{sql}");
        assert!(!sql.contains(">="), "{sql}");
    }

    #[test]
    fn title_filter_is_substring_and_combined_with_and() {
        let sql = sql_for(&ProductFilter {
            title: Some("mug".into()),
            user_id: Some(4),
            is_active: Some(true),
            ..Default::default()
        });
        assert!(sql.contains(r#""products"."title" LIKE '%mug%'"#), "{sql}");
        assert!(sql.contains(r#"AND "products"."user_id" = 4"#), "{sql}");
        assert!(sql.contains(r#""products"."is_active" = TRUE"#), "{sql}");
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::require,
    error::{AppError, AppResult},
    models::Product,
    repository::ProductInput,
};

/// Body of product create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
    pub quantity: i32,
    pub is_active: Option<bool>,
    /// Owner of the product.
    pub user_id: i64,
}

impl ProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        require(&self.title, "title")?;
        if self.price < Decimal::ZERO {
            return Err(AppError::BadRequest("price is invalid".into()));
        }
        if self.quantity < 0 {
            return Err(AppError::BadRequest("quantity is invalid".into()));
        }
        if self.user_id <= 0 {
            return Err(AppError::BadRequest("user id is invalid".into()));
        }
        Ok(())
    }
}

impl From<ProductRequest> for ProductInput {
    fn from(req: ProductRequest) -> Self {
        Self {
            title: req.title.trim().to_string(),
            description: req.description.unwrap_or_default(),
            price: req.price,
            quantity: req.quantity,
            is_active: req.is_active.unwrap_or(true),
            user_id: req.user_id,
        }
    }
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImportSummary {
    pub imported: u64,
    /// Data rows left out because a cell failed to parse.
    pub skipped: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

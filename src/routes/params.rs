use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    entity::{OrderStatus, UserRole},
    error::{AppError, AppResult},
    query::{PageRequest, parse_sort},
    repository::{
        OrderFilter, OrderListQuery, ProductFilter, ProductListQuery, UserFilter, UserListQuery,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub id: Option<i64>,
    /// Exact match.
    pub email: Option<String>,
    /// Substring match.
    pub name: Option<String>,
    pub is_active: Option<bool>,
    /// `ADMIN` or `GUEST`.
    pub role: Option<String>,
    /// Page number, default 1.
    pub page: Option<i64>,
    /// Items per page, default 20, at most 1000.
    pub limit: Option<i64>,
    /// `field:asc|desc[,…]` over `name`, `email`, `created_at`.
    pub sort: Option<String>,
}

impl UserQuery {
    pub fn into_list_query(self) -> AppResult<UserListQuery> {
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                UserRole::try_from_value(&raw.to_owned())
                    .map_err(|_| AppError::BadRequest("role is invalid".into()))?,
            ),
        };
        Ok(UserListQuery {
            sort: parse_sort(self.sort.as_deref())?,
            page: PageRequest::from_params(self.page, self.limit)?,
            filter: UserFilter {
                id: self.id,
                email: self.email,
                name: self.name,
                is_active: self.is_active,
                role,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub id: Option<i64>,
    /// Substring match.
    pub title: Option<String>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub user_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `field:asc|desc[,…]` over `title`, `price`, `quantity`, `created_at`.
    pub sort: Option<String>,
}

impl ProductQuery {
    pub fn into_list_query(self) -> AppResult<ProductListQuery> {
        Ok(ProductListQuery {
            sort: parse_sort(self.sort.as_deref())?,
            page: PageRequest::from_params(self.page, self.limit)?,
            filter: ProductFilter {
                id: self.id,
                title: self.title,
                min_price: self.min_price,
                max_price: self.max_price,
                is_active: self.is_active,
                user_id: self.user_id,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub id: Option<i64>,
    pub order_number: Option<String>,
    /// `NEW`, `PENDING`, `SUCCESS` or `FAILED`.
    pub status: Option<String>,
    pub user_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `field:asc|desc[,…]` over `order_date`, `created_at`.
    pub sort: Option<String>,
}

impl OrderQuery {
    pub fn into_list_query(self) -> AppResult<OrderListQuery> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                OrderStatus::try_from_value(&raw.to_owned())
                    .map_err(|_| AppError::BadRequest("status is invalid".into()))?,
            ),
        };
        Ok(OrderListQuery {
            sort: parse_sort(self.sort.as_deref())?,
            page: PageRequest::from_params(self.page, self.limit)?,
            filter: OrderFilter {
                id: self.id,
                order_number: self.order_number,
                status,
                user_id: self.user_id,
            },
        })
    }
}

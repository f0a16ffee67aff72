use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        orders::{OrderItemRequest, OrderList, PlaceOrderRequest},
        products::{ImportSummary, ProductList, ProductRequest},
        statistics::{ActivityCount, LatestOrder, OrderStatusCount, Statistics},
        users::{UserList, UserRequest},
    },
    entity::{OrderStatus, UserRole},
    models::{CreatedBy, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{auth, health, orders, products, statistics, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::import_products_csv,
        products::export_products_csv,
        orders::list_orders,
        orders::place_order,
        statistics::get_statistics
    ),
    components(
        schemas(
            User,
            UserRole,
            CreatedBy,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            LoginRequest,
            LoginResponse,
            UserRequest,
            UserList,
            ProductRequest,
            ProductList,
            ImportSummary,
            PlaceOrderRequest,
            OrderItemRequest,
            OrderList,
            Statistics,
            ActivityCount,
            OrderStatusCount,
            LatestOrder,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ImportSummary>,
            ApiResponse<OrderList>,
            ApiResponse<Statistics>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Statistics", description = "Back office statistics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/users",
            "/api/users/{id}",
            "/api/products",
            "/api/products/{id}",
            "/api/products/import-csv",
            "/api/products/export/csv",
            "/api/orders",
            "/api/statistics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::{
    dto::products::{ImportSummary, ProductList, ProductRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/import-csv", post(import_products_csv))
        .route("/export/csv", get(export_products_csv))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "List products with their creator", body = ApiResponse<ProductList>),
        (status = 400, description = "Invalid filter, sort or page")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let query = params.into_list_query()?;
    let (items, total) = product_service::list_products(&state.repo, &query).await?;

    let meta = Meta::for_page(query.page, total);
    Ok(Json(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = product_service::get_product(&state.repo, id).await?;
    Ok(Json(ApiResponse::success("Product", product, None)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 404, description = "Owner does not exist")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let product = product_service::create_product(&state.repo, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Product created",
            product,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = product_service::update_product(&state.repo, id, payload).await?;
    Ok(Json(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    product_service::delete_product(&state.repo, id).await?;
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/products/import-csv",
    request_body(
        content = String,
        content_type = "text/csv",
        description = "Header row naming title, description, price, quantity, is_active, user_id"
    ),
    responses(
        (status = 201, description = "Rows imported; unparseable rows skipped", body = ApiResponse<ImportSummary>),
        (status = 400, description = "Unknown or missing column")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn import_products_csv(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ApiResponse<ImportSummary>>)> {
    let summary = product_service::import_products_csv(&state.repo, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Imported products",
            summary,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/products/export/csv",
    params(ProductQuery),
    responses(
        (status = 200, description = "Up to 1000 matching products as CSV", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid filter or sort")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn export_products_csv(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ProductQuery>,
) -> AppResult<impl IntoResponse> {
    let query = params.into_list_query()?;
    let data = product_service::export_products_csv(&state.repo, query).await?;

    let disposition = format!(
        "attachment; filename=\"products_{}.csv\"",
        Utc::now().format("%Y%m%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

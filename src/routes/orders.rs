use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::orders::{OrderList, PlaceOrderRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::OrderQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(place_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderQuery),
    responses(
        (status = 200, description = "List orders with their items", body = ApiResponse<OrderList>),
        (status = 400, description = "Invalid filter, sort or page")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<OrderQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let query = params.into_list_query()?;
    let (items, total) = order_service::list_orders(&state.repo, &query).await?;

    let meta = Meta::for_page(query.page, total);
    Ok(Json(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed"),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "User or product does not exist")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    order_service::place_order(&state.repo, payload.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Created order successfully",
            serde_json::json!({}),
            Some(Meta::empty()),
        )),
    ))
}

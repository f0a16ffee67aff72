use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::statistics::Statistics,
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::ApiResponse,
    services::statistics_service::{self, LATEST_ORDERS_LIMIT},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_statistics))
}

#[utoipa::path(
    get,
    path = "/api/statistics",
    responses(
        (status = 200, description = "Back office totals and latest orders", body = ApiResponse<Statistics>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Statistics"
)]
pub async fn get_statistics(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Statistics>>> {
    ensure_admin(&user)?;
    let stats =
        statistics_service::get_statistics(&state.repo, &state.pool, LATEST_ORDERS_LIMIT).await?;
    Ok(Json(ApiResponse::success("Statistics", stats, None)))
}

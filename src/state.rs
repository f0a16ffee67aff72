use crate::{db::DbPool, repository::Repositories, services::auth_service::AuthSettings};

#[derive(Clone)]
pub struct AppState {
    /// Raw pool for aggregate queries.
    pub pool: DbPool,
    pub repo: Repositories,
    pub auth: AuthSettings,
}

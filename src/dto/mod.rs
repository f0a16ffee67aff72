pub mod auth;
pub mod orders;
pub mod products;
pub mod statistics;
pub mod users;

use crate::error::{AppError, AppResult};

pub(crate) fn require(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} cannot be blank")));
    }
    Ok(())
}

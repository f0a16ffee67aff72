use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::require,
    entity::UserRole,
    error::{AppError, AppResult},
    models::User,
};

/// Body of user create and update. Update replaces every field,
/// including the password.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    /// `ADMIN` or `GUEST`.
    pub role: String,
    pub is_active: Option<bool>,
}

impl UserRequest {
    /// Check the body and return the parsed role.
    pub fn validate(&self) -> AppResult<UserRole> {
        require(&self.name, "name")?;
        require(&self.email, "email")?;
        require(&self.password, "password")?;
        require(&self.phone, "phone")?;
        require(&self.role, "role")?;
        if !looks_like_email(self.email.trim()) {
            return Err(AppError::BadRequest("email is invalid".into()));
        }
        UserRole::try_from_value(&self.role.trim().to_owned())
            .map_err(|_| AppError::BadRequest("role is invalid".into()))
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

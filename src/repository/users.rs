use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set,
};

use crate::{
    entity::{
        UserRole, Users,
        users::{ActiveModel, Column, Model},
    },
    error::AppResult,
    query::{
        ListQuery, SortDirection, SortField, apply_pagination, apply_sort, non_blank, positive_id,
    },
    repository::ActivitySummary,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Email,
    CreatedAt,
}

impl SortField for UserSortField {
    type Column = Column;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(UserSortField::Name),
            "email" => Some(UserSortField::Email),
            "created_at" => Some(UserSortField::CreatedAt),
            _ => None,
        }
    }

    fn column(&self) -> Column {
        match self {
            UserSortField::Name => Column::Name,
            UserSortField::Email => Column::Email,
            UserSortField::CreatedAt => Column::CreatedAt,
        }
    }
}

pub type UserListQuery = ListQuery<UserFilter, UserSortField>;

/// Columns written on signup and on profile update. The password is
/// already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
}

#[automock]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AppResult<Model>;

    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    async fn exists_by_id(&self, id: i64) -> AppResult<bool>;

    async fn get_user(&self, id: i64) -> AppResult<Option<Model>>;

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<Model>>;

    /// Filtered page of users plus the filtered total.
    async fn list_users(&self, query: &UserListQuery) -> AppResult<(Vec<Model>, u64)>;

    /// Returns the number of rows changed.
    async fn update_user(&self, id: i64, user: NewUser) -> AppResult<u64>;

    /// Returns the number of rows deleted.
    async fn delete_user(&self, id: i64) -> AppResult<u64>;

    async fn statistics(&self) -> AppResult<ActivitySummary>;
}

#[derive(Debug, Clone)]
pub struct SeaUserRepository {
    conn: Arc<DatabaseConnection>,
}

impl SeaUserRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

pub(crate) fn user_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(id) = positive_id(filter.id) {
        condition = condition.add(Column::Id.eq(id));
    }
    if let Some(email) = non_blank(&filter.email) {
        condition = condition.add(Column::Email.eq(email));
    }
    if let Some(name) = non_blank(&filter.name) {
        condition = condition.add(Column::Name.contains(name));
    }
    if let Some(is_active) = filter.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }
    if let Some(role) = filter.role {
        condition = condition.add(Column::Role.eq(role));
    }
    condition
}

#[async_trait]
impl UserRepository for SeaUserRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<Model> {
        let active = ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            phone: Set(user.phone),
            role: Set(user.role),
            is_active: Set(user.is_active),
            ..Default::default()
        };
        Ok(active.insert(&*self.conn).await?)
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let found: Option<i64> = Users::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Email.eq(email))
            .into_tuple()
            .one(&*self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn exists_by_id(&self, id: i64) -> AppResult<bool> {
        let found: Option<i64> = Users::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Id.eq(id))
            .into_tuple()
            .one(&*self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<Model>> {
        Ok(Users::find_by_id(id).one(&*self.conn).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<Model>> {
        Ok(Users::find()
            .filter(Column::Email.eq(email))
            .one(&*self.conn)
            .await?)
    }

    async fn list_users(&self, query: &UserListQuery) -> AppResult<(Vec<Model>, u64)> {
        let finder = Users::find().filter(user_condition(&query.filter));

        let total = finder.clone().count(&*self.conn).await?;

        let finder = apply_sort(
            finder,
            &query.sort,
            (Column::UpdatedAt, SortDirection::Desc),
            Column::Id,
        );
        let users = apply_pagination(finder, query.page)
            .all(&*self.conn)
            .await?;

        Ok((users, total))
    }

    async fn update_user(&self, id: i64, user: NewUser) -> AppResult<u64> {
        let active = ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            phone: Set(user.phone),
            role: Set(user.role),
            is_active: Set(user.is_active),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let result = Users::update_many()
            .set(active)
            .filter(Column::Id.eq(id))
            .exec(&*self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_user(&self, id: i64) -> AppResult<u64> {
        let result = Users::delete_by_id(id).exec(&*self.conn).await?;
        Ok(result.rows_affected)
    }

    async fn statistics(&self) -> AppResult<ActivitySummary> {
        let total = Users::find().count(&*self.conn).await?;
        let total_inactive = Users::find()
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

    fn where_clause(filter: &UserFilter) -> String {
        Users::find()
            .filter(user_condition(filter))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn empty_filter_has_no_conditions() {
        assert!(!where_clause(&UserFilter::default()).contains("WHERE"));
    }

    #[test]
    fn zero_values_do_not_narrow() {
        let filter = UserFilter {
            id: Some(0),
            email: Some(String::new()),
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(!where_clause(&filter).contains("WHERE"));
    }

    #[test]
    fn name_is_a_substring_match_and_role_is_exact() {
        let sql = where_clause(&UserFilter {
            name: Some("ann".into()),
            role: Some(UserRole::Admin),
            is_active: Some(false),
            ..Default::default()
        });
        assert!(sql.contains(r#""users"."name" LIKE '%ann%'"#), "{sql}");
        assert!(sql.contains(r#""users"."role" = 'ADMIN'"#), "{sql}");
        assert!(sql.contains(r#""users"."is_active" = FALSE"#), "{sql}");
    }
}

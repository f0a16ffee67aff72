use crate::{
    dto::users::UserRequest,
    error::{AppError, AppResult},
    models::User,
    repository::{NewUser, Repositories, UserListQuery},
    services::auth_service::hash_password,
};

fn new_user(payload: UserRequest) -> AppResult<NewUser> {
    let role = payload.validate()?;
    Ok(NewUser {
        password_hash: hash_password(&payload.password)?,
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        role,
        is_active: payload.is_active.unwrap_or(true),
    })
}

pub async fn create_user(repo: &Repositories, payload: UserRequest) -> AppResult<User> {
    let user = new_user(payload)?;
    if repo.user().exists_by_email(&user.email).await? {
        return Err(AppError::EmailExisted);
    }

    let created = repo.user().create_user(user).await?;
    tracing::info!(user_id = created.id, "user created");
    Ok(User::from(created))
}

pub async fn get_user(repo: &Repositories, id: i64) -> AppResult<User> {
    repo.user()
        .get_user(id)
        .await?
        .map(User::from)
        .ok_or(AppError::UserNotFound)
}

pub async fn list_users(repo: &Repositories, query: &UserListQuery) -> AppResult<(Vec<User>, u64)> {
    let (rows, total) = repo.user().list_users(query).await?;
    Ok((rows.into_iter().map(User::from).collect(), total))
}

/// Replace every field of user `id`. The email may stay the same but may
/// not collide with another user's.
pub async fn update_user(repo: &Repositories, id: i64, payload: UserRequest) -> AppResult<User> {
    let user = new_user(payload)?;
    if let Some(owner) = repo.user().get_user_by_email(&user.email).await? {
        if owner.id != id {
            return Err(AppError::EmailExisted);
        }
    }

    if repo.user().update_user(id, user).await? == 0 {
        return Err(AppError::UserNotFound);
    }
    get_user(repo, id).await
}

pub async fn delete_user(repo: &Repositories, id: i64) -> AppResult<()> {
    if repo.user().delete_user(id).await? == 0 {
        return Err(AppError::UserNotFound);
    }
    tracing::info!(user_id = id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use mockall::predicate::eq;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::{
        entity::{UserRole, users},
        repository::{MockOrderRepository, MockProductRepository, MockUserRepository},
        services::auth_service::verify_password,
    };

    fn repos(users: MockUserRepository) -> Repositories {
        Repositories::from_parts(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            Arc::new(users),
            Arc::new(MockProductRepository::new()),
            Arc::new(MockOrderRepository::new()),
        )
    }

    fn request() -> UserRequest {
        UserRequest {
            name: " Ferris ".into(),
            email: "ferris@example.com".into(),
            password: "hunter2".into(),
            phone: "0812".into(),
            role: "GUEST".into(),
            is_active: None,
        }
    }

    fn stored(id: i64, user: NewUser) -> users::Model {
        users::Model {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn creates_user_with_hashed_password() {
        let mut users = MockUserRepository::new();
        users.expect_exists_by_email().returning(|_| Ok(false));
        users
            .expect_create_user()
            .withf(|user| {
                user.name == "Ferris"
                    && user.role == UserRole::Guest
                    && user.is_active
                    && verify_password("hunter2", &user.password_hash).unwrap_or(false)
            })
            .returning(|user| Ok(stored(1, user)));

        let user = create_user(&repos(users), request()).await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.email, "ferris@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_exists_by_email().returning(|_| Ok(true));
        users.expect_create_user().never();

        let result = create_user(&repos(users), request()).await;
        assert!(matches!(result, Err(AppError::EmailExisted)));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_get_user().with(eq(9)).returning(|_| Ok(None));
        users.expect_update_user().returning(|_, _| Ok(0));
        users.expect_get_user_by_email().returning(|_| Ok(None));
        users.expect_delete_user().returning(|_| Ok(0));
        let repo = repos(users);

        assert!(matches!(get_user(&repo, 9).await, Err(AppError::UserNotFound)));
        assert!(matches!(
            update_user(&repo, 9, request()).await,
            Err(AppError::UserNotFound)
        ));
        assert!(matches!(delete_user(&repo, 9).await, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn update_cannot_take_another_users_email() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_email().returning(|_| {
            let mut other = request();
            other.password = String::new();
            Ok(Some(stored(
                2,
                NewUser {
                    name: other.name,
                    email: other.email,
                    password_hash: other.password,
                    phone: other.phone,
                    role: UserRole::Guest,
                    is_active: true,
                },
            )))
        });
        users.expect_update_user().never();

        let result = update_user(&repos(users), 1, request()).await;
        assert!(matches!(result, Err(AppError::EmailExisted)));
    }
}

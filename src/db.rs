use std::{future::Future, pin::Pin, time::Duration};

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use sqlx::postgres::PgPoolOptions;

use crate::{config::AppConfig, error::AppResult};

pub type DbPool = sqlx::PgPool;

/// Future returned by a unit of work; it may borrow the transaction it runs in.
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>;

/// Create a SeaORM connection.
pub async fn create_orm_conn(config: &AppConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Create the raw sqlx pool used for migrations and aggregate queries.
pub async fn create_pool(config: &AppConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Run `work` inside a single transaction at the database's default
/// isolation level.
///
/// The transaction commits when `work` succeeds and rolls back when it
/// fails; the error from `work` is returned as is. A failed rollback is
/// logged next to the error that triggered it. If `work` panics the
/// transaction is dropped uncommitted and SeaORM rolls it back.
pub async fn run_in_transaction<C, F, T>(conn: &C, work: F) -> AppResult<T>
where
    C: TransactionTrait,
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxFuture<'c, T> + Send,
    T: Send,
{
    let txn = conn.begin().await?;

    match work(&txn).await {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(
                    error = %rollback_err,
                    cause = %err,
                    "transaction rollback failed"
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, Statement, Transaction};

    use super::*;
    use crate::error::AppError;

    fn transaction_ending_with(last: &str) -> Vec<Transaction> {
        vec![Transaction::many(vec![
            Statement::from_string(DatabaseBackend::Postgres, "BEGIN"),
            Statement::from_string(DatabaseBackend::Postgres, last),
        ])]
    }

    #[tokio::test]
    async fn commits_when_work_succeeds() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let value = run_in_transaction(&db, |_txn| Box::pin(async { Ok(42) }))
            .await
            .expect("commit");

        assert_eq!(value, 42);
        assert_eq!(db.into_transaction_log(), transaction_ending_with("COMMIT"));
    }

    #[tokio::test]
    async fn returns_work_error_after_rollback() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result: AppResult<()> = run_in_transaction(&db, |_txn| {
            Box::pin(async { Err(AppError::BadRequest("boom".into())) })
        })
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "boom"));
        assert_eq!(db.into_transaction_log(), transaction_ending_with("ROLLBACK"));
    }
}

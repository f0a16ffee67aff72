//! Data access layer: one repository per entity plus the transaction entry
//! point shared by the services.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction};

use crate::{
    db::{TxFuture, run_in_transaction},
    error::AppResult,
};

pub mod orders;
pub mod products;
pub mod users;

pub use orders::{
    MockOrderRepository, NewOrder, NewOrderItem, OrderFilter, OrderListQuery, OrderRecord,
    OrderRepository, OrderSortField, SeaOrderRepository,
};
pub use products::{
    MockProductRepository, ProductFilter, ProductInput, ProductListQuery, ProductRepository,
    ProductSortField, ProductWithCreator, SeaProductRepository,
};
pub use users::{
    MockUserRepository, NewUser, SeaUserRepository, UserFilter, UserListQuery, UserRepository,
    UserSortField,
};

/// Row totals used by the statistics page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    pub total: u64,
    pub total_inactive: u64,
}

#[derive(Clone)]
pub struct Repositories {
    conn: Arc<DatabaseConnection>,
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn new(conn: DatabaseConnection) -> Self {
        let conn = Arc::new(conn);
        Self {
            users: Arc::new(SeaUserRepository::new(Arc::clone(&conn))),
            products: Arc::new(SeaProductRepository::new(Arc::clone(&conn))),
            orders: Arc::new(SeaOrderRepository::new(Arc::clone(&conn))),
            conn,
        }
    }

    /// Assemble from explicit parts, e.g. mocks in tests.
    pub fn from_parts(
        conn: DatabaseConnection,
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            conn: Arc::new(conn),
            users,
            products,
            orders,
        }
    }

    pub fn user(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    pub fn product(&self) -> &Arc<dyn ProductRepository> {
        &self.products
    }

    pub fn order(&self) -> &Arc<dyn OrderRepository> {
        &self.orders
    }

    /// Run `work` in one transaction; see [`run_in_transaction`].
    pub async fn tx<F, T>(&self, work: F) -> AppResult<T>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxFuture<'c, T> + Send,
        T: Send,
    {
        run_in_transaction(&*self.conn, work).await
    }
}

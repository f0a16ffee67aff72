pub mod order_items;
pub mod orders;
pub mod products;
pub mod users;

pub use order_items::Entity as OrderItems;
pub use orders::{Entity as Orders, OrderStatus};
pub use products::Entity as Products;
pub use users::{Entity as Users, UserRole};

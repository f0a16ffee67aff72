use order_desk::{
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    dto::{products::ProductRequest, users::UserRequest},
    repository::{ProductFilter, ProductListQuery, Repositories},
    services::{product_service, user_service},
};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let repo = Repositories::new(create_orm_conn(&config).await?);

    let admin_id = ensure_user(&repo, "Admin", "admin@example.com", "admin123", "ADMIN").await?;
    let guest_id = ensure_user(&repo, "Guest", "guest@example.com", "guest123", "GUEST").await?;
    seed_products(&repo, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Guest ID: {guest_id}");
    Ok(())
}

async fn ensure_user(
    repo: &Repositories,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<i64> {
    if let Some(existing) = repo.user().get_user_by_email(email).await? {
        println!("User {email} already exists");
        return Ok(existing.id);
    }

    let user = user_service::create_user(
        repo,
        UserRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: "0800000000".into(),
            role: role.into(),
            is_active: Some(true),
        },
    )
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(repo: &Repositories, owner_id: i64) -> anyhow::Result<()> {
    let products = [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", Decimal::new(55000, 2), 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", Decimal::new(12000, 2), 100),
        ("Rust Sticker Pack", "Decorate your laptop", Decimal::new(5000, 2), 200),
        ("E-book: Async Rust", "Learn async Rust patterns", Decimal::new(25000, 2), 75),
    ];

    for (title, description, price, quantity) in products {
        let query = ProductListQuery {
            filter: ProductFilter {
                title: Some(title.into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let (_, found) = repo.product().list_products(&query).await?;
        if found > 0 {
            continue;
        }

        product_service::create_product(
            repo,
            ProductRequest {
                title: title.into(),
                description: Some(description.into()),
                price,
                quantity,
                is_active: Some(true),
                user_id: owner_id,
            },
        )
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

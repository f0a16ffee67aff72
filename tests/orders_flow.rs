use order_desk::{
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    dto::{products::ProductRequest, users::UserRequest},
    entity::OrderStatus,
    error::AppError,
    query::{PageRequest, SortDirection, SortSpec},
    repository::{
        NewOrder, OrderFilter, OrderListQuery, ProductFilter, ProductListQuery, ProductSortField,
        Repositories,
    },
    services::{
        order_service::{self, OrderItemInput, PlaceOrderInput},
        product_service, user_service,
    },
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Statement};

// Integration flow against a real database: place orders, check the price
// snapshot, the all-or-nothing writes, and the listing engine.
#[tokio::test]
async fn place_and_list_orders_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let (repo, pool) = setup(&database_url).await?;

    let admin_id = create_user(&repo, "admin@example.com", "ADMIN").await?;
    let guest_id = create_user(&repo, "guest@example.com", "GUEST").await?;
    assert_eq!((admin_id, guest_id), (1, 2));

    let hoodie = create_product(&repo, admin_id, "Axum Hoodie", Decimal::new(55000, 2)).await?;
    let mug = create_product(&repo, admin_id, "Ferris Mug", Decimal::new(12000, 2)).await?;
    let stickers = create_product(&repo, admin_id, "Sticker Pack", Decimal::new(5000, 2)).await?;

    // Scenario: guest orders hoodie and stickers.
    order_service::place_order(
        &repo,
        PlaceOrderInput {
            user_id: guest_id,
            note: "New order".into(),
            items: vec![item(hoodie, 10, Decimal::ZERO), item(stickers, 20, Decimal::new(5, 1))],
        },
    )
    .await?;

    let (orders, total) = order_service::list_orders(&repo, &OrderListQuery::default()).await?;
    assert_eq!(total, 1);
    let order = &orders[0];
    assert_eq!(order.user_id, guest_id);
    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.note, "New order");
    assert!(uuid::Uuid::parse_str(&order.order_number).is_ok());
    assert_eq!(order.order_items.len(), 2);
    assert_eq!(order.order_items[0].product_name, "Axum Hoodie");
    assert_eq!(order.order_items[0].product_price, Decimal::new(55000, 2));
    assert_eq!(order.order_items[1].product_name, "Sticker Pack");
    assert_eq!(order.order_items[1].discount, Decimal::new(5, 1));

    // Repricing the catalog does not touch placed orders.
    product_service::update_product(
        &repo,
        hoodie,
        ProductRequest {
            title: "Axum Hoodie v2".into(),
            description: None,
            price: Decimal::new(99900, 2),
            quantity: 5,
            is_active: Some(true),
            user_id: admin_id,
        },
    )
    .await?;
    let (orders, _) = order_service::list_orders(&repo, &OrderListQuery::default()).await?;
    assert_eq!(orders[0].order_items[0].product_name, "Axum Hoodie");
    assert_eq!(orders[0].order_items[0].product_price, Decimal::new(55000, 2));

    // Unknown user and unknown product leave the tables untouched.
    let unknown_user = order_service::place_order(
        &repo,
        PlaceOrderInput {
            user_id: 999,
            note: String::new(),
            items: vec![item(mug, 1, Decimal::ZERO)],
        },
    )
    .await;
    assert!(matches!(unknown_user, Err(AppError::UserNotExist)));

    let unknown_product = order_service::place_order(
        &repo,
        PlaceOrderInput {
            user_id: guest_id,
            note: String::new(),
            items: vec![item(mug, 1, Decimal::ZERO), item(404, 1, Decimal::ZERO)],
        },
    )
    .await;
    assert!(matches!(unknown_product, Err(AppError::ProductNotExist)));
    assert_eq!(count(&pool, "orders").await?, 1);
    assert_eq!(count(&pool, "order_items").await?, 2);

    // A failure after the header insert rolls the header back.
    let orders_repo = repo.order().clone();
    let failed = repo
        .tx(move |txn| {
            Box::pin(async move {
                orders_repo
                    .create_order(
                        txn,
                        NewOrder {
                            order_number: uuid::Uuid::new_v4().to_string(),
                            order_date: chrono::Utc::now(),
                            status: OrderStatus::New,
                            note: String::new(),
                            user_id: guest_id,
                        },
                    )
                    .await?;
                Err::<(), _>(AppError::BadRequest("abort".into()))
            })
        })
        .await;
    assert!(matches!(failed, Err(AppError::BadRequest(_))));
    assert_eq!(count(&pool, "orders").await?, 1);

    // Filtered order listing: total reflects the filter, not the page.
    for _ in 0..2 {
        order_service::place_order(
            &repo,
            PlaceOrderInput {
                user_id: admin_id,
                note: String::new(),
                items: vec![item(mug, 1, Decimal::ZERO)],
            },
        )
        .await?;
    }
    let query = OrderListQuery {
        filter: OrderFilter {
            status: Some(OrderStatus::New),
            user_id: Some(admin_id),
            ..Default::default()
        },
        sort: Vec::new(),
        page: PageRequest { page: 1, limit: 1 },
    };
    let (page, total) = order_service::list_orders(&repo, &query).await?;
    assert_eq!(total, 2);
    assert_eq!(page.len(), 1);
    assert!(page.iter().all(|o| o.user_id == admin_id));

    // Product listing: sort by price, second page, creator joined in.
    let query = ProductListQuery {
        filter: ProductFilter::default(),
        sort: vec![SortSpec::new(ProductSortField::Price, SortDirection::Desc)],
        page: PageRequest { page: 2, limit: 2 },
    };
    let (products, total) = product_service::list_products(&repo, &query).await?;
    assert_eq!(total, 3);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, stickers);
    let creator = products[0].created_by.as_ref().expect("creator joined");
    assert_eq!(creator.id, admin_id);

    // A page past the end is empty but still reports the full total.
    let query = ProductListQuery {
        page: PageRequest {
            page: 100,
            limit: 20,
        },
        ..Default::default()
    };
    let (products, total) = product_service::list_products(&repo, &query).await?;
    assert!(products.is_empty());
    assert_eq!(total, 3);

    // Zero ids and blank strings do not filter.
    let query = ProductListQuery {
        filter: ProductFilter {
            id: Some(0),
            title: Some("  ".into()),
            user_id: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };
    let (_, total) = product_service::list_products(&repo, &query).await?;
    assert_eq!(total, 3);

    // CSV import keeps valid rows and skips the rest.
    let csv = format!("title,price,quantity,user_id\nCap,20,3,{admin_id}\nFree,0,1,{admin_id}\n");
    let summary = product_service::import_products_csv(&repo, csv.as_bytes()).await?;
    assert_eq!((summary.imported, summary.skipped), (1, 1));
    assert_eq!(count(&pool, "products").await?, 4);

    Ok(())
}

async fn setup(database_url: &str) -> anyhow::Result<(Repositories, sqlx::PgPool)> {
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test".into(),
        token_ttl_minutes: 30,
        db_max_connections: 5,
        db_acquire_timeout_secs: 5,
    };
    let pool = create_pool(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let orm = create_orm_conn(&config).await?;
    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok((Repositories::new(orm), pool))
}

async fn create_user(repo: &Repositories, email: &str, role: &str) -> anyhow::Result<i64> {
    let user = user_service::create_user(
        repo,
        UserRequest {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password: "password".into(),
            phone: "0800".into(),
            role: role.into(),
            is_active: Some(true),
        },
    )
    .await?;
    Ok(user.id)
}

async fn create_product(
    repo: &Repositories,
    owner: i64,
    title: &str,
    price: Decimal,
) -> anyhow::Result<i64> {
    let product = product_service::create_product(
        repo,
        ProductRequest {
            title: title.into(),
            description: None,
            price,
            quantity: 100,
            is_active: Some(true),
            user_id: owner,
        },
    )
    .await?;
    Ok(product.id)
}

fn item(product_id: i64, quantity: i32, discount: Decimal) -> OrderItemInput {
    OrderItemInput {
        product_id,
        quantity,
        discount,
        note: String::new(),
    }
}

async fn count(pool: &sqlx::PgPool, table: &str) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(n)
}

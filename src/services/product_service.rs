use std::{collections::HashMap, sync::Arc};

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use rust_decimal::Decimal;

use crate::{
    dto::products::{ImportSummary, ProductRequest},
    error::{AppError, AppResult},
    models::Product,
    query::PageRequest,
    repository::{ProductInput, ProductListQuery, Repositories},
};

/// Columns an import file may carry, lowercase.
const IMPORT_COLUMNS: [&str; 6] = [
    "title",
    "description",
    "price",
    "quantity",
    "is_active",
    "user_id",
];
const REQUIRED_IMPORT_COLUMNS: [&str; 4] = ["title", "price", "quantity", "user_id"];

pub const EXPORT_LIMIT: u64 = 1000;
const EXPORT_HEADER: [&str; 9] = [
    "ID",
    "Title",
    "Description",
    "Price",
    "Quantity",
    "Activated",
    "Created By",
    "Created Date",
    "Updated Date",
];
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn create_product(repo: &Repositories, payload: ProductRequest) -> AppResult<Product> {
    payload.validate()?;
    let input = ProductInput::from(payload);
    if !repo.user().exists_by_id(input.user_id).await? {
        return Err(AppError::UserNotExist);
    }

    let product = repo.product().create_product(input).await?;
    tracing::info!(product_id = product.id, user_id = product.user_id, "product created");
    Ok(Product::from(product))
}

pub async fn get_product(repo: &Repositories, id: i64) -> AppResult<Product> {
    repo.product()
        .get_product(id)
        .await?
        .map(Product::from)
        .ok_or(AppError::ProductNotFound)
}

pub async fn list_products(
    repo: &Repositories,
    query: &ProductListQuery,
) -> AppResult<(Vec<Product>, u64)> {
    if let (Some(min), Some(max)) = (query.filter.min_price, query.filter.max_price) {
        if min > max && !max.is_zero() {
            return Err(AppError::BadRequest("min price is greater than max price".into()));
        }
    }
    let (rows, total) = repo.product().list_products(query).await?;
    Ok((rows.into_iter().map(Product::from).collect(), total))
}

pub async fn update_product(
    repo: &Repositories,
    id: i64,
    payload: ProductRequest,
) -> AppResult<Product> {
    payload.validate()?;
    if !repo.product().exists_by_id(id).await? {
        return Err(AppError::ProductNotFound);
    }
    let input = ProductInput::from(payload);
    if !repo.user().exists_by_id(input.user_id).await? {
        return Err(AppError::UserNotExist);
    }

    if repo.product().update_product(id, input).await? == 0 {
        return Err(AppError::ProductNotFound);
    }
    get_product(repo, id).await
}

pub async fn delete_product(repo: &Repositories, id: i64) -> AppResult<()> {
    if repo.product().delete_product(id).await? == 0 {
        return Err(AppError::ProductNotFound);
    }
    tracing::info!(product_id = id, "product deleted");
    Ok(())
}

/// Import products from CSV. Rows that fail to parse are skipped; the
/// rest are written in one transaction.
pub async fn import_products_csv(repo: &Repositories, data: &[u8]) -> AppResult<ImportSummary> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(data);
    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("invalid csv: {e}")))?;
    let columns = import_columns(headers)?;

    let mut products = Vec::new();
    let mut skipped = 0;
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::BadRequest(format!("invalid csv: {e}")))?;
        match parse_import_row(&record, &columns) {
            Ok(product) => products.push(product),
            Err(reason) => {
                skipped += 1;
                // Header is line 1.
                tracing::warn!(line = index + 2, reason, "skipping csv row");
            }
        }
    }

    let imported = if products.is_empty() {
        0
    } else {
        let product_repo = Arc::clone(repo.product());
        repo.tx(move |txn| {
            Box::pin(async move { product_repo.insert_all(txn, products).await })
        })
        .await?
    };

    tracing::info!(imported, skipped, "products imported from csv");
    Ok(ImportSummary { imported, skipped })
}

/// Map each known column to its position in the header row.
fn import_columns(headers: &StringRecord) -> AppResult<HashMap<&'static str, usize>> {
    let mut columns = HashMap::new();
    for (index, name) in headers.iter().enumerate() {
        let lowered = name.to_lowercase();
        let column = IMPORT_COLUMNS
            .into_iter()
            .find(|c| *c == lowered)
            .ok_or_else(|| AppError::BadRequest(format!("invalid field name: {name}")))?;
        columns.insert(column, index);
    }
    if let Some(missing) = REQUIRED_IMPORT_COLUMNS
        .into_iter()
        .find(|c| !columns.contains_key(c))
    {
        return Err(AppError::BadRequest(format!("missing field: {missing}")));
    }
    Ok(columns)
}

fn cell<'r>(
    record: &'r StringRecord,
    columns: &HashMap<&'static str, usize>,
    name: &str,
) -> &'r str {
    columns
        .get(name)
        .and_then(|&index| record.get(index))
        .unwrap_or_default()
}

fn parse_import_row(
    record: &StringRecord,
    columns: &HashMap<&'static str, usize>,
) -> Result<ProductInput, &'static str> {
    let title = cell(record, columns, "title");
    if title.is_empty() {
        return Err("title is blank");
    }
    let price = cell(record, columns, "price")
        .parse::<Decimal>()
        .ok()
        .filter(|p| *p > Decimal::ZERO)
        .ok_or("price is invalid")?;
    let quantity = cell(record, columns, "quantity")
        .parse::<i32>()
        .ok()
        .filter(|q| *q > 0)
        .ok_or("quantity is invalid")?;
    let is_active = match cell(record, columns, "is_active") {
        "" => true,
        raw => parse_bool(raw).ok_or("is_active is invalid")?,
    };
    let user_id = cell(record, columns, "user_id")
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or("user id is invalid")?;

    Ok(ProductInput {
        title: title.to_string(),
        description: cell(record, columns, "description").to_string(),
        price,
        quantity,
        is_active,
        user_id,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Render the first `EXPORT_LIMIT` products matching `query` as CSV.
pub async fn export_products_csv(
    repo: &Repositories,
    mut query: ProductListQuery,
) -> AppResult<Vec<u8>> {
    query.page = PageRequest {
        page: 1,
        limit: EXPORT_LIMIT,
    };
    let (products, _) = list_products(repo, &query).await?;

    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADER)
        .map_err(|e| AppError::context("error when write csv", e))?;
    for product in &products {
        writer
            .write_record([
                product.id.to_string(),
                product.title.clone(),
                product.description.clone(),
                format!("{:.2}", product.price),
                product.quantity.to_string(),
                product.is_active.to_string(),
                product
                    .created_by
                    .as_ref()
                    .map(|user| user.name.clone())
                    .unwrap_or_default(),
                product.created_at.format(EXPORT_DATE_FORMAT).to_string(),
                product.updated_at.format(EXPORT_DATE_FORMAT).to_string(),
            ])
            .map_err(|e| AppError::context("error when write csv", e))?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| AppError::context("error when write csv", e.into_error()))?;

    tracing::info!(rows = products.len(), "products exported to csv");
    Ok(data)
}

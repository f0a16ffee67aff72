//! Shared filter / sort / pagination building blocks.
//!
//! Every listing runs the same steps: compose the optional filters into a
//! condition, count the filtered rows, then sort and paginate the same
//! query before fetching the page. Repositories own the filter shape;
//! this module owns the sort and page parts.

use sea_orm::{ColumnTrait, Order, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 1000;

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Validate raw query values. A zero or missing page/limit falls back to
    /// the default independently of the other one.
    pub fn from_params(page: Option<i64>, limit: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(0);
        let limit = limit.unwrap_or(0);
        if page < 0 {
            return Err(AppError::BadRequest("page is invalid".into()));
        }
        if limit < 0 || limit as u64 > MAX_LIMIT {
            return Err(AppError::BadRequest("limit is invalid".into()));
        }

        let request = Self {
            page: if page == 0 { DEFAULT_PAGE } else { page as u64 },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit as u64 },
        };
        // The offset must fit a Postgres BIGINT.
        let offset = (request.page - 1)
            .checked_mul(request.limit)
            .filter(|offset| *offset <= i64::MAX as u64);
        if offset.is_none() {
            return Err(AppError::BadRequest("page is invalid".into()));
        }
        Ok(request)
    }

    pub fn offset(&self) -> u64 {
        self.limit.saturating_mul(self.page.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only the exact lowercase spellings are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_order(&self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// A column a listing may be sorted by.
pub trait SortField: Copy + Send + Sync + 'static {
    type Column: ColumnTrait;

    fn parse(name: &str) -> Option<Self>;

    fn column(&self) -> Self::Column;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> SortSpec<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Filter, sort keys and page of one listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<Fi, So> {
    pub filter: Fi,
    pub sort: Vec<SortSpec<So>>,
    pub page: PageRequest,
}

impl<Fi: Default, So> Default for ListQuery<Fi, So> {
    fn default() -> Self {
        Self {
            filter: Fi::default(),
            sort: Vec::new(),
            page: PageRequest::default(),
        }
    }
}

/// Parse `field:dir[,field:dir...]`, keeping the order given.
pub fn parse_sort<F: SortField>(raw: Option<&str>) -> AppResult<Vec<SortSpec<F>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    let mut specs = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, direction) = part
            .split_once(':')
            .ok_or_else(|| AppError::BadRequest("sort type is invalid".into()))?;
        let field = F::parse(name.trim())
            .ok_or_else(|| AppError::BadRequest("sort field is invalid".into()))?;
        let direction = SortDirection::parse(direction.trim())
            .ok_or_else(|| AppError::BadRequest("sort type is invalid".into()))?;
        specs.push(SortSpec::new(field, direction));
    }
    Ok(specs)
}

/// Apply the requested sort keys in order, or `default` when none were
/// given, then `tie_break` ascending.
pub fn apply_sort<Q, F>(
    query: Q,
    sort: &[SortSpec<F>],
    default: (F::Column, SortDirection),
    tie_break: F::Column,
) -> Q
where
    Q: QueryOrder,
    F: SortField,
{
    let mut query = query;
    if sort.is_empty() {
        query = query.order_by(default.0, default.1.as_order());
    } else {
        for spec in sort {
            query = query.order_by(spec.field.column(), spec.direction.as_order());
        }
    }
    query.order_by(tie_break, Order::Asc)
}

pub fn apply_pagination<Q: QuerySelect>(query: Q, page: PageRequest) -> Q {
    query.offset(page.offset()).limit(page.limit)
}

/// Zero and negative ids mean "not filtered".
pub fn positive_id(id: Option<i64>) -> Option<i64> {
    id.filter(|v| *v > 0)
}

/// Blank strings mean "not filtered".
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, EntityTrait, QueryTrait};

    use super::*;
    use crate::entity::{Orders, orders};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        OrderDate,
        CreatedAt,
    }

    impl SortField for Field {
        type Column = orders::Column;

        fn parse(name: &str) -> Option<Self> {
            match name {
                "order_date" => Some(Field::OrderDate),
                "created_at" => Some(Field::CreatedAt),
                _ => None,
            }
        }

        fn column(&self) -> orders::Column {
            match self {
                Field::OrderDate => orders::Column::OrderDate,
                Field::CreatedAt => orders::Column::CreatedAt,
            }
        }
    }

    #[test]
    fn missing_page_and_limit_default_to_first_twenty() {
        let page = PageRequest::from_params(None, None).unwrap();
        assert_eq!(page, PageRequest::default());
        assert_eq!(page, PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::from_params(Some(0), Some(0)).unwrap(), page);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn page_and_limit_default_independently() {
        let page = PageRequest::from_params(Some(3), None).unwrap();
        assert_eq!(page, PageRequest { page: 3, limit: 20 });
        assert_eq!(page.offset(), 40);

        let page = PageRequest::from_params(None, Some(5)).unwrap();
        assert_eq!(page, PageRequest { page: 1, limit: 5 });
    }

    #[test]
    fn rejects_out_of_range_pagination() {
        assert!(PageRequest::from_params(Some(-1), None).is_err());
        assert!(PageRequest::from_params(None, Some(-1)).is_err());
        assert!(PageRequest::from_params(None, Some(1001)).is_err());
        assert!(PageRequest::from_params(None, Some(1000)).is_ok());
    }

    #[test]
    fn page_whose_offset_overflows_is_rejected() {
        let result = PageRequest::from_params(Some(i64::MAX), Some(1000));
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "page is invalid"));

        // (page - 1) * limit == i64::MAX exactly still fits.
        let page = PageRequest::from_params(Some(i64::MAX), Some(1)).unwrap();
        assert_eq!(page.offset(), i64::MAX as u64 - 1);

        let last = (i64::MAX as u64 / 1000) as i64;
        assert!(PageRequest::from_params(Some(last), Some(1000)).is_ok());
        assert!(PageRequest::from_params(Some(last + 2), Some(1000)).is_err());
    }

    #[test]
    fn parses_sort_keys_in_given_order() {
        let sort = parse_sort::<Field>(Some("created_at:desc, order_date:asc")).unwrap();
        assert_eq!(
            sort,
            vec![
                SortSpec::new(Field::CreatedAt, SortDirection::Desc),
                SortSpec::new(Field::OrderDate, SortDirection::Asc),
            ]
        );
        assert!(parse_sort::<Field>(None).unwrap().is_empty());
        assert!(parse_sort::<Field>(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn sort_direction_is_case_sensitive() {
        assert!(parse_sort::<Field>(Some("created_at:DESC")).is_err());
        assert!(parse_sort::<Field>(Some("created_at")).is_err());
        assert!(parse_sort::<Field>(Some("price:asc")).is_err());
    }

    #[test]
    fn default_sort_is_most_recently_updated_first() {
        let sql = apply_sort::<_, Field>(
            Orders::find(),
            &[],
            (orders::Column::UpdatedAt, SortDirection::Desc),
            orders::Column::Id,
        )
        .build(DbBackend::Postgres)
        .to_string();

        assert!(
            sql.ends_with(r#"ORDER BY "orders"."updated_at" DESC, "orders"."id" ASC"#),
            "{sql}"
        );
    }

    #[test]
    fn requested_sort_replaces_default_and_paginates_last() {
        let sort = vec![
            SortSpec::new(Field::OrderDate, SortDirection::Asc),
            SortSpec::new(Field::CreatedAt, SortDirection::Desc),
        ];
        let query = apply_sort(
            Orders::find(),
            &sort,
            (orders::Column::UpdatedAt, SortDirection::Desc),
            orders::Column::Id,
        );
        let sql = apply_pagination(query, PageRequest { page: 3, limit: 10 })
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(
            r#"ORDER BY "orders"."order_date" ASC, "orders"."created_at" DESC, "orders"."id" ASC"#
        ));
        assert!(!sql.contains("updated_at\" DESC"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 20"));
    }

    #[test]
    fn blank_and_zero_filters_are_ignored() {
        assert_eq!(positive_id(Some(0)), None);
        assert_eq!(positive_id(Some(7)), Some(7));
        assert_eq!(non_blank(&Some("   ".into())), None);
        assert_eq!(non_blank(&Some(" NEW ".into())), Some("NEW"));
        assert_eq!(non_blank(&None), None);
    }
}

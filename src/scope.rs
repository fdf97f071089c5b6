// Request scope - pagination and ordering taken from raw query parameters
//
// Nothing in here fails. Out of range or unparsable numbers fall back to
// their default (not to the nearest bound), malformed order tokens and
// columns outside the filter's whitelist are dropped.

use crate::filter::column;
use crate::order::{parse_order_list, OrderBy};
use sea_query::SelectStatement;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const LIMIT_QUERY: &str = "limit";
pub const SKIP_QUERY: &str = "skip";
pub const ORDER_BY_QUERY: &str = "order_by";

pub const LIMIT_DEFAULT: u64 = 50;
pub const LIMIT_RANGE: RangeInclusive<u64> = 1..=100;

pub const SKIP_DEFAULT: u64 = 0;
pub const SKIP_RANGE: RangeInclusive<u64> = 0..=i32::MAX as u64;

/// Columns a filter entity lets callers sort by.
pub trait OrderColumns {
    fn order_columns(&self) -> &[&'static str];
}

/// Read access to raw query parameters, repeated keys included.
pub trait QueryParams {
    fn first(&self, key: &str) -> Option<&str>;
    fn all(&self, key: &str) -> Vec<&str>;
}

impl QueryParams for [(String, String)] {
    fn first(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<&str> {
        self.iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Parse `input`, returning `default` when it is missing, unparsable or
/// outside `range`.
pub fn parse_bounded<T>(input: Option<&str>, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + PartialOrd,
{
    input
        .and_then(|raw| raw.parse::<T>().ok())
        .filter(|value| range.contains(value))
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope<F> {
    pub limit: u64,
    pub skip: u64,
    /// Already restricted to the filter's order columns.
    pub order_by: Vec<OrderBy>,
    pub filter: F,
}

impl<F: OrderColumns> RequestScope<F> {
    /// Defaults only: first page, no ordering.
    pub fn new(filter: F) -> Self {
        RequestScope {
            limit: LIMIT_DEFAULT,
            skip: SKIP_DEFAULT,
            order_by: Vec::new(),
            filter,
        }
    }

    pub fn parse<P: QueryParams + ?Sized>(params: &P, filter: F) -> Self {
        RequestScope::from_parts(
            params.first(LIMIT_QUERY),
            params.first(SKIP_QUERY),
            &params.all(ORDER_BY_QUERY),
            filter,
        )
    }

    pub fn from_parts<S: AsRef<str>>(
        limit: Option<&str>,
        skip: Option<&str>,
        order_tokens: &[S],
        filter: F,
    ) -> Self {
        let allowed = filter.order_columns();
        let order_by = parse_order_list(order_tokens)
            .into_iter()
            .filter(|order| allowed.contains(&order.field.as_str()))
            .collect();

        RequestScope {
            limit: parse_bounded(limit, LIMIT_DEFAULT, LIMIT_RANGE),
            skip: parse_bounded(skip, SKIP_DEFAULT, SKIP_RANGE),
            order_by,
            filter,
        }
    }

    /// Order, then offset, then limit. Sort columns are qualified with
    /// `table` so they stay unambiguous once ancestors are joined in.
    pub fn apply(&self, query: &mut SelectStatement, table: &str) {
        for order in &self.order_by {
            query.order_by_expr(column(table, &order.field).into(), order.direction.into());
        }
        query.offset(self.skip);
        query.limit(self.limit);
    }
}

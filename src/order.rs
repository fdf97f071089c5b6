// Order tokens - "<field> <direction>" as sent in `order_by`
//
// A token that does not split into exactly two parts is dropped. An unknown
// direction falls back to ascending.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between field and direction inside a token.
const SEPARATOR: char = ' ';

// ============================================================================
// DIRECTION
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive `asc` / `desc`. Anything else is `None`.
    pub fn from_text(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("asc") {
            Some(Direction::Asc)
        } else if text.eq_ignore_ascii_case("desc") {
            Some(Direction::Desc)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Direction> for sea_query::Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => sea_query::Order::Asc,
            Direction::Desc => sea_query::Order::Desc,
        }
    }
}

// ============================================================================
// ORDER BY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        OrderBy {
            field: field.into(),
            direction,
        }
    }

    /// Parse a single token. Returns `None` unless the token has exactly
    /// one separator with something on each side of it.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split(SEPARATOR);
        let (field, direction) = match (parts.next(), parts.next(), parts.next()) {
            (Some(field), Some(direction), None) => (field, direction),
            _ => return None,
        };

        if field.is_empty() {
            return None;
        }

        Some(OrderBy::new(
            field,
            Direction::from_text(direction).unwrap_or_default(),
        ))
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, SEPARATOR, self.direction)
    }
}

/// Parse every token, keeping the valid ones in their original order.
pub fn parse_order_list<S: AsRef<str>>(tokens: &[S]) -> Vec<OrderBy> {
    tokens
        .iter()
        .filter_map(|token| OrderBy::parse(token.as_ref()))
        .collect()
}

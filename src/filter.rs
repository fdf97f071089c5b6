// Entity filter - the per-level predicate builder
//
// Every field is optional. A `None` field adds no constraint, so a default
// filter matches every row of its level.

use sea_query::{Alias, Expr, LikeExpr, SimpleExpr};
use serde::{Deserialize, Serialize};

/// Escape used for LIKE patterns built from user input.
const LIKE_ESCAPE: char = '\\';

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Filter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Filter {
            name: Some(name.into()),
            ..Filter::default()
        }
    }

    /// Name filter from an optional path segment; an empty segment means no filter.
    pub fn by_optional_name(name: Option<&str>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Filter::by_name(name),
            _ => Filter::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.description.is_none()
    }

    /// Predicates against `table`, to be ANDed together.
    ///
    /// id and name match exactly, description matches as a substring.
    pub fn predicates(&self, table: &str) -> Vec<SimpleExpr> {
        let mut predicates = Vec::new();

        if let Some(id) = self.id {
            predicates.push(column(table, "id").eq(id));
        }

        if let Some(name) = &self.name {
            predicates.push(column(table, "name").eq(name.as_str()));
        }

        if let Some(description) = &self.description {
            let pattern = format!("%{}%", escape_like_wildcards(description));
            predicates.push(
                column(table, "description").like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
            );
        }

        predicates
    }
}

pub(crate) fn column(table: &str, name: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(name)))
}

fn escape_like_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Query, SqliteQueryBuilder};

    fn render(filter: &Filter) -> String {
        let mut query = Query::select();
        query.column(Alias::new("id")).from(Alias::new("t"));
        for predicate in filter.predicates("t") {
            query.and_where(predicate);
        }
        query.to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_empty_filter_has_no_predicates() {
        let filter = Filter::default();
        assert!(filter.is_empty());
        assert!(filter.predicates("food_categories").is_empty());
        assert!(!render(&filter).contains("WHERE"));
    }

    #[test]
    fn test_each_field_becomes_a_predicate() {
        let filter = Filter {
            id: Some(7),
            name: Some("grains".to_string()),
            description: Some("seed".to_string()),
        };
        assert_eq!(filter.predicates("t").len(), 3);

        let sql = render(&filter);
        assert!(sql.contains(r#""t"."id" = 7"#), "{sql}");
        assert!(sql.contains(r#""t"."name" = 'grains'"#), "{sql}");
        assert!(sql.contains(r#""t"."description" LIKE '%seed%'"#), "{sql}");
        assert!(sql.contains(" AND "), "{sql}");
    }

    #[test]
    fn test_empty_string_name_is_still_a_constraint() {
        // Some("") is an explicit filter, unlike None
        let filter = Filter {
            name: Some(String::new()),
            ..Filter::default()
        };
        assert!(!filter.is_empty());
        assert_eq!(filter.predicates("t").len(), 1);
    }

    #[test]
    fn test_by_optional_name() {
        assert!(Filter::by_optional_name(None).is_empty());
        assert!(Filter::by_optional_name(Some("")).is_empty());
        assert_eq!(
            Filter::by_optional_name(Some("fruit")),
            Filter::by_name("fruit")
        );
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like_wildcards("50%_off"), r"50\%\_off");
        assert_eq!(escape_like_wildcards(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_predicates_do_not_consume_filter() {
        let filter = Filter::by_name("dairy");
        let first = filter.predicates("a").len();
        let second = filter.predicates("b").len();
        assert_eq!(first, second);
        assert_eq!(filter, Filter::by_name("dairy"));
    }
}

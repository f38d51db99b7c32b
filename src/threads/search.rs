//! Category search: tokenizing the query and building the matching SQL.

use sqlx::{Postgres, QueryBuilder};

use crate::models::normalize_terms;
use crate::store::MatchMode;

/// A parsed category search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// The query held no terms; callers show the unfiltered list
    NoOp,
    Categories { terms: Vec<String>, mode: MatchMode },
}

impl SearchFilter {
    pub fn is_noop(&self) -> bool {
        matches!(self, SearchFilter::NoOp)
    }
}

/// Turn a raw search string into a filter
pub fn build_search_filter(raw_query: &str, mode: MatchMode) -> SearchFilter {
    let terms = normalize_terms(raw_query);
    if terms.is_empty() {
        SearchFilter::NoOp
    } else {
        SearchFilter::Categories { terms, mode }
    }
}

/// Query selecting threads by category.
///
/// `Any` keeps threads linked to at least one of `terms`; `All` keeps
/// threads whose count of distinct matching categories equals the number
/// of terms. Each term is a bound parameter.
pub fn category_search_query(terms: &[String], mode: MatchMode) -> QueryBuilder<'static, Postgres> {
    let select = match mode {
        MatchMode::Any => "SELECT DISTINCT p.*",
        MatchMode::All => "SELECT p.*",
    };

    let mut query = QueryBuilder::new(select);
    query.push(
        " FROM posts p \
         JOIN posts_categories pc ON pc.post_id = p.id \
         JOIN categories c ON c.id = pc.category_id \
         WHERE p.title <> '' AND c.name IN (",
    );

    let mut names = query.separated(", ");
    for term in terms {
        names.push_bind(term.clone());
    }
    names.push_unseparated(")");

    if mode == MatchMode::All {
        query
            .push(" GROUP BY p.id HAVING COUNT(DISTINCT c.name) = ")
            .push_bind(terms.len() as i64);
    }

    query.push(" ORDER BY p.id ASC");
    query
}

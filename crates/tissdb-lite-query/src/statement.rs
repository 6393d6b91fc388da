//! `SELECT ... FROM <collection> [WHERE <condition>]` statements.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExpressionError;

static FROM_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)FROM\s+([A-Za-z0-9_]+)").expect("valid FROM regex"));

static WHERE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)WHERE\s+(.*)").expect("valid WHERE regex"));

/// A parsed `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Collection named by the `FROM` clause.
    pub collection: String,
    /// Raw `WHERE` condition, empty when there is none.
    pub condition: String,
}

/// Extract the collection and condition from a `SELECT` statement.
///
/// Only the `FROM` and `WHERE` clauses are inspected; the projection list is
/// ignored and every field is returned.
///
/// # Errors
///
/// Returns `ExpressionError::MissingFromClause` if there is no `FROM` clause.
pub fn parse_statement(query: &str) -> Result<Statement, ExpressionError> {
    let collection = FROM_CLAUSE
        .captures(query)
        .and_then(|c| c.get(1))
        .ok_or(ExpressionError::MissingFromClause)?
        .as_str()
        .to_owned();
    let condition = WHERE_CLAUSE
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .unwrap_or_default();
    Ok(Statement {
        collection,
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_select_with_where() {
        let stmt = parse_statement("SELECT * FROM users WHERE age > 30").unwrap();
        assert_eq!(stmt.collection, "users");
        assert_eq!(stmt.condition, "age > 30");
    }

    #[test]
    fn test_should_parse_select_without_where() {
        let stmt = parse_statement("select name from people_2").unwrap();
        assert_eq!(stmt.collection, "people_2");
        assert_eq!(stmt.condition, "");
    }

    #[test]
    fn test_should_keep_where_clause_verbatim() {
        let stmt =
            parse_statement("SELECT * FROM users where (role = \"admin\" OR age < 25)  ").unwrap();
        assert_eq!(stmt.condition, "(role = \"admin\" OR age < 25)");
    }

    #[test]
    fn test_should_require_from_clause() {
        let err = parse_statement("SELECT * WHERE a = 1").unwrap_err();
        assert_eq!(err, ExpressionError::MissingFromClause);
        assert_eq!(err.to_string(), "Invalid TissQL query: Missing FROM clause.");
    }
}

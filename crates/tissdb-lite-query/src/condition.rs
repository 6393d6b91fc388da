//! A condition compiled once and reused for many evaluations.

use std::fmt;

use crate::compiler::{Program, compile};
use crate::config::QueryConfig;
use crate::error::ExpressionError;
use crate::evaluator::{Document, evaluate};
use crate::filter::{FilterCapability, build_filter};
use crate::lexer::{tokenize, tokenize_strict};

/// Source text of a condition together with its compiled program.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    program: Program,
}

impl Condition {
    /// Compile a condition with permissive lexing.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError::MismatchedParentheses` for unbalanced input.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Self::parse_with(source, &QueryConfig::default())
    }

    /// Compile a condition under `config`.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError::MismatchedParentheses` for unbalanced input,
    /// or `ExpressionError::UnexpectedCharacter` when strict lexing rejects
    /// the input.
    pub fn parse_with(source: &str, config: &QueryConfig) -> Result<Self, ExpressionError> {
        let tokens = if config.strict_lexing {
            tokenize_strict(source)?
        } else {
            tokenize(source)
        };
        Ok(Self {
            source: source.to_owned(),
            program: compile(tokens)?,
        })
    }

    /// The text the condition was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled program.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Whether the condition matches every record.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.program.is_empty()
    }

    /// Evaluate the condition against a record.
    ///
    /// # Errors
    ///
    /// See [`evaluate`].
    pub fn matches<D: Document + ?Sized>(&self, record: &D) -> Result<bool, ExpressionError> {
        evaluate(&self.program, record)
    }

    /// Build a remote filter for the condition.
    ///
    /// # Errors
    ///
    /// See [`build_filter`].
    pub fn to_filter<C: FilterCapability + ?Sized>(
        &self,
        capability: Option<&C>,
    ) -> Result<Option<C::Filter>, ExpressionError> {
        build_filter(&self.program, capability)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::filter::{DocumentFilters, Filter};
    use crate::token::{CompareOp, Literal};

    #[test]
    fn test_should_compile_and_match() {
        let cond = Condition::parse("age > 30 AND role = \"admin\"").unwrap();
        let serde_json::Value::Object(bob) = json!({"age": 40, "role": "admin"}) else {
            unreachable!()
        };
        assert!(cond.matches(&bob).unwrap());
        assert_eq!(cond.source(), "age > 30 AND role = \"admin\"");
        assert_eq!(cond.program().len(), 7);
    }

    #[test]
    fn test_should_report_match_all_for_blank_condition() {
        assert!(Condition::parse("").unwrap().is_match_all());
        assert!(!Condition::parse("a = 1").unwrap().is_match_all());
    }

    #[test]
    fn test_should_build_filter() {
        let cond = Condition::parse("name = \"Eve\"").unwrap();
        assert_eq!(
            cond.to_filter(Some(&DocumentFilters)).unwrap(),
            Some(Filter::compare(
                "name",
                CompareOp::Eq,
                Literal::String("Eve".to_owned())
            ))
        );
    }

    #[test]
    fn test_should_apply_strict_lexing_from_config() {
        let strict = QueryConfig {
            strict_lexing: true,
        };
        assert!(Condition::parse("age > 30 #").is_ok());
        assert!(matches!(
            Condition::parse_with("age > 30 #", &strict),
            Err(ExpressionError::UnexpectedCharacter { ch: '#', .. })
        ));
    }

    #[test]
    fn test_should_propagate_parenthesis_errors() {
        assert_eq!(
            Condition::parse("(a = 1").unwrap_err(),
            ExpressionError::MismatchedParentheses
        );
    }
}

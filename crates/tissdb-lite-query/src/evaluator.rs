//! Local evaluation of compiled conditions against in-memory records.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::compiler::Program;
use crate::error::ExpressionError;
use crate::interpreter::{Interpreter, interpret};
use crate::token::{CompareOp, Literal, LogicalOp, Operator};
use crate::value::Value;

/// A flat record that conditions can be evaluated against.
///
/// Only top-level fields are addressable; an absent field is
/// [`Value::Undefined`].
pub trait Document {
    /// Look up a top-level field.
    fn field(&self, name: &str) -> Value;
}

impl<S: BuildHasher> Document for HashMap<String, Value, S> {
    fn field(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }
}

impl Document for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }
}

impl Document for serde_json::Map<String, serde_json::Value> {
    fn field(&self, name: &str) -> Value {
        self.get(name).map(Value::from).unwrap_or_default()
    }
}

impl<D: Document + ?Sized> Document for &D {
    fn field(&self, name: &str) -> Value {
        (**self).field(name)
    }
}

/// Interpreter whose operands are resolved [`Value`]s of one record.
#[derive(Debug)]
pub struct LocalEvaluator<'a, D: ?Sized> {
    record: &'a D,
}

impl<'a, D: Document + ?Sized> LocalEvaluator<'a, D> {
    /// Bind an evaluator to a record.
    #[must_use]
    pub fn new(record: &'a D) -> Self {
        Self { record }
    }
}

impl<D: Document + ?Sized> Interpreter for LocalEvaluator<'_, D> {
    type Operand = Value;

    fn identifier(&self, name: &str) -> Result<Value, ExpressionError> {
        Ok(self.record.field(name))
    }

    fn literal(&self, literal: &Literal) -> Result<Value, ExpressionError> {
        Ok(Value::from(literal))
    }

    fn compare(&self, op: CompareOp, left: Value, right: Value) -> Result<Value, ExpressionError> {
        Ok(Value::Bool(left.compare(op, &right)))
    }

    /// `AND` yields the left operand when it is falsy and the right one
    /// otherwise; `OR` yields the left operand when it is truthy.
    fn logical(&self, op: LogicalOp, left: Value, right: Value) -> Result<Value, ExpressionError> {
        let pick_left = match op {
            LogicalOp::And => !left.is_truthy(),
            LogicalOp::Or => left.is_truthy(),
        };
        Ok(if pick_left { left } else { right })
    }

    /// An operator short of operands sees `Undefined` in their place.
    fn missing_operand(&self, _op: Operator) -> Result<Value, ExpressionError> {
        Ok(Value::Undefined)
    }

    /// The bottom of the stack is the result; anything above it is ignored.
    fn finish(&self, stack: Vec<Value>) -> Result<Option<Value>, ExpressionError> {
        Ok(stack.into_iter().next())
    }
}

/// Evaluate a compiled condition against a record.
///
/// The bottom stack value is coerced to a boolean. An empty program matches
/// every record. Malformed programs (say, from input the lexer skipped) do
/// not fail: missing operands are `Undefined` and extra values are ignored.
///
/// # Errors
///
/// Returns `ExpressionError::MismatchedParentheses` if the program holds a
/// parenthesis. The record and the program are never modified.
pub fn evaluate<D: Document + ?Sized>(
    program: &Program,
    record: &D,
) -> Result<bool, ExpressionError> {
    let result = interpret(program, &LocalEvaluator::new(record))?;
    Ok(result.is_none_or(|v| v.is_truthy()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::compiler::compile;
    use crate::lexer::tokenize;

    fn program(input: &str) -> Program {
        compile(tokenize(input)).unwrap()
    }

    fn record(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("record must be a JSON object"),
        }
    }

    fn eval(input: &str, value: serde_json::Value) -> bool {
        evaluate(&program(input), &record(value)).unwrap()
    }

    #[test]
    fn test_should_evaluate_precedence_of_and_over_comparisons() {
        let cond = "age > 30 AND role = \"admin\"";
        assert!(eval(cond, json!({"age": 40, "role": "admin"})));
        assert!(!eval(cond, json!({"age": 20, "role": "admin"})));
    }

    #[test]
    fn test_should_evaluate_parenthesized_groups() {
        let cond = "(age = 30 OR age = 25) AND status = \"active\"";
        assert!(eval(cond, json!({"age": 30, "status": "active"})));
        assert!(!eval(cond, json!({"age": 30, "status": "inactive"})));
        assert!(eval(cond, json!({"age": 25, "status": "active"})));
        assert!(!eval(cond, json!({"age": 35, "status": "active"})));
    }

    #[test]
    fn test_should_not_match_missing_field() {
        assert!(!eval("missing_field = 5", json!({"age": 5})));
        assert!(eval("missing_field != 5", json!({"age": 5})));
        assert!(!eval("missing_field > 5", json!({})));
    }

    #[test]
    fn test_should_match_everything_with_empty_condition() {
        assert!(eval("", json!({})));
        assert!(eval("   ", json!({"age": 1})));
    }

    #[test]
    fn test_should_coerce_string_field_against_number_literal() {
        assert!(eval("age = 30", json!({"age": "30"})));
        assert!(eval("age >= 18", json!({"age": "21"})));
        assert!(!eval("age >= 18", json!({"age": "n/a"})));
    }

    #[test]
    fn test_should_compare_boolean_fields() {
        assert!(eval("active = 1", json!({"active": true})));
        assert!(eval("active != 1", json!({"active": false})));
    }

    #[test]
    fn test_should_coerce_bare_identifier_to_boolean() {
        assert!(eval("active", json!({"active": true})));
        assert!(!eval("active", json!({"active": 0})));
        assert!(!eval("active", json!({})));
        assert!(eval("name OR nickname", json!({"nickname": "Bo"})));
        assert!(!eval("name AND nickname", json!({"nickname": "Bo"})));
    }

    #[test]
    fn test_should_evaluate_with_hash_map_records() {
        let record = HashMap::from([
            ("age".to_owned(), Value::Number(31.0)),
            ("role".to_owned(), Value::from("admin")),
        ]);
        assert!(evaluate(&program("age > 30 AND role = \"admin\""), &record).unwrap());
    }

    #[test]
    fn test_should_evaluate_identically_after_recompiling() {
        let input = "score >= 2.5 OR (tier = \"gold\" AND score > 1)";
        let first = program(input);
        let second = program(input);
        for value in [
            json!({"score": 3}),
            json!({"score": 1.5, "tier": "gold"}),
            json!({"score": 1.5, "tier": "silver"}),
            json!({}),
        ] {
            let r = record(value);
            assert_eq!(evaluate(&first, &r).unwrap(), evaluate(&second, &r).unwrap());
        }
    }

    #[test]
    fn test_should_evaluate_malformed_program_leniently() {
        // `~` is skipped, leaving `age 30`: the bottom value decides.
        assert!(eval("age ~ 30", json!({"age": 40})));
        assert!(!eval("age ~ 30", json!({"age": 0})));
        // `age >` compares `Undefined > age`.
        assert!(!eval("age >", json!({"age": 1})));
        assert!(!eval("AND", json!({})));
        assert!(eval("= 5 OR name", json!({"name": "x"})));
    }

    #[test]
    fn test_should_share_program_across_threads() {
        let program = program("n > 10");
        std::thread::scope(|scope| {
            for i in 0..4 {
                let program = &program;
                scope.spawn(move || {
                    let r = record(json!({"n": i * 10}));
                    assert_eq!(evaluate(program, &r).unwrap(), i * 10 > 10);
                });
            }
        });
    }
}

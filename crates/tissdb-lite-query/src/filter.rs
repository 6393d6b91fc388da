//! Remote filter construction from compiled conditions.
//!
//! A remote document store does not receive a predicate; it receives a
//! declarative filter built through its own API. [`FilterCapability`] is that
//! API, and [`FilterBuilder`] drives it from a postfix [`Program`] using the
//! same stack machine as local evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compiler::Program;
use crate::error::ExpressionError;
use crate::evaluator::Document;
use crate::interpreter::{Interpreter, interpret};
use crate::token::{CompareOp, Literal, LogicalOp};
use crate::value::Value;

/// A remote store's filter construction API.
pub trait FilterCapability {
    /// The store's filter representation.
    type Filter;

    /// Build a leaf filter `field op value`.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError::UnsupportedOperator` if the store cannot
    /// express `op`.
    fn compare(
        &self,
        field: &str,
        op: CompareOp,
        value: &Literal,
    ) -> Result<Self::Filter, ExpressionError>;

    /// Combine two filters so both must match.
    fn and(&self, left: Self::Filter, right: Self::Filter) -> Self::Filter;

    /// Combine two filters so either may match.
    fn or(&self, left: Self::Filter, right: Self::Filter) -> Self::Filter;
}

/// A composed, serializable filter tree.
///
/// A long condition builds a tree as deep as it has terms, so matching,
/// printing, comparing and dropping walk the tree with an explicit stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Filter {
    /// Leaf comparison `field op value`.
    Compare {
        /// Field name.
        field: String,
        /// Comparison operator.
        op: CompareOp,
        /// Literal to compare against.
        value: Literal,
    },
    /// Both sides must match.
    And {
        /// Left-hand filter.
        left: Box<Filter>,
        /// Right-hand filter.
        right: Box<Filter>,
    },
    /// Either side may match.
    Or {
        /// Left-hand filter.
        left: Box<Filter>,
        /// Right-hand filter.
        right: Box<Filter>,
    },
}

impl Filter {
    /// Leaf comparison.
    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, value: Literal) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Disjunction of `self` and `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Match the filter against a record with the local comparison policy.
    ///
    /// This is what a store receiving the filter is expected to do; it is
    /// used to serve filters from in-process stores.
    #[must_use]
    pub fn matches<D: Document + ?Sized>(&self, doc: &D) -> bool {
        enum Step<'f> {
            Visit(&'f Filter),
            Combine(LogicalOp),
        }

        let mut steps = vec![Step::Visit(self)];
        let mut results: Vec<bool> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(Self::Compare { field, op, value }) => {
                    results.push(doc.field(field).compare(*op, &Value::from(value)));
                }
                Step::Visit(node) => {
                    if let Some((op, left, right)) = node.branches() {
                        steps.extend([Step::Combine(op), Step::Visit(right), Step::Visit(left)]);
                    }
                }
                Step::Combine(op) => {
                    let right = results.pop().unwrap_or(false);
                    let left = results.pop().unwrap_or(false);
                    results.push(match op {
                        LogicalOp::And => left && right,
                        LogicalOp::Or => left || right,
                    });
                }
            }
        }
        results.pop().unwrap_or(false)
    }

    /// Operator and children of a composite node.
    fn branches(&self) -> Option<(LogicalOp, &Filter, &Filter)> {
        match self {
            Self::Compare { .. } => None,
            Self::And { left, right } => Some((LogicalOp::And, left, right)),
            Self::Or { left, right } => Some((LogicalOp::Or, left, right)),
        }
    }

    /// A leaf that owns no heap memory.
    fn empty_leaf() -> Self {
        Self::Compare {
            field: String::new(),
            op: CompareOp::Eq,
            value: Literal::Number(0.0),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'f> {
            Node(&'f Filter),
            Text(&'static str),
        }

        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(Self::Compare { field, op, value }) => {
                    write!(f, "{field} {op} {value}")?;
                }
                Piece::Node(node) => {
                    if let Some((op, left, right)) = node.branches() {
                        let joiner = match op {
                            LogicalOp::And => " AND ",
                            LogicalOp::Or => " OR ",
                        };
                        f.write_str("(")?;
                        pieces.extend([
                            Piece::Text(")"),
                            Piece::Node(right),
                            Piece::Text(joiner),
                            Piece::Node(left),
                        ]);
                    }
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some((a, b)) = pairs.pop() {
            match (a.branches(), b.branches()) {
                (Some((op_a, left_a, right_a)), Some((op_b, left_b, right_b))) => {
                    if op_a != op_b {
                        return false;
                    }
                    pairs.extend([(left_a, left_b), (right_a, right_b)]);
                }
                (None, None) => {
                    let (
                        Self::Compare { field, op, value },
                        Self::Compare {
                            field: other_field,
                            op: other_op,
                            value: other_value,
                        },
                    ) = (a, b)
                    else {
                        return false;
                    };
                    if field != other_field || op != other_op || value != other_value {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut filter) = pending.pop() {
            detach_children(&mut filter, &mut pending);
        }
    }
}

/// Move composite children out of `filter`, leaving empty leaves behind.
fn detach_children(filter: &mut Filter, pending: &mut Vec<Filter>) {
    if let Filter::And { left, right } | Filter::Or { left, right } = filter {
        for child in [left, right] {
            if child.branches().is_some() {
                pending.push(std::mem::replace(&mut **child, Filter::empty_leaf()));
            }
        }
    }
}

/// The bundled capability producing [`Filter`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentFilters;

impl FilterCapability for DocumentFilters {
    type Filter = Filter;

    fn compare(
        &self,
        field: &str,
        op: CompareOp,
        value: &Literal,
    ) -> Result<Filter, ExpressionError> {
        Ok(Filter::compare(field, op, value.clone()))
    }

    fn and(&self, left: Filter, right: Filter) -> Filter {
        left.and(right)
    }

    fn or(&self, left: Filter, right: Filter) -> Filter {
        left.or(right)
    }
}

/// Stack operand while building a filter: tokens push themselves, operators
/// push built filters.
#[derive(Debug)]
pub enum FilterOperand<F> {
    /// An identifier, not yet resolved.
    Field(String),
    /// A literal, not yet resolved.
    Value(Literal),
    /// A built filter.
    Filter(F),
}

impl<F> FilterOperand<F> {
    fn describe(&self) -> String {
        match self {
            Self::Field(name) => format!("field '{name}'"),
            Self::Value(lit) => format!("literal {lit}"),
            Self::Filter(_) => "filter".to_owned(),
        }
    }
}

/// Interpreter whose operands are filter nodes of a [`FilterCapability`].
#[derive(Debug)]
pub struct FilterBuilder<'a, C: ?Sized> {
    capability: &'a C,
}

impl<'a, C: FilterCapability + ?Sized> FilterBuilder<'a, C> {
    /// Bind a builder to a capability.
    #[must_use]
    pub fn new(capability: &'a C) -> Self {
        Self { capability }
    }
}

impl<C: FilterCapability + ?Sized> Interpreter for FilterBuilder<'_, C> {
    type Operand = FilterOperand<C::Filter>;

    fn identifier(&self, name: &str) -> Result<Self::Operand, ExpressionError> {
        Ok(FilterOperand::Field(name.to_owned()))
    }

    fn literal(&self, literal: &Literal) -> Result<Self::Operand, ExpressionError> {
        Ok(FilterOperand::Value(literal.clone()))
    }

    fn compare(
        &self,
        op: CompareOp,
        left: Self::Operand,
        right: Self::Operand,
    ) -> Result<Self::Operand, ExpressionError> {
        match (left, right) {
            (FilterOperand::Field(field), FilterOperand::Value(value)) => self
                .capability
                .compare(&field, op, &value)
                .map(FilterOperand::Filter),
            (left, right) => Err(ExpressionError::InvalidOperandRole {
                operator: op.symbol().to_owned(),
                message: format!(
                    "expected a field on the left and a literal on the right, found {} and {}",
                    left.describe(),
                    right.describe()
                ),
            }),
        }
    }

    fn logical(
        &self,
        op: LogicalOp,
        left: Self::Operand,
        right: Self::Operand,
    ) -> Result<Self::Operand, ExpressionError> {
        match (left, right) {
            (FilterOperand::Filter(l), FilterOperand::Filter(r)) => {
                Ok(FilterOperand::Filter(match op {
                    LogicalOp::And => self.capability.and(l, r),
                    LogicalOp::Or => self.capability.or(l, r),
                }))
            }
            (left, right) => Err(ExpressionError::InvalidOperandRole {
                operator: op.symbol().to_owned(),
                message: format!(
                    "expected two conditions, found {} and {}",
                    left.describe(),
                    right.describe()
                ),
            }),
        }
    }
}

/// Build a remote filter from a compiled condition.
///
/// Returns `Ok(None)` for an empty program (no filtering).
///
/// # Errors
///
/// Returns `ExpressionError::CapabilityUnavailable` when `capability` is
/// `None`, `ExpressionError::InvalidOperandRole` when operands are in the
/// wrong position (e.g. `30 = age`) or the condition does not reduce to a
/// filter, and any error raised by the capability.
pub fn build_filter<C: FilterCapability + ?Sized>(
    program: &Program,
    capability: Option<&C>,
) -> Result<Option<C::Filter>, ExpressionError> {
    let capability = capability.ok_or(ExpressionError::CapabilityUnavailable)?;
    match interpret(program, &FilterBuilder::new(capability))? {
        None => Ok(None),
        Some(FilterOperand::Filter(filter)) => Ok(Some(filter)),
        Some(other) => Err(ExpressionError::InvalidOperandRole {
            operator: "condition".to_owned(),
            message: format!("expected a comparison, found {}", other.describe()),
        }),
    }
}

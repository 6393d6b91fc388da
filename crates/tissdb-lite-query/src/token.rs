//! Token types shared by the lexer, compiler, and interpreters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExpressionError;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal (`=`).
    #[serde(rename = "=")]
    Eq,
    /// Not equal (`!=`).
    #[serde(rename = "!=")]
    Ne,
    /// Greater than (`>`).
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal (`>=`).
    #[serde(rename = ">=")]
    Ge,
    /// Less than (`<`).
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal (`<=`).
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    /// The operator as written in a condition.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl LogicalOp {
    /// The operator keyword in its normalized (uppercase) form.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op b op c` groups as `(a op b) op c`.
    Left,
    /// `a op b op c` groups as `a op (b op c)`.
    Right,
}

/// A binary operator, either a comparison or a logical combinator.
///
/// Logical operators bind looser (precedence 1) than comparisons
/// (precedence 2). All operators are left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`, `!=`, `>`, `>=`, `<`, `<=`.
    Compare(CompareOp),
    /// `AND`, `OR`.
    Logical(LogicalOp),
}

impl Operator {
    /// The operator as written in a condition.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Compare(op) => op.symbol(),
            Self::Logical(op) => op.symbol(),
        }
    }

    /// Binding strength used by the shunting-yard compiler.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Self::Logical(_) => 1,
            Self::Compare(_) => 2,
        }
    }

    /// Grouping for operators of equal precedence.
    #[must_use]
    pub fn associativity(self) -> Associativity {
        Associativity::Left
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "=" => Self::Compare(CompareOp::Eq),
            "!=" => Self::Compare(CompareOp::Ne),
            ">" => Self::Compare(CompareOp::Gt),
            ">=" => Self::Compare(CompareOp::Ge),
            "<" => Self::Compare(CompareOp::Lt),
            "<=" => Self::Compare(CompareOp::Le),
            _ if s.eq_ignore_ascii_case("and") => Self::Logical(LogicalOp::And),
            _ if s.eq_ignore_ascii_case("or") => Self::Logical(LogicalOp::Or),
            _ => {
                return Err(ExpressionError::UnsupportedOperator {
                    symbol: s.to_owned(),
                });
            }
        };
        Ok(op)
    }
}

/// A literal value written in a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// A double-quoted string, quotes stripped.
    String(String),
    /// A bare numeric literal.
    Number(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Lexer token for condition strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A comparison or logical operator.
    Operator(Operator),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// A field name.
    Identifier(String),
    /// A string or number literal.
    Literal(Literal),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator(op) => write!(f, "{op}"),
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
            Self::Identifier(name) => f.write_str(name),
            Self::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

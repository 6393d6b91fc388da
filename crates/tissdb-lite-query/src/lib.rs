//! Condition expression engine for TissDB Lite.
//!
//! A condition such as `age > 30 AND (role = "admin" OR status = "active")`
//! is compiled once and then executed by one of two interpreters:
//!
//! 1. **Lexing**: [`tokenize`] turns the text into a flat token stream.
//! 2. **Compiling**: [`compile`] reorders the tokens into a postfix
//!    [`Program`] with the shunting-yard algorithm.
//! 3. **Interpreting**: the same program is either evaluated against a
//!    record ([`evaluate`]) or turned into a composable [`Filter`] for a
//!    remote document store ([`build_filter`]).
//!
//! Everything in this crate is synchronous and free of shared mutable state;
//! a compiled [`Program`] can be shared across threads and evaluated
//! concurrently.

pub mod compiler;
pub mod condition;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod interpreter;
pub mod lexer;
pub mod statement;
pub mod token;
pub mod value;

pub use compiler::{Program, compile};
pub use condition::Condition;
pub use config::QueryConfig;
pub use error::ExpressionError;
pub use evaluator::{Document, LocalEvaluator, evaluate};
pub use filter::{
    DocumentFilters, Filter, FilterBuilder, FilterCapability, FilterOperand, build_filter,
};
pub use interpreter::{Interpreter, interpret};
pub use lexer::{tokenize, tokenize_strict};
pub use statement::{Statement, parse_statement};
pub use token::{Associativity, CompareOp, Literal, LogicalOp, Operator, Token};
pub use value::Value;

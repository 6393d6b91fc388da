//! Error type shared by every stage of the condition pipeline.

/// Errors produced while lexing, compiling, or interpreting a condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// Parentheses are unbalanced: a `)` without a matching `(`, or a `(`
    /// left open at the end of the input.
    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    /// An operator symbol is not part of the condition language, or the
    /// active filter capability cannot express it.
    #[error("Unsupported operator {symbol}")]
    UnsupportedOperator {
        /// The offending symbol.
        symbol: String,
    },

    /// A remote filter was requested but no remote filter capability is
    /// available in this environment.
    #[error("Remote filter capability is not available in this environment")]
    CapabilityUnavailable,

    /// An operator received operands of the wrong role while building a
    /// remote filter (e.g. `30 = age`).
    #[error("Invalid operand for {operator}: {message}")]
    InvalidOperandRole {
        /// The operator being applied.
        operator: String,
        /// Explanation.
        message: String,
    },

    /// An operator found fewer than two operands on the stack.
    #[error("Missing operand for {operator}")]
    MissingOperand {
        /// The operator being applied.
        operator: String,
    },

    /// More than one value was left on the stack after evaluation.
    #[error("Malformed condition: {count} values left after evaluation")]
    DanglingOperands {
        /// Number of values left on the stack.
        count: usize,
    },

    /// Strict lexing found a character that starts no token.
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The character.
        ch: char,
        /// Byte offset into the input.
        position: usize,
    },

    /// A numeric literal could not be parsed.
    #[error("Invalid number literal: {text}")]
    InvalidNumber {
        /// The literal text.
        text: String,
    },

    /// A `SELECT` statement has no `FROM` clause.
    #[error("Invalid TissQL query: Missing FROM clause.")]
    MissingFromClause,
}

//! Shunting-yard compiler from infix tokens to a postfix [`Program`].

use std::fmt;

use tracing::debug;

use crate::error::ExpressionError;
use crate::token::{Associativity, Operator, Token};

/// A compiled condition: tokens in postfix (reverse-Polish) order.
///
/// Operands precede the operator that consumes them, so the program can be
/// executed with a single value stack and no precedence handling. A program
/// never contains parenthesis tokens and cannot be modified once compiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    instructions: Vec<Token>,
}

impl Program {
    /// The instructions in evaluation order.
    #[must_use]
    pub fn instructions(&self) -> &[Token] {
        &self.instructions
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions (an empty condition).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.instructions.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Entry on the operator stack.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Operator(Operator),
    LeftParen,
}

/// Reorder an infix token sequence into postfix order.
///
/// # Errors
///
/// Returns `ExpressionError::MismatchedParentheses` if a `)` has no matching
/// `(` or a `(` is never closed. No partial program is produced on failure.
pub fn compile(tokens: impl IntoIterator<Item = Token>) -> Result<Program, ExpressionError> {
    let mut output = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();

    for token in tokens {
        match token {
            Token::Identifier(_) | Token::Literal(_) => output.push(token),
            Token::Operator(op) => {
                while let Some(&Pending::Operator(top)) = stack.last() {
                    if !binds_before(top, op) {
                        break;
                    }
                    output.push(Token::Operator(top));
                    stack.pop();
                }
                stack.push(Pending::Operator(op));
            }
            Token::LeftParen => stack.push(Pending::LeftParen),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Pending::Operator(op)) => output.push(Token::Operator(op)),
                    Some(Pending::LeftParen) => break,
                    None => return Err(ExpressionError::MismatchedParentheses),
                }
            },
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Operator(op) => output.push(Token::Operator(op)),
            Pending::LeftParen => return Err(ExpressionError::MismatchedParentheses),
        }
    }

    let program = Program {
        instructions: output,
    };
    debug!(program = %program, "compiled condition");
    Ok(program)
}

/// Whether the stacked operator `top` must be emitted before `incoming` is
/// pushed.
fn binds_before(top: Operator, incoming: Operator) -> bool {
    top.precedence() > incoming.precedence()
        || (top.precedence() == incoming.precedence()
            && incoming.associativity() == Associativity::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn rpn(input: &str) -> String {
        compile(tokenize(input)).unwrap().to_string()
    }

    #[test]
    fn test_should_compile_single_comparison() {
        assert_eq!(rpn("age > 30"), "age 30 >");
    }

    #[test]
    fn test_should_bind_comparisons_tighter_than_logical_operators() {
        assert_eq!(
            rpn("age > 30 AND role = \"admin\""),
            "age 30 > role \"admin\" = AND"
        );
    }

    #[test]
    fn test_should_group_equal_precedence_left_to_right() {
        assert_eq!(
            rpn("a = 1 OR b = 2 AND c = 3"),
            "a 1 = b 2 = OR c 3 = AND"
        );
    }

    #[test]
    fn test_should_honor_parentheses() {
        assert_eq!(
            rpn("(age = 30 OR age = 25) AND status = \"active\""),
            "age 30 = age 25 = OR status \"active\" = AND"
        );
        assert_eq!(
            rpn("a = 1 OR (b = 2 AND c = 3)"),
            "a 1 = b 2 = c 3 = AND OR"
        );
    }

    #[test]
    fn test_should_drop_parentheses_from_program() {
        let program = compile(tokenize("((a = 1))")).unwrap();
        assert!(
            program
                .instructions()
                .iter()
                .all(|t| !matches!(t, Token::LeftParen | Token::RightParen))
        );
        assert_eq!(program.len(), 3);
    }

    #[test]
    fn test_should_compile_empty_input_to_empty_program() {
        let program = compile(tokenize("")).unwrap();
        assert!(program.is_empty());
        assert_eq!(program.to_string(), "");
    }

    #[test]
    fn test_should_reject_unmatched_close_paren() {
        for input in ["a = 1)", ")", "(a = 1))", "a = 1) AND (b = 2"] {
            assert_eq!(
                compile(tokenize(input)).unwrap_err(),
                ExpressionError::MismatchedParentheses,
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_should_reject_unclosed_open_paren() {
        for input in ["(a = 1", "(", "((a = 1)", "a = 1 AND (b = 2"] {
            assert_eq!(
                compile(tokenize(input)).unwrap_err(),
                ExpressionError::MismatchedParentheses,
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_should_compile_identically_twice() {
        let input = "x >= 1 AND (y < 2 OR z != \"q\")";
        assert_eq!(
            compile(tokenize(input)).unwrap(),
            compile(tokenize(input)).unwrap()
        );
    }

    #[test]
    fn test_should_not_validate_arity() {
        assert_eq!(rpn("age >"), "age >");
    }
}

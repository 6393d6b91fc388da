//! Stack machine shared by every backend that executes a [`Program`].
//!
//! A backend only decides what an operand *is* (a resolved value, a filter
//! node, ...) and how operators combine operands; the stack discipline lives
//! here once.

use crate::compiler::Program;
use crate::error::ExpressionError;
use crate::token::{CompareOp, Literal, LogicalOp, Operator, Token};

/// An operand domain for executing postfix programs.
pub trait Interpreter {
    /// The value kept on the evaluation stack.
    type Operand;

    /// Produce the operand for a field reference.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn identifier(&self, name: &str) -> Result<Self::Operand, ExpressionError>;

    /// Produce the operand for a literal.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn literal(&self, literal: &Literal) -> Result<Self::Operand, ExpressionError>;

    /// Combine two operands with a comparison operator.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn compare(
        &self,
        op: CompareOp,
        left: Self::Operand,
        right: Self::Operand,
    ) -> Result<Self::Operand, ExpressionError>;

    /// Combine two operands with a logical operator.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn logical(
        &self,
        op: LogicalOp,
        left: Self::Operand,
        right: Self::Operand,
    ) -> Result<Self::Operand, ExpressionError>;

    /// Operand used when `op` finds the stack empty.
    ///
    /// # Errors
    ///
    /// Defaults to `ExpressionError::MissingOperand`.
    fn missing_operand(&self, op: Operator) -> Result<Self::Operand, ExpressionError> {
        Err(ExpressionError::MissingOperand {
            operator: op.symbol().to_owned(),
        })
    }

    /// Reduce the stack left after the last instruction to the result.
    ///
    /// # Errors
    ///
    /// Defaults to `ExpressionError::DanglingOperands` when more than one
    /// value remains.
    fn finish(
        &self,
        mut stack: Vec<Self::Operand>,
    ) -> Result<Option<Self::Operand>, ExpressionError> {
        match stack.len() {
            0 | 1 => Ok(stack.pop()),
            count => Err(ExpressionError::DanglingOperands { count }),
        }
    }
}

/// Execute `program` with `interpreter`.
///
/// Each operator pops its right operand, then its left operand, and pushes
/// the combination. Both operands are always fully evaluated first. A short
/// stack and leftover values are handed to [`Interpreter::missing_operand`]
/// and [`Interpreter::finish`].
///
/// # Errors
///
/// Returns `ExpressionError::MismatchedParentheses` for a parenthesis token,
/// or any error raised by the interpreter.
pub fn interpret<I: Interpreter + ?Sized>(
    program: &Program,
    interpreter: &I,
) -> Result<Option<I::Operand>, ExpressionError> {
    let mut stack: Vec<I::Operand> = Vec::with_capacity(program.len());

    for token in program.instructions() {
        let operand = match token {
            Token::Identifier(name) => interpreter.identifier(name)?,
            Token::Literal(lit) => interpreter.literal(lit)?,
            Token::Operator(op) => {
                let right = pop_operand(&mut stack, interpreter, *op)?;
                let left = pop_operand(&mut stack, interpreter, *op)?;
                match *op {
                    Operator::Compare(cmp) => interpreter.compare(cmp, left, right)?,
                    Operator::Logical(logical) => interpreter.logical(logical, left, right)?,
                }
            }
            // Compiled programs never contain parentheses.
            Token::LeftParen | Token::RightParen => {
                return Err(ExpressionError::MismatchedParentheses);
            }
        };
        stack.push(operand);
    }

    interpreter.finish(stack)
}

fn pop_operand<I: Interpreter + ?Sized>(
    stack: &mut Vec<I::Operand>,
    interpreter: &I,
    op: Operator,
) -> Result<I::Operand, ExpressionError> {
    match stack.pop() {
        Some(operand) => Ok(operand),
        None => interpreter.missing_operand(op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::lexer::tokenize;

    /// Rebuilds a fully parenthesized infix string from a program.
    struct Printer;

    impl Interpreter for Printer {
        type Operand = String;

        fn identifier(&self, name: &str) -> Result<String, ExpressionError> {
            Ok(name.to_owned())
        }

        fn literal(&self, literal: &Literal) -> Result<String, ExpressionError> {
            Ok(literal.to_string())
        }

        fn compare(
            &self,
            op: CompareOp,
            left: String,
            right: String,
        ) -> Result<String, ExpressionError> {
            Ok(format!("({left} {op} {right})"))
        }

        fn logical(
            &self,
            op: LogicalOp,
            left: String,
            right: String,
        ) -> Result<String, ExpressionError> {
            Ok(format!("({left} {op} {right})"))
        }
    }

    fn print(input: &str) -> Result<Option<String>, ExpressionError> {
        let program = compile(tokenize(input)).unwrap();
        interpret(&program, &Printer)
    }

    #[test]
    fn test_should_pop_right_operand_first() {
        assert_eq!(print("age > 30").unwrap().unwrap(), "(age > 30)");
    }

    #[test]
    fn test_should_reconstruct_grouping() {
        assert_eq!(
            print("a = 1 OR b = 2 AND c = 3").unwrap().unwrap(),
            "(((a = 1) OR (b = 2)) AND (c = 3))"
        );
        assert_eq!(
            print("a = 1 OR (b = 2 AND c = 3)").unwrap().unwrap(),
            "((a = 1) OR ((b = 2) AND (c = 3)))"
        );
    }

    #[test]
    fn test_should_return_none_for_empty_program() {
        assert_eq!(print("").unwrap(), None);
    }

    #[test]
    fn test_should_report_missing_operand() {
        assert_eq!(
            print("age >").unwrap_err(),
            ExpressionError::MissingOperand {
                operator: ">".to_owned()
            }
        );
        assert_eq!(
            print("AND").unwrap_err(),
            ExpressionError::MissingOperand {
                operator: "AND".to_owned()
            }
        );
    }

    #[test]
    fn test_should_report_dangling_operands() {
        assert_eq!(
            print("age 30").unwrap_err(),
            ExpressionError::DanglingOperands { count: 2 }
        );
    }
}

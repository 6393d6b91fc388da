//! Scanner for condition strings.
//!
//! The scanner recognizes, after skipping whitespace and in this order:
//! two-character comparisons (`!=`, `>=`, `<=`), single-character
//! comparisons (`=`, `>`, `<`), parentheses, double-quoted strings, words
//! (the keywords `AND`/`OR` in any case, otherwise identifiers), and
//! unsigned decimal numbers.
//!
//! In permissive mode anything else is skipped one character at a time and
//! simply does not appear in the output. Strict mode reports it instead.

use tracing::trace;

use crate::error::ExpressionError;
use crate::token::{CompareOp, Literal, LogicalOp, Operator, Token};

const TWO_CHAR_OPERATORS: [(&str, CompareOp); 3] = [
    ("!=", CompareOp::Ne),
    (">=", CompareOp::Ge),
    ("<=", CompareOp::Le),
];

const ONE_CHAR_OPERATORS: [(char, CompareOp); 3] = [
    ('=', CompareOp::Eq),
    ('>', CompareOp::Gt),
    ('<', CompareOp::Lt),
];

/// How the lexer treats characters that start no token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexMode {
    Permissive,
    Strict,
}

/// Tokenize a condition, silently skipping unrecognized characters.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input, LexMode::Permissive);
    let mut tokens = Vec::new();
    // Permissive mode never produces an error; the loop ends at end of input.
    while let Ok(Some(token)) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Tokenize a condition, failing on the first unrecognized character.
///
/// # Errors
///
/// Returns `ExpressionError::UnexpectedCharacter` for input that starts no
/// token, including an unterminated string literal.
pub fn tokenize_strict(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut lexer = Lexer::new(input, LexMode::Strict);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Byte-offset scanner over a condition string.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    mode: LexMode,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, mode: LexMode) -> Self {
        Self {
            input,
            pos: 0,
            mode,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len());
    }

    /// Produce the next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, ExpressionError> {
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                return Ok(None);
            };

            if let Some(token) = self.read_operator() {
                return Ok(Some(token));
            }

            let token = match ch {
                '(' => {
                    self.advance(1);
                    Some(Token::LeftParen)
                }
                ')' => {
                    self.advance(1);
                    Some(Token::RightParen)
                }
                '"' => self.read_string(),
                c if is_ident_start(c) => Some(self.read_identifier_or_keyword()),
                c if c.is_ascii_digit() => Some(self.read_number()?),
                _ => None,
            };

            match token {
                Some(token) => return Ok(Some(token)),
                None => self.skip_unrecognized(ch)?,
            }
        }
    }

    fn read_operator(&mut self) -> Option<Token> {
        let rest = self.rest();
        if let Some((sym, op)) = TWO_CHAR_OPERATORS
            .iter()
            .find(|(sym, _)| rest.starts_with(sym))
        {
            self.advance(sym.len());
            return Some(Token::Operator(Operator::Compare(*op)));
        }
        let (_, op) = ONE_CHAR_OPERATORS
            .iter()
            .find(|(c, _)| rest.starts_with(*c))?;
        self.advance(1);
        Some(Token::Operator(Operator::Compare(*op)))
    }

    /// Read a `"..."` literal that closes on the same line.
    fn read_string(&mut self) -> Option<Token> {
        let body = &self.rest()[1..];
        let end = body.find(['"', '\n', '\r'])?;
        if !body[end..].starts_with('"') {
            return None;
        }
        let content = body[..end].to_owned();
        self.advance(end + 2);
        Some(Token::Literal(Literal::String(content)))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !is_ident_continue(c))
            .unwrap_or(rest.len());
        let word = &rest[..len];
        self.advance(len);

        // Keywords must span the whole word, unlike a plain prefix match:
        // `ORDER` stays one identifier instead of `OR` followed by `DER`.
        if word.eq_ignore_ascii_case("and") {
            Token::Operator(Operator::Logical(LogicalOp::And))
        } else if word.eq_ignore_ascii_case("or") {
            Token::Operator(Operator::Logical(LogicalOp::Or))
        } else {
            Token::Identifier(word.to_owned())
        }
    }

    /// Read `[0-9]+` optionally followed by `.[0-9]+`.
    fn read_number(&mut self) -> Result<Token, ExpressionError> {
        let rest = self.rest();
        let int_len = count_digits(rest);
        let mut len = int_len;
        if rest[int_len..].starts_with('.') {
            let frac_len = count_digits(&rest[int_len + 1..]);
            if frac_len > 0 {
                len += 1 + frac_len;
            }
        }
        let text = &rest[..len];
        let n: f64 = text.parse().map_err(|_| ExpressionError::InvalidNumber {
            text: text.to_owned(),
        })?;
        self.advance(len);
        Ok(Token::Literal(Literal::Number(n)))
    }

    fn skip_unrecognized(&mut self, ch: char) -> Result<(), ExpressionError> {
        if self.mode == LexMode::Strict {
            return Err(ExpressionError::UnexpectedCharacter {
                ch,
                position: self.pos,
            });
        }
        trace!(%ch, position = self.pos, "skipping unrecognized character");
        self.advance(ch.len_utf8());
        Ok(())
    }
}

fn count_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// Returns `true` if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns `true` if `c` can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

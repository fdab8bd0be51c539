//! Amount formula evaluation
//!
//! A line template's amount is an arithmetic expression over record fields,
//! with each field written as a bracketed token:
//!
//! ```text
//! [leasekingaku] - [zankagaku] * ([percentage] / 100)
//! ```
//!
//! Supported syntax: decimal literals, `[field_id]` tokens, the binary
//! operators `+ - * / %`, unary minus and parentheses. Evaluation uses
//! `rust_decimal` throughout so monetary sums never drift.

use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use core_kernel::SourceRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{FormulaError, JournalError};

/// A field token; ids never contain brackets
static FIELD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("field token pattern is valid"));

/// Returns the distinct field ids referenced by a formula, in order of first use
pub fn extract_tokens(formula: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for capture in FIELD_TOKEN.captures_iter(formula) {
        let field_id = capture[1].trim().to_string();
        if !tokens.contains(&field_id) {
            tokens.push(field_id);
        }
    }
    tokens
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Field(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LeftParen,
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Field(id) => write!(f, "[{id}]"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        while let Some(&(offset, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '[' => tokens.push(self.field(offset)?),
                '0'..='9' | '.' => tokens.push(self.number(offset)?),
                _ => {
                    self.chars.next();
                    tokens.push(match ch {
                        '+' => Token::Plus,
                        '-' => Token::Minus,
                        '*' => Token::Star,
                        '/' => Token::Slash,
                        '%' => Token::Percent,
                        '(' => Token::LeftParen,
                        ')' => Token::RightParen,
                        _ => return Err(FormulaError::UnexpectedChar { ch, offset }),
                    });
                }
            }
        }
        Ok(tokens)
    }

    fn field(&mut self, start: usize) -> Result<Token, FormulaError> {
        self.chars.next();
        for (offset, ch) in self.chars.by_ref() {
            if ch == '[' {
                return Err(FormulaError::UnexpectedChar { ch, offset });
            }
            if ch == ']' {
                let id = self.input[start + 1..offset].trim();
                if id.is_empty() {
                    return Err(FormulaError::EmptyToken { offset: start });
                }
                return Ok(Token::Field(id.to_string()));
            }
        }
        Err(FormulaError::UnterminatedToken { offset: start })
    }

    fn number(&mut self, start: usize) -> Result<Token, FormulaError> {
        let mut end = start;
        while let Some(&(offset, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() || ch == '.' {
                end = offset + ch.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let literal = &self.input[start..end];
        literal
            .parse::<Decimal>()
            .map(Token::Number)
            .map_err(|_| FormulaError::InvalidNumber(literal.to_string()))
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Field(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse(tokens: Vec<Token>) -> Result<Expr, FormulaError> {
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(token) => Err(FormulaError::UnexpectedToken(token.to_string())),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Field(id)) => Ok(Expr::Field(id)),
            Some(Token::LeftParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RightParen) => Ok(inner),
                    Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

/// A parsed amount formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses a formula string
    ///
    /// # Errors
    ///
    /// Returns a `FormulaError` for malformed syntax. Unknown field ids are
    /// not an error here; they bind to zero at evaluation time.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = Lexer::new(source).tokenize()?;
        let expr = Parser::parse(tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field ids this formula reads
    pub fn tokens(&self) -> Vec<String> {
        extract_tokens(&self.source)
    }

    /// Evaluates against bound values; unbound field ids read as zero
    pub fn evaluate(&self, bindings: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
        eval(&self.expr, bindings)
    }
}

fn eval(expr: &Expr, bindings: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Field(id) => Ok(bindings.get(id).copied().unwrap_or(Decimal::ZERO)),
        Expr::Neg(inner) => Ok(-eval(inner, bindings)?),
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, bindings)?;
            let rhs = eval(rhs, bindings)?;
            match op {
                BinaryOp::Add => lhs.checked_add(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Sub => lhs.checked_sub(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Mul => lhs.checked_mul(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Div if rhs.is_zero() => Err(FormulaError::DivisionByZero),
                BinaryOp::Div => lhs.checked_div(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Rem if rhs.is_zero() => Err(FormulaError::DivisionByZero),
                BinaryOp::Rem => lhs.checked_rem(rhs).ok_or(FormulaError::Overflow),
            }
        }
    }
}

/// Evaluates amount formulas against source records
///
/// Parsed formulas are cached by source text, so a pattern's templates are
/// parsed once per run no matter how many change-sets use them.
#[derive(Debug, Default)]
pub struct FormulaEvaluator {
    cache: HashMap<String, Formula>,
}

impl FormulaEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a formula with explicit bindings
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Formula` for syntax errors, division by zero
    /// and overflow.
    pub fn evaluate(
        &mut self,
        formula: &str,
        bindings: &HashMap<String, Decimal>,
    ) -> Result<Decimal, JournalError> {
        self.compiled(formula)?
            .evaluate(bindings)
            .map_err(|e| JournalError::formula(formula, e))
    }

    /// Binds every token of a formula from a record
    ///
    /// A missing (or blank) field binds to zero; a present value that is
    /// not a number is a `FormulaBinding` error.
    pub fn bind(formula: &str, record: &SourceRecord) -> Result<HashMap<String, Decimal>, JournalError> {
        extract_tokens(formula)
            .into_iter()
            .map(|field_id| {
                let value = record.decimal(&field_id)?;
                Ok((field_id, value))
            })
            .collect()
    }

    /// Binds and evaluates a formula against one record
    pub fn evaluate_record(
        &mut self,
        formula: &str,
        record: &SourceRecord,
    ) -> Result<Decimal, JournalError> {
        let bindings = Self::bind(formula, record)?;
        self.evaluate(formula, &bindings)
    }

    fn compiled(&mut self, formula: &str) -> Result<&Formula, JournalError> {
        if !self.cache.contains_key(formula) {
            let parsed = Formula::parse(formula).map_err(|e| JournalError::formula(formula, e))?;
            self.cache.insert(formula.to_string(), parsed);
        }
        self.cache
            .get(formula)
            .ok_or_else(|| JournalError::Configuration(format!("formula cache miss: {formula}")))
    }
}

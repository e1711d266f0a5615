//! Parser and evaluator for dice formulas.
//!
//! The accepted language is a small subset of what tabletop hosts understand:
//! integers, dice (`2d6`, `d20`, `(@level)d4`), roll data references (`@abilities.str.mod`),
//! the four arithmetic operators, parentheses and the functions `min`, `max` and `abs`.
//! All arithmetic is done on integers; division rounds towards negative infinity.

use crate::error::{BabonusError, BabonusResult};
use crate::roll::{RollData, RollTerm};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Largest number of dice a single term may roll.
pub const MAX_DICE: i64 = 100;

/// Largest number of faces a die may have.
pub const MAX_FACES: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(i64),
    Ref(String),
    Ident(String),
    Die,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Floor division.
    Div,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        };
        write!(f, "{}", symbol)
    }
}

/// Functions callable from a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Smallest of two values.
    Min,
    /// Largest of two values.
    Max,
    /// Absolute value.
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Function> {
        match name {
            "min" => Some(Function::Min),
            "max" => Some(Function::Max),
            "abs" => Some(Function::Abs),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Function::Min | Function::Max => 2,
            Function::Abs => 1,
        }
    }
}

/// Abstract syntax tree of a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An integer literal.
    Number(i64),
    /// A reference into the roll data.
    Ref(String),
    /// A pool of dice.
    Dice {
        /// Number of dice.
        count: Box<Expr>,
        /// Faces of each die.
        faces: Box<Expr>,
    },
    /// Unary minus.
    Neg(Box<Expr>),
    /// Binary operation.
    Binary {
        /// The operator.
        op: Operator,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Function call.
    Call {
        /// The called function.
        function: Function,
        /// Arguments, already checked against the function's arity.
        args: Vec<Expr>,
    },
}

/// A parsed formula, keeping the source text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses `source` into a formula.
    pub fn parse(source: &str) -> BabonusResult<Formula> {
        let source = source.trim();
        let tokens = tokenize(source).map_err(|reason| BabonusError::formula(source, reason))?;
        if tokens.is_empty() {
            return Err(BabonusError::formula(source, "empty formula"));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser
            .expression()
            .map_err(|reason| BabonusError::formula(source, reason))?;
        if parser.pos != parser.tokens.len() {
            return Err(BabonusError::formula(
                source,
                format!("unexpected token {:?}", parser.tokens[parser.pos]),
            ));
        }
        Ok(Formula {
            source: source.to_string(),
            expr,
        })
    }

    /// Returns the text this formula was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the syntax tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Returns `true` if evaluating this formula never rolls dice.
    pub fn is_deterministic(&self) -> bool {
        !self.expr.has_dice()
    }

    /// Evaluates the formula.
    ///
    /// `roller` receives the number of dice and their faces and returns one result per die.
    /// Every rolled pool and every literal is appended to `terms`.
    pub fn evaluate<F>(
        &self,
        data: &RollData,
        roller: &mut F,
        terms: &mut Vec<RollTerm>,
    ) -> BabonusResult<i64>
    where
        F: FnMut(i64, i64) -> Vec<i64>,
    {
        self.expr
            .evaluate(data, roller, terms)
            .map_err(|reason| BabonusError::formula(self.source.as_str(), reason))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl Expr {
    fn has_dice(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::Ref(_) => false,
            Expr::Dice { .. } => true,
            Expr::Neg(inner) => inner.has_dice(),
            Expr::Binary { lhs, rhs, .. } => lhs.has_dice() || rhs.has_dice(),
            Expr::Call { args, .. } => args.iter().any(Expr::has_dice),
        }
    }

    fn evaluate<F>(
        &self,
        data: &RollData,
        roller: &mut F,
        terms: &mut Vec<RollTerm>,
    ) -> Result<i64, String>
    where
        F: FnMut(i64, i64) -> Vec<i64>,
    {
        match self {
            Expr::Number(value) => {
                terms.push(RollTerm::Numeric(*value));
                Ok(*value)
            }
            Expr::Ref(path) => {
                let value = data.get(path).unwrap_or_else(|| {
                    log::warn!("roll data `@{}` is missing, it counts as 0", path);
                    0
                });
                terms.push(RollTerm::Numeric(value));
                Ok(value)
            }
            Expr::Dice { count, faces } => {
                let count = count.evaluate(data, roller, &mut Vec::new())?;
                let faces = faces.evaluate(data, roller, &mut Vec::new())?;
                if !(0..=MAX_DICE).contains(&count) {
                    return Err(format!("cannot roll {} dice", count));
                }
                if !(1..=MAX_FACES).contains(&faces) {
                    return Err(format!("a die cannot have {} faces", faces));
                }
                let results = roller(count, faces);
                let total = results.iter().sum();
                terms.push(RollTerm::Dice {
                    count,
                    faces,
                    results,
                });
                Ok(total)
            }
            Expr::Neg(inner) => inner
                .evaluate(data, roller, terms)?
                .checked_neg()
                .ok_or_else(|| "overflow".to_string()),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(data, roller, terms)?;
                let rhs = rhs.evaluate(data, roller, terms)?;
                let result = match op {
                    Operator::Add => lhs.checked_add(rhs),
                    Operator::Sub => lhs.checked_sub(rhs),
                    Operator::Mul => lhs.checked_mul(rhs),
                    Operator::Div => {
                        if rhs == 0 {
                            return Err("division by zero".to_string());
                        }
                        floor_div(lhs, rhs)
                    }
                };
                result.ok_or_else(|| "overflow".to_string())
            }
            Expr::Call { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.evaluate(data, roller, terms)?);
                }
                match function {
                    Function::Min => Ok(values[0].min(values[1])),
                    Function::Max => Ok(values[0].max(values[1])),
                    Function::Abs => values[0].checked_abs().ok_or_else(|| "overflow".to_string()),
                }
            }
        }
    }
}

fn floor_div(lhs: i64, rhs: i64) -> Option<i64> {
    let quotient = lhs.checked_div(rhs)?;
    if (lhs % rhs != 0) && ((lhs < 0) != (rhs < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => tokens.push(Token::Number(number(&mut chars)?)),
            '@' => {
                chars.next();
                let path = take_while(&mut chars, |c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                if path.is_empty() || path.starts_with('.') || path.ends_with('.') {
                    return Err(format!("invalid reference `@{}`", path));
                }
                tokens.push(Token::Ref(path));
            }
            c if c.is_ascii_alphabetic() => {
                let ident = take_while(&mut chars, |c| c.is_ascii_alphabetic());
                if ident == "d" {
                    tokens.push(Token::Die);
                } else {
                    tokens.push(Token::Ident(ident));
                }
            }
            _ => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    other => return Err(format!("unexpected character `{}`", other)),
                });
            }
        }
    }
    Ok(tokens)
}

fn number(chars: &mut Peekable<Chars>) -> Result<i64, String> {
    let digits = take_while(chars, |c| c.is_ascii_digit());
    digits
        .parse()
        .map_err(|_| format!("number `{}` is too large", digits))
}

fn take_while<P>(chars: &mut Peekable<Chars>, predicate: P) -> String
where
    P: Fn(char) -> bool,
{
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !predicate(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.next() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(format!("expected {:?}, found {:?}", expected, token)),
            None => Err(format!("expected {:?}, found end of formula", expected)),
        }
    }

    fn expression(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Operator::Add,
                Some(Token::Minus) => Operator::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Operator::Mul,
                Some(Token::Slash) => Operator::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.dice(),
        }
    }

    fn dice(&mut self) -> Result<Expr, String> {
        let count = if let Some(Token::Die) = self.peek() {
            Expr::Number(1)
        } else {
            self.primary()?
        };
        if let Some(Token::Die) = self.peek() {
            self.pos += 1;
            let faces = self.primary()?;
            Ok(Expr::Dice {
                count: Box::new(count),
                faces: Box::new(faces),
            })
        } else {
            Ok(count)
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ref(path)) => Ok(Expr::Ref(path)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                let function =
                    Function::from_name(&name).ok_or_else(|| format!("unknown function `{}`", name))?;
                self.expect(Token::LParen)?;
                let mut args = vec![self.expression()?];
                while let Some(Token::Comma) = self.peek() {
                    self.pos += 1;
                    args.push(self.expression()?);
                }
                self.expect(Token::RParen)?;
                if args.len() != function.arity() {
                    return Err(format!(
                        "`{}` expects {} arguments, got {}",
                        name,
                        function.arity(),
                        args.len()
                    ));
                }
                Ok(Expr::Call { function, args })
            }
            Some(token) => Err(format!("unexpected token {:?}", token)),
            None => Err("unexpected end of formula".to_string()),
        }
    }
}

//! Arithmetic expressions for configuration values
//!
//! Configuration files may write a parameter value as a string such as
//! `"pi / 3"` or `"0.5 * 2**-1"`. The grammar allows numbers, the constant
//! `pi`, parentheses, unary `+`/`-`, the binary operators `+ - * /` (left
//! associative) and exponentiation with `**` or `^` (right associative,
//! binding tighter than unary minus). Any other name is rejected.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::pair,
    IResult, Parser,
};
use std::f64::consts::PI;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Name '{name}' is not allowed in expressions; only 'pi' is defined")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,
}

type ExprResult<T> = Result<T, ExpressionError>;
type Res<'a, T> = IResult<&'a str, T>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    Variable(String),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Power (** or ^)
    Pow,
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match sum(input) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder.trim()),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression
    pub fn evaluate(&self) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Variable(name) => match name.as_str() {
                "pi" => Ok(PI),
                _ => Err(ExpressionError::UndefinedVariable { name: name.clone() }),
            },
            Self::Unary(UnaryOp::Neg, expr) => Ok(-expr.evaluate()?),
            Self::Binary(op, left, right) => {
                let lhs = left.evaluate()?;
                let rhs = right.evaluate()?;
                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }
        }
    }

    /// Every name referenced by the expression, sorted and deduplicated
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Unary(_, expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate_str(input: &str) -> ExprResult<f64> {
    Expression::parse(input)?.evaluate()
}

// Parser functions using nom

fn ws(input: &str) -> Res<&str> {
    multispace0(input)
}

/// Skip whitespace, then match `expected` exactly
fn symbol<'a>(input: &'a str, expected: &str) -> Res<'a, &'a str> {
    let (input, _) = ws(input)?;
    tag(expected).parse(input)
}

/// First operator of `ops` found after optional whitespace.
fn operator<'a>(input: &'a str, ops: &[(&str, BinaryOp)]) -> Option<(&'a str, BinaryOp)> {
    ops.iter()
        .find_map(|(s, op)| symbol(input, s).ok().map(|(rest, _)| (rest, *op)))
}

fn identifier(input: &str) -> Res<Expression> {
    let (input, name) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)?;
    Ok((input, Expression::Variable(name.to_string())))
}

fn number(input: &str) -> Res<Expression> {
    let (input, value) = double(input)?;
    Ok((input, Expression::Number(value)))
}

fn parens(input: &str) -> Res<Expression> {
    let (input, _) = symbol(input, "(")?;
    let (input, expr) = sum(input)?;
    let (input, _) = symbol(input, ")")?;
    Ok((input, expr))
}

/// Name, number, or parenthesized expression
fn primary(input: &str) -> Res<Expression> {
    let (input, _) = ws(input)?;
    if let Ok(result) = identifier(input) {
        return Ok(result);
    }
    if let Ok(result) = number(input) {
        return Ok(result);
    }
    parens(input)
}

/// `primary (** unary)?`: the exponent may be negated and `2**3**2` is `2**9`
fn power(input: &str) -> Res<Expression> {
    let (input, base) = primary(input)?;
    match operator(input, &[("**", BinaryOp::Pow), ("^", BinaryOp::Pow)]) {
        Some((rest, op)) => {
            let (rest, exponent) = unary(rest)?;
            Ok((rest, Expression::Binary(op, Box::new(base), Box::new(exponent))))
        }
        None => Ok((input, base)),
    }
}

fn unary(input: &str) -> Res<Expression> {
    if let Ok((rest, _)) = symbol(input, "-") {
        let (rest, expr) = unary(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Neg, Box::new(expr))));
    }
    if let Ok((rest, _)) = symbol(input, "+") {
        return unary(rest);
    }
    power(input)
}

fn term(input: &str) -> Res<Expression> {
    let (mut input, mut acc) = unary(input)?;
    while let Some((rest, op)) = operator(input, &[("*", BinaryOp::Mul), ("/", BinaryOp::Div)]) {
        if rest.starts_with('*') {
            break;
        }
        let (rest, rhs) = unary(rest)?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
    Ok((input, acc))
}

fn sum(input: &str) -> Res<Expression> {
    let (mut input, mut acc) = term(input)?;
    while let Some((rest, op)) = operator(input, &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)]) {
        let (rest, rhs) = term(rest)?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
    Ok((input, acc))
}

//! Integer expressions of `#if` / `#elif`, after `defined` and macro replacement

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, hex_digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, value},
    multi::many0,
    sequence::{delimited, pair, preceded},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    Complement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self) -> Result<i64, String> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Unary(op, operand) => {
                let v = operand.eval()?;
                Ok(match op {
                    UnaryOp::Not => (v == 0) as i64,
                    UnaryOp::Negate => v.wrapping_neg(),
                    UnaryOp::Plus => v,
                    UnaryOp::Complement => !v,
                })
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                if lhs.eval()? != 0 {
                    return Ok(1);
                }
                Ok((rhs.eval()? != 0) as i64)
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                if lhs.eval()? == 0 {
                    return Ok(0);
                }
                Ok((rhs.eval()? != 0) as i64)
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval()?;
                let b = rhs.eval()?;
                match op {
                    BinaryOp::Equal => Ok((a == b) as i64),
                    BinaryOp::NotEqual => Ok((a != b) as i64),
                    BinaryOp::Less => Ok((a < b) as i64),
                    BinaryOp::Greater => Ok((a > b) as i64),
                    BinaryOp::LessEqual => Ok((a <= b) as i64),
                    BinaryOp::GreaterEqual => Ok((a >= b) as i64),
                    BinaryOp::Add => Ok(a.wrapping_add(b)),
                    BinaryOp::Subtract => Ok(a.wrapping_sub(b)),
                    BinaryOp::Multiply => Ok(a.wrapping_mul(b)),
                    BinaryOp::Divide | BinaryOp::Remainder if b == 0 => {
                        Err("division by zero".to_string())
                    }
                    BinaryOp::Divide => Ok(a.wrapping_div(b)),
                    BinaryOp::Remainder => Ok(a.wrapping_rem(b)),
                    BinaryOp::Or | BinaryOp::And => Ok(0),
                }
            }
        }
    }
}

/// Parse and evaluate. Identifiers must already have been replaced by numbers.
pub fn evaluate(input: &str) -> Result<i64, String> {
    let expr = parse_expression(input)?;
    expr.eval()
}

pub fn parse_expression(input: &str) -> Result<Expr, String> {
    match all_consuming(token(or_expr))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(_) if input.trim().is_empty() => Err("empty expression".to_string()),
        Err(_) => Err(format!("cannot parse '{}'", input.trim())),
    }
}

fn token<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn binary_level<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expr>,
    operator: fn(&'a str) -> IResult<&'a str, BinaryOp>,
) -> IResult<&'a str, Expr> {
    let (input, first) = operand(input)?;
    let (input, rest) = many0(pair(token(operator), operand))(input)?;
    let expr = rest.into_iter().fold(first, |lhs, (op, rhs)| {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    });
    Ok((input, expr))
}

fn or_op(s: &str) -> IResult<&str, BinaryOp> {
    value(BinaryOp::Or, tag("||"))(s)
}

fn and_op(s: &str) -> IResult<&str, BinaryOp> {
    value(BinaryOp::And, tag("&&"))(s)
}

fn equality_op(s: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Equal, tag("==")),
        value(BinaryOp::NotEqual, tag("!=")),
    ))(s)
}

fn relational_op(s: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::LessEqual, tag("<=")),
        value(BinaryOp::GreaterEqual, tag(">=")),
        value(BinaryOp::Less, char('<')),
        value(BinaryOp::Greater, char('>')),
    ))(s)
}

fn additive_op(s: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Subtract, char('-')),
    ))(s)
}

fn multiplicative_op(s: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Multiply, char('*')),
        value(BinaryOp::Divide, char('/')),
        value(BinaryOp::Remainder, char('%')),
    ))(s)
}

fn or_expr(s: &str) -> IResult<&str, Expr> {
    binary_level(s, and_expr, or_op)
}

fn and_expr(s: &str) -> IResult<&str, Expr> {
    binary_level(s, equality_expr, and_op)
}

fn equality_expr(s: &str) -> IResult<&str, Expr> {
    binary_level(s, relational_expr, equality_op)
}

fn relational_expr(s: &str) -> IResult<&str, Expr> {
    binary_level(s, additive_expr, relational_op)
}

fn additive_expr(s: &str) -> IResult<&str, Expr> {
    binary_level(s, multiplicative_expr, additive_op)
}

fn multiplicative_expr(s: &str) -> IResult<&str, Expr> {
    binary_level(s, unary_expr, multiplicative_op)
}

fn unary_expr(s: &str) -> IResult<&str, Expr> {
    let unary = |op: UnaryOp| move |e: Expr| Expr::Unary(op, Box::new(e));
    token(alt((
        map(preceded(char('!'), unary_expr), unary(UnaryOp::Not)),
        map(preceded(char('-'), unary_expr), unary(UnaryOp::Negate)),
        map(preceded(char('+'), unary_expr), unary(UnaryOp::Plus)),
        map(preceded(char('~'), unary_expr), unary(UnaryOp::Complement)),
        primary,
    )))(s)
}

fn primary(s: &str) -> IResult<&str, Expr> {
    token(alt((
        number,
        delimited(char('('), or_expr, char(')')),
    )))(s)
}

fn number(s: &str) -> IResult<&str, Expr> {
    let (s, n) = alt((
        map_res(
            preceded(alt((tag("0x"), tag("0X"))), hex_digit1),
            |h: &str| i64::from_str_radix(h, 16),
        ),
        map_res(digit1, |d: &str| {
            if d.len() > 1 && d.starts_with('0') {
                i64::from_str_radix(&d[1..], 8)
            } else {
                d.parse::<i64>()
            }
        }),
    ))(s)?;
    let (s, _) = opt(one_of("uU"))(s)?;
    Ok((s, Expr::Number(n)))
}

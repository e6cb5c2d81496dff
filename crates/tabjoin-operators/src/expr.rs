//! Derived-column expressions.
//!
//! Supports expressions of the form: "operand OP operand" where OP ∈ {+, -, *, /}
//! and each operand is an integer literal or a column reference `col<N>`.

use std::fmt;

use tabjoin_core::row::{tokenize, Row};
use thiserror::Error;

use crate::traits::{Outcome, RowOperator};

pub const DEFAULT_OPERATORS: [char; 4] = ['+', '-', '*', '/'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("invalid operand '{operand}': {detail}")]
    InvalidOperand { operand: String, detail: String },

    #[error("invalid operator '{0}'")]
    InvalidOperator(char),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {left} {op} {right}")]
    Overflow { left: i64, op: char, right: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Column(usize),
    Literal(i64),
    /// Kept as written; fails on every row it is evaluated against.
    Malformed(String),
}

impl Operand {
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        if let Some(idx) = trimmed.strip_prefix("col") {
            return match idx.parse::<usize>() {
                Ok(idx) => Operand::Column(idx),
                Err(_) => Operand::Malformed(token.to_string()),
            };
        }
        match trimmed.parse::<i64>() {
            Ok(v) => Operand::Literal(v),
            Err(_) => Operand::Malformed(token.to_string()),
        }
    }

    fn resolve(&self, row: &Row) -> Result<i64, EvalError> {
        match self {
            Operand::Literal(v) => Ok(*v),
            Operand::Column(idx) => {
                let value = row.get(*idx).ok_or_else(|| EvalError::InvalidOperand {
                    operand: format!("col{idx}"),
                    detail: format!("row has {} columns", row.len()),
                })?;
                parse_int(value).ok_or_else(|| EvalError::InvalidOperand {
                    operand: format!("col{idx}"),
                    detail: format!("'{value}' is not an integer"),
                })
            }
            Operand::Malformed(raw) => Err(EvalError::InvalidOperand {
                operand: raw.clone(),
                detail: "not an integer or column reference".into(),
            }),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(idx) => write!(f, "col{idx}"),
            Operand::Literal(v) => write!(f, "{v}"),
            Operand::Malformed(raw) => write!(f, "{raw}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl TryFrom<char> for BinaryOp {
    type Error = EvalError;

    fn try_from(c: char) -> Result<Self, EvalError> {
        match c {
            '+' => Ok(BinaryOp::Add),
            '-' => Ok(BinaryOp::Sub),
            '*' => Ok(BinaryOp::Mul),
            '/' => Ok(BinaryOp::Div),
            other => Err(EvalError::InvalidOperator(other)),
        }
    }
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    /// Checked integer arithmetic; division truncates toward zero.
    pub fn apply(self, left: i64, right: i64) -> Result<i64, EvalError> {
        let result = match self {
            BinaryOp::Add => left.checked_add(right),
            BinaryOp::Sub => left.checked_sub(right),
            BinaryOp::Mul => left.checked_mul(right),
            BinaryOp::Div => {
                if right == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                left.checked_div(right)
            }
        };
        result.ok_or(EvalError::Overflow {
            left,
            op: self.symbol(),
            right,
        })
    }
}

/// `left op right`, as parsed. The operator is validated at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnExpr {
    pub left: Operand,
    pub op: char,
    pub right: Operand,
}

impl ColumnExpr {
    pub fn evaluate(&self, row: &Row) -> Result<i64, EvalError> {
        let left = self.left.resolve(row)?;
        let right = self.right.resolve(row)?;
        BinaryOp::try_from(self.op)?.apply(left, right)
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left, self.op, self.right)
    }
}

/// Parse `raw` split on `operators`. Anything but operand/operator/operand
/// yields `None`, which disables the derived column.
pub fn parse_expression(raw: &str, operators: &[char]) -> Option<ColumnExpr> {
    let tokens = tokenize(raw, operators, true);
    let [left, op, right] = tokens.as_slice() else {
        return None;
    };
    let op = op.chars().next()?;
    Some(ColumnExpr {
        left: Operand::parse(left),
        op,
        right: Operand::parse(right),
    })
}

/// Integer coercion for field values (surrounding whitespace allowed).
pub fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Appends the expression result as one extra field.
#[derive(Debug, Clone)]
pub struct DerivedColumn {
    pub expr: ColumnExpr,
}

impl DerivedColumn {
    pub fn new(expr: ColumnExpr) -> Self {
        Self { expr }
    }
}

impl RowOperator for DerivedColumn {
    fn name(&self) -> &'static str {
        "derived_column"
    }

    fn apply(&mut self, row: &mut Row) -> Outcome<()> {
        match self.expr.evaluate(row) {
            Ok(v) => {
                row.push(v.to_string());
                Outcome::Value(())
            }
            Err(e) => Outcome::Skip(e.into()),
        }
    }
}

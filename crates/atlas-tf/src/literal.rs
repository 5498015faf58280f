//! literal values
//!
//! Configuration values are never evaluated: they reference variables, other resources and functions that only
//! terraform can resolve. Some decisions still depend on whether an expression is a plain literal, for example
//! a `num_shards = 2` is duplicated while `num_shards = var.shards` becomes a comprehension.
//!
//! [Literal::of] folds an expression with an empty [hcl::eval::Context]. Anything that needs a variable or a
//! function fails to fold and is treated as symbolic.
//!
//! A literal is one of
//! - boolean
//! - integer (i64)
//! - decimal (f64)
//! - string (utf-8)
//!
//! Arrays, objects and `null` are never considered literal.
use hcl::eval::Evaluate;
use hcl_edit::expr::Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
}

impl Literal {
    /// Returns the literal value of `expr`, or `None` for symbolic expressions
    pub fn of(expr: &Expression) -> Option<Literal> {
        let mut expr = hcl::Expression::from(expr.clone());
        expr.evaluate_in_place(&hcl::eval::Context::new()).ok()?;
        Literal::try_from(expr).ok()
    }

    /// Integral value of a numeric literal, decimals are truncated
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Integer(int) => Some(*int),
            Literal::Decimal(decimal) => Some(decimal.trunc() as i64),
            _ => None,
        }
    }
}

/// Integral value of `expr` if it is a numeric literal
pub fn integer(expr: &Expression) -> Option<i64> {
    Literal::of(expr).and_then(|literal| literal.as_integer())
}

impl From<hcl::Number> for Literal {
    fn from(value: hcl::Number) -> Self {
        if let Some(int) = value.as_i64() {
            return Literal::Integer(int);
        }

        // u64 beyond i64::MAX and floats both fit an f64 (lossy for the former)
        Literal::Decimal(value.as_f64().unwrap_or(f64::NAN))
    }
}

impl TryFrom<hcl::Expression> for Literal {
    type Error = hcl::Expression;

    fn try_from(value: hcl::Expression) -> Result<Self, Self::Error> {
        use hcl::Expression;

        match value {
            Expression::Bool(bool) => Ok(Literal::Boolean(bool)),
            Expression::Number(num) => Ok(num.into()),
            Expression::String(s) => Ok(Literal::String(s)),
            other => Err(other),
        }
    }
}

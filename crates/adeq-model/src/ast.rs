//! Expression AST and its recursive evaluator.
//!
//! Model-library expressions are a small arithmetic language over
//! parameters and variables: `+ - * /`, unary minus, the comparison
//! operators `= <= >=`, and IEEE-754 literals. The AST is a tagged sum with
//! one recursive evaluator; comparisons evaluate to 1.0/0.0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One node of an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(f64),
    Parameter(String),
    Variable(String),
    Negation(Box<Expr>),
    Addition(Box<Expr>, Box<Expr>),
    Subtraction(Box<Expr>, Box<Expr>),
    Multiplication(Box<Expr>, Box<Expr>),
    Division(Box<Expr>, Box<Expr>),
    Equal(Box<Expr>, Box<Expr>),
    LessOrEqual(Box<Expr>, Box<Expr>),
    GreaterOrEqual(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Human-readable node kind, mainly for error messages and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Parameter(_) => "parameter",
            Expr::Variable(_) => "variable",
            Expr::Negation(_) => "negation",
            Expr::Addition(..) => "addition",
            Expr::Subtraction(..) => "subtraction",
            Expr::Multiplication(..) => "multiplication",
            Expr::Division(..) => "division",
            Expr::Equal(..) => "equal",
            Expr::LessOrEqual(..) => "less_or_equal",
            Expr::GreaterOrEqual(..) => "greater_or_equal",
        }
    }
}

/// Values the evaluator resolves identifiers against.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub parameters: HashMap<String, f64>,
    pub variables: HashMap<String, f64>,
}

/// Recursively evaluate an expression. Unknown identifiers are fatal and
/// name the identifier.
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> Result<f64, ModelError> {
    Ok(match expr {
        Expr::Literal(v) => *v,
        Expr::Parameter(id) => *ctx
            .parameters
            .get(id)
            .ok_or_else(|| ModelError::UnknownIdentifier(id.clone()))?,
        Expr::Variable(id) => *ctx
            .variables
            .get(id)
            .ok_or_else(|| ModelError::UnknownIdentifier(id.clone()))?,
        Expr::Negation(inner) => -evaluate(inner, ctx)?,
        Expr::Addition(l, r) => evaluate(l, ctx)? + evaluate(r, ctx)?,
        Expr::Subtraction(l, r) => evaluate(l, ctx)? - evaluate(r, ctx)?,
        Expr::Multiplication(l, r) => evaluate(l, ctx)? * evaluate(r, ctx)?,
        Expr::Division(l, r) => evaluate(l, ctx)? / evaluate(r, ctx)?,
        Expr::Equal(l, r) => bool_value(evaluate(l, ctx)? == evaluate(r, ctx)?),
        Expr::LessOrEqual(l, r) => bool_value(evaluate(l, ctx)? <= evaluate(r, ctx)?),
        Expr::GreaterOrEqual(l, r) => bool_value(evaluate(l, ctx)? >= evaluate(r, ctx)?),
    })
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EvaluationContext {
        let mut ctx = EvaluationContext::default();
        ctx.parameters.insert("cost".into(), 3.0);
        ctx.variables.insert("p".into(), 10.0);
        ctx
    }

    #[test]
    fn evaluates_arithmetic() {
        let expr = Expr::Addition(
            Box::new(Expr::Multiplication(
                Box::new(Expr::Parameter("cost".into())),
                Box::new(Expr::Variable("p".into())),
            )),
            Box::new(Expr::Literal(2.0)),
        );
        assert_eq!(evaluate(&expr, &ctx()).unwrap(), 32.0);
    }

    #[test]
    fn evaluates_negation_and_division() {
        let expr = Expr::Negation(Box::new(Expr::Division(
            Box::new(Expr::Variable("p".into())),
            Box::new(Expr::Literal(4.0)),
        )));
        assert_eq!(evaluate(&expr, &ctx()).unwrap(), -2.5);
    }

    #[test]
    fn comparisons_evaluate_to_zero_or_one() {
        let expr = Expr::LessOrEqual(Box::new(Expr::Literal(1.0)), Box::new(Expr::Literal(2.0)));
        assert_eq!(evaluate(&expr, &ctx()).unwrap(), 1.0);
    }

    #[test]
    fn unknown_identifier_is_fatal() {
        let expr = Expr::Variable("ghost".into());
        let err = evaluate(&expr, &ctx()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn expressions_round_trip_through_serde() {
        let expr = Expr::Subtraction(
            Box::new(Expr::Parameter("cost".into())),
            Box::new(Expr::Negation(Box::new(Expr::Literal(1.5)))),
        );
        let json = serde_json::to_string(&expr).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
        assert_eq!(evaluate(&back, &ctx()).unwrap(), 4.5);
    }
}

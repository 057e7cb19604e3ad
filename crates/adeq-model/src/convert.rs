//! Parse-tree to AST conversion against a model library.
//!
//! Identifiers resolve to model parameters first, then to variables; an
//! identifier matching neither is fatal and names the identifier. The time
//! and port constructs of the grammar are recognized but not supported
//! here: converting one produces a structured error naming the construct.

use serde::{Deserialize, Serialize};

use crate::ast::Expr;
use crate::error::ModelError;
use crate::parser::{parse, ComparisonOp, ParseNode};

/// One declared parameter of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameter {
    pub id: String,
}

/// One declared variable of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVariable {
    pub id: String,
}

/// The declaration context expressions are converted against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub parameters: Vec<ModelParameter>,
    pub variables: Vec<ModelVariable>,
}

impl Model {
    pub fn with_parameter(mut self, id: impl Into<String>) -> Self {
        self.parameters.push(ModelParameter { id: id.into() });
        self
    }

    pub fn with_variable(mut self, id: impl Into<String>) -> Self {
        self.variables.push(ModelVariable { id: id.into() });
        self
    }
}

/// Convert an expression string into an AST. An empty string converts to
/// `None` (the model omitted the expression).
pub fn convert_expression(text: &str, model: &Model) -> Result<Option<Expr>, ModelError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let tree = parse(text)?;
    convert_node(&tree, model).map(Some)
}

fn convert_node(node: &ParseNode, model: &Model) -> Result<Expr, ModelError> {
    Ok(match node {
        ParseNode::Number(value) => Expr::Literal(*value),
        ParseNode::Identifier(id) => resolve(id, model)?,
        ParseNode::Negation(inner) => Expr::Negation(Box::new(convert_node(inner, model)?)),
        ParseNode::Addition(l, r) => Expr::Addition(
            Box::new(convert_node(l, model)?),
            Box::new(convert_node(r, model)?),
        ),
        ParseNode::Subtraction(l, r) => Expr::Subtraction(
            Box::new(convert_node(l, model)?),
            Box::new(convert_node(r, model)?),
        ),
        ParseNode::Multiplication(l, r) => Expr::Multiplication(
            Box::new(convert_node(l, model)?),
            Box::new(convert_node(r, model)?),
        ),
        ParseNode::Division(l, r) => Expr::Division(
            Box::new(convert_node(l, model)?),
            Box::new(convert_node(r, model)?),
        ),
        ParseNode::Comparison(op, l, r) => {
            let left = Box::new(convert_node(l, model)?);
            let right = Box::new(convert_node(r, model)?);
            match op {
                ComparisonOp::Equal => Expr::Equal(left, right),
                ComparisonOp::LessOrEqual => Expr::LessOrEqual(left, right),
                ComparisonOp::GreaterOrEqual => Expr::GreaterOrEqual(left, right),
            }
        }
        ParseNode::TimeShift(..) => {
            return Err(ModelError::UnimplementedConstruct("time shift"));
        }
        ParseNode::TimeIndex(..) => {
            return Err(ModelError::UnimplementedConstruct("time index"));
        }
        ParseNode::TimeSum(_) => {
            return Err(ModelError::UnimplementedConstruct("time sum"));
        }
        ParseNode::PortField(..) => {
            return Err(ModelError::UnimplementedConstruct("port field"));
        }
        ParseNode::Function(..) => {
            return Err(ModelError::UnimplementedConstruct("function"));
        }
    })
}

fn resolve(id: &str, model: &Model) -> Result<Expr, ModelError> {
    if model.parameters.iter().any(|p| p.id == id) {
        return Ok(Expr::Parameter(id.to_string()));
    }
    if model.variables.iter().any(|v| v.id == id) {
        return Ok(Expr::Variable(id.to_string()));
    }
    Err(ModelError::NoParameterOrVariableWithThisName(id.to_string()))
}

//! Tree-walking evaluator
//!
//! Walks an [`AstNode`] against a [`Context`] and produces a [`Collection`].
//! Binary operator semantics live in [`operations`], built-in functions in
//! [`functions`].

mod functions;
pub(crate) mod operations;

use crate::ast::{AstNode, Literal, TypeOperator, UnaryOperator};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::functions::FunctionRegistry;
use crate::types::TypeSpecifier;
use crate::value::{Collection, Node, PrimitiveValue, Quantity};

/// Evaluates expressions using a function registry
///
/// Holds no per-evaluation state; one evaluator can serve any number of
/// concurrent evaluations.
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate `node` with `ctx.this` as the focus of leading paths
    pub fn eval(&self, node: &AstNode, ctx: &Context) -> Result<Collection> {
        match node {
            AstNode::Literal(literal) => Ok(literal_collection(literal)),

            AstNode::Collection(items) => {
                let mut result = Collection::with_capacity(items.len());
                for item in items {
                    result.extend(self.eval(item, ctx)?);
                }
                Ok(result)
            }

            AstNode::Identifier(name) => Ok(navigate_root(&ctx.this, name)),

            AstNode::Invocation { target, member } => {
                let target = self.eval(target, ctx)?;
                Ok(navigate(&target, member))
            }

            AstNode::Indexer { target, index } => {
                let target = self.eval(target, ctx)?;
                let index = self.eval(index, ctx)?;
                index_collection(target, &index)
            }

            AstNode::FunctionCall {
                target,
                name,
                arguments,
            } => {
                let id = self.registry.lookup(name, arguments.len())?;
                let input = match target {
                    Some(target) => self.eval(target, ctx)?,
                    None => ctx.this.clone(),
                };
                functions::execute_function(self, id, input, arguments, ctx)
            }

            AstNode::Unary { operator, operand } => {
                let operand = self.eval(operand, ctx)?;
                unary(*operator, operand)
            }

            AstNode::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                operations::execute_binary_op(*operator, left, right)
            }

            AstNode::Union(operands) => {
                let mut result = Collection::empty();
                for operand in operands {
                    for node in self.eval(operand, ctx)? {
                        operations::push_unique(&mut result, node);
                    }
                }
                Ok(result)
            }

            AstNode::TypeOp {
                operator,
                operand,
                type_specifier,
            } => {
                let operand = self.eval(operand, ctx)?;
                let type_specifier = TypeSpecifier::parse(&type_specifier.to_string());
                match operator {
                    TypeOperator::Is => is_type(&operand, &type_specifier),
                    TypeOperator::As => as_type(&operand, &type_specifier),
                }
            }

            AstNode::This => Ok(ctx.this.clone()),

            AstNode::Index => Ok(ctx
                .index
                .map(|index| Collection::singleton(Node::integer(index as i64)))
                .unwrap_or_default()),

            AstNode::Total => Ok(ctx.total.clone().unwrap_or_default()),

            AstNode::Variable(name) => ctx
                .get_variable(name)
                .cloned()
                .ok_or_else(|| Error::UndefinedVariable(name.clone())),
        }
    }
}

fn literal_collection(literal: &Literal) -> Collection {
    let value = match literal {
        Literal::Null => return Collection::empty(),
        Literal::Boolean(b) => PrimitiveValue::Boolean(*b),
        Literal::String(s) => PrimitiveValue::String(s.as_str().into()),
        Literal::Integer(i) => PrimitiveValue::Integer(*i),
        Literal::Decimal(d) => PrimitiveValue::Decimal(*d),
        Literal::Date(d) => PrimitiveValue::Date(*d),
        Literal::DateTime(dt) => PrimitiveValue::DateTime(*dt),
        Literal::Time(t) => PrimitiveValue::Time(*t),
        Literal::Quantity { value, unit } => {
            PrimitiveValue::Quantity(Quantity::new(*value, unit.as_str()))
        }
    };
    Collection::singleton(Node::Primitive(value))
}

/// Leading path segment: a type name selects matching context elements
/// themselves, anything else navigates into their children
fn navigate_root(focus: &Collection, name: &str) -> Collection {
    let names_type = name.starts_with(|c: char| c.is_ascii_uppercase());
    let mut result = Collection::empty();
    for node in focus {
        match node {
            Node::Element(element) if names_type && element.is_type(name) => {
                result.push(node.clone())
            }
            _ => result.extend(node.children(name)),
        }
    }
    result
}

fn navigate(focus: &Collection, name: &str) -> Collection {
    let mut result = Collection::empty();
    for node in focus {
        result.extend(node.children(name));
    }
    result
}

fn index_collection(target: Collection, index: &Collection) -> Result<Collection> {
    let Some(index) = index.singleton_value("indexer")? else {
        return Ok(Collection::empty());
    };
    let PrimitiveValue::Integer(index) = index else {
        return Err(Error::InvalidOperand(format!(
            "index must be an Integer, got {}",
            index.type_name()
        )));
    };
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| target.get(i).cloned())
        .map(Collection::singleton)
        .unwrap_or_default())
}

fn unary(operator: UnaryOperator, operand: Collection) -> Result<Collection> {
    let Some(value) = operand.singleton_value("unary operator")? else {
        return Ok(Collection::empty());
    };
    let result = match (operator, value) {
        (UnaryOperator::Plus, value @ (PrimitiveValue::Integer(_)
        | PrimitiveValue::Decimal(_)
        | PrimitiveValue::Quantity(_))) => Some(value),
        (UnaryOperator::Minus, PrimitiveValue::Integer(i)) => {
            i.checked_neg().map(PrimitiveValue::Integer)
        }
        (UnaryOperator::Minus, PrimitiveValue::Decimal(d)) => Some(PrimitiveValue::Decimal(-d)),
        (UnaryOperator::Minus, PrimitiveValue::Quantity(q)) => {
            Some(PrimitiveValue::Quantity(Quantity::new(-q.value, q.unit)))
        }
        (_, other) => {
            return Err(Error::TypeMismatch(format!(
                "unary operator requires a number or quantity, found {}",
                other.type_name()
            )))
        }
    };
    Ok(result
        .map(|value| Collection::singleton(Node::Primitive(value)))
        .unwrap_or_default())
}

/// `is`: empty stays empty, otherwise the single item is tested
pub(crate) fn is_type(operand: &Collection, type_specifier: &TypeSpecifier) -> Result<Collection> {
    if operand.is_empty() {
        return Ok(Collection::empty());
    }
    let node = operand.single("is")?;
    Ok(Collection::boolean(type_specifier.matches(node)))
}

/// `as`: the single item if it conforms, empty otherwise
pub(crate) fn as_type(operand: &Collection, type_specifier: &TypeSpecifier) -> Result<Collection> {
    if operand.is_empty() {
        return Ok(Collection::empty());
    }
    let node = operand.single("as")?;
    if type_specifier.matches(node) {
        Ok(Collection::singleton(node.clone()))
    } else {
        Ok(Collection::empty())
    }
}

//! Type specifiers for `is`, `as` and `ofType()`
//!
//! A type specifier is an optionally qualified name: `Integer`,
//! `System.Integer`, `Patient` or `FHIR.Patient`. System names test primitive
//! nodes; other names are handed to the element's own type test.

use std::fmt;

use crate::value::{Node, PrimitiveValue};

/// System primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    DateTime,
    Time,
    Quantity,
}

impl TypeId {
    pub fn from_name(name: &str) -> Option<TypeId> {
        Some(match name {
            "Boolean" => TypeId::Boolean,
            "Integer" => TypeId::Integer,
            "Decimal" => TypeId::Decimal,
            "String" => TypeId::String,
            "Date" => TypeId::Date,
            "DateTime" => TypeId::DateTime,
            "Time" => TypeId::Time,
            "Quantity" => TypeId::Quantity,
            _ => return None,
        })
    }

    pub fn of(value: &PrimitiveValue) -> TypeId {
        match value {
            PrimitiveValue::Boolean(_) => TypeId::Boolean,
            PrimitiveValue::Integer(_) => TypeId::Integer,
            PrimitiveValue::Decimal(_) => TypeId::Decimal,
            PrimitiveValue::String(_) => TypeId::String,
            PrimitiveValue::Date(_) => TypeId::Date,
            PrimitiveValue::DateTime(_) => TypeId::DateTime,
            PrimitiveValue::Time(_) => TypeId::Time,
            PrimitiveValue::Quantity(_) => TypeId::Quantity,
        }
    }
}

/// Fully-qualified type namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeNamespace {
    System,
    Fhir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpecifier {
    pub namespace: Option<TypeNamespace>,
    pub name: String,
}

impl TypeSpecifier {
    /// Parse `Name` or `Namespace.Name`; unknown namespaces stay part of the name
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some(("System", name)) => Self {
                namespace: Some(TypeNamespace::System),
                name: name.to_string(),
            },
            Some(("FHIR", name)) => Self {
                namespace: Some(TypeNamespace::Fhir),
                name: name.to_string(),
            },
            _ => Self {
                namespace: None,
                name: qualified.to_string(),
            },
        }
    }

    /// Does `node` conform to this type?
    pub fn matches(&self, node: &Node) -> bool {
        match node {
            Node::Primitive(value) => {
                self.namespace != Some(TypeNamespace::Fhir)
                    && TypeId::from_name(&self.name) == Some(TypeId::of(value))
            }
            Node::Element(element) => {
                self.namespace != Some(TypeNamespace::System) && element.is_type(&self.name)
            }
        }
    }
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Some(TypeNamespace::System) => write!(f, "System.{}", self.name),
            Some(TypeNamespace::Fhir) => write!(f, "FHIR.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

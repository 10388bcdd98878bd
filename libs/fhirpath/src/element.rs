//! In-memory element tree
//!
//! [`ElementNode`] is a ready-made [`Element`] implementation for hosts that do
//! not bring their own resource model, and the target of the JSON adapter.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::value::{Collection, Element, Node, PrimitiveValue, Quantity};

/// A named, typed element with ordered children
#[derive(Debug, Clone)]
pub struct ElementNode {
    type_name: Arc<str>,
    base_types: Vec<Arc<str>>,
    value: Option<PrimitiveValue>,
    children: Vec<(Arc<str>, Node)>,
}

impl ElementNode {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            base_types: Vec::new(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Declare a supertype (`Patient` is a `DomainResource` is a `Resource`)
    pub fn with_base_type(mut self, type_name: impl Into<Arc<str>>) -> Self {
        self.base_types.push(type_name.into());
        self
    }

    pub fn with_value(mut self, value: PrimitiveValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Append a child; repeat the name for repeating elements
    pub fn with_child(mut self, name: impl Into<Arc<str>>, child: impl Into<Node>) -> Self {
        self.push_child(name, child);
        self
    }

    pub fn push_child(&mut self, name: impl Into<Arc<str>>, child: impl Into<Node>) {
        self.children.push((name.into(), child.into()));
    }

    pub fn into_node(self) -> Node {
        Node::Element(Arc::new(self))
    }

    /// Build a tree from a JSON resource
    ///
    /// `resourceType` names the root type. Nested objects take their type from
    /// a choice suffix (`valueQuantity` is a `Quantity`) or default to
    /// `Element`. Arrays become repeated children and JSON scalars become
    /// primitives. Properties starting with `_` (primitive extensions) are skipped.
    pub fn from_json(json: &JsonValue) -> Node {
        match json {
            JsonValue::Object(map) => {
                let type_name = map
                    .get("resourceType")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("Element");
                Self::object_from_json(type_name, json).into_node()
            }
            other => json_scalar(other)
                .map(Node::Primitive)
                .unwrap_or_else(|| ElementNode::new("Element").into_node()),
        }
    }

    fn object_from_json(type_name: &str, json: &JsonValue) -> ElementNode {
        let mut element = ElementNode::new(type_name);
        if type_name != "Element" && type_name != "Resource" {
            element = element.with_base_type(if json.get("resourceType").is_some() {
                "Resource"
            } else {
                "Element"
            });
        }

        let Some(map) = json.as_object() else {
            return element;
        };

        for (key, value) in map {
            if key == "resourceType" || key.starts_with('_') {
                continue;
            }
            let child_type = choice_type_suffix(key);
            match value {
                JsonValue::Array(items) => {
                    for item in items {
                        if let Some(node) = child_from_json(child_type, item) {
                            element.push_child(key.as_str(), node);
                        }
                    }
                }
                other => {
                    if let Some(node) = child_from_json(child_type, other) {
                        element.push_child(key.as_str(), node);
                    }
                }
            }
        }

        if type_name == "Quantity" {
            element.value = quantity_value(map);
        }
        element
    }
}

fn child_from_json(choice_type: Option<&str>, json: &JsonValue) -> Option<Node> {
    match json {
        JsonValue::Null => None,
        JsonValue::Object(map) => {
            let type_name = map
                .get("resourceType")
                .and_then(JsonValue::as_str)
                .or(choice_type)
                .unwrap_or("Element");
            Some(ElementNode::object_from_json(type_name, json).into_node())
        }
        other => json_scalar(other).map(Node::Primitive),
    }
}

fn json_scalar(json: &JsonValue) -> Option<PrimitiveValue> {
    match json {
        JsonValue::Bool(b) => Some(PrimitiveValue::Boolean(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Some(PrimitiveValue::Integer(i)),
            None => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok()
                .map(PrimitiveValue::Decimal),
        },
        JsonValue::String(s) => Some(PrimitiveValue::String(s.as_str().into())),
        _ => None,
    }
}

fn quantity_value(map: &serde_json::Map<String, JsonValue>) -> Option<PrimitiveValue> {
    let value = match json_scalar(map.get("value")?)? {
        PrimitiveValue::Integer(i) => Decimal::from(i),
        PrimitiveValue::Decimal(d) => d,
        _ => return None,
    };
    let unit = map
        .get("code")
        .or_else(|| map.get("unit"))
        .and_then(JsonValue::as_str)
        .unwrap_or("1");
    Some(PrimitiveValue::Quantity(Quantity::new(value, unit)))
}

/// Type suffixes of `[x]` choice properties
const CHOICE_TYPES: &[&str] = &[
    "Address",
    "Age",
    "Annotation",
    "Attachment",
    "Base64Binary",
    "Boolean",
    "Canonical",
    "Code",
    "CodeableConcept",
    "Coding",
    "ContactPoint",
    "Count",
    "Date",
    "DateTime",
    "Decimal",
    "Distance",
    "Duration",
    "HumanName",
    "Id",
    "Identifier",
    "Instant",
    "Integer",
    "Markdown",
    "Money",
    "Oid",
    "Period",
    "PositiveInt",
    "Quantity",
    "Range",
    "Ratio",
    "Reference",
    "SampledData",
    "Signature",
    "String",
    "Time",
    "Timing",
    "UnsignedInt",
    "Uri",
    "Url",
    "Uuid",
];

/// `valueQuantity` -> `Quantity`; only known data type suffixes count
fn choice_type_suffix(key: &str) -> Option<&str> {
    key.char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_ascii_uppercase())
        .map(|(i, _)| &key[i..])
        .find(|suffix| CHOICE_TYPES.contains(suffix))
}

/// Children named `name`, or the `name[x]` choice property when absent
fn named_children(children: &[(Arc<str>, Node)], name: &str) -> Collection {
    let exact: Collection = children
        .iter()
        .filter(|(n, _)| n.as_ref() == name)
        .map(|(_, node)| node.clone())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    children
        .iter()
        .filter(|(n, _)| {
            n.strip_prefix(name)
                .is_some_and(|suffix| CHOICE_TYPES.contains(&suffix))
        })
        .map(|(_, node)| node.clone())
        .collect()
}

impl Element for ElementNode {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn is_type(&self, type_name: &str) -> bool {
        self.type_name.as_ref() == type_name
            || self.base_types.iter().any(|t| t.as_ref() == type_name)
    }

    fn children(&self, name: &str) -> Collection {
        named_children(&self.children, name)
    }

    fn all_children(&self) -> Collection {
        self.children.iter().map(|(_, node)| node.clone()).collect()
    }

    fn value(&self) -> Option<PrimitiveValue> {
        self.value.clone()
    }
}

impl From<ElementNode> for Node {
    fn from(element: ElementNode) -> Self {
        element.into_node()
    }
}

impl Node {
    /// See [`ElementNode::from_json`]
    pub fn from_json(json: &JsonValue) -> Node {
        ElementNode::from_json(json)
    }
}

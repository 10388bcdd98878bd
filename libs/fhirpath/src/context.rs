//! Evaluation context for FHIRPath expressions
//!
//! Context provides access to variables, the current item (`$this`), and
//! iteration state. Child contexts created by `where()`, `select()` and
//! friends are cheap copies sharing the variable map.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::{Collection, Node};

/// Evaluation context containing variables and iteration state
#[derive(Clone, Debug)]
pub struct Context {
    /// Original input collection; fixed for the whole evaluation
    pub root: Collection,
    /// Current focus (`$this`)
    pub this: Collection,
    /// Current index in iteration (`$index`)
    pub index: Option<usize>,
    /// Running aggregate (`$total`)
    pub total: Option<Collection>,
    /// Environment variables (`%resource`, `%ucum`, user externals), stored
    /// without the leading `%`
    pub variables: Arc<HashMap<Arc<str>, Collection>>,
}

impl Context {
    /// Context over `input`; `%resource`, `%context` and `%rootResource` all refer to it
    pub fn new(input: impl Into<Collection>) -> Self {
        let input = input.into();
        Self::new_with_root_resource(input.clone(), input)
    }

    /// Context whose `%rootResource` differs from `%resource`
    ///
    /// Used when evaluating against a contained resource: `%resource` is the
    /// contained resource, `%rootResource` the containing one.
    pub fn new_with_root_resource(
        resource: impl Into<Collection>,
        root_resource: impl Into<Collection>,
    ) -> Self {
        let resource = resource.into();
        let mut variables: HashMap<Arc<str>, Collection> = HashMap::new();

        variables.insert(Arc::from("resource"), resource.clone());
        variables.insert(Arc::from("context"), resource.clone());
        variables.insert(Arc::from("rootResource"), root_resource.into());

        for (name, url) in [
            ("ucum", "http://unitsofmeasure.org"),
            ("sct", "http://snomed.info/sct"),
            ("loinc", "http://loinc.org"),
        ] {
            variables.insert(Arc::from(name), Collection::singleton(Node::string(url)));
        }

        Self {
            root: resource.clone(),
            this: resource,
            index: None,
            total: None,
            variables: Arc::new(variables),
        }
    }

    /// Context over a single node
    pub fn from_node(node: Node) -> Self {
        Self::new(Collection::singleton(node))
    }

    /// Context with no input (literal-only expressions)
    pub fn empty() -> Self {
        Self::new(Collection::empty())
    }

    /// Builder form of [`Context::set_variable`]
    pub fn with_variable(mut self, name: impl AsRef<str>, value: impl Into<Collection>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Bind an external constant; a leading `%` in `name` is ignored
    pub fn set_variable(&mut self, name: impl AsRef<str>, value: impl Into<Collection>) {
        let raw = name.as_ref();
        let name = raw.strip_prefix('%').unwrap_or(raw);
        Arc::make_mut(&mut self.variables).insert(Arc::from(name), value.into());
    }

    pub fn get_variable(&self, name: &str) -> Option<&Collection> {
        self.variables.get(name.strip_prefix('%').unwrap_or(name))
    }

    /// Child context focused on `this`
    pub fn with_this(&self, this: Collection) -> Self {
        Self {
            this,
            ..self.clone()
        }
    }

    /// Child context for one iteration step: `$this` is `item`, `$index` is `index`
    pub fn push_iteration(&self, item: Node, index: usize) -> Self {
        Self {
            this: Collection::singleton(item),
            index: Some(index),
            ..self.clone()
        }
    }

    /// Child context with `$total` bound
    pub fn with_total(&self, total: Collection) -> Self {
        Self {
            total: Some(total),
            ..self.clone()
        }
    }
}

//! Main FHIRPath engine
//!
//! Orchestrates the pipeline: Tokenize → Parse → AST → Evaluation. Compiled
//! expressions are cached by source text so repeated evaluations of the same
//! expression parse it once.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::functions::FunctionRegistry;
use crate::lexer::tokenize;
use crate::parser::{Parser, MAX_RECURSION_DEPTH};
use crate::value::{Collection, Node};

/// Engine configuration
///
/// Deserializable so hosts can load it from their own config files; missing
/// fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Number of compiled expressions kept in the LRU cache
    pub cache_capacity: usize,
    /// Maximum nesting depth accepted by the parser
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

/// A parsed expression, reusable across evaluations and threads
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: AstNode,
}

impl Expression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &AstNode {
        &self.ast
    }
}

/// Main FHIRPath engine
///
/// Safe to share between threads; the compile cache is guarded by a mutex and
/// evaluation holds no engine state.
pub struct Engine {
    function_registry: Arc<FunctionRegistry>,
    cache: Mutex<LruCache<String, Arc<Expression>>>,
    options: EngineOptions,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let capacity = NonZeroUsize::new(options.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            function_registry: Arc::new(FunctionRegistry::new()),
            cache: Mutex::new(LruCache::new(capacity)),
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn function_registry(&self) -> &Arc<FunctionRegistry> {
        &self.function_registry
    }

    // ============================================================================
    // Compilation
    // ============================================================================

    /// Parse an expression, or return the cached parse of the same source
    ///
    /// Failed parses are not cached.
    pub fn compile(&self, expr: &str) -> Result<Arc<Expression>> {
        {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(expression) = cache.get(expr) {
                tracing::trace!(expr, "compile cache hit");
                return Ok(Arc::clone(expression));
            }
        }

        tracing::trace!(expr, "compile cache miss");
        let ast = Parser::new(tokenize(expr)?)
            .with_max_depth(self.options.max_depth)
            .parse()?;
        let expression = Arc::new(Expression {
            source: expr.to_string(),
            ast,
        });

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(expr.to_string(), Arc::clone(&expression));
        Ok(expression)
    }

    /// Number of expressions currently cached
    pub fn cached_expressions(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    // ============================================================================
    // Evaluation
    // ============================================================================

    /// Evaluate a compiled expression against a context
    pub fn evaluate(&self, expression: &Expression, ctx: &Context) -> Result<Collection> {
        tracing::trace!(expr = expression.source(), input = ctx.this.len(), "evaluate");
        Evaluator::new(&self.function_registry).eval(expression.ast(), ctx)
    }

    /// Compile (cached) and evaluate
    pub fn evaluate_expr(&self, expr: &str, ctx: &Context) -> Result<Collection> {
        let expression = self.compile(expr)?;
        self.evaluate(&expression, ctx)
    }

    /// Evaluate against a single node, which also becomes `%resource`
    pub fn evaluate_node(&self, expr: &str, node: Node) -> Result<Collection> {
        self.evaluate_expr(expr, &Context::from_node(node))
    }

    /// Evaluate against a JSON resource
    ///
    /// # Example
    ///
    /// ```rust
    /// use ferrum_path::Engine;
    /// use serde_json::json;
    ///
    /// let engine = Engine::new();
    /// let resource = json!({"resourceType": "Patient", "name": [{"given": ["John"]}]});
    /// let given = engine.evaluate_json("Patient.name.given", &resource).unwrap();
    /// assert_eq!(given.len(), 1);
    /// ```
    pub fn evaluate_json(&self, expr: &str, resource: &JsonValue) -> Result<Collection> {
        self.evaluate_node(expr, Node::from_json(resource))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

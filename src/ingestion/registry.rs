//! Method handler registry
//!
//! In-memory registry mapping SOAP method names to their ingestion
//! handlers. Built once at startup; callers validate a method here before
//! any run state is touched.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::IngestError;
use crate::ingestion::context::RunContext;

/// Strategy interface implemented once per SOAP method.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// The exact SOAP method name this handler serves.
    fn method_name(&self) -> &'static str;

    /// Pulls, parses, validates, and persists one run's worth of data,
    /// accumulating metrics into the context.
    async fn execute(&self, context: &mut RunContext) -> Result<(), IngestError>;
}

/// Registry of ingestion method handlers keyed by method name.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    handlers: HashMap<&'static str, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn MethodHandler>) {
        self.handlers.insert(handler.method_name(), handler);
    }

    pub fn contains(&self, method_name: &str) -> bool {
        self.handlers.contains_key(method_name)
    }

    pub fn get(&self, method_name: &str) -> Result<Arc<dyn MethodHandler>, IngestError> {
        self.handlers
            .get(method_name)
            .cloned()
            .ok_or_else(|| {
                IngestError::Validation(format!("No handler found for method: {method_name}"))
            })
    }

    /// All registered method names, sorted for stable ordering.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().map(|s| s.to_string()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler(&'static str);

    #[async_trait]
    impl MethodHandler for NoopHandler {
        fn method_name(&self) -> &'static str {
            self.0
        }

        async fn execute(&self, _context: &mut RunContext) -> Result<(), IngestError> {
            Ok(())
        }
    }

    #[test]
    fn unknown_method_is_a_validation_error() {
        let registry = MethodRegistry::new();
        assert!(matches!(
            registry.get("nope"),
            Err(IngestError::Validation(_))
        ));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = MethodRegistry::new();
        registry.register(Arc::new(NoopHandler("zeta")));
        registry.register(Arc::new(NoopHandler("alpha")));

        assert_eq!(registry.method_names(), vec!["alpha", "zeta"]);
        assert!(registry.contains("alpha"));
        assert_eq!(registry.len(), 2);
    }
}

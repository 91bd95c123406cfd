//! Named route-loader registry.
//!
//! Route components are loaded by name: the application registers a loader
//! per route at startup, and `prefetch_route("reports")` later enqueues
//! that loader. An unknown name is logged and skipped, never an error:
//! prefetching is advisory.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::error::LoadError;

/// A reusable loader resolving one route's component.
pub type RouteLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<(), LoadError>> + Send + Sync>;

/// Registry mapping route names to their loaders.
#[derive(Clone, Default)]
pub struct RouteRegistry {
    routes: Arc<DashMap<String, RouteLoader>>,
}

impl RouteRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the loader for a route name.
    pub fn register<F, Fut>(&self, name: impl Into<String>, load: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), LoadError>> + Send + 'static,
    {
        use futures::future::FutureExt;
        self.routes
            .insert(name.into(), Arc::new(move || load().boxed()));
    }

    /// Looks up the loader for a route name.
    pub fn get(&self, name: &str) -> Option<RouteLoader> {
        self.routes.get(name).map(|entry| entry.value().clone())
    }

    /// Whether a loader is registered under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("len", &self.len())
            .finish()
    }
}

use crate::container::binding::ContextBindings;
use crate::container::class::ClassRegistry;
use crate::container::value::Value;
use crate::errors::CoreError;

/// Service ids currently being built, outermost first
#[derive(Debug, Clone, Default)]
pub struct ResolutionPath {
    pub services: Vec<String>,
}

impl ResolutionPath {
    /// Create a new resolution path
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service to the resolution path
    pub fn push(&mut self, service_id: impl Into<String>) {
        self.services.push(service_id.into());
    }

    /// Remove the last service from the resolution path
    pub fn pop(&mut self) -> Option<String> {
        self.services.pop()
    }

    /// Check if the path contains a service (for cycle detection)
    pub fn contains(&self, service_id: &str) -> bool {
        self.services.iter().any(|id| id == service_id)
    }

    pub fn depth(&self) -> usize {
        self.services.len()
    }

    /// Get the path as a string for error messages
    pub fn path_string(&self) -> String {
        self.services.join(" -> ")
    }

    /// Error for re-entering `service_id` while it is still being built
    pub fn cycle_error(&self, service_id: &str) -> CoreError {
        CoreError::CircularDependency {
            path: format!("{} -> {}", self.path_string(), service_id),
            cycle_service: service_id.to_string(),
        }
    }
}

/// What the parameter resolver, binder and instance resolver need from the
/// container while a service is being built.
pub trait DependencyResolver {
    /// Resolve a service by id or alias
    fn get(&self, id: &str) -> Result<Value, CoreError>;

    /// Look up a container parameter by exact name or dotted path
    fn parameter(&self, name: &str) -> Option<Value>;

    /// Contextual bindings declared for `class::method`
    fn context_bindings(&self, class: &str, method: &str) -> Option<&ContextBindings>;

    /// Class metadata available for instantiation and autowiring
    fn classes(&self) -> &ClassRegistry;
}

use std::collections::HashMap;

use crate::container::class::CONSTRUCTOR;
use crate::container::container::Container;
use crate::errors::CoreError;

/// Interface (or parameter name) to implementation service id, for one
/// class method
pub type ContextBindings = HashMap<String, String>;

/// Fluent builder for contextual bindings:
/// `container.when("Movie").method("set_actor").needs("ActorInterface").give("Actress")`
pub struct ContextualBindingBuilder<'c> {
    container: &'c mut Container,
    class: String,
    method: String,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub(crate) fn new(container: &'c mut Container, class: impl Into<String>) -> Self {
        Self {
            container,
            class: class.into(),
            method: CONSTRUCTOR.to_string(),
        }
    }

    /// Scope the binding to one method; the constructor when not called
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// The interface type or parameter name being overridden
    pub fn needs(self, needs: impl Into<String>) -> ContextualNeeds<'c> {
        ContextualNeeds {
            builder: self,
            needs: needs.into(),
        }
    }
}

pub struct ContextualNeeds<'c> {
    builder: ContextualBindingBuilder<'c>,
    needs: String,
}

impl<'c> ContextualNeeds<'c> {
    /// Service id to inject instead
    pub fn give(self, implementation: impl Into<String>) -> Result<&'c mut Container, CoreError> {
        let ContextualBindingBuilder {
            container,
            class,
            method,
        } = self.builder;
        container.add_context_binding(class, method, self.needs, implementation)?;
        Ok(container)
    }
}

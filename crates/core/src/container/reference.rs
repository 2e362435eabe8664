/// Marker requesting substitution with another resolved service.
///
/// References are placed inside descriptor arguments, method call arguments
/// and properties. The resolver dereferences them with `Container::get`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    id: String,
}

impl Reference {
    /// Create a reference to the service with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Get the referenced service id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Point the reference at another service
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_id() {
        let mut reference = Reference::new("director");
        assert_eq!(reference.id(), "director");
        assert_eq!(reference.to_string(), "@director");

        reference.set_id("actor");
        assert_eq!(reference.id(), "actor");
    }
}

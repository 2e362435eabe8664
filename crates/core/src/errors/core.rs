use thiserror::Error;

/// Core error type for the elif dependency injection container
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Class \"{class}\" is invalid")]
    InvalidClass { class: String },

    #[error("Can not instantiate \"{class}\": {reason}")]
    NotInstantiable { class: String, reason: String },

    #[error("Class \"{class}\" has no method \"{method}\"")]
    UnknownMethod { class: String, method: String },

    #[error("Class \"{class}\" has no property \"{property}\"")]
    UnknownProperty { class: String, property: String },

    #[error("Missing required parameter \"{parameter}\" when calling \"{callable}\"")]
    MissingParameter { parameter: String, callable: String },

    #[error("Parameter [{name}] is not defined")]
    UndefinedParameter { name: String },

    #[error("There is no definition named \"{service_id}\"")]
    ServiceNotFound { service_id: String },

    #[error("Circular dependency detected: {path} (cycle at: {cycle_service})")]
    CircularDependency { path: String, cycle_service: String },

    #[error("Type mismatch for {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },
}

impl CoreError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service_id: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_id: service_id.into(),
        }
    }

    /// Create a new invalid class error
    pub fn invalid_class(class: impl Into<String>) -> Self {
        Self::InvalidClass {
            class: class.into(),
        }
    }

    pub fn not_instantiable(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotInstantiable {
            class: class.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn unknown_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Create a missing parameter error naming the parameter and the callable
    pub fn missing_parameter(parameter: impl Into<String>, callable: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
            callable: callable.into(),
        }
    }

    /// Create an undefined parameter error for a `%name%` placeholder
    pub fn undefined_parameter(name: impl Into<String>) -> Self {
        Self::UndefinedParameter { name: name.into() }
    }

    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Check if the error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if the error is a service not found error.
    ///
    /// This is the only kind the dependency binder recovers from, and only
    /// for optional parameters.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }

    /// Check if the error was raised while reflecting or instantiating a class
    pub fn is_class_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidClass { .. }
                | Self::NotInstantiable { .. }
                | Self::UnknownMethod { .. }
                | Self::UnknownProperty { .. }
        )
    }

    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }
}

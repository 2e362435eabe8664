pub mod errors;
pub mod config;
pub mod container;

// Re-export key types for convenience
pub use errors::CoreError;
pub use config::{ConfigSource, ContainerConfig, ContainerDefaults};
pub use container::{
    Arguments, BoundArguments, Class, ClassKind, Container, Factory, FromValue, Object, Parameter,
    Reference, ServiceDescriptor, Value, CONSTRUCTOR,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const FRAMEWORK_NAME: &str = "elif-di";

/// Get library version
pub fn version() -> &'static str {
    VERSION
}

/// Get library name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}

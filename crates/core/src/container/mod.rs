#[allow(clippy::module_inception)]
pub mod container;
pub mod arguments;
pub mod binder;
pub mod binding;
pub mod class;
pub mod descriptor;
pub mod instance_resolver;
pub mod parameter_resolver;
pub mod parameters;
pub mod placeholder;
pub mod reference;
pub mod resolver;
pub mod value;

pub use container::Container;
pub use arguments::{ArgumentKey, Arguments};
pub use binder::DependencyBinder;
pub use binding::{ContextBindings, ContextualBindingBuilder, ContextualNeeds};
pub use class::{
    BoundArguments, Callable, Class, ClassBuilder, ClassKind, ClassRegistry, Instantiation,
    Parameter, Signature, CONSTRUCTOR,
};
pub use descriptor::{Concrete, Factory, MethodCall, ServiceDescriptor, TagAttributes};
pub use instance_resolver::InstanceResolver;
pub use parameter_resolver::ParameterResolver;
pub use parameters::ParameterBag;
pub use placeholder::{parse_argument, ArgumentToken, Segment};
pub use reference::Reference;
pub use resolver::{DependencyResolver, ResolutionPath};
pub use value::{FromValue, Object, Value};

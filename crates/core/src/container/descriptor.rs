use std::collections::BTreeMap;
use std::fmt;

use crate::container::arguments::{ArgumentKey, Arguments};
use crate::container::class::{BoundArguments, Callable, Parameter, Signature};
use crate::container::value::{Object, Value};
use crate::errors::CoreError;

/// Attributes attached to one occurrence of a tag
pub type TagAttributes = BTreeMap<String, Value>;

/// How a factory produces its service
#[derive(Clone)]
pub enum Factory {
    /// Closure with declared parameters
    Closure(Callable),
    /// Static method on a registered class
    Static { class: String, method: String },
    /// Factory method on another service; `service` is an `@id` string or a reference
    Method { service: Value, method: String },
}

impl Factory {
    /// Closure factory with declared parameters
    pub fn closure<F>(parameters: Vec<Parameter>, factory: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        Self::named("{closure}", parameters, factory)
    }

    /// Closure factory reported under `name` in error messages
    pub fn named<F>(name: impl Into<String>, parameters: Vec<Parameter>, factory: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        let name = name.into();
        Factory::Closure(Callable::new(name.clone(), Signature::new(name, parameters), factory))
    }

    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Factory::Static {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn method(service: impl Into<Value>, method: impl Into<String>) -> Self {
        Factory::Method {
            service: service.into(),
            method: method.into(),
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factory::Closure(callable) => write!(f, "Closure({})", callable.qualified_name()),
            Factory::Static { class, method } => write!(f, "Static({}::{})", class, method),
            Factory::Method { service, method } => write!(f, "Method({:?}, {})", service, method),
        }
    }
}

/// What a descriptor builds from
#[derive(Debug, Clone, Default)]
pub enum Concrete {
    /// Name of a registered class
    Class(String),
    Factory(Factory),
    /// Prebuilt value, always shared
    Instance(Value),
    #[default]
    Unset,
}

impl From<&str> for Concrete {
    fn from(class: &str) -> Self {
        Concrete::Class(class.to_string())
    }
}

impl From<String> for Concrete {
    fn from(class: String) -> Self {
        Concrete::Class(class)
    }
}

impl From<Factory> for Concrete {
    fn from(factory: Factory) -> Self {
        Concrete::Factory(factory)
    }
}

impl From<Object> for Concrete {
    fn from(object: Object) -> Self {
        Concrete::Instance(Value::Object(object))
    }
}

impl From<Value> for Concrete {
    fn from(value: Value) -> Self {
        Concrete::Instance(value)
    }
}

/// Setter call applied after construction
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Arguments,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: impl Into<Arguments>) -> Self {
        Self {
            method: method.into(),
            arguments: arguments.into(),
        }
    }
}

/// Recipe for one service: what to build, with which arguments, and what
/// to do with the instance afterwards.
#[derive(Clone)]
pub struct ServiceDescriptor {
    concrete: Concrete,
    arguments: Arguments,
    method_calls: Vec<MethodCall>,
    properties: Vec<(String, Value)>,
    tags: BTreeMap<String, Vec<TagAttributes>>,
    autowired: bool,
    shared: bool,
    public: bool,
    frozen: bool,
    resolved: Option<Value>,
}

impl ServiceDescriptor {
    /// Create a shared, autowired descriptor
    pub fn new(concrete: impl Into<Concrete>) -> Self {
        Self {
            concrete: concrete.into(),
            arguments: Arguments::new(),
            method_calls: Vec::new(),
            properties: Vec::new(),
            tags: BTreeMap::new(),
            autowired: true,
            shared: true,
            public: true,
            frozen: false,
            resolved: None,
        }
    }

    pub fn concrete(&self) -> &Concrete {
        &self.concrete
    }

    pub fn set_concrete(&mut self, concrete: impl Into<Concrete>) -> &mut Self {
        self.concrete = concrete.into();
        if matches!(self.concrete, Concrete::Instance(_)) {
            self.shared = true;
        }
        self
    }

    pub fn set_class(&mut self, class: impl Into<String>) -> &mut Self {
        self.set_concrete(Concrete::Class(class.into()))
    }

    pub fn class(&self) -> Option<&str> {
        match &self.concrete {
            Concrete::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn set_factory(&mut self, factory: Factory) -> &mut Self {
        self.set_concrete(Concrete::Factory(factory))
    }

    pub fn factory(&self) -> Option<&Factory> {
        match &self.concrete {
            Concrete::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    /// Use a prebuilt value; forces sharing
    pub fn set_instance(&mut self, instance: impl Into<Value>) -> &mut Self {
        self.set_concrete(Concrete::Instance(instance.into()))
    }

    /// Append a positional argument
    pub fn add_argument(&mut self, value: impl Into<Value>) -> &mut Self {
        self.arguments.push(value);
        self
    }

    /// Set an argument by position or parameter name
    pub fn set_argument(
        &mut self,
        key: impl Into<ArgumentKey>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.arguments.set(key, value);
        self
    }

    pub fn set_arguments(&mut self, arguments: impl Into<Arguments>) -> &mut Self {
        self.arguments = arguments.into();
        self
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn get_argument(&self, key: impl Into<ArgumentKey>) -> Option<&Value> {
        self.arguments.get(&key.into())
    }

    pub fn add_method_call(
        &mut self,
        method: impl Into<String>,
        arguments: impl Into<Arguments>,
    ) -> &mut Self {
        self.method_calls.push(MethodCall::new(method, arguments));
        self
    }

    /// Replace all method calls
    pub fn set_method_calls(&mut self, calls: Vec<MethodCall>) -> &mut Self {
        self.method_calls = calls;
        self
    }

    pub fn method_calls(&self) -> &[MethodCall] {
        &self.method_calls
    }

    pub fn has_method_call(&self, method: &str) -> bool {
        self.method_calls.iter().any(|call| call.method == method)
    }

    /// Set a property, replacing a previous value under the same name
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((name, value)),
        }
        self
    }

    /// Replace all properties
    pub fn set_properties<I, K, V>(&mut self, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.properties.clear();
        for (name, value) in properties {
            self.set_property(name, value);
        }
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn properties(&self) -> &[(String, Value)] {
        &self.properties
    }

    pub fn add_tag(&mut self, name: impl Into<String>, attributes: TagAttributes) -> &mut Self {
        self.tags.entry(name.into()).or_default().push(attributes);
        self
    }

    pub fn set_tags(&mut self, tags: BTreeMap<String, Vec<TagAttributes>>) -> &mut Self {
        self.tags = tags;
        self
    }

    pub fn tags(&self) -> &BTreeMap<String, Vec<TagAttributes>> {
        &self.tags
    }

    /// Attributes of every occurrence of a tag, empty if untagged
    pub fn get_tag(&self, name: &str) -> &[TagAttributes] {
        self.tags.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn clear_tag(&mut self, name: &str) -> &mut Self {
        self.tags.remove(name);
        self
    }

    pub fn clear_tags(&mut self) -> &mut Self {
        self.tags.clear();
        self
    }

    pub fn set_autowired(&mut self, autowired: bool) -> &mut Self {
        self.autowired = autowired;
        self
    }

    pub fn is_autowired(&self) -> bool {
        self.autowired
    }

    /// Literal instances stay shared regardless
    pub fn set_shared(&mut self, shared: bool) -> &mut Self {
        self.shared = shared || matches!(self.concrete, Concrete::Instance(_));
        self
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn set_public(&mut self, public: bool) -> &mut Self {
        self.public = public;
        self
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Instance produced by the last resolution of a shared service.
    /// Unshared services do not keep their instances.
    pub fn resolved(&self) -> Option<&Value> {
        self.resolved.as_ref()
    }

    /// A descriptor that already produced an instance can no longer be extended
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn set_resolved(&mut self, instance: Value) {
        self.frozen = true;
        if self.shared {
            self.resolved = Some(instance);
        }
    }
}

impl Default for ServiceDescriptor {
    fn default() -> Self {
        Self::new(Concrete::Unset)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("concrete", &self.concrete)
            .field("arguments", &self.arguments)
            .field("method_calls", &self.method_calls)
            .field("properties", &self.properties)
            .field("tags", &self.tags.keys().collect::<Vec<_>>())
            .field("autowired", &self.autowired)
            .field("shared", &self.shared)
            .field("public", &self.public)
            .field("frozen", &self.frozen)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_surface() {
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor
            .add_argument("Bob")
            .set_argument("age", 45)
            .add_method_call("set_age", vec![Value::Int(50)])
            .set_property("gender", "male")
            .set_shared(false)
            .set_autowired(false);

        assert_eq!(descriptor.class(), Some("Director"));
        assert_eq!(descriptor.get_argument(0usize), Some(&Value::from("Bob")));
        assert_eq!(descriptor.get_argument("age"), Some(&Value::Int(45)));
        assert!(descriptor.has_method_call("set_age"));
        assert!(!descriptor.has_method_call("set_name"));
        assert_eq!(descriptor.get_property("gender"), Some(&Value::from("male")));
        assert!(!descriptor.is_shared());
        assert!(!descriptor.is_autowired());
        assert!(descriptor.is_public());
        assert!(!descriptor.is_frozen());
    }

    #[test]
    fn test_instance_is_always_shared() {
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor.set_shared(false);
        descriptor.set_instance(Object::new(42u8));
        assert!(descriptor.is_shared());

        descriptor.set_shared(false);
        assert!(descriptor.is_shared());
    }

    #[test]
    fn test_tags() {
        let mut descriptor = ServiceDescriptor::default();
        descriptor
            .add_tag("my.tag", TagAttributes::new())
            .add_tag(
                "my.tag",
                TagAttributes::from([("priority".to_string(), Value::Int(1))]),
            );

        assert!(descriptor.has_tag("my.tag"));
        assert_eq!(descriptor.get_tag("my.tag").len(), 2);
        assert!(descriptor.get_tag("other").is_empty());

        descriptor.clear_tag("my.tag");
        assert!(!descriptor.has_tag("my.tag"));
    }

    #[test]
    fn test_set_method_calls_replaces() {
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor.add_method_call("set_name", vec![Value::from("Bob")]);
        descriptor.set_method_calls(vec![MethodCall::new("set_age", vec![Value::Int(50)])]);

        assert_eq!(descriptor.method_calls().len(), 1);
        assert_eq!(descriptor.method_calls()[0].method, "set_age");
    }
}

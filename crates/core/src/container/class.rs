use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::value::{FromValue, Object, Value};
use crate::errors::CoreError;

/// Method name under which constructors are bound and context-bound
pub const CONSTRUCTOR: &str = "new";

/// Formal parameter of a constructor, method or factory
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    type_hint: Option<String>,
    default: Option<Value>,
}

impl Parameter {
    /// Untyped (primitive) parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
        }
    }

    /// Parameter declared with a class or interface type, eligible for autowiring
    pub fn typed(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: Some(type_hint.into()),
            default: None,
        }
    }

    /// Give the parameter a default value, making it optional
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Optional parameter defaulting to null
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Ordered formal parameters of one callable
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_optional()).count()
    }
}

/// Fully bound argument list handed to a builder function.
///
/// Values are in declaration order; typed access reports the parameter and
/// callable on mismatch.
#[derive(Debug, Clone)]
pub struct BoundArguments {
    callable: String,
    names: Vec<String>,
    values: Vec<Value>,
}

impl BoundArguments {
    pub(crate) fn new(callable: impl Into<String>, names: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            callable: callable.into(),
            names,
            values,
        }
    }

    /// Name of the callable these arguments were bound for
    pub fn callable(&self) -> &str {
        &self.callable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Convert the argument at `index` into `T`
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, CoreError> {
        let name = self
            .names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index));
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or_else(|| CoreError::missing_parameter(&name, &self.callable))?;

        T::try_from_value(value).map_err(|found| {
            CoreError::type_mismatch(
                format!("parameter \"{}\" of \"{}\"", name, self.callable),
                std::any::type_name::<T>(),
                found.type_name(),
            )
        })
    }

    /// Convert the argument bound to the parameter called `name` into `T`
    pub fn named<T: FromValue>(&self, name: &str) -> Result<T, CoreError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| CoreError::missing_parameter(name, &self.callable))?;
        self.get(index)
    }
}

/// Type-erased receiver of methods and property setters
type Receiver = dyn Any + Send + Sync + 'static;

type CallableFn = dyn Fn(BoundArguments) -> Result<Value, CoreError> + Send + Sync;
type MethodFn = dyn Fn(&mut Receiver, BoundArguments) -> Result<(), CoreError> + Send + Sync;
type FactoryMethodFn = dyn Fn(&Receiver, BoundArguments) -> Result<Value, CoreError> + Send + Sync;
type PropertyFn = dyn Fn(&mut Receiver, Value) -> Result<(), CoreError> + Send + Sync;
type InstantiateFn = dyn Fn() -> Object + Send + Sync;

/// Free function with a declared signature: constructors, static methods
/// and closure factories.
#[derive(Clone)]
pub struct Callable {
    qualified_name: String,
    signature: Signature,
    func: Arc<CallableFn>,
}

impl Callable {
    pub fn new<F>(qualified_name: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        Self {
            qualified_name: qualified_name.into(),
            signature,
            func: Arc::new(func),
        }
    }

    /// Name used in error messages, e.g. `Director::new`
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call(&self, arguments: BoundArguments) -> Result<Value, CoreError> {
        (self.func)(arguments)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.qualified_name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// Setter-style method invoked on a freshly built instance
#[derive(Clone)]
pub struct Method {
    signature: Signature,
    func: Arc<MethodFn>,
}

impl Method {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn invoke(
        &self,
        target: &mut Receiver,
        arguments: BoundArguments,
    ) -> Result<(), CoreError> {
        (self.func)(target, arguments)
    }
}

/// Method producing a value from a shared instance (`["@service", "method"]` factories)
#[derive(Clone)]
pub struct FactoryMethod {
    signature: Signature,
    func: Arc<FactoryMethodFn>,
}

impl FactoryMethod {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn invoke(
        &self,
        target: &Receiver,
        arguments: BoundArguments,
    ) -> Result<Value, CoreError> {
        (self.func)(target, arguments)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Concrete => "class",
            ClassKind::Abstract => "abstract class",
            ClassKind::Interface => "interface",
        }
    }
}

/// How a concrete class produces an instance
#[derive(Clone)]
pub enum Instantiation {
    /// Constructor with parameters to bind
    Constructor(Callable),
    /// No constructor: instantiate directly without argument binding
    Bare(Arc<InstantiateFn>),
    /// No public way to build an instance
    None,
}

/// Runtime description of a constructible type, registered explicitly in
/// place of language reflection.
#[derive(Clone)]
pub struct Class {
    name: String,
    kind: ClassKind,
    type_id: Option<TypeId>,
    instantiation: Instantiation,
    methods: HashMap<String, Method>,
    static_methods: HashMap<String, Callable>,
    factory_methods: HashMap<String, FactoryMethod>,
    properties: HashMap<String, Arc<PropertyFn>>,
}

impl Class {
    /// Start describing the Rust type `T` under a class name
    pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> ClassBuilder<T> {
        ClassBuilder::new(name)
    }

    /// Declare an interface: resolvable only through a binding
    pub fn interface(name: impl Into<String>) -> Self {
        Self::bare_kind(name.into(), ClassKind::Interface)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::bare_kind(name.into(), ClassKind::Abstract)
    }

    fn bare_kind(name: String, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            type_id: None,
            instantiation: Instantiation::None,
            methods: HashMap::new(),
            static_methods: HashMap::new(),
            factory_methods: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn instantiation(&self) -> &Instantiation {
        &self.instantiation
    }

    pub fn constructor(&self) -> Option<&Callable> {
        match &self.instantiation {
            Instantiation::Constructor(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete && !matches!(self.instantiation, Instantiation::None)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn static_method(&self, name: &str) -> Option<&Callable> {
        self.static_methods.get(name)
    }

    pub fn factory_method(&self, name: &str) -> Option<&FactoryMethod> {
        self.factory_methods.get(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub(crate) fn set_property(
        &self,
        target: &mut Receiver,
        name: &str,
        value: Value,
    ) -> Result<(), CoreError> {
        let setter = self
            .properties
            .get(name)
            .ok_or_else(|| CoreError::unknown_property(&self.name, name))?;
        setter(target, value)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        let mut properties: Vec<&String> = self.properties.keys().collect();
        properties.sort();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor().map(Callable::signature))
            .field("methods", &methods)
            .field("properties", &properties)
            .finish()
    }
}

/// Typed builder erasing closures over `T` into a `Class`
pub struct ClassBuilder<T> {
    class: Class,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        let mut class = Class::bare_kind(name.into(), ClassKind::Concrete);
        class.type_id = Some(TypeId::of::<T>());
        Self {
            class,
            _marker: PhantomData,
        }
    }

    /// Mark the class abstract; it keeps its methods but cannot be instantiated
    pub fn abstract_class(mut self) -> Self {
        self.class.kind = ClassKind::Abstract;
        self
    }

    /// Declare the constructor
    pub fn constructor<F>(mut self, parameters: Vec<Parameter>, constructor: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        let qualified = format!("{}::{}", self.class.name, CONSTRUCTOR);
        let signature = Signature::new(CONSTRUCTOR, parameters);
        self.class.instantiation = Instantiation::Constructor(Callable::new(
            qualified,
            signature,
            move |arguments| constructor(arguments).map(Value::object),
        ));
        self
    }

    /// Declare a setter-style method usable in method calls
    pub fn method<F>(
        mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        method: F,
    ) -> Self
    where
        F: Fn(&mut T, BoundArguments) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        let name = name.into();
        let receiver = format!("{}::{}", self.class.name, name);
        let func = move |target: &mut Receiver, arguments: BoundArguments| {
            let this = target.downcast_mut::<T>().ok_or_else(|| {
                CoreError::type_mismatch(
                    format!("receiver of \"{}\"", receiver),
                    std::any::type_name::<T>(),
                    "another type",
                )
            })?;
            method(this, arguments)
        };
        self.class.methods.insert(
            name.clone(),
            Method {
                signature: Signature::new(name, parameters),
                func: Arc::new(func),
            },
        );
        self
    }

    /// Declare a static method, usable as `Factory::static_method`
    pub fn static_method<F>(
        mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        method: F,
    ) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        let name = name.into();
        let qualified = format!("{}::{}", self.class.name, name);
        self.class.static_methods.insert(
            name.clone(),
            Callable::new(qualified, Signature::new(name, parameters), method),
        );
        self
    }

    /// Declare a method producing a value from a shared instance, usable as
    /// `Factory::method`
    pub fn factory_method<F>(
        mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        method: F,
    ) -> Self
    where
        F: Fn(&T, BoundArguments) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        let name = name.into();
        let receiver = format!("{}::{}", self.class.name, name);
        let func = move |target: &Receiver, arguments: BoundArguments| {
            let this = target.downcast_ref::<T>().ok_or_else(|| {
                CoreError::type_mismatch(
                    format!("receiver of \"{}\"", receiver),
                    std::any::type_name::<T>(),
                    "another type",
                )
            })?;
            method(this, arguments)
        };
        self.class.factory_methods.insert(
            name.clone(),
            FactoryMethod {
                signature: Signature::new(name, parameters),
                func: Arc::new(func),
            },
        );
        self
    }

    /// Declare a writable property
    pub fn property<F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        let name = name.into();
        let owner = format!("{}::{}", self.class.name, name);
        let func = move |target: &mut Receiver, value: Value| {
            let this = target.downcast_mut::<T>().ok_or_else(|| {
                CoreError::type_mismatch(
                    format!("owner of property \"{}\"", owner),
                    std::any::type_name::<T>(),
                    "another type",
                )
            })?;
            setter(this, value)
        };
        self.class.properties.insert(name, Arc::new(func));
        self
    }

    pub fn build(self) -> Class {
        self.class
    }
}

impl<T: Any + Send + Sync + Default> ClassBuilder<T> {
    /// The class has no constructor and is built from `T::default()`
    pub fn default_constructible(mut self) -> Self {
        self.class.instantiation = Instantiation::Bare(Arc::new(|| Object::new(T::default())));
        self
    }
}

/// Class metadata indexed by name and by Rust type
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<Class>>,
    by_type: HashMap<TypeId, String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any class with the same name.
    ///
    /// The type index keeps an instantiable class over an abstract one
    /// sharing its Rust type.
    pub fn define(&mut self, class: Class) {
        if let Some(type_id) = class.type_id {
            let keep_existing = !class.is_instantiable()
                && self
                    .by_type
                    .get(&type_id)
                    .and_then(|name| self.classes.get(name))
                    .map_or(false, |existing| existing.is_instantiable());
            if !keep_existing {
                self.by_type.insert(type_id, class.name.clone());
            }
        }
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.get(name).cloned()
    }

    /// Find the class describing an instance's concrete type
    pub fn for_object(&self, object: &Object) -> Option<Arc<Class>> {
        self.by_type
            .get(&object.type_id())
            .and_then(|name| self.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

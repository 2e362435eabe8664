use std::any::Any;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{ContainerConfig, ContainerDefaults};
use crate::container::binding::{ContextBindings, ContextualBindingBuilder};
use crate::container::class::{Class, ClassKind, ClassRegistry};
use crate::container::descriptor::{Concrete, ServiceDescriptor, TagAttributes};
use crate::container::instance_resolver::InstanceResolver;
use crate::container::parameters::ParameterBag;
use crate::container::resolver::{DependencyResolver, ResolutionPath};
use crate::container::value::Value;
use crate::errors::CoreError;

/// Service container: descriptors, shared instances, aliases, parameters,
/// class metadata and contextual bindings, owned by one value.
pub struct Container {
    definitions: RwLock<HashMap<String, ServiceDescriptor>>,
    instances: RwLock<HashMap<String, Value>>,
    aliases: HashMap<String, String>,
    parameters: ParameterBag,
    classes: ClassRegistry,
    context: HashMap<String, HashMap<String, ContextBindings>>,
    defaults: ContainerDefaults,
}

impl Container {
    /// Create an empty container with default settings
    pub fn new() -> Self {
        Self::with_defaults(ContainerDefaults::default())
    }

    pub fn with_defaults(defaults: ContainerDefaults) -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            aliases: HashMap::new(),
            parameters: ParameterBag::new(),
            classes: ClassRegistry::new(),
            context: HashMap::new(),
            defaults,
        }
    }

    /// Build a container from loaded configuration
    pub fn from_config(config: ContainerConfig) -> Self {
        tracing::debug!("Building container from {}", config.source());
        let ContainerConfig {
            defaults,
            parameters,
            aliases,
            ..
        } = config;

        let mut container = Self::with_defaults(defaults);
        container.set_parameters(parameters);
        for (alias, id) in aliases {
            container.set_alias(alias, id);
        }
        container
    }

    /// Register a service built from a class name, a factory or a literal
    /// instance. Defaults are applied and any cached instance is dropped.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        concrete: impl Into<Concrete>,
    ) -> &mut ServiceDescriptor {
        let mut descriptor = ServiceDescriptor::new(concrete);
        descriptor
            .set_shared(self.defaults.share)
            .set_autowired(self.defaults.autowire);
        self.set_descriptor(id, descriptor)
    }

    /// Register a class under its own name
    pub fn register_class(&mut self, class: impl Into<String>) -> &mut ServiceDescriptor {
        let class = class.into();
        self.register(class.clone(), Concrete::Class(class))
    }

    /// Store a prebuilt descriptor as is
    pub fn set_descriptor(
        &mut self,
        id: impl Into<String>,
        descriptor: ServiceDescriptor,
    ) -> &mut ServiceDescriptor {
        let id = id.into();
        tracing::debug!("Registering service '{}'", id);

        self.instances
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        let definitions = self.definitions.get_mut().unwrap_or_else(PoisonError::into_inner);
        match definitions.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(descriptor);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(descriptor),
        }
    }

    /// Resolve a service by id or alias
    pub fn get(&self, id: &str) -> Result<Value, CoreError> {
        Resolution::new(self).get(id)
    }

    /// Resolve a service and downcast it to `T`
    pub fn get_object<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>, CoreError> {
        let value = self.get(id)?;
        value.downcast::<T>().ok_or_else(|| {
            CoreError::type_mismatch(
                format!("service \"{}\"", id),
                std::any::type_name::<T>(),
                value.type_name(),
            )
        })
    }

    /// Whether a descriptor exists for the id or alias
    pub fn has(&self, id: &str) -> bool {
        let id = self.resolve_alias(id);
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Drop a descriptor and its cached instance
    pub fn remove(&mut self, id: &str) -> Option<ServiceDescriptor> {
        self.instances
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        self.definitions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Get a descriptor for modification, as long as it has not produced an
    /// instance yet
    pub fn extend(&mut self, id: &str) -> Result<&mut ServiceDescriptor, CoreError> {
        let descriptor = self
            .definitions
            .get_mut()
            .map_err(|_| CoreError::LockError {
                resource: "definitions".to_string(),
            })?
            .get_mut(id)
            .ok_or_else(|| CoreError::service_not_found(id))?;
        if descriptor.is_frozen() {
            return Err(CoreError::configuration(format!(
                "Cannot override frozen service \"{}\"",
                id
            )));
        }
        Ok(descriptor)
    }

    /// Get a copy of a descriptor
    pub fn descriptor(&self, id: &str) -> Option<ServiceDescriptor> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(self.resolve_alias(id))
            .cloned()
    }

    /// All registered service ids, sorted
    pub fn service_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn set_alias(&mut self, alias: impl Into<String>, id: impl Into<String>) {
        self.aliases.insert(alias.into(), id.into());
    }

    pub fn get_alias(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// The id an alias points to, or the id itself
    pub fn resolve_alias<'a>(&'a self, id: &'a str) -> &'a str {
        self.get_alias(id).unwrap_or(id)
    }

    /// Ids of every service carrying `tag`, with the tag's attributes
    pub fn find_tagged_service_ids(&self, tag: &str) -> BTreeMap<String, Vec<TagAttributes>> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, descriptor)| descriptor.has_tag(tag))
            .map(|(id, descriptor)| (id.clone(), descriptor.get_tag(tag).to_vec()))
            .collect()
    }

    pub fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }

    /// Replace all parameters
    pub fn set_parameters(&mut self, parameters: BTreeMap<String, Value>) {
        self.parameters.set_parameters(parameters);
    }

    pub fn add_parameters(&mut self, parameters: BTreeMap<String, Value>) {
        self.parameters.add_parameters(parameters);
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.set_parameter(name, value);
    }

    pub fn get_parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Register class metadata used for instantiation and autowiring
    pub fn define_class(&mut self, class: Class) -> &mut Self {
        tracing::trace!("Defining class '{}'", class.name());
        self.classes.define(class);
        self
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Start a contextual binding for `class`
    pub fn when(&mut self, class: impl Into<String>) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, class)
    }

    /// Inject `implementation` for `needs` (an interface or parameter name)
    /// in `class::method`
    pub fn add_context_binding(
        &mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        needs: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Result<(), CoreError> {
        let (class, method, needs) = (class.into(), method.into(), needs.into());
        let implementation = implementation.into();
        if implementation.is_empty() || needs.is_empty() {
            return Err(CoreError::configuration(format!(
                "Invalid binding target for \"{}\" in {}::{}",
                needs, class, method
            )));
        }

        self.context
            .entry(class)
            .or_default()
            .entry(method)
            .or_default()
            .insert(needs, implementation);
        Ok(())
    }

    pub fn context_bindings(&self, class: &str, method: &str) -> Option<&ContextBindings> {
        self.context.get(class).and_then(|methods| methods.get(method))
    }

    pub fn defaults(&self) -> &ContainerDefaults {
        &self.defaults
    }

    /// Defaults apply to services registered afterwards
    pub fn set_defaults(&mut self, defaults: ContainerDefaults) {
        self.defaults = defaults;
    }

    fn cached(&self, id: &str) -> Result<Option<Value>, CoreError> {
        let instances = self.instances.read().map_err(|_| CoreError::LockError {
            resource: "instances".to_string(),
        })?;
        Ok(instances.get(id).cloned())
    }

    /// Descriptor for `id`, registering a class-named service on first use
    fn descriptor_for(&self, id: &str) -> Result<ServiceDescriptor, CoreError> {
        {
            let definitions = self.definitions.read().map_err(|_| CoreError::LockError {
                resource: "definitions".to_string(),
            })?;
            if let Some(descriptor) = definitions.get(id) {
                return Ok(descriptor.clone());
            }
        }

        match self.classes.get(id) {
            Some(class) if class.kind() != ClassKind::Interface => {
                tracing::debug!("Auto-registering class '{}' as a service", id);
                let mut descriptor = ServiceDescriptor::new(Concrete::Class(id.to_string()));
                descriptor
                    .set_shared(self.defaults.share)
                    .set_autowired(self.defaults.autowire);

                let mut definitions = self.definitions.write().map_err(|_| CoreError::LockError {
                    resource: "definitions".to_string(),
                })?;
                Ok(definitions
                    .entry(id.to_string())
                    .or_insert(descriptor)
                    .clone())
            }
            _ => Err(CoreError::service_not_found(id)),
        }
    }

    /// Record a successful resolution on the stored descriptor and cache it
    /// when shared
    fn store(
        &self,
        id: &str,
        descriptor: &ServiceDescriptor,
        instance: &Value,
    ) -> Result<(), CoreError> {
        {
            let mut definitions = self.definitions.write().map_err(|_| CoreError::LockError {
                resource: "definitions".to_string(),
            })?;
            if let Some(stored) = definitions.get_mut(id) {
                stored.set_resolved(instance.clone());
            }
        }

        if descriptor.is_shared() {
            let mut instances = self.instances.write().map_err(|_| CoreError::LockError {
                resource: "instances".to_string(),
            })?;
            instances.insert(id.to_string(), instance.clone());
        }
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.service_ids())
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters.len())
            .field("classes", &self.classes.names())
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// State of one top-level `get`: the path of services being built
struct Resolution<'c> {
    container: &'c Container,
    path: RefCell<ResolutionPath>,
}

impl<'c> Resolution<'c> {
    fn new(container: &'c Container) -> Self {
        Self {
            container,
            path: RefCell::new(ResolutionPath::new()),
        }
    }

    fn build(&self, id: &str) -> Result<Value, CoreError> {
        let mut descriptor = self.container.descriptor_for(id)?;
        tracing::debug!("Resolving service '{}'", id);

        let instance = InstanceResolver::new(self).resolve(id, &mut descriptor)?;
        self.container.store(id, &descriptor, &instance)?;

        tracing::debug!(
            "Resolved service '{}' (shared: {})",
            id,
            descriptor.is_shared()
        );
        Ok(instance)
    }
}

impl DependencyResolver for Resolution<'_> {
    fn get(&self, id: &str) -> Result<Value, CoreError> {
        let id = self.container.resolve_alias(id);

        if let Some(instance) = self.container.cached(id)? {
            tracing::trace!("Shared instance cache hit for '{}'", id);
            return Ok(instance);
        }

        if self.path.borrow().contains(id) {
            let err = self.path.borrow().cycle_error(id);
            tracing::warn!("{}", err);
            return Err(err);
        }

        self.path.borrow_mut().push(id);
        let result = self.build(id);
        self.path.borrow_mut().pop();
        result
    }

    fn parameter(&self, name: &str) -> Option<Value> {
        self.container.parameters.get(name).cloned()
    }

    fn context_bindings(&self, class: &str, method: &str) -> Option<&ContextBindings> {
        self.container.context_bindings(class, method)
    }

    fn classes(&self) -> &ClassRegistry {
        &self.container.classes
    }
}

use std::sync::Arc;

use crate::container::binder::DependencyBinder;
use crate::container::class::{Class, ClassKind, Instantiation, CONSTRUCTOR};
use crate::container::descriptor::{Concrete, Factory, ServiceDescriptor};
use crate::container::parameter_resolver::ParameterResolver;
use crate::container::resolver::DependencyResolver;
use crate::container::value::{Object, Value};
use crate::errors::CoreError;

/// Builds the instance described by a `ServiceDescriptor`.
///
/// Construction goes through a factory, a class constructor or a literal
/// instance. Method calls then run in registration order, followed by
/// property assignments. The instance is recorded on the descriptor only
/// once every step succeeded.
pub struct InstanceResolver<'r, R: DependencyResolver + ?Sized> {
    resolver: &'r R,
}

impl<'r, R: DependencyResolver + ?Sized> InstanceResolver<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Build the service `id` from its descriptor
    pub fn resolve(
        &self,
        id: &str,
        descriptor: &mut ServiceDescriptor,
    ) -> Result<Value, CoreError> {
        let binder = DependencyBinder::new(self.resolver, descriptor.is_autowired());

        let (instance, class) = match descriptor.concrete() {
            Concrete::Factory(factory) => {
                (self.create_from_factory(&binder, factory, descriptor)?, None)
            }
            Concrete::Class(name) => {
                let class = self.instantiable_class(name)?;
                (self.create_from_class(&binder, &class, descriptor)?, Some(class))
            }
            Concrete::Instance(instance) => (instance.clone(), None),
            Concrete::Unset => match descriptor.resolved() {
                Some(resolved) => return Ok(resolved.clone()),
                None => {
                    return Err(CoreError::configuration(format!(
                        "The definition of \"{}\" has no class, factory or instance",
                        id
                    )))
                }
            },
        };

        let instance = self.post_process(&binder, id, descriptor, instance, class)?;
        descriptor.set_resolved(instance.clone());
        Ok(instance)
    }

    /// Look up a class by name and check that it can be built
    fn instantiable_class(&self, name: &str) -> Result<Arc<Class>, CoreError> {
        let class = self
            .resolver
            .classes()
            .get(name)
            .ok_or_else(|| CoreError::invalid_class(name))?;
        if !class.is_instantiable() {
            let reason = match class.kind() {
                ClassKind::Concrete => "it has no public constructor".to_string(),
                kind => format!("it is an {}", kind.as_str()),
            };
            return Err(CoreError::not_instantiable(name, reason));
        }
        Ok(class)
    }

    fn create_from_class(
        &self,
        binder: &DependencyBinder<'r, R>,
        class: &Class,
        descriptor: &ServiceDescriptor,
    ) -> Result<Value, CoreError> {
        let name = class.name();
        match class.instantiation() {
            Instantiation::Bare(instantiate) => Ok(Value::Object(instantiate())),
            Instantiation::Constructor(constructor) => {
                let context = self.resolver.context_bindings(name, CONSTRUCTOR);
                let arguments = binder.bind(
                    constructor.qualified_name(),
                    constructor.signature(),
                    descriptor.arguments(),
                    context,
                )?;
                constructor.call(arguments)
            }
            Instantiation::None => Err(CoreError::not_instantiable(
                name,
                "it has no public constructor",
            )),
        }
    }

    fn create_from_factory(
        &self,
        binder: &DependencyBinder<'r, R>,
        factory: &Factory,
        descriptor: &ServiceDescriptor,
    ) -> Result<Value, CoreError> {
        match factory {
            Factory::Closure(callable) => {
                let arguments = binder.bind(
                    callable.qualified_name(),
                    callable.signature(),
                    descriptor.arguments(),
                    None,
                )?;
                callable.call(arguments)
            }
            Factory::Static { class, method } => {
                let reflected = self
                    .resolver
                    .classes()
                    .get(class)
                    .ok_or_else(|| CoreError::invalid_class(class))?;
                let callable = reflected
                    .static_method(method)
                    .ok_or_else(|| CoreError::unknown_method(class, method))?;
                let arguments = binder.bind(
                    callable.qualified_name(),
                    callable.signature(),
                    descriptor.arguments(),
                    self.resolver.context_bindings(class, method),
                )?;
                callable.call(arguments)
            }
            Factory::Method { service, method } => {
                let target = self.factory_target(service)?;
                let class = self.class_of(&target)?;
                let factory_method = class
                    .factory_method(method)
                    .ok_or_else(|| CoreError::unknown_method(class.name(), method))?;
                let arguments = binder.bind(
                    &format!("{}::{}", class.name(), method),
                    factory_method.signature(),
                    descriptor.arguments(),
                    self.resolver.context_bindings(class.name(), method),
                )?;
                factory_method.invoke(target.as_any(), arguments)
            }
        }
    }

    /// Resolve the receiver of a `[service, method]` factory
    fn factory_target(&self, service: &Value) -> Result<Object, CoreError> {
        let resolved = match service {
            Value::String(id) => self.resolver.get(id.strip_prefix('@').unwrap_or(id))?,
            Value::Reference(reference) => self.resolver.get(reference.id())?,
            other => other.clone(),
        };
        match resolved {
            Value::Object(object) => Ok(object),
            other => Err(CoreError::configuration(format!(
                "The factory target is a {} and is not callable",
                other.type_name()
            ))),
        }
    }

    fn class_of(&self, object: &Object) -> Result<Arc<Class>, CoreError> {
        self.resolver
            .classes()
            .for_object(object)
            .ok_or_else(|| CoreError::invalid_class(object.type_name()))
    }

    /// Apply method calls then properties to a freshly built instance.
    ///
    /// `class` is the class the instance was built from. Factory results and
    /// literal instances pass `None` and are looked up by their Rust type.
    fn post_process(
        &self,
        binder: &DependencyBinder<'r, R>,
        id: &str,
        descriptor: &ServiceDescriptor,
        instance: Value,
        class: Option<Arc<Class>>,
    ) -> Result<Value, CoreError> {
        if descriptor.method_calls().is_empty() && descriptor.properties().is_empty() {
            return Ok(instance);
        }

        let mut object = match instance {
            Value::Object(object) => object,
            other => {
                return Err(CoreError::configuration(format!(
                    "Service \"{}\" resolved to a {} which has no methods or properties",
                    id,
                    other.type_name()
                )))
            }
        };
        let class = match class {
            Some(class) => class,
            None => self.class_of(&object)?,
        };

        for call in descriptor.method_calls() {
            let method = class
                .method(&call.method)
                .ok_or_else(|| CoreError::unknown_method(class.name(), &call.method))?;
            let arguments = binder.bind(
                &format!("{}::{}", class.name(), call.method),
                method.signature(),
                &call.arguments,
                self.resolver.context_bindings(class.name(), &call.method),
            )?;
            let target = object.get_mut().ok_or_else(|| not_unique(id))?;
            method.invoke(target, arguments)?;
        }

        let parameters = ParameterResolver::new(self.resolver);
        for (name, raw) in descriptor.properties() {
            if !class.has_property(name) {
                return Err(CoreError::unknown_property(class.name(), name));
            }
            let value = parameters.resolve(raw)?;
            let target = object.get_mut().ok_or_else(|| not_unique(id))?;
            class.set_property(target, name, value)?;
        }

        Ok(Value::Object(object))
    }
}

fn not_unique(id: &str) -> CoreError {
    CoreError::configuration(format!(
        "Service \"{}\" is a shared instance; method calls and properties need a freshly built one",
        id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::binding::ContextBindings;
    use crate::container::class::{ClassRegistry, Parameter};
    use crate::container::parameters::ParameterBag;

    #[derive(Debug, Default)]
    struct Director {
        name: String,
        age: i64,
        gender: String,
    }

    struct Fixture {
        parameters: ParameterBag,
        classes: ClassRegistry,
    }

    impl DependencyResolver for Fixture {
        fn get(&self, id: &str) -> Result<Value, CoreError> {
            match id {
                "director" => Ok(Value::object(Director::default())),
                _ => Err(CoreError::service_not_found(id)),
            }
        }

        fn parameter(&self, name: &str) -> Option<Value> {
            self.parameters.get(name).cloned()
        }

        fn context_bindings(&self, _class: &str, _method: &str) -> Option<&ContextBindings> {
            None
        }

        fn classes(&self) -> &ClassRegistry {
            &self.classes
        }
    }

    fn fixture() -> Fixture {
        let mut classes = ClassRegistry::new();
        classes.define(
            Class::builder::<Director>("Director")
                .constructor(
                    vec![
                        Parameter::new("name").with_default(""),
                        Parameter::new("age").with_default(0),
                    ],
                    |args| {
                        Ok(Director {
                            name: args.get(0)?,
                            age: args.get(1)?,
                            gender: String::new(),
                        })
                    },
                )
                .method("set_age", vec![Parameter::new("age")], |this, args| {
                    this.age = args.get(0)?;
                    Ok(())
                })
                .method("append_name", vec![Parameter::new("suffix")], |this, args| {
                    this.name.push_str(&args.get::<String>(0)?);
                    Ok(())
                })
                .property("gender", |this, value| {
                    this.gender = value.as_str().unwrap_or_default().to_string();
                    Ok(())
                })
                .static_method("create", vec![Parameter::new("name")], |args| {
                    Ok(Value::object(Director {
                        name: args.get(0)?,
                        ..Director::default()
                    }))
                })
                .factory_method("clone_named", vec![Parameter::new("name")], |this, args| {
                    Ok(Value::object(Director {
                        name: args.get(0)?,
                        age: this.age,
                        gender: this.gender.clone(),
                    }))
                })
                .build(),
        );
        classes.define(Class::interface("ActorInterface"));
        Fixture {
            parameters: ParameterBag::new(),
            classes,
        }
    }

    fn director(value: &Value) -> &Director {
        value.as_object().and_then(|o| o.downcast_ref::<Director>()).unwrap()
    }

    #[test]
    fn test_round_trip_construction() {
        let fixture = fixture();
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor
            .set_arguments(vec![Value::from("Bob"), Value::Int(45)])
            .add_method_call("set_age", vec![Value::Int(50)])
            .set_property("gender", "male");

        let instance = InstanceResolver::new(&fixture)
            .resolve("director", &mut descriptor)
            .unwrap();
        let built = director(&instance);
        assert_eq!(built.name, "Bob");
        assert_eq!(built.age, 50);
        assert_eq!(built.gender, "male");
        assert!(descriptor.is_frozen());
    }

    #[test]
    fn test_method_calls_apply_in_order() {
        let fixture = fixture();
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor
            .set_argument("name", "a")
            .add_method_call("append_name", vec![Value::from("b")])
            .add_method_call("set_age", vec![Value::Int(10)])
            .add_method_call("append_name", vec![Value::from("c")])
            .add_method_call("set_age", vec![Value::Int(20)]);

        let instance = InstanceResolver::new(&fixture)
            .resolve("director", &mut descriptor)
            .unwrap();
        assert_eq!(director(&instance).name, "abc");
        assert_eq!(director(&instance).age, 20);
    }

    #[test]
    fn test_unknown_method_leaves_descriptor_unresolved() {
        let fixture = fixture();
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor.add_method_call("set_height", Vec::<Value>::new());

        let err = InstanceResolver::new(&fixture)
            .resolve("director", &mut descriptor)
            .unwrap_err();
        assert_eq!(err.to_string(), "Class \"Director\" has no method \"set_height\"");
        assert!(!descriptor.is_frozen());
    }

    #[test]
    fn test_unknown_property() {
        let fixture = fixture();
        let mut descriptor = ServiceDescriptor::new("Director");
        descriptor.set_property("height", 180);

        let err = InstanceResolver::new(&fixture)
            .resolve("director", &mut descriptor)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownProperty { .. }));
    }

    #[test]
    fn test_class_errors() {
        let fixture = fixture();
        let resolver = InstanceResolver::new(&fixture);

        let err = resolver
            .resolve("x", &mut ServiceDescriptor::new("NoSuchClass"))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidClass { .. }));

        let err = resolver
            .resolve("x", &mut ServiceDescriptor::new("ActorInterface"))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotInstantiable { .. }));

        let err = resolver
            .resolve("x", &mut ServiceDescriptor::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_factories() {
        let fixture = fixture();
        let resolver = InstanceResolver::new(&fixture);

        let mut descriptor = ServiceDescriptor::new(Factory::closure(
            vec![Parameter::new("age")],
            |args| Ok(Value::Int(args.get::<i64>(0)? * 2)),
        ));
        descriptor.set_argument("age", 21);
        assert_eq!(resolver.resolve("x", &mut descriptor).unwrap(), Value::Int(42));

        let mut descriptor = ServiceDescriptor::new(Factory::static_method("Director", "create"));
        descriptor.add_argument("Bob");
        assert_eq!(director(&resolver.resolve("x", &mut descriptor).unwrap()).name, "Bob");

        let mut descriptor = ServiceDescriptor::new(Factory::method("@director", "clone_named"));
        descriptor.add_argument("Alice").add_method_call("set_age", vec![Value::Int(30)]);
        let built = resolver.resolve("x", &mut descriptor).unwrap();
        assert_eq!(director(&built).name, "Alice");
        assert_eq!(director(&built).age, 30);

        let mut descriptor = ServiceDescriptor::new(Factory::static_method("Director", "missing"));
        let err = resolver.resolve("x", &mut descriptor).unwrap_err();
        assert!(matches!(err, CoreError::UnknownMethod { .. }));

        let err = resolver
            .resolve("x", &mut ServiceDescriptor::new(Factory::method(Value::Int(1), "create")))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_literal_instance_cannot_be_post_processed() {
        let fixture = fixture();
        let mut descriptor = ServiceDescriptor::new(Object::new(Director::default()));
        let instance = InstanceResolver::new(&fixture)
            .resolve("director", &mut descriptor)
            .unwrap();
        assert!(instance.as_object().is_some());

        descriptor.add_method_call("set_age", vec![Value::Int(50)]);
        let err = InstanceResolver::new(&fixture)
            .resolve("director", &mut descriptor)
            .unwrap_err();
        assert!(err.is_configuration());
    }
}

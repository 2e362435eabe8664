use std::collections::BTreeMap;

use crate::container::arguments::Arguments;
use crate::container::placeholder::{parse_argument, ArgumentToken, Segment};
use crate::container::resolver::DependencyResolver;
use crate::container::value::Value;
use crate::errors::CoreError;

/// Turns raw configured argument values into concrete values.
///
/// References and `@id` strings become resolved services, `%name%` strings
/// become parameters, and lists and maps are resolved element-wise with
/// keys and order preserved.
pub struct ParameterResolver<'r, R: DependencyResolver + ?Sized> {
    resolver: &'r R,
}

impl<'r, R: DependencyResolver + ?Sized> ParameterResolver<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Resolve one raw value
    pub fn resolve(&self, value: &Value) -> Result<Value, CoreError> {
        match value {
            Value::Reference(reference) => self.resolver.get(reference.id()),
            Value::String(raw) => self.resolve_string(raw),
            Value::List(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, item)| self.resolve(item).map(|resolved| (key.clone(), resolved)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Value::Map),
            other => Ok(other.clone()),
        }
    }

    /// Resolve every value of an argument container
    pub fn resolve_arguments(&self, arguments: &Arguments) -> Result<Arguments, CoreError> {
        arguments.try_map(|value| self.resolve(value))
    }

    fn resolve_string(&self, raw: &str) -> Result<Value, CoreError> {
        match parse_argument(raw) {
            ArgumentToken::Literal => Ok(Value::String(raw.to_string())),
            ArgumentToken::Service(id) => self.resolver.get(id),
            ArgumentToken::Parameter(name) => self.lookup(name),
            ArgumentToken::Interpolated(segments) => {
                let mut rendered = String::with_capacity(raw.len());
                for segment in segments {
                    match segment {
                        Segment::Text(text) => rendered.push_str(text),
                        Segment::Parameter(name) => {
                            let value = self.lookup(name)?;
                            let text = value.to_interpolated_string().ok_or_else(|| {
                                CoreError::configuration(format!(
                                    "Parameter [{}] is a {} and cannot be interpolated into \"{}\"",
                                    name,
                                    value.type_name(),
                                    raw
                                ))
                            })?;
                            rendered.push_str(&text);
                        }
                    }
                }
                Ok(Value::String(rendered))
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, CoreError> {
        self.resolver
            .parameter(name)
            .ok_or_else(|| CoreError::undefined_parameter(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::binding::ContextBindings;
    use crate::container::class::ClassRegistry;
    use crate::container::parameters::ParameterBag;
    use crate::container::reference::Reference;

    struct Fixture {
        parameters: ParameterBag,
        classes: ClassRegistry,
    }

    impl DependencyResolver for Fixture {
        fn get(&self, id: &str) -> Result<Value, CoreError> {
            match id {
                "director" => Ok(Value::from("the director")),
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
        let mut parameters = ParameterBag::new();
        parameters.set_parameter("foo", "James");
        parameters.set_parameter("age", 26);
        parameters.set_parameter("tags", Value::List(vec![Value::from("a")]));
        Fixture {
            parameters,
            classes: ClassRegistry::new(),
        }
    }

    #[test]
    fn test_placeholder_interpolation() {
        let fixture = fixture();
        let resolver = ParameterResolver::new(&fixture);

        assert_eq!(resolver.resolve(&Value::from("%foo% Bob")).unwrap(), Value::from("James Bob"));
        assert_eq!(resolver.resolve(&Value::from("%foo%")).unwrap(), Value::from("James"));
        assert_eq!(resolver.resolve(&Value::from("%age%")).unwrap(), Value::Int(26));
        assert_eq!(resolver.resolve(&Value::from("age %age%")).unwrap(), Value::from("age 26"));

        let err = resolver.resolve(&Value::from("%missing%")).unwrap_err();
        assert!(matches!(err, CoreError::UndefinedParameter { ref name } if name == "missing"));
    }

    #[test]
    fn test_list_parameter_cannot_be_interpolated() {
        let fixture = fixture();
        let resolver = ParameterResolver::new(&fixture);

        assert!(resolver.resolve(&Value::from("%tags%")).unwrap().as_list().is_some());
        assert!(resolver
            .resolve(&Value::from("tags: %tags%"))
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_references_and_nested_containers() {
        let fixture = fixture();
        let resolver = ParameterResolver::new(&fixture);

        let raw = Value::List(vec![
            Value::from("@director"),
            Value::from(Reference::new("director")),
            Value::Map(BTreeMap::from([("name".to_string(), Value::from("%foo%"))])),
            Value::Int(3),
        ]);
        let resolved = resolver.resolve(&raw).unwrap();
        let items = resolved.as_list().unwrap();
        assert_eq!(items[0], Value::from("the director"));
        assert_eq!(items[1], Value::from("the director"));
        assert_eq!(items[2].child("name"), Some(&Value::from("James")));
        assert_eq!(items[3], Value::Int(3));

        assert!(resolver.resolve(&Value::from("@nobody")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_argument_keys_are_preserved() {
        let fixture = fixture();
        let resolver = ParameterResolver::new(&fixture);

        let mut arguments = Arguments::named([("name", "%foo%")]);
        arguments.set(0usize, "@director");
        let resolved = resolver.resolve_arguments(&arguments).unwrap();

        assert_eq!(resolved.get_name("name"), Some(&Value::from("James")));
        assert_eq!(resolved.get_index(0), Some(&Value::from("the director")));
        assert!(!resolved.is_positional());
    }
}

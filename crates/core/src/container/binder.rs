use crate::container::arguments::Arguments;
use crate::container::binding::ContextBindings;
use crate::container::class::{BoundArguments, Parameter, Signature};
use crate::container::parameter_resolver::ParameterResolver;
use crate::container::resolver::DependencyResolver;
use crate::container::value::Value;
use crate::errors::CoreError;

/// Matches a callable's formal parameters against configured arguments,
/// autowiring typed parameters from the container when allowed.
pub struct DependencyBinder<'r, R: DependencyResolver + ?Sized> {
    resolver: &'r R,
    autowire: bool,
}

impl<'r, R: DependencyResolver + ?Sized> DependencyBinder<'r, R> {
    pub fn new(resolver: &'r R, autowire: bool) -> Self {
        Self { resolver, autowire }
    }

    /// Bind every parameter of `signature`, in declaration order.
    ///
    /// `provided` holds raw arguments; they are resolved before matching.
    /// When its first key is a position, parameters are matched by position
    /// only. An entry holding `Value::Null` still counts as provided: it is
    /// bound as is and never falls through to autowiring or the default.
    pub fn bind(
        &self,
        callable: &str,
        signature: &Signature,
        provided: &Arguments,
        context: Option<&ContextBindings>,
    ) -> Result<BoundArguments, CoreError> {
        let provided = ParameterResolver::new(self.resolver).resolve_arguments(provided)?;
        let positional_only = provided.is_positional();

        let mut names = Vec::with_capacity(signature.parameters().len());
        let mut values = Vec::with_capacity(signature.parameters().len());

        for (position, parameter) in signature.parameters().iter().enumerate() {
            let value = match provided.get_index(position) {
                Some(value) => value.clone(),
                None => {
                    let by_name = if positional_only {
                        None
                    } else {
                        provided.get_name(parameter.name())
                    };
                    match by_name {
                        Some(value) => value.clone(),
                        None => self.bind_missing(callable, parameter, context)?,
                    }
                }
            };
            names.push(parameter.name().to_string());
            values.push(value);
        }

        Ok(BoundArguments::new(callable, names, values))
    }

    /// Autowire, then default, for a parameter with no provided argument
    fn bind_missing(
        &self,
        callable: &str,
        parameter: &Parameter,
        context: Option<&ContextBindings>,
    ) -> Result<Value, CoreError> {
        if let Some(type_hint) = parameter.type_hint().filter(|_| self.autowire) {
            let target = context
                .and_then(|bindings| {
                    bindings
                        .get(type_hint)
                        .or_else(|| bindings.get(parameter.name()))
                })
                .map(String::as_str);
            if let Some(target) = target {
                tracing::trace!(
                    "Context binding for \"{}\" in {}: using \"{}\"",
                    parameter.name(),
                    callable,
                    target
                );
            }

            return match self.resolver.get(target.unwrap_or(type_hint)) {
                Ok(value) => Ok(value),
                Err(err) if err.is_not_found() => match parameter.default() {
                    Some(default) => {
                        tracing::debug!(
                            "Optional parameter \"{}\" of {} falls back to its default: {}",
                            parameter.name(),
                            callable,
                            err
                        );
                        Ok(default.clone())
                    }
                    None => Err(err),
                },
                Err(err) => Err(err),
            };
        }

        parameter
            .default()
            .cloned()
            .ok_or_else(|| CoreError::missing_parameter(parameter.name(), callable))
    }
}

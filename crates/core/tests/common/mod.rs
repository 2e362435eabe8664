//! Fixture classes shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use elif_di::container::{Class, Container, Parameter};
use elif_di::{CoreError, Object, Value};

#[derive(Debug, Default)]
pub struct Director {
    pub name: String,
    pub age: i64,
}

/// Implemented by `Actor` and `Actress`
pub trait Performer: Send + Sync {
    fn role(&self) -> &'static str;
}

#[derive(Debug, Default)]
pub struct Actor;

impl Performer for Actor {
    fn role(&self) -> &'static str {
        "actor"
    }
}

#[derive(Debug, Default)]
pub struct Actress;

impl Performer for Actress {
    fn role(&self) -> &'static str {
        "actress"
    }
}

/// Role of a resolved `ActorInterface` object
pub fn role_of(object: &Object) -> &'static str {
    if let Some(actor) = object.downcast_ref::<Actor>() {
        actor.role()
    } else if let Some(actress) = object.downcast_ref::<Actress>() {
        actress.role()
    } else {
        "unknown"
    }
}

#[derive(Debug)]
pub struct Movie {
    pub director: Arc<Director>,
    pub actor: Object,
    pub actress: Option<Object>,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct Foo {
    pub director: Option<Arc<Director>>,
}

/// Depends on a service nobody registers
#[derive(Debug)]
pub struct Reviewer {
    pub magazine: Option<Object>,
}

fn expect_director(value: Value) -> Result<Arc<Director>, CoreError> {
    value
        .downcast::<Director>()
        .ok_or_else(|| CoreError::type_mismatch("director", "Director", "another type"))
}

pub fn director_class() -> Class {
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
                })
            },
        )
        .method("set_name", vec![Parameter::new("name")], |director, args| {
            director.name = args.get(0)?;
            Ok(())
        })
        .method("set_age", vec![Parameter::new("age")], |director, args| {
            director.age = args.get(0)?;
            Ok(())
        })
        .static_method("factory", vec![], |_| Ok(Value::object(Director::default())))
        .build()
}

pub fn movie_class() -> Class {
    Class::builder::<Movie>("Movie")
        .constructor(
            vec![
                Parameter::typed("director", "Director"),
                Parameter::typed("actor", "ActorInterface"),
            ],
            |args| {
                Ok(Movie {
                    director: args.get(0)?,
                    actor: args.get(1)?,
                    actress: None,
                    name: String::new(),
                })
            },
        )
        .method("set_name", vec![Parameter::new("name")], |movie, args| {
            movie.name = args.get(0)?;
            Ok(())
        })
        .method(
            "set_actress",
            vec![Parameter::typed("actress", "ActorInterface")],
            |movie, args| {
                movie.actress = Some(args.get(0)?);
                Ok(())
            },
        )
        .build()
}

pub fn foo_class() -> Class {
    Class::builder::<Foo>("Foo")
        .default_constructible()
        .property("director", |foo, value| {
            foo.director = Some(expect_director(value)?);
            Ok(())
        })
        .factory_method(
            "create_director",
            vec![Parameter::new("name"), Parameter::new("age")],
            |_, args| {
                Ok(Value::object(Director {
                    name: args.get(0)?,
                    age: args.get(1)?,
                }))
            },
        )
        .build()
}

pub fn reviewer_class() -> Class {
    Class::builder::<Reviewer>("Reviewer")
        .constructor(
            vec![Parameter::typed("magazine", "Magazine").optional()],
            |args| {
                Ok(Reviewer {
                    magazine: args.get(0)?,
                })
            },
        )
        .build()
}

/// Container with every fixture class defined and nothing registered
pub fn container() -> Container {
    init_tracing();

    let mut container = Container::new();
    container
        .define_class(director_class())
        .define_class(movie_class())
        .define_class(foo_class())
        .define_class(reviewer_class())
        .define_class(Class::interface("ActorInterface"))
        .define_class(Class::builder::<Actor>("Actor").default_constructible().build())
        .define_class(Class::builder::<Actress>("Actress").default_constructible().build());
    container
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

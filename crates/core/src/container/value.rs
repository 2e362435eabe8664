use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::container::reference::Reference;

/// Type-erased service instance.
///
/// Objects are reference counted; two objects are equal only when they point
/// at the same instance.
#[derive(Clone)]
pub struct Object {
    instance: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Object {
    /// Wrap a freshly built value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an already shared value without copying it
    pub fn from_arc<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self {
            instance,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Get the concrete type id of the wrapped instance
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Get the concrete type name of the wrapped instance
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the wrapped instance is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Get a shared handle to the instance as a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }

    /// Borrow the instance as a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    /// Check if both objects are the same instance
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }

    /// Number of live handles to this instance
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.instance)
    }

    pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        &*self.instance
    }

    /// Mutable access, only while this handle is the sole owner
    pub(crate) fn get_mut(&mut self) -> Option<&mut (dyn Any + Send + Sync + 'static)> {
        Arc::get_mut(&mut self.instance)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.type_name).finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Dynamic value flowing through argument resolution.
///
/// Raw configuration values (literals, `%param%` strings, `@service` strings,
/// references, nested lists and maps) and resolved values (objects) share
/// this representation.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Reference(Reference),
    Object(Object),
}

impl Value {
    /// Wrap a service instance
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(Object::new(value))
    }

    /// Build a reference to another service
    pub fn reference(id: impl Into<String>) -> Self {
        Value::Reference(Reference::new(id))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Downcast an object value to a shared `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_object().and_then(Object::downcast::<T>)
    }

    /// Short name of the value's kind, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Reference(_) => "reference",
            Value::Object(object) => object.type_name(),
        }
    }

    /// Render a scalar for string interpolation. Containers and objects
    /// have no string form.
    pub fn to_interpolated_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Walk one level into a map (by key) or a list (by numeric index)
    pub fn child(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Reference(reference) => write!(f, "Reference({})", reference.id()),
            Value::Object(object) => object.fmt(f),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Reference(a), Value::Reference(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Value::Reference(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Conversion from a bound argument into the type a builder function wants.
///
/// On failure the original value is handed back so the caller can report
/// what was found.
pub trait FromValue: Sized {
    fn try_from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for String {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromValue for i64 {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(other),
        }
    }
}

impl FromValue for u32 {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => u32::try_from(i).map_err(|_| Value::Int(i)),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(other),
        }
    }
}

impl FromValue for bool {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromValue for Vec<Value> {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(other),
        }
    }
}

impl FromValue for BTreeMap<String, Value> {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(other),
        }
    }
}

impl FromValue for Object {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(other),
        }
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value.downcast::<T>() {
            Some(instance) => Ok(instance),
            None => Err(value),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn try_from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Director {
        name: String,
    }

    #[test]
    fn test_object_identity() {
        let a = Object::new(Director { name: "Bob".into() });
        let b = a.clone();
        let c = Object::new(Director { name: "Bob".into() });

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is::<Director>());
        assert_eq!(a.downcast_ref::<Director>().map(|d| d.name.as_str()), Some("Bob"));
        assert!(a.downcast::<String>().is_none());
    }

    #[test]
    fn test_unique_object_is_mutable() {
        let mut object = Object::new(Director { name: "Bob".into() });
        {
            let target = object.get_mut().expect("sole owner");
            target.downcast_mut::<Director>().expect("director").name = "James".into();
        }
        assert_eq!(object.downcast_ref::<Director>().unwrap().name, "James");

        let _shared = object.clone();
        assert!(object.get_mut().is_none());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "name": "James",
            "age": 45,
            "ratio": 1.5,
            "tags": ["a", null]
        });
        let value = Value::from(json);

        assert_eq!(value.child("name"), Some(&Value::from("James")));
        assert_eq!(value.child("age"), Some(&Value::Int(45)));
        assert_eq!(value.child("ratio"), Some(&Value::Float(1.5)));
        assert_eq!(value.child("tags").and_then(|t| t.child("1")), Some(&Value::Null));
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(String::try_from_value(Value::from("Bob")), Ok("Bob".to_string()));
        assert_eq!(i64::try_from_value(Value::Int(45)), Ok(45));
        assert_eq!(u32::try_from_value(Value::Int(-1)), Err(Value::Int(-1)));
        assert_eq!(f64::try_from_value(Value::Int(2)), Ok(2.0));
        assert_eq!(Option::<String>::try_from_value(Value::Null), Ok(None));
        assert!(i64::try_from_value(Value::from("45")).is_err());

        let director = Value::object(Director { name: "Bob".into() });
        let typed = Arc::<Director>::try_from_value(director).unwrap();
        assert_eq!(typed.name, "Bob");
    }

    #[test]
    fn test_interpolated_string() {
        assert_eq!(Value::Int(45).to_interpolated_string().as_deref(), Some("45"));
        assert_eq!(Value::Null.to_interpolated_string().as_deref(), Some(""));
        assert_eq!(Value::List(vec![]).to_interpolated_string(), None);
    }
}

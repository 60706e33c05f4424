//! Runtime value representation.
//!
//! Immediate scalars are stored inline; everything else is a reference-counted
//! heap object implementing [`PyObject`].

use crate::object::registry::global_registry;
use crate::object::type_obj::{TypeId, TypeObject};
use crate::object::{ObjectRef, PyObject};
use std::fmt;
use std::sync::Arc;

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// The `None` singleton.
    #[default]
    None,
    /// A boolean.
    Bool(bool),
    /// A machine-width integer.
    Int(i64),
    /// A double precision float.
    Float(f64),
    /// An immutable string.
    Str(Arc<str>),
    /// A heap object.
    Object(ObjectRef),
}

impl Value {
    /// The `None` value.
    #[inline]
    pub const fn none() -> Self {
        Value::None
    }

    /// Create an integer value.
    #[inline]
    pub const fn int(value: i64) -> Self {
        Value::Int(value)
    }

    /// Create a string value.
    #[inline]
    pub fn str(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }

    /// Wrap a heap object.
    #[inline]
    pub fn object<T: PyObject>(object: Arc<T>) -> Self {
        Value::Object(object)
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&Arc<str>> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the heap object as a concrete type.
    #[inline]
    pub fn downcast_ref<T: PyObject>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Take a new strong reference to the heap object as a concrete type.
    pub fn downcast_arc<T: PyObject>(&self) -> Option<Arc<T>> {
        let obj = self.as_object()?;
        Arc::clone(obj).into_any_arc().downcast::<T>().ok()
    }

    /// Type identifier of this value.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::None => TypeId::NONE,
            Value::Bool(_) => TypeId::BOOL,
            Value::Int(_) => TypeId::INT,
            Value::Float(_) => TypeId::FLOAT,
            Value::Str(_) => TypeId::STR,
            Value::Object(obj) => obj.header().type_id,
        }
    }

    /// Runtime type object of this value.
    pub fn type_object(&self) -> Arc<TypeObject> {
        match self {
            Value::Object(obj) => obj.type_object(),
            _ => global_registry().builtin(self.type_id()),
        }
    }

    /// Name of the runtime type, for error messages.
    pub fn type_name(&self) -> Arc<str> {
        self.type_object().name().clone()
    }

    /// `isinstance(self, ty)`.
    #[inline]
    pub fn is_instance(&self, ty: &TypeObject) -> bool {
        self.type_object().is_subtype(ty)
    }

    /// Identity comparison (`is`).
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }

    /// Python-style repr.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{:?}", f),
            Value::Str(s) => format!("'{}'", s),
            Value::Object(obj) => obj.repr(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(_), Value::Object(_)) => self.is(other),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::str(value)
    }
}

impl<T: PyObject> From<Arc<T>> for Value {
    fn from(object: Arc<T>) -> Self {
        Value::Object(object)
    }
}

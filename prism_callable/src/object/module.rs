//! Module objects.
//!
//! A module is a named namespace. Its dictionary doubles as the globals
//! mapping of the functions defined in it.

use crate::object::{ObjectHeader, PyObject};
use crate::object::type_obj::TypeId;
use crate::types::dict::DictObject;
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// A module object.
#[derive(Debug)]
pub struct ModuleObject {
    header: ObjectHeader,
    name: Arc<str>,
    dict: Arc<DictObject>,
}

impl ModuleObject {
    /// Create a module with an empty namespace holding `__name__`.
    pub fn new(name: &str) -> Arc<Self> {
        let name: Arc<str> = Arc::from(name);
        let dict = Arc::new(DictObject::new());
        dict.set(Arc::from("__name__"), Value::Str(Arc::clone(&name)));
        Arc::new(Self {
            header: ObjectHeader::new(TypeId::MODULE),
            name,
            dict,
        })
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Module namespace.
    #[inline]
    pub fn dict(&self) -> &Arc<DictObject> {
        &self.dict
    }

    /// Module namespace as a value, for use as function globals.
    pub fn globals(&self) -> Value {
        Value::object(Arc::clone(&self.dict))
    }

    #[inline]
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.dict.get(name)
    }

    #[inline]
    pub fn set_attr(&self, name: Arc<str>, value: Value) {
        self.dict.set(name, value);
    }
}

impl PyObject for ModuleObject {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn repr(&self) -> String {
        format!("<module '{}'>", self.name)
    }
}

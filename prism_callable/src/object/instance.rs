//! Instances of heap types.
//!
//! An instance holds a strong reference to its class and a per-instance
//! attribute dictionary. Instance attributes shadow non-data descriptors
//! (methods) of the class.

use crate::object::type_obj::TypeObject;
use crate::object::{ObjectHeader, PyObject};
use crate::types::dict::DictObject;
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// Instance of a heap type.
#[derive(Debug)]
pub struct InstanceObject {
    header: ObjectHeader,
    class: Arc<TypeObject>,
    dict: DictObject,
}

impl InstanceObject {
    /// Create an instance of `class`.
    pub fn new(class: &Arc<TypeObject>) -> Self {
        Self {
            header: ObjectHeader::new(class.id()),
            class: Arc::clone(class),
            dict: DictObject::new(),
        }
    }

    /// Allocate an instance and wrap it as a value.
    pub fn new_value(class: &Arc<TypeObject>) -> Value {
        Value::object(Arc::new(Self::new(class)))
    }

    #[inline]
    pub fn class(&self) -> &Arc<TypeObject> {
        &self.class
    }

    /// Instance attribute dictionary.
    #[inline]
    pub fn dict(&self) -> &DictObject {
        &self.dict
    }
}

impl PyObject for InstanceObject {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_object(&self) -> Arc<TypeObject> {
        Arc::clone(&self.class)
    }

    fn repr(&self) -> String {
        format!("<{} object>", self.class.name())
    }
}

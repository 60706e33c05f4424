//! Core object header and reference types.
//!
//! All heap objects share a common header carrying their `TypeId` so the
//! call layer can perform capability checks without chasing the type object.

pub mod attr;
pub mod call;
pub mod class;
pub mod instance;
pub mod module;
pub mod registry;
pub mod type_obj;

use crate::error::{CallError, CallResult};
use crate::object::registry::global_registry;
use crate::object::type_obj::{TypeId, TypeObject};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

// =============================================================================
// Object Header
// =============================================================================

/// Object header.
///
/// All heap-allocated objects begin with this header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Type identifier for fast dispatch.
    pub type_id: TypeId,
}

impl ObjectHeader {
    /// Create a new object header.
    #[inline]
    pub const fn new(type_id: TypeId) -> Self {
        Self { type_id }
    }
}

// =============================================================================
// Object Trait
// =============================================================================

/// Shared reference to a heap object.
pub type ObjectRef = Arc<dyn PyObject>;

/// Trait for all heap objects.
///
/// Provides access to the object header plus the few generic operations the
/// call layer needs: downcasting, the runtime type and a fallback call path
/// for objects that are not base functions.
pub trait PyObject: Any + Send + Sync {
    /// Get the object header.
    fn header(&self) -> &ObjectHeader;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Owned upcast, for recovering an `Arc` of the concrete type.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Runtime type of this object.
    ///
    /// Builtin objects resolve through the registry; heap-type instances
    /// override this to return their class.
    fn type_object(&self) -> Arc<TypeObject> {
        global_registry().builtin(self.header().type_id)
    }

    /// Python-style repr.
    fn repr(&self) -> String {
        format!("<{} object>", self.type_object().name())
    }

    /// Invoke the object.
    ///
    /// Base functions never reach this: `call_object` routes them through the
    /// default dispatch. Other callables override it.
    fn call(&self, args: &[Value], kwargs: &[(Arc<str>, Value)]) -> CallResult<Value> {
        let _ = (args, kwargs);
        Err(CallError::NotCallable {
            type_name: self.type_object().name().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tuple::TupleObject;

    #[test]
    fn test_object_header() {
        let header = ObjectHeader::new(TypeId::TUPLE);
        assert_eq!(header.type_id, TypeId::TUPLE);
        assert_eq!(std::mem::size_of::<ObjectHeader>(), 4);
    }

    #[test]
    fn test_default_call_is_not_callable() {
        let tuple = TupleObject::empty();
        let err = tuple.call(&[], &[]).unwrap_err();
        assert_eq!(err.to_string(), "'tuple' object is not callable");
    }
}

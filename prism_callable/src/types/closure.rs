//! Native closures: callables that do not share the base function layout.
//!
//! A closure is invoked through [`PyObject::call`] rather than the default
//! dispatch, so binding one to a receiver takes the generic wrapper path.

use crate::error::CallResult;
use crate::object::type_obj::TypeId;
use crate::object::{ObjectHeader, PyObject};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// Closure signature: positional arguments and `(name, value)` keywords.
pub type ClosureFn = dyn Fn(&[Value], &[(Arc<str>, Value)]) -> CallResult<Value> + Send + Sync;

/// Arbitrary Rust closure exposed as a callable object.
pub struct NativeClosure {
    header: ObjectHeader,
    name: Arc<str>,
    func: Box<ClosureFn>,
}

impl NativeClosure {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value], &[(Arc<str>, Value)]) -> CallResult<Value> + Send + Sync + 'static,
    {
        Self {
            header: ObjectHeader::new(TypeId::NATIVE_CALLABLE),
            name: Arc::from(name),
            func: Box::new(func),
        }
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }
}

impl PyObject for NativeClosure {
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
        format!("<native closure {}>", self.name)
    }

    fn call(&self, args: &[Value], kwargs: &[(Arc<str>, Value)]) -> CallResult<Value> {
        (self.func)(args, kwargs)
    }
}

impl std::fmt::Debug for NativeClosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeClosure").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::function::base::is_base_function;

    #[test]
    fn test_closure_call() {
        let offset = 10;
        let closure = NativeClosure::new("add_offset", move |args, _| {
            Ok(Value::int(args.iter().filter_map(Value::as_int).sum::<i64>() + offset))
        });
        assert_eq!(closure.call(&[Value::int(1), Value::int(2)], &[]).unwrap(), Value::int(13));
        assert_eq!(closure.repr(), "<native closure add_offset>");
        assert!(!is_base_function(&Value::object(Arc::new(closure))));
    }
}

//! Call protocol entry points.
//!
//! `call_object(f, args, kwargs)` is the single way the runtime invokes a
//! value. Types carrying [`TypeFlags::BASE_FUNCTION`] go through the default
//! dispatch; every other object goes through its own [`PyObject::call`].
//!
//! ## Performance Design
//!
//! - Capability check is one flag test on the type object
//! - `call_method` skips the bound wrapper allocation for plain methods

use crate::error::{CallError, CallResult};
use crate::object::attr::get_attribute;
use crate::object::instance::InstanceObject;
use crate::object::type_obj::TypeFlags;
use crate::types::function::base::as_base_function;
use crate::types::function::dispatch::dispatch;
use crate::types::function::method_def::MethodFlags;
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

// =============================================================================
// Call Context
// =============================================================================

/// Arguments of one call.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Positional arguments.
    pub args: &'a [Value],

    /// Keyword arguments, in call order.
    pub kwargs: &'a [(Arc<str>, Value)],
}

impl<'a> CallContext<'a> {
    /// Create a call context with positional arguments only.
    pub fn new(args: &'a [Value]) -> Self {
        Self { args, kwargs: &[] }
    }

    /// Create with keyword arguments.
    pub fn with_kwargs(args: &'a [Value], kwargs: &'a [(Arc<str>, Value)]) -> Self {
        Self { args, kwargs }
    }

    /// Check if there are any arguments.
    #[inline]
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Check if there are any kwargs.
    #[inline]
    pub fn has_kwargs(&self) -> bool {
        !self.kwargs.is_empty()
    }

    /// Total argument count.
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len() + self.kwargs.len()
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Invoke `callable` with positional and keyword arguments.
pub fn call_object(
    callable: &Value,
    args: &[Value],
    kwargs: &[(Arc<str>, Value)],
) -> CallResult<Value> {
    if let Some(func) = as_base_function(callable) {
        return dispatch(callable, func, CallContext::with_kwargs(args, kwargs));
    }
    match callable {
        Value::Object(obj) => obj.call(args, kwargs),
        _ => Err(CallError::NotCallable {
            type_name: callable.type_name(),
        }),
    }
}

/// Invoke `callable` with positional arguments only.
#[inline]
pub fn call_function(callable: &Value, args: &[Value]) -> CallResult<Value> {
    call_object(callable, args, &[])
}

/// `receiver.name(*args, **kwargs)`.
///
/// When `name` resolves on the type to an unbound method that would bind
/// to `receiver`, the method is called with `receiver` prepended instead of
/// allocating a bound wrapper. Native `PASS_FUNCTION` entries always go
/// through the wrapper.
pub fn call_method(
    receiver: &Value,
    name: &str,
    args: &[Value],
    kwargs: &[(Arc<str>, Value)],
) -> CallResult<Value> {
    if let Some(method) = unbound_method(receiver, name) {
        let mut full: SmallVec<[Value; 8]> = SmallVec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend(args.iter().cloned());
        return call_object(&method, &full, kwargs);
    }
    let attr = get_attribute(receiver, name)?;
    call_object(&attr, args, kwargs)
}

/// Type-level method that instance access would bind to `receiver`.
fn unbound_method(receiver: &Value, name: &str) -> Option<Value> {
    if receiver
        .downcast_ref::<InstanceObject>()
        .is_some_and(|inst| inst.dict().contains(name))
    {
        return None;
    }
    let attr = receiver.type_object().lookup(name)?;
    if !attr.type_object().has_flag(TypeFlags::METHOD_DESCRIPTOR) {
        return None;
    }
    let func = as_base_function(&attr)?;
    let flags = func.flags();
    let binds_instance = !func.is_bound() && !flags.intersects(MethodFlags::STATIC | MethodFlags::CLASS);
    // Native entries that lead with the callable must be handed the wrapper.
    let leads_with_wrapper = flags.contains(MethodFlags::PASS_FUNCTION) && !flags.contains(MethodFlags::PYTHON);
    (binds_instance && !leads_with_wrapper).then_some(attr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::type_obj::TypeObject;
    use crate::thread_state::{call_stats, reset_call_stats};
    use crate::types::closure::NativeClosure;
    use crate::types::function::materialize::add_methods_to_type;
    use crate::types::function::method_def::{MethodDef, NativeEntry};
    use crate::types::tuple::TupleObject;

    fn count(lead: &Value, args: &[Value]) -> CallResult<Value> {
        let _ = lead;
        Ok(Value::int(args.len() as i64))
    }

    static TABLE: [MethodDef; 1] = [MethodDef::new(
        "count",
        NativeEntry::Fast(count),
        MethodFlags::FASTCALL,
    )];

    #[test]
    fn test_call_context() {
        let args = [Value::int(1)];
        let kwargs: [(Arc<str>, Value); 1] = [(Arc::from("k"), Value::int(2))];
        let ctx = CallContext::with_kwargs(&args, &kwargs);
        assert!(ctx.has_args());
        assert!(ctx.has_kwargs());
        assert_eq!(ctx.arg_count(), 2);
        assert!(!CallContext::new(&[]).has_kwargs());
    }

    #[test]
    fn test_not_callable() {
        let err = call_function(&Value::int(1), &[]).unwrap_err();
        assert_eq!(err.to_string(), "'int' object is not callable");
        let tuple = Value::object(Arc::new(TupleObject::empty()));
        assert!(call_function(&tuple, &[]).is_err());
    }

    #[test]
    fn test_closure_fallback() {
        let closure = Value::object(Arc::new(NativeClosure::new("len", |args, _| {
            Ok(Value::int(args.len() as i64))
        })));
        assert_eq!(call_function(&closure, &[Value::none()]).unwrap(), Value::int(1));
    }

    #[test]
    fn test_call_method() {
        let ty = TypeObject::new_heap("Counter", &[]).unwrap();
        add_methods_to_type(&ty, &TABLE).unwrap();
        let inst = crate::object::instance::InstanceObject::new_value(&ty);

        reset_call_stats();
        let result = call_method(&inst, "count", &[Value::int(1), Value::int(2)], &[]).unwrap();
        assert_eq!(result, Value::int(2));
        assert_eq!(call_stats().fast_calls, 1);

        let err = call_method(&inst, "missing", &[], &[]).unwrap_err();
        assert!(matches!(err, CallError::NoAttribute { .. }));
    }
}

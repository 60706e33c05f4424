//! Bound-call wrappers.
//!
//! A wrapper pairs a callable with a receiver. Two representations exist and
//! are invocation-equivalent:
//!
//! - **Generic**: the wrapped object is any callable (or a base function that
//!   is already bound). The wrapper dispatches through the shared
//!   [`GENERIC_METHOD_DEF`], which re-invokes the wrapped object with the
//!   receiver prepended.
//! - **Direct**: the wrapped object is an unbound base function. The wrapper
//!   reuses its dispatch entry and owner class, and becomes the receiver
//!   holder. The wrapped reference serves `__func__` and entries that lead
//!   with the callable.

use crate::error::{CallError, CallResult};
use crate::object::call::call_object;
use crate::types::function::base::{FunctionKind, FunctionObject, as_base_function};
use crate::types::function::dispatch::check_self_type;
use crate::types::function::method_def::{ArgsView, MethodDef, MethodFlags, MethodRef, NativeEntry};
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Shared entry of generic wrappers.
///
/// The dispatcher hands it the wrapper itself as the leading argument; the
/// wrapped callable is re-invoked with the receiver prepended.
pub static GENERIC_METHOD_DEF: MethodDef = MethodDef::new(
    "method",
    NativeEntry::FastKeywords(call_wrapped),
    MethodFlags::FASTCALL
        .union(MethodFlags::KEYWORDS)
        .union(MethodFlags::PASS_FUNCTION),
);

fn call_wrapped(lead: &Value, view: ArgsView<'_>) -> CallResult<Value> {
    let Some((func, receiver)) = lead
        .downcast_ref::<FunctionObject>()
        .and_then(|wrapper| wrapper.wrapped().zip(wrapper.receiver()))
    else {
        return Err(CallError::InvalidMethodDef {
            name: Arc::from(GENERIC_METHOD_DEF.name()),
            reason: "called without a bound method",
        });
    };

    let positional = view.positional();
    let mut args: SmallVec<[Value; 8]> = SmallVec::with_capacity(positional.len() + 1);
    args.push(receiver.clone());
    args.extend(positional.iter().cloned());
    let kwargs: SmallVec<[(Arc<str>, Value); 4]> = view
        .keywords()
        .map(|(name, value)| (Arc::clone(name), value.clone()))
        .collect();
    call_object(func, &args, &kwargs)
}

/// Bind `receiver` to `func`.
///
/// A base function declared on an owner class only accepts a receiver that
/// conforms to that class.
pub fn method_new(func: Value, receiver: Value) -> CallResult<Value> {
    let Some(base) = as_base_function(&func) else {
        return Ok(generic(func, receiver, None));
    };

    if let Some(owner) = base.objclass() {
        check_self_type(base.method_def(), owner, &receiver)?;
    }

    if base.is_bound() {
        let module = base.module().cloned();
        return Ok(generic(func, receiver, module));
    }

    let wrapper = FunctionObject::new(
        base.method_ref().clone(),
        Some(receiver),
        base.module().cloned(),
        base.objclass().cloned(),
        FunctionKind::Method { func: func.clone() },
    );
    Ok(Value::object(Arc::new(wrapper)))
}

fn generic(func: Value, receiver: Value, module: Option<Value>) -> Value {
    Value::object(Arc::new(FunctionObject::new(
        MethodRef::Static(&GENERIC_METHOD_DEF),
        Some(receiver),
        module,
        None,
        FunctionKind::Method { func },
    )))
}

/// `a == b` for bound wrappers: same wrapped callable and same receiver.
pub fn method_eq(a: &FunctionObject, b: &FunctionObject) -> bool {
    match (a.wrapped(), b.wrapped(), a.receiver(), b.receiver()) {
        (Some(fa), Some(fb), Some(ra), Some(rb)) => fa.is(fb) && ra.is(rb),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PyObject;
    use crate::object::instance::InstanceObject;
    use crate::object::type_obj::TypeObject;
    use crate::types::closure::NativeClosure;
    use crate::types::function::base::is_method;
    use crate::types::function::native::cmethod_new;
    use crate::types::tuple::TupleObject;

    fn first_and_count(lead: &Value, args: &[Value]) -> CallResult<Value> {
        let _ = lead;
        Ok(Value::int(args.len() as i64))
    }

    fn lead_only(lead: &Value, args: &[Value]) -> CallResult<Value> {
        let _ = args;
        Ok(lead.clone())
    }

    /// Lead, the receiver it carries, then the positional arguments.
    fn lead_receiver_args(lead: &Value, args: &[Value]) -> CallResult<Value> {
        let receiver = lead
            .downcast_ref::<FunctionObject>()
            .and_then(FunctionObject::receiver)
            .cloned()
            .unwrap_or_else(Value::none);
        let mut items = vec![lead.clone(), receiver];
        items.extend_from_slice(args);
        Ok(Value::object(Arc::new(TupleObject::from_vec(items))))
    }

    static COUNT: MethodDef = MethodDef::new("count", NativeEntry::Fast(first_and_count), MethodFlags::FASTCALL);
    static RAW: MethodDef = MethodDef::new(
        "raw",
        NativeEntry::Fast(lead_receiver_args),
        MethodFlags::FASTCALL.union(MethodFlags::PASS_FUNCTION),
    );
    static LEAD: MethodDef = MethodDef::new("lead", NativeEntry::Fast(lead_only), MethodFlags::FASTCALL);

    #[test]
    fn test_direct_wrapper_reuses_entry() {
        let ty = TypeObject::new_heap("Box", &[]).unwrap();
        let f = cmethod_new(&LEAD, None, None, Some(Arc::clone(&ty))).unwrap();
        let inst = InstanceObject::new_value(&ty);

        let m = method_new(f.clone(), inst.clone()).unwrap();
        assert!(is_method(&m));
        let wrapper = m.downcast_ref::<FunctionObject>().unwrap();
        let inner = f.downcast_ref::<FunctionObject>().unwrap();
        assert_eq!(wrapper.method_def_ptr(), inner.method_def_ptr());
        assert!(wrapper.wrapped().unwrap().is(&f));
        assert!(Arc::ptr_eq(wrapper.objclass().unwrap(), &ty));
        assert!(call_object(&m, &[Value::int(1)], &[]).unwrap().is(&inst));
    }

    #[test]
    fn test_generic_wrapper_prepends_receiver() {
        let closure = Value::object(Arc::new(NativeClosure::new("collect", |args, kwargs| {
            Ok(Value::int((args.len() * 10 + kwargs.len()) as i64))
        })));
        let m = method_new(closure, Value::int(0)).unwrap();
        let wrapper = m.downcast_ref::<FunctionObject>().unwrap();
        assert_eq!(wrapper.method_def_ptr(), &GENERIC_METHOD_DEF as *const MethodDef);

        let kwargs: [(Arc<str>, Value); 1] = [(Arc::from("k"), Value::int(1))];
        let result = call_object(&m, &[Value::int(1), Value::int(2)], &kwargs).unwrap();
        assert_eq!(result, Value::int(31));
    }

    #[test]
    fn test_wrapping_bound_function_is_generic() {
        let f = crate::types::function::native::cfunction_new(&COUNT, Some(Value::int(1)), None);
        let m = method_new(f, Value::int(2)).unwrap();
        let wrapper = m.downcast_ref::<FunctionObject>().unwrap();
        assert_eq!(wrapper.method_def_ptr(), &GENERIC_METHOD_DEF as *const MethodDef);
        // Inner bound call sees the extra receiver as a positional argument.
        assert_eq!(call_object(&m, &[Value::int(5)], &[]).unwrap(), Value::int(2));
    }

    #[test]
    fn test_direct_wrapper_passes_itself() {
        let ty = TypeObject::new_heap("Raw", &[]).unwrap();
        let f = cmethod_new(&RAW, None, None, Some(Arc::clone(&ty))).unwrap();
        let inst = InstanceObject::new_value(&ty);
        let m = method_new(f, inst.clone()).unwrap();

        let result = call_object(&m, &[Value::int(1)], &[]).unwrap();
        let items = result.downcast_ref::<TupleObject>().unwrap().as_slice().to_vec();
        assert_eq!(items.len(), 3);
        assert!(items[0].is(&m));
        assert!(items[1].is(&inst));
        assert_eq!(items[2], Value::int(1));
    }

    #[test]
    fn test_generic_wrapper_without_binding_rejected() {
        // The shared entry only makes sense behind a wrapper.
        let err = call_wrapped(&Value::int(1), ArgsView::new(&[], &[])).unwrap_err();
        assert!(matches!(err, CallError::InvalidMethodDef { .. }));
    }

    #[test]
    fn test_receiver_checked_before_invocation() {
        let ty = TypeObject::new_heap("Owner", &[]).unwrap();
        let f = cmethod_new(&COUNT, None, None, Some(ty)).unwrap();
        let err = method_new(f, Value::int(7)).unwrap_err();
        assert!(matches!(err, CallError::WrongSelfType { .. }));
    }

    #[test]
    fn test_method_eq_and_repr() {
        let ty = TypeObject::new_heap("Eq", &[]).unwrap();
        let f = cmethod_new(&COUNT, None, None, Some(Arc::clone(&ty))).unwrap();
        let inst = InstanceObject::new_value(&ty);
        let other = InstanceObject::new_value(&ty);

        let a = method_new(f.clone(), inst.clone()).unwrap();
        let b = method_new(f.clone(), inst).unwrap();
        let c = method_new(f, other).unwrap();
        let fa = a.downcast_ref::<FunctionObject>().unwrap();
        let fb = b.downcast_ref::<FunctionObject>().unwrap();
        let fc = c.downcast_ref::<FunctionObject>().unwrap();
        assert!(method_eq(fa, fb));
        assert!(!method_eq(fa, fc));
        assert!(fa.repr().starts_with("<bound method Eq.count of <Eq object"));
    }
}

//! Descriptor binding: what attribute access on an owner returns.

use crate::error::CallResult;
use crate::object::type_obj::TypeObject;
use crate::types::function::base::as_base_function;
use crate::types::function::method::method_new;
use crate::types::function::method_def::MethodFlags;
use crate::value::Value;
use std::sync::Arc;

/// Bind `callable`, found on `owner`, for access through `instance`.
///
/// `instance` is `None` for class-level access. Objects that are not base
/// functions are returned unchanged. `STATIC` only suppresses binding for
/// entries with no defining module; a static module function binds like a
/// plain function.
pub fn descr_get(
    callable: &Value,
    instance: Option<&Value>,
    owner: Option<&Arc<TypeObject>>,
) -> CallResult<Value> {
    let Some(func) = as_base_function(callable) else {
        return Ok(callable.clone());
    };
    if func.is_bound() {
        return Ok(callable.clone());
    }

    let flags = func.flags();
    if flags.contains(MethodFlags::STATIC) && func.module().is_none() {
        return Ok(callable.clone());
    }
    if flags.contains(MethodFlags::CLASS) {
        let ty = match (owner, instance) {
            (Some(owner), _) => Arc::clone(owner),
            (None, Some(instance)) => instance.type_object(),
            (None, None) => return Ok(callable.clone()),
        };
        return method_new(callable.clone(), Value::object(ty));
    }

    match instance {
        Some(instance) => method_new(callable.clone(), instance.clone()),
        None => Ok(callable.clone()),
    }
}

//! Generic attribute lookup.
//!
//! Resolution order for instances: instance dict, then the type's MRO. A
//! callable found on the type goes through descriptor binding. Module
//! attributes are returned as stored and never re-bound.

use crate::error::{CallError, CallResult};
use crate::object::instance::InstanceObject;
use crate::object::module::ModuleObject;
use crate::object::type_obj::{TypeFlags, TypeObject};
use crate::types::function::attrs::{get_function_attr, set_function_attr};
use crate::types::function::base::as_base_function;
use crate::types::function::descr::descr_get;
use crate::value::Value;
use std::sync::Arc;

fn no_attribute(obj: &Value, name: &str) -> CallError {
    CallError::NoAttribute {
        type_name: obj.type_name(),
        attr: Arc::from(name),
    }
}

/// Bind `attr` if its type participates in descriptor binding.
fn bind(attr: Value, instance: Option<&Value>, owner: &Arc<TypeObject>) -> CallResult<Value> {
    if attr.type_object().has_flag(TypeFlags::METHOD_DESCRIPTOR) {
        descr_get(&attr, instance, Some(owner))
    } else {
        Ok(attr)
    }
}

/// `getattr(obj, name)`.
pub fn get_attribute(obj: &Value, name: &str) -> CallResult<Value> {
    if let Some(func) = as_base_function(obj) {
        return get_function_attr(func, name);
    }
    if let Some(module) = obj.downcast_ref::<ModuleObject>() {
        return module.get_attr(name).ok_or_else(|| no_attribute(obj, name));
    }
    if let Some(owner) = obj.downcast_arc::<TypeObject>() {
        let attr = owner.lookup(name).ok_or_else(|| no_attribute(obj, name))?;
        return bind(attr, None, &owner);
    }
    if let Some(value) = obj
        .downcast_ref::<InstanceObject>()
        .and_then(|inst| inst.dict().get(name))
    {
        return Ok(value);
    }

    let ty = obj.type_object();
    let attr = ty.lookup(name).ok_or_else(|| no_attribute(obj, name))?;
    bind(attr, Some(obj), &ty)
}

/// `setattr(obj, name, value)`.
pub fn set_attribute(obj: &Value, name: &str, value: Value) -> CallResult<()> {
    if let Some(func) = as_base_function(obj) {
        return set_function_attr(func, name, value);
    }
    if let Some(module) = obj.downcast_ref::<ModuleObject>() {
        module.set_attr(Arc::from(name), value);
        return Ok(());
    }
    if let Some(inst) = obj.downcast_ref::<InstanceObject>() {
        inst.dict().set(Arc::from(name), value);
        return Ok(());
    }
    if let Some(ty) = obj.downcast_ref::<TypeObject>() {
        if !ty.has_flag(TypeFlags::HEAPTYPE) {
            return Err(CallError::type_error(format!(
                "cannot set '{}' attribute of immutable type '{}'",
                name,
                ty.name()
            )));
        }
        ty.dict().set(Arc::from(name), value);
        return Ok(());
    }
    Err(no_attribute(obj, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::call::call_object;
    use crate::object::registry::global_registry;
    use crate::object::type_obj::TypeId;
    use crate::types::function::base::is_method;
    use crate::types::function::materialize::{add_methods_to_module, add_methods_to_type};
    use crate::types::function::method_def::{MethodDef, MethodFlags, NativeEntry};

    fn lead(lead: &Value) -> CallResult<Value> {
        Ok(lead.clone())
    }

    static METHODS: [MethodDef; 1] =
        [MethodDef::new("me", NativeEntry::NoArgs(lead), MethodFlags::NOARGS)];

    #[test]
    fn test_instance_lookup_binds() {
        let ty = TypeObject::new_heap("Obj", &[]).unwrap();
        add_methods_to_type(&ty, &METHODS).unwrap();
        let inst = InstanceObject::new_value(&ty);

        let bound = get_attribute(&inst, "me").unwrap();
        assert!(is_method(&bound));
        assert!(call_object(&bound, &[], &[]).unwrap().is(&inst));

        // Class-level access returns the callable itself.
        let ty_value = Value::object(Arc::clone(&ty));
        let unbound = get_attribute(&ty_value, "me").unwrap();
        assert!(unbound.is(&ty.dict().get("me").unwrap()));
    }

    #[test]
    fn test_instance_dict_shadows_method() {
        let ty = TypeObject::new_heap("Shadow", &[]).unwrap();
        add_methods_to_type(&ty, &METHODS).unwrap();
        let inst = InstanceObject::new_value(&ty);
        set_attribute(&inst, "me", Value::int(3)).unwrap();
        assert_eq!(get_attribute(&inst, "me").unwrap(), Value::int(3));
    }

    #[test]
    fn test_module_attribute_not_rebound() {
        let module = Value::object(crate::object::module::ModuleObject::new("mm"));
        add_methods_to_module(&module, &METHODS).unwrap();
        let first = get_attribute(&module, "me").unwrap();
        let second = get_attribute(&module, "me").unwrap();
        assert!(first.is(&second));
        assert!(!is_method(&first));
        assert!(call_object(&first, &[], &[]).unwrap().is(&module));
    }

    #[test]
    fn test_missing_and_immutable() {
        let err = get_attribute(&Value::int(1), "nope").unwrap_err();
        assert_eq!(err.to_string(), "'int' object has no attribute 'nope'");

        let int_type = Value::object(global_registry().builtin(TypeId::INT));
        let err = set_attribute(&int_type, "x", Value::none()).unwrap_err();
        assert_eq!(err.to_string(), "cannot set 'x' attribute of immutable type 'int'");
    }
}

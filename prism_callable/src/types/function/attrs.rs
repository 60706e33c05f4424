//! Attribute access on callables (`__name__`, `__doc__`, `__self__`, ...).

use crate::code::CodeObject;
use crate::error::{CallError, CallResult};
use crate::object::PyObject;
use crate::object::attr::get_attribute;
use crate::types::dict::DictObject;
use crate::types::function::base::{FunctionKind, FunctionObject};
use crate::types::function::defined::FunctionMeta;
use crate::value::Value;
use std::sync::Arc;

/// Attributes that can never be assigned.
const READ_ONLY: &[&str] = &["__self__", "__func__", "__objclass__", "__globals__", "__closure__"];

/// Attributes only host-language functions carry.
const FUNCTION_ONLY: &[&str] = &[
    "__code__",
    "__defaults__",
    "__kwdefaults__",
    "__annotations__",
    "__globals__",
    "__closure__",
];

fn no_attribute(func: &FunctionObject, name: &str) -> CallError {
    CallError::NoAttribute {
        type_name: func.type_object().name().clone(),
        attr: Arc::from(name),
    }
}

fn optional<T: PyObject>(value: Option<Arc<T>>) -> Value {
    value.map_or(Value::None, Value::object)
}

/// Read attribute `name` of `func`.
pub fn get_function_attr(func: &FunctionObject, name: &str) -> CallResult<Value> {
    if let FunctionKind::Method { func: wrapped } = func.kind() {
        return match name {
            "__self__" => Ok(func.receiver().cloned().unwrap_or_default()),
            "__func__" => Ok(wrapped.clone()),
            "__objclass__" => func
                .objclass()
                .map(|ty| Value::object(Arc::clone(ty)))
                .ok_or_else(|| no_attribute(func, name)),
            _ => get_attribute(wrapped, name),
        };
    }

    match name {
        "__name__" => return Ok(Value::Str(func.name())),
        "__qualname__" => return Ok(Value::Str(func.qualname())),
        "__self__" if !matches!(func.kind(), FunctionKind::Defined(_)) => {
            return Ok(func.receiver().cloned().unwrap_or_default());
        }
        "__objclass__" => {
            return func
                .objclass()
                .map(|ty| Value::object(Arc::clone(ty)))
                .ok_or_else(|| no_attribute(func, name));
        }
        _ => {}
    }

    let Some(meta) = func.meta() else {
        return match name {
            "__doc__" => Ok(func.method_def().doc().map_or(Value::None, Value::str)),
            "__module__" => Ok(func.module().cloned().unwrap_or_default()),
            _ => Err(no_attribute(func, name)),
        };
    };

    match name {
        "__doc__" => return Ok(meta.doc()),
        "__module__" => {
            return Ok(meta
                .module()
                .or_else(|| func.module().cloned())
                .unwrap_or_default());
        }
        "__dict__" => return Ok(Value::object(meta.dict())),
        _ => {}
    }

    if matches!(func.kind(), FunctionKind::Defined(_)) {
        match name {
            "__code__" => return Ok(optional(meta.code())),
            "__defaults__" => return Ok(optional(meta.defaults())),
            "__kwdefaults__" => return Ok(optional(meta.kwdefaults())),
            "__annotations__" => return Ok(Value::object(meta.annotations())),
            "__globals__" => return Ok(meta.globals().clone()),
            "__closure__" => return Ok(optional(meta.closure().cloned())),
            _ => {}
        }
    }

    meta.dict_if_present()
        .and_then(|dict| dict.get(name))
        .ok_or_else(|| no_attribute(func, name))
}

/// Assign attribute `name` of `func`.
pub fn set_function_attr(func: &FunctionObject, name: &str, value: Value) -> CallResult<()> {
    if READ_ONLY.contains(&name) {
        return Err(CallError::ReadOnlyAttribute {
            attr: Arc::from(name),
        });
    }
    let Some(meta) = func.meta() else {
        return Err(match name {
            "__name__" | "__qualname__" | "__doc__" | "__module__" => CallError::ReadOnlyAttribute {
                attr: Arc::from(name),
            },
            _ => no_attribute(func, name),
        });
    };

    match name {
        "__name__" => meta.set_name(expect_str(value, name)?),
        "__qualname__" => meta.set_qualname(expect_str(value, name)?),
        "__doc__" => meta.set_doc(value),
        "__module__" => meta.set_module(value),
        "__dict__" => {
            let dict = value
                .downcast_arc::<DictObject>()
                .ok_or_else(|| CallError::type_error("__dict__ must be set to a dictionary"))?;
            meta.set_dict(dict);
        }
        _ if FUNCTION_ONLY.contains(&name) => {
            if !matches!(func.kind(), FunctionKind::Defined(_)) {
                return Err(CallError::ReadOnlyAttribute {
                    attr: Arc::from(name),
                });
            }
            set_function_only(meta, name, value)?;
        }
        _ => meta.dict().set(Arc::from(name), value),
    }
    Ok(())
}

fn set_function_only(meta: &FunctionMeta, name: &str, value: Value) -> CallResult<()> {
    match name {
        "__code__" => {
            let code = value
                .downcast_arc::<CodeObject>()
                .ok_or_else(|| CallError::type_error("__code__ must be set to a code object"))?;
            let cells = meta.closure().map_or(0, |c| c.len());
            if code.freevars.len() != cells {
                return Err(CallError::raised(
                    "ValueError",
                    format!(
                        "{}() requires a code object with {} free vars, not {}",
                        meta.name(),
                        cells,
                        code.freevars.len()
                    ),
                ));
            }
            meta.set_code(code);
        }
        "__defaults__" => meta.set_defaults(optional_arc(value, "__defaults__ must be set to a tuple object")?),
        "__kwdefaults__" => {
            meta.set_kwdefaults(optional_arc(value, "__kwdefaults__ must be set to a dict object")?)
        }
        "__annotations__" => {
            meta.set_annotations(optional_arc(value, "__annotations__ must be set to a dict object")?)
        }
        _ => {
            return Err(CallError::ReadOnlyAttribute {
                attr: Arc::from(name),
            });
        }
    }
    Ok(())
}

fn expect_str(value: Value, name: &str) -> CallResult<Arc<str>> {
    match value {
        Value::Str(s) => Ok(s),
        _ => Err(CallError::type_error(format!(
            "{} must be set to a string object",
            name
        ))),
    }
}

/// `None` clears; otherwise the value must be a `T`.
fn optional_arc<T: PyObject>(value: Value, message: &str) -> CallResult<Option<Arc<T>>> {
    if value.is_none() {
        return Ok(None);
    }
    value
        .downcast_arc::<T>()
        .map(Some)
        .ok_or_else(|| CallError::type_error(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CodeBody, Frame};
    use crate::object::module::ModuleObject;
    use crate::object::type_obj::TypeObject;
    use crate::types::function::defined::function_new;
    use crate::types::function::method::method_new;
    use crate::types::function::method_def::{MethodDef, MethodFlags, NativeEntry};
    use crate::types::function::native::{builtin_function_new, cmethod_new};
    use crate::types::tuple::TupleObject;

    fn lead(lead: &Value) -> CallResult<Value> {
        Ok(lead.clone())
    }

    static LEAD: MethodDef =
        MethodDef::with_doc("lead", NativeEntry::NoArgs(lead), MethodFlags::NOARGS, "Lead.");

    fn body() -> CodeBody {
        Arc::new(|_frame: &Frame| Ok(Value::none()))
    }

    fn defined() -> Value {
        let code = Arc::new(CodeObject::new("f", &["x"], body()).with_doc("Doc."));
        function_new(code, ModuleObject::new("m").globals()).unwrap()
    }

    #[test]
    fn test_defined_function_attrs() {
        let f = defined();
        let func = f.downcast_ref::<FunctionObject>().unwrap();
        assert_eq!(get_function_attr(func, "__name__").unwrap(), Value::str("f"));
        assert_eq!(get_function_attr(func, "__doc__").unwrap(), Value::str("Doc."));
        assert_eq!(get_function_attr(func, "__module__").unwrap(), Value::str("m"));
        assert!(get_function_attr(func, "__defaults__").unwrap().is_none());
        assert!(get_function_attr(func, "__closure__").unwrap().is_none());
        assert!(get_function_attr(func, "__code__").unwrap().downcast_ref::<CodeObject>().is_some());
        assert!(matches!(
            get_function_attr(func, "__self__"),
            Err(CallError::NoAttribute { .. })
        ));
    }

    #[test]
    fn test_set_validates_types() {
        let f = defined();
        let func = f.downcast_ref::<FunctionObject>().unwrap();

        set_function_attr(func, "__name__", Value::str("g")).unwrap();
        assert_eq!(&*func.name(), "g");
        let err = set_function_attr(func, "__name__", Value::int(1)).unwrap_err();
        assert_eq!(err.to_string(), "__name__ must be set to a string object");

        let defaults = Value::object(Arc::new(TupleObject::from_vec(vec![Value::int(1)])));
        set_function_attr(func, "__defaults__", defaults).unwrap();
        assert_eq!(func.meta().unwrap().defaults().map(|d| d.len()), Some(1));
        set_function_attr(func, "__defaults__", Value::None).unwrap();
        assert!(func.meta().unwrap().defaults().is_none());

        let err = set_function_attr(func, "__defaults__", Value::int(1)).unwrap_err();
        assert_eq!(err.to_string(), "__defaults__ must be set to a tuple object");

        let err = set_function_attr(func, "__globals__", Value::None).unwrap_err();
        assert!(matches!(err, CallError::ReadOnlyAttribute { .. }));
    }

    #[test]
    fn test_arbitrary_attributes() {
        let f = defined();
        let func = f.downcast_ref::<FunctionObject>().unwrap();
        assert!(get_function_attr(func, "tag").is_err());
        set_function_attr(func, "tag", Value::int(5)).unwrap();
        assert_eq!(get_function_attr(func, "tag").unwrap(), Value::int(5));

        let dict = get_function_attr(func, "__dict__").unwrap();
        assert_eq!(dict.downcast_ref::<DictObject>().unwrap().get("tag"), Some(Value::int(5)));
    }

    #[test]
    fn test_builtin_attrs_read_only() {
        let f = builtin_function_new(&LEAD, None, Some(Value::str("mod")));
        let func = f.downcast_ref::<FunctionObject>().unwrap();
        assert_eq!(get_function_attr(func, "__doc__").unwrap(), Value::str("Lead."));
        assert_eq!(get_function_attr(func, "__module__").unwrap(), Value::str("mod"));
        assert!(get_function_attr(func, "__self__").unwrap().is_none());
        assert!(matches!(
            set_function_attr(func, "__doc__", Value::None),
            Err(CallError::ReadOnlyAttribute { .. })
        ));
        assert!(matches!(
            set_function_attr(func, "tag", Value::None),
            Err(CallError::NoAttribute { .. })
        ));
    }

    #[test]
    fn test_method_forwards_to_wrapped() {
        let ty = TypeObject::new_heap("Fwd", &[]).unwrap();
        let inst = crate::object::instance::InstanceObject::new_value(&ty);
        let f = cmethod_new(&LEAD, None, None, Some(Arc::clone(&ty))).unwrap();
        let m = method_new(f.clone(), inst.clone()).unwrap();
        let wrapper = m.downcast_ref::<FunctionObject>().unwrap();

        assert!(get_function_attr(wrapper, "__self__").unwrap().is(&inst));
        assert!(get_function_attr(wrapper, "__func__").unwrap().is(&f));
        assert_eq!(get_function_attr(wrapper, "__name__").unwrap(), Value::str("lead"));
        assert_eq!(get_function_attr(wrapper, "__doc__").unwrap(), Value::str("Lead."));
        assert!(set_function_attr(wrapper, "__name__", Value::str("x")).is_err());
    }
}

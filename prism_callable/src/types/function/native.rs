//! Natively-supplied and natively-defined callables.

use crate::error::CallResult;
use crate::object::type_obj::{TypeId, TypeObject};
use crate::types::function::base::{FunctionKind, FunctionObject};
use crate::types::function::defined::FunctionMeta;
use crate::types::function::dispatch::check_self_type;
use crate::types::function::method_def::{MethodDef, MethodRef};
use crate::value::Value;
use std::sync::Arc;

/// Wrap a static table entry as a plain builtin function.
pub fn builtin_function_new(
    def: &'static MethodDef,
    receiver: Option<Value>,
    module: Option<Value>,
) -> Value {
    Value::object(Arc::new(FunctionObject::new(
        MethodRef::Static(def),
        receiver,
        module,
        None,
        FunctionKind::Builtin,
    )))
}

/// Create a natively-defined callable.
///
/// An owned or shared entry becomes the callable's inline entry; a static
/// entry is referenced directly.
pub fn cfunction_new(
    def: impl Into<MethodRef>,
    receiver: Option<Value>,
    module: Option<Value>,
) -> Value {
    Value::object(Arc::new(build(def.into(), receiver, module, None)))
}

/// Create a natively-defined callable declared on `objclass`.
///
/// A receiver, if given, must conform to the owner class.
pub fn cmethod_new(
    def: impl Into<MethodRef>,
    receiver: Option<Value>,
    module: Option<Value>,
    objclass: Option<Arc<TypeObject>>,
) -> CallResult<Value> {
    let def = def.into();
    if let (Some(owner), Some(recv)) = (&objclass, &receiver) {
        check_self_type(def.get(), owner, recv)?;
    }
    Ok(Value::object(Arc::new(build(def, receiver, module, objclass))))
}

fn build(
    def: MethodRef,
    receiver: Option<Value>,
    module: Option<Value>,
    objclass: Option<Arc<TypeObject>>,
) -> FunctionObject {
    let entry = def.get();
    let name: Arc<str> = Arc::from(entry.name());
    let qualname = qualified_name(&name, receiver.as_ref(), objclass.as_ref());
    let doc = entry.doc().map_or(Value::None, Value::str);
    let meta = FunctionMeta::new(name, qualname, doc, None, Value::None, None);
    let inline = match &def {
        MethodRef::Shared(shared) => Some(Arc::clone(shared)),
        MethodRef::Static(_) => None,
    };
    FunctionObject::new(
        def,
        receiver,
        module,
        objclass,
        FunctionKind::Native { meta, inline },
    )
}

fn qualified_name(
    name: &Arc<str>,
    receiver: Option<&Value>,
    objclass: Option<&Arc<TypeObject>>,
) -> Arc<str> {
    let owner = match (objclass, receiver) {
        (Some(owner), _) => owner.name().clone(),
        (None, Some(recv)) if Value::type_id(recv) != TypeId::MODULE => {
            match recv.downcast_ref::<TypeObject>() {
                Some(ty) => ty.name().clone(),
                None => recv.type_name(),
            }
        }
        _ => return Arc::clone(name),
    };
    Arc::from(format!("{}.{}", owner, name))
}

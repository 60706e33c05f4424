//! Introspectable callables and host-language functions.
//!
//! [`FunctionMeta`] carries the metadata of every introspectable callable.
//! Host-language functions pair it with a code object and dispatch through
//! the shared [`PY_FUNCTION_DEF`] entry, which binds arguments and runs the
//! body on a fresh frame.

use crate::code::{CodeObject, Frame};
use crate::error::{CallError, CallResult};
use crate::profile::ProfileEvent;
use crate::thread_state::emit_profile;
use crate::types::dict::DictObject;
use crate::types::function::base::{FunctionKind, FunctionObject};
use crate::types::function::binding::{ArgumentBinder, Defaults};
use crate::types::function::method_def::{ArgsView, MethodDef, MethodFlags, MethodRef, NativeEntry};
use crate::types::tuple::TupleObject;
use crate::value::Value;
use parking_lot::RwLock;
use std::sync::Arc;

// =============================================================================
// Function Metadata
// =============================================================================

#[derive(Debug)]
struct MetaFields {
    name: Arc<str>,
    qualname: Arc<str>,
    doc: Value,
    module: Option<Value>,
    code: Option<Arc<CodeObject>>,
    defaults: Option<Arc<TupleObject>>,
    kwdefaults: Option<Arc<DictObject>>,
    annotations: Option<Arc<DictObject>>,
    dict: Option<Arc<DictObject>>,
}

/// Metadata of an introspectable callable.
///
/// Fields are not checked against each other: replacing `code` does not
/// touch `defaults`, and so on.
#[derive(Debug)]
pub struct FunctionMeta {
    fields: RwLock<MetaFields>,
    globals: Value,
    closure: Option<Arc<TupleObject>>,
}

impl FunctionMeta {
    pub(crate) fn new(
        name: Arc<str>,
        qualname: Arc<str>,
        doc: Value,
        code: Option<Arc<CodeObject>>,
        globals: Value,
        closure: Option<Arc<TupleObject>>,
    ) -> Self {
        Self {
            fields: RwLock::new(MetaFields {
                name,
                qualname,
                doc,
                module: None,
                code,
                defaults: None,
                kwdefaults: None,
                annotations: None,
                dict: None,
            }),
            globals,
            closure,
        }
    }

    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.fields.read().name)
    }

    pub fn set_name(&self, name: Arc<str>) {
        self.fields.write().name = name;
    }

    pub fn qualname(&self) -> Arc<str> {
        Arc::clone(&self.fields.read().qualname)
    }

    pub fn set_qualname(&self, qualname: Arc<str>) {
        self.fields.write().qualname = qualname;
    }

    pub fn doc(&self) -> Value {
        self.fields.read().doc.clone()
    }

    pub fn set_doc(&self, doc: Value) {
        self.fields.write().doc = doc;
    }

    /// `__module__` override, if one was assigned.
    pub fn module(&self) -> Option<Value> {
        self.fields.read().module.clone()
    }

    pub fn set_module(&self, module: Value) {
        self.fields.write().module = Some(module);
    }

    pub fn code(&self) -> Option<Arc<CodeObject>> {
        self.fields.read().code.clone()
    }

    pub fn set_code(&self, code: Arc<CodeObject>) {
        self.fields.write().code = Some(code);
    }

    /// Positional defaults, aligned to the last positional parameters.
    pub fn defaults(&self) -> Option<Arc<TupleObject>> {
        self.fields.read().defaults.clone()
    }

    pub fn set_defaults(&self, defaults: Option<Arc<TupleObject>>) {
        self.fields.write().defaults = defaults;
    }

    pub fn kwdefaults(&self) -> Option<Arc<DictObject>> {
        self.fields.read().kwdefaults.clone()
    }

    pub fn set_kwdefaults(&self, kwdefaults: Option<Arc<DictObject>>) {
        self.fields.write().kwdefaults = kwdefaults;
    }

    /// Annotations dict, created on first access.
    pub fn annotations(&self) -> Arc<DictObject> {
        if let Some(dict) = &self.fields.read().annotations {
            return Arc::clone(dict);
        }
        let mut fields = self.fields.write();
        Arc::clone(
            fields
                .annotations
                .get_or_insert_with(|| Arc::new(DictObject::new())),
        )
    }

    pub fn set_annotations(&self, annotations: Option<Arc<DictObject>>) {
        self.fields.write().annotations = annotations;
    }

    /// Attribute dict, created on first access.
    pub fn dict(&self) -> Arc<DictObject> {
        if let Some(dict) = &self.fields.read().dict {
            return Arc::clone(dict);
        }
        let mut fields = self.fields.write();
        Arc::clone(fields.dict.get_or_insert_with(|| Arc::new(DictObject::new())))
    }

    /// Attribute dict, if one exists.
    pub fn dict_if_present(&self) -> Option<Arc<DictObject>> {
        self.fields.read().dict.clone()
    }

    pub fn set_dict(&self, dict: Arc<DictObject>) {
        self.fields.write().dict = Some(dict);
    }

    /// Globals mapping, fixed at construction.
    #[inline]
    pub fn globals(&self) -> &Value {
        &self.globals
    }

    /// Captured cells, fixed at construction.
    #[inline]
    pub fn closure(&self) -> Option<&Arc<TupleObject>> {
        self.closure.as_ref()
    }
}

// =============================================================================
// Host-Language Functions
// =============================================================================

/// Shared entry of every host-language function.
///
/// The callable itself is the leading argument, so the entry reaches its
/// code and defaults. When that callable is a bound wrapper, the entry reads
/// the function and receiver from it and prepends the receiver.
pub static PY_FUNCTION_DEF: MethodDef = MethodDef::new(
    "function",
    NativeEntry::FastKeywords(call_defined),
    MethodFlags::FASTCALL
        .union(MethodFlags::KEYWORDS)
        .union(MethodFlags::PASS_FUNCTION)
        .union(MethodFlags::PYTHON),
);

fn call_defined(lead: &Value, view: ArgsView<'_>) -> CallResult<Value> {
    let (function, receiver) = match lead.downcast_ref::<FunctionObject>() {
        Some(wrapper) if wrapper.is_method() => (wrapper.wrapped().unwrap_or(lead), wrapper.receiver()),
        _ => (lead, None),
    };
    let Some(meta) = function.downcast_ref::<FunctionObject>().and_then(FunctionObject::meta) else {
        return Err(CallError::InvalidMethodDef {
            name: Arc::from(PY_FUNCTION_DEF.name()),
            reason: "called without a function object",
        });
    };

    // Snapshot so the body may reassign metadata while running.
    let (qualname, code, defaults, kwdefaults) = {
        let fields = meta.fields.read();
        (
            Arc::clone(&fields.qualname),
            fields.code.clone(),
            fields.defaults.clone(),
            fields.kwdefaults.clone(),
        )
    };
    let Some(code) = code else {
        return Err(CallError::type_error(format!(
            "{}() has no code object",
            qualname
        )));
    };

    let bound = ArgumentBinder::bind(
        &qualname,
        &code,
        Defaults {
            positional: defaults.as_deref(),
            kwonly: kwdefaults.as_deref(),
        },
        receiver.into_iter().chain(view.positional()).cloned(),
        view.keywords().map(|(name, value)| (&**name, value.clone())),
    )?;

    let frame = Frame::new(function.clone(), Arc::clone(&code), bound.parameters, bound.varargs, bound.varkw);
    emit_profile(ProfileEvent::Call, &qualname);
    let result = code.run(&frame);
    emit_profile(ProfileEvent::Return, &qualname);
    result
}

/// Create a host-language function from a code object and a globals dict.
pub fn function_new(code: Arc<CodeObject>, globals: Value) -> CallResult<Value> {
    function_new_with_closure(code, globals, None, None)
}

/// As [`function_new`], with an explicit qualified name.
pub fn function_new_with_qualname(
    code: Arc<CodeObject>,
    globals: Value,
    qualname: Option<&str>,
) -> CallResult<Value> {
    function_new_with_closure(code, globals, qualname, None)
}

/// As [`function_new_with_qualname`], capturing `closure` cells.
///
/// The closure must supply exactly one cell per free variable of `code`.
pub fn function_new_with_closure(
    code: Arc<CodeObject>,
    globals: Value,
    qualname: Option<&str>,
    closure: Option<Arc<TupleObject>>,
) -> CallResult<Value> {
    let Some(globals_dict) = globals.downcast_ref::<DictObject>() else {
        return Err(CallError::type_error(format!(
            "globals must be a dict, not {}",
            globals.type_name()
        )));
    };

    let cells = closure.as_ref().map_or(0, |c| c.len());
    if cells != code.freevars.len() {
        return Err(CallError::type_error(format!(
            "{} requires closure of length {}, not {}",
            code.name,
            code.freevars.len(),
            cells
        )));
    }

    let module = globals_dict.get("__name__");
    let doc = code.doc.clone().map_or(Value::None, Value::Str);
    let qualname = qualname.map_or_else(|| Arc::clone(&code.qualname), Arc::from);
    let meta = FunctionMeta::new(
        Arc::clone(&code.name),
        qualname,
        doc,
        Some(code),
        globals,
        closure,
    );

    Ok(Value::object(Arc::new(FunctionObject::new(
        MethodRef::Static(&PY_FUNCTION_DEF),
        None,
        module,
        None,
        FunctionKind::Defined(meta),
    ))))
}

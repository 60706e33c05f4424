//! The callable base record.
//!
//! Every callable kind shares one struct: the common fields the dispatcher
//! reads, plus a tagged payload for what each kind adds on top.
//!
//! # Layout
//!
//! ```text
//! FunctionObject
//! ├── header: ObjectHeader        type id of the concrete kind
//! ├── def: MethodRef              dispatch-table entry
//! ├── receiver: Option<Value>     bound self, fixed at construction
//! ├── module: Option<Value>       defining module
//! ├── objclass: Option<TypeRef>   declared owner class, fixed at construction
//! ├── weakrefs: WeakRefList       weak-reference chain
//! └── kind: FunctionKind
//!     ├── Builtin                 natively-supplied, nothing more
//!     ├── Defined(meta)           host-language function
//!     ├── Native { meta, inline } natively-defined, inline entry storage
//!     └── Method { func }         bound-call wrapper
//! ```

use crate::object::type_obj::{TypeFlags, TypeId, TypeObject};
use crate::object::{ObjectHeader, PyObject};
use crate::types::function::defined::FunctionMeta;
use crate::types::function::method_def::{MethodDef, MethodFlags, MethodRef};
use crate::value::Value;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

// =============================================================================
// Weak Reference Chain
// =============================================================================

/// Callback run when the owning callable is released.
pub type WeakCallback = Box<dyn FnOnce() + Send>;

/// Weak-reference chain slot.
///
/// Callbacks registered here fire exactly once, when the callable is dropped.
#[derive(Default)]
pub struct WeakRefList {
    callbacks: Mutex<Vec<WeakCallback>>,
}

impl WeakRefList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn register(&self, callback: WeakCallback) {
        self.callbacks.lock().push(callback);
    }

    /// Number of pending callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for WeakRefList {
    fn drop(&mut self) {
        for callback in self.callbacks.get_mut().drain(..) {
            callback();
        }
    }
}

impl std::fmt::Debug for WeakRefList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakRefList").field("len", &self.len()).finish()
    }
}

// =============================================================================
// Function Kind
// =============================================================================

/// Kind-specific payload of a base function.
#[derive(Debug)]
pub(crate) enum FunctionKind {
    /// Natively-supplied function with no metadata of its own.
    Builtin,
    /// Host-language function.
    Defined(FunctionMeta),
    /// Natively-defined function. `inline` is the entry storage reserved for
    /// this callable; `def` may or may not point at it.
    Native {
        meta: FunctionMeta,
        inline: Option<Arc<MethodDef>>,
    },
    /// Bound-call wrapper around `func`.
    Method { func: Value },
}

impl FunctionKind {
    fn type_id(&self) -> TypeId {
        match self {
            FunctionKind::Builtin => TypeId::BUILTIN_FUNCTION,
            FunctionKind::Defined(_) => TypeId::FUNCTION,
            FunctionKind::Native { .. } => TypeId::CFUNCTION,
            FunctionKind::Method { .. } => TypeId::METHOD,
        }
    }
}

// =============================================================================
// Function Object
// =============================================================================

/// Base function: the record shared by every callable kind.
#[derive(Debug)]
pub struct FunctionObject {
    header: ObjectHeader,
    def: MethodRef,
    receiver: Option<Value>,
    module: Option<Value>,
    objclass: Option<Arc<TypeObject>>,
    weakrefs: WeakRefList,
    kind: FunctionKind,
}

impl FunctionObject {
    pub(crate) fn new(
        def: MethodRef,
        receiver: Option<Value>,
        module: Option<Value>,
        objclass: Option<Arc<TypeObject>>,
        kind: FunctionKind,
    ) -> Self {
        Self {
            header: ObjectHeader::new(kind.type_id()),
            def,
            receiver,
            module,
            objclass,
            weakrefs: WeakRefList::new(),
            kind,
        }
    }

    /// Dispatch-table entry.
    #[inline]
    pub fn method_def(&self) -> &MethodDef {
        self.def.get()
    }

    #[inline]
    pub(crate) fn method_ref(&self) -> &MethodRef {
        &self.def
    }

    /// Address of the dispatch-table entry.
    #[inline]
    pub fn method_def_ptr(&self) -> *const MethodDef {
        self.def.as_ptr()
    }

    #[inline]
    pub fn flags(&self) -> MethodFlags {
        self.def.get().flags()
    }

    /// Bound receiver.
    #[inline]
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.receiver.is_some()
    }

    /// Defining module.
    #[inline]
    pub fn module(&self) -> Option<&Value> {
        self.module.as_ref()
    }

    /// Declared owner class.
    #[inline]
    pub fn objclass(&self) -> Option<&Arc<TypeObject>> {
        self.objclass.as_ref()
    }

    #[inline]
    pub fn weakrefs(&self) -> &WeakRefList {
        &self.weakrefs
    }

    #[inline]
    pub(crate) fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Introspection metadata, for defined functions and cfunctions.
    #[inline]
    pub fn meta(&self) -> Option<&FunctionMeta> {
        match &self.kind {
            FunctionKind::Defined(meta) | FunctionKind::Native { meta, .. } => Some(meta),
            _ => None,
        }
    }

    /// Inline entry storage of a cfunction.
    #[inline]
    pub fn inline_def(&self) -> Option<&Arc<MethodDef>> {
        match &self.kind {
            FunctionKind::Native { inline, .. } => inline.as_ref(),
            _ => None,
        }
    }

    /// Whether the dispatch reference points at this callable's inline entry.
    pub fn uses_inline_def(&self) -> bool {
        self.inline_def()
            .is_some_and(|inline| std::ptr::eq(Arc::as_ptr(inline), self.method_def_ptr()))
    }

    /// Callable wrapped by a bound method.
    #[inline]
    pub fn wrapped(&self) -> Option<&Value> {
        match &self.kind {
            FunctionKind::Method { func } => Some(func),
            _ => None,
        }
    }

    #[inline]
    pub fn is_method(&self) -> bool {
        matches!(self.kind, FunctionKind::Method { .. })
    }

    /// Display name: metadata name, wrapped callable name, or entry name.
    pub fn name(&self) -> Arc<str> {
        match &self.kind {
            FunctionKind::Defined(meta) | FunctionKind::Native { meta, .. } => meta.name(),
            FunctionKind::Method { func } => match func.downcast_ref::<FunctionObject>() {
                Some(inner) => inner.name(),
                None => Arc::from(self.method_def().name()),
            },
            FunctionKind::Builtin => Arc::from(self.method_def().name()),
        }
    }

    /// Qualified name.
    pub fn qualname(&self) -> Arc<str> {
        match &self.kind {
            FunctionKind::Defined(meta) | FunctionKind::Native { meta, .. } => meta.qualname(),
            FunctionKind::Method { func } => match func.downcast_ref::<FunctionObject>() {
                Some(inner) => inner.qualname(),
                None => self.name(),
            },
            FunctionKind::Builtin => match &self.receiver {
                Some(recv) if Value::type_id(recv) != TypeId::MODULE => {
                    let owner = match recv.downcast_ref::<TypeObject>() {
                        Some(ty) => ty.name().clone(),
                        None => recv.type_name(),
                    };
                    Arc::from(format!("{}.{}", owner, self.method_def().name()))
                }
                _ => self.name(),
            },
        }
    }

    /// Receiver that makes this a "method" for display purposes.
    fn display_receiver(&self) -> Option<&Value> {
        self.receiver
            .as_ref()
            .filter(|recv| Value::type_id(recv) != TypeId::MODULE)
    }
}

impl PyObject for FunctionObject {
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
        match &self.kind {
            FunctionKind::Defined(meta) => format!("<function {}>", meta.qualname()),
            FunctionKind::Method { func } => match &self.receiver {
                Some(recv) => format!(
                    "<bound method {} of {}>",
                    func.downcast_ref::<FunctionObject>()
                        .map(|f| f.qualname())
                        .unwrap_or_else(|| self.name()),
                    recv.repr()
                ),
                None => format!("<method {}>", self.name()),
            },
            FunctionKind::Builtin | FunctionKind::Native { .. } => {
                match (self.display_receiver(), &self.objclass) {
                    (Some(recv), _) => format!(
                        "<built-in method {} of {} object>",
                        self.name(),
                        recv.type_name()
                    ),
                    (None, Some(owner)) if self.receiver.is_none() => {
                        format!("<method '{}' of '{}' objects>", self.name(), owner.name())
                    }
                    _ => format!("<built-in function {}>", self.name()),
                }
            }
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Whether `value` conforms to the base function layout.
///
/// Consults the type-level capability marker, then the concrete layout.
#[inline]
pub fn is_base_function(value: &Value) -> bool {
    as_base_function(value).is_some()
}

/// Borrow `value` as a base function if its type carries the marker.
pub fn as_base_function(value: &Value) -> Option<&FunctionObject> {
    let obj = value.as_object()?;
    if !obj.type_object().has_flag(TypeFlags::BASE_FUNCTION) {
        return None;
    }
    obj.as_any().downcast_ref::<FunctionObject>()
}

/// Natively-only callable: a base function with no host-language body.
pub fn is_builtin_function(value: &Value) -> bool {
    as_base_function(value).is_some_and(|f| {
        matches!(f.kind, FunctionKind::Builtin | FunctionKind::Native { .. })
            && !f.flags().contains(MethodFlags::PYTHON)
    })
}

/// Natively-defined callable with its own dispatch-entry storage.
pub fn is_cfunction(value: &Value) -> bool {
    as_base_function(value).is_some_and(|f| matches!(f.kind, FunctionKind::Native { .. }))
}

/// Introspectable callable (metadata-bearing).
pub fn is_defined_function(value: &Value) -> bool {
    as_base_function(value).is_some_and(|f| f.meta().is_some())
}

/// Host-language function.
pub fn is_function(value: &Value) -> bool {
    as_base_function(value).is_some_and(|f| matches!(f.kind, FunctionKind::Defined(_)))
}

/// Bound-call wrapper.
pub fn is_method(value: &Value) -> bool {
    as_base_function(value).is_some_and(FunctionObject::is_method)
}

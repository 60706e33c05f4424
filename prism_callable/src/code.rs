//! Code objects: the behavior descriptor of host-language functions.
//!
//! The evaluator is an external collaborator. A code object carries the
//! parameter layout the call layer needs for argument binding plus an opaque
//! body that the evaluator supplies.

use crate::error::CallResult;
use crate::object::type_obj::TypeId;
use crate::object::{ObjectHeader, PyObject};
use crate::types::dict::DictObject;
use crate::types::function::FunctionObject;
use crate::types::tuple::TupleObject;
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

bitflags::bitflags! {
    /// Code flags describing the parameter layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CodeFlags: u32 {
        /// Function takes `*args`.
        const VARARGS = 1 << 0;
        /// Function takes `**kwargs`.
        const VARKEYWORDS = 1 << 1;
    }
}

/// Entry point into the evaluator for a code object.
pub type CodeBody = Arc<dyn Fn(&Frame) -> CallResult<Value> + Send + Sync>;

/// Code object.
///
/// # Locals layout
///
/// ```text
/// [0..arg_count)                      positional parameters
/// [arg_count]                         *args name (if VARARGS)
/// [.. + kwonlyarg_count)              keyword-only parameters
/// [next]                              **kwargs name (if VARKEYWORDS)
/// ```
pub struct CodeObject {
    header: ObjectHeader,
    /// Function name.
    pub name: Arc<str>,
    /// Qualified name.
    pub qualname: Arc<str>,
    /// Source file name.
    pub filename: Arc<str>,
    /// Docstring, if the body starts with one.
    pub doc: Option<Arc<str>>,
    /// Number of positional parameters.
    pub arg_count: u16,
    /// Number of keyword-only parameters.
    pub kwonlyarg_count: u16,
    /// Parameter layout flags.
    pub flags: CodeFlags,
    /// Parameter names in locals layout.
    pub locals: Box<[Arc<str>]>,
    /// Names of captured variables; a closure must supply one cell each.
    pub freevars: Box<[Arc<str>]>,
    body: CodeBody,
}

impl CodeObject {
    /// Create a code object with positional parameters `params`.
    pub fn new(name: &str, params: &[&str], body: CodeBody) -> Self {
        Self {
            header: ObjectHeader::new(TypeId::CODE),
            name: Arc::from(name),
            qualname: Arc::from(name),
            filename: Arc::from("<native>"),
            doc: None,
            arg_count: params.len() as u16,
            kwonlyarg_count: 0,
            flags: CodeFlags::empty(),
            locals: params.iter().map(|p| Arc::from(*p)).collect(),
            freevars: Box::new([]),
            body,
        }
    }

    /// Append a `*args` parameter.
    pub fn with_varargs(mut self, name: &str) -> Self {
        self.push_local(name);
        self.flags |= CodeFlags::VARARGS;
        self
    }

    /// Append keyword-only parameters. Call after `with_varargs`, if any.
    pub fn with_kwonly(mut self, names: &[&str]) -> Self {
        for name in names {
            self.push_local(name);
        }
        self.kwonlyarg_count += names.len() as u16;
        self
    }

    /// Append a `**kwargs` parameter.
    pub fn with_varkw(mut self, name: &str) -> Self {
        self.push_local(name);
        self.flags |= CodeFlags::VARKEYWORDS;
        self
    }

    /// Declare captured variable names.
    pub fn with_freevars(mut self, names: &[&str]) -> Self {
        self.freevars = names.iter().map(|n| Arc::from(*n)).collect();
        self
    }

    pub fn with_qualname(mut self, qualname: &str) -> Self {
        self.qualname = Arc::from(qualname);
        self
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(Arc::from(doc));
        self
    }

    fn push_local(&mut self, name: &str) {
        let mut locals = std::mem::take(&mut self.locals).into_vec();
        locals.push(Arc::from(name));
        self.locals = locals.into_boxed_slice();
    }

    #[inline]
    pub fn has_varargs(&self) -> bool {
        self.flags.contains(CodeFlags::VARARGS)
    }

    #[inline]
    pub fn has_varkw(&self) -> bool {
        self.flags.contains(CodeFlags::VARKEYWORDS)
    }

    /// Run the body on a prepared frame.
    #[inline]
    pub fn run(&self, frame: &Frame) -> CallResult<Value> {
        (self.body)(frame)
    }
}

impl PyObject for CodeObject {
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
        format!("<code object {}, file \"{}\">", self.name, self.filename)
    }
}

impl std::fmt::Debug for CodeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeObject")
            .field("name", &self.name)
            .field("arg_count", &self.arg_count)
            .field("kwonlyarg_count", &self.kwonlyarg_count)
            .field("flags", &self.flags)
            .finish()
    }
}

// =============================================================================
// Frame
// =============================================================================

/// Activation record handed to a code body.
pub struct Frame {
    function: Value,
    code: Arc<CodeObject>,
    /// Positional and keyword-only parameter values.
    parameters: Vec<Value>,
    varargs: Option<Arc<TupleObject>>,
    varkw: Option<Arc<DictObject>>,
}

impl Frame {
    pub(crate) fn new(
        function: Value,
        code: Arc<CodeObject>,
        parameters: Vec<Value>,
        varargs: Option<Arc<TupleObject>>,
        varkw: Option<Arc<DictObject>>,
    ) -> Self {
        Self {
            function,
            code,
            parameters,
            varargs,
            varkw,
        }
    }

    /// The function being executed.
    #[inline]
    pub fn function(&self) -> &Value {
        &self.function
    }

    #[inline]
    pub fn code(&self) -> &Arc<CodeObject> {
        &self.code
    }

    /// Parameter value by parameter index.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.parameters.get(index)
    }

    /// All bound parameter values.
    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.parameters
    }

    /// Parameter value by name.
    pub fn local(&self, name: &str) -> Option<&Value> {
        let arg_count = self.code.arg_count as usize;
        let kwonly_start = arg_count + usize::from(self.code.has_varargs());
        let pos = self.code.locals.iter().position(|n| &**n == name)?;
        if pos < arg_count {
            self.parameters.get(pos)
        } else if pos >= kwonly_start && pos < kwonly_start + self.code.kwonlyarg_count as usize {
            self.parameters.get(arg_count + pos - kwonly_start)
        } else {
            None
        }
    }

    /// Collected `*args`.
    #[inline]
    pub fn varargs(&self) -> Option<&Arc<TupleObject>> {
        self.varargs.as_ref()
    }

    /// Collected `**kwargs`.
    #[inline]
    pub fn varkw(&self) -> Option<&Arc<DictObject>> {
        self.varkw.as_ref()
    }

    /// Globals of the executing function.
    pub fn globals(&self) -> Option<Value> {
        let func = self.function.downcast_ref::<FunctionObject>()?;
        Some(func.meta()?.globals().clone())
    }

    /// Captured cell value by index.
    pub fn closure_value(&self, index: usize) -> Option<Value> {
        let func = self.function.downcast_ref::<FunctionObject>()?;
        func.meta()?.closure()?.as_slice().get(index).cloned()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("code", &self.code.name)
            .field("parameters", &self.parameters.len())
            .field("varargs_len", &self.varargs.as_ref().map(|t| t.len()))
            .field("varkw_len", &self.varkw.as_ref().map(|d| d.len()))
            .finish()
    }
}

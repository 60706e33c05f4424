//! Dispatch-table entries.
//!
//! A `MethodDef` is the immutable `(name, entry point, flags)` record that
//! describes how to invoke a callable natively. Entries for natively-supplied
//! callables live in `static` tables; natively-defined callables may carry
//! their own entry inline.
//!
//! # Flag layout (32 bits)
//!
//! ```text
//! 0x0000_0001  VARARGS          ┐
//! 0x0000_0004  NOARGS           │ calling convention, exactly one
//! 0x0000_0008  O                │
//! 0x0000_0080  FASTCALL         ┘
//! 0x0000_0002  KEYWORDS         only with VARARGS or FASTCALL
//! 0x0000_0010  CLASS
//! 0x0000_0020  STATIC
//! 0x0000_0040  COEXIST
//! 0x0000_0100  PASS_FUNCTION
//! 0x0000_0200  NO_SELF_SLICING
//! 0x0000_0400  PYTHON
//! 0x0000_0800  CUSTOM
//! 0x00FF_0000  USR0..USR7       reserved for consumers, ignored
//! ```

use crate::error::{CallError, CallResult};
use crate::types::dict::DictObject;
use crate::types::tuple::TupleObject;
use crate::value::Value;
use std::borrow::Cow;
use std::sync::Arc;

// =============================================================================
// Method Flags
// =============================================================================

bitflags::bitflags! {
    /// Flags of a dispatch-table entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        /// Positional arguments packed in a tuple.
        const VARARGS = 0x0001;
        /// Keyword arguments accepted.
        const KEYWORDS = 0x0002;
        /// No arguments besides the leading one.
        const NOARGS = 0x0004;
        /// Exactly one positional argument.
        const O = 0x0008;
        /// Binds to the type rather than the instance.
        const CLASS = 0x0010;
        /// Never binds.
        const STATIC = 0x0020;
        /// Replaces an existing attribute of the same name on materialization.
        const COEXIST = 0x0040;
        /// Positional arguments as a contiguous array.
        const FASTCALL = 0x0080;
        /// The callable itself is passed as the leading argument.
        const PASS_FUNCTION = 0x0100;
        /// The first positional argument is not sliced off as the receiver.
        const NO_SELF_SLICING = 0x0200;
        /// Body is host-language code; the evaluator reports call events.
        const PYTHON = 0x0400;
        /// Materialized by the declaring component itself.
        const CUSTOM = 0x0800;

        const USR0 = 0x0001_0000;
        const USR1 = 0x0002_0000;
        const USR2 = 0x0004_0000;
        const USR3 = 0x0008_0000;
        const USR4 = 0x0010_0000;
        const USR5 = 0x0020_0000;
        const USR6 = 0x0040_0000;
        const USR7 = 0x0080_0000;
    }
}

impl MethodFlags {
    /// Mutually exclusive calling-convention flags.
    pub const CONVENTION_MASK: MethodFlags = MethodFlags::VARARGS
        .union(MethodFlags::NOARGS)
        .union(MethodFlags::O)
        .union(MethodFlags::FASTCALL);

    /// Bits reserved for consumers.
    pub const USER_MASK: MethodFlags = MethodFlags::from_bits_retain(0x00FF_0000);

    /// User flag `n` (0..8).
    #[inline]
    pub const fn user(n: u32) -> MethodFlags {
        MethodFlags::from_bits_retain(0x0001_0000 << (n & 7))
    }

    /// Calling convention selected by these flags.
    #[inline]
    pub fn convention(self) -> Option<CallConvention> {
        CallConvention::from_flags(self)
    }
}

// =============================================================================
// Calling Convention
// =============================================================================

/// Native calling conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallConvention {
    /// `NOARGS`: `f(lead)`.
    NoArgs,
    /// `O`: `f(lead, arg)`.
    Single,
    /// `VARARGS`: `f(lead, args_tuple)`.
    VarArgs,
    /// `VARARGS | KEYWORDS`: `f(lead, args_tuple, kwargs_dict)`.
    VarArgsKeywords,
    /// `FASTCALL`: `f(lead, args)`.
    Fast,
    /// `FASTCALL | KEYWORDS`: `f(lead, values, kwnames)`.
    FastKeywords,
}

impl CallConvention {
    /// Decode the convention.
    ///
    /// Returns `None` unless exactly one convention flag is set and
    /// `KEYWORDS` accompanies only `VARARGS` or `FASTCALL`.
    pub fn from_flags(flags: MethodFlags) -> Option<Self> {
        let keywords = flags.contains(MethodFlags::KEYWORDS);
        let convention = flags & MethodFlags::CONVENTION_MASK;
        if convention == MethodFlags::NOARGS && !keywords {
            Some(CallConvention::NoArgs)
        } else if convention == MethodFlags::O && !keywords {
            Some(CallConvention::Single)
        } else if convention == MethodFlags::VARARGS {
            Some(if keywords {
                CallConvention::VarArgsKeywords
            } else {
                CallConvention::VarArgs
            })
        } else if convention == MethodFlags::FASTCALL {
            Some(if keywords {
                CallConvention::FastKeywords
            } else {
                CallConvention::Fast
            })
        } else {
            None
        }
    }

    /// Whether keyword arguments are accepted.
    #[inline]
    pub fn accepts_keywords(self) -> bool {
        matches!(
            self,
            CallConvention::VarArgsKeywords | CallConvention::FastKeywords
        )
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Positional values followed by keyword values, with keyword names parallel
/// to the tail.
#[derive(Debug, Clone, Copy)]
pub struct ArgsView<'a> {
    values: &'a [Value],
    kwnames: &'a [Arc<str>],
}

impl<'a> ArgsView<'a> {
    /// Create a view. `kwnames.len()` must not exceed `values.len()`.
    #[inline]
    pub fn new(values: &'a [Value], kwnames: &'a [Arc<str>]) -> Self {
        debug_assert!(kwnames.len() <= values.len());
        Self { values, kwnames }
    }

    /// Number of positional values.
    #[inline]
    pub fn nargs(&self) -> usize {
        self.values.len() - self.kwnames.len()
    }

    /// Positional values.
    #[inline]
    pub fn positional(&self) -> &'a [Value] {
        &self.values[..self.nargs()]
    }

    /// Keyword values, parallel to `kwnames`.
    #[inline]
    pub fn keyword_values(&self) -> &'a [Value] {
        &self.values[self.nargs()..]
    }

    #[inline]
    pub fn kwnames(&self) -> &'a [Arc<str>] {
        self.kwnames
    }

    /// The whole contiguous array.
    #[inline]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Keyword value by name.
    pub fn keyword(&self, name: &str) -> Option<&'a Value> {
        let pos = self.kwnames.iter().position(|k| &**k == name)?;
        self.keyword_values().get(pos)
    }

    /// Iterate `(name, value)` keyword pairs.
    pub fn keywords(&self) -> impl Iterator<Item = (&'a Arc<str>, &'a Value)> + 'a {
        self.kwnames.iter().zip(self.keyword_values().iter())
    }
}

pub type NoArgsFn = fn(&Value) -> CallResult<Value>;
pub type SingleFn = fn(&Value, &Value) -> CallResult<Value>;
pub type VarArgsFn = fn(&Value, &TupleObject) -> CallResult<Value>;
pub type VarArgsKeywordsFn = fn(&Value, &TupleObject, Option<&DictObject>) -> CallResult<Value>;
pub type FastFn = fn(&Value, &[Value]) -> CallResult<Value>;
pub type FastKeywordsFn = fn(&Value, ArgsView<'_>) -> CallResult<Value>;

/// Native entry point. The first parameter is always the leading argument
/// chosen by the dispatcher (receiver, sliced self, callable, or `None`).
#[derive(Clone, Copy)]
pub enum NativeEntry {
    NoArgs(NoArgsFn),
    Single(SingleFn),
    VarArgs(VarArgsFn),
    VarArgsKeywords(VarArgsKeywordsFn),
    Fast(FastFn),
    FastKeywords(FastKeywordsFn),
}

impl NativeEntry {
    /// Convention this entry point is written for.
    pub fn convention(&self) -> CallConvention {
        match self {
            NativeEntry::NoArgs(_) => CallConvention::NoArgs,
            NativeEntry::Single(_) => CallConvention::Single,
            NativeEntry::VarArgs(_) => CallConvention::VarArgs,
            NativeEntry::VarArgsKeywords(_) => CallConvention::VarArgsKeywords,
            NativeEntry::Fast(_) => CallConvention::Fast,
            NativeEntry::FastKeywords(_) => CallConvention::FastKeywords,
        }
    }
}

impl std::fmt::Debug for NativeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeEntry::{:?}", self.convention())
    }
}

// =============================================================================
// Method Definition
// =============================================================================

/// Dispatch-table entry.
#[derive(Debug, Clone)]
pub struct MethodDef {
    name: Cow<'static, str>,
    entry: NativeEntry,
    flags: MethodFlags,
    doc: Option<Cow<'static, str>>,
}

impl MethodDef {
    /// Entry for a static table.
    pub const fn new(name: &'static str, entry: NativeEntry, flags: MethodFlags) -> Self {
        Self {
            name: Cow::Borrowed(name),
            entry,
            flags,
            doc: None,
        }
    }

    /// Entry with a docstring, for a static table.
    pub const fn with_doc(
        name: &'static str,
        entry: NativeEntry,
        flags: MethodFlags,
        doc: &'static str,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            entry,
            flags,
            doc: Some(Cow::Borrowed(doc)),
        }
    }

    /// Entry built at runtime.
    pub fn owned(name: String, entry: NativeEntry, flags: MethodFlags, doc: Option<String>) -> Self {
        Self {
            name: Cow::Owned(name),
            entry,
            flags,
            doc: doc.map(Cow::Owned),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn entry(&self) -> &NativeEntry {
        &self.entry
    }

    #[inline]
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Check the convention flags against each other and the entry point.
    pub fn validate(&self) -> CallResult<CallConvention> {
        match CallConvention::from_flags(self.flags) {
            Some(convention) if convention == self.entry.convention() => Ok(convention),
            _ => Err(CallError::BadCallFlags {
                name: Arc::from(self.name()),
                flags: self.flags.bits(),
            }),
        }
    }
}

// =============================================================================
// Method Reference
// =============================================================================

/// The dispatch-table reference held by a base function.
#[derive(Debug, Clone)]
pub enum MethodRef {
    /// Entry in a process-wide static table.
    Static(&'static MethodDef),
    /// Heap entry, shared with the callable that owns it inline.
    Shared(Arc<MethodDef>),
}

impl MethodRef {
    #[inline]
    pub fn get(&self) -> &MethodDef {
        match self {
            MethodRef::Static(def) => def,
            MethodRef::Shared(def) => def,
        }
    }

    /// Address of the referenced entry, for identity comparisons.
    #[inline]
    pub fn as_ptr(&self) -> *const MethodDef {
        self.get() as *const MethodDef
    }
}

impl From<&'static MethodDef> for MethodRef {
    fn from(def: &'static MethodDef) -> Self {
        MethodRef::Static(def)
    }
}

impl From<Arc<MethodDef>> for MethodRef {
    fn from(def: Arc<MethodDef>) -> Self {
        MethodRef::Shared(def)
    }
}

impl From<MethodDef> for MethodRef {
    fn from(def: MethodDef) -> Self {
        MethodRef::Shared(Arc::new(def))
    }
}

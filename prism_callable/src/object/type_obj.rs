//! Type objects, type identifiers and type-level capability flags.

use crate::error::{CallError, CallResult};
use crate::object::class::{ClassDict, Mro, compute_c3_mro};
use crate::object::registry::global_registry;
use crate::object::{ObjectHeader, PyObject};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// Type Identifier
// =============================================================================

/// Compact type identifier stored in every object header.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const OBJECT: TypeId = TypeId(1);
    pub const TYPE: TypeId = TypeId(2);
    pub const NONE: TypeId = TypeId(3);
    pub const BOOL: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);
    pub const FLOAT: TypeId = TypeId(6);
    pub const STR: TypeId = TypeId(7);
    pub const TUPLE: TypeId = TypeId(8);
    pub const DICT: TypeId = TypeId(9);
    pub const MODULE: TypeId = TypeId(10);
    pub const CODE: TypeId = TypeId(11);

    pub const BASE_FUNCTION: TypeId = TypeId(16);
    pub const BUILTIN_FUNCTION: TypeId = TypeId(17);
    pub const DEFINED_FUNCTION: TypeId = TypeId(18);
    pub const FUNCTION: TypeId = TypeId(19);
    pub const CFUNCTION: TypeId = TypeId(20);
    pub const METHOD: TypeId = TypeId(21);
    pub const NATIVE_CALLABLE: TypeId = TypeId(22);

    /// First identifier handed out to heap types.
    pub const FIRST_USER_TYPE: u32 = 256;

    /// Create from a raw identifier.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this identifies a builtin type.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::FIRST_USER_TYPE
    }
}

// =============================================================================
// Type Flags
// =============================================================================

bitflags::bitflags! {
    /// Type-level flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        /// Type was created at runtime and may be redefined.
        const HEAPTYPE = 1 << 0;
        /// Type may be used as a base class.
        const BASETYPE = 1 << 1;
        /// Instances are invocable through the default base function dispatch.
        ///
        /// Never inherited, never allowed on heap types.
        const BASE_FUNCTION = 1 << 2;
        /// Instances bind to the receiver when fetched through an instance.
        const METHOD_DESCRIPTOR = 1 << 3;
    }
}

impl TypeFlags {
    /// Flags a subtype receives from its bases.
    pub const INHERITED: TypeFlags = TypeFlags::METHOD_DESCRIPTOR;
}

// =============================================================================
// Type Object
// =============================================================================

/// A type object.
///
/// Bases and MRO are fixed at construction. Flags and the attribute
/// dictionary may change afterwards.
pub struct TypeObject {
    header: ObjectHeader,
    id: TypeId,
    name: Arc<str>,
    bases: Box<[Arc<TypeObject>]>,
    mro: Mro,
    flags: AtomicU32,
    dict: ClassDict,
}

impl TypeObject {
    /// Build a builtin type. Used by the registry at startup.
    pub(crate) fn new_builtin(
        id: TypeId,
        name: &str,
        bases: &[Arc<TypeObject>],
        flags: TypeFlags,
    ) -> Self {
        // Builtin bases are single-inheritance chains, so C3 cannot fail.
        let mro = compute_c3_mro(bases).unwrap_or_default();
        Self {
            header: ObjectHeader::new(TypeId::TYPE),
            id,
            name: Arc::from(name),
            bases: bases.into(),
            mro,
            flags: AtomicU32::new(flags.bits()),
            dict: ClassDict::new(),
        }
    }

    /// Create and register a heap type.
    ///
    /// An empty `bases` list means `(object,)`.
    pub fn new_heap(name: &str, bases: &[Arc<TypeObject>]) -> CallResult<Arc<TypeObject>> {
        let registry = global_registry();
        let bases: Vec<Arc<TypeObject>> = if bases.is_empty() {
            vec![registry.builtin(TypeId::OBJECT)]
        } else {
            bases.to_vec()
        };

        let mut inherited = TypeFlags::empty();
        for base in &bases {
            if !base.flags().contains(TypeFlags::BASETYPE) {
                return Err(CallError::type_error(format!(
                    "type '{}' is not an acceptable base type",
                    base.name()
                )));
            }
            inherited |= base.flags() & TypeFlags::INHERITED;
        }

        let mro = compute_c3_mro(&bases).map_err(|e| CallError::type_error(e.to_string()))?;
        let flags = TypeFlags::HEAPTYPE | TypeFlags::BASETYPE | inherited;
        let ty = Arc::new(Self {
            header: ObjectHeader::new(TypeId::TYPE),
            id: registry.allocate_type_id(),
            name: Arc::from(name),
            bases: bases.into_boxed_slice(),
            mro,
            flags: AtomicU32::new(flags.bits()),
            dict: ClassDict::new(),
        });
        registry.register(Arc::clone(&ty));
        Ok(ty)
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn bases(&self) -> &[Arc<TypeObject>] {
        &self.bases
    }

    /// Ancestors in resolution order, excluding this type.
    #[inline]
    pub fn mro(&self) -> &Mro {
        &self.mro
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        TypeFlags::from_bits_retain(self.flags.load(Ordering::Acquire))
    }

    #[inline]
    pub fn has_flag(&self, flag: TypeFlags) -> bool {
        self.flags().contains(flag)
    }

    /// Set additional type flags.
    ///
    /// `BASE_FUNCTION` is rejected on heap types: a redefinable type cannot
    /// promise the base function layout.
    pub fn set_flags(&self, flags: TypeFlags) -> CallResult<()> {
        if flags.contains(TypeFlags::BASE_FUNCTION) && self.has_flag(TypeFlags::HEAPTYPE) {
            return Err(CallError::type_error(format!(
                "cannot mark heap type '{}' as a base function type",
                self.name
            )));
        }
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
        Ok(())
    }

    /// `issubclass(self, other)`.
    pub fn is_subtype(&self, other: &TypeObject) -> bool {
        self.id == other.id || self.mro.iter().any(|t| t.id == other.id)
    }

    /// Class attribute dictionary.
    #[inline]
    pub fn dict(&self) -> &ClassDict {
        &self.dict
    }

    /// Look up an attribute along the MRO.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.dict
            .get(name)
            .or_else(|| self.mro.iter().find_map(|t| t.dict.get(name)))
    }
}

impl PyObject for TypeObject {
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
        format!("<class '{}'>", self.name)
    }
}

impl std::fmt::Debug for TypeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("flags", &self.flags())
            .finish()
    }
}

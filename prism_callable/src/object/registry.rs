//! Type registry for mapping TypeId to TypeObject.
//!
//! Provides O(1) lookup of type objects by TypeId. Builtin types are
//! registered when the registry is first touched; heap types register
//! themselves on creation.

use crate::object::type_obj::{TypeFlags, TypeId, TypeObject};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global type registry.
pub struct TypeRegistry {
    /// Map from TypeId to TypeObject.
    types: RwLock<FxHashMap<TypeId, Arc<TypeObject>>>,
    /// Counter for generating new TypeIds.
    next_id: AtomicU32,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(FxHashMap::default()),
            next_id: AtomicU32::new(TypeId::FIRST_USER_TYPE),
        }
    }

    /// Allocate a new TypeId for a heap type.
    pub fn allocate_type_id(&self) -> TypeId {
        TypeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a type object under its own id.
    pub fn register(&self, ty: Arc<TypeObject>) {
        self.types.write().insert(ty.id(), ty);
    }

    /// Look up a type by ID.
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<Arc<TypeObject>> {
        self.types.read().get(&type_id).cloned()
    }

    /// Look up a builtin type, falling back to `object` for unknown ids.
    pub fn builtin(&self, type_id: TypeId) -> Arc<TypeObject> {
        let types = self.types.read();
        types
            .get(&type_id)
            .or_else(|| types.get(&TypeId::OBJECT))
            .cloned()
            .unwrap_or_else(|| {
                Arc::new(TypeObject::new_builtin(
                    TypeId::OBJECT,
                    "object",
                    &[],
                    TypeFlags::BASETYPE,
                ))
            })
    }

    /// Check if a type is registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.types.read().contains_key(&type_id)
    }

    /// Get the number of registered types.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register the builtin type hierarchy.
    fn init_builtin_types(&self) {
        let base = TypeFlags::BASETYPE;
        let function = TypeFlags::BASE_FUNCTION | TypeFlags::METHOD_DESCRIPTOR;

        let object = self.add_builtin(TypeId::OBJECT, "object", &[], base);
        self.add_builtin(TypeId::TYPE, "type", &[object.clone()], base);
        self.add_builtin(TypeId::NONE, "NoneType", &[object.clone()], TypeFlags::empty());
        let int = self.add_builtin(TypeId::INT, "int", &[object.clone()], base);
        self.add_builtin(TypeId::BOOL, "bool", &[int], TypeFlags::empty());
        self.add_builtin(TypeId::FLOAT, "float", &[object.clone()], base);
        self.add_builtin(TypeId::STR, "str", &[object.clone()], base);
        self.add_builtin(TypeId::TUPLE, "tuple", &[object.clone()], base);
        self.add_builtin(TypeId::DICT, "dict", &[object.clone()], base);
        self.add_builtin(TypeId::MODULE, "module", &[object.clone()], base);
        self.add_builtin(TypeId::CODE, "code", &[object.clone()], TypeFlags::empty());

        let base_function = self.add_builtin(
            TypeId::BASE_FUNCTION,
            "base_function",
            &[object.clone()],
            function | base,
        );
        self.add_builtin(
            TypeId::BUILTIN_FUNCTION,
            "builtin_function_or_method",
            &[base_function.clone()],
            function,
        );
        let defined = self.add_builtin(
            TypeId::DEFINED_FUNCTION,
            "defined_function",
            &[base_function.clone()],
            function,
        );
        self.add_builtin(TypeId::FUNCTION, "function", &[defined.clone()], function);
        self.add_builtin(TypeId::CFUNCTION, "cfunction", &[defined], function);
        // Bound methods never re-bind, so no METHOD_DESCRIPTOR here.
        self.add_builtin(
            TypeId::METHOD,
            "method",
            &[base_function],
            TypeFlags::BASE_FUNCTION,
        );
        self.add_builtin(
            TypeId::NATIVE_CALLABLE,
            "native_callable",
            &[object],
            TypeFlags::empty(),
        );
    }

    fn add_builtin(
        &self,
        id: TypeId,
        name: &str,
        bases: &[Arc<TypeObject>],
        flags: TypeFlags,
    ) -> Arc<TypeObject> {
        let ty = Arc::new(TypeObject::new_builtin(id, name, bases, flags));
        self.register(Arc::clone(&ty));
        ty
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Global Registry Access
// =============================================================================

/// Global type registry singleton.
static GLOBAL_REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

/// Get the global type registry, registering builtin types on first use.
pub fn global_registry() -> &'static TypeRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        let registry = TypeRegistry::new();
        registry.init_builtin_types();
        registry
    })
}

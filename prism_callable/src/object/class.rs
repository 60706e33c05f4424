//! Class attribute storage and method resolution order.
//!
//! `ClassDict` holds the attributes of a type (methods, class variables).
//! `compute_c3_mro` linearizes the base classes of a new type.

use crate::object::type_obj::TypeObject;
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

// =============================================================================
// Class Dictionary
// =============================================================================

/// Class attribute dictionary (methods, class variables).
///
/// Uses FxHashMap for fast lookup with string keys.
#[derive(Debug, Default)]
pub struct ClassDict {
    attrs: RwLock<FxHashMap<Arc<str>, Value>>,
}

impl ClassDict {
    /// Create a new empty class dict.
    pub fn new() -> Self {
        Self {
            attrs: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get an attribute.
    #[inline]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.attrs.read().get(name).cloned()
    }

    /// Set an attribute.
    #[inline]
    pub fn set(&self, name: Arc<str>, value: Value) {
        self.attrs.write().insert(name, value);
    }

    /// Delete an attribute.
    #[inline]
    pub fn delete(&self, name: &str) -> Option<Value> {
        self.attrs.write().remove(name)
    }

    /// Check if attribute exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.read().contains_key(name)
    }

    /// Get all attribute names.
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.attrs.read().keys().cloned().collect()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.attrs.read().is_empty()
    }
}

// =============================================================================
// C3 Linearization
// =============================================================================

/// Linearized ancestors of a type, excluding the type itself.
pub type Mro = SmallVec<[Arc<TypeObject>; 8]>;

/// MRO computation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MroError {
    /// Names of the bases that could not be ordered.
    pub conflicting: Vec<Arc<str>>,
}

impl std::fmt::Display for MroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cannot create a consistent method resolution order (MRO) for bases {}",
            self.conflicting.join(", ")
        )
    }
}

/// Compute the C3 linearization of `bases`.
///
/// The result lists every ancestor once, most derived first, and does not
/// include the new type itself.
pub fn compute_c3_mro(bases: &[Arc<TypeObject>]) -> Result<Mro, MroError> {
    let mut sequences: Vec<Vec<Arc<TypeObject>>> = bases
        .iter()
        .map(|base| {
            let mut seq = Vec::with_capacity(base.mro().len() + 1);
            seq.push(Arc::clone(base));
            seq.extend(base.mro().iter().cloned());
            seq
        })
        .collect();
    sequences.push(bases.to_vec());

    let mut result = Mro::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        // A good head appears in no sequence tail.
        let candidate = sequences.iter().map(|seq| &seq[0]).find(|head| {
            !sequences
                .iter()
                .any(|seq| seq[1..].iter().any(|t| t.id() == head.id()))
        });

        let Some(next) = candidate.cloned() else {
            let mut conflicting: Vec<Arc<str>> =
                sequences.iter().map(|seq| seq[0].name().clone()).collect();
            conflicting.dedup();
            return Err(MroError { conflicting });
        };

        for seq in sequences.iter_mut() {
            if seq[0].id() == next.id() {
                seq.remove(0);
            }
        }
        result.push(next);
    }
}

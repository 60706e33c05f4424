//! Tuple object implementation.
//!
//! Immutable sequence type with fixed size. Used for positional argument
//! packs, `__defaults__` and captured closure cells.

use crate::object::type_obj::TypeId;
use crate::object::{ObjectHeader, PyObject};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// Tuple object.
#[derive(Debug)]
pub struct TupleObject {
    header: ObjectHeader,
    /// Tuple items (immutable after creation).
    items: Box<[Value]>,
}

impl TupleObject {
    /// Create an empty tuple.
    #[inline]
    pub fn empty() -> Self {
        Self {
            header: ObjectHeader::new(TypeId::TUPLE),
            items: Box::new([]),
        }
    }

    /// Create a tuple from a slice.
    #[inline]
    pub fn from_slice(items: &[Value]) -> Self {
        Self {
            header: ObjectHeader::new(TypeId::TUPLE),
            items: items.into(),
        }
    }

    /// Create a tuple from a Vec.
    #[inline]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            header: ObjectHeader::new(TypeId::TUPLE),
            items: items.into_boxed_slice(),
        }
    }

    /// Get the length.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by index (supports negative indexing).
    #[inline]
    pub fn get(&self, index: i64) -> Option<&Value> {
        let idx = self.normalize_index(index)?;
        self.items.get(idx)
    }

    /// Get the underlying slice.
    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Iterate over items.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    /// Create a new tuple by concatenating with another.
    pub fn concat(&self, other: &TupleObject) -> TupleObject {
        let mut items = Vec::with_capacity(self.len() + other.len());
        items.extend_from_slice(&self.items);
        items.extend_from_slice(&other.items);
        TupleObject::from_vec(items)
    }

    #[inline]
    fn normalize_index(&self, index: i64) -> Option<usize> {
        let len = self.items.len() as i64;
        let idx = if index < 0 { len + index } else { index };
        if idx >= 0 && idx < len {
            Some(idx as usize)
        } else {
            None
        }
    }
}

impl FromIterator<Value> for TupleObject {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl PyObject for TupleObject {
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
        let parts: Vec<String> = self.items.iter().map(Value::repr).collect();
        if parts.len() == 1 {
            format!("({},)", parts[0])
        } else {
            format!("({})", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_indexing() {
        let t = TupleObject::from_vec(vec![Value::int(1), Value::int(2), Value::int(3)]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(0), Some(&Value::int(1)));
        assert_eq!(t.get(-1), Some(&Value::int(3)));
        assert_eq!(t.get(3), None);
        assert_eq!(t.get(-4), None);
    }

    #[test]
    fn test_tuple_concat() {
        let a = TupleObject::from_slice(&[Value::int(1)]);
        let b = TupleObject::from_slice(&[Value::int(2)]);
        assert_eq!(a.concat(&b).as_slice(), &[Value::int(1), Value::int(2)]);
    }

    #[test]
    fn test_tuple_repr() {
        assert_eq!(TupleObject::empty().repr(), "()");
        assert_eq!(TupleObject::from_slice(&[Value::int(1)]).repr(), "(1,)");
        let t: TupleObject = [Value::int(1), Value::str("a")].into_iter().collect();
        assert_eq!(t.repr(), "(1, 'a')");
    }
}

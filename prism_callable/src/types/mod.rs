//! Builtin object types used by the call layer.

pub mod closure;
pub mod dict;
pub mod function;
pub mod tuple;

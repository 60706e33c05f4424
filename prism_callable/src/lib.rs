//! Unified callable object model for the Prism runtime.
//!
//! This crate provides:
//! - The base function record shared by every callable kind
//! - Descriptor binding of methods on instance access
//! - Default dispatch through the native calling conventions
//! - Host-language functions with keyword argument binding
//! - Natively-defined callables with inline dispatch entries
//! - Bound-call wrappers
//! - Materialization of static method tables onto types and modules
//! - The object substrate these rest on (values, types, registry, tuples, dicts)

#![deny(unsafe_op_in_unsafe_fn)]

pub mod code;
pub mod config;
pub mod error;
pub mod object;
pub mod profile;
pub mod thread_state;
pub mod types;
pub mod value;

// Re-export commonly used items
pub use code::{CodeBody, CodeFlags, CodeObject, Frame};
pub use config::{RuntimeConfig, config, init_config};
pub use error::{CallError, CallResult, ErrorKind};
pub use object::attr::{get_attribute, set_attribute};
pub use object::call::{CallContext, call_function, call_method, call_object};
pub use object::registry::{TypeRegistry, global_registry};
pub use object::type_obj::{TypeFlags, TypeId, TypeObject};
pub use object::{ObjectHeader, ObjectRef, PyObject};
pub use profile::{ProfileEvent, ProfileFn, ProfileHook};
pub use thread_state::{CallStats, call_stats, clear_profile_hook, reset_call_stats, set_profile_hook};
pub use types::function::{
    ArgsView, CallConvention, FunctionObject, MethodDef, MethodFlags, MethodRef, NativeEntry,
    add_methods_to_module, add_methods_to_type, builtin_function_new, cfunction_new, cmethod_new,
    descr_get, function_new, function_new_with_closure, function_new_with_qualname,
    is_base_function, is_builtin_function, is_cfunction, is_defined_function, is_function,
    is_method, method_new,
};
pub use value::Value;

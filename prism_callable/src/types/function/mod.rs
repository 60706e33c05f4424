//! Callable objects.
//!
//! Every callable kind shares the [`FunctionObject`] record and is invoked
//! through the default [`dispatch`](dispatch::dispatch):
//!
//! | Kind | Type | Entry |
//! |------|------|-------|
//! | builtin function | `builtin_function_or_method` | static table |
//! | cfunction | `cfunction` | static table or inline |
//! | host-language function | `function` | [`PY_FUNCTION_DEF`] |
//! | bound method | `method` | wrapped entry or [`GENERIC_METHOD_DEF`] |

pub mod attrs;
pub mod base;
pub mod binding;
pub mod defined;
pub mod descr;
pub mod dispatch;
pub mod materialize;
pub mod method;
pub mod method_def;
pub mod native;

pub use attrs::{get_function_attr, set_function_attr};
pub use base::{
    FunctionObject, WeakRefList, as_base_function, is_base_function, is_builtin_function,
    is_cfunction, is_defined_function, is_function, is_method,
};
pub use binding::{ArgumentBinder, BindingError, BoundArguments};
pub use defined::{
    FunctionMeta, PY_FUNCTION_DEF, function_new, function_new_with_closure,
    function_new_with_qualname,
};
pub use descr::descr_get;
pub use materialize::{add_methods_to_module, add_methods_to_type};
pub use method::{GENERIC_METHOD_DEF, method_eq, method_new};
pub use method_def::{ArgsView, CallConvention, MethodDef, MethodFlags, MethodRef, NativeEntry};
pub use native::{builtin_function_new, cfunction_new, cmethod_new};

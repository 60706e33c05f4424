//! Materialization of static dispatch tables onto types and modules.
//!
//! Each entry becomes one natively-defined callable registered under its
//! name. Tables are validated as a whole before anything is registered, so
//! a rejected table leaves the target untouched.

use crate::config::config;
use crate::error::{CallError, CallResult};
use crate::object::module::ModuleObject;
use crate::object::type_obj::TypeObject;
use crate::types::function::method_def::{MethodDef, MethodFlags};
use crate::types::function::native::{cfunction_new, cmethod_new};
use crate::value::Value;
use std::sync::Arc;

/// Whether the entry is materialized by the declaring component itself.
#[inline]
fn is_custom(def: &MethodDef) -> bool {
    def.flags().contains(MethodFlags::CUSTOM)
}

fn validate_table(defs: &[MethodDef], module_scoped: bool) -> CallResult<()> {
    for def in defs.iter().filter(|def| !is_custom(def)) {
        if module_scoped && def.flags().contains(MethodFlags::CLASS) {
            tracing::warn!(name = def.name(), "rejected class method in module table");
            return Err(CallError::InvalidMethodDef {
                name: Arc::from(def.name()),
                reason: "CLASS is not valid for module-level functions",
            });
        }
        if config().check_method_flags {
            if let Err(err) = def.validate() {
                tracing::warn!(name = def.name(), flags = def.flags().bits(), "rejected malformed method entry");
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Register one callable per entry of `defs` on `ty`.
///
/// Entries are declared on `ty` (their owner class), except `STATIC` ones,
/// which have none. Nothing is bound here: `CLASS` entries bind to the
/// accessing class on attribute access. An existing attribute is kept unless
/// the entry carries `COEXIST`. Returns the number of attributes registered.
pub fn add_methods_to_type(ty: &Arc<TypeObject>, defs: &'static [MethodDef]) -> CallResult<usize> {
    validate_table(defs, false)?;

    let mut added = 0;
    for def in defs {
        if is_custom(def) {
            tracing::debug!(ty = %ty.name(), name = def.name(), "skipping custom entry");
            continue;
        }
        let flags = def.flags();
        if ty.dict().contains(def.name()) && !flags.contains(MethodFlags::COEXIST) {
            tracing::debug!(ty = %ty.name(), name = def.name(), "keeping existing attribute");
            continue;
        }

        let callable = if flags.contains(MethodFlags::STATIC) {
            cfunction_new(def, None, None)
        } else {
            cmethod_new(def, None, None, Some(Arc::clone(ty)))?
        };
        ty.dict().set(Arc::from(def.name()), callable);
        added += 1;
    }

    tracing::debug!(ty = %ty.name(), added, total = defs.len(), "materialized type methods");
    Ok(added)
}

/// Register one callable per entry of `defs` on `module`.
///
/// Entries are bound to the module unless `STATIC`. `CLASS` entries are
/// rejected. An existing attribute is kept unless the entry carries
/// `COEXIST`. Returns the number of attributes registered.
pub fn add_methods_to_module(module: &Value, defs: &'static [MethodDef]) -> CallResult<usize> {
    let Some(module_obj) = module.downcast_ref::<ModuleObject>() else {
        return Err(CallError::type_error(format!(
            "expected a module, not {}",
            module.type_name()
        )));
    };
    validate_table(defs, true)?;

    let module_name = Value::Str(Arc::clone(module_obj.name()));
    let mut added = 0;
    for def in defs {
        if is_custom(def) {
            tracing::debug!(module = %module_obj.name(), name = def.name(), "skipping custom entry");
            continue;
        }
        let flags = def.flags();
        if module_obj.get_attr(def.name()).is_some() && !flags.contains(MethodFlags::COEXIST) {
            tracing::debug!(module = %module_obj.name(), name = def.name(), "keeping existing attribute");
            continue;
        }

        let receiver = (!flags.contains(MethodFlags::STATIC)).then(|| module.clone());
        let callable = cfunction_new(def, receiver, Some(module_name.clone()));
        module_obj.set_attr(Arc::from(def.name()), callable);
        added += 1;
    }

    tracing::debug!(module = %module_obj.name(), added, total = defs.len(), "materialized module functions");
    Ok(added)
}

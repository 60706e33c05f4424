//! Default dispatch of base functions.
//!
//! Every invocation of a base function passes through [`dispatch`]:
//!
//! 1. Owner-class check on the implicit receiver (unbound methods only)
//! 2. Calling-convention decode from the entry flags
//! 3. Leading-argument selection
//! 4. Per-convention argument checks and invocation
//!
//! Native entries are bracketed by `c_call`/`c_return` profile events.
//! Entries flagged `PYTHON` report their own `call`/`return` events.

use crate::error::{CallError, CallResult};
use crate::object::call::CallContext;
use crate::object::type_obj::TypeObject;
use crate::profile::ProfileEvent;
use crate::thread_state::{emit_profile, enter_call, record_dispatch, record_rejected};
use crate::types::dict::DictObject;
use crate::types::function::base::FunctionObject;
use crate::types::function::method_def::{ArgsView, CallConvention, MethodDef, MethodFlags, NativeEntry};
use crate::types::tuple::TupleObject;
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

static NONE: Value = Value::None;

/// Invoke `func`, which is the base function held by `callable`.
pub fn dispatch(callable: &Value, func: &FunctionObject, ctx: CallContext<'_>) -> CallResult<Value> {
    let def = func.method_def();
    let flags = def.flags();

    if let Err(err) = check_receiver(func, ctx.args) {
        record_rejected();
        return Err(err);
    }

    let convention = match checked_convention(def) {
        Ok(convention) => convention,
        Err(err) => {
            record_rejected();
            return Err(err);
        }
    };

    let (lead, args) = leading_argument(callable, func, ctx.args);

    if let Err(err) = check_arguments(def, convention, args.len(), ctx.kwargs.len()) {
        record_rejected();
        return Err(err);
    }

    let _guard = enter_call(def.name())?;
    record_dispatch(convention);
    tracing::trace!(
        name = def.name(),
        ?convention,
        nargs = args.len(),
        nkw = ctx.kwargs.len(),
        "dispatch"
    );

    if flags.contains(MethodFlags::PYTHON) {
        return invoke(def.entry(), lead, args, ctx.kwargs);
    }

    emit_profile(ProfileEvent::CCall, def.name());
    let result = invoke(def.entry(), lead, args, ctx.kwargs);
    let event = if result.is_ok() {
        ProfileEvent::CReturn
    } else {
        ProfileEvent::CException
    };
    emit_profile(event, def.name());
    result
}

/// Decode the convention and make sure the entry point was written for it.
fn checked_convention(def: &MethodDef) -> CallResult<CallConvention> {
    match def.flags().convention() {
        Some(convention) if convention == def.entry().convention() => Ok(convention),
        _ => Err(CallError::BadCallFlags {
            name: Arc::from(def.name()),
            flags: def.flags().bits(),
        }),
    }
}

/// Verify the implicit receiver of an unbound method against its owner class.
pub(crate) fn check_receiver(func: &FunctionObject, args: &[Value]) -> CallResult<()> {
    let Some(owner) = func.objclass() else {
        return Ok(());
    };
    if func.receiver().is_some() {
        return Ok(());
    }

    let name = func.method_def().name();
    let Some(first) = args.first() else {
        return Err(CallError::MissingSelf {
            name: Arc::from(name),
            owner: owner.name().clone(),
        });
    };
    check_self_type(func.method_def(), owner, first)
}

/// Whether `receiver` may be bound to `def` declared on `owner`.
///
/// `CLASS` entries take a type that is a subclass of the owner; everything
/// else takes an instance.
pub(crate) fn check_self_type(
    def: &MethodDef,
    owner: &Arc<TypeObject>,
    receiver: &Value,
) -> CallResult<()> {
    let conforms = if def.flags().contains(MethodFlags::CLASS) {
        receiver
            .downcast_ref::<TypeObject>()
            .is_some_and(|ty| ty.is_subtype(owner))
    } else {
        receiver.is_instance(owner)
    };
    if conforms {
        return Ok(());
    }
    Err(CallError::WrongSelfType {
        name: Arc::from(def.name()),
        owner: owner.name().clone(),
        actual: receiver.type_name(),
    })
}

/// Choose the leading argument and the remaining positional arguments.
///
/// `PASS_FUNCTION` entries lead with the callable itself and receive the
/// positional arguments untouched; they fetch any bound receiver from it.
fn leading_argument<'a>(
    callable: &'a Value,
    func: &'a FunctionObject,
    args: &'a [Value],
) -> (&'a Value, &'a [Value]) {
    let flags = func.flags();
    if flags.contains(MethodFlags::PASS_FUNCTION) {
        return (callable, args);
    }
    match func.receiver() {
        Some(receiver) => (receiver, args),
        None if func.objclass().is_some() && !flags.contains(MethodFlags::NO_SELF_SLICING) => {
            match args.split_first() {
                Some((first, rest)) => (first, rest),
                None => (&NONE, args),
            }
        }
        None => (&NONE, args),
    }
}

fn check_arguments(
    def: &MethodDef,
    convention: CallConvention,
    nargs: usize,
    nkwargs: usize,
) -> CallResult<()> {
    if nkwargs > 0 && !convention.accepts_keywords() {
        return Err(CallError::NoKeywordArguments {
            name: Arc::from(def.name()),
        });
    }
    match convention {
        CallConvention::NoArgs if nargs != 0 => Err(CallError::TakesNoArguments {
            name: Arc::from(def.name()),
            given: nargs,
        }),
        CallConvention::Single if nargs != 1 => Err(CallError::TakesOneArgument {
            name: Arc::from(def.name()),
            given: nargs,
        }),
        _ => Ok(()),
    }
}

fn invoke(
    entry: &NativeEntry,
    lead: &Value,
    args: &[Value],
    kwargs: &[(Arc<str>, Value)],
) -> CallResult<Value> {
    match entry {
        NativeEntry::NoArgs(f) => f(lead),
        NativeEntry::Single(f) => f(lead, &args[0]),
        NativeEntry::VarArgs(f) => f(lead, &TupleObject::from_slice(args)),
        NativeEntry::VarArgsKeywords(f) => {
            let tuple = TupleObject::from_slice(args);
            let dict = (!kwargs.is_empty()).then(|| DictObject::from_pairs(kwargs.iter().cloned()));
            f(lead, &tuple, dict.as_ref())
        }
        NativeEntry::Fast(f) => f(lead, args),
        NativeEntry::FastKeywords(f) => {
            if kwargs.is_empty() {
                return f(lead, ArgsView::new(args, &[]));
            }
            let mut values: SmallVec<[Value; 8]> = SmallVec::with_capacity(args.len() + kwargs.len());
            values.extend(args.iter().cloned());
            let mut names: SmallVec<[Arc<str>; 4]> = SmallVec::with_capacity(kwargs.len());
            for (name, value) in kwargs {
                values.push(value.clone());
                names.push(Arc::clone(name));
            }
            f(lead, ArgsView::new(&values, &names))
        }
    }
}

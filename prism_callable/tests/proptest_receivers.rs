//! Property-based tests for receiver handling.
//!
//! For arbitrary receivers and argument lists, an unbound method declared
//! on a class accepts exactly the instances of that class (and its
//! subclasses), and binding an already-bound callable is the identity.

use prism_callable::object::instance::InstanceObject;
use prism_callable::types::tuple::TupleObject;
use prism_callable::{
    CallError, CallResult, MethodDef, MethodFlags, NativeEntry, TypeObject, Value,
    add_methods_to_type, call_object, descr_get, method_new,
};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

fn record(lead: &Value, args: &[Value]) -> CallResult<Value> {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(lead.clone());
    items.extend_from_slice(args);
    Ok(Value::object(Arc::new(TupleObject::from_vec(items))))
}

static TABLE: [MethodDef; 2] = [
    MethodDef::new("record", NativeEntry::Fast(record), MethodFlags::FASTCALL),
    MethodDef::new(
        "raw",
        NativeEntry::Fast(record),
        MethodFlags::FASTCALL.union(MethodFlags::PASS_FUNCTION),
    ),
];

/// Receiver shapes relative to the declaring class.
#[derive(Debug, Clone)]
enum Receiver {
    Int(i64),
    Str(String),
    None,
    Owner,
    Subclass,
    Unrelated,
}

impl Receiver {
    fn conforms(&self) -> bool {
        matches!(self, Receiver::Owner | Receiver::Subclass)
    }
}

struct Fixture {
    owner: Arc<TypeObject>,
    subclass: Arc<TypeObject>,
    unrelated: Arc<TypeObject>,
}

impl Fixture {
    fn new() -> Self {
        let owner = TypeObject::new_heap("Owner", &[]).unwrap();
        add_methods_to_type(&owner, &TABLE).unwrap();
        let subclass = TypeObject::new_heap("Subclass", &[Arc::clone(&owner)]).unwrap();
        let unrelated = TypeObject::new_heap("Unrelated", &[]).unwrap();
        Self {
            owner,
            subclass,
            unrelated,
        }
    }

    fn make(&self, receiver: &Receiver) -> Value {
        match receiver {
            Receiver::Int(i) => Value::int(*i),
            Receiver::Str(s) => Value::str(s),
            Receiver::None => Value::none(),
            Receiver::Owner => InstanceObject::new_value(&self.owner),
            Receiver::Subclass => InstanceObject::new_value(&self.subclass),
            Receiver::Unrelated => InstanceObject::new_value(&self.unrelated),
        }
    }

    fn method(&self, name: &str) -> Value {
        self.owner.dict().get(name).unwrap()
    }
}

fn receiver_strategy() -> impl Strategy<Value = Receiver> {
    prop_oneof![
        any::<i64>().prop_map(Receiver::Int),
        "[a-z]{0,8}".prop_map(Receiver::Str),
        Just(Receiver::None),
        Just(Receiver::Owner),
        Just(Receiver::Subclass),
        Just(Receiver::Unrelated),
    ]
}

fn args_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i64>(), 0..6)
}

fn items(value: &Value) -> Vec<Value> {
    value
        .downcast_ref::<TupleObject>()
        .map(|tuple| tuple.as_slice().to_vec())
        .unwrap_or_default()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn zero_arguments_always_missing_self(name in prop_oneof![Just("record"), Just("raw")]) {
        let fixture = Fixture::new();
        let err = call_object(&fixture.method(name), &[], &[]).unwrap_err();
        prop_assert!(matches!(err, CallError::MissingSelf { .. }), "got {err}");
    }

    #[test]
    fn receiver_accepted_iff_instance(receiver in receiver_strategy(), rest in args_strategy()) {
        let fixture = Fixture::new();
        let recv = fixture.make(&receiver);
        let mut args = vec![recv.clone()];
        args.extend(rest.iter().copied().map(Value::int));

        let result = call_object(&fixture.method("record"), &args, &[]);
        if receiver.conforms() {
            let result = items(&result.unwrap());
            prop_assert_eq!(result.len(), rest.len() + 1);
            prop_assert!(result[0].is(&recv));
            for (got, want) in result[1..].iter().zip(&rest) {
                prop_assert_eq!(got.as_int(), Some(*want));
            }
        } else {
            let err = result.unwrap_err();
            prop_assert!(matches!(err, CallError::WrongSelfType { .. }), "got {err}");
        }
    }

    #[test]
    fn pass_function_never_slices(receiver in receiver_strategy(), rest in args_strategy()) {
        prop_assume!(receiver.conforms());
        let fixture = Fixture::new();
        let method = fixture.method("raw");
        let recv = fixture.make(&receiver);
        let mut args = vec![recv.clone()];
        args.extend(rest.iter().copied().map(Value::int));

        let result = items(&call_object(&method, &args, &[]).unwrap());
        prop_assert_eq!(result.len(), args.len() + 1);
        prop_assert!(result[0].is(&method));
        prop_assert!(result[1].is(&recv));
    }

    #[test]
    fn wrapper_receiver_check_matches_dispatch(receiver in receiver_strategy()) {
        let fixture = Fixture::new();
        let recv = fixture.make(&receiver);
        let wrapped = method_new(fixture.method("record"), recv);
        prop_assert_eq!(wrapped.is_ok(), receiver.conforms());
    }

    #[test]
    fn binding_bound_is_identity(first in receiver_strategy(), second in receiver_strategy()) {
        prop_assume!(first.conforms());
        let fixture = Fixture::new();
        let bound = method_new(fixture.method("record"), fixture.make(&first)).unwrap();
        let other = fixture.make(&second);

        let again = descr_get(&bound, Some(&other), Some(&fixture.owner)).unwrap();
        prop_assert!(again.is(&bound));
    }
}

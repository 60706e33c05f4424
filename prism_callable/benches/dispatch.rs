//! Call Dispatch Performance Benchmarks
//!
//! Measures the overhead the default dispatch adds on top of the native
//! entry point for each calling convention and binding path.
//!
//! # Benchmark Categories
//!
//! 1. **Conventions**: NOARGS, O, FASTCALL and FASTCALL | KEYWORDS entries
//! 2. **Receivers**: unbound method with self slicing vs direct bound wrapper
//!    vs generic wrapper around a native closure
//! 3. **Host-language functions**: argument binding with defaults and keywords
//! 4. **Method calls**: `call_method` vs attribute lookup plus call

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use prism_callable::code::{CodeObject, Frame};
use prism_callable::object::instance::InstanceObject;
use prism_callable::object::module::ModuleObject;
use prism_callable::types::closure::NativeClosure;
use prism_callable::types::function::{ArgsView, MethodDef, MethodFlags, NativeEntry};
use prism_callable::{
    CallResult, TypeObject, Value, add_methods_to_type, builtin_function_new, call_method,
    call_object, function_new, get_attribute, method_new,
};
use std::sync::Arc;

// =============================================================================
// Benchmark Helpers
// =============================================================================

fn noargs(lead: &Value) -> CallResult<Value> {
    Ok(lead.clone())
}

fn single(_lead: &Value, arg: &Value) -> CallResult<Value> {
    Ok(arg.clone())
}

fn fast(_lead: &Value, args: &[Value]) -> CallResult<Value> {
    Ok(Value::int(args.len() as i64))
}

fn fast_kw(_lead: &Value, view: ArgsView<'_>) -> CallResult<Value> {
    Ok(Value::int(view.values().len() as i64))
}

static NOARGS: MethodDef = MethodDef::new("noargs", NativeEntry::NoArgs(noargs), MethodFlags::NOARGS);
static SINGLE: MethodDef = MethodDef::new("single", NativeEntry::Single(single), MethodFlags::O);
static FAST: MethodDef = MethodDef::new("fast", NativeEntry::Fast(fast), MethodFlags::FASTCALL);
static FAST_KW: MethodDef = MethodDef::new(
    "fast_kw",
    NativeEntry::FastKeywords(fast_kw),
    MethodFlags::FASTCALL.union(MethodFlags::KEYWORDS),
);

static TYPE_TABLE: [MethodDef; 1] = [MethodDef::new("fast", NativeEntry::Fast(fast), MethodFlags::FASTCALL)];

fn args(n: usize) -> Vec<Value> {
    (0..n).map(|i| Value::int(i as i64)).collect()
}

// =============================================================================
// Convention Benchmarks
// =============================================================================

fn bench_conventions(c: &mut Criterion) {
    let mut group = c.benchmark_group("conventions");

    let f = builtin_function_new(&NOARGS, None, None);
    group.bench_function("noargs", |b| b.iter(|| black_box(call_object(&f, &[], &[]))));

    let f = builtin_function_new(&SINGLE, None, None);
    let one = args(1);
    group.bench_function("single", |b| b.iter(|| black_box(call_object(&f, &one, &[]))));

    let f = builtin_function_new(&FAST, None, None);
    for n in [0usize, 2, 8] {
        let values = args(n);
        group.bench_with_input(BenchmarkId::new("fastcall", n), &values, |b, values| {
            b.iter(|| black_box(call_object(&f, values, &[])))
        });
    }

    let f = builtin_function_new(&FAST_KW, None, None);
    let positional = args(2);
    let kwargs: Vec<(Arc<str>, Value)> = vec![(Arc::from("a"), Value::int(1)), (Arc::from("b"), Value::int(2))];
    group.bench_function("fastcall_keywords", |b| {
        b.iter(|| black_box(call_object(&f, &positional, &kwargs)))
    });

    group.finish();
}

// =============================================================================
// Receiver Benchmarks
// =============================================================================

fn bench_receivers(c: &mut Criterion) {
    let mut group = c.benchmark_group("receivers");

    let ty = TypeObject::new_heap("Bench", &[]).unwrap();
    add_methods_to_type(&ty, &TYPE_TABLE).unwrap();
    let inst = InstanceObject::new_value(&ty);
    let unbound = ty.dict().get("fast").unwrap();

    let sliced = vec![inst.clone(), Value::int(1), Value::int(2)];
    group.bench_function("unbound_self_slicing", |b| {
        b.iter(|| black_box(call_object(&unbound, &sliced, &[])))
    });

    let bound = method_new(unbound.clone(), inst.clone()).unwrap();
    let rest = args(2);
    group.bench_function("direct_wrapper", |b| {
        b.iter(|| black_box(call_object(&bound, &rest, &[])))
    });

    let closure = Value::object(Arc::new(NativeClosure::new("closure", |args, _| {
        Ok(Value::int(args.len() as i64))
    })));
    let generic = method_new(closure, inst.clone()).unwrap();
    group.bench_function("generic_wrapper", |b| {
        b.iter(|| black_box(call_object(&generic, &rest, &[])))
    });

    group.bench_function("call_method", |b| {
        b.iter(|| black_box(call_method(&inst, "fast", &rest, &[])))
    });

    group.bench_function("getattr_then_call", |b| {
        b.iter(|| {
            let method = get_attribute(&inst, "fast").unwrap();
            black_box(call_object(&method, &rest, &[]))
        })
    });

    group.finish();
}

// =============================================================================
// Host-Language Function Benchmarks
// =============================================================================

fn bench_defined(c: &mut Criterion) {
    let mut group = c.benchmark_group("defined_function");

    let code = Arc::new(
        CodeObject::new("f", &["a", "b", "c"], Arc::new(|frame: &Frame| Ok(frame.args()[0].clone())))
            .with_kwonly(&["key"]),
    );
    let f = function_new(code, ModuleObject::new("bench").globals()).unwrap();
    let func = f.downcast_ref::<prism_callable::FunctionObject>().unwrap();
    let meta = func.meta().unwrap();
    meta.set_defaults(Some(Arc::new(prism_callable::types::tuple::TupleObject::from_vec(vec![
        Value::int(2),
        Value::int(3),
    ]))));
    meta.set_kwdefaults(Some(Arc::new(prism_callable::types::dict::DictObject::from_pairs([(
        Arc::from("key"),
        Value::none(),
    )]))));

    let positional = args(3);
    group.bench_function("positional", |b| {
        b.iter(|| black_box(call_object(&f, &positional, &[])))
    });

    let one = args(1);
    group.bench_function("defaults", |b| b.iter(|| black_box(call_object(&f, &one, &[]))));

    let kwargs: Vec<(Arc<str>, Value)> = vec![(Arc::from("c"), Value::int(9)), (Arc::from("key"), Value::int(1))];
    group.bench_function("keywords", |b| {
        b.iter(|| black_box(call_object(&f, &one, &kwargs)))
    });

    group.finish();
}

criterion_group!(benches, bench_conventions, bench_receivers, bench_defined);
criterion_main!(benches);

//! Per-thread call state: recursion depth, profile hook and dispatch counters.

use crate::config::config;
use crate::error::{CallError, CallResult};
use crate::profile::{ProfileEvent, ProfileFn, ProfileHook};
use crate::types::function::method_def::CallConvention;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::sync::Arc;

// =============================================================================
// Statistics
// =============================================================================

/// Dispatch statistics for profiling, per thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    /// Calls through `NOARGS` entries.
    pub no_args_calls: u64,
    /// Calls through `O` entries.
    pub single_calls: u64,
    /// Calls through `VARARGS` entries.
    pub varargs_calls: u64,
    /// Calls through `VARARGS | KEYWORDS` entries.
    pub varargs_keywords_calls: u64,
    /// Calls through `FASTCALL` entries.
    pub fast_calls: u64,
    /// Calls through `FASTCALL | KEYWORDS` entries.
    pub fast_keywords_calls: u64,
    /// Calls rejected before reaching the entry point.
    pub rejected_calls: u64,
}

impl CallStats {
    /// Total dispatched calls.
    pub fn total(&self) -> u64 {
        self.no_args_calls
            + self.single_calls
            + self.varargs_calls
            + self.varargs_keywords_calls
            + self.fast_calls
            + self.fast_keywords_calls
    }

    fn record(&mut self, convention: CallConvention) {
        let counter = match convention {
            CallConvention::NoArgs => &mut self.no_args_calls,
            CallConvention::Single => &mut self.single_calls,
            CallConvention::VarArgs => &mut self.varargs_calls,
            CallConvention::VarArgsKeywords => &mut self.varargs_keywords_calls,
            CallConvention::Fast => &mut self.fast_calls,
            CallConvention::FastKeywords => &mut self.fast_keywords_calls,
        };
        *counter += 1;
    }
}

// =============================================================================
// Thread State
// =============================================================================

struct ThreadState {
    depth: Cell<u32>,
    limit: Cell<u32>,
    profile: RefCell<ProfileHook>,
    stats: Cell<CallStats>,
}

impl ThreadState {
    fn new() -> Self {
        Self {
            depth: Cell::new(0),
            limit: Cell::new(config().recursion_limit),
            profile: RefCell::new(ProfileHook::new()),
            stats: Cell::new(CallStats::default()),
        }
    }
}

thread_local! {
    static THREAD_STATE: ThreadState = ThreadState::new();
}

/// Decrements the call depth when dropped.
#[must_use]
pub struct CallDepthGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for CallDepthGuard {
    fn drop(&mut self) {
        THREAD_STATE.with(|state| state.depth.set(state.depth.get().saturating_sub(1)));
    }
}

/// Enter one level of call nesting.
pub fn enter_call(name: &str) -> CallResult<CallDepthGuard> {
    THREAD_STATE.with(|state| {
        let depth = state.depth.get();
        let limit = state.limit.get();
        if depth >= limit {
            return Err(CallError::RecursionLimit {
                name: Arc::from(name),
                limit,
            });
        }
        state.depth.set(depth + 1);
        Ok(CallDepthGuard {
            _not_send: PhantomData,
        })
    })
}

/// Current call depth on this thread.
pub fn call_depth() -> u32 {
    THREAD_STATE.with(|state| state.depth.get())
}

/// Recursion limit on this thread.
pub fn recursion_limit() -> u32 {
    THREAD_STATE.with(|state| state.limit.get())
}

/// Set the recursion limit for this thread. Zero is ignored.
pub fn set_recursion_limit(limit: u32) {
    if limit > 0 {
        THREAD_STATE.with(|state| state.limit.set(limit));
    }
}

/// Install a profile function on this thread.
pub fn set_profile_hook(func: ProfileFn) {
    THREAD_STATE.with(|state| state.profile.borrow_mut().set(func));
}

/// Remove the profile function from this thread.
pub fn clear_profile_hook() {
    THREAD_STATE.with(|state| state.profile.borrow_mut().clear());
}

/// Report a profile event.
///
/// The hook is cloned out before it runs so it may itself call back into
/// the runtime.
pub(crate) fn emit_profile(event: ProfileEvent, name: &str) {
    let func = THREAD_STATE.with(|state| state.profile.borrow().get());
    if let Some(func) = func {
        func(event, name);
    }
}

pub(crate) fn record_dispatch(convention: CallConvention) {
    THREAD_STATE.with(|state| {
        let mut stats = state.stats.get();
        stats.record(convention);
        state.stats.set(stats);
    });
}

pub(crate) fn record_rejected() {
    THREAD_STATE.with(|state| {
        let mut stats = state.stats.get();
        stats.rejected_calls += 1;
        state.stats.set(stats);
    });
}

/// Snapshot of this thread's dispatch counters.
pub fn call_stats() -> CallStats {
    THREAD_STATE.with(|state| state.stats.get())
}

/// Reset this thread's dispatch counters.
pub fn reset_call_stats() {
    THREAD_STATE.with(|state| state.stats.set(CallStats::default()));
}

//! Profiling hook for call and return events.
//!
//! Native entries are reported with the `c_call`/`c_return` pair by the
//! dispatcher. Host-language functions are reported with `call`/`return`
//! by the function call path instead, so a profiler never sees both pairs
//! for one call.

use std::sync::Arc;

/// Profiling event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileEvent {
    /// Host-language function call.
    Call,
    /// Host-language function return.
    Return,
    /// Native function call.
    CCall,
    /// Native function return.
    CReturn,
    /// Native function raised.
    CException,
}

impl ProfileEvent {
    /// Get the event name as reported to profilers.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileEvent::Call => "call",
            ProfileEvent::Return => "return",
            ProfileEvent::CCall => "c_call",
            ProfileEvent::CReturn => "c_return",
            ProfileEvent::CException => "c_exception",
        }
    }
}

/// Type alias for profile functions. Receives the event and the callee name.
pub type ProfileFn = Arc<dyn Fn(ProfileEvent, &str) + Send + Sync>;

/// Holds the active profile function.
#[derive(Clone, Default)]
pub struct ProfileHook {
    profile_fn: Option<ProfileFn>,
}

impl ProfileHook {
    /// Create with no profiling.
    #[inline]
    pub fn new() -> Self {
        Self { profile_fn: None }
    }

    /// Set profile function.
    #[inline]
    pub fn set(&mut self, func: ProfileFn) {
        self.profile_fn = Some(func);
    }

    /// Clear profile function.
    #[inline]
    pub fn clear(&mut self) {
        self.profile_fn = None;
    }

    /// Check if profiling is enabled.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.profile_fn.is_some()
    }

    /// Current profile function, if any.
    #[inline]
    pub fn get(&self) -> Option<ProfileFn> {
        self.profile_fn.clone()
    }
}

impl std::fmt::Debug for ProfileHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileHook")
            .field("enabled", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_event_names() {
        assert_eq!(ProfileEvent::Call.as_str(), "call");
        assert_eq!(ProfileEvent::CCall.as_str(), "c_call");
        assert_eq!(ProfileEvent::CException.as_str(), "c_exception");
    }

    #[test]
    fn test_hook_set_clear() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut hook = ProfileHook::new();
        assert!(!hook.is_active());

        hook.set(Arc::new(move |event: ProfileEvent, name: &str| {
            sink.lock().push(format!("{}:{}", event.as_str(), name));
        }));
        assert!(hook.is_active());
        if let Some(func) = hook.get() {
            func(ProfileEvent::CCall, "len");
        }
        assert_eq!(*seen.lock(), vec!["c_call:len".to_string()]);

        hook.clear();
        assert!(hook.get().is_none());
    }
}

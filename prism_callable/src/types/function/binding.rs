//! Keyword argument binding for host-language functions.
//!
//! # Binding Algorithm
//!
//! 1. Bind positional arguments to positional parameters
//! 2. Collect excess positional arguments into the `*args` tuple (if present)
//! 3. Bind keyword arguments to matching parameters
//! 4. Collect unmatched keyword arguments into the `**kwargs` dict (if present)
//! 5. Fill missing parameters with default values
//! 6. Error on missing required arguments
//!
//! Parameter lookup is a linear scan, which beats hashing at typical
//! parameter counts.

use crate::code::CodeObject;
use crate::types::dict::DictObject;
use crate::types::tuple::TupleObject;
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Argument binding error. Surfaces as a `TypeError`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("{func_name}() takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        func_name: Arc<str>,
        expected: u16,
        given: usize,
    },

    /// Passed both positionally and by keyword.
    #[error("{func_name}() got multiple values for argument '{param_name}'")]
    DuplicateArgument {
        func_name: Arc<str>,
        param_name: Arc<str>,
    },

    #[error("{func_name}() got an unexpected keyword argument '{keyword}'")]
    UnexpectedKeyword {
        func_name: Arc<str>,
        keyword: Arc<str>,
    },

    #[error("{func_name}() missing required positional argument: '{param_name}'")]
    MissingPositional {
        func_name: Arc<str>,
        param_name: Arc<str>,
    },

    #[error("{func_name}() missing required keyword-only argument: '{param_name}'")]
    MissingKeywordOnly {
        func_name: Arc<str>,
        param_name: Arc<str>,
    },
}

// =============================================================================
// Bound Arguments Result
// =============================================================================

/// Resolved values for all parameters.
pub struct BoundArguments {
    /// Values for positional and keyword-only parameters.
    /// Length = arg_count + kwonlyarg_count
    pub parameters: Vec<Value>,
    /// Collected `*args`, if the code accepts them.
    pub varargs: Option<Arc<TupleObject>>,
    /// Collected `**kwargs`, if the code accepts them.
    pub varkw: Option<Arc<DictObject>>,
}

impl std::fmt::Debug for BoundArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundArguments")
            .field("parameters", &self.parameters.len())
            .field("varargs_len", &self.varargs.as_ref().map(|t| t.len()))
            .field("varkw_len", &self.varkw.as_ref().map(|d| d.len()))
            .finish()
    }
}

// =============================================================================
// Binding Engine
// =============================================================================

/// Defaults consulted when a parameter is left unbound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Defaults<'a> {
    /// Positional defaults, aligned to the last positional parameters.
    pub positional: Option<&'a TupleObject>,
    /// Keyword-only defaults by name.
    pub kwonly: Option<&'a DictObject>,
}

/// Binds call arguments to the parameters of a code object.
pub struct ArgumentBinder;

impl ArgumentBinder {
    /// Bind positional and keyword arguments.
    ///
    /// `func_name` is used for error messages only.
    pub fn bind<'a, P, K>(
        func_name: &Arc<str>,
        code: &CodeObject,
        defaults: Defaults<'_>,
        positional_args: P,
        keyword_args: K,
    ) -> Result<BoundArguments, BindingError>
    where
        P: Iterator<Item = Value>,
        K: Iterator<Item = (&'a str, Value)>,
    {
        let arg_count = code.arg_count as usize;
        let kwonly_count = code.kwonlyarg_count as usize;
        let total_params = arg_count + kwonly_count;

        let mut parameters = vec![Value::none(); total_params];
        let mut bound: SmallVec<[bool; 8]> = SmallVec::from_elem(false, total_params);

        // Phase 1: positional
        let mut excess: Vec<Value> = Vec::new();
        let mut given = 0usize;
        let mut positional_args = positional_args;
        while let Some(value) = positional_args.next() {
            if given < arg_count {
                parameters[given] = value;
                bound[given] = true;
            } else if code.has_varargs() {
                excess.push(value);
            } else {
                return Err(BindingError::TooManyPositional {
                    func_name: Arc::clone(func_name),
                    expected: code.arg_count,
                    given: given + 1 + positional_args.count(),
                });
            }
            given += 1;
        }

        let varargs = code
            .has_varargs()
            .then(|| Arc::new(TupleObject::from_vec(excess)));

        // Phase 2: keywords
        let extra = code.has_varkw().then(DictObject::new);
        for (name, value) in keyword_args {
            match Self::find_param_index(code, name) {
                Some(index) if bound[index] => {
                    return Err(BindingError::DuplicateArgument {
                        func_name: Arc::clone(func_name),
                        param_name: Self::param_name(code, index),
                    });
                }
                Some(index) => {
                    parameters[index] = value;
                    bound[index] = true;
                }
                None => match &extra {
                    Some(dict) => dict.set(Arc::from(name), value),
                    None => {
                        return Err(BindingError::UnexpectedKeyword {
                            func_name: Arc::clone(func_name),
                            keyword: Arc::from(name),
                        });
                    }
                },
            }
        }

        // Phase 3: positional defaults
        let default_count = defaults.positional.map_or(0, TupleObject::len);
        let first_default = arg_count.saturating_sub(default_count);
        for i in 0..arg_count {
            if bound[i] {
                continue;
            }
            let default = (i >= first_default)
                .then(|| defaults.positional)
                .flatten()
                .and_then(|d| d.as_slice().get(i - first_default));
            match default {
                Some(value) => parameters[i] = value.clone(),
                None => {
                    return Err(BindingError::MissingPositional {
                        func_name: Arc::clone(func_name),
                        param_name: Self::param_name(code, i),
                    });
                }
            }
        }

        // Phase 4: keyword-only defaults
        for i in arg_count..total_params {
            if bound[i] {
                continue;
            }
            let param_name = Self::param_name(code, i);
            match defaults.kwonly.and_then(|d| d.get(&param_name)) {
                Some(value) => parameters[i] = value,
                None => {
                    return Err(BindingError::MissingKeywordOnly {
                        func_name: Arc::clone(func_name),
                        param_name,
                    });
                }
            }
        }

        Ok(BoundArguments {
            parameters,
            varargs,
            varkw: extra.map(Arc::new),
        })
    }

    /// Parameter index (into the bound array) of `name`.
    ///
    /// Keyword-only parameters sit after the `*args` slot in the locals
    /// layout but directly after the positional ones in the bound array.
    fn find_param_index(code: &CodeObject, name: &str) -> Option<usize> {
        let arg_count = code.arg_count as usize;
        if let Some(i) = code.locals[..arg_count.min(code.locals.len())]
            .iter()
            .position(|p| &**p == name)
        {
            return Some(i);
        }

        let kwonly_start = arg_count + usize::from(code.has_varargs());
        (0..code.kwonlyarg_count as usize)
            .find(|i| {
                code.locals
                    .get(kwonly_start + i)
                    .is_some_and(|p| &**p == name)
            })
            .map(|i| arg_count + i)
    }

    fn param_name(code: &CodeObject, param_index: usize) -> Arc<str> {
        let arg_count = code.arg_count as usize;
        let locals_index = if param_index < arg_count {
            param_index
        } else {
            param_index + usize::from(code.has_varargs())
        };
        code.locals
            .get(locals_index)
            .cloned()
            .unwrap_or_else(|| Arc::from("?"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CodeBody, Frame};

    fn noop() -> CodeBody {
        Arc::new(|_: &Frame| Ok(Value::none()))
    }

    fn name() -> Arc<str> {
        Arc::from("f")
    }

    fn bind(
        code: &CodeObject,
        defaults: Defaults<'_>,
        args: &[Value],
        kwargs: &[(&str, Value)],
    ) -> Result<BoundArguments, BindingError> {
        ArgumentBinder::bind(
            &name(),
            code,
            defaults,
            args.iter().cloned(),
            kwargs.iter().map(|(k, v)| (*k, v.clone())),
        )
    }

    #[test]
    fn test_positional_only() {
        let code = CodeObject::new("f", &["a", "b"], noop());
        let bound = bind(&code, Defaults::default(), &[Value::int(1), Value::int(2)], &[]).unwrap();
        assert_eq!(bound.parameters, vec![Value::int(1), Value::int(2)]);
        assert!(bound.varargs.is_none());
        assert!(bound.varkw.is_none());
    }

    #[test]
    fn test_keyword_and_defaults() {
        let code = CodeObject::new("f", &["a", "b", "c"], noop());
        let defaults = TupleObject::from_vec(vec![Value::int(20), Value::int(30)]);
        let bound = bind(
            &code,
            Defaults {
                positional: Some(&defaults),
                kwonly: None,
            },
            &[Value::int(1)],
            &[("c", Value::int(3))],
        )
        .unwrap();
        assert_eq!(
            bound.parameters,
            vec![Value::int(1), Value::int(20), Value::int(3)]
        );
    }

    #[test]
    fn test_varargs_and_varkw() {
        let code = CodeObject::new("f", &["a"], noop())
            .with_varargs("rest")
            .with_kwonly(&["key"])
            .with_varkw("extra");
        let kwdefaults = DictObject::from_pairs([(Arc::from("key"), Value::int(9))]);
        let bound = bind(
            &code,
            Defaults {
                positional: None,
                kwonly: Some(&kwdefaults),
            },
            &[Value::int(1), Value::int(2), Value::int(3)],
            &[("other", Value::int(4))],
        )
        .unwrap();
        assert_eq!(bound.parameters, vec![Value::int(1), Value::int(9)]);
        assert_eq!(bound.varargs.as_ref().map(|t| t.len()), Some(2));
        let varkw = bound.varkw.unwrap();
        assert_eq!(varkw.get("other"), Some(Value::int(4)));
    }

    #[test]
    fn test_errors() {
        let code = CodeObject::new("f", &["a"], noop()).with_kwonly(&["k"]);

        let err = bind(&code, Defaults::default(), &[Value::int(1), Value::int(2)], &[])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "f() takes 1 positional arguments but 2 were given"
        );

        let err = bind(
            &code,
            Defaults::default(),
            &[Value::int(1)],
            &[("a", Value::int(2))],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "f() got multiple values for argument 'a'");

        let err = bind(
            &code,
            Defaults::default(),
            &[Value::int(1)],
            &[("zzz", Value::int(2))],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "f() got an unexpected keyword argument 'zzz'");

        let err = bind(&code, Defaults::default(), &[], &[("k", Value::int(1))]).unwrap_err();
        assert_eq!(err.to_string(), "f() missing required positional argument: 'a'");

        let err = bind(&code, Defaults::default(), &[Value::int(1)], &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "f() missing required keyword-only argument: 'k'"
        );
    }
}

//! Evaluation errors

use miette::Diagnostic;
use thiserror::Error;

use super::value::Value;

/// Failure while evaluating a program
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unbound name `{name}`")]
    #[diagnostic(code(eval::unbound_name))]
    UnboundName { name: String },

    #[error("Unknown function `{name}`")]
    #[diagnostic(
        code(eval::unknown_function),
        help("functions must be declared in an enclosing `let` or registered as natives")
    )]
    UnknownFunction { name: String },

    #[error("Function `{name}` expects {expected} argument(s), found {found}")]
    #[diagnostic(code(eval::arity_mismatch))]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Native function `{name}` expects {expected} argument(s), found {found}")]
    #[diagnostic(code(eval::native_arity_mismatch))]
    NativeArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Condition is false and there is no else branch: {expr}")]
    #[diagnostic(code(eval::missing_else))]
    MissingElse { expr: String },

    #[error("Division by zero: {expr}")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero { expr: String },

    #[error("Type mismatch: expected {expected}, found {found} in {context}")]
    #[diagnostic(code(eval::type_mismatch))]
    TypeMismatch {
        expected: String,
        found: String,
        context: String,
    },

    #[error("Integer overflow: {expr}")]
    #[diagnostic(code(eval::integer_overflow))]
    IntegerOverflow { expr: String },

    #[error("Record `{type_name}` has no field `{field}`")]
    #[diagnostic(code(eval::unknown_field))]
    UnknownField { type_name: String, field: String },

    #[error("Cannot access field `{field}` of nil")]
    #[diagnostic(code(eval::nil_dereference))]
    NilDereference { field: String },

    #[error("Index {index} out of bounds for array of length {len}")]
    #[diagnostic(code(eval::index_out_of_bounds))]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Negative array size {size}")]
    #[diagnostic(code(eval::negative_array_size))]
    NegativeArraySize { size: i64 },

    #[error("Cannot allocate an array of {size} elements")]
    #[diagnostic(code(eval::array_too_large))]
    ArrayTooLarge { size: i64 },

    #[error("`break` outside of a loop")]
    #[diagnostic(
        code(eval::break_outside_loop),
        help("`break` must appear inside a `while` or `for` body of the same function")
    )]
    BreakOutsideLoop,

    #[error("Call depth limit of {limit} exceeded calling `{name}`")]
    #[diagnostic(
        code(eval::call_depth_exceeded),
        help("raise `interpreter.max_call_depth` in the configuration")
    )]
    CallDepthExceeded { name: String, limit: usize },

    #[error("Native function `{name}` failed: {message}")]
    #[diagnostic(code(eval::native))]
    Native { name: String, message: String },

    #[error("Program exited with code {0}")]
    #[diagnostic(code(eval::exit))]
    Exit(i64),
}

impl EvalError {
    /// `found` had the wrong runtime shape where `expected` was required
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: &Value,
        context: impl std::fmt::Display,
    ) -> Self {
        EvalError::TypeMismatch {
            expected: expected.into(),
            found: found.type_name().to_string(),
            context: context.to_string(),
        }
    }

    pub fn native(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Native {
            name: name.into(),
            message: message.into(),
        }
    }
}

//! Tree-walking interpreter for the AST
//!
//! Evaluates a parsed [`Program`](crate::ast::Program) against an explicit,
//! caller-owned [`Environment`].

pub mod env;
pub mod error;
pub mod eval;
pub mod hook;
pub mod natives;
mod stack;
pub mod value;

pub use env::{Binding, Closure, Environment, ScopeGuard};
pub use error::EvalError;
pub use eval::Interpreter;
pub use hook::{LoopHook, NoopHook, TracingHook};
pub use natives::Console;
pub use value::Value;

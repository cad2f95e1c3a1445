//! Scoped binding environment
//!
//! The environment is a stack of frames. Each frame is shared (`Rc`) so a
//! function declaration can capture the chain of frames visible where it was
//! declared and later evaluate its body on top of exactly that chain.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{FunctionDeclaration, NativeFunctionDeclaration, Type};

use super::error::EvalError;
use super::value::Value;

/// One level of the scope stack
pub type Frame = Rc<RefCell<FxHashMap<String, Binding>>>;

/// What a name is bound to
#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Function(Rc<Closure>),
    Native(Rc<NativeFunctionDeclaration>),
    Type(Type),
}

impl Binding {
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Value(_) => "variable",
            Binding::Function(_) => "function",
            Binding::Native(_) => "native function",
            Binding::Type(_) => "type",
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(value) => write!(f, "{:?}", value),
            Binding::Function(closure) => write!(f, "<function {}>", closure.declaration.name),
            Binding::Native(native) => write!(f, "<native {}>", native.name),
            Binding::Type(ty) => write!(f, "{}", ty),
        }
    }
}

/// A user function together with the frames it was declared in
pub struct Closure {
    pub declaration: Rc<FunctionDeclaration>,
    pub frames: Vec<Frame>,
}

/// Variable environment
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    /// Environment holding a single, empty global scope
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame::default()],
        }
    }

    /// Push a new scope
    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pop the innermost scope. The global scope is never popped.
    ///
    /// The popped frame is cleared: closures declared in it reference the
    /// frame themselves, and nothing can call them once it is gone.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            if let Some(frame) = self.frames.pop() {
                frame.borrow_mut().clear();
            }
        }
    }

    /// Push a scope that is popped when the guard is dropped
    pub fn scope(&mut self) -> ScopeGuard<'_> {
        self.push();
        ScopeGuard { env: self }
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings
    pub fn set_current_level(&mut self, name: impl Into<String>, binding: Binding) {
        if let Some(frame) = self.frames.last() {
            frame.borrow_mut().insert(name.into(), binding);
        }
    }

    /// Bind a variable in the innermost scope
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.set_current_level(name, Binding::Value(value));
    }

    /// Register a host function in the innermost scope
    pub fn define_native(&mut self, native: NativeFunctionDeclaration) {
        let name = native.name.clone();
        self.set_current_level(name, Binding::Native(Rc::new(native)));
    }

    /// Rebind an existing variable in whichever scope holds it
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        for frame in self.frames.iter().rev() {
            let mut frame = frame.borrow_mut();
            match frame.get_mut(name) {
                Some(Binding::Value(slot)) => {
                    *slot = value;
                    return Ok(());
                }
                Some(other) => {
                    return Err(EvalError::TypeMismatch {
                        expected: "variable".to_string(),
                        found: other.kind().to_string(),
                        context: format!("assignment to `{}`", name),
                    });
                }
                None => continue,
            }
        }
        Err(EvalError::UnboundName {
            name: name.to_string(),
        })
    }

    /// Look up a name, innermost scope first
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().get(name).cloned())
    }

    /// Look up a variable's value
    pub fn get_value(&self, name: &str) -> Option<Value> {
        match self.get(name)? {
            Binding::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Number of scopes, including the global one
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The current chain of frames, for a function declaration to keep
    pub fn capture(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    /// Run `f` with `frames` as the scope stack, then restore the current one
    pub fn with_frames<R>(&mut self, frames: Vec<Frame>, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.frames, frames);
        let result = f(self);
        self.frames = saved;
        result
    }

    /// Every visible name with its binding, sorted by name
    pub fn visible(&self) -> Vec<(String, Binding)> {
        let mut seen: FxHashMap<String, Binding> = FxHashMap::default();
        for frame in self.frames.iter().rev() {
            for (name, binding) in frame.borrow().iter() {
                seen.entry(name.clone()).or_insert_with(|| binding.clone());
            }
        }
        let mut names: Vec<_> = seen.into_iter().collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        names
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// A scope pushed by [`Environment::scope`]; popped on drop
pub struct ScopeGuard<'a> {
    env: &'a mut Environment,
}

impl Deref for ScopeGuard<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.env.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_pop() {
        let mut env = Environment::new();
        env.define("a", Value::Int(1));
        env.push();
        env.define("a", Value::Int(2));
        assert_eq!(env.get_value("a"), Some(Value::Int(2)));
        env.pop();
        assert_eq!(env.get_value("a"), Some(Value::Int(1)));
    }

    #[test]
    fn test_set_rebinds_outer_scope() {
        let mut env = Environment::new();
        env.define("x", Value::Int(0));
        {
            let mut scope = env.scope();
            scope.set("x", Value::Int(5)).unwrap();
            assert_eq!(scope.depth(), 2);
        }
        assert_eq!(env.depth(), 1);
        assert_eq!(env.get_value("x"), Some(Value::Int(5)));
    }

    #[test]
    fn test_set_never_creates() {
        let mut env = Environment::new();
        let err = env.set("missing", Value::Int(1)).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnboundName {
                name: "missing".to_string()
            }
        );
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn test_guard_pops_on_early_exit() {
        fn fails(env: &mut Environment) -> Result<(), EvalError> {
            let mut scope = env.scope();
            scope.define("tmp", Value::Nil);
            scope.set("nope", Value::Nil)?;
            Ok(())
        }

        let mut env = Environment::new();
        assert!(fails(&mut env).is_err());
        assert_eq!(env.depth(), 1);
        assert!(env.get("tmp").is_none());
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut env = Environment::new();
        env.define("g", Value::Int(1));
        env.pop();
        assert_eq!(env.depth(), 1);
        assert_eq!(env.get_value("g"), Some(Value::Int(1)));
    }

    #[test]
    fn test_with_frames_restores_stack() {
        let mut env = Environment::new();
        env.define("outer", Value::Int(1));
        let captured = env.capture();
        env.push();
        env.define("inner", Value::Int(2));

        let seen = env.with_frames(captured, |env| {
            (env.get("outer").is_some(), env.get("inner").is_some())
        });
        assert_eq!(seen, (true, false));
        assert_eq!(env.depth(), 2);
        assert!(env.get("inner").is_some());
    }
}

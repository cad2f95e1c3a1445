//! Tree-walking evaluator for the AST

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::*;
use crate::config::InterpreterConfig;

use super::env::{Binding, Closure, Environment};
use super::error::EvalError;
use super::hook::{LoopHook, NoopHook, TracingHook};
use super::stack::ensure_sufficient_stack;
use super::value::Value;

/// Non-local exit out of `eval_expr`
#[derive(Debug)]
enum Unwind {
    /// `break` travelling to the innermost loop
    Break,
    Error(EvalError),
}

impl From<EvalError> for Unwind {
    fn from(err: EvalError) -> Self {
        Unwind::Error(err)
    }
}

impl Unwind {
    /// A `break` that reached a function or program boundary
    fn into_error(self) -> EvalError {
        match self {
            Unwind::Break => EvalError::BreakOutsideLoop,
            Unwind::Error(err) => err,
        }
    }
}

type Eval<T = Value> = Result<T, Unwind>;

/// Tree-walking interpreter
pub struct Interpreter {
    hook: Box<dyn LoopHook>,
    max_call_depth: usize,
    /// User function calls currently active
    call_depth: usize,
    /// Loops enclosing the current point, within the current function
    loop_depth: usize,
}

impl Interpreter {
    /// Create an interpreter with the default configuration
    pub fn new() -> Self {
        Self::with_config(&InterpreterConfig::default())
    }

    pub fn with_config(config: &InterpreterConfig) -> Self {
        let hook: Box<dyn LoopHook> = if config.trace_loops {
            Box::new(TracingHook::default())
        } else {
            Box::new(NoopHook)
        };
        Interpreter {
            hook,
            max_call_depth: config.max_call_depth,
            call_depth: 0,
            loop_depth: 0,
        }
    }

    /// Replace the loop hook
    pub fn with_hook(mut self, hook: impl LoopHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// Evaluate a program. A declaration binds into the innermost scope of
    /// `env` and yields `Unit`.
    pub fn evaluate(&mut self, program: &Program, env: &mut Environment) -> Result<Value, EvalError> {
        tracing::debug!(nodes = program.node_count(), "evaluating program");
        let result = match program {
            Program::Expr(expr) => self.eval_expr(expr, env),
            Program::Declaration(decl) => self.declare(decl, env).map(|()| Value::Unit),
        };
        result.map_err(Unwind::into_error)
    }

    fn eval_expr(&mut self, expr: &Expr, env: &mut Environment) -> Eval {
        ensure_sufficient_stack(|| self.eval_node(expr, env))
    }

    fn eval_node(&mut self, expr: &Expr, env: &mut Environment) -> Eval {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Integer(n) => Ok(Value::Int(*n)),
            Expr::String(s) => Ok(Value::string(s)),

            Expr::LValue(lvalue) => self.eval_lvalue(lvalue, env),

            Expr::Assign { target, value } => {
                let value = self.eval_expr(value, env)?;
                self.assign(target, value, env)?;
                Ok(Value::Unit)
            }

            Expr::FunctionCall { name, args } => self.eval_call(name, args, env),

            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_int(condition, env, "if condition")? != 0 {
                    self.eval_expr(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval_expr(else_branch, env)
                } else {
                    Err(EvalError::MissingElse {
                        expr: condition.to_string(),
                    }
                    .into())
                }
            }

            Expr::While { condition, body } => {
                tracing::trace!("entering while loop");
                self.loop_depth += 1;
                let result = self.run_while(expr, condition, body, env);
                self.loop_depth -= 1;
                match result {
                    Err(Unwind::Break) => Ok(Value::Unit),
                    other => other,
                }
            }

            Expr::For {
                var,
                start,
                end,
                body,
            } => {
                let mut scope = env.scope();
                let start = self.eval_int(start, &mut scope, "for start")?;
                let end = self.eval_int(end, &mut scope, "for end")?;
                tracing::trace!(var = %var, start, end, "entering for loop");

                self.loop_depth += 1;
                let result = self.run_for(expr, var, start, end, body, &mut scope);
                self.loop_depth -= 1;
                match result {
                    Ok(()) | Err(Unwind::Break) => Ok(Value::Unit),
                    Err(err) => Err(err),
                }
            }

            Expr::Break => {
                if self.loop_depth == 0 {
                    Err(EvalError::BreakOutsideLoop.into())
                } else {
                    Err(Unwind::Break)
                }
            }

            Expr::Let { declarations, body } => {
                let mut scope = env.scope();
                for decl in declarations {
                    self.declare(decl, &mut scope)?;
                }
                self.eval_all(body, &mut scope)
            }

            Expr::Sequence(exprs) => self.eval_all(exprs, env),

            Expr::Binary { op, left, right } => {
                let lhs = self.eval_expr(left, env)?;
                let rhs = self.eval_expr(right, env)?;
                Ok(binary(*op, lhs, rhs, expr)?)
            }

            Expr::ArrayCreation {
                element_type,
                size,
                init,
            } => {
                let size = self.eval_int(size, env, "array size")?;
                if size < 0 {
                    return Err(EvalError::NegativeArraySize { size }.into());
                }
                let init = self.eval_expr(init, env)?;
                let len = usize::try_from(size).map_err(|_| EvalError::ArrayTooLarge { size })?;
                let mut elements = Vec::new();
                elements
                    .try_reserve_exact(len)
                    .map_err(|_| EvalError::ArrayTooLarge { size })?;
                elements.resize(len, init);
                Ok(Value::array(element_type.name(), elements))
            }

            Expr::RecordCreation { type_id, fields } => {
                let declared = record_fields(type_id, env);
                let mut values: IndexMap<String, Value> = match &declared {
                    Some(declared) => declared.keys().map(|f| (f.clone(), Value::Nil)).collect(),
                    None => IndexMap::new(),
                };
                for (field, init) in fields {
                    let value = self.eval_expr(init, env)?;
                    if declared.as_ref().is_some_and(|d| !d.contains_key(field)) {
                        return Err(EvalError::UnknownField {
                            type_name: type_id.name().to_string(),
                            field: field.clone(),
                        }
                        .into());
                    }
                    values.insert(field.clone(), value);
                }
                Ok(Value::record(type_id.name(), values))
            }

            Expr::ObjectCreation { type_id } => {
                let fields: IndexMap<String, Value> = record_fields(type_id, env)
                    .map(|declared| declared.keys().map(|f| (f.clone(), Value::Nil)).collect())
                    .unwrap_or_default();
                Ok(Value::record(type_id.name(), fields))
            }
        }
    }

    /// Evaluate in order; the last value, or `Unit` when empty
    fn eval_all(&mut self, exprs: &[Expr], env: &mut Environment) -> Eval {
        let mut last = Value::Unit;
        for expr in exprs {
            last = self.eval_expr(expr, env)?;
        }
        Ok(last)
    }

    fn eval_int(&mut self, expr: &Expr, env: &mut Environment, context: &str) -> Eval<i64> {
        let value = self.eval_expr(expr, env)?;
        value
            .as_int()
            .ok_or_else(|| EvalError::type_mismatch("int", &value, context).into())
    }

    fn run_while(&mut self, node: &Expr, condition: &Expr, body: &Expr, env: &mut Environment) -> Eval {
        let mut last = Value::Unit;
        while self.eval_int(condition, env, "while condition")? != 0 {
            self.hook.loop_iteration(node);
            last = self.eval_expr(body, env)?;
        }
        Ok(last)
    }

    fn run_for(
        &mut self,
        node: &Expr,
        var: &str,
        start: i64,
        end: i64,
        body: &Expr,
        env: &mut Environment,
    ) -> Eval<()> {
        if start > end {
            return Ok(());
        }
        let mut i = start;
        loop {
            env.set_current_level(var, Binding::Value(Value::Int(i)));
            self.hook.loop_iteration(node);
            self.eval_expr(body, env)?;
            if i == end {
                return Ok(());
            }
            i += 1;
        }
    }

    // ==================== DECLARATIONS ====================

    fn declare(&mut self, decl: &Declaration, env: &mut Environment) -> Eval<()> {
        match decl {
            Declaration::Type(decl) => {
                env.set_current_level(&decl.name, Binding::Type(decl.ty.clone()));
            }
            Declaration::Variable(decl) => {
                let value = self.eval_expr(&decl.init, env)?;
                if value.is_unit() {
                    return Err(EvalError::type_mismatch(
                        "value",
                        &value,
                        format!("initializer of `{}`", decl.name),
                    )
                    .into());
                }
                env.set_current_level(&decl.name, Binding::Value(value));
            }
            Declaration::Function(decl) => {
                let closure = Closure {
                    declaration: Rc::clone(decl),
                    frames: env.capture(),
                };
                env.set_current_level(&decl.name, Binding::Function(Rc::new(closure)));
            }
            Declaration::Native(decl) => {
                env.set_current_level(&decl.name, Binding::Native(Rc::clone(decl)));
            }
        }
        Ok(())
    }

    // ==================== CALLS ====================

    fn eval_call(&mut self, name: &str, args: &[Expr], env: &mut Environment) -> Eval {
        match env.get(name) {
            Some(Binding::Function(closure)) => {
                let expected = closure.declaration.params.len();
                if args.len() != expected {
                    return Err(EvalError::ArityMismatch {
                        name: name.to_string(),
                        expected,
                        found: args.len(),
                    }
                    .into());
                }
                let values = self.eval_args(args, env)?;
                Ok(self.call_function(&closure, values, env)?)
            }
            Some(Binding::Native(native)) => {
                let expected = native.params.len();
                if args.len() != expected {
                    return Err(EvalError::NativeArityMismatch {
                        name: name.to_string(),
                        expected,
                        found: args.len(),
                    }
                    .into());
                }
                let values = self.eval_args(args, env)?;
                tracing::trace!(function = name, "calling native");
                Ok(native.call(&values)?)
            }
            _ => Err(EvalError::UnknownFunction {
                name: name.to_string(),
            }
            .into()),
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: &mut Environment) -> Eval<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg, env)).collect()
    }

    /// Run a user function body on top of the frames it was declared in
    fn call_function(
        &mut self,
        closure: &Closure,
        args: Vec<Value>,
        env: &mut Environment,
    ) -> Result<Value, EvalError> {
        let decl = &closure.declaration;
        if self.call_depth >= self.max_call_depth {
            return Err(EvalError::CallDepthExceeded {
                name: decl.name.clone(),
                limit: self.max_call_depth,
            });
        }
        tracing::trace!(function = %decl.name, depth = self.call_depth, "calling function");

        self.call_depth += 1;
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);

        let result = env.with_frames(closure.frames.clone(), |env| {
            let mut scope = env.scope();
            for (param, arg) in decl.params.iter().zip(args) {
                scope.set_current_level(&param.name, Binding::Value(arg));
            }
            self.eval_expr(&decl.body, &mut scope)
        });

        self.loop_depth = enclosing_loops;
        self.call_depth -= 1;
        result.map_err(Unwind::into_error)
    }

    // ==================== LVALUES ====================

    fn lookup_variable(&self, name: &str, env: &Environment) -> Result<Value, EvalError> {
        match env.get(name) {
            Some(Binding::Value(value)) => Ok(value),
            Some(other) => Err(EvalError::TypeMismatch {
                expected: "variable".to_string(),
                found: other.kind().to_string(),
                context: format!("reference to `{}`", name),
            }),
            None => Err(EvalError::UnboundName {
                name: name.to_string(),
            }),
        }
    }

    fn eval_lvalue(&mut self, lvalue: &LValue, env: &mut Environment) -> Eval {
        let mut value = self.lookup_variable(&lvalue.name, env)?;
        for step in &lvalue.path {
            value = self.access(value, step, env)?;
        }
        Ok(value)
    }

    /// Apply one accessor to `value`
    fn access(&mut self, value: Value, step: &Accessor, env: &mut Environment) -> Eval {
        match step {
            Accessor::Field(field) => match value {
                Value::Record(record) => {
                    let record = record.borrow();
                    match record.fields.get(field) {
                        Some(value) => Ok(value.clone()),
                        None => Err(EvalError::UnknownField {
                            type_name: record.type_name.clone(),
                            field: field.clone(),
                        }
                        .into()),
                    }
                }
                Value::Nil => Err(EvalError::NilDereference {
                    field: field.clone(),
                }
                .into()),
                other => Err(EvalError::type_mismatch("record", &other, step).into()),
            },
            Accessor::Index(index) => {
                let i = self.eval_int(index, env, "array index")?;
                match value {
                    Value::Array(array) => {
                        let array = array.borrow();
                        let i = checked_index(i, array.elements.len())?;
                        Ok(array.elements[i].clone())
                    }
                    other => Err(EvalError::type_mismatch("array", &other, step).into()),
                }
            }
        }
    }

    /// Store `value` into the location named by `target`
    fn assign(&mut self, target: &LValue, value: Value, env: &mut Environment) -> Eval<()> {
        let Some((last, prefix)) = target.path.split_last() else {
            env.set(&target.name, value)?;
            return Ok(());
        };

        let mut container = self.lookup_variable(&target.name, env)?;
        for step in prefix {
            container = self.access(container, step, env)?;
        }

        match last {
            Accessor::Field(field) => match container {
                Value::Record(record) => {
                    let mut record = record.borrow_mut();
                    let type_name = record.type_name.clone();
                    match record.fields.get_mut(field) {
                        Some(slot) => {
                            *slot = value;
                            Ok(())
                        }
                        None => Err(EvalError::UnknownField {
                            type_name,
                            field: field.clone(),
                        }
                        .into()),
                    }
                }
                Value::Nil => Err(EvalError::NilDereference {
                    field: field.clone(),
                }
                .into()),
                other => Err(EvalError::type_mismatch("record", &other, last).into()),
            },
            Accessor::Index(index) => {
                let i = self.eval_int(index, env, "array index")?;
                match container {
                    Value::Array(array) => {
                        let mut array = array.borrow_mut();
                        let i = checked_index(i, array.elements.len())?;
                        array.elements[i] = value;
                        Ok(())
                    }
                    other => Err(EvalError::type_mismatch("array", &other, last).into()),
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_index(index: i64, len: usize) -> Result<usize, EvalError> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(EvalError::IndexOutOfBounds { index, len }),
    }
}

/// Fields of `type_id` if it names a record type, following aliases
fn record_fields(type_id: &TypeId, env: &Environment) -> Option<IndexMap<String, TypeId>> {
    let mut name = type_id.name().to_string();
    let mut seen = Vec::new();
    loop {
        match env.get(&name)? {
            Binding::Type(Type::Record(fields)) => return Some(fields),
            Binding::Type(Type::Id(alias)) if !seen.contains(&alias.0) => {
                seen.push(name);
                name = alias.0;
            }
            _ => return None,
        }
    }
}

/// Apply a binary operator to evaluated operands
fn binary(op: BinaryOp, lhs: Value, rhs: Value, node: &Expr) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Equals => return Ok(Value::from_bool(lhs == rhs)),
        BinaryOp::NotEquals => return Ok(Value::from_bool(lhs != rhs)),
        _ => {}
    }

    let (a, b) = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => (*a, *b),
        (Value::Int(_), other) | (other, _) => {
            return Err(EvalError::type_mismatch("int", other, node));
        }
    };
    let overflow = || EvalError::IntegerOverflow {
        expr: node.to_string(),
    };

    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Subtract => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Multiply => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Divide => {
            if b == 0 {
                return Err(EvalError::DivisionByZero {
                    expr: node.to_string(),
                });
            }
            floor_div(a, b).ok_or_else(overflow)?
        }
        BinaryOp::LessThan => (a < b) as i64,
        BinaryOp::LessOrEqual => (a <= b) as i64,
        BinaryOp::GreaterThan => (a > b) as i64,
        BinaryOp::GreaterOrEqual => (a >= b) as i64,
        BinaryOp::And => (a != 0 && b != 0) as i64,
        BinaryOp::Or => (a != 0 || b != 0) as i64,
        BinaryOp::Equals => (a == b) as i64,
        BinaryOp::NotEquals => (a != b) as i64,
    };
    Ok(Value::Int(result))
}

/// Integer division rounding toward negative infinity
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_div() {
        assert_eq!(floor_div(10, 3), Some(3));
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_div(-7, -2), Some(3));
        assert_eq!(floor_div(-6, 2), Some(-3));
        assert_eq!(floor_div(i64::MIN, -1), None);
        assert_eq!(floor_div(1, 0), None);
    }

    #[test]
    fn test_checked_index() {
        assert_eq!(checked_index(0, 3), Ok(0));
        assert_eq!(checked_index(2, 3), Ok(2));
        assert!(checked_index(3, 3).is_err());
        assert!(checked_index(-1, 3).is_err());
    }

    #[test]
    fn test_binary_type_mismatch_names_operand() {
        let node = Expr::binary(BinaryOp::Add, Expr::int(1), Expr::string("a"));
        let err = binary(BinaryOp::Add, Value::Int(1), Value::string("a"), &node).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { ref found, .. } if found == "string"));
    }

    #[test]
    fn test_string_equality() {
        let node = Expr::Nil;
        let eq = binary(BinaryOp::Equals, Value::string("0"), Value::string("0"), &node);
        assert_eq!(eq, Ok(Value::Int(1)));
        let ne = binary(BinaryOp::NotEquals, Value::Int(42), Value::Int(99), &node);
        assert_eq!(ne, Ok(Value::Int(1)));
    }
}

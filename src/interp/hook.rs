//! Loop boundary hooks
//!
//! The evaluator notifies a [`LoopHook`] once per iteration of every `while`
//! and `for` loop. A tracing JIT would hang its trace recording off this
//! point; the default hook does nothing.

use crate::ast::Expr;

/// Called by the evaluator at every loop iteration
pub trait LoopHook {
    /// `node` is the `While` or `For` expression being iterated
    fn loop_iteration(&mut self, node: &Expr);
}

/// Hook that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl LoopHook for NoopHook {
    fn loop_iteration(&mut self, _node: &Expr) {}
}

/// Hook that logs iterations at `trace` level
#[derive(Debug, Default)]
pub struct TracingHook {
    iterations: u64,
}

impl TracingHook {
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl LoopHook for TracingHook {
    fn loop_iteration(&mut self, node: &Expr) {
        self.iterations += 1;
        let kind = match node {
            Expr::While { .. } => "while",
            Expr::For { .. } => "for",
            _ => "loop",
        };
        tracing::trace!(kind, iteration = self.iterations, "loop iteration");
    }
}

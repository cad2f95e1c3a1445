//! Native stack headroom for the recursive evaluator
//!
//! Every Tiger call nests several `eval_expr` frames, so deep but legal
//! recursion can exhaust the thread stack long before `max_call_depth`
//! trips. Recursive entry points run through [`ensure_sufficient_stack`].

/// Remaining stack below which a new segment is allocated
const RED_ZONE: usize = 256 * 1024;

/// Size of each newly allocated stack segment
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if less than [`RED_ZONE`] remains
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

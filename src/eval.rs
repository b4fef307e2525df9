use anyhow::{bail, Result};

/// External expression evaluator.
///
/// The interpreter substitutes nothing itself: the bracket contents of a
/// `[...]` operand are handed over verbatim, together with the current
/// variable bindings (`vars[0]` is `$1`). The result must be a 64-bit
/// integer.
///
/// This keeps the core decoupled from any particular expression syntax
/// or host runtime; the embedding layer decides what `$1 * 2 + 4` means.
pub trait Evaluator {
    fn evaluate(&mut self, expr: &str, vars: &[i64]) -> Result<i64>;
}

/// Refuses every expression.
///
/// The default collaborator for programs that never use `[...]`
/// operands; anything else should install a real evaluator.
#[derive(Debug, Default)]
pub struct NullEvaluator;

impl Evaluator for NullEvaluator {
    fn evaluate(&mut self, expr: &str, _vars: &[i64]) -> Result<i64> {
        bail!("no expression evaluator installed (expression: `{expr}`)");
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &mut E {
    fn evaluate(&mut self, expr: &str, vars: &[i64]) -> Result<i64> {
        (**self).evaluate(expr, vars)
    }
}

use crate::error::DecodeError;
use crate::eval::Evaluator;
use crate::scanner::Scanner;
use crate::vars::VariableStack;

/// Resolves an integer operand at the scanner's current position.
///
/// Three forms are tried in order: a bracketed expression handed to the
/// external evaluator, a `$<index>` variable reference, a bare decimal
/// literal. With none of those present the caller's `default` is used.
pub(crate) fn resolve<E: Evaluator>(
    scanner: &mut Scanner<'_>,
    vars: &VariableStack,
    eval: &mut E,
    default: i64,
) -> Result<i64, DecodeError> {
    if let Some(expr) = scanner.try_bracket()? {
        return eval
            .evaluate(expr, vars.bindings())
            .map_err(|e| DecodeError::Eval {
                expr: expr.to_owned(),
                msg: format!("{e:#}"),
            });
    }

    if scanner.peek() == Some(b'$') {
        scanner.bump();
        let index = scanner.digits(0);
        return vars.get(index);
    }

    match scanner.try_digits() {
        Some(n) => Ok(n as i64),
        None => Ok(default),
    }
}

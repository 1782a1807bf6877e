//! Breakpoint condition testing.

use tracing::trace;

use crate::scope::ExpressionEvaluator;
use crate::types::ValidatedExpr;

/// Returns whether a breakpoint with `condition` should fire.
///
/// No condition always passes. An evaluation error counts as false and is
/// not propagated; a condition that referenced a missing variable simply
/// does not match on this hit.
pub fn test<E>(condition: Option<&ValidatedExpr>, evaluator: &mut E) -> bool
where
    E: ExpressionEvaluator + ?Sized,
{
    let Some(condition) = condition else {
        return true;
    };
    match evaluator.evaluate(condition.as_str()) {
        Ok(value) => evaluator.is_truthy(&value),
        Err(err) => {
            trace!("condition `{condition}` failed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::value::CapturedValue;

    struct Fixed(Result<CapturedValue, EvalError>);

    impl ExpressionEvaluator for Fixed {
        fn evaluate(&mut self, _source: &str) -> Result<CapturedValue, EvalError> {
            self.0.clone()
        }
    }

    struct Strict;

    impl ExpressionEvaluator for Strict {
        fn evaluate(&mut self, _source: &str) -> Result<CapturedValue, EvalError> {
            Ok(CapturedValue::String("0".into()))
        }

        fn is_truthy(&self, value: &CapturedValue) -> bool {
            matches!(value, CapturedValue::String(_))
        }
    }

    fn expr(source: &str) -> ValidatedExpr {
        ValidatedExpr::new(source.into())
    }

    #[test]
    fn test_absent_condition_passes() {
        let mut evaluator = Fixed(Err(EvalError::new("never called")));
        assert!(test(None, &mut evaluator));
    }

    #[test]
    fn test_truthiness_decides() {
        let condition = expr("$x > 0");
        assert!(test(Some(&condition), &mut Fixed(Ok(CapturedValue::Int(2)))));
        assert!(!test(Some(&condition), &mut Fixed(Ok(CapturedValue::Null))));
        assert!(!test(
            Some(&condition),
            &mut Fixed(Ok(CapturedValue::String("0".into())))
        ));
    }

    #[test]
    fn test_error_counts_as_false() {
        let condition = expr("$items['missing'] > 0");
        let mut evaluator = Fixed(Err(EvalError::new("undefined index: missing")));
        assert!(!test(Some(&condition), &mut evaluator));
    }

    #[test]
    fn test_host_truthiness_override() {
        assert!(test(Some(&expr("$s")), &mut Strict));
    }
}

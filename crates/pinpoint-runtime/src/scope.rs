//! The interpreter as seen from a firing probe.

#![allow(missing_docs)]

use pinpoint_debug::{CapturedValue, EvalError, ExecutionScope, ExpressionEvaluator, FrameInfo};
use smol_str::SmolStr;

use crate::eval::Interpreter;

/// Borrows the interpreter for the duration of one probe handler.
pub struct ProbeScope<'a, 'r> {
    interpreter: &'a mut Interpreter<'r>,
}

impl<'a, 'r> ProbeScope<'a, 'r> {
    pub fn new(interpreter: &'a mut Interpreter<'r>) -> Self {
        Self { interpreter }
    }
}

impl ExpressionEvaluator for ProbeScope<'_, '_> {
    fn evaluate(&mut self, source: &str) -> Result<CapturedValue, EvalError> {
        self.interpreter
            .evaluate_snippet(source)
            .map(|value| value.capture())
            .map_err(|err| EvalError::new(err.to_string()))
    }
}

impl ExecutionScope for ProbeScope<'_, '_> {
    fn frame_count(&self) -> usize {
        self.interpreter.depth()
    }

    fn frame(&self, depth: usize) -> Option<FrameInfo> {
        let frame = self.interpreter.frame_at(depth)?;
        Some(FrameInfo {
            function: frame.function.clone(),
            filename: frame.filename.clone(),
            line: frame.line,
        })
    }

    fn locals(&self, depth: usize) -> Vec<(SmolStr, CapturedValue)> {
        self.interpreter
            .frame_at(depth)
            .map(|frame| {
                frame
                    .locals
                    .iter()
                    .map(|(name, value)| (name.clone(), value.capture()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pinpoint_debug::{ExecutionScope, ExpressionEvaluator};

    use super::ProbeScope;
    use crate::cache::CodeCache;
    use crate::eval::Interpreter;
    use crate::loader::MemoryLoader;
    use crate::stdlib::StandardLibrary;

    #[test]
    fn test_scope_reads_the_innermost_frame() {
        let loader = MemoryLoader::new().with_file("/s.php", "<?php\n$user = ['name' => 'ada'];\n$n = 3;\n");
        let cache = CodeCache::new();
        let stdlib = StandardLibrary::new();
        let mut interpreter = Interpreter::new(&cache, &loader, &stdlib, None);
        interpreter.run("/s.php").unwrap();

        let mut scope = ProbeScope::new(&mut interpreter);
        assert_eq!(scope.frame_count(), 1);
        let frame = scope.frame(0).unwrap();
        assert_eq!(frame.filename, "/s.php");
        assert!(frame.function.is_none());
        assert!(scope.frame(1).is_none());

        let names: Vec<_> = scope.locals(0).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["user", "n"]);

        let value = scope.evaluate("$user['name']").unwrap();
        assert_eq!(value, pinpoint_debug::CapturedValue::String("ada".into()));
        let err = scope.evaluate("$missing").unwrap_err();
        assert!(err.message.contains("missing"), "{err}");
    }
}

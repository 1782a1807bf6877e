#![allow(dead_code)]

use std::collections::HashMap;

use pinpoint_debug::{CapturedValue, EvalError, ExecutionScope, ExpressionEvaluator, FrameInfo};
use smol_str::SmolStr;

/// A fixed call stack with canned expression results.
#[derive(Default)]
pub struct MockScope {
    pub frames: Vec<(FrameInfo, Vec<(SmolStr, CapturedValue)>)>,
    pub values: HashMap<String, CapturedValue>,
    pub evaluations: usize,
}

impl MockScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(
        mut self,
        function: Option<&str>,
        filename: &str,
        line: u32,
        locals: &[(&str, CapturedValue)],
    ) -> Self {
        self.frames.push((
            FrameInfo {
                function: function.map(SmolStr::new),
                filename: filename.into(),
                line,
            },
            locals
                .iter()
                .map(|(name, value)| (SmolStr::new(name), value.clone()))
                .collect(),
        ));
        self
    }

    pub fn with_value(mut self, source: &str, value: CapturedValue) -> Self {
        self.values.insert(source.to_string(), value);
        self
    }
}

impl ExpressionEvaluator for MockScope {
    fn evaluate(&mut self, source: &str) -> Result<CapturedValue, EvalError> {
        self.evaluations += 1;
        self.values
            .get(source)
            .cloned()
            .ok_or_else(|| EvalError::new(format!("cannot evaluate {source}")))
    }
}

impl ExecutionScope for MockScope {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&self, depth: usize) -> Option<FrameInfo> {
        self.frames.get(depth).map(|(info, _)| info.clone())
    }

    fn locals(&self, depth: usize) -> Vec<(SmolStr, CapturedValue)> {
        self.frames
            .get(depth)
            .map(|(_, locals)| locals.clone())
            .unwrap_or_default()
    }
}

pub fn parse_tree(source: &str) -> pinpoint_syntax::SyntaxTree {
    let parse = pinpoint_syntax::parse(source);
    assert!(parse.ok(), "unexpected errors: {:?}", parse.errors());
    parse.into_tree()
}

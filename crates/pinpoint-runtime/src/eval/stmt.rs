//! Statement execution.

#![allow(missing_docs)]

use pinpoint_syntax::{NodeId, NodeKind};

use super::Interpreter;
use crate::cache::Script;
use crate::error::RuntimeError;
use crate::value::Value;

/// Statement execution result.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtResult {
    Continue,
    Break,
    LoopContinue,
    Return(Value),
}

impl Interpreter<'_> {
    pub(crate) fn exec(&mut self, script: &Script, node: NodeId) -> Result<StmtResult, RuntimeError> {
        match script.tree.kind(node) {
            NodeKind::StatementList(items) => self.exec_list(script, items),
            NodeKind::Echo(items) => {
                for &item in items {
                    let text = self.eval(script, item)?.to_str()?;
                    self.write(&text);
                }
                Ok(StmtResult::Continue)
            }
            NodeKind::If(branches) => {
                for &branch in branches {
                    let NodeKind::IfBranch { condition, body } = script.tree.kind(branch) else {
                        continue;
                    };
                    let taken = match condition {
                        Some(condition) => self.eval(script, *condition)?.to_bool(),
                        None => true,
                    };
                    if taken {
                        return self.exec(script, *body);
                    }
                }
                Ok(StmtResult::Continue)
            }
            NodeKind::While { condition, body } => {
                while self.eval(script, *condition)?.to_bool() {
                    if let Some(result) = self.loop_body(script, *body)? {
                        return Ok(result);
                    }
                }
                Ok(StmtResult::Continue)
            }
            NodeKind::DoWhile { body, condition } => {
                loop {
                    if let Some(result) = self.loop_body(script, *body)? {
                        return Ok(result);
                    }
                    if !self.eval(script, *condition)?.to_bool() {
                        break;
                    }
                }
                Ok(StmtResult::Continue)
            }
            NodeKind::For {
                init,
                condition,
                step,
                body,
            } => {
                self.eval_list(script, *init)?;
                while self.eval_list(script, *condition)?.is_none_or(|value| value.to_bool()) {
                    if let Some(result) = self.loop_body(script, *body)? {
                        return Ok(result);
                    }
                    self.eval_list(script, *step)?;
                }
                Ok(StmtResult::Continue)
            }
            NodeKind::Foreach {
                subject,
                key,
                value,
                body,
            } => {
                let subject = self.eval(script, *subject)?;
                let entries: Vec<(Value, Value)> = match &subject {
                    Value::Array(array) => array
                        .iter()
                        .map(|(key, value)| (Value::from(key.clone()), value.clone()))
                        .collect(),
                    Value::Object(object) => object
                        .borrow()
                        .properties
                        .iter()
                        .map(|(name, value)| (Value::String(name.clone()), value.clone()))
                        .collect(),
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "foreach() argument must be of type array|object, {} given",
                            other.type_name()
                        )))
                    }
                };
                for (entry_key, entry_value) in entries {
                    if let Some(key) = key {
                        self.assign(script, *key, entry_key)?;
                    }
                    self.assign(script, *value, entry_value)?;
                    if let Some(result) = self.loop_body(script, *body)? {
                        return Ok(result);
                    }
                }
                Ok(StmtResult::Continue)
            }
            NodeKind::Break => Ok(StmtResult::Break),
            NodeKind::Continue => Ok(StmtResult::LoopContinue),
            NodeKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(script, *value)?,
                    None => Value::Null,
                };
                Ok(StmtResult::Return(value))
            }
            NodeKind::FunctionDecl { .. } => {
                self.declare_function(script, node);
                Ok(StmtResult::Continue)
            }
            NodeKind::Class { .. } => {
                self.declare_class(script, node)?;
                Ok(StmtResult::Continue)
            }
            NodeKind::Probe { kind, id } => {
                self.fire_probe(*kind, id);
                Ok(StmtResult::Continue)
            }
            _ => {
                self.eval(script, node)?;
                Ok(StmtResult::Continue)
            }
        }
    }

    fn exec_list(&mut self, script: &Script, items: &[NodeId]) -> Result<StmtResult, RuntimeError> {
        for &item in items {
            self.current.line = script.tree.line(item);
            let result = self.exec(script, item)?;
            if result != StmtResult::Continue {
                return Ok(result);
            }
        }
        Ok(StmtResult::Continue)
    }

    /// Runs a loop body. `Some` means the loop must stop with that result.
    fn loop_body(&mut self, script: &Script, body: NodeId) -> Result<Option<StmtResult>, RuntimeError> {
        Ok(match self.exec(script, body)? {
            StmtResult::Continue | StmtResult::LoopContinue => None,
            StmtResult::Break => Some(StmtResult::Continue),
            result @ StmtResult::Return(_) => Some(result),
        })
    }

    /// Evaluates every expression of an `ExpressionList`; returns the last
    /// value, or `None` for an empty list.
    fn eval_list(&mut self, script: &Script, list: NodeId) -> Result<Option<Value>, RuntimeError> {
        let items = script.tree.kind(list).list_children().unwrap_or_default();
        let mut last = None;
        for &item in items {
            last = Some(self.eval(script, item)?);
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::CodeCache;
    use crate::eval::Interpreter;
    use crate::loader::MemoryLoader;
    use crate::stdlib::StandardLibrary;

    fn run(source: &str) -> String {
        let loader = MemoryLoader::new().with_file("/t.php", source);
        let cache = CodeCache::new();
        let stdlib = StandardLibrary::new();
        let mut interpreter = Interpreter::new(&cache, &loader, &stdlib, None);
        interpreter.run("/t.php").unwrap();
        interpreter.take_output()
    }

    #[test]
    fn test_loops_with_break_and_continue() {
        let source = "<?php\nfor ($i = 0; $i < 10; $i++) {\n  if ($i % 2) { continue; }\n  if ($i > 6) { break; }\n  echo $i;\n}\n";
        assert_eq!(run(source), "0246");
    }

    #[test]
    fn test_foreach_with_keys() {
        let source = "<?php\nforeach (['a' => 1, 'b' => 2] as $k => $v) { echo \"$k=$v;\"; }\n";
        assert_eq!(run(source), "a=1;b=2;");
    }

    #[test]
    fn test_do_while_runs_once() {
        assert_eq!(run("<?php $n = 0; do { echo 'x'; } while ($n > 0);"), "x");
    }

    #[test]
    fn test_elseif_chain() {
        let source = "<?php\n$n = 5;\nif ($n < 3) { echo 'low'; } elseif ($n < 8) { echo 'mid'; } else { echo 'high'; }\n";
        assert_eq!(run(source), "mid");
    }
}

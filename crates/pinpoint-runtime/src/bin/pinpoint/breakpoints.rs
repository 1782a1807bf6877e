//! Breakpoint files for `pinpoint run`.

use std::path::Path;

use anyhow::Context;
use pinpoint_debug::{DebugRequest, LogpointOptions, SnapshotOptions};
use serde::Deserialize;
use smol_str::SmolStr;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakpointFile {
    #[serde(default)]
    pub snapshot: Vec<SnapshotEntry>,
    #[serde(default)]
    pub logpoint: Vec<LogpointEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotEntry {
    pub file: String,
    pub line: u32,
    pub id: Option<String>,
    pub condition: Option<String>,
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default)]
    pub max_stack_depth: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogpointEntry {
    pub file: String,
    pub line: u32,
    pub id: Option<String>,
    pub condition: Option<String>,
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default = "default_level")]
    pub level: String,
    pub format: String,
}

fn default_level() -> String {
    "INFO".to_string()
}

impl BreakpointFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read breakpoints '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid breakpoints '{}'", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Registers every entry on `request`. Returns how many were accepted.
    pub fn register(&self, request: &mut DebugRequest) -> usize {
        let mut accepted = 0;
        for entry in &self.snapshot {
            let options = SnapshotOptions {
                id: entry.id.as_deref().map(SmolStr::new),
                condition: entry.condition.as_deref().map(SmolStr::new),
                expressions: names(&entry.expressions),
                max_stack_depth: entry.max_stack_depth,
                callback: None,
            };
            if request.register_snapshot(&entry.file, entry.line, options) {
                accepted += 1;
            }
        }
        for entry in &self.logpoint {
            let mut options = LogpointOptions::new(entry.level.as_str(), entry.format.as_str());
            options.id = entry.id.as_deref().map(SmolStr::new);
            options.condition = entry.condition.as_deref().map(SmolStr::new);
            options.expressions = names(&entry.expressions);
            if request.register_logpoint(&entry.file, entry.line, options) {
                accepted += 1;
            }
        }
        accepted
    }
}

fn names(items: &[String]) -> Vec<SmolStr> {
    items.iter().map(SmolStr::new).collect()
}

#[cfg(test)]
mod tests {
    use super::BreakpointFile;

    #[test]
    fn test_parse_breakpoint_file() {
        let file = BreakpointFile::parse(
            r#"
[[snapshot]]
file = "index.php"
line = 4
expressions = ["$user"]

[[logpoint]]
file = "/srv/app/cart.php"
line = 10
condition = "$total > 100"
format = "big cart: $0"
expressions = ["$total"]
"#,
        )
        .unwrap();
        assert_eq!(file.snapshot.len(), 1);
        assert_eq!(file.snapshot[0].max_stack_depth, 0);
        assert_eq!(file.logpoint[0].level, "INFO");
        assert!(BreakpointFile::parse("[[snapshot]]\nfile = \"a.php\"\n").is_err());
    }
}

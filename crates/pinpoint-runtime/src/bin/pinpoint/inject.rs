//! `pinpoint inject`.

use std::path::Path;

use anyhow::Context;
use pinpoint_debug::locate_and_splice;
use pinpoint_syntax::ProbeKind;

pub fn run_inject(file: &Path, line: u32, logpoint: bool) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read '{}'", file.display()))?;
    let parse = pinpoint_syntax::parse(&source);
    if let Some(err) = parse.errors().first() {
        anyhow::bail!("{}: {err}", file.display());
    }
    let mut tree = parse.into_tree();
    let kind = if logpoint {
        ProbeKind::Logpoint
    } else {
        ProbeKind::Snapshot
    };
    if !locate_and_splice(&mut tree, line, kind, "cli") {
        anyhow::bail!("no statement to instrument at {}:{line}", file.display());
    }
    print!("{}", tree.dump());
    Ok(())
}

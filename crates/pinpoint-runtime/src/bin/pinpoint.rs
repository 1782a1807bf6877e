//! CLI entrypoint for the pinpoint reference runtime.

#[path = "pinpoint/breakpoints.rs"]
mod breakpoints;
#[path = "pinpoint/cli.rs"]
mod cli;
#[path = "pinpoint/inject.rs"]
mod inject;
#[path = "pinpoint/run.rs"]
mod run;
#[path = "pinpoint/validate.rs"]
mod validate;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = dispatch(Cli::parse()) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run {
            entry,
            config,
            breakpoints,
            source_root,
            requests,
        } => run::run_entry(&run::RunOptions {
            entry,
            config,
            breakpoints,
            source_root,
            requests,
        }),
        Command::Validate {
            expressions,
            config,
        } => {
            if !validate::run_validate(&expressions, config.as_deref())? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Inject {
            file,
            line,
            logpoint,
        } => inject::run_inject(&file, line, logpoint),
    }
}

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use stacklint::config::{Args, Config};
use stacklint::report::write_report;
use stacklint::{CfnLintEngine, EXIT_CONFIG, EXIT_FINDINGS, EXIT_PASS, orchestrator};

fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(args) {
        Ok(true) => ExitCode::from(EXIT_PASS),
        Ok(false) => ExitCode::from(EXIT_FINDINGS),
        Err(err) => {
            eprintln!("stacklint: {:#}", err);
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let config = Config::from_parts(args, std::env::vars()).context("invalid configuration")?;
    log::debug!("{:?}", config);

    let engine = CfnLintEngine::new(&config.engine);
    let result = orchestrator::run(&config, &engine).context("invalid configuration")?;

    let stdout = io::stdout();
    write_report(&mut stdout.lock(), &result, config.format).context("failed to write report")?;

    Ok(result.passed())
}

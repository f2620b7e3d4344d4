//! `red-syntax`: parse Red sources and check the Red grammar.

mod cli;
mod commands;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use tracing::debug;

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);
	debug!(command = ?cli.command, "Starting red-syntax");

	let passed = commands::run(&cli, &mut io::stdout().lock())?;
	Ok(if passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("red_syntax=debug,red_grammar=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(verbose)
		.init();
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "red-syntax")]
#[command(about = "Parse Red sources and check the Red grammar")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Language configuration to use instead of the bundled languages.toml
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// Parse files and print their syntax trees
	Parse {
		/// Source files to parse
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Only report files whose trees contain errors
		#[arg(short, long)]
		quiet: bool,

		/// Print parse statistics
		#[arg(short, long)]
		stat: bool,
	},
	/// Check that the Red grammar loads
	Verify {
		/// Grammar shared library to load instead of the bundled grammar
		#[arg(long, value_name = "PATH")]
		library: Option<PathBuf>,
	},
	/// Print the grammar's node types as JSON
	NodeTypes,
	/// Run the corpus tests in a directory
	Test {
		/// Directory holding `*.txt` corpus files
		dir: PathBuf,
	},
}

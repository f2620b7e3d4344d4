//! Subcommand implementations. Each writes its report to `out` and returns
//! whether everything it checked passed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use red_grammar::GRAMMAR_NAME;
use red_syntax::{
	Language, LanguageConfig, LanguageConfigs, Node, Parser, load_grammar, load_grammar_from_path, node_types_json,
	run_corpus,
};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command};

pub fn run(cli: &Cli, out: &mut impl Write) -> Result<bool> {
	let configs = load_configs(cli.config.as_deref())?;
	match &cli.command {
		Command::Parse { files, quiet, stat } => parse_files(&configs, files, *quiet, *stat, out),
		Command::Verify { library } => verify(library.as_deref(), out),
		Command::NodeTypes => node_types(out),
		Command::Test { dir } => run_tests(dir, out),
	}
}

fn load_configs(path: Option<&Path>) -> Result<LanguageConfigs> {
	match path {
		Some(path) => {
			let configs = LanguageConfigs::load(path)
				.with_context(|| format!("failed to load language config {}", path.display()))?;
			info!(path = %path.display(), languages = configs.len(), "Loaded language config");
			Ok(configs)
		}
		None => Ok(red_grammar::language_configs().clone()),
	}
}

/// Picks the grammar for a file from its extension. Unknown files are parsed as Red.
fn language_for_path(configs: &LanguageConfigs, path: &Path) -> Result<Language> {
	let grammar = match configs.language_for_path(path) {
		Some(config) => config.grammar_name(),
		None => {
			warn!(path = %path.display(), "No language configured for file, assuming Red");
			GRAMMAR_NAME
		}
	};
	if grammar == GRAMMAR_NAME {
		return Ok(red_grammar::verify_grammar_loads()?);
	}
	load_grammar(grammar).with_context(|| format!("failed to load grammar {grammar}"))
}

/// The first error or missing node in document order.
fn first_error<'tree>(root: Node<'tree>) -> Option<Node<'tree>> {
	let mut pending = vec![root];
	while let Some(node) = pending.pop() {
		if node.is_error() || node.is_missing() {
			return Some(node);
		}
		pending.extend(node.children().rev());
	}
	None
}

fn parse_files(
	configs: &LanguageConfigs,
	files: &[PathBuf],
	quiet: bool,
	stat: bool,
	out: &mut impl Write,
) -> Result<bool> {
	let mut parser = Parser::new();
	let mut failed = 0usize;

	for path in files {
		let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		let language = language_for_path(configs, path)?;
		if parser.language() != Some(language) {
			parser.set_language(&language)?;
		}

		let started = Instant::now();
		let tree = parser.parse(&source).context("parser has no language")?;
		let elapsed = started.elapsed();
		let root = tree.root_node();
		debug!(path = %path.display(), bytes = source.len(), ?elapsed, "Parsed file");

		if !quiet {
			writeln!(out, "{}", root.to_sexp())?;
		}
		match first_error(root) {
			Some(error) => {
				failed += 1;
				let label = if error.is_missing() {
					format!("MISSING {}", error.kind())
				} else {
					"ERROR".to_string()
				};
				writeln!(
					out,
					"{}\t{:.2} ms\t({label} [{}] - [{}])",
					path.display(),
					elapsed.as_secs_f64() * 1000.0,
					error.start_position(),
					error.end_position()
				)?;
			}
			None if stat => {
				writeln!(
					out,
					"{}\t{:.2} ms\t{} bytes",
					path.display(),
					elapsed.as_secs_f64() * 1000.0,
					source.len()
				)?;
			}
			None => {}
		}
	}

	if stat {
		let total = files.len();
		let passed = total - failed;
		writeln!(
			out,
			"Total parses: {total}; successful parses: {passed}; failed parses: {failed}; success percentage: {:.2}%",
			passed as f64 * 100.0 / total.max(1) as f64
		)?;
	}
	Ok(failed == 0)
}

fn verify(library: Option<&Path>, out: &mut impl Write) -> Result<bool> {
	let language = match library {
		Some(path) => load_grammar_from_path(path, GRAMMAR_NAME)
			.with_context(|| format!("failed to load grammar library {}", path.display()))?,
		None => red_grammar::verify_grammar_loads()?,
	};
	Parser::new().set_language(&language)?;

	let display_name = red_grammar::language_configs()
		.language_for_name(language.name())
		.map_or(language.name(), LanguageConfig::display_name);
	writeln!(
		out,
		"{display_name} grammar loads: ABI {}, {} node kinds, {} fields",
		language.abi_version(),
		language.node_kind_count(),
		language.field_count()
	)?;
	Ok(true)
}

fn node_types(out: &mut impl Write) -> Result<bool> {
	let language = red_grammar::verify_grammar_loads()?;
	writeln!(out, "{}", node_types_json(&language)?)?;
	Ok(true)
}

fn run_tests(dir: &Path, out: &mut impl Write) -> Result<bool> {
	let language = red_grammar::verify_grammar_loads()?;
	let mut files: Vec<PathBuf> = fs::read_dir(dir)
		.with_context(|| format!("failed to read corpus directory {}", dir.display()))?
		.filter_map(|entry| entry.ok().map(|entry| entry.path()))
		.filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
		.collect();
	files.sort();

	let mut failures = Vec::new();
	for path in &files {
		let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		let outcomes = run_corpus(&language, &text).with_context(|| format!("malformed corpus file {}", path.display()))?;

		let stem = path.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
		writeln!(out, "{stem}:")?;
		for outcome in outcomes {
			let mark = if outcome.passed() { "✓" } else { "✗" };
			writeln!(out, "  {mark} {}", outcome.name)?;
			if !outcome.passed() {
				failures.push(outcome);
			}
		}
	}

	for outcome in &failures {
		writeln!(out, "\n{}:\n  expected: {}\n  actual:   {}", outcome.name, outcome.expected, outcome.actual)?;
	}
	if failures.is_empty() {
		writeln!(out, "\nAll tests passed")?;
	} else {
		writeln!(out, "\n{} failure(s)", failures.len())?;
	}
	Ok(failures.is_empty())
}

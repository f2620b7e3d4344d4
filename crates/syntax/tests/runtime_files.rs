use std::fs;

use pretty_assertions::assert_eq;
use red_syntax::{GrammarError, LanguageConfigError, LanguageConfigs, grammar_library_name, load_grammar_from_dirs};

#[test]
fn test_config_from_file() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = dir.path().join("languages.toml");
	fs::write(
		&path,
		"[[language]]\nname = \"red\"\nfile-types = [\"red\"]\n\n[[language]]\nname = \"red-system\"\ngrammar = \"red\"\nfile-types = [\"reds\"]\n",
	)
	.expect("write config");

	let configs = LanguageConfigs::load(&path).expect("valid config");
	assert_eq!(configs.len(), 2);

	let system = configs
		.language_for_path(&dir.path().join("kernel.reds"))
		.expect("reds entry");
	assert_eq!(system.name, "red-system");
	assert_eq!(system.display_name(), "red-system");
	assert_eq!(system.grammar_name(), "red");
}

#[test]
fn test_unreadable_config() {
	let dir = tempfile::tempdir().expect("tempdir");
	let result = LanguageConfigs::load(&dir.path().join("missing.toml"));
	assert!(matches!(result, Err(LanguageConfigError::Io(_))));

	let path = dir.path().join("languages.toml");
	fs::write(&path, "[[language]]\nfile-types = 3\n").expect("write config");
	assert!(matches!(LanguageConfigs::load(&path), Err(LanguageConfigError::Toml(_))));
}

#[test]
fn test_first_directory_with_library_wins() {
	let empty = tempfile::tempdir().expect("tempdir");
	let runtime = tempfile::tempdir().expect("tempdir");
	fs::write(runtime.path().join(grammar_library_name("red")), b"not a library").expect("write library");

	let dirs = [empty.path().to_path_buf(), runtime.path().to_path_buf()];
	let err = load_grammar_from_dirs("red", &dirs).expect_err("garbage library");
	assert!(matches!(err, GrammarError::LoadError(_)), "{err}");

	let err = load_grammar_from_dirs("red", &dirs[..1]).expect_err("nothing to load");
	assert!(matches!(err, GrammarError::NotFound(ref name) if name == "red"), "{err}");
}

//! Интеграционные тесты бинарника `minic`

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str], source: &str) -> Output {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "input.mc", source);

    Command::new(env!("CARGO_BIN_EXE_minic"))
        .args(args)
        .arg(&file)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Ошибка должна занимать ровно одну строку stderr
fn single_error_line(output: &Output) -> String {
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines.len(), 1, "stderr: {:?}", stderr);
    lines[0].to_string()
}

#[test]
fn test_lex_dump_ends_with_eof() {
    let output = run(&["lex"], "int x = 1;");

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "INT\nIDENTIFIER x\nOPERATOR =\nINT_LITERAL 1\nSEMICOLON\nEOF\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn test_parse_prints_summary_and_ast() {
    let output = run(&["parse"], "int x = 1;");

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Parse successful!\nTop-level items: 1\nProgram\n  VarDecl int x\n    IntLiteral 1\n"
    );
}

#[test]
fn test_check_valid_program() {
    let output = run(
        &["check"],
        "extern int print(int v); def main() -> int { print(1); return 0; }",
    );

    assert!(output.status.success());
    assert_eq!(stdout(&output), "Semantic analysis successful!\n");
    assert!(output.stderr.is_empty());
}

#[test]
fn test_check_show_ast() {
    let output = run(&["check", "--show-ast"], "bool b = true;");

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Semantic analysis successful!\n=== AST ===\nProgram\n  VarDecl bool b\n    BoolLiteral true\n"
    );
}

#[test]
fn test_lexer_failure() {
    let output = run(&["lex"], "string s = \"abc");

    let line = single_error_line(&output);
    assert!(line.starts_with("error[lexer]: Lexer error at line 1"), "{}", line);
    assert!(line.ends_with("unterminated string"), "{}", line);
}

#[test]
fn test_parser_failure() {
    let output = run(&["parse"], "int x = ;");

    let line = single_error_line(&output);
    assert!(line.starts_with("error[parser]: Syntax error at line 1, column 9"), "{}", line);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_semantic_failure() {
    let output = run(&["check"], "def f() -> int { return; }");

    let line = single_error_line(&output);
    assert!(line.starts_with("error[semantics]: Semantic error:"), "{}", line);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_deep_nesting_is_reported_not_crashed() {
    let source = format!("int x = {}1{};", "(".repeat(5_000), ")".repeat(5_000));
    let output = run(&["check"], &source);

    let line = single_error_line(&output);
    assert!(line.starts_with("error[parser]:"), "{}", line);
    assert!(line.contains("Expression nested too deeply"), "{}", line);
}

#[test]
fn test_missing_input_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_minic"))
        .args(["check", "does-not-exist.mc"])
        .output()
        .unwrap();

    let line = single_error_line(&output);
    assert!(line.starts_with("error[io]:"), "{}", line);
}

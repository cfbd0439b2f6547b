// Сквозные тесты конвейера: лексер, парсер, семантика

use minic::error::{SemanticError, SymbolRole};
use minic::ir::ast::{Item, TypeKind};
use minic::{CompileError, compile, parser, semantics};

fn semantic_error(source: &str) -> SemanticError {
    match compile(source) {
        Err(CompileError::SemanticError(err)) => err,
        other => panic!("expected semantic error, got {:?}", other),
    }
}

#[test]
fn test_extern_and_function() {
    let source = "extern print(int x); def add(int a, int b) -> int { return a + b; }";

    let program = parser::parse(source).expect("Parsing failed");
    assert_eq!(program.items.len(), 2);
    match &program.items[..] {
        [Item::Extern(print), Item::Function(add)] => {
            assert_eq!(print.name, "print");
            assert_eq!(print.return_type, TypeKind::Void);
            assert_eq!(add.name, "add");
            assert_eq!(add.return_type, TypeKind::Int);
            assert_eq!(add.params.len(), 2);
        }
        other => panic!("unexpected items {:?}", other),
    }

    semantics::analyze(&program).expect("Analysis failed");
}

#[test]
fn test_variable_redefinition() {
    assert_eq!(
        semantic_error("def f() { int x = 1; int x = 2; }"),
        SemanticError::Redefinition { what: SymbolRole::Variable, name: "x".into() }
    );
}

#[test]
fn test_missing_return_value() {
    assert_eq!(
        semantic_error("def f() -> int { return; }"),
        SemanticError::MissingReturnValue { expected: TypeKind::Int }
    );
}

#[test]
fn test_call_to_parameter() {
    let err = semantic_error("def f(int a) { a(); }");
    assert_eq!(err.to_string(), "call to non-function a");
}

#[test]
fn test_for_loop_variable() {
    let source = "def f() { for (int i = 0; i < 10; i = i + 1) { } }";
    assert!(compile(source).is_ok());
}

#[test]
fn test_larger_program() {
    let source = r#"
        # sums the even numbers below a limit
        extern print_int(int value);
        extern string name();

        def is_even(int n) -> bool {
            return n / 2 * 2 == n;
        }

        def sum_even(int limit) -> int {
            int total = 0;
            for (int i = 0; i < limit; i = i + 1) {
                if (is_even(i)) {
                    total = total + i;
                } else {
                    total = total;
                }
            }
            return total;
        }

        def main() -> int {
            int result = sum_even(10);
            bool big = result > 10 && !(result == 0);
            while (big) {
                print_int(result);
                big = false;
            }
            char c = 'x';
            string s = name();
            float avg = 1.5 * 2.0;
            return helper(result);
        }

        def helper(int x) -> int { return -x; }

        int global = 7;
        print_int(global);
    "#;

    let program = compile(source).expect("Compilation failed");
    assert_eq!(program.items.len(), 8);
}

#[test]
fn test_errors_identify_their_stage() {
    let lex = compile("int s = \"open;").unwrap_err();
    assert_eq!(lex.stage(), "lexer");
    assert!(lex.to_string().contains("unterminated string"));

    let syntax = compile("def f( { }").unwrap_err();
    assert_eq!(syntax.stage(), "parser");
    assert!(syntax.to_string().starts_with("Syntax error at line 1"));

    let semantic = compile("int x = y;").unwrap_err();
    assert_eq!(semantic.stage(), "semantics");
    assert_eq!(semantic.to_string(), "Semantic error: undefined variable y");
}

#[test]
fn test_type_rule_boundaries() {
    assert!(compile("int x = 1 + 2;").is_ok());
    assert!(matches!(
        semantic_error("int x = 1 + 1.5;"),
        SemanticError::OperandMismatch { .. }
    ));
    assert!(compile("bool b = 1 == 1;").is_ok());
    assert!(matches!(
        semantic_error("bool b = true && 1;"),
        SemanticError::InvalidOperand { .. }
    ));
}

#[test]
fn test_inner_variable_not_visible_after_block() {
    assert_eq!(
        semantic_error("def f() { if (true) { int hidden = 1; } int y = hidden; }"),
        SemanticError::UndefinedVariable("hidden".into())
    );
}

use std::io::Write;
use std::process::{Command, Stdio};

use teenyc::error::{CodegenError, CompileError, ParseError};
use teenyc::lexer::{Lexer, TokenType};
use teenyc::parser::Parser;
use teenyc::{compile, CompileResult};

fn compile_ok(source: &str) -> String {
    compile(source).expect("compile should succeed").c_code
}

fn parse_error(result: CompileResult<teenyc::Compilation>) -> ParseError {
    match result {
        Err(CompileError::Parse(e)) => e,
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn let_then_print_declares_int_and_prints_float() {
    let code = compile_ok("LET x = 1\nPRINT x\n");
    let expected = "\
#include <stdio.h>

int main(void) {
    int x = 1;
    printf(\"%.2f\\n\", (float)(x));
    return 0;
}
";
    assert_eq!(code, expected);
}

#[test]
fn repeated_input_reads_without_redeclaring() {
    let code = compile_ok("INPUT x\nINPUT x\n");
    assert_eq!(code.matches("float x;").count(), 1);
    assert_eq!(code.matches("scanf(\"%f\", &x);").count(), 2);
}

#[test]
fn print_string_literal() {
    let code = compile_ok("PRINT \"hello, world\"");
    assert!(code.contains("    printf(\"%s\\n\", \"hello, world\");\n"));
}

#[test]
fn undeclared_variable_is_rejected() {
    let err = parse_error(compile("PRINT x"));
    assert!(matches!(err, ParseError::UndeclaredVariable { ref name, .. } if name == "x"));
}

#[test]
fn duplicate_label_is_rejected() {
    let err = parse_error(compile("LABEL a\nPRINT 1\nLABEL a\n"));
    assert!(matches!(err, ParseError::DuplicateLabel { ref name, .. } if name == "a"));
}

#[test]
fn dangling_goto_is_rejected_after_full_scan() {
    let err = parse_error(compile("GOTO missing\nPRINT 1\n"));
    assert_eq!(
        err,
        ParseError::UndeclaredLabel {
            name: "missing".to_string()
        }
    );

    // A label declared after the GOTO resolves it.
    let code = compile_ok("GOTO later\nPRINT 1\nLABEL later\n");
    assert!(code.contains("    goto later;\n"));
    assert!(code.contains("    later:;\n"));
}

#[test]
fn lex_errors_abort_compilation() {
    for source in ["PRINT \"100%\"", "LET x = 3.", "IF 1 ! 2 THEN", "PRINT ?"] {
        assert!(
            matches!(compile(source), Err(CompileError::Lex(_))),
            "{source}"
        );
    }
}

#[test]
fn lexer_always_terminates_with_eof() {
    for source in ["", "PRINT 1", "# comment only", "LET a = 1\n\n\n"] {
        let tokens = Lexer::new(source).tokenize().unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenType::Eof));
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenType::Eof).count(),
            1
        );
    }
}

#[test]
fn ast_record_is_stable_across_runs() {
    let source = "\
# count down
INPUT n
WHILE n > 0 REPEAT
    IF n == 3 THEN
        PRINT \"three\"
    ENDIF
    LET n = n - 1
ENDWHILE
";
    let first = compile(source).unwrap().ast;
    let second = compile(source).unwrap().ast;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let program = Parser::new(Lexer::new(source)).unwrap().program().unwrap();
    assert_eq!(program.to_record().unwrap(), first);
    assert_eq!(first["statements"][1]["type"], "While");
    assert_eq!(first["statements"][1]["body"][1]["name_token"], "n");
}

#[test]
fn unary_minus_appears_as_subtraction_from_zero() {
    let compilation = compile("LET a = -4\nPRINT a * -2\n").unwrap();
    assert!(compilation.c_code.contains("float a = 0 - 4;"));
    assert!(compilation.c_code.contains("(float)(a * (0 - 2))"));
    assert_eq!(compilation.ast["statements"][0]["value"]["operator"], "-");
    assert_eq!(compilation.ast["statements"][0]["value"]["left"]["value"], "0");
}

#[test]
fn full_program_lowering() {
    let source = "\
PRINT \"How many?\"
INPUT count
LET total = 0
LET i = 1
WHILE i <= count REPEAT
    LET total = total + i
    LET i = i + 1
ENDWHILE
IF total >= 10 THEN
    GOTO big
ENDIF
PRINT total
LABEL big
PRINT \"done\"
";
    let expected = "\
#include <stdio.h>

int main(void) {
    printf(\"%s\\n\", \"How many?\");
    float count;
    scanf(\"%f\", &count);
    int total = 0;
    int i = 1;
    while (i <= count) {
        total = total + i;
        i = i + 1;
    }
    if (total >= 10) {
        goto big;
    }
    printf(\"%.2f\\n\", (float)(total));
    big:;
    printf(\"%s\\n\", \"done\");
    return 0;
}
";
    assert_eq!(compile_ok(source), expected);
}

#[test]
fn compilations_are_independent() {
    compile_ok("LET x = 1.5\n");
    // A fresh compile knows nothing about the previous program's `x`.
    let err = parse_error(compile("PRINT x\n"));
    assert!(matches!(err, ParseError::UndeclaredVariable { .. }));
    let code = compile_ok("LET x = 2\n");
    assert!(code.contains("int x = 2;"));
}

#[test]
fn block_first_assignment_is_visible_after_the_block() {
    let code = compile_ok("LET a = 1\nIF a > 0 THEN\nLET y = 2\nENDIF\nPRINT y\n");
    let expected = "\
int main(void) {
    int y;
    int a = 1;
    if (a > 0) {
        y = 2;
    }
    printf(\"%.2f\\n\", (float)(y));
";
    assert!(code.contains(expected), "{code}");
}

#[test]
fn let_self_reference_without_prior_value_has_no_type() {
    let err = compile("LET x = x\n").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Codegen(CodegenError::UntypedVariable { ref name }) if name == "x"
    ));

    let code = compile_ok("LET x = 1\nLET x = x + 1\n");
    assert!(code.contains("    int x = 1;\n    x = x + 1;\n"));
}

/// Builds `c_code` with the system C compiler and runs it on `stdin`.
/// Returns `None` when no `cc` is installed.
fn run_native(name: &str, c_code: &str, stdin: &str) -> Option<String> {
    if Command::new("cc").arg("--version").output().is_err() {
        eprintln!("cc not found, skipping {name}");
        return None;
    }

    let dir = std::env::temp_dir().join(format!("teenyc-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    let source = dir.join("out.c");
    let binary = dir.join("out");
    std::fs::write(&source, c_code).unwrap();

    let build = Command::new("cc")
        .arg("-std=c99")
        .arg("-o")
        .arg(&binary)
        .arg(&source)
        .output()
        .unwrap();
    assert!(
        build.status.success(),
        "cc rejected the generated code:\n{}\n{}",
        String::from_utf8_lossy(&build.stderr),
        c_code
    );

    let mut child = Command::new(&binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let _ = std::fs::remove_dir_all(&dir);
    Some(String::from_utf8(output.stdout).unwrap())
}

#[test]
fn generated_c_builds_and_runs() {
    let source = "\
PRINT \"start\"
LET n = 3
LET total = 0
WHILE n > 0 REPEAT
    LET total = total + n
    IF n == 2 THEN
        LET half = total / 2
        PRINT \"two\"
    ENDIF
    LET n = n - 1
ENDWHILE
PRINT total
PRINT half
GOTO end
PRINT \"skipped\"
LABEL end
PRINT -1.5
";
    let Some(stdout) = run_native("loops", &compile_ok(source), "") else {
        return;
    };
    assert_eq!(stdout, "start\ntwo\n6.00\n2.00\n-1.50\n");
}

#[test]
fn generated_c_reads_input_inside_blocks() {
    let source = "\
INPUT x
IF x > 1 THEN
    INPUT y
ENDIF
PRINT x + y
";
    let Some(stdout) = run_native("input", &compile_ok(source), "4 2.5\n") else {
        return;
    };
    assert_eq!(stdout, "6.50\n");
}

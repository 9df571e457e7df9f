//! Namespaces, imports and loading files.

mod common;

use common::*;

fn interpreter_at(root: &std::path::Path) -> Interpreter {
    Interpreter::new(Config::new(root))
}

// =============================================================================
// Namespaces
// =============================================================================

#[test]
fn namespace_form_defines_qualified_names() {
    assert_eq!(
        eval_all(&["(namespace math (def pi 3))", "math/pi"]),
        Ok(Value::int(3))
    );
    assert_eq!(
        render_all(&["(namespace math (def pi 3))", "pi"]),
        "error: Unknown identifier 'pi'"
    );
}

#[test]
fn qualified_def_creates_the_namespace() {
    assert_eq!(eval_all(&["(def math/e 2)", "math/e"]), Ok(Value::int(2)));
}

#[test]
fn qualified_set_reaches_into_namespaces() {
    assert_eq!(
        eval_all(&["(def math/e 2)", "(set! math/e 3)", "math/e"]),
        Ok(Value::int(3))
    );
}

#[test]
fn nested_namespaces() {
    assert_eq!(
        eval_all(&["(namespace a/b (def v 1))", "a/b/v"]),
        Ok(Value::int(1))
    );
}

#[test]
fn namespace_paths_are_absolute() {
    assert_eq!(
        eval_all(&["(namespace a (namespace b (def v 2)))", "b/v"]),
        Ok(Value::int(2))
    );
}

#[test]
fn namespaces_see_the_root_and_themselves() {
    assert_eq!(
        eval_all(&[
            "(def base 10)",
            "(namespace m (def v (+ base 1)) (def w m/v))",
            "m/w",
        ]),
        Ok(Value::int(11))
    );
}

#[test]
fn namespaces_are_reopened() {
    assert_eq!(
        eval_all(&[
            "(namespace m (def v 1))",
            "(namespace m (def w (+ v 1)))",
            "m/w",
        ]),
        Ok(Value::int(2))
    );
}

#[test]
fn unknown_namespace() {
    assert_eval_err!("nope/x", "Unknown namespace 'nope'");
    assert_eq!(
        render_all(&["(namespace m (def v 1))", "m/missing"]),
        "error: Unknown identifier 'missing'"
    );
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn import_by_name_resolves_against_the_root() {
    let root = temp_root("by-name");
    write_module(&root, "helpers", "(def square (lambda (x) (* x x)))");
    let interpreter = interpreter_at(&root);
    eval_in(&interpreter, "(import helpers)").unwrap();
    assert_eq!(eval_in(&interpreter, "(square 4)"), Ok(Value::int(16)));
}

#[test]
fn import_returns_the_last_value() {
    let root = temp_root("last-value");
    write_module(&root, "answer", "(def a 1) (+ a 41)");
    let interpreter = interpreter_at(&root);
    assert_eq!(eval_in(&interpreter, "(import answer)"), Ok(Value::int(42)));
}

#[test]
fn import_by_string_path() {
    let root = temp_root("by-path");
    let path = write_module(&root, "consts", "(def seven 7)");
    let interpreter = new_interpreter();
    let source = format!("(import \"{}\")", path.display());
    eval_in(&interpreter, &source).unwrap();
    assert_eq!(eval_in(&interpreter, "seven"), Ok(Value::int(7)));
}

#[test]
fn import_inside_a_namespace() {
    let root = temp_root("in-namespace");
    write_module(&root, "geometry", "(def sides 4)");
    let interpreter = interpreter_at(&root);
    eval_in(&interpreter, "(namespace shape (import geometry))").unwrap();
    assert_eq!(eval_in(&interpreter, "shape/sides"), Ok(Value::int(4)));
    assert!(eval_in(&interpreter, "sides").is_err());
}

#[test]
fn import_reports_parse_failures() {
    let root = temp_root("broken");
    write_module(&root, "broken", "(def x");
    let interpreter = interpreter_at(&root);
    let message = eval_in(&interpreter, "(import broken)").unwrap_err();
    assert!(message.starts_with("error during import of"), "{}", message);
    assert!(message.ends_with("1 unclosed bracket(s) at end of input"), "{}", message);
}

#[test]
fn import_reports_evaluation_failures() {
    let root = temp_root("failing");
    write_module(&root, "failing", "(def ok 1) (error \"module blew up\")");
    let interpreter = interpreter_at(&root);
    assert_eq!(
        eval_in(&interpreter, "(import failing)"),
        Err("module blew up".to_string())
    );
    assert_eq!(eval_in(&interpreter, "ok"), Ok(Value::int(1)));
}

#[test]
fn nested_import_errors_are_not_rewrapped() {
    let root = temp_root("nested");
    write_module(&root, "inner", "(error \"boom\")");
    write_module(&root, "outer", "(import inner)");
    let interpreter = interpreter_at(&root);
    assert_eq!(
        eval_in(&interpreter, "(guard (import outer) (lambda (e) e))"),
        Ok(Value::string("boom"))
    );
}

#[test]
fn nested_read_errors_name_the_broken_module() {
    let root = temp_root("nested-broken");
    write_module(&root, "inner", "(def x");
    write_module(&root, "outer", "(import inner)");
    let interpreter = interpreter_at(&root);
    let message = eval_in(&interpreter, "(import outer)").unwrap_err();
    assert!(message.contains("inner.mo"), "{}", message);
    assert!(!message.contains("outer.mo"), "{}", message);
}

#[test]
fn import_of_a_missing_module() {
    let root = temp_root("missing");
    let interpreter = interpreter_at(&root);
    let message = eval_in(&interpreter, "(import not-there)").unwrap_err();
    assert!(message.starts_with("error during import of"), "{}", message);
}

#[test]
fn import_failures_can_be_guarded() {
    let root = temp_root("guarded");
    let interpreter = interpreter_at(&root);
    assert_eq!(
        eval_in(&interpreter, "(guard (import not-there))"),
        Ok(Value::nil())
    );
}

#[test]
fn import_needs_a_name_or_path() {
    assert_eval_err!(
        "(import 3)",
        "import expected argument 0 of type 'identifier|string', got type 'int'"
    );
}

// =============================================================================
// Loading files
// =============================================================================

#[test]
fn load_file_evaluates_at_the_root() {
    let root = temp_root("load");
    let path = write_module(
        &root,
        "main",
        "(namespace util (def double (lambda (x) (* 2 x))))\n(def result (util/double 21))",
    );
    let interpreter = new_interpreter();
    assert_eq!(interpreter.load_file(&path).unwrap(), Value::int(42));
    assert_eq!(eval_in(&interpreter, "result"), Ok(Value::int(42)));
}

#[test]
fn load_file_of_a_missing_path() {
    let interpreter = new_interpreter();
    assert!(interpreter
        .load_file(temp_root("absent").join("absent.mo"))
        .is_err());
}

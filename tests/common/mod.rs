//! Shared helpers for the integration tests.
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

pub use rust_dmr_sigmo::{Config, Interpreter, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A session with the built-ins installed and imports resolved against the
/// working directory.
pub fn new_interpreter() -> Interpreter {
    Interpreter::new(Config::default())
}

/// Evaluate `source` in a fresh session. Errors come back as their message.
pub fn eval_str(source: &str) -> Result<Value, String> {
    eval_in(&new_interpreter(), source)
}

pub fn eval_in(interpreter: &Interpreter, source: &str) -> Result<Value, String> {
    interpreter.eval_str(source).map_err(|e| e.to_string())
}

/// Evaluate each snippet in turn in one session, returning the last result.
/// Snippets are read separately, so a bare identifier can follow a form.
pub fn eval_all(snippets: &[&str]) -> Result<Value, String> {
    let interpreter = new_interpreter();
    let mut last = Value::nil();
    for snippet in snippets {
        last = eval_in(&interpreter, snippet)?;
    }
    Ok(last)
}

/// Render the result of `eval_all`, or the error message.
pub fn render_all(snippets: &[&str]) -> String {
    match eval_all(snippets) {
        Ok(value) => value.to_string(),
        Err(message) => format!("error: {}", message),
    }
}

/// A fresh directory under the system temp dir, unique to this process and
/// `tag`.
pub fn temp_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sigmo-test-{}-{}", std::process::id(), tag));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn write_module(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(format!("{}.mo", name));
    fs::write(&path, source).expect("write module");
    path
}

#[macro_export]
macro_rules! assert_eval {
    ($source:expr, $expected:expr) => {
        assert_eq!(
            eval_str($source).expect("evaluation failed"),
            $expected,
            "evaluating {}",
            $source
        )
    };
}

#[macro_export]
macro_rules! assert_eval_err {
    ($source:expr, $message:expr) => {
        match eval_str($source) {
            Err(message) => assert_eq!(message, $message, "evaluating {}", $source),
            Ok(value) => panic!("{} evaluated to {} instead of failing", $source, value),
        }
    };
}

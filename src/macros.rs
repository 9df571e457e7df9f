//! Macro invocation.
//!
//! A macro call binds each parameter to the *unevaluated* argument form in
//! the same position, copies the body with those forms substituted in, and
//! evaluates the copy in the caller's context. Nothing is renamed, so the
//! substituted code reads and writes the caller's bindings.

use crate::context::Context;
use crate::evaluator::{self, Result};
use crate::types::{Atom, List, Macro, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub enum MacroError {
    NotEnoughArguments {
        name: String,
        expected: usize,
        got: usize,
    },
    BadParameter {
        name: String,
        got: &'static str,
    },
    SpliceNonList {
        parameter: String,
        got: &'static str,
    },
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroError::NotEnoughArguments {
                name,
                expected,
                got,
            } => write!(
                f,
                "Not enough arguments to macro '{}'. Expected {}, got {}.",
                name, expected, got
            ),
            MacroError::BadParameter { name, got } => write!(
                f,
                "Cannot use type '{}' in argument list of macro '{}'",
                got, name
            ),
            MacroError::SpliceNonList { parameter, got } => write!(
                f,
                "Cannot splice '{}' of type '{}' into a macro body",
                parameter, got
            ),
        }
    }
}

/// Parameter name to the form it stands for. An expansion parameter maps to
/// a list of every remaining form.
pub type Substitutions = HashMap<String, Value>;

pub fn bind_arguments(m: &Macro, actual: &[Value]) -> std::result::Result<Substitutions, MacroError> {
    let required = m
        .parameters
        .iter()
        .take_while(|p| !matches!(p, Value::Atom(Atom::Expansion(_))))
        .count();
    if actual.len() < required {
        return Err(MacroError::NotEnoughArguments {
            name: m.name.clone(),
            expected: required,
            got: actual.len(),
        });
    }

    let mut table = Substitutions::new();
    for (i, parameter) in m.parameters.iter().enumerate() {
        match parameter {
            Value::Atom(Atom::Identifier(name)) => {
                table.insert(name.clone(), actual[i].clone());
            }
            Value::Atom(Atom::Expansion(name)) => {
                table.insert(name.clone(), Value::wrap_list(actual[i..].to_vec()));
                break;
            }
            other => {
                return Err(MacroError::BadParameter {
                    name: m.name.clone(),
                    got: other.type_name(),
                })
            }
        }
    }
    Ok(table)
}

/// Build a substituted copy of `form`. The input is never modified.
pub fn substitute(form: &Value, table: &Substitutions) -> std::result::Result<Value, MacroError> {
    match form {
        Value::Atom(Atom::Identifier(name)) => Ok(match table.get(name) {
            Some(replacement) => replacement.deep_copy(),
            None => form.clone(),
        }),
        Value::List(list) => {
            let mut children = Vec::with_capacity(list.len());
            for child in list.iter() {
                if let Value::Atom(Atom::Expansion(name)) = child {
                    if let Some(replacement) = table.get(name) {
                        let spliced = replacement
                            .as_list()
                            .map_err(|e| MacroError::SpliceNonList {
                                parameter: name.clone(),
                                got: e.got,
                            })?;
                        children.extend(spliced.iter().map(Value::deep_copy));
                        continue;
                    }
                }
                children.push(substitute(child, table)?);
            }
            Ok(Value::List(Rc::new(List {
                children,
                quoted: list.quoted,
            })))
        }
        _ => Ok(form.deep_copy()),
    }
}

/// `form` is the whole call, macro name included.
pub fn call_macro(m: &Macro, form: &List, ctx: &Rc<Context>) -> Result {
    let actual = form.get(1..).unwrap_or(&[]);
    let table = bind_arguments(m, actual)?;
    let mut last = Value::nil();
    for body in &m.body {
        let expanded = substitute(body, &table)?;
        log::trace!("macro {} expanded to {}", m.name, expanded);
        last = evaluator::eval(&expanded, ctx)?;
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    fn form(source: &str) -> Value {
        read_str(source).unwrap().remove(0)
    }

    fn make_macro(parameters: &str, body: &str) -> Macro {
        Macro {
            name: "m".into(),
            parameters: form(parameters).as_list().unwrap().clone(),
            body: vec![form(body)],
        }
    }

    #[test]
    fn identifiers_are_replaced_by_forms() {
        let m = make_macro("(x)", "(do x x)");
        let table = bind_arguments(&m, &[form("(set! y (+ y 1))")]).unwrap();
        let expanded = substitute(&m.body[0], &table).unwrap();
        assert_eq!(expanded.to_string(), "(do (set! y (+ y 1)) (set! y (+ y 1)))");
    }

    #[test]
    fn expansions_are_spliced() {
        let m = make_macro("(rest...)", "(list rest...)");
        let args = [Value::int(1), Value::int(2), Value::int(3)];
        let table = bind_arguments(&m, &args).unwrap();
        let expanded = substitute(&m.body[0], &table).unwrap();
        assert_eq!(expanded.to_string(), "(list 1 2 3)");
    }

    #[test]
    fn expansion_may_be_empty() {
        let m = make_macro("(a rest...)", "(f a rest...)");
        let table = bind_arguments(&m, &[Value::int(1)]).unwrap();
        let expanded = substitute(&m.body[0], &table).unwrap();
        assert_eq!(expanded.to_string(), "(f 1)");
    }

    #[test]
    fn substitution_reaches_quoted_lists() {
        let m = make_macro("(x)", "'(x (x))");
        let table = bind_arguments(&m, &[Value::identifier("y")]).unwrap();
        let expanded = substitute(&m.body[0], &table).unwrap();
        assert_eq!(expanded.to_string(), "'(y (y))");
    }

    #[test]
    fn definition_body_is_left_alone() {
        let m = make_macro("(x)", "(g x)");
        let table = bind_arguments(&m, &[Value::int(9)]).unwrap();
        substitute(&m.body[0], &table).unwrap();
        assert_eq!(m.body[0].to_string(), "(g x)");
    }

    #[test]
    fn splicing_a_non_list_is_an_error() {
        let m = make_macro("(x)", "(f x...)");
        let table = bind_arguments(&m, &[Value::int(1)]).unwrap();
        assert!(matches!(
            substitute(&m.body[0], &table),
            Err(MacroError::SpliceNonList { .. })
        ));
    }

    #[test]
    fn missing_arguments_are_reported() {
        let m = make_macro("(a b)", "(f a b)");
        let err = bind_arguments(&m, &[Value::int(1)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not enough arguments to macro 'm'. Expected 2, got 1."
        );
    }
}

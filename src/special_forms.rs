use crate::context::Context;
use crate::evaluator::{call_function, eval, evaluate_body, Error, Result};
use crate::macros::call_macro;
use crate::reader;
use crate::types::{truthy, Arity, Atom, Function, Lambda, List, Macro, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::read_to_string;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A special form sees its whole call, keyword included, unevaluated.
pub type SpecialForm = fn(&List, &Rc<Context>) -> Result;

#[derive(Debug)]
pub enum FormError {
    WrongType {
        form: &'static str,
        position: usize,
        expected: &'static str,
        got: &'static str,
    },
    BadForBinding,
    ForSourceNotList(&'static str),
    LetNameNotIdentifier(&'static str),
    CondClauseNotList(&'static str),
    CondClauseLength(usize),
    GuardHandler(&'static str),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::WrongType {
                form,
                position,
                expected,
                got,
            } => write!(
                f,
                "{} expected argument {} of type '{}', got type '{}'",
                form, position, expected, got
            ),
            FormError::BadForBinding => write!(
                f,
                "First argument to 'for' must be a list of form '(identifier list)'"
            ),
            FormError::ForSourceNotList(t) => write!(
                f,
                "Second argument of 'for' parameters must evaluate to a list, not '{}'",
                t
            ),
            FormError::LetNameNotIdentifier(t) => write!(
                f,
                "Even parameters to 'let' must be identifiers, not '{}'",
                t
            ),
            FormError::CondClauseNotList(t) => write!(
                f,
                "Statements in body of 'cond' must be of type 'list', not '{}'",
                t
            ),
            FormError::CondClauseLength(n) => write!(
                f,
                "Statements in body of 'cond' should have length of two (bool body), not {}",
                n
            ),
            FormError::GuardHandler(t) => write!(
                f,
                "guard expected argument 1 of type 'function', got type '{}'",
                t
            ),
        }
    }
}

lazy_static! {
    static ref SPECIAL_FORMS: HashMap<&'static str, SpecialForm> = {
        let mut forms: HashMap<&'static str, SpecialForm> = HashMap::new();
        forms.insert("lambda", apply_lambda);
        forms.insert("def", apply_def);
        forms.insert("do", apply_do);
        forms.insert("if", apply_if);
        forms.insert("while", apply_while);
        forms.insert("for", apply_for);
        forms.insert("let", apply_let);
        forms.insert("assert", apply_assert);
        forms.insert("set!", apply_set);
        forms.insert("namespace", apply_namespace);
        forms.insert("import", apply_import);
        forms.insert("guard", apply_guard);
        forms.insert("cond", apply_cond);
        forms.insert("macro", apply_macro);
        forms.insert("input", apply_input);
        forms
    };
}

pub fn lookup(name: &str) -> Option<SpecialForm> {
    SPECIAL_FORMS.get(name).copied()
}

pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains_key(name)
}

/// The operands of a form, after validating how many there are.
fn operands<'a>(form: &'a List, arity: Arity, name: &'static str) -> Result<&'a [Value]> {
    let args = form.get(1..).unwrap_or(&[]);
    arity.validate_for(args.len(), name)?;
    Ok(args)
}

fn identifier<'a>(form: &'static str, position: usize, value: &'a Value) -> Result<&'a str> {
    value.as_identifier().map_err(|e| {
        FormError::WrongType {
            form,
            position,
            expected: "identifier",
            got: e.got,
        }
        .into()
    })
}

fn list<'a>(form: &'static str, position: usize, value: &'a Value) -> Result<&'a Rc<List>> {
    value.as_list().map_err(|e| {
        FormError::WrongType {
            form,
            position,
            expected: "list",
            got: e.got,
        }
        .into()
    })
}

fn apply_lambda(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::at_least(2), "lambda")?;
    let parameters = list("lambda", 0, &args[0])?.clone();
    let lambda = Lambda {
        parameters,
        body: args[1..].to_vec(),
        captured: ctx.copy_locals(),
    };
    Ok(Value::Function(Function::Lambda(Rc::new(lambda))))
}

fn apply_def(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::exactly(2), "def")?;
    let name = identifier("def", 0, &args[0])?;
    let value = eval(&args[1], ctx)?;
    log::debug!("define {} as {}", name, value);
    ctx.set(name, value.clone());
    Ok(value)
}

fn apply_do(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::at_least(0), "do")?;
    evaluate_body(args, ctx)
}

fn apply_if(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::Between(2..=3), "if")?;
    match (truthy(&eval(&args[0], ctx)?), args.get(2)) {
        (true, _) => eval(&args[1], ctx),
        (false, Some(otherwise)) => eval(otherwise, ctx),
        (false, None) => Ok(Value::nil()),
    }
}

fn apply_while(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::at_least(1), "while")?;
    let (test, body) = (&args[0], &args[1..]);
    let mut last = Value::nil();
    while truthy(&eval(test, ctx)?) {
        for statement in body {
            last = eval(statement, ctx)?;
        }
    }
    Ok(last)
}

fn apply_for(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::exactly(2), "for")?;
    let binding = match &args[0] {
        Value::List(binding) if binding.len() == 2 => binding,
        _ => return Err(FormError::BadForBinding.into()),
    };
    let name = binding[0]
        .as_identifier()
        .map_err(|_| FormError::BadForBinding)?;

    let inner = Context::spawn_from(ctx);
    let source = eval(&binding[1], &inner)?;
    let source = source
        .as_list()
        .map_err(|e| FormError::ForSourceNotList(e.got))?;
    let mut results = Vec::with_capacity(source.len());
    for item in source.iter() {
        let item = eval(item, &inner)?;
        inner.set(name, item);
        results.push(eval(&args[1], &inner)?);
    }
    Ok(Value::wrap_list(results))
}

fn apply_let(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::at_least(1), "let")?;
    let bindings = list("let", 0, &args[0])?;
    let inner = Context::spawn_from(ctx);
    for pair in bindings.chunks(2) {
        let name = pair[0]
            .as_identifier()
            .map_err(|e| FormError::LetNameNotIdentifier(e.got))?;
        let value = match pair.get(1) {
            Some(expr) => eval(expr, &inner)?,
            None => Value::nil(),
        };
        inner.set(name, value);
    }
    evaluate_body(&args[1..], &inner)
}

fn apply_assert(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::exactly(1), "assert")?;
    match truthy(&eval(&args[0], ctx)?) {
        true => Ok(Value::bool(true)),
        false => Err(Error::AssertionFailed(args[0].to_string())),
    }
}

fn apply_set(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::exactly(2), "set!")?;
    let name = identifier("set!", 0, &args[0])?;
    let value = eval(&args[1], ctx)?;
    ctx.set_existing(name, value.clone())?;
    Ok(value)
}

fn apply_namespace(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::at_least(1), "namespace")?;
    let path = identifier("namespace", 0, &args[0])?;
    let target = ctx.namespace(path);
    evaluate_body(&args[1..], &target)
}

fn apply_import(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::exactly(1), "import")?;
    let path = match &args[0] {
        Value::Atom(Atom::Identifier(name)) => ctx.config().module_path(name),
        Value::Atom(Atom::String(path)) => PathBuf::from(path),
        other => {
            return Err(FormError::WrongType {
                form: "import",
                position: 0,
                expected: "identifier|string",
                got: other.type_name(),
            }
            .into())
        }
    };
    log::info!("import {}", path.display());
    let forms = read_module(&path).map_err(|cause| Error::Import {
        path,
        cause: Box::new(cause),
    })?;
    evaluate_body(&forms, ctx)
}

/// Reading and parsing failures are reported against the module path;
/// errors raised by the module's own forms pass through unchanged.
fn read_module(path: &Path) -> Result<Vec<Value>> {
    let source = read_to_string(path)?;
    Ok(reader::read_str(&source)?)
}

fn apply_guard(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::Between(1..=2), "guard")?;
    let error = match eval(&args[0], ctx) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    log::debug!("guard caught: {}", error);
    let message = Value::string(error.to_string());
    let handler = match args.get(1) {
        Some(handler) => eval(handler, ctx)?,
        None => return Ok(Value::nil()),
    };
    match handler {
        Value::Function(f) => call_function(&f, &[message], ctx),
        Value::Macro(m) => call_macro(&m, &List::new(vec![Value::nil(), message]), ctx),
        other => Err(FormError::GuardHandler(other.type_name()).into()),
    }
}

fn apply_cond(form: &List, ctx: &Rc<Context>) -> Result {
    let clauses = operands(form, Arity::at_least(0), "cond")?;
    for clause in clauses {
        let clause = clause
            .as_list()
            .map_err(|e| FormError::CondClauseNotList(e.got))?;
        if clause.len() != 2 {
            return Err(FormError::CondClauseLength(clause.len()).into());
        }
        if truthy(&eval(&clause[0], ctx)?) {
            return eval(&clause[1], ctx);
        }
    }
    Ok(Value::nil())
}

fn apply_macro(form: &List, ctx: &Rc<Context>) -> Result {
    let args = operands(form, Arity::at_least(3), "macro")?;
    let name = identifier("macro", 0, &args[0])?;
    let parameters = list("macro", 1, &args[1])?.clone();
    let value = Value::Macro(Rc::new(Macro {
        name: name.into(),
        parameters,
        body: args[2..].to_vec(),
    }));
    log::debug!("define macro {}", name);
    ctx.set(name, value.clone());
    Ok(value)
}

fn apply_input(form: &List, _ctx: &Rc<Context>) -> Result {
    operands(form, Arity::exactly(0), "input")?;
    read_input_line(&mut std::io::stdin().lock())
}

/// One line, trailing newline included. A closed stream is an error.
fn read_input_line<R: BufRead>(reader: &mut R) -> Result {
    let mut line = String::new();
    match reader.read_line(&mut line)? {
        0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input").into()),
        _ => Ok(Value::string(line)),
    }
}

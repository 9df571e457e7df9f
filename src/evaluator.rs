use crate::context::Context;
use crate::macros::{self, MacroError};
use crate::reader::{self, ReadError};
use crate::signature::{self, SignatureError};
use crate::special_forms::{self, FormError};
use crate::types::{
    Atom, BadArgCount, Function, Hash, HashKey, Int, Lambda, List, TypeMismatch, TypedId, Value,
};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

pub type Result<T = Value> = std::result::Result<T, Error>;

/// Every failure in the language. An `Err` is the language's error value: it
/// short-circuits evaluation until a `guard` turns it into a string.
#[derive(Debug)]
pub enum Error {
    UnknownIdentifier(String),
    UnknownNamespace(String),
    CannotExpand(&'static str),
    BadHashKey(&'static str),
    Signature(SignatureError),
    Parameter(ParameterError),
    Macro(MacroError),
    Form(FormError),
    BadArgCount(BadArgCount),
    AssertionFailed(String),
    ReadError(ReadError),
    IOError(std::io::Error),
    Import { path: PathBuf, cause: Box<Error> },
    TypeMismatch(TypeMismatch),
    DivideByZero,
    BadIndex(Int),
    EmptyList(&'static str),
    NotANumber { text: String, target: &'static str },
    User(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownIdentifier(name) => write!(f, "Unknown identifier '{}'", name),
            Error::UnknownNamespace(path) => write!(f, "Unknown namespace '{}'", path),
            Error::CannotExpand(t) => write!(f, "Cannot expand value of type '{}'", t),
            Error::BadHashKey(t) => write!(
                f,
                "Hash keys must be of type 'string' or 'symbol', not '{}'",
                t
            ),
            Error::Signature(e) => write!(f, "{}", e),
            Error::Parameter(e) => write!(f, "{}", e),
            Error::Macro(e) => write!(f, "{}", e),
            Error::Form(e) => write!(f, "{}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::AssertionFailed(form) => write!(f, "Assert failed '{}'", form),
            Error::ReadError(e) => write!(f, "{}", e),
            Error::IOError(e) => write!(f, "{}", e),
            Error::Import { path, cause } => {
                write!(f, "error during import of '{}': {}", path.display(), cause)
            }
            Error::TypeMismatch(e) => write!(f, "{}", e),
            Error::DivideByZero => write!(f, "Division by zero"),
            Error::BadIndex(i) => write!(f, "Index '{}' out of list bounds.", i),
            Error::EmptyList(name) => write!(f, "Cannot take '{}' of an empty list", name),
            Error::NotANumber { text, target } => {
                write!(f, "Could not convert string '{}' to {}.", text, target)
            }
            Error::User(message) => write!(f, "{}", message),
        }
    }
}

impl From<SignatureError> for Error {
    fn from(e: SignatureError) -> Self {
        Self::Signature(e)
    }
}

impl From<ParameterError> for Error {
    fn from(e: ParameterError) -> Self {
        Self::Parameter(e)
    }
}

impl From<MacroError> for Error {
    fn from(e: MacroError) -> Self {
        Self::Macro(e)
    }
}

impl From<FormError> for Error {
    fn from(e: FormError) -> Self {
        Self::Form(e)
    }
}

impl From<BadArgCount> for Error {
    fn from(e: BadArgCount) -> Self {
        Self::BadArgCount(e)
    }
}

impl From<ReadError> for Error {
    fn from(e: ReadError) -> Self {
        Self::ReadError(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

impl From<TypeMismatch> for Error {
    fn from(e: TypeMismatch) -> Self {
        Self::TypeMismatch(e)
    }
}

#[derive(Debug)]
pub enum ParameterError {
    MissingArgument(String),
    WrongType {
        name: String,
        expected: String,
        got: &'static str,
    },
    BadParameter(&'static str),
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::MissingArgument(name) => {
                write!(f, "Not enough arguments: no value for parameter '{}'", name)
            }
            ParameterError::WrongType {
                name,
                expected,
                got,
            } => write!(
                f,
                "Parameter '{}' expected type '{}', got type '{}'",
                name, expected, got
            ),
            ParameterError::BadParameter(t) => {
                write!(f, "Cannot use type '{}' in function argument list", t)
            }
        }
    }
}

pub fn eval(value: &Value, ctx: &Rc<Context>) -> Result {
    match value {
        Value::Atom(Atom::Identifier(name)) | Value::Atom(Atom::Expansion(name)) => ctx.get(name),
        Value::List(list) => eval_list(list, ctx),
        Value::Hash(hash) => eval_hash(hash, ctx),
        _ => Ok(value.clone()),
    }
}

fn eval_list(list: &Rc<List>, ctx: &Rc<Context>) -> Result {
    if list.quoted {
        return Ok(Value::List(list.clone()));
    }
    let (head, rest) = match list.split_first() {
        Some(split) => split,
        None => return Ok(Value::new_list()),
    };
    if let Value::Atom(Atom::Identifier(name)) = head {
        if let Some(form) = special_forms::lookup(name) {
            log::trace!("special form {}", name);
            return form(list, ctx);
        }
    }

    let mut output = Vec::with_capacity(list.len());
    match head {
        Value::Atom(Atom::Expansion(_)) => push_evaluated(&mut output, head, ctx)?,
        _ => match eval(head, ctx)? {
            Value::Macro(m) => return macros::call_macro(&m, list, ctx),
            first => output.push(first),
        },
    }
    for child in rest {
        push_evaluated(&mut output, child, ctx)?;
    }

    match output.split_first() {
        Some((Value::Function(f), args)) => call_function(f, args, ctx),
        _ => Ok(Value::wrap_list(output)),
    }
}

fn push_evaluated(output: &mut Vec<Value>, child: &Value, ctx: &Rc<Context>) -> Result<()> {
    match child {
        Value::Atom(Atom::Expansion(_)) => {
            let value = eval(child, ctx)?;
            let list = value.as_list().map_err(|e| Error::CannotExpand(e.got))?;
            output.extend(list.iter().cloned());
        }
        _ => output.push(eval(child, ctx)?),
    }
    Ok(())
}

fn eval_hash(hash: &Rc<Hash>, ctx: &Rc<Context>) -> Result {
    if hash.is_materialized() {
        return Ok(Value::Hash(hash.clone()));
    }
    let mut entries = HashMap::new();
    for pair in hash.pending().chunks(2) {
        let key = eval(&pair[0], ctx)?;
        let key = HashKey::from_value(&key).ok_or_else(|| Error::BadHashKey(key.type_name()))?;
        let value = match pair.get(1) {
            Some(form) => eval(form, ctx)?,
            None => Value::nil(),
        };
        entries.insert(key, value);
    }
    Ok(Value::Hash(Rc::new(Hash::from_entries(entries))))
}

/// Evaluate `forms` in order, returning the last value (`nil` when empty).
pub fn evaluate_body(forms: &[Value], ctx: &Rc<Context>) -> Result {
    let mut last = Value::nil();
    for form in forms {
        last = eval(form, ctx)?;
    }
    Ok(last)
}

/// Read `source` and evaluate each top-level form in `ctx`.
pub fn eval_source(source: &str, ctx: &Rc<Context>) -> Result {
    let forms = reader::read_str(source)?;
    evaluate_body(&forms, ctx)
}

pub(crate) fn pretty_print_args(args: &[Value]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_function(function: &Function, args: &[Value], ctx: &Rc<Context>) -> Result {
    log::trace!("Call {} with {}", function.name(), pretty_print_args(args));
    let result = match function {
        Function::Primitive(f) => signature::check(f.name, f.signature, args)
            .map_err(Error::from)
            .and_then(|_| (f.fn_ptr)(args, ctx)),
        Function::Lambda(lambda) => call_lambda(lambda, args, ctx),
    };
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", function.name(), val),
        Err(e) => log::trace!("Call to {} failed: {}", function.name(), e),
    }
    result
}

/// The call runs in a child of the *calling* context, seeded with a fresh copy
/// of the values captured when the lambda was made. Names missing from the
/// snapshot resolve through the caller's chain.
fn call_lambda(lambda: &Lambda, args: &[Value], ctx: &Rc<Context>) -> Result {
    let inner = Context::spawn_from(ctx);
    for (name, value) in &lambda.captured {
        inner.set_local(name.clone(), value.deep_copy());
    }
    bind_parameters(&lambda.parameters, args, &inner, ctx)?;
    evaluate_body(&lambda.body, &inner)
}

/// Binds into `ctx`; converters for typed parameters are looked up in
/// `caller`.
pub(crate) fn bind_parameters(
    parameters: &[Value],
    args: &[Value],
    ctx: &Rc<Context>,
    caller: &Rc<Context>,
) -> Result<()> {
    let mut args = args.iter();
    for parameter in parameters {
        match parameter {
            Value::Atom(Atom::Identifier(name)) => {
                let arg = args
                    .next()
                    .ok_or_else(|| ParameterError::MissingArgument(name.clone()))?;
                ctx.set(name, arg.deep_copy());
            }
            Value::Atom(Atom::Expansion(name)) => {
                let rest = args.by_ref().map(Value::deep_copy).collect();
                ctx.set(name, Value::wrap_list(rest));
                break;
            }
            Value::Atom(Atom::TypedId(id)) => {
                let arg = args
                    .next()
                    .ok_or_else(|| ParameterError::MissingArgument(id.name().into()))?;
                let value = coerce(id, arg, caller)?;
                ctx.set(id.name(), value);
            }
            other => return Err(ParameterError::BadParameter(other.type_name()).into()),
        }
    }
    Ok(())
}

/// A typed parameter takes a matching argument as is; otherwise a function
/// named after the type converts it.
fn coerce(id: &TypedId, arg: &Value, ctx: &Rc<Context>) -> Result {
    if arg.type_name() == id.type_name() {
        return Ok(arg.deep_copy());
    }
    match ctx.get(id.type_name()) {
        Ok(Value::Function(converter)) => {
            log::trace!("convert {} to {}", arg, id.type_name());
            call_function(&converter, std::slice::from_ref(arg), ctx)
        }
        _ => Err(ParameterError::WrongType {
            name: id.name().into(),
            expected: id.type_name().into(),
            got: arg.type_name(),
        }
        .into()),
    }
}

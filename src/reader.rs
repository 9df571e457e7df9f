use crate::tokens::{tokenize, Token};
use crate::types::{Atom, Hash, List, TypedId, Value};
use regex::Regex;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub enum ReadError {
    InvalidToken(String),
    UnexpectedClose(char),
    MismatchedClose { expected: char, found: char },
    Unclosed(usize),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::InvalidToken(token) => write!(f, "Invalid token '{}'", token),
            ReadError::UnexpectedClose(c) => {
                write!(f, "Unexpected token '{}' (no matching open bracket)", c)
            }
            ReadError::MismatchedClose { expected, found } => {
                write!(f, "Unexpected token '{}' (expected '{}')", found, expected)
            }
            ReadError::Unclosed(n) => write!(f, "{} unclosed bracket(s) at end of input", n),
        }
    }
}

pub type Result<T = Vec<Value>> = std::result::Result<T, ReadError>;

lazy_static! {
    static ref IDENTIFIER_RE: Regex =
        Regex::new(r"^[\w$!+\-=<>*/](?:[/-]\w|[\w$])*[?!*]?(?:\.\.\.)?$").unwrap();
    static ref SYMBOL_RE: Regex = Regex::new(r"^:\w(?:-\w|[\w$])*$").unwrap();
}

pub fn is_identifier(token: &str) -> bool {
    IDENTIFIER_RE.is_match(token)
}

pub fn is_symbol(token: &str) -> bool {
    SYMBOL_RE.is_match(token)
}

fn is_number_like(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit())
}

/// Decide what kind of atom a token is. Tokens opening with a quote can only
/// ever be strings, so the `...` and `#` rules are skipped for them.
pub fn categorize(token: &str) -> Result<Value> {
    let invalid = || ReadError::InvalidToken(token.into());
    if !token.starts_with('"') {
        if let Some(name) = token.strip_suffix("...") {
            return match is_identifier(name) {
                true => Ok(Atom::Expansion(name.into()).into()),
                false => Err(invalid()),
            };
        }
        if let Some(name) = token.strip_prefix('#') {
            return match is_identifier(name) {
                true => Ok(Atom::Type(name.into()).into()),
                false => Err(invalid()),
            };
        }
        if let Some(i) = token.find('#') {
            return match is_identifier(&token[..i]) && is_identifier(&token[i + 1..]) {
                true => Ok(Atom::TypedId(TypedId(token.into())).into()),
                false => Err(invalid()),
            };
        }
    }

    match token {
        "true" => return Ok(Value::bool(true)),
        "false" => return Ok(Value::bool(false)),
        "nil" => return Ok(Value::nil()),
        _ => (),
    }
    if let Ok(i) = token.parse::<i64>() {
        return Ok(Value::int(i));
    }
    if is_number_like(token) {
        if let Ok(f) = token.parse::<f64>() {
            return Ok(Value::float(f));
        }
    }
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return Ok(Value::string(&token[1..token.len() - 1]));
    }
    if is_identifier(token) {
        return Ok(Value::identifier(token));
    }
    if is_symbol(token) {
        return Ok(Atom::Symbol(token.into()).into());
    }
    Err(invalid())
}

enum Container {
    List(List),
    Hash(Hash),
}

impl Container {
    fn push(&mut self, value: Value) {
        match self {
            Container::List(list) => list.push(value),
            Container::Hash(hash) => hash.push_pending(value),
        }
    }

    fn closer(&self) -> char {
        match self {
            Container::List(_) => ')',
            Container::Hash(_) => '}',
        }
    }
}

/// Build values from tokens. A bare atom read while no container is open is
/// returned on its own straight away.
pub fn parse(tokens: &[Token]) -> Result {
    let mut output = Vec::new();
    let mut stack: Vec<Container> = Vec::new();
    for token in tokens {
        match token.as_str() {
            "(" => stack.push(Container::List(List::default())),
            "'(" => stack.push(Container::List(List::quoted(Vec::new()))),
            "{" => stack.push(Container::Hash(Hash::literal())),
            ")" | "}" => {
                let found = if token == ")" { ')' } else { '}' };
                let finished = match stack.pop() {
                    Some(Container::List(list)) if found == ')' => Value::List(Rc::new(list)),
                    Some(Container::Hash(hash)) if found == '}' => Value::Hash(Rc::new(hash)),
                    Some(container) => {
                        return Err(ReadError::MismatchedClose {
                            expected: container.closer(),
                            found,
                        })
                    }
                    None => return Err(ReadError::UnexpectedClose(found)),
                };
                match stack.last_mut() {
                    Some(top) => top.push(finished),
                    None => output.push(finished),
                }
            }
            _ => {
                let atom = categorize(token)?;
                match stack.last_mut() {
                    Some(top) => top.push(atom),
                    None => return Ok(vec![atom]),
                }
            }
        }
    }
    match stack.len() {
        0 => Ok(output),
        n => Err(ReadError::Unclosed(n)),
    }
}

pub fn read_str(input: &str) -> Result {
    parse(&tokenize(input))
}

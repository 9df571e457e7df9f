use crate::strings::string_repr;
use crate::types::{Atom, Function, Hash, List, Macro, Value};
use itertools::Itertools;
use std::fmt;

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(x) => write!(f, "{}", x),
            // Debug keeps the decimal point, so `2.0` reads back as a float
            Atom::Float(x) => write!(f, "{:?}", x),
            Atom::Bool(b) => write!(f, "{}", b),
            Atom::String(s) => write!(f, "{}", string_repr(s)),
            Atom::Symbol(s) | Atom::Identifier(s) => write!(f, "{}", s),
            Atom::Type(name) => write!(f, "#{}", name),
            Atom::TypedId(id) => write!(f, "{}", id.0),
            Atom::Expansion(name) => write!(f, "{}...", name),
            Atom::Nil => write!(f, "nil"),
        }
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = if self.quoted { "'" } else { "" };
        write!(f, "{}({})", quote, self.iter().join(" "))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_materialized() {
            return write!(f, "{{{}}}", self.pending().iter().join(" "));
        }
        let entries = self.entries();
        let body = entries
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(k, v)| format!("{} {}", k.clone().into_value(), v))
            .join(" ");
        write!(f, "{{{}}}", body)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<function {}>", self.name())
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<macro {}>", self.name)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Atom(atom) => write!(f, "{}", atom),
            Value::List(list) => write!(f, "{}", list),
            Value::Hash(hash) => write!(f, "{}", hash),
            Value::Function(function) => write!(f, "{}", function),
            Value::Macro(m) => write!(f, "{}", m),
        }
    }
}

/// Like `Display`, but strings come out as their bare contents. Used by
/// `print`, `cat` and friends.
pub fn raw_str(value: &Value) -> String {
    match value {
        Value::Atom(Atom::String(s)) => s.clone(),
        other => other.to_string(),
    }
}

extern crate derive_more;
use crate::context::Context;
use crate::evaluator;
use derive_more::{Deref, DerefMut};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type Int = i64;
pub type Float = f64;

/// Immutable scalars. Only `Identifier` and `Expansion` do any work when
/// evaluated; everything else evaluates to itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Int(Int),
    Float(Float),
    Bool(bool),
    String(String),
    Symbol(String),
    Identifier(String),
    Type(String),
    TypedId(TypedId),
    Expansion(String),
    Nil,
}

/// A `name#Type` parameter, kept as the whole token and split on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedId(pub String);

impl TypedId {
    pub fn name(&self) -> &str {
        self.0.split('#').next().unwrap_or(&self.0)
    }

    pub fn type_name(&self) -> &str {
        match self.0.find('#') {
            Some(i) => &self.0[i + 1..],
            None => "",
        }
    }
}

#[derive(Deref, DerefMut, Debug, Clone, Default)]
pub struct List {
    #[deref]
    #[deref_mut]
    pub children: Vec<Value>,
    pub quoted: bool,
}

impl List {
    pub fn new(children: Vec<Value>) -> Self {
        Self {
            children,
            quoted: false,
        }
    }

    pub fn quoted(children: Vec<Value>) -> Self {
        Self {
            children,
            quoted: true,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum HashKey {
    String(String),
    Symbol(String),
}

impl HashKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Atom(Atom::String(s)) => Some(HashKey::String(s.clone())),
            Value::Atom(Atom::Symbol(s)) => Some(HashKey::Symbol(s.clone())),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            HashKey::String(s) => Value::Atom(Atom::String(s)),
            HashKey::Symbol(s) => Value::Atom(Atom::Symbol(s)),
        }
    }
}

/// String and symbol keys live in disjoint keyspaces of one map. A literal
/// read from source keeps its raw key/value forms in `pending`; evaluating it
/// builds a new materialised Hash and leaves the literal untouched.
#[derive(Debug, Default)]
pub struct Hash {
    entries: RefCell<HashMap<HashKey, Value>>,
    pending: Vec<Value>,
    literal: bool,
}

impl Hash {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn literal() -> Self {
        Self {
            literal: true,
            ..Self::default()
        }
    }

    pub fn from_entries(entries: HashMap<HashKey, Value>) -> Self {
        Self {
            entries: RefCell::new(entries),
            pending: Vec::new(),
            literal: false,
        }
    }

    pub(crate) fn push_pending(&mut self, form: Value) {
        self.pending.push(form);
    }

    pub fn pending(&self) -> &[Value] {
        &self.pending
    }

    pub fn is_materialized(&self) -> bool {
        !self.literal
    }

    pub fn entries(&self) -> Ref<HashMap<HashKey, Value>> {
        self.entries.borrow()
    }

    pub fn get(&self, key: &HashKey) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: HashKey, value: Value) {
        self.entries.borrow_mut().insert(key, value);
    }

    pub fn contains(&self, key: &HashKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn deep_copy(&self) -> Self {
        let entries = self
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_copy()))
            .collect();
        Self {
            entries: RefCell::new(entries),
            pending: self.pending.iter().map(Value::deep_copy).collect(),
            literal: self.literal,
        }
    }
}

pub type NativeFn = fn(&[Value], &Rc<Context>) -> evaluator::Result;

pub struct PrimitiveFn {
    pub name: &'static str,
    /// Comma separated argument types, checked before `fn_ptr` runs.
    pub signature: &'static str,
    pub fn_ptr: NativeFn,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

/// A user function. `captured` is the defining scope's locals, copied when
/// the lambda form was evaluated.
#[derive(Debug)]
pub struct Lambda {
    pub parameters: Rc<List>,
    pub body: Vec<Value>,
    pub captured: HashMap<String, Value>,
}

#[derive(Clone)]
pub enum Function {
    Primitive(&'static PrimitiveFn),
    Lambda(Rc<Lambda>),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Primitive(f) => f.name,
            Function::Lambda(_) => "anonymous",
        }
    }

    pub fn signature(&self) -> &str {
        match self {
            Function::Primitive(f) => f.signature,
            Function::Lambda(_) => "**",
        }
    }

    fn same_as(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Primitive(x), Function::Primitive(y)) => std::ptr::eq(*x, *y),
            (Function::Lambda(x), Function::Lambda(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Function::Primitive(p) => write!(f, "{:?}", p),
            // Not derived: the captured scope can be large and may contain this function
            Function::Lambda(l) => write!(f, "Lambda{{parameters: {:?}}}", l.parameters),
        }
    }
}

#[derive(Debug)]
pub struct Macro {
    pub name: String,
    pub parameters: Rc<List>,
    pub body: Vec<Value>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Atom(Atom),
    List(Rc<List>),
    Hash(Rc<Hash>),
    Function(Function),
    Macro(Rc<Macro>),
}

pub(crate) fn truthy(obj: &Value) -> bool {
    match obj {
        Value::List(list) => !list.is_empty(),
        Value::Hash(hash) => !hash.is_empty(),
        Value::Function(_) | Value::Macro(_) => true,
        Value::Atom(atom) => match atom {
            Atom::String(s) => !s.is_empty(),
            Atom::Int(i) => *i != 0,
            Atom::Float(x) => *x != 0.0,
            Atom::Bool(b) => *b,
            Atom::Symbol(_)
            | Atom::Identifier(_)
            | Atom::Type(_)
            | Atom::TypedId(_)
            | Atom::Expansion(_)
            | Atom::Nil => false,
        },
    }
}

#[derive(Debug)]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub got: &'static str,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "expected type '{}', got type '{}'", self.expected, self.got)
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Atom(atom) => match atom {
                Atom::Int(_) => "int",
                Atom::Float(_) => "float",
                Atom::Bool(_) => "bool",
                Atom::String(_) => "string",
                Atom::Symbol(_) => "symbol",
                Atom::Identifier(_) => "identifier",
                Atom::Type(_) => "type",
                Atom::TypedId(_) => "typed-id",
                Atom::Expansion(_) => "expansion",
                Atom::Nil => "nil",
            },
            Value::List(_) => "list",
            Value::Hash(_) => "hash",
            Value::Function(_) => "function",
            Value::Macro(_) => "macro",
        }
    }

    /// An independent copy: containers are copied all the way down, atoms
    /// and callables are shared.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::List(list) => Value::List(Rc::new(List {
                children: list.iter().map(Value::deep_copy).collect(),
                quoted: list.quoted,
            })),
            Value::Hash(hash) => Value::Hash(Rc::new(hash.deep_copy())),
            Value::Atom(_) | Value::Function(_) | Value::Macro(_) => self.clone(),
        }
    }

    fn mismatch(&self, expected: &'static str) -> TypeMismatch {
        TypeMismatch {
            expected,
            got: self.type_name(),
        }
    }

    pub(crate) fn as_int(&self) -> Result<Int, TypeMismatch> {
        match self {
            Value::Atom(Atom::Int(x)) => Ok(*x),
            _ => Err(self.mismatch("int")),
        }
    }

    /// Ints are promoted; used wherever numbers are ordered.
    pub(crate) fn as_float(&self) -> Result<Float, TypeMismatch> {
        match self {
            Value::Atom(Atom::Int(x)) => Ok(*x as Float),
            Value::Atom(Atom::Float(x)) => Ok(*x),
            _ => Err(self.mismatch("float")),
        }
    }

    pub(crate) fn as_string(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::Atom(Atom::String(s)) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    pub(crate) fn as_identifier(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::Atom(Atom::Identifier(s)) => Ok(s),
            _ => Err(self.mismatch("identifier")),
        }
    }

    pub(crate) fn as_list(&self) -> Result<&Rc<List>, TypeMismatch> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(self.mismatch("list")),
        }
    }

    pub(crate) fn as_hash(&self) -> Result<&Rc<Hash>, TypeMismatch> {
        match self {
            Value::Hash(hash) => Ok(hash),
            _ => Err(self.mismatch("hash")),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Atom(Atom::Nil))
    }
}

impl Value {
    pub fn nil() -> Self {
        Value::Atom(Atom::Nil)
    }
    pub fn int(x: Int) -> Self {
        Value::Atom(Atom::Int(x))
    }
    pub fn float(x: Float) -> Self {
        Value::Atom(Atom::Float(x))
    }
    pub fn bool(b: bool) -> Self {
        Value::Atom(Atom::Bool(b))
    }
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::Atom(Atom::String(s.into()))
    }
    pub fn identifier<S: Into<String>>(s: S) -> Self {
        Value::Atom(Atom::Identifier(s.into()))
    }
    pub fn new_list() -> Self {
        Value::List(Rc::new(List::default()))
    }
    pub fn wrap_list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(List::new(elements)))
    }
}

impl From<Atom> for Value {
    fn from(atom: Atom) -> Self {
        Value::Atom(atom)
    }
}

/// Equal iff the type tags match and the payloads match. Lists compare
/// element-wise, callables by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Atom(x), Value::Atom(y)) => x == y,
            (Value::List(x), Value::List(y)) => x.children == y.children,
            (Value::Hash(x), Value::Hash(y)) => *x.entries() == *y.entries(),
            (Value::Function(x), Value::Function(y)) => x.same_as(y),
            (Value::Macro(x), Value::Macro(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating '{}' expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

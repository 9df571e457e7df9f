use crate::config::Config;
use crate::evaluator::{Error, Result};
use crate::types::Value;
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A scope. Lexical children (lambda calls, `let`, `for`) have no namespace
/// of their own and see their creator's through the parent chain. The root
/// and the nodes of the namespace tree carry their slash-joined path.
pub struct Context {
    scope: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Context>>,
    namespace: Option<String>,
    namespaces: RefCell<HashMap<String, Rc<Context>>>,
    config: Rc<Config>,
}

/// `a/b/c` splits into (`a/b`, `c`). Names without a namespace part, and `/`
/// itself, are left alone.
fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let i = name.rfind('/')?;
    let (path, leaf) = (&name[..i], &name[i + 1..]);
    match path.is_empty() || leaf.is_empty() {
        true => None,
        false => Some((path, leaf)),
    }
}

impl Context {
    /// A bare root without built-ins; see `interpreter::Interpreter` for a
    /// ready-to-use session.
    pub fn root(config: Config) -> Rc<Self> {
        Rc::new(Self {
            scope: RefCell::new(HashMap::new()),
            parent: None,
            namespace: Some(String::new()),
            namespaces: RefCell::new(HashMap::new()),
            config: Rc::new(config),
        })
    }

    pub fn spawn_from(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            scope: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            namespace: None,
            namespaces: RefCell::new(HashMap::new()),
            config: parent.config.clone(),
        })
    }

    fn spawn_namespace(parent: &Rc<Self>, path: String) -> Rc<Self> {
        log::debug!("create namespace '{}'", path);
        Rc::new(Self {
            scope: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            namespace: Some(path),
            namespaces: RefCell::new(HashMap::new()),
            config: parent.config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn namespace_path(&self) -> &str {
        match (&self.namespace, &self.parent) {
            (Some(path), _) => path,
            (None, Some(parent)) => parent.namespace_path(),
            (None, None) => "",
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.scope.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Walk the namespace tree from the root without creating anything.
    fn find_namespace(&self, path: &str) -> Option<Rc<Context>> {
        if let Some(parent) = &self.parent {
            return parent.find_namespace(path);
        }
        let mut segments = path.split('/');
        let first = self.namespaces.borrow().get(segments.next()?).cloned()?;
        segments.try_fold(first, |current, segment| {
            let next = current.namespaces.borrow().get(segment).cloned();
            next
        })
    }

    pub fn get(&self, name: &str) -> Result {
        if let Some((path, leaf)) = split_qualified(name) {
            if path != self.namespace_path() {
                let target = self
                    .find_namespace(path)
                    .ok_or_else(|| Error::UnknownNamespace(path.into()))?;
                return target.get(leaf);
            }
            return self
                .lookup(leaf)
                .ok_or_else(|| Error::UnknownIdentifier(name.into()));
        }
        self.lookup(name)
            .ok_or_else(|| Error::UnknownIdentifier(name.into()))
    }

    /// Bind in this scope only, no namespace handling.
    pub fn set_local<S: Into<String>>(&self, name: S, value: Value) {
        self.scope.borrow_mut().insert(name.into(), value);
    }

    /// Declare `name` in the current scope. A qualified name outside the
    /// current namespace is handed up to the root, which creates any missing
    /// namespaces.
    pub fn set(self: &Rc<Self>, name: &str, value: Value) {
        if let Some((path, leaf)) = split_qualified(name) {
            if path != self.namespace_path() {
                match &self.parent {
                    Some(parent) => parent.set(name, value),
                    None => self.namespace(path).set_local(leaf, value),
                }
                return;
            }
            self.set_local(leaf, value);
            return;
        }
        self.set_local(name, value);
    }

    /// Assign to the nearest existing binding of `name`.
    pub fn set_existing(&self, name: &str, value: Value) -> Result<()> {
        if let Some((path, leaf)) = split_qualified(name) {
            if path != self.namespace_path() {
                let target = self
                    .find_namespace(path)
                    .ok_or_else(|| Error::UnknownNamespace(path.into()))?;
                return target.set_existing(leaf, value);
            }
            return self.assign(leaf, value, name);
        }
        self.assign(name, value, name)
    }

    fn assign(&self, leaf: &str, value: Value, name: &str) -> Result<()> {
        if let Some(slot) = self.scope.borrow_mut().get_mut(leaf) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(leaf, value, name),
            None => Err(Error::UnknownIdentifier(name.into())),
        }
    }

    /// Resolve the namespace at `path`, creating it and any missing parents.
    pub fn namespace(self: &Rc<Self>, path: &str) -> Rc<Context> {
        if let Some(parent) = &self.parent {
            return parent.namespace(path);
        }
        let mut current = self.clone();
        for segment in path.split('/') {
            let existing = current.namespaces.borrow().get(segment).cloned();
            current = match existing {
                Some(child) => child,
                None => {
                    let child_path = match current.namespace_path() {
                        "" => segment.to_string(),
                        prefix => format!("{}/{}", prefix, segment),
                    };
                    let child = Context::spawn_namespace(&current, child_path);
                    current
                        .namespaces
                        .borrow_mut()
                        .insert(segment.to_string(), child.clone());
                    child
                }
            };
        }
        current
    }

    /// Snapshot of the local scope with every value copied, for closures.
    pub fn copy_locals(&self) -> HashMap<String, Value> {
        self.scope
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_copy()))
            .collect()
    }

    /// Namespace nodes point back at their parents; dropping the tree means
    /// clearing it explicitly.
    pub(crate) fn clear_namespaces(&self) {
        let children: Vec<Rc<Context>> = self
            .namespaces
            .borrow_mut()
            .drain()
            .map(|(_, child)| child)
            .collect();
        for child in children {
            child.clear_namespaces();
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Context{{namespace: '{}', names: [{}]}}",
            self.namespace_path(),
            self.scope.borrow().keys().sorted().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Rc<Context> {
        Context::root(Config::default())
    }

    #[test]
    fn lookups_fall_through_to_parents() {
        let root = root();
        root.set("x", Value::int(1));
        let child = Context::spawn_from(&root);
        assert_eq!(child.get("x").unwrap(), Value::int(1));
        child.set("x", Value::int(2));
        assert_eq!(child.get("x").unwrap(), Value::int(2));
        assert_eq!(root.get("x").unwrap(), Value::int(1));
    }

    #[test]
    fn unknown_identifiers_are_errors() {
        let err = root().get("nope").unwrap_err();
        assert_eq!(err.to_string(), "Unknown identifier 'nope'");
    }

    #[test]
    fn set_existing_mutates_nearest_binding() {
        let root = root();
        root.set("x", Value::int(0));
        let child = Context::spawn_from(&root);
        child.set_existing("x", Value::int(5)).unwrap();
        assert_eq!(root.get("x").unwrap(), Value::int(5));
        assert!(child.set_existing("y", Value::int(1)).is_err());
    }

    #[test]
    fn qualified_set_creates_namespaces_at_the_root() {
        let root = root();
        let child = Context::spawn_from(&root);
        child.set("math/pi", Value::float(1.5));
        assert_eq!(root.get("math/pi").unwrap(), Value::float(1.5));
        assert!(root.get("pi").is_err());
        let math = root.namespace("math");
        assert_eq!(math.namespace_path(), "math");
        assert_eq!(math.get("pi").unwrap(), Value::float(1.5));
    }

    #[test]
    fn nested_namespaces_have_joined_paths() {
        let root = root();
        let inner = root.namespace("a/b");
        assert_eq!(inner.namespace_path(), "a/b");
        inner.set("x", Value::int(7));
        assert_eq!(root.get("a/b/x").unwrap(), Value::int(7));
        // Existing nodes are reused
        assert!(Rc::ptr_eq(&inner, &root.namespace("a/b")));
    }

    #[test]
    fn unknown_namespaces_are_not_created_by_get() {
        let root = root();
        let err = root.get("nowhere/x").unwrap_err();
        assert_eq!(err.to_string(), "Unknown namespace 'nowhere'");
        assert!(root.find_namespace("nowhere").is_none());
    }

    #[test]
    fn lexical_children_inherit_namespace_path() {
        let root = root();
        let ns = root.namespace("util");
        let child = Context::spawn_from(&ns);
        assert_eq!(child.namespace_path(), "util");
        child.set("util/y", Value::int(1));
        assert_eq!(child.get("y").unwrap(), Value::int(1));
    }

    #[test]
    fn slash_alone_is_a_plain_name() {
        let root = root();
        root.set("/", Value::int(1));
        assert_eq!(root.get("/").unwrap(), Value::int(1));
    }

    #[test]
    fn copy_locals_detaches_containers() {
        let root = root();
        root.set("l", Value::wrap_list(vec![Value::int(1)]));
        let snapshot = root.copy_locals();
        match (&snapshot["l"], root.get("l").unwrap()) {
            (Value::List(copy), Value::List(original)) => {
                assert!(!Rc::ptr_eq(copy, &original));
                assert_eq!(copy.children, original.children);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

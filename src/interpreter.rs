use crate::config::Config;
use crate::context::Context;
use crate::evaluator::{self, Error};
use crate::types::Value;
use crate::core;
use std::fs::read_to_string;
use std::path::Path;
use std::rc::Rc;

/// One interpreter session: a root context with the built-ins installed and
/// the namespace tree hanging off it.
pub struct Interpreter {
    root: Rc<Context>,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        let root = Context::root(config);
        core::install(&root);
        Self { root }
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.root
    }

    pub fn eval_str(&self, source: &str) -> evaluator::Result {
        evaluator::eval_source(source, &self.root)
    }

    pub fn eval(&self, value: &Value) -> evaluator::Result {
        evaluator::eval(value, &self.root)
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> evaluator::Result {
        let path = path.as_ref();
        log::info!("load {}", path.display());
        let source = read_to_string(path).map_err(Error::IOError)?;
        self.eval_str(&source)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::from_env())
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.root.clear_namespaces();
    }
}

#[macro_use]
extern crate lazy_static;

pub mod cmdline;
pub mod config;
pub mod context;
pub mod core;
pub mod evaluator;
pub mod interpreter;
pub mod macros;
pub mod printer;
pub mod reader;
pub mod signature;
pub mod special_forms;
mod strings;
pub mod tokens;
pub mod types;

pub use config::Config;
pub use context::Context;
pub use interpreter::Interpreter;
pub use types::Value;

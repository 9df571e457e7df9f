use crate::config::Config;
use crate::evaluator;
use crate::interpreter::Interpreter;
use crate::reader;
use crate::tokens::{tokenize, Token};
use crate::types::Value;
use ansi_term::Colour;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::path::PathBuf;

pub const PROMPT: &str = "> ";
pub const CONTINUATION_PROMPT: &str = ". ";

#[derive(Debug)]
pub enum Error {
    Usage(String),
    IOError(std::io::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage(message) => write!(
                f,
                "{}\nusage: sigmo [-c <command>] [-i] [--root <dir>] [file]",
                message
            ),
            Error::IOError(e) => write!(f, "{}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

impl From<evaluator::Error> for Error {
    fn from(e: evaluator::Error) -> Self {
        Self::Eval(e)
    }
}

pub fn setup() -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("sigmo")?;
    interface.set_prompt(PROMPT)?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".sigmo_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> std::io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// `error: <message>`, in red when `stream` is a terminal.
pub fn error_text(e: &dyn fmt::Display, stream: atty::Stream) -> String {
    styled_error(e, atty::is(stream))
}

fn styled_error(e: &dyn fmt::Display, colour: bool) -> String {
    let text = format!("error: {}", e);
    match colour {
        true => Colour::Red.paint(text).to_string(),
        false => text,
    }
}

fn depth_change(tokens: &[Token]) -> i64 {
    tokens
        .iter()
        .map(|token| match token.as_str() {
            "(" | "'(" | "{" => 1,
            ")" | "}" => -1,
            _ => 0,
        })
        .sum()
}

/// Collects tokens over several lines until every open bracket is closed.
#[derive(Debug, Default)]
pub struct Accumulator {
    pending: Vec<Token>,
    depth: i64,
}

impl Accumulator {
    pub fn feed(&mut self, line: &str) -> Option<Vec<Token>> {
        let tokens = tokenize(line);
        self.depth += depth_change(&tokens);
        self.pending.extend(tokens);
        if self.depth > 0 {
            return None;
        }
        self.depth = 0;
        Some(std::mem::take(&mut self.pending))
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Parse and evaluate `tokens`, handing every non-`nil` result to `echo`.
/// Stops at the first error.
pub fn run_tokens(
    tokens: &[Token],
    interpreter: &Interpreter,
    mut echo: impl FnMut(&Value),
) -> evaluator::Result<()> {
    for form in reader::parse(tokens)? {
        let value = interpreter.eval(&form)?;
        if !value.is_nil() {
            echo(&value);
        }
    }
    Ok(())
}

pub fn repl<T: Terminal>(interface: &Interface<T>, interpreter: &Interpreter) {
    let mut accumulator = Accumulator::default();
    loop {
        let prompt = match accumulator.is_pending() {
            true => CONTINUATION_PROMPT,
            false => PROMPT,
        };
        interface.set_prompt(prompt).ok();
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if line.trim() == "quit" {
                    break;
                }
                interface.add_history_unique(line.clone());
                if let Some(tokens) = accumulator.feed(&line) {
                    let result = run_tokens(&tokens, interpreter, |value| {
                        writeln!(interface, "{}", value).ok();
                    });
                    if let Err(e) = result {
                        log::warn!("{}", e);
                        writeln!(interface, "{}", error_text(&e, atty::Stream::Stdout)).ok();
                    }
                }
            }
            Err(e) => {
                log::error!("{}", e);
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Options {
    pub command: Option<String>,
    pub interactive: bool,
    pub root: Option<PathBuf>,
    pub file: Option<PathBuf>,
}

/// `args` includes the program name, as from `std::env::args`.
pub fn parse_args(args: &[String]) -> Result<Options, Error> {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);
    let missing = |flag: &str| Error::Usage(format!("'{}' needs a value", flag));
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" => options.command = Some(iter.next().ok_or_else(|| missing("-c"))?.clone()),
            "-i" => options.interactive = true,
            "--root" => {
                options.root = Some(PathBuf::from(iter.next().ok_or_else(|| missing("--root"))?))
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(Error::Usage(format!("unknown option '{}'", flag)))
            }
            path => {
                if options.file.is_some() {
                    return Err(Error::Usage("only one file can be given".into()));
                }
                options.file = Some(PathBuf::from(path));
            }
        }
    }
    Ok(options)
}

pub fn launch(args: Vec<String>) -> Result<(), Error> {
    let options = parse_args(&args)?;
    let config = match &options.root {
        Some(root) => Config::new(root.clone()),
        None => Config::from_env(),
    };
    log::debug!("launch with {:?}", config);
    let interpreter = Interpreter::new(config);

    if let Some(command) = &options.command {
        run_tokens(&tokenize(command), &interpreter, |value| println!("{}", value))?;
    }
    if let Some(file) = &options.file {
        interpreter.load_file(file)?;
    }
    if options.interactive || (options.command.is_none() && options.file.is_none()) {
        let interface = setup()?;
        repl(&interface, &interpreter);
        save_history(&interface)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("sigmo")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn accumulator_waits_for_balanced_brackets() {
        let mut acc = Accumulator::default();
        assert_eq!(acc.feed("(def x"), None);
        assert!(acc.is_pending());
        assert_eq!(acc.feed("  '(1 2"), None);
        let tokens = acc.feed("))").unwrap();
        assert_eq!(tokens.first().map(String::as_str), Some("("));
        assert_eq!(tokens.len(), 8);
        assert!(!acc.is_pending());
    }

    #[test]
    fn hash_braces_count_towards_depth() {
        let mut acc = Accumulator::default();
        assert_eq!(acc.feed("{:a"), None);
        assert!(acc.feed("1}").is_some());
    }

    #[test]
    fn surplus_closers_reset_depth() {
        let mut acc = Accumulator::default();
        assert!(acc.feed("x)").is_some());
        assert_eq!(acc.feed("(a"), None);
    }

    #[test]
    fn parse_all_flags() {
        let options = parse_args(&args(&["-c", "(+ 1 2)", "-i", "--root", "/lib", "main.mo"])).unwrap();
        assert_eq!(
            options,
            Options {
                command: Some("(+ 1 2)".into()),
                interactive: true,
                root: Some(PathBuf::from("/lib")),
                file: Some(PathBuf::from("main.mo")),
            }
        );
    }

    #[test]
    fn bad_arguments_are_usage_errors() {
        assert!(matches!(parse_args(&args(&["-c"])), Err(Error::Usage(_))));
        assert!(matches!(parse_args(&args(&["-x"])), Err(Error::Usage(_))));
        assert!(matches!(parse_args(&args(&["a", "b"])), Err(Error::Usage(_))));
    }

    #[test]
    fn errors_are_red_only_on_request() {
        assert_eq!(styled_error(&"boom", false), "error: boom");
        assert_eq!(
            styled_error(&"boom", true),
            Colour::Red.paint("error: boom").to_string()
        );
    }

    #[test]
    fn run_tokens_echoes_non_nil_results() {
        let interpreter = Interpreter::new(Config::default());
        let mut seen = Vec::new();
        run_tokens(&tokenize("(def x 2) (if false 1) (+ x 1)"), &interpreter, |v| {
            seen.push(v.to_string())
        })
        .unwrap();
        assert_eq!(seen, vec!["2", "3"]);
    }
}

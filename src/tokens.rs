use crate::strings;
use std::mem;

/// Tokens are plain strings at this stage; `reader` decides what they mean.
pub type Token = String;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Mode {
    Normal,
    Comment,
    StringLiteral { escaped: bool },
}

struct Tokenizer {
    tokens: Vec<Token>,
    current: String,
    mode: Mode,
}

impl Tokenizer {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            current: String::new(),
            mode: Mode::Normal,
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(mem::take(&mut self.current));
        }
    }

    fn emit(&mut self, c: char) {
        self.flush();
        self.current.push(c);
        self.flush();
    }

    fn feed(&mut self, c: char) {
        match self.mode {
            Mode::Comment => {
                if c == '\n' {
                    self.mode = Mode::Normal;
                }
            }
            Mode::StringLiteral { escaped: true } => {
                match strings::unescape(c) {
                    Some(control) => self.current.push(control),
                    None => {
                        self.current.push('\\');
                        self.current.push(c);
                    }
                }
                self.mode = Mode::StringLiteral { escaped: false };
            }
            Mode::StringLiteral { escaped: false } => match c {
                '\\' => self.mode = Mode::StringLiteral { escaped: true },
                '"' => {
                    self.current.push(c);
                    self.flush();
                    self.mode = Mode::Normal;
                }
                _ => self.current.push(c),
            },
            Mode::Normal => match c {
                ' ' | '\t' | '\n' | '\r' => self.flush(),
                ';' => {
                    self.flush();
                    self.mode = Mode::Comment;
                }
                '"' => {
                    self.current.push(c);
                    self.mode = Mode::StringLiteral { escaped: false };
                }
                // A quote mark directly before the paren makes the compound token '(
                '(' => {
                    if !self.current.ends_with('\'') {
                        self.flush();
                    }
                    self.current.push(c);
                    self.flush();
                }
                ')' | '{' | '}' => self.emit(c),
                '[' | ']' => (),
                _ => self.current.push(c),
            },
        }
    }

    fn finish(mut self) -> Vec<Token> {
        if let Mode::StringLiteral { escaped: true } = self.mode {
            self.current.push('\\');
        }
        self.flush();
        self.tokens
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new();
    for c in input.chars() {
        tokenizer.feed(c);
    }
    let tokens = tokenizer.finish();
    log::trace!("tokenized {} tokens", tokens.len());
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<String> {
        tokenize(input)
    }

    #[test]
    fn splits_lists_and_atoms() {
        assert_eq!(tokens("(+ 1 2)"), vec!["(", "+", "1", "2", ")"]);
        assert_eq!(
            tokens("(def x\n\t(foo))"),
            vec!["(", "def", "x", "(", "foo", ")", ")"]
        );
    }

    #[test]
    fn quote_before_paren_is_one_token() {
        assert_eq!(tokens("'(1 2)"), vec!["'(", "1", "2", ")"]);
        assert_eq!(tokens("(f '(a))"), vec!["(", "f", "'(", "a", ")", ")"]);
    }

    #[test]
    fn braces_delimit_hashes() {
        assert_eq!(tokens("{:a 1}"), vec!["{", ":a", "1", "}"]);
        assert_eq!(tokens("x{y}z"), vec!["x", "{", "y", "}", "z"]);
    }

    #[test]
    fn square_brackets_are_discarded() {
        assert_eq!(tokens("(lambda [x] x)"), vec!["(", "lambda", "x", "x", ")"]);
        assert_eq!(tokens("\"[x]\""), vec!["\"[x]\""]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(tokens("a ; ignored (\nb"), vec!["a", "b"]);
        assert_eq!(tokens("a;comment"), vec!["a"]);
    }

    #[test]
    fn strings_keep_whitespace_and_parens() {
        assert_eq!(tokens("(print \"a (b) c\")"), vec!["(", "print", "\"a (b) c\"", ")"]);
        assert_eq!(tokens("\"\""), vec!["\"\""]);
    }

    #[test]
    fn string_escapes_are_translated() {
        assert_eq!(tokens(r#""a\nb\tc\rd""#), vec!["\"a\nb\tc\rd\""]);
    }

    #[test]
    fn other_escapes_are_kept_literally() {
        assert_eq!(tokens(r#""say \"hi\"""#), vec![r#""say \"hi\"""#]);
        assert_eq!(tokens(r#""back\\""#), vec![r#""back\\""#]);
    }

    #[test]
    fn trailing_partial_token_is_flushed() {
        assert_eq!(tokens("abc"), vec!["abc"]);
        assert_eq!(tokens("\"open"), vec!["\"open"]);
    }
}

//! Argument signatures for functions.
//!
//! A signature is a comma separated list with one entry per position:
//!
//! - a type name, or several joined with `|`, e.g. `int|float`;
//! - `*` for any single argument;
//! - `+` for one or more further arguments, each checked against the
//!   entry before it;
//! - `**` for any number of further arguments, unchecked.
//!
//! `+` and `**` lift the upper bound on the argument count.

use crate::types::Value;
use std::fmt;

#[derive(Debug)]
pub enum SignatureError {
    TooFewArguments {
        function: String,
        expected: usize,
        got: usize,
    },
    TooManyArguments {
        function: String,
        expected: usize,
        got: usize,
    },
    WrongType {
        function: String,
        position: usize,
        expected: String,
        got: &'static str,
    },
    LeadingRepeat {
        function: String,
    },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::TooFewArguments {
                function,
                expected,
                got,
            } => write!(
                f,
                "Function '{}' expected {} args, only got {}",
                function, expected, got
            ),
            SignatureError::TooManyArguments {
                function,
                expected,
                got,
            } => write!(
                f,
                "Function '{}' expected {} args, but got {}",
                function, expected, got
            ),
            SignatureError::WrongType {
                function,
                position,
                expected,
                got,
            } => write!(
                f,
                "Function '{}' expected argument {} of type '{}', got type '{}'",
                function, position, expected, got
            ),
            SignatureError::LeadingRepeat { function } => write!(
                f,
                "Function '{}' cannot have '+' as its first argument type",
                function
            ),
        }
    }
}

fn accepts(constraint: &str, arg: &Value) -> bool {
    match constraint {
        "*" | "**" => true,
        _ => constraint.split('|').any(|t| t == arg.type_name()),
    }
}

pub fn check(function: &str, signature: &str, args: &[Value]) -> Result<(), SignatureError> {
    if signature == "**" {
        return Ok(());
    }
    let slots: Vec<&str> = match signature {
        "" => Vec::new(),
        _ => signature.split(',').collect(),
    };
    let too_few = || SignatureError::TooFewArguments {
        function: function.into(),
        expected: slots.len(),
        got: args.len(),
    };
    let wrong_type = |position: usize, expected: &str, arg: &Value| SignatureError::WrongType {
        function: function.into(),
        position,
        expected: expected.into(),
        got: arg.type_name(),
    };

    let mut variadic = false;
    for (i, &slot) in slots.iter().enumerate() {
        match slot {
            "**" => {
                variadic = true;
                break;
            }
            "+" => {
                if i == 0 {
                    return Err(SignatureError::LeadingRepeat {
                        function: function.into(),
                    });
                }
                if i >= args.len() {
                    return Err(too_few());
                }
                let constraint = slots[i - 1];
                for (position, arg) in args.iter().enumerate().skip(i) {
                    if !accepts(constraint, arg) {
                        return Err(wrong_type(position, constraint, arg));
                    }
                }
                variadic = true;
                break;
            }
            _ => {
                let arg = args.get(i).ok_or_else(too_few)?;
                if !accepts(slot, arg) {
                    return Err(wrong_type(i, slot, arg));
                }
            }
        }
    }

    if !variadic && args.len() > slots.len() {
        return Err(SignatureError::TooManyArguments {
            function: function.into(),
            expected: slots.len(),
            got: args.len(),
        });
    }
    Ok(())
}

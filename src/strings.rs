// The language only knows the escapes \n, \t and \r inside a string literal.
// Any other backslash is kept as written, so the printer only has to undo
// these three to make rendering stable under a second read.

use bimap::BiMap;
use std::str::Chars;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('n', '\n');
        m.insert('t', '\t');
        m.insert('r', '\r');
        m
    };
}

/// The control character written as `\<c>` in source text, if any.
pub(crate) fn unescape(c: char) -> Option<char> {
    ESCAPES.get_by_left(&c).copied()
}

struct StringPrinter<'a> {
    chars: Chars<'a>,
}

impl<'a> StringPrinter<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars() }
    }
}

impl Iterator for StringPrinter<'_> {
    type Item = (char, Option<char>);

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.chars.next()?;
        let charseq = match ESCAPES.get_by_right(&next) {
            Some(&l) => ('\\', Some(l)),
            None => (next, None),
        };
        Some(charseq)
    }
}

pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::new();
    output.push('"');
    for (char1, char2) in StringPrinter::new(src) {
        output.push(char1);
        if let Some(char2) = char2 {
            output.push(char2)
        };
    }
    output.push('"');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_escapes_map_to_control_characters() {
        assert_eq!(unescape('n'), Some('\n'));
        assert_eq!(unescape('t'), Some('\t'));
        assert_eq!(unescape('r'), Some('\r'));
        assert_eq!(unescape('"'), None);
        assert_eq!(unescape('\\'), None);
    }

    #[test]
    fn repr_reescapes_control_characters() {
        assert_eq!(string_repr("a\nb\tc"), r#""a\nb\tc""#);
        assert_eq!(string_repr("plain"), r#""plain""#);
    }
}

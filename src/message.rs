//! Control messages and the message-box text tokenizer.
//!
//! A [`Message`] is a list of [`Atom`]s. Message-box text is split with
//! [`tokenize`] into `;`-separated messages, each holding `,`-separated parts,
//! and `$N` placeholders are filled from the inbound message with
//! [`substitute`]. Both functions are pure.

use core::fmt;
use core::fmt::Write;

use itertools::Itertools;

use crate::error::Error;

/// One element of a message.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Float(f32),
    Symbol(String),
}

impl Atom {
    /// Classify a token: anything that reads as a finite number is a float.
    pub fn parse(token: &str) -> Atom {
        match parse_float(token) {
            Some(v) => Atom::Float(v),
            None => Atom::Symbol(token.to_string()),
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(v) => Some(*v),
            Atom::Symbol(_) => None,
        }
    }

    #[inline]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(s) => Some(s),
            Atom::Float(_) => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(v) => write!(f, "{}", v),
            Atom::Symbol(s) => f.write_str(s),
        }
    }
}

/// Parse a float token. `nan` and `inf` stay symbols.
pub fn parse_float(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// A discrete control message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    atoms: Vec<Atom>,
}

impl Message {
    /// Split text on whitespace into atoms.
    pub fn parse(text: &str) -> Self {
        Self {
            atoms: text.split_whitespace().map(Atom::parse).collect(),
        }
    }

    pub fn bang() -> Self {
        Self::symbol("bang")
    }

    pub fn float(value: f32) -> Self {
        Self {
            atoms: vec![Atom::Float(value)],
        }
    }

    pub fn symbol(value: &str) -> Self {
        Self {
            atoms: vec![Atom::Symbol(value.to_string())],
        }
    }

    /// A `list` message: selector followed by the atoms.
    pub fn list(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut all = vec![Atom::Symbol("list".to_string())];
        all.extend(atoms);
        Self { atoms: all }
    }

    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[inline]
    pub fn first(&self) -> Option<&Atom> {
        self.atoms.first()
    }

    #[inline]
    pub fn first_float(&self) -> Option<f32> {
        self.first().and_then(Atom::as_float)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn is_bang(&self) -> bool {
        matches!(self.first(), Some(Atom::Symbol(s)) if s == "bang")
    }

    /// Atoms with a leading `list` selector removed.
    pub fn list_atoms(&self) -> &[Atom] {
        match self.atoms.split_first() {
            Some((Atom::Symbol(s), rest)) if s == "list" => rest,
            _ => &self.atoms,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atoms.iter().join(" "))
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::parse(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::parse(&text)
    }
}

impl From<f32> for Message {
    fn from(value: f32) -> Self {
        Message::float(value)
    }
}

impl From<Vec<Atom>> for Message {
    fn from(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }
}

/// Split on `delim`, treating a backslash right before it as part of the
/// delimiter (`\;` as written in patch files).
fn split_escaped(text: &str, delim: char) -> impl Iterator<Item = &str> {
    text.split(delim).map(|piece| piece.strip_suffix('\\').unwrap_or(piece))
}

/// Tokenize message-box text into messages and their comma-separated parts.
///
/// Atoms are re-joined with single spaces; empty parts and empty messages
/// are dropped.
///
/// ```
/// let parts = patchwerk::message::tokenize("bang, 1  2; hello $1");
/// assert_eq!(parts, vec![vec!["bang", "1 2"], vec!["hello $1"]]);
/// ```
pub fn tokenize(text: &str) -> Vec<Vec<String>> {
    split_escaped(text, ';')
        .map(|message| {
            split_escaped(message, ',')
                .map(|part| part.split_whitespace().join(" "))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|parts| !parts.is_empty())
        .collect()
}

/// Replace every `$N` (or `\$N`) in `text` with atom `N` of `inbound`.
///
/// Indices are 1-based over the inbound atoms without their `list`
/// selector. Out-of-range placeholders become `0` and are reported in the
/// returned error list.
pub fn substitute(text: &str, inbound: &Message) -> (String, Vec<Error>) {
    let args = inbound.list_atoms();
    let mut out = String::with_capacity(text.len());
    let mut errors = Vec::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let prefix = if rest.starts_with("\\$") {
            2
        } else if rest.starts_with('$') {
            1
        } else {
            0
        };

        if prefix > 0 {
            let digits = rest[prefix..].bytes().take_while(|b| b.is_ascii_digit()).count();
            if digits > 0 {
                let index: usize = rest[prefix..prefix + digits].parse().unwrap_or(0);
                match index.checked_sub(1).and_then(|k| args.get(k)) {
                    Some(atom) => {
                        let _ = write!(out, "{}", atom);
                    }
                    None => {
                        errors.push(Error::ArgumentOutOfRange { index });
                        out.push('0');
                    }
                }
                i += prefix + digits;
                continue;
            }
        }

        match rest.chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    (out, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_classify_numbers() {
        assert_eq!(Atom::parse("42"), Atom::Float(42.0));
        assert_eq!(Atom::parse("-0.5"), Atom::Float(-0.5));
        assert_eq!(Atom::parse("nan"), Atom::Symbol("nan".into()));
        assert_eq!(Atom::parse("osc~"), Atom::Symbol("osc~".into()));
    }

    #[test]
    fn display_joins_atoms() {
        let m = Message::parse("  set   1.5 foo ");
        assert_eq!(m.to_string(), "set 1.5 foo");
        assert_eq!(Message::float(440.0).to_string(), "440");
    }

    #[test]
    fn list_selector_is_stripped() {
        let m = Message::parse("list 1 2");
        assert_eq!(m.list_atoms(), &[Atom::Float(1.0), Atom::Float(2.0)]);
        assert_eq!(Message::parse("3 4").list_atoms().len(), 2);
    }

    #[test]
    fn tokenizes_messages_and_parts() {
        let t = tokenize("bang, 1 2; hello $1");
        assert_eq!(t.len(), 2);
        assert_eq!(t[0], vec!["bang".to_string(), "1 2".to_string()]);
        assert_eq!(t[1], vec!["hello $1".to_string()]);
    }

    #[test]
    fn escaped_delimiters_split_like_bare_ones() {
        let t = tokenize("bang \\, 1 2 \\; hello \\$1");
        assert_eq!(t, vec![vec!["bang", "1 2"], vec!["hello \\$1"]]);
    }

    #[test]
    fn empty_pieces_are_dropped() {
        assert!(tokenize(" ; , ;").is_empty());
        assert_eq!(tokenize("; foo 1"), vec![vec!["foo 1"]]);
    }

    #[test]
    fn substitutes_dollar_args() {
        let (s, errors) = substitute("hello $1", &Message::parse("42"));
        assert_eq!(s, "hello 42");
        assert!(errors.is_empty());

        let (s, _) = substitute("\\$2 and $1", &Message::parse("list a b"));
        assert_eq!(s, "b and a");
    }

    #[test]
    fn out_of_range_dollar_becomes_zero() {
        let (s, errors) = substitute("x $3 $0", &Message::parse("1"));
        assert_eq!(s, "x 0 0");
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::ArgumentOutOfRange { index: 3 }));
    }

    #[test]
    fn lone_dollar_is_literal() {
        let (s, errors) = substitute("cost $ now", &Message::parse("1"));
        assert_eq!(s, "cost $ now");
        assert!(errors.is_empty());
    }
}

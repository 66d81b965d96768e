//! Patch file parser.
//!
//! A patch is a sequence of directives. Each one starts at `#` and ends at
//! an unescaped `;` followed by a newline or the end of input, so
//! directives may span lines. Tokens are separated by whitespace.
//!
//! ```text
//! #N canvas 0 0 450 300 10;
//! #X obj 30 30 osc~ 440;
//! #X obj 30 80 dac~;
//! #X connect 0 0 1 0;
//! ```
//!
//! [`parse`] turns source text into [`Statement`]s without touching any
//! engine state. A malformed directive yields an `Err` for that directive
//! only; the rest of the patch still parses.

use crate::error::{Error, Result};
use crate::message::parse_float;
use crate::table::MAX_TABLE_LEN;

/// One recognized directive.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// `#X obj x y kind args...`. An empty box has an empty `kind`.
    Object {
        position: (i32, i32),
        kind: String,
        args: Vec<String>,
    },
    /// `#X msg x y text...`
    Message { position: (i32, i32), text: Vec<String> },
    /// `#X text x y words...`
    Text { position: (i32, i32), text: Vec<String> },
    /// `#X array name size ...` opens a table.
    Array {
        name: String,
        size: usize,
        args: Vec<String>,
    },
    /// `#X restore ...` closes the open table.
    Restore,
    /// `#X connect source outlet sink inlet`
    Connect {
        source: usize,
        outlet: usize,
        sink: usize,
        inlet: usize,
    },
    /// `#A start values...` fills the open table.
    Fill { start: usize, values: Vec<f32> },
    /// Anything else (`#N canvas`, `#X coords`, ...).
    Ignored,
}

impl Directive {
    /// Whether this directive occupies a node index.
    pub fn creates_node(&self) -> bool {
        matches!(
            self,
            Directive::Object { .. } | Directive::Message { .. } | Directive::Text { .. } | Directive::Array { .. }
        )
    }
}

/// A directive and the 1-based line it starts on.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub directive: Directive,
}

/// Split `source` into raw directive bodies (without the closing `;`).
pub fn split_directives(source: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut line = 1;
    let mut open: Option<(usize, usize)> = None;
    let mut prev = '\0';
    let mut chars = source.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match open {
            None if ch == '#' => open = Some((i, line)),
            Some((start, start_line)) if ch == ';' && prev != '\\' => {
                let at_end = matches!(chars.peek(), None | Some((_, '\n')) | Some((_, '\r')));
                if at_end {
                    out.push((start_line, &source[start..i]));
                    open = None;
                }
            }
            _ => {}
        }
        if ch == '\n' {
            line += 1;
        }
        prev = ch;
    }
    out
}

/// Parse a whole patch.
pub fn parse(source: &str) -> Vec<Result<Statement>> {
    split_directives(source)
        .into_iter()
        .map(|(line, body)| {
            let tokens: Vec<&str> = body.split_whitespace().collect();
            parse_directive(line, &tokens).map(|directive| Statement { line, directive })
        })
        .collect()
}

fn position(line: usize, tokens: &[&str]) -> Result<(i32, i32)> {
    match tokens {
        [_, _, x, y, ..] => Ok((coordinate(line, x)?, coordinate(line, y)?)),
        _ => Err(Error::malformed(line, format!("'{}' needs a position", tokens.join(" ")))),
    }
}

fn coordinate(line: usize, token: &str) -> Result<i32> {
    parse_float(token)
        .map(|v| v as i32)
        .ok_or_else(|| Error::malformed(line, format!("bad coordinate '{}'", token)))
}

fn index(line: usize, token: &str) -> Result<usize> {
    token
        .parse::<usize>()
        .map_err(|_| Error::malformed(line, format!("bad index '{}'", token)))
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn parse_directive(line: usize, tokens: &[&str]) -> Result<Directive> {
    match tokens {
        ["#X", "obj", rest @ ..] => {
            let position = position(line, tokens)?;
            let (kind, args) = match rest.get(2..) {
                Some([kind, args @ ..]) => (kind.to_string(), owned(args)),
                _ => (String::new(), Vec::new()),
            };
            Ok(Directive::Object { position, kind, args })
        }
        ["#X", "msg", ..] => Ok(Directive::Message {
            position: position(line, tokens)?,
            text: owned(&tokens[4..]),
        }),
        ["#X", "text", ..] => Ok(Directive::Text {
            position: position(line, tokens)?,
            text: owned(&tokens[4..]),
        }),
        ["#X", "array", name, size, args @ ..] => {
            let size = index(line, size)?;
            if size > MAX_TABLE_LEN {
                return Err(Error::malformed(
                    line,
                    format!("array '{}' of {} samples exceeds {}", name, size, MAX_TABLE_LEN),
                ));
            }
            Ok(Directive::Array {
                name: name.to_string(),
                size,
                args: owned(args),
            })
        }
        ["#X", "array", ..] => Err(Error::malformed(line, "array needs a name and a size")),
        ["#X", "restore", ..] => Ok(Directive::Restore),
        ["#X", "connect", source, outlet, sink, inlet, ..] => Ok(Directive::Connect {
            source: index(line, source)?,
            outlet: index(line, outlet)?,
            sink: index(line, sink)?,
            inlet: index(line, inlet)?,
        }),
        ["#X", "connect", ..] => Err(Error::malformed(line, "connect needs four indices")),
        ["#A", start, values @ ..] => {
            let values = values
                .iter()
                .map(|v| parse_float(v).ok_or_else(|| Error::malformed(line, format!("bad table value '{}'", v))))
                .collect::<Result<Vec<_>>>()?;
            Ok(Directive::Fill {
                start: index(line, start)?,
                values,
            })
        }
        ["#A"] => Err(Error::malformed(line, "table data needs a start index")),
        _ => Ok(Directive::Ignored),
    }
}

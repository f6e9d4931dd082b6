use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::CsError;

// ---------------------------------------------------------------------------
// PyValue – the Python literal subset used by cs file headers
// ---------------------------------------------------------------------------

/// A parsed Python literal as it appears in the header dictionary, e.g.
/// `{'descr': [('uid', '<u8')], 'fortran_order': False, 'shape': (3,), }`.
#[derive(Debug, Clone, PartialEq)]
pub enum PyValue {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    Tuple(Vec<PyValue>),
    List(Vec<PyValue>),
    Dict(Vec<(PyValue, PyValue)>),
}

impl PyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Look up a string key in a dict literal.
    pub fn get(&self, key: &str) -> Option<&PyValue> {
        match self {
            PyValue::Dict(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyValue::Str(s) => {
                f.write_str("'")?;
                for c in s.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '\'' => f.write_str("\\'")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("'")
            }
            PyValue::Int(i) => write!(f, "{i}"),
            PyValue::Bool(true) => f.write_str("True"),
            PyValue::Bool(false) => f.write_str("False"),
            PyValue::None => f.write_str("None"),
            PyValue::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            PyValue::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            // Trailing ", }" matches what numpy writes.
            PyValue::Dict(entries) => {
                f.write_str("{")?;
                for (k, v) in entries {
                    write!(f, "{k}: {v}, ")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[PyValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a single Python literal. Trailing whitespace is allowed, anything
/// else after the literal is an error.
pub fn parse_literal(text: &str) -> Result<PyValue, CsError> {
    let mut parser = Parser {
        chars: text.chars().peekable(),
    };
    let value = parser.value()?;
    parser.skip_ws();
    match parser.chars.next() {
        None => Ok(value),
        Some(c) => Err(CsError::Header(format!("unexpected '{c}' after literal"))),
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn consume(&mut self, want: char) -> Result<(), CsError> {
        self.skip_ws();
        match self.chars.next() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(CsError::Header(format!("expected '{want}', found '{c}'"))),
            None => Err(CsError::Header(format!("expected '{want}', found end of header"))),
        }
    }

    fn value(&mut self) -> Result<PyValue, CsError> {
        self.skip_ws();
        match self.chars.peek().copied() {
            Some('\'') | Some('"') => self.string().map(PyValue::Str),
            Some('(') => self.sequence('(', ')').map(PyValue::Tuple),
            Some('[') => self.sequence('[', ']').map(PyValue::List),
            Some('{') => self.dict(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.int(),
            Some(c) if c.is_ascii_alphabetic() => self.word(),
            Some(c) => Err(CsError::Header(format!("unexpected '{c}'"))),
            None => Err(CsError::Header("unexpected end of header".into())),
        }
    }

    fn string(&mut self) -> Result<String, CsError> {
        let quote = self.chars.next().unwrap_or('\'');
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(CsError::Header("unterminated string".into())),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self
                        .chars
                        .next()
                        .ok_or_else(|| CsError::Header("unterminated escape".into()))?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        'x' => out.push(self.hex_escape(2)?),
                        'u' => out.push(self.hex_escape(4)?),
                        other => out.push(other),
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, CsError> {
        let hex: String = (0..digits).filter_map(|_| self.chars.next()).collect();
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| CsError::Header(format!("bad escape \\x{hex}")))
    }

    fn int(&mut self) -> Result<PyValue, CsError> {
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '-' || c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        // Python 2 long suffix, still found in old files.
        if matches!(self.chars.peek(), Some('L') | Some('l')) {
            self.chars.next();
        }
        digits
            .parse()
            .map(PyValue::Int)
            .map_err(|_| CsError::Header(format!("bad integer '{digits}'")))
    }

    fn word(&mut self) -> Result<PyValue, CsError> {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "True" => Ok(PyValue::Bool(true)),
            "False" => Ok(PyValue::Bool(false)),
            "None" => Ok(PyValue::None),
            other => Err(CsError::Header(format!("unknown name '{other}'"))),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Vec<PyValue>, CsError> {
        self.consume(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&close) {
                self.chars.next();
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.chars.next() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(items),
                Some(c) => return Err(CsError::Header(format!("expected ',' or '{close}', found '{c}'"))),
                None => return Err(CsError::Header("unexpected end of header".into())),
            }
        }
    }

    fn dict(&mut self) -> Result<PyValue, CsError> {
        self.consume('{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&'}') {
                self.chars.next();
                return Ok(PyValue::Dict(entries));
            }
            let key = self.value()?;
            self.consume(':')?;
            let value = self.value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.chars.next() {
                Some(',') => continue,
                Some('}') => return Ok(PyValue::Dict(entries)),
                Some(c) => return Err(CsError::Header(format!("expected ',' or '}}', found '{c}'"))),
                None => return Err(CsError::Header("unexpected end of header".into())),
            }
        }
    }
}

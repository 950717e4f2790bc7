//! Statement splitting and parameter grammar for ISO 10303-21 exchange files.

use super::{Entity, Param, Record};
use crate::utils::error::{GdtError, Result};

/// One `;` terminated statement with comments removed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub index: usize,
    pub text: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Scan {
    Normal,
    Str,
    Binary,
    Comment,
}

/// Splits the file at `;` outside string literals, binaries and comments.
/// Trailing text without a terminator is returned as a final statement.
pub(crate) fn split_statements(text: &str) -> Result<Vec<Statement>> {
    let bytes = text.as_bytes();
    let mut statements = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut state = Scan::Normal;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            Scan::Normal => match b {
                b';' => {
                    push_statement(&mut statements, &current);
                    current.clear();
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = Scan::Comment;
                    i += 1;
                }
                b'\'' => {
                    state = Scan::Str;
                    current.push(b);
                }
                b'"' => {
                    state = Scan::Binary;
                    current.push(b);
                }
                _ => current.push(b),
            },
            Scan::Str => {
                current.push(b);
                if b == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        current.push(b'\'');
                        i += 1;
                    } else {
                        state = Scan::Normal;
                    }
                }
            }
            Scan::Binary => {
                current.push(b);
                if b == b'"' {
                    state = Scan::Normal;
                }
            }
            Scan::Comment => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = Scan::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    match state {
        Scan::Str => Err(GdtError::ParseError {
            statement: statements.len() + 1,
            message: "unterminated string literal".to_string(),
        }),
        Scan::Comment => Err(GdtError::ParseError {
            statement: statements.len() + 1,
            message: "unterminated comment".to_string(),
        }),
        _ => {
            push_statement(&mut statements, &current);
            Ok(statements)
        }
    }
}

fn push_statement(statements: &mut Vec<Statement>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw).trim().to_string();
    if !text.is_empty() {
        statements.push(Statement {
            index: statements.len() + 1,
            text,
        });
    }
}

/// Recursive descent over a single statement.
pub(crate) struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

type Parsed<T> = std::result::Result<T, String>;

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: u8) -> Parsed<()> {
        self.skip_ws();
        match self.peek() {
            Some(b) if b == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(format!(
                "expected '{}' at offset {}, found '{}'",
                wanted as char, self.pos, b as char
            )),
            None => Err(format!("expected '{}' at end of statement", wanted as char)),
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.src.len()
    }

    /// `#id = KEYWORD(..)` or `#id = (A(..) B(..))`.
    pub fn instance(&mut self) -> Parsed<Entity> {
        self.expect(b'#')?;
        let id = self.digits()?;
        self.expect(b'=')?;
        self.skip_ws();

        let records = if self.peek() == Some(b'(') {
            self.pos += 1;
            let mut records = Vec::new();
            loop {
                self.skip_ws();
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => records.push(self.record()?),
                    None => return Err("unterminated complex instance".to_string()),
                }
            }
            if records.is_empty() {
                return Err("complex instance without records".to_string());
            }
            records
        } else {
            vec![self.record()?]
        };

        if !self.at_end() {
            return Err(format!("trailing characters after instance #{}", id));
        }

        Ok(Entity { id, records })
    }

    /// `KEYWORD(params)` used by header statements and instance bodies.
    pub fn record(&mut self) -> Parsed<Record> {
        self.skip_ws();
        let name = self.keyword()?;
        self.expect(b'(')?;
        let params = self.list_body()?;
        Ok(Record { name, params })
    }

    fn digits(&mut self) -> Parsed<u64> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("expected entity id at offset {}", start));
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|e| e.to_string())?
            .parse::<u64>()
            .map_err(|e| e.to_string())
    }

    fn keyword(&mut self) -> Parsed<String> {
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'!' => self.pos += 1,
            _ => return Err(format!("expected keyword at offset {}", start)),
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).to_ascii_uppercase())
    }

    /// Parameters after an opening parenthesis, consuming the closing one.
    fn list_body(&mut self) -> Parsed<Vec<Param>> {
        let mut params = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(params);
        }
        loop {
            params.push(self.param()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(params);
                }
                Some(b) => {
                    return Err(format!(
                        "unexpected '{}' in parameter list at offset {}",
                        b as char, self.pos
                    ))
                }
                None => return Err("unterminated parameter list".to_string()),
            }
        }
    }

    fn param(&mut self) -> Parsed<Param> {
        self.skip_ws();
        match self.peek() {
            Some(b'$') => {
                self.pos += 1;
                Ok(Param::Unset)
            }
            Some(b'*') => {
                self.pos += 1;
                Ok(Param::Derived)
            }
            Some(b'#') => {
                self.pos += 1;
                Ok(Param::Ref(self.digits()?))
            }
            Some(b'\'') => self.string(),
            Some(b'"') => self.binary(),
            Some(b'(') => {
                self.pos += 1;
                Ok(Param::List(self.list_body()?))
            }
            Some(b'.') if matches!(self.src.get(self.pos + 1), Some(b) if b.is_ascii_alphabetic()) => {
                self.enumeration()
            }
            Some(b) if b.is_ascii_digit() || b == b'+' || b == b'-' || b == b'.' => self.number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'!' => {
                let name = self.keyword()?;
                self.expect(b'(')?;
                Ok(Param::Typed(name, self.list_body()?))
            }
            Some(b) => Err(format!("unexpected '{}' at offset {}", b as char, self.pos)),
            None => Err("missing parameter".to_string()),
        }
    }

    fn string(&mut self) -> Parsed<Param> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(b'\'') => {
                    if self.src.get(self.pos + 1) == Some(&b'\'') {
                        out.push(b'\'');
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        return Ok(Param::Str(String::from_utf8_lossy(&out).into_owned()));
                    }
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn binary(&mut self) -> Parsed<Param> {
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'"' {
                let body = String::from_utf8_lossy(&self.src[start..self.pos - 1]).into_owned();
                return Ok(Param::Binary(body));
            }
        }
        Err("unterminated binary".to_string())
    }

    fn enumeration(&mut self) -> Parsed<Param> {
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'.' {
                let value = String::from_utf8_lossy(&self.src[start..self.pos]).to_ascii_uppercase();
                self.pos += 1;
                return Ok(Param::Enum(value));
            }
            if !(b.is_ascii_alphanumeric() || b == b'_') {
                break;
            }
            self.pos += 1;
        }
        Err(format!("malformed enumeration at offset {}", start))
    }

    fn number(&mut self) -> Parsed<Param> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'E' | b'e')
        ) {
            self.pos += 1;
        }
        let lexeme = std::str::from_utf8(&self.src[start..self.pos]).map_err(|e| e.to_string())?;
        let is_real = lexeme.contains(['.', 'E', 'e']);
        if !is_real {
            if let Ok(value) = lexeme.parse::<i64>() {
                return Ok(Param::Integer(value));
            }
        }
        lexeme
            .parse::<f64>()
            .map(Param::Real)
            .map_err(|_| format!("malformed number '{}'", lexeme))
    }
}

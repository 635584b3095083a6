//! Lenient parser for Python-style literal data.
//!
//! Generated code often prints a response body with `print(response.json())`,
//! which yields a Python `dict` repr instead of JSON: single-quoted strings,
//! `True`/`False`/`None`, trailing commas, tuples. This parser accepts that
//! syntax as well as plain JSON and produces a `serde_json::Value`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit for containers; matches serde_json's recursion limit.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at byte {position}: {message}")]
pub struct LiteralError {
    pub position: usize,
    pub message: String,
}

pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: input.as_bytes(),
        text: input,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos != parser.src.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'\\' if matches!(self.src.get(self.pos + 1), Some(b'\n')) => self.pos += 2,
                b'#' => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), LiteralError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'{') | Some(b'[') | Some(b'(') => self.parse_container(),
            Some(b'\'') | Some(b'"') => self.parse_strings(),
            Some(b'-') | Some(b'+') | Some(b'.') => self.parse_number(),
            Some(b) if b.is_ascii_digit() => self.parse_number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.parse_word(),
            Some(b) => Err(self.error(format!("unexpected character '{}'", b as char))),
        }
    }

    fn parse_container(&mut self) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = match self.peek() {
            Some(b'{') => self.parse_dict(),
            Some(b'[') => self.parse_sequence(b']').map(Value::Array),
            _ => self.parse_parenthesized(),
        };
        self.depth -= 1;
        value
    }

    fn parse_dict(&mut self) -> Result<Value, LiteralError> {
        self.expect(b'{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.parse_value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return Err(self.error("unsupported dict key")),
            };
            self.skip_ws();
            if self.peek() != Some(b':') {
                // `{1, 2}` is a set literal, which has no JSON counterpart.
                return Err(self.error("expected ':' after dict key"));
            }
            self.pos += 1;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_sequence(&mut self, close: u8) -> Result<Vec<Value>, LiteralError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {}
                _ => return Err(self.error(format!("expected ',' or '{}'", close as char))),
            }
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let items = self.parse_sequence(b')')?;
        let inner = &self.text[start + 1..self.pos - 1];
        // `(x)` is grouping, `(x,)` is a one-element tuple.
        if items.len() == 1 && !inner.trim_end().ends_with(',') {
            return items
                .into_iter()
                .next()
                .ok_or_else(|| self.error("empty group"));
        }
        Ok(Value::Array(items))
    }

    fn parse_word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word = &self.text[start..self.pos];
        match word {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ if is_string_prefix(word) && matches!(self.peek(), Some(b'\'') | Some(b'"')) => {
                self.pos = start;
                self.parse_strings()
            }
            _ => {
                self.pos = start;
                Err(self.error(format!("unknown name '{}'", word)))
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
            self.skip_ws();
        }
        let digits_start = self.pos;
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'_' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'-') | Some(b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        if self.pos == digits_start {
            return Err(self.error("expected a number"));
        }

        let negative = self.src[start] == b'-';
        let digits: String = self.text[digits_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let literal = if negative {
            format!("-{}", digits)
        } else {
            digits
        };

        if !is_float {
            if let Ok(n) = literal.parse::<i64>() {
                return Ok(Value::Number(Number::from(n)));
            }
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("invalid number '{}'", literal)))
    }

    /// Parses one or more adjacent string literals, concatenating them.
    fn parse_strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.parse_string()?;
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            let starts_string = match self.peek() {
                Some(b'\'') | Some(b'"') => true,
                Some(b) if b.is_ascii_alphabetic() => {
                    let mut end = self.pos;
                    while end < self.src.len() && self.src[end].is_ascii_alphabetic() {
                        end += 1;
                    }
                    is_string_prefix(&self.text[self.pos..end])
                        && matches!(self.src.get(end), Some(b'\'') | Some(b'"'))
                }
                _ => false,
            };
            if !starts_string {
                self.pos = checkpoint;
                return Ok(Value::String(out));
            }
            out.push_str(&self.parse_string()?);
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        while let Some(b) = self.peek() {
            match b {
                b'r' | b'R' => {
                    raw = true;
                    self.pos += 1;
                }
                b'u' | b'U' | b'b' | b'B' => self.pos += 1,
                _ => break,
            }
        }

        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.error("expected string quote")),
        };
        let triple = self.src.get(self.pos + 1) == Some(&quote)
            && self.src.get(self.pos + 2) == Some(&quote);
        self.pos += if triple { 3 } else { 1 };

        let mut out = String::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            if b == quote {
                if !triple {
                    self.pos += 1;
                    return Ok(out);
                }
                if self.src.get(self.pos + 1) == Some(&quote)
                    && self.src.get(self.pos + 2) == Some(&quote)
                {
                    self.pos += 3;
                    return Ok(out);
                }
            }
            if b == b'\n' && !triple {
                return Err(self.error("newline in string"));
            }
            if b == b'\\' && !raw {
                self.pos += 1;
                self.parse_escape(&mut out)?;
                continue;
            }

            let ch = self.text[self.pos..]
                .chars()
                .next()
                .ok_or_else(|| self.error("unterminated string"))?;
            out.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let Some(b) = self.peek() else {
            return Err(self.error("dangling escape"));
        };
        self.pos += 1;
        match b {
            b'n' => out.push('\n'),
            b't' => out.push('\t'),
            b'r' => out.push('\r'),
            b'0' => out.push('\0'),
            b'a' => out.push('\u{07}'),
            b'b' => out.push('\u{08}'),
            b'f' => out.push('\u{0C}'),
            b'v' => out.push('\u{0B}'),
            b'\\' => out.push('\\'),
            b'\'' => out.push('\''),
            b'"' => out.push('"'),
            b'/' => out.push('/'),
            b'\n' => {}
            b'x' => out.push(self.parse_hex_escape(2)?),
            b'u' => out.push(self.parse_hex_escape(4)?),
            b'U' => out.push(self.parse_hex_escape(8)?),
            _ => {
                // Python keeps unknown escapes verbatim.
                self.pos -= 1;
                let ch = self.text[self.pos..]
                    .chars()
                    .next()
                    .ok_or_else(|| self.error("dangling escape"))?;
                self.pos += ch.len_utf8();
                out.push('\\');
                out.push(ch);
            }
        }
        Ok(())
    }

    fn parse_hex_escape(&mut self, len: usize) -> Result<char, LiteralError> {
        let end = self.pos + len;
        let hex = self
            .text
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;

        // JSON-style surrogate pair
        if (0xD800..0xDC00).contains(&code) && self.text[self.pos..].starts_with("\\u") {
            let low_hex = self
                .text
                .get(self.pos + 2..self.pos + 6)
                .ok_or_else(|| self.error("truncated surrogate pair"))?;
            if let Ok(low) = u32::from_str_radix(low_hex, 16) {
                if (0xDC00..0xE000).contains(&low) {
                    self.pos += 6;
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined).ok_or_else(|| self.error("invalid surrogate"));
                }
            }
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }
}

fn is_string_prefix(word: &str) -> bool {
    !word.is_empty()
        && word.len() <= 2
        && word
            .chars()
            .all(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B'))
}

//! Valve KeyValues ("VDF") text parsing.
//!
//! Steam writes every file this crate cares about (`appmanifest_*.acf`,
//! `libraryfolders.vdf`) in the same loose format: a sequence of key/value
//! pairs where a value is either a string or a `{ ... }` block of more pairs.
//! Tokens may be quoted or bare, and `//` starts a comment that runs to the end
//! of the line.
//!
//! ```text
//! "AppState"
//! {
//!     "appid"       "220"
//!     "StateFlags"  "4"
//! }
//! ```
//!
//! Keys are matched case-insensitively because Steam itself has never been
//! consistent about it (`LibraryFolders` vs `libraryfolders`).

use crate::error::{ErrorKind, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Nesting limit; real Steam files never go deeper than three or four.
const MAX_DEPTH: usize = 32;

/// A KeyValues value: either a plain string or a nested block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Block(Block),
}
impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::String(_) => None,
            Value::Block(b) => Some(b),
        }
    }
}

/// An ordered list of key/value pairs. Duplicate keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    entries: Vec<(String, Value)>,
}
impl Block {
    /// First value stored under `key`, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_block(&self, key: &str) -> Option<&Block> {
        self.get(key).and_then(Value::as_block)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a complete KeyValues document into its top-level block.
///
/// # Examples
///
/// ```
/// use ludex_manifest::vdf;
///
/// let doc = vdf::parse(r#""AppState" { "appid" "220" }"#).unwrap();
/// let state = doc.get_block("appstate").unwrap();
/// assert_eq!(state.get_str("AppID"), Some("220"));
/// ```
pub fn parse(text: &str) -> Result<Block> {
    let mut lexer = Lexer::new(text);
    parse_block(&mut lexer, 0, true)
}

enum Token {
    Text(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}
impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        // A UTF-8 BOM shows up in files that went through a Windows editor.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self { chars: text.chars().peekable(), line: 1 }
    }

    fn syntax(&self, reason: &'static str) -> ErrorKind {
        ErrorKind::Syntax { line: self.line, reason }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            if c == '/' {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if lookahead.peek() == Some(&'/') {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                    continue;
                }
            }
            break;
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_trivia();
            let Some(&c) = self.chars.peek() else {
                return Ok(None);
            };
            return Ok(Some(match c {
                '{' => {
                    self.bump();
                    Token::Open
                },
                '}' => {
                    self.bump();
                    Token::Close
                },
                '"' => {
                    self.bump();
                    Token::Text(self.quoted()?)
                },
                // Platform conditionals such as `[$WIN32]` trail a value; they
                // never matter on the files we read.
                '[' => {
                    while let Some(c) = self.bump() {
                        if c == ']' {
                            break;
                        }
                    }
                    continue;
                },
                _ => Token::Text(self.bare()),
            }));
        }
    }

    fn quoted(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => exn::bail!(self.syntax("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    },
                    None => exn::bail!(self.syntax("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '"' | '{' | '}') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

fn parse_block(lexer: &mut Lexer<'_>, depth: usize, top_level: bool) -> Result<Block> {
    if depth > MAX_DEPTH {
        exn::bail!(lexer.syntax("nesting too deep"));
    }
    let mut block = Block::default();
    loop {
        let key = match lexer.next_token()? {
            Some(Token::Text(key)) => key,
            Some(Token::Close) if !top_level => return Ok(block),
            Some(Token::Close) => exn::bail!(lexer.syntax("unbalanced closing brace")),
            Some(Token::Open) => exn::bail!(lexer.syntax("expected a key, found '{'")),
            None if top_level => return Ok(block),
            None => exn::bail!(lexer.syntax("unexpected end of document")),
        };
        let value = match lexer.next_token()? {
            Some(Token::Text(value)) => Value::String(value),
            Some(Token::Open) => Value::Block(parse_block(lexer, depth + 1, false)?),
            Some(Token::Close) | None => exn::bail!(lexer.syntax("key without a value")),
        };
        block.entries.push((key, value));
    }
}

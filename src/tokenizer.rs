use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A numeric literal stored as its whole part and the integer value of its
/// fractional digits. `1.25` is `(1, 25)`, `0x1f` is `(31, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub whole: u64,
    pub fractional: u64,
}

impl NumberLiteral {
    pub fn new(whole: u64, fractional: u64) -> Self {
        Self { whole, fractional }
    }
}

impl std::fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.whole, self.fractional)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TokenType {
    // Literals
    Name(String),
    String(String),
    Char(char),
    Number(NumberLiteral),

    // Single-character tokens
    Star,
    Plus,
    Minus,
    Slash,
    Dot,
    Equal,
    LeftBrace,
    RightBrace,
    Less,
    Greater,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Percent,
    Pipe,
    Ampersand,
    Caret,
    Semicolon,
    Colon,
    Comma,
    At,

    // Merged by the expression parser
    GreaterEqual,
    LessEqual,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Name(name) => write!(f, "{name}"),
            TokenType::String(s) => write!(f, "\"{s}\""),
            TokenType::Char(c) => write!(f, "'{c}'"),
            TokenType::Number(n) => write!(f, "{}.{}", n.whole, n.fractional),
            TokenType::Star => write!(f, "*"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Dot => write!(f, "."),
            TokenType::Equal => write!(f, "="),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::Less => write!(f, "<"),
            TokenType::Greater => write!(f, ">"),
            TokenType::LeftBracket => write!(f, "["),
            TokenType::RightBracket => write!(f, "]"),
            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::Percent => write!(f, "%"),
            TokenType::Pipe => write!(f, "|"),
            TokenType::Ampersand => write!(f, "&"),
            TokenType::Caret => write!(f, "^"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Colon => write!(f, ":"),
            TokenType::Comma => write!(f, ","),
            TokenType::At => write!(f, "@"),
            TokenType::GreaterEqual => write!(f, ">="),
            TokenType::LessEqual => write!(f, "<="),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, span: Span) -> Self {
        Self { token_type, span }
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    /// The raw text of a `Name` token.
    pub fn name(&self) -> Option<&str> {
        match &self.token_type {
            TokenType::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_name(&self, word: &str) -> bool {
        self.name() == Some(word)
    }

    /// A new token of another type at this token's position.
    pub fn derive(&self, token_type: TokenType) -> Token {
        Token {
            token_type,
            span: self.span,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token_type)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("Unrecognized character {character:?} at {span}")]
    UnexpectedCharacter { character: char, span: Span },
    #[error("Unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },
    #[error("Character literal at {span} must hold exactly one character")]
    InvalidCharLiteral { span: Span },
    #[error("Unterminated block comment starting at {span}")]
    UnterminatedComment { span: Span },
    #[error("Malformed number at {span}: {reason}")]
    InvalidNumber { reason: &'static str, span: Span },
}

impl TokenizeError {
    pub fn span(&self) -> Span {
        match self {
            TokenizeError::UnexpectedCharacter { span, .. }
            | TokenizeError::UnterminatedString { span }
            | TokenizeError::InvalidCharLiteral { span }
            | TokenizeError::UnterminatedComment { span }
            | TokenizeError::InvalidNumber { span, .. } => *span,
        }
    }
}

#[derive(Debug)]
enum ScanError {
    UnterminatedString,
    InvalidCharLiteral,
    UnterminatedComment,
    InvalidNumber(&'static str),
}

impl ScanError {
    fn at(self, span: Span) -> TokenizeError {
        match self {
            ScanError::UnterminatedString => TokenizeError::UnterminatedString { span },
            ScanError::InvalidCharLiteral => TokenizeError::InvalidCharLiteral { span },
            ScanError::UnterminatedComment => TokenizeError::UnterminatedComment { span },
            ScanError::InvalidNumber(reason) => TokenizeError::InvalidNumber { reason, span },
        }
    }
}

type Scan<'a, T> = Result<Option<(T, &'a str)>, ScanError>;

pub fn tokens(source: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();

    while let Some(token) = tokenizer.token()? {
        tokens.push(token);
    }

    tracing::debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

pub struct Tokenizer<'a> {
    source: &'a str,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            line: 1,
            column: 1,
        }
    }

    /// The next token, or `None` once the source is exhausted.
    pub fn token(&mut self) -> Result<Option<Token>, TokenizeError> {
        loop {
            let start = self.here();
            match first_of(&[whitespace, line_comment, block_comment], self.source) {
                Ok(Some(((), rest))) => self.advance_to(rest),
                Ok(None) => break,
                Err(e) => return Err(e.at(start)),
            }
        }

        let Some(character) = self.source.chars().next() else {
            return Ok(None);
        };

        let start = self.here();
        let scanned = first_of(&[string, char_literal, number, name, symbol], self.source)
            .map_err(|e| e.at(start))?;

        match scanned {
            Some((token_type, rest)) => {
                self.advance_to(rest);
                let span = Span {
                    end_line: self.line,
                    end_column: self.column,
                    ..start
                };
                Ok(Some(Token::new(token_type, span)))
            }
            None => Err(TokenizeError::UnexpectedCharacter {
                character,
                span: start,
            }),
        }
    }

    fn here(&self) -> Span {
        Span::new(self.line, self.column, 1)
    }

    fn advance_to(&mut self, rest: &'a str) {
        let consumed = &self.source[..self.source.len() - rest.len()];
        let mut chars = consumed.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' | '\r' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        self.source = rest;
    }
}

/// Runs the scanners in priority order and returns the first match.
fn first_of<'a, T>(
    scanners: &[for<'s> fn(&'s str) -> Scan<'s, T>],
    source: &'a str,
) -> Scan<'a, T> {
    for scanner in scanners {
        if let Some(found) = scanner(source)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn whitespace(source: &str) -> Scan<'_, ()> {
    let len: usize = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Ok(Some(((), &source[len..])))
    } else {
        Ok(None)
    }
}

/// `// ...` up to, but not including, the line ending.
fn line_comment(source: &str) -> Scan<'_, ()> {
    let Some(body) = source.strip_prefix("//") else {
        return Ok(None);
    };
    let len: usize = body
        .chars()
        .take_while(|c| *c != '\n' && *c != '\r')
        .map(char::len_utf8)
        .sum();
    Ok(Some(((), &body[len..])))
}

/// `/* ... */`, found by looking at each character together with the one
/// after it.
fn block_comment(source: &str) -> Scan<'_, ()> {
    let Some(body) = source.strip_prefix("/*") else {
        return Ok(None);
    };
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '*' {
            if let Some(&(_, '/')) = chars.peek() {
                return Ok(Some(((), &body[i + 2..])));
            }
        }
    }
    Err(ScanError::UnterminatedComment)
}

fn string(source: &str) -> Scan<'_, TokenType> {
    let Some(body) = source.strip_prefix('"') else {
        return Ok(None);
    };
    match body.find('"') {
        Some(end) => Ok(Some((
            TokenType::String(body[..end].to_string()),
            &body[end + 1..],
        ))),
        None => Err(ScanError::UnterminatedString),
    }
}

fn char_literal(source: &str) -> Scan<'_, TokenType> {
    let Some(body) = source.strip_prefix('\'') else {
        return Ok(None);
    };
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(c), Some('\'')) if c != '\'' => {
            let len = c.len_utf8() + 1;
            Ok(Some((TokenType::Char(c), &body[len..])))
        }
        _ => Err(ScanError::InvalidCharLiteral),
    }
}

fn number(source: &str) -> Scan<'_, TokenType> {
    if !source.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(None);
    }

    for (prefix, radix, missing) in [
        ("0x", 16, "expected hexadecimal digits after \"0x\""),
        ("0b", 2, "expected binary digits after \"0b\""),
    ] {
        if let Some(body) = source.strip_prefix(prefix) {
            let len = digits(body, radix);
            if len == 0 {
                return Err(ScanError::InvalidNumber(missing));
            }
            let whole = parse_digits(&body[..len], radix)?;
            return Ok(Some((
                TokenType::Number(NumberLiteral::new(whole, 0)),
                &body[len..],
            )));
        }
    }

    let len = digits(source, 10);
    let whole = parse_digits(&source[..len], 10)?;
    let rest = &source[len..];

    // A dot only starts a fraction when a digit follows it.
    if let Some(fraction) = rest.strip_prefix('.') {
        let fraction_len = digits(fraction, 10);
        if fraction_len > 0 {
            let fractional = parse_digits(&fraction[..fraction_len], 10)?;
            return Ok(Some((
                TokenType::Number(NumberLiteral::new(whole, fractional)),
                &fraction[fraction_len..],
            )));
        }
    }

    Ok(Some((
        TokenType::Number(NumberLiteral::new(whole, 0)),
        rest,
    )))
}

fn digits(source: &str, radix: u32) -> usize {
    source
        .chars()
        .take_while(|c| c.is_digit(radix))
        .map(char::len_utf8)
        .sum()
}

fn parse_digits(digits: &str, radix: u32) -> Result<u64, ScanError> {
    u64::from_str_radix(digits, radix)
        .map_err(|_| ScanError::InvalidNumber("literal does not fit in 64 bits"))
}

fn name(source: &str) -> Scan<'_, TokenType> {
    let mut chars = source.chars();

    let Some(first) = chars.next() else {
        return Ok(None);
    };
    if !first.is_alphabetic() && first != '_' {
        return Ok(None);
    }

    let len = first.len_utf8()
        + chars
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
            .map(char::len_utf8)
            .sum::<usize>();

    Ok(Some((TokenType::Name(source[..len].to_string()), &source[len..])))
}

fn symbol(source: &str) -> Scan<'_, TokenType> {
    let Some(c) = source.chars().next() else {
        return Ok(None);
    };
    let token_type = match c {
        '*' => TokenType::Star,
        '+' => TokenType::Plus,
        '-' => TokenType::Minus,
        '/' => TokenType::Slash,
        '.' => TokenType::Dot,
        '=' => TokenType::Equal,
        '{' => TokenType::LeftBrace,
        '}' => TokenType::RightBrace,
        '<' => TokenType::Less,
        '>' => TokenType::Greater,
        '[' => TokenType::LeftBracket,
        ']' => TokenType::RightBracket,
        '(' => TokenType::LeftParen,
        ')' => TokenType::RightParen,
        '%' => TokenType::Percent,
        '|' => TokenType::Pipe,
        '&' => TokenType::Ampersand,
        '^' => TokenType::Caret,
        ';' => TokenType::Semicolon,
        ':' => TokenType::Colon,
        ',' => TokenType::Comma,
        '@' => TokenType::At,
        _ => return Ok(None),
    };
    Ok(Some((token_type, &source[c.len_utf8()..])))
}

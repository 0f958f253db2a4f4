use crate::tokenizer::{Token, TokenType};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Delimiter {
    Paren,
    Brace,
    Angle,
}

impl Delimiter {
    fn opens(&self, token: &Token) -> bool {
        matches!(
            (self, token.token_type()),
            (Delimiter::Paren, TokenType::LeftParen)
                | (Delimiter::Brace, TokenType::LeftBrace)
                | (Delimiter::Angle, TokenType::Less)
        )
    }

    fn closes(&self, token: &Token) -> bool {
        matches!(
            (self, token.token_type()),
            (Delimiter::Paren, TokenType::RightParen)
                | (Delimiter::Brace, TokenType::RightBrace)
                | (Delimiter::Angle, TokenType::Greater)
        )
    }
}

/// The run between an already consumed opening delimiter and its matching
/// closing delimiter.
#[derive(Debug)]
pub(crate) struct Enclosed<'a> {
    pub inner: &'a [Token],
    pub close: &'a Token,
    pub rest: &'a [Token],
}

/// Scans `tokens`, which start right after an opening delimiter, for the
/// closing delimiter at depth zero. `None` if the run is unterminated.
pub(crate) fn enclosed(tokens: &[Token], delimiter: Delimiter) -> Option<Enclosed<'_>> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if delimiter.opens(token) {
            depth += 1;
        } else if delimiter.closes(token) {
            if depth == 0 {
                return Some(Enclosed {
                    inner: &tokens[..i],
                    close: token,
                    rest: &tokens[i + 1..],
                });
            }
            depth -= 1;
        }
    }
    None
}

/// Splits a balanced run at every `separator` not nested inside `delimiter`.
/// An empty run has no groups; otherwise there is one more group than there
/// are top-level separators, and groups may be empty.
pub(crate) fn split_top_level<'a>(
    tokens: &'a [Token],
    separator: &TokenType,
    delimiter: Delimiter,
) -> Vec<&'a [Token]> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if delimiter.opens(token) {
            depth += 1;
        } else if delimiter.closes(token) {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.token_type() == separator {
            groups.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    groups.push(&tokens[start..]);
    groups
}

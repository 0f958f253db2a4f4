use crate::{
    ast::{dotted_parts, Expr},
    tokenizer::{Token, TokenType},
};

use super::{
    delimited::{enclosed, split_top_level, Delimiter},
    ParseContext, ParseError, ParseErrorWithContext,
};

/// Groups a flat token run into invocations and subexpressions and merges
/// `>=`/`<=`. Everything else is passed through in order.
pub(crate) fn expression(
    context: &ParseContext,
    tokens: &[Token],
) -> Result<Vec<Expr>, ParseErrorWithContext> {
    let _guard = context.push("expression");
    let mut out = Vec::new();
    let mut tokens = tokens;

    while let Some((token, rest)) = tokens.split_first() {
        let next = rest.first();
        match (token.token_type(), next.map(Token::token_type)) {
            (TokenType::Greater | TokenType::Less, Some(TokenType::Equal)) => {
                let merged = if token.token_type() == &TokenType::Greater {
                    TokenType::GreaterEqual
                } else {
                    TokenType::LessEqual
                };
                let mut merged = token.derive(merged);
                merged.span = token.span + rest[0].span;
                out.push(Expr::Token(merged));
                tokens = &rest[1..];
            }
            (TokenType::Name(name), Some(TokenType::LeftParen)) => {
                let (invocation, rest) = invocation(context, token, name, &rest[1..])?;
                out.push(invocation);
                tokens = rest;
            }
            (TokenType::LeftParen, _) => {
                let (subexpression, rest) = subexpression(context, token, rest)?;
                out.push(subexpression);
                tokens = rest;
            }
            _ => {
                out.push(Expr::Token(token.clone()));
                tokens = rest;
            }
        }
    }

    Ok(out)
}

fn invocation<'a>(
    context: &ParseContext,
    head: &Token,
    name: &str,
    tokens: &'a [Token],
) -> Result<(Expr, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("invocation");
    let Some(name_parts) = dotted_parts(name) else {
        return Err(context.error(
            ParseError::MalformedName(name.to_string()),
            head.span,
            Some(head),
        ));
    };
    let Some(found) = enclosed(tokens, Delimiter::Paren) else {
        return Err(context.error(
            ParseError::Unterminated("invocation arguments"),
            head.span,
            None,
        ));
    };

    let mut args = Vec::new();
    for arg in split_top_level(found.inner, &TokenType::Comma, Delimiter::Paren) {
        if arg.is_empty() {
            return Err(context.error(ParseError::Empty("argument"), head.span, None));
        }
        args.push(expression(context, arg)?);
    }

    Ok((
        Expr::Invocation {
            name_parts,
            args,
            span: head.span + found.close.span,
        },
        found.rest,
    ))
}

fn subexpression<'a>(
    context: &ParseContext,
    head: &Token,
    tokens: &'a [Token],
) -> Result<(Expr, &'a [Token]), ParseErrorWithContext> {
    let Some(found) = enclosed(tokens, Delimiter::Paren) else {
        return Err(context.error(
            ParseError::Unterminated("parenthesized expression"),
            head.span,
            None,
        ));
    };
    Ok((
        Expr::Subexpression {
            body: expression(context, found.inner)?,
            span: head.span + found.close.span,
        },
        found.rest,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokens;

    fn parse(source: &str) -> Result<Vec<Expr>, ParseErrorWithContext> {
        let context = ParseContext::new();
        expression(&context, &tokens(source).unwrap())
    }

    fn kinds(exprs: &[Expr]) -> Vec<String> {
        exprs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_merges_two_character_comparisons() {
        let exprs = parse("a >= b <= c").unwrap();
        assert_eq!(kinds(&exprs), vec!["a", ">=", "b", "<=", "c"]);
        let Expr::Token(merged) = &exprs[1] else {
            panic!("expected token");
        };
        assert_eq!(merged.token_type(), &TokenType::GreaterEqual);
        assert_eq!(merged.span.end_column - merged.span.start_column, 2);
        assert_eq!(merged.span.start_column, exprs[0].span().end_column + 1);
    }

    #[test]
    fn test_lone_comparisons_pass_through() {
        let exprs = parse("a > b = c").unwrap();
        assert_eq!(kinds(&exprs), vec!["a", ">", "b", "=", "c"]);
    }

    #[test]
    fn test_invocation_with_nested_arguments() {
        let exprs = parse("math.max(a + 1, min(b, c), (d))").unwrap();
        match &exprs[..] {
            [Expr::Invocation {
                name_parts, args, ..
            }] => {
                assert_eq!(name_parts, &vec!["math".to_string(), "max".to_string()]);
                assert_eq!(args.len(), 3);
                assert_eq!(kinds(&args[0]), vec!["a", "+", "1.0"]);
                assert!(matches!(args[1][0], Expr::Invocation { .. }));
                assert!(matches!(args[2][0], Expr::Subexpression { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invocation_without_arguments() {
        let exprs = parse("bar()").unwrap();
        let Expr::Invocation { args, .. } = &exprs[0] else {
            panic!("expected invocation");
        };
        assert!(args.is_empty());
    }

    #[test]
    fn test_subexpression() {
        let exprs = parse("(a + (b * c)) - d").unwrap();
        assert_eq!(exprs.len(), 3);
        let Expr::Subexpression { body, .. } = &exprs[0] else {
            panic!("expected subexpression");
        };
        assert_eq!(body.len(), 3);
        assert!(matches!(body[2], Expr::Subexpression { .. }));
    }

    #[test]
    fn test_unterminated_invocation() {
        let err = parse("foo(a, b").unwrap_err();
        assert!(matches!(err.error, ParseError::Unterminated(_)));
    }

    #[test]
    fn test_unterminated_subexpression() {
        let err = parse("(a + b").unwrap_err();
        assert!(matches!(err.error, ParseError::Unterminated(_)));
    }

    #[test]
    fn test_empty_argument() {
        let err = parse("foo(a,)").unwrap_err();
        assert!(matches!(err.error, ParseError::Empty("argument")));
    }

    #[test]
    fn test_malformed_invocation_name() {
        let err = parse("a..b()").unwrap_err();
        assert!(matches!(err.error, ParseError::MalformedName(_)));
    }
}

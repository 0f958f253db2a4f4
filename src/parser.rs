mod delimited;
pub mod expression;

use std::cell::RefCell;

use crate::{
    ast::{dotted_parts, GenericType, Item, Module, Qualifier, Statement},
    span::Span,
    tokenizer::{Token, TokenType},
};

use self::delimited::{enclosed, split_top_level, Delimiter, Enclosed};
use self::expression::expression;

#[derive(Debug)]
pub struct ParseErrorWithContext {
    pub error: ParseError,
    context: Vec<&'static str>,
    pub span: Span,
    pub token: Option<Token>,
}

impl ParseErrorWithContext {
    /// Errors about a well-formed construct that breaks a language rule,
    /// rather than about missing or misplaced tokens.
    pub fn is_semantic(&self) -> bool {
        matches!(self.error, ParseError::ConflictingQualifiers)
    }
}

impl std::error::Error for ParseErrorWithContext {}

impl std::fmt::Display for ParseErrorWithContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "While parsing {}", self.context.join(" > "))?;
        write!(f, "{} at {}", self.error, self.span)?;
        if let Some(token) = &self.token {
            write!(f, " but found \"{}\"", token.token_type)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Expected {0}")]
    Expected(&'static str),
    #[error("Unterminated {0}")]
    Unterminated(&'static str),
    #[error("Empty {0}")]
    Empty(&'static str),
    #[error("Identifier \"{0}\" has an empty component around a dot")]
    MalformedName(String),
    #[error("A declaration can only have one of move, copy or reference")]
    ConflictingQualifiers,
}

#[derive(Debug)]
pub(crate) struct ParseContext {
    stack: RefCell<Vec<&'static str>>,
}

impl ParseContext {
    pub(crate) fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, name: &'static str) -> ParseContextGuard {
        self.stack.borrow_mut().push(name);
        ParseContextGuard::new(self)
    }

    fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    pub(crate) fn error(
        &self,
        error: ParseError,
        span: Span,
        token: Option<&Token>,
    ) -> ParseErrorWithContext {
        ParseErrorWithContext {
            error,
            context: self.stack.borrow().clone(),
            span,
            token: token.cloned(),
        }
    }
}

pub(crate) struct ParseContextGuard<'a> {
    context: &'a ParseContext,
}

impl<'a> ParseContextGuard<'a> {
    fn new(context: &'a ParseContext) -> Self {
        Self { context }
    }
}

impl<'a> Drop for ParseContextGuard<'a> {
    fn drop(&mut self) {
        self.context.pop();
    }
}

type Parsed<'a, T> = Result<(T, &'a [Token]), ParseErrorWithContext>;

pub fn module(tokens: &[Token]) -> Result<Module, ParseErrorWithContext> {
    let context = ParseContext::new();
    let _guard = context.push("module");
    let mut items = Vec::new();
    let mut tokens = tokens;

    while let Some((head, rest)) = tokens.split_first() {
        let (item, rest) = item(&context, head, rest)?;
        items.push(item);
        tokens = rest;
    }

    tracing::debug!(items = items.len(), "parsed module");
    Ok(Module { items })
}

fn item<'a>(context: &ParseContext, head: &'a Token, tokens: &'a [Token]) -> Parsed<'a, Item> {
    match head.token_type() {
        TokenType::Name(word) => match word.as_str() {
            "imports" => import(context, head, tokens),
            "scope" => scope(context, head, tokens),
            "type" => type_declaration(context, head, tokens),
            "fn" => function(context, head, tokens),
            _ => Ok((Item::Stray(head.clone()), tokens)),
        },
        TokenType::At => attribute(context, head, tokens),
        _ => Ok((Item::Stray(head.clone()), tokens)),
    }
}

fn import<'a>(context: &ParseContext, head: &'a Token, tokens: &'a [Token]) -> Parsed<'a, Item> {
    let _guard = context.push("imports");
    let (name, tokens) = match_identifier(context, head, tokens, "import name")?;
    let span = head.span + name.span;
    Ok((
        Item::Import {
            name: name.name().unwrap_or_default().to_string(),
            span,
        },
        skip_semicolon(tokens),
    ))
}

fn scope<'a>(context: &ParseContext, head: &'a Token, tokens: &'a [Token]) -> Parsed<'a, Item> {
    let _guard = context.push("scope");
    let (name, tokens) = match_identifier(context, head, tokens, "scope name")?;
    let dotted = name.name().unwrap_or_default();
    if dotted_parts(dotted).is_none() {
        return Err(context.error(
            ParseError::MalformedName(dotted.to_string()),
            name.span,
            None,
        ));
    }
    Ok((
        Item::Scope {
            name: dotted.to_string(),
            span: head.span + name.span,
        },
        skip_semicolon(tokens),
    ))
}

fn attribute<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Item> {
    let _guard = context.push("attribute");
    let (name, tokens) = match_identifier(context, head, tokens, "attribute name after \"@\"")?;
    Ok((
        Item::Attribute {
            name: name.name().unwrap_or_default().to_string(),
            span: head.span + name.span,
        },
        tokens,
    ))
}

fn type_declaration<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Item> {
    let _guard = context.push("type");
    let (name, tokens) = match_identifier(context, head, tokens, "type name")?;
    let tokens = consume(
        context,
        head,
        tokens,
        TokenType::LeftBrace,
        "\"{\" after type name",
    )?;
    let (body, close, tokens) = type_body(context, head, tokens)?;
    Ok((
        Item::Type {
            name: name.name().unwrap_or_default().to_string(),
            body,
            span: head.span + close.span,
        },
        tokens,
    ))
}

/// Captures a type body up to its matching closing brace without parsing it.
fn type_body<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Result<(Vec<Token>, &'a Token, &'a [Token]), ParseErrorWithContext> {
    let Enclosed { inner, close, rest } = enclose(context, head, tokens, Delimiter::Brace, "type body")?;
    Ok((inner.to_vec(), close, rest))
}

fn function<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Item> {
    let _guard = context.push("fn");
    let (name, tokens) = match_identifier(context, head, tokens, "function name")?;
    let tokens = consume(
        context,
        head,
        tokens,
        TokenType::LeftParen,
        "\"(\" after function name",
    )?;
    let params = enclose(context, head, tokens, Delimiter::Paren, "parameter list")?;

    let mut groups = Vec::new();
    for group in split_top_level(params.inner, &TokenType::Comma, Delimiter::Paren) {
        if group.is_empty() {
            return Err(context.error(ParseError::Empty("parameter"), head.span, None));
        }
        groups.push(group.to_vec());
    }

    let tokens = consume(
        context,
        head,
        params.rest,
        TokenType::LeftBrace,
        "\"{\" to open the function body",
    )?;
    let body = enclose(context, head, tokens, Delimiter::Brace, "function body")?;
    let statements = statements(context, body.inner)?;

    tracing::trace!(
        name = name.name().unwrap_or_default(),
        statements = statements.len(),
        "parsed function"
    );

    Ok((
        Item::Function {
            name: name.name().unwrap_or_default().to_string(),
            params: groups,
            body: statements,
            span: head.span + body.close.span,
        },
        body.rest,
    ))
}

/// Parses a captured block body into its statements.
pub(crate) fn statements(
    context: &ParseContext,
    tokens: &[Token],
) -> Result<Vec<Statement>, ParseErrorWithContext> {
    let mut statements = Vec::new();
    let mut tokens = tokens;

    while let Some((head, rest)) = tokens.split_first() {
        let (statement, rest) = statement(context, head, rest, tokens)?;
        statements.push(statement);
        tokens = rest;
    }

    Ok(statements)
}

fn statement<'a>(
    context: &ParseContext,
    head: &'a Token,
    rest: &'a [Token],
    tokens: &'a [Token],
) -> Parsed<'a, Statement> {
    let TokenType::Name(word) = head.token_type() else {
        return Ok((Statement::Stray(head.clone()), rest));
    };

    match word.as_str() {
        "if" => if_statement(context, head, rest),
        "dec" => declaration(context, head, rest),
        "for" => for_statement(context, head, rest),
        "else" => Err(context.error(
            ParseError::Expected("\"if\" before \"else\""),
            head.span,
            Some(head),
        )),
        _ => match rest.first().map(Token::token_type) {
            Some(TokenType::LeftParen) => expression_statement(context, head, tokens),
            Some(TokenType::Equal) => assignment(context, head, word, &rest[1..]),
            _ => Ok((Statement::Stray(head.clone()), rest)),
        },
    }
}

fn if_statement<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Statement> {
    let _guard = context.push("if");
    let tokens = consume(context, head, tokens, TokenType::LeftParen, "\"(\" after if")?;
    let condition = enclose(context, head, tokens, Delimiter::Paren, "if condition")?;
    if condition.inner.is_empty() {
        return Err(context.error(ParseError::Empty("if condition"), head.span, None));
    }
    let cond = expression(context, condition.inner)?;

    let tokens = consume(
        context,
        head,
        condition.rest,
        TokenType::LeftBrace,
        "\"{\" after if condition",
    )?;
    let then_block = enclose(context, head, tokens, Delimiter::Brace, "if body")?;
    let cond_true = statements(context, then_block.inner)?;
    let mut span = head.span + then_block.close.span;
    let mut tokens = then_block.rest;

    let mut cond_false = Vec::new();
    if let Some((else_token, rest)) = tokens.split_first() {
        if else_token.is_name("else") {
            let rest = consume(context, head, rest, TokenType::LeftBrace, "\"{\" after else")?;
            let else_block = enclose(context, head, rest, Delimiter::Brace, "else body")?;
            cond_false = statements(context, else_block.inner)?;
            span = span + else_block.close.span;
            tokens = else_block.rest;
        }
    }

    Ok((
        Statement::If {
            cond,
            cond_true,
            cond_false,
            span,
        },
        tokens,
    ))
}

fn declaration<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Statement> {
    let _guard = context.push("dec");
    let (name, tokens) = match_identifier(context, head, tokens, "variable name after dec")?;
    let name = name.name().unwrap_or_default().to_string();

    match tokens.split_first() {
        Some((semicolon, rest)) if semicolon.token_type() == &TokenType::Semicolon => Ok((
            Statement::Declaration {
                name,
                typename: None,
                qualifier: None,
                span: head.span + semicolon.span,
            },
            rest,
        )),
        Some((colon, rest)) if colon.token_type() == &TokenType::Colon => {
            let (type_tokens, semicolon, rest) = until_semicolon(context, head, rest)?;
            let (qualifiers, type_tokens) = split_qualifiers(type_tokens);
            if qualifiers.len() > 1 {
                return Err(context.error(ParseError::ConflictingQualifiers, head.span, None));
            }
            let typename = generic_type(context, head, &type_tokens)?;
            Ok((
                Statement::Declaration {
                    name,
                    typename: Some(typename),
                    qualifier: qualifiers.first().copied(),
                    span: head.span + semicolon.span,
                },
                rest,
            ))
        }
        found => Err(context.error(
            ParseError::Expected("\";\" or \":\" after the variable name"),
            head.span,
            found.map(|(token, _)| token),
        )),
    }
}

/// Separates `move`/`copy`/`reference` from the type tokens in one pass.
fn split_qualifiers(tokens: &[Token]) -> (Vec<Qualifier>, Vec<Token>) {
    let mut qualifiers = Vec::new();
    let mut rest = Vec::new();
    for token in tokens {
        match token.name().and_then(Qualifier::from_keyword) {
            Some(qualifier) => qualifiers.push(qualifier),
            None => rest.push(token.clone()),
        }
    }
    (qualifiers, rest)
}

/// Parses `Name` or `Name<Arg, ...>` where every argument is itself a
/// generic type. The run must hold exactly one type.
pub(crate) fn generic_type(
    context: &ParseContext,
    head: &Token,
    tokens: &[Token],
) -> Result<GenericType, ParseErrorWithContext> {
    let _guard = context.push("generic type");
    let Some((first, rest)) = tokens.split_first() else {
        return Err(context.error(ParseError::Expected("type name"), head.span, None));
    };
    let Some(typename) = first.name() else {
        return Err(context.error(
            ParseError::Expected("type name"),
            first.span,
            Some(first),
        ));
    };

    let Some((open, rest)) = rest.split_first() else {
        return Ok(GenericType {
            typename: typename.to_string(),
            generic_args: Vec::new(),
        });
    };
    if open.token_type() != &TokenType::Less {
        return Err(context.error(
            ParseError::Expected("generic arguments after type name"),
            open.span,
            Some(open),
        ));
    }

    let Some(args) = enclosed(rest, Delimiter::Angle) else {
        return Err(context.error(
            ParseError::Unterminated("generic argument list"),
            first.span,
            None,
        ));
    };
    if let Some(extra) = args.rest.first() {
        return Err(context.error(
            ParseError::Expected("end of type after \">\""),
            extra.span,
            Some(extra),
        ));
    }
    if args.inner.is_empty() {
        return Err(context.error(
            ParseError::Empty("generic argument list"),
            first.span,
            None,
        ));
    }

    let mut generic_args = Vec::new();
    for arg in split_top_level(args.inner, &TokenType::Comma, Delimiter::Angle) {
        if arg.is_empty() {
            return Err(context.error(ParseError::Empty("generic argument"), first.span, None));
        }
        generic_args.push(generic_type(context, first, arg)?);
    }

    Ok(GenericType {
        typename: typename.to_string(),
        generic_args,
    })
}

fn for_statement<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Statement> {
    let _guard = context.push("for");
    let tokens = consume(context, head, tokens, TokenType::LeftParen, "\"(\" after for")?;
    let header = enclose(context, head, tokens, Delimiter::Paren, "for header")?;
    let clauses = split_top_level(header.inner, &TokenType::Semicolon, Delimiter::Paren);
    let [init, cond, step] = clauses.as_slice() else {
        return Err(context.error(
            ParseError::Expected("three \";\"-separated clauses in the for header"),
            head.span,
            None,
        ));
    };

    let tokens = consume(
        context,
        head,
        header.rest,
        TokenType::LeftBrace,
        "\"{\" after the for header",
    )?;
    let body = enclose(context, head, tokens, Delimiter::Brace, "for body")?;

    Ok((
        Statement::For {
            init: init.to_vec(),
            cond: cond.to_vec(),
            step: step.to_vec(),
            body: statements(context, body.inner)?,
            span: head.span + body.close.span,
        },
        body.rest,
    ))
}

/// `name(...) ... ;` kept only for its side effects.
fn expression_statement<'a>(
    context: &ParseContext,
    head: &'a Token,
    tokens: &'a [Token],
) -> Parsed<'a, Statement> {
    let _guard = context.push("expression statement");
    let (body, semicolon, rest) = until_semicolon(context, head, tokens)?;
    Ok((
        Statement::Assignment {
            dst: None,
            body: expression(context, body)?,
            span: head.span + semicolon.span,
        },
        rest,
    ))
}

fn assignment<'a>(
    context: &ParseContext,
    head: &'a Token,
    dst: &str,
    tokens: &'a [Token],
) -> Parsed<'a, Statement> {
    let _guard = context.push("assignment");
    let (body, semicolon, rest) = until_semicolon(context, head, tokens)?;
    if body.is_empty() {
        return Err(context.error(ParseError::Empty("assignment value"), head.span, None));
    }
    Ok((
        Statement::Assignment {
            dst: Some(dst.to_string()),
            body: expression(context, body)?,
            span: head.span + semicolon.span,
        },
        rest,
    ))
}

fn until_semicolon<'a>(
    context: &ParseContext,
    head: &Token,
    tokens: &'a [Token],
) -> Result<(&'a [Token], &'a Token, &'a [Token]), ParseErrorWithContext> {
    match tokens
        .iter()
        .position(|t| t.token_type() == &TokenType::Semicolon)
    {
        Some(i) => Ok((&tokens[..i], &tokens[i], &tokens[i + 1..])),
        None => Err(context.error(
            ParseError::Expected("\";\" to end the statement"),
            head.span,
            None,
        )),
    }
}

fn enclose<'a>(
    context: &ParseContext,
    head: &Token,
    tokens: &'a [Token],
    delimiter: Delimiter,
    what: &'static str,
) -> Result<Enclosed<'a>, ParseErrorWithContext> {
    enclosed(tokens, delimiter)
        .ok_or_else(|| context.error(ParseError::Unterminated(what), head.span, None))
}

fn consume<'a>(
    context: &ParseContext,
    head: &Token,
    tokens: &'a [Token],
    token_type: TokenType,
    expected: &'static str,
) -> Result<&'a [Token], ParseErrorWithContext> {
    match tokens.split_first() {
        Some((token, rest)) if token.token_type() == &token_type => Ok(rest),
        found => Err(context.error(
            ParseError::Expected(expected),
            head.span,
            found.map(|(token, _)| token),
        )),
    }
}

fn match_identifier<'a>(
    context: &ParseContext,
    head: &Token,
    tokens: &'a [Token],
    expected: &'static str,
) -> Result<(&'a Token, &'a [Token]), ParseErrorWithContext> {
    match tokens.split_first() {
        Some((token, rest)) if token.name().is_some() => Ok((token, rest)),
        found => Err(context.error(
            ParseError::Expected(expected),
            head.span,
            found.map(|(token, _)| token),
        )),
    }
}

fn skip_semicolon(tokens: &[Token]) -> &[Token] {
    match tokens.split_first() {
        Some((token, rest)) if token.token_type() == &TokenType::Semicolon => rest,
        _ => tokens,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ast::Expr, tokenizer::tokens};

    fn parse(source: &str) -> Result<Module, ParseErrorWithContext> {
        module(&tokens(source).unwrap())
    }

    fn body(source: &str) -> Vec<Statement> {
        let context = ParseContext::new();
        statements(&context, &tokens(source).unwrap()).unwrap()
    }

    fn simple(name: &str) -> GenericType {
        GenericType {
            typename: name.to_string(),
            generic_args: vec![],
        }
    }

    #[test]
    fn test_module_headers() {
        let module = parse("imports io scope app.core @inline type Point { x y { z } }").unwrap();
        let names: Vec<_> = module.items.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "imports io",
                "scope app.core",
                "@inline",
                "type Point { x y { z } }"
            ]
        );
        match &module.items[3] {
            Item::Type { body, .. } => assert_eq!(body.len(), 5),
            other => panic!("expected type, got {other:?}"),
        }
    }

    #[test]
    fn test_function_without_params() {
        let module = parse("fn main() { }").unwrap();
        match &module.items[..] {
            [Item::Function {
                name, params, body, ..
            }] => {
                assert_eq!(name, "main");
                assert!(params.is_empty());
                assert!(body.is_empty());
            }
            other => panic!("unexpected items {other:?}"),
        }
    }

    #[test]
    fn test_function_params_split_at_commas() {
        let module = parse("fn add(a: Int, b: List<Int>) { }").unwrap();
        let Item::Function { params, .. } = &module.items[0] else {
            panic!("expected function");
        };
        let lens: Vec<_> = params.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![3, 6]);
    }

    // Parameter groups split at every top-level comma, generic ones included.
    #[test]
    fn test_generic_param_splits_at_inner_comma() {
        let module = parse("fn f(b: Map<K, V>) { }").unwrap();
        let Item::Function { params, .. } = &module.items[0] else {
            panic!("expected function");
        };
        let groups: Vec<Vec<String>> = params
            .iter()
            .map(|group| group.iter().map(ToString::to_string).collect())
            .collect();
        assert_eq!(groups, vec![vec!["b", ":", "Map", "<", "K"], vec!["V", ">"]]);
    }

    #[test]
    fn test_dangling_else() {
        let context = ParseContext::new();
        let tokens = tokens("x = 1; else { y(); }").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(err.error, ParseError::Expected(_)));
        assert_eq!((err.span.start_line, err.span.start_column), (1, 8));
        assert!(!err.is_semantic());
    }

    #[test]
    fn test_empty_param_group() {
        let err = parse("fn f(a,,b) { }").unwrap_err();
        assert!(matches!(err.error, ParseError::Empty("parameter")));
    }

    #[test]
    fn test_missing_close_paren_reports_fn_position() {
        let err = parse("\n  fn f( { }").unwrap_err();
        assert!(matches!(err.error, ParseError::Unterminated(_)));
        assert_eq!((err.span.start_line, err.span.start_column), (2, 3));
    }

    #[test]
    fn test_unterminated_function_body() {
        let err = parse("fn f() { x = 1;").unwrap_err();
        assert!(matches!(err.error, ParseError::Unterminated("function body")));
    }

    #[test]
    fn test_if_else() {
        let statements = body("if (x > 2) { foo(x); } else { bar(); y = 1; }");
        match &statements[..] {
            [Statement::If {
                cond,
                cond_true,
                cond_false,
                ..
            }] => {
                assert_eq!(cond.len(), 3);
                assert_eq!(cond_true.len(), 1);
                assert_eq!(cond_false.len(), 2);
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn test_if_condition_with_parentheses() {
        let statements = body("if ((a + b) > 2) { }");
        let Statement::If { cond, .. } = &statements[0] else {
            panic!("expected if");
        };
        assert!(matches!(cond[0], Expr::Subexpression { .. }));
        assert_eq!(cond.len(), 3);
    }

    #[test]
    fn test_nested_if() {
        let statements = body("if (a) { if (b) { c(); } }");
        let Statement::If { cond_true, .. } = &statements[0] else {
            panic!("expected if");
        };
        assert!(matches!(cond_true[0], Statement::If { .. }));
    }

    #[test]
    fn test_if_missing_brace() {
        let context = ParseContext::new();
        let tokens = tokens("if (a) b();").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(err.error, ParseError::Expected(_)));
        assert_eq!(err.token.unwrap().name(), Some("b"));
    }

    #[test]
    fn test_expression_statement_has_no_destination() {
        let statements = body("log.write(\"hi\");");
        match &statements[..] {
            [Statement::Assignment { dst: None, body, .. }] => {
                assert!(matches!(body[0], Expr::Invocation { .. }));
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn test_assignment() {
        let statements = body("x = 1 + 2;");
        match &statements[..] {
            [Statement::Assignment { dst, body, .. }] => {
                assert_eq!(dst.as_deref(), Some("x"));
                assert_eq!(body.len(), 3);
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn test_missing_semicolon() {
        let context = ParseContext::new();
        let tokens = tokens("x = 1").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(err.error, ParseError::Expected(_)));
    }

    #[test]
    fn test_untyped_declaration() {
        let statements = body("dec x;");
        assert_eq!(
            statements[0],
            Statement::Declaration {
                name: "x".to_string(),
                typename: None,
                qualifier: None,
                span: statements[0].span(),
            }
        );
    }

    #[test]
    fn test_declaration_with_nested_generics() {
        let statements = body("dec m: copy Map<String, List<Int>>;");
        match &statements[0] {
            Statement::Declaration {
                typename: Some(typename),
                qualifier,
                ..
            } => {
                assert_eq!(*qualifier, Some(Qualifier::Copy));
                assert_eq!(
                    *typename,
                    GenericType {
                        typename: "Map".to_string(),
                        generic_args: vec![
                            simple("String"),
                            GenericType {
                                typename: "List".to_string(),
                                generic_args: vec![simple("Int")],
                            },
                        ],
                    }
                );
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn test_declaration_conflicting_qualifiers() {
        let context = ParseContext::new();
        let tokens = tokens("dec x: move reference Foo;").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(err.error, ParseError::ConflictingQualifiers));
        assert!(err.is_semantic());
    }

    #[test]
    fn test_declaration_missing_type() {
        let context = ParseContext::new();
        let tokens = tokens("dec x: move;").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(err.error, ParseError::Expected("type name")));
    }

    #[test]
    fn test_generic_type_unterminated() {
        let context = ParseContext::new();
        let tokens = tokens("dec x: List<Int;").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(
            err.error,
            ParseError::Unterminated("generic argument list")
        ));
    }

    #[test]
    fn test_generic_type_trailing_tokens() {
        let context = ParseContext::new();
        let tokens = tokens("dec x: List<Int> y;").unwrap();
        let err = statements(&context, &tokens).unwrap_err();
        assert!(matches!(err.error, ParseError::Expected(_)));
    }

    #[test]
    fn test_for_keeps_raw_clauses() {
        let statements = body("for (i = 0; i < 10; i = i + 1) { f(i); }");
        match &statements[..] {
            [Statement::For {
                init,
                cond,
                step,
                body,
                ..
            }] => {
                assert_eq!((init.len(), cond.len(), step.len()), (3, 3, 5));
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn test_for_needs_three_clauses() {
        let context = ParseContext::new();
        let tokens = tokens("for (i = 0; i < 10) { }").unwrap();
        assert!(statements(&context, &tokens).is_err());
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let statements = body("x ;");
        assert!(matches!(
            &statements[..],
            [Statement::Stray(_), Statement::Stray(_)]
        ));
    }

    #[test]
    fn test_error_display_includes_context() {
        let err = parse("fn f() { if (a) { b(); }").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("While parsing module > fn"));
    }
}

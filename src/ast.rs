use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{span::Span, tokenizer::Token};

/// Everything parsed out of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Item {
    Import {
        name: String,
        span: Span,
    },
    Scope {
        name: String,
        span: Span,
    },
    Attribute {
        name: String,
        span: Span,
    },
    /// The body is kept as raw tokens; members are not parsed.
    Type {
        name: String,
        body: Vec<Token>,
        span: Span,
    },
    Function {
        name: String,
        params: Vec<Vec<Token>>,
        body: Vec<Statement>,
        span: Span,
    },
    Stray(Token),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Statement {
    If {
        cond: Vec<Expr>,
        cond_true: Vec<Statement>,
        cond_false: Vec<Statement>,
        span: Span,
    },
    /// `dst: None` evaluates `body` only for its side effects.
    Assignment {
        dst: Option<String>,
        body: Vec<Expr>,
        span: Span,
    },
    Declaration {
        name: String,
        typename: Option<GenericType>,
        qualifier: Option<Qualifier>,
        span: Span,
    },
    For {
        init: Vec<Token>,
        cond: Vec<Token>,
        step: Vec<Token>,
        body: Vec<Statement>,
        span: Span,
    },
    Stray(Token),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Token(Token),
    Invocation {
        name_parts: Vec<String>,
        args: Vec<Vec<Expr>>,
        span: Span,
    },
    Subexpression {
        body: Vec<Expr>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericType {
    pub typename: String,
    pub generic_args: Vec<GenericType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    Move,
    Copy,
    Reference,
}

impl Qualifier {
    pub fn from_keyword(word: &str) -> Option<Qualifier> {
        match word {
            "move" => Some(Qualifier::Move),
            "copy" => Some(Qualifier::Copy),
            "reference" => Some(Qualifier::Reference),
            _ => None,
        }
    }
}

/// Splits a dotted identifier into its components. `None` if any component
/// is empty (`a..b`, `.a`, `a.`).
pub fn dotted_parts(name: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = name.split('.').map(str::to_string).collect();
    if parts.iter().any(String::is_empty) {
        None
    } else {
        Some(parts)
    }
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Import { span, .. }
            | Item::Scope { span, .. }
            | Item::Attribute { span, .. }
            | Item::Type { span, .. }
            | Item::Function { span, .. } => *span,
            Item::Stray(token) => token.span,
        }
    }
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::If { span, .. }
            | Statement::Assignment { span, .. }
            | Statement::Declaration { span, .. }
            | Statement::For { span, .. } => *span,
            Statement::Stray(token) => token.span,
        }
    }
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Token(token) => token.span,
            Expr::Invocation { span, .. } | Expr::Subexpression { span, .. } => *span,
        }
    }
}

fn write_tokens(f: &mut std::fmt::Formatter<'_>, tokens: &[Token]) -> std::fmt::Result {
    for (i, token) in tokens.iter().enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }
        write!(f, "{token}")?;
    }
    Ok(())
}

fn write_exprs(f: &mut std::fmt::Formatter<'_>, exprs: &[Expr]) -> std::fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

fn write_block(f: &mut std::fmt::Formatter<'_>, statements: &[Statement]) -> std::fmt::Result {
    writeln!(f, "{{")?;
    for statement in statements {
        writeln!(f, "{statement}")?;
    }
    write!(f, "}}")
}

impl Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Import { name, .. } => write!(f, "imports {name}"),
            Item::Scope { name, .. } => write!(f, "scope {name}"),
            Item::Attribute { name, .. } => write!(f, "@{name}"),
            Item::Type { name, body, .. } => {
                write!(f, "type {name} {{ ")?;
                write_tokens(f, body)?;
                write!(f, " }}")
            }
            Item::Function {
                name, params, body, ..
            } => {
                write!(f, "fn {name}(")?;
                for (i, param) in params.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write_tokens(f, param)?;
                }
                write!(f, ") ")?;
                write_block(f, body)
            }
            Item::Stray(token) => write!(f, "{token}"),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::If {
                cond,
                cond_true,
                cond_false,
                ..
            } => {
                write!(f, "if (")?;
                write_exprs(f, cond)?;
                write!(f, ") ")?;
                write_block(f, cond_true)?;
                if !cond_false.is_empty() {
                    write!(f, " else ")?;
                    write_block(f, cond_false)?;
                }
                Ok(())
            }
            Statement::Assignment { dst, body, .. } => {
                if let Some(dst) = dst {
                    write!(f, "{dst} = ")?;
                }
                write_exprs(f, body)?;
                write!(f, ";")
            }
            Statement::Declaration {
                name,
                typename,
                qualifier,
                ..
            } => {
                write!(f, "dec {name}")?;
                if let Some(typename) = typename {
                    write!(f, ": ")?;
                    if let Some(qualifier) = qualifier {
                        write!(f, "{qualifier} ")?;
                    }
                    write!(f, "{typename}")?;
                }
                write!(f, ";")
            }
            Statement::For {
                init,
                cond,
                step,
                body,
                ..
            } => {
                write!(f, "for (")?;
                write_tokens(f, init)?;
                write!(f, "; ")?;
                write_tokens(f, cond)?;
                write!(f, "; ")?;
                write_tokens(f, step)?;
                write!(f, ") ")?;
                write_block(f, body)
            }
            Statement::Stray(token) => write!(f, "{token}"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Token(token) => write!(f, "{token}"),
            Expr::Invocation {
                name_parts, args, ..
            } => {
                write!(f, "{}(", name_parts.join("."))?;
                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write_exprs(f, arg)?;
                }
                write!(f, ")")
            }
            Expr::Subexpression { body, .. } => {
                write!(f, "(")?;
                write_exprs(f, body)?;
                write!(f, ")")
            }
        }
    }
}

impl Display for GenericType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.typename)?;
        if !self.generic_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::Move => write!(f, "move"),
            Qualifier::Copy => write!(f, "copy"),
            Qualifier::Reference => write!(f, "reference"),
        }
    }
}

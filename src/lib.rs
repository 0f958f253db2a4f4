pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod parser;
pub mod span;
pub mod stream;
pub mod tokenizer;

use ast::Module;
use bytecode::CompiledFunction;
use tokenizer::TokenizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Syntax,
    SemanticConstraint,
    InternalCompiler,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Parse(#[from] parser::ParseErrorWithContext),
    #[error(transparent)]
    Compile(#[from] compiler::CompileError),
    #[error(transparent)]
    Stream(#[from] stream::StreamError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Tokenize(TokenizeError::UnexpectedCharacter { .. }) => ErrorKind::Lex,
            Error::Tokenize(_) => ErrorKind::Syntax,
            Error::Parse(e) if e.is_semantic() => ErrorKind::SemanticConstraint,
            Error::Parse(_) => ErrorKind::Syntax,
            Error::Compile(e) if e.is_internal() => ErrorKind::InternalCompiler,
            Error::Compile(e) if e.is_semantic() => ErrorKind::SemanticConstraint,
            Error::Compile(_) => ErrorKind::Syntax,
            Error::Stream(_) => ErrorKind::Io,
        }
    }
}

/// Tokenizes and parses one source file.
pub fn parse(source: &str) -> Result<Module, Error> {
    let tokens = tokenizer::tokens(source)?;
    Ok(parser::module(&tokens)?)
}

/// Runs the whole pipeline on one source file.
pub fn build(source: &str) -> Result<Vec<CompiledFunction>, Error> {
    let module = parse(source)?;
    Ok(compiler::compile(&module)?)
}

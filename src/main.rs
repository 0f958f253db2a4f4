use std::{
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use sedna::{bytecode::CompiledFunction, stream};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sedna", about = "Compiler for the sedna language")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the token stream of a source file
    Tokens(TokensArgs),
    /// Parse source files into a module stream on stdout
    Parse(ParseArgs),
    /// Compile a module stream read from a file or stdin
    Compile(CompileArgs),
    /// Parse and compile a source file in one go
    Build(BuildArgs),
}

#[derive(Debug, Args)]
struct TokensArgs {
    file: PathBuf,
}

#[derive(Debug, Args)]
struct ParseArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct CompileArgs {
    /// Module stream; stdin when omitted
    file: Option<PathBuf>,
    /// Print instructions as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct BuildArgs {
    file: PathBuf,
    /// Print instructions as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Sedna(#[from] sedna::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<stream::StreamError> for CliError {
    fn from(error: stream::StreamError) -> Self {
        CliError::Sedna(error.into())
    }
}

impl From<sedna::compiler::CompileError> for CliError {
    fn from(error: sedna::compiler::CompileError) -> Self {
        CliError::Sedna(error.into())
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("sedna=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sedna=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Command::Tokens(args) => tokens_command(args),
        Command::Parse(args) => parse_command(args),
        Command::Compile(args) => compile_command(args),
        Command::Build(args) => build_command(args),
    };

    if let Err(e) = result {
        match &e {
            CliError::Sedna(inner) => eprintln!("{:?} error: {e}", inner.kind()),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn tokens_command(args: &TokensArgs) -> Result<(), CliError> {
    let source = read_source(&args.file)?;
    let tokens = sedna::tokenizer::tokens(&source).map_err(sedna::Error::from)?;

    let mut line = 0;
    for token in tokens {
        if token.span.start_line != line {
            print!("{:4}:{:<3} ", token.span.start_line, token.span.start_column);
            line = token.span.start_line;
        } else {
            print!("   |{:<3} ", token.span.start_column);
        }
        println!("{:?}", token.token_type);
    }

    Ok(())
}

fn parse_command(args: &ParseArgs) -> Result<(), CliError> {
    let mut modules = Vec::new();
    for file in &args.files {
        tracing::debug!(file = %file.display(), "parsing");
        modules.push(sedna::parse(&read_source(file)?)?);
    }
    stream::write_modules(std::io::stdout().lock(), &modules)?;
    Ok(())
}

fn compile_command(args: &CompileArgs) -> Result<(), CliError> {
    let modules = match &args.file {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|source| CliError::Read {
                path: path.display().to_string(),
                source,
            })?;
            stream::read_modules(BufReader::new(file))?
        }
        None => stream::read_modules(std::io::stdin().lock())?,
    };

    for module in &modules {
        let functions = sedna::compiler::compile(module)?;
        print_functions(&functions, args.json)?;
    }
    Ok(())
}

fn build_command(args: &BuildArgs) -> Result<(), CliError> {
    let functions = sedna::build(&read_source(&args.file)?)?;
    print_functions(&functions, args.json)
}

fn print_functions(functions: &[CompiledFunction], json: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string(functions)?)?;
        return Ok(());
    }
    for function in functions {
        writeln!(out, "{}:", function.name)?;
        for instruction in &function.instructions {
            writeln!(out, "    {instruction}")?;
        }
    }
    Ok(())
}

//! The line-oriented record stream between the parse and compile stages.
//!
//! Anything before [`SENTINEL`] is ignored. After it, each non-blank line is
//! one [`Module`] serialized as JSON.

use std::io::{BufRead, Write};

use crate::ast::Module;

pub const SENTINEL: &str = "---start---";

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Module stream has no \"{SENTINEL}\" line")]
    MissingSentinel,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid module record on line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Could not serialize module: {0}")]
    Serialize(serde_json::Error),
}

pub fn read_modules(reader: impl BufRead) -> Result<Vec<Module>, StreamError> {
    let mut started = false;
    let mut modules = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if !started {
            started = line.trim_end() == SENTINEL;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let module = serde_json::from_str(&line).map_err(|source| StreamError::Json {
            line: index + 1,
            source,
        })?;
        modules.push(module);
    }

    if !started {
        return Err(StreamError::MissingSentinel);
    }

    tracing::debug!(modules = modules.len(), "read module stream");
    Ok(modules)
}

pub fn write_modules<'a>(
    mut writer: impl Write,
    modules: impl IntoIterator<Item = &'a Module>,
) -> Result<(), StreamError> {
    writeln!(writer, "{SENTINEL}")?;
    for module in modules {
        let json = serde_json::to_string(module).map_err(StreamError::Serialize)?;
        writeln!(writer, "{json}")?;
    }
    writer.flush()?;
    Ok(())
}

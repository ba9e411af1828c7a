//! Cadence Tools
//!
//! CLI support for loading and running control programs.

pub mod dispatch;

use std::path::Path;

use cadence_runtime::{CommandTypeRegistry, ConfigError, Directive, EngineConfig};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

pub use dispatch::TracingDispatcher;

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info`, with `debug` for the cadence crates.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,cadence_tools=debug,cadence_runtime=debug,cadence_dsl=info")
    });

    fmt().with_env_filter(filter).with_target(false).init();
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Lex {
        path: String,
        source: cadence_dsl::LexError,
    },

    #[error("{path}: {source}")]
    Structured {
        path: String,
        source: cadence_dsl::StructuredError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A control program read from disk
#[derive(Debug, Default)]
pub struct LoadedProgram {
    pub directives: Vec<Directive>,
    /// Malformed directives, as `path:line:col: message`
    pub errors: Vec<String>,
}

/// Whether `path` names a structured (YAML) program
pub fn is_structured(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Read a control program, choosing the encoding from the file extension.
pub fn load_program(path: &Path, types: &CommandTypeRegistry) -> Result<LoadedProgram, ToolError> {
    let name = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: name.clone(),
        source,
    })?;
    info!(path = %name, "loading control program");
    parse_program(&name, &source, is_structured(path), types)
}

/// Parse program `source`; `name` prefixes error messages.
pub fn parse_program(
    name: &str,
    source: &str,
    structured: bool,
    types: &CommandTypeRegistry,
) -> Result<LoadedProgram, ToolError> {
    if structured {
        let program =
            cadence_dsl::parse_structured(source).map_err(|source| ToolError::Structured {
                path: name.to_string(),
                source,
            })?;
        debug!(directives = program.directives.len(), "read structured program");
        let errors = program.errors.iter().map(|e| format!("{name}: {e}")).collect();
        return Ok(LoadedProgram {
            directives: program.directives,
            errors,
        });
    }

    let parsed = cadence_dsl::parse(source, types).map_err(|source| ToolError::Lex {
        path: name.to_string(),
        source,
    })?;
    let errors = parsed
        .errors
        .iter()
        .map(|e| {
            let (line, col) = e.line_col(source);
            format!("{name}:{line}:{col}: {}", e.message)
        })
        .collect();
    debug!(directives = parsed.directives.len(), "read text program");
    Ok(LoadedProgram {
        directives: parsed.directives,
        errors,
    })
}

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ToolError> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            info!(
                path = %path.display(),
                command_types = config.command_types.len(),
                enabled = config.enabled,
                "loaded engine config"
            );
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

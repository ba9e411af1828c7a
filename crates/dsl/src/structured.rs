//! Structured (YAML) encoding of control programs
//!
//! A program is a YAML list of maps, each tagged by `directive` and carrying
//! the same fields as the text form:
//!
//! ```yaml
//! - { directive: create_group, at: 0, group: G1 }
//! - { directive: add_command, at: 0, group: G1, command_type: Probe, placeholders: [X, Y] }
//! - { directive: execute_sequence, at: 100, group: G1, total: 3, period: 10 }
//! ```

use cadence_runtime::Directive;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StructuredError {
    #[error("failed to parse structured program: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A list entry that is not a valid directive
#[derive(Debug, Error)]
#[error("entry {entry}: {source}")]
pub struct EntryError {
    /// 1-based position in the list
    pub entry: usize,
    pub source: serde_yaml::Error,
}

/// Directives read from a structured program, plus the entries that could not be
#[derive(Debug, Default)]
pub struct StructuredProgram {
    /// Directives in list order
    pub directives: Vec<Directive>,
    pub errors: Vec<EntryError>,
}

impl StructuredProgram {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read a structured program. An empty document is an empty program.
///
/// # Errors
/// Fails only if the document is not a YAML list; malformed entries are
/// collected in [`StructuredProgram::errors`].
pub fn parse_structured(yaml: &str) -> Result<StructuredProgram, StructuredError> {
    let mut program = StructuredProgram::default();
    if yaml.trim().is_empty() {
        return Ok(program);
    }

    let entries: Vec<serde_yaml::Value> = serde_yaml::from_str(yaml)?;
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_yaml::from_value::<Directive>(entry) {
            Ok(directive) => program.directives.push(directive),
            Err(source) => {
                warn!(entry = i + 1, %source, "skipping malformed entry");
                program.errors.push(EntryError { entry: i + 1, source });
            }
        }
    }
    Ok(program)
}

/// Write directives in the structured encoding
pub fn to_structured(directives: &[Directive]) -> Result<String, StructuredError> {
    Ok(serde_yaml::to_string(directives)?)
}

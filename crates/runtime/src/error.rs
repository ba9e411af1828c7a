//! Runtime errors

use thiserror::Error;

use crate::types::{ArgumentValue, CommandIndex, GroupName, PlaceholderName};

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while a directive executes or a group resolves its bindings.
///
/// None of these abort the scheduling loop: the failing directive (or
/// repetition) is skipped and logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("command group '{0}' already exists")]
    DuplicateGroupName(GroupName),

    #[error("command group not found: {0}")]
    GroupNotFound(GroupName),

    #[error("command type '{0}' cannot be used in a command group")]
    UnknownCommandType(String),

    #[error("command type '{command_type}' takes {expected} arguments, got {found} placeholders")]
    ArityMismatch {
        command_type: String,
        expected: u32,
        found: usize,
    },

    #[error("placeholder '{0}' declared more than once")]
    DuplicatePlaceholder(PlaceholderName),

    #[error("no placeholder '{placeholder}' on command {command}")]
    UnknownCommandOrPlaceholder {
        command: CommandIndex,
        placeholder: PlaceholderName,
    },

    #[error("command {0} not found in group")]
    CommandNotFound(CommandIndex),

    #[error("invalid command index {0}, indices start at 1")]
    InvalidCommandIndex(i64),

    #[error("sequence bounds must be numeric, got {initial} and {increment}")]
    InvalidSequence {
        initial: ArgumentValue,
        increment: ArgumentValue,
    },

    #[error("repetition count must be between 1 and 4294967295, got {0}")]
    InvalidRepetitionCount(i64),

    #[error("repetition period must not be negative, got {0}")]
    InvalidPeriod(i64),

    #[error("lattice binding does not describe a {rank}D lattice with positive dimensions")]
    InvalidLattice { rank: usize },

    #[error("placeholder '{placeholder}' on command {command} has no binding")]
    UnboundPlaceholder {
        command: CommandIndex,
        placeholder: PlaceholderName,
    },

    #[error("cyclic argument reference: {}", format_cycle(.path))]
    CyclicBinding {
        path: Vec<(CommandIndex, PlaceholderName)>,
    },

    #[error("sequence for '{placeholder}' on command {command} overflows at iteration {iteration}")]
    SequenceOverflow {
        command: CommandIndex,
        placeholder: PlaceholderName,
        iteration: u32,
    },
}

fn format_cycle(path: &[(CommandIndex, PlaceholderName)]) -> String {
    path.iter()
        .map(|(cmd, ph)| format!("{cmd}.{ph}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

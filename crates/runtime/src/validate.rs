//! Pre-run directive validation
//!
//! Every directive is checked before the run starts. A directive that fails
//! is discarded with a reason and never scheduled; the rest of the program
//! is unaffected.

use indexmap::IndexSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::binding::Sequence;
use crate::command_types::TypeRegistry;
use crate::directive::{Directive, DirectiveKind, LatticeBinding};
use crate::types::{ArgumentValue, CommandIndex, GroupName, PlaceholderName, is_identifier};

/// A directive rejected before the run
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid directive `{directive}`: {reason}")]
pub struct ValidationError {
    /// Text form of the rejected directive
    pub directive: String,
    pub reason: String,
}

/// Everything validation needs to know about the run
pub struct ValidationContext<'r> {
    types: &'r dyn TypeRegistry,
    enabled: bool,
    legacy_sequence_validation: bool,
    declared_groups: IndexSet<GroupName>,
}

impl<'r> ValidationContext<'r> {
    pub fn new(types: &'r dyn TypeRegistry) -> Self {
        Self {
            types,
            enabled: true,
            legacy_sequence_validation: false,
            declared_groups: IndexSet::new(),
        }
    }

    /// Whether command groups are available at all in this run
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Reject negative initial values and increments of real sequences
    pub fn with_legacy_sequence_validation(mut self, legacy: bool) -> Self {
        self.legacy_sequence_validation = legacy;
        self
    }

    pub fn types(&self) -> &'r dyn TypeRegistry {
        self.types
    }

    /// Group names claimed by accepted `create_group` directives
    pub fn declared_groups(&self) -> impl Iterator<Item = &GroupName> {
        self.declared_groups.iter()
    }

    fn declare(&mut self, group: &GroupName) {
        self.declared_groups.insert(group.clone());
    }
}

/// Outcome of validating a whole program
#[derive(Debug, Default)]
pub struct ValidatedProgram {
    /// Directives that will be scheduled, ordered by time (input order within a step)
    pub accepted: Vec<Directive>,
    pub rejected: Vec<ValidationError>,
}

/// Validate a program, splitting it into accepted and rejected directives.
///
/// Directives are considered in firing order, so when two `create_group`
/// directives use the same name the one that fires first wins.
pub fn validate_program(mut directives: Vec<Directive>, ctx: &mut ValidationContext<'_>) -> ValidatedProgram {
    directives.sort_by_key(|d| d.at);
    let mut program = ValidatedProgram::default();

    if !ctx.enabled {
        warn!(directives = directives.len(), "command groups are disabled");
        program.rejected = directives
            .iter()
            .map(|d| reject(d, "command groups are disabled"))
            .collect();
        return program;
    }

    for directive in directives {
        match directive.is_valid(ctx) {
            Ok(()) => {
                if let DirectiveKind::CreateGroup { group } = &directive.kind {
                    ctx.declare(group);
                }
                debug!(directive = %directive, "directive accepted");
                program.accepted.push(directive);
            }
            Err(err) => {
                warn!(directive = %err.directive, reason = %err.reason, "directive rejected");
                program.rejected.push(err);
            }
        }
    }

    program
}

fn reject(directive: &Directive, reason: impl Into<String>) -> ValidationError {
    ValidationError {
        directive: directive.to_string(),
        reason: reason.into(),
    }
}

type Check = std::result::Result<(), String>;

fn check_identifier(what: &str, name: &str) -> Check {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(format!("{what} '{name}' is not a valid identifier"))
    }
}

fn check_group(group: &GroupName) -> Check {
    check_identifier("group name", &group.0)
}

fn check_placeholder(placeholder: &PlaceholderName) -> Check {
    check_identifier("placeholder", &placeholder.0)
}

fn check_index(what: &str, raw: i64) -> Check {
    CommandIndex::new(raw)
        .map(|_| ())
        .ok_or_else(|| format!("{what} must be >= 1, got {raw}"))
}

fn check_slot(group: &GroupName, command: i64, placeholder: &PlaceholderName) -> Check {
    check_group(group)?;
    check_index("command index", command)?;
    check_placeholder(placeholder)
}

impl Directive {
    /// Check this directive against the run before it is scheduled.
    pub fn is_valid(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        self.check(ctx).map_err(|reason| reject(self, reason))
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Check {
        match &self.kind {
            DirectiveKind::CreateGroup { group } => {
                check_group(group)?;
                if ctx.declared_groups.contains(group) {
                    return Err(format!("group name '{group}' is already in use"));
                }
                Ok(())
            }
            DirectiveKind::AddCommand {
                group,
                command_type,
                placeholders,
            } => {
                check_group(group)?;
                let arity = ctx.types.arity(command_type).ok_or_else(|| {
                    format!("command type '{command_type}' cannot be used in a command group")
                })?;
                if placeholders.len() != arity as usize {
                    return Err(format!(
                        "command type '{command_type}' takes {arity} arguments, got {} placeholders",
                        placeholders.len()
                    ));
                }
                let mut seen = IndexSet::new();
                for placeholder in placeholders {
                    check_placeholder(placeholder)?;
                    if !seen.insert(placeholder) {
                        return Err(format!("placeholder '{placeholder}' declared more than once"));
                    }
                }
                Ok(())
            }
            DirectiveKind::BindConstant {
                group,
                command,
                placeholder,
                ..
            } => check_slot(group, *command, placeholder),
            DirectiveKind::BindSequence {
                group,
                command,
                placeholder,
                initial,
                increment,
            } => {
                check_slot(group, *command, placeholder)?;
                self.check_sequence(ctx, initial, increment)
            }
            DirectiveKind::BindArgument {
                group,
                command,
                placeholder,
                source_command,
                source_placeholder,
            } => {
                check_slot(group, *command, placeholder)?;
                check_index("source command index", *source_command)?;
                check_placeholder(source_placeholder)
            }
            DirectiveKind::BindLattice2d(binding) => check_lattice(binding, 2),
            DirectiveKind::BindLattice3d(binding) => check_lattice(binding, 3),
            DirectiveKind::ToggleCommand { group, command }
            | DirectiveKind::EnableCommand { group, command }
            | DirectiveKind::DisableCommand { group, command } => {
                check_group(group)?;
                check_index("command index", *command)
            }
            DirectiveKind::ToggleAll { group }
            | DirectiveKind::EnableAll { group }
            | DirectiveKind::DisableAll { group } => check_group(group),
            DirectiveKind::ExecuteSequence {
                group,
                total,
                period,
            } => {
                check_group(group)?;
                if *total < 1 || u32::try_from(*total).is_err() {
                    return Err(format!("total repetitions must be between 1 and {}, got {total}", u32::MAX));
                }
                if *period < 0 {
                    return Err(format!("period must be >= 0, got {period}"));
                }
                Ok(())
            }
        }
    }

    fn check_sequence(&self, ctx: &ValidationContext<'_>, initial: &ArgumentValue, increment: &ArgumentValue) -> Check {
        let sequence = Sequence::from_values(initial, increment)
            .ok_or_else(|| "sequence initial value and increment must be numeric".to_string())?;

        if ctx.legacy_sequence_validation
            && let Sequence::Real { initial, increment } = sequence
        {
            if initial < 0.0 {
                return Err(format!("real sequence initial value must be >= 0, got {initial:?}"));
            }
            if increment < 0.0 {
                return Err(format!("real sequence increment must be >= 0, got {increment:?}"));
            }
        }
        Ok(())
    }
}

fn check_lattice(binding: &LatticeBinding, rank: usize) -> Check {
    check_group(&binding.group)?;

    let shapes = [
        ("targets", binding.targets.len()),
        ("dimensions", binding.dims.len()),
        ("origin", binding.origin.len()),
        ("lengths", binding.lengths.len()),
    ];
    for (what, len) in shapes {
        if len != rank {
            return Err(format!("{rank}D lattice needs {rank} {what}, got {len}"));
        }
    }

    for target in &binding.targets {
        check_index("command index", target.command)?;
        check_placeholder(&target.placeholder)?;
    }
    for &d in &binding.dims {
        if d < 1 || u32::try_from(d).is_err() {
            return Err(format!("lattice dimensions must be >= 1, got {d}"));
        }
    }
    for &o in &binding.origin {
        if !o.is_finite() || o < 0.0 {
            return Err(format!("lattice origin must be >= 0, got {o:?}"));
        }
    }
    for &l in &binding.lengths {
        if !l.is_finite() || l < 0.0 {
            return Err(format!("lattice lengths must be >= 0, got {l:?}"));
        }
    }
    Ok(())
}

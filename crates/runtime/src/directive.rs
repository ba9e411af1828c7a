//! Scheduling directives
//!
//! A directive is a time-stamped instruction that fires once, at its own
//! simulation time, against the group registry. Indices and counts are kept
//! exactly as read from the control input; range checks happen during
//! validation (see [`crate::validate`]).
//!
//! The `Display` form of a directive is its line in the text control input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lattice::{Axis, Lattice, LatticeCoordinate, Packing};
use crate::types::{ArgumentValue, CommandIndex, GroupName, PlaceholderName, SimTime};

/// A directive and the step it fires at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub at: SimTime,
    #[serde(flatten)]
    pub kind: DirectiveKind,
}

impl Directive {
    pub fn new(at: SimTime, kind: DirectiveKind) -> Self {
        Self { at, kind }
    }
}

/// (command, placeholder) that receives one lattice axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTarget {
    pub command: i64,
    pub placeholder: PlaceholderName,
}

/// Lattice assignment shared by the 2D and 3D directives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeBinding {
    pub group: GroupName,
    /// One target per axis, X first
    pub targets: Vec<AxisTarget>,
    /// Points per axis
    pub dims: Vec<i64>,
    pub origin: Vec<f64>,
    pub lengths: Vec<f64>,
    #[serde(default)]
    pub packing: Packing,
}

impl LatticeBinding {
    /// Build one coordinate binding per axis. `None` if the vectors do not
    /// all have `rank` entries or an index or dimension is out of range.
    pub fn coordinates(&self, rank: usize) -> Option<Vec<(CommandIndex, &PlaceholderName, LatticeCoordinate)>> {
        if self.targets.len() != rank
            || self.dims.len() != rank
            || self.origin.len() != rank
            || self.lengths.len() != rank
        {
            return None;
        }

        let dims = self
            .dims
            .iter()
            .map(|&d| u32::try_from(d).ok().filter(|d| *d >= 1))
            .collect::<Option<Vec<u32>>>()?;

        let lattice = match rank {
            2 => Lattice::planar(
                [dims[0], dims[1]],
                [self.origin[0], self.origin[1]],
                [self.lengths[0], self.lengths[1]],
                self.packing,
            ),
            3 => Lattice::spatial(
                [dims[0], dims[1], dims[2]],
                [self.origin[0], self.origin[1], self.origin[2]],
                [self.lengths[0], self.lengths[1], self.lengths[2]],
                self.packing,
            ),
            _ => return None,
        };

        self.targets
            .iter()
            .zip(Axis::ALL)
            .map(|(target, axis)| {
                let index = CommandIndex::new(target.command)?;
                Some((
                    index,
                    &target.placeholder,
                    LatticeCoordinate::new(lattice.clone(), axis),
                ))
            })
            .collect()
    }
}

/// The directive set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum DirectiveKind {
    CreateGroup {
        group: GroupName,
    },
    AddCommand {
        group: GroupName,
        command_type: String,
        placeholders: Vec<PlaceholderName>,
    },
    BindConstant {
        group: GroupName,
        command: i64,
        placeholder: PlaceholderName,
        value: ArgumentValue,
    },
    BindSequence {
        group: GroupName,
        command: i64,
        placeholder: PlaceholderName,
        initial: ArgumentValue,
        increment: ArgumentValue,
    },
    BindArgument {
        group: GroupName,
        command: i64,
        placeholder: PlaceholderName,
        source_command: i64,
        source_placeholder: PlaceholderName,
    },
    BindLattice2d(LatticeBinding),
    BindLattice3d(LatticeBinding),
    ToggleCommand {
        group: GroupName,
        command: i64,
    },
    ToggleAll {
        group: GroupName,
    },
    EnableCommand {
        group: GroupName,
        command: i64,
    },
    DisableCommand {
        group: GroupName,
        command: i64,
    },
    EnableAll {
        group: GroupName,
    },
    DisableAll {
        group: GroupName,
    },
    ExecuteSequence {
        group: GroupName,
        total: i64,
        period: i64,
    },
}

impl DirectiveKind {
    /// Keyword of this directive in the text control input
    pub fn keyword(&self) -> &'static str {
        match self {
            DirectiveKind::CreateGroup { .. } => "create_group",
            DirectiveKind::AddCommand { .. } => "add_command",
            DirectiveKind::BindConstant { .. } => "bind_constant",
            DirectiveKind::BindSequence { .. } => "bind_sequence",
            DirectiveKind::BindArgument { .. } => "bind_argument",
            DirectiveKind::BindLattice2d(_) => "bind_lattice2d",
            DirectiveKind::BindLattice3d(_) => "bind_lattice3d",
            DirectiveKind::ToggleCommand { .. } => "toggle_command",
            DirectiveKind::ToggleAll { .. } => "toggle_all",
            DirectiveKind::EnableCommand { .. } => "enable_command",
            DirectiveKind::DisableCommand { .. } => "disable_command",
            DirectiveKind::EnableAll { .. } => "enable_all",
            DirectiveKind::DisableAll { .. } => "disable_all",
            DirectiveKind::ExecuteSequence { .. } => "execute_sequence",
        }
    }

    /// The group every directive targets
    pub fn group(&self) -> &GroupName {
        match self {
            DirectiveKind::CreateGroup { group }
            | DirectiveKind::AddCommand { group, .. }
            | DirectiveKind::BindConstant { group, .. }
            | DirectiveKind::BindSequence { group, .. }
            | DirectiveKind::BindArgument { group, .. }
            | DirectiveKind::ToggleCommand { group, .. }
            | DirectiveKind::ToggleAll { group }
            | DirectiveKind::EnableCommand { group, .. }
            | DirectiveKind::DisableCommand { group, .. }
            | DirectiveKind::EnableAll { group }
            | DirectiveKind::DisableAll { group }
            | DirectiveKind::ExecuteSequence { group, .. } => group,
            DirectiveKind::BindLattice2d(binding) | DirectiveKind::BindLattice3d(binding) => {
                &binding.group
            }
        }
    }
}

fn write_reals(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for v in values {
        write!(f, " {v:?}")?;
    }
    Ok(())
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind.keyword(), self.at, self.kind.group())?;
        match &self.kind {
            DirectiveKind::CreateGroup { .. }
            | DirectiveKind::ToggleAll { .. }
            | DirectiveKind::EnableAll { .. }
            | DirectiveKind::DisableAll { .. } => Ok(()),
            DirectiveKind::AddCommand {
                command_type,
                placeholders,
                ..
            } => {
                write!(f, " {command_type}")?;
                for p in placeholders {
                    write!(f, " {p}")?;
                }
                Ok(())
            }
            DirectiveKind::BindConstant {
                command,
                placeholder,
                value,
                ..
            } => write!(f, " {command} {placeholder} {value}"),
            DirectiveKind::BindSequence {
                command,
                placeholder,
                initial,
                increment,
                ..
            } => write!(f, " {command} {placeholder} {initial} {increment}"),
            DirectiveKind::BindArgument {
                command,
                placeholder,
                source_command,
                source_placeholder,
                ..
            } => write!(
                f,
                " {command} {placeholder} {source_command} {source_placeholder}"
            ),
            DirectiveKind::BindLattice2d(binding) | DirectiveKind::BindLattice3d(binding) => {
                for target in &binding.targets {
                    write!(f, " {} {}", target.command, target.placeholder)?;
                }
                for d in &binding.dims {
                    write!(f, " {d}")?;
                }
                write_reals(f, &binding.origin)?;
                write_reals(f, &binding.lengths)?;
                write!(f, " {}", binding.packing)
            }
            DirectiveKind::ToggleCommand { command, .. }
            | DirectiveKind::EnableCommand { command, .. }
            | DirectiveKind::DisableCommand { command, .. } => write!(f, " {command}"),
            DirectiveKind::ExecuteSequence { total, period, .. } => {
                write!(f, " {total} {period}")
            }
        }
    }
}

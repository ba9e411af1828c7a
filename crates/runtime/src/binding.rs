//! Argument binding strategies
//!
//! A binding turns a repetition index into the value of one placeholder.
//! Every strategy except [`BindingStrategy::CrossReference`] is a pure
//! function of the index; references are followed by the owning group at
//! resolve time.

use std::fmt;

use crate::lattice::LatticeCoordinate;
use crate::types::{ArgumentValue, CommandIndex, PlaceholderName};

/// Arithmetic progression `initial + iteration * increment`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sequence {
    Integer { initial: i64, increment: i64 },
    Real { initial: f64, increment: f64 },
}

impl Sequence {
    /// Build a sequence from two literals. Both integers give an integer
    /// sequence, any real gives a real one; text is rejected.
    pub fn from_values(initial: &ArgumentValue, increment: &ArgumentValue) -> Option<Self> {
        match (initial, increment) {
            (ArgumentValue::Integer(initial), ArgumentValue::Integer(increment)) => {
                Some(Sequence::Integer {
                    initial: *initial,
                    increment: *increment,
                })
            }
            _ => Some(Sequence::Real {
                initial: initial.as_real()?,
                increment: increment.as_real()?,
            }),
        }
    }

    /// Value at `iteration`, or `None` if integer arithmetic overflows
    pub fn evaluate(&self, iteration: u32) -> Option<ArgumentValue> {
        match *self {
            Sequence::Integer { initial, increment } => increment
                .checked_mul(iteration as i64)
                .and_then(|offset| initial.checked_add(offset))
                .map(ArgumentValue::Integer),
            Sequence::Real { initial, increment } => {
                Some(ArgumentValue::Real(initial + iteration as f64 * increment))
            }
        }
    }
}

/// Rule producing a placeholder's value for each repetition
#[derive(Debug, Clone, PartialEq)]
pub enum BindingStrategy {
    /// Same value every repetition
    Constant(ArgumentValue),
    /// Arithmetic progression over repetitions
    Sequence(Sequence),
    /// Live view of another placeholder in the same group
    CrossReference {
        command: CommandIndex,
        placeholder: PlaceholderName,
    },
    /// One axis of a lattice point
    Lattice(LatticeCoordinate),
}

impl BindingStrategy {
    pub fn constant(value: impl Into<ArgumentValue>) -> Self {
        BindingStrategy::Constant(value.into())
    }

    pub fn reference(command: CommandIndex, placeholder: impl Into<PlaceholderName>) -> Self {
        BindingStrategy::CrossReference {
            command,
            placeholder: placeholder.into(),
        }
    }
}

impl fmt::Display for BindingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingStrategy::Constant(v) => write!(f, "constant {v}"),
            BindingStrategy::Sequence(Sequence::Integer { initial, increment }) => {
                write!(f, "integer sequence {initial} + i*{increment}")
            }
            BindingStrategy::Sequence(Sequence::Real { initial, increment }) => {
                write!(f, "real sequence {initial:?} + i*{increment:?}")
            }
            BindingStrategy::CrossReference {
                command,
                placeholder,
            } => write!(f, "reference to {command}.{placeholder}"),
            BindingStrategy::Lattice(coord) => write!(f, "{coord}"),
        }
    }
}

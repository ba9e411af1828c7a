//! Core runtime types
//!
//! Identifiers, argument values and the simulation clock shared by every
//! part of the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation time, measured in integration steps
pub type SimTime = u64;

/// Unique identifier for a command group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(pub String);

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Name of an argument slot inside a command template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderName(pub String);

impl fmt::Display for PlaceholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaceholderName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 1-based position of a command within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct CommandIndex(u32);

impl CommandIndex {
    /// The first command of any group
    pub const FIRST: CommandIndex = CommandIndex(1);

    /// Convert a raw index read from control input; `None` below 1.
    pub fn new(raw: i64) -> Option<Self> {
        u32::try_from(raw).ok().filter(|v| *v >= 1).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based slot in the group's command list
    pub(crate) fn slot(self) -> usize {
        (self.0 - 1) as usize
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        Self(slot as u32 + 1)
    }
}

impl fmt::Display for CommandIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for CommandIndex {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("command index must be >= 1, got {raw}"))
    }
}

impl From<CommandIndex> for i64 {
    fn from(index: CommandIndex) -> Self {
        index.0 as i64
    }
}

/// Kind tag for [`ArgumentValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Real,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
        };
        f.write_str(name)
    }
}

/// A single bound argument
///
/// Produced fresh on every evaluation and handed to the dispatcher in
/// placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    // Order matters for untagged decoding: integers must be tried before reals.
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ArgumentValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ArgumentValue::Text(_) => ValueKind::Text,
            ArgumentValue::Integer(_) => ValueKind::Integer,
            ArgumentValue::Real(_) => ValueKind::Real,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ArgumentValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Real view of a numeric value; integers widen.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            ArgumentValue::Real(v) => Some(*v),
            ArgumentValue::Integer(v) => Some(*v as f64),
            ArgumentValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgumentValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ArgumentValue::Text(_))
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::Text(s) => write!(f, "{s:?}"),
            ArgumentValue::Integer(v) => write!(f, "{v}"),
            ArgumentValue::Real(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for ArgumentValue {
    fn from(v: i64) -> Self {
        ArgumentValue::Integer(v)
    }
}

impl From<f64> for ArgumentValue {
    fn from(v: f64) -> Self {
        ArgumentValue::Real(v)
    }
}

impl From<&str> for ArgumentValue {
    fn from(s: &str) -> Self {
        ArgumentValue::Text(s.to_string())
    }
}

/// Check that a name is usable as a group or placeholder identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! Command type registry.
//!
//! A command group can only hold command types whose argument count is
//! known up front. The registry answers that question by name and gates
//! both the control-input reader (which needs the arity to know how many
//! placeholder names follow a type name) and `add_command`.
//!
//! # Example
//!
//! ```
//! use cadence_runtime::command_types::{CommandTypeRegistry, TypeRegistry};
//!
//! let mut types = CommandTypeRegistry::new();
//! types.register("Probe", 2);
//! assert_eq!(types.arity("Probe"), Some(2));
//! assert_eq!(types.arity("Unknown"), None);
//! ```

use indexmap::IndexMap;

/// Lookup of how many placeholders a command type takes.
pub trait TypeRegistry {
    /// Number of arguments `type_name` expects, or `None` if the type
    /// cannot be used inside a command group.
    fn arity(&self, type_name: &str) -> Option<u32>;

    /// Check if a type can be grouped
    fn is_groupable(&self, type_name: &str) -> bool {
        self.arity(type_name).is_some()
    }
}

/// Descriptor for a groupable command type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTypeDescriptor {
    pub name: String,
    pub arity: u32,
}

/// Table-backed [`TypeRegistry`], built once at startup
#[derive(Debug, Clone, Default)]
pub struct CommandTypeRegistry {
    types: IndexMap<String, CommandTypeDescriptor>,
}

impl CommandTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous arity for the same name
    pub fn register(&mut self, name: impl Into<String>, arity: u32) {
        let name = name.into();
        self.types.insert(
            name.clone(),
            CommandTypeDescriptor { name, arity },
        );
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<&CommandTypeDescriptor> {
        self.types.get(name)
    }

    /// All registered type names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeRegistry for CommandTypeRegistry {
    fn arity(&self, type_name: &str) -> Option<u32> {
        self.types.get(type_name).map(|d| d.arity)
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for CommandTypeRegistry {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, arity) in iter {
            registry.register(name, arity);
        }
        registry
    }
}

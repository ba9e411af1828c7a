//! Command templates and groups
//!
//! A group is an append-only list of command templates addressed by
//! 1-based index. Each template owns the bindings of its placeholders;
//! cross references between templates are plain (index, name) pairs looked
//! up when the group resolves, so a reference may be created before the
//! command it points at exists.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use crate::binding::{BindingStrategy, Sequence};
use crate::command_types::TypeRegistry;
use crate::error::{Error, Result};
use crate::types::{ArgumentValue, CommandIndex, GroupName, PlaceholderName};

/// A command type with named, not yet bound, argument slots
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    type_name: String,
    placeholders: Vec<PlaceholderName>,
    bindings: IndexMap<PlaceholderName, BindingStrategy>,
    enabled: bool,
}

impl CommandTemplate {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Placeholder names in argument order
    pub fn placeholders(&self) -> &[PlaceholderName] {
        &self.placeholders
    }

    pub fn has_placeholder(&self, name: &PlaceholderName) -> bool {
        self.placeholders.contains(name)
    }

    pub fn binding(&self, name: &PlaceholderName) -> Option<&BindingStrategy> {
        self.bindings.get(name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Placeholders that still lack a binding, in argument order
    pub fn unbound_placeholders(&self) -> impl Iterator<Item = &PlaceholderName> {
        self.placeholders
            .iter()
            .filter(|p| !self.bindings.contains_key(*p))
    }

    pub fn is_fully_bound(&self) -> bool {
        self.unbound_placeholders().next().is_none()
    }
}

/// Concrete command ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommand {
    pub type_name: String,
    /// Argument values in placeholder order
    pub arguments: Vec<ArgumentValue>,
}

/// Named, ordered collection of command templates
#[derive(Debug, Clone, PartialEq)]
pub struct CommandGroup {
    name: GroupName,
    commands: Vec<CommandTemplate>,
}

impl CommandGroup {
    pub fn new(name: GroupName) -> Self {
        Self {
            name,
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &GroupName {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get a command by its 1-based index
    pub fn command(&self, index: CommandIndex) -> Option<&CommandTemplate> {
        self.commands.get(index.slot())
    }

    /// All commands with their indices, in index order
    pub fn commands(&self) -> impl Iterator<Item = (CommandIndex, &CommandTemplate)> {
        self.commands
            .iter()
            .enumerate()
            .map(|(slot, cmd)| (CommandIndex::from_slot(slot), cmd))
    }

    fn command_mut(&mut self, index: CommandIndex) -> Result<&mut CommandTemplate> {
        self.commands
            .get_mut(index.slot())
            .ok_or(Error::CommandNotFound(index))
    }

    /// Append a command of `type_name` with the given placeholder names.
    ///
    /// The placeholder count must match the arity the registry reports for
    /// the type. New commands start enabled.
    pub fn add_command(
        &mut self,
        types: &dyn TypeRegistry,
        type_name: &str,
        placeholders: Vec<PlaceholderName>,
    ) -> Result<CommandIndex> {
        let arity = types
            .arity(type_name)
            .ok_or_else(|| Error::UnknownCommandType(type_name.to_string()))?;

        if placeholders.len() != arity as usize {
            return Err(Error::ArityMismatch {
                command_type: type_name.to_string(),
                expected: arity,
                found: placeholders.len(),
            });
        }

        let mut seen = HashSet::new();
        for name in &placeholders {
            if !seen.insert(name) {
                return Err(Error::DuplicatePlaceholder(name.clone()));
            }
        }

        self.commands.push(CommandTemplate {
            type_name: type_name.to_string(),
            placeholders,
            bindings: IndexMap::new(),
            enabled: true,
        });
        Ok(CommandIndex::from_slot(self.commands.len() - 1))
    }

    /// Bind a placeholder, replacing any earlier binding of the same slot.
    pub fn bind(
        &mut self,
        index: CommandIndex,
        placeholder: PlaceholderName,
        strategy: BindingStrategy,
    ) -> Result<()> {
        let unknown = || Error::UnknownCommandOrPlaceholder {
            command: index,
            placeholder: placeholder.clone(),
        };
        let command = self.commands.get_mut(index.slot()).ok_or_else(unknown)?;
        if !command.has_placeholder(&placeholder) {
            return Err(unknown());
        }
        command.bindings.insert(placeholder, strategy);
        Ok(())
    }

    pub fn set_enabled(&mut self, index: CommandIndex, enabled: bool) -> Result<()> {
        self.command_mut(index)?.enabled = enabled;
        Ok(())
    }

    /// Flip one command's enabled flag, returning the new state
    pub fn toggle(&mut self, index: CommandIndex) -> Result<bool> {
        let command = self.command_mut(index)?;
        command.enabled = !command.enabled;
        Ok(command.enabled)
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        for command in &mut self.commands {
            command.enabled = enabled;
        }
    }

    /// Flip every command's enabled flag
    pub fn toggle_all(&mut self) {
        for command in &mut self.commands {
            command.enabled = !command.enabled;
        }
    }

    /// Evaluate every enabled command for one repetition.
    ///
    /// Commands come back in index order. Disabled commands are skipped but
    /// can still be the source of a cross reference. Fails if any placeholder
    /// of an enabled command is unbound, points at a missing slot or sits on
    /// a reference cycle.
    pub fn resolve(&self, iteration: u32) -> Result<Vec<(CommandIndex, ResolvedCommand)>> {
        let mut resolver = Resolver::new(self, iteration);
        let mut resolved = Vec::new();

        for (index, command) in self.commands() {
            if !command.enabled {
                trace!(group = %self.name, command = %index, "command disabled");
                continue;
            }
            let arguments = command
                .placeholders
                .iter()
                .map(|p| resolver.value(index, p))
                .collect::<Result<Vec<_>>>()?;
            resolved.push((
                index,
                ResolvedCommand {
                    type_name: command.type_name.clone(),
                    arguments,
                },
            ));
        }

        Ok(resolved)
    }

    /// Evaluate a single placeholder for one repetition
    pub fn evaluate(
        &self,
        index: CommandIndex,
        placeholder: &PlaceholderName,
        iteration: u32,
    ) -> Result<ArgumentValue> {
        Resolver::new(self, iteration).value(index, placeholder)
    }
}

type Slot = (CommandIndex, PlaceholderName);

/// Pull-based evaluator for one repetition of one group.
///
/// Values are memoised per slot; `active` holds the chain of slots being
/// evaluated so a reference back into it is reported as a cycle.
struct Resolver<'g> {
    group: &'g CommandGroup,
    iteration: u32,
    cache: IndexMap<Slot, ArgumentValue>,
    active: Vec<Slot>,
}

impl<'g> Resolver<'g> {
    fn new(group: &'g CommandGroup, iteration: u32) -> Self {
        Self {
            group,
            iteration,
            cache: IndexMap::new(),
            active: Vec::new(),
        }
    }

    fn value(&mut self, index: CommandIndex, placeholder: &PlaceholderName) -> Result<ArgumentValue> {
        let slot = (index, placeholder.clone());
        if let Some(value) = self.cache.get(&slot) {
            return Ok(value.clone());
        }

        if let Some(start) = self.active.iter().position(|s| *s == slot) {
            let mut path = self.active[start..].to_vec();
            path.push(slot);
            return Err(Error::CyclicBinding { path });
        }

        let command = self
            .group
            .command(index)
            .filter(|c| c.has_placeholder(placeholder))
            .ok_or_else(|| Error::UnknownCommandOrPlaceholder {
                command: index,
                placeholder: placeholder.clone(),
            })?;

        let strategy = command
            .binding(placeholder)
            .ok_or_else(|| Error::UnboundPlaceholder {
                command: index,
                placeholder: placeholder.clone(),
            })?;

        let value = match strategy {
            BindingStrategy::Constant(v) => v.clone(),
            BindingStrategy::Sequence(seq) => {
                self.sequence_value(seq, index, placeholder)?
            }
            BindingStrategy::Lattice(coord) => ArgumentValue::Real(coord.evaluate(self.iteration)),
            BindingStrategy::CrossReference {
                command: source,
                placeholder: source_name,
            } => {
                self.active.push(slot.clone());
                let result = self.value(*source, source_name);
                self.active.pop();
                result?
            }
        };

        self.cache.insert(slot, value.clone());
        Ok(value)
    }

    fn sequence_value(
        &self,
        seq: &Sequence,
        index: CommandIndex,
        placeholder: &PlaceholderName,
    ) -> Result<ArgumentValue> {
        seq.evaluate(self.iteration)
            .ok_or_else(|| Error::SequenceOverflow {
                command: index,
                placeholder: placeholder.clone(),
                iteration: self.iteration,
            })
    }
}

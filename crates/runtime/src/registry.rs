//! Group registry
//!
//! Process-wide table of command groups for one run. Groups are created
//! empty and never removed.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::group::CommandGroup;
use crate::types::GroupName;

/// All command groups of a run, in creation order
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: IndexMap<GroupName, CommandGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an empty group. Fails if the name was ever used.
    pub fn create(&mut self, name: GroupName) -> Result<()> {
        if self.groups.contains_key(&name) {
            return Err(Error::DuplicateGroupName(name));
        }
        self.groups.insert(name.clone(), CommandGroup::new(name));
        Ok(())
    }

    pub fn get(&self, name: &GroupName) -> Result<&CommandGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| Error::GroupNotFound(name.clone()))
    }

    pub fn get_mut(&mut self, name: &GroupName) -> Result<&mut CommandGroup> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| Error::GroupNotFound(name.clone()))
    }

    pub fn contains(&self, name: &GroupName) -> bool {
        self.groups.contains_key(name)
    }

    /// Group names in creation order
    pub fn names(&self) -> impl Iterator<Item = &GroupName> {
        self.groups.keys()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_lookup_is_empty() {
        let mut registry = GroupRegistry::new();
        registry.create("G1".into()).unwrap();
        let group = registry.get(&"G1".into()).unwrap();
        assert!(group.is_empty());
        assert_eq!(group.name(), &GroupName::from("G1"));
    }

    #[test]
    fn test_duplicate_name_fails() {
        let mut registry = GroupRegistry::new();
        registry.create("G1".into()).unwrap();
        assert_eq!(
            registry.create("G1".into()),
            Err(Error::DuplicateGroupName("G1".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_group() {
        let mut registry = GroupRegistry::new();
        assert_eq!(
            registry.get_mut(&"nope".into()).map(|g| g.len()),
            Err(Error::GroupNotFound("nope".into()))
        );
    }

    #[test]
    fn test_names_in_creation_order() {
        let mut registry = GroupRegistry::new();
        for name in ["b", "a", "c"] {
            registry.create(name.into()).unwrap();
        }
        let names: Vec<_> = registry.names().map(|n| n.0.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}

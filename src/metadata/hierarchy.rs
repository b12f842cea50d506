use super::definition::HierarchyDefinition;
use super::{ensure_unique, MetadataError};
use std::fmt;

/// A linear chain of levels, root first.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    name: String,
    levels: Vec<HierarchyLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyLevel {
    name: String,
    values: Vec<HierarchyLevelValue>,
}

/// A value at one level. `parent` indexes into the parent level's values.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyLevelValue {
    label: String,
    parent: Option<usize>,
}

impl Hierarchy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> impl Iterator<Item = Level<'_>> {
        (0..self.levels.len()).map(move |index| Level {
            hierarchy: self,
            index,
        })
    }

    pub fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|l| l.name.clone()).collect()
    }

    pub fn get_level(&self, name: &str) -> Option<Level<'_>> {
        self.levels
            .iter()
            .position(|l| l.name == name)
            .map(|index| Level {
                hierarchy: self,
                index,
            })
    }

    pub fn root_level(&self) -> Option<Level<'_>> {
        self.level_at(0)
    }

    fn level_at(&self, index: usize) -> Option<Level<'_>> {
        (index < self.levels.len()).then_some(Level {
            hierarchy: self,
            index,
        })
    }
}

impl TryFrom<HierarchyDefinition> for Hierarchy {
    type Error = MetadataError;

    fn try_from(definition: HierarchyDefinition) -> Result<Self, Self::Error> {
        ensure_unique(
            &format!("hierarchy '{}'", definition.name),
            definition.levels.iter().map(|l| l.name.as_str()),
        )?;

        let mut levels: Vec<HierarchyLevel> = Vec::with_capacity(definition.levels.len());
        for level in definition.levels {
            ensure_unique(
                &format!("level '{}'", level.name),
                level.values.iter().map(|v| v.label.as_str()),
            )?;

            let mut values = Vec::with_capacity(level.values.len());
            for value in level.values {
                let parent = match (value.parent, levels.last()) {
                    (None, _) => None,
                    (Some(_), None) => {
                        return Err(MetadataError::ParentOnRootLevel {
                            level: level.name,
                            value: value.label,
                        })
                    }
                    (Some(parent), Some(parent_level)) => {
                        let index = parent_level
                            .values
                            .iter()
                            .position(|v| v.label == parent)
                            .ok_or_else(|| MetadataError::UnknownParentValue {
                                level: level.name.clone(),
                                value: value.label.clone(),
                                parent,
                            })?;
                        Some(index)
                    }
                };
                values.push(HierarchyLevelValue {
                    label: value.label,
                    parent,
                });
            }

            levels.push(HierarchyLevel {
                name: level.name,
                values,
            });
        }

        Ok(Hierarchy {
            name: definition.name,
            levels,
        })
    }
}

#[derive(Clone, Copy)]
pub struct Level<'a> {
    hierarchy: &'a Hierarchy,
    index: usize,
}

impl<'a> Level<'a> {
    pub fn name(&self) -> &'a str {
        &self.inner().name
    }

    pub fn hierarchy(&self) -> &'a Hierarchy {
        self.hierarchy
    }

    /// Position in the chain, the root level being 0.
    pub fn depth(&self) -> usize {
        self.index
    }

    pub fn parent_level(&self) -> Option<Level<'a>> {
        self.index
            .checked_sub(1)
            .and_then(|index| self.hierarchy.level_at(index))
    }

    pub fn child_level(&self) -> Option<Level<'a>> {
        self.hierarchy.level_at(self.index + 1)
    }

    pub fn values(&self) -> impl Iterator<Item = Value<'a>> {
        let level = *self;
        (0..self.inner().values.len()).map(move |index| Value { level, index })
    }

    pub fn value_labels(&self) -> Vec<String> {
        self.inner().values.iter().map(|v| v.label.clone()).collect()
    }

    pub fn get_value(&self, label: &str) -> Option<Value<'a>> {
        self.inner()
            .values
            .iter()
            .position(|v| v.label == label)
            .map(|index| Value { level: *self, index })
    }

    fn inner(&self) -> &'a HierarchyLevel {
        &self.hierarchy.levels[self.index]
    }
}

impl PartialEq for Level<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.hierarchy, other.hierarchy) && self.index == other.index
    }
}

impl fmt::Debug for Level<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("hierarchy", &self.hierarchy.name)
            .field("name", &self.name())
            .finish()
    }
}

#[derive(Clone, Copy)]
pub struct Value<'a> {
    level: Level<'a>,
    index: usize,
}

impl<'a> Value<'a> {
    pub fn label(&self) -> &'a str {
        &self.inner().label
    }

    pub fn level(&self) -> Level<'a> {
        self.level
    }

    pub fn parent_value(&self) -> Option<Value<'a>> {
        let parent_level = self.level.parent_level()?;
        self.inner().parent.map(|index| Value {
            level: parent_level,
            index,
        })
    }

    pub fn child_values(&self) -> impl Iterator<Item = Value<'a>> {
        let index = self.index;
        self.level
            .child_level()
            .into_iter()
            .flat_map(|child| child.values())
            .filter(move |v| v.inner().parent == Some(index))
    }

    /// `None` when a link on the way up is missing.
    pub fn ancestor_at(&self, level: Level<'a>) -> Option<Value<'a>> {
        let mut current = *self;
        while current.level != level {
            if current.level.depth() <= level.depth() {
                return None;
            }
            current = current.parent_value()?;
        }
        Some(current)
    }

    fn inner(&self) -> &'a HierarchyLevelValue {
        &self.level.inner().values[self.index]
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.index == other.index
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("level", &self.level.name())
            .field("label", &self.label())
            .finish()
    }
}

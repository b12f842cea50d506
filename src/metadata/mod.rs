pub mod definition;
pub mod hierarchy;

pub use definition::{
    CubeDefinition, DimensionDefinition, HierarchyDefinition, LevelDefinition, ValueDefinition,
};
pub use hierarchy::{Hierarchy, HierarchyLevel, HierarchyLevelValue, Level, Value};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every cube exposed by one connected database. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Cube>")]
pub struct MetadataTree {
    cubes: Vec<Cube>,
}

impl MetadataTree {
    pub fn new(cubes: Vec<Cube>) -> Result<Self, MetadataError> {
        ensure_unique("database", cubes.iter().map(|c| c.name.as_str()))?;
        Ok(Self { cubes })
    }

    pub fn get_cube(&self, name: &str) -> Option<&Cube> {
        self.cubes.iter().find(|c| c.name == name)
    }

    pub fn cubes(&self) -> impl Iterator<Item = &Cube> {
        self.cubes.iter()
    }

    pub fn cube_names(&self) -> Vec<String> {
        self.cubes.iter().map(|c| c.name.clone()).collect()
    }
}

impl TryFrom<Vec<Cube>> for MetadataTree {
    type Error = MetadataError;

    fn try_from(cubes: Vec<Cube>) -> Result<Self, Self::Error> {
        MetadataTree::new(cubes)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CubeDefinition")]
pub struct Cube {
    name: String,
    directed: bool,
    dimensions: Vec<Dimension>,
    measure_types: Vec<MeasureType>,
}

impl Cube {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether graphs produced from this cube have directed edges.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn get_dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter()
    }

    pub fn dimension_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    pub fn get_measure_type(&self, key: &str) -> Option<&MeasureType> {
        self.measure_types.iter().find(|m| m.key == key)
    }

    pub fn measure_types(&self) -> impl Iterator<Item = &MeasureType> {
        self.measure_types.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Informational,
    Topological,
}

/// Alternative breakdowns of one axis, e.g. time by week or by weekday.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
    hierarchies: Vec<Hierarchy>,
}

impl Dimension {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    pub fn get_hierarchy(&self, name: &str) -> Option<&Hierarchy> {
        self.hierarchies.iter().find(|h| h.name() == name)
    }

    pub fn hierarchies(&self) -> impl Iterator<Item = &Hierarchy> {
        self.hierarchies.iter()
    }

    pub fn hierarchy_names(&self) -> Vec<String> {
        self.hierarchies.iter().map(|h| h.name().to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureClass {
    Numeric,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureAssociation {
    Node,
    Edge,
}

/// Shape of an annotation attached to graph nodes or edges. Carries no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureType {
    pub key: String,
    pub class: MeasureClass,
    pub association: MeasureAssociation,
}

impl MeasureType {
    pub fn new(key: impl Into<String>, class: MeasureClass, association: MeasureAssociation) -> Self {
        Self {
            key: key.into(),
            class,
            association,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("Duplicate name '{name}' in {container}")]
    DuplicateName { container: String, name: String },

    #[error("Value '{value}' of level '{level}' references unknown parent value '{parent}'")]
    UnknownParentValue {
        level: String,
        value: String,
        parent: String,
    },

    #[error("Value '{value}' of root level '{level}' cannot have a parent value")]
    ParentOnRootLevel { level: String, value: String },
}

pub(crate) fn ensure_unique<'a>(
    container: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), MetadataError> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(MetadataError::DuplicateName {
                container: container.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

impl TryFrom<CubeDefinition> for Cube {
    type Error = MetadataError;

    fn try_from(definition: CubeDefinition) -> Result<Self, Self::Error> {
        let container = format!("cube '{}'", definition.name);
        ensure_unique(
            &container,
            definition.dimensions.iter().map(|d| d.name.as_str()),
        )?;
        ensure_unique(&container, definition.measures.iter().map(|m| m.key.as_str()))?;

        let dimensions = definition
            .dimensions
            .into_iter()
            .map(Dimension::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cube {
            name: definition.name,
            directed: definition.directed,
            dimensions,
            measure_types: definition.measures,
        })
    }
}

impl TryFrom<DimensionDefinition> for Dimension {
    type Error = MetadataError;

    fn try_from(definition: DimensionDefinition) -> Result<Self, Self::Error> {
        ensure_unique(
            &format!("dimension '{}'", definition.name),
            definition.hierarchies.iter().map(|h| h.name.as_str()),
        )?;

        let hierarchies = definition
            .hierarchies
            .into_iter()
            .map(Hierarchy::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dimension {
            name: definition.name,
            kind: definition.kind,
            hierarchies,
        })
    }
}

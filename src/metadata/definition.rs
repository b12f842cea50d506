use super::{DimensionKind, MeasureType};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CubeDefinition {
    pub name: String,
    #[serde(default)]
    pub directed: bool,
    pub dimensions: Vec<DimensionDefinition>,
    #[serde(default)]
    pub measures: Vec<MeasureType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DimensionDefinition {
    pub name: String,
    pub kind: DimensionKind,
    pub hierarchies: Vec<HierarchyDefinition>,
}

/// Levels are listed root first; each level is the child of the one before.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HierarchyDefinition {
    pub name: String,
    pub levels: Vec<LevelDefinition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LevelDefinition {
    pub name: String,
    #[serde(default)]
    pub values: Vec<ValueDefinition>,
}

/// Either `"2010-20"` or `{"label": "2010-05-12", "parent": "2010-19"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDefinition {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl ValueDefinition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            parent: None,
        }
    }

    pub fn with_parent(label: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            parent: Some(parent.into()),
        }
    }
}

impl<'de> Deserialize<'de> for ValueDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ValueHelper {
            Label(String),
            Full {
                label: String,
                #[serde(default)]
                parent: Option<String>,
            },
        }

        match ValueHelper::deserialize(deserializer)? {
            ValueHelper::Label(label) => Ok(ValueDefinition::new(label)),
            ValueHelper::Full { label, parent } => Ok(ValueDefinition { label, parent }),
        }
    }
}

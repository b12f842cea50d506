use crate::metadata::{Cube, MetadataTree};
use crate::projection::EditedAxis;

/// In-progress axis selection. Each variant carries everything chosen so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AxisState {
    #[default]
    Idle,
    Ready {
        cube: String,
    },
    DimensionChosen {
        cube: String,
        dimension: String,
    },
    HierarchyChosen {
        cube: String,
        dimension: String,
        hierarchy: String,
    },
    LevelChosen {
        cube: String,
        dimension: String,
        hierarchy: String,
        level: String,
    },
    ValuesChosen {
        cube: String,
        dimension: String,
        hierarchy: String,
        level: String,
        values: Vec<String>,
    },
}

/// Lists at and below this one are published again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChoiceLevel {
    Dimensions,
    Hierarchies,
    Levels,
    Values,
}

/// The pickable lists derived from an [`AxisState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choices {
    pub dimensions: Vec<String>,
    pub hierarchies: Vec<String>,
    pub levels: Vec<String>,
    pub values: Vec<String>,
}

impl AxisState {
    pub fn cube(&self) -> Option<&str> {
        match self {
            AxisState::Idle => None,
            AxisState::Ready { cube }
            | AxisState::DimensionChosen { cube, .. }
            | AxisState::HierarchyChosen { cube, .. }
            | AxisState::LevelChosen { cube, .. }
            | AxisState::ValuesChosen { cube, .. } => Some(cube),
        }
    }

    pub fn dimension(&self) -> Option<&str> {
        match self {
            AxisState::DimensionChosen { dimension, .. }
            | AxisState::HierarchyChosen { dimension, .. }
            | AxisState::LevelChosen { dimension, .. }
            | AxisState::ValuesChosen { dimension, .. } => Some(dimension),
            _ => None,
        }
    }

    pub fn hierarchy(&self) -> Option<&str> {
        match self {
            AxisState::HierarchyChosen { hierarchy, .. }
            | AxisState::LevelChosen { hierarchy, .. }
            | AxisState::ValuesChosen { hierarchy, .. } => Some(hierarchy),
            _ => None,
        }
    }

    pub fn level(&self) -> Option<&str> {
        match self {
            AxisState::LevelChosen { level, .. } | AxisState::ValuesChosen { level, .. } => {
                Some(level)
            }
            _ => None,
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            AxisState::ValuesChosen { values, .. } => values,
            _ => &[],
        }
    }

    /// The axis whose values are being edited, once a level is chosen.
    pub fn edited_axis(&self) -> Option<EditedAxis<'_>> {
        Some(EditedAxis {
            dimension: self.dimension()?,
            hierarchy: self.hierarchy()?,
            level: self.level()?,
        })
    }

    pub fn with_cube(cube: &str) -> AxisState {
        AxisState::Ready {
            cube: cube.to_string(),
        }
    }

    /// `None` when the cube has no such dimension.
    pub fn with_dimension(&self, cube: &Cube, dimension: &str) -> Option<AxisState> {
        let current = self.cube().filter(|c| *c == cube.name())?;
        cube.get_dimension(dimension)?;
        Some(AxisState::DimensionChosen {
            cube: current.to_string(),
            dimension: dimension.to_string(),
        })
    }

    pub fn with_hierarchy(&self, cube: &Cube, hierarchy: &str) -> Option<AxisState> {
        let dimension = self.dimension()?;
        cube.get_dimension(dimension)?.get_hierarchy(hierarchy)?;
        Some(AxisState::HierarchyChosen {
            cube: cube.name().to_string(),
            dimension: dimension.to_string(),
            hierarchy: hierarchy.to_string(),
        })
    }

    pub fn with_level(&self, cube: &Cube, level: &str) -> Option<AxisState> {
        let dimension = self.dimension()?;
        let hierarchy = self.hierarchy()?;
        cube.get_dimension(dimension)?
            .get_hierarchy(hierarchy)?
            .get_level(level)?;
        Some(AxisState::LevelChosen {
            cube: cube.name().to_string(),
            dimension: dimension.to_string(),
            hierarchy: hierarchy.to_string(),
            level: level.to_string(),
        })
    }

    /// The caller filters `values`.
    pub fn with_values(&self, values: Vec<String>) -> Option<AxisState> {
        let axis = self.edited_axis()?;
        Some(AxisState::ValuesChosen {
            cube: self.cube()?.to_string(),
            dimension: axis.dimension.to_string(),
            hierarchy: axis.hierarchy.to_string(),
            level: axis.level.to_string(),
            values,
        })
    }

    pub fn choices(&self, tree: &MetadataTree) -> Choices {
        let mut choices = Choices::default();
        let Some(cube) = self.cube().and_then(|c| tree.get_cube(c)) else {
            return choices;
        };
        choices.dimensions = cube.dimension_names();

        let Some(dimension) = self.dimension().and_then(|d| cube.get_dimension(d)) else {
            return choices;
        };
        choices.hierarchies = dimension.hierarchy_names();

        let Some(hierarchy) = self.hierarchy().and_then(|h| dimension.get_hierarchy(h)) else {
            return choices;
        };
        choices.levels = hierarchy.level_names();

        if let Some(level) = self.level().and_then(|l| hierarchy.get_level(l)) {
            choices.values = level.value_labels();
        }
        choices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::scenario_tree;

    #[test]
    fn test_choices_cascade() {
        let tree = scenario_tree();
        let cube = tree.get_cube("cube").unwrap();

        let state = AxisState::with_cube("cube");
        assert_eq!(state.choices(&tree).dimensions, vec!["LOCATION", "TIMES"]);
        assert!(state.choices(&tree).hierarchies.is_empty());

        let state = state
            .with_dimension(cube, "LOCATION")
            .and_then(|s| s.with_hierarchy(cube, "HUB"))
            .unwrap();
        assert_eq!(state.choices(&tree).levels, vec!["RAILPORT"]);

        let state = state.with_level(cube, "RAILPORT").unwrap();
        assert_eq!(state.choices(&tree).values, vec!["TOPOLOGY"]);
    }

    #[test]
    fn test_prerequisites_are_required() {
        let tree = scenario_tree();
        let cube = tree.get_cube("cube").unwrap();

        assert!(AxisState::Idle.with_dimension(cube, "LOCATION").is_none());
        let ready = AxisState::with_cube("cube");
        assert!(ready.with_hierarchy(cube, "HUB").is_none());
        assert!(ready.with_level(cube, "RAILPORT").is_none());
        assert!(ready.with_values(vec![]).is_none());
    }

    #[test]
    fn test_unknown_names_do_not_transition() {
        let tree = scenario_tree();
        let cube = tree.get_cube("cube").unwrap();
        let state = AxisState::with_cube("cube")
            .with_dimension(cube, "LOCATION")
            .unwrap();

        assert!(state.with_dimension(cube, "NOPE").is_none());
        assert!(state.with_hierarchy(cube, "TIMES_WEEK").is_none());
    }

    #[test]
    fn test_reselecting_dimension_resets_below() {
        let tree = scenario_tree();
        let cube = tree.get_cube("cube").unwrap();
        let state = AxisState::with_cube("cube")
            .with_dimension(cube, "TIMES")
            .and_then(|s| s.with_hierarchy(cube, "TIMES_WEEK"))
            .and_then(|s| s.with_level(cube, "DAY"))
            .and_then(|s| s.with_values(vec!["2010-05-12".to_string()]))
            .unwrap();

        let state = state.with_dimension(cube, "TIMES").unwrap();
        assert_eq!(state.hierarchy(), None);
        assert_eq!(state.level(), None);
        assert!(state.values().is_empty());
    }
}

use crate::metadata::{Cube, Level, MeasureType};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Dimension '{dimension}' not found in cube '{cube}'")]
    UnknownDimension { cube: String, dimension: String },

    #[error("Hierarchy '{hierarchy}' not found in dimension '{dimension}'")]
    UnknownHierarchy { dimension: String, hierarchy: String },

    #[error("Level '{level}' not found in hierarchy '{hierarchy}'")]
    UnknownLevel { hierarchy: String, level: String },

    #[error("Value '{value}' not found in level '{level}'")]
    UnknownValue { level: String, value: String },

    #[error("Measure type '{measure}' not found in cube '{cube}'")]
    UnknownMeasure { cube: String, measure: String },

    #[error("Request is bound to cube '{expected}' but was checked against cube '{found}'")]
    CubeMismatch { expected: String, found: String },
}

/// Values at one level of one hierarchy. An empty set restricts nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    cube: String,
    dimension: String,
    hierarchy: String,
    level: String,
    values: Vec<String>,
}

impl Constraint {
    pub fn new<I, S>(
        cube: &Cube,
        dimension: &str,
        hierarchy: &str,
        level: &str,
        values: I,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resolved = resolve_level(cube, dimension, hierarchy, level)?;

        let mut labels: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if resolved.get_value(&value).is_none() {
                return Err(RequestError::UnknownValue {
                    level: level.to_string(),
                    value,
                });
            }
            if !labels.contains(&value) {
                labels.push(value);
            }
        }

        Ok(Self {
            cube: cube.name().to_string(),
            dimension: dimension.to_string(),
            hierarchy: hierarchy.to_string(),
            level: level.to_string(),
            values: labels,
        })
    }

    pub fn cube(&self) -> &str {
        &self.cube
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn hierarchy(&self) -> &str {
        &self.hierarchy
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn contains(&self, label: &str) -> bool {
        self.values.iter().any(|v| v == label)
    }

    /// True when the axis is configured but no value was chosen.
    pub fn is_unrestricted(&self) -> bool {
        self.values.is_empty()
    }

    pub fn same_hierarchy(&self, dimension: &str, hierarchy: &str) -> bool {
        self.dimension == dimension && self.hierarchy == hierarchy
    }

    pub fn resolve<'a>(&self, cube: &'a Cube) -> Option<Level<'a>> {
        cube.get_dimension(&self.dimension)?
            .get_hierarchy(&self.hierarchy)?
            .get_level(&self.level)
    }

    fn validate(&self, cube: &Cube) -> Result<(), RequestError> {
        let level = resolve_level(cube, &self.dimension, &self.hierarchy, &self.level)?;
        match self.values.iter().find(|v| level.get_value(v).is_none()) {
            Some(value) => Err(RequestError::UnknownValue {
                level: self.level.clone(),
                value: value.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn resolve_level<'a>(
    cube: &'a Cube,
    dimension: &str,
    hierarchy: &str,
    level: &str,
) -> Result<Level<'a>, RequestError> {
    cube.get_dimension(dimension)
        .ok_or_else(|| RequestError::UnknownDimension {
            cube: cube.name().to_string(),
            dimension: dimension.to_string(),
        })?
        .get_hierarchy(hierarchy)
        .ok_or_else(|| RequestError::UnknownHierarchy {
            dimension: dimension.to_string(),
            hierarchy: hierarchy.to_string(),
        })?
        .get_level(level)
        .ok_or_else(|| RequestError::UnknownLevel {
            hierarchy: hierarchy.to_string(),
            level: level.to_string(),
        })
}

/// A query against one cube, with at most one constraint per hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    cube: Arc<Cube>,
    constraints: Vec<Constraint>,
    measure_types: Vec<MeasureType>,
}

impl Request {
    pub fn new(cube: &Cube) -> Self {
        Self {
            cube: Arc::new(cube.clone()),
            constraints: Vec::new(),
            measure_types: Vec::new(),
        }
    }

    pub fn cube(&self) -> &str {
        self.cube.name()
    }

    /// Replaces in place any constraint already held for the same hierarchy.
    ///
    /// # Panics
    ///
    /// If `constraint` does not resolve in this request's cube.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Option<Constraint> {
        assert_eq!(
            constraint.cube,
            self.cube.name(),
            "constraint on hierarchy '{}' belongs to another cube",
            constraint.hierarchy
        );
        if let Err(e) = constraint.validate(&self.cube) {
            panic!("constraint does not resolve in cube '{}': {}", self.cube.name(), e);
        }

        match self
            .constraints
            .iter_mut()
            .find(|c| c.same_hierarchy(&constraint.dimension, &constraint.hierarchy))
        {
            Some(existing) => Some(std::mem::replace(existing, constraint)),
            None => {
                self.constraints.push(constraint);
                None
            }
        }
    }

    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Option<Constraint> {
        self.remove_hierarchy(&constraint.dimension, &constraint.hierarchy)
    }

    pub fn remove_hierarchy(&mut self, dimension: &str, hierarchy: &str) -> Option<Constraint> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.same_hierarchy(dimension, hierarchy))?;
        Some(self.constraints.remove(index))
    }

    pub fn constraint_for(&self, dimension: &str, hierarchy: &str) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|c| c.same_hierarchy(dimension, hierarchy))
    }

    /// Constraints in the order their hierarchies were first constrained.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Returns false if the measure type was already requested.
    pub fn add_measure_type(&mut self, measure_type: MeasureType) -> bool {
        if self.has_measure_type(&measure_type.key) {
            return false;
        }
        self.measure_types.push(measure_type);
        true
    }

    pub fn remove_measure_type(&mut self, key: &str) -> bool {
        let before = self.measure_types.len();
        self.measure_types.retain(|m| m.key != key);
        before != self.measure_types.len()
    }

    pub fn has_measure_type(&self, key: &str) -> bool {
        self.measure_types.iter().any(|m| m.key == key)
    }

    pub fn measure_types(&self) -> impl Iterator<Item = &MeasureType> {
        self.measure_types.iter()
    }

    /// Checks every constraint and measure type against `cube`.
    pub fn validate(&self, cube: &Cube) -> Result<(), RequestError> {
        if cube.name() != self.cube.name() {
            return Err(RequestError::CubeMismatch {
                expected: self.cube().to_string(),
                found: cube.name().to_string(),
            });
        }

        for constraint in &self.constraints {
            constraint.validate(cube)?;
        }

        for measure in &self.measure_types {
            if cube.get_measure_type(&measure.key) != Some(measure) {
                return Err(RequestError::UnknownMeasure {
                    cube: self.cube().to_string(),
                    measure: measure.key.clone(),
                });
            }
        }

        Ok(())
    }
}

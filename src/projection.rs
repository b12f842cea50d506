use crate::metadata::{Cube, Dimension, Level, Value};
use crate::request::Constraint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dimension,
    Hierarchy,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionNode {
    pub id: usize,
    pub parent: Option<usize>,
    pub kind: NodeKind,
    pub label: String,
    /// Level name, for value nodes.
    pub level: Option<String>,
    pub selectable: bool,
    pub selected: bool,
}

/// The (dimension, hierarchy, level) whose values the user is choosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditedAxis<'s> {
    pub dimension: &'s str,
    pub hierarchy: &'s str,
    pub level: &'s str,
}

/// Depth first, parent before children.
pub fn project<'c>(
    cube: &Cube,
    edited: Option<EditedAxis<'_>>,
    constraints: impl IntoIterator<Item = &'c Constraint>,
) -> Vec<SelectionNode> {
    let constraints: Vec<&Constraint> = constraints.into_iter().collect();
    let mut projector = Projector { nodes: Vec::new() };

    for dimension in cube.dimensions() {
        let dimension_id = projector.push(None, NodeKind::Dimension, dimension.name(), None);

        for hierarchy in dimension.hierarchies() {
            let hierarchy_id = projector.push(
                Some(dimension_id),
                NodeKind::Hierarchy,
                hierarchy.name(),
                None,
            );

            let scope = HierarchyScope {
                committed: constraints
                    .iter()
                    .copied()
                    .find(|c| c.same_hierarchy(dimension.name(), hierarchy.name())),
                others: constraints
                    .iter()
                    .copied()
                    .filter(|c| {
                        c.dimension() == dimension.name() && c.hierarchy() != hierarchy.name()
                    })
                    .collect(),
                editing: edited
                    .filter(|e| e.dimension == dimension.name() && e.hierarchy == hierarchy.name())
                    .and_then(|e| hierarchy.get_level(e.level)),
                dimension,
            };

            for level in hierarchy.levels() {
                for value in level.values().filter(|v| v.parent_value().is_none()) {
                    projector.visit(value, hierarchy_id, &scope);
                }
            }
        }
    }

    projector.nodes
}

/// Labels of the edited level's values that the user may pick.
pub fn selectable_values<'c>(
    cube: &Cube,
    edited: EditedAxis<'_>,
    constraints: impl IntoIterator<Item = &'c Constraint>,
) -> Vec<String> {
    project(cube, Some(edited), constraints)
        .into_iter()
        .filter(|n| n.selectable)
        .map(|n| n.label)
        .collect()
}

struct HierarchyScope<'a> {
    dimension: &'a Dimension,
    committed: Option<&'a Constraint>,
    /// Committed constraints on sibling hierarchies of the same dimension.
    others: Vec<&'a Constraint>,
    editing: Option<Level<'a>>,
}

impl HierarchyScope<'_> {
    fn is_selected(&self, value: &Value<'_>) -> bool {
        self.committed
            .is_some_and(|c| c.level() == value.level().name() && c.contains(value.label()))
    }

    fn is_excluded(&self, value: &Value<'_>) -> bool {
        self.others
            .iter()
            .any(|other| self.excluded_by(other, value))
    }

    // Sibling hierarchies share levels by name.
    fn excluded_by(&self, other: &Constraint, value: &Value<'_>) -> bool {
        if other.is_unrestricted() {
            return false;
        }
        let Some(sibling) = self.dimension.get_hierarchy(other.hierarchy()) else {
            return false;
        };
        let Some(restricted) = sibling.get_level(other.level()) else {
            return false;
        };

        let mut current = Some(*value);
        while let Some(v) = current {
            let counterpart = sibling
                .get_level(v.level().name())
                .filter(|shared| shared.depth() >= restricted.depth())
                .and_then(|shared| shared.get_value(v.label()));
            if let Some(counterpart) = counterpart {
                return counterpart
                    .ancestor_at(restricted)
                    .is_some_and(|ancestor| !other.contains(ancestor.label()));
            }
            current = v.parent_value();
        }
        false
    }

    fn is_selectable(&self, value: &Value<'_>) -> bool {
        self.editing == Some(value.level()) && !self.is_excluded(value)
    }
}

struct Projector {
    nodes: Vec<SelectionNode>,
}

impl Projector {
    fn push(
        &mut self,
        parent: Option<usize>,
        kind: NodeKind,
        label: &str,
        level: Option<&str>,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(SelectionNode {
            id,
            parent,
            kind,
            label: label.to_string(),
            level: level.map(str::to_string),
            selectable: false,
            selected: false,
        });
        id
    }

    fn visit(&mut self, value: Value<'_>, parent: usize, scope: &HierarchyScope<'_>) {
        let id = self.push(
            Some(parent),
            NodeKind::Value,
            value.label(),
            Some(value.level().name()),
        );
        self.nodes[id].selectable = scope.is_selectable(&value);
        self.nodes[id].selected = scope.is_selected(&value);

        for child in value.child_values() {
            self.visit(child, id, scope);
        }
    }
}

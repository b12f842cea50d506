use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A measure reading attached to a node or an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Numeric(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub measures: BTreeMap<String, MeasureValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub measures: BTreeMap<String, MeasureValue>,
}

/// One graph of a query response, annotated with the requested measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseGraph {
    pub name: String,
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

pub type ResponseGraphs = Vec<ResponseGraph>;

impl ResponseGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Copy of this graph keeping only the listed measure keys.
    pub fn retain_measures(&self, keys: &[&str]) -> ResponseGraph {
        let keep = |measures: &BTreeMap<String, MeasureValue>| -> BTreeMap<String, MeasureValue> {
            measures
                .iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        ResponseGraph {
            name: self.name.clone(),
            directed: self.directed,
            nodes: self
                .nodes
                .iter()
                .map(|n| GraphNode {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    measures: keep(&n.measures),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| GraphEdge {
                    source: e.source.clone(),
                    target: e.target.clone(),
                    measures: keep(&e.measures),
                })
                .collect(),
        }
    }
}

impl GraphNode {
    pub fn measure(&self, key: &str) -> Option<&MeasureValue> {
        self.measures.get(key)
    }
}

impl GraphEdge {
    pub fn measure(&self, key: &str) -> Option<&MeasureValue> {
        self.measures.get(key)
    }
}

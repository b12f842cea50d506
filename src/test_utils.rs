use crate::controller::Presenter;
use crate::data_store::{ConnectionDescriptor, DataStoreError, ExecutionModel, InitDescriptor};
use crate::graph::{ResponseGraph, ResponseGraphs};
use crate::metadata::MetadataTree;
use crate::projection::SelectionNode;
use crate::request::Request;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// `archive` exists to exercise cube switching.
pub fn scenario_tree() -> MetadataTree {
    serde_json::from_value(json!([
        {
            "name": "cube",
            "directed": true,
            "measures": [
                {"key": "traffic", "class": "numeric", "association": "edge"},
                {"key": "label", "class": "text", "association": "node"}
            ],
            "dimensions": [
                {
                    "name": "LOCATION",
                    "kind": "topological",
                    "hierarchies": [
                        {"name": "HUB", "levels": [
                            {"name": "RAILPORT", "values": ["TOPOLOGY"]}
                        ]}
                    ]
                },
                {
                    "name": "TIMES",
                    "kind": "informational",
                    "hierarchies": [
                        {"name": "TIMES_WEEK", "levels": [
                            {"name": "WEEK", "values": ["2010-20"]},
                            {"name": "DAY", "values": ["2010-05-12", "2010-05-13"]}
                        ]}
                    ]
                }
            ]
        },
        {
            "name": "archive",
            "measures": [
                {"key": "traffic", "class": "numeric", "association": "edge"}
            ],
            "dimensions": [
                {
                    "name": "LOCATION",
                    "kind": "topological",
                    "hierarchies": [
                        {"name": "HUB", "levels": [
                            {"name": "RAILPORT", "values": ["TOPOLOGY"]}
                        ]}
                    ]
                }
            ]
        }
    ]))
    .expect("scenario metadata is consistent")
}

/// A three level hierarchy with a populated value forest, including one
/// parentless value below the root level.
pub fn forest_tree() -> MetadataTree {
    serde_json::from_value(json!([
        {
            "name": "geo",
            "measures": [
                {"key": "population", "class": "numeric", "association": "node"}
            ],
            "dimensions": [
                {
                    "name": "PLACE",
                    "kind": "topological",
                    "hierarchies": [
                        {"name": "ADMIN", "levels": [
                            {"name": "COUNTRY", "values": ["France", "Italy"]},
                            {"name": "CITY", "values": [
                                {"label": "Paris", "parent": "France"},
                                {"label": "Lyon", "parent": "France"},
                                {"label": "Rome", "parent": "Italy"},
                                "Atlantis"
                            ]},
                            {"name": "DISTRICT", "values": [
                                {"label": "Montmartre", "parent": "Paris"},
                                {"label": "Trastevere", "parent": "Rome"}
                            ]}
                        ]}
                    ]
                },
                {
                    "name": "SEASON",
                    "kind": "informational",
                    "hierarchies": [
                        {"name": "QUARTER", "levels": [
                            {"name": "Q", "values": ["Q1", "Q2"]}
                        ]}
                    ]
                }
            ]
        }
    ]))
    .expect("forest metadata is consistent")
}

/// TIME has two sibling hierarchies sharing the DAY level; ORIGIN and DEST
/// both name their hierarchy HUB.
pub fn trips_tree() -> MetadataTree {
    let station = json!([
        {"name": "HUB", "levels": [{"name": "STATION", "values": ["A", "B"]}]}
    ]);
    serde_json::from_value(json!([
        {
            "name": "trips",
            "measures": [
                {"key": "trips", "class": "numeric", "association": "edge"}
            ],
            "dimensions": [
                {
                    "name": "TIME",
                    "kind": "informational",
                    "hierarchies": [
                        {"name": "BY_WEEK", "levels": [
                            {"name": "WEEK", "values": ["W19", "W20"]},
                            {"name": "DAY", "values": [
                                {"label": "2010-05-12", "parent": "W19"},
                                {"label": "2010-05-13", "parent": "W19"},
                                {"label": "2010-05-18", "parent": "W20"}
                            ]}
                        ]},
                        {"name": "BY_MONTH", "levels": [
                            {"name": "MONTH", "values": ["2010-05"]},
                            {"name": "DAY", "values": [
                                {"label": "2010-05-12", "parent": "2010-05"},
                                {"label": "2010-05-13", "parent": "2010-05"},
                                {"label": "2010-05-18", "parent": "2010-05"}
                            ]}
                        ]}
                    ]
                },
                {"name": "ORIGIN", "kind": "topological", "hierarchies": station.clone()},
                {"name": "DEST", "kind": "topological", "hierarchies": station}
            ]
        }
    ]))
    .expect("trips metadata is consistent")
}

/// One response graph carrying both measures of the scenario cube.
pub fn traffic_graphs() -> ResponseGraphs {
    let graph: ResponseGraph = serde_json::from_value(json!({
        "name": "week-20",
        "directed": true,
        "nodes": [
            {"id": "paris", "measures": {"label": "Paris Nord"}},
            {"id": "lille", "measures": {"label": "Lille Flandres"}}
        ],
        "edges": [
            {"source": "paris", "target": "lille", "measures": {"traffic": 42.0}}
        ]
    }))
    .expect("graph fixture is valid");
    vec![graph]
}

/// Answers from a queue of scripted outcomes and records every request.
pub struct ScriptedModel {
    tree: MetadataTree,
    connect_error: Mutex<Option<DataStoreError>>,
    outcomes: Mutex<VecDeque<Result<ResponseGraphs, DataStoreError>>>,
    executed: Mutex<Vec<Request>>,
    delay: Option<Duration>,
    connected: AtomicBool,
}

impl ScriptedModel {
    pub fn new(tree: MetadataTree) -> Self {
        Self {
            tree,
            connect_error: Mutex::new(None),
            outcomes: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
            delay: None,
            connected: AtomicBool::new(false),
        }
    }

    /// Every `execute` sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_next_connect(&self, error: DataStoreError) {
        *self.connect_error.lock().unwrap() = Some(error);
    }

    /// An empty queue answers with no graphs.
    pub fn push_outcome(&self, outcome: Result<ResponseGraphs, DataStoreError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn executed(&self) -> Vec<Request> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionModel for ScriptedModel {
    async fn connect(
        &self,
        _connection: &ConnectionDescriptor,
        _init: &InitDescriptor,
    ) -> Result<MetadataTree, DataStoreError> {
        if let Some(error) = self.connect_error.lock().unwrap().take() {
            return Err(error);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.tree.clone())
    }

    async fn execute(&self, request: &Request) -> Result<ResponseGraphs, DataStoreError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DataStoreError::BogusConnection("not connected".to_string()));
        }
        self.executed.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().unwrap().pop_front();
        outcome.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    Cubes(Vec<String>),
    Dimensions(Vec<String>),
    Hierarchies(Vec<String>),
    Levels(Vec<String>),
    Values(Vec<String>),
    Node {
        parent: Option<String>,
        node: SelectionNode,
    },
    PopulationDone,
    Graphs(ResponseGraphs),
    Error(String),
}

/// Presenter that keeps every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub events: Vec<PresenterEvent>,
}

impl RecordingPresenter {
    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn graphs(&self) -> Vec<&ResponseGraphs> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Graphs(graphs) => Some(graphs),
                _ => None,
            })
            .collect()
    }

    pub fn last_levels(&self) -> Option<&[String]> {
        self.events.iter().rev().find_map(|e| match e {
            PresenterEvent::Levels(levels) => Some(levels.as_slice()),
            _ => None,
        })
    }

    pub fn last_values(&self) -> Option<&[String]> {
        self.events.iter().rev().find_map(|e| match e {
            PresenterEvent::Values(values) => Some(values.as_slice()),
            _ => None,
        })
    }

    /// Nodes of the most recent completed selection tree population.
    pub fn last_population(&self) -> Vec<&SelectionNode> {
        let Some(done) = self
            .events
            .iter()
            .rposition(|e| *e == PresenterEvent::PopulationDone)
        else {
            return Vec::new();
        };
        self.events[..done]
            .iter()
            .rev()
            .take_while(|e| **e != PresenterEvent::PopulationDone)
            .filter_map(|e| match e {
                PresenterEvent::Node { node, .. } => Some(node),
                _ => None,
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Presenter for RecordingPresenter {
    fn show_cubes(&mut self, cubes: &[String]) {
        self.events.push(PresenterEvent::Cubes(cubes.to_vec()));
    }

    fn show_dimensions(&mut self, dimensions: &[String]) {
        self.events.push(PresenterEvent::Dimensions(dimensions.to_vec()));
    }

    fn show_hierarchies(&mut self, hierarchies: &[String]) {
        self.events
            .push(PresenterEvent::Hierarchies(hierarchies.to_vec()));
    }

    fn show_levels(&mut self, levels: &[String]) {
        self.events.push(PresenterEvent::Levels(levels.to_vec()));
    }

    fn show_values(&mut self, values: &[String]) {
        self.events.push(PresenterEvent::Values(values.to_vec()));
    }

    fn populate_selection_node(&mut self, parent: Option<&SelectionNode>, node: &SelectionNode) {
        self.events.push(PresenterEvent::Node {
            parent: parent.map(|p| p.label.clone()),
            node: node.clone(),
        });
    }

    fn selection_population_done(&mut self) {
        self.events.push(PresenterEvent::PopulationDone);
    }

    fn show_graphs(&mut self, graphs: &ResponseGraphs, _elapsed: Duration) {
        self.events.push(PresenterEvent::Graphs(graphs.clone()));
    }

    fn show_error(&mut self, message: &str) {
        self.events.push(PresenterEvent::Error(message.to_string()));
    }
}

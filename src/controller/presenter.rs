use crate::graph::ResponseGraphs;
use crate::projection::SelectionNode;
use log::{error, info};
use std::time::Duration;

/// Receives everything the controller wants shown to the user.
pub trait Presenter: Send {
    fn show_cubes(&mut self, cubes: &[String]);
    fn show_dimensions(&mut self, dimensions: &[String]);
    fn show_hierarchies(&mut self, hierarchies: &[String]);
    fn show_levels(&mut self, levels: &[String]);
    fn show_values(&mut self, values: &[String]);
    /// One call per node of the selection tree, parents first.
    fn populate_selection_node(&mut self, parent: Option<&SelectionNode>, node: &SelectionNode);
    fn selection_population_done(&mut self);
    fn show_graphs(&mut self, graphs: &ResponseGraphs, elapsed: Duration);
    fn show_error(&mut self, message: &str);
}

/// Presenter for headless runs: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_cubes(&mut self, cubes: &[String]) {
        info!("Cubes: {:?}", cubes);
    }

    fn show_dimensions(&mut self, dimensions: &[String]) {
        info!("Dimensions: {:?}", dimensions);
    }

    fn show_hierarchies(&mut self, hierarchies: &[String]) {
        info!("Hierarchies: {:?}", hierarchies);
    }

    fn show_levels(&mut self, levels: &[String]) {
        info!("Levels: {:?}", levels);
    }

    fn show_values(&mut self, values: &[String]) {
        info!("Values: {:?}", values);
    }

    fn populate_selection_node(&mut self, parent: Option<&SelectionNode>, node: &SelectionNode) {
        if !node.selectable && !node.selected {
            return;
        }
        info!(
            "{} {}{}{}",
            parent.map(|p| p.label.as_str()).unwrap_or("-"),
            node.label,
            if node.selectable { " [selectable]" } else { "" },
            if node.selected { " [selected]" } else { "" }
        );
    }

    fn selection_population_done(&mut self) {}

    fn show_graphs(&mut self, graphs: &ResponseGraphs, elapsed: Duration) {
        info!("Received {} graph(s) in {:?}", graphs.len(), elapsed);
        for graph in graphs {
            info!(
                "  {}: {} node(s), {} edge(s)",
                graph.name,
                graph.nodes.len(),
                graph.edges.len()
            );
        }
    }

    fn show_error(&mut self, message: &str) {
        error!("{}", message);
    }
}

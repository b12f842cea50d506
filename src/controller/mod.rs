pub mod command;
pub mod presenter;
pub mod state;

pub use command::{AxisName, Command, CommandParseError};
pub use presenter::{LogPresenter, Presenter};
pub use state::{AxisState, ChoiceLevel, Choices};

use crate::data_store::{
    ConnectionDescriptor, DataStoreError, ExecutionModel, InitDescriptor,
};
use crate::graph::ResponseGraphs;
use crate::metadata::{Cube, MeasureType, MetadataTree};
use crate::persistence::{Persistence, PersistenceError};
use crate::projection;
use crate::request::{Constraint, Request, RequestError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

pub const VIEW_STATE_KEY: &str = "view_state";

/// Failures shown to the user.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("No cube selected")]
    NoCubeSelected,

    #[error("Not connected")]
    NotConnected,

    #[error("Cube '{0}' not found")]
    UnknownCube(String),

    #[error("Measure type '{0}' not found")]
    UnknownMeasure(String),

    #[error("Query aborted: {0}")]
    QueryAborted(String),

    #[error("Values cannot be selected: {}", .0.join(", "))]
    UnselectableValues(Vec<String>),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    DataStore(#[from] DataStoreError),

    #[error("Could not access saved state: {0}")]
    Persistence(#[from] PersistenceError),
}

type QueryOutcome = Result<(ResponseGraphs, Duration), DataStoreError>;

/// The last successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedGraphs {
    pub graphs: ResponseGraphs,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub cube: String,
    pub constraints: Vec<SavedConstraint>,
    pub measures: Vec<String>,
}

/// A constraint as persisted. Names are resolved again on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConstraint {
    pub dimension: String,
    pub hierarchy: String,
    pub level: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl From<&Constraint> for SavedConstraint {
    fn from(constraint: &Constraint) -> Self {
        Self {
            dimension: constraint.dimension().to_string(),
            hierarchy: constraint.hierarchy().to_string(),
            level: constraint.level().to_string(),
            values: constraint.values().to_vec(),
        }
    }
}

/// One exploration session. Queries run on a spawned task with a clone of
/// the request.
pub struct Controller<M, S, P> {
    model: Arc<M>,
    store: S,
    presenter: P,
    timeout: Option<Duration>,
    tree: Option<Arc<MetadataTree>>,
    axis: AxisState,
    request: Option<Request>,
    measures: Vec<MeasureType>,
    displayed: Option<DisplayedGraphs>,
    in_flight: Option<JoinHandle<QueryOutcome>>,
}

impl<M, S, P> Controller<M, S, P>
where
    M: ExecutionModel + 'static,
    S: Persistence,
    P: Presenter,
{
    pub fn new(model: Arc<M>, store: S, presenter: P) -> Self {
        Self {
            model,
            store,
            presenter,
            timeout: None,
            tree: None,
            axis: AxisState::Idle,
            request: None,
            measures: Vec::new(),
            displayed: None,
            in_flight: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn axis_state(&self) -> &AxisState {
        &self.axis
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn displayed(&self) -> Option<&DisplayedGraphs> {
        self.displayed.as_ref()
    }

    pub fn tree(&self) -> Option<&MetadataTree> {
        self.tree.as_deref()
    }

    pub fn is_query_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn choices(&self) -> Choices {
        self.tree
            .as_deref()
            .map(|tree| self.axis.choices(tree))
            .unwrap_or_default()
    }

    /// Applies one command, reporting any failure to the presenter.
    pub async fn dispatch(&mut self, command: Command) {
        debug!("Dispatching {:?}", command);
        if let Err(e) = self.apply(command).await {
            self.report(e);
        }
    }

    async fn apply(&mut self, command: Command) -> Result<(), ControllerError> {
        match command {
            Command::Connect { connection, init } => self.connect(connection, init).await,
            Command::CubeSelected(name) => self.select_cube(&name),
            Command::OpenAxis { axis } => self.open_axis(axis.as_ref()),
            Command::DimensionSelected(name) => {
                self.select_dimension(&name);
                Ok(())
            }
            Command::HierarchySelected(name) => {
                self.select_hierarchy(&name);
                Ok(())
            }
            Command::LevelSelected(name) => {
                self.select_level(&name);
                Ok(())
            }
            Command::ValuesSelected(values) => self.select_values(values),
            Command::MeasureToggled { key, enabled } => self.toggle_measure(&key, enabled),
            Command::Commit => self.commit(),
            Command::SaveViewState => self.save_view_state(),
            Command::RestoreViewState => self.restore_view_state(),
            Command::Disconnect => {
                self.disconnect().await;
                Ok(())
            }
        }
    }

    /// Serves commands until the channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Self {
        loop {
            tokio::select! {
                joined = next_outcome(&mut self.in_flight) => self.finish_query(joined),
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => break,
                },
            }
        }
        self.cancel_query();
        self
    }

    /// Returns false when no query was in flight.
    pub async fn await_query(&mut self) -> bool {
        if self.in_flight.is_none() {
            return false;
        }
        let joined = next_outcome(&mut self.in_flight).await;
        self.finish_query(joined);
        true
    }

    async fn connect(
        &mut self,
        connection: ConnectionDescriptor,
        init: InitDescriptor,
    ) -> Result<(), ControllerError> {
        let tree = self.model.connect(&connection, &init).await?;
        info!(
            "Connected '{}' with {} cube(s)",
            connection.name,
            tree.cubes().count()
        );

        if let Err(e) = self.store.remember_connection(connection) {
            warn!("Could not remember connection: {}", e);
        }

        self.cancel_query();
        self.tree = Some(Arc::new(tree));
        self.axis = AxisState::Idle;
        self.request = None;
        self.measures.clear();
        self.displayed = None;

        let cubes = self.tree.as_deref().map(|t| t.cube_names()).unwrap_or_default();
        self.presenter.show_cubes(&cubes);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.cancel_query();
        self.model.disconnect().await;
        self.tree = None;
        self.axis = AxisState::Idle;
        self.request = None;
        self.measures.clear();
        self.displayed = None;
        self.presenter.show_cubes(&[]);
        self.publish(ChoiceLevel::Dimensions);
        info!("Session disconnected");
    }

    /// Switching cubes drops the request and any query in flight.
    fn select_cube(&mut self, name: &str) -> Result<(), ControllerError> {
        let tree = self.tree.clone().ok_or(ControllerError::NotConnected)?;
        let Some(cube) = tree.get_cube(name) else {
            warn!("Ignoring selection of unknown cube '{}'", name);
            return Ok(());
        };

        self.cancel_query();
        self.axis = AxisState::with_cube(name);
        self.request = None;
        self.measures = cube.measure_types().cloned().collect();
        self.displayed = None;
        info!("Selected cube '{}'", name);

        self.publish(ChoiceLevel::Dimensions);
        self.populate_selection_tree();
        Ok(())
    }

    fn open_axis(&mut self, axis: Option<&AxisName>) -> Result<(), ControllerError> {
        let cube = self
            .axis
            .cube()
            .ok_or(ControllerError::NoCubeSelected)?
            .to_string();

        let committed = axis.and_then(|a| {
            self.request
                .as_ref()
                .and_then(|r| r.constraint_for(&a.dimension, &a.hierarchy))
                .cloned()
        });

        self.axis = match committed {
            Some(constraint) => {
                debug!("Reopening axis {}/{}", constraint.dimension(), constraint.hierarchy());
                AxisState::ValuesChosen {
                    cube,
                    dimension: constraint.dimension().to_string(),
                    hierarchy: constraint.hierarchy().to_string(),
                    level: constraint.level().to_string(),
                    values: constraint.values().to_vec(),
                }
            }
            None => AxisState::with_cube(&cube),
        };

        self.publish(ChoiceLevel::Dimensions);
        if self.axis.level().is_some() {
            self.populate_selection_tree();
        }
        Ok(())
    }

    fn select_dimension(&mut self, name: &str) {
        let next = self
            .active_cube()
            .and_then(|cube| self.axis.with_dimension(cube, name));
        self.transition(next, ChoiceLevel::Hierarchies, "dimension", name);
    }

    fn select_hierarchy(&mut self, name: &str) {
        let next = self
            .active_cube()
            .and_then(|cube| self.axis.with_hierarchy(cube, name));
        self.transition(next, ChoiceLevel::Levels, "hierarchy", name);
    }

    fn select_level(&mut self, name: &str) {
        let next = self
            .active_cube()
            .and_then(|cube| self.axis.with_level(cube, name));
        if self.transition(next, ChoiceLevel::Values, "level", name) {
            self.populate_selection_tree();
        }
    }

    fn select_values(&mut self, values: Vec<String>) -> Result<(), ControllerError> {
        let Some((tree, axis)) = self.tree.clone().zip(self.axis.edited_axis()) else {
            debug!("Ignoring values without a chosen level");
            return Ok(());
        };
        let Some(cube) = self.axis.cube().and_then(|c| tree.get_cube(c)) else {
            return Ok(());
        };

        let selectable =
            projection::selectable_values(cube, axis, self.request.iter().flat_map(|r| r.constraints()));
        let (kept, dropped): (Vec<String>, Vec<String>) =
            values.into_iter().partition(|v| selectable.contains(v));
        if let Some(next) = self.axis.with_values(kept) {
            self.axis = next;
        }
        if dropped.is_empty() {
            Ok(())
        } else {
            Err(ControllerError::UnselectableValues(dropped))
        }
    }

    fn toggle_measure(&mut self, key: &str, enabled: bool) -> Result<(), ControllerError> {
        let cube = self.active_cube().ok_or(ControllerError::NoCubeSelected)?;
        let measure = cube
            .get_measure_type(key)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownMeasure(key.to_string()))?;

        if enabled {
            if !self.measures.contains(&measure) {
                self.measures.push(measure.clone());
            }
            if let Some(request) = self.request.as_mut() {
                request.add_measure_type(measure);
            }
        } else {
            self.measures.retain(|m| m.key != key);
            if let Some(request) = self.request.as_mut() {
                request.remove_measure_type(key);
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ControllerError> {
        let Some(axis) = self.axis.edited_axis() else {
            debug!("Commit without a chosen level, nothing to add");
            return Ok(());
        };
        let tree = self.tree.clone().ok_or(ControllerError::NotConnected)?;
        let cube = self
            .axis
            .cube()
            .and_then(|c| tree.get_cube(c))
            .ok_or(ControllerError::NoCubeSelected)?;

        let constraint = Constraint::new(
            cube,
            axis.dimension,
            axis.hierarchy,
            axis.level,
            self.axis.values().iter().cloned(),
        )?;

        let measures = &self.measures;
        let request = self.request.get_or_insert_with(|| {
            let mut request = Request::new(cube);
            for measure in measures {
                request.add_measure_type(measure.clone());
            }
            request
        });
        if let Some(replaced) = request.add_constraint(constraint) {
            debug!("Replaced constraint on level '{}'", replaced.level());
        }

        request.validate(cube)?;
        let submitted = request.clone();

        self.populate_selection_tree();
        self.submit(submitted);
        Ok(())
    }

    fn submit(&mut self, request: Request) {
        if let Some(previous) = self.in_flight.take() {
            debug!("Superseding query in flight");
            previous.abort();
        }

        info!(
            "Submitting request on '{}' with {} constraint(s)",
            request.cube(),
            request.len()
        );
        let model = Arc::clone(&self.model);
        let timeout = self.timeout;
        self.in_flight = Some(tokio::spawn(async move {
            execute(model, request, timeout).await
        }));
    }

    fn finish_query(&mut self, joined: Result<QueryOutcome, JoinError>) {
        match joined {
            Ok(Ok((graphs, elapsed))) => {
                info!("Query returned {} graph(s) in {:?}", graphs.len(), elapsed);
                self.presenter.show_graphs(&graphs, elapsed);
                self.displayed = Some(DisplayedGraphs { graphs, elapsed });
            }
            Ok(Err(e)) => self.report(e.into()),
            Err(e) if e.is_cancelled() => debug!("Query cancelled"),
            Err(e) => self.report(ControllerError::QueryAborted(e.to_string())),
        }
    }

    fn cancel_query(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!("Cancelling query in flight");
            handle.abort();
        }
    }

    fn save_view_state(&mut self) -> Result<(), ControllerError> {
        let cube = self.axis.cube().ok_or(ControllerError::NoCubeSelected)?;
        let state = ViewState {
            cube: cube.to_string(),
            constraints: self
                .request
                .iter()
                .flat_map(|r| r.constraints().map(SavedConstraint::from))
                .collect(),
            measures: self.measures.iter().map(|m| m.key.clone()).collect(),
        };
        self.store.save(VIEW_STATE_KEY, &state)?;
        info!("Saved view of cube '{}'", state.cube);
        Ok(())
    }

    /// Entries that no longer resolve are reported and skipped.
    fn restore_view_state(&mut self) -> Result<(), ControllerError> {
        let Some(state) = self.store.load::<ViewState>(VIEW_STATE_KEY)? else {
            info!("No saved view to restore");
            return Ok(());
        };
        let tree = self.tree.clone().ok_or(ControllerError::NotConnected)?;
        let cube = tree
            .get_cube(&state.cube)
            .ok_or_else(|| ControllerError::UnknownCube(state.cube.clone()))?;

        self.select_cube(&state.cube)?;

        self.measures = state
            .measures
            .iter()
            .filter_map(|key| cube.get_measure_type(key).cloned())
            .collect();

        let mut request = Request::new(cube);
        for measure in &self.measures {
            request.add_measure_type(measure.clone());
        }
        for saved in &state.constraints {
            match restore_constraint(cube, saved) {
                Ok(constraint) => {
                    request.add_constraint(constraint);
                }
                Err(e) => self.report(e.into()),
            }
        }

        if request.is_empty() {
            return Ok(());
        }
        self.request = Some(request.clone());
        self.populate_selection_tree();
        self.submit(request);
        Ok(())
    }

    fn active_cube(&self) -> Option<&Cube> {
        self.tree.as_deref()?.get_cube(self.axis.cube()?)
    }

    fn transition(
        &mut self,
        next: Option<AxisState>,
        from: ChoiceLevel,
        what: &str,
        name: &str,
    ) -> bool {
        match next {
            Some(next) => {
                self.axis = next;
                self.publish(from);
                true
            }
            None => {
                debug!("Ignoring {} '{}' in state {:?}", what, name, self.axis);
                false
            }
        }
    }

    fn publish(&mut self, from: ChoiceLevel) {
        let choices = self.choices();
        if from <= ChoiceLevel::Dimensions {
            self.presenter.show_dimensions(&choices.dimensions);
        }
        if from <= ChoiceLevel::Hierarchies {
            self.presenter.show_hierarchies(&choices.hierarchies);
        }
        if from <= ChoiceLevel::Levels {
            self.presenter.show_levels(&choices.levels);
        }
        self.presenter.show_values(&choices.values);
    }

    fn populate_selection_tree(&mut self) {
        let Some(cube) = self.active_cube() else {
            return;
        };
        let nodes = projection::project(
            cube,
            self.axis.edited_axis(),
            self.request.iter().flat_map(|r| r.constraints()),
        );

        for node in &nodes {
            let parent = node.parent.map(|id| &nodes[id]);
            self.presenter.populate_selection_node(parent, node);
        }
        self.presenter.selection_population_done();
    }

    fn report(&mut self, e: ControllerError) {
        error!("{}", e);
        self.presenter.show_error(&e.to_string());
    }
}

fn restore_constraint(cube: &Cube, saved: &SavedConstraint) -> Result<Constraint, RequestError> {
    Constraint::new(
        cube,
        &saved.dimension,
        &saved.hierarchy,
        &saved.level,
        saved.values.iter().cloned(),
    )
}

async fn execute<M: ExecutionModel>(
    model: Arc<M>,
    request: Request,
    timeout: Option<Duration>,
) -> QueryOutcome {
    let started = Instant::now();
    let graphs = match timeout {
        Some(limit) => tokio::time::timeout(limit, model.execute(&request))
            .await
            .map_err(|_| DataStoreError::Timeout(limit))??,
        None => model.execute(&request).await?,
    };
    Ok((graphs, started.elapsed()))
}

async fn next_outcome(
    in_flight: &mut Option<JoinHandle<QueryOutcome>>,
) -> Result<QueryOutcome, JoinError> {
    match in_flight.as_mut() {
        Some(handle) => {
            let joined = handle.await;
            *in_flight = None;
            joined
        }
        None => std::future::pending().await,
    }
}

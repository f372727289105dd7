//! The two-solve diet run.
//!
//! ```text
//! Uninitialized -> ModelBuilt -> FirstSolved -> ConstraintAdded -> SecondSolved -> Disposed
//! ```
//!
//! The orchestrator owns the solver session and the model for the whole run. Both
//! are dropped when it is consumed by [`SolveOrchestrator::finish`], or when it goes
//! out of scope after a failed step, so they are released exactly once on every path.

use tracing::info;

use crate::data::ProblemData;
use crate::error::{DietError, ModelError};
use crate::lp_solver::{LPModel, LPSolution, LpSession, OptimizationSense, OptimizationStatus};
use crate::report::LineSink;

use super::DietModel;
use super::builder::{DietModelBuilder, FoodLimit};

pub const MODEL_NAME: &str = "diet";

const INITIAL_SOLVE_LABEL: &str = "initial model";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Uninitialized,
    ModelBuilt,
    FirstSolved,
    ConstraintAdded,
    SecondSolved,
    Disposed,
}

/// What one solve produced, kept for the table report.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub label: String,
    pub status: OptimizationStatus,
    /// `None` unless the solve was optimal
    pub cost: Option<f64>,
    pub buy: Vec<(String, f64)>,
    pub nutrition: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub backend: &'static str,
    pub outcomes: Vec<SolveOutcome>,
}

pub struct SolveOrchestrator<S: LpSession> {
    session: S,
    builder: DietModelBuilder<DietModel>,
    model: Option<LPModel<DietModel>>,
    state: RunState,
    next_label: String,
    outcomes: Vec<SolveOutcome>,
}

impl<S: LpSession> SolveOrchestrator<S> {
    pub fn new(session: S, data: ProblemData) -> Self {
        Self {
            session,
            builder: DietModelBuilder::new(data),
            model: None,
            state: RunState::Uninitialized,
            next_label: INITIAL_SOLVE_LABEL.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn with_limit(mut self, limit: FoodLimit) -> Self {
        self.builder = self.builder.with_limit(limit);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn builder(&self) -> &DietModelBuilder<DietModel> {
        &self.builder
    }

    pub fn model(&self) -> Option<&LPModel<DietModel>> {
        self.model.as_ref()
    }

    fn require(&self, action: &'static str, expected: RunState) -> Result<(), ModelError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ModelError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    /// Create the model, register nutrition then buy variables, minimise the
    /// cost of the food bought and tie the nutrition totals to it.
    pub fn build_model(&mut self) -> Result<(), DietError> {
        self.require("build the model", RunState::Uninitialized)?;

        let mut model = self.session.create_model::<DietModel>(MODEL_NAME);
        self.builder.setup_nutrition_variables(&mut model);
        self.builder.setup_buy_variables(&mut model);
        model.set_objective(self.builder.objective()?, OptimizationSense::Minimize);
        self.builder.add_nutrition_constraints(&mut model)?;

        info!(
            backend = self.session.backend_name(),
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            "diet model built"
        );
        self.model = Some(model);
        self.state = RunState::ModelBuilt;
        Ok(())
    }

    /// Solve the model as it stands and report the outcome.
    ///
    /// An optimal solve reports `"\nCost: <value>"` followed by the Buy and
    /// Nutrition groups. Any other status reports `"No solution"` and is not an
    /// error; only a failing session is.
    pub fn solve_and_report<L: LineSink + ?Sized>(
        &mut self,
        sink: &mut L,
    ) -> Result<LPSolution<DietModel>, DietError> {
        let next = match self.state {
            RunState::ModelBuilt => RunState::FirstSolved,
            RunState::ConstraintAdded => RunState::SecondSolved,
            state => {
                return Err(ModelError::InvalidTransition {
                    action: "solve",
                    state,
                }
                .into());
            }
        };
        let model = self.model.as_ref().ok_or(ModelError::InvalidTransition {
            action: "solve",
            state: self.state,
        })?;

        let solution = self.session.solve(model)?;
        info!(
            status = ?solution.status,
            constraints = model.constraints().len(),
            "solve finished"
        );

        let label = std::mem::take(&mut self.next_label);
        let outcome = if solution.is_optimal() {
            sink.emit(&format!("\nCost: {}", solution.objective_value))?;
            self.builder.write_results(&solution, sink)?;

            let reported = |group: Option<&super::VariableGroup<DietModel>>| {
                group
                    .map(|group| group.reported_values(&solution))
                    .unwrap_or_default()
            };
            SolveOutcome {
                label,
                status: solution.status,
                cost: Some(solution.objective_value),
                buy: reported(self.builder.buy()),
                nutrition: reported(self.builder.nutrition()),
            }
        } else {
            sink.emit("No solution")?;
            SolveOutcome {
                label,
                status: solution.status,
                cost: None,
                buy: Vec::new(),
                nutrition: Vec::new(),
            }
        };

        self.outcomes.push(outcome);
        self.state = next;
        Ok(solution)
    }

    /// Announce the food limit, then append it to the model.
    pub fn add_extra_constraint<L: LineSink + ?Sized>(
        &mut self,
        sink: &mut L,
    ) -> Result<(), DietError> {
        self.require("add a constraint", RunState::FirstSolved)?;
        let model = self.model.as_mut().ok_or(ModelError::InvalidTransition {
            action: "add a constraint",
            state: self.state,
        })?;

        let announcement = self.builder.limit().announcement();
        sink.emit(&announcement)?;
        self.builder.add_extra_constraint(model)?;

        info!(constraint = self.builder.limit().name(), "constraint added");
        self.next_label = announcement;
        self.state = RunState::ConstraintAdded;
        Ok(())
    }

    /// Release the model and the session, returning what was solved.
    pub fn finish(self) -> RunSummary {
        let Self {
            session,
            model,
            state,
            outcomes,
            ..
        } = self;
        let backend = session.backend_name();

        drop(model);
        drop(session);
        info!(from = ?state, to = ?RunState::Disposed, backend, "solver resources released");

        RunSummary { backend, outcomes }
    }

    /// Build, solve, limit, solve again, release.
    pub fn run<L: LineSink + ?Sized>(mut self, sink: &mut L) -> Result<RunSummary, DietError> {
        self.build_model()?;
        self.solve_and_report(sink)?;
        self.add_extra_constraint(sink)?;
        self.solve_and_report(sink)?;
        Ok(self.finish())
    }
}

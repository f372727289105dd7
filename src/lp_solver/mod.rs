//! Linear programs and the solver backends that solve them.
//!
//! An [`LpSession`] is one connection to a backend. It hands out [`LPModel`]s: plain
//! values holding named variables, an append-only list of named constraints and an
//! objective. A session solves a model by reference, so a model can gain constraints
//! after a solve and be solved again on the same session:
//!
//! ```rust,no_run
//! use dietlp::constraint;
//! use dietlp::lp_solver::{LpSession, OptimizationSense, OptimizationStatus, SolverBackend};
//!
//! # fn main() -> Result<(), dietlp::lp_solver::SolverError> {
//! struct Snack;
//!
//! let mut session = SolverBackend::from_env_or_default()?.open()?;
//! let mut model = session.create_model::<Snack>("snack");
//! let apple = model.add_variable("apple", 0.0, f64::INFINITY, 0.4);
//! let nuts = model.add_variable("nuts", 0.0, f64::INFINITY, 0.9);
//! model.set_objective(apple + 2.0 * nuts, OptimizationSense::Minimize);
//! model.add_constraint(constraint!("servings", (apple + nuts) >= 4.0));
//!
//! let first = session.solve(&model)?;
//! assert_eq!(first.status, OptimizationStatus::Optimal);
//!
//! model.add_constraint(constraint!("few_apples", (apple) <= 1.0));
//! let second = session.solve(&model)?;
//! # Ok(())
//! # }
//! ```
//!
//! Backend resources live in the session and are freed when it is dropped.
//!
//! Handles are branded: [`VariableId`], [`LinearExpression`], [`Constraint`],
//! [`LPModel`] and [`LPSolution`] carry a zero-sized `Brand` parameter, so a variable
//! of one model does not type-check in a constraint or solution of another. The
//! [`lp_model!`](crate::lp_model) macro makes a fresh brand per call.
//!
//! Expressions are written with `+`, `-`, scalar `*` and `Sum`; see [`ops`]. A
//! variable listed twice in one expression is summed into one coefficient before a
//! backend sees it, and the expression constant ends up on the right-hand side.
//!
//! The backend comes from `--solver` or the `DIETLP_SOLVER` environment variable
//! (`microlp`, or `coin_cbc`/`cbc`). Unset, microlp is used when compiled in, else CBC.

use std::env;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

#[cfg(not(any(feature = "microlp", feature = "coin_cbc")))]
compile_error!("enable at least one LP solver backend feature: `microlp` or `coin_cbc`");

/// Environment variable consulted by [`SolverBackend::from_env_or_default`].
pub const SOLVER_ENV_VAR: &str = "DIETLP_SOLVER";

/// How a constraint row relates its expression to the right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEqual,
    Equal,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationSense {
    #[default]
    Minimize,
    Maximize,
}

/// Terminal state of a solve. Only `Optimal` comes with variable values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped without a verdict; the text says why
    Other(&'static str),
}

/// Failures of the solver session itself.
///
/// An infeasible or unbounded model is not an error; it is reported through
/// [`OptimizationStatus`]. Errors carry a numeric code and a message so the
/// top-level driver can report them without knowing the backend.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("LP solver backend `{backend}` is not available: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("{backend} failed with code {code}: {message}")]
    Session {
        backend: &'static str,
        code: i32,
        message: String,
    },

    #[error("variable {id} is not registered in model `{model}`")]
    UnknownVariable { id: usize, model: String },
}

impl SolverError {
    pub const UNAVAILABLE: i32 = 1;
    pub const UNKNOWN_VARIABLE: i32 = 2;
    pub const INTERNAL: i32 = 3;

    /// Numeric code of the failure
    pub fn code(&self) -> i32 {
        match self {
            SolverError::Unavailable { .. } => Self::UNAVAILABLE,
            SolverError::Session { code, .. } => *code,
            SolverError::UnknownVariable { .. } => Self::UNKNOWN_VARIABLE,
        }
    }
}

/// Backends compiled into this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    #[cfg(feature = "microlp")]
    MicroLp,
    #[cfg(feature = "coin_cbc")]
    CoinCbc,
}

impl SolverBackend {
    /// Parse a backend name as accepted by `--solver` and `DIETLP_SOLVER`
    pub fn from_name(solver_name: &str) -> Result<Self, SolverError> {
        match solver_name.to_lowercase().as_str() {
            "microlp" => {
                #[cfg(feature = "microlp")]
                return Ok(SolverBackend::MicroLp);
                #[cfg(not(feature = "microlp"))]
                return Err(SolverError::Unavailable {
                    backend: solver_name.to_string(),
                    reason: "microlp feature not enabled".to_string(),
                });
            }
            "coin_cbc" | "coin-cbc" | "cbc" => {
                #[cfg(feature = "coin_cbc")]
                return Ok(SolverBackend::CoinCbc);
                #[cfg(not(feature = "coin_cbc"))]
                return Err(SolverError::Unavailable {
                    backend: solver_name.to_string(),
                    reason: "coin_cbc feature not enabled".to_string(),
                });
            }
            _ => Err(SolverError::Unavailable {
                backend: solver_name.to_string(),
                reason: "valid options are microlp, coin_cbc".to_string(),
            }),
        }
    }

    /// `DIETLP_SOLVER` when set, otherwise the first compiled-in backend
    pub fn from_env_or_default() -> Result<Self, SolverError> {
        if let Ok(solver_name) = env::var(SOLVER_ENV_VAR) {
            return Self::from_name(&solver_name);
        }

        // microlp first, then CBC
        #[cfg(feature = "microlp")]
        return Ok(SolverBackend::MicroLp);

        #[allow(unreachable_code)]
        #[cfg(feature = "coin_cbc")]
        return Ok(SolverBackend::CoinCbc);
    }

    /// Open a session on this backend
    pub fn open(self) -> Result<Session, SolverError> {
        debug!(backend = ?self, "opening LP solver session");
        match self {
            #[cfg(feature = "microlp")]
            SolverBackend::MicroLp => Ok(Session::MicroLp(microlp::MicroLpSession::new())),

            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => Ok(Session::CoinCbc(coin_cbc::CbcSession::new()?)),
        }
    }
}

/// Capability interface every LP solver backend provides.
///
/// The session owns whatever native resources the backend needs; they are released
/// when the session is dropped.
pub trait LpSession {
    /// Short backend name used in logs and errors
    fn backend_name(&self) -> &'static str;

    /// Create an empty model bound to this session
    fn create_model<Brand>(&mut self, name: &str) -> LPModel<Brand> {
        LPModel::new(name)
    }

    /// Solve the model in its current state.
    ///
    /// Infeasible and unbounded models produce a solution with the matching status;
    /// `Err` is reserved for failures of the session itself.
    fn solve<Brand>(&mut self, model: &LPModel<Brand>) -> Result<LPSolution<Brand>, SolverError>;
}

/// A session on whichever backend was selected at run time
pub enum Session {
    #[cfg(feature = "microlp")]
    MicroLp(microlp::MicroLpSession),
    #[cfg(feature = "coin_cbc")]
    CoinCbc(coin_cbc::CbcSession),
}

impl LpSession for Session {
    fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "microlp")]
            Session::MicroLp(session) => session.backend_name(),
            #[cfg(feature = "coin_cbc")]
            Session::CoinCbc(session) => session.backend_name(),
        }
    }

    fn solve<Brand>(&mut self, model: &LPModel<Brand>) -> Result<LPSolution<Brand>, SolverError> {
        match self {
            #[cfg(feature = "microlp")]
            Session::MicroLp(session) => session.solve(model),
            #[cfg(feature = "coin_cbc")]
            Session::CoinCbc(session) => session.solve(model),
        }
    }
}

/// `coefficient * variable`
#[derive(Debug, Clone)]
pub struct LinearTerm<Brand> {
    pub coefficient: f64,
    pub variable: VariableId<Brand>,
}

/// Weighted sum of variables plus a constant
#[derive(Debug, Clone)]
pub struct LinearExpression<Brand> {
    pub terms: Vec<LinearTerm<Brand>>,
    pub constant: f64,
}

impl<Brand> LinearExpression<Brand> {
    /// An expression with no variables
    pub fn new(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// `1.0 * variable`
    pub fn from_variable(variable: VariableId<Brand>) -> Self {
        Self::scaled(variable, 1.0)
    }

    /// `coefficient * variable`
    pub fn scaled(variable: VariableId<Brand>, coefficient: f64) -> Self {
        Self {
            terms: vec![LinearTerm {
                coefficient,
                variable,
            }],
            constant: 0.0,
        }
    }

    /// Terms as `(variable index, coefficient)` with repeated variables summed and
    /// zero coefficients dropped, in order of first appearance.
    pub fn merged_terms(&self) -> Vec<(usize, f64)> {
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            match merged.iter_mut().find(|(id, _)| *id == term.variable.id) {
                Some((_, coefficient)) => *coefficient += term.coefficient,
                None => merged.push((term.variable.id, term.coefficient)),
            }
        }
        merged.retain(|(_, coefficient)| *coefficient != 0.0);
        merged
    }
}

impl<Brand> From<VariableId<Brand>> for LinearExpression<Brand> {
    fn from(variable: VariableId<Brand>) -> Self {
        Self::from_variable(variable)
    }
}

impl<Brand> From<f64> for LinearExpression<Brand> {
    fn from(constant: f64) -> Self {
        Self::new(constant)
    }
}

/// Handle of a variable, valid only for the model that registered it.
///
/// Copy, comparison and debug output are written by hand so that `Brand` needs no
/// trait implementations of its own.
pub struct VariableId<Brand> {
    id: usize,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> VariableId<Brand> {
    /// Position of the variable in its model, in registration order
    pub fn index(&self) -> usize {
        self.id
    }
}

impl<Brand> std::fmt::Debug for VariableId<Brand> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VariableId({})", self.id)
    }
}

impl<Brand> Clone for VariableId<Brand> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Brand> Copy for VariableId<Brand> {}

impl<Brand> PartialEq for VariableId<Brand> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Brand> Eq for VariableId<Brand> {}

/// Position of a constraint in its model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintId(usize);

impl ConstraintId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One row of the model: `expression <sense> rhs`, optionally named.
///
/// Usually written with the [`constraint!`](crate::constraint) macro:
///
/// ```rust,no_run
/// use dietlp::{constraint, lp_model};
///
/// let mut model = lp_model!("lunch");
/// let soup = model.add_variable("soup", 0.0, 3.0, 1.2);
/// let bread = model.add_variable("bread", 0.0, 3.0, 0.5);
///
/// model.add_constraint(constraint!("calories", (250.0 * soup + 80.0 * bread) >= 600.0));
/// model.add_constraint(constraint!((soup - bread) <= 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct Constraint<Brand> {
    name: Option<String>,
    expression: LinearExpression<Brand>,
    sense: ConstraintSense,
    rhs: f64,
}

impl<Brand> Constraint<Brand> {
    pub fn new(
        expression: impl Into<LinearExpression<Brand>>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        Self {
            name: None,
            expression: expression.into(),
            sense,
            rhs,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn expression(&self) -> &LinearExpression<Brand> {
        &self.expression
    }

    pub fn sense(&self) -> ConstraintSense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Right-hand side with the expression constant moved across
    pub fn adjusted_rhs(&self) -> f64 {
        self.rhs - self.expression.constant
    }
}

/// Registration data of one variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub objective_coefficient: f64,
}

#[derive(Debug, Clone)]
pub struct ObjectiveInfo<Brand> {
    pub expression: LinearExpression<Brand>,
    pub sense: OptimizationSense,
}

/// Outcome of one solve. Values are indexed by variable registration order.
#[derive(Debug, Clone)]
pub struct LPSolution<Brand> {
    pub status: OptimizationStatus,
    pub objective_value: f64,
    variable_values: Vec<f64>,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> LPSolution<Brand> {
    pub fn new(status: OptimizationStatus, objective_value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status,
            objective_value,
            variable_values,
            _brand: PhantomData,
        }
    }

    /// A solution without values, for infeasible, unbounded or aborted solves
    pub fn without_values(status: OptimizationStatus, num_vars: usize) -> Self {
        Self::new(status, 0.0, vec![0.0; num_vars])
    }

    /// `None` only for a handle past the end of the model
    pub fn get_value(&self, var_id: VariableId<Brand>) -> Option<f64> {
        self.variable_values.get(var_id.id).copied()
    }

    pub fn is_optimal(&self) -> bool {
        self.status == OptimizationStatus::Optimal
    }
}

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(0);

/// Named variables, append-only constraints and one objective.
///
/// Models sharing a `Brand` can exchange handles; [`check_references`] catches a
/// handle that points past this model's variables before a backend sees it.
///
/// [`check_references`]: LPModel::check_references
pub struct LPModel<Brand> {
    id: u64,
    name: String,
    variables: Vec<VariableInfo>,
    constraints: Vec<Constraint<Brand>>,
    objective: Option<ObjectiveInfo<Brand>>,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> LPModel<Brand> {
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            _brand: PhantomData,
        }
    }

    /// Process-unique identity of this model, used by backends to cache solver state
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a continuous variable to the model.
    ///
    /// `upper_bound` may be `f64::INFINITY`. Bounds are not checked here; a
    /// backend reports inconsistent bounds when solving.
    pub fn add_variable(
        &mut self,
        name: &str,
        lower_bound: f64,
        upper_bound: f64,
        objective_coefficient: f64,
    ) -> VariableId<Brand> {
        let var_id = VariableId {
            id: self.variables.len(),
            _brand: PhantomData,
        };
        self.variables.push(VariableInfo {
            name: name.to_string(),
            lower_bound,
            upper_bound,
            objective_coefficient,
        });
        var_id
    }

    pub fn add_constraint(&mut self, constraint: Constraint<Brand>) -> ConstraintId {
        let constr_id = ConstraintId(self.constraints.len());
        self.constraints.push(constraint);
        constr_id
    }

    /// The expression replaces the objective formed by the coefficients the
    /// variables were registered with.
    pub fn set_objective(&mut self, expression: LinearExpression<Brand>, sense: OptimizationSense) {
        self.objective = Some(ObjectiveInfo { expression, sense });
    }

    pub fn variable(&self, var_id: VariableId<Brand>) -> Option<&VariableInfo> {
        self.variables.get(var_id.id)
    }

    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint<Brand>] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&ObjectiveInfo<Brand>> {
        self.objective.as_ref()
    }

    pub fn objective_sense(&self) -> OptimizationSense {
        self.objective
            .as_ref()
            .map(|objective| objective.sense)
            .unwrap_or_default()
    }

    /// Objective coefficient of every variable, indexed by registration order
    pub fn objective_coefficients(&self) -> Vec<f64> {
        match &self.objective {
            Some(objective) => {
                let mut coefficients = vec![0.0; self.variables.len()];
                for (id, coefficient) in objective.expression.merged_terms() {
                    if let Some(slot) = coefficients.get_mut(id) {
                        *slot = coefficient;
                    }
                }
                coefficients
            }
            None => self
                .variables
                .iter()
                .map(|var| var.objective_coefficient)
                .collect(),
        }
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective
            .as_ref()
            .map_or(0.0, |objective| objective.expression.constant)
    }

    /// Check that every variable referenced by constraints and objective belongs
    /// to this model
    pub fn check_references(&self) -> Result<(), SolverError> {
        let num_vars = self.variables.len();
        let constraint_terms = self
            .constraints
            .iter()
            .flat_map(|constraint| constraint.expression.terms.iter());
        let objective_terms = self
            .objective
            .iter()
            .flat_map(|objective| objective.expression.terms.iter());

        match constraint_terms
            .chain(objective_terms)
            .find(|term| term.variable.id >= num_vars)
        {
            Some(term) => Err(SolverError::UnknownVariable {
                id: term.variable.id,
                model: self.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub mod macros;
pub mod ops;

#[cfg(feature = "microlp")]
pub mod microlp;

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc;

#[cfg(feature = "coin_cbc")]
mod output_suppression;

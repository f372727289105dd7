use ::microlp::{ComparisonOp, Error, OptimizationDirection, Problem, Solution, Variable};
use tracing::debug;

use crate::lp_solver::*;

const BACKEND: &str = "microlp";

/// Solver state kept after a successful solve so that appended constraints can
/// be applied to the previous optimum instead of solving from scratch.
struct SolvedModel {
    model_id: u64,
    sense: OptimizationSense,
    objective: Vec<f64>,
    columns: Vec<Variable>,
    applied_constraints: usize,
    solution: Solution,
}

impl SolvedModel {
    fn extends<Brand>(&self, model: &LPModel<Brand>, objective: &[f64]) -> bool {
        self.model_id == model.id()
            && self.columns.len() == model.variables().len()
            && self.applied_constraints <= model.constraints().len()
            && self.sense == model.objective_sense()
            && self.objective == objective
    }
}

/// Session on the pure-Rust microlp dual simplex solver
#[derive(Default)]
pub struct MicroLpSession {
    last: Option<SolvedModel>,
}

impl MicroLpSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn solve_from_scratch<Brand>(
        &self,
        model: &LPModel<Brand>,
        objective: Vec<f64>,
    ) -> Result<Result<SolvedModel, OptimizationStatus>, SolverError> {
        let sense = model.objective_sense();
        let direction = match sense {
            OptimizationSense::Minimize => OptimizationDirection::Minimize,
            OptimizationSense::Maximize => OptimizationDirection::Maximize,
        };

        let mut problem = Problem::new(direction);
        let columns: Vec<Variable> = model
            .variables()
            .iter()
            .zip(&objective)
            .map(|(var_info, &coefficient)| {
                problem.add_var(coefficient, (var_info.lower_bound, var_info.upper_bound))
            })
            .collect();

        for constraint in model.constraints() {
            problem.add_constraint(
                lower_expression(constraint.expression(), &columns),
                comparison(constraint.sense()),
                constraint.adjusted_rhs(),
            );
        }

        debug!(
            model = model.name(),
            variables = columns.len(),
            constraints = model.constraints().len(),
            "solving from scratch"
        );

        match problem.solve() {
            Ok(solution) => Ok(Ok(SolvedModel {
                model_id: model.id(),
                sense,
                objective,
                columns,
                applied_constraints: model.constraints().len(),
                solution,
            })),
            Err(err) => failed_status(err).map(Err),
        }
    }

    fn apply_new_constraints<Brand>(
        mut state: SolvedModel,
        model: &LPModel<Brand>,
    ) -> Result<Result<SolvedModel, OptimizationStatus>, SolverError> {
        let pending = &model.constraints()[state.applied_constraints..];
        debug!(
            model = model.name(),
            pending = pending.len(),
            "re-solving with appended constraints"
        );

        for constraint in pending {
            let expression = lower_expression(constraint.expression(), &state.columns);
            state.solution = match state.solution.add_constraint(
                expression,
                comparison(constraint.sense()),
                constraint.adjusted_rhs(),
            ) {
                Ok(solution) => solution,
                Err(err) => return failed_status(err).map(Err),
            };
            state.applied_constraints += 1;
        }

        Ok(Ok(state))
    }
}

impl LpSession for MicroLpSession {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn solve<Brand>(&mut self, model: &LPModel<Brand>) -> Result<LPSolution<Brand>, SolverError> {
        model.check_references()?;

        let objective = model.objective_coefficients();
        let outcome = match self.last.take() {
            Some(state) if state.extends(model, &objective) => {
                Self::apply_new_constraints(state, model)?
            }
            _ => self.solve_from_scratch(model, objective)?,
        };

        let state = match outcome {
            Ok(state) => state,
            Err(status) => {
                debug!(model = model.name(), ?status, "no optimal solution");
                return Ok(LPSolution::without_values(status, model.variables().len()));
            }
        };

        let variable_values = state
            .columns
            .iter()
            .map(|&column| *state.solution.var_value(column))
            .collect();
        let objective_value = state.solution.objective() + model.objective_constant();

        self.last = Some(state);

        Ok(LPSolution::new(
            OptimizationStatus::Optimal,
            objective_value,
            variable_values,
        ))
    }
}

fn comparison(sense: ConstraintSense) -> ComparisonOp {
    match sense {
        ConstraintSense::LessEqual => ComparisonOp::Le,
        ConstraintSense::Equal => ComparisonOp::Eq,
        ConstraintSense::GreaterEqual => ComparisonOp::Ge,
    }
}

/// microlp rejects a variable appearing twice in one expression, so terms are merged first
fn lower_expression<Brand>(
    expression: &LinearExpression<Brand>,
    columns: &[Variable],
) -> Vec<(Variable, f64)> {
    expression
        .merged_terms()
        .into_iter()
        .map(|(id, coefficient)| (columns[id], coefficient))
        .collect()
}

fn failed_status(err: Error) -> Result<OptimizationStatus, SolverError> {
    match err {
        Error::Infeasible => Ok(OptimizationStatus::Infeasible),
        Error::Unbounded => Ok(OptimizationStatus::Unbounded),
        Error::InternalError(message) => Err(SolverError::Session {
            backend: BACKEND,
            code: SolverError::INTERNAL,
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constraint, lp_model};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_minimize_simple_model() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("simple");
        let x = model.add_variable("x", 0.0, f64::INFINITY, 1.0);
        let y = model.add_variable("y", 0.0, 3.0, 2.0);
        model.set_objective(x + 2.0 * y, OptimizationSense::Minimize);
        model.add_constraint(constraint!("demand", (x + y) >= 4.0));

        let solution = session.solve(&model).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert_close(solution.objective_value, 4.0);
        assert_close(solution.get_value(x).unwrap(), 4.0);
        assert_close(solution.get_value(y).unwrap(), 0.0);
    }

    #[test]
    fn test_maximize_with_objective_constant() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("maximize");
        let x = model.add_variable("x", 0.0, f64::INFINITY, 0.0);
        let y = model.add_variable("y", 0.0, 3.0, 0.0);
        model.set_objective(x + 2.0 * y + 1.0, OptimizationSense::Maximize);
        model.add_constraint(constraint!((x + y) <= 4.0));
        model.add_constraint(constraint!((2.0 * x + y) >= 2.0));

        let solution = session.solve(&model).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert_close(solution.objective_value, 8.0);
        assert_close(solution.get_value(x).unwrap(), 1.0);
        assert_close(solution.get_value(y).unwrap(), 3.0);
    }

    #[test]
    fn test_appended_constraint_tightens_optimum() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("incremental");
        let x = model.add_variable("x", 0.0, f64::INFINITY, 1.0);
        let y = model.add_variable("y", 0.0, f64::INFINITY, 3.0);
        model.add_constraint(constraint!("demand", (x + y) >= 4.0));

        let first = session.solve(&model).unwrap();
        assert_close(first.objective_value, 4.0);

        model.add_constraint(constraint!("cap_x", (x) <= 1.0));
        let second = session.solve(&model).unwrap();
        assert_eq!(second.status, OptimizationStatus::Optimal);
        assert_close(second.objective_value, 10.0);
        assert_close(second.get_value(y).unwrap(), 3.0);
        assert_eq!(model.constraints().len(), 2);
    }

    #[test]
    fn test_appended_constraint_can_make_model_infeasible() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("infeasible");
        let x = model.add_variable("x", 0.0, f64::INFINITY, 1.0);
        model.add_constraint(constraint!((x) >= 4.0));
        assert!(session.solve(&model).unwrap().is_optimal());

        model.add_constraint(constraint!((x) <= 2.0));
        let solution = session.solve(&model).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);

        // The cached state was discarded, so solving again starts from scratch
        let again = session.solve(&model).unwrap();
        assert_eq!(again.status, OptimizationStatus::Infeasible);
    }

    #[test]
    fn test_unbounded_model() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("unbounded");
        let x = model.add_variable("x", 0.0, f64::INFINITY, 1.0);
        model.set_objective(x.into(), OptimizationSense::Maximize);
        model.add_constraint(constraint!((x) >= 1.0));

        let solution = session.solve(&model).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Unbounded);
    }

    #[test]
    fn test_inverted_bounds_are_reported_as_infeasible() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("bounds");
        model.add_variable("x", 5.0, 1.0, 1.0);

        let solution = session.solve(&model).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
    }

    #[test]
    fn test_changed_objective_triggers_full_solve() {
        let mut session = MicroLpSession::new();
        let mut model = lp_model!("objective");
        let x = model.add_variable("x", 0.0, 5.0, 0.0);
        let y = model.add_variable("y", 0.0, 5.0, 0.0);
        model.add_constraint(constraint!((x + y) >= 2.0));

        model.set_objective(x + 2.0 * y, OptimizationSense::Minimize);
        let first = session.solve(&model).unwrap();
        assert_close(first.get_value(x).unwrap(), 2.0);

        model.set_objective(2.0 * x + y, OptimizationSense::Minimize);
        let second = session.solve(&model).unwrap();
        assert_close(second.get_value(y).unwrap(), 2.0);
        assert_close(second.objective_value, 2.0);
    }
}

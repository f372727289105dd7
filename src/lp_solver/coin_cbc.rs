use ::coin_cbc::{Model, Sense};
use tracing::debug;

use crate::lp_solver::output_suppression::StdoutGag;
use crate::lp_solver::*;

const BACKEND: &str = "coin_cbc";

/// Round a floating-point number to a specified number of significant digits
/// This is an workaround to mask floating point errors in CBC.
fn round_to_sig_digits(value: f64, digits: u32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10_f64.powi(digits as i32 - magnitude - 1);
    (value * scale).round() / scale
}

/// Session on COIN-OR CBC. CBC has no incremental interface, so every solve
/// rebuilds the native model from the current constraint list.
pub struct CbcSession {
    solves: usize,
}

impl CbcSession {
    pub fn new() -> Result<Self, SolverError> {
        Ok(Self { solves: 0 })
    }
}

impl Drop for CbcSession {
    fn drop(&mut self) {
        debug!(solves = self.solves, "releasing CBC session");
    }
}

impl LpSession for CbcSession {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn solve<Brand>(&mut self, model: &LPModel<Brand>) -> Result<LPSolution<Brand>, SolverError> {
        model.check_references()?;
        self.solves += 1;

        // Redirect CBC's verbose output away from the report
        let _gag_handle = StdoutGag::acquire().map_err(|err| SolverError::Session {
            backend: BACKEND,
            code: SolverError::INTERNAL,
            message: format!("cannot redirect solver output: {err}"),
        })?;

        let mut cbc = Model::default();

        let objective = model.objective_coefficients();
        let columns: Vec<_> = model
            .variables()
            .iter()
            .zip(&objective)
            .map(|(var_info, &coefficient)| {
                let col = cbc.add_col();
                cbc.set_col_lower(col, var_info.lower_bound);
                cbc.set_col_upper(col, var_info.upper_bound);
                cbc.set_obj_coeff(col, coefficient);
                col
            })
            .collect();

        for constraint in model.constraints() {
            let row = cbc.add_row();

            for (id, coefficient) in constraint.expression().merged_terms() {
                cbc.set_weight(row, columns[id], coefficient);
            }

            let rhs = constraint.adjusted_rhs();
            match constraint.sense() {
                ConstraintSense::LessEqual => cbc.set_row_upper(row, rhs),
                ConstraintSense::Equal => cbc.set_row_equal(row, rhs),
                ConstraintSense::GreaterEqual => cbc.set_row_lower(row, rhs),
            }
        }

        cbc.set_obj_sense(match model.objective_sense() {
            OptimizationSense::Minimize => Sense::Minimize,
            OptimizationSense::Maximize => Sense::Maximize,
        });

        debug!(
            model = model.name(),
            variables = columns.len(),
            constraints = model.constraints().len(),
            "solving with CBC"
        );
        let solution = cbc.solve();

        let status = if solution.raw().is_proven_optimal() {
            OptimizationStatus::Optimal
        } else if solution.raw().is_proven_infeasible() {
            OptimizationStatus::Infeasible
        } else {
            OptimizationStatus::Other("CBC stopped without proving optimality")
        };

        if status != OptimizationStatus::Optimal {
            return Ok(LPSolution::without_values(status, columns.len()));
        }

        let variable_values: Vec<f64> = columns
            .iter()
            .map(|&col| round_to_sig_digits(solution.col(col), 8))
            .collect();

        let objective_value = objective
            .iter()
            .zip(&variable_values)
            .map(|(coefficient, value)| coefficient * value)
            .sum::<f64>()
            + model.objective_constant();

        Ok(LPSolution::new(
            status,
            round_to_sig_digits(objective_value, 8),
            variable_values,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::round_to_sig_digits;

    #[test]
    fn test_round_to_sig_digits() {
        assert_eq!(round_to_sig_digits(0.0, 8), 0.0);
        assert_eq!(round_to_sig_digits(11.828861111111, 4), 11.83);
        assert_eq!(round_to_sig_digits(6.9999999999, 8), 7.0);
    }
}

//! Decision variable specifications and named groups of registered variables.

use std::io;

use crate::data::{FoodType, NutritionCategory};
use crate::error::ModelError;
use crate::lp_solver::{LPModel, LPSolution, VariableId};
use crate::report::LineSink;

/// Solved values at or below this are solver residue and are not reported
pub const REPORT_EPSILON: f64 = 0.0001;

/// Bounds, objective coefficient and name of one continuous variable, before it
/// is registered with a model.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionVariableSpec {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub objective_coefficient: f64,
    pub name: String,
}

impl DecisionVariableSpec {
    /// Inputs are stored verbatim. `upper_bound` may be `f64::INFINITY`; inverted
    /// bounds are left for the solver to reject.
    pub fn continuous(
        lower_bound: f64,
        upper_bound: f64,
        objective_coefficient: f64,
        name: &str,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            objective_coefficient,
            name: name.to_string(),
        }
    }

    /// Total amount of one nutrient in the diet; carries no cost
    pub fn nutrition_total(category: &NutritionCategory) -> Self {
        Self::continuous(category.min_bound, category.max_bound, 0.0, &category.name)
    }

    /// Servings bought of one food, at its unit cost
    pub fn food_quantity(food: &FoodType) -> Self {
        Self::continuous(0.0, f64::INFINITY, food.unit_cost, &food.name)
    }

    pub fn register<Brand>(&self, model: &mut LPModel<Brand>) -> VariableId<Brand> {
        model.add_variable(
            &self.name,
            self.lower_bound,
            self.upper_bound,
            self.objective_coefficient,
        )
    }
}

/// Variables registered together, in the order of the specs they came from.
pub struct VariableGroup<Brand> {
    label: String,
    names: Vec<String>,
    handles: Vec<VariableId<Brand>>,
}

impl<Brand> VariableGroup<Brand> {
    pub fn create(model: &mut LPModel<Brand>, specs: &[DecisionVariableSpec], label: &str) -> Self {
        let handles = specs.iter().map(|spec| spec.register(model)).collect();
        let names = specs.iter().map(|spec| spec.name.clone()).collect();

        Self {
            label: label.to_string(),
            names,
            handles,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> &[VariableId<Brand>] {
        &self.handles
    }

    pub fn handle(&self, index: usize) -> Result<VariableId<Brand>, ModelError> {
        self.handles
            .get(index)
            .copied()
            .ok_or_else(|| ModelError::IndexOutOfRange {
                label: self.label.clone(),
                index,
                len: self.handles.len(),
            })
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Handle of the variable registered under `name`
    pub fn by_name(&self, name: &str) -> Option<VariableId<Brand>> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| self.handles[index])
    }

    /// Names and solved values worth reporting, in group order
    pub fn reported_values(&self, solution: &LPSolution<Brand>) -> Vec<(String, f64)> {
        self.names
            .iter()
            .zip(&self.handles)
            .filter_map(|(name, &handle)| {
                let value = solution.get_value(handle).unwrap_or(0.0);
                (value > REPORT_EPSILON).then(|| (name.clone(), value))
            })
            .collect()
    }

    /// Emit the group header, then one line per variable whose value exceeds
    /// [`REPORT_EPSILON`]. The header is emitted even when no line follows.
    pub fn report<L: LineSink + ?Sized>(
        &self,
        solution: &LPSolution<Brand>,
        sink: &mut L,
    ) -> io::Result<()> {
        sink.emit(&format!("\n{}:", self.label))?;
        for (name, value) in self.reported_values(solution) {
            sink.emit(&format!("{} {}", name, value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProblemData;
    use crate::lp_model;
    use crate::lp_solver::OptimizationStatus;

    fn specs(count: usize) -> Vec<DecisionVariableSpec> {
        (0..count)
            .map(|i| DecisionVariableSpec::continuous(0.0, 10.0, i as f64, &format!("v{i}")))
            .collect()
    }

    #[test]
    fn test_nutrition_total_spec_copies_category_bounds() {
        let data = ProblemData::standard();
        for category in data.categories() {
            let spec = DecisionVariableSpec::nutrition_total(category);
            assert_eq!(spec.lower_bound, category.min_bound);
            assert_eq!(spec.upper_bound, category.max_bound);
            assert_eq!(spec.objective_coefficient, 0.0);
            assert_eq!(spec.name, category.name);
        }
    }

    #[test]
    fn test_food_quantity_spec_uses_unit_cost() {
        let data = ProblemData::standard();
        for food in data.foods() {
            let spec = DecisionVariableSpec::food_quantity(food);
            assert_eq!(spec.lower_bound, 0.0);
            assert!(spec.upper_bound.is_infinite());
            assert_eq!(spec.objective_coefficient, food.unit_cost);
            assert_eq!(spec.name, food.name);
        }
    }

    #[test]
    fn test_continuous_spec_keeps_inverted_bounds() {
        let spec = DecisionVariableSpec::continuous(5.0, 1.0, 2.0, "odd");
        assert_eq!((spec.lower_bound, spec.upper_bound), (5.0, 1.0));
    }

    #[test]
    fn test_group_preserves_spec_order_for_all_sizes() {
        for count in [0, 1, 2, 7, 32] {
            let mut model = lp_model!("order");
            let specs = specs(count);
            let group = VariableGroup::create(&mut model, &specs, "Group");

            assert_eq!(group.len(), count);
            assert_eq!(group.is_empty(), count == 0);
            for (i, spec) in specs.iter().enumerate() {
                let handle = group.handle(i).unwrap();
                let info = model.variable(handle).unwrap();
                assert_eq!(info.name, spec.name);
                assert_eq!(info.objective_coefficient, spec.objective_coefficient);
                assert_eq!(group.name(i), Some(spec.name.as_str()));
            }
        }
    }

    #[test]
    fn test_handle_out_of_range() {
        let mut model = lp_model!("range");
        let group = VariableGroup::create(&mut model, &specs(3), "Buy");

        assert_eq!(
            group.handle(3),
            Err(ModelError::IndexOutOfRange {
                label: "Buy".to_string(),
                index: 3,
                len: 3
            })
        );
    }

    #[test]
    fn test_lookup_by_name() {
        let mut model = lp_model!("names");
        let group = VariableGroup::create(&mut model, &specs(4), "Buy");

        assert_eq!(group.by_name("v2"), Some(group.handle(2).unwrap()));
        assert_eq!(group.by_name("v9"), None);
    }

    #[test]
    fn test_report_suppresses_values_at_or_below_epsilon() {
        let mut model = lp_model!("report");
        let group = VariableGroup::create(&mut model, &specs(4), "Buy");
        let solution = LPSolution::new(
            OptimizationStatus::Optimal,
            0.0,
            vec![2.5, REPORT_EPSILON, 0.0, 0.00011],
        );

        let mut lines: Vec<String> = Vec::new();
        group.report(&solution, &mut lines).unwrap();

        assert_eq!(lines, vec!["\nBuy:", "v0 2.5", "v3 0.00011"]);
    }

    #[test]
    fn test_report_emits_header_without_values() {
        let mut model = lp_model!("empty");
        let group = VariableGroup::create(&mut model, &specs(2), "Nutrition");
        let solution = LPSolution::new(OptimizationStatus::Optimal, 0.0, vec![0.0, 0.0]);

        let mut lines: Vec<String> = Vec::new();
        group.report(&solution, &mut lines).unwrap();
        assert_eq!(lines, vec!["\nNutrition:"]);

        let empty = VariableGroup::create(&mut model, &[], "Nothing");
        let mut lines: Vec<String> = Vec::new();
        empty.report(&solution, &mut lines).unwrap();
        assert_eq!(lines, vec!["\nNothing:"]);
    }

    #[test]
    fn test_report_is_idempotent() {
        let mut model = lp_model!("idempotent");
        let group = VariableGroup::create(&mut model, &specs(3), "Buy");
        let solution = LPSolution::new(OptimizationStatus::Optimal, 1.0, vec![1.0, 0.5, 3.25]);

        let mut first: Vec<String> = Vec::new();
        let mut second: Vec<String> = Vec::new();
        group.report(&solution, &mut first).unwrap();
        group.report(&solution, &mut second).unwrap();
        assert_eq!(first, second);
    }
}

//! Construction of the diet LP from the nutrition tables.
//!
//! The steps are order dependent: both variable groups must be registered before
//! any constraint or the objective can refer to them. Every step borrows the model
//! it changes; the builder itself only keeps the data and the variable groups.

use itertools::Itertools;
use tracing::{debug, warn};

use crate::constraint;
use crate::data::ProblemData;
use crate::error::{DietError, ModelError};
use crate::lp_solver::{ConstraintId, LPModel, LPSolution, LinearExpression};
use crate::report::LineSink;

use super::variables::{DecisionVariableSpec, VariableGroup};

pub const NUTRITION_LABEL: &str = "Nutrition";
pub const BUY_LABEL: &str = "Buy";

/// Upper bound on the combined servings of a set of foods.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodLimit {
    name: String,
    subject: String,
    foods: Vec<String>,
    max_servings: f64,
}

impl FoodLimit {
    pub fn new(name: &str, subject: &str, foods: &[&str], max_servings: f64) -> Self {
        Self {
            name: name.to_string(),
            subject: subject.to_string(),
            foods: foods.iter().map(|food| food.to_string()).collect(),
            max_servings,
        }
    }

    /// Milk and ice cream together, at most 6 servings
    pub fn dairy() -> Self {
        Self::new("limit_dairy", "dairy", &["milk", "ice cream"], 6.0)
    }

    pub fn with_max(mut self, max_servings: f64) -> Self {
        self.max_servings = max_servings;
        self
    }

    /// Constraint name in the model
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn foods(&self) -> &[String] {
        &self.foods
    }

    pub fn max_servings(&self) -> f64 {
        self.max_servings
    }

    /// Line reported before the limit is applied
    pub fn announcement(&self) -> String {
        format!(
            "Adding constraint: at most {} servings of {}",
            self.max_servings, self.subject
        )
    }
}

impl Default for FoodLimit {
    fn default() -> Self {
        Self::dairy()
    }
}

/// Registers the variables and constraints of the diet problem on a model.
pub struct DietModelBuilder<Brand> {
    data: ProblemData,
    limit: FoodLimit,
    nutrition: Option<VariableGroup<Brand>>,
    buy: Option<VariableGroup<Brand>>,
    applied_limits: usize,
}

impl<Brand> DietModelBuilder<Brand> {
    pub fn new(data: ProblemData) -> Self {
        Self {
            data,
            limit: FoodLimit::dairy(),
            nutrition: None,
            buy: None,
            applied_limits: 0,
        }
    }

    pub fn with_limit(mut self, limit: FoodLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn data(&self) -> &ProblemData {
        &self.data
    }

    pub fn limit(&self) -> &FoodLimit {
        &self.limit
    }

    pub fn nutrition(&self) -> Option<&VariableGroup<Brand>> {
        self.nutrition.as_ref()
    }

    pub fn buy(&self) -> Option<&VariableGroup<Brand>> {
        self.buy.as_ref()
    }

    fn nutrition_group(&self) -> Result<&VariableGroup<Brand>, ModelError> {
        self.nutrition
            .as_ref()
            .ok_or(ModelError::VariablesNotRegistered(NUTRITION_LABEL))
    }

    fn buy_group(&self) -> Result<&VariableGroup<Brand>, ModelError> {
        self.buy
            .as_ref()
            .ok_or(ModelError::VariablesNotRegistered(BUY_LABEL))
    }

    /// One variable per category holding the total amount of that nutrient,
    /// bounded by the category's daily range.
    pub fn setup_nutrition_variables(&mut self, model: &mut LPModel<Brand>) -> &VariableGroup<Brand> {
        let specs: Vec<_> = self
            .data
            .categories()
            .iter()
            .map(DecisionVariableSpec::nutrition_total)
            .collect();

        debug!(count = specs.len(), "registering nutrition variables");
        self.nutrition
            .insert(VariableGroup::create(model, &specs, NUTRITION_LABEL))
    }

    /// One variable per food holding the servings bought.
    pub fn setup_buy_variables(&mut self, model: &mut LPModel<Brand>) -> &VariableGroup<Brand> {
        let specs: Vec<_> = self
            .data
            .foods()
            .iter()
            .map(DecisionVariableSpec::food_quantity)
            .collect();

        debug!(count = specs.len(), "registering buy variables");
        self.buy
            .insert(VariableGroup::create(model, &specs, BUY_LABEL))
    }

    /// Total cost of the foods bought
    pub fn objective(&self) -> Result<LinearExpression<Brand>, ModelError> {
        let buy = self.buy_group()?;

        Ok(self
            .data
            .foods()
            .iter()
            .zip_eq(buy.handles())
            .map(|(food, &servings)| food.unit_cost * servings)
            .sum())
    }

    /// Tie every nutrition total to the food bought:
    /// `sum_j content[j][i] * buy[j] - nutrition[i] == 0`, named after category `i`.
    pub fn add_nutrition_constraints(
        &self,
        model: &mut LPModel<Brand>,
    ) -> Result<Vec<ConstraintId>, ModelError> {
        let nutrition = self.nutrition_group()?;
        let buy = self.buy_group()?;

        let ids = self
            .data
            .categories()
            .iter()
            .enumerate()
            .map(|(i, category)| {
                let intake: LinearExpression<Brand> = self
                    .data
                    .foods()
                    .iter()
                    .zip_eq(buy.handles())
                    .map(|(food, &servings)| food.nutrient_content[i] * servings)
                    .sum();
                let total = nutrition.handle(i)?;

                Ok(model.add_constraint(constraint!((intake - total) == 0.0).named(&category.name)))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        debug!(count = ids.len(), "added nutrition constraints");
        Ok(ids)
    }

    /// Append the configured [`FoodLimit`]. Foods are looked up by name among the
    /// buy variables. Applying the limit again appends a second, identical row.
    pub fn add_extra_constraint(
        &mut self,
        model: &mut LPModel<Brand>,
    ) -> Result<ConstraintId, ModelError> {
        let buy = self.buy_group()?;

        let servings: LinearExpression<Brand> = self
            .limit
            .foods()
            .iter()
            .map(|food| {
                buy.by_name(food)
                    .map(LinearExpression::from_variable)
                    .ok_or_else(|| ModelError::UnknownFood(food.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .sum();

        if self.applied_limits > 0 {
            warn!(
                constraint = self.limit.name(),
                applied = self.applied_limits,
                "limit is already part of the model, adding it again"
            );
        }
        self.applied_limits += 1;

        let limit = &self.limit;
        debug!(constraint = limit.name(), max = limit.max_servings(), "adding food limit");
        Ok(model.add_constraint(
            constraint!((servings) <= limit.max_servings()).named(limit.name()),
        ))
    }

    /// Report the Buy group, then the Nutrition group
    pub fn write_results<L: LineSink + ?Sized>(
        &self,
        solution: &LPSolution<Brand>,
        sink: &mut L,
    ) -> Result<(), DietError> {
        let buy = self.buy_group()?;
        let nutrition = self.nutrition_group()?;

        buy.report(solution, sink)?;
        nutrition.report(solution, sink)?;
        Ok(())
    }
}

//! The diet problem: pick servings of foods at minimum cost while every nutrient
//! stays within its daily range.
//!
//! [`SolveOrchestrator`] runs the fixed script: build the model, solve, append a
//! [`FoodLimit`], solve again, release everything. [`DietModelBuilder`] knows how the
//! model is laid out and [`VariableGroup`] keeps the handles in data order.

pub mod builder;
pub mod orchestrator;
pub mod variables;

pub use builder::{BUY_LABEL, DietModelBuilder, FoodLimit, NUTRITION_LABEL};
pub use orchestrator::{MODEL_NAME, RunState, RunSummary, SolveOrchestrator, SolveOutcome};
pub use variables::{DecisionVariableSpec, REPORT_EPSILON, VariableGroup};

/// Brand of every variable and constraint of the diet model
#[derive(Debug)]
pub struct DietModel;

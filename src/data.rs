//! Nutrition reference tables.
//!
//! [`ProblemData`] pairs the nutrition categories with the foods on offer. Every
//! food lists its nutrient content in category order, so `food.nutrient_content[i]`
//! is the amount of `categories[i]` in one serving.

/// A nutrient with the daily range a diet must stay within.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionCategory {
    pub name: String,
    pub min_bound: f64,
    /// `f64::INFINITY` when there is no upper limit
    pub max_bound: f64,
}

impl NutritionCategory {
    pub fn new(name: &str, min_bound: f64, max_bound: f64) -> Self {
        Self {
            name: name.to_string(),
            min_bound,
            max_bound,
        }
    }
}

/// A food that can be bought by the serving.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodType {
    pub name: String,
    pub unit_cost: f64,
    pub nutrient_content: Vec<f64>,
}

impl FoodType {
    pub fn new(name: &str, unit_cost: f64, nutrient_content: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            unit_cost,
            nutrient_content: nutrient_content.to_vec(),
        }
    }
}

/// The fixed categories and foods of one diet problem.
#[derive(Debug, Clone)]
pub struct ProblemData {
    categories: Vec<NutritionCategory>,
    foods: Vec<FoodType>,
}

impl ProblemData {
    /// # Panics
    ///
    /// Panics if a food's nutrient content does not have one entry per category,
    /// or if a unit cost is negative. Both indicate a malformed table in the calling
    /// code rather than bad input.
    pub fn new(categories: Vec<NutritionCategory>, foods: Vec<FoodType>) -> Self {
        for food in &foods {
            assert_eq!(
                food.nutrient_content.len(),
                categories.len(),
                "food `{}` lists {} nutrient values for {} categories",
                food.name,
                food.nutrient_content.len(),
                categories.len()
            );
            assert!(
                food.unit_cost >= 0.0,
                "food `{}` has negative unit cost {}",
                food.name,
                food.unit_cost
            );
        }

        Self { categories, foods }
    }

    /// The compiled-in fast-food dataset
    pub fn standard() -> Self {
        let categories = vec![
            NutritionCategory::new("calories", 1800.0, 2200.0),
            NutritionCategory::new("protein", 91.0, f64::INFINITY),
            NutritionCategory::new("fat", 0.0, 65.0),
            NutritionCategory::new("sodium", 0.0, 1779.0),
        ];

        //                                           calories protein  fat   sodium
        let foods = vec![
            FoodType::new("hamburger", 2.49, &[410.0, 24.0, 26.0, 730.0]),
            FoodType::new("chicken", 2.89, &[420.0, 32.0, 10.0, 1190.0]),
            FoodType::new("hot dog", 1.50, &[560.0, 20.0, 32.0, 1800.0]),
            FoodType::new("fries", 1.89, &[380.0, 4.0, 19.0, 270.0]),
            FoodType::new("macaroni", 2.09, &[320.0, 12.0, 10.0, 930.0]),
            FoodType::new("pizza", 1.99, &[320.0, 15.0, 12.0, 820.0]),
            FoodType::new("salad", 2.49, &[320.0, 31.0, 12.0, 1230.0]),
            FoodType::new("milk", 0.89, &[100.0, 8.0, 2.5, 125.0]),
            FoodType::new("ice cream", 1.59, &[330.0, 8.0, 10.0, 180.0]),
        ];

        Self::new(categories, foods)
    }

    pub fn categories(&self) -> &[NutritionCategory] {
        &self.categories
    }

    pub fn foods(&self) -> &[FoodType] {
        &self.foods
    }

    pub fn category(&self, name: &str) -> Option<&NutritionCategory> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn food(&self, name: &str) -> Option<&FoodType> {
        self.foods.iter().find(|food| food.name == name)
    }
}

//! Arithmetic for building expressions in the usual notation.
//!
//! `+` and `-` accept anything that converts into a [`LinearExpression`]: another
//! expression, a variable handle or an `f64` constant. Scaling is written with the
//! coefficient on the left, `2.0 * x`, and expressions can be collected with `sum()`.
//!
//! ```ignore
//! let cost: LinearExpression<_> = foods.iter().zip(&servings).map(|(f, &s)| f.unit_cost * s).sum();
//! let spare = intake - cost + 1.0;
//! ```

use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

use super::{LinearExpression, VariableId};

impl<Brand, R: Into<LinearExpression<Brand>>> Add<R> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(mut self, rhs: R) -> Self::Output {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<Brand, R: Into<LinearExpression<Brand>>> Sub<R> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(mut self, rhs: R) -> Self::Output {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms.into_iter().map(|mut term| {
            term.coefficient = -term.coefficient;
            term
        }));
        self.constant -= rhs.constant;
        self
    }
}

impl<Brand, R: Into<LinearExpression<Brand>>> Add<R> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, rhs: R) -> Self::Output {
        LinearExpression::from_variable(self) + rhs
    }
}

impl<Brand, R: Into<LinearExpression<Brand>>> Sub<R> for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, rhs: R) -> Self::Output {
        LinearExpression::from_variable(self) - rhs
    }
}

impl<Brand> Mul<VariableId<Brand>> for f64 {
    type Output = LinearExpression<Brand>;

    fn mul(self, variable: VariableId<Brand>) -> Self::Output {
        LinearExpression::scaled(variable, self)
    }
}

impl<Brand> Sum for LinearExpression<Brand> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(LinearExpression::new(0.0), Add::add)
    }
}

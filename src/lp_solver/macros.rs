//! `lp_model!` and `constraint!`

/// New [`LPModel`](crate::lp_solver::LPModel) branded with a type of its own.
///
/// Handles from one model do not type-check against another:
///
/// ```rust
/// use dietlp::{constraint, lp_model};
///
/// let mut breakfast = lp_model!(Breakfast, "breakfast");
/// let mut dinner = lp_model!("dinner");
///
/// let eggs = breakfast.add_variable("eggs", 0.0, 4.0, 0.3);
/// let pasta = dinner.add_variable("pasta", 0.0, 2.0, 1.1);
///
/// breakfast.add_constraint(constraint!((eggs) <= 2.0));
/// dinner.add_constraint(constraint!((pasta) >= 0.5));
/// // dinner.add_constraint(constraint!((eggs) <= 2.0)); does not compile
/// ```
#[macro_export]
macro_rules! lp_model {
    ($brand_name:ident, $name:expr) => {{
        struct $brand_name;
        $crate::lp_solver::LPModel::<$brand_name>::new($name)
    }};

    // The struct lives in the expansion's block, so every call site gets its own type
    ($name:expr) => {{
        struct UniqueBrand;
        $crate::lp_solver::LPModel::<UniqueBrand>::new($name)
    }};
}

/// Build a [`Constraint`](crate::lp_solver::Constraint) from `(lhs) <op> rhs`, where
/// `<op>` is `==`, `<=` or `>=`. The left side must be parenthesized. A leading
/// string literal names the row.
///
/// ```rust
/// use dietlp::{constraint, lp_model};
///
/// let mut model = lp_model!("snack");
/// let apple = model.add_variable("apple", 0.0, 5.0, 0.4);
/// let nuts = model.add_variable("nuts", 0.0, 2.0, 1.3);
///
/// model.add_constraint(constraint!("fiber", (4.4 * apple + 3.5 * nuts) >= 10.0));
/// model.add_constraint(constraint!((apple - nuts) <= 3.0));
/// model.add_constraint(constraint!((apple + nuts) == 4.0));
/// ```
#[macro_export]
macro_rules! constraint {
    ($name:literal, ($lhs:expr) == $rhs:expr) => {
        $crate::constraint!(($lhs) == $rhs).named($name)
    };
    ($name:literal, ($lhs:expr) <= $rhs:expr) => {
        $crate::constraint!(($lhs) <= $rhs).named($name)
    };
    ($name:literal, ($lhs:expr) >= $rhs:expr) => {
        $crate::constraint!(($lhs) >= $rhs).named($name)
    };

    (($lhs:expr) == $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $lhs,
            $crate::lp_solver::ConstraintSense::Equal,
            $rhs as f64,
        )
    };
    (($lhs:expr) <= $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $lhs,
            $crate::lp_solver::ConstraintSense::LessEqual,
            $rhs as f64,
        )
    };
    (($lhs:expr) >= $rhs:expr) => {
        $crate::lp_solver::Constraint::new(
            $lhs,
            $crate::lp_solver::ConstraintSense::GreaterEqual,
            $rhs as f64,
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_named_brands_keep_model_names() {
        let mut lunch = lp_model!(Lunch, "lunch");
        let mut supper = lp_model!(Supper, "supper");

        let soup = lunch.add_variable("soup", 0.0, 3.0, 1.2);
        let stew = supper.add_variable("stew", 0.0, 2.0, 2.4);
        lunch.add_constraint(constraint!((soup) <= 2.0));
        supper.add_constraint(constraint!((stew) >= 1.0));

        assert_eq!(lunch.name(), "lunch");
        assert_eq!(supper.name(), "supper");
        assert_eq!(lunch.constraints().len(), 1);
        assert_eq!(supper.constraints().len(), 1);
    }

    #[test]
    fn test_named_and_unnamed_rows() {
        let mut model = lp_model!(Snack, "snack");
        let apple = model.add_variable("apple", 0.0, 5.0, 0.4);
        let nuts = model.add_variable("nuts", 0.0, 2.0, 1.3);

        model.add_constraint(constraint!((apple + nuts) == 4.0));
        model.add_constraint(constraint!("fiber", (4.4 * apple + 3.5 * nuts) >= 10.0));

        let rows = model.constraints();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name(), None);
        assert_eq!(rows[1].name(), Some("fiber"));
        assert_eq!(rows[1].rhs(), 10.0);
    }

    #[test]
    fn test_integer_rhs_is_widened() {
        let mut model = lp_model!("widen");
        let apple = model.add_variable("apple", 0.0, 5.0, 0.4);

        let c = constraint!((apple) <= 3);
        assert_eq!(c.rhs(), 3.0);
    }
}

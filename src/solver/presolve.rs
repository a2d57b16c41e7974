//! Presolve simplifications applied before the backend runs.
//!
//! Two passes: detect-and-remove fixed variables (bounds collapsed to a
//! single value), and deactivate constraints that are trivially satisfied
//! once fixed values are substituted. A trivially violated constraint
//! short-circuits the whole solve to the infeasible outcome.

use crate::model::Model;

/// Tolerance when checking a term-free constraint.
const TRIVIAL_TOL: f64 = 1e-9;

/// Reduction of one model: which variables are pinned, which constraints
/// stay active, and the right-hand sides after substituting pinned values.
#[derive(Debug)]
pub struct PresolvedModel {
    /// Per-variable pinned value, `None` for free variables.
    pub fixed: Vec<Option<f64>>,
    /// Per-constraint activity flag.
    pub active: Vec<bool>,
    /// Per-constraint right-hand side minus the constant term and all
    /// fixed-variable contributions.
    pub reduced_rhs: Vec<f64>,
    pub num_fixed: usize,
    pub num_deactivated: usize,
}

/// Outcome of the presolve passes.
#[derive(Debug)]
pub enum Presolve {
    Reduced(PresolvedModel),
    /// A constraint with no free variables left cannot hold.
    TriviallyInfeasible { constraint: String },
}

pub fn presolve(model: &Model) -> Presolve {
    let fixed: Vec<Option<f64>> = model
        .variables()
        .map(|v| if v.is_fixed() { Some(v.lower) } else { None })
        .collect();
    let num_fixed = fixed.iter().filter(|f| f.is_some()).count();

    let mut active = Vec::with_capacity(model.constraints.len());
    let mut reduced_rhs = Vec::with_capacity(model.constraints.len());
    let mut num_deactivated = 0;

    for constraint in &model.constraints {
        let mut fixed_contribution = 0.0;
        let mut has_free_term = false;
        for (var, coeff) in &constraint.expr.terms {
            match fixed[var.index()] {
                Some(value) => fixed_contribution += coeff * value,
                None => has_free_term = true,
            }
        }
        let rhs = constraint.rhs - constraint.expr.constant - fixed_contribution;

        if has_free_term {
            active.push(true);
        } else if constraint.sense.holds(0.0, rhs, TRIVIAL_TOL) {
            active.push(false);
            num_deactivated += 1;
        } else {
            return Presolve::TriviallyInfeasible { constraint: constraint.name.clone() };
        }
        reduced_rhs.push(rhs);
    }

    Presolve::Reduced(PresolvedModel {
        fixed,
        active,
        reduced_rhs,
        num_fixed,
        num_deactivated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinExpr, Model, Sense};

    #[test]
    fn fixed_variables_are_detected() {
        let mut model = Model::new("test");
        let x = model.add_binary("x".into());
        let y = model.add_binary("y".into());
        model.fix(y, 0.0);

        match presolve(&model) {
            Presolve::Reduced(pre) => {
                assert_eq!(pre.fixed[x.index()], None);
                assert_eq!(pre.fixed[y.index()], Some(0.0));
                assert_eq!(pre.num_fixed, 1);
            }
            Presolve::TriviallyInfeasible { .. } => panic!("no constraints to violate"),
        }
    }

    #[test]
    fn satisfied_term_free_constraint_is_deactivated() {
        let mut model = Model::new("test");
        let y = model.add_binary("y".into());
        model.fix(y, 1.0);
        model.add_constraint("pin_y".into(), LinExpr::term(y, 1.0), Sense::Le, 2.0);

        match presolve(&model) {
            Presolve::Reduced(pre) => {
                assert!(!pre.active[0]);
                assert_eq!(pre.num_deactivated, 1);
            }
            Presolve::TriviallyInfeasible { .. } => panic!("constraint 1 <= 2 holds"),
        }
    }

    #[test]
    fn violated_term_free_constraint_short_circuits() {
        let mut model = Model::new("test");
        let y = model.add_binary("y".into());
        model.fix(y, 0.0);
        model.add_constraint("impossible".into(), LinExpr::term(y, 1.0), Sense::Ge, 1.0);

        match presolve(&model) {
            Presolve::TriviallyInfeasible { constraint } => assert_eq!(constraint, "impossible"),
            Presolve::Reduced(_) => panic!("0 >= 1 cannot be reduced away"),
        }
    }

    #[test]
    fn fixed_contributions_move_to_the_rhs() {
        let mut model = Model::new("test");
        let x = model.add_continuous("x".into(), 0.0, f64::INFINITY);
        let y = model.add_continuous("y".into(), 0.0, f64::INFINITY);
        model.fix(y, 3.0);

        let mut expr = LinExpr::new();
        expr.add_term(x, 1.0).add_term(y, 2.0);
        model.add_constraint("mixed".into(), expr, Sense::Ge, 10.0);

        match presolve(&model) {
            Presolve::Reduced(pre) => {
                assert!(pre.active[0]);
                // x >= 10 - 2 * 3
                assert_eq!(pre.reduced_rhs[0], 4.0);
            }
            Presolve::TriviallyInfeasible { .. } => panic!("x is still free"),
        }
    }
}

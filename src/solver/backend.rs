//! Lowering of the model representation into `good_lp` backends.

use good_lp::{variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
              Variable as LpVariable};
use log::debug;

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::model::{Direction, Model, Sense, VarType};
use crate::solver::presolve::PresolvedModel;
use crate::solver::{SolveOutcome, SolvedModel};

struct Lowered {
    variables: ProblemVariables,
    lp_vars: Vec<Option<LpVariable>>,
    objective: Expression,
    constraints: Vec<good_lp::Constraint>,
}

/// Translate the reduced model into good_lp variables, objective and
/// constraints. Fixed variables are not created; their contributions were
/// already folded into the reduced right-hand sides by presolve.
fn lower(model: &Model, pre: &PresolvedModel) -> Lowered {
    let mut variables = ProblemVariables::new();
    let mut lp_vars: Vec<Option<LpVariable>> = Vec::with_capacity(model.num_variables());

    for (i, var) in model.variables().enumerate() {
        if pre.fixed[i].is_some() {
            lp_vars.push(None);
            continue;
        }
        let mut definition = variable().name(var.name.clone());
        match var.var_type {
            VarType::Binary => definition = definition.binary(),
            VarType::Integer => definition = definition.integer(),
            VarType::Continuous => {}
        }
        if var.lower.is_finite() {
            definition = definition.min(var.lower);
        }
        if var.upper.is_finite() {
            definition = definition.max(var.upper);
        }
        lp_vars.push(Some(variables.add(definition)));
    }

    let mut objective_constant = model.objective.constant;
    for (var, coeff) in &model.objective.terms {
        if let Some(value) = pre.fixed[var.index()] {
            objective_constant += coeff * value;
        }
    }
    let mut objective = Expression::from(objective_constant);
    for (var, coeff) in &model.objective.terms {
        if let Some(lp_var) = lp_vars[var.index()] {
            objective += *coeff * lp_var;
        }
    }

    let mut constraints = Vec::new();
    for (ci, cons) in model.constraints.iter().enumerate() {
        if !pre.active[ci] {
            continue;
        }
        let mut lhs = Expression::from(0.0);
        for (var, coeff) in &cons.expr.terms {
            if let Some(lp_var) = lp_vars[var.index()] {
                lhs += *coeff * lp_var;
            }
        }
        let rhs = pre.reduced_rhs[ci];
        constraints.push(match cons.sense {
            Sense::Le => lhs.leq(rhs),
            Sense::Ge => lhs.geq(rhs),
            Sense::Eq => lhs.eq(rhs),
        });
    }

    Lowered { variables, lp_vars, objective, constraints }
}

/// Reassemble the full value vector, restoring presolved-away variables.
fn extract<S: Solution>(
    model: &Model,
    pre: &PresolvedModel,
    lp_vars: &[Option<LpVariable>],
    solution: &S,
) -> SolvedModel {
    let values: Vec<f64> = (0..model.num_variables())
        .map(|i| match (pre.fixed[i], lp_vars[i]) {
            (Some(value), _) => value,
            (None, Some(lp_var)) => solution.value(lp_var),
            (None, None) => 0.0,
        })
        .collect();
    let objective = model.objective_value(&values);
    SolvedModel { values, objective }
}

pub(crate) fn solve_microlp(
    model: &Model,
    pre: &PresolvedModel,
    config: &SolverConfig,
) -> Result<SolveOutcome, SolverError> {
    if config.time_limit_secs.is_finite() {
        debug!("[ModelSolver] microlp does not support a time limit; option ignored.");
    }

    let Lowered { variables, lp_vars, objective, constraints } = lower(model, pre);
    let problem = match model.direction {
        Direction::Minimise => variables.minimise(objective),
        Direction::Maximise => variables.maximise(objective),
    };
    let mut lp = problem.using(good_lp::microlp);
    for c in constraints {
        lp = lp.with(c);
    }

    match lp.solve() {
        Ok(solution) => Ok(SolveOutcome::Optimal(extract(model, pre, &lp_vars, &solution))),
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
        Err(other) => Err(SolverError::UnrecognisedStatus(other.to_string())),
    }
}

#[cfg(feature = "cbc")]
pub(crate) fn solve_cbc(
    model: &Model,
    pre: &PresolvedModel,
    config: &SolverConfig,
) -> Result<SolveOutcome, SolverError> {
    let Lowered { variables, lp_vars, objective, constraints } = lower(model, pre);
    let problem = match model.direction {
        Direction::Minimise => variables.minimise(objective),
        Direction::Maximise => variables.maximise(objective),
    };
    let mut lp = problem.using(good_lp::coin_cbc);
    lp.set_parameter("ratioGap", &config.ratio_gap.to_string());
    lp.set_parameter("seconds", &config.time_limit_secs.to_string());
    lp.set_parameter("nodeStrategy", config.node_strategy.as_cbc_option());
    for c in constraints {
        lp = lp.with(c);
    }

    match lp.solve() {
        Ok(solution) => Ok(SolveOutcome::Optimal(extract(model, pre, &lp_vars, &solution))),
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
        Err(other) => {
            // CBC reports hitting its `seconds` limit as an aborted run;
            // good_lp does not expose the incumbent, so none is surfaced.
            let message = other.to_string();
            let lowered = message.to_ascii_lowercase();
            if lowered.contains("abort") || lowered.contains("stopped") || lowered.contains("time")
            {
                Ok(SolveOutcome::TimeLimit { best: None })
            } else {
                Err(SolverError::Backend(message))
            }
        }
    }
}

//! Solver-agnostic representation of a mixed-integer program.
//!
//! The formulation builders emit this intermediate form; the solver adapter
//! lowers it into whichever backend is configured. Keeping the model
//! backend-free is what makes the presolve passes and the structural tests
//! possible without a solver in the loop.

use std::fmt;

/// Handle to a decision variable inside one [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Continuous,
    Integer,
    Binary,
}

/// A decision variable with bounds. `upper` may be `f64::INFINITY`.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub var_type: VarType,
    pub lower: f64,
    pub upper: f64,
}

impl Variable {
    /// A variable whose bounds have collapsed to a single value.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }
}

/// Linear expression `sum(coeff * var) + constant`.
///
/// Terms may repeat a variable; consumers sum duplicate coefficients.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        LinExpr::default()
    }

    /// Single-term expression.
    pub fn term(var: VarId, coeff: f64) -> Self {
        LinExpr { terms: vec![(var, coeff)], constant: 0.0 }
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Evaluate against a full value vector indexed by [`VarId`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

/// Relation of a constraint's left-hand side to its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    /// Whether `lhs (sense) rhs` holds within `tol`.
    pub fn holds(self, lhs: f64, rhs: f64, tol: f64) -> bool {
        match self {
            Sense::Le => lhs <= rhs + tol,
            Sense::Ge => lhs >= rhs - tol,
            Sense::Eq => (lhs - rhs).abs() <= tol,
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "=="),
        }
    }
}

/// A named linear constraint `expr (sense) rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// Objective direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimise,
    Maximise,
}

/// One complete MIP: variables, constraints and a linear objective.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: LinExpr,
    pub direction: Direction,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Model {
            name: name.to_string(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinExpr::new(),
            direction: Direction::Minimise,
        }
    }

    pub fn add_continuous(&mut self, name: String, lower: f64, upper: f64) -> VarId {
        self.add_variable(name, VarType::Continuous, lower, upper)
    }

    pub fn add_integer(&mut self, name: String, lower: f64, upper: f64) -> VarId {
        self.add_variable(name, VarType::Integer, lower, upper)
    }

    pub fn add_binary(&mut self, name: String) -> VarId {
        self.add_variable(name, VarType::Binary, 0.0, 1.0)
    }

    fn add_variable(&mut self, name: String, var_type: VarType, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable { name, var_type, lower, upper });
        id
    }

    /// Collapse a variable's bounds to a single value. Presolve removes it
    /// from the problem handed to the backend.
    pub fn fix(&mut self, var: VarId, value: f64) {
        let v = &mut self.variables[var.index()];
        v.lower = value;
        v.upper = value;
    }

    pub fn add_constraint(&mut self, name: String, expr: LinExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint { name, expr, sense, rhs });
    }

    pub fn set_objective(&mut self, direction: Direction, objective: LinExpr) {
        self.direction = direction;
        self.objective = objective;
    }

    #[inline]
    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    #[inline]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Objective value for a full value vector, including any constant term.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Human-readable size summary for logging.
    pub fn size_summary(&self) -> String {
        let binary = self.variables.iter().filter(|v| v.var_type == VarType::Binary).count();
        let integer = self.variables.iter().filter(|v| v.var_type == VarType::Integer).count();
        format!(
            "{} variables ({} binary, {} integer), {} constraints",
            self.variables.len(),
            binary,
            integer,
            self.constraints.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_evaluation() {
        let mut model = Model::new("test");
        let a = model.add_continuous("a".into(), 0.0, f64::INFINITY);
        let b = model.add_continuous("b".into(), 0.0, f64::INFINITY);

        let mut expr = LinExpr::new();
        expr.add_term(a, 2.0).add_term(b, -1.0).add_constant(5.0);

        assert_eq!(expr.evaluate(&[3.0, 4.0]), 2.0 * 3.0 - 4.0 + 5.0);
    }

    #[test]
    fn fixing_collapses_bounds() {
        let mut model = Model::new("test");
        let x = model.add_binary("x".into());
        assert!(!model.variable(x).is_fixed());

        model.fix(x, 0.0);
        assert!(model.variable(x).is_fixed());
        assert_eq!(model.variable(x).lower, 0.0);
        assert_eq!(model.variable(x).upper, 0.0);
    }

    #[test]
    fn sense_tolerance() {
        assert!(Sense::Ge.holds(9.999_999_9, 10.0, 1e-6));
        assert!(!Sense::Ge.holds(9.9, 10.0, 1e-6));
        assert!(Sense::Eq.holds(10.0, 10.0, 0.0));
    }

    #[test]
    fn size_summary_counts_domains() {
        let mut model = Model::new("test");
        model.add_binary("open".into());
        model.add_integer("crew".into(), 0.0, f64::INFINITY);
        model.add_continuous("flow".into(), 0.0, f64::INFINITY);

        assert_eq!(model.size_summary(), "3 variables (1 binary, 1 integer), 0 constraints");
    }
}

//! 0/1 linear-program model: binary variables, an integer maximize
//! objective, and `sum(c_i * x_i) <= rhs` rows.

/// Identifier of a binary decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

/// One linear row `sum(coeff * var) <= rhs`.
#[derive(Clone, Debug)]
pub struct LinearRow {
    pub terms: Vec<(VarId, i64)>,
    pub rhs: i64,
}

/// A 0/1 integer program. The objective is always maximized; minimization
/// callers negate their coefficients.
#[derive(Clone, Debug, Default)]
pub struct BinaryProgram {
    objective: Vec<i64>,
    rows: Vec<LinearRow>,
}

impl BinaryProgram {
    pub fn with_vars(num_vars: usize) -> Self {
        Self {
            objective: vec![0; num_vars],
            rows: Vec::new(),
        }
    }

    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    pub fn objective(&self) -> &[i64] {
        &self.objective
    }

    pub fn rows(&self) -> &[LinearRow] {
        &self.rows
    }

    pub fn set_objective(&mut self, var: VarId, coeff: i64) {
        self.objective[var.0] = coeff;
    }

    pub fn add_row(&mut self, terms: Vec<(VarId, i64)>, rhs: i64) {
        self.rows.push(LinearRow { terms, rhs });
    }

    /// `sum(vars) <= bound`. The cycle constraint shape: at least
    /// `len - bound` of the listed variables must be zero.
    pub fn add_at_most(&mut self, vars: &[VarId], bound: i64) {
        self.add_row(vars.iter().map(|&v| (v, 1)).collect(), bound);
    }

    /// `x_u >= x_v`, encoded as `x_v - x_u <= 0`.
    pub fn add_dominates(&mut self, u: VarId, v: VarId) {
        self.add_row(vec![(v, 1), (u, -1)], 0);
    }

    pub fn objective_value(&self, values: &[bool]) -> i64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(&c, &v)| if v { c } else { 0 })
            .sum()
    }

    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        self.rows.iter().all(|row| {
            row.terms
                .iter()
                .map(|&(VarId(i), c)| if values[i] { c } else { 0 })
                .sum::<i64>()
                <= row.rhs
        })
    }
}

/// An optimal variable assignment and its objective value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub values: Vec<bool>,
    pub objective: i64,
}

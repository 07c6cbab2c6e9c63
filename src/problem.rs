//! Generic backtracking search over indexed integer-domain variables.
//!
//! Variables are slot indices in a fixed order; values are indices into the
//! caller's user roster. Constraints are closed enum variants with their
//! parameters captured by value at registration time, so the engine needs no
//! dynamic dispatch and no shared state between solve calls.

use crate::data::DayId;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

pub type VarId = usize;
pub type ValueId = usize;

/// Minimum off-duty gap between shifts on consecutive days, in minutes.
pub const MIN_REST_GAP_MINUTES: i64 = 11 * 60;

#[derive(Debug, Clone)]
pub enum Constraint {
    /// Unary: the variable may only take one of the listed values.
    Allowed { var: VarId, allowed: HashSet<ValueId> },
    /// Binary: two variables must take different values.
    NotEqual { a: VarId, b: VarId },
    /// Binary: if both variables take the same value, the anchored time
    /// ranges must leave the minimum rest gap in one temporal order or the
    /// other. Ranges are minutes from the start of the scheduling window.
    RestGap {
        a: VarId,
        b: VarId,
        a_range: (i64, i64),
        b_range: (i64, i64),
    },
    /// Global: no value may appear on more than `limit` distinct days.
    MaxDistinctDays { limit: usize, var_days: Vec<DayId> },
    /// Global: per-value assignment counts (zero counts included) may differ
    /// by at most one across all `num_values` values.
    BalancedLoad { num_values: usize },
}

impl Constraint {
    fn involves(&self, var: VarId) -> bool {
        match self {
            Constraint::Allowed { var: v, .. } => *v == var,
            Constraint::NotEqual { a, b } | Constraint::RestGap { a, b, .. } => {
                *a == var || *b == var
            }
            Constraint::MaxDistinctDays { .. } | Constraint::BalancedLoad { .. } => true,
        }
    }

    /// Checks the constraint against a partial assignment in which `latest`
    /// was just bound. Must never reject a partial assignment that could
    /// still extend to a satisfying one.
    fn check(&self, assignment: &[Option<ValueId>], latest: VarId) -> bool {
        match self {
            Constraint::Allowed { var, allowed } => match assignment[*var] {
                Some(value) => allowed.contains(&value),
                None => true,
            },
            Constraint::NotEqual { a, b } => match (assignment[*a], assignment[*b]) {
                (Some(x), Some(y)) => x != y,
                _ => true,
            },
            Constraint::RestGap {
                a,
                b,
                a_range,
                b_range,
            } => match (assignment[*a], assignment[*b]) {
                (Some(x), Some(y)) if x == y => {
                    let (a_start, a_end) = *a_range;
                    let (b_start, b_end) = *b_range;
                    a_end + MIN_REST_GAP_MINUTES <= b_start
                        || b_end + MIN_REST_GAP_MINUTES <= a_start
                }
                _ => true,
            },
            Constraint::MaxDistinctDays { limit, var_days } => {
                let Some(user) = assignment[latest] else {
                    return true;
                };
                // distinct days can only grow, so bounding the just-bound
                // user is a sound partial check
                let mut days = HashSet::new();
                for (var, value) in assignment.iter().enumerate() {
                    if *value == Some(user) {
                        days.insert(var_days[var]);
                        if days.len() > *limit {
                            return false;
                        }
                    }
                }
                true
            }
            Constraint::BalancedLoad { num_values } => {
                balanced_load_check(assignment, *num_values)
            }
        }
    }
}

/// With max-min <= 1 over counts summing to the variable total, every final
/// count is at most ceil(total / num_values); a partial count past that bound
/// can never recover. The exact spread check runs on complete assignments.
fn balanced_load_check(assignment: &[Option<ValueId>], num_values: usize) -> bool {
    if num_values == 0 {
        return true;
    }
    let mut counts: HashMap<ValueId, usize> = HashMap::new();
    let mut assigned = 0usize;
    for value in assignment.iter().flatten() {
        *counts.entry(*value).or_insert(0) += 1;
        assigned += 1;
    }
    let ceiling = assignment.len().div_ceil(num_values);
    if counts.values().any(|&count| count > ceiling) {
        return false;
    }
    if assigned == assignment.len() {
        let max = counts.values().copied().max().unwrap_or(0);
        let min = if counts.len() < num_values {
            0
        } else {
            counts.values().copied().min().unwrap_or(0)
        };
        return max - min <= 1;
    }
    true
}

/// One constraint satisfaction problem, owned exclusively by a single solve
/// invocation.
#[derive(Debug, Default)]
pub struct Problem {
    domains: Vec<Vec<ValueId>>,
    constraints: Vec<Constraint>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, domain: Vec<ValueId>) -> VarId {
        self.domains.push(domain);
        self.domains.len() - 1
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_variables(&self) -> usize {
        self.domains.len()
    }

    /// Enumerates complete consistent assignments in deterministic
    /// depth-first order, stopping after `limit` solutions.
    pub fn solutions(&self, limit: usize) -> Vec<Vec<ValueId>> {
        if limit == 0 {
            return Vec::new();
        }
        let domains = self.node_consistent_domains();
        if domains.iter().any(|d| d.is_empty()) {
            debug!("search aborted: at least one variable has an empty domain");
            return Vec::new();
        }
        let watchers = self.watchers();
        let mut assignment: Vec<Option<ValueId>> = vec![None; self.domains.len()];
        let mut results = Vec::new();
        self.backtrack(0, &domains, &watchers, &mut assignment, limit, &mut results);
        trace!(
            "enumerated {} solution(s) over {} variable(s)",
            results.len(),
            self.domains.len()
        );
        results
    }

    /// Cheaper mode for when a single schedule is enough.
    pub fn first_solution(&self) -> Option<Vec<ValueId>> {
        self.solutions(1).pop()
    }

    /// Node consistency: fold unary constraints into the domains up front so
    /// the search never branches on a value a unary rule forbids.
    fn node_consistent_domains(&self) -> Vec<Vec<ValueId>> {
        let mut domains = self.domains.clone();
        for constraint in &self.constraints {
            if let Constraint::Allowed { var, allowed } = constraint {
                domains[*var].retain(|value| allowed.contains(value));
            }
        }
        domains
    }

    /// For each variable, the constraints worth re-checking when it is bound.
    fn watchers(&self) -> Vec<Vec<usize>> {
        let mut watchers = vec![Vec::new(); self.domains.len()];
        for (index, constraint) in self.constraints.iter().enumerate() {
            for (var, list) in watchers.iter_mut().enumerate() {
                if constraint.involves(var) {
                    list.push(index);
                }
            }
        }
        watchers
    }

    fn backtrack(
        &self,
        var: VarId,
        domains: &[Vec<ValueId>],
        watchers: &[Vec<usize>],
        assignment: &mut Vec<Option<ValueId>>,
        limit: usize,
        results: &mut Vec<Vec<ValueId>>,
    ) {
        if results.len() >= limit {
            return;
        }
        if var == domains.len() {
            let solution: Vec<ValueId> = assignment.iter().map(|v| v.unwrap()).collect();
            results.push(solution);
            return;
        }
        for &value in &domains[var] {
            assignment[var] = Some(value);
            let consistent = watchers[var]
                .iter()
                .all(|&index| self.constraints[index].check(assignment, var));
            if consistent {
                self.backtrack(var + 1, domains, watchers, assignment, limit, results);
                if results.len() >= limit {
                    break;
                }
            }
        }
        assignment[var] = None;
    }
}

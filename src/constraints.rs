use crate::data::UserId;
use crate::error::SolveError;
use crate::indexes::ShiftIndexes;
use crate::problem::{Constraint, Problem};
use crate::variables::SlotVar;
use itertools::Itertools;
use log::info;
use std::collections::HashSet;

/// Registers the full hard-rule set on `problem`, whose variables must be
/// `vars` in the same order. Every pairwise constraint captures its slot
/// parameters by value at registration time.
///
/// With `locked_bypass` set, variables flagged locked skip the unary
/// expertise rule: a locked assignment is authoritative even when its user
/// would fail the filter. `balanced` additionally enforces a per-user slot
/// count spread of at most one (fresh generation only).
pub fn register_constraints(
    problem: &mut Problem,
    vars: &[SlotVar],
    users: &[UserId],
    indexes: &ShiftIndexes,
    max_days_per_user: u32,
    locked_bypass: bool,
    balanced: bool,
) -> Result<(), SolveError> {
    // expertise match, unary per slot
    for (var, slot_var) in vars.iter().enumerate() {
        if locked_bypass && slot_var.locked {
            continue;
        }
        let allowed: HashSet<usize> = users
            .iter()
            .enumerate()
            .filter(|&(_, &user)| indexes.expertise_matches(user, slot_var.shift_id))
            .map(|(index, _)| index)
            .collect();
        problem.add_constraint(Constraint::Allowed { var, allowed });
    }

    // no double-booking: all slot pairs on the same day take distinct users
    let daily_vars = vars
        .iter()
        .enumerate()
        .map(|(var, slot_var)| (slot_var.day_id, var))
        .into_group_map();
    let mut same_day_pairs = 0usize;
    for vars_for_day in daily_vars.values() {
        for (&a, &b) in vars_for_day.iter().tuple_combinations() {
            problem.add_constraint(Constraint::NotEqual { a, b });
            same_day_pairs += 1;
        }
    }

    // minimum rest gap, only between literally consecutive days
    let mut rest_gap_pairs = 0usize;
    for (a, first) in vars.iter().enumerate() {
        for (offset, second) in vars[a + 1..].iter().enumerate() {
            if second.day_id != first.day_id + 1 {
                continue;
            }
            let b = a + 1 + offset;
            problem.add_constraint(Constraint::RestGap {
                a,
                b,
                a_range: first.anchored_range(indexes)?,
                b_range: second.anchored_range(indexes)?,
            });
            rest_gap_pairs += 1;
        }
    }

    // weekly workload cap over the full assignment
    problem.add_constraint(Constraint::MaxDistinctDays {
        limit: max_days_per_user as usize,
        var_days: vars.iter().map(|v| v.day_id).collect(),
    });

    if balanced {
        problem.add_constraint(Constraint::BalancedLoad {
            num_values: users.len(),
        });
    }

    info!(
        "registered constraints: {} same-day pairs, {} rest-gap pairs, \
         workload cap {} day(s), balanced={}",
        same_day_pairs, rest_gap_pairs, max_days_per_user, balanced
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AssignmentRecord, ShiftDetail, ShiftExpertise, ShiftSlot, UserExpertise};
    use crate::variables::{build_domains, build_slot_vars};

    fn indexes() -> ShiftIndexes {
        ShiftIndexes::build(
            &[
                ShiftDetail { id: 1, start: "08:00".into(), end: "16:00".into() },
                ShiftDetail { id: 2, start: "15:00".into(), end: "23:00".into() },
            ],
            &[],
            &[UserExpertise { user_id: 10, expertise_id: 7 }],
            &[ShiftExpertise { shift_id: 2, expertise_id: 7 }],
        )
        .unwrap()
    }

    fn slot(shift_id: u32, day_id: u32, slot: u32, locked: bool) -> ShiftSlot {
        ShiftSlot { shift_id, day_id, slot, locked }
    }

    fn solve(
        shift_slots: &[ShiftSlot],
        users: &[UserId],
        locked: Option<&[AssignmentRecord]>,
        balanced: bool,
    ) -> Vec<Vec<usize>> {
        let indexes = indexes();
        let vars = build_slot_vars(shift_slots, &indexes).unwrap();
        let mut problem = Problem::new();
        for domain in build_domains(users, &vars, &indexes, locked) {
            problem.add_variable(domain);
        }
        register_constraints(
            &mut problem,
            &vars,
            users,
            &indexes,
            5,
            locked.is_some(),
            balanced,
        )
        .unwrap();
        problem.solutions(usize::MAX)
    }

    #[test]
    fn same_day_slots_get_distinct_users() {
        let solutions = solve(
            &[slot(1, 0, 0, false), slot(1, 0, 1, false)],
            &[10, 20],
            None,
            false,
        );
        assert_eq!(solutions.len(), 2);
        for solution in &solutions {
            assert_ne!(solution[0], solution[1]);
        }
    }

    #[test]
    fn expertise_rule_filters_unqualified_users() {
        // shift 2 requires expertise 7, held only by user 10 (index 0)
        let solutions = solve(&[slot(2, 0, 0, false)], &[10, 20], None, false);
        assert_eq!(solutions, vec![vec![0]]);
    }

    #[test]
    fn locked_bypass_skips_expertise_rule() {
        // user 20 lacks expertise 7 but is locked into shift 2
        let locked =
            vec![AssignmentRecord { user_id: 20, shift_id: 2, day_id: 0, slot: 0 }];
        let solutions = solve(&[slot(2, 0, 0, true)], &[10, 20], Some(&locked), false);
        assert_eq!(solutions, vec![vec![1]]);
    }

    #[test]
    fn short_overnight_gap_forces_different_users() {
        // shift 2 ends 23:00 on day 0; shift 1 starts 08:00 on day 1 (9h gap)
        let solutions = solve(
            &[slot(2, 0, 0, false), slot(1, 1, 0, false)],
            &[10, 20],
            None,
            false,
        );
        assert!(!solutions.is_empty());
        for solution in &solutions {
            assert_ne!(solution[0], solution[1]);
        }
    }

    #[test]
    fn rest_gap_skips_non_adjacent_days() {
        // same short wall-clock gap, but two days apart: same user allowed
        let solutions = solve(
            &[slot(2, 0, 0, false), slot(1, 2, 0, false)],
            &[10],
            None,
            false,
        );
        assert_eq!(solutions, vec![vec![0, 0]]);
    }

    #[test]
    fn balanced_spread_rejects_lopsided_schedules() {
        // two day-shift slots across two days, two users: without balancing
        // one user could take both (16h rest gap is fine)
        let slots = [slot(1, 0, 0, false), slot(1, 1, 0, false)];
        let all = solve(&slots, &[10, 20], None, false);
        assert_eq!(all.len(), 4);
        let balanced = solve(&slots, &[10, 20], None, true);
        assert_eq!(balanced.len(), 2);
        for solution in &balanced {
            assert_ne!(solution[0], solution[1]);
        }
    }

    #[test]
    fn workload_cap_limits_distinct_days() {
        let indexes = indexes();
        let slots: Vec<ShiftSlot> = (0..3).map(|day| slot(1, day, 0, false)).collect();
        let vars = build_slot_vars(&slots, &indexes).unwrap();
        let users = vec![10u32, 20];
        let mut problem = Problem::new();
        for domain in build_domains(&users, &vars, &indexes, None) {
            problem.add_variable(domain);
        }
        register_constraints(&mut problem, &vars, &users, &indexes, 2, false, false)
            .unwrap();
        for solution in problem.solutions(usize::MAX) {
            for user in 0..users.len() {
                let days = solution.iter().filter(|&&v| v == user).count();
                assert!(days <= 2);
            }
        }
    }
}

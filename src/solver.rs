use crate::constraints::register_constraints;
use crate::data::{AssignmentRecord, SolveInput, SolveOutput, UserId};
use crate::error::SolveError;
use crate::indexes::ShiftIndexes;
use crate::problem::{Problem, ValueId};
use crate::variables::{SlotVar, build_domains, build_slot_vars};
use log::info;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::Instant;

/// Knobs for fresh generation. The enumeration cap bounds the combinatorial
/// search on loosely constrained rosters; the shuffle seed diversifies which
/// schedules are found first without hiding the randomness in global state.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub max_solutions: usize,
    pub shuffle_seed: Option<u64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_solutions: 500,
            shuffle_seed: None,
        }
    }
}

/// Generates a fresh schedule: enumerates consistent assignments under the
/// full constraint set (balanced distribution included) and returns the
/// candidate with the fewest repeated (user, shift) pairings.
pub fn solve(input: &SolveInput, options: &SolveOptions) -> Result<SolveOutput, SolveError> {
    let start_time = Instant::now();
    let indexes = ShiftIndexes::build(
        &input.shift_details,
        &input.user_availability,
        &input.user_expertise,
        &input.shift_expertise,
    )?;

    let mut users = input.users.clone();
    if let Some(seed) = options.shuffle_seed {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        users.shuffle(&mut rng);
    }

    let vars = build_slot_vars(&input.shift_slots, &indexes)?;
    info!(
        "setting up CSP with {} slot variable(s) over {} user(s)",
        vars.len(),
        users.len()
    );

    let mut problem = Problem::new();
    for domain in build_domains(&users, &vars, &indexes, None) {
        problem.add_variable(domain);
    }
    register_constraints(
        &mut problem,
        &vars,
        &users,
        &indexes,
        input.max_days_per_user,
        false,
        true,
    )?;

    let solutions = problem.solutions(options.max_solutions);
    if solutions.is_empty() {
        info!("no valid shift assignments found");
        return Ok(SolveOutput {
            assignments: Vec::new(),
            total_solutions: 0,
        });
    }

    // tie-break on repeat pairings; min_by_key keeps the first best, so the
    // enumeration order still decides among equals
    let best = solutions
        .iter()
        .min_by_key(|solution| repeat_penalty(solution, &vars, &users))
        .cloned()
        .unwrap_or_default();

    info!(
        "selected 1 of {} solution(s) in {:.2?}",
        solutions.len(),
        start_time.elapsed()
    );
    Ok(SolveOutput {
        assignments: vec![format_assignment(&best, &vars, &users)],
        total_solutions: solutions.len(),
    })
}

/// How many (user, shift) pairings recur beyond their first occurrence.
/// Lower is fairer: the same person covering one shift template all week
/// scores worse than spreading it around.
fn repeat_penalty(solution: &[ValueId], vars: &[SlotVar], users: &[UserId]) -> usize {
    let mut counts: HashMap<(UserId, u32), usize> = HashMap::new();
    for (var, &value) in solution.iter().enumerate() {
        *counts.entry((users[value], vars[var].shift_id)).or_insert(0) += 1;
    }
    counts.values().filter(|&&c| c > 1).map(|&c| c - 1).sum()
}

fn format_assignment(
    solution: &[ValueId],
    vars: &[SlotVar],
    users: &[UserId],
) -> Vec<AssignmentRecord> {
    let mut formatted: Vec<AssignmentRecord> = solution
        .iter()
        .enumerate()
        .map(|(var, &value)| AssignmentRecord {
            user_id: users[value],
            shift_id: vars[var].shift_id,
            day_id: vars[var].day_id,
            slot: vars[var].slot,
        })
        .collect();
    formatted.sort_by_key(|a| (a.day_id, a.shift_id, a.slot));
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ShiftDetail, ShiftSlot, UserAvailability};
    use std::collections::HashSet;

    fn base_input() -> SolveInput {
        SolveInput {
            users: vec![1, 2],
            shift_slots: vec![ShiftSlot { shift_id: 1, day_id: 0, slot: 0, locked: false }],
            shift_details: vec![ShiftDetail {
                id: 1,
                start: "09:00".into(),
                end: "17:00".into(),
            }],
            user_availability: Vec::new(),
            user_expertise: Vec::new(),
            shift_expertise: Vec::new(),
            max_days_per_user: 5,
        }
    }

    #[test]
    fn single_slot_goes_to_exactly_one_user() {
        let output = solve(&base_input(), &SolveOptions::default()).unwrap();
        assert!(output.total_solutions >= 1);
        assert_eq!(output.assignments.len(), 1);
        let schedule = &output.assignments[0];
        assert_eq!(schedule.len(), 1);
        assert!([1, 2].contains(&schedule[0].user_id));
    }

    #[test]
    fn fully_unavailable_roster_yields_zero_solutions() {
        let mut input = base_input();
        input.user_availability = vec![
            UserAvailability { user_id: 1, day_id: 0 },
            UserAvailability { user_id: 2, day_id: 0 },
        ];
        let output = solve(&input, &SolveOptions::default()).unwrap();
        assert!(output.assignments.is_empty());
        assert_eq!(output.total_solutions, 0);
    }

    #[test]
    fn balanced_distribution_holds_in_output() {
        let mut input = base_input();
        input.shift_slots = vec![
            ShiftSlot { shift_id: 1, day_id: 0, slot: 0, locked: false },
            ShiftSlot { shift_id: 1, day_id: 0, slot: 1, locked: false },
            ShiftSlot { shift_id: 1, day_id: 1, slot: 0, locked: false },
            ShiftSlot { shift_id: 1, day_id: 1, slot: 1, locked: false },
        ];
        let output = solve(&input, &SolveOptions::default()).unwrap();
        let schedule = &output.assignments[0];
        let mut per_user: HashMap<u32, usize> = HashMap::new();
        for a in schedule {
            *per_user.entry(a.user_id).or_insert(0) += 1;
        }
        assert_eq!(per_user[&1], 2);
        assert_eq!(per_user[&2], 2);
        // daily uniqueness
        let mut seen = HashSet::new();
        for a in schedule {
            assert!(seen.insert((a.day_id, a.user_id)));
        }
    }

    #[test]
    fn output_is_sorted_by_day_shift_slot() {
        let mut input = base_input();
        input.users = vec![1, 2, 3];
        input.shift_details.push(ShiftDetail {
            id: 2,
            start: "06:00".into(),
            end: "12:00".into(),
        });
        input.shift_slots = vec![
            ShiftSlot { shift_id: 1, day_id: 1, slot: 0, locked: false },
            ShiftSlot { shift_id: 2, day_id: 0, slot: 1, locked: false },
            ShiftSlot { shift_id: 2, day_id: 0, slot: 0, locked: false },
        ];
        let output = solve(&input, &SolveOptions::default()).unwrap();
        let keys: Vec<_> = output.assignments[0]
            .iter()
            .map(|a| (a.day_id, a.shift_id, a.slot))
            .collect();
        assert_eq!(keys, vec![(0, 2, 0), (0, 2, 1), (1, 1, 0)]);
    }

    #[test]
    fn malformed_time_string_is_an_error() {
        let mut input = base_input();
        input.shift_details[0].end = "25:99".into();
        assert!(matches!(
            solve(&input, &SolveOptions::default()),
            Err(SolveError::InvalidTime { shift_id: 1, .. })
        ));
    }

    #[test]
    fn shuffle_seed_is_deterministic() {
        let mut input = base_input();
        input.users = vec![1, 2, 3, 4];
        let options = SolveOptions {
            max_solutions: 1,
            shuffle_seed: Some(42),
        };
        let first = solve(&input, &options).unwrap();
        let second = solve(&input, &options).unwrap();
        assert_eq!(first.assignments, second.assignments);
    }

    #[test]
    fn enumeration_cap_bounds_total_solutions() {
        let mut input = base_input();
        input.users = vec![1, 2, 3, 4, 5];
        let options = SolveOptions {
            max_solutions: 3,
            shuffle_seed: None,
        };
        let output = solve(&input, &options).unwrap();
        assert!(output.total_solutions <= 3);
    }
}

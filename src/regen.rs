//! Schedule regeneration: re-solve a week that already has an accepted
//! solution, holding locked slots fixed and requiring the result to differ
//! meaningfully from the original.

use crate::constraints::register_constraints;
use crate::data::{DayId, RegenAssignment, RegenInput, RegenOutput, ShiftId, SlotIndex, UserId};
use crate::error::SolveError;
use crate::indexes::ShiftIndexes;
use crate::problem::{Problem, ValueId};
use crate::variables::{SlotVar, build_domains, build_slot_vars};
use log::info;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Enumeration cap: the first few consistent schedules are enough to pick a
/// meaningfully different one, and an uncapped enumeration blows up on
/// loosely constrained weeks.
pub const REGEN_SOLUTION_CAP: usize = 5;

const NO_SOLUTIONS: &str = "No valid shift assignments found";
const NO_CHANGE: &str = "All solutions matched original (no change)";

type SlotKey = (ShiftId, DayId, SlotIndex);

/// Terminal classification of one regeneration attempt.
enum Outcome {
    NoSolutionsFound,
    AllMatchedOriginal { total: usize },
    Selected { solution: Vec<ValueId>, total: usize },
}

pub fn regenerate(input: &RegenInput) -> Result<RegenOutput, SolveError> {
    let start_time = Instant::now();
    let indexes = ShiftIndexes::build(
        &input.shift_details,
        &input.user_availability,
        &input.user_expertise,
        &input.shift_expertise,
    )?;
    let vars = build_slot_vars(&input.shift_slots, &indexes)?;
    info!(
        "regenerating {} slot variable(s), {} locked, over {} user(s)",
        vars.len(),
        vars.iter().filter(|v| v.locked).count(),
        input.users.len()
    );

    let mut problem = Problem::new();
    for domain in build_domains(&input.users, &vars, &indexes, Some(&input.locked_assignments)) {
        problem.add_variable(domain);
    }
    register_constraints(
        &mut problem,
        &vars,
        &input.users,
        &indexes,
        input.max_days_per_user,
        true,
        false,
    )?;

    let solutions = problem.solutions(REGEN_SOLUTION_CAP);
    let original: HashMap<SlotKey, UserId> = input
        .original_assignments
        .iter()
        .map(|a| ((a.shift_id, a.day_id, a.slot), a.user_id))
        .collect();
    let locked: HashSet<(SlotKey, UserId)> = input
        .locked_assignments
        .iter()
        .map(|a| ((a.shift_id, a.day_id, a.slot), a.user_id))
        .collect();

    let outcome = select(&solutions, &vars, &input.users, &original, &locked);
    info!("regeneration finished in {:.2?}", start_time.elapsed());
    Ok(build_output(outcome, &vars, &input.users, &original, &locked))
}

/// Picks the candidate with the most changed non-locked assignments, never
/// one identical to the original.
fn select(
    solutions: &[Vec<ValueId>],
    vars: &[SlotVar],
    users: &[UserId],
    original: &HashMap<SlotKey, UserId>,
    locked: &HashSet<(SlotKey, UserId)>,
) -> Outcome {
    if solutions.is_empty() {
        return Outcome::NoSolutionsFound;
    }

    let mut best: Option<(&Vec<ValueId>, usize)> = None;
    for solution in solutions {
        if matches_original(solution, vars, users, original) {
            continue;
        }
        let changes = changed_count(solution, vars, users, original, locked);
        if best.is_none_or(|(_, most)| changes > most) {
            best = Some((solution, changes));
        }
    }

    match best {
        Some((solution, changes)) => {
            info!(
                "selected candidate with {} changed assignment(s) out of {} enumerated",
                changes,
                solutions.len()
            );
            Outcome::Selected {
                solution: solution.clone(),
                total: solutions.len(),
            }
        }
        None => Outcome::AllMatchedOriginal {
            total: solutions.len(),
        },
    }
}

/// A candidate matches the original when every original record finds the
/// same user at its slot. An original record whose slot is no longer part of
/// the problem counts as a difference.
fn matches_original(
    solution: &[ValueId],
    vars: &[SlotVar],
    users: &[UserId],
    original: &HashMap<SlotKey, UserId>,
) -> bool {
    let by_key: HashMap<SlotKey, UserId> = solution
        .iter()
        .enumerate()
        .map(|(var, &value)| (vars[var].key(), users[value]))
        .collect();
    original
        .iter()
        .all(|(key, &user)| by_key.get(key) == Some(&user))
}

fn changed_count(
    solution: &[ValueId],
    vars: &[SlotVar],
    users: &[UserId],
    original: &HashMap<SlotKey, UserId>,
    locked: &HashSet<(SlotKey, UserId)>,
) -> usize {
    solution
        .iter()
        .enumerate()
        .filter(|&(var, &value)| {
            let key = vars[var].key();
            let user = users[value];
            !locked.contains(&(key, user))
                && original.get(&key).is_some_and(|&orig| orig != user)
        })
        .count()
}

fn build_output(
    outcome: Outcome,
    vars: &[SlotVar],
    users: &[UserId],
    original: &HashMap<SlotKey, UserId>,
    locked: &HashSet<(SlotKey, UserId)>,
) -> RegenOutput {
    match outcome {
        Outcome::NoSolutionsFound => RegenOutput::failure(NO_SOLUTIONS, 0),
        Outcome::AllMatchedOriginal { total } => RegenOutput::failure(NO_CHANGE, total),
        Outcome::Selected { solution, total } => {
            let changed_count = changed_count(&solution, vars, users, original, locked);
            let mut assignments: Vec<RegenAssignment> = solution
                .iter()
                .enumerate()
                .map(|(var, &value)| {
                    let key = vars[var].key();
                    let user = users[value];
                    RegenAssignment {
                        user_id: user,
                        shift_id: key.0,
                        day_id: key.1,
                        slot: key.2,
                        locked: locked.contains(&(key, user)),
                    }
                })
                .collect();
            assignments.sort_by_key(|a| (a.day_id, a.shift_id, a.slot));
            RegenOutput {
                assignments,
                total_solutions: total,
                changed_count,
                fallback_count: 0,
                skipped_count: 0,
                skipped_assignments: Vec::new(),
                failure_reasons: Vec::new(),
                message: Some(format!(
                    "New solution generated (best of {REGEN_SOLUTION_CAP} with max changes)"
                )),
            }
        }
    }
}

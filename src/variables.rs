use crate::data::{AssignmentRecord, DayId, ShiftId, ShiftSlot, SlotIndex, UserId};
use crate::error::SolveError;
use crate::indexes::ShiftIndexes;
use crate::problem::ValueId;
use log::{debug, warn};
use std::collections::HashSet;

/// One CSP variable: a deduplicated (shift, day, slot) opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotVar {
    pub shift_id: ShiftId,
    pub day_id: DayId,
    pub slot: SlotIndex,
    pub locked: bool,
}

impl SlotVar {
    pub fn key(&self) -> (ShiftId, DayId, SlotIndex) {
        (self.shift_id, self.day_id, self.slot)
    }

    /// Shift time range anchored to this variable's day, in minutes from the
    /// start of the scheduling window. Keeps overnight shifts and
    /// day-to-day gap arithmetic on one axis.
    pub fn anchored_range(&self, indexes: &ShiftIndexes) -> Result<(i64, i64), SolveError> {
        let (start, end) = indexes.time_range(self.shift_id)?;
        let offset = self.day_id as i64 * crate::time::MINUTES_PER_DAY;
        Ok((start + offset, end + offset))
    }
}

/// Collapses repeated (shift, day, slot) tuples to one variable each and
/// orders variables by (day, shift start time). The ordering only steers the
/// backtracking, but it is fixed so results are reproducible.
pub fn build_slot_vars(
    shift_slots: &[ShiftSlot],
    indexes: &ShiftIndexes,
) -> Result<Vec<SlotVar>, SolveError> {
    let mut seen: HashSet<(ShiftId, DayId, SlotIndex)> = HashSet::new();
    let mut vars = Vec::new();
    for slot in shift_slots {
        let key = (slot.shift_id, slot.day_id, slot.slot);
        if !seen.insert(key) {
            continue;
        }
        // fail fast on a slot that references a shift with no time details
        indexes.time_range(slot.shift_id)?;
        vars.push(SlotVar {
            shift_id: slot.shift_id,
            day_id: slot.day_id,
            slot: slot.slot,
            locked: slot.locked,
        });
    }
    vars.sort_by_key(|var| {
        let (start, _) = indexes.shift_time_range[&var.shift_id];
        (var.day_id, start, var.shift_id, var.slot)
    });
    Ok(vars)
}

/// Computes the admissible user-index domain for every variable.
///
/// With `locked_assignments` present (regeneration), a locked variable
/// collapses to exactly its recorded user, bypassing availability and
/// expertise filtering; a locked variable with no matching record gets an
/// empty domain so the search reports infeasibility instead of dropping the
/// slot. Fresh generation passes `None` and locked flags are ignored.
pub fn build_domains(
    users: &[UserId],
    vars: &[SlotVar],
    indexes: &ShiftIndexes,
    locked_assignments: Option<&[AssignmentRecord]>,
) -> Vec<Vec<ValueId>> {
    vars.iter()
        .map(|var| {
            if let Some(locked) = locked_assignments {
                if var.locked {
                    return locked_domain(users, var, locked);
                }
            }
            let domain: Vec<ValueId> = users
                .iter()
                .enumerate()
                .filter(|&(_, &user)| {
                    !indexes.is_unavailable(user, var.day_id)
                        && indexes.expertise_matches(user, var.shift_id)
                })
                .map(|(index, _)| index)
                .collect();
            if domain.is_empty() {
                warn!(
                    "no available users for shift {} on day {}, slot {}",
                    var.shift_id, var.day_id, var.slot
                );
            }
            domain
        })
        .collect()
}

fn locked_domain(
    users: &[UserId],
    var: &SlotVar,
    locked_assignments: &[AssignmentRecord],
) -> Vec<ValueId> {
    let record = locked_assignments.iter().find(|a| {
        a.shift_id == var.shift_id && a.day_id == var.day_id && a.slot == var.slot
    });
    match record {
        Some(record) => match users.iter().position(|&u| u == record.user_id) {
            Some(index) => vec![index],
            None => {
                warn!(
                    "locked user {} for shift {} day {} slot {} is not on the roster",
                    record.user_id, var.shift_id, var.day_id, var.slot
                );
                Vec::new()
            }
        },
        None => {
            debug!(
                "slot flagged locked without a locked assignment record: \
                 shift {} day {} slot {}",
                var.shift_id, var.day_id, var.slot
            );
            Vec::new()
        }
    }
}

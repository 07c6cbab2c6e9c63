use serde::{Deserialize, Serialize};

// Type aliases for clarity
pub type UserId = u32;
pub type ShiftId = u32;
pub type DayId = u32;
pub type SlotIndex = u32;
pub type ExpertiseId = u32;

fn default_max_days() -> u32 {
    5
}

/// One staffing opening: a shift template on a given day. `slot` distinguishes
/// concurrent openings when a shift needs more than one person.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSlot {
    pub shift_id: ShiftId,
    pub day_id: DayId,
    pub slot: SlotIndex,
    #[serde(default)]
    pub locked: bool,
}

/// Wall-clock start/end of a shift template, "HH:MM" or "HH:MM:SS".
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShiftDetail {
    pub id: ShiftId,
    pub start: String,
    pub end: String,
}

/// Marks a user as unavailable on a day.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAvailability {
    pub user_id: UserId,
    pub day_id: DayId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExpertise {
    pub user_id: UserId,
    pub expertise_id: ExpertiseId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftExpertise {
    pub shift_id: ShiftId,
    pub expertise_id: ExpertiseId,
}

/// A resolved user-to-slot assignment. Also the shape of the
/// original/locked assignment records fed back in for regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub user_id: UserId,
    pub shift_id: ShiftId,
    pub day_id: DayId,
    pub slot: SlotIndex,
}

/// An assignment in regeneration output, carrying its locked state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenAssignment {
    pub user_id: UserId,
    pub shift_id: ShiftId,
    pub day_id: DayId,
    pub slot: SlotIndex,
    pub locked: bool,
}

/// The complete input for fresh schedule generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveInput {
    pub users: Vec<UserId>,
    pub shift_slots: Vec<ShiftSlot>,
    pub shift_details: Vec<ShiftDetail>,
    #[serde(default)]
    pub user_availability: Vec<UserAvailability>,
    #[serde(default)]
    pub user_expertise: Vec<UserExpertise>,
    #[serde(default)]
    pub shift_expertise: Vec<ShiftExpertise>,
    #[serde(default = "default_max_days")]
    pub max_days_per_user: u32,
}

/// The complete input for schedule regeneration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenInput {
    pub users: Vec<UserId>,
    pub shift_slots: Vec<ShiftSlot>,
    pub shift_details: Vec<ShiftDetail>,
    #[serde(default)]
    pub user_availability: Vec<UserAvailability>,
    #[serde(default)]
    pub user_expertise: Vec<UserExpertise>,
    #[serde(default)]
    pub shift_expertise: Vec<ShiftExpertise>,
    #[serde(default)]
    pub original_assignments: Vec<AssignmentRecord>,
    #[serde(default)]
    pub locked_assignments: Vec<AssignmentRecord>,
    #[serde(default = "default_max_days")]
    pub max_days_per_user: u32,
}

/// Fresh-generation output: the selected schedule plus the enumeration count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutput {
    pub assignments: Vec<Vec<AssignmentRecord>>,
    pub total_solutions: usize,
}

/// Regeneration output, including the change accounting the service layer
/// persists alongside the new solution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenOutput {
    pub assignments: Vec<RegenAssignment>,
    pub total_solutions: usize,
    pub changed_count: usize,
    pub fallback_count: usize,
    pub skipped_count: usize,
    pub skipped_assignments: Vec<serde_json::Value>,
    pub failure_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegenOutput {
    /// Empty result carrying one failure reason; `total_solutions` still
    /// reports how many candidates were enumerated before giving up.
    pub fn failure(reason: &str, total_solutions: usize) -> Self {
        Self {
            assignments: Vec::new(),
            total_solutions,
            changed_count: 0,
            fallback_count: 0,
            skipped_count: 0,
            skipped_assignments: Vec::new(),
            failure_reasons: vec![reason.to_string()],
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn solve_input_defaults() {
        let input: SolveInput = serde_json::from_value(json!({
            "users": [1, 2],
            "shiftSlots": [{"shiftId": 1, "dayId": 0, "slot": 0}],
            "shiftDetails": [{"id": 1, "start": "09:00", "end": "17:00"}],
        }))
        .unwrap();
        assert_eq!(input.max_days_per_user, 5);
        assert!(!input.shift_slots[0].locked);
        assert!(input.user_availability.is_empty());
    }

    #[test]
    fn regen_failure_serializes_without_message() {
        let value = serde_json::to_value(RegenOutput::failure("nope", 3)).unwrap();
        assert_eq!(value["failureReasons"], json!(["nope"]));
        assert_eq!(value["totalSolutions"], json!(3));
        assert!(value.get("message").is_none());
        assert_eq!(value["skippedAssignments"], json!([]));
    }

    #[test]
    fn assignment_records_round_trip_camel_case() {
        let record = AssignmentRecord { user_id: 9, shift_id: 5, day_id: 2, slot: 1 };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"userId": 9, "shiftId": 5, "dayId": 2, "slot": 1})
        );
        let back: AssignmentRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}

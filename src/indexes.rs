use crate::data::{
    DayId, ExpertiseId, ShiftDetail, ShiftExpertise, ShiftId, UserAvailability, UserExpertise,
    UserId,
};
use crate::error::SolveError;
use crate::time;
use std::collections::{HashMap, HashSet};

/// Lookup structures built once per solve call from the raw input lists.
/// Pure transform; nothing here is mutated during search.
#[derive(Debug, Clone, Default)]
pub struct ShiftIndexes {
    pub user_expertise: HashMap<UserId, HashSet<ExpertiseId>>,
    pub shift_expertise: HashMap<ShiftId, HashSet<ExpertiseId>>,
    /// Minutes since midnight, end already rolled forward for overnight shifts.
    pub shift_time_range: HashMap<ShiftId, (i64, i64)>,
    /// Informational only; kept for future workload rules.
    pub shift_duration_hours: HashMap<ShiftId, f64>,
    pub unavailable_days: HashMap<UserId, HashSet<DayId>>,
}

impl ShiftIndexes {
    pub fn build(
        shift_details: &[ShiftDetail],
        user_availability: &[UserAvailability],
        user_expertise: &[UserExpertise],
        shift_expertise: &[ShiftExpertise],
    ) -> Result<Self, SolveError> {
        let mut indexes = Self::default();

        for ue in user_expertise {
            indexes
                .user_expertise
                .entry(ue.user_id)
                .or_default()
                .insert(ue.expertise_id);
        }
        for se in shift_expertise {
            indexes
                .shift_expertise
                .entry(se.shift_id)
                .or_default()
                .insert(se.expertise_id);
        }

        for detail in shift_details {
            let start = parse_field(detail.id, &detail.start)?;
            let end = parse_field(detail.id, &detail.end)?;
            let (start, end) = time::normalize_range(start, end);
            indexes.shift_time_range.insert(detail.id, (start, end));
            indexes
                .shift_duration_hours
                .insert(detail.id, (end - start) as f64 / 60.0);
        }

        for ua in user_availability {
            indexes
                .unavailable_days
                .entry(ua.user_id)
                .or_default()
                .insert(ua.day_id);
        }

        Ok(indexes)
    }

    /// Time range for a shift, failing on a dangling shift reference.
    pub fn time_range(&self, shift_id: ShiftId) -> Result<(i64, i64), SolveError> {
        self.shift_time_range
            .get(&shift_id)
            .copied()
            .ok_or(SolveError::UnknownShift { shift_id })
    }

    /// Required expertise for a shift; empty set means any user qualifies.
    pub fn required_expertise(&self, shift_id: ShiftId) -> Option<&HashSet<ExpertiseId>> {
        self.shift_expertise.get(&shift_id)
    }

    pub fn is_unavailable(&self, user: UserId, day: DayId) -> bool {
        self.unavailable_days
            .get(&user)
            .is_some_and(|days| days.contains(&day))
    }

    /// Whether a user satisfies a shift's expertise requirement. A shift with
    /// no declared requirement imposes no filter.
    pub fn expertise_matches(&self, user: UserId, shift_id: ShiftId) -> bool {
        match self.required_expertise(shift_id) {
            None => true,
            Some(required) if required.is_empty() => true,
            Some(required) => self
                .user_expertise
                .get(&user)
                .is_some_and(|held| !held.is_disjoint(required)),
        }
    }
}

fn parse_field(shift_id: ShiftId, value: &str) -> Result<i64, SolveError> {
    time::parse_time_of_day(value).ok_or_else(|| SolveError::InvalidTime {
        shift_id,
        value: value.to_string(),
    })
}

use crate::data::ShiftId;
use thiserror::Error;

/// Failures that abort a solve call before search begins. Infeasibility is
/// not an error; it is reported through the normal output types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("shift {shift_id}: cannot parse {value:?} as a time of day")]
    InvalidTime { shift_id: ShiftId, value: String },
    #[error("shift slot references unknown shift {shift_id}")]
    UnknownShift { shift_id: ShiftId },
}

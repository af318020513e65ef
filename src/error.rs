use crate::data::{ExamId, GenerationId, RollNumber, RoomId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single offending roster row. Rows are one-based as a spreadsheet shows them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum RosterIssue {
    #[error("row {row}: roll number is empty")]
    EmptyRollNumber { row: usize },

    #[error("row {row}: duplicate roll number {roll_number}")]
    #[serde(rename_all = "camelCase")]
    DuplicateRollNumber { row: usize, roll_number: RollNumber },

    #[error("row {row}: invalid semester {value:?} for {roll_number} (expected 1-8)")]
    #[serde(rename_all = "camelCase")]
    InvalidSemester {
        row: usize,
        roll_number: RollNumber,
        value: String,
    },

    #[error("row {row}: empty {field} for {roll_number}")]
    #[serde(rename_all = "camelCase")]
    EmptyField {
        row: usize,
        roll_number: RollNumber,
        field: &'static str,
    },
}

impl RosterIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            RosterIssue::DuplicateRollNumber { .. } => "DuplicateRollNumberError",
            RosterIssue::InvalidSemester { .. } => "InvalidSemesterError",
            RosterIssue::EmptyRollNumber { .. } | RosterIssue::EmptyField { .. } => {
                "ValidationError"
            }
        }
    }
}

/// The seat the constrained search could not fill, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsatisfiableDetail {
    pub room_id: RoomId,
    pub row_index: u32,
    pub seat_index: u32,
    /// The department that could not be seated there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Departments of the already-seated neighbours of that seat.
    pub blocked_departments: Vec<String>,
    /// Students still waiting for a seat, per department.
    pub remaining: BTreeMap<String, u32>,
    pub reason: String,
}

impl fmt::Display for UnsatisfiableDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} R{}-S{} (neighbours: {}; remaining: ",
            self.reason,
            self.room_id,
            self.row_index + 1,
            self.seat_index + 1,
            self.blocked_departments.join(", ")
        )?;
        let remaining = self
            .remaining
            .iter()
            .map(|(dept, n)| format!("{dept}={n}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{remaining})")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Roster(RosterIssue),

    #[error("{} roster rows rejected", .0.len())]
    RosterBatch(Vec<RosterIssue>),

    #[error("room {room_id} is already registered")]
    DuplicateRoom { room_id: RoomId },

    #[error(
        "insufficient capacity: {required} students for {capacity} seats (short by {shortfall})"
    )]
    InsufficientCapacity {
        required: u32,
        capacity: u32,
        shortfall: u32,
    },

    #[error("unsatisfiable seating constraint: {0}")]
    UnsatisfiableConstraint(UnsatisfiableDetail),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("generation cancelled after placing {placed} of {total} students")]
    Cancelled { placed: usize, total: usize },
}

impl SeatingError {
    /// Stable taxonomy name reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            SeatingError::Validation(_) | SeatingError::RosterBatch(_) => "ValidationError",
            SeatingError::Roster(issue) => issue.kind(),
            SeatingError::DuplicateRoom { .. } => "DuplicateRoomError",
            SeatingError::InsufficientCapacity { .. } => "InsufficientCapacityError",
            SeatingError::UnsatisfiableConstraint(_) => "UnsatisfiableConstraintError",
            SeatingError::NotFound(_) => "NotFoundError",
            SeatingError::Cancelled { .. } => "CancelledError",
        }
    }

    /// Structured payload for callers that want more than the message.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            SeatingError::Roster(issue) => serde_json::json!(issue),
            SeatingError::RosterBatch(issues) => serde_json::json!({ "issues": issues }),
            SeatingError::DuplicateRoom { room_id } => serde_json::json!({ "roomId": room_id }),
            SeatingError::InsufficientCapacity {
                required,
                capacity,
                shortfall,
            } => serde_json::json!({
                "required": required,
                "capacity": capacity,
                "shortfall": shortfall,
            }),
            SeatingError::UnsatisfiableConstraint(detail) => serde_json::json!(detail),
            SeatingError::Cancelled { placed, total } => {
                serde_json::json!({ "placed": placed, "total": total })
            }
            SeatingError::Validation(_) | SeatingError::NotFound(_) => serde_json::Value::Null,
        }
    }

    pub(crate) fn exam_not_found(exam_id: &str) -> Self {
        SeatingError::NotFound(format!("exam {exam_id}"))
    }

    pub(crate) fn plan_not_found(exam_id: &ExamId, generation_id: Option<GenerationId>) -> Self {
        match generation_id {
            Some(generation_id) => SeatingError::NotFound(format!(
                "seating plan generation {generation_id} for exam {exam_id}"
            )),
            None => SeatingError::NotFound(format!("seating plan for exam {exam_id}")),
        }
    }
}

impl From<RosterIssue> for SeatingError {
    fn from(issue: RosterIssue) -> Self {
        SeatingError::Roster(issue)
    }
}

pub type SeatingResult<T> = Result<T, SeatingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_follow_taxonomy() {
        let dup = SeatingError::from(RosterIssue::DuplicateRollNumber {
            row: 3,
            roll_number: "CS001".into(),
        });
        assert_eq!(dup.kind(), "DuplicateRollNumberError");
        assert_eq!(dup.to_string(), "row 3: duplicate roll number CS001");

        let short = SeatingError::InsufficientCapacity {
            required: 13,
            capacity: 12,
            shortfall: 1,
        };
        assert_eq!(short.kind(), "InsufficientCapacityError");
        assert_eq!(short.detail()["shortfall"], 1);
    }

    #[test]
    fn test_unsatisfiable_detail_display_is_one_based() {
        let detail = UnsatisfiableDetail {
            room_id: "A-101".into(),
            row_index: 0,
            seat_index: 1,
            department: Some("CS".into()),
            blocked_departments: vec!["CS".into()],
            remaining: BTreeMap::from([("CS".to_string(), 1)]),
            reason: "no department fits".into(),
        };
        assert_eq!(
            detail.to_string(),
            "no department fits at A-101 R1-S2 (neighbours: CS; remaining: CS=1)"
        );
    }
}

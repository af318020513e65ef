use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type RollNumber = String;
pub type RoomId = String;
pub type ExamId = String;
pub type GenerationId = u32;

/// A raw student row as supplied by the roster source. Every field is text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStudent {
    pub roll_number: String,
    pub name: String,
    pub department: String,
    pub semester: String,
    #[serde(default)]
    pub section: Option<String>,
}

/// A validated student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub roll_number: RollNumber,
    pub name: String,
    pub department: String,
    pub semester: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A raw room row as supplied by the room source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSpec {
    pub room_id: String,
    pub building: String,
    pub rows: u32,
    pub seats_per_row: u32,
}

/// Represents an exam room laid out as a grid of benches.
///
/// Capacity is derived from the grid and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    pub building: String,
    rows: u32,
    seats_per_row: u32,
    capacity: u32,
}

impl Room {
    /// Builds a room without validation. Callers go through the catalog,
    /// which rejects empty grids before reaching here.
    pub(crate) fn new(room_id: RoomId, building: String, rows: u32, seats_per_row: u32) -> Self {
        Self {
            room_id,
            building,
            rows,
            seats_per_row,
            capacity: rows * seats_per_row,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn seats_per_row(&self) -> u32 {
        self.seats_per_row
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn layout(&self) -> RoomLayout {
        RoomLayout {
            room_id: self.room_id.clone(),
            building: self.building.clone(),
            rows: self.rows,
            seats_per_row: self.seats_per_row,
        }
    }
}

/// An examination and the students it applies to.
///
/// Empty `departments` or `semesters` lists mean no restriction on that axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub exam_id: ExamId,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub semesters: Vec<u8>,
}

impl Exam {
    pub fn admits(&self, student: &Student) -> bool {
        (self.departments.is_empty() || self.departments.contains(&student.department))
            && (self.semesters.is_empty() || self.semesters.contains(&student.semester))
    }
}

/// How students are ordered before they are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlgorithmMode {
    /// By roll number, no department mixing.
    Sequential,
    /// Round-robin across departments.
    #[default]
    Alternate,
    /// Seeded shuffle.
    Random,
}

impl fmt::Display for AlgorithmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmMode::Sequential => "sequential",
            AlgorithmMode::Alternate => "alternate",
            AlgorithmMode::Random => "random",
        };
        f.write_str(name)
    }
}

/// Caller-chosen policy for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default)]
    pub mode: AlgorithmMode,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_mix_departments")]
    pub mix_departments: bool,
}

fn default_mix_departments() -> bool {
    true
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            mode: AlgorithmMode::default(),
            seed: 0,
            mix_departments: true,
        }
    }
}

impl GenerationOptions {
    /// Whether the department adjacency constraint applies to this run.
    pub fn constrained(&self) -> bool {
        self.mix_departments && self.mode != AlgorithmMode::Sequential
    }
}

/// The input for one generation run.
///
/// `room_ids` is the fill priority; empty means every room in catalog order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub room_ids: Vec<RoomId>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

/// Room geometry captured into a plan so the plan stands on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomLayout {
    pub room_id: RoomId,
    pub building: String,
    pub rows: u32,
    pub seats_per_row: u32,
}

/// Represents a single seated student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub exam_id: ExamId,
    pub room_id: RoomId,
    pub row_index: u32,
    pub seat_index: u32,
    pub roll_number: RollNumber,
    pub department: String,
}

impl SeatAssignment {
    /// One-based printable position, e.g. `R2-S5`.
    pub fn label(&self) -> String {
        format!("R{}-S{}", self.row_index + 1, self.seat_index + 1)
    }
}

impl fmt::Display for SeatAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} {} ({})",
            self.roll_number,
            self.room_id,
            self.label(),
            self.department
        )
    }
}

/// The immutable output of one engine run.
///
/// Assignments are kept in fill order: room priority, then row, then seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingPlan {
    pub exam_id: ExamId,
    pub generation_id: GenerationId,
    pub options: GenerationOptions,
    pub rooms: Vec<RoomLayout>,
    pub assignments: Vec<SeatAssignment>,
}

use crate::data::{ExamId, GenerationId, RollNumber, RoomId, SeatAssignment, SeatingPlan};
use crate::engine::audit::{self, AdjacencyConflict};
use crate::error::{SeatingError, SeatingResult};
use crate::store::PlanStore;
use serde::Serialize;
use std::collections::BTreeMap;

/// A printable seating chart: rooms in fill order, rows front to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLayout {
    pub exam_id: ExamId,
    pub generation_id: GenerationId,
    pub total_students: usize,
    pub rooms: Vec<ExportRoom>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRoom {
    pub room_id: RoomId,
    pub building: String,
    pub rows: u32,
    pub seats_per_row: u32,
    pub occupied: usize,
    pub departments: BTreeMap<String, usize>,
    pub grid: Vec<ExportRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub row_index: u32,
    pub label: String,
    /// One entry per seat; `None` is an empty seat.
    pub seats: Vec<Option<ExportSeat>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSeat {
    pub seat_index: u32,
    pub label: String,
    pub roll_number: RollNumber,
    pub department: String,
}

/// Lays a plan out room by room, row-major.
pub fn export_plan(plan: &SeatingPlan) -> ExportLayout {
    let rooms = plan
        .rooms
        .iter()
        .map(|layout| {
            let mut grid: Vec<ExportRow> = (0..layout.rows)
                .map(|row_index| ExportRow {
                    row_index,
                    label: format!("R{}", row_index + 1),
                    seats: vec![None; layout.seats_per_row as usize],
                })
                .collect();
            let mut departments = BTreeMap::new();
            let mut occupied = 0;
            for a in plan.assignments.iter().filter(|a| a.room_id == layout.room_id) {
                let Some(slot) = grid
                    .get_mut(a.row_index as usize)
                    .and_then(|row| row.seats.get_mut(a.seat_index as usize))
                else {
                    continue;
                };
                *slot = Some(ExportSeat {
                    seat_index: a.seat_index,
                    label: a.label(),
                    roll_number: a.roll_number.clone(),
                    department: a.department.clone(),
                });
                *departments.entry(a.department.clone()).or_insert(0) += 1;
                occupied += 1;
            }
            ExportRoom {
                room_id: layout.room_id.clone(),
                building: layout.building.clone(),
                rows: layout.rows,
                seats_per_row: layout.seats_per_row,
                occupied,
                departments,
                grid,
            }
        })
        .collect();

    ExportLayout {
        exam_id: plan.exam_id.clone(),
        generation_id: plan.generation_id,
        total_students: plan.assignments.len(),
        rooms,
    }
}

/// Read-only lookups over committed plans. Without a generation, the latest is used.
#[derive(Debug, Clone, Copy)]
pub struct SeatingQueries<'a> {
    store: &'a PlanStore,
}

impl<'a> SeatingQueries<'a> {
    pub fn new(store: &'a PlanStore) -> Self {
        Self { store }
    }

    pub fn find_by_student(
        &self,
        exam_id: &ExamId,
        roll_number: &str,
    ) -> SeatingResult<SeatAssignment> {
        let plan = self.store.get(exam_id, None)?;
        plan.assignments
            .iter()
            .find(|a| a.roll_number == roll_number)
            .cloned()
            .ok_or_else(|| {
                SeatingError::NotFound(format!(
                    "student {roll_number} in seating plan for exam {exam_id}"
                ))
            })
    }

    /// Seats in one room, ordered by row then seat.
    pub fn find_by_room(
        &self,
        exam_id: &ExamId,
        room_id: &str,
    ) -> SeatingResult<Vec<SeatAssignment>> {
        let plan = self.store.get(exam_id, None)?;
        if !plan.rooms.iter().any(|r| r.room_id == room_id) {
            return Err(SeatingError::NotFound(format!(
                "room {room_id} in seating plan for exam {exam_id}"
            )));
        }
        let mut seats: Vec<SeatAssignment> = plan
            .assignments
            .iter()
            .filter(|a| a.room_id == room_id)
            .cloned()
            .collect();
        seats.sort_by_key(|a| (a.row_index, a.seat_index));
        Ok(seats)
    }

    /// Case-insensitive roll-number substring search, in fill order.
    pub fn search(&self, exam_id: &ExamId, fragment: &str) -> SeatingResult<Vec<SeatAssignment>> {
        let plan = self.store.get(exam_id, None)?;
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(plan
            .assignments
            .iter()
            .filter(|a| a.roll_number.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    pub fn export(
        &self,
        exam_id: &ExamId,
        generation_id: Option<GenerationId>,
    ) -> SeatingResult<ExportLayout> {
        let plan = self.store.get(exam_id, generation_id)?;
        Ok(export_plan(&plan))
    }

    pub fn conflicts(
        &self,
        exam_id: &ExamId,
        generation_id: Option<GenerationId>,
    ) -> SeatingResult<Vec<AdjacencyConflict>> {
        let plan = self.store.get(exam_id, generation_id)?;
        Ok(audit::adjacency_conflicts(&plan))
    }
}

use crate::data::{RoomId, SeatingPlan};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Two neighbouring seats held by the same department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyConflict {
    pub room_id: RoomId,
    pub department: String,
    pub first: String,
    pub second: String,
}

/// Same-department pairs sitting side by side or front to back, in plan order.
pub fn adjacency_conflicts(plan: &SeatingPlan) -> Vec<AdjacencyConflict> {
    let by_seat: HashMap<(&str, u32, u32), &str> = plan
        .assignments
        .iter()
        .map(|a| {
            (
                (a.room_id.as_str(), a.row_index, a.seat_index),
                a.department.as_str(),
            )
        })
        .collect();

    let mut conflicts = Vec::new();
    for a in &plan.assignments {
        let right = (a.room_id.as_str(), a.row_index, a.seat_index + 1);
        let behind = (a.room_id.as_str(), a.row_index + 1, a.seat_index);
        for other in [right, behind] {
            if by_seat.get(&other) == Some(&a.department.as_str()) {
                conflicts.push(AdjacencyConflict {
                    room_id: a.room_id.clone(),
                    department: a.department.clone(),
                    first: a.label(),
                    second: format!("R{}-S{}", other.1 + 1, other.2 + 1),
                });
            }
        }
    }
    conflicts
}

/// First breach of the plan's structural invariants, if any: one student per
/// seat, one seat per student, every seat inside a room of the plan.
pub fn structural_violation(plan: &SeatingPlan) -> Option<String> {
    let rooms: HashMap<&str, (u32, u32)> = plan
        .rooms
        .iter()
        .map(|r| (r.room_id.as_str(), (r.rows, r.seats_per_row)))
        .collect();
    if rooms.len() != plan.rooms.len() {
        return Some("a room appears twice in the plan layout".to_string());
    }

    let mut seats = HashSet::new();
    let mut students = HashSet::new();
    for a in &plan.assignments {
        if a.exam_id != plan.exam_id {
            return Some(format!(
                "{} is assigned for exam {} inside a plan for {}",
                a.roll_number, a.exam_id, plan.exam_id
            ));
        }
        match rooms.get(a.room_id.as_str()) {
            Some(&(rows, width)) if a.row_index < rows && a.seat_index < width => {}
            _ => return Some(format!("{} is outside the plan's rooms", a)),
        }
        if !seats.insert((a.room_id.as_str(), a.row_index, a.seat_index)) {
            return Some(format!(
                "seat {} {} is assigned twice",
                a.room_id,
                a.label()
            ));
        }
        if !students.insert(a.roll_number.as_str()) {
            return Some(format!("{} is seated twice", a.roll_number));
        }
    }
    None
}

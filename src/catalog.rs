use crate::data::{Room, RoomId, RoomSpec};
use crate::error::{SeatingError, SeatingResult};
use log::info;
use std::collections::HashSet;

/// Largest row count or seats-per-row a room may declare.
pub const MAX_ROOM_DIMENSION: u32 = 500;

/// Exam rooms in registration order.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    rooms: Vec<Room>,
}

impl RoomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds a room. Capacity is always rows × seats per row.
    pub fn register(&mut self, spec: RoomSpec) -> SeatingResult<RoomId> {
        let room_id = spec.room_id.trim().to_string();
        let building = spec.building.trim().to_string();
        if room_id.is_empty() {
            return Err(SeatingError::Validation("room id is empty".into()));
        }
        if building.is_empty() {
            return Err(SeatingError::Validation(format!(
                "room {room_id} has no building"
            )));
        }
        if spec.rows == 0 || spec.seats_per_row == 0 {
            return Err(SeatingError::Validation(format!(
                "room {room_id} needs at least one row and one seat per row (got {} x {})",
                spec.rows, spec.seats_per_row
            )));
        }
        if spec.rows > MAX_ROOM_DIMENSION || spec.seats_per_row > MAX_ROOM_DIMENSION {
            return Err(SeatingError::Validation(format!(
                "room {room_id} is too large ({} x {}, at most {MAX_ROOM_DIMENSION} each way)",
                spec.rows, spec.seats_per_row
            )));
        }
        if self.get(&room_id).is_some() {
            return Err(SeatingError::DuplicateRoom { room_id });
        }

        let room = Room::new(room_id.clone(), building, spec.rows, spec.seats_per_row);
        info!(
            "Registered room {} ({} rows x {} seats = {}).",
            room.room_id,
            room.rows(),
            room.seats_per_row(),
            room.capacity()
        );
        self.rooms.push(room);
        Ok(room_id)
    }

    pub fn list(&self) -> &[Room] {
        &self.rooms
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.room_id == room_id)
    }

    pub fn remove(&mut self, room_id: &str) -> SeatingResult<Room> {
        let pos = self
            .rooms
            .iter()
            .position(|r| r.room_id == room_id)
            .ok_or_else(|| SeatingError::NotFound(format!("room {room_id}")))?;
        Ok(self.rooms.remove(pos))
    }

    pub fn total_capacity(&self) -> u64 {
        self.rooms.iter().map(|r| u64::from(r.capacity())).sum()
    }

    /// Resolves a caller's room priority order. An empty selection means every
    /// room, in registration order.
    pub fn select(&self, room_ids: &[RoomId]) -> SeatingResult<Vec<Room>> {
        if room_ids.is_empty() {
            return Ok(self.rooms.clone());
        }
        let mut seen = HashSet::new();
        room_ids
            .iter()
            .map(|id| {
                if !seen.insert(id.as_str()) {
                    return Err(SeatingError::Validation(format!(
                        "room {id} selected more than once"
                    )));
                }
                self.get(id)
                    .cloned()
                    .ok_or_else(|| SeatingError::NotFound(format!("room {id}")))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, rows: u32, seats: u32) -> RoomSpec {
        RoomSpec {
            room_id: id.into(),
            building: "Block A".into(),
            rows,
            seats_per_row: seats,
        }
    }

    #[test]
    fn test_register_computes_capacity() {
        let mut catalog = RoomCatalog::new();
        catalog.register(spec("A-101", 6, 10)).unwrap();
        catalog.register(spec("A-201", 8, 10)).unwrap();
        assert_eq!(catalog.get("A-101").unwrap().capacity(), 60);
        assert_eq!(catalog.total_capacity(), 140);
        let ids: Vec<_> = catalog.list().iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(ids, ["A-101", "A-201"]);
    }

    #[test]
    fn test_register_rejects_bad_rooms() {
        let mut catalog = RoomCatalog::new();
        assert!(matches!(
            catalog.register(spec("A-101", 0, 10)),
            Err(SeatingError::Validation(_))
        ));
        assert!(matches!(
            catalog.register(spec("A-101", 3, 0)),
            Err(SeatingError::Validation(_))
        ));
        assert!(matches!(
            catalog.register(spec(" ", 3, 3)),
            Err(SeatingError::Validation(_))
        ));
        assert!(matches!(
            catalog.register(spec("A-101", 60_000, 60_000)),
            Err(SeatingError::Validation(_))
        ));
        assert!(matches!(
            catalog.register(spec("A-101", 2, MAX_ROOM_DIMENSION + 1)),
            Err(SeatingError::Validation(_))
        ));
        catalog.register(spec("HALL", MAX_ROOM_DIMENSION, MAX_ROOM_DIMENSION)).unwrap();
        catalog.register(spec("A-101", 3, 3)).unwrap();
        assert_eq!(
            catalog.register(spec("A-101", 4, 4)),
            Err(SeatingError::DuplicateRoom {
                room_id: "A-101".into()
            })
        );
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_select_keeps_caller_order() {
        let mut catalog = RoomCatalog::new();
        for id in ["A-101", "A-102", "B-105"] {
            catalog.register(spec(id, 2, 2)).unwrap();
        }
        let picked = catalog
            .select(&["B-105".to_string(), "A-101".to_string()])
            .unwrap();
        let ids: Vec<_> = picked.iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(ids, ["B-105", "A-101"]);

        assert_eq!(catalog.select(&[]).unwrap().len(), 3);
        assert!(matches!(
            catalog.select(&["Z-999".to_string()]),
            Err(SeatingError::NotFound(_))
        ));
        assert!(matches!(
            catalog.select(&["A-101".to_string(), "A-101".to_string()]),
            Err(SeatingError::Validation(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut catalog = RoomCatalog::new();
        catalog.register(spec("A-101", 2, 2)).unwrap();
        assert_eq!(catalog.remove("A-101").unwrap().room_id, "A-101");
        assert!(catalog.is_empty());
        assert!(matches!(catalog.remove("A-101"), Err(SeatingError::NotFound(_))));
    }
}

#![allow(dead_code)]

use exam_seating::data::{Exam, GenerationOptions, RawStudent, Room, RoomSpec, Student};
use exam_seating::catalog::RoomCatalog;
use exam_seating::roster::{self, LoadMode};

/// Raw rows for `count` students per department, roll numbers like `CS21001`.
pub fn raw_students(spec: &[(&str, usize)]) -> Vec<RawStudent> {
    spec.iter()
        .flat_map(|&(dept, count)| {
            (1..=count).map(move |i| RawStudent {
                roll_number: format!("{dept}21{i:03}"),
                name: format!("{dept} student {i}"),
                department: dept.to_string(),
                semester: "5".to_string(),
                section: Some("A".to_string()),
            })
        })
        .collect()
}

pub fn students(spec: &[(&str, usize)]) -> Vec<Student> {
    roster::load(&raw_students(spec), LoadMode::FailFast)
        .unwrap()
        .students()
        .to_vec()
}

pub fn room_spec(id: &str, rows: u32, seats_per_row: u32) -> RoomSpec {
    RoomSpec {
        room_id: id.to_string(),
        building: "Block A".to_string(),
        rows,
        seats_per_row,
    }
}

pub fn rooms(specs: &[(&str, u32, u32)]) -> Vec<Room> {
    let mut catalog = RoomCatalog::new();
    for &(id, rows, seats) in specs {
        catalog.register(room_spec(id, rows, seats)).unwrap();
    }
    catalog.list().to_vec()
}

pub fn exam(id: &str) -> Exam {
    Exam {
        exam_id: id.to_string(),
        name: format!("Exam {id}"),
        date: "2024-12-10".to_string(),
        departments: vec![],
        semesters: vec![],
    }
}

pub fn mixed(mode: exam_seating::data::AlgorithmMode, seed: u64) -> GenerationOptions {
    GenerationOptions {
        mode,
        seed,
        mix_departments: true,
    }
}

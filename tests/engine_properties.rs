mod common;

use common::{mixed, rooms, students};
use exam_seating::config::EngineSettings;
use exam_seating::data::{AlgorithmMode, GenerationOptions, Room, SeatingPlan, Student};
use exam_seating::engine::audit::{adjacency_conflicts, structural_violation};
use exam_seating::{CancellationToken, Engine, SeatingError, SeatingJob};
use std::collections::HashSet;
use std::time::Duration;

fn generate_with(
    engine: &Engine,
    students: &[Student],
    rooms: &[Room],
    options: GenerationOptions,
) -> Result<SeatingPlan, SeatingError> {
    let exam_id = "mid1".to_string();
    let job = SeatingJob {
        exam_id: &exam_id,
        generation_id: 1,
        students,
        rooms,
        options,
    };
    engine.generate(&job, &CancellationToken::new())
}

fn generate(
    students: &[Student],
    rooms: &[Room],
    options: GenerationOptions,
) -> Result<SeatingPlan, SeatingError> {
    generate_with(&Engine::default(), students, rooms, options)
}

fn assert_valid(plan: &SeatingPlan, expected_students: usize) {
    assert_eq!(plan.assignments.len(), expected_students);
    assert_eq!(structural_violation(plan), None);
    assert_eq!(adjacency_conflicts(plan), vec![]);
}

#[test]
fn three_departments_alternate_seed_42_fills_the_room() {
    let roster = students(&[("CS", 4), ("EC", 4), ("ME", 4)]);
    let room = rooms(&[("A-101", 3, 4)]);

    let plan = generate(&roster, &room, mixed(AlgorithmMode::Alternate, 42)).unwrap();
    assert_valid(&plan, 12);

    let again = generate(&roster, &room, mixed(AlgorithmMode::Alternate, 42)).unwrap();
    assert_eq!(
        serde_json::to_string(&plan).unwrap(),
        serde_json::to_string(&again).unwrap()
    );

    let other_seed = generate(&roster, &room, mixed(AlgorithmMode::Alternate, 7)).unwrap();
    assert_valid(&other_seed, 12);
}

#[test]
fn three_departments_random_mode_respects_adjacency() {
    let roster = students(&[("CS", 4), ("EC", 4), ("ME", 4)]);
    let room = rooms(&[("A-101", 3, 4)]);
    for seed in [42, 7, 0, 1234] {
        let plan = generate(&roster, &room, mixed(AlgorithmMode::Random, seed)).unwrap();
        assert_valid(&plan, 12);
    }
}

#[test]
fn random_mode_is_reproducible_and_seed_sensitive() {
    let roster = students(&[("CS", 10), ("EC", 8), ("ME", 7), ("CE", 5)]);
    let hall = rooms(&[("A-101", 6, 5)]);

    let a = generate(&roster, &hall, mixed(AlgorithmMode::Random, 99)).unwrap();
    let b = generate(&roster, &hall, mixed(AlgorithmMode::Random, 99)).unwrap();
    let c = generate(&roster, &hall, mixed(AlgorithmMode::Random, 100)).unwrap();
    assert_eq!(
        serde_json::to_vec(&a).unwrap(),
        serde_json::to_vec(&b).unwrap()
    );
    assert_ne!(a.assignments, c.assignments);
    assert_valid(&a, 30);
    assert_valid(&c, 30);
}

#[test]
fn input_order_does_not_change_the_plan() {
    let roster = students(&[("CS", 5), ("EC", 5), ("ME", 4)]);
    let reversed: Vec<Student> = roster.iter().rev().cloned().collect();
    let hall = rooms(&[("A-101", 3, 5)]);
    for mode in [AlgorithmMode::Sequential, AlgorithmMode::Alternate, AlgorithmMode::Random] {
        let forward = generate(&roster, &hall, mixed(mode, 5)).unwrap();
        let backward = generate(&reversed, &hall, mixed(mode, 5)).unwrap();
        assert_eq!(forward, backward, "mode {mode}");
    }
}

#[test]
fn many_rooms_and_departments_stay_unique_and_apart() {
    let roster = students(&[("CS", 12), ("EC", 10), ("ME", 9), ("CE", 8), ("EE", 6)]);
    let halls = rooms(&[("A-101", 4, 6), ("A-102", 3, 8)]);
    for seed in 0..8 {
        for mode in [AlgorithmMode::Alternate, AlgorithmMode::Random] {
            let plan = generate(&roster, &halls, mixed(mode, seed)).unwrap();
            assert_valid(&plan, 45);

            // A-101 fills before A-102 is opened
            let a101 = plan.assignments.iter().filter(|a| a.room_id == "A-101").count();
            assert_eq!(a101, 24);
        }
    }
}

#[test]
fn sequential_mode_orders_by_roll_number_row_major() {
    let roster = students(&[("EC", 3), ("CS", 3)]);
    let hall = rooms(&[("A-101", 2, 3)]);
    let plan = generate(&roster, &hall, mixed(AlgorithmMode::Sequential, 0)).unwrap();
    let seated: Vec<_> = plan
        .assignments
        .iter()
        .map(|a| (a.roll_number.as_str(), a.row_index, a.seat_index))
        .collect();
    assert_eq!(
        seated,
        [
            ("CS21001", 0, 0),
            ("CS21002", 0, 1),
            ("CS21003", 0, 2),
            ("EC21001", 1, 0),
            ("EC21002", 1, 1),
            ("EC21003", 1, 2),
        ]
    );
}

#[test]
fn unmixed_alternate_keeps_round_robin_without_checking() {
    let roster = students(&[("CS", 3), ("EC", 1)]);
    let hall = rooms(&[("A-101", 2, 2)]);
    let options = GenerationOptions {
        mode: AlgorithmMode::Alternate,
        seed: 0,
        mix_departments: false,
    };
    let plan = generate(&roster, &hall, options).unwrap();
    let rolls: Vec<_> = plan.assignments.iter().map(|a| a.roll_number.as_str()).collect();
    assert_eq!(rolls, ["CS21001", "EC21001", "CS21002", "CS21003"]);
}

#[test]
fn exact_capacity_succeeds_and_one_more_fails() {
    let hall = rooms(&[("A-101", 3, 4)]);

    let full = students(&[("CS", 6), ("EC", 6)]);
    let plan = generate(&full, &hall, mixed(AlgorithmMode::Alternate, 42)).unwrap();
    assert_valid(&plan, 12);

    let over = students(&[("CS", 7), ("EC", 6)]);
    let err = generate(&over, &hall, mixed(AlgorithmMode::Alternate, 42)).unwrap_err();
    assert_eq!(
        err,
        SeatingError::InsufficientCapacity {
            required: 13,
            capacity: 12,
            shortfall: 1,
        }
    );
}

#[test]
fn dominant_department_is_unsatisfiable_not_violated() {
    let roster = students(&[("CS", 10), ("EC", 2)]);
    let hall = rooms(&[("A-101", 3, 4)]);
    let err = generate(&roster, &hall, mixed(AlgorithmMode::Alternate, 42)).unwrap_err();
    let SeatingError::UnsatisfiableConstraint(detail) = err else {
        panic!("expected an unsatisfiable constraint, got {err:?}");
    };
    // one CS in the first seat already leaves nine for six spread-out seats
    assert_eq!(detail.room_id, "A-101");
    assert_eq!((detail.row_index, detail.seat_index), (0, 1));
    assert_eq!(detail.department.as_deref(), Some("CS"));
    assert_eq!(detail.blocked_departments, ["CS"]);
    assert_eq!(detail.remaining["CS"], 9);
    assert_eq!(detail.remaining["EC"], 2);

    // the same roster is fine once the adjacency rule is dropped
    let plan = generate(&roster, &hall, mixed(AlgorithmMode::Sequential, 42)).unwrap();
    assert_eq!(plan.assignments.len(), 12);
}

#[test]
fn exact_fallback_agrees_with_search_on_feasibility() {
    let roster = students(&[("CS", 8), ("EC", 7), ("ME", 5)]);
    let hall = rooms(&[("A-101", 4, 5)]);
    let starved = Engine::new(EngineSettings {
        search_budget: 3,
        exact_fallback: true,
    });
    let plan = generate_with(&starved, &roster, &hall, mixed(AlgorithmMode::Random, 11)).unwrap();
    assert_valid(&plan, 20);

    let infeasible = students(&[("CS", 11), ("EC", 9)]);
    let err = generate_with(&starved, &infeasible, &hall, mixed(AlgorithmMode::Random, 11))
        .unwrap_err();
    assert_eq!(err.kind(), "UnsatisfiableConstraintError");
}

#[test]
fn cancelled_run_reports_progress() {
    let roster = students(&[("CS", 20), ("EC", 20)]);
    let hall = rooms(&[("A-101", 5, 8)]);
    let exam_id = "mid1".to_string();
    let job = SeatingJob {
        exam_id: &exam_id,
        generation_id: 1,
        students: &roster,
        rooms: &hall,
        options: mixed(AlgorithmMode::Random, 3),
    };
    let token = CancellationToken::new();
    token.cancel();
    let err = Engine::default().generate(&job, &token).unwrap_err();
    assert_eq!(err, SeatingError::Cancelled { placed: 0, total: 40 });
}

#[test]
fn single_department_spreads_into_spare_seats() {
    let roster = students(&[("CS", 3)]);
    for halls in [
        rooms(&[("A-101", 1, 6)]),
        rooms(&[("A-101", 1, 6), ("B-105", 10, 10)]),
    ] {
        let plan = generate(&roster, &halls, GenerationOptions::default()).unwrap();
        assert_valid(&plan, 3);
        let seats: Vec<_> = plan
            .assignments
            .iter()
            .map(|a| (a.room_id.as_str(), a.row_index, a.seat_index))
            .collect();
        assert_eq!(seats, [("A-101", 0, 0), ("A-101", 0, 2), ("A-101", 0, 4)]);
    }
}

#[test]
fn bigger_last_room_rescues_a_crowded_department() {
    let roster = students(&[("CS", 10), ("EC", 2)]);
    let plan = generate(
        &roster,
        &rooms(&[("A-101", 4, 6)]),
        mixed(AlgorithmMode::Alternate, 42),
    )
    .unwrap();
    assert_valid(&plan, 12);
}

#[test]
fn deadline_expiring_mid_run_cancels() {
    let roster = students(&[("CS", 8000), ("EC", 8000), ("ME", 8000)]);
    let hall = rooms(&[("A-101", 150, 160)]);
    let exam_id = "mid1".to_string();
    let job = SeatingJob {
        exam_id: &exam_id,
        generation_id: 1,
        students: &roster,
        rooms: &hall,
        options: mixed(AlgorithmMode::Random, 3),
    };
    for engine in [
        Engine::default(),
        // budget spent at once, so the deadline must also stop the exact fallback
        Engine::new(EngineSettings {
            search_budget: 1,
            exact_fallback: true,
        }),
    ] {
        let token = CancellationToken::with_timeout(Duration::from_millis(5));
        let err = engine.generate(&job, &token).unwrap_err();
        let SeatingError::Cancelled { placed, total } = err else {
            panic!("expected cancellation, got {err:?}");
        };
        assert_eq!(total, 24_000);
        assert!(placed < total);
    }
}

#[test]
fn each_student_and_seat_used_once() {
    let roster = students(&[("CS", 9), ("EC", 9), ("ME", 9)]);
    let halls = rooms(&[("B-105", 2, 5), ("A-101", 3, 6)]);
    let plan = generate(&roster, &halls, mixed(AlgorithmMode::Random, 21)).unwrap();
    let seats: HashSet<_> = plan
        .assignments
        .iter()
        .map(|a| (a.room_id.clone(), a.row_index, a.seat_index))
        .collect();
    let rolls: HashSet<_> = plan.assignments.iter().map(|a| a.roll_number.clone()).collect();
    assert_eq!(seats.len(), 27);
    assert_eq!(rolls.len(), 27);
}

//! Constraint-based seat assignment.
//!
//! A run checks capacity, orders the students for the requested mode, lays the
//! selected rooms out in fill order and, when departments must be mixed,
//! searches for a department pattern with no two equal neighbours. Mixed runs
//! may leave spare seats of the last room they open empty; every earlier room
//! is filled completely. An exact ILP model takes over if the search budget
//! runs out before the search either succeeds or proves there is no answer.

pub mod audit;
pub mod cancel;
mod exact;
mod grid;
mod order;
mod search;

use crate::config::EngineSettings;
use crate::data::{
    ExamId, GenerationId, GenerationOptions, Room, SeatAssignment, SeatingPlan, Student,
};
use crate::error::{SeatingError, SeatingResult, UnsatisfiableDetail};
use cancel::CancellationToken;
use grid::SeatGrid;
use log::{debug, info, warn};
use search::{DeadEnd, DepartmentQueues, Dept, PlacementSearch, SearchOutcome, Stuck};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// Everything one run needs. Students and rooms are snapshots owned by the caller.
#[derive(Debug, Clone, Copy)]
pub struct SeatingJob<'a> {
    pub exam_id: &'a ExamId,
    pub generation_id: GenerationId,
    pub students: &'a [Student],
    pub rooms: &'a [Room],
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    settings: EngineSettings,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Produces a complete plan or fails without side effects.
    pub fn generate(
        &self,
        job: &SeatingJob<'_>,
        cancel: &CancellationToken,
    ) -> SeatingResult<SeatingPlan> {
        let start_time = Instant::now();
        validate_job(job)?;

        let n = job.students.len();
        info!(
            "Seating {} students for exam {} in {} rooms (mode {}, seed {}, mixing {}).",
            n,
            job.exam_id,
            job.rooms.len(),
            job.options.mode,
            job.options.seed,
            job.options.constrained()
        );
        if job.options.mix_departments && !job.options.constrained() {
            debug!("Sequential mode ignores department mixing.");
        }

        let order = order::preference_order(job.students, job.options.mode, job.options.seed);

        let (grid, seating) = if job.options.constrained() {
            let grid = SeatGrid::with_spare_seats(job.rooms, n);
            let seating = self.constrained(job, &grid, &order, cancel)?;
            (grid, seating)
        } else {
            for p in 0..n {
                cancel.check(p, n)?;
            }
            (SeatGrid::fill(job.rooms, n), order.into_iter().map(Some).collect())
        };

        let assignments = seating
            .iter()
            .enumerate()
            .filter_map(|(p, student)| student.map(|student| (p, student)))
            .map(|(p, student)| {
                let seat = grid.seat(p);
                let student = &job.students[student];
                SeatAssignment {
                    exam_id: job.exam_id.clone(),
                    room_id: job.rooms[seat.room].room_id.clone(),
                    row_index: seat.row,
                    seat_index: seat.seat,
                    roll_number: student.roll_number.clone(),
                    department: student.department.clone(),
                }
            })
            .collect();

        let plan = SeatingPlan {
            exam_id: job.exam_id.clone(),
            generation_id: job.generation_id,
            options: job.options,
            rooms: job.rooms.iter().map(Room::layout).collect(),
            assignments,
        };
        debug_assert_eq!(audit::structural_violation(&plan), None);
        debug_assert!(!job.options.constrained() || audit::adjacency_conflicts(&plan).is_empty());

        info!(
            "Seating plan {} generation {} built in {:.2?}",
            plan.exam_id,
            plan.generation_id,
            start_time.elapsed()
        );
        Ok(plan)
    }

    fn constrained(
        &self,
        job: &SeatingJob<'_>,
        grid: &SeatGrid,
        order: &[usize],
        cancel: &CancellationToken,
    ) -> SeatingResult<Vec<Option<usize>>> {
        let departments: Vec<&str> = {
            let mut seen = job
                .students
                .iter()
                .map(|s| s.department.as_str())
                .collect::<Vec<_>>();
            seen.sort_unstable();
            seen.dedup();
            seen
        };
        let dept_index: HashMap<&str, Dept> = departments
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, i))
            .collect();
        let dept_of: Vec<Dept> = job
            .students
            .iter()
            .map(|s| dept_index[s.department.as_str()])
            .collect();
        let queues = DepartmentQueues::new(order, &dept_of, departments.len());

        let search = PlacementSearch::new(grid, &queues, self.settings.search_budget);
        let dead_end = match search.run(cancel)? {
            SearchOutcome::Placed(pattern) => return Ok(queues.deal(&pattern)),
            SearchOutcome::Exhausted(dead_end) => {
                let reason = stuck_reason(&dead_end, &departments);
                return Err(unsatisfiable(job, grid, &departments, &dead_end, reason));
            }
            SearchOutcome::BudgetSpent(dead_end) => dead_end,
        };

        if !self.settings.exact_fallback {
            return Err(unsatisfiable(
                job,
                grid,
                &departments,
                &dead_end,
                format!(
                    "search budget of {} steps exhausted",
                    self.settings.search_budget
                ),
            ));
        }

        warn!(
            "Search budget of {} steps exhausted for exam {}; solving exactly.",
            self.settings.search_budget, job.exam_id
        );
        let n = job.students.len();
        let placed = dead_end.placed(n);
        cancel.check(placed, n)?;
        let counts: Vec<usize> = (0..departments.len()).map(|d| queues.count(d)).collect();
        let preferred: Vec<Dept> = order.iter().map(|&s| dept_of[s]).collect();
        let solved = exact::solve(
            grid,
            &counts,
            &preferred,
            job.options.seed,
            cancel.remaining(),
        );
        // a HiGHS run stopped by the time limit ends here
        cancel.check(placed, n)?;

        match solved {
            Ok(Some(pattern)) => Ok(queues.deal(&pattern)),
            Ok(None) => Err(unsatisfiable(
                job,
                grid,
                &departments,
                &dead_end,
                "no seating keeps every department apart".into(),
            )),
            Err(reason) => Err(unsatisfiable(job, grid, &departments, &dead_end, reason)),
        }
    }
}

fn validate_job(job: &SeatingJob<'_>) -> SeatingResult<()> {
    if job.students.is_empty() {
        return Err(SeatingError::Validation(format!(
            "no students to seat for exam {}",
            job.exam_id
        )));
    }
    if job.rooms.is_empty() {
        return Err(SeatingError::Validation(format!(
            "no rooms selected for exam {}",
            job.exam_id
        )));
    }

    let mut rolls = HashSet::new();
    if let Some(dup) = job
        .students
        .iter()
        .find(|s| !rolls.insert(s.roll_number.as_str()))
    {
        return Err(SeatingError::Validation(format!(
            "student {} appears twice",
            dup.roll_number
        )));
    }
    let mut room_ids = HashSet::new();
    if let Some(dup) = job.rooms.iter().find(|r| !room_ids.insert(r.room_id.as_str())) {
        return Err(SeatingError::Validation(format!(
            "room {} appears twice",
            dup.room_id
        )));
    }

    let required = u64::try_from(job.students.len()).unwrap_or(u64::MAX);
    let capacity: u64 = job.rooms.iter().map(|r| u64::from(r.capacity())).sum();
    if required > capacity {
        let clamp = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        return Err(SeatingError::InsufficientCapacity {
            required: clamp(required),
            capacity: clamp(capacity),
            shortfall: clamp(required - capacity),
        });
    }
    Ok(())
}

fn stuck_reason(dead_end: &DeadEnd, departments: &[&str]) -> String {
    let department = dead_end.department.map_or("", |d| departments[d]);
    match dead_end.stuck {
        Stuck::Blocked => {
            "no department can take this seat without sitting next to its own".to_string()
        }
        Stuck::Crowded { seats_left } => {
            let left = dead_end.department.map_or(0, |d| dead_end.remaining[d]);
            format!(
                "{department} still has {left} students but the seats from here on \
                 keep at most {seats_left} of them apart"
            )
        }
    }
}

fn unsatisfiable(
    job: &SeatingJob<'_>,
    grid: &SeatGrid,
    departments: &[&str],
    dead_end: &DeadEnd,
    reason: String,
) -> SeatingError {
    let seat = grid.seat(dead_end.position.min(grid.len().saturating_sub(1)));
    let detail = UnsatisfiableDetail {
        room_id: job.rooms[seat.room].room_id.clone(),
        row_index: seat.row,
        seat_index: seat.seat,
        department: dead_end.department.map(|d| departments[d].to_string()),
        blocked_departments: dead_end
            .blocked
            .iter()
            .map(|&d| departments[d].to_string())
            .collect(),
        remaining: dead_end
            .remaining
            .iter()
            .enumerate()
            .filter(|&(_, &left)| left > 0)
            .map(|(d, &left)| (departments[d].to_string(), left as u32))
            .collect::<BTreeMap<_, _>>(),
        reason,
    };
    warn!("Exam {} cannot be seated: {}", job.exam_id, detail);
    SeatingError::UnsatisfiableConstraint(detail)
}

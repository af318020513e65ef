use crate::catalog::RoomCatalog;
use crate::config::EngineSettings;
use crate::data::{
    Exam, ExamId, GenerateRequest, GenerationId, RawStudent, Room, RoomId, RoomSpec,
    SeatingPlan, Student,
};
use crate::engine::cancel::CancellationToken;
use crate::engine::{Engine, SeatingJob};
use crate::error::SeatingResult;
use crate::exams::ExamRegistry;
use crate::locks::ExamLocks;
use crate::query::SeatingQueries;
use crate::roster::{self, LoadMode, ValidatedRoster};
use crate::store::PlanStore;
use log::info;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub students: usize,
    pub rooms: usize,
    pub total_capacity: u64,
    pub exams: usize,
    pub plans_generated: usize,
}

/// The seating core with its state passed in explicitly: roster, rooms,
/// exams, committed plans and per-exam generation locks.
#[derive(Debug, Default)]
pub struct SeatingService {
    roster: RwLock<ValidatedRoster>,
    catalog: RwLock<RoomCatalog>,
    exams: RwLock<ExamRegistry>,
    store: PlanStore,
    locks: ExamLocks,
    engine: Engine,
}

impl SeatingService {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            engine: Engine::new(settings),
            ..Self::default()
        }
    }

    /// Replaces the roster if, and only if, every row validates.
    pub fn load_roster(&self, rows: &[RawStudent], mode: LoadMode) -> SeatingResult<usize> {
        let loaded = roster::load(rows, mode)?;
        let count = loaded.len();
        *self.roster.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        Ok(count)
    }

    pub fn students(&self) -> Vec<Student> {
        self.roster
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .students()
            .to_vec()
    }

    pub fn register_room(&self, spec: RoomSpec) -> SeatingResult<RoomId> {
        self.catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(spec)
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list()
            .to_vec()
    }

    pub fn remove_room(&self, room_id: &str) -> SeatingResult<Room> {
        self.catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(room_id)
    }

    pub fn register_exam(&self, exam: Exam) -> SeatingResult<ExamId> {
        self.exams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(exam)
    }

    pub fn exam(&self, exam_id: &str) -> SeatingResult<Exam> {
        self.exams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(exam_id)
            .cloned()
    }

    pub fn exams(&self) -> Vec<Exam> {
        self.exams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list()
            .cloned()
            .collect()
    }

    /// Generates and commits the exam's next seating plan.
    ///
    /// The exam's lock is held from snapshotting the inputs until the plan is
    /// committed, so generations for one exam never interleave. Any failure
    /// leaves the store untouched.
    pub fn generate(
        &self,
        exam_id: &str,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> SeatingResult<Arc<SeatingPlan>> {
        let exam = self.exam(exam_id)?;
        self.locks.with_exam(&exam.exam_id, || {
            let students = self
                .roster
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .eligible_for(&exam);
            let rooms = self
                .catalog
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .select(&request.room_ids)?;
            let generation_id = self.store.next_generation(&exam.exam_id);

            let job = SeatingJob {
                exam_id: &exam.exam_id,
                generation_id,
                students: &students,
                rooms: &rooms,
                options: request.options,
            };
            let plan = self.engine.generate(&job, cancel)?;
            self.store.commit(plan)?;
            info!(
                "Exam {} now at seating generation {}.",
                exam.exam_id, generation_id
            );
            self.store.get(&exam.exam_id, Some(generation_id))
        })
    }

    pub fn plan(
        &self,
        exam_id: &str,
        generation_id: Option<GenerationId>,
    ) -> SeatingResult<Arc<SeatingPlan>> {
        let exam = self.exam(exam_id)?;
        self.store.get(&exam.exam_id, generation_id)
    }

    pub fn generations(&self, exam_id: &str) -> SeatingResult<Vec<GenerationId>> {
        let exam = self.exam(exam_id)?;
        Ok(self.store.list_generations(&exam.exam_id))
    }

    pub fn queries(&self) -> SeatingQueries<'_> {
        SeatingQueries::new(&self.store)
    }

    pub fn summary(&self) -> Summary {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        Summary {
            students: self
                .roster
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            rooms: catalog.len(),
            total_capacity: catalog.total_capacity(),
            exams: self
                .exams
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .list()
                .count(),
            plans_generated: self.store.plan_count(),
        }
    }
}

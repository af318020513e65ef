use crate::data::{Exam, ExamId};
use crate::error::{SeatingError, SeatingResult};
use crate::roster::{MAX_SEMESTER, MIN_SEMESTER};
use log::info;
use std::collections::BTreeMap;

/// Registered exams, keyed by exam id.
#[derive(Debug, Clone, Default)]
pub struct ExamRegistry {
    exams: BTreeMap<ExamId, Exam>,
}

impl ExamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mut exam: Exam) -> SeatingResult<ExamId> {
        exam.exam_id = exam.exam_id.trim().to_string();
        if exam.exam_id.is_empty() {
            return Err(SeatingError::Validation("exam id is empty".into()));
        }
        if exam.name.trim().is_empty() {
            return Err(SeatingError::Validation(format!(
                "exam {} has no name",
                exam.exam_id
            )));
        }
        if let Some(bad) = exam
            .semesters
            .iter()
            .find(|s| !(MIN_SEMESTER..=MAX_SEMESTER).contains(*s))
        {
            return Err(SeatingError::Validation(format!(
                "exam {} filters on semester {bad}, expected {MIN_SEMESTER}-{MAX_SEMESTER}",
                exam.exam_id
            )));
        }
        if self.exams.contains_key(&exam.exam_id) {
            return Err(SeatingError::Validation(format!(
                "exam {} is already registered",
                exam.exam_id
            )));
        }
        info!("Registered exam {} ({}).", exam.exam_id, exam.name);
        let exam_id = exam.exam_id.clone();
        self.exams.insert(exam_id.clone(), exam);
        Ok(exam_id)
    }

    pub fn get(&self, exam_id: &str) -> SeatingResult<&Exam> {
        self.exams
            .get(exam_id)
            .ok_or_else(|| SeatingError::exam_not_found(exam_id))
    }

    pub fn list(&self) -> impl Iterator<Item = &Exam> {
        self.exams.values()
    }
}

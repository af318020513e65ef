use crate::data::ExamId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per exam, created on first use.
#[derive(Debug, Default)]
pub struct ExamLocks {
    locks: Mutex<HashMap<ExamId, Arc<Mutex<()>>>>,
}

impl ExamLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, exam_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(exam_id.to_string()).or_default().clone()
    }

    /// Runs `f` while holding the exam's lock. Other exams are not blocked.
    pub fn with_exam<T>(&self, exam_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.handle(exam_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

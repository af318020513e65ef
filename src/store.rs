use crate::data::{ExamId, GenerationId, SeatingPlan};
use crate::engine::audit;
use crate::error::{SeatingError, SeatingResult};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Owns every committed seating plan.
///
/// Plans are published whole under the write lock and handed out as shared,
/// immutable `Arc`s. Later generations supersede earlier ones; nothing is
/// ever removed.
#[derive(Debug, Default)]
pub struct PlanStore {
    plans: RwLock<HashMap<ExamId, Vec<Arc<SeatingPlan>>>>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a plan. Its generation must directly follow the exam's latest.
    pub fn commit(&self, plan: SeatingPlan) -> SeatingResult<GenerationId> {
        if let Some(violation) = audit::structural_violation(&plan) {
            return Err(SeatingError::Validation(format!(
                "refusing to commit plan for {}: {violation}",
                plan.exam_id
            )));
        }

        let mut plans = self.plans.write().unwrap_or_else(PoisonError::into_inner);
        let generations = plans.entry(plan.exam_id.clone()).or_default();
        let expected = next_after(generations.last().map(|p| p.generation_id));
        if plan.generation_id != expected {
            return Err(SeatingError::Validation(format!(
                "plan for {} has generation {}, expected {}",
                plan.exam_id, plan.generation_id, expected
            )));
        }

        let generation_id = plan.generation_id;
        info!(
            "Committed seating plan {} generation {} ({} seats).",
            plan.exam_id,
            generation_id,
            plan.assignments.len()
        );
        generations.push(Arc::new(plan));
        Ok(generation_id)
    }

    /// The requested generation, or the latest one when none is given.
    pub fn get(
        &self,
        exam_id: &ExamId,
        generation_id: Option<GenerationId>,
    ) -> SeatingResult<Arc<SeatingPlan>> {
        let plans = self.plans.read().unwrap_or_else(PoisonError::into_inner);
        let generations = plans.get(exam_id);
        let found = match generation_id {
            Some(id) => generations.and_then(|g| g.iter().find(|p| p.generation_id == id)),
            None => generations.and_then(|g| g.last()),
        };
        found
            .cloned()
            .ok_or_else(|| SeatingError::plan_not_found(exam_id, generation_id))
    }

    pub fn list_generations(&self, exam_id: &str) -> Vec<GenerationId> {
        let plans = self.plans.read().unwrap_or_else(PoisonError::into_inner);
        plans
            .get(exam_id)
            .map(|g| g.iter().map(|p| p.generation_id).collect())
            .unwrap_or_default()
    }

    pub fn latest_generation(&self, exam_id: &str) -> Option<GenerationId> {
        let plans = self.plans.read().unwrap_or_else(PoisonError::into_inner);
        plans
            .get(exam_id)
            .and_then(|g| g.last())
            .map(|p| p.generation_id)
    }

    pub fn next_generation(&self, exam_id: &str) -> GenerationId {
        next_after(self.latest_generation(exam_id))
    }

    pub fn plan_count(&self) -> usize {
        let plans = self.plans.read().unwrap_or_else(PoisonError::into_inner);
        plans.values().map(Vec::len).sum()
    }
}

fn next_after(latest: Option<GenerationId>) -> GenerationId {
    latest.map_or(1, |g| g + 1)
}

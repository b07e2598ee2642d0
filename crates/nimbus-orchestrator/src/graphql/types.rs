//! Read-only GraphQL views over `Plan`/`ProgressLog` (§6).

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use nimbus_core::model::{Phase, PhaseId, Plan, ProgressLog};

#[derive(Debug, Clone, SimpleObject)]
pub struct PhaseProgress {
    pub id: String,
    pub executor: String,
    pub state: String,
    pub is_leaf: bool,
    pub children: Vec<String>,
    pub error_class: Option<String>,
    pub message: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PhaseProgress {
    pub fn from_phase(plan: &Plan, progress: &ProgressLog, phase: &Phase) -> Self {
        let entry = progress.entries().find(|(id, _)| *id == &phase.id).map(|(_, e)| e);
        let children = phase
            .children
            .iter()
            .map(|&idx| plan.arena.get(idx).id.to_string())
            .collect();

        Self {
            id: phase.id.to_string(),
            executor: phase.executor.to_string(),
            state: progress.state_of(&phase.id).to_string(),
            is_leaf: phase.is_leaf(),
            children,
            error_class: entry.and_then(|e| e.error_class).map(|c| format!("{:?}", c)),
            message: entry.and_then(|e| e.message.clone()),
            updated_at: entry.map(|e| e.updated_at),
        }
    }

    pub fn lookup(plan: &Plan, progress: &ProgressLog, id: &PhaseId) -> Option<Self> {
        plan.phase(id).map(|phase| Self::from_phase(plan, progress, phase))
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct PlanSummary {
    pub operation_id: String,
    pub cluster_name: String,
    pub total_phases: i32,
    pub completed: i32,
    pub failed: i32,
    pub in_progress: i32,
    pub unstarted: i32,
}

impl PlanSummary {
    pub fn compute(plan: &Plan, progress: &ProgressLog) -> Self {
        use nimbus_core::model::PhaseState;

        let mut completed = 0;
        let mut failed = 0;
        let mut in_progress = 0;
        let mut unstarted = 0;

        for (_, phase) in plan.arena.iter() {
            match progress.state_of(&phase.id) {
                PhaseState::Completed | PhaseState::RolledBack => completed += 1,
                PhaseState::Failed => failed += 1,
                PhaseState::InProgress => in_progress += 1,
                PhaseState::Unstarted => unstarted += 1,
            }
        }

        Self {
            operation_id: plan.operation_id.clone(),
            cluster_name: plan.cluster_name.clone(),
            total_phases: plan.arena.len() as i32,
            completed,
            failed,
            in_progress,
            unstarted,
        }
    }
}

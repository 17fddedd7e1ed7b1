use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub estimated_hours: Option<u32>,
    pub assignee_role: Option<String>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseKpi {
    pub metric: String,
    pub target: String,
    pub measurement_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapPhase {
    pub phase_number: u32,
    pub title: String,
    pub description: String,
    pub duration_weeks: u32,
    pub tasks: Vec<RoadmapTask>,
    pub kpis: Vec<PhaseKpi>,
    pub resources_needed: Vec<String>,
    pub dependencies: Vec<String>,
    pub risks: Vec<String>,
}

/// Milestone plan generated for a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: Uuid,
    pub user_id: Uuid,
    pub idea_id: Option<Uuid>,
    pub title: String,
    pub strategy_title: String,
    pub strategy_description: String,
    pub total_duration_weeks: u32,
    pub phases: Vec<RoadmapPhase>,
    pub success_criteria: Vec<String>,
    pub budget_estimate: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Roadmap {
    /// Mark a task done/undone. Returns `false` when no task has that id.
    pub fn set_task_completed(&mut self, task_id: &str, completed: bool) -> bool {
        for phase in &mut self.phases {
            if let Some(task) = phase.tasks.iter_mut().find(|t| t.id == task_id) {
                task.is_completed = completed;
                return true;
            }
        }
        false
    }

    /// Fraction of tasks completed, 0.0 when there are no tasks.
    pub fn progress(&self) -> f64 {
        let total: usize = self.phases.iter().map(|p| p.tasks.len()).sum();
        if total == 0 {
            return 0.0;
        }
        let done = self
            .phases
            .iter()
            .flat_map(|p| &p.tasks)
            .filter(|t| t.is_completed)
            .count();
        done as f64 / total as f64
    }
}

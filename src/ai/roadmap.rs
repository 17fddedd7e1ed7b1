//! Execution roadmaps: prompt, lenient parsing and Markdown export.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::prompt::{parse_json_object, str_field, string_list, u64_field};
use super::{AiError, ChatMessage, ChatRequest};
use crate::models::{PhaseKpi, Roadmap, RoadmapPhase, RoadmapTask};

pub const ROADMAP_TEMPERATURE: f32 = 0.7;
pub const ROADMAP_MAX_TOKENS: u32 = 4000;
const DEFAULT_PHASE_WEEKS: u32 = 2;

const ROADMAP_SYSTEM_PROMPT: &str = r#"You are an elite Technical Program Manager. Translate a business strategy into a rigorous, operational execution roadmap made of phases, tickets and milestones.

Rules:
1. Phases follow their dependencies.
2. Assume a lean startup team unless told otherwise; leave room for QA and iteration.
3. Every phase ends with a measurable go/no-go milestone.
4. Tasks are granular enough to be tickets and name the tools they need.
5. Success criteria are binary or numeric.

Return ONLY raw JSON:
{
  "title": "Roadmap name",
  "total_duration_weeks": 12,
  "phases": [
    {
      "phase_number": 1,
      "title": "Phase name",
      "description": "One sentence goal",
      "duration_weeks": 3,
      "tasks": [
        {"id": "1.1", "title": "Verb-first task", "description": "What, how, output",
         "estimated_hours": 8, "assignee_role": "Backend Eng"}
      ],
      "kpis": [{"metric": "String", "target": "String with a number", "measurement_method": "String"}],
      "resources_needed": ["String"],
      "dependencies": ["String"],
      "risks": ["String"]
    }
  ],
  "success_criteria": ["String"],
  "budget_estimate": "$5,000 - $8,000"
}"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoadmapRequest {
    pub strategy_title: String,
    pub strategy_description: String,
    pub available_runway_months: Option<f64>,
    pub team_size: Option<u32>,
    pub budget_constraint: Option<String>,
    pub priority: Option<String>,
    /// Stored idea this roadmap executes, if any.
    pub idea_id: Option<Uuid>,
}

pub fn build_roadmap_request(request: &RoadmapRequest, user_context: Option<&str>) -> ChatRequest {
    let mut parts = vec![
        format!("Strategy to Execute: {}", request.strategy_title),
        format!("Description: {}", request.strategy_description),
    ];
    if let Some(runway) = request.available_runway_months {
        parts.push(format!("Available Runway: {runway:.1} months"));
    }
    if let Some(team) = request.team_size {
        parts.push(format!("Team Size: {team} people"));
    }
    if let Some(budget) = request.budget_constraint.as_deref() {
        parts.push(format!("Budget Constraint: {budget}"));
    }
    if let Some(priority) = request.priority.as_deref() {
        parts.push(format!("Priority: {priority}"));
    }
    if let Some(ctx) = user_context.filter(|c| !c.is_empty()) {
        parts.push(format!("Additional Context: {ctx}"));
    }
    let mut prompt = parts.join("\n");
    prompt.push_str("\n\nGenerate a detailed execution roadmap for this strategy.");

    ChatRequest::new(vec![
        ChatMessage::system(ROADMAP_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ])
    .temperature(ROADMAP_TEMPERATURE)
    .json()
    .max_tokens(ROADMAP_MAX_TOKENS)
}

/// Roadmap content as generated, before it is attached to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRoadmap {
    pub title: String,
    pub total_duration_weeks: u32,
    pub phases: Vec<RoadmapPhase>,
    pub success_criteria: Vec<String>,
    pub budget_estimate: Option<String>,
}

impl GeneratedRoadmap {
    pub fn into_roadmap(self, user_id: Uuid, request: &RoadmapRequest) -> Roadmap {
        Roadmap {
            id: Uuid::new_v4(),
            user_id,
            idea_id: request.idea_id,
            title: self.title,
            strategy_title: request.strategy_title.clone(),
            strategy_description: request.strategy_description.clone(),
            total_duration_weeks: self.total_duration_weeks,
            phases: self.phases,
            success_criteria: self.success_criteria,
            budget_estimate: self.budget_estimate,
            created_at: crate::db::now(),
        }
    }
}

fn parse_phase(index: usize, value: &Value) -> RoadmapPhase {
    let phase_number = u64_field(value, "phase_number").unwrap_or(index as u64 + 1) as u32;
    let tasks = value
        .get("tasks")
        .and_then(Value::as_array)
        .map(|tasks| {
            tasks
                .iter()
                .enumerate()
                .map(|(i, t)| RoadmapTask {
                    id: str_field(t, &["id"]).unwrap_or_else(|| format!("{phase_number}.{}", i + 1)),
                    title: str_field(t, &["title"]).unwrap_or_default(),
                    description: str_field(t, &["description"]).unwrap_or_default(),
                    estimated_hours: u64_field(t, "estimated_hours").map(|h| h as u32),
                    assignee_role: str_field(t, &["assignee_role"]),
                    is_completed: false,
                })
                .collect()
        })
        .unwrap_or_default();
    let kpis = value
        .get("kpis")
        .and_then(Value::as_array)
        .map(|kpis| {
            kpis.iter()
                .map(|k| PhaseKpi {
                    metric: str_field(k, &["metric"]).unwrap_or_default(),
                    target: str_field(k, &["target"]).unwrap_or_default(),
                    measurement_method: str_field(k, &["measurement_method", "tracking_method"])
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    RoadmapPhase {
        phase_number,
        title: str_field(value, &["title"]).unwrap_or_else(|| format!("Phase {}", index + 1)),
        description: str_field(value, &["description", "objective"]).unwrap_or_default(),
        duration_weeks: u64_field(value, "duration_weeks")
            .map(|w| w as u32)
            .unwrap_or(DEFAULT_PHASE_WEEKS),
        tasks,
        kpis,
        resources_needed: string_list(value, "resources_needed"),
        dependencies: string_list(value, "dependencies"),
        risks: string_list(value, "risks"),
    }
}

/// Parse the model's plan, filling anything missing with defaults.
pub fn parse_roadmap(raw: &str, fallback_title: &str) -> Result<GeneratedRoadmap, AiError> {
    let value = parse_json_object(raw)?;
    let phases: Vec<RoadmapPhase> = value
        .get("phases")
        .and_then(Value::as_array)
        .map(|phases| phases.iter().enumerate().map(|(i, p)| parse_phase(i, p)).collect())
        .unwrap_or_default();
    if phases.is_empty() {
        return Err(AiError::Malformed("roadmap has no phases".into()));
    }

    let total_duration_weeks = u64_field(&value, "total_duration_weeks")
        .map(|w| w as u32)
        .unwrap_or_else(|| phases.iter().map(|p| p.duration_weeks).sum());

    Ok(GeneratedRoadmap {
        title: str_field(&value, &["title"]).unwrap_or_else(|| fallback_title.to_string()),
        total_duration_weeks,
        phases,
        success_criteria: string_list(&value, "success_criteria"),
        budget_estimate: str_field(&value, &["budget_estimate"]),
    })
}

pub fn export_markdown(roadmap: &Roadmap) -> String {
    let mut lines = vec![
        format!("# {}", roadmap.title),
        String::new(),
        format!("**Strategy:** {}", roadmap.strategy_description),
        format!("**Total Duration:** {} weeks", roadmap.total_duration_weeks),
        format!("**Generated:** {}", roadmap.created_at.format("%Y-%m-%d %H:%M UTC")),
        String::new(),
    ];
    if let Some(budget) = &roadmap.budget_estimate {
        lines.push(format!("**Budget Estimate:** {budget}"));
        lines.push(String::new());
    }
    lines.push("---".into());
    lines.push(String::new());

    for phase in &roadmap.phases {
        lines.push(format!("## Phase {}: {}", phase.phase_number, phase.title));
        lines.push(String::new());
        lines.push(format!("**Duration:** {} weeks", phase.duration_weeks));
        lines.push(String::new());
        if !phase.description.is_empty() {
            lines.push(phase.description.clone());
            lines.push(String::new());
        }

        lines.push("### Tasks".into());
        lines.push(String::new());
        for task in &phase.tasks {
            let checkbox = if task.is_completed { "- [x]" } else { "- [ ]" };
            let hours = task
                .estimated_hours
                .map(|h| format!(" ({h}h)"))
                .unwrap_or_default();
            let role = task
                .assignee_role
                .as_deref()
                .map(|r| format!(" - *{r}*"))
                .unwrap_or_default();
            lines.push(format!("{checkbox} **{}** {}{hours}{role}", task.id, task.title));
            if !task.description.is_empty() {
                lines.push(format!("  - {}", task.description));
            }
        }
        lines.push(String::new());

        if !phase.kpis.is_empty() {
            lines.push("### KPIs".into());
            lines.push(String::new());
            lines.push("| Metric | Target | Measurement |".into());
            lines.push("|--------|--------|-------------|".into());
            for kpi in &phase.kpis {
                lines.push(format!(
                    "| {} | {} | {} |",
                    kpi.metric, kpi.target, kpi.measurement_method
                ));
            }
            lines.push(String::new());
        }
        push_list(&mut lines, "Resources Needed", &phase.resources_needed);
        push_list(&mut lines, "Dependencies", &phase.dependencies);
        push_list(&mut lines, "Risks", &phase.risks);
    }

    if !roadmap.success_criteria.is_empty() {
        lines.push("## Success Criteria".into());
        lines.push(String::new());
        for criterion in &roadmap.success_criteria {
            lines.push(format!("- {criterion}"));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("### {heading}"));
    lines.push(String::new());
    lines.extend(items.iter().map(|i| format!("- {i}")));
    lines.push(String::new());
}

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{json_column, optional, optional_uuid_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::Roadmap;

const ROADMAP_COLUMNS: &str = "id, user_id, idea_id, title, strategy_title, strategy_description,
     total_duration_weeks, phases, success_criteria, budget_estimate, created_at";

fn roadmap_from_row(row: &Row<'_>) -> rusqlite::Result<Roadmap> {
    Ok(Roadmap {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        idea_id: optional_uuid_column(row, 2)?,
        title: row.get(3)?,
        strategy_title: row.get(4)?,
        strategy_description: row.get(5)?,
        total_duration_weeks: row.get(6)?,
        phases: json_column(row, 7)?,
        success_criteria: json_column(row, 8)?,
        budget_estimate: row.get(9)?,
        created_at: row.get(10)?,
    })
}

pub fn insert_roadmap(conn: &Connection, roadmap: &Roadmap) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO roadmaps (id, user_id, idea_id, title, strategy_title, strategy_description,
                               total_duration_weeks, phases, success_criteria, budget_estimate,
                               created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            roadmap.id.to_string(),
            roadmap.user_id.to_string(),
            roadmap.idea_id.map(|id| id.to_string()),
            roadmap.title,
            roadmap.strategy_title,
            roadmap.strategy_description,
            roadmap.total_duration_weeks,
            serde_json::to_string(&roadmap.phases)?,
            serde_json::to_string(&roadmap.success_criteria)?,
            roadmap.budget_estimate,
            roadmap.created_at,
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn list_roadmaps(conn: &Connection, user_id: &Uuid) -> Result<Vec<Roadmap>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ROADMAP_COLUMNS} FROM roadmaps WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], roadmap_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_roadmap(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<Option<Roadmap>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {ROADMAP_COLUMNS} FROM roadmaps WHERE id = ?1 AND user_id = ?2"),
        params![id.to_string(), user_id.to_string()],
        roadmap_from_row,
    ))
}

/// Persist the phase document after a task toggle.
pub fn save_roadmap_phases(conn: &Connection, roadmap: &Roadmap) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE roadmaps SET phases = ?3 WHERE id = ?1 AND user_id = ?2",
        params![
            roadmap.id.to_string(),
            roadmap.user_id.to_string(),
            serde_json::to_string(&roadmap.phases)?,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Roadmap", roadmap.id));
    }
    Ok(())
}

pub fn delete_roadmap(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM roadmaps WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{now, test_user};
    use crate::models::{RoadmapPhase, RoadmapTask};

    fn roadmap(user_id: Uuid) -> Roadmap {
        Roadmap {
            id: Uuid::new_v4(),
            user_id,
            idea_id: None,
            title: "Launch annual plans".into(),
            strategy_title: "Annual plans".into(),
            strategy_description: "Discount for annual prepay".into(),
            total_duration_weeks: 4,
            phases: vec![RoadmapPhase {
                phase_number: 1,
                title: "Pricing".into(),
                description: String::new(),
                duration_weeks: 4,
                tasks: vec![RoadmapTask {
                    id: "1-1".into(),
                    title: "Draft price sheet".into(),
                    description: String::new(),
                    estimated_hours: Some(6),
                    assignee_role: Some("Founder".into()),
                    is_completed: false,
                }],
                kpis: vec![],
                resources_needed: vec![],
                dependencies: vec![],
                risks: vec![],
            }],
            success_criteria: vec!["10 annual customers".into()],
            budget_estimate: None,
            created_at: now(),
        }
    }

    #[test]
    fn phases_survive_storage() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "r@example.com");
        let stored = roadmap(user.id);
        insert_roadmap(&conn, &stored).unwrap();

        let fetched = get_roadmap(&conn, &user.id, &stored.id).unwrap().unwrap();
        assert_eq!(fetched.phases, stored.phases);
        assert_eq!(fetched.success_criteria, stored.success_criteria);
    }

    #[test]
    fn task_toggle_is_persisted() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "t@example.com");
        let mut stored = roadmap(user.id);
        insert_roadmap(&conn, &stored).unwrap();

        assert!(stored.set_task_completed("1-1", true));
        save_roadmap_phases(&conn, &stored).unwrap();

        let fetched = get_roadmap(&conn, &user.id, &stored.id).unwrap().unwrap();
        assert!(fetched.phases[0].tasks[0].is_completed);
        assert_eq!(fetched.progress(), 1.0);
    }
}

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{now, optional, uuid_column};
use crate::db::DatabaseError;
use crate::models::{Scenario, ScenarioInput};

const SCENARIO_COLUMNS: &str = "id, user_id, name, description, expense_change, revenue_change,
     cash_injection, created_at, updated_at";

fn scenario_from_row(row: &Row<'_>) -> rusqlite::Result<Scenario> {
    Ok(Scenario {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        expense_change: row.get(4)?,
        revenue_change: row.get(5)?,
        cash_injection: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert_scenario(
    conn: &Connection,
    user_id: &Uuid,
    input: &ScenarioInput,
) -> Result<Scenario, DatabaseError> {
    let at = now();
    let scenario = Scenario {
        id: Uuid::new_v4(),
        user_id: *user_id,
        name: input.name.clone(),
        description: input.description.clone(),
        expense_change: input.expense_change,
        revenue_change: input.revenue_change,
        cash_injection: input.cash_injection,
        created_at: at,
        updated_at: at,
    };
    conn.execute(
        "INSERT INTO scenarios (id, user_id, name, description, expense_change, revenue_change,
                                cash_injection, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            scenario.id.to_string(),
            scenario.user_id.to_string(),
            scenario.name,
            scenario.description,
            scenario.expense_change,
            scenario.revenue_change,
            scenario.cash_injection,
            scenario.created_at,
            scenario.updated_at,
        ],
    )?;
    Ok(scenario)
}

/// Newest first.
pub fn list_scenarios(conn: &Connection, user_id: &Uuid) -> Result<Vec<Scenario>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCENARIO_COLUMNS} FROM scenarios WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], scenario_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_scenario(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<Option<Scenario>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {SCENARIO_COLUMNS} FROM scenarios WHERE id = ?1 AND user_id = ?2"),
        params![id.to_string(), user_id.to_string()],
        scenario_from_row,
    ))
}

pub fn update_scenario(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
    input: &ScenarioInput,
) -> Result<Option<Scenario>, DatabaseError> {
    let updated = conn.execute(
        "UPDATE scenarios SET name = ?3, description = ?4, expense_change = ?5,
                revenue_change = ?6, cash_injection = ?7, updated_at = ?8
         WHERE id = ?1 AND user_id = ?2",
        params![
            id.to_string(),
            user_id.to_string(),
            input.name,
            input.description,
            input.expense_change,
            input.revenue_change,
            input.cash_injection,
            now(),
        ],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_scenario(conn, user_id, id)
}

pub fn delete_scenario(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM scenarios WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_user;

    fn hire() -> ScenarioInput {
        ScenarioInput {
            name: "Hire two engineers".into(),
            description: None,
            expense_change: 25_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn empty_list_for_new_user() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "e@example.com");
        assert!(list_scenarios(&conn, &user.id).unwrap().is_empty());
    }

    #[test]
    fn crud_cycle() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "crud@example.com");
        let created = insert_scenario(&conn, &user.id, &hire()).unwrap();

        let mut changed = hire();
        changed.name = "Hire one engineer".into();
        changed.expense_change = 12_500.0;
        let updated = update_scenario(&conn, &user.id, &created.id, &changed)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Hire one engineer");
        assert_eq!(updated.expense_change, 12_500.0);
        assert_eq!(updated.created_at, created.created_at);

        assert!(delete_scenario(&conn, &user.id, &created.id).unwrap());
        assert!(get_scenario(&conn, &user.id, &created.id).unwrap().is_none());
    }

    #[test]
    fn other_users_cannot_see_scenario() {
        let conn = open_memory_database().unwrap();
        let owner = test_user(&conn, "owner@example.com");
        let other = test_user(&conn, "other@example.com");
        let created = insert_scenario(&conn, &owner.id, &hire()).unwrap();
        assert!(get_scenario(&conn, &other.id, &created.id).unwrap().is_none());
        assert!(list_scenarios(&conn, &other.id).unwrap().is_empty());
    }
}

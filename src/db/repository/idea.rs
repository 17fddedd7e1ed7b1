use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{enum_column, optional, uuid_column};
use crate::db::DatabaseError;
use crate::models::Idea;

const IDEA_COLUMNS: &str =
    "id, user_id, title, description, feasibility_score, difficulty, context, created_at";

fn idea_from_row(row: &Row<'_>) -> rusqlite::Result<Idea> {
    Ok(Idea {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        feasibility_score: row.get(4)?,
        difficulty: enum_column(row, 5)?,
        context: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Store a batch of generated ideas in one transaction.
pub fn insert_ideas(conn: &mut Connection, ideas: &[Idea]) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO ideas (id, user_id, title, description, feasibility_score, difficulty,
                                context, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for idea in ideas {
            stmt.execute(params![
                idea.id.to_string(),
                idea.user_id.to_string(),
                idea.title,
                idea.description,
                idea.feasibility_score,
                idea.difficulty.as_str(),
                idea.context,
                idea.created_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Newest first.
pub fn list_ideas(conn: &Connection, user_id: &Uuid) -> Result<Vec<Idea>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {IDEA_COLUMNS} FROM ideas WHERE user_id = ?1 ORDER BY created_at DESC, rowid ASC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], idea_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_idea(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<Option<Idea>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE id = ?1 AND user_id = ?2"),
        params![id.to_string(), user_id.to_string()],
        idea_from_row,
    ))
}

pub fn delete_idea(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM ideas WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{now, test_user};
    use crate::models::enums::Difficulty;

    fn idea(user_id: Uuid, title: &str) -> Idea {
        Idea {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: "Sell annual plans".into(),
            feasibility_score: 8,
            difficulty: Difficulty::Low,
            context: Some("runway 4 months".into()),
            created_at: now(),
        }
    }

    #[test]
    fn batch_insert_and_list() {
        let mut conn = open_memory_database().unwrap();
        let user = test_user(&conn, "i@example.com");
        insert_ideas(&mut conn, &[idea(user.id, "A"), idea(user.id, "B")]).unwrap();

        let ideas = list_ideas(&conn, &user.id).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].difficulty, Difficulty::Low);
        assert_eq!(ideas[0].feasibility_score, 8);
    }

    #[test]
    fn delete_is_scoped() {
        let mut conn = open_memory_database().unwrap();
        let owner = test_user(&conn, "a@example.com");
        let other = test_user(&conn, "b@example.com");
        let stored = idea(owner.id, "A");
        insert_ideas(&mut conn, std::slice::from_ref(&stored)).unwrap();

        assert!(!delete_idea(&conn, &other.id, &stored.id).unwrap());
        assert!(get_idea(&conn, &owner.id, &stored.id).unwrap().is_some());
        assert!(delete_idea(&conn, &owner.id, &stored.id).unwrap());
    }
}

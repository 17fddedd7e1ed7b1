use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{now, optional, uuid_column};
use crate::db::DatabaseError;
use crate::models::{FinancialRecord, FinancialRecordInput};

const RECORD_COLUMNS: &str = "id, user_id, month, revenue_recurring, revenue_one_time,
     expenses_salaries, expenses_marketing, expenses_infrastructure, expenses_other,
     cash_balance, created_at, updated_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FinancialRecord> {
    Ok(FinancialRecord {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        month: row.get(2)?,
        revenue_recurring: row.get(3)?,
        revenue_one_time: row.get(4)?,
        expenses_salaries: row.get(5)?,
        expenses_marketing: row.get(6)?,
        expenses_infrastructure: row.get(7)?,
        expenses_other: row.get(8)?,
        cash_balance: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Insert the month, or overwrite it when the user already has a record for
/// that month. Returns the stored record.
pub fn upsert_financial_record(
    conn: &Connection,
    user_id: &Uuid,
    input: &FinancialRecordInput,
) -> Result<FinancialRecord, DatabaseError> {
    let at = now();
    conn.execute(
        "INSERT INTO financial_records (id, user_id, month, revenue_recurring, revenue_one_time,
                expenses_salaries, expenses_marketing, expenses_infrastructure, expenses_other,
                cash_balance, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
         ON CONFLICT (user_id, month) DO UPDATE SET
                revenue_recurring = excluded.revenue_recurring,
                revenue_one_time = excluded.revenue_one_time,
                expenses_salaries = excluded.expenses_salaries,
                expenses_marketing = excluded.expenses_marketing,
                expenses_infrastructure = excluded.expenses_infrastructure,
                expenses_other = excluded.expenses_other,
                cash_balance = excluded.cash_balance,
                updated_at = excluded.updated_at",
        params![
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            input.month,
            input.revenue_recurring,
            input.revenue_one_time,
            input.expenses_salaries,
            input.expenses_marketing,
            input.expenses_infrastructure,
            input.expenses_other,
            input.cash_balance,
            at,
        ],
    )?;

    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM financial_records WHERE user_id = ?1 AND month = ?2"),
        params![user_id.to_string(), input.month],
        record_from_row,
    )
    .map_err(DatabaseError::from)
}

/// Upsert a batch of months in one transaction. Either every month is
/// stored or none is.
pub fn upsert_financial_records(
    conn: &mut Connection,
    user_id: &Uuid,
    inputs: &[FinancialRecordInput],
) -> Result<usize, DatabaseError> {
    let tx = conn.transaction()?;
    for input in inputs {
        upsert_financial_record(&tx, user_id, input)?;
    }
    tx.commit()?;
    Ok(inputs.len())
}

/// All of the user's records, oldest month first.
pub fn list_financial_records(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<FinancialRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM financial_records WHERE user_id = ?1 ORDER BY month ASC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], record_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// The last `limit` months, returned oldest first.
pub fn recent_financial_records(
    conn: &Connection,
    user_id: &Uuid,
    limit: usize,
) -> Result<Vec<FinancialRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM financial_records WHERE user_id = ?1
         ORDER BY month DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], record_from_row)?;
    let mut records = rows.collect::<Result<Vec<_>, _>>()?;
    records.reverse();
    Ok(records)
}

pub fn latest_financial_record(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<FinancialRecord>, DatabaseError> {
    Ok(recent_financial_records(conn, user_id, 1)?.pop())
}

pub fn count_financial_records(conn: &Connection, user_id: &Uuid) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM financial_records WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )?)
}

pub fn get_financial_record(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<Option<FinancialRecord>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM financial_records WHERE id = ?1 AND user_id = ?2"),
        params![id.to_string(), user_id.to_string()],
        record_from_row,
    ))
}

/// Replace every field of an existing record. Moving it onto a month that
/// already has a record fails with a UNIQUE violation.
pub fn update_financial_record(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
    input: &FinancialRecordInput,
) -> Result<Option<FinancialRecord>, DatabaseError> {
    let updated = conn.execute(
        "UPDATE financial_records SET month = ?3, revenue_recurring = ?4, revenue_one_time = ?5,
                expenses_salaries = ?6, expenses_marketing = ?7, expenses_infrastructure = ?8,
                expenses_other = ?9, cash_balance = ?10, updated_at = ?11
         WHERE id = ?1 AND user_id = ?2",
        params![
            id.to_string(),
            user_id.to_string(),
            input.month,
            input.revenue_recurring,
            input.revenue_one_time,
            input.expenses_salaries,
            input.expenses_marketing,
            input.expenses_infrastructure,
            input.expenses_other,
            input.cash_balance,
            now(),
        ],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_financial_record(conn, user_id, id)
}

pub fn delete_financial_record(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM financial_records WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_user;

    fn month(m: &str, revenue: f64, expenses: f64, cash: f64) -> FinancialRecordInput {
        FinancialRecordInput::from_totals(m, revenue, expenses, cash)
    }

    #[test]
    fn upsert_replaces_same_month() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "f@example.com");

        let first = upsert_financial_record(&conn, &user.id, &month("2024-03", 1.0, 2.0, 3.0)).unwrap();
        let second =
            upsert_financial_record(&conn, &user.id, &month("2024-03", 10.0, 20.0, 30.0)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.cash_balance, 30.0);
        assert_eq!(count_financial_records(&conn, &user.id).unwrap(), 1);
    }

    #[test]
    fn batch_upsert_stores_every_month() {
        let mut conn = open_memory_database().unwrap();
        let user = test_user(&conn, "batch@example.com");
        let inputs = [
            month("2024-01", 1.0, 2.0, 3.0),
            month("2024-02", 4.0, 5.0, 6.0),
            month("2024-01", 7.0, 8.0, 9.0),
        ];

        assert_eq!(upsert_financial_records(&mut conn, &user.id, &inputs).unwrap(), 3);
        let records = list_financial_records(&conn, &user.id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cash_balance, 9.0);
    }

    #[test]
    fn batch_upsert_rolls_back_on_failure() {
        let mut conn = open_memory_database().unwrap();
        let user = test_user(&conn, "rollback@example.com");
        conn.execute_batch(
            "CREATE TEMP TRIGGER reject_february BEFORE INSERT ON financial_records
             WHEN NEW.month = '2024-02'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
        let inputs = [
            month("2024-01", 1.0, 2.0, 3.0),
            month("2024-02", 4.0, 5.0, 6.0),
            month("2024-03", 7.0, 8.0, 9.0),
        ];

        assert!(upsert_financial_records(&mut conn, &user.id, &inputs).is_err());
        assert_eq!(count_financial_records(&conn, &user.id).unwrap(), 0);
    }

    #[test]
    fn list_is_ordered_and_recent_keeps_tail() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "l@example.com");
        for m in ["2024-03", "2024-01", "2024-02"] {
            upsert_financial_record(&conn, &user.id, &month(m, 0.0, 0.0, 0.0)).unwrap();
        }

        let months: Vec<_> = list_financial_records(&conn, &user.id)
            .unwrap()
            .into_iter()
            .map(|r| r.month)
            .collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);

        let recent = recent_financial_records(&conn, &user.id, 2).unwrap();
        assert_eq!(recent[0].month, "2024-02");
        assert_eq!(recent[1].month, "2024-03");
        assert_eq!(latest_financial_record(&conn, &user.id).unwrap().unwrap().month, "2024-03");
    }

    #[test]
    fn records_are_scoped_to_owner() {
        let conn = open_memory_database().unwrap();
        let alice = test_user(&conn, "alice@example.com");
        let bob = test_user(&conn, "bob@example.com");
        let record = upsert_financial_record(&conn, &alice.id, &month("2024-01", 0.0, 0.0, 0.0)).unwrap();

        assert!(get_financial_record(&conn, &bob.id, &record.id).unwrap().is_none());
        assert!(!delete_financial_record(&conn, &bob.id, &record.id).unwrap());
        assert!(update_financial_record(&conn, &bob.id, &record.id, &month("2024-01", 1.0, 1.0, 1.0))
            .unwrap()
            .is_none());
        assert!(delete_financial_record(&conn, &alice.id, &record.id).unwrap());
    }

    #[test]
    fn update_onto_existing_month_conflicts() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "u@example.com");
        upsert_financial_record(&conn, &user.id, &month("2024-01", 0.0, 0.0, 0.0)).unwrap();
        let feb = upsert_financial_record(&conn, &user.id, &month("2024-02", 0.0, 0.0, 0.0)).unwrap();

        let err = update_financial_record(&conn, &user.id, &feb.id, &month("2024-01", 0.0, 0.0, 0.0))
            .unwrap_err();
        assert!(err.is_unique_violation());
    }
}

//! Disposition repository: call outcomes keyed by phone number.

use std::collections::HashSet;

use rusqlite::params;
use serde::Serialize;

use super::{now_timestamp, Database, DatabaseError};

/// An active disposition type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispositionType {
    pub name: String,
    pub description: Option<String>,
}

/// A disposition ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDisposition {
    pub phone_number: String,
    pub disposition_type: String,
    pub notes: Option<String>,
}

/// Aggregate count per disposition type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispositionStat {
    pub disposition_type: String,
    pub description: Option<String>,
    pub count: u64,
    pub last_updated: String,
}

/// Active disposition types ordered by name.
pub fn active_types(db: &Database) -> Result<Vec<DispositionType>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT name, description FROM disposition_types WHERE is_active = 1 ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DispositionType {
                    name: row.get(0)?,
                    description: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns which of `phones` already carry a disposition.
pub fn existing_phones(
    db: &Database,
    phones: &HashSet<String>,
) -> Result<HashSet<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT 1 FROM dispositions WHERE phone_number = ?1")?;
        let mut found = HashSet::new();
        for phone in phones {
            if stmt.exists(params![phone])? {
                found.insert(phone.clone());
            }
        }
        Ok(found)
    })
}

/// Inserts or replaces dispositions in a single transaction. Either every
/// row is written or none is.
pub fn upsert_all(
    db: &Database,
    dispositions: &[NewDisposition],
    created_by: &str,
) -> Result<usize, DatabaseError> {
    let now = now_timestamp();
    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO dispositions (phone_number, disposition_type, notes, created_by, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(phone_number) DO UPDATE SET
                   disposition_type = excluded.disposition_type,
                   notes = excluded.notes,
                   updated_at = excluded.updated_at",
            )?;
            for disposition in dispositions {
                stmt.execute(params![
                    disposition.phone_number,
                    disposition.disposition_type,
                    disposition.notes,
                    created_by,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(dispositions.len())
    })
}

/// Deletes dispositions for the given phones, returning how many were removed.
pub fn delete_phones(db: &Database, phones: &[String]) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("DELETE FROM dispositions WHERE phone_number = ?1")?;
        let mut removed = 0;
        for phone in phones {
            removed += stmt.execute(params![phone])?;
        }
        Ok(removed)
    })
}

/// Per-type counts, most frequent first.
pub fn stats(db: &Database) -> Result<Vec<DispositionStat>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT d.disposition_type, dt.description, COUNT(*) AS count, MAX(d.updated_at)
             FROM dispositions d
             JOIN disposition_types dt ON d.disposition_type = dt.name
             GROUP BY d.disposition_type, dt.description
             ORDER BY count DESC, d.disposition_type",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DispositionStat {
                    disposition_type: row.get(0)?,
                    description: row.get(1)?,
                    count: row.get(2)?,
                    last_updated: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Dispositions created or updated on the given `YYYY-MM-DD` date.
pub fn count_on_date(db: &Database, date: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM dispositions WHERE substr(updated_at, 1, 10) = ?1",
            params![date],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn disp(phone: &str, kind: &str) -> NewDisposition {
        NewDisposition {
            phone_number: phone.to_string(),
            disposition_type: kind.to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_active_types_sorted() {
        let db = test_db();
        let types = active_types(&db).unwrap();
        assert_eq!(types.len(), 10);
        assert_eq!(types[0].name, "Busy");
        assert!(types.iter().any(|t| t.name == "DNC"));
    }

    #[test]
    fn test_upsert_replaces_existing_phone() {
        let db = test_db();
        upsert_all(&db, &[disp("5550001", "Busy")], "system").unwrap();
        let mut again = disp("5550001", "DNC");
        again.notes = Some("asked to stop".to_string());
        upsert_all(&db, &[again], "system").unwrap();

        let stats = stats(&db).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].disposition_type, "DNC");
        assert_eq!(stats[0].count, 1);
    }

    #[test]
    fn test_upsert_rolls_back_on_unknown_type() {
        let db = test_db();
        let result = upsert_all(
            &db,
            &[disp("5550001", "Busy"), disp("5550002", "Nonsense")],
            "system",
        );
        assert!(result.is_err());

        let phones: HashSet<String> = ["5550001".to_string()].into_iter().collect();
        assert!(existing_phones(&db, &phones).unwrap().is_empty());
    }

    #[test]
    fn test_existing_and_delete() {
        let db = test_db();
        upsert_all(&db, &[disp("1", "Busy"), disp("2", "Voicemail")], "system").unwrap();

        let wanted: HashSet<String> = ["1", "3"].iter().map(|s| s.to_string()).collect();
        let found = existing_phones(&db, &wanted).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains("1"));

        let removed = delete_phones(&db, &["1".to_string(), "3".to_string()]).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_count_on_date() {
        let db = test_db();
        upsert_all(&db, &[disp("1", "Busy")], "system").unwrap();
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(count_on_date(&db, &today).unwrap(), 1);
        assert_eq!(count_on_date(&db, "1999-01-01").unwrap(), 0);
    }
}

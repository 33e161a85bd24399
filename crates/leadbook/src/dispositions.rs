//! Disposition import and maintenance.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::contact::normalize_phone;
use crate::db::disposition_repo::{self, DispositionStat, DispositionType, NewDisposition};
use crate::db::Database;
use crate::error::DispositionError;
use crate::ingest::{reader, IngestError};

pub const PHONE_COLUMN: &str = "phone_number";
pub const TYPE_COLUMN: &str = "disposition_type";
pub const NOTES_COLUMN: &str = "notes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    /// Phones that already had a disposition and were overwritten.
    pub updated: usize,
}

/// Validates a disposition CSV and upserts every row in one transaction.
/// Nothing is written when any row is invalid.
pub fn import(
    db: &Database,
    content: &str,
    created_by: &str,
) -> Result<ImportReport, DispositionError> {
    let parsed = reader::parse(content).map_err(|e| match e {
        IngestError::EmptyInput => DispositionError::EmptyInput,
        other => DispositionError::Parse(other.to_string()),
    })?;

    let missing: Vec<String> = [PHONE_COLUMN, TYPE_COLUMN]
        .iter()
        .filter(|c| !parsed.headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DispositionError::MissingColumns(missing));
    }

    let valid_types: HashSet<String> = disposition_repo::active_types(db)?
        .into_iter()
        .map(|t| t.name)
        .collect();

    let mut rows = Vec::with_capacity(parsed.records.len());
    for (index, record) in parsed.records.iter().enumerate() {
        // Header is line 1.
        let row = index + 2;
        let kind = record.get(TYPE_COLUMN).unwrap_or_default();
        if !valid_types.contains(kind) {
            return Err(DispositionError::InvalidDispositionType {
                row,
                value: kind.to_string(),
            });
        }
        let raw_phone = record.get(PHONE_COLUMN).unwrap_or_default();
        let phone = normalize_phone(raw_phone);
        if phone.is_empty() {
            return Err(DispositionError::InvalidPhone {
                row,
                value: raw_phone.to_string(),
            });
        }
        rows.push(NewDisposition {
            phone_number: phone,
            disposition_type: kind.to_string(),
            notes: record
                .get(NOTES_COLUMN)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        });
    }

    let phones: HashSet<String> = rows.iter().map(|r| r.phone_number.clone()).collect();
    let updated = disposition_repo::existing_phones(db, &phones)?.len();
    let imported = disposition_repo::upsert_all(db, &rows, created_by)?;

    info!(imported, updated, "Imported dispositions");
    Ok(ImportReport { imported, updated })
}

/// Deletes dispositions for the given phones (normalized to digits).
pub fn delete(db: &Database, phones: &[String]) -> Result<usize, DispositionError> {
    let phones: Vec<String> = phones
        .iter()
        .map(|p| normalize_phone(p))
        .filter(|p| !p.is_empty())
        .collect();
    if phones.is_empty() {
        return Err(DispositionError::NoPhoneNumbers);
    }
    Ok(disposition_repo::delete_phones(db, &phones)?)
}

pub fn stats(db: &Database) -> Result<Vec<DispositionStat>, DispositionError> {
    Ok(disposition_repo::stats(db)?)
}

pub fn types(db: &Database) -> Result<Vec<DispositionType>, DispositionError> {
    Ok(disposition_repo::active_types(db)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_import_and_reimport() {
        let db = test_db();
        let report = import(
            &db,
            "phone_number,disposition_type,notes\n(555) 000-1111,DNC,angry\n5550002222,Busy,\n",
            "tester",
        )
        .unwrap();
        assert_eq!(report, ImportReport { imported: 2, updated: 0 });

        let report = import(&db, "phone_number,disposition_type\n5550001111,Callback\n", "t").unwrap();
        assert_eq!(report, ImportReport { imported: 1, updated: 1 });

        let stats = stats(&db).unwrap();
        let kinds: Vec<&str> = stats.iter().map(|s| s.disposition_type.as_str()).collect();
        assert!(kinds.contains(&"Callback"));
        assert!(!kinds.contains(&"DNC"));
    }

    #[test]
    fn test_import_missing_columns() {
        let db = test_db();
        match import(&db, "phone,notes\n1,x\n", "t") {
            Err(DispositionError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["phone_number", "disposition_type"]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_import_empty() {
        let db = test_db();
        assert!(matches!(
            import(&db, "phone_number,disposition_type\n", "t"),
            Err(DispositionError::EmptyInput)
        ));
    }

    #[test]
    fn test_invalid_type_writes_nothing() {
        let db = test_db();
        let result = import(
            &db,
            "phone_number,disposition_type\n1,DNC\n2,Maybe\n",
            "t",
        );
        match result {
            Err(DispositionError::InvalidDispositionType { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "Maybe");
            }
            other => panic!("expected InvalidDispositionType, got {:?}", other),
        }
        assert!(stats(&db).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_phone() {
        let db = test_db();
        assert!(matches!(
            import(&db, "phone_number,disposition_type\nnone,DNC\n", "t"),
            Err(DispositionError::InvalidPhone { row: 2, .. })
        ));
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        import(&db, "phone_number,disposition_type\n5551,DNC\n", "t").unwrap();
        assert!(matches!(delete(&db, &[]), Err(DispositionError::NoPhoneNumbers)));
        assert_eq!(delete(&db, &["555-1".to_string()]).unwrap(), 1);
        assert!(stats(&db).unwrap().is_empty());
    }

    #[test]
    fn test_types() {
        let db = test_db();
        assert_eq!(types(&db).unwrap().len(), 10);
    }
}

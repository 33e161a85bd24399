//! Batch-scoped duplicate detection against stored phones.

use std::collections::HashSet;

use crate::contact::CanonicalRecord;
use crate::db::DatabaseError;
use crate::store::ContactStore;

/// Non-empty phones of every record in the batch.
pub fn collect_phones(records: &[CanonicalRecord]) -> HashSet<String> {
    records
        .iter()
        .flat_map(|r| r.phones())
        .map(str::to_string)
        .collect()
}

/// Phones from `phones` already stored in any slot. An empty set never
/// reaches the store.
pub fn find_existing(
    store: &dyn ContactStore,
    phones: &HashSet<String>,
) -> Result<HashSet<String>, DatabaseError> {
    if phones.is_empty() {
        return Ok(HashSet::new());
    }
    store.find_phones_in(phones)
}

/// Whether any phone of `record` is in `existing`.
pub fn is_duplicate(record: &CanonicalRecord, existing: &HashSet<String>) -> bool {
    record.phones().any(|p| existing.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactColumn;
    use crate::db::Database;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        calls: AtomicUsize,
    }

    impl ContactStore for CountingStore {
        fn insert_contact(&self, _: &CanonicalRecord, _: &str) -> Result<i64, DatabaseError> {
            Ok(0)
        }

        fn find_phones_in(
            &self,
            _: &HashSet<String>,
        ) -> Result<HashSet<String>, DatabaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HashSet::new())
        }
    }

    fn record(phones: &[(ContactColumn, &str)]) -> CanonicalRecord {
        phones.iter().map(|(c, v)| (*c, v.to_string())).collect()
    }

    #[test]
    fn test_empty_set_skips_store() {
        let store = CountingStore {
            calls: AtomicUsize::new(0),
        };
        let found = find_existing(&store, &HashSet::new()).unwrap();
        assert!(found.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_collect_phones_across_slots() {
        let records = vec![
            record(&[(ContactColumn::Phone1, "1"), (ContactColumn::Phone4, "4")]),
            record(&[(ContactColumn::Phone2, ""), (ContactColumn::FirstName, "x")]),
            record(&[(ContactColumn::Phone3, "1")]),
        ];
        let phones = collect_phones(&records);
        let expected: HashSet<String> = ["1", "4"].iter().map(|s| s.to_string()).collect();
        assert_eq!(phones, expected);
    }

    #[test]
    fn test_find_existing_against_database() {
        let db = Database::open_in_memory().unwrap();
        db.insert_contact(&record(&[(ContactColumn::Phone2, "777")]), "v")
            .unwrap();

        let phones: HashSet<String> = ["777", "888"].iter().map(|s| s.to_string()).collect();
        let found = find_existing(&db, &phones).unwrap();
        assert_eq!(found.len(), 1);

        assert!(is_duplicate(
            &record(&[(ContactColumn::Phone4, "777")]),
            &found
        ));
        assert!(!is_duplicate(
            &record(&[(ContactColumn::Phone1, "888")]),
            &found
        ));
    }
}

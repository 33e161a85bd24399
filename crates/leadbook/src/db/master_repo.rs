//! Master repository: contact rows in the `master` table.

use std::collections::HashSet;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{now_timestamp, param_refs, Database, DatabaseError};
use crate::contact::{CanonicalRecord, ContactColumn};

/// Phones per lookup statement. Each phone is bound once and referenced
/// from all four `IN` lists.
const PHONE_LOOKUP_CHUNK: usize = 250;

/// A persisted contact row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterRow {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub phone3: Option<String>,
    pub phone4: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub region: Option<String>,
    pub zipcode: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub vendor_name: Option<String>,
    pub created_at: String,
}

impl MasterRow {
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            phone1: row.get("phone1")?,
            phone2: row.get("phone2")?,
            phone3: row.get("phone3")?,
            phone4: row.get("phone4")?,
            address1: row.get("address1")?,
            address2: row.get("address2")?,
            city: row.get("city")?,
            state: row.get("state")?,
            county: row.get("county")?,
            region: row.get("region")?,
            zipcode: row.get("zipcode")?,
            lat: row.get("lat")?,
            lon: row.get("lon")?,
            vendor_name: row.get("vendor_name")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Value of a canonical column on this row.
    pub fn column(&self, column: ContactColumn) -> Option<&str> {
        let value = match column {
            ContactColumn::FirstName => &self.first_name,
            ContactColumn::LastName => &self.last_name,
            ContactColumn::Phone1 => &self.phone1,
            ContactColumn::Phone2 => &self.phone2,
            ContactColumn::Phone3 => &self.phone3,
            ContactColumn::Phone4 => &self.phone4,
            ContactColumn::Address1 => &self.address1,
            ContactColumn::Address2 => &self.address2,
            ContactColumn::City => &self.city,
            ContactColumn::State => &self.state,
            ContactColumn::County => &self.county,
            ContactColumn::Region => &self.region,
            ContactColumn::Zipcode => &self.zipcode,
            ContactColumn::Lat => &self.lat,
            ContactColumn::Lon => &self.lon,
        };
        value.as_deref()
    }
}

/// Query filter parameters for the records listing.
#[derive(Debug, Default, Clone)]
pub struct MasterFilter {
    /// Substring match on first_name, last_name, phone1 or address1.
    pub search: Option<String>,
    pub vendor: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    /// 1-based page number.
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Inserts a canonical record tagged with `vendor_name`, returning the new row id.
pub fn insert(
    db: &Database,
    record: &CanonicalRecord,
    vendor_name: &str,
) -> Result<i64, DatabaseError> {
    let mut columns: Vec<&str> = Vec::with_capacity(record.len() + 2);
    let mut values: Vec<&str> = Vec::with_capacity(record.len() + 2);
    for (column, value) in record.iter() {
        columns.push(column.as_str());
        values.push(value);
    }
    let created_at = now_timestamp();
    columns.push("vendor_name");
    values.push(vendor_name);
    columns.push("created_at");
    values.push(&created_at);

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO master ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    db.with_conn(|conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(conn.last_insert_rowid())
    })
}

/// Returns the subset of `phones` already stored in any of phone1..phone4.
pub fn find_phones_in(
    db: &Database,
    phones: &HashSet<String>,
) -> Result<HashSet<String>, DatabaseError> {
    let mut found = HashSet::new();
    if phones.is_empty() {
        return Ok(found);
    }

    let candidates: Vec<&String> = phones.iter().collect();
    db.with_conn(|conn| {
        for chunk in candidates.chunks(PHONE_LOOKUP_CHUNK) {
            let list = (1..=chunk.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT phone1, phone2, phone3, phone4 FROM master
                 WHERE phone1 IN ({list}) OR phone2 IN ({list})
                    OR phone3 IN ({list}) OR phone4 IN ({list})"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                for slot in 0..4 {
                    if let Some(phone) = row.get::<_, Option<String>>(slot)? {
                        if phones.contains(&phone) {
                            found.insert(phone);
                        }
                    }
                }
            }
        }
        Ok(found)
    })
}

/// Finds a row by its ID.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<MasterRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM master WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], MasterRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Deletes a row. Returns `false` when no row had that ID.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM master WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}

/// Queries rows with filters, returning (rows, total_count).
pub fn query(db: &Database, filter: &MasterFilter) -> Result<(Vec<MasterRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref search) = filter.search {
            let n = param_values.len() + 1;
            conditions.push(format!(
                "(first_name LIKE ?{n} OR last_name LIKE ?{n} OR phone1 LIKE ?{n} OR address1 LIKE ?{n})"
            ));
            param_values.push(Box::new(format!("%{}%", search)));
        }
        if let Some(ref vendor) = filter.vendor {
            conditions.push(format!("vendor_name = ?{}", param_values.len() + 1));
            param_values.push(Box::new(vendor.clone()));
        }
        if let Some(ref region) = filter.region {
            conditions.push(format!("region = ?{}", param_values.len() + 1));
            param_values.push(Box::new(region.clone()));
        }
        if let Some(ref state) = filter.state {
            conditions.push(format!("state = ?{}", param_values.len() + 1));
            param_values.push(Box::new(state.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM master {}", where_clause);
        let total: u64 =
            conn.query_row(&count_sql, param_refs(&param_values).as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(10).max(1);
        let page = filter.page.unwrap_or(1).max(1);
        param_values.push(Box::new(limit as i64));
        param_values.push(Box::new(((page - 1) * limit) as i64));
        let query_sql = format!(
            "SELECT * FROM master {} ORDER BY id LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<MasterRow> = stmt
            .query_map(param_refs(&param_values).as_slice(), MasterRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

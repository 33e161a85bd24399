//! Canonical contact columns and the records built from them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A column of the `master` table that vendor fields can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactColumn {
    FirstName,
    LastName,
    Phone1,
    Phone2,
    Phone3,
    Phone4,
    Address1,
    Address2,
    City,
    State,
    County,
    Region,
    Zipcode,
    Lat,
    Lon,
}

impl ContactColumn {
    /// Every canonical column, in table order.
    pub const ALL: [ContactColumn; 15] = [
        ContactColumn::FirstName,
        ContactColumn::LastName,
        ContactColumn::Phone1,
        ContactColumn::Phone2,
        ContactColumn::Phone3,
        ContactColumn::Phone4,
        ContactColumn::Address1,
        ContactColumn::Address2,
        ContactColumn::City,
        ContactColumn::State,
        ContactColumn::County,
        ContactColumn::Region,
        ContactColumn::Zipcode,
        ContactColumn::Lat,
        ContactColumn::Lon,
    ];

    /// The four phone slots checked for duplicates.
    pub const PHONES: [ContactColumn; 4] = [
        ContactColumn::Phone1,
        ContactColumn::Phone2,
        ContactColumn::Phone3,
        ContactColumn::Phone4,
    ];

    /// Column order of the CSV export. `county` is not exported.
    pub const EXPORT: [ContactColumn; 14] = [
        ContactColumn::FirstName,
        ContactColumn::LastName,
        ContactColumn::Phone1,
        ContactColumn::Phone2,
        ContactColumn::Phone3,
        ContactColumn::Phone4,
        ContactColumn::Address1,
        ContactColumn::Address2,
        ContactColumn::City,
        ContactColumn::State,
        ContactColumn::Region,
        ContactColumn::Zipcode,
        ContactColumn::Lat,
        ContactColumn::Lon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactColumn::FirstName => "first_name",
            ContactColumn::LastName => "last_name",
            ContactColumn::Phone1 => "phone1",
            ContactColumn::Phone2 => "phone2",
            ContactColumn::Phone3 => "phone3",
            ContactColumn::Phone4 => "phone4",
            ContactColumn::Address1 => "address1",
            ContactColumn::Address2 => "address2",
            ContactColumn::City => "city",
            ContactColumn::State => "state",
            ContactColumn::County => "county",
            ContactColumn::Region => "region",
            ContactColumn::Zipcode => "zipcode",
            ContactColumn::Lat => "lat",
            ContactColumn::Lon => "lon",
        }
    }

    pub fn is_phone(&self) -> bool {
        Self::PHONES.contains(self)
    }
}

impl fmt::Display for ContactColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

/// Returned when a string does not name a canonical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColumn(pub String);

impl fmt::Display for UnknownColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown contact column '{}'", self.0)
    }
}

impl std::error::Error for UnknownColumn {}

/// A record restricted to canonical columns. Absent columns are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    values: BTreeMap<ContactColumn, String>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, replacing any earlier value.
    pub fn set(&mut self, column: ContactColumn, value: impl Into<String>) {
        self.values.insert(column, value.into());
    }

    pub fn remove(&mut self, column: ContactColumn) -> Option<String> {
        self.values.remove(&column)
    }

    pub fn get(&self, column: ContactColumn) -> Option<&str> {
        self.values.get(&column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Present columns in table order.
    pub fn iter(&self) -> impl Iterator<Item = (ContactColumn, &str)> {
        self.values.iter().map(|(c, v)| (*c, v.as_str()))
    }

    /// Non-empty phone values in slot order.
    pub fn phones(&self) -> impl Iterator<Item = &str> {
        ContactColumn::PHONES
            .iter()
            .filter_map(|c| self.get(*c))
            .filter(|v| !v.is_empty())
    }
}

impl FromIterator<(ContactColumn, String)> for CanonicalRecord {
    fn from_iter<I: IntoIterator<Item = (ContactColumn, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Reduces a phone number to its ASCII digits.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

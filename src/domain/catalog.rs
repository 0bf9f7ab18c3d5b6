//! Reference catalog: static knowledge tables keyed by disease name.
//!
//! Keys are matched exactly (case and whitespace included) against the
//! label space. A disease missing from a table is a normal state; lookups
//! return `None` and callers substitute their own default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The six knowledge tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableKind {
    Description,
    Precautions,
    Symptoms,
    Medications,
    Diet,
    Workout,
}

/// Which columns of a table carry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadColumns {
    /// A single named column.
    Named(&'static str),
    /// Every column after the key column, in file order.
    Trailing,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Description,
        TableKind::Precautions,
        TableKind::Symptoms,
        TableKind::Medications,
        TableKind::Diet,
        TableKind::Workout,
    ];

    /// File name of the table inside the data directory.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Description => "description.csv",
            Self::Precautions => "precautions_df.csv",
            Self::Symptoms => "symtoms_df.csv",
            Self::Medications => "medications.csv",
            Self::Diet => "diets.csv",
            Self::Workout => "workout_df.csv",
        }
    }

    /// Header of the disease key column.
    #[must_use]
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Workout => "disease",
            _ => "Disease",
        }
    }

    #[must_use]
    pub fn payload(&self) -> PayloadColumns {
        match self {
            Self::Description => PayloadColumns::Named("Description"),
            Self::Precautions | Self::Symptoms => PayloadColumns::Trailing,
            Self::Medications => PayloadColumns::Named("Medication"),
            Self::Diet => PayloadColumns::Named("Diet"),
            Self::Workout => PayloadColumns::Named("workout"),
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Description => "description",
            Self::Precautions => "precautions",
            Self::Symptoms => "symptoms",
            Self::Medications => "medications",
            Self::Diet => "diet",
            Self::Workout => "workout",
        };
        f.write_str(name)
    }
}

/// Payload cells of one table row, key column removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub cells: Vec<String>,
}

impl ReferenceRow {
    #[must_use]
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// First payload cell, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.cells.first().map(String::as_str)
    }
}

/// One loaded table: disease name to all matching rows in file order.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    kind: TableKind,
    entries: HashMap<String, Vec<ReferenceRow>>,
}

impl ReferenceTable {
    #[must_use]
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Append a row for a disease.
    pub fn insert(&mut self, disease: impl Into<String>, row: ReferenceRow) {
        self.entries.entry(disease.into()).or_default().push(row);
    }

    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of distinct diseases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows for a disease; never an empty slice.
    #[must_use]
    pub fn lookup(&self, disease: &str) -> Option<&[ReferenceRow]> {
        self.entries
            .get(disease)
            .map(Vec::as_slice)
            .filter(|rows| !rows.is_empty())
    }
}

/// The six reference tables, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    tables: HashMap<TableKind, ReferenceTable>,
}

impl ReferenceCatalog {
    /// Assemble a catalog. Tables of the same kind are merged; kinds not
    /// supplied behave as empty tables.
    #[must_use]
    pub fn new(tables: impl IntoIterator<Item = ReferenceTable>) -> Self {
        let mut merged: HashMap<TableKind, ReferenceTable> = HashMap::new();
        for table in tables {
            match merged.get_mut(&table.kind) {
                Some(existing) => {
                    for (disease, rows) in table.entries {
                        existing.entries.entry(disease).or_default().extend(rows);
                    }
                }
                None => {
                    merged.insert(table.kind, table);
                }
            }
        }
        Self { tables: merged }
    }

    /// Look up the rows of a disease in one table.
    #[must_use]
    pub fn lookup(&self, kind: TableKind, disease: &str) -> Option<&[ReferenceRow]> {
        self.tables.get(&kind).and_then(|t| t.lookup(disease))
    }

    #[must_use]
    pub fn table(&self, kind: TableKind) -> Option<&ReferenceTable> {
        self.tables.get(&kind)
    }
}

//! Enrichment resolver: joins a disease name against the reference catalog.
//!
//! Each field is looked up independently. A missing row yields that field's
//! default and nothing else; it is never an error.

use crate::domain::list_literal;
use crate::domain::{AdvisoryRecord, ReferenceCatalog, ReferenceRow, TableKind, DEFAULT_DESCRIPTION};

/// Build the advisory record for `disease`.
#[must_use]
pub fn resolve(disease: &str, catalog: &ReferenceCatalog) -> AdvisoryRecord {
    let record = AdvisoryRecord {
        description: description(disease, catalog),
        precautions: trailing_cells(disease, TableKind::Precautions, catalog),
        symptoms: trailing_cells(disease, TableKind::Symptoms, catalog),
        medications: list_field(disease, TableKind::Medications, catalog),
        diet: list_field(disease, TableKind::Diet, catalog),
        workout: workout(disease, catalog),
    };
    tracing::debug!(
        "Resolved advisory: {} precautions, {} medications, {} diet items, {} workouts",
        record.precautions.len(),
        record.medications.len(),
        record.diet.len(),
        record.workout.len()
    );
    record
}

fn lookup<'a>(
    disease: &str,
    kind: TableKind,
    catalog: &'a ReferenceCatalog,
) -> Option<&'a [ReferenceRow]> {
    let rows = catalog.lookup(kind, disease);
    if rows.is_none() {
        tracing::debug!("No {} row for {:?}; using default", kind, disease);
    }
    rows
}

/// Blank cells are missing values, not entries.
fn non_blank(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| cell.to_string())
}

fn description(disease: &str, catalog: &ReferenceCatalog) -> String {
    lookup(disease, TableKind::Description, catalog)
        .and_then(|rows| rows[0].first())
        .and_then(non_blank)
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
}

/// Payload columns of the first matching row, in column order.
fn trailing_cells(disease: &str, kind: TableKind, catalog: &ReferenceCatalog) -> Vec<String> {
    lookup(disease, kind, catalog)
        .map(|rows| rows[0].cells.iter().filter_map(|c| non_blank(c)).collect())
        .unwrap_or_default()
}

/// A serialized list literal from the first matching row.
fn list_field(disease: &str, kind: TableKind, catalog: &ReferenceCatalog) -> Vec<String> {
    let Some(raw) = lookup(disease, kind, catalog).and_then(|rows| rows[0].first()) else {
        return Vec::new();
    };
    match list_literal::parse(raw) {
        Ok(items) => items.iter().filter_map(|s| non_blank(s)).collect(),
        Err(e) => {
            tracing::warn!("Malformed {} entry for {:?}: {}", kind, disease, e);
            Vec::new()
        }
    }
}

/// Every matching row contributes one workout line.
fn workout(disease: &str, catalog: &ReferenceCatalog) -> Vec<String> {
    lookup(disease, TableKind::Workout, catalog)
        .map(|rows| {
            rows.iter()
                .filter_map(ReferenceRow::first)
                .filter_map(non_blank)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceTable;

    fn table(kind: TableKind, rows: &[(&str, &[&str])]) -> ReferenceTable {
        let mut t = ReferenceTable::new(kind);
        for (disease, cells) in rows {
            t.insert(
                *disease,
                ReferenceRow::new(cells.iter().map(|s| s.to_string()).collect()),
            );
        }
        t
    }

    fn full_catalog() -> ReferenceCatalog {
        ReferenceCatalog::new([
            table(
                TableKind::Description,
                &[("Fungal infection", &["Fungal infection is a common skin condition."])],
            ),
            table(
                TableKind::Precautions,
                &[("Fungal infection", &["bath twice", "use detol or neem in bathing water", "keep infected area dry", ""])],
            ),
            table(
                TableKind::Symptoms,
                &[("Fungal infection", &["itching", " skin_rash", " nodal_skin_eruptions", ""])],
            ),
            table(
                TableKind::Medications,
                &[("Fungal infection", &["['Antifungal Cream', 'Fluconazole', 'Terbinafine']"])],
            ),
            table(
                TableKind::Diet,
                &[("Fungal infection", &["['Antifungal Diet', 'Probiotics']"])],
            ),
            table(
                TableKind::Workout,
                &[
                    ("Fungal infection", &["Avoid sugary foods"]),
                    ("Fungal infection", &["Consume probiotics"]),
                    ("Fungal infection", &["Stay hydrated"]),
                ],
            ),
        ])
    }

    #[test]
    fn test_fully_present_disease_has_no_defaults() {
        let record = resolve("Fungal infection", &full_catalog());
        assert_eq!(record.description, "Fungal infection is a common skin condition.");
        assert_eq!(
            record.precautions,
            vec!["bath twice", "use detol or neem in bathing water", "keep infected area dry"]
        );
        assert_eq!(record.symptoms, vec!["itching", "skin_rash", "nodal_skin_eruptions"]);
        assert_eq!(
            record.medications,
            vec!["Antifungal Cream", "Fluconazole", "Terbinafine"]
        );
        assert_eq!(record.diet, vec!["Antifungal Diet", "Probiotics"]);
        assert_eq!(
            record.workout,
            vec!["Avoid sugary foods", "Consume probiotics", "Stay hydrated"]
        );
    }

    #[test]
    fn test_absent_disease_gets_all_defaults() {
        let record = resolve("ImpossiblyRareDisease", &full_catalog());
        assert_eq!(record, AdvisoryRecord::default());
    }

    #[test]
    fn test_missing_single_table_only_defaults_that_field() {
        let mut catalog_tables: Vec<ReferenceTable> = TableKind::ALL
            .iter()
            .filter(|k| **k != TableKind::Diet)
            .filter_map(|k| full_catalog().table(*k).cloned())
            .collect();
        catalog_tables.push(ReferenceTable::new(TableKind::Diet));
        let catalog = ReferenceCatalog::new(catalog_tables);

        let full = resolve("Fungal infection", &full_catalog());
        let partial = resolve("Fungal infection", &catalog);
        assert!(partial.diet.is_empty());
        assert_eq!(
            partial,
            AdvisoryRecord {
                diet: Vec::new(),
                ..full
            }
        );
    }

    #[test]
    fn test_case_sensitive_lookup() {
        let record = resolve("fungal infection", &full_catalog());
        assert_eq!(record.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_malformed_list_literal_becomes_empty() {
        let catalog = ReferenceCatalog::new([table(
            TableKind::Medications,
            &[("GERD", &["__import__('os').system('rm -rf /')"])],
        )]);
        assert!(resolve("GERD", &catalog).medications.is_empty());
    }

    #[test]
    fn test_sample_catalog_gaps() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample");
        let catalog = crate::adapters::tables::load_catalog(&dir).expect("Sample catalog");

        let migraine = resolve("Migraine", &catalog);
        assert!(migraine.diet.is_empty());
        assert_eq!(migraine.workout, vec!["Stay hydrated", "Limit caffeine intake"]);

        let cold = resolve("Common Cold", &catalog);
        assert!(cold.workout.is_empty());
        assert_eq!(cold.medications.len(), 5);

        let allergy = resolve("Allergy", &catalog);
        assert_eq!(
            allergy.precautions,
            vec!["apply calamine", "cover area with bandage", "use ice to compress itching"]
        );
        assert_eq!(allergy.symptoms, vec!["continuous_sneezing", "shivering", "chills"]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let catalog = full_catalog();
        assert_eq!(
            resolve("Fungal infection", &catalog),
            resolve("Fungal infection", &catalog)
        );
    }
}

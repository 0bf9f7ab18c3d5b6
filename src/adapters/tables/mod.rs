//! CSV adapter: loads the training table and the reference tables.
//!
//! All files are read once at startup. Any missing or malformed file is a
//! `ConfigError`; there is no partial catalog.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::catalog::PayloadColumns;
use crate::domain::{
    FeatureVector, ReferenceCatalog, ReferenceRow, ReferenceTable, TableKind, TrainingRow,
    TrainingTable,
};
use crate::ConfigError;

/// File name of the training table inside the data directory.
pub const TRAINING_FILE: &str = "Training.csv";

/// Header of the training table's label column.
pub const LABEL_COLUMN: &str = "prognosis";

fn open(path: &Path) -> Result<File, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    File::open(path).map_err(|e| ConfigError::MalformedTable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn malformed(path: &Path, reason: impl Into<String>) -> ConfigError {
    ConfigError::MalformedTable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Load the training table from a file.
///
/// # Errors
/// Returns `ConfigError::MissingFile` or `ConfigError::MalformedTable`.
pub fn load_training_table(path: &Path) -> Result<TrainingTable, ConfigError> {
    let table = read_training_table(open(path)?, path)?;
    tracing::info!(
        "Loaded training table {:?}: {} symptoms, {} unique rows",
        path,
        table.symptoms().len(),
        table.rows().len()
    );
    Ok(table)
}

/// Parse a training table: symptom columns followed by one label column.
///
/// `origin` is only used in error messages.
///
/// # Errors
/// Returns `ConfigError::MalformedTable` on bad structure or non-binary cells.
pub fn read_training_table<R: Read>(reader: R, origin: &Path) -> Result<TrainingTable, ConfigError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| malformed(origin, e.to_string()))?
        .clone();
    if headers.len() < 2 {
        return Err(malformed(
            origin,
            "expected symptom columns followed by a label column",
        ));
    }
    let n_symptoms = headers.len() - 1;
    if headers.get(n_symptoms) != Some(LABEL_COLUMN) {
        return Err(malformed(
            origin,
            format!("last column must be {LABEL_COLUMN:?}"),
        ));
    }
    let symptoms = rename_repeated_headers(headers.iter().take(n_symptoms), origin);

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| malformed(origin, e.to_string()))?;
        let mut bits = Vec::with_capacity(n_symptoms);
        for (col, cell) in record.iter().take(n_symptoms).enumerate() {
            let bit = match cell.trim() {
                "0" | "0.0" => 0,
                "1" | "1.0" => 1,
                other => {
                    return Err(malformed(
                        origin,
                        format!(
                            "row {}: column {:?} has non-binary value {:?}",
                            line + 1,
                            symptoms[col],
                            other
                        ),
                    ))
                }
            };
            bits.push(bit);
        }
        let label = record.get(n_symptoms).unwrap_or_default();
        if label.is_empty() {
            return Err(malformed(origin, format!("row {}: empty label", line + 1)));
        }
        rows.push(TrainingRow {
            features: FeatureVector::from_bits(bits),
            label: label.to_string(),
        });
    }

    TrainingTable::new(symptoms, rows).map_err(|e| malformed(origin, e.to_string()))
}

/// Give repeated column names a `.N` suffix, counting up per name.
///
/// `a,a,a.1` becomes `a,a.1,a.1.1`, so every name stays unique and keeps its
/// column position.
fn rename_repeated_headers<'a>(
    names: impl Iterator<Item = &'a str>,
    origin: &Path,
) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for original in names {
        let mut name = original.to_string();
        let mut seen = counts.get(&name).copied().unwrap_or(0);
        while seen > 0 {
            counts.insert(name.clone(), seen + 1);
            name = format!("{name}.{seen}");
            seen = counts.get(&name).copied().unwrap_or(0);
        }
        if name != original {
            tracing::warn!("Repeated column {:?} in {:?} renamed to {:?}", original, origin, name);
        }
        counts.insert(name.clone(), seen + 1);
        out.push(name);
    }
    out
}

/// Load one reference table from a file.
///
/// # Errors
/// Returns `ConfigError::MissingFile` or `ConfigError::MalformedTable`.
pub fn load_reference_table(kind: TableKind, path: &Path) -> Result<ReferenceTable, ConfigError> {
    let table = read_reference_table(kind, open(path)?, path)?;
    tracing::debug!("Loaded {} table from {:?}: {} diseases", kind, path, table.len());
    Ok(table)
}

/// Parse a reference table keyed by its disease column.
///
/// # Errors
/// Returns `ConfigError::MalformedTable` if the key or payload column is
/// missing or the CSV is unreadable.
pub fn read_reference_table<R: Read>(
    kind: TableKind,
    reader: R,
    origin: &Path,
) -> Result<ReferenceTable, ConfigError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| malformed(origin, e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let key_idx = column(kind.key_column()).ok_or_else(|| {
        malformed(origin, format!("missing key column {:?}", kind.key_column()))
    })?;
    let payload_idx = match kind.payload() {
        PayloadColumns::Named(name) => Some(
            column(name)
                .ok_or_else(|| malformed(origin, format!("missing column {name:?}")))?,
        ),
        PayloadColumns::Trailing => None,
    };

    let mut table = ReferenceTable::new(kind);
    for record in rdr.records() {
        let record = record.map_err(|e| malformed(origin, e.to_string()))?;
        let Some(disease) = record.get(key_idx) else {
            continue;
        };
        let cells = match payload_idx {
            Some(idx) => vec![record.get(idx).unwrap_or_default().to_string()],
            None => record.iter().skip(key_idx + 1).map(str::to_string).collect(),
        };
        table.insert(disease, ReferenceRow::new(cells));
    }
    Ok(table)
}

/// Load all six reference tables from a data directory.
///
/// # Errors
/// Returns the first `ConfigError` encountered.
pub fn load_catalog(dir: &Path) -> Result<ReferenceCatalog, ConfigError> {
    let tables = TableKind::ALL
        .iter()
        .map(|&kind| load_reference_table(kind, &dir.join(kind.file_name())))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!("Loaded reference catalog from {:?}", dir);
    Ok(ReferenceCatalog::new(tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn origin() -> PathBuf {
        PathBuf::from("inline.csv")
    }

    #[test]
    fn test_read_training_table() {
        let csv = "itching,skin_rash,chills,prognosis\n\
                   1,1,0,Fungal infection\n\
                   0,0,1,Allergy\n\
                   1,1,0,Fungal infection\n";
        let table = read_training_table(csv.as_bytes(), &origin()).expect("Valid table");
        assert_eq!(table.symptoms(), &["itching", "skin_rash", "chills"]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.label_space().names(), &["Allergy", "Fungal infection"]);
    }

    #[test]
    fn test_training_table_keeps_label_whitespace() {
        let csv = "a,prognosis\n1,Diabetes \n";
        let table = read_training_table(csv.as_bytes(), &origin()).expect("Valid table");
        assert_eq!(table.rows()[0].label, "Diabetes ");
    }

    #[test]
    fn test_training_table_rejects_non_binary() {
        let csv = "a,b,prognosis\n1,2,X\n";
        let err = read_training_table(csv.as_bytes(), &origin());
        assert!(matches!(err, Err(ConfigError::MalformedTable { .. })));
    }

    #[test]
    fn test_training_table_rejects_single_column() {
        let err = read_training_table("prognosis\nX\n".as_bytes(), &origin());
        assert!(matches!(err, Err(ConfigError::MalformedTable { .. })));
    }

    #[test]
    fn test_repeated_symptom_header_is_renamed() {
        let csv = "itching,fluid_overload,fluid_overload,prognosis\n\
                   1,0,0,Fungal infection\n\
                   0,1,1,Hepatitis B\n";
        let table = read_training_table(csv.as_bytes(), &origin()).expect("Valid table");
        assert_eq!(
            table.symptoms(),
            &["itching", "fluid_overload", "fluid_overload.1"]
        );

        let kb = crate::application::KnowledgeBase::new(table, ReferenceCatalog::new(Vec::<ReferenceTable>::new()))
            .expect("Renamed headers form a valid vocabulary");
        assert_eq!(kb.vocabulary().position("fluid_overload.1"), Some(2));
    }

    #[test]
    fn test_renaming_skips_existing_suffixed_names() {
        let names = ["a", "a", "a.1", "a"];
        let renamed = rename_repeated_headers(names.into_iter(), &origin());
        assert_eq!(renamed, vec!["a", "a.1", "a.1.1", "a.2"]);
    }

    #[test]
    fn test_training_table_requires_prognosis_label() {
        let err = read_training_table("a,b,disease\n1,0,X\n".as_bytes(), &origin());
        assert!(matches!(err, Err(ConfigError::MalformedTable { .. })));
    }

    #[test]
    fn test_training_table_rejects_ragged_rows() {
        let err = read_training_table("a,b,prognosis\n1,0\n".as_bytes(), &origin());
        assert!(err.is_err());
    }

    #[test]
    fn test_read_trailing_payload_table() {
        let csv = ",Disease,Precaution_1,Precaution_2\n\
                   0,Fungal infection,bath twice,keep area dry\n";
        let table = read_reference_table(TableKind::Precautions, csv.as_bytes(), &origin())
            .expect("Valid table");
        let rows = table.lookup("Fungal infection").expect("Found");
        assert_eq!(rows[0].cells, vec!["bath twice", "keep area dry"]);
    }

    #[test]
    fn test_read_named_payload_with_quoted_list() {
        let csv = "Disease,Medication\n\
                   Fungal infection,\"['Antifungal Cream', 'Fluconazole']\"\n";
        let table = read_reference_table(TableKind::Medications, csv.as_bytes(), &origin())
            .expect("Valid table");
        let rows = table.lookup("Fungal infection").expect("Found");
        assert_eq!(rows[0].first(), Some("['Antifungal Cream', 'Fluconazole']"));
    }

    #[test]
    fn test_workout_uses_lowercase_key() {
        let csv = ",disease,workout\n0,Allergy,Stay hydrated\n1,Allergy,Avoid allergens\n";
        let table = read_reference_table(TableKind::Workout, csv.as_bytes(), &origin())
            .expect("Valid table");
        assert_eq!(table.lookup("Allergy").expect("Found").len(), 2);
    }

    #[test]
    fn test_missing_key_column_rejected() {
        let csv = "Illness,Description\nX,Y\n";
        let err = read_reference_table(TableKind::Description, csv.as_bytes(), &origin());
        assert!(matches!(err, Err(ConfigError::MalformedTable { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_catalog(dir.path());
        assert!(matches!(err, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_load_sample_catalog() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample");
        let catalog = load_catalog(&dir).expect("Sample catalog should load");
        assert!(catalog
            .lookup(TableKind::Description, "Fungal infection")
            .is_some());
        let training = load_training_table(&dir.join(TRAINING_FILE)).expect("Training table");
        assert!(training.label_space().id("Fungal infection").is_some());
    }
}

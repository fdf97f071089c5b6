// CSV seed import - categories, subcategories and units in one file
//
// Header: kind,name,description,parent
// Records are applied in file order through the regular create operations, so
// a subcategory must come after its category and a unit after its subcategory.

use crate::entities::{
    create_category, create_subcategory, create_unit, NewCategory, NewSubcategory, NewUnit,
    SubcategoryFilter,
};
use crate::error::Error;
use crate::filter::Filter;
use crate::store::Executor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Category,
    Subcategory,
    Unit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    pub kind: Kind,
    pub name: String,
    pub description: String,
    /// Parent name; empty for categories.
    #[serde(default)]
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    /// Records whose parent is missing or whose name already exists
    pub skipped: usize,
}

pub fn import_csv<E: Executor>(db: &E, csv_path: &Path) -> Result<ImportReport> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    import_reader(db, file)
}

pub fn import_reader<E: Executor, R: Read>(db: &E, reader: R) -> Result<ImportReport> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut report = ImportReport::default();

    for (index, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = index + 2;
        let record: ImportRecord =
            result.with_context(|| format!("Failed to read record on line {line}"))?;

        match apply(db, &record) {
            Ok(()) => report.created += 1,
            Err(err) if err.is_not_found() || err.is_constraint_violation() => {
                tracing::warn!(line, name = %record.name, error = %err, "record skipped");
                report.skipped += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to import record on line {line}"))
            }
        }
    }

    tracing::info!(created = report.created, skipped = report.skipped, "import finished");
    Ok(report)
}

fn apply<E: Executor>(db: &E, record: &ImportRecord) -> Result<(), Error> {
    let name = record.name.clone();
    let description = record.description.clone();
    if record.kind != Kind::Category && record.parent.is_empty() {
        return Err(Error::required("parent"));
    }

    match record.kind {
        Kind::Category => {
            create_category(db, &NewCategory { name, description })?;
        }
        Kind::Subcategory => {
            create_subcategory(
                db,
                &NewSubcategory { name, description },
                &Filter::by_name(record.parent.as_str()),
            )?;
        }
        Kind::Unit => {
            create_unit(
                db,
                &NewUnit { name, description },
                &SubcategoryFilter::by_names(None, Some(&record.parent)),
            )?;
        }
    }
    Ok(())
}

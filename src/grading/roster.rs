//! Registrar roster ingestion: the authoritative list of enrolled students,
//! independent of the submission data.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::record::{MalformedMatriculationId, MatriculationId};
use super::Warning;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster {0}")]
    MalformedId(#[from] MalformedMatriculationId),
    #[error("roster is missing required column '{0}'")]
    MissingColumn(String),
    #[error("roster contains no entries")]
    Empty,
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster data: {0}")]
    Csv(#[from] csv::Error),
}

/// Column and separator conventions of the registrar export.
#[derive(Debug, Clone)]
pub struct RosterOptions {
    pub delimiter: u8,
    pub matriculation_column: String,
    pub study_column: String,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            matriculation_column: "Matrikelnummer".to_string(),
            study_column: "SKZ".to_string(),
        }
    }
}

/// One enrollment: the identifier pair the grading file is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RosterEntry {
    pub matriculation: MatriculationId,
    pub study_program: String,
}

/// Merged, deduplicated roster across one or more registrar exports.
#[derive(Debug)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    warnings: Vec<Warning>,
}

impl Roster {
    pub fn from_paths<P: AsRef<Path>>(
        paths: &[P],
        options: &RosterOptions,
    ) -> Result<Self, RosterError> {
        let mut readers = Vec::with_capacity(paths.len());
        for path in paths {
            info!(path = %path.as_ref().display(), "reading roster");
            readers.push(File::open(path.as_ref())?);
        }
        Self::from_readers(readers, options)
    }

    pub fn from_readers<R: Read>(
        readers: Vec<R>,
        options: &RosterOptions,
    ) -> Result<Self, RosterError> {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = BTreeSet::new();

        for reader in readers {
            let mut csv_reader = csv::ReaderBuilder::new()
                .delimiter(options.delimiter)
                .trim(csv::Trim::All)
                .from_reader(reader);

            let headers = csv_reader.headers()?.clone();
            let id_index = header_index(&headers, &options.matriculation_column)?;
            let study_index = header_index(&headers, &options.study_column)?;

            for row in csv_reader.records() {
                let row = row?;
                // A malformed id in the registrar's own export is never
                // silently dropped.
                let matriculation =
                    MatriculationId::parse_prefixed(row.get(id_index).unwrap_or_default())?;
                let study_program = row.get(study_index).unwrap_or_default().to_string();

                let entry = RosterEntry {
                    matriculation,
                    study_program,
                };
                if seen.insert((entry.matriculation, entry.study_program.clone())) {
                    entries.push(entry);
                } else {
                    // Expected when an enrollment changed between exports.
                    let warning = Warning::DuplicateRosterEntry {
                        matriculation: entry.matriculation,
                        study_program: entry.study_program,
                    };
                    warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        if entries.is_empty() {
            return Err(RosterError::Empty);
        }
        info!(entries = entries.len(), "roster merged");
        Ok(Self { entries, warnings })
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn into_parts(self) -> (Vec<RosterEntry>, Vec<Warning>) {
        (self.entries, self.warnings)
    }
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Result<usize, RosterError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| RosterError::MissingColumn(name.to_string()))
}

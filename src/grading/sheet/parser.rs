use std::collections::BTreeMap;
use std::io::Read;

use tracing::warn;

use super::classify::{ColumnClassifier, ColumnRole};
use super::{translate, SheetError};
use crate::grading::record::{
    ColumnLayout, MatriculationId, Score, StudentIdentity, StudentRecord,
};
use crate::grading::Warning;

/// The absence sentinel used by the platform export.
const ABSENT: &str = "-";

pub(super) struct ParsedSheet {
    pub layout: ColumnLayout,
    pub records: Vec<StudentRecord>,
    pub warnings: Vec<Warning>,
}

pub(super) fn parse<R: Read>(
    reader: R,
    classifier: &ColumnClassifier,
) -> Result<ParsedSheet, SheetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect();
    let headers = translate::translate_headers(&headers)?;

    let mut first_name_index = None;
    let mut surname_index = None;
    let mut id_index = None;
    let mut assignments: Vec<(usize, String)> = Vec::new();
    let mut quizzes: Vec<(usize, String)> = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        match classifier.classify(header) {
            ColumnRole::FirstName => first_name_index = Some(index),
            ColumnRole::Surname => surname_index = Some(index),
            ColumnRole::StudentId => id_index = Some(index),
            ColumnRole::Assignment => assignments.push((index, header.clone())),
            ColumnRole::Quiz => quizzes.push((index, header.clone())),
            ColumnRole::Ignored => {}
        }
    }
    let first_name_index =
        first_name_index.ok_or_else(|| SheetError::MissingColumn("First name".to_string()))?;
    let surname_index =
        surname_index.ok_or_else(|| SheetError::MissingColumn("Surname".to_string()))?;
    let id_index = id_index.ok_or_else(|| SheetError::MissingColumn("ID number".to_string()))?;

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let first_name = row.get(first_name_index).unwrap_or_default().to_string();
        let surname = row.get(surname_index).unwrap_or_default().to_string();
        let raw_id = row.get(id_index).unwrap_or_default();

        // Manually added participants carry non-numeric ids and cannot be
        // matched against the roster; drop the row, keep the evidence.
        let matriculation = match MatriculationId::parse_plain(raw_id) {
            Ok(id) => id,
            Err(_) => {
                let warning = Warning::InvalidStudentId {
                    first_name,
                    surname,
                    value: raw_id.to_string(),
                };
                warn!("{warning}");
                warnings.push(warning);
                continue;
            }
        };

        let mut fields = BTreeMap::new();
        for (index, name) in assignments.iter().chain(quizzes.iter()) {
            let cell = row.get(*index).unwrap_or_default();
            fields.insert(name.clone(), parse_score(name, cell)?);
        }

        records.push(StudentRecord::new(
            StudentIdentity {
                first_name,
                surname,
                matriculation,
            },
            fields,
        ));
    }

    Ok(ParsedSheet {
        layout: ColumnLayout {
            assignments: assignments.into_iter().map(|(_, name)| name).collect(),
            quizzes: quizzes.into_iter().map(|(_, name)| name).collect(),
        },
        records,
        warnings,
    })
}

fn parse_score(column: &str, cell: &str) -> Result<Score, SheetError> {
    let cell = cell.trim();
    if cell.is_empty() || cell == ABSENT {
        return Ok(Score::Absent);
    }
    cell.parse::<f64>()
        .map(Score::Present)
        .map_err(|_| SheetError::InvalidPoints {
            column: column.to_string(),
            value: cell.to_string(),
        })
}

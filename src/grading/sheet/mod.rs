//! Ingestion of the e-learning platform's points export: header translation,
//! column classification, score normalization, and course-specific setup.

mod classify;
mod parser;
mod translate;

pub use classify::{ColumnClassifier, ColumnRole};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::policy::{ColumnSet, ParticipationScope, Policy, SetupStep};
use super::record::{ColumnLayout, MatriculationId, Score, StudentRecord};
use super::Warning;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("could not translate column '{0}' into English")]
    UntranslatableColumn(String),
    #[error("sheet is missing required column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}' contains unparseable points value '{value}'")]
    InvalidPoints { column: String, value: String },
    #[error("exam results contain malformed matriculation id '{0}'")]
    MalformedExamId(String),
    #[error("setup step '{0}' selects no columns")]
    EmptyColumnSelection(String),
    #[error("no gradable students remain after {0}")]
    Empty(&'static str),
    #[error("failed to read sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sheet data: {0}")]
    Csv(#[from] csv::Error),
}

/// Per-course ingestion knobs; defaults match the platform's export format.
#[derive(Debug, Clone, Default)]
pub struct SheetOptions {
    pub classifier: ColumnClassifier,
}

/// Options for externally delivered exam-result files (tab-separated with a
/// decimal comma, one file per sitting, chronologically ordered).
#[derive(Debug, Clone)]
pub struct ExamResultOptions {
    pub delimiter: u8,
    pub matriculation_column: String,
    pub points_column: String,
    pub decimal_comma: bool,
}

impl Default for ExamResultOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            matriculation_column: "Matr.Nr.".to_string(),
            points_column: "Summe".to_string(),
            decimal_comma: true,
        }
    }
}

/// The normalized points export: one record per student, every declared
/// column present with points or an explicit absence marker.
#[derive(Debug)]
pub struct GradeSheet {
    layout: ColumnLayout,
    records: Vec<StudentRecord>,
    warnings: Vec<Warning>,
}

impl GradeSheet {
    pub fn from_path<P: AsRef<Path>>(path: P, options: &SheetOptions) -> Result<Self, SheetError> {
        let file = File::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "reading points export");
        Self::from_reader(file, options)
    }

    pub fn from_reader<R: Read>(reader: R, options: &SheetOptions) -> Result<Self, SheetError> {
        let parsed = parser::parse(reader, &options.classifier)?;
        if parsed.records.is_empty() {
            return Err(SheetError::Empty("parsing"));
        }
        debug!(
            students = parsed.records.len(),
            assignments = parsed.layout.assignments.len(),
            quizzes = parsed.layout.quizzes.len(),
            "points export parsed"
        );
        Ok(Self {
            layout: parsed.layout,
            records: parsed.records,
            warnings: parsed.warnings,
        })
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn into_parts(self) -> (ColumnLayout, Vec<StudentRecord>, Vec<Warning>) {
        (self.layout, self.records, self.warnings)
    }

    /// Merges externally delivered exam results as additional quiz columns
    /// (`Exam 1`, `Exam 2`, …), left-joined on the matriculation id.
    pub fn merge_exam_results<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        options: &ExamResultOptions,
    ) -> Result<(), SheetError> {
        for (index, path) in paths.iter().enumerate() {
            let file = File::open(path.as_ref())?;
            info!(path = %path.as_ref().display(), "merging exam results");
            self.merge_exam_reader(file, index, options)?;
        }
        Ok(())
    }

    pub fn merge_exam_readers<R: Read>(
        &mut self,
        readers: Vec<R>,
        options: &ExamResultOptions,
    ) -> Result<(), SheetError> {
        for (index, reader) in readers.into_iter().enumerate() {
            self.merge_exam_reader(reader, index, options)?;
        }
        Ok(())
    }

    fn merge_exam_reader<R: Read>(
        &mut self,
        reader: R,
        index: usize,
        options: &ExamResultOptions,
    ) -> Result<(), SheetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let id_index = header_index(&headers, &options.matriculation_column)?;
        let points_index = header_index(&headers, &options.points_column)?;

        let mut results = std::collections::BTreeMap::new();
        for row in csv_reader.records() {
            let row = row?;
            let raw_id = row.get(id_index).unwrap_or_default();
            let id = parse_exam_id(raw_id)?;
            let cell = row.get(points_index).unwrap_or_default().trim().to_string();
            if cell.is_empty() {
                continue;
            }
            let cell = if options.decimal_comma {
                cell.replace(',', ".")
            } else {
                cell
            };
            let points = cell
                .parse::<f64>()
                .map_err(|_| SheetError::InvalidPoints {
                    column: options.points_column.clone(),
                    value: cell,
                })?;
            results.insert(id, points);
        }

        let column = format!("Exam {}", index + 1);
        for record in &mut self.records {
            let score = match results.get(&record.matriculation()) {
                Some(points) => Score::Present(*points),
                None => Score::Absent,
            };
            record.set_score(&column, score);
        }
        self.layout.quizzes.push(column);
        Ok(())
    }

    /// Runs a policy's course setup: participation filtering, column
    /// scaling, and derived aggregates. Records are immutable afterwards.
    pub fn apply_setup(&mut self, policy: &Policy) -> Result<(), SheetError> {
        self.filter_participants(&policy.participation)?;

        for step in &policy.setup {
            match step {
                SetupStep::ScalePoints { columns, divisor } => {
                    let columns = owned(columns.resolve(&self.layout));
                    for record in &mut self.records {
                        for column in &columns {
                            if let Score::Present(points) = score_of(record, column)? {
                                record.set_score(column, Score::Present(points / divisor));
                            }
                        }
                    }
                }
                SetupStep::DeriveSum { name, columns } => {
                    let columns = owned(columns.resolve(&self.layout));
                    for record in &mut self.records {
                        let sum = sum_of(record, &columns)?;
                        record.set_derived(name, sum);
                    }
                }
                SetupStep::DeriveNormalizedSum {
                    name,
                    sum_over,
                    per_column_of,
                } => {
                    let columns = owned(sum_over.resolve(&self.layout));
                    let divisor = per_column_of.resolve(&self.layout).len();
                    if divisor == 0 {
                        return Err(SheetError::EmptyColumnSelection(name.clone()));
                    }
                    for record in &mut self.records {
                        let sum = sum_of(record, &columns)?;
                        record.set_derived(name, sum / divisor as f64);
                    }
                }
            }
        }
        Ok(())
    }

    fn filter_participants(&mut self, scope: &ParticipationScope) -> Result<(), SheetError> {
        let before = self.records.len();
        let mut kept = Vec::with_capacity(before);
        for record in self.records.drain(..) {
            if participates(&record, scope, &self.layout)? {
                kept.push(record);
            }
        }
        self.records = kept;

        let dropped = before - self.records.len();
        if dropped > 0 {
            let warning = Warning::NoSubmissions { dropped };
            info!("{warning}");
            self.warnings.push(warning);
        }
        if self.records.is_empty() {
            return Err(SheetError::Empty("participation filtering"));
        }
        Ok(())
    }
}

fn participates(
    record: &StudentRecord,
    scope: &ParticipationScope,
    layout: &ColumnLayout,
) -> Result<bool, SheetError> {
    let any_present = |columns: &[&str]| -> Result<bool, SheetError> {
        for column in columns {
            if !score_of(record, column)?.is_absent() {
                return Ok(true);
            }
        }
        Ok(false)
    };

    match scope {
        ParticipationScope::AnySubmission => {
            let assignments = ColumnSet::Assignments.resolve(layout);
            let quizzes = ColumnSet::Quizzes.resolve(layout);
            Ok(any_present(&assignments)? || any_present(&quizzes)?)
        }
        ParticipationScope::AssignmentsOnly => {
            let assignments = ColumnSet::Assignments.resolve(layout);
            any_present(&assignments)
        }
        ParticipationScope::MandatorySubmissions { columns, minimum } => {
            let mut submitted = 0usize;
            for column in columns.resolve(layout) {
                if !score_of(record, column)?.is_absent() {
                    submitted += 1;
                }
            }
            Ok(submitted >= *minimum)
        }
    }
}

fn score_of(record: &StudentRecord, column: &str) -> Result<Score, SheetError> {
    record
        .score(column)
        .map_err(|_| SheetError::MissingColumn(column.to_string()))
}

fn sum_of(record: &StudentRecord, columns: &[String]) -> Result<f64, SheetError> {
    let mut sum = 0.0;
    for column in columns {
        sum += score_of(record, column)?.or_zero();
    }
    Ok(sum)
}

fn owned(columns: Vec<&str>) -> Vec<String> {
    columns.into_iter().map(str::to_string).collect()
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Result<usize, SheetError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| SheetError::MissingColumn(name.to_string()))
}

fn parse_exam_id(raw: &str) -> Result<MatriculationId, SheetError> {
    MatriculationId::parse_prefixed(raw)
        .or_else(|_| MatriculationId::parse_plain(raw))
        .map_err(|_| SheetError::MalformedExamId(raw.to_string()))
}

//! Grading-file export: the headerless upload format the registrar system
//! imports, plus a full audit export with every intermediate column.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use super::pipeline::GradingReport;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write grading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode grading file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub delimiter: u8,
    /// The registrar import requires a headerless file; headers are opt-in.
    pub header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            header: false,
        }
    }
}

/// Default output location: `grading.csv` next to the first roster file.
pub fn default_grading_path(first_roster: &Path) -> PathBuf {
    first_roster
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("grading.csv")
}

/// The audit export sits next to the grading file with a `_FULL` suffix.
pub fn full_export_path(grading_path: &Path) -> PathBuf {
    let stem = grading_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("grading");
    grading_path.with_file_name(format!("{stem}_FULL.csv"))
}

/// Writes the upload file: `matriculationID;studyID;grade;reason` per
/// student, in report order.
pub fn write_grading_file(
    report: &GradingReport,
    path: &Path,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_grading(report, file, options)?;
    info!(grades = report.students.len(), path = %path.display(), "grading file written");
    Ok(())
}

pub fn write_grading<W: Write>(
    report: &GradingReport,
    writer: W,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    if options.header {
        csv_writer.write_record(["matriculation_id", "study_id", "grade", "reason"])?;
    }
    for student in &report.students {
        csv_writer.write_record([
            student.roster.matriculation.to_string(),
            student.roster.study_program.clone(),
            student.outcome.grade.value().to_string(),
            student.outcome.reason.clone(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the audit export: identity, every input and derived column, study
/// program, grade, and reason, in the same row order as the upload file.
pub fn write_full_export(
    report: &GradingReport,
    path: &Path,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_full(report, file, options)?;
    info!(path = %path.display(), "full export written");
    Ok(())
}

pub fn write_full<W: Write>(
    report: &GradingReport,
    writer: W,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let derived: Vec<String> = report
        .students
        .first()
        .map(|student| {
            student
                .record
                .derived_names()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut header = vec![
        "First name".to_string(),
        "Surname".to_string(),
        "ID number".to_string(),
    ];
    header.extend(report.layout.assignments.iter().cloned());
    header.extend(report.layout.quizzes.iter().cloned());
    header.extend(derived.iter().cloned());
    header.extend([
        "SKZ".to_string(),
        "grade".to_string(),
        "grade_reason".to_string(),
    ]);
    csv_writer.write_record(&header)?;

    for student in &report.students {
        let identity = student.record.identity();
        let mut row = vec![
            identity.first_name.clone(),
            identity.surname.clone(),
            identity.matriculation.to_string(),
        ];
        for column in report
            .layout
            .assignments
            .iter()
            .chain(report.layout.quizzes.iter())
        {
            let score = student
                .record
                .score_if_declared(column)
                .unwrap_or(super::record::Score::Absent);
            row.push(score.to_string());
        }
        for name in &derived {
            let value = student.record.derived(name).unwrap_or_default();
            row.push(value.to_string());
        }
        row.push(student.roster.study_program.clone());
        row.push(student.outcome.grade.value().to_string());
        row.push(student.outcome.reason.clone());
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

//! Diagnostic statistics over finished grading runs: how many students are
//! registered versus actually graded, per study program.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::roster::{Roster, RosterError, RosterOptions};

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("grading file row {row} has fewer than 2 columns")]
    ShortRow { row: usize },
    #[error("failed to read grading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid grading file data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode statistics: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramCount {
    pub study_program: String,
    pub count: usize,
    pub percent: f64,
}

/// Registered and graded student counts grouped by study program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub registered_total: usize,
    pub graded_total: usize,
    pub registered: Vec<ProgramCount>,
    pub graded: Vec<ProgramCount>,
}

/// Collects counts from roster files and previously produced grading files.
/// Duplicate grading rows keep the last occurrence, so the most recent file
/// wins when runs overlap.
pub fn collect<P: AsRef<Path>>(
    roster_files: &[P],
    grading_files: &[P],
    roster_options: &RosterOptions,
    grading_delimiter: u8,
) -> Result<StatsReport, StatsError> {
    let roster = Roster::from_paths(roster_files, roster_options)?;

    let mut graded: BTreeMap<(String, String), String> = BTreeMap::new();
    for path in grading_files {
        let file = File::open(path.as_ref())?;
        read_grading_rows(file, grading_delimiter, &mut graded)?;
    }

    Ok(build_report(
        roster
            .entries()
            .iter()
            .map(|entry| entry.study_program.clone())
            .collect(),
        graded.keys().map(|(_, program)| program.clone()).collect(),
    ))
}

fn read_grading_rows<R: Read>(
    reader: R,
    delimiter: u8,
    graded: &mut BTreeMap<(String, String), String>,
) -> Result<(), StatsError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let id = row.get(0);
        let program = row.get(1);
        let (Some(id), Some(program)) = (id, program) else {
            return Err(StatsError::ShortRow { row: index + 1 });
        };
        let grade = row.get(2).unwrap_or_default().to_string();
        graded.insert((id.to_string(), program.to_string()), grade);
    }
    Ok(())
}

fn build_report(registered: Vec<String>, graded: Vec<String>) -> StatsReport {
    StatsReport {
        registered_total: registered.len(),
        graded_total: graded.len(),
        registered: group(registered),
        graded: group(graded),
    }
}

fn group(programs: Vec<String>) -> Vec<ProgramCount> {
    let total = programs.len();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for program in programs {
        *counts.entry(program).or_insert(0) += 1;
    }
    let mut grouped: Vec<ProgramCount> = counts
        .into_iter()
        .map(|(study_program, count)| ProgramCount {
            study_program,
            count,
            percent: if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            },
        })
        .collect();
    grouped.sort_by(|a, b| a.count.cmp(&b.count).then(a.study_program.cmp(&b.study_program)));
    grouped
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "===== Registered students (total = {}) by study program =====",
            self.registered_total
        )?;
        write_counts(f, &self.registered)?;
        writeln!(
            f,
            "===== Graded students (total = {}) by study program =====",
            self.graded_total
        )?;
        write_counts(f, &self.graded)
    }
}

fn write_counts(f: &mut fmt::Formatter<'_>, counts: &[ProgramCount]) -> fmt::Result {
    for entry in counts {
        writeln!(
            f,
            "{:>10}  {:>5}  {:>6.2}%",
            entry.study_program, entry.count, entry.percent
        )?;
    }
    Ok(())
}

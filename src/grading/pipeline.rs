//! End-to-end orchestration: setup, roster join, filtering, evaluation, and
//! the deterministic output ordering.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::policy::{GradeOutcome, Policy, PolicyError};
use super::record::{ColumnLayout, StudentRecord};
use super::roster::{Roster, RosterEntry, RosterError};
use super::sheet::{GradeSheet, SheetError};
use super::Warning;

#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    #[error("unknown course '{0}'")]
    UnknownCourse(String),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("no students remain after {0}")]
    Empty(&'static str),
}

/// One graded, roster-matched student. The record is kept for the audit
/// export.
#[derive(Debug, Clone)]
pub struct GradedStudent {
    pub roster: RosterEntry,
    pub record: StudentRecord,
    pub outcome: GradeOutcome,
}

/// Result of one grading run, ordered by (matriculation id, study program).
#[derive(Debug)]
pub struct GradingReport {
    pub course: &'static str,
    pub students: Vec<GradedStudent>,
    pub warnings: Vec<Warning>,
    pub excluded_by_filter: usize,
    pub layout: ColumnLayout,
}

/// Grades every roster-matched student of a course under one policy.
///
/// Evaluation is per-student and shares no state; the ordering guarantee is
/// established by a single sort after all students are graded, so repeated
/// runs over unchanged input produce identical output.
pub fn grade_course(
    mut sheet: GradeSheet,
    roster: Roster,
    policy: &Policy,
) -> Result<GradingReport, GradingError> {
    info!(course = policy.name, "grading course");
    sheet.apply_setup(policy)?;

    let (layout, records, mut warnings) = sheet.into_parts();
    let (entries, roster_warnings) = roster.into_parts();
    warnings.extend(roster_warnings);

    let by_id: BTreeMap<_, _> = records
        .iter()
        .map(|record| (record.matriculation(), record))
        .collect();

    // Students missing from the roster are expected (cross-listed courses)
    // and skipped; roster entries without submissions are skipped likewise.
    let mut joined: Vec<(RosterEntry, StudentRecord)> = Vec::new();
    let mut matched = std::collections::BTreeSet::new();
    for entry in entries {
        if let Some(record) = by_id.get(&entry.matriculation) {
            matched.insert(entry.matriculation);
            joined.push((entry, (*record).clone()));
        }
    }
    debug!(matched = joined.len(), "roster join complete");
    if joined.is_empty() {
        return Err(GradingError::Empty("the roster join"));
    }
    if policy.warn_if_unmatched {
        for record in &records {
            if !matched.contains(&record.matriculation()) {
                let warning = Warning::NotOnRoster {
                    matriculation: record.matriculation(),
                    first_name: record.identity().first_name.clone(),
                    surname: record.identity().surname.clone(),
                };
                warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    let mut excluded_by_filter = 0usize;
    if let Some(filter) = &policy.row_filter {
        let before = joined.len();
        let mut kept = Vec::with_capacity(before);
        for (entry, record) in joined {
            if filter.keeps(&record, &layout)? {
                kept.push((entry, record));
            }
        }
        joined = kept;
        excluded_by_filter = before - joined.len();
        if excluded_by_filter > 0 {
            info!(excluded = excluded_by_filter, "row filter applied");
        }
        if joined.is_empty() {
            return Err(GradingError::Empty("row filtering"));
        }
    }

    let mut students = Vec::with_capacity(joined.len());
    for (entry, record) in joined {
        let outcome = policy.evaluate(&record, &layout)?;
        students.push(GradedStudent {
            roster: entry,
            record,
            outcome,
        });
    }

    students.sort_by(|a, b| a.roster.cmp(&b.roster));
    info!(graded = students.len(), "grading complete");

    Ok(GradingReport {
        course: policy.name,
        students,
        warnings,
        excluded_by_filter,
        layout,
    })
}

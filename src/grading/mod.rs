//! Course grading: ingesting a points export and registrar rosters,
//! evaluating per-course policies, and producing roster-matched grades.

pub mod export;
pub mod pipeline;
pub mod policy;
pub mod record;
pub mod roster;
pub mod scale;
pub mod sheet;
pub mod stats;

pub use pipeline::{grade_course, GradedStudent, GradingError, GradingReport};
pub use policy::{catalog, CheckOrder, GradeOutcome, Policy};
pub use record::{MatriculationId, Score, StudentRecord};
pub use roster::{Roster, RosterEntry, RosterOptions};
pub use scale::{Grade, GradeScale};
pub use sheet::{GradeSheet, SheetOptions};

use std::fmt;

use serde::Serialize;

/// Data-quality findings that do not abort a run. They are collected per
/// stage and surfaced once; processing continues on the cleaned subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A points-export row whose student id failed the format check.
    InvalidStudentId {
        first_name: String,
        surname: String,
        value: String,
    },
    /// The same (matriculation, study program) pair appeared twice.
    DuplicateRosterEntry {
        matriculation: MatriculationId,
        study_program: String,
    },
    /// Students without any submission, dropped before grading.
    NoSubmissions { dropped: usize },
    /// A sheet student missing from every roster file.
    NotOnRoster {
        matriculation: MatriculationId,
        first_name: String,
        surname: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidStudentId {
                first_name,
                surname,
                value,
            } => write!(
                f,
                "dropped {first_name} {surname}: invalid student id '{value}'"
            ),
            Warning::DuplicateRosterEntry {
                matriculation,
                study_program,
            } => write!(
                f,
                "dropped duplicate roster entry {matriculation}/{study_program}"
            ),
            Warning::NoSubmissions { dropped } => {
                write!(f, "dropped {dropped} student(s) without gradable submissions")
            }
            Warning::NotOnRoster {
                matriculation,
                first_name,
                surname,
            } => write!(
                f,
                "{first_name} {surname} ({matriculation}) is not on any roster"
            ),
        }
    }
}

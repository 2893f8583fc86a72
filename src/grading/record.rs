use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::policy::PolicyError;

/// A single point value as exported by the e-learning platform.
///
/// Absence (no submission, exported as `-`) is a first-class value and is
/// only collapsed to zero at explicit aggregation points, never at parse
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Present(f64),
    Absent,
}

impl Score {
    pub fn points(self) -> Option<f64> {
        match self {
            Score::Present(points) => Some(points),
            Score::Absent => None,
        }
    }

    /// Collapses absence to zero. This is the one sanctioned place where
    /// "no submission" and "zero points" become the same thing.
    pub fn or_zero(self) -> f64 {
        self.points().unwrap_or(0.0)
    }

    pub fn is_absent(self) -> bool {
        matches!(self, Score::Absent)
    }

    /// True for skipped submissions and submissions graded with 0 points.
    pub fn is_zero_or_absent(self) -> bool {
        match self {
            Score::Present(points) => points == 0.0,
            Score::Absent => true,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Present(points) => write!(f, "{points}"),
            Score::Absent => write!(f, "-"),
        }
    }
}

/// Numeric student identifier used for matching platform rows against the
/// registrar roster. Roster exports decorate it with a `k` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MatriculationId(u64);

impl MatriculationId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parses the registrar form `k01234567`: a case-insensitive `k`
    /// followed by exactly eight digits.
    pub fn parse_prefixed(raw: &str) -> Result<Self, MalformedMatriculationId> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('k')
            .or_else(|| trimmed.strip_prefix('K'))
            .ok_or_else(|| MalformedMatriculationId(raw.to_string()))?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MalformedMatriculationId(raw.to_string()));
        }
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| MalformedMatriculationId(raw.to_string()))
    }

    /// Parses the undecorated numeric form used by the platform export.
    pub fn parse_plain(raw: &str) -> Result<Self, MalformedMatriculationId> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MalformedMatriculationId(raw.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| MalformedMatriculationId(raw.to_string()))
    }
}

impl fmt::Display for MatriculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed matriculation id '{0}'")]
pub struct MalformedMatriculationId(pub String);

/// Name fields and institutional id; used for auditing and matching only,
/// never for grading decisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentIdentity {
    pub first_name: String,
    pub surname: String,
    pub matriculation: MatriculationId,
}

/// Ordered view of the graded columns of a sheet, in export order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    pub assignments: Vec<String>,
    pub quizzes: Vec<String>,
}

/// One student row after normalization: every declared assignment/quiz
/// column is present in `fields`, either with points or explicitly absent.
/// `derived` holds course-specific aggregates computed once during setup.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    identity: StudentIdentity,
    fields: BTreeMap<String, Score>,
    derived: BTreeMap<String, f64>,
}

impl StudentRecord {
    pub fn new(identity: StudentIdentity, fields: BTreeMap<String, Score>) -> Self {
        Self {
            identity,
            fields,
            derived: BTreeMap::new(),
        }
    }

    pub fn identity(&self) -> &StudentIdentity {
        &self.identity
    }

    pub fn matriculation(&self) -> MatriculationId {
        self.identity.matriculation
    }

    /// Score of a declared column; referencing an undeclared column is a
    /// structural error, not a grading outcome.
    pub fn score(&self, field: &str) -> Result<Score, PolicyError> {
        self.fields
            .get(field)
            .copied()
            .ok_or_else(|| PolicyError::MissingField(field.to_string()))
    }

    /// Score of a column that newer exports carry but older ones may lack.
    pub fn score_if_declared(&self, field: &str) -> Option<Score> {
        self.fields.get(field).copied()
    }

    pub fn derived(&self, name: &str) -> Result<f64, PolicyError> {
        self.derived
            .get(name)
            .copied()
            .ok_or_else(|| PolicyError::MissingDerived(name.to_string()))
    }

    pub fn derived_names(&self) -> impl Iterator<Item = &str> {
        self.derived.keys().map(String::as_str)
    }

    pub(crate) fn set_score(&mut self, field: &str, score: Score) {
        self.fields.insert(field.to_string(), score);
    }

    pub(crate) fn set_derived(&mut self, name: &str, value: f64) {
        self.derived.insert(name.to_string(), value);
    }
}

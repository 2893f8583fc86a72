pub mod catalog;

use serde::Serialize;

use super::record::{ColumnLayout, Score, StudentRecord};
use super::scale::{Grade, GradeScale, ScaleError};

/// Result of evaluating one student under one policy. `reason` is empty for
/// unconditional successes and names the failed rule otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOutcome {
    pub grade: Grade,
    pub reason: String,
}

impl GradeOutcome {
    pub fn passed(grade: Grade) -> Self {
        Self {
            grade,
            reason: String::new(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            grade: Grade::Insufficient,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy references field '{0}' which is not present in the record")]
    MissingField(String),
    #[error("policy references derived value '{0}' which was never computed")]
    MissingDerived(String),
    #[error("policy is misconfigured: {0}")]
    Misconfigured(&'static str),
    #[error(transparent)]
    Scale(#[from] ScaleError),
}

/// Which rule block runs first. Assignment failures are hard fails a passing
/// exam cannot override, so the canonical order checks assignments first;
/// the older exam-first generation remains selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOrder {
    AssignmentsFirst,
    ExamFirst,
}

/// Selects graded columns of a sheet without naming them statically.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSet {
    Assignments,
    Quizzes,
    /// Assignment columns containing any of the given substrings.
    AssignmentsMatching(Vec<String>),
    /// Assignment columns containing none of the given words
    /// (case-insensitive).
    AssignmentsExcluding(Vec<String>),
    Named(Vec<String>),
}

impl ColumnSet {
    pub fn resolve<'a>(&'a self, layout: &'a ColumnLayout) -> Vec<&'a str> {
        match self {
            ColumnSet::Assignments => layout.assignments.iter().map(String::as_str).collect(),
            ColumnSet::Quizzes => layout.quizzes.iter().map(String::as_str).collect(),
            ColumnSet::AssignmentsMatching(patterns) => layout
                .assignments
                .iter()
                .map(String::as_str)
                .filter(|name| patterns.iter().any(|pattern| name.contains(pattern)))
                .collect(),
            ColumnSet::AssignmentsExcluding(words) => {
                let words: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
                layout
                    .assignments
                    .iter()
                    .map(String::as_str)
                    .filter(|name| {
                        let lower = name.to_lowercase();
                        !words.iter().any(|word| lower.contains(word))
                    })
                    .collect()
            }
            ColumnSet::Named(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Course-specific sheet preparation, run once before any student is graded.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupStep {
    /// Divides the points of the selected columns (platform exports are
    /// sometimes scaled by a constant factor).
    ScalePoints { columns: ColumnSet, divisor: f64 },
    /// Sums the selected columns (absent as zero) into a derived value.
    DeriveSum { name: String, columns: ColumnSet },
    /// Sums `sum_over` and divides by the number of columns selected by
    /// `per_column_of`.
    DeriveNormalizedSum {
        name: String,
        sum_over: ColumnSet,
        per_column_of: ColumnSet,
    },
}

/// Which students are considered participants at all; the rest are dropped
/// before grading (ungraded absence is not a failing grade).
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipationScope {
    /// At least one assignment or quiz submission.
    AnySubmission,
    /// At least one assignment submission.
    AssignmentsOnly,
    /// At least `minimum` submissions among the selected columns.
    MandatorySubmissions { columns: ColumnSet, minimum: usize },
}

/// Caller-style inclusion predicate applied after the roster join.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    AnyQuizAttempted,
    FieldPresent(String),
}

impl RowFilter {
    pub fn keeps(
        &self,
        record: &StudentRecord,
        layout: &ColumnLayout,
    ) -> Result<bool, PolicyError> {
        match self {
            RowFilter::AnyQuizAttempted => {
                for field in &layout.quizzes {
                    if !record.score(field)?.is_absent() {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            RowFilter::FieldPresent(field) => Ok(!record.score(field)?.is_absent()),
        }
    }
}

/// A point amount read from the record: either a raw column (absent counts
/// as zero at this aggregation point) or a derived aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Field(String),
    Derived(String),
}

impl Amount {
    fn resolve(&self, record: &StudentRecord) -> Result<f64, PolicyError> {
        match self {
            Amount::Field(name) => Ok(record.score(name)?.or_zero()),
            Amount::Derived(name) => record.derived(name),
        }
    }
}

/// One chronologically ordered exam sitting. `optional` marks columns that
/// older exports may lack entirely (treated as absent, not as an error).
#[derive(Debug, Clone, PartialEq)]
pub struct ExamAttempt {
    pub field: String,
    pub adjustment: f64,
    pub optional: bool,
}

impl ExamAttempt {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            adjustment: 0.0,
            optional: false,
        }
    }

    pub fn adjusted(field: impl Into<String>, adjustment: f64) -> Self {
        Self {
            adjustment,
            ..Self::new(field)
        }
    }

    pub fn optional(field: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::new(field)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptSource {
    /// Named attempt columns, earliest first.
    Fields(Vec<ExamAttempt>),
    /// Every quiz column of the sheet, in sheet order (used when exam
    /// results are merged in from external files).
    AllQuizColumns,
}

/// A first-sitting part exam used when no retry attempt exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PartExam {
    pub field: String,
    pub minimum_points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExamFallback {
    /// No attempt at all is a hard fail.
    Fail { reason: String },
    /// Fall back to individually thresholded part exams; their sum becomes
    /// the resolved exam value.
    Parts { parts: Vec<PartExam>, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointsMinimum {
    pub points: f64,
    pub reason: String,
}

impl PointsMinimum {
    pub fn new(points: f64, reason: impl Into<String>) -> Self {
        Self {
            points,
            reason: reason.into(),
        }
    }
}

/// Rescales external exam points onto the course's point budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Rescale {
    pub course_points: f64,
    pub exam_points: f64,
}

/// Exam block: attempt precedence, fallback, minimums.
///
/// The most recent non-absent attempt is used exclusively, even if its score
/// is worse than an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamRule {
    pub attempts: AttemptSource,
    pub fallback: ExamFallback,
    /// Minimum for an attempt-resolved value (not applied to the parts
    /// fallback, whose parts carry their own minimums).
    pub attempt_minimum: Option<PointsMinimum>,
    /// Minimum for the resolved value regardless of how it was resolved.
    pub combined_minimum: Option<PointsMinimum>,
    pub rescale: Option<Rescale>,
}

impl ExamRule {
    fn resolve(
        &self,
        record: &StudentRecord,
        layout: &ColumnLayout,
    ) -> Result<Result<f64, String>, PolicyError> {
        let mut resolved = None;
        match &self.attempts {
            AttemptSource::Fields(attempts) => {
                for attempt in attempts {
                    let score = if attempt.optional {
                        record
                            .score_if_declared(&attempt.field)
                            .unwrap_or(Score::Absent)
                    } else {
                        record.score(&attempt.field)?
                    };
                    if let Some(points) = score.points() {
                        resolved = Some(points + attempt.adjustment);
                    }
                }
            }
            AttemptSource::AllQuizColumns => {
                for field in &layout.quizzes {
                    if let Some(points) = record.score(field)?.points() {
                        resolved = Some(points);
                    }
                }
            }
        }

        let (mut value, from_attempt) = match resolved {
            Some(value) => (value, true),
            None => match &self.fallback {
                ExamFallback::Fail { reason } => return Ok(Err(reason.clone())),
                ExamFallback::Parts { parts, reason } => {
                    let mut sum = 0.0;
                    for part in parts {
                        let points = record.score(&part.field)?.or_zero();
                        if points < part.minimum_points {
                            return Ok(Err(reason.clone()));
                        }
                        sum += points;
                    }
                    (sum, false)
                }
            },
        };

        if let Some(rescale) = &self.rescale {
            value = value * rescale.course_points / rescale.exam_points;
        }
        if from_attempt {
            if let Some(minimum) = &self.attempt_minimum {
                if value < minimum.points {
                    return Ok(Err(minimum.reason.clone()));
                }
            }
        }
        if let Some(minimum) = &self.combined_minimum {
            if value < minimum.points {
                return Ok(Err(minimum.reason.clone()));
            }
        }
        Ok(Ok(value))
    }
}

/// One individually thresholded component (a single column or a derived
/// group sum).
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentGroup {
    pub amount: Amount,
    pub minimum_points: f64,
    /// Group-specific reason; required with `GroupFailure::PerGroup`.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupFailure {
    /// Each failing group reports its own reason.
    PerGroup,
    /// Any failing group reports one shared reason.
    Collective { reason: String },
    /// Up to `allowed` failing groups are tolerated.
    Tolerance { allowed: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedMinimum {
    pub amount: Amount,
    pub minimum_points: f64,
    pub reason: String,
}

/// Tolerates up to `allowed` skipped-or-zero columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipLimit {
    pub columns: ColumnSet,
    pub allowed: usize,
    pub reason: String,
}

/// Requires at least `required` columns with `minimum_points` or more.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessCount {
    pub columns: ColumnSet,
    pub minimum_points: f64,
    pub required: usize,
    pub reason: String,
}

/// Assignment block: individual thresholds, tolerances, combined minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRule {
    pub groups: Vec<ComponentGroup>,
    pub group_failure: GroupFailure,
    pub skip_limit: Option<SkipLimit>,
    pub success_count: Option<SuccessCount>,
    pub combined: Option<CombinedMinimum>,
    /// The assignment points that enter the final total.
    pub total: Amount,
}

impl AssignmentRule {
    fn check(
        &self,
        record: &StudentRecord,
        layout: &ColumnLayout,
    ) -> Result<Result<f64, String>, PolicyError> {
        let mut failed = 0usize;
        for group in &self.groups {
            if group.amount.resolve(record)? < group.minimum_points {
                match &self.group_failure {
                    GroupFailure::PerGroup => {
                        let reason = group.reason.as_ref().ok_or(PolicyError::Misconfigured(
                            "per-group failure requires a reason on every group",
                        ))?;
                        return Ok(Err(reason.clone()));
                    }
                    GroupFailure::Collective { reason } => return Ok(Err(reason.clone())),
                    GroupFailure::Tolerance { .. } => failed += 1,
                }
            }
        }
        if let GroupFailure::Tolerance { allowed, reason } = &self.group_failure {
            if failed > *allowed {
                return Ok(Err(reason.clone()));
            }
        }

        if let Some(limit) = &self.skip_limit {
            let skipped = limit
                .columns
                .resolve(layout)
                .iter()
                .map(|field| record.score(field))
                .collect::<Result<Vec<_>, _>>()?
                .iter()
                .filter(|score| score.is_zero_or_absent())
                .count();
            if skipped > limit.allowed {
                return Ok(Err(limit.reason.clone()));
            }
        }

        if let Some(successes) = &self.success_count {
            let mut count = 0usize;
            for field in successes.columns.resolve(layout) {
                if record.score(field)?.or_zero() >= successes.minimum_points {
                    count += 1;
                }
            }
            if count < successes.required {
                return Ok(Err(successes.reason.clone()));
            }
        }

        if let Some(combined) = &self.combined {
            if combined.amount.resolve(record)? < combined.minimum_points {
                return Ok(Err(combined.reason.clone()));
            }
        }

        self.total.resolve(record).map(Ok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TotalFormula {
    ExamOnly,
    AssignmentsOnly,
    ExamPlusAssignments,
    Weighted {
        assignment_weight: f64,
        exam_weight: f64,
    },
}

/// Rounds a total sitting just below the next full point up to it before the
/// scale lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapToInteger {
    pub within: f64,
}

/// The complete, versioned decision procedure for one course instance.
/// Policies are data; the evaluator below is the only code path.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub name: &'static str,
    pub title: &'static str,
    /// Course family keyword, used to sanity-check input file names.
    pub family: &'static str,
    pub max_points: f64,
    pub scale: GradeScale,
    pub order: CheckOrder,
    pub participation: ParticipationScope,
    pub setup: Vec<SetupStep>,
    pub exam: Option<ExamRule>,
    pub assignments: Option<AssignmentRule>,
    /// Bonus columns, added to the assignment points only after every hard
    /// gate has passed; bonus never satisfies a threshold check.
    pub bonus: Vec<String>,
    pub total: TotalFormula,
    pub snap: Option<SnapToInteger>,
    pub row_filter: Option<RowFilter>,
    /// Report sheet students that are missing from the roster.
    pub warn_if_unmatched: bool,
}

impl Policy {
    /// Evaluates one student. Pure: no state is shared between students.
    pub fn evaluate(
        &self,
        record: &StudentRecord,
        layout: &ColumnLayout,
    ) -> Result<GradeOutcome, PolicyError> {
        let exam = match &self.exam {
            Some(rule) => Some(rule.resolve(record, layout)?),
            None => None,
        };
        let assignments = match &self.assignments {
            Some(rule) => Some(rule.check(record, layout)?),
            None => None,
        };

        let blocks: [&Option<Result<f64, String>>; 2] = match self.order {
            CheckOrder::AssignmentsFirst => [&assignments, &exam],
            CheckOrder::ExamFirst => [&exam, &assignments],
        };
        for block in blocks {
            if let Some(Err(reason)) = block {
                return Ok(GradeOutcome::failed(reason.clone()));
            }
        }

        let exam_points = exam.map(|result| result.unwrap_or_default());
        let mut assignment_points = assignments.map(|result| result.unwrap_or_default());
        for field in &self.bonus {
            let points = assignment_points
                .as_mut()
                .ok_or(PolicyError::Misconfigured(
                    "bonus columns require an assignment rule",
                ))?;
            if let Score::Present(bonus) = record.score(field)? {
                *points += bonus;
            }
        }

        let mut total = match self.total {
            TotalFormula::ExamOnly => exam_points.ok_or(PolicyError::Misconfigured(
                "exam-only total requires an exam rule",
            ))?,
            TotalFormula::AssignmentsOnly => assignment_points.ok_or(
                PolicyError::Misconfigured("assignments-only total requires an assignment rule"),
            )?,
            TotalFormula::ExamPlusAssignments => {
                exam_points.ok_or(PolicyError::Misconfigured(
                    "combined total requires an exam rule",
                ))? + assignment_points.ok_or(PolicyError::Misconfigured(
                    "combined total requires an assignment rule",
                ))?
            }
            TotalFormula::Weighted {
                assignment_weight,
                exam_weight,
            } => {
                assignment_weight
                    * assignment_points.ok_or(PolicyError::Misconfigured(
                        "weighted total requires an assignment rule",
                    ))?
                    + exam_weight
                        * exam_points.ok_or(PolicyError::Misconfigured(
                            "weighted total requires an exam rule",
                        ))?
            }
        };

        if let Some(snap) = self.snap {
            let fraction = total.fract();
            if fraction > 0.0 && 1.0 - fraction < snap.within {
                total = total.round();
            }
        }

        let grade = self.scale.grade(total, self.max_points)?;
        Ok(GradeOutcome::passed(grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::record::{MatriculationId, StudentIdentity};
    use std::collections::BTreeMap;

    fn record(fields: &[(&str, Score)]) -> StudentRecord {
        let fields: BTreeMap<String, Score> = fields
            .iter()
            .map(|(name, score)| (name.to_string(), *score))
            .collect();
        StudentRecord::new(
            StudentIdentity {
                first_name: "A".to_string(),
                surname: "B".to_string(),
                matriculation: MatriculationId::new(1),
            },
            fields,
        )
    }

    fn exam_layout() -> ColumnLayout {
        ColumnLayout {
            assignments: Vec::new(),
            quizzes: vec![
                "Quiz: Exam (Real)".to_string(),
                "Quiz: Retry Exam (Real)".to_string(),
                "Quiz: Retry Exam 2 (Real)".to_string(),
            ],
        }
    }

    fn three_attempt_rule() -> ExamRule {
        ExamRule {
            attempts: AttemptSource::Fields(vec![
                ExamAttempt::new("Quiz: Exam (Real)"),
                ExamAttempt::new("Quiz: Retry Exam (Real)"),
                ExamAttempt::new("Quiz: Retry Exam 2 (Real)"),
            ]),
            fallback: ExamFallback::Fail {
                reason: "no exam participation".to_string(),
            },
            attempt_minimum: None,
            combined_minimum: None,
            rescale: None,
        }
    }

    fn exam_only_policy(rule: ExamRule, max_points: f64) -> Policy {
        Policy {
            name: "test",
            title: "test",
            family: "test",
            max_points,
            scale: GradeScale::default(),
            order: CheckOrder::AssignmentsFirst,
            participation: ParticipationScope::AnySubmission,
            setup: Vec::new(),
            exam: Some(rule),
            assignments: None,
            bonus: Vec::new(),
            total: TotalFormula::ExamOnly,
            snap: None,
            row_filter: None,
            warn_if_unmatched: false,
        }
    }

    #[test]
    fn most_recent_attempt_wins_even_if_worse() {
        let policy = exam_only_policy(three_attempt_rule(), 40.0);
        let layout = exam_layout();

        // Only the retry present: the retry counts, regardless of position.
        let single = record(&[
            ("Quiz: Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam (Real)", Score::Present(40.0)),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&single, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::VeryGood);
        assert_eq!(outcome.reason, "");

        // A later, worse attempt supersedes an earlier, better one.
        let superseded = record(&[
            ("Quiz: Exam (Real)", Score::Present(40.0)),
            ("Quiz: Retry Exam (Real)", Score::Present(10.0)),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&superseded, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::Insufficient);

        // A failed first sitting followed by a full-score retry is grade 1.
        let recovered = record(&[
            ("Quiz: Exam (Real)", Score::Present(0.0)),
            ("Quiz: Retry Exam (Real)", Score::Present(40.0)),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&recovered, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::VeryGood);
    }

    #[test]
    fn all_attempts_absent_is_a_hard_fail_with_reason() {
        let policy = exam_only_policy(three_attempt_rule(), 40.0);
        let empty = record(&[
            ("Quiz: Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&empty, &exam_layout()).expect("evaluates");
        assert_eq!(outcome.grade, Grade::Insufficient);
        assert_eq!(outcome.reason, "no exam participation");
    }

    #[test]
    fn optional_attempt_column_may_be_missing_entirely() {
        let mut rule = three_attempt_rule();
        if let AttemptSource::Fields(attempts) = &mut rule.attempts {
            attempts[2] = ExamAttempt::optional("Quiz: Retry Exam 2 (Real)");
        }
        let policy = exam_only_policy(rule, 40.0);
        // The record predates the second retry and lacks its column.
        let old_export = record(&[
            ("Quiz: Exam (Real)", Score::Present(35.0)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
        ]);
        let outcome = policy
            .evaluate(&old_export, &exam_layout())
            .expect("evaluates");
        assert_eq!(outcome.grade, Grade::VeryGood);
    }

    #[test]
    fn attempt_adjustment_is_applied_before_the_minimum() {
        let mut rule = three_attempt_rule();
        if let AttemptSource::Fields(attempts) = &mut rule.attempts {
            attempts[0] = ExamAttempt::adjusted("Quiz: Exam (Real)", 0.5);
        }
        rule.attempt_minimum = Some(PointsMinimum::new(50.0, "exam threshold not reached"));
        let policy = exam_only_policy(rule, 100.0);
        let layout = exam_layout();

        let just_below = record(&[
            ("Quiz: Exam (Real)", Score::Present(49.4)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&just_below, &layout).expect("evaluates");
        assert_eq!(outcome.reason, "exam threshold not reached");

        let just_enough = record(&[
            ("Quiz: Exam (Real)", Score::Present(49.5)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&just_enough, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::Sufficient);
    }

    #[test]
    fn parts_fallback_checks_each_part_individually() {
        let rule = ExamRule {
            attempts: AttemptSource::Fields(vec![ExamAttempt::new("Quiz: Retry Exam (Real)")]),
            fallback: ExamFallback::Parts {
                parts: vec![
                    PartExam {
                        field: "Quiz: Exam 1 (Real)".to_string(),
                        minimum_points: 40.0,
                    },
                    PartExam {
                        field: "Quiz: Exam 2 (Real)".to_string(),
                        minimum_points: 40.0,
                    },
                ],
                reason: "individual exam thresholds not reached".to_string(),
            },
            attempt_minimum: None,
            combined_minimum: None,
            rescale: None,
        };
        let policy = exam_only_policy(rule, 200.0);
        let layout = ColumnLayout {
            assignments: Vec::new(),
            quizzes: vec![
                "Quiz: Exam 1 (Real)".to_string(),
                "Quiz: Exam 2 (Real)".to_string(),
                "Quiz: Retry Exam (Real)".to_string(),
            ],
        };

        let split = record(&[
            ("Quiz: Exam 1 (Real)", Score::Present(90.0)),
            ("Quiz: Exam 2 (Real)", Score::Present(39.0)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&split, &layout).expect("evaluates");
        assert_eq!(outcome.reason, "individual exam thresholds not reached");

        let passing = record(&[
            ("Quiz: Exam 1 (Real)", Score::Present(90.0)),
            ("Quiz: Exam 2 (Real)", Score::Present(85.0)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&passing, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::VeryGood);

        // A retry supersedes the part exams entirely.
        let retried = record(&[
            ("Quiz: Exam 1 (Real)", Score::Present(90.0)),
            ("Quiz: Exam 2 (Real)", Score::Present(39.0)),
            ("Quiz: Retry Exam (Real)", Score::Present(180.0)),
        ]);
        let outcome = policy.evaluate(&retried, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::VeryGood);
    }

    #[test]
    fn near_integer_totals_snap_up_before_the_scale_lookup() {
        let mut policy = exam_only_policy(three_attempt_rule(), 40.0);
        policy.snap = Some(SnapToInteger { within: 0.1 });
        let layout = exam_layout();

        // 34.95 snaps to 35 and crosses the 87.5% cutoff.
        let close = record(&[
            ("Quiz: Exam (Real)", Score::Present(34.95)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&close, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::VeryGood);

        let not_close = record(&[
            ("Quiz: Exam (Real)", Score::Present(34.5)),
            ("Quiz: Retry Exam (Real)", Score::Absent),
            ("Quiz: Retry Exam 2 (Real)", Score::Absent),
        ]);
        let outcome = policy.evaluate(&not_close, &layout).expect("evaluates");
        assert_eq!(outcome.grade, Grade::Good);
    }

    #[test]
    fn missing_policy_field_is_structural_not_a_grade() {
        let policy = exam_only_policy(three_attempt_rule(), 40.0);
        let incomplete = record(&[("Quiz: Exam (Real)", Score::Present(30.0))]);
        assert!(matches!(
            policy.evaluate(&incomplete, &exam_layout()),
            Err(PolicyError::MissingField(_))
        ));
    }
}

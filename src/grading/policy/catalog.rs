//! The course policy catalog. New course instances are new entries here,
//! never new code paths: thresholds, maxima, bonus offsets, and reason
//! strings are data consumed by the generic evaluator.

use super::{
    Amount, AssignmentRule, AttemptSource, CheckOrder, ColumnSet, CombinedMinimum, ComponentGroup,
    ExamAttempt, ExamFallback, ExamRule, GroupFailure, ParticipationScope, PartExam, Policy,
    PointsMinimum, Rescale, RowFilter, SetupStep, SkipLimit, SnapToInteger, SuccessCount,
    TotalFormula,
};
use crate::grading::scale::GradeScale;

const EXAM: &str = "Quiz: Exam (Real)";
const RETRY: &str = "Quiz: Retry Exam (Real)";
const RETRY2: &str = "Quiz: Retry Exam 2 (Real)";

pub fn all() -> Vec<Policy> {
    vec![
        python1_2021w(),
        handson1_lecture_2021w(),
        handson1_exercise_2021w(),
        sw1_exercise_2021w(),
        python1_exercise_2022w(),
        handson1_lecture_2022w(),
        handson1_exercise_2022w(),
        python2_2022s(),
        handson2_lecture_2022s(),
        handson2_exercise_2022s(),
        python2_exercise_2023s(),
        handson2_lecture_2023s(),
        handson2_exercise_2023s(),
        python1_lecture_2023w(),
        python2_lecture_2024s(),
    ]
}

pub fn find(name: &str) -> Option<Policy> {
    all().into_iter()
        .find(|policy| policy.name.eq_ignore_ascii_case(name.trim()))
}

fn base(name: &'static str, title: &'static str, family: &'static str, max_points: f64) -> Policy {
    Policy {
        name,
        title,
        family,
        max_points,
        scale: GradeScale::default(),
        order: CheckOrder::AssignmentsFirst,
        participation: ParticipationScope::AnySubmission,
        setup: Vec::new(),
        exam: None,
        assignments: None,
        bonus: Vec::new(),
        total: TotalFormula::ExamOnly,
        snap: None,
        row_filter: None,
        warn_if_unmatched: false,
    }
}

/// Three chronological sittings of the course exam, with optional literal
/// point corrections on the first two.
fn three_sittings(first_adjustment: f64, retry_adjustment: f64) -> ExamRule {
    ExamRule {
        attempts: AttemptSource::Fields(vec![
            ExamAttempt::adjusted(EXAM, first_adjustment),
            ExamAttempt::adjusted(RETRY, retry_adjustment),
            ExamAttempt::new(RETRY2),
        ]),
        fallback: ExamFallback::Fail {
            reason: "no exam participation".to_string(),
        },
        attempt_minimum: None,
        combined_minimum: None,
        rescale: None,
    }
}

fn exercise_patterns(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|i| format!("Exercise {i} ")).collect()
}

fn assignment_fields(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range
        .map(|i| format!("Assignment: Assignment {i} (Real)"))
        .collect()
}

fn derive_sum(name: &str, columns: ColumnSet) -> SetupStep {
    SetupStep::DeriveSum {
        name: name.to_string(),
        columns,
    }
}

/// Skipping (or scoring zero on) more than one assignment fails the course;
/// otherwise the plain sum is scaled.
fn handson_exercise(name: &'static str, title: &'static str, family: &'static str, max_points: f64) -> Policy {
    Policy {
        setup: vec![derive_sum("assignment_total", ColumnSet::Assignments)],
        assignments: Some(AssignmentRule {
            groups: Vec::new(),
            group_failure: GroupFailure::PerGroup,
            skip_limit: Some(SkipLimit {
                columns: ColumnSet::Assignments,
                allowed: 1,
                reason: "more than 1 assignment skipped/graded with 0 points".to_string(),
            }),
            success_count: None,
            combined: None,
            total: Amount::Derived("assignment_total".to_string()),
        }),
        total: TotalFormula::AssignmentsOnly,
        ..base(name, title, family, max_points)
    }
}

/// 2021W Python 1: combined lecture+exercise course. Exercise points arrive
/// scaled by a factor of 10; three assignment blocks and a two-part exam
/// with one retry, each side with individual and combined thresholds.
pub fn python1_2021w() -> Policy {
    Policy {
        setup: vec![
            SetupStep::ScalePoints {
                columns: ColumnSet::Assignments,
                divisor: 10.0,
            },
            derive_sum(
                "assignment1_total",
                ColumnSet::AssignmentsMatching(exercise_patterns(1..=4)),
            ),
            derive_sum(
                "assignment2_total",
                ColumnSet::AssignmentsMatching(exercise_patterns(5..=15)),
            ),
            derive_sum(
                "assignment3_total",
                ColumnSet::AssignmentsMatching(exercise_patterns(16..=21)),
            ),
            derive_sum("assignment_total", ColumnSet::Assignments),
        ],
        assignments: Some(AssignmentRule {
            groups: vec![
                group("assignment1_total", 0.25 * 15.0),
                group("assignment2_total", 0.25 * 30.0),
                group("assignment3_total", 0.25 * 35.0),
            ],
            group_failure: GroupFailure::Collective {
                reason: "individual assignment thresholds not reached".to_string(),
            },
            skip_limit: None,
            success_count: None,
            combined: Some(CombinedMinimum {
                amount: Amount::Derived("assignment_total".to_string()),
                minimum_points: 0.5 * 80.0,
                reason: "total assignment threshold not reached".to_string(),
            }),
            total: Amount::Derived("assignment_total".to_string()),
        }),
        exam: Some(ExamRule {
            attempts: AttemptSource::Fields(vec![ExamAttempt::new(RETRY)]),
            fallback: ExamFallback::Parts {
                parts: vec![
                    PartExam {
                        field: "Quiz: Exam 1 (Real)".to_string(),
                        minimum_points: 0.4 * 10.0,
                    },
                    PartExam {
                        field: "Quiz: Exam 2 (Real)".to_string(),
                        minimum_points: 0.4 * 10.0,
                    },
                ],
                reason: "individual quiz thresholds not reached".to_string(),
            },
            attempt_minimum: Some(PointsMinimum::new(
                0.5 * 20.0,
                "individual quiz thresholds not reached",
            )),
            combined_minimum: Some(PointsMinimum::new(
                0.5 * 20.0,
                "total quiz threshold not reached",
            )),
            rescale: None,
        }),
        total: TotalFormula::ExamPlusAssignments,
        ..base(
            "python1-2021w",
            "Python 1, winter term 2021 (combined course)",
            "python1",
            100.0,
        )
    }
}

/// 2021W Hands-on lecture: two part exams with individual 40% minimums, or
/// the most recent retry. Grades were issued only for second-retry takers.
pub fn handson1_lecture_2021w() -> Policy {
    Policy {
        exam: Some(ExamRule {
            attempts: AttemptSource::Fields(vec![
                ExamAttempt::new(RETRY),
                ExamAttempt::optional(RETRY2),
            ]),
            fallback: ExamFallback::Parts {
                parts: vec![
                    PartExam {
                        field: "Quiz: Exam 1 (Real)".to_string(),
                        minimum_points: 0.4 * 100.0,
                    },
                    PartExam {
                        field: "Quiz: Exam 2 (Real)".to_string(),
                        minimum_points: 0.4 * 100.0,
                    },
                ],
                reason: "individual exam thresholds not reached".to_string(),
            },
            attempt_minimum: None,
            combined_minimum: None,
            rescale: None,
        }),
        row_filter: Some(RowFilter::FieldPresent(RETRY2.to_string())),
        ..base(
            "handson1-lecture-2021w",
            "Hands-on AI 1 lecture, winter term 2021",
            "handson1",
            200.0,
        )
    }
}

pub fn handson1_exercise_2021w() -> Policy {
    handson_exercise(
        "handson1-exercise-2021w",
        "Hands-on AI 1 exercise, winter term 2021 (7 assignments)",
        "handson1",
        700.0,
    )
}

/// 2021W Software Engineering 1 exercise: externally delivered exam results
/// rescaled onto the 24-point course budget, at least eight successful
/// assignments, weighted 80/20 total.
pub fn sw1_exercise_2021w() -> Policy {
    let mandatory = ColumnSet::AssignmentsExcluding(vec!["bonus".to_string()]);
    Policy {
        participation: ParticipationScope::MandatorySubmissions {
            columns: mandatory.clone(),
            minimum: 3,
        },
        setup: vec![SetupStep::DeriveNormalizedSum {
            name: "assignment_points".to_string(),
            sum_over: ColumnSet::Assignments,
            per_column_of: mandatory.clone(),
        }],
        assignments: Some(AssignmentRule {
            groups: Vec::new(),
            group_failure: GroupFailure::PerGroup,
            skip_limit: None,
            success_count: Some(SuccessCount {
                columns: mandatory,
                minimum_points: 8.0,
                required: 8,
                reason: "fewer than 8 successful assignments".to_string(),
            }),
            combined: None,
            total: Amount::Derived("assignment_points".to_string()),
        }),
        exam: Some(ExamRule {
            attempts: AttemptSource::AllQuizColumns,
            fallback: ExamFallback::Fail {
                reason: "exam missing".to_string(),
            },
            attempt_minimum: Some(PointsMinimum::new(0.5 * 24.0, "exam negative")),
            combined_minimum: None,
            rescale: Some(Rescale {
                course_points: 24.0,
                exam_points: 90.0,
            }),
        }),
        total: TotalFormula::Weighted {
            assignment_weight: 0.8,
            exam_weight: 0.2,
        },
        ..base(
            "sw1-exercise-2021w",
            "Software Engineering 1 exercise, winter term 2021",
            "sw1",
            24.0,
        )
    }
}

/// 2022W Python 1 exercise: ten 100-point assignments with a two-fail
/// tolerance, a 50% exam gate (first sitting corrected by +0.5), and a
/// bonus assignment applied only after all gates.
pub fn python1_exercise_2022w() -> Policy {
    Policy {
        participation: ParticipationScope::AssignmentsOnly,
        setup: vec![derive_sum(
            "assignment_total",
            ColumnSet::AssignmentsExcluding(vec!["bonus".to_string()]),
        )],
        assignments: Some(AssignmentRule {
            groups: assignment_fields(1..=10)
                .into_iter()
                .map(|field| ComponentGroup {
                    amount: Amount::Field(field),
                    minimum_points: 0.25 * 100.0,
                    reason: None,
                })
                .collect(),
            group_failure: GroupFailure::Tolerance {
                allowed: 2,
                reason: "more than 2 individual assignment thresholds not reached".to_string(),
            },
            skip_limit: None,
            success_count: None,
            combined: Some(CombinedMinimum {
                amount: Amount::Derived("assignment_total".to_string()),
                minimum_points: 0.5 * 1000.0,
                reason: "total assignment threshold not reached".to_string(),
            }),
            total: Amount::Derived("assignment_total".to_string()),
        }),
        exam: ExamRule {
            attempt_minimum: Some(PointsMinimum::new(0.5 * 100.0, "exam threshold not reached")),
            ..three_sittings(0.5, 0.0)
        }
        .into(),
        bonus: vec!["Assignment: Assignment 11 (Bonus) (Real)".to_string()],
        total: TotalFormula::ExamPlusAssignments,
        ..base(
            "python1-exercise-2022w",
            "Python 1 exercise, winter term 2022",
            "python1",
            1100.0,
        )
    }
}

pub fn handson1_lecture_2022w() -> Policy {
    Policy {
        // +2.5 on the first sitting: one broken question out of forty.
        exam: Some(three_sittings(2.5, 0.0)),
        row_filter: Some(RowFilter::AnyQuizAttempted),
        ..base(
            "handson1-lecture-2022w",
            "Hands-on AI 1 lecture, winter term 2022",
            "handson1",
            100.0,
        )
    }
}

pub fn handson1_exercise_2022w() -> Policy {
    Policy {
        participation: ParticipationScope::AssignmentsOnly,
        ..handson_exercise(
            "handson1-exercise-2022w",
            "Hands-on AI 1 exercise, winter term 2022 (7 assignments)",
            "handson1",
            700.0,
        )
    }
}

/// 2022S Python 2: two assignment blocks with individual 25% minimums plus a
/// combined 50% gate, and a small 10-point exam at 50%.
pub fn python2_2022s() -> Policy {
    Policy {
        setup: vec![
            derive_sum(
                "assignment1_total",
                ColumnSet::AssignmentsMatching(exercise_patterns(1..=3)),
            ),
            derive_sum(
                "assignment2_total",
                ColumnSet::AssignmentsMatching(exercise_patterns(4..=6)),
            ),
            derive_sum("assignment_total", ColumnSet::Assignments),
        ],
        assignments: Some(AssignmentRule {
            groups: vec![
                named_group(
                    "assignment1_total",
                    0.25 * 35.0,
                    "assignment 1 threshold not reached",
                ),
                named_group(
                    "assignment2_total",
                    0.25 * 55.0,
                    "assignment 2 threshold not reached",
                ),
            ],
            group_failure: GroupFailure::PerGroup,
            skip_limit: None,
            success_count: None,
            combined: Some(CombinedMinimum {
                amount: Amount::Derived("assignment_total".to_string()),
                minimum_points: 0.5 * 90.0,
                reason: "total assignment threshold not reached".to_string(),
            }),
            total: Amount::Derived("assignment_total".to_string()),
        }),
        exam: ExamRule {
            attempt_minimum: Some(PointsMinimum::new(0.5 * 10.0, "exam threshold not reached")),
            ..three_sittings(0.0, 0.0)
        }
        .into(),
        total: TotalFormula::ExamPlusAssignments,
        ..base(
            "python2-2022s",
            "Python 2, summer term 2022 (combined course)",
            "python2",
            100.0,
        )
    }
}

pub fn handson2_lecture_2022s() -> Policy {
    Policy {
        exam: Some(three_sittings(0.5, 0.0)),
        // Totals a hair under the next full point are rounded up to it.
        snap: Some(SnapToInteger { within: 0.1 }),
        row_filter: Some(RowFilter::AnyQuizAttempted),
        ..base(
            "handson2-lecture-2022s",
            "Hands-on AI 2 lecture, summer term 2022",
            "handson2",
            40.0,
        )
    }
}

pub fn handson2_exercise_2022s() -> Policy {
    handson_exercise(
        "handson2-exercise-2022s",
        "Hands-on AI 2 exercise, summer term 2022 (6 assignments)",
        "handson2",
        600.0,
    )
}

/// 2023S Python 2 exercise: six assignments plus a 400-point project, two
/// tolerated fails across all seven, 50% exam gate, bonus after gates.
pub fn python2_exercise_2023s() -> Policy {
    let project = "Assignment: Assignment 7 (Project) (Real)".to_string();
    let mut groups: Vec<ComponentGroup> = assignment_fields(1..=6)
        .into_iter()
        .map(|field| ComponentGroup {
            amount: Amount::Field(field),
            minimum_points: 0.25 * 100.0,
            reason: None,
        })
        .collect();
    groups.push(ComponentGroup {
        amount: Amount::Field(project),
        minimum_points: 0.25 * 400.0,
        reason: None,
    });

    Policy {
        participation: ParticipationScope::AssignmentsOnly,
        setup: vec![derive_sum(
            "assignment_total",
            ColumnSet::AssignmentsExcluding(vec!["bonus".to_string()]),
        )],
        assignments: Some(AssignmentRule {
            groups,
            group_failure: GroupFailure::Tolerance {
                allowed: 2,
                reason: "more than 2 individual assignment thresholds not reached".to_string(),
            },
            skip_limit: None,
            success_count: None,
            combined: Some(CombinedMinimum {
                amount: Amount::Derived("assignment_total".to_string()),
                minimum_points: 0.5 * 1000.0,
                reason: "total assignment threshold not reached".to_string(),
            }),
            total: Amount::Derived("assignment_total".to_string()),
        }),
        exam: ExamRule {
            attempt_minimum: Some(PointsMinimum::new(0.5 * 100.0, "exam threshold not reached")),
            ..three_sittings(0.0, 0.0)
        }
        .into(),
        bonus: vec!["Assignment: Assignment 8 (Bonus) (Real)".to_string()],
        total: TotalFormula::ExamPlusAssignments,
        ..base(
            "python2-exercise-2023s",
            "Python 2 exercise, summer term 2023",
            "python2",
            1100.0,
        )
    }
}

pub fn handson2_lecture_2023s() -> Policy {
    Policy {
        // +0.625 on the retry: one question covered exercise-only material.
        exam: Some(three_sittings(0.0, 0.625)),
        row_filter: Some(RowFilter::AnyQuizAttempted),
        warn_if_unmatched: true,
        ..base(
            "handson2-lecture-2023s",
            "Hands-on AI 2 lecture, summer term 2023",
            "handson2",
            100.0,
        )
    }
}

pub fn handson2_exercise_2023s() -> Policy {
    handson_exercise(
        "handson2-exercise-2023s",
        "Hands-on AI 2 exercise, summer term 2023 (6 assignments)",
        "handson2",
        600.0,
    )
}

pub fn python1_lecture_2023w() -> Policy {
    Policy {
        // +(2.5 / 3) on both graded sittings: one misleading answer option.
        exam: Some(three_sittings(2.5 / 3.0, 2.5 / 3.0)),
        row_filter: Some(RowFilter::AnyQuizAttempted),
        warn_if_unmatched: true,
        ..base(
            "python1-lecture-2023w",
            "Python 1 lecture, winter term 2023",
            "python1",
            100.0,
        )
    }
}

pub fn python2_lecture_2024s() -> Policy {
    Policy {
        exam: Some(three_sittings(0.0, 0.0)),
        row_filter: Some(RowFilter::FieldPresent(EXAM.to_string())),
        warn_if_unmatched: true,
        ..base(
            "python2-lecture-2024s",
            "Python 2 lecture, summer term 2024",
            "python2",
            100.0,
        )
    }
}

fn group(derived: &str, minimum_points: f64) -> ComponentGroup {
    ComponentGroup {
        amount: Amount::Derived(derived.to_string()),
        minimum_points,
        reason: None,
    }
}

fn named_group(derived: &str, minimum_points: f64, reason: &str) -> ComponentGroup {
    ComponentGroup {
        reason: Some(reason.to_string()),
        ..group(derived, minimum_points)
    }
}

//! Policy behavior driven end-to-end through sheet ingestion, roster join,
//! and evaluation, using each course's real column layout.

use gradebook::grading::sheet::ExamResultOptions;
use gradebook::grading::{
    catalog, grade_course, GradeSheet, GradingReport, Roster, RosterOptions, SheetOptions,
    Warning,
};

fn grade(course: &str, moodle: &str, roster: &str) -> GradingReport {
    let policy = catalog::find(course).expect("course exists");
    let sheet =
        GradeSheet::from_reader(moodle.as_bytes(), &SheetOptions::default()).expect("sheet parses");
    let roster =
        Roster::from_readers(vec![roster.as_bytes()], &RosterOptions::default()).expect("roster");
    grade_course(sheet, roster, &policy).expect("grades")
}

fn outcome_of(report: &GradingReport, matriculation: u64) -> (u8, String) {
    let student = report
        .students
        .iter()
        .find(|student| student.roster.matriculation.value() == matriculation)
        .expect("student graded");
    (
        student.outcome.grade.value(),
        student.outcome.reason.clone(),
    )
}

fn roster_for(ids: &[u64]) -> String {
    let mut text = "Matrikelnummer;SKZ\n".to_string();
    for id in ids {
        text.push_str(&format!("k{id:08};521\n"));
    }
    text
}

fn csv(header: &[String], rows: &[Vec<String>]) -> String {
    let mut text = header.join(",");
    text.push('\n');
    for row in rows {
        text.push_str(&row.join(","));
        text.push('\n');
    }
    text
}

fn identity(id: u64) -> Vec<String> {
    vec!["A".to_string(), "B".to_string(), id.to_string()]
}

mod handson_exercise {
    use super::*;

    fn sheet(rows: &[(u64, Vec<&str>)]) -> String {
        let mut header: Vec<String> = vec![
            "First name".to_string(),
            "Surname".to_string(),
            "ID number".to_string(),
        ];
        header.extend((1..=6).map(|i| format!("Assignment: Assignment {i} (Real)")));
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(id, points)| {
                let mut row = identity(*id);
                row.extend(points.iter().map(|p| p.to_string()));
                row
            })
            .collect();
        csv(&header, &rows)
    }

    #[test]
    fn one_skipped_assignment_is_tolerated_two_are_not() {
        let moodle = sheet(&[
            (11800001, vec!["0", "100", "100", "100", "100", "100"]),
            (11800002, vec!["0", "0", "100", "100", "100", "100"]),
            (11800003, vec!["-", "0", "100", "100", "100", "100"]),
        ]);
        let report = grade(
            "handson2-exercise-2022s",
            &moodle,
            &roster_for(&[11800001, 11800002, 11800003]),
        );

        // 500/600 = 83.33% with exactly one zero falls through to the scale.
        assert_eq!(outcome_of(&report, 11800001), (2, String::new()));
        // Two zeros, or a zero plus a skip, trip the tolerance rule.
        let reason = "more than 1 assignment skipped/graded with 0 points".to_string();
        assert_eq!(outcome_of(&report, 11800002), (5, reason.clone()));
        assert_eq!(outcome_of(&report, 11800003), (5, reason));
    }
}

mod python1_exercise {
    use super::*;

    const EXAM_FULL: [&str; 3] = ["100", "-", "-"];

    fn sheet(rows: &[(u64, Vec<String>, &str, [&str; 3])]) -> String {
        let mut header: Vec<String> = vec![
            "First name".to_string(),
            "Surname".to_string(),
            "ID number".to_string(),
        ];
        header.extend((1..=10).map(|i| format!("Assignment: Assignment {i} (Real)")));
        header.push("Assignment: Assignment 11 (Bonus) (Real)".to_string());
        header.extend([
            "Quiz: Exam (Real)".to_string(),
            "Quiz: Retry Exam (Real)".to_string(),
            "Quiz: Retry Exam 2 (Real)".to_string(),
        ]);
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(id, assignments, bonus, exams)| {
                let mut row = identity(*id);
                row.extend(assignments.iter().cloned());
                row.push(bonus.to_string());
                row.extend(exams.iter().map(|e| e.to_string()));
                row
            })
            .collect();
        csv(&header, &rows)
    }

    fn uniform(points: &str) -> Vec<String> {
        vec![points.to_string(); 10]
    }

    #[test]
    fn bonus_points_never_rescue_a_hard_fail() {
        let mut failing = uniform("100");
        failing[0] = "0".to_string();
        failing[1] = "0".to_string();
        failing[2] = "0".to_string();

        let moodle = sheet(&[
            (11800001, failing, "50", EXAM_FULL),
            (11800002, uniform("49"), "50", EXAM_FULL),
        ]);
        let report = grade(
            "python1-exercise-2022w",
            &moodle,
            &roster_for(&[11800001, 11800002]),
        );

        // Three failed individual thresholds; +50 bonus must not matter.
        assert_eq!(
            outcome_of(&report, 11800001),
            (
                5,
                "more than 2 individual assignment thresholds not reached".to_string()
            )
        );
        // 490/1000 misses the combined gate; bonus would have covered it.
        assert_eq!(
            outcome_of(&report, 11800002),
            (5, "total assignment threshold not reached".to_string())
        );
    }

    #[test]
    fn bonus_points_do_count_once_every_gate_is_passed() {
        let moodle = sheet(&[
            (11800001, uniform("58"), "50", EXAM_FULL),
            (11800002, uniform("58"), "0", EXAM_FULL),
        ]);
        let report = grade(
            "python1-exercise-2022w",
            &moodle,
            &roster_for(&[11800001, 11800002]),
        );

        // 580 + 50 bonus + 100.5 exam = 730.5 of 1100 -> 66% -> grade 3.
        assert_eq!(outcome_of(&report, 11800001), (3, String::new()));
        // Without the bonus: 680.5 of 1100 -> 62% -> grade 4.
        assert_eq!(outcome_of(&report, 11800002), (4, String::new()));
    }

    #[test]
    fn exactly_two_failed_assignments_are_tolerated() {
        let mut two_zero = uniform("100");
        two_zero[0] = "0".to_string();
        two_zero[1] = "0".to_string();

        let moodle = sheet(&[(11800001, two_zero, "50", EXAM_FULL)]);
        let report = grade("python1-exercise-2022w", &moodle, &roster_for(&[11800001]));

        // 800 + 50 + 100.5 = 950.5 of 1100 -> 86% -> grade 2.
        assert_eq!(outcome_of(&report, 11800001), (2, String::new()));
    }
}

mod python1_combined {
    use super::*;

    fn sheet(rows: &[(u64, Vec<(u32, &str)>, [&str; 3])]) -> String {
        let mut header: Vec<String> = vec![
            "First name".to_string(),
            "Surname".to_string(),
            "ID number".to_string(),
        ];
        header.extend((1..=21).map(|i| format!("Assignment: Exercise {i} (Real)")));
        header.extend([
            "Quiz: Exam 1 (Real)".to_string(),
            "Quiz: Exam 2 (Real)".to_string(),
            "Quiz: Retry Exam (Real)".to_string(),
        ]);
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(id, exercises, quizzes)| {
                let mut row = identity(*id);
                let mut points = vec!["0".to_string(); 21];
                for (exercise, value) in exercises {
                    points[(*exercise - 1) as usize] = value.to_string();
                }
                row.extend(points);
                row.extend(quizzes.iter().map(|q| q.to_string()));
                row
            })
            .collect();
        csv(&header, &rows)
    }

    // Exercise points arrive scaled by 10: 150 in the export is 15 points.
    const FULL_BLOCKS: [(u32, &str); 3] = [(1, "150"), (5, "300"), (16, "350")];

    #[test]
    fn both_sides_carry_individual_and_combined_thresholds() {
        let moodle = sheet(&[
            (11800001, FULL_BLOCKS.to_vec(), ["10", "10", "-"]),
            (11800002, FULL_BLOCKS.to_vec(), ["10", "10", "9"]),
            (11800003, FULL_BLOCKS.to_vec(), ["4", "4", "-"]),
            (
                11800004,
                vec![(1, "150"), (5, "300"), (16, "30")],
                ["10", "10", "-"],
            ),
            (
                11800005,
                vec![(1, "40"), (5, "80"), (16, "90")],
                ["10", "10", "-"],
            ),
        ]);
        let report = grade(
            "python1-2021w",
            &moodle,
            &roster_for(&[11800001, 11800002, 11800003, 11800004, 11800005]),
        );

        // 80 assignment + 20 quiz points: full marks.
        assert_eq!(outcome_of(&report, 11800001), (1, String::new()));
        // The retry supersedes two passing part exams, and 9 < 10.
        assert_eq!(
            outcome_of(&report, 11800002),
            (5, "individual quiz thresholds not reached".to_string())
        );
        // Both parts pass individually (4 >= 4) but 8 < 10 combined.
        assert_eq!(
            outcome_of(&report, 11800003),
            (5, "total quiz threshold not reached".to_string())
        );
        // Third block at 3 of 35 points misses its 25%.
        assert_eq!(
            outcome_of(&report, 11800004),
            (5, "individual assignment thresholds not reached".to_string())
        );
        // Every block passes 25% but 21 < 40 combined.
        assert_eq!(
            outcome_of(&report, 11800005),
            (5, "total assignment threshold not reached".to_string())
        );
    }
}

mod sw1_exercise {
    use super::*;

    fn sheet(rows: &[(u64, Vec<&str>, &str)]) -> String {
        let mut header: Vec<String> = vec![
            "First name".to_string(),
            "Surname".to_string(),
            "ID number".to_string(),
        ];
        header.extend((1..=10).map(|i| format!("Assignment: Assignment {i} (Real)")));
        header.push("Assignment: Bonus Exercise (Real)".to_string());
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(id, mandatory, bonus)| {
                let mut row = identity(*id);
                row.extend(mandatory.iter().map(|p| p.to_string()));
                row.push(bonus.to_string());
                row
            })
            .collect();
        csv(&header, &rows)
    }

    fn graded_report() -> GradingReport {
        let moodle = sheet(&[
            (11800001, vec!["20"; 10], "10"),
            (11800002, vec!["20"; 10], "0"),
            (
                11800003,
                vec!["20", "20", "20", "20", "20", "20", "20", "5", "5", "5"],
                "0",
            ),
            (11800004, vec!["20"; 10], "0"),
            (
                11800005,
                vec!["20", "20", "-", "-", "-", "-", "-", "-", "-", "-"],
                "-",
            ),
        ]);
        let exam_results = "Matr.Nr.\tSumme\nk11800001\t80\nk11800002\t40\nk11800003\t80\n";

        let policy = catalog::find("sw1-exercise-2021w").expect("course exists");
        let mut sheet =
            GradeSheet::from_reader(moodle.as_bytes(), &SheetOptions::default()).expect("parses");
        sheet
            .merge_exam_readers(vec![exam_results.as_bytes()], &ExamResultOptions::default())
            .expect("merges");
        let roster = Roster::from_readers(
            vec![roster_for(&[11800001, 11800002, 11800003, 11800004]).as_bytes()],
            &RosterOptions::default(),
        )
        .expect("roster");
        grade_course(sheet, roster, &policy).expect("grades")
    }

    #[test]
    fn weighted_total_combines_normalized_assignments_and_rescaled_exam() {
        let report = graded_report();
        // (210/10) * 0.8 + (24 * 80/90) * 0.2 = 21.07 of 24 -> 88% -> 1.
        assert_eq!(outcome_of(&report, 11800001), (1, String::new()));
    }

    #[test]
    fn rescaled_exam_below_half_is_negative() {
        let report = graded_report();
        assert_eq!(
            outcome_of(&report, 11800002),
            (5, "exam negative".to_string())
        );
    }

    #[test]
    fn at_least_eight_successful_assignments_are_required() {
        let report = graded_report();
        assert_eq!(
            outcome_of(&report, 11800003),
            (5, "fewer than 8 successful assignments".to_string())
        );
    }

    #[test]
    fn students_without_any_exam_result_fail_with_exam_missing() {
        let report = graded_report();
        assert_eq!(
            outcome_of(&report, 11800004),
            (5, "exam missing".to_string())
        );
    }

    #[test]
    fn too_few_mandatory_submissions_drop_the_student_before_grading() {
        let report = graded_report();
        assert!(!report
            .students
            .iter()
            .any(|student| student.roster.matriculation.value() == 11800005));
        assert!(report
            .warnings
            .iter()
            .any(|warning| matches!(warning, Warning::NoSubmissions { dropped: 1 })));
    }
}

mod lecture {
    use super::*;

    fn sheet(rows: &[(u64, &str, [&str; 3])]) -> String {
        let header: Vec<String> = vec![
            "First name".to_string(),
            "Surname".to_string(),
            "ID number".to_string(),
            "Assignment: Assignment 1 (Real)".to_string(),
            "Quiz: Exam (Real)".to_string(),
            "Quiz: Retry Exam (Real)".to_string(),
            "Quiz: Retry Exam 2 (Real)".to_string(),
        ];
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|(id, assignment, quizzes)| {
                let mut row = identity(*id);
                row.push(assignment.to_string());
                row.extend(quizzes.iter().map(|q| q.to_string()));
                row
            })
            .collect();
        csv(&header, &rows)
    }

    #[test]
    fn the_row_filter_excludes_students_without_any_quiz_attempt() {
        let moodle = sheet(&[
            (11800001, "50", ["-", "-", "-"]),
            (11800002, "-", ["-", "60", "-"]),
        ]);
        let report = grade(
            "handson2-lecture-2023s",
            &moodle,
            &roster_for(&[11800001, 11800002]),
        );

        assert_eq!(report.excluded_by_filter, 1);
        assert_eq!(report.students.len(), 1);
        // 60 + 0.625 retry correction = 60.625 of 100 -> 61% -> grade 4.
        assert_eq!(outcome_of(&report, 11800002), (4, String::new()));
    }

    #[test]
    fn sheet_students_missing_from_the_roster_are_called_out() {
        let moodle = sheet(&[
            (11800001, "-", ["80", "-", "-"]),
            (11800002, "-", ["90", "-", "-"]),
        ]);
        let report = grade("handson2-lecture-2023s", &moodle, &roster_for(&[11800001]));

        assert!(report.warnings.iter().any(|warning| matches!(
            warning,
            Warning::NotOnRoster { matriculation, .. }
                if matriculation.value() == 11800002
        )));
    }

    #[test]
    fn a_later_retry_fully_supersedes_the_first_sitting() {
        // 40-point lecture quiz: first sitting 0, retry 40 -> grade 1.
        let moodle = sheet(&[(11800001, "-", ["0", "40", "-"])]);
        let report = grade(
            "handson2-lecture-2022s",
            &moodle,
            &roster_for(&[11800001]),
        );
        assert_eq!(outcome_of(&report, 11800001), (1, String::new()));
    }

    #[test]
    fn near_integer_lecture_totals_round_up_to_the_next_grade() {
        let moodle = sheet(&[
            (11800001, "-", ["34.45", "-", "-"]),
            (11800002, "-", ["34.3", "-", "-"]),
        ]);
        let report = grade(
            "handson2-lecture-2022s",
            &moodle,
            &roster_for(&[11800001, 11800002]),
        );

        // 34.45 + 0.5 = 34.95 snaps to 35 of 40 -> 87.5% -> grade 1.
        assert_eq!(outcome_of(&report, 11800001), (1, String::new()));
        // 34.3 + 0.5 = 34.8 does not snap: 87% -> grade 2.
        assert_eq!(outcome_of(&report, 11800002), (2, String::new()));
    }
}

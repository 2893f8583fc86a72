use gradebook::grading::export::{write_grading, ExportOptions};
use gradebook::grading::{
    catalog, grade_course, Grade, GradeSheet, GradingError, GradingReport, Roster, RosterOptions,
    SheetOptions, Warning,
};

// German-localized export, as the platform produces it for this course.
const MOODLE_EXPORT: &str = "\
Vorname,Nachname,ID-Nummer,E-Mail-Adresse,Aufgabe: Exercise 1 (Punkte),Aufgabe: Exercise 2 (Punkte),Aufgabe: Exercise 3 (Punkte),Aufgabe: Exercise 4 (Punkte),Aufgabe: Exercise 5 (Punkte),Aufgabe: Exercise 6 (Punkte),Test: Exam (Punkte),Test: Retry Exam (Punkte),Test: Retry Exam 2 (Punkte),Kurs gesamt (Punkte)
Anna,One,11800001,anna@example.org,5,15,15,20,35,0,10,-,-,100
Bernd,Two,11800002,bernd@example.org,17.15,0,0,26.95,0,0,10,-,-,54.1
Clara,Three,11800003,clara@example.org,8,0,0,20,35,0,10,-,-,73
David,Four,11800004,david@example.org,5,15,15,20,35,0,-,-,-,90
Emma,Five,11800005,emma@example.org,5,15,15,20,35,0,0,10,-,100
Felix,Six,11800006,felix@example.org,5,15,15,20,35,0,10,0,-,90
Gina,Seven,11800007,gina@example.org,-,-,-,-,-,-,-,-,-,-
Hans,Eight,11800008,hans@example.org,5,15,15,20,35,0,10,-,-,100
Ida,Nine,ext-042,ida@example.org,5,15,15,20,35,0,10,-,-,100
";

const ROSTER_A: &str = "\
Matrikelnummer;SKZ
k11800005;521
k11800001;521
k11800002;521
k11800003;521
";

const ROSTER_B: &str = "\
Matrikelnummer;SKZ
k11800004;521
k11800006;921
k11800001;521
k11800099;521
";

fn run() -> GradingReport {
    let policy = catalog::find("python2-2022s").expect("course exists");
    let sheet =
        GradeSheet::from_reader(MOODLE_EXPORT.as_bytes(), &SheetOptions::default()).expect("parses");
    let roster = Roster::from_readers(
        vec![ROSTER_A.as_bytes(), ROSTER_B.as_bytes()],
        &RosterOptions::default(),
    )
    .expect("parses");
    grade_course(sheet, roster, &policy).expect("grades")
}

#[test]
fn grades_are_roster_matched_and_deterministically_ordered() {
    let report = run();

    let summary: Vec<(u64, &str, u8, &str)> = report
        .students
        .iter()
        .map(|student| {
            (
                student.roster.matriculation.value(),
                student.roster.study_program.as_str(),
                student.outcome.grade.value(),
                student.outcome.reason.as_str(),
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            (11_800_001, "521", 1, ""),
            (11_800_002, "521", 5, "total assignment threshold not reached"),
            (11_800_003, "521", 5, "assignment 1 threshold not reached"),
            (11_800_004, "521", 5, "no exam participation"),
            (11_800_005, "521", 1, ""),
            (11_800_006, "921", 5, "exam threshold not reached"),
        ]
    );
}

#[test]
fn reasons_are_empty_exactly_for_non_failing_grades() {
    let report = run();
    for student in &report.students {
        if student.outcome.grade == Grade::Insufficient {
            assert!(!student.outcome.reason.is_empty());
        } else {
            assert!(student.outcome.reason.is_empty());
        }
    }
}

#[test]
fn data_quality_findings_are_collected_not_fatal() {
    let report = run();

    // Ida's id fails the numeric format check.
    assert!(report.warnings.iter().any(|warning| matches!(
        warning,
        Warning::InvalidStudentId { value, .. } if value == "ext-042"
    )));
    // Gina never submitted anything and is dropped, not failed.
    assert!(report
        .warnings
        .iter()
        .any(|warning| matches!(warning, Warning::NoSubmissions { dropped: 1 })));
    // Anna appears on both roster exports.
    assert!(report.warnings.iter().any(|warning| matches!(
        warning,
        Warning::DuplicateRosterEntry { matriculation, .. }
            if matriculation.value() == 11_800_001
    )));
    // Hans (not on any roster) and k11800099 (no submissions) are dropped
    // silently; neither shows up as a graded student.
    assert!(!report
        .students
        .iter()
        .any(|student| student.roster.matriculation.value() == 11_800_008));
}

#[test]
fn the_upload_file_is_headerless_and_semicolon_separated() {
    let report = run();
    let mut bytes = Vec::new();
    write_grading(&report, &mut bytes, &ExportOptions::default()).expect("writes");
    let text = String::from_utf8(bytes).expect("utf8");

    assert_eq!(
        text,
        "11800001;521;1;\n\
         11800002;521;5;total assignment threshold not reached\n\
         11800003;521;5;assignment 1 threshold not reached\n\
         11800004;521;5;no exam participation\n\
         11800005;521;1;\n\
         11800006;921;5;exam threshold not reached\n"
    );
}

#[test]
fn repeated_runs_produce_byte_identical_output() {
    let mut first = Vec::new();
    write_grading(&run(), &mut first, &ExportOptions::default()).expect("writes");
    let mut second = Vec::new();
    write_grading(&run(), &mut second, &ExportOptions::default()).expect("writes");
    assert_eq!(first, second);
}

#[test]
fn a_roster_without_any_matching_student_is_fatal() {
    let policy = catalog::find("python2-2022s").expect("course exists");
    let sheet =
        GradeSheet::from_reader(MOODLE_EXPORT.as_bytes(), &SheetOptions::default()).expect("parses");
    let roster = Roster::from_readers(
        vec!["Matrikelnummer;SKZ\nk99999999;521\n".as_bytes()],
        &RosterOptions::default(),
    )
    .expect("parses");

    let result = grade_course(sheet, roster, &policy);
    assert!(matches!(result, Err(GradingError::Empty(_))));
}

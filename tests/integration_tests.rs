use gradebook::GradeError;
use gradebook::grading::aggregate::build_report;
use gradebook::grading::{AveragePolicy, LetterGrade, grade_roster};
use gradebook::output;
use gradebook::reconcile::{IncomingRecord, Reconciliation, reconcile};
use gradebook::roster::{EXAM, ID, NAME, Roster, StudentRecord};
use std::fs;
use std::path::Path;

fn import(raw: &Path, source: &Path) -> Vec<Reconciliation> {
    let mut roster = output::load_or_init(raw, false).expect("Failed to load roster");
    let mut outcomes = Vec::new();
    for incoming in output::read_incoming(source).expect("Failed to read import file") {
        let (next, outcome) = reconcile(roster, &incoming).expect("Failed to reconcile");
        roster = next;
        outcomes.push(outcome);
    }
    output::write_roster(raw, &roster).expect("Failed to write roster");
    outcomes
}

fn results(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let mut rows = vec![rdr.headers().unwrap().iter().map(str::to_string).collect()];
    for record in rdr.records() {
        rows.push(record.unwrap().iter().map(str::to_string).collect());
    }
    rows
}

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("students_raw.csv");
    let source = dir.path().join("import.csv");
    let results_path = dir.path().join("students_results.csv");

    fs::write(
        &source,
        "Name,ID,Assignment1,Lab1,Test1,Exam\n\
         Ann,007,8,6.5,70,65\n\
         Bob,2,10,10,100,100\n\
         Cat,3,5,5,50,50\n",
    )
    .unwrap();

    let outcomes = import(&raw, &source);
    assert_eq!(
        outcomes,
        [
            Reconciliation::Inserted { row: 0 },
            Reconciliation::Inserted { row: 1 },
            Reconciliation::Inserted { row: 2 },
        ]
    );

    let roster = output::read_roster(&raw).unwrap();
    let graded = grade_roster(roster, AveragePolicy::SkipMissing);
    output::write_results(&results_path, &graded).unwrap();

    let rows = results(&results_path);
    assert_eq!(
        rows[0],
        [
            "Name",
            "ID",
            "Assignment1",
            "Lab1",
            "Test1",
            "Exam",
            "Avg_Assignments",
            "Avg_Labs",
            "Avg_Tests",
            "Final_Grade",
            "Letter_Grade"
        ]
    );
    assert_eq!(rows[1][1], "007");
    assert_eq!(rows[1][9], "68.75");
    assert_eq!(rows[1][10], "C");
    assert_eq!(rows[2][10], "A");
    assert_eq!(rows[3][9], "50");
    assert_eq!(rows[3][10], "D");

    let report = build_report(&graded, 2);
    let names: Vec<_> = report
        .leaderboard
        .iter()
        .map(|e| e.name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, ["Bob", "Ann"]);

    // Derived columns never reach the raw roster.
    let raw_text = fs::read_to_string(&raw).unwrap();
    assert!(!raw_text.contains("Final_Grade"));
}

#[test]
fn test_second_import_updates_and_widens_schema() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    fs::write(
        &first,
        "Name,ID,Assignment1,Lab1,Test1,Exam\nAnn,1,8,6.5,70,65\nBob,2,10,10,100,100\n",
    )
    .unwrap();
    fs::write(&second, "Name,ID,Assignment2,Exam\nANN,1,6,65\nDan,4,,40\n").unwrap();

    import(&raw, &first);
    let outcomes = import(&raw, &second);
    assert_eq!(
        outcomes,
        [
            Reconciliation::Updated { row: 0 },
            Reconciliation::Inserted { row: 2 }
        ]
    );

    let roster = output::read_roster(&raw).unwrap();
    assert_eq!(roster.len(), 3);
    assert!(roster.has_column("Assignment2"));

    let bob = &roster.records()[1];
    assert!(bob.get("Assignment2").is_null());

    let graded = grade_roster(roster, AveragePolicy::SkipMissing);
    let ann = &graded.rows[0];
    assert_eq!(ann.avg_assignments, Some(7.0));
    assert_eq!(ann.name.as_deref(), Some("ANN"));
    assert_eq!(graded.rows[1].avg_assignments, Some(10.0));

    // Dan has an exam but no coursework, so no final grade.
    let dan = &graded.rows[2];
    assert_eq!(dan.final_grade, None);
    assert_eq!(dan.letter_grade, None);
    assert!(matches!(
        dan.final_grade(),
        Err(GradeError::MissingRequiredField { row: 2, .. })
    ));

    let report = build_report(&graded, 10);
    assert_eq!(report.leaderboard.len(), 2);
    assert_eq!(report.distribution.undefined, 1);
}

#[test]
fn test_invalid_import_leaves_roster_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let source = dir.path().join("bad.csv");

    output::init_roster(&raw, false).unwrap();
    let before = fs::read_to_string(&raw).unwrap();

    fs::write(&source, "Name,ID,Lab1,Exam\nAnn,1,11,50\n").unwrap();
    let err = output::read_incoming(&source).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GradeError>(),
        Some(GradeError::InvalidMark { .. })
    ));

    assert_eq!(fs::read_to_string(&raw).unwrap(), before);
}

#[test]
fn test_ambiguous_identity_rejected() {
    let mut roster = Roster::starter(false);
    roster.push(StudentRecord::new().with(NAME, "Ann").with(ID, "1").with(EXAM, 50.0));
    roster.push(StudentRecord::new().with(NAME, "Bob").with(ID, "2").with(EXAM, 60.0));

    let err = reconcile(roster, &IncomingRecord::new("Ann", "2", 70.0)).unwrap_err();
    assert_eq!(
        err,
        GradeError::AmbiguousIdentity {
            name: "Ann".to_string(),
            id: "2".to_string(),
            name_row: 0,
            id_row: 1,
        }
    );
}

#[test]
fn test_require_all_policy_leaves_gaps_undefined() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let source = dir.path().join("import.csv");

    fs::write(
        &source,
        "Name,ID,Assignment1,Assignment2,Lab1,Test1,Exam\n\
         Ann,1,8,,6,70,65\n\
         Bob,2,10,9,10,100,100\n",
    )
    .unwrap();
    import(&raw, &source);

    let graded = grade_roster(output::read_roster(&raw).unwrap(), AveragePolicy::RequireAll);
    assert_eq!(graded.rows[0].avg_assignments, None);
    assert_eq!(graded.rows[0].final_grade, None);
    assert_eq!(graded.rows[1].letter_grade, Some(LetterGrade::A));
}

#[test]
fn test_json_report() {
    let mut roster = Roster::starter(false);
    roster.push(
        StudentRecord::new()
            .with(NAME, "Bob")
            .with(ID, "2")
            .with("Assignment1", 10.0)
            .with("Lab1", 10.0)
            .with("Test1", 100.0)
            .with(EXAM, 100.0),
    );
    let graded = grade_roster(roster, AveragePolicy::default());
    let report = build_report(&graded, 5);

    let mut buf = Vec::new();
    output::print_json(&mut buf, &report).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(json["students"], 1);
    assert_eq!(json["leaderboard"][0]["name"], "Bob");
    assert_eq!(json["leaderboard"][0]["letter_grade"], "A");
    assert_eq!(json["leaderboard"][0]["final_grade"], 100.0);
}

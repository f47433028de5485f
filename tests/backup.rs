use school_records::backup::{read_backup, restore, snapshot, write_backup};
use school_records::db::{
    add_course, add_instructor, add_student, assign_instructor, delete_student, enroll_student,
    open_in_memory,
};
use school_records::export::{export_csv, write_export};
use school_records::{Backup, CourseDraft, PersonDraft, Registration};

fn seeded() -> rusqlite::Connection {
    let conn = open_in_memory().unwrap();
    let ada = add_student(&conn, &PersonDraft::new("S1", "Ada", "19", "ada@school.org")).unwrap();
    add_student(&conn, &PersonDraft::new("S2", "Alan, Jr.", "21", "alan@school.org")).unwrap();
    let grace = add_instructor(&conn, &PersonDraft::new("I1", "Grace", "40", "g@navy.mil")).unwrap();
    let course = add_course(&conn, &CourseDraft::new("CS101", "Intro")).unwrap();
    enroll_student(&conn, ada.id, course.id).unwrap();
    assign_instructor(&conn, grace.id, course.id).unwrap();
    conn
}

#[test]
fn backup_document_is_keyed_by_table() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");

    write_backup(&conn, &path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let object = raw.as_object().unwrap();
    let mut keys = object.keys().cloned().collect::<Vec<_>>();
    keys.sort();
    assert_eq!(
        keys,
        ["assignments", "courses", "instructors", "registrations", "students"]
    );
    assert_eq!(raw["students"][0]["student_id"], "S1");
    assert_eq!(raw["students"][0]["age"], 19);
    assert_eq!(raw["courses"][0]["course_name"], "Intro");
    assert_eq!(raw["registrations"].as_array().unwrap().len(), 1);
}

#[test]
fn backup_then_restore_reconstructs_every_row() {
    let mut conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");

    let written = write_backup(&conn, &path).unwrap();
    let original = snapshot(&conn).unwrap();
    assert_eq!(written, original);

    // Diverge from the backup, then restore it.
    delete_student(&mut conn, original.students[0].id).unwrap();
    add_course(&conn, &CourseDraft::new("MA101", "Calculus")).unwrap();

    let backup = read_backup(&path).unwrap();
    assert_eq!(backup, original);
    restore(&mut conn, &backup).unwrap();

    assert_eq!(snapshot(&conn).unwrap(), original);
}

#[test]
fn restore_into_an_empty_store() {
    let source = seeded();
    let original = snapshot(&source).unwrap();

    let mut target = open_in_memory().unwrap();
    restore(&mut target, &original).unwrap();
    assert_eq!(snapshot(&target).unwrap(), original);

    // New rows continue after the restored ids.
    let added = add_course(&target, &CourseDraft::new("MA101", "Calculus")).unwrap();
    assert!(original.courses.iter().all(|course| course.id < added.id));
}

#[test]
fn reading_a_malformed_backup_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");
    std::fs::write(&path, "{\"students\": 3}").unwrap();

    let err = read_backup(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse backup file"));
}

#[test]
fn csv_export_lists_every_record() {
    let conn = seeded();
    let mut out = Vec::new();

    let rows = export_csv(&conn, &mut out).unwrap();
    assert_eq!(rows, 4);

    let text = String::from_utf8(out).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        [
            "ID,Name,Type",
            "S1,Ada,Student",
            "S2,\"Alan, Jr.\",Student",
            "I1,Grace,Instructor",
            "CS101,Intro,Course",
        ]
    );
}

#[test]
fn csv_export_to_file() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.csv");

    assert_eq!(write_export(&conn, &path).unwrap(), 4);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), ["ID", "Name", "Type"]);
    assert_eq!(reader.records().count(), 4);
}

#[test]
fn failed_restore_leaves_the_store_untouched() {
    let mut conn = seeded();
    let before = snapshot(&conn).unwrap();

    let dangling = Backup {
        registrations: vec![Registration {
            id: 1,
            student_id: 9,
            course_id: 9,
        }],
        ..Backup::default()
    };

    let err = restore(&mut conn, &dangling).unwrap_err();
    assert_eq!(err.to_string(), "failed to restore registration");
    assert_eq!(
        err.chain().last().map(|cause| cause.to_string()),
        Some("Backup references a missing student, instructor or course.".to_string())
    );
    assert_eq!(snapshot(&conn).unwrap(), before);
}

#[test]
fn rewriting_a_backup_replaces_it_without_leftovers() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");

    write_backup(&conn, &path).unwrap();
    add_course(&conn, &CourseDraft::new("MA101", "Calculus")).unwrap();
    write_backup(&conn, &path).unwrap();

    assert_eq!(read_backup(&path).unwrap().courses.len(), 2);
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn failed_backup_write_keeps_the_previous_backup() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");

    let first = write_backup(&conn, &path).unwrap();

    // A directory squatting on the staging name makes the write fail.
    std::fs::create_dir(dir.path().join("backup.json.tmp")).unwrap();
    add_course(&conn, &CourseDraft::new("MA101", "Calculus")).unwrap();

    assert!(write_backup(&conn, &path).is_err());
    assert_eq!(read_backup(&path).unwrap(), first);
}

use rusqlite::Connection;
use school_records::db::{
    add_course, add_instructor, add_student, assign_instructor, enroll_student, open_in_memory,
};
use school_records::{search, CourseDraft, PersonDraft, SearchCriteria};

fn person(id: &str, name: &str) -> PersonDraft {
    PersonDraft::new(id, name, "30", "someone@school.org")
}

/// Three students, two instructors, two courses with a few links.
fn seeded() -> Connection {
    let conn = open_in_memory().unwrap();
    let ada = add_student(&conn, &person("S100", "Ada Lovelace")).unwrap();
    let alan = add_student(&conn, &person("S200", "Alan Turing")).unwrap();
    add_student(&conn, &person("X300", "Barbara Liskov")).unwrap();
    let grace = add_instructor(&conn, &person("I100", "Grace Hopper")).unwrap();
    add_instructor(&conn, &person("I200", "Edsger Dijkstra")).unwrap();
    let intro = add_course(&conn, &CourseDraft::new("CS101", "Intro to Computing")).unwrap();
    let logic = add_course(&conn, &CourseDraft::new("MA210", "Logic")).unwrap();

    enroll_student(&conn, ada.id, intro.id).unwrap();
    enroll_student(&conn, ada.id, logic.id).unwrap();
    enroll_student(&conn, alan.id, logic.id).unwrap();
    assign_instructor(&conn, grace.id, intro.id).unwrap();
    conn
}

fn names<T>(rows: &[T], name: impl Fn(&T) -> &str) -> Vec<String> {
    rows.iter().map(|row| name(row).to_string()).collect()
}

#[test]
fn name_search_is_case_insensitive_substring() {
    let conn = seeded();

    let results = search(&conn, "LOV", SearchCriteria::Name).unwrap();
    assert_eq!(names(&results.students, |s| &s.name), ["Ada Lovelace"]);
    assert!(results.instructors.is_empty());

    let results = search(&conn, "a", SearchCriteria::Name).unwrap();
    assert_eq!(
        names(&results.students, |s| &s.name),
        ["Ada Lovelace", "Alan Turing", "Barbara Liskov"]
    );
    assert_eq!(names(&results.instructors, |i| &i.name), ["Grace Hopper", "Edsger Dijkstra"]);
    assert!(results.courses.is_empty());
}

#[test]
fn name_search_also_matches_course_names() {
    let conn = seeded();
    let results = search(&conn, "logic", SearchCriteria::Name).unwrap();
    assert!(results.students.is_empty());
    assert_eq!(names(&results.courses, |c| &c.course_name), ["Logic"]);
}

#[test]
fn id_search_matches_external_identifiers() {
    let conn = seeded();

    let results = search(&conn, "s", SearchCriteria::Id).unwrap();
    assert_eq!(names(&results.students, |s| &s.student_id), ["S100", "S200"]);
    assert!(results.instructors.is_empty());

    let results = search(&conn, "100", SearchCriteria::Id).unwrap();
    assert_eq!(names(&results.students, |s| &s.student_id), ["S100"]);
    assert_eq!(names(&results.instructors, |i| &i.instructor_id), ["I100"]);

    let results = search(&conn, "cs1", SearchCriteria::Id).unwrap();
    assert_eq!(names(&results.courses, |c| &c.course_id), ["CS101"]);
}

#[test]
fn course_search_follows_links_without_duplicates() {
    let conn = seeded();

    // Ada is enrolled in two matching courses but appears once.
    let results = search(&conn, "o", SearchCriteria::Course).unwrap();
    assert_eq!(names(&results.students, |s| &s.name), ["Ada Lovelace", "Alan Turing"]);
    assert_eq!(names(&results.instructors, |i| &i.name), ["Grace Hopper"]);
    assert_eq!(results.courses.len(), 2);

    let results = search(&conn, "intro", SearchCriteria::Course).unwrap();
    assert_eq!(names(&results.students, |s| &s.name), ["Ada Lovelace"]);
}

#[test]
fn wildcards_in_the_term_match_literally() {
    let conn = open_in_memory().unwrap();
    add_course(&conn, &CourseDraft::new("C1", "100% Effort")).unwrap();
    add_course(&conn, &CourseDraft::new("C2", "1000 Effort")).unwrap();

    let results = search(&conn, "100%", SearchCriteria::Name).unwrap();
    assert_eq!(names(&results.courses, |c| &c.course_name), ["100% Effort"]);

    let results = search(&conn, "_", SearchCriteria::Name).unwrap();
    assert!(results.is_empty());
}

#[test]
fn blank_term_returns_everything() {
    let conn = seeded();
    let results = search(&conn, "   ", SearchCriteria::Course).unwrap();
    assert_eq!(results.students.len(), 3);
    assert_eq!(results.instructors.len(), 2);
    assert_eq!(results.courses.len(), 2);
    assert_eq!(results.len(), 7);
}

#[test]
fn case_folding_covers_non_ascii_letters() {
    let conn = open_in_memory().unwrap();
    add_student(&conn, &person("S900", "Émile Zoë")).unwrap();
    add_student(&conn, &person("S901", "Emil Zola")).unwrap();
    add_course(&conn, &CourseDraft::new("FR200", "Littérature Française")).unwrap();

    for term in ["émile", "ÉMILE", "ZOË", "zoë"] {
        let results = search(&conn, term, SearchCriteria::Name).unwrap();
        assert_eq!(
            names(&results.students, |s| &s.name),
            ["Émile Zoë"],
            "term {term:?}"
        );
    }

    let results = search(&conn, "FRANÇAISE", SearchCriteria::Name).unwrap();
    assert_eq!(
        names(&results.courses, |c| &c.course_name),
        ["Littérature Française"]
    );
}

#[test]
fn course_criteria_folds_non_ascii_course_names() {
    let conn = open_in_memory().unwrap();
    let ada = add_student(&conn, &person("S1", "Ada")).unwrap();
    let course = add_course(&conn, &CourseDraft::new("MU100", "Théorie Musicale")).unwrap();
    enroll_student(&conn, ada.id, course.id).unwrap();

    let results = search(&conn, "THÉORIE", SearchCriteria::Course).unwrap();
    assert_eq!(names(&results.students, |s| &s.name), ["Ada"]);
}

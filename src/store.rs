//! SQLite record store for students, courses and individual grades.
//!
//! Independent of the CSV roster; the grade engine never reads from here.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Course codes seeded by [`populate_courses`].
pub const COURSES: [&str; 8] = [
    "MAT2110", "EEE2019", "CEE2219", "ENG2129", "ENG2139", "MEC2009", "MEC2309", "ENG2159",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub sex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeEntry {
    pub assessment_type: String,
    pub score: f64,
}

/// Opens (creating if needed) the database at `path` with its tables and courses.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    prepare(&conn)?;
    info!(path = %path.display(), "Database ready");
    Ok(conn)
}

/// In-memory database with the full schema, for tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    create_tables(conn)?;
    populate_courses(conn)?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            sex TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER,
            course_id INTEGER,
            assessment_type TEXT NOT NULL,
            score REAL NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student_course ON grades(student_id, course_id)",
        [],
    )?;
    Ok(())
}

/// Seeds [`COURSES`]. Existing course names are left alone.
pub fn populate_courses(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO courses(name) VALUES(?)")?;
    for course in COURSES {
        stmt.execute([course])?;
    }
    Ok(())
}

pub fn add_student(conn: &Connection, id: i64, name: &str, sex: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO students(id, name, sex) VALUES(?, ?, ?)",
        params![id, name, sex],
    )
    .with_context(|| format!("adding student {id}"))?;
    debug!(id, name, "Student added");
    Ok(conn.last_insert_rowid())
}

pub fn get_student_by_id(conn: &Connection, id: i64) -> Result<Option<Student>> {
    let student = conn
        .query_row(
            "SELECT id, name, sex FROM students WHERE id = ?",
            [id],
            |row| {
                Ok(Student {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    sex: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(student)
}

pub fn get_all_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn.prepare("SELECT id, name, sex FROM students ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Student {
                id: row.get(0)?,
                name: row.get(1)?,
                sex: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn course_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM courses WHERE name = ?", [name], |row| row.get(0))
        .optional()?;
    Ok(id)
}

/// Records one score and returns its row id.
pub fn add_grade(
    conn: &Connection,
    student_id: i64,
    course_id: i64,
    assessment_type: &str,
    score: f64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO grades(student_id, course_id, assessment_type, score) VALUES(?, ?, ?, ?)",
        params![student_id, course_id, assessment_type, score],
    )
    .with_context(|| format!("adding {assessment_type} grade for student {student_id}"))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_grades_for_student_course(
    conn: &Connection,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<GradeEntry>> {
    let mut stmt = conn.prepare(
        "SELECT assessment_type, score FROM grades
         WHERE student_id = ? AND course_id = ?
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([student_id, course_id], |row| {
            Ok(GradeEntry {
                assessment_type: row.get(0)?,
                score: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_student() {
        let conn = open_in_memory().unwrap();
        add_student(&conn, 2024000001, "John Doe", Some("Male")).unwrap();

        let student = get_student_by_id(&conn, 2024000001).unwrap().unwrap();
        assert_eq!(
            student,
            Student {
                id: 2024000001,
                name: "John Doe".to_string(),
                sex: Some("Male".to_string()),
            }
        );
    }

    #[test]
    fn test_get_all_students() {
        let conn = open_in_memory().unwrap();
        add_student(&conn, 2024000002, "Jane Smith", Some("Female")).unwrap();
        add_student(&conn, 2024000001, "John Doe", None).unwrap();

        let students = get_all_students(&conn).unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].id, 2024000001);
        assert_eq!(students[0].sex, None);
    }

    #[test]
    fn test_get_nonexistent_student() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_student_by_id(&conn, 9999999999).unwrap(), None);
    }

    #[test]
    fn test_duplicate_student_is_an_error() {
        let conn = open_in_memory().unwrap();
        add_student(&conn, 1, "A", None).unwrap();
        assert!(add_student(&conn, 1, "B", None).is_err());
    }

    #[test]
    fn test_courses_seeded_once() {
        let conn = open_in_memory().unwrap();
        populate_courses(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, COURSES.len() as i64);
        assert_eq!(course_id(&conn, "MAT2110").unwrap(), Some(1));
        assert_eq!(course_id(&conn, "XYZ0000").unwrap(), None);
    }

    #[test]
    fn test_add_and_get_grade() {
        let conn = open_in_memory().unwrap();
        add_student(&conn, 2024000001, "Test Student", Some("Other")).unwrap();
        let course = course_id(&conn, "MAT2110").unwrap().unwrap();

        add_grade(&conn, 2024000001, course, "Quiz", 85.5).unwrap();

        let grades = get_grades_for_student_course(&conn, 2024000001, course).unwrap();
        assert_eq!(
            grades,
            [GradeEntry {
                assessment_type: "Quiz".to_string(),
                score: 85.5,
            }]
        );
    }

    #[test]
    fn test_grade_for_unknown_student_rejected() {
        let conn = open_in_memory().unwrap();
        assert!(add_grade(&conn, 42, 1, "Quiz", 50.0).is_err());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grades.db");
        let conn = open(&path).unwrap();
        add_student(&conn, 1, "A", None).unwrap();
        drop(conn);

        let reopened = open(&path).unwrap();
        assert_eq!(get_all_students(&reopened).unwrap().len(), 1);
    }
}

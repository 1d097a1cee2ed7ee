//! Read queries the engine consumes from the course catalog, plus the
//! minimal record creation needed to stand a workspace up. Full catalog
//! CRUD (editing course metadata, instructor records) lives outside the
//! engine.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub course_code: String,
    pub title: String,
    pub term: String,
    pub year: i64,
    pub capacity: i64,
    pub instructor_id: Option<String>,
    pub cohort_branch: Option<String>,
    pub cohort_year: Option<i64>,
}

pub fn get_section(conn: &Connection, section_id: &str) -> Result<Option<Section>, EngineError> {
    let row = conn
        .query_row(
            "SELECT id, course_code, title, term, year, capacity, instructor_id,
                    cohort_branch, cohort_year
             FROM sections WHERE id = ?",
            [section_id],
            |r| {
                Ok(Section {
                    id: r.get(0)?,
                    course_code: r.get(1)?,
                    title: r.get(2)?,
                    term: r.get(3)?,
                    year: r.get(4)?,
                    capacity: r.get(5)?,
                    instructor_id: r.get(6)?,
                    cohort_branch: r.get(7)?,
                    cohort_year: r.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn student_exists(conn: &Connection, student_id: &str) -> Result<bool, EngineError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE id = ?",
        [student_id],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

/// Size of the eligible population for a (branch, year) cohort. Used as the
/// strict upper bound on section capacity.
pub fn cohort_count(conn: &Connection, branch: &str, year: i64) -> Result<i64, EngineError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE branch = ? AND year = ?",
        (branch, year),
        |r| r.get(0),
    )?;
    Ok(n)
}

pub struct NewSection<'a> {
    pub course_code: &'a str,
    pub title: &'a str,
    pub term: &'a str,
    pub year: i64,
    pub capacity: i64,
    pub instructor_id: Option<&'a str>,
    pub cohort_branch: Option<&'a str>,
    pub cohort_year: Option<i64>,
}

pub fn add_section(conn: &Connection, s: &NewSection<'_>) -> Result<String, EngineError> {
    if s.capacity < 1 {
        return Err(EngineError::InvalidCapacity { min: 1, max: None });
    }
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO sections(id, course_code, title, term, year, capacity,
                              instructor_id, cohort_branch, cohort_year)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            s.course_code,
            s.title,
            s.term,
            s.year,
            s.capacity,
            s.instructor_id,
            s.cohort_branch,
            s.cohort_year,
        ),
    )?;
    Ok(id)
}

pub fn add_student(
    conn: &Connection,
    student_id: Option<&str>,
    name: &str,
    branch: &str,
    year: i64,
) -> Result<String, EngineError> {
    let id = student_id
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    conn.execute(
        "INSERT INTO students(id, name, branch, year) VALUES(?, ?, ?, ?)",
        (&id, name, branch, year),
    )?;
    Ok(id)
}

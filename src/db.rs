use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Opens (creating if needed) the workspace database.
///
/// Several client processes may hold connections to the same file at once;
/// WAL plus a busy timeout lets write transactions queue on the file instead
/// of failing immediately with SQLITE_BUSY.
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("registrar.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    conn.busy_timeout(Duration::from_secs(5))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            branch TEXT NOT NULL,
            year INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_cohort ON students(branch, year)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sections(
            id TEXT PRIMARY KEY,
            course_code TEXT NOT NULL,
            title TEXT NOT NULL,
            term TEXT NOT NULL,
            year INTEGER NOT NULL,
            capacity INTEGER NOT NULL,
            instructor_id TEXT,
            cohort_branch TEXT,
            cohort_year INTEGER
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sections_course ON sections(course_code)",
        [],
    )?;

    // The composite primary key is the uniqueness backstop for concurrent
    // registrations: whatever the capacity check saw, a (student, section)
    // pair can exist at most once.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments(
            student_id TEXT NOT NULL,
            section_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'enrolled',
            enrolled_at TEXT NOT NULL,
            PRIMARY KEY(student_id, section_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(section_id) REFERENCES sections(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_section ON enrollments(section_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grading_scheme(
            section_id TEXT NOT NULL,
            component_name TEXT NOT NULL,
            weight_pct INTEGER NOT NULL,
            PRIMARY KEY(section_id, component_name),
            FOREIGN KEY(section_id) REFERENCES sections(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assessments(
            section_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            component_type TEXT NOT NULL,
            score REAL NOT NULL,
            updated_at TEXT,
            PRIMARY KEY(section_id, student_id, component_type),
            FOREIGN KEY(section_id) REFERENCES sections(id),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assessments_student ON assessments(student_id)",
        [],
    )?;

    Ok(conn)
}

//! Capacity- and uniqueness-constrained registration engine.
//!
//! Every invariant-checking write runs its read-checks and its write inside
//! one immediate transaction, so two registrations racing for the last seat
//! serialize on the database: the loser re-reads after the winner commits
//! and fails `SectionFull`. The (student_id, section_id) primary key backs
//! the same-section check even if a commit slips past the read.

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::catalog;
use crate::error::{is_constraint_violation, EngineError};
use crate::stores::OpContext;

/// Cohorts smaller than this are treated as unknown for the purpose of the
/// capacity upper bound; a bound of "capacity < 2" would make every section
/// invalid.
const MIN_MEANINGFUL_COHORT: i64 = 3;

pub fn enrolled_count(conn: &Connection, section_id: &str) -> Result<i64, EngineError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE section_id = ?",
        [section_id],
        |r| r.get(0),
    )?;
    Ok(n)
}

fn immediate_tx(conn: &Connection) -> Result<Transaction<'_>, EngineError> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

/// Registers a student into a section. Checks run in a fixed order so the
/// caller always learns the most specific failure: section existence, then
/// same-section duplicate, then same-course duplicate, then capacity.
pub fn register(
    conn: &Connection,
    ctx: &OpContext,
    student_id: &str,
    section_id: &str,
) -> Result<(), EngineError> {
    ctx.guard_maintenance()?;
    ctx.require_self_or_admin(student_id)?;

    let tx = immediate_tx(conn)?;

    let section = catalog::get_section(&tx, section_id)?.ok_or(EngineError::SectionNotFound)?;
    if !catalog::student_exists(&tx, student_id)? {
        return Err(EngineError::StudentNotFound);
    }

    let same_section: i64 = tx.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE student_id = ? AND section_id = ?",
        (student_id, section_id),
        |r| r.get(0),
    )?;
    if same_section > 0 {
        return Err(EngineError::AlreadyEnrolledSection);
    }

    // A student may hold at most one section of any given course.
    let same_course: i64 = tx.query_row(
        "SELECT COUNT(*)
         FROM enrollments e
         JOIN sections s ON s.id = e.section_id
         WHERE e.student_id = ? AND s.course_code = ?",
        (student_id, &section.course_code),
        |r| r.get(0),
    )?;
    if same_course > 0 {
        return Err(EngineError::AlreadyEnrolledCourse {
            course_code: section.course_code,
        });
    }

    let enrolled = enrolled_count(&tx, section_id)?;
    if enrolled >= section.capacity {
        return Err(EngineError::SectionFull {
            capacity: section.capacity,
        });
    }

    let insert = tx.execute(
        "INSERT INTO enrollments(student_id, section_id, status, enrolled_at)
         VALUES(?, ?, 'enrolled', ?)",
        (student_id, section_id, Utc::now().to_rfc3339()),
    );
    match insert {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => {
            return Err(EngineError::AlreadyEnrolledSection);
        }
        Err(e) => return Err(e.into()),
    }

    tx.commit()?;
    tracing::info!(student_id, section_id, "registered");
    Ok(())
}

/// Removes an enrollment if present. Idempotent: dropping a non-existent
/// enrollment reports `false`, not an error.
pub fn drop_enrollment(
    conn: &Connection,
    ctx: &OpContext,
    student_id: &str,
    section_id: &str,
) -> Result<bool, EngineError> {
    ctx.guard_maintenance()?;
    ctx.require_self_or_admin(student_id)?;

    let removed = conn.execute(
        "DELETE FROM enrollments WHERE student_id = ? AND section_id = ?",
        (student_id, section_id),
    )?;
    if removed > 0 {
        tracing::info!(student_id, section_id, "dropped");
    }
    Ok(removed > 0)
}

/// Updates a section's capacity. The new value must be at least 2, must not
/// fall below the current enrolled count, and when the section names a
/// cohort with a meaningful population P it must stay strictly below P.
pub fn update_capacity(
    conn: &Connection,
    ctx: &OpContext,
    section_id: &str,
    new_capacity: i64,
) -> Result<(), EngineError> {
    ctx.guard_maintenance()?;

    let tx = immediate_tx(conn)?;

    let section = catalog::get_section(&tx, section_id)?.ok_or(EngineError::SectionNotFound)?;
    ctx.require_section_owner(&section)?;

    let enrolled = enrolled_count(&tx, section_id)?;
    let min = enrolled.max(2);
    let max = match (&section.cohort_branch, section.cohort_year) {
        (Some(branch), Some(year)) => {
            let population = catalog::cohort_count(&tx, branch, year)?;
            if population >= MIN_MEANINGFUL_COHORT {
                Some(population - 1)
            } else {
                None
            }
        }
        _ => None,
    };

    if new_capacity < min || max.map(|m| new_capacity > m).unwrap_or(false) {
        return Err(EngineError::InvalidCapacity { min, max });
    }

    tx.execute(
        "UPDATE sections SET capacity = ? WHERE id = ?",
        (new_capacity, section_id),
    )?;
    tx.commit()?;
    tracing::info!(section_id, new_capacity, "capacity updated");
    Ok(())
}

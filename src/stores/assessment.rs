//! Scored assessment entries, keyed by (section, student, component type).
//! One row per triple; a later write for the same triple replaces the
//! earlier value. No history is retained.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::catalog;
use crate::error::EngineError;
use crate::stores::OpContext;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRow {
    pub student_id: String,
    pub component_type: String,
    pub score: f64,
}

/// Upserts a score for (section, student, componentType). Last write wins.
pub fn save_assessment(
    conn: &Connection,
    ctx: &OpContext,
    section_id: &str,
    student_id: &str,
    component_type: &str,
    score: f64,
) -> Result<(), EngineError> {
    ctx.guard_maintenance()?;
    if !score.is_finite() || score < 0.0 {
        return Err(EngineError::InvalidScore { value: score });
    }

    let section = catalog::get_section(conn, section_id)?.ok_or(EngineError::SectionNotFound)?;
    ctx.require_section_owner(&section)?;
    if !catalog::student_exists(conn, student_id)? {
        return Err(EngineError::StudentNotFound);
    }

    conn.execute(
        "INSERT INTO assessments(section_id, student_id, component_type, score, updated_at)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(section_id, student_id, component_type) DO UPDATE SET
           score = excluded.score,
           updated_at = excluded.updated_at",
        (
            section_id,
            student_id,
            component_type,
            score,
            Utc::now().to_rfc3339(),
        ),
    )?;
    tracing::debug!(section_id, student_id, component_type, score, "assessment saved");
    Ok(())
}

/// Stored score for the component type, or 0 when none is recorded. There
/// is at most one row per triple, so the "average" is the value itself.
pub fn average_for_type(
    conn: &Connection,
    section_id: &str,
    student_id: &str,
    component_type: &str,
) -> Result<f64, EngineError> {
    let v: Option<f64> = conn
        .query_row(
            "SELECT score FROM assessments
             WHERE section_id = ? AND student_id = ? AND component_type = ?",
            (section_id, student_id, component_type),
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or(0.0))
}

pub fn all_for_section(
    conn: &Connection,
    section_id: &str,
) -> Result<Vec<AssessmentRow>, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT student_id, component_type, score
         FROM assessments
         WHERE section_id = ?
         ORDER BY student_id, component_type",
    )?;
    let rows = stmt.query_map([section_id], |r| {
        Ok(AssessmentRow {
            student_id: r.get(0)?,
            component_type: r.get(1)?,
            score: r.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

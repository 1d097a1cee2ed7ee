//! Per-section weighting schemes. A scheme is a set of named components
//! with integer percentage weights summing to exactly 100; saving replaces
//! the whole set atomically.

use std::collections::BTreeMap;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::catalog;
use crate::error::EngineError;
use crate::stores::OpContext;

/// Scheme applied by catalog-facing views when a section has no custom
/// scheme. The grade aggregator does not use this: with no scheme it falls
/// back to a flat sum of assessment scores.
pub fn default_scheme() -> BTreeMap<String, i64> {
    BTreeMap::from([
        ("Mid Semester".to_string(), 30),
        ("End Semester".to_string(), 40),
        ("Assignments".to_string(), 20),
        ("Quizzes".to_string(), 10),
    ])
}

fn validate_weights(components: &BTreeMap<String, i64>) -> Result<(), EngineError> {
    let sum: i64 = components.values().sum();
    let in_range = components.values().all(|w| (0..=100).contains(w));
    if sum != 100 || !in_range {
        return Err(EngineError::WeightSumInvalid { actual_sum: sum });
    }
    Ok(())
}

/// Replaces the section's scheme with `components` as one atomic operation.
pub fn save_scheme(
    conn: &Connection,
    ctx: &OpContext,
    section_id: &str,
    components: &BTreeMap<String, i64>,
) -> Result<(), EngineError> {
    ctx.guard_maintenance()?;
    validate_weights(components)?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let section = catalog::get_section(&tx, section_id)?.ok_or(EngineError::SectionNotFound)?;
    ctx.require_section_owner(&section)?;

    tx.execute(
        "DELETE FROM grading_scheme WHERE section_id = ?",
        [section_id],
    )?;
    for (name, weight) in components {
        tx.execute(
            "INSERT INTO grading_scheme(section_id, component_name, weight_pct)
             VALUES(?, ?, ?)",
            (section_id, name, weight),
        )?;
    }
    tx.commit()?;
    tracing::debug!(section_id, components = components.len(), "scheme saved");
    Ok(())
}

/// Loads the section's scheme. An empty map is the valid "no custom scheme"
/// state, not an error.
pub fn load_scheme(
    conn: &Connection,
    section_id: &str,
) -> Result<BTreeMap<String, i64>, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT component_name, weight_pct FROM grading_scheme WHERE section_id = ?",
    )?;
    let rows = stmt.query_map([section_id], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
    })?;
    let mut out = BTreeMap::new();
    for row in rows {
        let (name, weight) = row?;
        out.insert(name, weight);
    }
    Ok(out)
}

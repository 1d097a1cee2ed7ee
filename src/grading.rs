//! Grade aggregation: weighted (or flat-sum) finals per (section, student),
//! fixed letter/GPA bands, and the per-student CGPA mean.

use rusqlite::Connection;
use serde::Serialize;

use crate::catalog;
use crate::error::EngineError;
use crate::stores::{assessment, scheme};

/// Two-decimal rounding used for CGPA output.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Score bands are closed on the lower bound: exactly 90 is A+.
pub fn to_letter(score: f64) -> &'static str {
    if score >= 90.0 {
        "A+"
    } else if score >= 80.0 {
        "A"
    } else if score >= 70.0 {
        "B+"
    } else if score >= 60.0 {
        "B"
    } else if score >= 50.0 {
        "C+"
    } else if score >= 40.0 {
        "C"
    } else {
        "F"
    }
}

/// Step function onto the 10-point scale. Not an interpolation; the exact
/// steps matter for scoring compatibility.
pub fn to_gpa(score: f64) -> f64 {
    if score >= 90.0 {
        10.0
    } else if score >= 80.0 {
        9.0
    } else if score >= 70.0 {
        8.0
    } else if score >= 60.0 {
        7.0
    } else if score >= 50.0 {
        6.0
    } else if score >= 40.0 {
        5.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalGrade {
    pub score: f64,
    pub letter: &'static str,
    pub gpa: f64,
}

/// Computes the final score for one (section, student).
///
/// With a scheme: sum over components of (stored value for that component
/// type) x weight/100. Without one: the flat sum of every recorded score.
/// Both paths are deliberate; instructors who never configure a scheme
/// still get a sum-based final.
pub fn compute_final(
    conn: &Connection,
    section_id: &str,
    student_id: &str,
) -> Result<f64, EngineError> {
    if catalog::get_section(conn, section_id)?.is_none() {
        return Err(EngineError::SectionNotFound);
    }

    let weights = scheme::load_scheme(conn, section_id)?;
    if weights.is_empty() {
        let flat: f64 = conn.query_row(
            "SELECT COALESCE(SUM(score), 0) FROM assessments
             WHERE section_id = ? AND student_id = ?",
            (section_id, student_id),
            |r| r.get(0),
        )?;
        return Ok(flat);
    }

    let mut total = 0.0;
    for (component, weight) in &weights {
        let avg = assessment::average_for_type(conn, section_id, student_id, component)?;
        total += avg * (*weight as f64) / 100.0;
    }
    Ok(total)
}

pub fn final_grade(
    conn: &Connection,
    section_id: &str,
    student_id: &str,
) -> Result<FinalGrade, EngineError> {
    let score = compute_final(conn, section_id, student_id)?;
    Ok(FinalGrade {
        score,
        letter: to_letter(score),
        gpa: to_gpa(score),
    })
}

/// Unweighted mean of per-section GPA points across every section where the
/// student has at least one assessment, rounded to 2 decimals. 0.0 when the
/// student has no computable sections. Course credits are deliberately not
/// weighted in; every section counts equally.
pub fn compute_cgpa(conn: &Connection, student_id: &str) -> Result<f64, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT section_id FROM assessments WHERE student_id = ?",
    )?;
    let section_ids: Vec<String> = stmt
        .query_map([student_id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if section_ids.is_empty() {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for section_id in &section_ids {
        let score = compute_final(conn, section_id, student_id)?;
        sum += to_gpa(score);
    }
    Ok(round_2_decimals(sum / section_ids.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, NewSection};
    use crate::stores::{assessment, scheme, OpContext, Role};
    use std::collections::BTreeMap;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn letter_bands_are_closed_on_the_lower_bound() {
        assert_eq!(to_letter(100.0), "A+");
        assert_eq!(to_letter(90.0), "A+");
        assert_eq!(to_letter(89.999), "A");
        assert_eq!(to_letter(80.0), "A");
        assert_eq!(to_letter(70.0), "B+");
        assert_eq!(to_letter(60.0), "B");
        assert_eq!(to_letter(50.0), "C+");
        assert_eq!(to_letter(40.0), "C");
        assert_eq!(to_letter(39.999), "F");
        assert_eq!(to_letter(0.0), "F");
    }

    #[test]
    fn gpa_steps_match_scoring_table() {
        assert_eq!(to_gpa(90.0), 10.0);
        assert_eq!(to_gpa(89.999), 9.0);
        assert_eq!(to_gpa(40.0), 5.0);
        assert_eq!(to_gpa(39.999), 0.0);
    }

    #[test]
    fn round_2_decimals_behaves() {
        assert_eq!(round_2_decimals(8.0), 8.0);
        assert_eq!(round_2_decimals(8.333333), 8.33);
        assert_eq!(round_2_decimals(8.125), 8.13);
    }

    fn open(prefix: &str) -> (Connection, std::path::PathBuf) {
        let ws = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&ws).expect("create temp dir");
        let conn = crate::db::open_db(&ws).expect("open db");
        (conn, ws)
    }

    fn seed_section(conn: &Connection, course_code: &str) -> String {
        catalog::add_section(
            conn,
            &NewSection {
                course_code,
                title: "Course",
                term: "Fall",
                year: 2026,
                capacity: 30,
                instructor_id: Some("inst-1"),
                cohort_branch: None,
                cohort_year: None,
            },
        )
        .expect("add section")
    }

    #[test]
    fn weighted_final_with_fifty_fifty_scheme() {
        let (conn, ws) = open("registrar-grade-weighted");
        let section = seed_section(&conn, "CS201");
        catalog::add_student(&conn, Some("s1"), "A", "CSE", 2).expect("student");
        let owner = OpContext::new("inst-1", Role::Instructor);

        let weights = BTreeMap::from([
            ("Mid".to_string(), 50),
            ("End".to_string(), 50),
        ]);
        scheme::save_scheme(&conn, &owner, &section, &weights).expect("scheme");
        assessment::save_assessment(&conn, &owner, &section, "s1", "Mid", 80.0).expect("mid");
        assessment::save_assessment(&conn, &owner, &section, "s1", "End", 60.0).expect("end");

        let score = compute_final(&conn, &section, "s1").expect("final");
        assert_eq!(score, 70.0);
        assert_eq!(to_letter(score), "B+");

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn no_scheme_falls_back_to_flat_sum() {
        let (conn, ws) = open("registrar-grade-flat");
        let section = seed_section(&conn, "CS201");
        catalog::add_student(&conn, Some("s1"), "A", "CSE", 2).expect("student");
        let owner = OpContext::new("inst-1", Role::Instructor);

        assessment::save_assessment(&conn, &owner, &section, "s1", "Quiz", 20.0).expect("quiz");
        assessment::save_assessment(&conn, &owner, &section, "s1", "Assignment", 15.0)
            .expect("assignment");

        let score = compute_final(&conn, &section, "s1").expect("final");
        assert_eq!(score, 35.0);

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn scheme_components_with_no_score_count_as_zero() {
        let (conn, ws) = open("registrar-grade-missing");
        let section = seed_section(&conn, "CS201");
        catalog::add_student(&conn, Some("s1"), "A", "CSE", 2).expect("student");
        let owner = OpContext::new("inst-1", Role::Instructor);

        let weights = BTreeMap::from([
            ("Mid".to_string(), 50),
            ("End".to_string(), 50),
        ]);
        scheme::save_scheme(&conn, &owner, &section, &weights).expect("scheme");
        assessment::save_assessment(&conn, &owner, &section, "s1", "Mid", 80.0).expect("mid");

        let score = compute_final(&conn, &section, "s1").expect("final");
        assert_eq!(score, 40.0);

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn cgpa_is_unweighted_mean_over_sections_with_assessments() {
        let (conn, ws) = open("registrar-cgpa");
        let a = seed_section(&conn, "CS201");
        let b = seed_section(&conn, "MA102");
        catalog::add_student(&conn, Some("s1"), "A", "CSE", 2).expect("student");
        let owner = OpContext::new("inst-1", Role::Instructor);

        let all = BTreeMap::from([("Total".to_string(), 100)]);
        scheme::save_scheme(&conn, &owner, &a, &all).expect("scheme a");
        scheme::save_scheme(&conn, &owner, &b, &all).expect("scheme b");

        // Finals 85 -> 9.0 and 65 -> 7.0; mean 8.0.
        assessment::save_assessment(&conn, &owner, &a, "s1", "Total", 85.0).expect("a");
        assessment::save_assessment(&conn, &owner, &b, "s1", "Total", 65.0).expect("b");

        assert_eq!(compute_cgpa(&conn, "s1").expect("cgpa"), 8.0);

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn cgpa_without_assessments_is_zero() {
        let (conn, ws) = open("registrar-cgpa-empty");
        catalog::add_student(&conn, Some("s1"), "A", "CSE", 2).expect("student");
        assert_eq!(compute_cgpa(&conn, "s1").expect("cgpa"), 0.0);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn cgpa_rounds_to_two_decimals() {
        let (conn, ws) = open("registrar-cgpa-round");
        let a = seed_section(&conn, "CS201");
        let b = seed_section(&conn, "MA102");
        let c = seed_section(&conn, "PH103");
        catalog::add_student(&conn, Some("s1"), "A", "CSE", 2).expect("student");
        let owner = OpContext::new("inst-1", Role::Instructor);

        let all = BTreeMap::from([("Total".to_string(), 100)]);
        for section in [&a, &b, &c] {
            scheme::save_scheme(&conn, &owner, section, &all).expect("scheme");
        }
        // GPAs 10.0, 9.0, 9.0 -> mean 9.333... -> 9.33.
        assessment::save_assessment(&conn, &owner, &a, "s1", "Total", 95.0).expect("a");
        assessment::save_assessment(&conn, &owner, &b, "s1", "Total", 85.0).expect("b");
        assessment::save_assessment(&conn, &owner, &c, "s1", "Total", 82.0).expect("c");

        assert_eq!(compute_cgpa(&conn, "s1").expect("cgpa"), 9.33);

        let _ = std::fs::remove_dir_all(ws);
    }
}

use crate::catalog::{self, NewSection};
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{opt_str, require_i64, require_str};
use crate::ipc::types::{AppState, Request};
use crate::stores::enrollment;
use serde_json::json;

fn handle_add_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match require_str(&req.params, "name") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let branch = match require_str(&req.params, "branch") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let year = match require_i64(&req.params, "year") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let student_id = opt_str(&req.params, "studentId");

    match catalog::add_student(conn, student_id.as_deref(), &name, &branch, year) {
        Ok(id) => ok(&req.id, json!({ "studentId": id })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_add_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let course_code = match require_str(&req.params, "courseCode") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let title = match require_str(&req.params, "title") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let term = match require_str(&req.params, "term") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let year = match require_i64(&req.params, "year") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let capacity = match require_i64(&req.params, "capacity") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let instructor_id = opt_str(&req.params, "instructorId");
    let cohort_branch = opt_str(&req.params, "cohortBranch");
    let cohort_year = req.params.get("cohortYear").and_then(|v| v.as_i64());

    let new_section = NewSection {
        course_code: &course_code,
        title: &title,
        term: &term,
        year,
        capacity,
        instructor_id: instructor_id.as_deref(),
        cohort_branch: cohort_branch.as_deref(),
        cohort_year,
    };
    match catalog::add_section(conn, &new_section) {
        Ok(id) => ok(&req.id, json!({ "sectionId": id })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_get_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let section = match catalog::get_section(conn, &section_id) {
        Ok(Some(s)) => s,
        Ok(None) => return err(&req.id, "section_not_found", "section not found", None),
        Err(e) => return engine_err(&req.id, &e),
    };
    // Counts are read straight from the store; no cache sits in between.
    let enrolled = match enrollment::enrolled_count(conn, &section_id) {
        Ok(n) => n,
        Err(e) => return engine_err(&req.id, &e),
    };

    let mut body = serde_json::to_value(&section).unwrap_or_else(|_| json!({}));
    body["enrolledCount"] = json!(enrolled);
    ok(&req.id, body)
}

fn handle_cohort_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let branch = match require_str(&req.params, "branch") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let year = match require_i64(&req.params, "year") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match catalog::cohort_count(conn, &branch, year) {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.addStudent" => Some(handle_add_student(state, req)),
        "catalog.addSection" => Some(handle_add_section(state, req)),
        "catalog.getSection" => Some(handle_get_section(state, req)),
        "catalog.cohortCount" => Some(handle_cohort_count(state, req)),
        _ => None,
    }
}

use crate::grading;
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::require_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_final(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let student_id = match require_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match grading::final_grade(conn, &section_id, &student_id) {
        Ok(grade) => ok(
            &req.id,
            serde_json::to_value(&grade).unwrap_or_else(|_| json!({})),
        ),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_cgpa(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = match require_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match grading::compute_cgpa(conn, &student_id) {
        Ok(cgpa) => ok(&req.id, json!({ "cgpa": cgpa })),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grade.final" => Some(handle_final(state, req)),
        "grade.cgpa" => Some(handle_cgpa(state, req)),
        _ => None,
    }
}

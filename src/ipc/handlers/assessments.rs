use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{require_ctx, require_f64, require_str};
use crate::ipc::types::{AppState, Request};
use crate::stores::assessment;
use serde_json::json;

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let ctx = match require_ctx(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let student_id = match require_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let component_type = match require_str(&req.params, "componentType") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let score = match require_f64(&req.params, "score") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match assessment::save_assessment(conn, &ctx, &section_id, &student_id, &component_type, score)
    {
        Ok(()) => ok(&req.id, json!({ "saved": true })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_average_for_type(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    let component_type = match require_str(&req.params, "componentType") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match assessment::average_for_type(conn, &section_id, &student_id, &component_type) {
        Ok(average) => ok(&req.id, json!({ "average": average })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_list_for_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match assessment::all_for_section(conn, &section_id) {
        Ok(rows) => ok(
            &req.id,
            json!({ "assessments": serde_json::to_value(rows).unwrap_or_else(|_| json!([])) }),
        ),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessment.save" => Some(handle_save(state, req)),
        "assessment.averageForType" => Some(handle_average_for_type(state, req)),
        "assessment.listForSection" => Some(handle_list_for_section(state, req)),
        _ => None,
    }
}

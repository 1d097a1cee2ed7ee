use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{require_ctx, require_i64, require_str};
use crate::ipc::types::{AppState, Request};
use crate::stores::enrollment;
use serde_json::json;

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let ctx = match require_ctx(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let student_id = match require_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match enrollment::register(conn, &ctx, &student_id, &section_id) {
        Ok(()) => ok(&req.id, json!({ "registered": true })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_drop(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let ctx = match require_ctx(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let student_id = match require_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match enrollment::drop_enrollment(conn, &ctx, &student_id, &section_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_update_capacity(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    let new_capacity = match require_i64(&req.params, "newCapacity") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match enrollment::update_capacity(conn, &ctx, &section_id, new_capacity) {
        Ok(()) => ok(&req.id, json!({ "capacity": new_capacity })),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "enroll.register" => Some(handle_register(state, req)),
        "enroll.drop" => Some(handle_drop(state, req)),
        "enroll.updateCapacity" => Some(handle_update_capacity(state, req)),
        _ => None,
    }
}

use std::collections::BTreeMap;

use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{require_ctx, require_str};
use crate::ipc::types::{AppState, Request};
use crate::stores::scheme;
use serde_json::json;

/// Components arrive as a JSON object of name -> integer weight.
fn parse_components(params: &serde_json::Value) -> Result<BTreeMap<String, i64>, String> {
    let obj = params
        .get("components")
        .and_then(|v| v.as_object())
        .ok_or_else(|| "components must be an object of name -> weight".to_string())?;
    let mut out = BTreeMap::new();
    for (name, v) in obj {
        let Some(weight) = v.as_i64() else {
            return Err(format!("weight for {name} must be an integer"));
        };
        out.insert(name.clone(), weight);
    }
    Ok(out)
}

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
    let components = match parse_components(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match scheme::save_scheme(conn, &ctx, &section_id, &components) {
        Ok(()) => ok(&req.id, json!({ "saved": components.len() })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let section_id = match require_str(&req.params, "sectionId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match scheme::load_scheme(conn, &section_id) {
        Ok(components) if components.is_empty() => ok(
            &req.id,
            json!({ "components": scheme::default_scheme(), "isDefault": true }),
        ),
        Ok(components) => ok(
            &req.id,
            json!({ "components": components, "isDefault": false }),
        ),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scheme.save" => Some(handle_save(state, req)),
        "scheme.load" => Some(handle_load(state, req)),
        _ => None,
    }
}

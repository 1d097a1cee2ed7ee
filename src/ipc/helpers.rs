//! Param-extraction helpers shared by the handlers. Missing or mistyped
//! params are reported as messages for `bad_params` responses.

use crate::stores::{OpContext, Role};

pub fn require_str(params: &serde_json::Value, key: &str) -> Result<String, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| format!("missing {key}"))
}

pub fn require_i64(params: &serde_json::Value, key: &str) -> Result<i64, String> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| format!("missing or non-integer {key}"))
}

pub fn require_f64(params: &serde_json::Value, key: &str) -> Result<f64, String> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| format!("missing or non-numeric {key}"))
}

pub fn opt_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Builds the per-request operation context from `params.actor` (userId,
/// role as supplied by the auth collaborator) and the optional
/// `params.maintenance` flag.
pub fn require_ctx(params: &serde_json::Value) -> Result<OpContext, String> {
    let actor = params
        .get("actor")
        .ok_or_else(|| "missing actor".to_string())?;
    let user_id = actor
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing actor.userId".to_string())?;
    let role = actor
        .get("role")
        .and_then(|v| v.as_str())
        .and_then(Role::parse)
        .ok_or_else(|| "actor.role must be one of: student, instructor, admin".to_string())?;
    let maintenance = params
        .get("maintenance")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok(OpContext::new(user_id, role).with_maintenance(maintenance))
}

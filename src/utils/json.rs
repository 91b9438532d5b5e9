use serde_json::Value;

/// Tri-state reading of a nullable string field in a PATCH body: absent key
/// leaves the column alone, explicit null clears it, a string sets it.
pub enum FieldPatch {
    Missing,
    Clear,
    Set(String),
}

pub fn string_field(body: &Value, key: &str) -> Result<FieldPatch, String> {
    match body.get(key) {
        None => Ok(FieldPatch::Missing),
        Some(Value::Null) => Ok(FieldPatch::Clear),
        Some(Value::String(s)) => Ok(FieldPatch::Set(s.to_owned())),
        Some(other) => Err(format!("{key}: expected string or null, got {other}")),
    }
}

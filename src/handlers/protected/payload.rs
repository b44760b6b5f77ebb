// handlers/protected/payload.rs - request body validation shared by write handlers

use serde_json::{Map, Value};

use crate::database::{RecordData, TableId};
use crate::error::ApiError;

/// Which body keys a write endpoint accepts and which it insists on
#[derive(Debug, Clone, Copy)]
pub struct PayloadRules {
    pub table: TableId,
    /// Keys that must be present, non-null and non-blank
    pub required: &'static [&'static str],
    /// Columns the server sets itself. Rejected like unknown keys.
    pub managed: &'static [&'static str],
}

impl PayloadRules {
    pub const fn new(table: TableId) -> Self {
        Self { table, required: &[], managed: &[] }
    }

    pub const fn required(mut self, required: &'static [&'static str]) -> Self {
        self.required = required;
        self
    }

    pub const fn managed(mut self, managed: &'static [&'static str]) -> Self {
        self.managed = managed;
        self
    }

    fn accepts(&self, key: &str) -> bool {
        let descriptor = self.table.descriptor();
        descriptor.has_column(key) && key != descriptor.id_column && !self.managed.contains(&key)
    }

    /// Validate a JSON body into write data. Value types are checked later,
    /// when the data is resolved against the table.
    pub fn parse(&self, body: &Value) -> Result<RecordData, ApiError> {
        let object = as_object(body)?;

        if let Some(key) = object.keys().find(|key| !self.accepts(key)) {
            return Err(ApiError::field_error("Unknown field", key.as_str(), "field is not accepted here"));
        }

        if let Some(missing) = self.required.iter().find(|key| is_blank(object.get(**key))) {
            return Err(ApiError::field_error("Missing required field", *missing, "field is required"));
        }

        Ok(RecordData::from_object(object))
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object"))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONSTRAINTS: PayloadRules = PayloadRules::new(TableId::ProductionConstraints)
        .required(&["mine_id", "equipment_id", "week_start", "constraint_type"])
        .managed(&["update_date"]);

    #[test]
    fn accepts_complete_bodies() {
        let data = CONSTRAINTS
            .parse(&json!({
                "mine_id": "M01", "equipment_id": "EQ001", "week_start": "2025-01-06",
                "constraint_type": "max_output", "capacity_value": 80
            }))
            .unwrap();
        assert_eq!(data.len(), 5);
    }

    #[test]
    fn rejects_missing_and_blank_required_fields() {
        let err = CONSTRAINTS
            .parse(&json!({"mine_id": "M01", "equipment_id": " ", "week_start": "2025-01-06", "constraint_type": "x"}))
            .unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["equipment_id"], "field is required");
    }

    #[test]
    fn rejects_unknown_and_managed_keys() {
        let rules = PayloadRules::new(TableId::Roads);
        assert_eq!(rules.parse(&json!({"road_id": "R001"})).unwrap_err().status_code(), 400);
        assert_eq!(rules.parse(&json!({"colour": "red"})).unwrap_err().status_code(), 400);
        assert_eq!(CONSTRAINTS.parse(&json!({"update_date": "2025-01-01"})).unwrap_err().status_code(), 400);
        assert_eq!(rules.parse(&json!([1, 2])).unwrap_err().status_code(), 400);
    }

    #[test]
    fn sparse_bodies_pass_without_required_fields() {
        let data = PayloadRules::new(TableId::Roads).parse(&json!({"condition_level": null})).unwrap();
        assert_eq!(data.len(), 1);
    }
}

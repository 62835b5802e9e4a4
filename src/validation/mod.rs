//! Declarative field schemas and the single validator that evaluates them.
//!
//! A [`ResourceSchema`] lists the fields a caller may set on a resource. The
//! validator turns a parsed JSON body into a [`Record`] holding only those
//! fields, each checked independently. Checks short-circuit in a fixed order:
//! body shape, required fields, field types, then business rules.
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::database::Record;

/// Value shape a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed string; blank is rejected when the field is required and
    /// stored as null otherwise.
    Text,
    /// Any finite JSON number.
    Number,
    /// JSON number `>= 0`.
    NonNegativeNumber,
    Boolean,
    /// String holding a UUID.
    Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Human label used in error messages.
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
    /// Settable on create only; updates naming it are rejected.
    pub immutable: bool,
    /// Applied on create when the field is absent.
    pub create_default: Option<DefaultValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            DefaultValue::Bool(b) => Value::Bool(b),
        }
    }
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            nullable: false,
            immutable: false,
            create_default: None,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            nullable: true,
            immutable: false,
            create_default: None,
        }
    }

    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Optional but never null, falling back to `value` on create.
    pub const fn defaults_to(mut self, value: DefaultValue) -> Self {
        self.nullable = false;
        self.create_default = Some(value);
        self
    }

    fn expectation(&self) -> &'static str {
        match (self.kind, self.nullable) {
            (FieldKind::Text, false) => "a non-empty string",
            (FieldKind::Text, true) => "a string or null",
            (FieldKind::Number, false) => "a number",
            (FieldKind::Number, true) => "a number or null",
            (FieldKind::NonNegativeNumber, false) => "a non-negative number",
            (FieldKind::NonNegativeNumber, true) => "a non-negative number or null",
            (FieldKind::Boolean, _) => "a boolean",
            (FieldKind::Uuid, _) => "a valid UUID",
        }
    }

    fn invalid(&self) -> ValidationError {
        ValidationError::InvalidType {
            label: self.label,
            expected: self.expectation(),
        }
    }

    /// Type- and constraint-checks one present value, returning what gets stored.
    fn check(&self, value: &Value) -> Result<Value, ValidationError> {
        if value.is_null() {
            return if self.nullable { Ok(Value::Null) } else { Err(self.invalid()) };
        }

        match self.kind {
            FieldKind::Text => {
                let text = value.as_str().ok_or_else(|| self.invalid())?.trim();
                match (text.is_empty(), self.nullable) {
                    (false, _) => Ok(Value::String(text.to_string())),
                    (true, true) => Ok(Value::Null),
                    (true, false) => Err(self.invalid()),
                }
            }
            FieldKind::Number => match value.as_f64() {
                Some(n) if n.is_finite() => Ok(value.clone()),
                _ => Err(self.invalid()),
            },
            FieldKind::NonNegativeNumber => match value.as_f64() {
                Some(n) if n.is_finite() && n >= 0.0 => Ok(value.clone()),
                _ => Err(self.invalid()),
            },
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err(self.invalid()),
            },
            FieldKind::Uuid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s.trim()).ok())
                .map(|id| Value::String(id.to_string()))
                .ok_or_else(|| self.invalid()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body is required.")]
    MissingBody,

    #[error("Request body must be a JSON object.")]
    NotAnObject,

    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("{label} must be {expected}.")]
    InvalidType {
        label: &'static str,
        expected: &'static str,
    },

    #[error("{0} cannot be changed. Delete the relation and create a new one instead.")]
    Immutable(&'static str),

    #[error("No valid update fields provided.")]
    NoValidFields,
}

/// The fields a caller may set on one resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    pub fields: &'static [FieldSpec],
}

impl ResourceSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// Builds an insert payload. Unknown fields are dropped.
    pub fn validate_create(&self, body: &Value) -> Result<Record, ValidationError> {
        let input = as_object(body)?;

        for spec in self.fields.iter().filter(|f| f.required) {
            if input.get(spec.name).map_or(true, Value::is_null) {
                return Err(ValidationError::MissingField(spec.label));
            }
        }

        let mut payload = Record::new();
        for spec in self.fields {
            match input.get(spec.name) {
                Some(value) => {
                    payload.insert(spec.name.to_string(), spec.check(value)?);
                }
                None => {
                    if let Some(default) = spec.create_default {
                        payload.insert(spec.name.to_string(), default.to_value());
                    }
                }
            }
        }
        Ok(payload)
    }

    /// Builds a partial update payload from the recognized fields of `body`.
    pub fn validate_update(&self, body: &Value) -> Result<Record, ValidationError> {
        let input = as_object(body)?;
        if input.is_empty() {
            return Err(ValidationError::MissingBody);
        }

        let mut payload = Record::new();
        for spec in self.fields.iter().filter(|f| !f.immutable) {
            if let Some(value) = input.get(spec.name) {
                payload.insert(spec.name.to_string(), spec.check(value)?);
            }
        }

        if let Some(spec) = self
            .fields
            .iter()
            .find(|f| f.immutable && input.contains_key(f.name))
        {
            return Err(ValidationError::Immutable(spec.label));
        }

        if payload.is_empty() {
            return Err(ValidationError::NoValidFields);
        }
        Ok(payload)
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    match body {
        Value::Object(map) => Ok(map),
        Value::Null => Err(ValidationError::MissingBody),
        _ => Err(ValidationError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("outlet_id", "Outlet ID", FieldKind::Uuid).immutable(),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("price", "Price", FieldKind::NonNegativeNumber),
        FieldSpec::optional("note", "Note", FieldKind::Text),
        FieldSpec::optional("latitude", "Latitude", FieldKind::Number),
        FieldSpec::optional("is_available", "is_available", FieldKind::Boolean)
            .defaults_to(DefaultValue::Bool(true)),
    ];
    const SCHEMA: ResourceSchema = ResourceSchema::new(FIELDS);

    fn outlet_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn create_keeps_known_fields_and_applies_defaults() {
        let id = outlet_id();
        let payload = SCHEMA
            .validate_create(&json!({
                "outlet_id": id,
                "name": "  Oslo S  ",
                "price": 12.5,
                "note": "   ",
                "id": "client-chosen",
                "extra": true
            }))
            .unwrap();

        assert_eq!(payload["name"], json!("Oslo S"));
        assert_eq!(payload["note"], Value::Null);
        assert_eq!(payload["is_available"], json!(true));
        assert_eq!(payload["outlet_id"], json!(id));
        assert!(!payload.contains_key("id"));
        assert!(!payload.contains_key("extra"));
        assert!(!payload.contains_key("latitude"));
    }

    #[test]
    fn missing_required_field_wins_over_type_errors() {
        let err = SCHEMA
            .validate_create(&json!({ "outlet_id": outlet_id(), "price": "free" }))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("Name"));
        assert_eq!(err.to_string(), "Name is required.");
    }

    #[test]
    fn type_errors_name_the_field() {
        let base = json!({ "outlet_id": outlet_id(), "name": "x", "price": 1 });

        let mut negative = base.clone();
        negative["price"] = json!(-1);
        assert_eq!(
            SCHEMA.validate_create(&negative).unwrap_err().to_string(),
            "Price must be a non-negative number."
        );

        let mut blank = base.clone();
        blank["name"] = json!("   ");
        assert_eq!(
            SCHEMA.validate_create(&blank).unwrap_err().to_string(),
            "Name must be a non-empty string."
        );

        let mut flag = base.clone();
        flag["is_available"] = json!("yes");
        assert_eq!(
            SCHEMA.validate_create(&flag).unwrap_err().to_string(),
            "is_available must be a boolean."
        );

        let mut bad_id = base;
        bad_id["outlet_id"] = json!("not-a-uuid");
        assert_eq!(
            SCHEMA.validate_create(&bad_id).unwrap_err().to_string(),
            "Outlet ID must be a valid UUID."
        );
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert_eq!(SCHEMA.validate_create(&json!([1, 2])), Err(ValidationError::NotAnObject));
        assert_eq!(SCHEMA.validate_create(&Value::Null), Err(ValidationError::MissingBody));
    }

    #[test]
    fn update_rejects_empty_and_unrecognized_bodies() {
        assert_eq!(SCHEMA.validate_update(&json!({})), Err(ValidationError::MissingBody));
        assert_eq!(
            SCHEMA.validate_update(&json!({ "colour": "red" })),
            Err(ValidationError::NoValidFields)
        );
    }

    #[test]
    fn update_refuses_immutable_fields() {
        let err = SCHEMA
            .validate_update(&json!({ "outlet_id": outlet_id(), "price": 3 }))
            .unwrap_err();
        assert_eq!(err, ValidationError::Immutable("Outlet ID"));
    }

    #[test]
    fn update_checks_types_before_immutability() {
        let err = SCHEMA
            .validate_update(&json!({ "outlet_id": outlet_id(), "price": -3 }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { label: "Price", .. }));
    }

    #[test]
    fn update_allows_nulls_only_on_nullable_fields() {
        let payload = SCHEMA
            .validate_update(&json!({ "note": null, "latitude": null }))
            .unwrap();
        assert_eq!(payload.len(), 2);

        assert!(SCHEMA.validate_update(&json!({ "name": null })).is_err());
        assert!(SCHEMA.validate_update(&json!({ "is_available": null })).is_err());
    }
}

//! Schema introspection used to repair bare array responses.
//!
//! The runtime never reaches into a schema representation directly. It goes
//! through [`SchemaShape`], and [`find_array_field`] turns every adapter
//! failure into "not found".

use serde_json::{Map, Value};

/// Failure while reading a schema through [`SchemaShape`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntrospectionError {
    #[error("malformed schema: {0}")]
    Malformed(String),

    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Read-only view of a schema.
pub trait SchemaShape {
    /// Whether the schema describes an object
    fn is_object(&self) -> Result<bool, IntrospectionError>;

    /// Named fields in declaration order
    fn field_names(&self) -> Result<Vec<String>, IntrospectionError>;

    /// Whether the named field holds an array
    fn is_array_field(&self, name: &str) -> Result<bool, IntrospectionError>;
}

/// Find the field a bare array response should be nested under.
///
/// Returns the first array-typed field of an object schema. Later array
/// fields are ignored: schemas used with the TM endpoint carry at most one.
/// Introspection errors are logged and reported as `None`.
pub fn find_array_field<S: SchemaShape + ?Sized>(schema: &S) -> Option<String> {
    match try_find_array_field(schema) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to introspect schema");
            None
        }
    }
}

fn try_find_array_field<S: SchemaShape + ?Sized>(
    schema: &S,
) -> Result<Option<String>, IntrospectionError> {
    if !schema.is_object()? {
        return Ok(None);
    }

    for name in schema.field_names()? {
        if schema.is_array_field(&name)? {
            return Ok(Some(name));
        }
    }

    Ok(None)
}

// ============================================================================
// JSON Schema adapter
// ============================================================================

impl SchemaShape for Value {
    fn is_object(&self) -> Result<bool, IntrospectionError> {
        let node = resolve(self, self)?;
        if has_type(node, "object")? {
            return Ok(true);
        }
        // An untyped schema with properties is treated as an object
        Ok(type_of(node).is_none() && node.get("properties").is_some())
    }

    fn field_names(&self) -> Result<Vec<String>, IntrospectionError> {
        Ok(properties(self)?
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn is_array_field(&self, name: &str) -> Result<bool, IntrospectionError> {
        let field = properties(self)?
            .and_then(|props| props.get(name))
            .ok_or_else(|| IntrospectionError::UnknownField(name.to_string()))?;

        match field {
            // `true`/`false` are valid subschemas but carry no type
            Value::Bool(_) => Ok(false),
            Value::Object(_) => has_type(resolve(self, field)?, "array"),
            other => Err(IntrospectionError::Malformed(format!(
                "property '{name}' is not a schema: {other}"
            ))),
        }
    }
}

#[cfg(feature = "schemars")]
impl SchemaShape for schemars::Schema {
    fn is_object(&self) -> Result<bool, IntrospectionError> {
        SchemaShape::is_object(self.as_value())
    }

    fn field_names(&self) -> Result<Vec<String>, IntrospectionError> {
        SchemaShape::field_names(self.as_value())
    }

    fn is_array_field(&self, name: &str) -> Result<bool, IntrospectionError> {
        SchemaShape::is_array_field(self.as_value(), name)
    }
}

/// Follow local `$ref`s starting at `node`.
fn resolve<'a>(root: &'a Value, mut node: &'a Value) -> Result<&'a Value, IntrospectionError> {
    // Guards against reference cycles
    for _ in 0..32 {
        let Some(reference) = node.get("$ref") else {
            return Ok(node);
        };
        let reference = reference.as_str().ok_or_else(|| {
            IntrospectionError::Malformed(format!("$ref is not a string: {reference}"))
        })?;
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| IntrospectionError::UnresolvedRef(reference.to_string()))?;
        node = root
            .pointer(pointer)
            .ok_or_else(|| IntrospectionError::UnresolvedRef(reference.to_string()))?;
    }

    Err(IntrospectionError::Malformed("reference cycle".to_string()))
}

fn type_of(node: &Value) -> Option<&Value> {
    node.get("type")
}

/// `"type": "x"` or `"type": ["x", "null"]`
fn has_type(node: &Value, expected: &str) -> Result<bool, IntrospectionError> {
    match type_of(node) {
        None => Ok(false),
        Some(Value::String(t)) => Ok(t == expected),
        Some(Value::Array(types)) => Ok(types.iter().any(|t| t.as_str() == Some(expected))),
        Some(other) => Err(IntrospectionError::Malformed(format!(
            "unexpected type declaration: {other}"
        ))),
    }
}

fn properties(root: &Value) -> Result<Option<&Map<String, Value>>, IntrospectionError> {
    let node = resolve(root, root)?;
    match node.get("properties") {
        None => Ok(None),
        Some(Value::Object(props)) => Ok(Some(props)),
        Some(other) => Err(IntrospectionError::Malformed(format!(
            "properties is not an object: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_warnings;
    use serde_json::json;

    #[test]
    fn test_single_array_field() {
        let schema = json!({
            "type": "object",
            "properties": {
                "items": {"type": "array", "items": {"type": "string"}}
            }
        });

        assert_eq!(find_array_field(&schema), Some("items".to_string()));
    }

    #[test]
    fn test_first_array_field_in_declaration_order() {
        let schema = json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "tasks": {"type": "array"},
                "alternatives": {"type": "array"}
            }
        });

        assert_eq!(find_array_field(&schema), Some("tasks".to_string()));
    }

    #[test]
    fn test_no_array_field() {
        let schema = json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "count": {"type": "integer"}
            }
        });

        assert_eq!(find_array_field(&schema), None);
    }

    #[test]
    fn test_non_object_schemas() {
        assert_eq!(find_array_field(&json!({"type": "array", "items": {}})), None);
        assert_eq!(find_array_field(&json!({"type": "string"})), None);
        assert_eq!(find_array_field(&json!(true)), None);
        assert_eq!(find_array_field(&json!(null)), None);
    }

    #[test]
    fn test_nullable_array_and_refs() {
        let schema = json!({
            "$ref": "#/$defs/Plan",
            "$defs": {
                "Plan": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "subtasks": {"$ref": "#/$defs/SubtaskList"}
                    }
                },
                "SubtaskList": {"type": ["array", "null"], "items": {"type": "string"}}
            }
        });

        assert_eq!(find_array_field(&schema), Some("subtasks".to_string()));
    }

    #[test]
    fn test_malformed_schema_is_not_found() {
        let bad_properties = json!({"type": "object", "properties": "tasks"});
        let bad_type = json!({"type": {"oops": true}});
        let dangling = json!({"$ref": "#/$defs/Missing"});
        let bad_field = json!({"type": "object", "properties": {"tasks": 3}});

        assert_eq!(find_array_field(&bad_properties), None);
        assert_eq!(find_array_field(&bad_type), None);
        assert_eq!(find_array_field(&dangling), None);
        assert_eq!(find_array_field(&bad_field), None);
    }

    #[test]
    fn test_reference_cycle_is_not_found() {
        let schema = json!({
            "$ref": "#/$defs/A",
            "$defs": {"A": {"$ref": "#/$defs/A"}}
        });

        assert_eq!(find_array_field(&schema), None);
    }

    struct Exploding;

    impl SchemaShape for Exploding {
        fn is_object(&self) -> Result<bool, IntrospectionError> {
            Ok(true)
        }

        fn field_names(&self) -> Result<Vec<String>, IntrospectionError> {
            Ok(vec!["tasks".to_string()])
        }

        fn is_array_field(&self, name: &str) -> Result<bool, IntrospectionError> {
            Err(IntrospectionError::UnknownField(name.to_string()))
        }
    }

    #[test]
    fn test_adapter_failure_is_not_found() {
        let (found, warnings) = capture_warnings(|| find_array_field(&Exploding));

        assert_eq!(found, None);
        assert_eq!(warnings, vec!["Failed to introspect schema".to_string()]);
    }

    #[test]
    fn test_missing_array_field_is_not_a_failure() {
        let schema = json!({"type": "object", "properties": {"title": {"type": "string"}}});
        let (found, warnings) = capture_warnings(|| find_array_field(&schema));

        assert_eq!(found, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_schemars_derived_schema() {
        #[derive(schemars::JsonSchema)]
        #[allow(dead_code)]
        struct Subtask {
            title: String,
        }

        #[derive(schemars::JsonSchema)]
        #[allow(dead_code)]
        struct SubtaskPlan {
            parent_id: u32,
            subtasks: Vec<Subtask>,
            notes: Option<Vec<String>>,
        }

        let schema = serde_json::to_value(schemars::schema_for!(SubtaskPlan)).unwrap();
        assert_eq!(find_array_field(&schema), Some("subtasks".to_string()));
    }
}

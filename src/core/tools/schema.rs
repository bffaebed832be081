//! Parameter validators compiled from backend declarations.
//!
//! A declaration is compiled once into an immutable [`ObjectValidator`];
//! invocations only ever run the compiled form.

use serde_json::{Map, Value, json};
use std::fmt;

use crate::api::types::BackendToolParameter;

/// Declared type of a tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    /// Array of anything
    Array,
    /// Object of anything
    Object,
    /// Type name the compiler does not know; accepts any value
    Unknown(String),
}

impl ParamType {
    pub fn parse(name: &str) -> Self {
        match name {
            "string" => ParamType::String,
            "number" => ParamType::Number,
            "boolean" => ParamType::Boolean,
            "array" => ParamType::Array,
            "object" => ParamType::Object,
            other => ParamType::Unknown(other.to_string()),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
            ParamType::Unknown(_) => true,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Number => write!(f, "number"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::Array => write!(f, "array"),
            ParamType::Object => write!(f, "object"),
            ParamType::Unknown(name) => write!(f, "{name}"),
        }
    }
}

/// Rejection produced by a validator. Carries one message per offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issues.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Validator for a single named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidator {
    name: String,
    param_type: ParamType,
    /// When set, the field must be one of these strings and the type is ignored.
    allowed: Option<Vec<String>>,
    description: Option<String>,
    required: bool,
}

impl FieldValidator {
    pub fn compile(name: &str, spec: &BackendToolParameter) -> Self {
        Self {
            name: name.to_string(),
            param_type: ParamType::parse(&spec.param_type),
            allowed: spec.enum_values.clone(),
            description: spec.description.clone(),
            required: spec.required,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allowed_values(&self) -> Option<&[String]> {
        self.allowed.as_deref()
    }

    fn check(&self, value: Option<&Value>) -> Option<String> {
        let value = match value {
            None if self.required => {
                return Some(format!("missing required field '{}'", self.name));
            }
            None => return None,
            Some(value) => value,
        };

        if let Some(allowed) = &self.allowed {
            let matches = value
                .as_str()
                .is_some_and(|s| allowed.iter().any(|a| a == s));
            if !matches {
                return Some(format!(
                    "field '{}' must be one of [{}], got {}",
                    self.name,
                    allowed.join(", "),
                    value
                ));
            }
            return None;
        }

        if !self.param_type.accepts(value) {
            return Some(format!(
                "field '{}' must be a {}, got {}",
                self.name, self.param_type, value
            ));
        }
        None
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        match (&self.allowed, &self.param_type) {
            (Some(allowed), _) => {
                schema.insert("type".to_string(), json!("string"));
                schema.insert("enum".to_string(), json!(allowed));
            }
            (None, ParamType::Unknown(_)) => {}
            (None, ParamType::Array) => {
                schema.insert("type".to_string(), json!("array"));
                schema.insert("items".to_string(), json!({}));
            }
            (None, param_type) => {
                schema.insert("type".to_string(), json!(param_type.to_string()));
            }
        }
        if let Some(description) = &self.description {
            schema.insert("description".to_string(), json!(description));
        }
        Value::Object(schema)
    }
}

/// Validator for a whole argument object.
///
/// Fields that are not declared are tolerated and passed through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectValidator {
    fields: Vec<FieldValidator>,
}

impl ObjectValidator {
    pub fn new(fields: Vec<FieldValidator>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldValidator] {
        &self.fields
    }

    pub fn validate(&self, input: &Value) -> Result<(), ValidationError> {
        let Some(object) = input.as_object() else {
            return Err(ValidationError {
                issues: vec![format!("expected an object, got {input}")],
            });
        };

        let issues: Vec<String> = self
            .fields
            .iter()
            .filter_map(|field| field.check(object.get(field.name())))
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// JSON schema of the accepted object, in the shape function-calling APIs expect.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

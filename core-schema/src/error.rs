use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("missing required field `{field}` in {entity}")]
    MissingField { entity: &'static str, field: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl SchemaError {
    pub fn missing(entity: &'static str, field: impl Into<String>) -> Self {
        SchemaError::MissingField {
            entity,
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;

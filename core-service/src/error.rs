use bridge_traits::Operation;
use core_schema::{SchemaError, Status, TripStatus};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("{operation} is not implemented on this platform")]
    NotImplemented { operation: Operation },

    #[error("{operation} failed with status {status}")]
    Native { operation: Operation, status: Status },

    #[error("{operation} succeeded without returning `{field}`")]
    IncompleteResponse {
        operation: Operation,
        field: &'static str,
    },

    #[error("{operation} returned a malformed payload: {source}")]
    MalformedResponse {
        operation: Operation,
        #[source]
        source: SchemaError,
    },

    #[error("{operation} completion was dropped by the native SDK")]
    CallbackDropped { operation: Operation },

    #[error("A trip is already active (externalId `{external_id}`)")]
    TripAlreadyActive { external_id: String },

    #[error("No trip is active")]
    NoActiveTrip,

    #[error("Trip `{requested}` is not the active trip `{active}`")]
    TripMismatch { active: String, requested: String },

    #[error("Trip cannot move from {from} to {to}")]
    InvalidTransition { from: TripStatus, to: TripStatus },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SchemaError> for CoreError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::MissingField { field, .. } => CoreError::MissingField { field },
            SchemaError::InvalidField { field, reason } => CoreError::InvalidField { field, reason },
            SchemaError::InvalidCoordinate {
                latitude,
                longitude,
            } => CoreError::InvalidField {
                field: "location".to_string(),
                reason: format!("invalid coordinate ({latitude}, {longitude})"),
            },
        }
    }
}

impl CoreError {
    pub fn missing(field: impl Into<String>) -> Self {
        CoreError::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Re-labels a schema error raised while converting one argument so the
    /// message names the argument the caller actually sent.
    pub(crate) fn in_field(field: &str, error: SchemaError) -> Self {
        match error {
            SchemaError::MissingField { field: inner, .. } => {
                CoreError::missing(format!("{field}.{inner}"))
            }
            SchemaError::InvalidField { field: inner, reason } if inner != field => {
                CoreError::invalid(format!("{field}.{inner}"), reason)
            }
            SchemaError::InvalidField { reason, .. } => CoreError::invalid(field, reason),
            SchemaError::InvalidCoordinate {
                latitude,
                longitude,
            } => CoreError::invalid(
                field,
                format!("invalid coordinate ({latitude}, {longitude})"),
            ),
        }
    }

    /// Stable machine-readable code for host error handling.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::MissingField { .. } => "MISSING_FIELD",
            CoreError::InvalidField { .. } => "INVALID_FIELD",
            CoreError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            CoreError::UnknownCommand(_) => "UNKNOWN_COMMAND",
            CoreError::UnknownEvent(_) => "UNKNOWN_EVENT",
            CoreError::NotImplemented { .. } => "NOT_IMPLEMENTED",
            CoreError::Native { .. } => "NATIVE_ERROR",
            CoreError::IncompleteResponse { .. } => "INCOMPLETE_RESPONSE",
            CoreError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            CoreError::CallbackDropped { .. } => "CALLBACK_DROPPED",
            CoreError::TripAlreadyActive { .. } => "TRIP_ALREADY_ACTIVE",
            CoreError::NoActiveTrip => "NO_ACTIVE_TRIP",
            CoreError::TripMismatch { .. } => "TRIP_MISMATCH",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::Runtime(_) => "RUNTIME_ERROR",
            CoreError::Json(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Canonical status carried by the rejection, for failures that came
    /// from (or on behalf of) the native layer.
    pub fn status(&self) -> Option<Status> {
        match self {
            CoreError::Native { status, .. } => Some(*status),
            CoreError::IncompleteResponse { .. }
            | CoreError::MalformedResponse { .. }
            | CoreError::CallbackDropped { .. } => Some(Status::ErrorUnknown),
            _ => None,
        }
    }

    /// Whether the error was raised before anything reached the native SDK.
    pub fn is_local(&self) -> bool {
        self.status().is_none()
    }

    pub fn to_rejection(&self) -> Rejection {
        Rejection {
            code: self.code(),
            message: self.to_string(),
            status: self.status(),
        }
    }
}

/// Host-facing shape of a rejected command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_field_message_names_field() {
        let err = CoreError::missing("publishableKey");
        assert_eq!(err.to_string(), "missing required field `publishableKey`");
        assert_eq!(err.code(), "MISSING_FIELD");
        assert!(err.status().is_none());
        assert!(err.is_local());
    }

    #[test]
    fn test_native_rejection_carries_status() {
        let err = CoreError::Native {
            operation: Operation::TrackOnce,
            status: Status::ErrorLocation,
        };
        let rejection = serde_json::to_value(err.to_rejection()).unwrap();
        assert_eq!(
            rejection,
            json!({
                "code": "NATIVE_ERROR",
                "message": "trackOnce failed with status ERROR_LOCATION",
                "status": "ERROR_LOCATION",
            })
        );
    }

    #[test]
    fn test_dropped_completion_is_unknown_status() {
        let err = CoreError::CallbackDropped {
            operation: Operation::GetLocation,
        };
        assert_eq!(err.status(), Some(Status::ErrorUnknown));
        assert!(!err.is_local());
    }

    #[test]
    fn test_validation_rejection_omits_status() {
        let rejection = serde_json::to_value(CoreError::missing("eventId").to_rejection()).unwrap();
        assert!(rejection.get("status").is_none());
    }

    #[test]
    fn test_schema_errors_convert() {
        let err: CoreError = SchemaError::missing("TripOptions", "externalId").into();
        assert!(matches!(err, CoreError::MissingField { ref field } if field == "externalId"));

        let err: CoreError = SchemaError::InvalidCoordinate {
            latitude: 91.0,
            longitude: 0.0,
        }
        .into();
        assert_eq!(err.code(), "INVALID_FIELD");
    }

    #[test]
    fn test_in_field_prefixes_nested_names() {
        let err = CoreError::in_field("near", SchemaError::invalid("accuracy", "negative"));
        assert!(matches!(err, CoreError::InvalidField { ref field, .. } if field == "near.accuracy"));

        let err = CoreError::in_field(
            "origin",
            SchemaError::InvalidCoordinate {
                latitude: f64::NAN,
                longitude: 0.0,
            },
        );
        assert!(matches!(err, CoreError::InvalidField { ref field, .. } if field == "origin"));
    }
}

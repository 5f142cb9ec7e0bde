//! Locations
//!
//! [`Location`] carries only what the native layer actually measured. The
//! native representation marks missing measurements with a negative sentinel;
//! here they are `None` and omitted from serialized output. Zero is a real
//! measurement and is kept.

use bridge_traits::native::{NativeLocation, INVALID_MEASUREMENT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// A validated (latitude, longitude) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Both values must be finite, latitude within ±90 and longitude
    /// within ±180.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(SchemaError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mocked: bool,
}

impl Location {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            accuracy: None,
            altitude: None,
            vertical_accuracy: None,
            speed: None,
            speed_accuracy: None,
            course: None,
            course_accuracy: None,
            timestamp: None,
            mocked: false,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn from_native(native: &NativeLocation) -> Result<Self> {
        let coordinate = Coordinate::new(native.latitude, native.longitude)?;
        Ok(Self {
            accuracy: measured(native.horizontal_accuracy),
            altitude: native.altitude.filter(|v| v.is_finite()),
            vertical_accuracy: measured(native.vertical_accuracy),
            speed: measured(native.speed),
            speed_accuracy: measured(native.speed_accuracy),
            course: measured(native.course),
            course_accuracy: measured(native.course_accuracy),
            timestamp: native.timestamp,
            mocked: native.mocked,
            ..Self::new(coordinate)
        })
    }

    /// Rejects invalid coordinates instead of handing the SDK a location it
    /// would silently accept.
    pub fn to_native(&self) -> Result<NativeLocation> {
        let coordinate = self.coordinate()?;
        for (field, value) in [
            ("accuracy", self.accuracy),
            ("verticalAccuracy", self.vertical_accuracy),
            ("speedAccuracy", self.speed_accuracy),
            ("courseAccuracy", self.course_accuracy),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(SchemaError::invalid(field, "must be a non-negative number"));
                }
            }
        }

        Ok(NativeLocation {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            horizontal_accuracy: self.accuracy.unwrap_or(INVALID_MEASUREMENT),
            altitude: self.altitude,
            vertical_accuracy: self.vertical_accuracy.unwrap_or(INVALID_MEASUREMENT),
            speed: self.speed.unwrap_or(INVALID_MEASUREMENT),
            speed_accuracy: self.speed_accuracy.unwrap_or(INVALID_MEASUREMENT),
            course: self.course.unwrap_or(INVALID_MEASUREMENT),
            course_accuracy: self.course_accuracy.unwrap_or(INVALID_MEASUREMENT),
            timestamp: self.timestamp,
            mocked: self.mocked,
        })
    }
}

fn measured(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

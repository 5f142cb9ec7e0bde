//! Defensive accessors over the native SDK's JSON dictionaries.
//!
//! Scalars of the wrong type read as absent. Nested entities and lists are
//! strict: a malformed element fails the whole conversion rather than being
//! dropped.

use bridge_traits::native::JsonObject;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::location::Coordinate;

pub(crate) struct ObjectReader<'a> {
    entity: &'static str,
    object: &'a JsonObject,
}

impl<'a> ObjectReader<'a> {
    pub fn new(entity: &'static str, object: &'a JsonObject) -> Self {
        Self { entity, object }
    }

    fn value(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    /// Native serializers emit `_id`; already-canonical payloads use `id`.
    pub fn opt_id(&self) -> Option<String> {
        self.opt_str("_id").or_else(|| self.opt_str("id"))
    }

    pub fn id(&self) -> Result<String> {
        self.opt_id()
            .ok_or_else(|| SchemaError::missing(self.entity, "_id"))
    }

    pub fn required_str(&self, key: &str) -> Result<String> {
        self.opt_str(key)
            .ok_or_else(|| SchemaError::missing(self.entity, key))
    }

    pub fn opt_str(&self, key: &str) -> Option<String> {
        self.value(key).and_then(Value::as_str).map(str::to_owned)
    }

    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        self.value(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.value(key).and_then(Value::as_bool)
    }

    pub fn opt_object(&self, key: &str) -> Option<JsonObject> {
        self.value(key).and_then(Value::as_object).cloned()
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.value(key)
    }

    pub fn opt_strings(&self, key: &str) -> Option<Vec<String>> {
        self.value(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
    }

    /// ISO-8601 strings or epoch milliseconds.
    pub fn opt_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.value(key)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        }
    }

    pub fn entity<T>(
        &self,
        key: &str,
        parse: impl Fn(&JsonObject) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Object(object)) => parse(object).map(Some),
            Some(_) => Err(SchemaError::invalid(
                format!("{}.{}", self.entity, key),
                "expected an object",
            )),
        }
    }

    pub fn list<T>(
        &self,
        key: &str,
        parse: impl Fn(&JsonObject) -> Result<T>,
    ) -> Result<Option<Vec<T>>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Array(items)) => parse_list(items, parse)
                .map(Some)
                .map_err(|e| annotate(e, self.entity, key)),
            Some(_) => Err(SchemaError::invalid(
                format!("{}.{}", self.entity, key),
                "expected an array",
            )),
        }
    }

    /// GeoJSON point (`{"type": "Point", "coordinates": [lon, lat]}`).
    pub fn point(&self, key: &str) -> Result<Option<Coordinate>> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let coordinates = value
            .get("coordinates")
            .and_then(Value::as_array)
            .filter(|c| c.len() >= 2);
        match coordinates {
            Some(c) => match (c[0].as_f64(), c[1].as_f64()) {
                (Some(longitude), Some(latitude)) => Coordinate::new(latitude, longitude).map(Some),
                _ => Err(SchemaError::invalid(
                    format!("{}.{}", self.entity, key),
                    "coordinates must be numbers",
                )),
            },
            None => Err(SchemaError::invalid(
                format!("{}.{}", self.entity, key),
                "expected a GeoJSON point",
            )),
        }
    }
}

pub(crate) fn parse_list<T>(
    items: &[Value],
    parse: impl Fn(&JsonObject) -> Result<T>,
) -> Result<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => parse(object),
            _ => Err(SchemaError::invalid(
                format!("[{index}]"),
                "expected an object",
            )),
        })
        .collect()
}

fn annotate(error: SchemaError, entity: &str, key: &str) -> SchemaError {
    match error {
        SchemaError::InvalidField { field, reason } if field.starts_with('[') => {
            SchemaError::InvalidField {
                field: format!("{entity}.{key}{field}"),
                reason,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_null_and_wrong_types_read_as_absent() {
        let obj = object(json!({"tag": null, "count": "three", "flag": 1}));
        let reader = ObjectReader::new("Test", &obj);

        assert_eq!(reader.opt_str("tag"), None);
        assert_eq!(reader.opt_f64("count"), None);
        assert_eq!(reader.opt_bool("flag"), None);
    }

    #[test]
    fn test_id_prefers_native_key() {
        let obj = object(json!({"_id": "a", "id": "b"}));
        assert_eq!(ObjectReader::new("Test", &obj).id().unwrap(), "a");

        let obj = object(json!({}));
        assert_eq!(
            ObjectReader::new("Test", &obj).id(),
            Err(SchemaError::missing("Test", "_id"))
        );
    }

    #[test]
    fn test_point_is_longitude_first() {
        let obj = object(json!({"location": {"type": "Point", "coordinates": [-73.97, 40.78]}}));
        let point = ObjectReader::new("Test", &obj).point("location").unwrap().unwrap();

        assert_eq!(point.latitude, 40.78);
        assert_eq!(point.longitude, -73.97);
    }

    #[test]
    fn test_list_is_strict() {
        let obj = object(json!({"items": [{"_id": "a"}, 7]}));
        let reader = ObjectReader::new("Test", &obj);
        let result = reader.list("items", |o| ObjectReader::new("Item", o).id());

        assert_eq!(
            result,
            Err(SchemaError::invalid("Test.items[1]", "expected an object"))
        );
    }

    #[test]
    fn test_absent_list_is_not_empty_list() {
        let obj = object(json!({"empty": []}));
        let reader = ObjectReader::new("Test", &obj);

        let parse = |o: &JsonObject| ObjectReader::new("Item", o).id();
        assert_eq!(reader.list("missing", parse).unwrap(), None);
        assert_eq!(reader.list("empty", parse).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_timestamp_formats() {
        let obj = object(json!({"iso": "2024-05-01T12:00:00.000Z", "millis": 1714564800000i64}));
        let reader = ObjectReader::new("Test", &obj);

        assert_eq!(reader.opt_timestamp("iso"), reader.opt_timestamp("millis"));
        assert!(reader.opt_timestamp("iso").is_some());
    }
}

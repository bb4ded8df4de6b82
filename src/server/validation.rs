//! Request body validation for `/predict`.
//!
//! The body is parsed into a loose JSON value first and then checked field by
//! field, so that every client mistake yields the same structured error list
//! rather than an opaque parser message.

use serde::Serialize;
use serde_json::Value;

/// Path segment inside the request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Loc {
    Field(&'static str),
    Index(usize),
}

/// Machine-readable validation failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Body could not be read (too large, aborted).
    BodyUnreadable,
    /// Body is not JSON.
    JsonInvalid,
    /// Top-level JSON is not an object.
    ModelType,
    /// Required field absent.
    Missing,
    /// Field is not an array.
    ListType,
    /// Array element is not a number.
    FloatType,
    /// Array has no elements.
    TooShort,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<Loc>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: FieldErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldError {
    fn new(loc: Vec<Loc>, kind: FieldErrorKind, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind,
            input: None,
        }
    }

    fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn body_unreadable(reason: impl Into<String>) -> Self {
        Self::new(vec![], FieldErrorKind::BodyUnreadable, reason)
    }
}

/// A validated prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    features: Vec<f64>,
}

impl PredictionRequest {
    /// Parse and validate a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, Vec<FieldError>> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            vec![FieldError::new(
                vec![],
                FieldErrorKind::JsonInvalid,
                format!("Invalid JSON: {e}"),
            )]
        })?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self, Vec<FieldError>> {
        let mut object = match value {
            Value::Object(map) => map,
            other => {
                return Err(vec![FieldError::new(
                    vec![],
                    FieldErrorKind::ModelType,
                    "Input should be an object",
                )
                .with_input(other)])
            }
        };

        let loc = || vec![Loc::Field("features")];

        let items = match object.remove("features") {
            None => {
                return Err(vec![FieldError::new(
                    loc(),
                    FieldErrorKind::Missing,
                    "Field required",
                )])
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(vec![FieldError::new(
                    loc(),
                    FieldErrorKind::ListType,
                    "Input should be a valid list",
                )
                .with_input(other)])
            }
        };

        if items.is_empty() {
            return Err(vec![FieldError::new(
                loc(),
                FieldErrorKind::TooShort,
                "List should have at least 1 item after validation, not 0",
            )
            .with_input(Value::Array(items))]);
        }

        let mut features = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            match item.as_f64() {
                Some(x) => features.push(x),
                None => errors.push(
                    FieldError::new(
                        vec![Loc::Field("features"), Loc::Index(i)],
                        FieldErrorKind::FloatType,
                        "Input should be a valid number",
                    )
                    .with_input(item),
                ),
            }
        }

        if errors.is_empty() {
            Ok(Self { features })
        } else {
            Err(errors)
        }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn into_features(self) -> Vec<f64> {
        self.features
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn kinds(errors: &[FieldError]) -> Vec<FieldErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_integers_and_floats_coerced() {
        let req = PredictionRequest::from_slice(br#"{"features": [1, 2.5, -3]}"#).unwrap();
        assert_eq!(req.features(), &[1.0, 2.5, -3.0]);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let req = PredictionRequest::from_slice(br#"{"features": [0.5], "id": 7}"#).unwrap();
        assert_eq!(req.into_features(), vec![0.5]);
    }

    #[test]
    fn test_not_json() {
        let errors = PredictionRequest::from_slice(b"features=1,2").unwrap_err();
        assert_eq!(kinds(&errors), vec![FieldErrorKind::JsonInvalid]);
        assert!(errors[0].loc.is_empty());
    }

    #[test]
    fn test_non_object_json() {
        let errors = PredictionRequest::from_slice(b"[1, 2, 3]").unwrap_err();
        assert_eq!(kinds(&errors), vec![FieldErrorKind::ModelType]);
        assert_eq!(errors[0].input, Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_missing_features() {
        let errors = PredictionRequest::from_slice(br#"{"values": [1]}"#).unwrap_err();
        assert_eq!(kinds(&errors), vec![FieldErrorKind::Missing]);
        assert_eq!(errors[0].loc, vec![Loc::Field("features")]);
    }

    #[test]
    fn test_string_features() {
        let errors = PredictionRequest::from_slice(br#"{"features": "not-a-list"}"#).unwrap_err();
        assert_eq!(kinds(&errors), vec![FieldErrorKind::ListType]);
        assert_eq!(
            serde_json::to_value(&errors[0]).unwrap(),
            json!({
                "loc": ["features"],
                "msg": "Input should be a valid list",
                "type": "list_type",
                "input": "not-a-list"
            })
        );
    }

    #[test]
    fn test_each_bad_element_reported() {
        let errors =
            PredictionRequest::from_slice(br#"{"features": [1.0, "x", true, null, [2]]}"#)
                .unwrap_err();
        assert_eq!(errors.len(), 4);
        let locs: Vec<_> = errors.iter().map(|e| e.loc[1].clone()).collect();
        assert_eq!(
            locs,
            vec![Loc::Index(1), Loc::Index(2), Loc::Index(3), Loc::Index(4)]
        );
        assert!(errors.iter().all(|e| e.kind == FieldErrorKind::FloatType));
    }

    #[test]
    fn test_empty_features() {
        let errors = PredictionRequest::from_slice(br#"{"features": []}"#).unwrap_err();
        assert_eq!(kinds(&errors), vec![FieldErrorKind::TooShort]);
    }
}

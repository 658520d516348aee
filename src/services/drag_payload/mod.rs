//! Drag payload codec.
//!
//! A drag gesture carries its biomarker as a small JSON object on the
//! `text/plain` transfer channel: `{"biomarkerVal": 120, "className": "systolic"}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::models::biomarker::{BiomarkerCategory, BiomarkerPayload};
use crate::models::patient::Patient;
use crate::services::error::ValidationError;

/// MIME type the token is placed under on the transfer channel.
pub const TRANSFER_FORMAT: &str = "text/plain";

/// Serialized payload placed on the transfer channel by a drag source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DragToken(String);

impl DragToken {
    /// Wrap text read back from the transfer channel.
    pub fn from_transfer(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DragToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("drag token is empty")]
    Empty,
    #[error("drag token is not a biomarker payload: {0}")]
    Malformed(String),
    #[error("unknown biomarker category `{0}`")]
    UnknownCategory(String),
    #[error("biomarker value is not a finite number")]
    InvalidValue,
}

#[derive(Serialize, Deserialize)]
struct WirePayload {
    #[serde(rename = "biomarkerVal")]
    biomarker_val: f64,
    #[serde(rename = "className")]
    class_name: String,
}

pub struct DragPayloadCodec;

impl DragPayloadCodec {
    /// Encode a biomarker for a drag that is starting.
    ///
    /// Fails with [`ValidationError::NoActivePatient`] when nobody is selected;
    /// in that case nothing may be placed on the transfer channel.
    pub fn encode(
        payload: &BiomarkerPayload,
        active_patient: Option<&Patient>,
    ) -> Result<DragToken, ValidationError> {
        if active_patient.is_none() {
            return Err(ValidationError::NoActivePatient);
        }
        if !payload.value.is_finite() {
            return Err(ValidationError::MalformedToken);
        }

        let wire = WirePayload {
            biomarker_val: payload.value,
            class_name: payload.category.as_str().to_string(),
        };
        serde_json::to_string(&wire)
            .map(DragToken)
            .map_err(|_| ValidationError::MalformedToken)
    }

    pub fn decode(token: &str) -> Result<BiomarkerPayload, DecodeFailure> {
        if token.trim().is_empty() {
            return Err(DecodeFailure::Empty);
        }

        // Tokens are JSON objects; a derived struct would also accept arrays.
        let object: Map<String, Value> =
            serde_json::from_str(token).map_err(|err| DecodeFailure::Malformed(err.to_string()))?;
        let wire: WirePayload = serde_json::from_value(Value::Object(object))
            .map_err(|err| DecodeFailure::Malformed(err.to_string()))?;

        let category = wire
            .class_name
            .parse::<BiomarkerCategory>()
            .map_err(|_| DecodeFailure::UnknownCategory(wire.class_name.clone()))?;

        BiomarkerPayload::new(wire.biomarker_val, category).map_err(|_| DecodeFailure::InvalidValue)
    }
}

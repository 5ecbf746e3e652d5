//! Opaque proof payloads.

use crate::{ProofError, ProofResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const PUBLIC_DATA: &str = "publicData";

/// Proof object produced by the verification SDK.
///
/// Only `identifier` and `claimData.context` are read locally; everything
/// else is passed through to the backend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(Map<String, Value>);

impl Proof {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Interpret a success callback payload.
    ///
    /// A bare string is rejected. Arrays yield their first proof; multi-proof
    /// sessions are not supported.
    pub fn from_callback(payload: Value) -> ProofResult<Self> {
        match payload {
            Value::Object(map) => Ok(Self(map)),
            Value::Array(items) => match items.into_iter().next() {
                Some(Value::Object(map)) => Ok(Self(map)),
                Some(_) => Err(ProofError::InvalidProof(
                    "first array element is not an object".to_string(),
                )),
                None => Err(ProofError::InvalidProof("empty proof array".to_string())),
            },
            Value::String(message) => Err(ProofError::InvalidProof(format!(
                "received a string instead of a proof: {}",
                message
            ))),
            other => Err(ProofError::InvalidProof(format!(
                "unexpected payload type: {}",
                type_name(&other)
            ))),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.0.get("identifier").and_then(Value::as_str)
    }

    pub fn context(&self) -> Option<&str> {
        self.0
            .get("claimData")
            .and_then(|claim| claim.get("context"))
            .and_then(Value::as_str)
    }

    /// Copy of the proof without `publicData`, the only form that is transmitted.
    pub fn without_public_data(&self) -> Self {
        let mut map = self.0.clone();
        map.remove(PUBLIC_DATA);
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

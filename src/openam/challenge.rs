use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// Callback document returned by the JSON authenticate endpoint. It is sent
/// back as received apart from the filled slot, so unknown fields are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "authId", default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,

    #[serde(default)]
    pub callbacks: Vec<Callback>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<Value>,

    #[serde(default)]
    pub input: Vec<Slot>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,

    #[serde(default)]
    pub value: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Login finished, carries the session token
    Token(String),
    /// More input is required
    Challenge(Challenge),
}

impl Slot {
    fn is_empty(&self) -> bool {
        match self.value {
            Value::Null => true,
            Value::String(ref s) => s.is_empty(),
            _ => false,
        }
    }
}

impl Challenge {
    /// Fills the first empty input slot, in document order, and returns its name.
    pub fn fill_next(&mut self, value: &str) -> AuthResult<String> {
        let slot = self
            .callbacks
            .iter_mut()
            .flat_map(|c| c.input.iter_mut())
            .find(|s| s.is_empty())
            .ok_or_else(|| AuthError::Protocol("No valid form to fill returned".into()))?;

        slot.value = Value::String(value.into());

        Ok(slot.name.clone())
    }
}

impl Reply {
    pub fn from_json(doc: Value) -> AuthResult<Self> {
        if let Some(token) = doc.get("tokenId").and_then(Value::as_str) {
            if !token.is_empty() {
                return Ok(Reply::Token(token.into()));
            }
        }

        if doc.get("callbacks").map_or(true, |c| !c.is_array()) {
            return Err(AuthError::Protocol(
                "response contains neither a session token nor callbacks".into(),
            ));
        }

        Ok(Reply::Challenge(serde_json::from_value(doc)?))
    }
}

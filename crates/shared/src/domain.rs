use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier for a recorded response. Assigned by storage, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCheckId(pub Uuid);

/// The answer a visitor can give. Closed set: anything else is rejected at
/// the service boundary and never reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Yes,
    Maybe,
}

#[derive(Debug, Clone, Error)]
#[error("response must be 'yes' or 'maybe', got '{0}'")]
pub struct InvalidResponseKind(pub String);

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Yes => "yes",
            ResponseKind::Maybe => "maybe",
        }
    }
}

impl std::str::FromStr for ResponseKind {
    type Err = InvalidResponseKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "yes" => Ok(ResponseKind::Yes),
            "maybe" => Ok(ResponseKind::Maybe),
            other => Err(InvalidResponseKind(other.to_string())),
        }
    }
}

//! Shared enums used by requests and responses

use serde::{Deserialize, Serialize};

/// Why a candidate stopped generating.
///
/// The set is closed; backend-specific reasons that do not map onto one of
/// the named variants collapse into [`FinishReason::Other`].
///
/// Wire names follow the Gemini spelling:
/// - `STOP`
/// - `MAX_TOKENS`
/// - `ABORTED`
/// - `OTHER`
/// - `FINISH_REASON_UNSPECIFIED` (`UNSPECIFIED` is accepted on input)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural completion or stop sequence.
    Stop,
    /// The output token budget was exhausted.
    ///
    /// Also used as the conservative stand-in when a single-shot backend
    /// reports no explicit completion signal.
    MaxTokens,
    /// Generation was cut short by the caller or the backend.
    Aborted,
    /// Anything the backend reported that has no closer match.
    Other,
    /// The backend explicitly said it does not know.
    Unspecified,
}

impl FinishReason {
    /// Wire name of the variant.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::MaxTokens => "MAX_TOKENS",
            Self::Aborted => "ABORTED",
            Self::Other => "OTHER",
            Self::Unspecified => "FINISH_REASON_UNSPECIFIED",
        }
    }

    /// Parse a Gemini-style reason string. Unknown names become [`FinishReason::Other`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "ABORTED" => Self::Aborted,
            "FINISH_REASON_UNSPECIFIED" | "UNSPECIFIED" => Self::Unspecified,
            _ => Self::Other,
        }
    }
}

impl From<String> for FinishReason {
    fn from(value: String) -> Self {
        Self::from_wire(&value)
    }
}

impl From<FinishReason> for String {
    fn from(value: FinishReason) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a [`super::Content`] turn, Gemini style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Model,
    System,
}

/// Role of a flattened [`super::ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl From<Role> for MessageRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Model => Self::Assistant,
            Role::System => Self::System,
        }
    }
}

impl MessageRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

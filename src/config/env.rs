//! Environment snapshot
//!
//! All environment lookups go through an [`EnvSnapshot`] taken once and passed
//! explicitly, so resolution code never reads the process environment itself.

use std::collections::HashMap;

pub const GOOGLE_GENAI_USE_GCA: &str = "GOOGLE_GENAI_USE_GCA";
pub const GOOGLE_GENAI_USE_VERTEXAI: &str = "GOOGLE_GENAI_USE_VERTEXAI";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const GOOGLE_CLOUD_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
pub const OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Every variable the crate consults.
pub const KNOWN_VARS: [&str; 10] = [
    GOOGLE_GENAI_USE_GCA,
    GOOGLE_GENAI_USE_VERTEXAI,
    GEMINI_API_KEY,
    GOOGLE_API_KEY,
    GOOGLE_CLOUD_PROJECT,
    GOOGLE_CLOUD_LOCATION,
    OLLAMA_HOST,
    OLLAMA_MODEL,
    OPENAI_BASE_URL,
    OPENAI_API_KEY,
];

/// Immutable copy of the environment variables relevant to backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture [`KNOWN_VARS`] from the current process.
    pub fn from_process() -> Self {
        Self::from_pairs(
            KNOWN_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok().map(|v| (*name, v))),
        )
    }

    /// Build a snapshot from explicit pairs. Empty values are dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Only the literal `"true"` turns a flag on.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }
}

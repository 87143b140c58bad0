//! # Genadapt - One generation contract over many LLM backends
//!
//! Genadapt lets a single chat client talk to a Gemini-style API, any
//! OpenAI-compatible endpoint and a local Ollama server through one canonical
//! request/response shape.
//!
//! ## Pieces
//!
//! - **Auth resolution**: [`auth::resolve_effective_auth`] picks the auth mode
//!   from the configured default and an [`config::EnvSnapshot`].
//! - **Adapter selection**: [`registry::select_adapter`] walks a fixed
//!   priority table of backend predicates.
//! - **Translation**: each adapter maps a [`types::GenerateContentRequest`]
//!   to its native body and normalizes native responses back.
//! - **Streaming**: NDJSON and SSE bodies decode into a lazy
//!   [`streaming::ResponseStream`] of canonical increments.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use genadapt::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let env = EnvSnapshot::from_process();
//!     let mode = resolve_effective_auth(None, &env).ok_or("no auth method configured")?;
//!     let config = Arc::new(ProviderConfig::new("qwen3-coder"));
//!     let generator = create_content_generator(config, mode, &env)?;
//!
//!     let request = GenerateContentRequest::new("qwen3-coder", vec![Content::user("Hello!")]);
//!     let mut stream = generator.generate_content_stream(request).await?;
//!     while let Some(increment) = stream.next().await {
//!         print!("{}", increment?.text().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod generator;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod tracing;
pub mod transport;
pub mod types;
pub mod utils;

pub use error::{LlmError, Result};
pub use generator::{ContentGenerator, create_content_generator};

/// Common imports.
pub mod prelude {
    pub use crate::auth::{
        AuthMode, AuthRefresher, resolve_effective_auth, validate_auth_method,
        validate_non_interactive_auth,
    };
    pub use crate::config::{EnvSnapshot, ProviderConfig};
    pub use crate::error::LlmError;
    pub use crate::generator::{ContentGenerator, create_content_generator};
    pub use crate::streaming::ResponseStream;
    pub use crate::types::*;
    pub use crate::utils::{CancelHandle, make_cancellable_stream};
}

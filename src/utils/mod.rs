//! Utility modules
//!
//! Header construction, stream cancellation and endpoint helpers.

pub mod cancel;
pub mod http_headers;
pub mod vertex;

pub use cancel::{CancelHandle, make_cancellable_stream};
pub use http_headers::{HttpHeaderBuilder, user_agent};
pub use vertex::*;

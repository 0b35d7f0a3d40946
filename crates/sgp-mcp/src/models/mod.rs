//! Data models crossing the client boundary.
//!
//! SGP payloads themselves stay opaque `serde_json::Value`s; only the
//! envelope and the tool inputs are typed.

mod envelope;
mod inputs;

pub use envelope::{ResponseEnvelope, SUCCESS_MESSAGE, Status};
pub use inputs::*;

//! HTTP surface for the report pipeline.
//!
//! `POST /explain-report` runs the pipeline; `GET /` serves a landing page,
//! `/static` mounts an asset directory and `GET /health` reports liveness.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;

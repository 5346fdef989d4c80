//! HTTP surface of the landrop file manager.
//!
//! One upload route carries both whole-file and chunked requests; the
//! rest is listing, download, delete and status plumbing around the
//! storage root.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, ServerOptions};

//! Wire types for the landrop HTTP API.
//!
//! Everything here serializes as camelCase JSON so the browser UI and the
//! CLI client share one schema with the server.

mod messages;
mod mime;
mod records;
pub mod size;

pub use messages::{
    ChunkMeta, ErrorResponse, Listing, StatusResponse, UploadResponse,
};
pub use mime::mime_type_for;
pub use records::{DirEntry, FileRecord};

use std::path::PathBuf;

use landrop_transfer::{DEFAULT_CHUNK_SIZE, TempStore, TransferError};

/// Options for building the server state.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Display name reported by the status route.
    pub name: String,
    /// Directory all managed files live under.
    pub storage_root: PathBuf,
    /// Chunk threshold clients are told to use; also sizes the request
    /// body limit.
    pub chunk_size: u64,
    /// Maximum upload size reported to clients; 0 means unlimited.
    pub max_upload_size: u64,
}

impl ServerOptions {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            name: "landrop".into(),
            storage_root: storage_root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_upload_size: 0,
        }
    }
}

/// Shared state behind the routes.
#[derive(Debug)]
pub struct AppState {
    pub name: String,
    pub root: PathBuf,
    pub store: TempStore,
    pub chunk_size: u64,
    pub max_upload_size: u64,
}

impl AppState {
    /// Builds the state and creates the storage layout on disk.
    pub fn new(options: ServerOptions) -> Result<Self, TransferError> {
        let store = TempStore::new(&options.storage_root);
        store.ensure_layout()?;
        Ok(Self {
            name: options.name,
            root: options.storage_root,
            store,
            chunk_size: options.chunk_size.max(landrop_transfer::MIN_CHUNK_SIZE),
            max_upload_size: options.max_upload_size,
        })
    }
}

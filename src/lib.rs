//! # TraceLens - dependency graphs for C# codebases
//!
//! TraceLens turns a C# project into a module-level dependency graph:
//! - Tree-sitter based extraction of top-level types and `using` directives
//! - Namespace-prefix resolution of imports into `IMPORTS` edges
//! - Package risk/license records scanned from `.csproj` manifests
//! - SQLite-backed graph store behind a pluggable [`storage::GraphStore`]
//! - Query engine and HTTP API for visualization clients

pub mod module;
pub mod edge;
pub mod package;
pub mod adapter;
pub mod extract;
pub mod linker;
pub mod manifest;
pub mod archive;
pub mod storage;
pub mod query;
pub mod pipeline;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use module::{ModuleKind, ModuleNode};
pub use edge::{Edge, EdgeKind};
pub use package::PackageRecord;
pub use storage::{GraphStore, MemoryStore, SqliteStore};
pub use pipeline::{IngestPipeline, IngestReport};

/// Result type alias for TraceLens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for TraceLens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Schema not initialized; call ensure_schema first")]
    SchemaMissing,

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Invalid module kind: {0}")]
    InvalidKind(String),
}

impl Error {
    /// Failures of the external summarization service
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Summarizer(_))
    }
}

pub mod namespace_index;
pub mod import_linker;

pub use namespace_index::NamespaceIndex;
pub use import_linker::{ImportLinker, ImportLinkerStats, MAX_TARGETS_PER_IMPORT};

//! Project intake
//!
//! Splits an uploaded zip archive (or a directory on disk) into source files
//! and build manifests. Directories, unreadable entries and files with other
//! extensions are skipped without failing the batch.

use std::io::{Cursor, Read};
use std::path::Path;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use crate::Result;
use crate::adapter::AdapterRegistry;
use crate::extract::SourceFile;
use crate::manifest::is_manifest;

/// Build output and tooling directories never worth parsing
const DEFAULT_EXCLUDES: &[&str] = &["!bin/", "!obj/", "!.git/", "!.vs/", "!node_modules/"];

/// Files of one project, split by role
#[derive(Debug, Default)]
pub struct ProjectFiles {
    pub sources: Vec<SourceFile>,
    pub manifests: Vec<SourceFile>,
    /// Entries that matched neither role or could not be read
    pub skipped: usize,
}

impl ProjectFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a file by its path
    pub fn add(&mut self, registry: &AdapterRegistry, path: &str, text: String) {
        if registry.is_source(Path::new(path)) {
            self.sources.push(SourceFile::new(path, text));
        } else if is_manifest(path) {
            self.manifests.push(SourceFile::new(path, text));
        } else {
            self.skipped += 1;
        }
    }

    fn wants(registry: &AdapterRegistry, path: &str) -> bool {
        registry.is_source(Path::new(path)) || is_manifest(path)
    }

    /// Read a zip archive held in memory
    pub fn from_zip(registry: &AdapterRegistry, bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut files = Self::new();

        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable zip entry #{}: {}", i, e);
                    files.skipped += 1;
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }

            let path = entry.name().to_string();
            if !Self::wants(registry, &path) {
                files.skipped += 1;
                continue;
            }

            let mut buf = Vec::new();
            if let Err(e) = entry.read_to_end(&mut buf) {
                tracing::debug!("Skipping {}: {}", path, e);
                files.skipped += 1;
                continue;
            }
            files.add(registry, &path, String::from_utf8_lossy(&buf).into_owned());
        }

        tracing::info!(
            "Archive: {} sources, {} manifests, {} skipped",
            files.sources.len(),
            files.manifests.len(),
            files.skipped
        );
        Ok(files)
    }

    /// Walk a directory, honoring `.gitignore` and skipping build output
    pub fn from_dir(registry: &AdapterRegistry, root: &Path) -> Result<Self> {
        let mut overrides = OverrideBuilder::new(root);
        for pattern in DEFAULT_EXCLUDES {
            // static patterns, always valid
            overrides.add(pattern).ok();
        }
        let overrides = overrides
            .build()
            .map_err(|e| crate::Error::Io(std::io::Error::other(e.to_string())))?;

        let mut files = Self::new();
        for entry in WalkBuilder::new(root).overrides(overrides).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Walk error: {}", e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let path = relative.to_string_lossy().replace('\\', "/");
            if !Self::wants(registry, &path) {
                files.skipped += 1;
                continue;
            }

            match std::fs::read(entry.path()) {
                Ok(bytes) => files.add(registry, &path, String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path, e);
                    files.skipped += 1;
                }
            }
        }
        Ok(files)
    }

    /// Read a project from a `.zip` file or a directory
    pub fn load(registry: &AdapterRegistry, path: &Path) -> Result<Self> {
        if path.is_dir() {
            Self::from_dir(registry, path)
        } else {
            let bytes = std::fs::read(path)?;
            Self::from_zip(registry, &bytes)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapter::default_registry;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build an in-memory zip from (path, contents); paths ending in `/` are directories
    pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (path, contents) in entries {
            if path.ends_with('/') {
                writer.add_directory(*path, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*path, SimpleFileOptions::default()).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_classification() {
        let registry = default_registry();
        let bytes = zip_bytes(&[
            ("src/", ""),
            ("src/A.cs", "namespace A { class X {} }"),
            ("src/B.CS", "namespace B { class Y {} }"),
            ("App.csproj", "<Project />"),
            ("README.md", "# readme"),
        ]);

        let files = ProjectFiles::from_zip(&registry, &bytes).unwrap();

        let sources: Vec<_> = files.sources.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(sources, vec!["src/A.cs", "src/B.CS"]);
        assert_eq!(files.manifests.len(), 1);
        assert_eq!(files.skipped, 1);
    }

    #[test]
    fn test_invalid_zip_is_an_error() {
        let registry = default_registry();
        assert!(ProjectFiles::from_zip(&registry, b"definitely not a zip").is_err());
    }

    #[test]
    fn test_directory_walk_skips_build_output() {
        let registry = default_registry();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("obj")).unwrap();
        std::fs::write(dir.path().join("src/A.cs"), "class A {}").unwrap();
        std::fs::write(dir.path().join("obj/Generated.cs"), "class G {}").unwrap();
        std::fs::write(dir.path().join("App.csproj"), "<Project />").unwrap();

        let files = ProjectFiles::from_dir(&registry, dir.path()).unwrap();

        let sources: Vec<_> = files.sources.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(sources, vec!["src/A.cs"]);
        assert_eq!(files.manifests.len(), 1);
    }
}

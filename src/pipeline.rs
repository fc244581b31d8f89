//! Ingest pipeline
//!
//! Phase 1 builds the project graph in memory (extract, link, scan
//! manifests). Phase 2 writes it: `ensure_schema` then `ingest`.

use serde::Serialize;
use crate::Result;
use crate::adapter::{AdapterRegistry, default_registry};
use crate::archive::ProjectFiles;
use crate::edge::Edge;
use crate::extract::{Extractor, MergePolicy};
use crate::linker::{ImportLinker, ImportLinkerStats};
use crate::manifest::PackageScanner;
use crate::module::ModuleNode;
use crate::package::PackageRecord;
use crate::storage::{GraphStore, WriteSummary};

/// Resolved graph of one project, ready to write
#[derive(Debug, Default)]
pub struct ProjectGraph {
    pub nodes: Vec<ModuleNode>,
    pub edges: Vec<Edge>,
    pub packages: Vec<PackageRecord>,
    pub files_parsed: usize,
    pub files_skipped: usize,
    /// Ids declared more than once
    pub duplicates: usize,
    pub linker: ImportLinkerStats,
}

/// Upload response: counts submitted to the store, not net-new
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub ok: bool,
    pub project: String,
    pub nodes: usize,
    pub edges: usize,
    pub packages: usize,
}

impl IngestReport {
    pub fn new(project: &str, graph: &ProjectGraph) -> Self {
        Self {
            ok: true,
            project: project.to_string(),
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
            packages: graph.packages.len(),
        }
    }
}

/// Extract, resolve and store a project
pub struct IngestPipeline {
    registry: AdapterRegistry,
    scanner: PackageScanner,
    policy: MergePolicy,
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl IngestPipeline {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self {
            registry,
            scanner: PackageScanner::new(),
            policy: MergePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Phase 1: no store access
    pub fn build(&self, project: &str, files: &ProjectFiles) -> Result<ProjectGraph> {
        let extraction = Extractor::new(&self.registry)
            .with_policy(self.policy)
            .extract(project, &files.sources)?;

        let (edges, linker) = ImportLinker::new(&extraction.nodes).run(&extraction.placeholders);
        let packages = self.scanner.scan(&files.manifests);

        Ok(ProjectGraph {
            nodes: extraction.nodes,
            edges,
            packages,
            files_parsed: extraction.files_parsed,
            files_skipped: extraction.files_skipped,
            duplicates: extraction.duplicates.len(),
            linker,
        })
    }

    /// Phase 2: schema, then per-statement upserts
    pub fn write(&self, store: &dyn GraphStore, graph: &ProjectGraph) -> Result<WriteSummary> {
        store.ensure_schema()?;
        store.ingest(&graph.nodes, &graph.edges, &graph.packages)
    }

    pub fn ingest(&self, store: &dyn GraphStore, project: &str, files: &ProjectFiles) -> Result<IngestReport> {
        tracing::info!(
            "Ingesting project {}: {} sources, {} manifests",
            project,
            files.sources.len(),
            files.manifests.len()
        );

        let graph = self.build(project, files)?;
        let summary = self.write(store, &graph)?;

        tracing::info!(
            "Ingested {}: {} nodes, {} edges ({} skipped), {} packages",
            project, summary.nodes, summary.edges, summary.edges_skipped, summary.packages
        );

        Ok(IngestReport::new(project, &graph))
    }

    /// Ingest an uploaded zip archive
    pub fn ingest_archive(&self, store: &dyn GraphStore, project: &str, bytes: &[u8]) -> Result<IngestReport> {
        let files = ProjectFiles::from_zip(&self.registry, bytes)?;
        self.ingest(store, project, &files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::adapter::{AdapterRegistry, ParsedSource, SourceParser};
    use crate::archive::tests::zip_bytes;
    use crate::storage::{MemoryStore, SqliteStore, MAX_LISTED_EDGES, MAX_LISTED_NODES};

    fn scenario_zip() -> Vec<u8> {
        zip_bytes(&[
            ("src/", ""),
            ("src/X.cs", "using A.B.C;\nnamespace A.B { class X {} }"),
            ("src/Y.cs", "namespace A.B.C { class Y {} }"),
            ("App.csproj", r#"<Project><ItemGroup><PackageReference Include="Dapper" Version="2.1.0" /></ItemGroup></Project>"#),
            ("notes.txt", "ignored"),
        ])
    }

    #[test]
    fn test_scenario_end_to_end() {
        let store = MemoryStore::new();
        let pipeline = IngestPipeline::default();

        let report = pipeline.ingest_archive(&store, "proj", &scenario_zip()).unwrap();
        assert_eq!(report, IngestReport {
            ok: true,
            project: "proj".into(),
            nodes: 2,
            edges: 1,
            packages: 1,
        });

        let mut ids: Vec<String> = store.list_nodes(MAX_LISTED_NODES).unwrap().into_iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["proj:A.B.C.Y", "proj:A.B.X"]);

        let edges = store.list_edges(MAX_LISTED_EDGES).unwrap();
        assert_eq!(edges, vec![Edge::imports("proj:A.B.X", "proj:A.B.C.Y")]);

        let detail = store.module_detail("proj:A.B.X").unwrap().unwrap();
        assert_eq!(detail.outgoing.len(), 1);
        assert_eq!(detail.outgoing[0].target_name, "Y");
        assert_eq!(detail.imports, vec!["Y"]);
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let pipeline = IngestPipeline::default();

        pipeline.ingest_archive(&store, "proj", &scenario_zip()).unwrap();
        let once = store.stats().unwrap();
        pipeline.ingest_archive(&store, "proj", &scenario_zip()).unwrap();
        assert_eq!(store.stats().unwrap(), once);
    }

    #[test]
    fn test_build_reports_skips_and_stats() {
        let registry = default_registry();
        let mut files = ProjectFiles::new();
        files.add(&registry, "A.cs", "using Nowhere;\nnamespace A { class X {} }".into());
        files.add(&registry, "B.cs", "namespace A { class X {} }".into());

        let graph = IngestPipeline::default().build("proj", &files).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.duplicates, 1);
        assert_eq!(graph.files_parsed, 2);
        assert_eq!(graph.linker.unresolved, 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_invalid_archive_fails_before_writing() {
        let store = MemoryStore::new();
        let result = IngestPipeline::default().ingest_archive(&store, "proj", b"not a zip");
        assert!(result.is_err());
        store.ensure_schema().unwrap();
        assert_eq!(store.stats().unwrap().modules, 0);
    }

    struct BrokenGrammar;

    impl SourceParser for BrokenGrammar {
        fn language_name(&self) -> &str { "C#" }
        fn file_extensions(&self) -> &[&str] { &["cs"] }
        fn parse_source(&self, _path: &str, _content: &str) -> Result<ParsedSource> {
            Err(Error::Adapter("Failed to set language".into()))
        }
    }

    #[test]
    fn test_adapter_fault_fails_ingest_without_writing() {
        let mut registry = AdapterRegistry::new();
        registry.register(BrokenGrammar);
        let store = MemoryStore::new();

        let result = IngestPipeline::new(registry).ingest_archive(&store, "proj", &scenario_zip());
        assert!(matches!(result, Err(Error::Adapter(_))));
        store.ensure_schema().unwrap();
        assert_eq!(store.stats().unwrap().modules, 0);
    }
}

//! TraceLens CLI - dependency graphs for C# codebases

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracelens::archive::ProjectFiles;
use tracelens::config::{self, Overrides, Settings, TraceLensConfig};
use tracelens::query::{Explainer, QueryEngine};
use tracelens::server::{self, AppState};
use tracelens::storage::{GraphStore, ModuleDetail, SqliteStore, MAX_LISTED_EDGES, MAX_LISTED_NODES};
use tracelens::ui::{self, theme, Icons, OutputMode, Spinner};
use tracelens::IngestPipeline;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tracelens")]
#[command(version)]
#[command(about = "Dependency graphs for C# codebases")]
#[command(long_about = r#"
TraceLens extracts a module-level dependency graph from C# sources:
  • Top-level types become nodes, `using` directives become IMPORTS edges
  • .csproj package references are annotated with risk and license data
  • The graph is served over HTTP for visualization clients

Example usage:
  tracelens init
  tracelens ingest ./MySolution --project shop
  tracelens search Order
  tracelens serve --port 8080
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file (default: tracelens.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ingest a project directory or .zip archive
    Ingest {
        /// Directory or .zip file to ingest
        path: PathBuf,

        /// Project name (defaults to the directory or archive name)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// List stored modules
    Nodes {
        /// Maximum number of modules
        #[arg(short, long, default_value_t = MAX_LISTED_NODES)]
        limit: usize,
    },

    /// List stored IMPORTS edges
    Edges {
        /// Maximum number of edges
        #[arg(short, long, default_value_t = MAX_LISTED_EDGES)]
        limit: usize,
    },

    /// Search modules by name or namespace
    Search {
        /// Case-insensitive substring
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a module with its dependencies and dependents
    Module {
        /// Module id, e.g. shop:Orders.OrderService
        id: String,
    },

    /// Explain a module's role in the codebase
    Explain {
        /// Module id
        id: String,
    },

    /// Show statistics about the stored graph
    Stats,

    /// Write a starter tracelens.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output = OutputMode::from_flag(cli.json);
    let file_config = config::load_config(cli.config.as_deref())?;
    let overrides = Overrides {
        database: cli.database.clone(),
        port: match &cli.command {
            Commands::Serve { port } => *port,
            _ => None,
        },
    };
    let settings = Settings::resolve(file_config.as_ref(), &overrides)?;

    match cli.command {
        Commands::Serve { .. } => {
            let store = open_store(&settings.database)?;
            let explainer = Explainer::from_settings(&settings.llm)?;
            tracing::info!("Serving {} on port {}", settings.database.display(), settings.port);
            server::start_server(settings.port, AppState::new(Arc::new(store), explainer)).await?;
        }

        Commands::Ingest { path, project } => {
            let project = project.unwrap_or_else(|| project_name(&path));
            let store = open_store(&settings.database)?;
            run_ingest(&store, &path, &project, output, &settings.database)?;
        }

        Commands::Nodes { limit } => {
            let store = open_store(&settings.database)?;
            let nodes = QueryEngine::new(&store).nodes(limit)?;
            if output.is_json() {
                ui::emit_json(&nodes)?;
            } else if nodes.is_empty() {
                ui::warn("No modules stored. Run `tracelens ingest` first.");
            } else {
                println!("{}", ui::nodes_table(&nodes));
            }
        }

        Commands::Edges { limit } => {
            let store = open_store(&settings.database)?;
            let edges = QueryEngine::new(&store).edges(limit)?;
            if output.is_json() {
                ui::emit_json(&edges)?;
            } else if edges.is_empty() {
                ui::warn("No edges stored.");
            } else {
                println!("{}", ui::edges_table(&edges));
            }
        }

        Commands::Search { query, limit } => {
            let store = open_store(&settings.database)?;
            let hits = QueryEngine::new(&store).search(&query, limit)?;
            if output.is_json() {
                ui::emit_json(&hits)?;
            } else {
                ui::header(&format!("Search: {}", query));
                if hits.is_empty() {
                    ui::warn("No matching modules.");
                }
                for hit in &hits {
                    println!(
                        "  {} {} {}",
                        Icons::SEARCH,
                        hit.id.style(theme().accent.clone()),
                        ui::dim(&format!("({})", hit.kind))
                    );
                }
            }
        }

        Commands::Module { id } => {
            let store = open_store(&settings.database)?;
            let Some(detail) = QueryEngine::new(&store).module_detail(&id)? else {
                anyhow::bail!("Module not found: {}", id);
            };
            if output.is_json() {
                ui::emit_json(&detail)?;
            } else {
                print_detail(&detail);
            }
        }

        Commands::Explain { id } => {
            let store = open_store(&settings.database)?;
            let explainer = Explainer::from_settings(&settings.llm)?;
            let spinner = Spinner::new(&format!("Explaining {}", id));
            let explanation = QueryEngine::new(&store).explain(&id, &explainer).await?;
            spinner.finish_with_message("Done");
            let Some(explanation) = explanation else {
                anyhow::bail!("Module not found: {}", id);
            };
            if output.is_json() {
                ui::emit_json(&explanation)?;
            } else {
                ui::header(&format!("{} {}", Icons::BRAIN, explanation.id));
                println!("{}", explanation.explanation);
            }
        }

        Commands::Stats => {
            let store = open_store(&settings.database)?;
            let stats = QueryEngine::new(&store).stats()?;
            if output.is_json() {
                ui::emit_json(&stats)?;
            } else {
                ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
                ui::section(&format!("{} Graph", Icons::STATS));
                println!("{}", ui::stats_table(&stats));
            }
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let starter = TraceLensConfig::starter();
            config::write_config(&path, &starter, force)?;

            let database = starter.database.map(PathBuf::from).unwrap_or_else(config::default_database_path);
            config::ensure_db_dir(&database)?;

            if output.is_json() {
                ui::emit_json(&serde_json::json!({
                    "config": path.display().to_string(),
                    "database": database.display().to_string(),
                }))?;
            } else {
                ui::success(&format!("Wrote {}", path.display()));
                ui::info("Database", &database.display().to_string());
                ui::info("LLM", "set LLM_API_KEY to enable explanations");
            }
        }
    }

    Ok(())
}

/// Open the SQLite store, creating its directory and schema
fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    let store = SqliteStore::open(database)?;
    store.ensure_schema()?;
    Ok(store)
}

fn project_name(path: &Path) -> String {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

fn run_ingest(
    store: &dyn GraphStore,
    path: &Path,
    project: &str,
    output: OutputMode,
    database: &Path,
) -> anyhow::Result<()> {
    let pipeline = IngestPipeline::default();

    if !output.is_json() {
        ui::header(&format!("Ingesting project: {}", project));
        ui::status(Icons::FILE, "Path", &path.display().to_string());
        ui::status(Icons::DATABASE, "Database", &database.display().to_string());
    }

    let spinner = Spinner::new("Reading project files");
    let files = ProjectFiles::load(pipeline.registry(), path)?;

    spinner.set_message(&format!("Parsing {} source files", files.sources.len()));
    let graph = pipeline.build(project, &files)?;

    spinner.set_message("Writing graph");
    let summary = pipeline.write(store, &graph)?;
    let report = tracelens::IngestReport::new(project, &graph);

    if output.is_json() {
        spinner.finish_with_message("Done");
        return ui::emit_json(&report);
    }

    spinner.finish_with_summary(report.nodes, report.edges, report.packages);
    ui::section("Summary");
    ui::summary_row("Files parsed:", &graph.files_parsed.to_string());
    ui::summary_row("Files skipped:", &(graph.files_skipped + files.skipped).to_string());
    ui::summary_row("Duplicate ids:", &graph.duplicates.to_string());
    ui::summary_row("Edges skipped:", &summary.edges_skipped.to_string());
    println!("\n{}", graph.linker);

    let high_risk: Vec<_> = graph.packages.iter().filter(|p| p.is_high_risk()).collect();
    for package in high_risk {
        ui::warn(&format!("{} {}: {}", package.name, package.version, package.risk));
    }
    Ok(())
}

fn print_detail(detail: &ModuleDetail) {
    ui::header(&format!("{} {}", detail.kind, detail.id.style(theme().accent.clone())));
    ui::info("Namespace", &detail.namespace);
    ui::info("File", &detail.file_path);

    ui::section(&format!("Outgoing ({})", detail.outgoing.len()));
    for rel in &detail.outgoing {
        println!("  {} {}", Icons::RIGHT, rel.node_id);
    }

    ui::section(&format!("Incoming ({})", detail.incoming.len()));
    for rel in &detail.incoming {
        println!("  {} {}", Icons::LEFT, rel.node_id);
    }

    if !detail.package_risks.is_empty() {
        ui::section("Packages");
        println!("{}", ui::packages_table(&detail.package_risks));
        for package in detail.package_risks.iter().filter(|p| p.is_high_risk()) {
            println!(
                "  {} {}",
                Icons::PACKAGE,
                format!("{}: {}", package.name, package.risk).style(theme().risk(&package.risk).clone())
            );
        }
    }
}

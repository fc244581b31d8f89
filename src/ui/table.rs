use tabled::{settings::Style, Table, Tabled};
use crate::edge::Edge;
use crate::module::ModuleNode;
use crate::package::PackageRecord;
use crate::storage::StoreStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct NodeRow<'a> {
    #[tabled(rename = "Id")]
    id: &'a str,
    #[tabled(rename = "Kind")]
    kind: &'a str,
    #[tabled(rename = "File")]
    file: &'a str,
}

#[derive(Tabled)]
struct EdgeRow<'a> {
    #[tabled(rename = "Source")]
    source: &'a str,
    #[tabled(rename = "Target")]
    target: &'a str,
}

#[derive(Tabled)]
struct PackageRow<'a> {
    #[tabled(rename = "Package")]
    name: &'a str,
    #[tabled(rename = "Version")]
    version: &'a str,
    #[tabled(rename = "Risk")]
    risk: &'a str,
    #[tabled(rename = "License")]
    license: &'a str,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &StoreStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Modules", &stats.modules.to_string());
    builder.add_row("Edges", &stats.edges.to_string());
    builder.add_row("Packages", &stats.packages.to_string());
    builder.build()
}

pub fn nodes_table(nodes: &[ModuleNode]) -> String {
    let rows = nodes.iter().map(|n| NodeRow {
        id: &n.id,
        kind: n.kind.as_str(),
        file: &n.file_path,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn edges_table(edges: &[Edge]) -> String {
    let rows = edges.iter().map(|e| EdgeRow {
        source: &e.source,
        target: &e.target,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn packages_table(packages: &[PackageRecord]) -> String {
    let rows = packages.iter().map(|p| PackageRow {
        name: &p.name,
        version: &p.version,
        risk: &p.risk,
        license: p.license.as_deref().unwrap_or("-"),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

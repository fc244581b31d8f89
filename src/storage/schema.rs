//! Database schema definitions

/// SQL to create the modules table
pub const CREATE_MODULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS modules (
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    namespace TEXT NOT NULL,
    kind TEXT NOT NULL,
    file_path TEXT NOT NULL
)
"#;

/// SQL to create the edges table
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edges (
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    kind TEXT NOT NULL
)
"#;

/// SQL to create the packages table
pub const CREATE_PACKAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS packages (
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    risk TEXT NOT NULL,
    license TEXT
)
"#;

/// Uniqueness constraints; upserts target these
pub const CREATE_CONSTRAINTS: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_modules_id ON modules(id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_packages_name ON packages(name)",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_edges_tuple ON edges(source_id, target_id, kind)",
];

/// SQL to create lookup indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id)",
    "CREATE INDEX IF NOT EXISTS idx_modules_namespace ON modules(namespace)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_MODULES_TABLE,
        CREATE_EDGES_TABLE,
        CREATE_PACKAGES_TABLE,
    ];
    stmts.extend(CREATE_CONSTRAINTS.iter().copied());
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, params};
use crate::{Error, Result};
use crate::edge::{Edge, EdgeKind};
use crate::module::{ModuleKind, ModuleNode};
use crate::package::PackageRecord;
use super::{
    GraphStore, StoreStats, schema,
    MAX_LISTED_EDGES, MAX_LISTED_NODES, MAX_LISTED_PACKAGES, MAX_SEARCH_RESULTS,
};

const NODE_COLUMNS: &str = "id, name, namespace, kind, file_path";

/// SQLite-backed storage for the module graph
///
/// Opening a database does not create the schema; call
/// [`GraphStore::ensure_schema`] first.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    fn query_nodes(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ModuleNode>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let nodes = stmt
            .query_map(params, row_to_node)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    fn count(&self, table: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl GraphStore for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn upsert_node(&self, node: &ModuleNode) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT INTO modules (id, name, namespace, kind, file_path)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                namespace = excluded.namespace,
                kind = excluded.kind,
                file_path = excluded.file_path
            "#,
            params![node.id, node.name, node.namespace, node.kind.as_str(), node.file_path],
        )?;
        Ok(())
    }

    fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO edges (source_id, target_id, kind)
            SELECT ?1, ?2, ?3
            WHERE EXISTS (SELECT 1 FROM modules WHERE id = ?1)
              AND EXISTS (SELECT 1 FROM modules WHERE id = ?2)
            "#,
            params![edge.source, edge.target, edge.kind.as_str()],
        )?;
        if inserted > 0 {
            return Ok(true);
        }

        // Nothing inserted: either already present or an endpoint is missing
        let present: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM edges WHERE source_id = ?1 AND target_id = ?2 AND kind = ?3)",
            params![edge.source, edge.target, edge.kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(present)
    }

    fn upsert_package(&self, package: &PackageRecord) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT INTO packages (name, version, risk, license)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                version = excluded.version,
                risk = excluded.risk,
                license = excluded.license
            "#,
            params![package.name, package.version, package.risk, package.license],
        )?;
        Ok(())
    }

    fn get_node(&self, id: &str) -> Result<Option<ModuleNode>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM modules WHERE id = ?1", NODE_COLUMNS),
            [id],
            row_to_node,
        )
        .optional()
        .map_err(Into::into)
    }

    fn list_nodes(&self, limit: usize) -> Result<Vec<ModuleNode>> {
        let limit = limit.min(MAX_LISTED_NODES) as i64;
        self.query_nodes(
            &format!("SELECT {} FROM modules ORDER BY rowid LIMIT ?1", NODE_COLUMNS),
            [limit],
        )
    }

    fn list_edges(&self, limit: usize) -> Result<Vec<Edge>> {
        let limit = limit.min(MAX_LISTED_EDGES) as i64;
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT source_id, target_id, kind FROM edges ORDER BY rowid LIMIT ?1")?;
        let edges = stmt
            .query_map([limit], row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<ModuleNode>> {
        let limit = limit.min(MAX_SEARCH_RESULTS) as i64;
        // instr() keeps the match literal, unlike LIKE
        self.query_nodes(
            &format!(
                "SELECT {} FROM modules \
                 WHERE instr(unicode_lower(name), ?1) > 0 OR instr(unicode_lower(namespace), ?1) > 0 \
                 ORDER BY rowid LIMIT ?2",
                NODE_COLUMNS
            ),
            params![query.to_lowercase(), limit],
        )
    }

    fn outgoing(&self, id: &str) -> Result<Vec<ModuleNode>> {
        self.query_nodes(
            r#"
            SELECT m.id, m.name, m.namespace, m.kind, m.file_path
            FROM edges e JOIN modules m ON m.id = e.target_id
            WHERE e.source_id = ?1 AND e.kind = ?2
            ORDER BY e.rowid
            "#,
            params![id, EdgeKind::Imports.as_str()],
        )
    }

    fn incoming(&self, id: &str) -> Result<Vec<ModuleNode>> {
        self.query_nodes(
            r#"
            SELECT m.id, m.name, m.namespace, m.kind, m.file_path
            FROM edges e JOIN modules m ON m.id = e.source_id
            WHERE e.target_id = ?1 AND e.kind = ?2
            ORDER BY e.rowid
            "#,
            params![id, EdgeKind::Imports.as_str()],
        )
    }

    fn list_packages(&self, limit: usize) -> Result<Vec<PackageRecord>> {
        let limit = limit.min(MAX_LISTED_PACKAGES) as i64;
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name, version, risk, license FROM packages ORDER BY rowid LIMIT ?1")?;
        let packages = stmt
            .query_map([limit], |row| {
                Ok(PackageRecord {
                    name: row.get(0)?,
                    version: row.get(1)?,
                    risk: row.get(2)?,
                    license: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(packages)
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            modules: self.count("modules")?,
            edges: self.count("edges")?,
            packages: self.count("packages")?,
        })
    }
}

/// SQLite's built-in lower() folds ASCII only; identifiers are Unicode
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
    )?;
    Ok(())
}

/// Helper to convert a row to a ModuleNode
fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<ModuleNode> {
    let kind_str: String = row.get(3)?;
    let kind: ModuleKind = kind_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ModuleNode {
        id: row.get(0)?,
        name: row.get(1)?,
        namespace: row.get(2)?,
        kind,
        file_path: row.get(4)?,
    })
}

fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<Edge> {
    let kind_str: String = row.get(2)?;
    let kind: EdgeKind = kind_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Edge {
        source: row.get(0)?,
        target: row.get(1)?,
        kind,
    })
}

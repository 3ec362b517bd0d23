//! LanceDB connection and housekeeping helpers.

use lancedb::{connect, Connection};
use std::sync::Arc;

use analyst_core::{Error, Result};

pub(crate) fn store_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> Error {
    move |e| Error::Store(format!("{context}: {e}"))
}

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(store_err("Failed to connect to LanceDB"))
}

/// Create `name` with `schema` unless it already exists. Returns true when created.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(store_err("Failed to list tables"))?;
    if names.iter().any(|n| n == name) {
        return Ok(false);
    }
    conn.create_empty_table(name, schema)
        .execute()
        .await
        .map_err(store_err("Failed to create table"))?;
    Ok(true)
}

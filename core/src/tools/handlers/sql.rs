// SQLite Tools
// `sql_exec` and `sql_query` against a database file inside the sandbox

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SqlArgs {
  /// SQLite file relative to the working directory, created when missing
  pub database: String,
  pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecSummary {
  pub last_insert_id: i64,
  pub rows_affected: u64,
}

pub struct SqlExecHandler {
  ctx: Arc<ToolContext>,
}

impl SqlExecHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

pub struct SqlQueryHandler {
  ctx: Arc<ToolContext>,
}

impl SqlQueryHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

fn sql_error(action: &str, err: sqlx::Error) -> FunctionCallError {
  FunctionCallError::Execution(format!("{action}: {err}"))
}

async fn close(conn: SqliteConnection) {
  if let Err(err) = conn.close().await {
    debug!("failed to close database: {err}");
  }
}

/// One connection per call; the file handle is gone once the call returns.
async fn open(path: &Path) -> Result<SqliteConnection, FunctionCallError> {
  SqliteConnectOptions::new()
    .filename(path)
    .create_if_missing(true)
    .connect()
    .await
    .map_err(|e| sql_error("open database", e))
}

#[async_trait]
impl TypedToolHandler for SqlExecHandler {
  type Args = SqlArgs;
  type Output = ExecSummary;

  async fn call(&self, args: SqlArgs) -> Result<ExecSummary, FunctionCallError> {
    let path = self.ctx.sandbox.resolve(&args.database)?;
    let mut conn = open(&path).await?;

    let outcome = sqlx::query::<Sqlite>(&args.query).execute(&mut conn).await;
    close(conn).await;
    let outcome = outcome.map_err(|e| sql_error("execute query", e))?;

    Ok(ExecSummary {
      last_insert_id: outcome.last_insert_rowid(),
      rows_affected: outcome.rows_affected(),
    })
  }
}

#[async_trait]
impl TypedToolHandler for SqlQueryHandler {
  type Args = SqlArgs;
  type Output = Vec<Map<String, Value>>;

  async fn call(&self, args: SqlArgs) -> Result<Vec<Map<String, Value>>, FunctionCallError> {
    let path = self.ctx.sandbox.resolve(&args.database)?;
    let mut conn = open(&path).await?;

    let rows = sqlx::query::<Sqlite>(&args.query).fetch_all(&mut conn).await;
    close(conn).await;
    let rows = rows.map_err(|e| sql_error("execute query", e))?;

    rows
      .iter()
      .map(row_to_object)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| sql_error("scan row", e))
  }
}

/// Column name to JSON value, decoded by the value's storage class.
fn row_to_object(row: &SqliteRow) -> Result<Map<String, Value>, sqlx::Error> {
  let mut object = Map::new();
  for column in row.columns() {
    let index = column.ordinal();
    let (is_null, storage) = {
      let raw = row.try_get_raw(index)?;
      (raw.is_null(), raw.type_info().name().to_string())
    };

    let value = if is_null {
      Value::Null
    } else {
      match storage.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(index)?)
          .map(Value::Number)
          .unwrap_or(Value::Null),
        "BLOB" => Value::String(BASE64_STANDARD.encode(row.try_get::<Vec<u8>, _>(index)?)),
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
      }
    };
    object.insert(column.name().to_string(), value);
  }
  Ok(object)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;
  use crate::tools::handlers::test_context;

  fn args(query: &str) -> SqlArgs {
    SqlArgs {
      database: "data/app.db".to_string(),
      query: query.to_string(),
    }
  }

  #[tokio::test]
  async fn exec_then_query_round_trips_rows() {
    let (dir, ctx) = test_context();
    std::fs::create_dir(dir.path().join("data")).expect("mkdir");
    let exec = SqlExecHandler::new(Arc::clone(&ctx));
    let query = SqlQueryHandler::new(ctx);

    exec
      .call(args(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, title TEXT, score REAL, raw BLOB)",
      ))
      .await
      .expect("create table");
    let inserted = exec
      .call(args(
        "INSERT INTO notes (title, score, raw) VALUES ('first', 1.5, x'6869')",
      ))
      .await
      .expect("insert");
    assert_eq!(
      inserted,
      ExecSummary {
        last_insert_id: 1,
        rows_affected: 1,
      }
    );
    exec
      .call(args("INSERT INTO notes (title) VALUES ('second')"))
      .await
      .expect("insert");

    let rows = query
      .call(args("SELECT id, title, score, raw FROM notes ORDER BY id"))
      .await
      .expect("select");

    assert_eq!(
      serde_json::to_value(rows).expect("encode"),
      json!([
        { "id": 1, "title": "first", "score": 1.5, "raw": "aGk=" },
        { "id": 2, "title": "second", "score": null, "raw": null }
      ])
    );
  }

  #[tokio::test]
  async fn bad_sql_is_a_tool_error() {
    let (_dir, ctx) = test_context();
    let err = SqlQueryHandler::new(ctx)
      .call(SqlArgs {
        database: "x.db".to_string(),
        query: "SELEC nonsense".to_string(),
      })
      .await
      .expect_err("syntax error");
    assert!(err.to_string().starts_with("execute query"));
  }

  #[tokio::test]
  async fn database_path_is_sandboxed() {
    let (_dir, ctx) = test_context();
    let err = SqlExecHandler::new(ctx)
      .call(SqlArgs {
        database: "/tmp/outside.db".to_string(),
        query: "SELECT 1".to_string(),
      })
      .await
      .expect_err("absolute");
    assert!(matches!(err, FunctionCallError::Sandbox(_)));
  }
}

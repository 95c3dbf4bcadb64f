//! Query gateway: translates an operation descriptor into parameterized
//! SQL and executes it. Identifiers are admitted through the registry
//! before any statement text exists; values are always bound, never
//! interpolated. Connections come from the shared pool and are released on
//! every exit path (transactions roll back on drop), and every call is
//! bounded by the configured query timeout.

use std::time::Duration;

use futures::TryStreamExt;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::{Column, Either, MySql, Row};

use crate::database::manager::DatabaseManager;

use super::descriptor::{GatewayOutcome, OperationDescriptor};
use super::error::GatewayError;
use super::tables::{validate_column, TableRegistry};

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

pub struct QueryGateway {
    tables: TableRegistry,
}

impl QueryGateway {
    pub fn new(tables: TableRegistry) -> Self {
        Self { tables }
    }

    /// Execute one descriptor. The whole database phase runs under the
    /// configured timeout so a stalled connection cannot pin a worker.
    pub async fn execute(
        &self,
        descriptor: OperationDescriptor,
    ) -> Result<GatewayOutcome, GatewayError> {
        let timeout = Duration::from_secs(crate::config::config().database.query_timeout_secs);
        let work = async {
            match descriptor {
                OperationDescriptor::Insert { table, columns } => {
                    self.run_insert(&table, &columns).await
                }
                OperationDescriptor::ConditionalInsert {
                    table,
                    columns,
                    predicate,
                } => self.run_conditional_insert(&table, &columns, &predicate).await,
                OperationDescriptor::Select { table, predicate } => {
                    self.run_select(&table, &predicate).await
                }
                OperationDescriptor::Delete {
                    table,
                    column,
                    value,
                } => self.run_delete(&table, &column, &value).await,
                OperationDescriptor::ProcedureCall { procedure, args } => {
                    self.run_procedure(&procedure, &args).await
                }
            }
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| GatewayError::Timeout)?
    }

    async fn run_insert(
        &self,
        table: &str,
        columns: &[(String, Value)],
    ) -> Result<GatewayOutcome, GatewayError> {
        let table = self.tables.resolve_table(table)?;
        validate_columns(columns)?;

        let sql = insert_sql(table, columns);
        tracing::debug!(%sql, "gateway insert");

        let pool = DatabaseManager::pool().await?;
        let mut query = sqlx::query(&sql);
        for (_, value) in columns {
            query = bind_value(query, value);
        }
        let result = query.execute(&pool).await?;
        Ok(GatewayOutcome::Inserted {
            id: result.last_insert_id(),
        })
    }

    /// Check-then-act dedup inside one transaction. A racing identical
    /// insert that lands first shows up as a unique violation, which is
    /// translated back into the `Exists` outcome instead of an error.
    async fn run_conditional_insert(
        &self,
        table: &str,
        columns: &[(String, Value)],
        predicate: &[(String, Value)],
    ) -> Result<GatewayOutcome, GatewayError> {
        let table = self.tables.resolve_table(table)?;
        validate_columns(columns)?;
        validate_columns(predicate)?;

        let select = select_id_sql(table, predicate);
        let insert = insert_sql(table, columns);

        let pool = DatabaseManager::pool().await?;
        let mut tx = pool.begin().await?;

        let mut query = sqlx::query(&select);
        for (_, value) in predicate {
            query = bind_value(query, value);
        }
        if let Some(row) = query.fetch_optional(&mut *tx).await? {
            tx.commit().await?;
            return Ok(GatewayOutcome::Exists { id: row_id(&row)? });
        }

        let mut query = sqlx::query(&insert);
        for (_, value) in columns {
            query = bind_value(query, value);
        }
        match query.execute(&mut *tx).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(GatewayOutcome::Inserted {
                    id: result.last_insert_id(),
                })
            }
            Err(e) if is_unique_violation(&e) => {
                // The racing insert won; roll back and surface its row
                drop(tx);
                let mut query = sqlx::query(&select);
                for (_, value) in predicate {
                    query = bind_value(query, value);
                }
                let row = query.fetch_one(&pool).await?;
                Ok(GatewayOutcome::Exists { id: row_id(&row)? })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn run_select(
        &self,
        table: &str,
        predicate: &[(String, Value)],
    ) -> Result<GatewayOutcome, GatewayError> {
        let table = self.tables.resolve_table(table)?;
        validate_columns(predicate)?;

        let sql = select_sql(table, predicate);
        tracing::debug!(%sql, "gateway select");

        let pool = DatabaseManager::pool().await?;
        let mut query = sqlx::query(&sql);
        for (_, value) in predicate {
            query = bind_value(query, value);
        }
        let rows = query.fetch_all(&pool).await?;
        Ok(GatewayOutcome::Rows(
            rows.iter().map(row_to_map).collect(),
        ))
    }

    async fn run_delete(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<GatewayOutcome, GatewayError> {
        let table = self.tables.resolve_table(table)?;
        validate_column(column)?;

        let sql = delete_sql(table, column);
        tracing::debug!(%sql, "gateway delete");

        let pool = DatabaseManager::pool().await?;
        let result = bind_value(sqlx::query(&sql), value).execute(&pool).await?;
        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound(format!(
                "no rows in {} matched the predicate",
                table
            )));
        }
        Ok(GatewayOutcome::Deleted {
            affected: result.rows_affected(),
        })
    }

    /// CALL a stored procedure and drain every result set it yields,
    /// flattened into one ordered row sequence. Leaving result sets
    /// undrained would poison the connection for its next user.
    async fn run_procedure(
        &self,
        procedure: &str,
        args: &[Value],
    ) -> Result<GatewayOutcome, GatewayError> {
        let procedure = self.tables.resolve_procedure(procedure)?;

        let sql = call_sql(procedure, args.len());
        tracing::debug!(%sql, "gateway procedure call");

        let pool = DatabaseManager::pool().await?;
        let mut conn = pool.acquire().await?;

        let mut query = sqlx::query(&sql);
        for arg in args {
            query = bind_value(query, arg);
        }

        let mut rows = Vec::new();
        let mut stream = query.fetch_many(&mut *conn);
        while let Some(item) = stream.try_next().await? {
            if let Either::Right(row) = item {
                rows.push(row_to_map(&row));
            }
        }
        Ok(GatewayOutcome::Rows(rows))
    }
}

fn validate_columns(columns: &[(String, Value)]) -> Result<(), GatewayError> {
    for (name, _) in columns {
        validate_column(name)?;
    }
    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// Identifiers reaching these builders have already passed the registry /
// column validation, so backtick quoting cannot be escaped from.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name)
}

fn where_clause(predicate: &[(String, Value)]) -> String {
    predicate
        .iter()
        .map(|(column, _)| format!("{} = ?", quote_ident(column)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn insert_sql(table: &str, columns: &[(String, Value)]) -> String {
    let cols = columns
        .iter()
        .map(|(column, _)| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        cols,
        placeholders
    )
}

fn select_sql(table: &str, predicate: &[(String, Value)]) -> String {
    if predicate.is_empty() {
        format!("SELECT * FROM {}", quote_ident(table))
    } else {
        format!(
            "SELECT * FROM {} WHERE {}",
            quote_ident(table),
            where_clause(predicate)
        )
    }
}

fn select_id_sql(table: &str, predicate: &[(String, Value)]) -> String {
    format!(
        "SELECT `id` FROM {} WHERE {}",
        quote_ident(table),
        where_clause(predicate)
    )
}

fn delete_sql(table: &str, column: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(column)
    )
}

fn call_sql(procedure: &str, arg_count: usize) -> String {
    let placeholders = vec!["?"; arg_count].join(", ");
    format!("CALL {}({})", quote_ident(procedure), placeholders)
}

fn bind_value<'q>(q: MySqlQuery<'q>, v: &'q Value) -> MySqlQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                q.bind(u)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // JSON columns take the value as-is
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

/// The dedup existence check selects only the id column.
fn row_id(row: &MySqlRow) -> Result<u64, GatewayError> {
    if let Ok(id) = row.try_get::<u64, _>(0) {
        return Ok(id);
    }
    let id: i64 = row.try_get(0)?;
    Ok(id as u64)
}

/// Convert a row to an ordered column-name -> JSON value map. Typed
/// fallbacks cover the column types the inventory schema uses; anything
/// undecodable becomes null rather than failing the whole row.
fn row_to_map(row: &MySqlRow) -> Map<String, Value> {
    let mut map = Map::new();

    for i in 0..row.len() {
        let column_name = row.column(i).name();
        let value: Result<Option<Value>, _> = row.try_get(i);

        let json_value = match value {
            Ok(Some(v)) => v,
            Ok(None) => Value::Null,
            Err(_) => {
                // Try concrete types if direct JSON extraction fails
                if let Ok(s) = row.try_get::<String, _>(i) {
                    Value::String(s)
                } else if let Ok(i64_val) = row.try_get::<i64, _>(i) {
                    Value::Number(i64_val.into())
                } else if let Ok(u64_val) = row.try_get::<u64, _>(i) {
                    Value::Number(u64_val.into())
                } else if let Ok(f64_val) = row.try_get::<f64, _>(i) {
                    Value::Number(
                        serde_json::Number::from_f64(f64_val).unwrap_or_else(|| 0.into()),
                    )
                } else if let Ok(bool_val) = row.try_get::<bool, _>(i) {
                    Value::Bool(bool_val)
                } else if let Ok(ts) = row.try_get::<chrono::NaiveDateTime, _>(i) {
                    Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string())
                } else if let Ok(ts) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(i) {
                    Value::String(ts.to_rfc3339())
                } else if let Ok(d) = row.try_get::<chrono::NaiveDate, _>(i) {
                    Value::String(d.to_string())
                } else {
                    Value::Null
                }
            }
        };

        map.insert(column_name.to_string(), json_value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cols(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn insert_sql_binds_every_column() {
        let sql = insert_sql(
            "servers",
            &cols(&[
                ("server_name", json!("db01")),
                ("server_ip", json!("10.0.0.1")),
                ("sgbd_type", json!("mysql")),
            ]),
        );
        assert_eq!(
            sql,
            "INSERT INTO `servers` (`server_name`, `server_ip`, `sgbd_type`) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn select_sql_with_and_without_predicate() {
        assert_eq!(select_sql("servers", &[]), "SELECT * FROM `servers`");
        assert_eq!(
            select_sql("servers", &cols(&[("server_name", json!("db01"))])),
            "SELECT * FROM `servers` WHERE `server_name` = ?"
        );
    }

    #[test]
    fn select_id_sql_joins_predicates_with_and() {
        let sql = select_id_sql(
            "db_servers",
            &cols(&[
                ("id_ref_server", json!(7)),
                ("db_name", json!("inventory")),
            ]),
        );
        assert_eq!(
            sql,
            "SELECT `id` FROM `db_servers` WHERE `id_ref_server` = ? AND `db_name` = ?"
        );
    }

    #[test]
    fn delete_sql_targets_single_column() {
        assert_eq!(
            delete_sql("servers", "server_ip"),
            "DELETE FROM `servers` WHERE `server_ip` = ?"
        );
    }

    #[test]
    fn call_sql_places_positional_args() {
        assert_eq!(call_sql("feed_dbai", 0), "CALL `feed_dbai`()");
        assert_eq!(call_sql("mysql_sniffer", 2), "CALL `mysql_sniffer`(?, ?)");
    }

    #[tokio::test]
    async fn execute_rejects_unknown_table_before_touching_the_pool() {
        // No DATABASE_URL is configured in unit tests; reaching the pool
        // would error differently than the identifier rejection asserted here
        let gateway = QueryGateway::new(TableRegistry::with_lists(&["servers"], &[]));
        let err = gateway
            .execute(OperationDescriptor::select("users; --", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidTable(_)));
    }

    #[tokio::test]
    async fn execute_rejects_bad_predicate_column() {
        let gateway = QueryGateway::new(TableRegistry::with_lists(&["servers"], &[]));
        let err = gateway
            .execute(OperationDescriptor::select(
                "servers",
                cols(&[("ip = '' OR 1=1", json!("x"))]),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidColumn(_)));
    }

    #[tokio::test]
    async fn execute_rejects_unlisted_procedure() {
        let gateway = QueryGateway::new(TableRegistry::with_lists(&[], &["feed_dbai"]));
        let err = gateway
            .execute(OperationDescriptor::procedure_call("drop_everything", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidProcedure(_)));
    }
}

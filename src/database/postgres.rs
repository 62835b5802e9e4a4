use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::store::{Record, RecordStore, StoreError, StoreResult, Table};
use crate::config::DatabaseConfig;

/// [`RecordStore`] backed by a Postgres pool.
///
/// Rows are serialized server-side with `row_to_json`, so the handlers see the
/// same JSON shapes the database-as-a-service REST layer would hand back.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config.url.as_deref().ok_or_else(|| {
            StoreError::new(StoreError::CONNECTION_FAILURE, "DATABASE_URL is not configured")
        })?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!("Connected record store pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, sql: &str, params: Vec<Value>, table: Table) -> StoreResult<Record> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(table))?;
        decode_row(&row)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                StoreError::new(StoreError::NOT_FOUND, "no rows returned")
            }
            sqlx::Error::Database(db_err) => {
                let code = db_err
                    .code()
                    .map(|code| code.into_owned())
                    .unwrap_or_else(|| "XX000".to_string());
                let mut store_err = StoreError::new(code, db_err.message());
                if let Some(constraint) = db_err.constraint() {
                    store_err = store_err.with_constraint(constraint);
                }
                store_err
            }
            other => StoreError::new(StoreError::CONNECTION_FAILURE, other.to_string()),
        }
    }
}

/// `SELECT` producing the API projection of `table`, reading rows from
/// `source` (the table itself or a CTE holding freshly written rows).
fn projection(table: Table, source: &str) -> String {
    match table {
        Table::OutletProducts => format!(
            r#"SELECT r.id, r.outlet_id, r.product_id, r.price, r.stock_status, r.is_available,
                      r.created_at, r.updated_at,
                      CASE WHEN p.id IS NULL THEN NULL
                           ELSE json_build_object('name', p.name, 'unit', p.unit) END AS products,
                      CASE WHEN o.id IS NULL THEN NULL
                           ELSE json_build_object('name', o.name) END AS outlets
               FROM {source} r
               LEFT JOIN "products" p ON p.id = r.product_id
               LEFT JOIN "outlets" o ON o.id = r.outlet_id"#
        ),
        _ => format!("SELECT r.* FROM {source} r"),
    }
}

fn quoted(table: Table) -> String {
    format!("\"{}\"", table.name())
}

pub(crate) fn list_sql(table: Table) -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM ({}) t ORDER BY t.created_at DESC",
        projection(table, &quoted(table))
    )
}

/// Ids are compared as text so a malformed id is simply "not found".
pub(crate) fn get_sql(table: Table) -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM ({} WHERE r.id::text = $1) t",
        projection(table, &quoted(table))
    )
}

pub(crate) fn insert_sql(table: Table, columns: &[(&str, &str)]) -> String {
    let names: Vec<String> = columns.iter().map(|(name, _)| format!("\"{name}\"")).collect();
    let values: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (_, sql_type))| format!("${}::{}", i + 1, sql_type))
        .collect();
    format!(
        "WITH written AS (INSERT INTO {} ({}) VALUES ({}) RETURNING *) \
         SELECT row_to_json(t) AS row FROM ({}) t",
        quoted(table),
        names.join(", "),
        values.join(", "),
        projection(table, "written")
    )
}

pub(crate) fn update_sql(table: Table, columns: &[(&str, &str)]) -> String {
    let mut assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (name, sql_type))| format!("\"{name}\" = ${}::{}", i + 1, sql_type))
        .collect();
    if table.tracks_updates() {
        assignments.push("\"updated_at\" = now()".to_string());
    }
    format!(
        "WITH written AS (UPDATE {} SET {} WHERE id::text = ${} RETURNING *) \
         SELECT row_to_json(t) AS row FROM ({}) t",
        quoted(table),
        assignments.join(", "),
        columns.len() + 1,
        projection(table, "written")
    )
}

pub(crate) fn delete_sql(table: Table) -> String {
    format!("DELETE FROM {} WHERE id::text = $1", quoted(table))
}

/// Splits a payload into `(column, sql_type)` pairs and bind values, rejecting
/// columns the table does not expose.
fn typed_columns(table: Table, payload: Record) -> StoreResult<(Vec<(String, &'static str)>, Vec<Value>)> {
    let mut columns = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len());
    for (column, value) in payload {
        let sql_type = table
            .column_type(&column)
            .ok_or_else(|| StoreError::undefined_column(table, &column))?;
        columns.push((column, sql_type));
        values.push(value);
    }
    Ok((columns, values))
}

fn borrowed<'a>(columns: &'a [(String, &'static str)]) -> Vec<(&'a str, &'a str)> {
    columns.iter().map(|(name, sql_type)| (name.as_str(), *sql_type)).collect()
}

fn decode_row(row: &sqlx::postgres::PgRow) -> StoreResult<Record> {
    let value: Value = row.try_get("row")?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::new(
            "XX000",
            format!("unexpected row format: {other}"),
        )),
    }
}

fn bind_value(
    query: sqlx::query::Query<'_, sqlx::Postgres, PgArguments>,
    value: Value,
) -> sqlx::query::Query<'_, sqlx::Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s),
        json @ (Value::Array(_) | Value::Object(_)) => query.bind(json),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list(&self, table: Table) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query(&list_sql(table)).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn get(&self, table: Table, id: &str) -> StoreResult<Record> {
        self.fetch_row(&get_sql(table), vec![Value::String(id.to_string())], table)
            .await
    }

    async fn insert(&self, table: Table, payload: Record) -> StoreResult<Record> {
        let (columns, values) = typed_columns(table, payload)?;
        let sql = if columns.is_empty() {
            format!(
                "WITH written AS (INSERT INTO {} DEFAULT VALUES RETURNING *) \
                 SELECT row_to_json(t) AS row FROM ({}) t",
                quoted(table),
                projection(table, "written")
            )
        } else {
            insert_sql(table, &borrowed(&columns))
        };
        self.fetch_row(&sql, values, table).await
    }

    async fn update(&self, table: Table, id: &str, payload: Record) -> StoreResult<Record> {
        let (columns, mut values) = typed_columns(table, payload)?;
        if columns.is_empty() {
            return Err(StoreError::new(StoreError::INVALID_PARAMETER, "no columns to update"));
        }
        values.push(Value::String(id.to_string()));
        self.fetch_row(&update_sql(table, &borrowed(&columns)), values, table)
            .await
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<u64> {
        let result = sqlx::query(&delete_sql(table))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_orders_newest_first() {
        let sql = list_sql(Table::Outlets);
        assert!(sql.contains("FROM \"outlets\" r"));
        assert!(sql.ends_with("ORDER BY t.created_at DESC"));
    }

    #[test]
    fn relation_projection_joins_products_and_outlets() {
        let sql = get_sql(Table::OutletProducts);
        assert!(sql.contains("LEFT JOIN \"products\" p ON p.id = r.product_id"));
        assert!(sql.contains("LEFT JOIN \"outlets\" o ON o.id = r.outlet_id"));
        assert!(sql.contains("WHERE r.id::text = $1"));
    }

    #[test]
    fn insert_casts_each_value_to_its_column_type() {
        let sql = insert_sql(
            Table::OutletProducts,
            &[("outlet_id", "uuid"), ("price", "numeric")],
        );
        assert!(sql.contains("INSERT INTO \"outlet_products\" (\"outlet_id\", \"price\")"));
        assert!(sql.contains("VALUES ($1::uuid, $2::numeric)"));
        assert!(sql.contains("FROM written r"));
    }

    #[test]
    fn update_binds_id_after_columns_and_touches_updated_at() {
        let sql = update_sql(Table::Products, &[("name", "text"), ("price", "numeric")]);
        assert!(sql.contains("SET \"name\" = $1::text, \"price\" = $2::numeric, \"updated_at\" = now()"));
        assert!(sql.contains("WHERE id::text = $3"));
    }

    #[test]
    fn typed_columns_rejects_unknown_columns() {
        let payload = match json!({ "name": "x", "id": "forged" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = typed_columns(Table::Outlets, payload).unwrap_err();
        assert_eq!(err.code, StoreError::UNDEFINED_COLUMN);
    }

    #[test]
    fn typed_payload_feeds_insert_sql() {
        let payload = match json!({ "outlet_id": "00000000-0000-0000-0000-000000000001", "price": 9 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let (columns, values) = typed_columns(Table::OutletProducts, payload).unwrap();
        let sql = insert_sql(Table::OutletProducts, &borrowed(&columns));
        assert!(sql.contains("$1::uuid") && sql.contains("$2::numeric"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn row_not_found_maps_to_not_found_code() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code, StoreError::NOT_FOUND);
    }

    #[test]
    fn transport_errors_keep_their_message() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code, StoreError::CONNECTION_FAILURE);
        assert!(!err.message.is_empty());
    }
}

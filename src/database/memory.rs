//! In-memory record store.
//!
//! Keeps every table as an insertion-ordered `Vec` behind a single
//! `tokio::sync::RwLock`. It mirrors the relational behaviour the handlers
//! depend on: server-assigned ids and timestamps, the unique
//! (outlet_id, product_id) pairing, outlet/product foreign keys with cascading
//! deletes, and the same provider error codes and constraint names the
//! Postgres backend reports. Nothing is durable.
use super::store::{Record, RecordStore, StoreError, StoreResult, Table};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const OUTLET_FKEY: &str = "outlet_products_outlet_id_fkey";
const PRODUCT_FKEY: &str = "outlet_products_product_id_fkey";
const PAIR_KEY: &str = "outlet_products_outlet_id_product_id_key";
const PROFILE_PKEY: &str = "profiles_pkey";

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, Vec<Record>>,
}

impl Tables {
    fn rows(&self, table: Table) -> &[Record] {
        self.rows.get(&table).map(Vec::as_slice).unwrap_or_default()
    }

    fn find(&self, table: Table, id: &str) -> Option<&Record> {
        self.rows(table).iter().find(|row| row_id(row) == Some(id))
    }

    fn exists(&self, table: Table, id: Option<&Value>) -> bool {
        match id.and_then(Value::as_str) {
            Some(id) => self.find(table, id).is_some(),
            None => true,
        }
    }

    /// Enforces the constraints the catalog schema declares.
    fn check_constraints(&self, table: Table, row: &Record, own_id: &str) -> StoreResult<()> {
        match table {
            Table::OutletProducts => {
                if !self.exists(Table::Outlets, row.get("outlet_id")) {
                    return Err(StoreError::foreign_key_violation(table, OUTLET_FKEY));
                }
                if !self.exists(Table::Products, row.get("product_id")) {
                    return Err(StoreError::foreign_key_violation(table, PRODUCT_FKEY));
                }
                let duplicate = self.rows(table).iter().any(|other| {
                    row_id(other) != Some(own_id)
                        && other.get("outlet_id") == row.get("outlet_id")
                        && other.get("product_id") == row.get("product_id")
                });
                if duplicate {
                    return Err(StoreError::unique_violation(PAIR_KEY));
                }
            }
            Table::Profiles => {
                let taken = self
                    .rows(table)
                    .iter()
                    .filter(|other| row_id(other) == Some(own_id))
                    .count();
                if taken > 1 {
                    return Err(StoreError::unique_violation(PROFILE_PKEY));
                }
            }
            Table::Outlets | Table::Products => {}
        }
        Ok(())
    }

    /// Row as the API sees it: outlet_products carry their joined names.
    fn project(&self, table: Table, row: &Record) -> Record {
        let mut projected = row.clone();
        if table == Table::OutletProducts {
            let product = row
                .get("product_id")
                .and_then(Value::as_str)
                .and_then(|id| self.find(Table::Products, id))
                .map_or(Value::Null, |p| {
                    json!({ "name": p.get("name"), "unit": p.get("unit") })
                });
            let outlet = row
                .get("outlet_id")
                .and_then(Value::as_str)
                .and_then(|id| self.find(Table::Outlets, id))
                .map_or(Value::Null, |o| json!({ "name": o.get("name") }));
            projected.insert("products".to_string(), product);
            projected.insert("outlets".to_string(), outlet);
        }
        projected
    }
}

/// Non-durable [`RecordStore`] for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces the profile row that carries `user_id`'s role.
    pub async fn seed_profile(&self, user_id: Uuid, role: Option<&str>) -> StoreResult<()> {
        let id = user_id.to_string();
        self.delete(Table::Profiles, &id).await?;
        let mut payload = Record::new();
        payload.insert("id".to_string(), Value::String(id));
        payload.insert("role".to_string(), role.map_or(Value::Null, |r| json!(r)));
        self.insert(Table::Profiles, payload).await?;
        Ok(())
    }
}

fn row_id(row: &Record) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn column_default(table: Table, column: &str) -> Value {
    match (table, column) {
        (Table::Outlets, "is_active") | (Table::OutletProducts, "is_available") => Value::Bool(true),
        _ => Value::Null,
    }
}

fn check_columns(table: Table, payload: &Record) -> StoreResult<()> {
    match payload.keys().find(|column| table.column_type(column).is_none()) {
        Some(column) => Err(StoreError::undefined_column(table, column)),
        None => Ok(()),
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, table: Table) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Record> = tables
            .rows(table)
            .iter()
            .rev()
            .map(|row| tables.project(table, row))
            .collect();
        // Stable sort keeps reverse insertion order for equal timestamps.
        rows.sort_by(|a, b| {
            let a = a.get("created_at").and_then(Value::as_str).unwrap_or_default();
            let b = b.get("created_at").and_then(Value::as_str).unwrap_or_default();
            b.cmp(a)
        });
        Ok(rows)
    }

    async fn get(&self, table: Table, id: &str) -> StoreResult<Record> {
        let tables = self.tables.read().await;
        tables
            .find(table, id)
            .map(|row| tables.project(table, row))
            .ok_or_else(|| StoreError::not_found(table))
    }

    async fn insert(&self, table: Table, payload: Record) -> StoreResult<Record> {
        check_columns(table, &payload)?;
        let mut tables = self.tables.write().await;

        let id = match payload.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let now = now_timestamp();
        let mut row = Record::new();
        row.insert("id".to_string(), Value::String(id.clone()));
        for (column, _) in table.columns() {
            if *column != "id" {
                row.insert(column.to_string(), column_default(table, column));
            }
        }
        row.extend(payload);
        row.insert("created_at".to_string(), Value::String(now.clone()));
        if table.tracks_updates() {
            row.insert("updated_at".to_string(), Value::String(now));
        }

        tables.rows.entry(table).or_default().push(row.clone());
        if let Err(err) = tables.check_constraints(table, &row, &id) {
            if let Some(rows) = tables.rows.get_mut(&table) {
                rows.pop();
            }
            return Err(err);
        }
        Ok(tables.project(table, &row))
    }

    async fn update(&self, table: Table, id: &str, payload: Record) -> StoreResult<Record> {
        if payload.is_empty() {
            return Err(StoreError::new(StoreError::INVALID_PARAMETER, "no columns to update"));
        }
        check_columns(table, &payload)?;
        let mut tables = self.tables.write().await;

        let mut candidate = tables
            .find(table, id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(table))?;
        candidate.extend(payload);
        if table.tracks_updates() {
            candidate.insert("updated_at".to_string(), Value::String(now_timestamp()));
        }
        tables.check_constraints(table, &candidate, id)?;

        if let Some(slot) = tables
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
        {
            *slot = candidate.clone();
        }
        Ok(tables.project(table, &candidate))
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let rows = tables.rows.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));
        let removed = (before - rows.len()) as u64;

        // ON DELETE CASCADE for relations pointing at the removed row.
        let reference = match table {
            Table::Outlets => Some("outlet_id"),
            Table::Products => Some("product_id"),
            Table::OutletProducts | Table::Profiles => None,
        };
        if let (Some(column), true) = (reference, removed > 0) {
            if let Some(relations) = tables.rows.get_mut(&Table::OutletProducts) {
                relations.retain(|row| row.get(column).and_then(Value::as_str) != Some(id));
            }
        }
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

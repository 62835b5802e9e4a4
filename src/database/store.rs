use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single row as returned by the store: column name to JSON value.
pub type Record = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Tables the admin API is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Outlets,
    Products,
    OutletProducts,
    Profiles,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Outlets => "outlets",
            Table::Products => "products",
            Table::OutletProducts => "outlet_products",
            Table::Profiles => "profiles",
        }
    }

    /// Writable columns and the SQL type each value is cast to.
    pub fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Table::Outlets => &[
                ("name", "text"),
                ("address", "text"),
                ("latitude", "double precision"),
                ("longitude", "double precision"),
                ("is_active", "boolean"),
            ],
            Table::Products => &[
                ("name", "text"),
                ("description", "text"),
                ("price", "numeric"),
                ("unit", "text"),
                ("category", "text"),
                ("image_url", "text"),
            ],
            Table::OutletProducts => &[
                ("outlet_id", "uuid"),
                ("product_id", "uuid"),
                ("price", "numeric"),
                ("stock_status", "text"),
                ("is_available", "boolean"),
            ],
            Table::Profiles => &[("id", "uuid"), ("role", "text")],
        }
    }

    pub fn column_type(self, column: &str) -> Option<&'static str> {
        self.columns()
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, sql_type)| *sql_type)
    }

    /// Whether updates refresh the `updated_at` column.
    pub fn tracks_updates(self) -> bool {
        !matches!(self, Table::Profiles)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the error mapper should treat a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    UniqueViolation,
    ForeignKeyViolation,
    Other,
}

/// Structured store failure carrying the provider code verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
    pub constraint: Option<String>,
}

impl StoreError {
    /// PostgREST code for "zero rows where exactly one was expected".
    pub const NOT_FOUND: &'static str = "PGRST116";
    pub const UNIQUE_VIOLATION: &'static str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &'static str = "23503";
    pub const UNDEFINED_COLUMN: &'static str = "42703";
    pub const INVALID_PARAMETER: &'static str = "22023";
    pub const CONNECTION_FAILURE: &'static str = "08000";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn not_found(table: Table) -> Self {
        Self::new(
            Self::NOT_FOUND,
            format!("JSON object requested, multiple (or no) rows returned from {table}"),
        )
    }

    pub fn undefined_column(table: Table, column: &str) -> Self {
        Self::new(
            Self::UNDEFINED_COLUMN,
            format!("column \"{column}\" of relation \"{table}\" does not exist"),
        )
    }

    pub fn unique_violation(constraint: &str) -> Self {
        Self::new(
            Self::UNIQUE_VIOLATION,
            format!("duplicate key value violates unique constraint \"{constraint}\""),
        )
        .with_constraint(constraint)
    }

    pub fn foreign_key_violation(table: Table, constraint: &str) -> Self {
        Self::new(
            Self::FOREIGN_KEY_VIOLATION,
            format!(
                "insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""
            ),
        )
        .with_constraint(constraint)
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self.code.as_str() {
            Self::NOT_FOUND => StoreErrorKind::NotFound,
            Self::UNIQUE_VIOLATION => StoreErrorKind::UniqueViolation,
            Self::FOREIGN_KEY_VIOLATION => StoreErrorKind::ForeignKeyViolation,
            _ => StoreErrorKind::Other,
        }
    }

    /// True when the violated constraint is named `needle`, either in the
    /// structured field or embedded in the message.
    pub fn mentions_constraint(&self, needle: &str) -> bool {
        self.constraint.as_deref().is_some_and(|c| c.contains(needle)) || self.message.contains(needle)
    }
}

/// Relational store operations the handlers are built on.
///
/// Every method maps one request to at most one mutating statement. Rows
/// come back in the API projection for the table (outlet_products rows carry
/// the joined `products` and `outlets` objects).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows, newest `created_at` first.
    async fn list(&self, table: Table) -> StoreResult<Vec<Record>>;

    /// Exactly one row by id, or a [`StoreErrorKind::NotFound`] error.
    async fn get(&self, table: Table, id: &str) -> StoreResult<Record>;

    async fn insert(&self, table: Table, payload: Record) -> StoreResult<Record>;

    /// Applies `payload` to the row with `id` and returns the updated row.
    async fn update(&self, table: Table, id: &str, payload: Record) -> StoreResult<Record>;

    /// Deletes by id and reports how many rows went away.
    async fn delete(&self, table: Table, id: &str) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
